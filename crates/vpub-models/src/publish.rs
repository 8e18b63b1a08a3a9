//! Publish outcomes keyed by account role.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Host used for short video links.
pub const DEFAULT_LINK_HOST: &str = "youtu.be";

/// Link string recorded when no account published successfully.
pub const UPLOAD_FAILED_MARKER: &str = "Upload failed";

/// Role of a publishing account.
///
/// Ordering is significant: links are rendered in role order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishRole {
    Primary,
    Secondary,
}

impl PublishRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishRole::Primary => "primary",
            PublishRole::Secondary => "secondary",
        }
    }

    /// Capitalized label used in link strings.
    pub fn label(&self) -> &'static str {
        match self {
            PublishRole::Primary => "Primary",
            PublishRole::Secondary => "Secondary",
        }
    }
}

impl fmt::Display for PublishRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutcomeError {
    #[error("outcome for role '{0}' already recorded")]
    DuplicateRole(PublishRole),
}

/// Per-role result of one publish fan-out.
///
/// `Some(id)` is a published video, `None` an attempted-or-skipped account
/// that produced nothing. Roles never attempted are not present at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishOutcome {
    entries: BTreeMap<PublishRole, Option<String>>,
}

impl PublishOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result for `role`. Each role may be set once.
    pub fn record(&mut self, role: PublishRole, video_id: Option<String>) -> Result<(), OutcomeError> {
        if self.entries.contains_key(&role) {
            return Err(OutcomeError::DuplicateRole(role));
        }
        self.entries.insert(role, video_id);
        Ok(())
    }

    /// Whether `role` has an entry (present or absent).
    pub fn contains(&self, role: PublishRole) -> bool {
        self.entries.contains_key(&role)
    }

    /// Published video ID for `role`, if it succeeded.
    pub fn video_id(&self, role: PublishRole) -> Option<&str> {
        self.entries.get(&role).and_then(|id| id.as_deref())
    }

    /// Roles with an entry, in role order.
    pub fn roles(&self) -> impl Iterator<Item = PublishRole> + '_ {
        self.entries.keys().copied()
    }

    pub fn success_count(&self) -> usize {
        self.entries.values().filter(|id| id.is_some()).count()
    }

    /// `"Primary: https://<host>/<id> | Secondary: ..."` for successful roles,
    /// or [`UPLOAD_FAILED_MARKER`] when none succeeded.
    pub fn format_links(&self, host: &str) -> String {
        let links: Vec<String> = self
            .entries
            .iter()
            .filter_map(|(role, id)| {
                id.as_ref()
                    .map(|id| format!("{}: https://{}/{}", role.label(), host, id))
            })
            .collect();

        if links.is_empty() {
            UPLOAD_FAILED_MARKER.to_string()
        } else {
            links.join(" | ")
        }
    }
}
