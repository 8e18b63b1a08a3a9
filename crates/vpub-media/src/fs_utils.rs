//! Filesystem helpers for working-directory artifacts.

use std::path::Path;
use tokio::fs;

use crate::error::MediaResult;

/// Delete a file if it exists. Returns whether a file was removed.
pub async fn remove_if_exists(path: impl AsRef<Path>) -> MediaResult<bool> {
    match fs::remove_file(path.as_ref()).await {
        Ok(()) => {
            tracing::debug!("Removed {}", path.as_ref().display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Turn a remote display name into a safe single path component.
///
/// Separators and control characters become `_`; a name that would be
/// empty or a dot-only component becomes `video`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return "video".to_string();
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_remove_if_exists() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("clip.mp4");
        fs::write(&file, b"x").await.unwrap();

        assert!(remove_if_exists(&file).await.unwrap());
        assert!(!file.exists());
        assert!(!remove_if_exists(&file).await.unwrap());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("holiday.mp4"), "holiday.mp4");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name("a\\b:c.mov"), "a_b_c.mov");
        assert_eq!(sanitize_file_name(".."), "video");
        assert_eq!(sanitize_file_name("   "), "video");
    }
}
