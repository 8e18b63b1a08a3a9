//! Thumbnail renderer backed by OpenAI image generation.
//!
//! Every render picks a random art style, colour scheme and composition so
//! consecutive uploads do not look alike. Generated artwork is post-processed
//! by [`vpub_media::process_generated`]; any failure falls back to a random
//! gradient placeholder.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vpub_media::{process_generated, write_placeholder, TitleOverlay};

use crate::collaborators::{ThumbnailOutcome, ThumbnailRenderer};
use crate::config::PipelineConfig;
use crate::error::{WorkerError, WorkerResult};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const IMAGE_MODEL: &str = "dall-e-3";
const IMAGE_SIZE: &str = "1792x1024";
const IMAGE_QUALITY: &str = "hd";
const GENERATION_TIMEOUT: Duration = Duration::from_secs(180);

const STYLES: &[&str] = &[
    "minimalist modern design",
    "bold graphic poster style",
    "cinematic movie poster",
    "abstract artistic composition",
    "photorealistic dramatic scene",
    "flat design illustration",
    "vintage film aesthetic",
    "neon cyberpunk style",
    "watercolor painting",
    "3D rendered scene",
    "comic book art style",
    "retro 80s aesthetic",
];

const COLOR_SCHEMES: &[&str] = &[
    "vibrant saturated colors",
    "muted earth tones",
    "monochrome black and white with one accent color",
    "pastel soft colors",
    "high contrast bold colors",
    "warm sunset palette (oranges, reds, yellows)",
    "cool blue and teal tones",
    "neon bright accents on dark background",
    "natural green and brown tones",
    "purple and pink gradient",
];

const COMPOSITIONS: &[&str] = &[
    "centered symmetrical composition",
    "rule of thirds layout",
    "asymmetric dynamic composition",
    "close-up dramatic shot",
    "wide establishing shot",
    "diagonal leading lines",
    "circular focal point",
    "split screen composition",
];

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u8,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}

/// Build the generation prompt around the analyzer's thumbnail prompt.
pub fn build_image_prompt<R: Rng + ?Sized>(content: &str, rng: &mut R) -> String {
    let style = STYLES.choose(rng).copied().unwrap_or_default();
    let colors = COLOR_SCHEMES.choose(rng).copied().unwrap_or_default();
    let composition = COMPOSITIONS.choose(rng).copied().unwrap_or_default();
    debug!(style, colors, composition, "Thumbnail styling");

    format!(
        "Create a YouTube thumbnail in 16:9 landscape format.

Content: {content}

UNIQUE STYLE FOR THIS THUMBNAIL:
- Art Style: {style}
- Color Scheme: {colors}
- Composition: {composition}
- Professional quality, eye-catching
- Leave space for text overlay
- NO text in the image itself

Make this thumbnail visually distinct and unique."
    )
}

/// Renders thumbnails with OpenAI, degrading to a placeholder.
pub struct ImageThumbnailRenderer {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    overlay: Option<Arc<TitleOverlay>>,
}

impl ImageThumbnailRenderer {
    pub fn new(config: &PipelineConfig) -> WorkerResult<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let overlay = match &config.thumbnail_font_path {
            Some(path) => match TitleOverlay::from_file(path) {
                Ok(overlay) => Some(Arc::new(overlay)),
                Err(e) => {
                    warn!("Title overlay disabled, cannot load font {}: {}", path.display(), e);
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            http,
            api_key: config.openai_api_key.clone(),
            base_url: OPENAI_API_BASE.to_string(),
            overlay,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn generate(&self, prompt: &str, title: &str, dest: &Path) -> WorkerResult<u64> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| WorkerError::thumbnail_failed("OpenAI API key not configured"))?;

        let image_prompt = build_image_prompt(prompt, &mut rand::rng());
        let request = ImageRequest {
            model: IMAGE_MODEL,
            prompt: &image_prompt,
            size: IMAGE_SIZE,
            quality: IMAGE_QUALITY,
            n: 1,
        };

        let response = self
            .http
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(api_key)
            .timeout(GENERATION_TIMEOUT)
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(WorkerError::thumbnail_failed(format!(
                "image generation returned {}: {}",
                status, error_text
            )));
        }

        let generated: ImageResponse = response.json().await?;
        let url = generated
            .data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or_else(|| WorkerError::thumbnail_failed("image generation returned no URL"))?;

        debug!("Downloading generated image");
        let image = self.http.get(&url).timeout(GENERATION_TIMEOUT).send().await?;
        if !image.status().is_success() {
            return Err(WorkerError::thumbnail_failed(format!(
                "failed to download image: {}",
                image.status()
            )));
        }
        let bytes = image.bytes().await?.to_vec();

        let dest = dest.to_path_buf();
        let title = title.to_string();
        let overlay = self.overlay.clone();
        let written = tokio::task::spawn_blocking(move || {
            process_generated(&bytes, &dest, Some(&title), overlay.as_deref())
        })
        .await
        .map_err(|e| WorkerError::thumbnail_failed(format!("image task failed: {}", e)))??;

        Ok(written)
    }
}

#[async_trait]
impl ThumbnailRenderer for ImageThumbnailRenderer {
    async fn render(&self, prompt: &str, title: &str, dest: &Path) -> ThumbnailOutcome {
        match self.generate(prompt, title, dest).await {
            Ok(bytes) => {
                info!(bytes, "Generated thumbnail {}", dest.display());
                ThumbnailOutcome::Generated(dest.to_path_buf())
            }
            Err(e) => {
                warn!("Thumbnail generation failed, using placeholder: {}", e);
                render_placeholder(dest.to_path_buf(), e.to_string()).await
            }
        }
    }
}

async fn render_placeholder(dest: PathBuf, reason: String) -> ThumbnailOutcome {
    let target = dest.clone();
    let result = tokio::task::spawn_blocking(move || write_placeholder(&target)).await;

    match result {
        Ok(Ok(())) => ThumbnailOutcome::Placeholder { path: dest, reason },
        Ok(Err(e)) => {
            warn!("Failed to write placeholder thumbnail: {}", e);
            ThumbnailOutcome::Unavailable {
                reason: format!("{}; placeholder failed: {}", reason, e),
            }
        }
        Err(e) => ThumbnailOutcome::Unavailable {
            reason: format!("{}; placeholder task failed: {}", reason, e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 80, 40]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn renderer(server: &MockServer, key: Option<&str>) -> ImageThumbnailRenderer {
        let config = PipelineConfig {
            openai_api_key: key.map(str::to_string),
            ..Default::default()
        };
        ImageThumbnailRenderer::new(&config).unwrap().with_base_url(server.uri())
    }

    fn is_jpeg(path: &Path) -> bool {
        let bytes = std::fs::read(path).unwrap();
        bytes.starts_with(&[0xFF, 0xD8])
    }

    #[test]
    fn test_prompt_contains_content_and_style() {
        let mut rng = StdRng::seed_from_u64(3);
        let prompt = build_image_prompt("a red fox in snow", &mut rng);

        assert!(prompt.contains("Content: a red fox in snow"));
        assert!(STYLES.iter().any(|s| prompt.contains(s)));
        assert!(COLOR_SCHEMES.iter().any(|c| prompt.contains(c)));
        assert!(COMPOSITIONS.iter().any(|c| prompt.contains(c)));
        assert!(prompt.contains("NO text in the image itself"));
    }

    #[tokio::test]
    async fn test_generated_thumbnail() {
        let server = MockServer::start().await;
        let image_url = format!("{}/generated/img.png", server.uri());

        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "dall-e-3",
                "size": "1792x1024",
                "quality": "hd",
                "n": 1
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"url": image_url}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/generated/img.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(179, 102)))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("thumbnail.jpg");
        let outcome = renderer(&server, Some("sk-test")).render("fox", "Fox", &dest).await;

        assert_eq!(outcome, ThumbnailOutcome::Generated(dest.clone()));
        assert!(is_jpeg(&dest));
        let img = image::open(&dest).unwrap();
        assert_eq!((img.width(), img.height()), (1280, 720));
    }

    #[tokio::test]
    async fn test_missing_key_writes_placeholder() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("thumbnail.jpg");

        let outcome = renderer(&server, None).render("fox", "Fox", &dest).await;

        assert!(matches!(outcome, ThumbnailOutcome::Placeholder { ref reason, .. } if reason.contains("not configured")));
        assert!(is_jpeg(&dest));
    }

    #[tokio::test]
    async fn test_api_error_writes_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(ResponseTemplate::new(400).set_body_string("content policy"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("thumbnail.jpg");
        let outcome = renderer(&server, Some("sk-test")).render("fox", "Fox", &dest).await;

        assert!(matches!(outcome, ThumbnailOutcome::Placeholder { .. }));
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn test_unwritable_destination_is_unavailable() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing-dir").join("thumbnail.jpg");

        let outcome = renderer(&server, None).render("fox", "Fox", &dest).await;

        assert!(matches!(outcome, ThumbnailOutcome::Unavailable { .. }));
        assert!(outcome.path().is_none());
    }
}
