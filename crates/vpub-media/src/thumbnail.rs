//! Thumbnail image processing.
//!
//! Generated artwork is fitted to YouTube's 1280x720 frame, optionally given
//! a randomized title overlay, then JPEG-encoded under the 2 MB upload cap.
//! When no artwork is available a random vertical gradient stands in.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

pub const THUMBNAIL_WIDTH: u32 = 1280;
pub const THUMBNAIL_HEIGHT: u32 = 720;

/// YouTube's custom thumbnail size limit.
pub const MAX_THUMBNAIL_BYTES: u64 = 2 * 1024 * 1024;

const INITIAL_QUALITY: u8 = 90;
const FALLBACK_QUALITIES: [u8; 7] = [85, 75, 65, 55, 45, 35, 25];
const PLACEHOLDER_QUALITY: u8 = 90;

/// Widest a title line may run before wrapping.
const TITLE_MAX_WIDTH: u32 = 1150;
const TITLE_MAX_LINES: usize = 2;
const TITLE_MARGIN_X: i32 = 50;
const TITLE_LINE_GAP: i32 = 20;
const TITLE_Y_POSITIONS: [i32; 6] = [30, 150, 280, 400, 520, 600];

const TEXT_COLORS: [[u8; 3]; 13] = [
    [255, 255, 255],
    [0, 0, 0],
    [255, 255, 100],
    [255, 100, 255],
    [100, 255, 255],
    [255, 150, 0],
    [150, 255, 100],
    [255, 200, 0],
    [200, 50, 50],
    [50, 150, 255],
    [150, 50, 200],
    [255, 180, 200],
    [100, 100, 100],
];

/// Resize to exactly 1280x720.
pub fn fit_thumbnail(img: &DynamicImage) -> RgbImage {
    img.resize_exact(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, FilterType::Lanczos3)
        .to_rgb8()
}

fn encode_jpeg(img: &RgbImage, quality: u8) -> MediaResult<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    img.write_with_encoder(encoder)?;
    Ok(buf)
}

/// Encode as JPEG, stepping quality down until the result fits `max_bytes`.
///
/// Returns the bytes and the quality used. If even the lowest quality is too
/// large the smallest encoding is returned anyway.
pub fn encode_jpeg_within(img: &RgbImage, max_bytes: u64) -> MediaResult<(Vec<u8>, u8)> {
    let mut encoded = encode_jpeg(img, INITIAL_QUALITY)?;
    let mut quality = INITIAL_QUALITY;

    for candidate in FALLBACK_QUALITIES {
        if encoded.len() as u64 <= max_bytes {
            break;
        }
        quality = candidate;
        encoded = encode_jpeg(img, candidate)?;
    }

    if encoded.len() as u64 > max_bytes {
        warn!(
            bytes = encoded.len(),
            "Could not compress thumbnail below {} bytes", max_bytes
        );
    } else if quality != INITIAL_QUALITY {
        debug!(bytes = encoded.len(), quality, "Recompressed thumbnail");
    }

    Ok((encoded, quality))
}

/// Random dark-to-light vertical gradient at thumbnail size.
pub fn gradient_placeholder<R: Rng + ?Sized>(rng: &mut R) -> RgbImage {
    let top = [
        rng.random_range(20..=100u8),
        rng.random_range(20..=100u8),
        rng.random_range(20..=100u8),
    ];
    let bottom = [
        rng.random_range(100..=200u8),
        rng.random_range(50..=150u8),
        rng.random_range(50..=200u8),
    ];

    RgbImage::from_fn(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, |_, y| {
        let t = y as f32 / THUMBNAIL_HEIGHT as f32;
        let mix = |c: usize| (top[c] as f32 + (bottom[c] as f32 - top[c] as f32) * t) as u8;
        Rgb([mix(0), mix(1), mix(2)])
    })
}

/// Write a gradient placeholder JPEG to `dest`.
pub fn write_placeholder(dest: &Path) -> MediaResult<()> {
    let img = gradient_placeholder(&mut rand::rng());
    std::fs::write(dest, encode_jpeg(&img, PLACEHOLDER_QUALITY)?)?;
    Ok(())
}

/// Fit generated artwork, add the title overlay, and write it to `dest`
/// within the size cap. Returns the number of bytes written.
pub fn process_generated(
    bytes: &[u8],
    dest: &Path,
    title: Option<&str>,
    overlay: Option<&TitleOverlay>,
) -> MediaResult<u64> {
    let decoded = image::load_from_memory(bytes)?;
    let mut img = fit_thumbnail(&decoded);

    if let (Some(title), Some(overlay)) = (title, overlay) {
        if !title.trim().is_empty() {
            let style = OverlayStyle::random(&mut rand::rng());
            overlay.apply(&mut img, title, &style);
        }
    }

    let (encoded, quality) = encode_jpeg_within(&img, MAX_THUMBNAIL_BYTES)?;
    std::fs::write(dest, &encoded)?;
    debug!(bytes = encoded.len(), quality, "Wrote thumbnail {}", dest.display());
    Ok(encoded.len() as u64)
}

// =============================================================================
// Title overlay
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEffect {
    Shadow,
    Outline,
    None,
}

/// One randomized rendering of a title.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    pub font_size: f32,
    pub color: [u8; 3],
    pub y_start: i32,
    pub alignment: Alignment,
    pub effect: TextEffect,
}

impl OverlayStyle {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            font_size: rng.random_range(40..=120u32) as f32,
            color: *TEXT_COLORS.choose(rng).unwrap_or(&[255, 255, 255]),
            y_start: *TITLE_Y_POSITIONS.choose(rng).unwrap_or(&400),
            alignment: *[Alignment::Left, Alignment::Center, Alignment::Right]
                .choose(rng)
                .unwrap_or(&Alignment::Center),
            effect: *[TextEffect::Shadow, TextEffect::Outline, TextEffect::None]
                .choose(rng)
                .unwrap_or(&TextEffect::None),
        }
    }

    fn line_x(&self, text_width: u32) -> i32 {
        match self.alignment {
            Alignment::Left => TITLE_MARGIN_X,
            Alignment::Center => (THUMBNAIL_WIDTH as i32 - text_width as i32) / 2,
            Alignment::Right => THUMBNAIL_WIDTH as i32 - text_width as i32 - TITLE_MARGIN_X,
        }
    }

    fn line_y(&self, index: usize) -> i32 {
        self.y_start + index as i32 * (self.font_size as i32 + TITLE_LINE_GAP)
    }
}

/// Draws titles with a loaded TrueType/OpenType font.
pub struct TitleOverlay {
    font: FontVec,
}

impl TitleOverlay {
    pub fn from_bytes(bytes: Vec<u8>) -> MediaResult<Self> {
        let font = FontVec::try_from_vec(bytes).map_err(|e| MediaError::InvalidFont(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn from_file(path: &Path) -> MediaResult<Self> {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Draw up to two wrapped lines of `title` onto `img`.
    pub fn apply(&self, img: &mut RgbImage, title: &str, style: &OverlayStyle) {
        let scale = PxScale::from(style.font_size);
        let lines = wrap_title(title, TITLE_MAX_WIDTH, |text| text_size(scale, &self.font, text).0);

        debug!(
            font_size = style.font_size,
            alignment = ?style.alignment,
            effect = ?style.effect,
            "Drawing title overlay"
        );

        let black = Rgb([0, 0, 0]);
        for (i, line) in lines.iter().enumerate() {
            let (width, _) = text_size(scale, &self.font, line);
            let x = style.line_x(width);
            let y = style.line_y(i);

            match style.effect {
                TextEffect::Shadow => draw_text_mut(img, black, x + 5, y + 5, scale, &self.font, line),
                TextEffect::Outline => {
                    for dx in -3..=3 {
                        for dy in -3..=3 {
                            draw_text_mut(img, black, x + dx, y + dy, scale, &self.font, line);
                        }
                    }
                }
                TextEffect::None => {}
            }
            draw_text_mut(img, Rgb(style.color), x, y, scale, &self.font, line);
        }
    }
}

/// Greedy word wrap to `max_width`, keeping at most two lines.
///
/// A single word wider than `max_width` still gets its own line.
pub fn wrap_title(title: &str, max_width: u32, measure: impl Fn(&str) -> u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in title.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current.join(" "), word)
        };

        if measure(&candidate) <= max_width {
            current.push(word);
        } else {
            if !current.is_empty() {
                lines.push(current.join(" "));
            }
            current = vec![word];
        }
    }
    if !current.is_empty() {
        lines.push(current.join(" "));
    }

    lines.truncate(TITLE_MAX_LINES);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    fn png_bytes(img: &RgbImage) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    fn noise(width: u32, height: u32, seed: u64) -> RgbImage {
        let mut rng = StdRng::seed_from_u64(seed);
        RgbImage::from_fn(width, height, |_, _| Rgb([rng.random(), rng.random(), rng.random()]))
    }

    #[test]
    fn test_fit_thumbnail_dimensions() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(1792, 1024));
        let fitted = fit_thumbnail(&img);
        assert_eq!(fitted.dimensions(), (1280, 720));
    }

    #[test]
    fn test_gradient_placeholder_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let img = gradient_placeholder(&mut rng);
        assert_eq!(img.dimensions(), (THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT));

        let top = img.get_pixel(0, 0).0;
        assert!(top.iter().all(|c| (20..=100).contains(c)));

        // Rows are uniform
        assert_eq!(img.get_pixel(0, 360), img.get_pixel(1279, 360));
    }

    #[test]
    fn test_encode_within_generous_budget_keeps_quality() {
        let img = noise(64, 36, 1);
        let (bytes, quality) = encode_jpeg_within(&img, MAX_THUMBNAIL_BYTES).unwrap();
        assert_eq!(quality, 90);
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_encode_within_steps_quality_down() {
        let img = noise(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, 2);
        let at_90 = encode_jpeg(&img, 90).unwrap().len() as u64;

        let (bytes, quality) = encode_jpeg_within(&img, at_90 - 1).unwrap();
        assert!(quality < 90);
        assert!((bytes.len() as u64) < at_90);
    }

    #[test]
    fn test_encode_within_impossible_budget_returns_smallest() {
        let img = noise(256, 144, 3);
        let (_, quality) = encode_jpeg_within(&img, 1).unwrap();
        assert_eq!(quality, 25);
    }

    #[test]
    fn test_process_generated_writes_fitted_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("thumbnail.jpg");
        let source = png_bytes(&RgbImage::from_pixel(1792, 1024, Rgb([10, 120, 200])));

        let written = process_generated(&source, &dest, Some("Title"), None).unwrap();
        assert!(written <= MAX_THUMBNAIL_BYTES);

        let reloaded = image::open(&dest).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (1280, 720));
    }

    #[test]
    fn test_process_generated_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("thumbnail.jpg");
        assert!(matches!(
            process_generated(b"not an image", &dest, None, None),
            Err(MediaError::Image(_))
        ));
    }

    #[test]
    fn test_write_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("thumbnail.jpg");
        write_placeholder(&dest).unwrap();
        let reloaded = image::open(&dest).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (1280, 720));
    }

    #[test]
    fn test_wrap_title_two_lines_max() {
        // 10px per character
        let measure = |s: &str| s.chars().count() as u32 * 10;
        let lines = wrap_title("aaaa bbbb cccc dddd", 90, measure);
        assert_eq!(lines, vec!["aaaa bbbb", "cccc dddd"]);

        let lines = wrap_title("one two three four five six", 40, measure);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "one");
    }

    #[test]
    fn test_wrap_title_long_word() {
        let measure = |s: &str| s.chars().count() as u32 * 10;
        assert_eq!(wrap_title("supercalifragilistic", 50, measure), vec!["supercalifragilistic"]);
        assert!(wrap_title("   ", 50, measure).is_empty());
    }

    #[test]
    fn test_overlay_style_ranges() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let style = OverlayStyle::random(&mut rng);
            assert!((40.0..=120.0).contains(&style.font_size));
            assert!(TITLE_Y_POSITIONS.contains(&style.y_start));
            assert!(TEXT_COLORS.contains(&style.color));
        }
    }

    #[test]
    fn test_line_placement() {
        let style = OverlayStyle {
            font_size: 60.0,
            color: [255, 255, 255],
            y_start: 150,
            alignment: Alignment::Right,
            effect: TextEffect::None,
        };
        assert_eq!(style.line_x(200), 1280 - 200 - 50);
        assert_eq!(style.line_y(1), 150 + 80);

        let centered = OverlayStyle {
            alignment: Alignment::Center,
            ..style.clone()
        };
        assert_eq!(centered.line_x(200), 540);
    }

    #[test]
    fn test_invalid_font_rejected() {
        assert!(matches!(
            TitleOverlay::from_bytes(vec![0, 1, 2, 3]),
            Err(MediaError::InvalidFont(_))
        ));
    }
}
