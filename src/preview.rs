//! Preview Renderer
//!
//! Draws the package thumbnail: a vertical two-color gradient chosen by
//! template kind, with the watchface name centered in white bitmap text.
//! Rendering is best-effort; the pipeline never fails because of it.

use font8x8::{UnicodeFonts, BASIC_FONTS, GREEK_FONTS, LATIN_FONTS};
use image::{ImageFormat, Rgb, RgbImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

use crate::templates::TemplateKind;

pub const PREVIEW_FILE: &str = "preview.png";
pub const PREVIEW_SIZE: u32 = 512;

const GLYPH_SIZE: u32 = 8;
const MAX_TEXT_SCALE: u32 = 6;
const TEXT_MARGIN: u32 = 32;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to write preview: {0}")]
    Io(#[from] std::io::Error),
}

pub trait PreviewRenderer: Send + Sync {
    /// Encoded PNG bytes for the thumbnail
    fn render(&self, name: &str, template: TemplateKind) -> Result<Vec<u8>, PreviewError>;

    fn render_to(&self, path: &Path, name: &str, template: TemplateKind) -> Result<(), PreviewError> {
        let png = self.render(name, template)?;
        fs::write(path, png)?;
        Ok(())
    }
}

/// Default renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct GradientPreview;

impl PreviewRenderer for GradientPreview {
    fn render(&self, name: &str, template: TemplateKind) -> Result<Vec<u8>, PreviewError> {
        let image = draw(name, template);
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }
}

/// Top and bottom gradient colors
pub fn gradient_colors(template: TemplateKind) -> (Rgb<u8>, Rgb<u8>) {
    match template {
        TemplateKind::Analog => (Rgb([245, 245, 245]), Rgb([220, 220, 220])),
        TemplateKind::Digital => (Rgb([10, 10, 30]), Rgb([30, 30, 60])),
        TemplateKind::Simple | TemplateKind::Custom => (Rgb([74, 144, 226]), Rgb([142, 84, 233])),
    }
}

/// Linear per-channel interpolation by row
fn gradient_row(top: Rgb<u8>, bottom: Rgb<u8>, y: u32, height: u32) -> Rgb<u8> {
    let ratio = y as f64 / height as f64;
    let mix = |a: u8, b: u8| (a as f64 * (1.0 - ratio) + b as f64 * ratio) as u8;
    Rgb([
        mix(top[0], bottom[0]),
        mix(top[1], bottom[1]),
        mix(top[2], bottom[2]),
    ])
}

pub fn draw(name: &str, template: TemplateKind) -> RgbImage {
    let (top, bottom) = gradient_colors(template);
    let mut image = RgbImage::from_fn(PREVIEW_SIZE, PREVIEW_SIZE, |_, y| {
        gradient_row(top, bottom, y, PREVIEW_SIZE)
    });
    draw_centered_text(&mut image, name);
    image
}

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| GREEK_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn text_scale(chars: u32, available: u32) -> u32 {
    (1..=MAX_TEXT_SCALE)
        .rev()
        .find(|scale| chars * GLYPH_SIZE * scale <= available)
        .unwrap_or(1)
}

fn draw_centered_text(image: &mut RgbImage, text: &str) {
    let glyphs: Vec<[u8; 8]> = text.chars().map(glyph).collect();
    if glyphs.is_empty() {
        return;
    }

    let (width, height) = image.dimensions();
    let scale = text_scale(glyphs.len() as u32, width.saturating_sub(2 * TEXT_MARGIN));
    let cell = GLYPH_SIZE * scale;
    let text_width = cell * glyphs.len() as u32;
    // Overlong names are clipped at the edges.
    let origin_x = (width as i64 - text_width as i64) / 2;
    let origin_y = (height as i64 - cell as i64) / 2;

    for (index, rows) in glyphs.iter().enumerate() {
        let glyph_x = origin_x + (index as u32 * cell) as i64;
        for (row, bits) in rows.iter().enumerate() {
            for bit in 0..GLYPH_SIZE {
                if bits & (1u8 << bit) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let x = glyph_x + (bit * scale + dx) as i64;
                        let y = origin_y + (row as u32 * scale + dy) as i64;
                        if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                            image.put_pixel(x as u32, y as u32, TEXT_COLOR);
                        }
                    }
                }
            }
        }
    }
}
