//! Raster Engine - PNG Banners
//!
//! Text is drawn with the block glyphs from [`crate::ascii`], one filled
//! square per glyph cell, so output never depends on installed fonts.
//! A [`FontFace`] switches titles and subtitles to a coverage mask instead.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

use crate::ascii::GlyphGrid;
use crate::error::ForgeResult;
use crate::fonts::{self, FontFace, TextMask};
use crate::palettes::Palette;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Shadow,
    Glow,
    Gradient,
    Stripe,
    Blur,
}

impl Effect {
    pub const ALL: [Effect; 5] = [Self::Shadow, Self::Glow, Self::Gradient, Self::Stripe, Self::Blur];

    pub fn name(self) -> &'static str {
        match self {
            Self::Shadow => "shadow",
            Self::Glow => "glow",
            Self::Gradient => "gradient",
            Self::Stripe => "stripe",
            Self::Blur => "blur",
        }
    }
}

const SHADOW_OFFSET: i64 = 4;
const SHADOW_RGBA: [u8; 4] = [0, 0, 0, 128];
const GLOW_ALPHA: u8 = 80;
const STRIPE_ALPHA: u8 = 68;
const GRADIENT_MAX_ALPHA: f64 = 50.0;
const BLUR_SIGMA: f32 = 1.0;

/// Fraction of the canvas width text may occupy.
const MAX_TEXT_SPAN: f64 = 0.9;

struct Canvas {
    img: RgbaImage,
}

impl Canvas {
    fn new(width: u32, height: u32, background: [u8; 4]) -> Self {
        Self { img: RgbaImage::from_pixel(width, height, Rgba(background)) }
    }

    fn width(&self) -> u32 {
        self.img.width()
    }

    fn height(&self) -> u32 {
        self.img.height()
    }

    fn blend(&mut self, x: u32, y: u32, src: [u8; 4]) {
        let alpha = src[3] as u32;
        let dst = self.img.get_pixel_mut(x, y);
        for c in 0..3 {
            let mixed = (src[c] as u32 * alpha + dst.0[c] as u32 * (255 - alpha) + 127) / 255;
            dst.0[c] = mixed as u8;
        }
        dst.0[3] = 255;
    }

    /// Alpha-blend a rectangle, clipped to the canvas.
    fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: [u8; 4]) {
        let x0 = x.max(0) as u32;
        let y0 = y.max(0) as u32;
        let x1 = (x + w as i64).clamp(0, self.width() as i64) as u32;
        let y1 = (y + h as i64).clamp(0, self.height() as i64) as u32;
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color);
            }
        }
    }

    fn draw_text(&mut self, text: &TextBlock, dx: i64, dy: i64, color: [u8; 4]) {
        let (x0, y0) = (text.x + dx, text.y + dy);
        match &text.shape {
            TextShape::Glyphs { grid, cell } => {
                for (cx, cy) in grid.filled_cells() {
                    let x = x0 + (cx as u32 * cell) as i64;
                    let y = y0 + (cy as u32 * cell) as i64;
                    self.fill_rect(x, y, *cell, *cell, color);
                }
            }
            TextShape::Mask(mask) => {
                for (mx, my, coverage) in mask.covered() {
                    let (x, y) = (x0 + mx as i64, y0 + my as i64);
                    if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
                        continue;
                    }
                    let alpha = (color[3] as u32 * coverage as u32 + 127) / 255;
                    self.blend(x as u32, y as u32, [color[0], color[1], color[2], alpha as u8]);
                }
            }
        }
    }

    fn vertical_gradient(&mut self, color: [u8; 3]) {
        let height = self.height();
        for y in 0..height {
            let alpha = (GRADIENT_MAX_ALPHA * (1.0 - y as f64 / height as f64)) as u8;
            for x in 0..self.width() {
                self.blend(x, y, [color[0], color[1], color[2], alpha]);
            }
        }
    }

    fn encode_png(self) -> ForgeResult<Vec<u8>> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(self.img).write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(buf)
    }
}

enum TextShape {
    /// Block glyphs, each cell `cell` pixels square.
    Glyphs { grid: GlyphGrid, cell: u32 },
    Mask(TextMask),
}

impl TextShape {
    fn size(&self) -> (i64, i64) {
        match self {
            Self::Glyphs { grid, cell } => {
                (grid.width() as i64 * *cell as i64, grid.height() as i64 * *cell as i64)
            }
            Self::Mask(mask) => (mask.width as i64, mask.height as i64),
        }
    }
}

/// Laid-out text and its top-left origin.
struct TextBlock {
    shape: TextShape,
    x: i64,
    y: i64,
}

impl TextBlock {
    /// Center `text` horizontally with its vertical middle at `center_y`.
    fn centered(
        text: &str,
        font: Option<&FontFace>,
        canvas_w: u32,
        center_y: f64,
        target_height: f64,
    ) -> ForgeResult<Self> {
        let max_width = canvas_w as f64 * MAX_TEXT_SPAN;
        let shape = match font {
            Some(face) => TextShape::Mask(fonts::rasterize(face, text, target_height as f32, max_width as f32)?),
            None => {
                let grid = GlyphGrid::layout(text);
                let by_height = (target_height / grid.height() as f64) as u32;
                let by_width = (max_width / grid.width().max(1) as f64) as u32;
                let cell = by_height.min(by_width).max(1);
                TextShape::Glyphs { grid, cell }
            }
        };

        let (text_w, text_h) = shape.size();
        Ok(Self {
            x: (canvas_w as i64 - text_w) / 2,
            y: center_y as i64 - text_h / 2,
            shape,
        })
    }
}

/// Rasterize a banner and return encoded PNG bytes.
pub fn render_png(
    text: &str,
    subtitle: Option<&str>,
    palette: &Palette,
    width: u32,
    height: u32,
    effects: &[Effect],
    font: Option<&FontFace>,
) -> ForgeResult<Vec<u8>> {
    let has = |effect: Effect| effects.contains(&effect);
    let mut canvas = Canvas::new(width, height, palette.background.rgba(255));

    if has(Effect::Gradient) {
        canvas.vertical_gradient(palette.accent.rgb());
    }

    let h = height as f64;
    let title = TextBlock::centered(text, font, width, h * 0.35, h * 0.22)?;
    debug!(x = title.x, y = title.y, size = ?title.shape.size(), "title layout");

    if has(Effect::Shadow) {
        canvas.draw_text(&title, SHADOW_OFFSET, SHADOW_OFFSET, SHADOW_RGBA);
    }
    if has(Effect::Glow) {
        let glow = palette.accent.rgba(GLOW_ALPHA);
        for offset in (1..=3).rev() {
            canvas.draw_text(&title, -offset, 0, glow);
            canvas.draw_text(&title, offset, 0, glow);
            canvas.draw_text(&title, 0, -offset, glow);
            canvas.draw_text(&title, 0, offset, glow);
        }
    }
    canvas.draw_text(&title, 0, 0, palette.text.rgba(255));

    if let Some(subtitle) = subtitle {
        let sub = TextBlock::centered(subtitle, font, width, h * 0.75, h * 0.07)?;
        canvas.draw_text(&sub, 0, 0, palette.muted.rgba(255));
    }

    if has(Effect::Stripe) {
        let top = (h * 0.85) as i64;
        canvas.fill_rect(0, top, width, height - top as u32, palette.accent.rgba(STRIPE_ALPHA));
    }

    if has(Effect::Blur) {
        canvas.img = image::imageops::blur(&canvas.img, BLUR_SIGMA);
    }

    canvas.encode_png()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palettes::PaletteStore;

    fn decode(bytes: &[u8]) -> RgbaImage {
        image::load_from_memory(bytes).unwrap().to_rgba8()
    }

    #[test]
    fn test_png_dimensions_and_background() {
        let palettes = PaletteStore::builtin();
        let palette = palettes.resolve("stealth").unwrap();
        let bytes = render_png("HI", None, palette, 400, 100, &[], None).unwrap();

        let img = decode(&bytes);
        assert_eq!(img.dimensions(), (400, 100));
        assert_eq!(img.get_pixel(0, 0).0, palette.background.rgba(255));
    }

    #[test]
    fn test_text_pixels_use_text_color() {
        let palettes = PaletteStore::builtin();
        let palette = palettes.resolve("ember").unwrap();
        let bytes = render_png("I", None, palette, 400, 100, &[], None).unwrap();

        let img = decode(&bytes);
        let text = palette.text.rgba(255);
        assert!(img.pixels().any(|p| p.0 == text));
    }

    #[test]
    fn test_stripe_tints_bottom_rows() {
        let palettes = PaletteStore::builtin();
        let palette = palettes.resolve("ocean").unwrap();
        let plain = decode(&render_png("X", None, palette, 200, 100, &[], None).unwrap());
        let striped = decode(&render_png("X", None, palette, 200, 100, &[Effect::Stripe], None).unwrap());

        assert_eq!(plain.get_pixel(0, 0), striped.get_pixel(0, 0));
        assert_ne!(plain.get_pixel(0, 99), striped.get_pixel(0, 99));
    }

    #[test]
    fn test_long_text_fits_canvas() {
        let block = TextBlock::centered("A VERY LONG BANNER TITLE INDEED", None, 200, 50.0, 66.0).unwrap();
        assert!(block.x >= 0);
        assert!(block.shape.size().0 <= 200);
    }

    #[test]
    fn test_font_text_keeps_case_and_color() {
        let Some(face) = crate::fonts::system_font() else { return };
        let palettes = PaletteStore::builtin();
        let palette = palettes.resolve("ember").unwrap();

        let lower = render_png("forge", None, palette, 400, 100, &[], Some(&face)).unwrap();
        let upper = render_png("FORGE", None, palette, 400, 100, &[], Some(&face)).unwrap();
        assert_ne!(lower, upper);
        assert!(decode(&lower).pixels().any(|p| p.0 == palette.text.rgba(255)));

        let again = render_png("forge", None, palette, 400, 100, &[], Some(&face)).unwrap();
        assert_eq!(lower, again);
    }

    #[test]
    fn test_block_glyphs_ignore_case() {
        let palettes = PaletteStore::builtin();
        let palette = palettes.resolve("ember").unwrap();
        let lower = render_png("forge", None, palette, 400, 100, &[], None).unwrap();
        let upper = render_png("FORGE", None, palette, 400, 100, &[], None).unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_effects_deterministic() {
        let palettes = PaletteStore::builtin();
        let palette = palettes.resolve("neon").unwrap();
        let a = render_png("Tech", Some("Conf"), palette, 300, 120, &Effect::ALL, None).unwrap();
        let b = render_png("Tech", Some("Conf"), palette, 300, 120, &Effect::ALL, None).unwrap();
        assert_eq!(a, b);
    }
}
