//! Font Files - Optional PNG Text
//!
//! PNG titles default to the block glyphs. A user font is shaped with parley
//! and rasterized with vello_cpu into a coverage mask the canvas blends like
//! any other text.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::error::{ForgeError, ForgeResult};

/// Raw font bytes plus the family name they register under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFace {
    path: PathBuf,
    family: String,
    bytes: Arc<Vec<u8>>,
}

impl FontFace {
    pub fn load(path: &Path) -> ForgeResult<Self> {
        let bytes = fs::read(path).map_err(|e| ForgeError::io(path, e))?;
        Self::from_bytes(path, bytes)
    }

    /// Fails when the bytes hold no usable font family.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> ForgeResult<Self> {
        let path = path.into();
        let mut font_ctx = parley::FontContext::default();
        let family = register_family(&mut font_ctx, &bytes).ok_or_else(|| ForgeError::Font {
            path: path.clone(),
            message: "no font family found".to_string(),
        })?;
        debug!(family = %family, "loaded font {}", path.display());
        Ok(Self { path, family, bytes: Arc::new(bytes) })
    }
}

fn register_family(font_ctx: &mut parley::FontContext, bytes: &[u8]) -> Option<String> {
    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.to_vec()), None);
    let (family_id, _) = families.first()?;
    font_ctx.collection.family_name(*family_id).map(|name| name.to_string())
}

/// Per-pixel text coverage, `width * height` bytes in row-major order.
#[derive(Debug, Clone)]
pub struct TextMask {
    pub width: u32,
    pub height: u32,
    coverage: Vec<u8>,
}

impl TextMask {
    /// Covered pixels as `(x, y, coverage)`.
    pub fn covered(&self) -> impl Iterator<Item = (u32, u32, u8)> + '_ {
        let width = self.width;
        self.coverage
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .map(move |(i, c)| (i as u32 % width, i as u32 / width, *c))
    }
}

struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    family: String,
}

impl TextShaper {
    fn new(face: &FontFace) -> ForgeResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        if register_family(&mut font_ctx, &face.bytes).is_none() {
            return Err(ForgeError::Font {
                path: face.path.clone(),
                message: "font family did not register".to_string(),
            });
        }
        Ok(Self { font_ctx, layout_ctx: parley::LayoutContext::new(), family: face.family.clone() })
    }

    fn layout(&mut self, text: &str, size_px: f32) -> parley::Layout<()> {
        let mut builder = self.layout_ctx.ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

/// Shape `text` at `size_px`, shrinking it to fit `max_width`, and rasterize
/// the glyphs into a coverage mask.
pub fn rasterize(face: &FontFace, text: &str, size_px: f32, max_width: f32) -> ForgeResult<TextMask> {
    let mut shaper = TextShaper::new(face)?;
    let mut layout = shaper.layout(text, size_px.max(1.0));
    if layout.width() > max_width && layout.width() > 0.0 {
        let fitted = (size_px * max_width / layout.width()).max(1.0);
        layout = shaper.layout(text, fitted);
    }

    let width = pixel_extent(face, layout.width())?;
    let height = pixel_extent(face, layout.height())?;

    let font = vello_cpu::peniko::FontData::new(
        vello_cpu::peniko::Blob::from(face.bytes.as_ref().clone()),
        0,
    );
    let mut ctx = vello_cpu::RenderContext::new(width, height);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id.into(),
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
    ctx.flush();

    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    ctx.render_to_pixmap(&mut pixmap);
    // White paint, so premultiplied alpha is the coverage.
    let coverage = pixmap.data_as_u8_slice().chunks_exact(4).map(|px| px[3]).collect();

    Ok(TextMask { width: width as u32, height: height as u32, coverage })
}

fn pixel_extent(face: &FontFace, extent: f32) -> ForgeResult<u16> {
    let px = extent.ceil().max(1.0);
    if px > u16::MAX as f32 {
        return Err(ForgeError::Font {
            path: face.path.clone(),
            message: format!("text extent {}px exceeds the raster limit", px),
        });
    }
    Ok(px as u16)
}

/// First installed font from a few common locations; tests that need a real
/// font skip without one.
#[cfg(test)]
pub(crate) fn system_font() -> Option<FontFace> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    ]
    .iter()
    .map(Path::new)
    .find(|p| p.is_file())
    .and_then(|p| FontFace::load(p).ok())
}
