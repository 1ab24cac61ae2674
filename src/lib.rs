//! BannerForge - ASCII, SVG and PNG banner generator
//!
//! # Pipeline
//! 1. Resolve the palette (explicit name, preset, then default)
//! 2. Resolve the template for the format (SVG markup, ASCII font, raster layout)
//! 3. Validate the input and render one artifact
//! 4. Write the artifact to its output path
//!
//! Stores are loaded once and owned by [`BannerPipeline`]; nothing is global.

pub mod error;
pub mod palettes;
pub mod templates;
pub mod validation;
pub mod ascii;
pub mod fonts;
pub mod raster;
pub mod render;
pub mod tagline;
pub mod hashing;
pub mod pipeline;
pub mod batch;

pub use error::{ErrorKind, ForgeError, ForgeResult};
pub use palettes::{HexColor, Palette, PaletteStore, DEFAULT_PALETTE};
pub use templates::{Format, Preset, Template, TemplateBody, TemplateStore};
pub use ascii::FontStyle;
pub use fonts::FontFace;
pub use raster::Effect;
pub use render::{Artifact, RenderRequest};
pub use tagline::{OfflineTaglines, TaglineSource};
pub use pipeline::{BannerPipeline, BannerSpec};
pub use batch::{BatchEntry, BatchReport};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
