//! Banner Pipeline - Single Entry Point
//!
//! palette lookup -> template lookup -> render -> write.
//! Every format goes through `render`, so validation cannot be skipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ForgeError, ForgeResult};
use crate::fonts::FontFace;
use crate::palettes::{Palette, PaletteStore};
use crate::raster::Effect;
use crate::render::{self, Artifact, RenderRequest, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::tagline::{OfflineTaglines, TaglineSource};
use crate::templates::{Format, Preset, TemplateStore};

const SAFE_NAME_CHARS: usize = 30;
const ANIMATED_STYLE: &str = "animated";

fn default_width() -> u32 { DEFAULT_WIDTH }
fn default_height() -> u32 { DEFAULT_HEIGHT }

/// Everything needed to render one banner in any format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerSpec {
    pub text: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub palette: Option<String>,
    /// SVG template style
    #[serde(default)]
    pub style: Option<String>,
    /// ASCII font style
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub effects: Vec<Effect>,
    /// Font file for PNG text; block glyphs when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_file: Option<PathBuf>,
    #[serde(default)]
    pub animated: bool,
    /// Fill a missing subtitle from the tagline source.
    #[serde(default, rename = "ai")]
    pub suggest_subtitle: bool,
}

impl BannerSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            subtitle: None,
            palette: None,
            style: None,
            font: None,
            preset: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            effects: vec![],
            font_file: None,
            animated: false,
            suggest_subtitle: false,
        }
    }
}

/// The banner pipeline - owns the stores loaded at startup
pub struct BannerPipeline {
    palettes: PaletteStore,
    templates: TemplateStore,
    taglines: Box<dyn TaglineSource>,
}

impl BannerPipeline {
    pub fn new(palettes: PaletteStore, templates: TemplateStore) -> Self {
        Self {
            palettes,
            templates,
            taglines: Box::new(OfflineTaglines),
        }
    }

    pub fn with_tagline_source(mut self, source: impl TaglineSource + 'static) -> Self {
        self.taglines = Box::new(source);
        self
    }

    pub fn palettes(&self) -> &PaletteStore {
        &self.palettes
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    fn preset(&self, spec: &BannerSpec) -> ForgeResult<Option<&Preset>> {
        spec.preset.as_deref().map(|name| self.templates.preset(name)).transpose()
    }

    /// Explicit name, then preset, then the fixed default.
    pub fn resolve_palette(&self, spec: &BannerSpec) -> ForgeResult<&Palette> {
        let preset = self.preset(spec)?;
        let name = spec.palette.as_deref().or(preset.map(|p| p.palette.as_str()));
        self.palettes.resolve_or_default(name)
    }

    fn style_for(&self, spec: &BannerSpec, format: Format) -> ForgeResult<String> {
        let preset = self.preset(spec)?;
        let style = match format {
            Format::Ascii => spec.font.clone(),
            Format::Svg => spec
                .style
                .clone()
                .or_else(|| spec.animated.then(|| ANIMATED_STYLE.to_string()))
                .or_else(|| preset.map(|p| p.style.clone())),
            Format::Png => None,
        };
        Ok(style.unwrap_or_else(|| format.default_style().to_string()))
    }

    fn request_for(&self, spec: &BannerSpec, format: Format) -> ForgeResult<RenderRequest> {
        let preset = self.preset(spec)?;
        let effects = match (spec.effects.is_empty(), preset) {
            (true, Some(preset)) => preset.effects.clone(),
            _ => spec.effects.clone(),
        };
        let font = match (&spec.font_file, format) {
            (Some(path), Format::Png) => Some(FontFace::load(path)?),
            _ => None,
        };
        Ok(RenderRequest::new(spec.text.clone())
            .with_subtitle(self.subtitle_for(spec))
            .with_size(spec.width, spec.height)
            .with_effects(effects)
            .with_font(font))
    }

    pub fn suggest_tagline(&self, text: &str) -> String {
        let tagline = self.taglines.generate_tagline(text);
        info!("Suggested subtitle: {}", tagline);
        tagline
    }

    fn subtitle_for(&self, spec: &BannerSpec) -> Option<String> {
        match &spec.subtitle {
            Some(subtitle) => Some(subtitle.clone()),
            None if spec.suggest_subtitle => Some(self.suggest_tagline(&spec.text)),
            None => None,
        }
    }

    /// Render one format without touching the filesystem.
    pub fn render(&self, spec: &BannerSpec, format: Format) -> ForgeResult<Artifact> {
        let palette = self.resolve_palette(spec)?;
        let template = self.templates.resolve(format, &self.style_for(spec, format)?)?;
        let request = self.request_for(spec, format)?;
        debug!(%format, palette = %palette.name, template = %template.id, "rendering banner");
        render::render(&request, palette, &template)
    }

    /// Render and write one format to `path`.
    pub fn generate(&self, spec: &BannerSpec, format: Format, path: &Path) -> ForgeResult<Artifact> {
        let artifact = self.render(spec, format)?;
        write_artifact(path, &artifact)?;
        Ok(artifact)
    }

    /// Render all three formats, then write `<prefix>.txt|.svg|.png`.
    ///
    /// Nothing is written unless every format renders.
    pub fn combo(&self, spec: &BannerSpec, prefix: &Path) -> ForgeResult<Vec<PathBuf>> {
        // Pin the subtitle so a suggested tagline is shared by all formats.
        let spec = BannerSpec { subtitle: self.subtitle_for(spec), ..spec.clone() };
        let artifacts = Format::ALL
            .into_iter()
            .map(|format| self.render(&spec, format))
            .collect::<ForgeResult<Vec<_>>>()?;

        let mut written = vec![];
        for artifact in &artifacts {
            let path = with_suffix(prefix, artifact.format.extension());
            write_artifact(&path, artifact)?;
            written.push(path);
        }
        Ok(written)
    }
}

impl Default for BannerPipeline {
    fn default() -> Self {
        Self::new(PaletteStore::builtin(), TemplateStore::builtin())
    }
}

/// Write an artifact, creating parent directories as needed.
pub fn write_artifact(path: &Path, artifact: &Artifact) -> ForgeResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ForgeError::io(parent, e))?;
    }
    fs::write(path, &artifact.bytes).map_err(|e| ForgeError::io(path, e))?;
    info!(format = %artifact.format, "wrote {}", path.display());
    Ok(())
}

/// Append `.ext` without replacing any existing dot-suffix of the prefix.
pub fn with_suffix(prefix: &Path, ext: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// File-name-safe form of banner text: spaces become `_`, other symbols drop.
pub fn safe_name(text: &str) -> String {
    let name: String = text
        .trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .take(SAFE_NAME_CHARS)
        .collect();
    if name.is_empty() { "banner".to_string() } else { name }
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// `banner_<safe_name>_<timestamp>.<ext>`
pub fn default_output_path(text: &str, format: Format, now: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!("banner_{}_{}.{}", safe_name(text), timestamp(now), format.extension()))
}

/// `banners_<timestamp>/<safe_name>`
pub fn default_combo_prefix(text: &str, now: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!("banners_{}", timestamp(now))).join(safe_name(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::TimeZone;

    struct FixedTagline;

    impl TaglineSource for FixedTagline {
        fn generate_tagline(&self, _context: &str) -> String {
            "Always This".to_string()
        }
    }

    #[test]
    fn test_preset_supplies_palette_and_style() {
        let pipeline = BannerPipeline::default();
        let spec = BannerSpec { preset: Some("professional".into()), ..BannerSpec::new("Acme") };
        assert_eq!(pipeline.resolve_palette(&spec).unwrap().name, "royal");
        assert_eq!(pipeline.style_for(&spec, Format::Svg).unwrap(), "grid");
        assert_eq!(pipeline.request_for(&spec, Format::Png).unwrap().effects, vec![Effect::Shadow]);
    }

    #[test]
    fn test_explicit_palette_beats_preset() {
        let pipeline = BannerPipeline::default();
        let spec = BannerSpec {
            preset: Some("professional".into()),
            palette: Some("ocean".into()),
            ..BannerSpec::new("Acme")
        };
        assert_eq!(pipeline.resolve_palette(&spec).unwrap().name, "ocean");
    }

    #[test]
    fn test_animated_selects_animated_template() {
        let pipeline = BannerPipeline::default();
        let spec = BannerSpec { animated: true, ..BannerSpec::new("Acme") };
        let svg = String::from_utf8(pipeline.render(&spec, Format::Svg).unwrap().bytes).unwrap();
        assert!(svg.contains("<animate"));
    }

    #[test]
    fn test_unknown_palette_fails_closed() {
        let pipeline = BannerPipeline::default();
        let spec = BannerSpec { palette: Some("mauve".into()), ..BannerSpec::new("Acme") };
        assert_eq!(pipeline.render(&spec, Format::Svg).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_suggested_subtitle_from_source() {
        let pipeline = BannerPipeline::default().with_tagline_source(FixedTagline);
        let spec = BannerSpec { suggest_subtitle: true, ..BannerSpec::new("Acme") };
        let ascii = String::from_utf8(pipeline.render(&spec, Format::Ascii).unwrap().bytes).unwrap();
        assert!(ascii.ends_with("Always This\n"));
    }

    #[test]
    fn test_font_file_only_loaded_for_png() {
        let dir = tempfile::tempdir().unwrap();
        let spec = BannerSpec { font_file: Some(dir.path().join("missing.ttf")), ..BannerSpec::new("Acme") };
        let pipeline = BannerPipeline::default();

        assert!(pipeline.render(&spec, Format::Svg).is_ok());
        assert!(pipeline.render(&spec, Format::Ascii).is_ok());
        assert_eq!(pipeline.render(&spec, Format::Png).unwrap_err().kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("Tech Conference 2025"), "Tech_Conference_2025");
        assert_eq!(safe_name("../etc/passwd"), "etcpasswd");
        assert_eq!(safe_name("!!!"), "banner");
        assert_eq!(safe_name(&"a".repeat(50)).len(), SAFE_NAME_CHARS);
    }

    #[test]
    fn test_default_paths() {
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            default_output_path("My App", Format::Png, now),
            PathBuf::from("banner_My_App_20250304_050607.png")
        );
        assert_eq!(
            default_combo_prefix("My App", now),
            PathBuf::from("banners_20250304_050607").join("My_App")
        );
    }

    #[test]
    fn test_with_suffix_keeps_dots() {
        assert_eq!(with_suffix(Path::new("out/v1.2"), "svg"), PathBuf::from("out/v1.2.svg"));
    }

    #[test]
    fn test_write_artifact_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let artifact = Artifact { format: Format::Ascii, bytes: b"hi".to_vec() };
        let err = write_artifact(&blocker.join("nested.txt"), &artifact).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }
}
