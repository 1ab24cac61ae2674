//! Template Store - Markup and Font Styles
//!
//! SVG templates are markup with `{{TOKEN}}` placeholders. ASCII "templates"
//! are font styles. PNG uses one fixed raster layout.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::ascii::FontStyle;
use crate::error::{ForgeError, ForgeResult};
use crate::raster::Effect;

pub type TemplateId = String;

pub const DEFAULT_SVG_STYLE: &str = "wave";
pub const DEFAULT_FONT: &str = "standard";
pub const RASTER_LAYOUT: &str = "raster";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Ascii,
    Svg,
    Png,
}

impl Format {
    pub const ALL: [Format; 3] = [Self::Ascii, Self::Svg, Self::Png];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Ascii => "txt",
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    pub fn default_style(self) -> &'static str {
        match self {
            Self::Ascii => DEFAULT_FONT,
            Self::Svg => DEFAULT_SVG_STYLE,
            Self::Png => RASTER_LAYOUT,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("unknown format '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateBody {
    Svg(String),
    AsciiFont(FontStyle),
    Raster,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub id: TemplateId,
    pub body: TemplateBody,
}

impl Template {
    pub fn svg(id: impl Into<TemplateId>, markup: impl Into<String>) -> Self {
        Self { id: id.into(), body: TemplateBody::Svg(markup.into()) }
    }

    pub fn format(&self) -> Format {
        match self.body {
            TemplateBody::Svg(_) => Format::Svg,
            TemplateBody::AsciiFont(_) => Format::Ascii,
            TemplateBody::Raster => Format::Png,
        }
    }
}

/// Named bundle of style, palette and effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub style: String,
    pub palette: String,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

/// Template store - SVG markup by id, plus presets
#[derive(Debug, Clone)]
pub struct TemplateStore {
    svg: BTreeMap<TemplateId, Template>,
    presets: BTreeMap<String, Preset>,
}

impl TemplateStore {
    pub fn empty() -> Self {
        Self { svg: BTreeMap::new(), presets: BTreeMap::new() }
    }

    pub fn builtin() -> Self {
        let mut store = Self::empty();
        for (id, markup) in builtin::svg_templates() {
            store.register(Template::svg(id, markup));
        }
        for (name, style, palette, effects) in builtin::PRESETS {
            store.presets.insert(
                name.to_string(),
                Preset {
                    style: style.to_string(),
                    palette: palette.to_string(),
                    effects: effects.to_vec(),
                },
            );
        }
        store
    }

    /// Add every `*.svg` file in `dir` as a template named by its file stem.
    pub fn load_dir(&mut self, dir: &Path) -> ForgeResult<usize> {
        let mut loaded = 0;
        if !dir.exists() {
            warn!("Templates directory {} does not exist", dir.display());
            return Ok(0);
        }
        for entry in fs::read_dir(dir).map_err(|e| ForgeError::io(dir, e))? {
            let path = entry.map_err(|e| ForgeError::io(dir, e))?.path();
            if path.extension().map_or(true, |e| e != "svg") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match fs::read_to_string(&path) {
                Ok(markup) => {
                    debug!(template = %id, "loaded svg template");
                    self.register(Template::svg(id, markup));
                    loaded += 1;
                }
                Err(e) => warn!("Skipping template {}: {}", path.display(), e),
            }
        }
        info!("Loaded {} templates from {}", loaded, dir.display());
        Ok(loaded)
    }

    pub fn register(&mut self, template: Template) {
        self.svg.insert(template.id.clone(), template);
    }

    pub fn resolve(&self, format: Format, style: &str) -> ForgeResult<Template> {
        let not_found = || ForgeError::TemplateNotFound {
            format: format.to_string(),
            name: style.to_string(),
        };

        match format {
            Format::Svg => self.svg.get(style).cloned().ok_or_else(not_found),
            Format::Ascii => {
                let font = style.parse::<FontStyle>().map_err(|_| not_found())?;
                Ok(Template { id: font.name().to_string(), body: TemplateBody::AsciiFont(font) })
            }
            Format::Png if style == RASTER_LAYOUT => {
                Ok(Template { id: RASTER_LAYOUT.to_string(), body: TemplateBody::Raster })
            }
            Format::Png => Err(not_found()),
        }
    }

    pub fn preset(&self, name: &str) -> ForgeResult<&Preset> {
        self.presets
            .get(name)
            .ok_or_else(|| ForgeError::PresetNotFound(name.to_string()))
    }

    pub fn svg_styles(&self) -> Vec<&str> {
        self.svg.keys().map(String::as_str).collect()
    }

    pub fn presets(&self) -> impl Iterator<Item = (&str, &Preset)> {
        self.presets.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::builtin()
    }
}

mod builtin {
    use crate::raster::Effect;

    // Layout is authored in a 1200x300 design space; WIDTH/HEIGHT stretch it
    // to fill the canvas on both axes.
    const DESIGN_W: u32 = 1200;
    const DESIGN_H: u32 = 300;

    const SKELETON: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<svg width="{{WIDTH}}" height="{{HEIGHT}}" viewBox="0 0 1200 300" preserveAspectRatio="none" xmlns="http://www.w3.org/2000/svg" role="img" aria-label="{{TEXT}}">
  <defs>
    <linearGradient id="grad1" x1="0%" y1="0%" x2="100%" y2="100%">
      <stop offset="0%" stop-color="{{GRADIENT_START}}" stop-opacity="1"/>
      <stop offset="100%" stop-color="{{GRADIENT_END}}" stop-opacity="1"/>
    </linearGradient>
@DEFS@  </defs>
  <rect width="100%" height="100%" fill="{{BG_COLOR}}"/>
  <!-- accent shapes -->
@ACCENT@  <!-- main text -->
  <text x="600" y="165" font-family="Orbitron,Inter,Arial" font-size="60" font-weight="700" fill="@TITLE_FILL@" text-anchor="middle"@TITLE_ATTRS@>{{TEXT}}@TITLE_CHILD@</text>
  <!-- subtitle -->
  <text x="600" y="234" font-family="Inter,Arial,Helvetica" font-size="22" fill="{{MUTED_COLOR}}" text-anchor="middle">{{SUBTITLE}}</text>
</svg>
"#;

    const GLOW_FILTER: &str = r#"    <filter id="glow"><feGaussianBlur stdDeviation="2" result="coloredBlur"/><feMerge><feMergeNode in="coloredBlur"/><feMergeNode in="SourceGraphic"/></feMerge></filter>
"#;

    const ANIMATED_GRADIENT: &str = r#"    <linearGradient id="animGrad" x1="0%" y1="0%" x2="100%" y2="0%">
      <stop offset="0%" stop-color="{{GRADIENT_START}}"><animate attributeName="stop-color" values="{{GRADIENT_START}};{{GRADIENT_END}};{{GRADIENT_START}}" dur="3s" repeatCount="indefinite"/></stop>
      <stop offset="100%" stop-color="{{GRADIENT_END}}"><animate attributeName="stop-color" values="{{GRADIENT_END}};{{GRADIENT_START}};{{GRADIENT_END}}" dur="3s" repeatCount="indefinite"/></stop>
    </linearGradient>
"#;

    const PULSE: &str = r#"<animate attributeName="opacity" values="0.8;1;0.8" dur="2s" repeatCount="indefinite"/>"#;

    struct Parts {
        defs: String,
        accent: String,
        title_fill: &'static str,
        title_attrs: &'static str,
        title_child: &'static str,
    }

    impl Parts {
        fn plain(accent: String) -> Self {
            Self {
                defs: String::new(),
                accent,
                title_fill: "{{TEXT_COLOR}}",
                title_attrs: "",
                title_child: "",
            }
        }

        fn assemble(self) -> String {
            SKELETON
                .replace("@DEFS@", &self.defs)
                .replace("@ACCENT@", &self.accent)
                .replace("@TITLE_FILL@", self.title_fill)
                .replace("@TITLE_ATTRS@", self.title_attrs)
                .replace("@TITLE_CHILD@", self.title_child)
        }
    }

    fn indent(lines: impl IntoIterator<Item = String>) -> String {
        lines.into_iter().map(|l| format!("  {}\n", l)).collect()
    }

    fn wave() -> String {
        indent([
            r#"<path d="M0 195 C 300 120, 900 270, 1200 180 L 1200 300 L 0 300 Z" fill="{{ACCENT_COLOR}}" opacity="0.12"/>"#.to_string(),
        ])
    }

    fn geometric() -> String {
        indent([
            r#"<circle cx="180" cy="60" r="45" fill="{{ACCENT_COLOR}}" opacity="0.1"/>"#.to_string(),
            r#"<circle cx="1020" cy="240" r="60" fill="{{ACCENT_COLOR}}" opacity="0.07"/>"#.to_string(),
            r#"<rect x="840" y="30" width="240" height="45" fill="{{ACCENT_COLOR}}" opacity="0.05" transform="rotate(15 960 52.5)"/>"#.to_string(),
        ])
    }

    fn grid() -> String {
        let spacing = 50;
        let vertical = (0..DESIGN_W).step_by(spacing).map(|x| {
            format!(r#"<line x1="{x}" y1="0" x2="{x}" y2="{DESIGN_H}" stroke="{{{{ACCENT_COLOR}}}}" opacity="0.05"/>"#)
        });
        let horizontal = (0..DESIGN_H).step_by(spacing).map(|y| {
            format!(r#"<line x1="0" y1="{y}" x2="{DESIGN_W}" y2="{y}" stroke="{{{{ACCENT_COLOR}}}}" opacity="0.05"/>"#)
        });
        indent(vertical.chain(horizontal))
    }

    /// Fixed-seed LCG so the particle field is identical on every run.
    fn particles() -> String {
        let mut state: u64 = 42;
        let mut next = |bound: u64| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) % bound
        };
        let dots: Vec<String> = (0..30)
            .map(|_| {
                let x = next(DESIGN_W as u64 + 1);
                let y = next(DESIGN_H as u64 + 1);
                let r = 2 + next(7);
                format!(r#"<circle cx="{x}" cy="{y}" r="{r}" fill="{{{{ACCENT_COLOR}}}}" opacity="0.08"/>"#)
            })
            .collect();
        indent(dots)
    }

    pub fn svg_templates() -> Vec<(&'static str, String)> {
        let glow = Parts {
            defs: GLOW_FILTER.to_string(),
            title_attrs: r#" filter="url(#glow)""#,
            ..Parts::plain(wave())
        };
        let animated = Parts {
            defs: ANIMATED_GRADIENT.to_string(),
            title_fill: "url(#animGrad)",
            title_child: PULSE,
            ..Parts::plain(wave())
        };

        vec![
            ("wave", Parts::plain(wave()).assemble()),
            ("geometric", Parts::plain(geometric()).assemble()),
            ("grid", Parts::plain(grid()).assemble()),
            ("particles", Parts::plain(particles()).assemble()),
            ("glow", glow.assemble()),
            ("animated", animated.assemble()),
        ]
    }

    // name, svg style, palette, png effects
    pub const PRESETS: &[(&str, &str, &str, &[Effect])] = &[
        ("minimal", "wave", "stealth", &[]),
        ("professional", "grid", "royal", &[Effect::Shadow]),
        ("creative", "geometric", "sunset", &[Effect::Glow, Effect::Gradient]),
        ("tech", "glow", "neon", &[Effect::Glow]),
        ("nature", "wave", "forest", &[Effect::Blur]),
        ("cyberpunk", "particles", "cyberpunk", &[Effect::Glow, Effect::Shadow]),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_builtin_svg_styles() {
        let store = TemplateStore::builtin();
        assert_eq!(
            store.svg_styles(),
            vec!["animated", "geometric", "glow", "grid", "particles", "wave"]
        );
        for style in store.svg_styles() {
            let template = store.resolve(Format::Svg, style).unwrap();
            let TemplateBody::Svg(markup) = &template.body else {
                panic!("svg template expected");
            };
            assert!(markup.contains("{{TEXT}}"));
            assert!(markup.contains("{{SUBTITLE}}"));
            assert!(!markup.contains('@'), "unfilled slot in {}", style);
        }
    }

    #[test]
    fn test_design_space_stretches_to_canvas() {
        let store = TemplateStore::builtin();
        for style in store.svg_styles() {
            let template = store.resolve(Format::Svg, style).unwrap();
            let TemplateBody::Svg(markup) = &template.body else { unreachable!() };
            assert!(markup.contains(r#"viewBox="0 0 1200 300" preserveAspectRatio="none""#), "{}", style);
        }
    }

    #[test]
    fn test_accent_token_present() {
        let store = TemplateStore::builtin();
        let template = store.resolve(Format::Svg, "grid").unwrap();
        let TemplateBody::Svg(markup) = template.body else { unreachable!() };
        assert!(markup.contains(r#"stroke="{{ACCENT_COLOR}}""#));
    }

    #[test]
    fn test_resolve_ascii_font() {
        let store = TemplateStore::builtin();
        let template = store.resolve(Format::Ascii, "block").unwrap();
        assert_eq!(template.body, TemplateBody::AsciiFont(FontStyle::Block));
        assert_eq!(template.format(), Format::Ascii);
    }

    #[test]
    fn test_resolve_missing_fails() {
        let store = TemplateStore::builtin();
        for (format, style) in [(Format::Svg, "nope"), (Format::Ascii, "comic"), (Format::Png, "wave")] {
            let err = store.resolve(format, style).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
        assert_eq!(store.preset("nope").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_presets_reference_builtins() {
        let store = TemplateStore::builtin();
        let palettes = crate::palettes::PaletteStore::builtin();
        for (name, preset) in store.presets() {
            assert!(store.resolve(Format::Svg, &preset.style).is_ok(), "{}", name);
            assert!(palettes.resolve(&preset.palette).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plain.svg"), "<svg>{{TEXT}}</svg>").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut store = TemplateStore::builtin();
        assert_eq!(store.load_dir(dir.path()).unwrap(), 1);
        let template = store.resolve(Format::Svg, "plain").unwrap();
        assert_eq!(template.body, TemplateBody::Svg("<svg>{{TEXT}}</svg>".into()));
    }
}
