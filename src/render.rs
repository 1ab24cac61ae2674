//! Renderer - Format Dispatch
//!
//! `render` validates the request, then dispatches on the template body:
//! block letters for ASCII, token substitution for SVG, rasterizing for PNG.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::ascii;
use crate::error::{ForgeError, ForgeResult};
use crate::fonts::FontFace;
use crate::palettes::Palette;
use crate::raster::{self, Effect};
use crate::templates::{Format, Template, TemplateBody};
use crate::validation::{BannerInput, Validator};

pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub text: String,
    pub subtitle: Option<String>,
    pub width: u32,
    pub height: u32,
    pub effects: Vec<Effect>,
    /// PNG text font; block glyphs when `None`
    pub font: Option<FontFace>,
}

impl RenderRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            subtitle: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            effects: vec![],
            font: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: Option<String>) -> Self {
        self.subtitle = subtitle;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_effects(mut self, effects: Vec<Effect>) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_font(mut self, font: Option<FontFace>) -> Self {
        self.font = font;
        self
    }

    fn input(&self) -> BannerInput<'_> {
        BannerInput {
            text: &self.text,
            subtitle: self.subtitle.as_deref(),
            width: self.width,
            height: self.height,
        }
    }
}

/// Rendered output for one format, written once then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub format: Format,
    pub bytes: Vec<u8>,
}

pub fn render(request: &RenderRequest, palette: &Palette, template: &Template) -> ForgeResult<Artifact> {
    let validation = Validator::new().validate(&request.input()).into_result()?;
    for warning in validation.warnings() {
        warn!(rule = %warning.rule, "{}", warning.message);
    }

    let subtitle = request.subtitle.as_deref();
    let bytes = match &template.body {
        TemplateBody::AsciiFont(font) => ascii::banner(&request.text, subtitle, *font).into_bytes(),
        TemplateBody::Svg(markup) => {
            let values = svg_values(request, palette);
            substitute(&template.id, markup, &values)?.into_bytes()
        }
        TemplateBody::Raster => raster::render_png(
            &request.text,
            subtitle,
            palette,
            request.width,
            request.height,
            &request.effects,
            request.font.as_ref(),
        )?,
    };

    debug!(format = %template.format(), template = %template.id, bytes = bytes.len(), "rendered");
    Ok(Artifact { format: template.format(), bytes })
}

fn svg_values(request: &RenderRequest, palette: &Palette) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("TEXT", xml_escape(&request.text)),
        ("SUBTITLE", request.subtitle.as_deref().map(xml_escape).unwrap_or_default()),
        ("ACCENT_COLOR", palette.accent.to_string()),
        ("BG_COLOR", palette.background.to_string()),
        ("TEXT_COLOR", palette.text.to_string()),
        ("MUTED_COLOR", palette.muted.to_string()),
        ("GRADIENT_START", palette.gradient_start.to_string()),
        ("GRADIENT_END", palette.gradient_end.to_string()),
        ("WIDTH", request.width.to_string()),
        ("HEIGHT", request.height.to_string()),
    ])
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("token pattern is valid")
    })
}

fn leftover_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{[^{}]{0,40}(\}\})?").expect("leftover pattern is valid"))
}

/// Replace every `{{TOKEN}}` in `markup`. Any token left behind is an error.
pub fn substitute(
    template_id: &str,
    markup: &str,
    values: &BTreeMap<&'static str, String>,
) -> ForgeResult<String> {
    let mut unknown: Vec<String> = vec![];
    let rendered = token_pattern().replace_all(markup, |caps: &Captures| match values.get(&caps[1]) {
        Some(value) => value.clone(),
        None => {
            unknown.push(caps[0].to_string());
            caps[0].to_string()
        }
    });

    if unknown.is_empty() && rendered.contains("{{") {
        unknown = leftover_pattern()
            .find_iter(&rendered)
            .map(|m| m.as_str().to_string())
            .collect();
    }

    if !unknown.is_empty() {
        unknown.sort();
        unknown.dedup();
        return Err(ForgeError::UnresolvedPlaceholders { template: template_id.to_string(), tokens: unknown });
    }
    Ok(rendered.into_owned())
}

/// Escape text for element content and attribute values. Braces are escaped
/// too so user text can never introduce a `{{` sequence.
pub fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}
