//! Palette Store - Named Color Schemes
//!
//! Built-in palettes are always present; custom palette files are merged on
//! top at startup. The store is immutable once handed to the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ForgeError, ForgeResult};

pub type PaletteName = String;

/// Palette used when no name is supplied at all.
pub const DEFAULT_PALETTE: &str = "stealth";

/// A validated `#rgb` / `#rrggbb` color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    pub fn parse(value: &str) -> Option<Self> {
        let digits = value.strip_prefix('#')?;
        if !matches!(digits.len(), 3 | 6) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(format!("#{}", expand_short(digits).to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn rgb(&self) -> [u8; 3] {
        let digits = &self.0[1..];
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).unwrap_or(0);
        [channel(0), channel(2), channel(4)]
    }

    pub fn rgba(&self, alpha: u8) -> [u8; 4] {
        let [r, g, b] = self.rgb();
        [r, g, b, alpha]
    }
}

fn expand_short(digits: &str) -> String {
    if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    }
}

impl TryFrom<String> for HexColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid hex color '{}'", value))
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

impl std::fmt::Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// On-disk palette record: a flat key-value color map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteRecord {
    pub bg: String,
    pub accent: String,
    pub text: String,
    pub muted: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient_end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub name: PaletteName,
    pub background: HexColor,
    pub accent: HexColor,
    pub text: HexColor,
    pub muted: HexColor,
    pub gradient_start: HexColor,
    pub gradient_end: HexColor,
}

impl Palette {
    pub fn from_record(name: &str, record: &PaletteRecord) -> ForgeResult<Self> {
        let color = |field: &str, value: &str| {
            HexColor::parse(value).ok_or_else(|| ForgeError::InvalidColor {
                field: format!("{}.{}", name, field),
                value: value.to_string(),
            })
        };

        let accent = color("accent", &record.accent)?;
        let gradient_start = match &record.gradient_start {
            Some(v) => color("gradient_start", v)?,
            None => accent.clone(),
        };
        let gradient_end = match &record.gradient_end {
            Some(v) => color("gradient_end", v)?,
            None => accent.clone(),
        };

        Ok(Self {
            name: name.to_string(),
            background: color("bg", &record.bg)?,
            text: color("text", &record.text)?,
            muted: color("muted", &record.muted)?,
            accent,
            gradient_start,
            gradient_end,
        })
    }

    pub fn to_record(&self) -> PaletteRecord {
        PaletteRecord {
            bg: self.background.to_string(),
            accent: self.accent.to_string(),
            text: self.text.to_string(),
            muted: self.muted.to_string(),
            gradient_start: Some(self.gradient_start.to_string()),
            gradient_end: Some(self.gradient_end.to_string()),
        }
    }
}

// name, bg, accent, text, muted, gradient_start, gradient_end
const BUILTIN: &[[&str; 7]] = &[
    ["stealth", "#0a0f14", "#00ffff", "#ffffff", "#9aa4ad", "#00ffff", "#0088ff"],
    ["ember", "#0f0a07", "#ff8a3b", "#f5e9e3", "#c9b5a3", "#ff8a3b", "#ff4d4d"],
    ["forest", "#0d1b0e", "#4ade80", "#e8f5e9", "#81c784", "#4ade80", "#22c55e"],
    ["ocean", "#0a1628", "#38bdf8", "#e0f2fe", "#7dd3fc", "#38bdf8", "#0ea5e9"],
    ["sunset", "#1a0f1e", "#f472b6", "#fce7f3", "#f9a8d4", "#f472b6", "#ec4899"],
    ["neon", "#000000", "#00ff41", "#00ff41", "#39ff14", "#00ff41", "#39ff14"],
    ["royal", "#1e1b4b", "#fbbf24", "#fef3c7", "#fcd34d", "#fbbf24", "#f59e0b"],
    ["cyberpunk", "#0d0221", "#ff006e", "#f72585", "#b5179e", "#ff006e", "#8338ec"],
    ["matrix", "#000000", "#00ff00", "#00ff00", "#008f00", "#00ff00", "#00aa00"],
];

/// Palette store - resolves palettes by name, fails closed
#[derive(Debug, Clone)]
pub struct PaletteStore {
    palettes: BTreeMap<PaletteName, Palette>,
}

impl PaletteStore {
    pub fn empty() -> Self {
        Self { palettes: BTreeMap::new() }
    }

    pub fn builtin() -> Self {
        let mut store = Self::empty();
        for [name, bg, accent, text, muted, start, end] in BUILTIN {
            let record = PaletteRecord {
                bg: bg.to_string(),
                accent: accent.to_string(),
                text: text.to_string(),
                muted: muted.to_string(),
                gradient_start: Some(start.to_string()),
                gradient_end: Some(end.to_string()),
            };
            // Built-in colors are literals checked by tests.
            if let Ok(palette) = Palette::from_record(name, &record) {
                store.register(palette);
            }
        }
        store
    }

    /// Merge palettes from a JSON or YAML file (chosen by extension).
    pub fn load_file(&mut self, path: &Path) -> ForgeResult<usize> {
        let records = read_records(path)?;
        let count = records.len();
        for (name, record) in &records {
            let palette = Palette::from_record(name, record)?;
            debug!(palette = %name, "loaded custom palette");
            self.register(palette);
        }
        info!("Loaded {} palettes from {}", count, path.display());
        Ok(count)
    }

    pub fn register(&mut self, palette: Palette) {
        self.palettes.insert(palette.name.clone(), palette);
    }

    pub fn resolve(&self, name: &str) -> ForgeResult<&Palette> {
        self.palettes
            .get(name)
            .ok_or_else(|| ForgeError::PaletteNotFound(name.to_string()))
    }

    /// The fixed fallback only covers an absent name; a wrong name still fails.
    pub fn resolve_or_default(&self, name: Option<&str>) -> ForgeResult<&Palette> {
        self.resolve(name.unwrap_or(DEFAULT_PALETTE))
    }

    pub fn list(&self) -> Vec<&Palette> {
        self.palettes.values().collect()
    }
}

impl Default for PaletteStore {
    fn default() -> Self {
        Self::builtin()
    }
}

fn read_records(path: &Path) -> ForgeResult<BTreeMap<String, PaletteRecord>> {
    let content = fs::read_to_string(path).map_err(|e| ForgeError::io(path, e))?;
    if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|e| ForgeError::parse(path, e))
    } else {
        serde_json::from_str(&content).map_err(|e| ForgeError::parse(path, e))
    }
}

pub(crate) fn is_yaml(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == "yaml" || e == "yml")
}

/// Insert `palette` into the palette file at `path`, creating it if needed.
pub fn save_to_file(path: &Path, palette: &Palette) -> ForgeResult<()> {
    let mut records = if path.exists() { read_records(path)? } else { BTreeMap::new() };
    records.insert(palette.name.clone(), palette.to_record());

    let content = if is_yaml(path) {
        serde_yaml::to_string(&records).map_err(|e| ForgeError::parse(path, e))?
    } else {
        serde_json::to_string_pretty(&records)?
    };
    fs::write(path, content).map_err(|e| ForgeError::io(path, e))?;
    info!(palette = %palette.name, "saved palette to {}", path.display());
    Ok(())
}
