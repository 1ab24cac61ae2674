//! Batch Driver
//!
//! Reads a JSON or YAML list of banner entries and renders each one.
//! A failing entry is recorded and the run moves on to the next.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

use crate::error::{ErrorKind, ForgeError, ForgeResult};
use crate::hashing::{compute_report_hash, sha256_hex};
use crate::palettes::is_yaml;
use crate::pipeline::{safe_name, with_suffix, BannerPipeline, BannerSpec};
use crate::raster::Effect;
use crate::templates::Format;
use crate::ENGINE_VERSION;

pub const DEFAULT_OUT_DIR: &str = "batch_banners";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    #[serde(flatten)]
    pub banner: BannerSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<Format>,
    /// Single-format shorthand, used when `formats` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Format>,
    /// Output path prefix relative to the batch output directory.
    #[serde(default, alias = "prefix", skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl BatchEntry {
    pub fn requested_formats(&self) -> Vec<Format> {
        let mut formats = match (self.formats.is_empty(), self.kind) {
            (false, _) => self.formats.clone(),
            (true, Some(kind)) => vec![kind],
            (true, None) => vec![Format::Svg],
        };
        let mut seen = vec![];
        formats.retain(|f| {
            let fresh = !seen.contains(f);
            seen.push(*f);
            fresh
        });
        formats
    }

    /// Output prefix below `out_dir`. An `output` that is absolute or climbs
    /// with `..` is rejected.
    fn output_prefix(&self, out_dir: &Path) -> ForgeResult<PathBuf> {
        let Some(output) = &self.output else {
            return Ok(out_dir.join(safe_name(&self.banner.text)));
        };
        let stem = Path::new(output);
        let escapes = stem.components().any(|c| {
            matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
        });
        if output.trim().is_empty() || escapes {
            return Err(ForgeError::InvalidInput(format!(
                "output '{}' must be a relative path inside the output directory",
                output
            )));
        }
        Ok(out_dir.join(stem))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactRecord {
    pub entry: usize,
    pub format: Format,
    pub path: PathBuf,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryFailure {
    pub entry: usize,
    pub text: String,
    pub format: Option<Format>,
    pub kind: ErrorKind,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub engine_version: String,
    pub entries: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub artifacts: Vec<ArtifactRecord>,
    pub failures: Vec<EntryFailure>,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Write the report as canonical JSON with its own digest attached.
    pub fn write_json(&self, path: &Path) -> ForgeResult<()> {
        let hash = compute_report_hash(self)?;
        let document = serde_json::json!({ "report": self, "report_sha256": hash });
        let content = serde_json::to_string_pretty(&document)?;
        fs::write(path, content).map_err(|e| ForgeError::io(path, e))
    }

    fn record_failure(&mut self, entry: usize, text: &str, format: Option<Format>, err: &ForgeError) {
        warn!(entry, format = ?format, "{}", err);
        self.failures.push(EntryFailure {
            entry,
            text: text.to_string(),
            format,
            kind: err.kind(),
            error: err.to_string(),
        });
    }
}

pub fn load_entries(path: &Path) -> ForgeResult<Vec<BatchEntry>> {
    let content = fs::read_to_string(path).map_err(|e| ForgeError::io(path, e))?;
    if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|e| ForgeError::parse(path, e))
    } else {
        serde_json::from_str(&content).map_err(|e| ForgeError::parse(path, e))
    }
}

/// Run every entry in `spec_path`, writing artifacts below `out_dir`.
///
/// Only an unreadable or unparsable spec file fails the whole run.
pub fn run(pipeline: &BannerPipeline, spec_path: &Path, out_dir: &Path) -> ForgeResult<BatchReport> {
    let entries = load_entries(spec_path)?;
    let total = entries.len();
    let mut report = BatchReport {
        engine_version: ENGINE_VERSION.to_string(),
        entries: total,
        ..Default::default()
    };
    // Paths already written this run, with the entry that owns them.
    let mut claimed: HashMap<PathBuf, usize> = HashMap::new();

    for (index, entry) in entries.iter().enumerate() {
        let number = index + 1;
        let formats = entry.requested_formats();
        info!("[{}/{}] Generating {:?}: {}", number, total, formats, entry.banner.text);

        // One failure per entry when the palette or preset is missing.
        if let Err(e) = pipeline.resolve_palette(&entry.banner) {
            report.record_failure(number, &entry.banner.text, None, &e);
            report.failed += 1;
            continue;
        }

        let prefix = match entry.output_prefix(out_dir) {
            Ok(prefix) => prefix,
            Err(e) => {
                report.record_failure(number, &entry.banner.text, None, &e);
                report.failed += 1;
                continue;
            }
        };

        let mut entry_ok = true;
        for format in formats {
            let path = with_suffix(&prefix, format.extension());
            if let Some(owner) = claimed.get(&path) {
                let e = ForgeError::InvalidInput(format!(
                    "{} was already written by entry {}",
                    path.display(),
                    owner
                ));
                report.record_failure(number, &entry.banner.text, Some(format), &e);
                entry_ok = false;
                continue;
            }
            match pipeline.generate(&entry.banner, format, &path) {
                Ok(artifact) => {
                    claimed.insert(path.clone(), number);
                    report.artifacts.push(ArtifactRecord {
                        entry: number,
                        format,
                        sha256: sha256_hex(&artifact.bytes),
                        path,
                    });
                }
                Err(e) => {
                    report.record_failure(number, &entry.banner.text, Some(format), &e);
                    entry_ok = false;
                }
            }
        }

        if entry_ok {
            report.succeeded += 1;
        } else {
            report.failed += 1;
        }
    }

    info!(
        "Batch complete: {} succeeded, {} failed, {} artifacts in {}",
        report.succeeded,
        report.failed,
        report.artifacts.len(),
        out_dir.display()
    );
    Ok(report)
}

/// Sample entries for `bannerforge example`.
pub fn example_entries() -> Vec<BatchEntry> {
    let entry = |banner: BannerSpec, formats: Vec<Format>| BatchEntry {
        banner,
        formats,
        kind: None,
        output: None,
    };

    vec![
        entry(
            BannerSpec {
                subtitle: Some("Ultimate Banner Creator".into()),
                palette: Some("stealth".into()),
                style: Some("wave".into()),
                ..BannerSpec::new("BannerForge")
            },
            vec![Format::Svg],
        ),
        entry(
            BannerSpec {
                subtitle: Some("Innovation & Future".into()),
                palette: Some("neon".into()),
                width: 1920,
                height: 400,
                effects: vec![Effect::Glow, Effect::Shadow],
                ..BannerSpec::new("Tech Conference 2025")
            },
            vec![Format::Png],
        ),
        entry(
            BannerSpec { font: Some("shadow".into()), ..BannerSpec::new("Welcome") },
            vec![Format::Ascii],
        ),
        entry(
            BannerSpec {
                subtitle: Some("Built by the Community".into()),
                palette: Some("forest".into()),
                animated: true,
                ..BannerSpec::new("Open Source")
            },
            Format::ALL.to_vec(),
        ),
    ]
}

/// Write the sample batch file as JSON or YAML, by extension.
pub fn write_example(path: &Path) -> ForgeResult<()> {
    let entries = example_entries();
    let content = if is_yaml(path) {
        serde_yaml::to_string(&entries).map_err(|e| ForgeError::parse(path, e))?
    } else {
        serde_json::to_string_pretty(&entries)?
    };
    fs::write(path, content).map_err(|e| ForgeError::io(path, e))
}
