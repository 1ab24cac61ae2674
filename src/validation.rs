//! Validation System - Rule/Policy Separation
//!
//! Rules produce structured violations.
//! Errors block rendering, warnings are only logged.

use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, ForgeResult};

pub const MAX_TEXT_CHARS: usize = 120;
pub const MAX_SUBTITLE_CHARS: usize = 200;
/// Titles longer than this get scaled down hard in raster output.
pub const COMFORTABLE_TEXT_CHARS: usize = 40;

pub const MIN_WIDTH: u32 = 64;
pub const MIN_HEIGHT: u32 = 32;
pub const MAX_DIMENSION: u32 = 8192;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl ValidationViolation {
    fn error(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            severity: ViolationSeverity::Error,
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    fn with_expected(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
}

impl ValidationResult {
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations.iter().filter(|v| v.severity == ViolationSeverity::Warning)
    }

    /// Collapse error violations into a single `InvalidInput`.
    pub fn into_result(self) -> ForgeResult<Self> {
        if self.valid {
            return Ok(self);
        }
        let messages: Vec<_> = self
            .violations
            .iter()
            .filter(|v| v.severity == ViolationSeverity::Error)
            .map(|v| match (&v.expected, &v.actual) {
                (Some(expected), Some(actual)) => {
                    format!("{}: {} (expected {}, got {})", v.rule, v.message, expected, actual)
                }
                _ => format!("{}: {}", v.rule, v.message),
            })
            .collect();
        Err(ForgeError::InvalidInput(messages.join("; ")))
    }
}

/// Input for validation
#[derive(Debug, Clone, Copy)]
pub struct BannerInput<'a> {
    pub text: &'a str,
    pub subtitle: Option<&'a str>,
    pub width: u32,
    pub height: u32,
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, input: &BannerInput<'_>) -> Vec<ValidationViolation>;
}

fn check_line(rule: &str, label: &str, value: &str, max_chars: usize) -> Vec<ValidationViolation> {
    let mut violations = vec![];
    if value.trim().is_empty() {
        violations.push(ValidationViolation::error(rule, format!("{} must not be empty", label)));
    }
    if value.chars().any(char::is_control) {
        violations.push(ValidationViolation::error(
            rule,
            format!("{} must be a single line without control characters", label),
        ));
    }
    let count = value.chars().count();
    if count > max_chars {
        violations.push(
            ValidationViolation::error(rule, format!("{} is too long", label))
                .with_expected(format!("at most {} characters", max_chars), format!("{} characters", count)),
        );
    }
    violations
}

// --- Concrete Rules ---

pub struct TextRule;

impl ValidationRule for TextRule {
    fn name(&self) -> &'static str { "text" }

    fn validate(&self, input: &BannerInput<'_>) -> Vec<ValidationViolation> {
        let mut violations = check_line(self.name(), "Banner text", input.text, MAX_TEXT_CHARS);
        let count = input.text.chars().count();
        if violations.is_empty() && count > COMFORTABLE_TEXT_CHARS {
            violations.push(ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Warning,
                message: "Long banner text will be scaled down".to_string(),
                expected: Some(format!("{} characters or fewer", COMFORTABLE_TEXT_CHARS)),
                actual: Some(format!("{} characters", count)),
            });
        }
        violations
    }
}

pub struct SubtitleRule;

impl ValidationRule for SubtitleRule {
    fn name(&self) -> &'static str { "subtitle" }

    fn validate(&self, input: &BannerInput<'_>) -> Vec<ValidationViolation> {
        match input.subtitle {
            Some(subtitle) => check_line(self.name(), "Subtitle", subtitle, MAX_SUBTITLE_CHARS),
            None => vec![],
        }
    }
}

pub struct DimensionsRule;

impl ValidationRule for DimensionsRule {
    fn name(&self) -> &'static str { "dimensions" }

    fn validate(&self, input: &BannerInput<'_>) -> Vec<ValidationViolation> {
        let width_ok = (MIN_WIDTH..=MAX_DIMENSION).contains(&input.width);
        let height_ok = (MIN_HEIGHT..=MAX_DIMENSION).contains(&input.height);
        if width_ok && height_ok {
            return vec![];
        }
        vec![ValidationViolation::error(self.name(), "Canvas size out of range").with_expected(
            format!(
                "{}..={} x {}..={}",
                MIN_WIDTH, MAX_DIMENSION, MIN_HEIGHT, MAX_DIMENSION
            ),
            format!("{}x{}", input.width, input.height),
        )]
    }
}

/// Validator runs every rule and applies the blocking policy
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![Box::new(TextRule), Box::new(SubtitleRule), Box::new(DimensionsRule)],
        }
    }

    pub fn validate(&self, input: &BannerInput<'_>) -> ValidationResult {
        let violations: Vec<_> = self.rules.iter().flat_map(|rule| rule.validate(input)).collect();
        let valid = !violations.iter().any(|v| v.severity == ViolationSeverity::Error);
        ValidationResult { valid, violations }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
