//! Utility functions for id derivation and numeric coercion.
//!
//! This module provides shared utility functions that are used across
//! multiple crates in the Greenlight backend, following DRY principles.

use serde_json::Value;

/// Errors that can occur during screenplay id derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenplayIdError {
    /// Filename was empty or whitespace-only
    EmptyFilename,
    /// Filename contained no usable characters after stripping
    NoUsableCharacters,
}

impl std::fmt::Display for ScreenplayIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenplayIdError::EmptyFilename => write!(f, "Filename is empty"),
            ScreenplayIdError::NoUsableCharacters => {
                write!(f, "Filename contains no usable characters")
            }
        }
    }
}

impl std::error::Error for ScreenplayIdError {}

/// Result type for screenplay id derivation.
pub type ScreenplayIdResult<T> = Result<T, ScreenplayIdError>;

/// Known analysis-file suffixes stripped before slugging.
const STRIP_SUFFIXES: &[&str] = &["_analysis_v5", "_analysis_v6", "_analysis"];

/// Derive a URL-safe screenplay id from a source filename.
///
/// The derivation is deterministic: the same filename always yields the
/// same id, across runs and across schema versions of the same script.
///
/// Steps:
/// - strip a trailing `.json` / `.pdf` extension
/// - strip known analysis suffixes (`_analysis_v5`, `_analysis_v6`, ...)
/// - lower-case
/// - map runs of non-alphanumeric characters to single hyphens
/// - trim leading/trailing hyphens
pub fn screenplay_id_from_filename(filename: &str) -> ScreenplayIdResult<String> {
    let name = filename.trim();
    if name.is_empty() {
        return Err(ScreenplayIdError::EmptyFilename);
    }

    let mut stem = name;
    for ext in [".json", ".pdf"] {
        if let Some(stripped) = strip_suffix_ignore_case(stem, ext) {
            stem = stripped;
            break;
        }
    }

    for suffix in STRIP_SUFFIXES {
        if let Some(stripped) = strip_suffix_ignore_case(stem, suffix) {
            stem = stripped;
            break;
        }
    }

    let slug = slugify(stem);
    if slug.is_empty() {
        return Err(ScreenplayIdError::NoUsableCharacters);
    }

    Ok(slug)
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    if s.len() >= suffix.len() && s[s.len() - suffix.len()..].eq_ignore_ascii_case(suffix) {
        Some(&s[..s.len() - suffix.len()])
    } else {
        None
    }
}

/// Lower-case and hyphen-join, collapsing runs of special characters.
fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut pending_hyphen = false;

    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Coerce a JSON value into a finite f64.
///
/// Accepts native numbers and numeric strings. Anything else, including
/// NaN/infinite values and non-numeric strings, falls back to the default.
pub fn coerce_f64(value: &Value, default: f64) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => v,
        _ => default,
    }
}

/// Coerce a JSON value into an i64, with the same tolerance as [`coerce_f64`].
pub fn coerce_i64(value: &Value, default: i64) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|v| v.is_finite()).map(|v| v as i64))
            .unwrap_or(default),
        Value::String(s) => {
            let t = s.trim();
            t.parse::<i64>()
                .ok()
                .or_else(|| t.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64))
                .unwrap_or(default)
        }
        _ => default,
    }
}

/// A number that deserializes leniently from JSON.
///
/// Producer JSON is sloppy: scores arrive as numbers, numeric strings, or
/// garbage. This wrapper parses what it can and falls back to 0.0, so NaN
/// never enters the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LooseNumber(pub f64);

impl LooseNumber {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for LooseNumber {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            Self(v)
        } else {
            Self(0.0)
        }
    }
}

impl<'de> serde::Deserialize<'de> for LooseNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self(coerce_f64(&value, 0.0)))
    }
}

impl serde::Serialize for LooseNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl schemars::JsonSchema for LooseNumber {
    fn schema_name() -> String {
        "LooseNumber".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        f64::json_schema(gen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_from_filename_success_cases() {
        assert_eq!(
            screenplay_id_from_filename("The_Last_Stand_analysis_v5.json").unwrap(),
            "the-last-stand"
        );

        assert_eq!(
            screenplay_id_from_filename("Midnight Run (draft 3)_analysis_v6.json").unwrap(),
            "midnight-run-draft-3"
        );

        // No suffix to strip
        assert_eq!(
            screenplay_id_from_filename("cold_open.json").unwrap(),
            "cold-open"
        );

        // PDF originals slug the same way
        assert_eq!(
            screenplay_id_from_filename("Cold Open.pdf").unwrap(),
            "cold-open"
        );

        // Case variants are stable
        assert_eq!(
            screenplay_id_from_filename("COLD_OPEN_ANALYSIS_V5.JSON").unwrap(),
            "cold-open"
        );
    }

    #[test]
    fn test_id_from_filename_is_deterministic() {
        let a = screenplay_id_from_filename("Night Shift_analysis_v5.json").unwrap();
        let b = screenplay_id_from_filename("Night Shift_analysis_v5.json").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_id_from_filename_error_cases() {
        assert!(matches!(
            screenplay_id_from_filename(""),
            Err(ScreenplayIdError::EmptyFilename)
        ));

        assert!(matches!(
            screenplay_id_from_filename("   "),
            Err(ScreenplayIdError::EmptyFilename)
        ));

        assert!(matches!(
            screenplay_id_from_filename("!!!.json"),
            Err(ScreenplayIdError::NoUsableCharacters)
        ));
    }

    #[test]
    fn test_coerce_f64() {
        assert_eq!(coerce_f64(&json!(7.5), 0.0), 7.5);
        assert_eq!(coerce_f64(&json!("7.5"), 0.0), 7.5);
        assert_eq!(coerce_f64(&json!(" 8 "), 0.0), 8.0);
        assert_eq!(coerce_f64(&json!("n/a"), 0.0), 0.0);
        assert_eq!(coerce_f64(&json!(null), 0.0), 0.0);
        assert_eq!(coerce_f64(&json!([1, 2]), 0.0), 0.0);
    }

    #[test]
    fn test_coerce_i64() {
        assert_eq!(coerce_i64(&json!(14), 0), 14);
        assert_eq!(coerce_i64(&json!("14"), 0), 14);
        assert_eq!(coerce_i64(&json!(13.7), 0), 13);
        assert_eq!(coerce_i64(&json!("garbage"), 0), 0);
    }

    #[test]
    fn test_loose_number_deserialize() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            #[serde(default)]
            score: LooseNumber,
        }

        let w: Wrapper = serde_json::from_value(json!({"score": 8})).unwrap();
        assert_eq!(w.score.value(), 8.0);

        let w: Wrapper = serde_json::from_value(json!({"score": "8.5"})).unwrap();
        assert_eq!(w.score.value(), 8.5);

        let w: Wrapper = serde_json::from_value(json!({"score": "strong"})).unwrap();
        assert_eq!(w.score.value(), 0.0);

        let w: Wrapper = serde_json::from_value(json!({})).unwrap();
        assert_eq!(w.score.value(), 0.0);
    }
}
