//! Configuration for a comparison run.
//!
//! `ComparisonConfig` is threaded explicitly through the pipeline entry point; nothing in
//! the engine reads process-wide state. All tolerance choices that can change a diff outcome
//! live here with pinned defaults.

use crate::error_codes;
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Absolute epsilon for numeric cell comparison.
pub const DEFAULT_ABSOLUTE_EPSILON: f64 = 1e-9;
/// Relative epsilon (scaled by the larger magnitude) for numeric cell comparison.
pub const DEFAULT_RELATIVE_EPSILON: f64 = 1e-12;

/// Two numbers are equal when `|a - b| <= absolute`, or when `|a - b| <= relative *
/// max(|a|, |b|)` and they are not two distinct integers. Integers up to 2^53 are exact in
/// an `f64`, so the relative term only absorbs rounding noise, never a change of identifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericTolerance {
    pub absolute: f64,
    pub relative: f64,
}

impl Default for NumericTolerance {
    fn default() -> Self {
        Self {
            absolute: DEFAULT_ABSOLUTE_EPSILON,
            relative: DEFAULT_RELATIVE_EPSILON,
        }
    }
}

impl NumericTolerance {
    pub fn exact() -> Self {
        Self {
            absolute: 0.0,
            relative: 0.0,
        }
    }

    pub fn approx_eq(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        if a.is_nan() || b.is_nan() {
            return a.is_nan() && b.is_nan();
        }
        if !a.is_finite() || !b.is_finite() {
            return false;
        }
        let diff = (a - b).abs();
        if diff <= self.absolute {
            return true;
        }
        if is_exact_integer(a) && is_exact_integer(b) {
            return false;
        }
        diff <= self.relative * a.abs().max(b.abs())
    }
}

/// 2^53: every integer of at most this magnitude has an exact `f64` representation.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn is_exact_integer(n: f64) -> bool {
    n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER
}

/// Resolution at which two dates are compared. `Exact` compares the full instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateGranularity {
    #[default]
    Exact,
    Second,
    Minute,
    Day,
}

impl DateGranularity {
    pub fn truncate(self, dt: NaiveDateTime) -> NaiveDateTime {
        let truncated = match self {
            DateGranularity::Exact => return dt,
            DateGranularity::Second => dt.with_nanosecond(0),
            DateGranularity::Minute => dt.date().and_hms_opt(dt.hour(), dt.minute(), 0),
            DateGranularity::Day => dt.date().and_hms_opt(0, 0, 0),
        };
        truncated.unwrap_or(dt)
    }
}

/// What happens when two rows of one dataset share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeyPolicy {
    /// The first row in source order stays canonical; later rows are diverted.
    #[default]
    FirstWins,
    /// The latest row replaces the canonical row; the key keeps its first-seen position.
    LastWins,
    /// A repeated key aborts the run.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Leaf identifiers of the key columns, in key-tuple order.
    pub key_columns: Vec<String>,
    /// Leaf identifiers excluded from cell comparison.
    #[serde(deserialize_with = "dedup_columns")]
    pub ignore_columns: Vec<String>,
    pub numeric_tolerance: NumericTolerance,
    pub date_granularity: DateGranularity,
    #[serde(alias = "duplicates")]
    pub duplicate_key_policy: DuplicateKeyPolicy,
    /// Compare strings that parse as finite numbers numerically (`"1"` == `1`).
    pub coerce_numeric_text: bool,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            key_columns: Vec::new(),
            ignore_columns: Vec::new(),
            numeric_tolerance: NumericTolerance::default(),
            date_granularity: DateGranularity::Exact,
            duplicate_key_policy: DuplicateKeyPolicy::FirstWins,
            coerce_numeric_text: true,
        }
    }
}

impl ComparisonConfig {
    pub fn new<I, S>(key_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key_columns: key_columns.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn builder() -> ComparisonConfigBuilder {
        ComparisonConfigBuilder {
            inner: ComparisonConfig::default(),
        }
    }

    /// A builder seeded with this config, for layering overrides on a loaded file.
    pub fn into_builder(self) -> ComparisonConfigBuilder {
        ComparisonConfigBuilder { inner: self }
    }

    pub fn is_ignored(&self, column_id: &str) -> bool {
        self.ignore_columns.iter().any(|c| c == column_id)
    }

    pub fn is_key(&self, column_id: &str) -> bool {
        self.key_columns.iter().any(|c| c == column_id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_columns.is_empty() {
            return Err(ConfigError::NoKeyColumns);
        }

        for (idx, key) in self.key_columns.iter().enumerate() {
            if key.trim().is_empty() {
                return Err(ConfigError::BlankColumn {
                    field: "key_columns",
                });
            }
            if self.key_columns[..idx].contains(key) {
                return Err(ConfigError::RepeatedKeyColumn {
                    column: key.clone(),
                });
            }
            if self.is_ignored(key) {
                return Err(ConfigError::KeyColumnIgnored {
                    column: key.clone(),
                });
            }
        }

        if self.ignore_columns.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::BlankColumn {
                field: "ignore_columns",
            });
        }

        ensure_tolerance(self.numeric_tolerance.absolute, "numeric_tolerance.absolute")?;
        ensure_tolerance(self.numeric_tolerance.relative, "numeric_tolerance.relative")?;

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("[TDIFF_CFG_001] no key columns configured. Suggestion: name at least one key column.")]
    NoKeyColumns,
    #[error("[TDIFF_CFG_002] {field} contains a blank column name.")]
    BlankColumn { field: &'static str },
    #[error("[TDIFF_CFG_003] key column '{column}' is listed more than once.")]
    RepeatedKeyColumn { column: String },
    #[error("[TDIFF_CFG_004] key column '{column}' is also ignored. Suggestion: remove it from the ignore list.")]
    KeyColumnIgnored { column: String },
    #[error("[TDIFF_CFG_005] {field} must be finite and non-negative (got {value})")]
    InvalidTolerance { field: &'static str, value: f64 },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::NoKeyColumns => error_codes::CONFIG_NO_KEY_COLUMNS,
            ConfigError::BlankColumn { .. } => error_codes::CONFIG_BLANK_COLUMN,
            ConfigError::RepeatedKeyColumn { .. } => error_codes::CONFIG_REPEATED_KEY_COLUMN,
            ConfigError::KeyColumnIgnored { .. } => error_codes::CONFIG_KEY_COLUMN_IGNORED,
            ConfigError::InvalidTolerance { .. } => error_codes::CONFIG_INVALID_TOLERANCE,
        }
    }
}

/// Keeps the first occurrence of each column name, in file order.
fn dedup_columns<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let columns = Vec::<String>::deserialize(deserializer)?;
    let mut unique: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns {
        if !unique.contains(&column) {
            unique.push(column);
        }
    }
    Ok(unique)
}

fn ensure_tolerance(value: f64, field: &'static str) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidTolerance { field, value });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ComparisonConfigBuilder {
    inner: ComparisonConfig,
}

impl Default for ComparisonConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ComparisonConfigBuilder {
    pub fn new() -> Self {
        ComparisonConfig::builder()
    }

    pub fn key_column(mut self, column: impl Into<String>) -> Self {
        self.inner.key_columns.push(column.into());
        self
    }

    pub fn key_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.key_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a column to the ignore set; repeats are collapsed.
    pub fn ignore_column(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        if !self.inner.is_ignored(&column) {
            self.inner.ignore_columns.push(column);
        }
        self
    }

    pub fn ignore_columns<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        columns
            .into_iter()
            .fold(self, |builder, column| builder.ignore_column(column))
    }

    pub fn numeric_tolerance(mut self, value: NumericTolerance) -> Self {
        self.inner.numeric_tolerance = value;
        self
    }

    pub fn absolute_epsilon(mut self, value: f64) -> Self {
        self.inner.numeric_tolerance.absolute = value;
        self
    }

    pub fn relative_epsilon(mut self, value: f64) -> Self {
        self.inner.numeric_tolerance.relative = value;
        self
    }

    pub fn date_granularity(mut self, value: DateGranularity) -> Self {
        self.inner.date_granularity = value;
        self
    }

    pub fn duplicate_key_policy(mut self, value: DuplicateKeyPolicy) -> Self {
        self.inner.duplicate_key_policy = value;
        self
    }

    pub fn coerce_numeric_text(mut self, value: bool) -> Self {
        self.inner.coerce_numeric_text = value;
        self
    }

    pub fn build(self) -> Result<ComparisonConfig, ConfigError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn defaults_pin_tolerances() {
        let cfg = ComparisonConfig::default();
        assert_eq!(cfg.numeric_tolerance.absolute, 1e-9);
        assert_eq!(cfg.numeric_tolerance.relative, 1e-12);
        assert_eq!(cfg.date_granularity, DateGranularity::Exact);
        assert_eq!(cfg.duplicate_key_policy, DuplicateKeyPolicy::FirstWins);
        assert!(cfg.coerce_numeric_text);
    }

    #[test]
    fn serde_roundtrip_preserves_config() {
        let cfg = ComparisonConfig::builder()
            .key_column("id")
            .ignore_column("updated_at")
            .date_granularity(DateGranularity::Day)
            .build()
            .expect("valid config");
        let json = serde_json::to_string(&cfg).expect("serialize config");
        let parsed: ComparisonConfig = serde_json::from_str(&json).expect("deserialize config");
        assert_eq!(cfg, parsed);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{
            "key_columns": ["id"],
            "duplicates": "last_wins",
            "numeric_tolerance": { "absolute": 0.01 }
        }"#;
        let cfg: ComparisonConfig = serde_json::from_str(json).expect("deserialize partial");
        assert_eq!(cfg.key_columns, vec!["id"]);
        assert_eq!(cfg.duplicate_key_policy, DuplicateKeyPolicy::LastWins);
        assert_eq!(cfg.numeric_tolerance.absolute, 0.01);
        assert_eq!(cfg.numeric_tolerance.relative, DEFAULT_RELATIVE_EPSILON);
    }

    #[test]
    fn json_ignore_columns_are_deduplicated() {
        let json = r#"{ "key_columns": ["id"], "ignore_columns": ["a", "b", "a"] }"#;
        let cfg: ComparisonConfig = serde_json::from_str(json).expect("deserialize config");
        assert_eq!(cfg.ignore_columns, vec!["a", "b"]);
    }

    #[test]
    fn builder_rejects_missing_keys() {
        let err = ComparisonConfig::builder()
            .build()
            .expect_err("keys are required");
        assert_eq!(err, ConfigError::NoKeyColumns);
    }

    #[test]
    fn builder_rejects_ignored_key() {
        let err = ComparisonConfig::builder()
            .key_column("id")
            .ignore_column("id")
            .build()
            .expect_err("key cannot be ignored");
        assert!(matches!(err, ConfigError::KeyColumnIgnored { ref column } if column == "id"));
        assert_eq!(err.code(), error_codes::CONFIG_KEY_COLUMN_IGNORED);
    }

    #[test]
    fn builder_rejects_negative_tolerance() {
        let err = ComparisonConfig::builder()
            .key_column("id")
            .absolute_epsilon(-1.0)
            .build()
            .expect_err("negative epsilon");
        assert!(matches!(
            err,
            ConfigError::InvalidTolerance { field: "numeric_tolerance.absolute", .. }
        ));
    }

    #[test]
    fn ignore_columns_are_deduplicated() {
        let cfg = ComparisonConfig::builder()
            .key_column("id")
            .ignore_columns(["a", "b", "a"])
            .build()
            .expect("valid config");
        assert_eq!(cfg.ignore_columns, vec!["a", "b"]);
    }

    #[test]
    fn tolerance_uses_absolute_near_zero_and_relative_for_large_values() {
        let tol = NumericTolerance::default();
        assert!(tol.approx_eq(1.0, 1.0 + 1e-10));
        assert!(!tol.approx_eq(1.0, 1.0 + 1e-8));
        assert!(tol.approx_eq(1e12, 1e12 + 0.5));
        assert!(!tol.approx_eq(1e12, 1e12 + 2.0));
        assert!(tol.approx_eq(f64::NAN, f64::NAN));
        assert!(!tol.approx_eq(f64::INFINITY, 1e308));
        assert!(!NumericTolerance::exact().approx_eq(1.0, 1.0 + 1e-12));
    }

    #[test]
    fn distinct_integers_never_fall_within_relative_tolerance() {
        let tol = NumericTolerance::default();
        assert!(!tol.approx_eq(12_345_678_901_234.0, 12_345_678_901_235.0));
        assert!(!tol.approx_eq(100_000_000_000_000.0, 100_000_000_000_001.0));
        assert!(tol.approx_eq(12_345_678_901_234.0, 12_345_678_901_234.004));

        let loose = NumericTolerance {
            absolute: 1.0,
            relative: 0.0,
        };
        assert!(loose.approx_eq(10.0, 11.0));
    }

    #[test]
    fn date_granularity_truncates() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 6)
            .and_then(|d| d.and_hms_milli_opt(13, 45, 30, 250))
            .expect("valid datetime");
        assert_eq!(DateGranularity::Exact.truncate(dt), dt);
        assert_eq!(
            DateGranularity::Second.truncate(dt).to_string(),
            "2024-05-06 13:45:30"
        );
        assert_eq!(
            DateGranularity::Minute.truncate(dt).to_string(),
            "2024-05-06 13:45:00"
        );
        assert_eq!(
            DateGranularity::Day.truncate(dt).to_string(),
            "2024-05-06 00:00:00"
        );
    }
}
