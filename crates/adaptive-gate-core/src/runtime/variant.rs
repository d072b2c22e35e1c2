// crates/adaptive-gate-core/src/runtime/variant.rs
// ============================================================================
// Module: Variant Assigner
// Description: Deterministic traffic splitting for A/B experiments.
// Purpose: Parse split specifications and map contexts onto variant buckets.
// Dependencies: crate::core, rand, serde
// ============================================================================

//! ## Overview
//! A split specification such as `control:50,variant:50` is parsed into
//! ordered, weighted variants and normalized into contiguous integer ranges
//! over `[0, 100)`. The assignment key is the sticky field's value when the
//! context carries one, otherwise a fresh random key. Keys are bucketed with
//! [`stable_bucket`], so a sticky key lands in the same variant in every
//! process and release.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::str::FromStr;

use rand::RngCore;
use rand::rngs::OsRng;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::DecisionContext;
use crate::core::hashing::canonical_json_bytes;
use crate::core::hashing::stable_bucket;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of buckets traffic is split across.
pub const BUCKET_COUNT: u64 = 100;
/// Default split specification.
pub const DEFAULT_SPLIT: &str = "control:50,variant:50";
/// Default sticky assignment field.
pub const DEFAULT_STICKY_FIELD: &str = "submission_id";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Split specification parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariantSpecError {
    /// No variants were declared.
    #[error("split specification declares no variants")]
    Empty,
    /// Entry is missing its `:weight` suffix.
    #[error("split entry `{0}` must be `name:weight`")]
    MissingWeight(String),
    /// Entry has an empty variant name.
    #[error("split entry `{0}` has an empty variant name")]
    EmptyName(String),
    /// Weight is not a finite number.
    #[error("variant `{name}` has invalid weight `{value}`")]
    InvalidWeight {
        /// Variant name.
        name: String,
        /// Raw weight text.
        value: String,
    },
    /// Variant name was declared more than once.
    #[error("variant `{0}` is declared more than once")]
    DuplicateName(String),
}

// ============================================================================
// SECTION: Split Specification
// ============================================================================

/// Weighted variant declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantWeight {
    /// Variant name.
    pub name: String,
    /// Non-negative relative weight.
    pub weight: f64,
}

/// Parsed split specification.
///
/// # Invariants
/// - At least one variant, names unique and non-empty, weights finite and `>= 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantSpec {
    /// Variants in declaration order.
    variants: Vec<VariantWeight>,
}

impl VariantSpec {
    /// Parses `name:weight,name:weight,...`.
    ///
    /// Blank segments are skipped and negative weights are cast to zero.
    ///
    /// # Errors
    ///
    /// Returns [`VariantSpecError`] when the specification is empty or malformed.
    pub fn parse(text: &str) -> Result<Self, VariantSpecError> {
        let mut variants = Vec::new();
        let mut seen = BTreeSet::new();
        for entry in text.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            let Some((name, weight)) = entry.rsplit_once(':') else {
                return Err(VariantSpecError::MissingWeight(entry.to_string()));
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(VariantSpecError::EmptyName(entry.to_string()));
            }
            let weight_text = weight.trim();
            let weight = weight_text
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| VariantSpecError::InvalidWeight {
                    name: name.to_string(),
                    value: weight_text.to_string(),
                })?;
            if !seen.insert(name.to_string()) {
                return Err(VariantSpecError::DuplicateName(name.to_string()));
            }
            variants.push(VariantWeight {
                name: name.to_string(),
                weight: weight.max(0.0),
            });
        }
        if variants.is_empty() {
            return Err(VariantSpecError::Empty);
        }
        Ok(Self {
            variants,
        })
    }

    /// Returns the variants in declaration order.
    #[must_use]
    pub fn variants(&self) -> &[VariantWeight] {
        &self.variants
    }

    /// Normalizes weights into contiguous bucket ranges.
    ///
    /// Boundaries are floored cumulative percentages; the last range always
    /// ends at [`BUCKET_COUNT`] and absorbs the rounding remainder. Weights
    /// whose sum overflows are rescaled by the largest weight first.
    #[must_use]
    pub fn bucket_table(&self) -> BucketTable {
        let mut total: f64 = self.variants.iter().map(|variant| variant.weight).sum();
        let mut scale = 1.0;
        if !total.is_finite() {
            scale = self.variants.iter().map(|variant| variant.weight).fold(0.0, f64::max);
            total = self.variants.iter().map(|variant| variant.weight / scale).sum();
        }
        let last = self.variants.len().saturating_sub(1);
        let mut entries = Vec::with_capacity(self.variants.len());
        let mut cumulative = 0.0;
        let mut start = 0;
        for (index, variant) in self.variants.iter().enumerate() {
            cumulative += variant.weight / scale;
            let end = if index == last {
                BUCKET_COUNT
            } else if total > 0.0 {
                floor_bucket(cumulative / total).max(start)
            } else {
                start
            };
            entries.push(BucketEntry {
                name: variant.name.clone(),
                range: BucketRange {
                    start,
                    end,
                },
            });
            start = end;
        }
        BucketTable {
            entries,
        }
    }
}

impl FromStr for VariantSpec {
    type Err = VariantSpecError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

/// Converts a cumulative fraction into a floored bucket boundary.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Fraction is clamped to [0, 1] before scaling to at most BUCKET_COUNT."
)]
fn floor_bucket(fraction: f64) -> u64 {
    let scaled = (fraction.clamp(0.0, 1.0) * 100.0).floor();
    (scaled as u64).min(BUCKET_COUNT)
}

// ============================================================================
// SECTION: Bucket Table
// ============================================================================

/// Half-open bucket range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRange {
    /// Inclusive start bucket.
    pub start: u64,
    /// Exclusive end bucket.
    pub end: u64,
}

impl BucketRange {
    /// Returns true when the bucket falls inside the range.
    #[must_use]
    pub const fn contains(&self, bucket: u64) -> bool {
        bucket >= self.start && bucket < self.end
    }

    /// Returns the number of buckets covered.
    #[must_use]
    pub const fn width(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

/// Variant name paired with its resolved range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEntry {
    /// Variant name.
    pub name: String,
    /// Resolved bucket range.
    pub range: BucketRange,
}

/// Resolved bucket ranges in declaration order.
///
/// # Invariants
/// - Names equal the declared variant names exactly.
/// - Ranges are contiguous and cover `[0, BUCKET_COUNT)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketTable {
    /// Entries in declaration order.
    entries: Vec<BucketEntry>,
}

impl BucketTable {
    /// Returns the entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[BucketEntry] {
        &self.entries
    }

    /// Returns the variant names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Returns the range for a variant.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<BucketRange> {
        self.entries.iter().find(|entry| entry.name == name).map(|entry| entry.range)
    }

    /// Returns the variant whose range contains the bucket.
    #[must_use]
    pub fn select(&self, bucket: u64) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.range.contains(bucket))
            .map(|entry| entry.name.as_str())
    }
}

// ============================================================================
// SECTION: Assignment
// ============================================================================

/// Experiment settings consulted on every assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentSettings {
    /// Split specification text.
    pub split: String,
    /// Context field used for sticky assignment.
    pub sticky_field: Option<String>,
}

impl Default for ExperimentSettings {
    fn default() -> Self {
        Self {
            split: DEFAULT_SPLIT.to_string(),
            sticky_field: Some(DEFAULT_STICKY_FIELD.to_string()),
        }
    }
}

/// Result of a variant assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAssignment {
    /// Selected variant name.
    pub variant: String,
    /// Bucket the key hashed into.
    pub bucket: u64,
    /// True when the key came from the sticky field.
    pub sticky: bool,
    /// Resolved bucket table.
    pub table: BucketTable,
}

/// Assigns a context to a variant.
///
/// The split specification is parsed on every call so configuration changes
/// take effect immediately.
///
/// # Errors
///
/// Returns [`VariantSpecError`] when the split specification is invalid.
pub fn assign_variant(
    context: &DecisionContext,
    split_spec: &str,
    sticky_field: Option<&str>,
) -> Result<VariantAssignment, VariantSpecError> {
    let spec = VariantSpec::parse(split_spec)?;
    let table = spec.bucket_table();
    let sticky_key = sticky_field.and_then(|field| sticky_key(context, field));
    let sticky = sticky_key.is_some();
    let key = sticky_key.unwrap_or_else(random_key);
    let bucket = stable_bucket(key.as_bytes(), BUCKET_COUNT);
    let variant = table
        .select(bucket)
        .or_else(|| table.names().last())
        .ok_or(VariantSpecError::Empty)?
        .to_string();
    Ok(VariantAssignment {
        variant,
        bucket,
        sticky,
        table,
    })
}

/// Coerces the sticky field into assignment-key text.
///
/// A literal top-level key wins over a dotted path of the same name.
/// Missing, `null`, blank, and empty container values yield `None`.
fn sticky_key(context: &DecisionContext, field: &str) -> Option<String> {
    let field = field.trim();
    if field.is_empty() {
        return None;
    }
    match context.get(field).or_else(|| context.lookup(field))? {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Array(items) if items.is_empty() => None,
        Value::Object(map) if map.is_empty() => None,
        other => {
            canonical_json_bytes(other).ok().and_then(|bytes| String::from_utf8(bytes).ok())
        }
    }
}

/// Generates a fresh non-sticky assignment key.
fn random_key() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().fold(String::with_capacity(32), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}
