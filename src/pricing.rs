//! # Pricing Module
//!
//! Resolves a raw model id to per-million-token prices and computes entry costs.
//!
//! ## Resolution order
//!
//! 1. Exact model id in the caller's overrides
//! 2. First override key (in key order) contained in the model id, case-insensitive
//! 3. Built-in table via [`pricing_key`]
//! 4. Unresolved: no price, cost reads as 0
//!
//! ## Pricing keys
//!
//! Model ids have used two naming schemes over time:
//! - old: `claude-3-7-sonnet-20250219` (generation before the family)
//! - new: `claude-sonnet-4-5-20250929` (family first, trailing date stamp)
//!
//! Both normalize to `family-major[-minor]`, e.g. `sonnet-3-7` and `sonnet-4-5`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// USD per million tokens
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPricing {
    pub input: f64,
    pub output: f64,
    pub cache_write_5m: f64,
    pub cache_write_1h: f64,
    pub cache_read: f64,
}

/// Caller-supplied prices keyed by model id or model id substring
pub type PricingOverrides = BTreeMap<String, ModelPricing>;

/// Token counts that carry a price. The legacy cache-creation union is not
/// billed separately; its two tiers are.
#[derive(Clone, Copy, Debug, Default)]
pub struct BillableTokens {
    pub input: u64,
    pub output: u64,
    pub cache_write_5m: u64,
    pub cache_write_1h: u64,
    pub cache_read: u64,
}

impl ModelPricing {
    pub fn cost_for(&self, t: &BillableTokens) -> f64 {
        (t.input as f64 * self.input
            + t.output as f64 * self.output
            + t.cache_write_5m as f64 * self.cache_write_5m
            + t.cache_write_1h as f64 * self.cache_write_1h
            + t.cache_read as f64 * self.cache_read)
            / 1_000_000.0
    }
}

const fn price(input: f64, output: f64, cw5m: f64, cw1h: f64, read: f64) -> ModelPricing {
    ModelPricing {
        input,
        output,
        cache_write_5m: cw5m,
        cache_write_1h: cw1h,
        cache_read: read,
    }
}

// cache write 5m = 1.25x input, 1h = 2x input, read = 0.1x input
static BUILTIN_PRICING: &[(&str, ModelPricing)] = &[
    ("opus-4-6", price(5.0, 25.0, 6.25, 10.0, 0.50)),
    ("opus-4-5", price(5.0, 25.0, 6.25, 10.0, 0.50)),
    ("opus-4-1", price(15.0, 75.0, 18.75, 30.0, 1.50)),
    ("opus-4-0", price(15.0, 75.0, 18.75, 30.0, 1.50)),
    ("opus-3", price(15.0, 75.0, 18.75, 30.0, 1.50)),
    ("sonnet-4-5", price(3.0, 15.0, 3.75, 6.0, 0.30)),
    ("sonnet-4-0", price(3.0, 15.0, 3.75, 6.0, 0.30)),
    ("sonnet-3-7", price(3.0, 15.0, 3.75, 6.0, 0.30)),
    ("haiku-4-5", price(1.0, 5.0, 1.25, 2.0, 0.10)),
    ("haiku-3-5", price(0.80, 4.0, 1.00, 1.60, 0.08)),
    ("haiku-3", price(0.25, 1.25, 0.30, 0.50, 0.03)),
];

const FAMILIES: [&str; 3] = ["opus", "sonnet", "haiku"];

static FAMILY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(opus|sonnet|haiku)").unwrap());

struct FamilyPatterns {
    family: &'static str,
    // <major>[-<minor>]-<family>
    old: Regex,
    // <family>-<major>[-<minor>]
    new: Regex,
}

static FAMILY_PATTERNS: Lazy<Vec<FamilyPatterns>> = Lazy::new(|| {
    FAMILIES
        .iter()
        .map(|&f| FamilyPatterns {
            family: f,
            old: Regex::new(&format!(r"(\d+)(?:-(\d+))?-{f}")).unwrap(),
            new: Regex::new(&format!(r"{f}-(\d+)(?:-(\d+))?")).unwrap(),
        })
        .collect()
});

#[derive(Clone, Copy, Debug)]
enum NamingScheme {
    Old,
    New,
}

// Tried in order; first scheme producing a key wins.
const SCHEMES: [NamingScheme; 2] = [NamingScheme::Old, NamingScheme::New];

impl NamingScheme {
    fn derive_key(self, lower: &str, p: &FamilyPatterns) -> Option<String> {
        match self {
            NamingScheme::Old => {
                let caps = p.old.captures(lower)?;
                let major = caps.get(1)?.as_str();
                // "20250219-sonnet" is a date, not a generation
                if major.len() != 1 {
                    return None;
                }
                Some(match caps.get(2) {
                    Some(minor) => format!("{}-{}-{}", p.family, major, minor.as_str()),
                    None => format!("{}-{}", p.family, major),
                })
            }
            NamingScheme::New => {
                let caps = p.new.captures(lower)?;
                let major = caps.get(1)?.as_str();
                let minor = match caps.get(2).map(|m| m.as_str()) {
                    Some(m) if m.len() < 4 => m,
                    // absent, or a date stamp like 20250514
                    _ => "0",
                };
                Some(format!("{}-{}-{}", p.family, major, minor))
            }
        }
    }
}

/// Normalize a model id to a built-in table key.
///
/// Returns `None` for ids without a known family name (e.g. `glm-4.7`).
pub fn pricing_key(model_id: &str) -> Option<String> {
    let lower = model_id.to_lowercase();
    let family = FAMILY_RE.find(&lower)?.as_str();
    let patterns = FAMILY_PATTERNS.iter().find(|p| p.family == family)?;
    SCHEMES
        .iter()
        .find_map(|scheme| scheme.derive_key(&lower, patterns))
}

pub(crate) fn static_pricing_lookup(key: &str) -> Option<ModelPricing> {
    BUILTIN_PRICING
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, p)| *p)
}

pub fn pricing_for_model(model_id: &str, overrides: &PricingOverrides) -> Option<ModelPricing> {
    if let Some(p) = overrides.get(model_id) {
        return Some(*p);
    }
    let m = model_id.to_lowercase();
    if let Some((_, p)) = overrides
        .iter()
        .find(|(k, _)| m.contains(&k.to_lowercase()))
    {
        return Some(*p);
    }
    pricing_key(model_id).and_then(|k| static_pricing_lookup(&k))
}

pub fn has_pricing(model_id: &str, overrides: &PricingOverrides) -> bool {
    pricing_for_model(model_id, overrides).is_some()
}

/// Cost in USD; exactly 0 when the model has no resolvable price.
pub fn calculate_entry_cost(
    model_id: &str,
    tokens: &BillableTokens,
    overrides: &PricingOverrides,
) -> f64 {
    match pricing_for_model(model_id, overrides) {
        Some(p) => p.cost_for(tokens),
        None => 0.0,
    }
}
