#![forbid(unsafe_code)]

//! Scroller configuration.
//!
//! Defaults match the stock component. Every field can be overridden from the
//! environment:
//!
//! - `LAZYSCROLL_ID_PROP` (string)
//! - `LAZYSCROLL_TEXT_PROP` (string)
//! - `LAZYSCROLL_HEIGHT` (pixels, f64)
//! - `LAZYSCROLL_WIDTH` (pixels, f64)
//! - `LAZYSCROLL_MERGE_POLICY` = prefer_existing|concat_order
//! - `LAZYSCROLL_UNSAFE_RENDER` (bool)
//! - `LAZYSCROLL_DELAY_SETUP` (bool)
//! - `LAZYSCROLL_OVERSCAN` (usize)
//! - `LAZYSCROLL_DIAGNOSTICS_CAPACITY` (usize)

use std::env;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::MergePolicy;

/// Wrapper height used when none is configured.
pub const DEFAULT_HEIGHT_PX: f64 = 300.0;

const ENV_ID_PROP: &str = "LAZYSCROLL_ID_PROP";
const ENV_TEXT_PROP: &str = "LAZYSCROLL_TEXT_PROP";
const ENV_HEIGHT: &str = "LAZYSCROLL_HEIGHT";
const ENV_WIDTH: &str = "LAZYSCROLL_WIDTH";
const ENV_MERGE_POLICY: &str = "LAZYSCROLL_MERGE_POLICY";
const ENV_UNSAFE_RENDER: &str = "LAZYSCROLL_UNSAFE_RENDER";
const ENV_DELAY_SETUP: &str = "LAZYSCROLL_DELAY_SETUP";
const ENV_OVERSCAN: &str = "LAZYSCROLL_OVERSCAN";
const ENV_DIAGNOSTICS_CAPACITY: &str = "LAZYSCROLL_DIAGNOSTICS_CAPACITY";

/// Tuning knobs for a [`VirtualScroller`](crate::VirtualScroller).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollerConfig {
    /// Identity property of items.
    pub id_prop: String,
    /// Display property of items.
    pub text_prop: String,
    /// Fixed wrapper height in pixels; `None` uses [`DEFAULT_HEIGHT_PX`].
    pub height: Option<f64>,
    /// Fixed width in pixels; `None` fits content.
    pub width: Option<f64>,
    /// Collision rule for merges.
    pub merge_policy: MergePolicy,
    /// Present raw markup instead of display text.
    pub unsafe_render: bool,
    /// Wait for an explicit `setup()` before the first layout.
    pub delay_setup: bool,
    /// Extra rows materialized around the visible range.
    pub overscan: usize,
    /// Recent diagnostics kept for `take_diagnostics`.
    pub diagnostics_capacity: usize,
}

impl Default for ScrollerConfig {
    fn default() -> Self {
        Self {
            id_prop: "id".to_owned(),
            text_prop: "name".to_owned(),
            height: None,
            width: None,
            merge_policy: MergePolicy::PreferExisting,
            unsafe_render: false,
            delay_setup: false,
            overscan: 0,
            diagnostics_capacity: 64,
        }
    }
}

/// Configuration parse diagnostics (env + validation).
#[derive(Debug, Clone)]
pub struct ConfigParse {
    pub config: ScrollerConfig,
    pub errors: Vec<ConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ScrollerConfig {
    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> ConfigParse {
        from_env_with(|key| env::var(key).ok())
    }

    /// Parse config through an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(get: F) -> ConfigParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        from_env_with(get)
    }

    /// Set the identity property.
    #[must_use]
    pub fn with_id_prop(mut self, prop: impl Into<String>) -> Self {
        self.id_prop = prop.into();
        self
    }

    /// Set the display property.
    #[must_use]
    pub fn with_text_prop(mut self, prop: impl Into<String>) -> Self {
        self.text_prop = prop.into();
        self
    }

    /// Set a fixed wrapper height.
    #[must_use]
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Set a fixed width.
    #[must_use]
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the merge collision rule.
    #[must_use]
    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    /// Enable raw markup presentation.
    #[must_use]
    pub fn with_unsafe_render(mut self, enabled: bool) -> Self {
        self.unsafe_render = enabled;
        self
    }

    /// Defer the first setup until `setup()` is called.
    #[must_use]
    pub fn with_delay_setup(mut self, delay: bool) -> Self {
        self.delay_setup = delay;
        self
    }

    /// Set overscan rows.
    #[must_use]
    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    /// Wrapper height in effect.
    #[must_use]
    pub fn effective_height(&self) -> f64 {
        self.height.unwrap_or(DEFAULT_HEIGHT_PX)
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        if self.id_prop.trim().is_empty() {
            errors.push(ConfigError::new("id_prop", &self.id_prop, "must not be empty"));
        }
        if self.text_prop.trim().is_empty() {
            errors.push(ConfigError::new(
                "text_prop",
                &self.text_prop,
                "must not be empty",
            ));
        }
        validate_pixels("height", self.height, &mut errors);
        validate_pixels("width", self.width, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validate_pixels(field: &'static str, value: Option<f64>, errors: &mut Vec<ConfigError>) {
    if let Some(px) = value {
        if !px.is_finite() || px <= 0.0 {
            errors.push(ConfigError::new(
                field,
                px.to_string(),
                "expected positive finite pixels",
            ));
        }
    }
}

fn from_env_with<F>(mut get: F) -> ConfigParse
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = ScrollerConfig::default();
    let mut errors = Vec::new();

    if let Some(value) = get(ENV_ID_PROP) {
        config.id_prop = value.trim().to_owned();
    }

    if let Some(value) = get(ENV_TEXT_PROP) {
        config.text_prop = value.trim().to_owned();
    }

    if let Some(value) = get(ENV_HEIGHT) {
        match parse_pixels(&value) {
            Some(parsed) => config.height = Some(parsed),
            None => errors.push(ConfigError::new(
                "height",
                value,
                "expected positive pixels",
            )),
        }
    }

    if let Some(value) = get(ENV_WIDTH) {
        match parse_pixels(&value) {
            Some(parsed) => config.width = Some(parsed),
            None => errors.push(ConfigError::new("width", value, "expected positive pixels")),
        }
    }

    if let Some(value) = get(ENV_MERGE_POLICY) {
        match MergePolicy::parse(&value) {
            Some(parsed) => config.merge_policy = parsed,
            None => errors.push(ConfigError::new(
                "merge_policy",
                value,
                "expected prefer_existing|concat_order",
            )),
        }
    }

    if let Some(value) = get(ENV_UNSAFE_RENDER) {
        match parse_bool(&value) {
            Some(parsed) => config.unsafe_render = parsed,
            None => errors.push(ConfigError::new(
                "unsafe_render",
                value,
                "expected bool (1/0/true/false)",
            )),
        }
    }

    if let Some(value) = get(ENV_DELAY_SETUP) {
        match parse_bool(&value) {
            Some(parsed) => config.delay_setup = parsed,
            None => errors.push(ConfigError::new(
                "delay_setup",
                value,
                "expected bool (1/0/true/false)",
            )),
        }
    }

    if let Some(value) = get(ENV_OVERSCAN) {
        match parse_usize(&value) {
            Some(parsed) => config.overscan = parsed,
            None => errors.push(ConfigError::new(
                "overscan",
                value,
                "expected non-negative integer",
            )),
        }
    }

    if let Some(value) = get(ENV_DIAGNOSTICS_CAPACITY) {
        match parse_usize(&value) {
            Some(parsed) => config.diagnostics_capacity = parsed,
            None => errors.push(ConfigError::new(
                "diagnostics_capacity",
                value,
                "expected non-negative integer",
            )),
        }
    }

    if let Err(mut invalid) = config.validate() {
        errors.append(&mut invalid);
    }

    ConfigParse { config, errors }
}

#[inline]
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[inline]
fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}

#[inline]
fn parse_pixels(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed);
    number
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|px| px.is_finite() && *px > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(vars: &[(&str, &str)]) -> ConfigParse {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ScrollerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = ScrollerConfig::default();
        assert_eq!(config.id_prop, "id");
        assert_eq!(config.text_prop, "name");
        assert_eq!(config.effective_height(), DEFAULT_HEIGHT_PX);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides() {
        let parsed = parse(&[
            (ENV_ID_PROP, "code"),
            (ENV_TEXT_PROP, " label "),
            (ENV_HEIGHT, "420px"),
            (ENV_MERGE_POLICY, "concat"),
            (ENV_UNSAFE_RENDER, "yes"),
            (ENV_OVERSCAN, "3"),
        ]);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        assert_eq!(parsed.config.id_prop, "code");
        assert_eq!(parsed.config.text_prop, "label");
        assert_eq!(parsed.config.height, Some(420.0));
        assert_eq!(parsed.config.merge_policy, MergePolicy::ConcatOrder);
        assert!(parsed.config.unsafe_render);
        assert_eq!(parsed.config.overscan, 3);
    }

    #[test]
    fn bad_values_are_reported_and_ignored() {
        let parsed = parse(&[
            (ENV_HEIGHT, "-5"),
            (ENV_DELAY_SETUP, "maybe"),
            (ENV_DIAGNOSTICS_CAPACITY, "lots"),
        ]);
        let fields: Vec<&str> = parsed.errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["height", "delay_setup", "diagnostics_capacity"]);
        assert_eq!(parsed.config.height, None);
        assert!(!parsed.config.delay_setup);
    }

    #[test]
    fn empty_props_fail_validation() {
        let parsed = parse(&[(ENV_ID_PROP, "  ")]);
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].field, "id_prop");
    }

    #[test]
    fn validate_rejects_non_finite_width() {
        let config = ScrollerConfig::default().with_width(f64::INFINITY);
        let errors = config.validate().unwrap_err();
        assert_eq!(errors[0].field, "width");
        assert_eq!(errors[0].to_string(), "width=inf (expected positive finite pixels)");
    }

    #[test]
    fn serde_round_trip_with_defaults() {
        let config: ScrollerConfig =
            serde_json::from_str(r#"{"id_prop": "key", "merge_policy": "concat_order"}"#).unwrap();
        assert_eq!(config.id_prop, "key");
        assert_eq!(config.text_prop, "name");
        assert_eq!(config.merge_policy, MergePolicy::ConcatOrder);
    }
}
