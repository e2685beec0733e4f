#![forbid(unsafe_code)]

//! JS options objects to core configs.
//!
//! The wasm layer stringifies whatever JS passed (`JSON.stringify`) and hands
//! the text here, so this module stays testable on native targets.

use flickergrid_core::{ConfigError, FlickerConfig, RevealConfig};
use serde_json::Value;

/// Normalize an options payload: `undefined`, `null` and empty input mean
/// "all defaults"; anything else must be a JSON object.
fn normalize(json: Option<&str>) -> Result<String, ConfigError> {
    let Some(text) = json.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok("{}".to_string());
    };
    let value: Value = serde_json::from_str(text).map_err(|e| ConfigError::Json(e.to_string()))?;
    match value {
        Value::Null => Ok("{}".to_string()),
        Value::Object(_) => Ok(text.to_string()),
        other => Err(ConfigError::Json(format!(
            "options must be an object, got {other}"
        ))),
    }
}

/// Map a uniform draw in `[0, 1)` (e.g. `Math.random()`) to a 53-bit seed.
pub fn seed_from_unit(unit: f64) -> u64 {
    let unit = if unit.is_finite() { unit.clamp(0.0, 1.0) } else { 0.0 };
    (unit * (1u64 << 53) as f64) as u64
}

/// Parse flickering grid options. When no seed is configured, `fallback_seed`
/// is used so every mounted instance flickers differently.
pub fn flicker_config(json: Option<&str>, fallback_seed: u64) -> Result<FlickerConfig, ConfigError> {
    let config = FlickerConfig::from_json(&normalize(json)?)?;
    Ok(match config.seed {
        Some(_) => config,
        None => config.with_seed(fallback_seed),
    })
}

/// Parse cursor-reveal options.
pub fn reveal_config(json: Option<&str>) -> Result<RevealConfig, ConfigError> {
    RevealConfig::from_json(&normalize(json)?)
}
