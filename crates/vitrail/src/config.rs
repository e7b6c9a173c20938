//! Configuration file loading for vitrail.
//!
//! Reads `vitrail.config.json` from a directory. Every field is optional;
//! absent fields take the runtime defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vitrail_atelier::adapters::{BOOTSTRAP_SCRIPT_ID, BOOTSTRAP_SCRIPT_URL};
use vitrail_atelier::{BOOTSTRAP_GLOBAL, DEFAULT_CAROUSEL_INTERVAL_MS};
use vitrail_cadre::AssetSpec;
use vitrail_carton::{Backoff, RetryPolicy, Size};
use vitrail_musea::{HoverOptions, PlacementOptions};

/// File name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "vitrail.config.json";

/// Error type for strict configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level vitrail configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeConfig {
    /// JSON Schema reference (for editor autocompletion).
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Palette hover previews.
    pub hover: HoverConfig,

    /// Widget libraries and their defaults.
    pub widgets: WidgetConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HoverConfig {
    pub delay_ms: u64,
    pub exit_ms: u64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub min_inset: f64,
    pub preview_width: f64,
    pub preview_height: f64,
    pub container_class: String,
    pub entry_class: String,
    /// Palette container lookup.
    pub retry: RetryConfig,
}

impl Default for HoverConfig {
    fn default() -> Self {
        let options = HoverOptions::default();
        Self {
            delay_ms: duration_ms(options.delay),
            exit_ms: duration_ms(options.exit),
            offset_x: options.placement.offset_x,
            offset_y: options.placement.offset_y,
            min_inset: options.placement.min_inset,
            preview_width: options.preview_size.width,
            preview_height: options.preview_size.height,
            container_class: options.container_class.to_string(),
            entry_class: options.entry_class.to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl HoverConfig {
    pub fn to_options(&self) -> HoverOptions {
        HoverOptions {
            container_class: self.container_class.as_str().into(),
            entry_class: self.entry_class.as_str().into(),
            delay: Duration::from_millis(self.delay_ms),
            exit: Duration::from_millis(self.exit_ms),
            preview_size: Size::new(self.preview_width, self.preview_height),
            placement: PlacementOptions {
                offset_x: self.offset_x,
                offset_y: self.offset_y,
                min_inset: self.min_inset,
            },
            retry: self.retry.to_policy(),
        }
    }
}

/// Exponential backoff: `initialDelayMs * factor^(n-1)`, capped at `maxDelayMs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub factor: u32,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            initial_delay_ms: 50,
            factor: 2,
            max_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Backoff::Exponential {
                initial: Duration::from_millis(self.initial_delay_ms),
                factor: self.factor,
                max: Duration::from_millis(self.max_delay_ms),
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetConfig {
    /// Carousel interval used when the component's value is missing or invalid.
    pub carousel_interval_ms: u64,
    /// Global the widget library installs in the frame.
    pub asset_name: String,
    pub script_url: String,
    pub script_element_id: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            carousel_interval_ms: DEFAULT_CAROUSEL_INTERVAL_MS,
            asset_name: BOOTSTRAP_GLOBAL.to_owned(),
            script_url: BOOTSTRAP_SCRIPT_URL.to_owned(),
            script_element_id: BOOTSTRAP_SCRIPT_ID.to_owned(),
        }
    }
}

impl WidgetConfig {
    pub fn asset(&self) -> AssetSpec {
        AssetSpec::new(
            self.asset_name.as_str(),
            self.script_url.as_str(),
            self.script_element_id.as_str(),
        )
    }
}

impl RuntimeConfig {
    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let hover = &self.hover;
        positive("hover.previewWidth", hover.preview_width)?;
        positive("hover.previewHeight", hover.preview_height)?;
        for (field, value) in [
            ("hover.offsetX", hover.offset_x),
            ("hover.offsetY", hover.offset_y),
            ("hover.minInset", hover.min_inset),
        ] {
            if !value.is_finite() {
                return Err(invalid(field, format!("{} is not a finite number", value)));
            }
        }
        non_blank("hover.containerClass", &hover.container_class)?;
        non_blank("hover.entryClass", &hover.entry_class)?;
        if hover.retry.max_attempts == 0 {
            return Err(invalid("hover.retry.maxAttempts", "must be at least 1".into()));
        }
        if hover.retry.factor == 0 {
            return Err(invalid("hover.retry.factor", "must be at least 1".into()));
        }

        let widgets = &self.widgets;
        if widgets.carousel_interval_ms == 0 {
            return Err(invalid("widgets.carouselIntervalMs", "must be at least 1".into()));
        }
        non_blank("widgets.assetName", &widgets.asset_name)?;
        non_blank("widgets.scriptUrl", &widgets.script_url)?;
        non_blank("widgets.scriptElementId", &widgets.script_element_id)?;
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{} is not a positive number", value)))
    }
}

fn non_blank(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(invalid(field, "must not be empty".into()))
    } else {
        Ok(())
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Parse and validate a configuration document.
pub fn load_config_from_str(source: &str) -> Result<RuntimeConfig, ConfigError> {
    let config: RuntimeConfig = serde_json::from_str(source)?;
    config.validate()?;
    Ok(config)
}

/// Read and validate the configuration file at `path`.
pub fn load_config_file(path: &Path) -> Result<RuntimeConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Load `vitrail.config.json` from the given directory (or CWD if None).
///
/// A missing file yields the defaults; an unreadable or invalid one is
/// reported and also yields the defaults.
pub fn load_config(dir: Option<&Path>) -> RuntimeConfig {
    let base = dir
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let config_path = base.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!("no {} in {}, using defaults", CONFIG_FILE_NAME, base.display());
        return RuntimeConfig::default();
    }

    match load_config_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("{}; using default configuration", e);
            RuntimeConfig::default()
        }
    }
}

/// JSON Schema for `vitrail.config.json`.
pub const CONFIG_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "title": "Vitrail Configuration",
  "type": "object",
  "properties": {
    "$schema": { "type": "string" },
    "hover": {
      "type": "object",
      "description": "Palette hover previews",
      "properties": {
        "delayMs": { "type": "integer", "minimum": 0, "default": 300 },
        "exitMs": { "type": "integer", "minimum": 0, "default": 150 },
        "offsetX": { "type": "number", "default": 20 },
        "offsetY": { "type": "number", "default": 0 },
        "minInset": { "type": "number", "default": 8 },
        "previewWidth": { "type": "number", "exclusiveMinimum": 0, "default": 400 },
        "previewHeight": { "type": "number", "exclusiveMinimum": 0, "default": 300 },
        "containerClass": { "type": "string", "default": "blocks-container" },
        "entryClass": { "type": "string", "default": "block-entry" },
        "retry": {
          "type": "object",
          "properties": {
            "maxAttempts": { "type": "integer", "minimum": 1, "default": 8 },
            "initialDelayMs": { "type": "integer", "minimum": 0, "default": 50 },
            "factor": { "type": "integer", "minimum": 1, "default": 2 },
            "maxDelayMs": { "type": "integer", "minimum": 0, "default": 1000 }
          },
          "additionalProperties": false
        }
      },
      "additionalProperties": false
    },
    "widgets": {
      "type": "object",
      "description": "Widget libraries",
      "properties": {
        "carouselIntervalMs": { "type": "integer", "minimum": 1, "default": 5000 },
        "assetName": { "type": "string", "default": "bootstrap" },
        "scriptUrl": { "type": "string" },
        "scriptElementId": { "type": "string", "default": "bootstrap-bundle-script" }
      },
      "additionalProperties": false
    }
  },
  "additionalProperties": false
}"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_runtime_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.hover.to_options(), HoverOptions::default());
        assert_eq!(config.hover.retry.to_policy(), RetryPolicy::default());
        assert_eq!(config.widgets.asset(), vitrail_atelier::bootstrap_asset());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = load_config_from_str(
            r#"{ "hover": { "delayMs": 500, "retry": { "maxAttempts": 3 } }, "widgets": { "carouselIntervalMs": 2500 } }"#,
        )
        .unwrap();
        assert_eq!(config.hover.delay_ms, 500);
        assert_eq!(config.hover.exit_ms, 150);
        assert_eq!(config.hover.retry.max_attempts, 3);
        assert_eq!(config.hover.retry.initial_delay_ms, 50);
        assert_eq!(config.widgets.carousel_interval_ms, 2500);
        assert_eq!(config.widgets.asset_name, "bootstrap");

        let options = config.hover.to_options();
        assert_eq!(options.delay, Duration::from_millis(500));
        assert_eq!(options.retry.max_attempts, 3);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            load_config_from_str(r#"{ "hover": { "previewWidth": 0 } }"#),
            Err(ConfigError::Invalid { field: "hover.previewWidth", .. })
        ));
        assert!(matches!(
            load_config_from_str(r#"{ "widgets": { "scriptUrl": "  " } }"#),
            Err(ConfigError::Invalid { field: "widgets.scriptUrl", .. })
        ));
        assert!(matches!(
            load_config_from_str(r#"{ "hover": { "delayMs": "soon" } }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_schema_is_valid_json() {
        let schema: serde_json::Value = serde_json::from_str(CONFIG_SCHEMA).unwrap();
        assert!(schema["properties"]["hover"]["properties"]["delayMs"].is_object());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(RuntimeConfig::default()).unwrap();
        assert_eq!(json["hover"]["containerClass"], "blocks-container");
        assert_eq!(json["widgets"]["carouselIntervalMs"], 5000);
        assert!(json.get("$schema").is_none());
    }
}
