//! Configuration system

pub use serde::{Serialize, Deserialize};

use crate::foundation::identifier::{Identifier, IdentifierError};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A configured identifier is malformed
    #[error("Invalid identifier: {0}")]
    Identifier(#[from] IdentifierError),

    /// A value is out of its allowed range
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending field name
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// # Item Render Configuration
///
/// Tunables for the dynamic item renderer. The defaults reproduce the
/// shipped behaviour: both scaled paths shrink to half size so machine
/// models fit the icon's unit cube.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemRenderConfig {
    /// Namespace owning the renderer's identifiers
    pub namespace: String,
    /// Path of the reload listener id within `namespace`
    pub reload_listener_path: String,
    /// Uniform scale applied around stand-in draws
    pub stand_in_scale: f32,
    /// Uniform scale applied around capability geometry draws
    pub capability_scale: f32,
    /// Item kind drawn through the special baked-model routine
    pub special_item: Identifier,
    /// Baked model resolved for `special_item`
    pub special_model: Identifier,
}

impl ItemRenderConfig {
    /// Stable identifier the reload pipeline sequences this renderer by
    pub fn reload_listener_id(&self) -> Result<Identifier, ConfigError> {
        Ok(Identifier::new(self.namespace.clone(), self.reload_listener_path.clone())?)
    }

    /// Build an item id in the configured namespace
    pub fn item_id(&self, path: &str) -> Result<Identifier, ConfigError> {
        Ok(Identifier::new(self.namespace.clone(), path)?)
    }

    /// Check value ranges and identifier well-formedness
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.reload_listener_id()?;
        check_scale("stand_in_scale", self.stand_in_scale)?;
        check_scale("capability_scale", self.capability_scale)?;
        Ok(())
    }
}

fn check_scale(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("scale must be finite and positive, got {value}"),
        })
    }
}

impl Default for ItemRenderConfig {
    fn default() -> Self {
        Self {
            namespace: "foundry".to_string(),
            reload_listener_path: "dynamic_item_renderer".to_string(),
            stand_in_scale: 0.5,
            capability_scale: 0.5,
            special_item: Identifier::from_static("foundry", "seismic_scanner"),
            special_model: Identifier::from_static("foundry", "item/seismic_scanner_base"),
        }
    }
}

impl Config for ItemRenderConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn temp_config(suffix: &str) -> NamedTempFile {
        Builder::new().suffix(suffix).tempfile().unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = ItemRenderConfig::default();
        assert_eq!(config.stand_in_scale, 0.5);
        assert_eq!(config.capability_scale, 0.5);
        assert_eq!(
            config.reload_listener_id().unwrap().to_string(),
            "foundry:dynamic_item_renderer"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_scale() {
        let config = ItemRenderConfig {
            stand_in_scale: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "stand_in_scale", .. })
        ));

        let config = ItemRenderConfig {
            capability_scale: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_namespace() {
        let config = ItemRenderConfig {
            namespace: "Not Valid".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Identifier(_))));
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let temp_file = temp_config(".toml");
        let path = temp_file.path().to_str().unwrap();

        let config = ItemRenderConfig {
            stand_in_scale: 0.75,
            ..Default::default()
        };
        config.save_to_file(path).unwrap();

        let loaded = ItemRenderConfig::load_from_file(path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let mut temp_file = temp_config(".ron");
        write!(temp_file, "(namespace: \"machina\")").unwrap();

        let loaded = ItemRenderConfig::load_from_file(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(loaded.namespace, "machina");
        assert_eq!(loaded.stand_in_scale, 0.5);
        assert_eq!(loaded.reload_listener_id().unwrap().to_string(), "machina:dynamic_item_renderer");
    }

    #[test]
    fn test_unsupported_extension() {
        let mut file = temp_config(".json");
        write!(file, "{{\"stand_in_scale\": 0.5}}").unwrap();
        let path = file.path().to_str().unwrap();

        let result = ItemRenderConfig::load_from_file(path);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ref p)) if p == path));

        let result = ItemRenderConfig::default().save_to_file(path);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
