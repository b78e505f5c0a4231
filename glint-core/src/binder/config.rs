//! Binder configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::expr::DEFAULT_CACHE_SIZE;

/// Directive names and evaluator settings.
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes:
///
/// ```
/// use glint_core::binder::BinderConfig;
///
/// let config = BinderConfig::from_json(r#"{ "display_attribute": "g-text" }"#).unwrap();
/// assert_eq!(config.display_attribute, "g-text");
/// assert_eq!(config.event_prefix, "@");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BinderConfig {
    /// Attribute holding a display expression.
    pub display_attribute: String,

    /// Prefix marking an event attribute; the rest of the name is the event
    /// type.
    pub event_prefix: String,

    /// Compiled texts kept per cache; `0` disables caching.
    pub expression_cache_size: usize,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            display_attribute: "@data".to_string(),
            event_prefix: "@".to_string(),
            expression_cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

impl BinderConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display_attribute.is_empty() {
            return Err(ConfigError::EmptyDisplayAttribute);
        }
        if self.event_prefix.is_empty() {
            return Err(ConfigError::EmptyEventPrefix);
        }
        if self.display_attribute == self.event_prefix {
            return Err(ConfigError::DisplayIsPrefix(self.display_attribute.clone()));
        }
        Ok(())
    }
}
