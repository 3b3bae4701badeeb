use serde::{Deserialize, Serialize};

use crate::Globals;

/// Runtime context a driver is resolved for.
///
/// Some backends have one implementation for an interactive client and a
/// different one (often a no-op) for server-side rendering. The registry picks
/// the constructor; the [`Tracker`](crate::Tracker) never looks at this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Client,
    Server,
}

impl Environment {
    pub fn is_server(&self) -> bool {
        matches!(self, Environment::Server)
    }

    pub fn is_client(&self) -> bool {
        !self.is_server()
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Client => write!(f, "client"),
            Environment::Server => write!(f, "server"),
        }
    }
}

/// Tracker configuration.
///
/// Use the builder methods to customize, or [`Default`] for sensible defaults.
/// The struct also deserializes from JSON, with every field optional.
///
/// # Examples
///
/// ```rust
/// use trackify::{Config, Globals};
///
/// let config = Config::default()
///     .with_globals(Globals::default().with_currency("PLN"))
///     .with_concurrent_loading(true);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults merged into every tracked event.
    pub globals: Globals,

    /// Where the tracker runs. Consumed by [`DriverRegistry::builtin`](crate::DriverRegistry::builtin).
    pub environment: Environment,

    /// Resolve and load all registered drivers at the same time instead of
    /// one after another. Drivers still enter the active set in registration order.
    /// Default: false
    pub concurrent_loading: bool,
}

impl Config {
    pub fn with_globals(mut self, globals: Globals) -> Self {
        self.globals = globals;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_concurrent_loading(mut self, enabled: bool) -> Self {
        self.concurrent_loading = enabled;
        self
    }

    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let config = Config::from_json(
            r#"{"globals":{"currency":"EUR"},"environment":"server","concurrent_loading":true}"#,
        )
        .unwrap();
        assert_eq!(config.globals.currency.as_deref(), Some("EUR"));
        assert!(config.environment.is_server());
        assert!(config.concurrent_loading);
    }

    #[test]
    fn test_empty_json_is_default() {
        let config = Config::from_json("{}").unwrap();
        assert!(config.environment.is_client());
        assert!(!config.concurrent_loading);
        assert!(config.globals.is_empty());
    }
}
