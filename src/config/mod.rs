//! Configuration management module for the signal engine.
//!
//! Provides hierarchical configuration loading from multiple sources with priority:
//! 1. Default values (hardcoded)
//! 2. Explicit config file passed to [`Settings::load`]
//! 3. File named by the `CONFIG_PATH` environment variable
//! 4. Local overrides (`config/local`, optional)
//! 5. Environment variables prefixed with `SIGNAL__` (highest priority)
//!

mod dispatch;
pub use dispatch::*;


//---
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// Drain loop parameters
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl Settings {
    /// Load configuration from multiple sources with priority:
    /// 1. Hardcoded defaults
    /// 2. `config_path`, if given (must exist)
    /// 3. `CONFIG_PATH` environment variable
    /// 4. Local overrides
    /// 5. Environment variables
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a TOML configuration file
    ///
    /// # Returns
    /// Merged and validated configuration
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Config::builder();

        // 1. Explicit file
        if let Some(path) = config_path {
            config = config.add_source(File::with_name(path).required(true));
        }

        // 2. Environment-selected file
        if let Ok(path) = env::var("CONFIG_PATH") {
            config = config.add_source(File::with_name(&path));
        }

        // 3. Local overrides
        config = config.add_source(File::with_name("config/local").required(false));

        // 4. Environment variables (highest priority)
        config = config.add_source(
            Environment::with_prefix("SIGNAL")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let settings: Settings = config.build()?.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Validates all subsystem configurations
    pub fn validate(&self) -> Result<()> {
        self.dispatch.validate()
    }
}
