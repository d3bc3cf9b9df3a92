//! Loading entry points over the layered sources.

use super::merge::merge_policy;
use super::sources::{env, global_file};
use super::CheckdeskConfig;
use crate::error::SessionError;
use config::File;
use std::path::Path;
use tracing::info;

/// Loads [`CheckdeskConfig`] from the layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global file, then environment.
    pub fn load() -> Result<CheckdeskConfig, SessionError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = env::add_to_builder(builder);
        Self::finish(builder.build()?)
    }

    /// Defaults, global file, the given file, then environment.
    pub fn load_from_file(path: &Path) -> Result<CheckdeskConfig, SessionError> {
        if !path.exists() {
            return Err(SessionError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = builder.add_source(File::from(path));
        let builder = env::add_to_builder(builder);
        Self::finish(builder.build()?)
    }

    /// Parse a TOML document directly, without consulting other sources.
    pub fn from_toml_str(contents: &str) -> Result<CheckdeskConfig, SessionError> {
        toml::from_str(contents)
            .map_err(|e| SessionError::ConfigError(format!("Invalid TOML: {}", e)))
    }

    fn finish(raw: config::Config) -> Result<CheckdeskConfig, SessionError> {
        let config: CheckdeskConfig = raw.try_deserialize()?;
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            SessionError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;
        info!(
            rest_base_url = %config.rest_base_url,
            graph_endpoint = %config.graph_endpoint,
            root_host = %config.root_host,
            "Configuration loaded"
        );
        Ok(config)
    }
}
