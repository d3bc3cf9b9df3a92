//! Environment source: CHECKDESK__ROOT_HOST, CHECKDESK__PATHS__NOT_FOUND, ...

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const ENV_PREFIX: &str = "CHECKDESK";

/// Add environment overrides. Nested keys are separated by a double underscore.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__"),
    )
}
