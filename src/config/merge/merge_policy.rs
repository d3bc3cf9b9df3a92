//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources win: defaults < global file < explicit file < environment.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("scheme", "http")?
        .set_default("token_header", "X-Checkdesk-Token")?
        .set_default("team_header", "X-Checkdesk-Context-Team")?
        .set_default("paths.root", "/")?
        .set_default("paths.team_creation", "/teams/new")?
        .set_default("paths.not_found", "/404")
}
