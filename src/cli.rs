//! CLI: clap definitions and command execution against a live backend.

use crate::config::{CheckdeskConfig, ConfigLoader};
use crate::error::SessionError;
use crate::graph::{PendingQuery, QueryRequest};
use crate::identity::MemoryIdentityStore;
use crate::navigation::{Location, Navigation, RecordingNavigator};
use crate::session::{BootstrapOutcome, LoginProvider, Redirect, SessionBootstrap};
use crate::store::{MemoryTokenStore, SledTokenStore, TokenStore};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

/// Checkdesk session client
#[derive(Parser)]
#[command(name = "checkdesk")]
#[command(about = "Session bootstrap and transport client for Checkdesk")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Keep the session token in memory only
    #[arg(long)]
    pub ephemeral: bool,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the identity and resolve the team/project context
    Bootstrap {
        /// Location the client is opened at
        #[arg(long, default_value = "http://localhost:3333/")]
        url: String,
    },
    /// Bootstrap, then send a batch of queries
    Query {
        #[arg(long, default_value = "http://localhost:3333/")]
        url: String,
        /// Query document; repeat to batch several
        #[arg(long = "query", required = true)]
        queries: Vec<String>,
        /// JSON variables shared by every query in the batch
        #[arg(long, default_value = "{}")]
        variables: String,
    },
    /// Sign out and forget the stored token
    Logout {
        #[arg(long, default_value = "http://localhost:3333/")]
        url: String,
    },
    /// Print the third-party login URL for a provider
    LoginUrl {
        /// facebook, twitter or slack
        provider: String,
    },
}

pub struct RunContext {
    session: SessionBootstrap,
    navigator: Arc<RecordingNavigator>,
}

impl RunContext {
    pub fn new(config: CheckdeskConfig, ephemeral: bool) -> Result<Self, SessionError> {
        let token_store: Arc<dyn TokenStore> = if ephemeral {
            Arc::new(MemoryTokenStore::new())
        } else {
            Arc::new(SledTokenStore::new(&config.storage.token_db)?)
        };
        let navigator = Arc::new(RecordingNavigator::new());
        let session = SessionBootstrap::new(
            config,
            token_store,
            Arc::new(MemoryIdentityStore::new()),
            navigator.clone(),
        )?;
        Ok(Self { session, navigator })
    }

    pub async fn execute(&self, command: &Commands) -> Result<Value, SessionError> {
        match command {
            Commands::Bootstrap { url } => {
                let location = Location::parse(url)?;
                let outcome = self.session.start(&location, &location.url_params()).await;
                Ok(self.report(&outcome))
            }
            Commands::Query {
                url,
                queries,
                variables,
            } => {
                let location = Location::parse(url)?;
                let variables: Value = serde_json::from_str(variables)
                    .map_err(|e| SessionError::ConfigError(format!("Invalid variables: {}", e)))?;
                let outcome = self.session.start(&location, &location.url_params()).await;

                let mut requests: Vec<Arc<dyn QueryRequest>> = Vec::new();
                let mut handles = Vec::new();
                for (i, query) in queries.iter().enumerate() {
                    let (request, handle) =
                        PendingQuery::new(query.clone(), variables.clone(), format!("Query{}", i));
                    requests.push(request);
                    handles.push(handle);
                }
                self.session.graph().send_queries(requests).await;

                let mut results = Vec::new();
                for handle in handles {
                    let name = handle.debug_name().to_string();
                    let result = match handle.outcome().await {
                        Ok(response) => json!({ "query": name, "response": response.response }),
                        Err(e) => json!({ "query": name, "error": e.to_string() }),
                    };
                    results.push(result);
                }

                let mut report = self.report(&outcome);
                report["results"] = Value::Array(results);
                Ok(report)
            }
            Commands::Logout { url } => {
                let location = Location::parse(url)?;
                let result = self.session.logout(&location).await;
                Ok(json!({
                    "signed_out": result.is_ok(),
                    "message": result.err().map(|f| f.message),
                    "navigations": self.navigations(),
                }))
            }
            Commands::LoginUrl { provider } => {
                let provider: LoginProvider = provider.parse().map_err(SessionError::ConfigError)?;
                Ok(json!({ "url": self.session.login_url(provider) }))
            }
        }
    }

    fn report(&self, outcome: &BootstrapOutcome) -> Value {
        let state = self.session.state();
        let snapshot = self.session.context().snapshot();
        let outcome = match outcome {
            BootstrapOutcome::Skipped => json!("skipped"),
            BootstrapOutcome::StoredToken => json!("stored_token"),
            BootstrapOutcome::NoIdentity => json!("no_identity"),
            BootstrapOutcome::Failed(message) => json!({ "failed": message }),
            BootstrapOutcome::Authenticated { redirect } => json!({
                "authenticated": match redirect {
                    Redirect::Stay => "stay",
                    Redirect::Push(_) => "push",
                    Redirect::Scope { .. } => "scope",
                }
            }),
        };
        json!({
            "outcome": outcome,
            "has_token": state.token.is_some(),
            "error": state.error,
            "message": state.message,
            "context": {
                "team": snapshot.team.map(|t| json!({ "dbid": t.dbid, "subdomain": t.subdomain })),
                "project": snapshot.project.map(|p| p.dbid),
            },
            "navigations": self.navigations(),
        })
    }

    fn navigations(&self) -> Vec<Value> {
        self.navigator
            .navigations()
            .into_iter()
            .map(|nav| match nav {
                Navigation::Push(path) => json!({ "push": path }),
                Navigation::Assign(url) => json!({ "assign": url }),
            })
            .collect()
    }
}

/// Load configuration from the explicit file or the default layers.
pub fn load_config(cli: &Cli) -> Result<CheckdeskConfig, SessionError> {
    match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}
