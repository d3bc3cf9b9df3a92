//! Session bootstrap: token adoption, identity fetch, context and redirect.

use crate::config::CheckdeskConfig;
use crate::error::{RestFailure, SessionError};
use crate::graph::{GraphClient, SessionHeaders};
use crate::identity::{Identity, IdentityStore};
use crate::navigation::{Location, Navigator, UrlParams};
use crate::rest::{FormData, RestClient};
use crate::session::context::SessionContext;
use crate::session::redirect::{Redirect, RedirectDecider};
use crate::session::resolver::ContextResolver;
use crate::store::TokenStore;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How often a provider login window is checked for closure
pub const PROVIDER_WINDOW_POLL: Duration = Duration::from_millis(500);

/// Session state the view layer renders from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub token: Option<String>,
    pub error: bool,
    pub message: Option<String>,
}

impl SessionState {
    /// The view should show the login menu instead of the requested route.
    pub fn requires_login(&self, route_is_public: bool) -> bool {
        !route_is_public && self.token.is_none() && self.error
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOutcome {
    /// A token was already present or the session already failed
    Skipped,
    /// The token store held a token; no network call was made
    StoredToken,
    /// `me` returned an identity
    Authenticated { redirect: Redirect },
    /// `me` returned no identity
    NoIdentity,
    /// `me` failed
    Failed(String),
}

/// Third-party identity providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginProvider {
    Facebook,
    Twitter,
    Slack,
}

impl LoginProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            LoginProvider::Facebook => "facebook",
            LoginProvider::Twitter => "twitter",
            LoginProvider::Slack => "slack",
        }
    }
}

impl std::str::FromStr for LoginProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "facebook" => Ok(LoginProvider::Facebook),
            "twitter" => Ok(LoginProvider::Twitter),
            "slack" => Ok(LoginProvider::Slack),
            other => Err(format!("Unknown login provider: {}", other)),
        }
    }
}

/// Clears the in-flight flag however the bootstrap future ends, including
/// when the caller drops it before the identity fetch settles.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct SessionBootstrap {
    config: CheckdeskConfig,
    token_store: Arc<dyn TokenStore>,
    identity_store: Arc<dyn IdentityStore>,
    navigator: Arc<dyn Navigator>,
    rest: RestClient,
    graph: Arc<GraphClient>,
    context: Arc<SessionContext>,
    resolver: Arc<ContextResolver>,
    redirect: RedirectDecider,
    state: RwLock<SessionState>,
    in_flight: AtomicBool,
}

impl SessionBootstrap {
    pub fn new(
        config: CheckdeskConfig,
        token_store: Arc<dyn TokenStore>,
        identity_store: Arc<dyn IdentityStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, SessionError> {
        let rest = RestClient::new(config.rest_base_url.clone())?;
        let graph = Arc::new(GraphClient::new(
            config.graph_endpoint.clone(),
            navigator.clone(),
            config.paths.not_found.clone(),
            config.graph_timeout(),
        )?);
        let context = Arc::new(SessionContext::new());
        let resolver = Arc::new(ContextResolver::new(
            config.root_host.clone(),
            config.scheme.clone(),
            context.clone(),
            navigator.clone(),
        )?);
        let redirect = RedirectDecider::new(resolver.clone(), navigator.clone(), config.paths.clone());

        Ok(Self {
            config,
            token_store,
            identity_store,
            navigator,
            rest,
            graph,
            context,
            resolver,
            redirect,
            state: RwLock::new(SessionState::default()),
            in_flight: AtomicBool::new(false),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub fn resolver(&self) -> &Arc<ContextResolver> {
        &self.resolver
    }

    pub fn graph(&self) -> &Arc<GraphClient> {
        &self.graph
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn identity(&self) -> Option<Identity> {
        self.identity_store.get()
    }

    /// Run once per mount. Gated on "no token and no error", so repeated
    /// calls after the first settles are no-ops. The query-language headers
    /// are rebuilt on every call.
    pub async fn start(&self, location: &Location, params: &UrlParams) -> BootstrapOutcome {
        let outcome = self.run(location, params).await;
        self.configure_graph();
        outcome
    }

    async fn run(&self, location: &Location, params: &UrlParams) -> BootstrapOutcome {
        {
            let state = self.state.read();
            if state.token.is_some() || state.error {
                return BootstrapOutcome::Skipped;
            }
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return BootstrapOutcome::Skipped;
        }
        let _in_flight = InFlightGuard(&self.in_flight);

        self.authenticate(location, params).await
    }

    async fn authenticate(&self, location: &Location, params: &UrlParams) -> BootstrapOutcome {
        match self.token_store.get() {
            Ok(Some(token)) => {
                info!("Adopting stored session token");
                self.state.write().token = Some(token);
                return BootstrapOutcome::StoredToken;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Token store unreadable; fetching identity"),
        }

        match self.rest.request("get", "me", FormData::new(), &BTreeMap::new()).await {
            Ok(data) => self.on_identity(data, location, params),
            Err(failure) => self.on_failure(failure),
        }
    }

    fn on_failure(&self, failure: RestFailure) -> BootstrapOutcome {
        warn!(message = %failure.message, "Identity fetch failed");
        let mut state = self.state.write();
        state.error = true;
        state.message = Some(failure.message.clone());
        BootstrapOutcome::Failed(failure.message)
    }

    fn on_identity(&self, data: Value, location: &Location, params: &UrlParams) -> BootstrapOutcome {
        let identity = match data {
            Value::Null => None,
            data => match serde_json::from_value::<Identity>(data) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    return self.on_failure(RestFailure::application(format!(
                        "Invalid identity payload: {}",
                        e
                    )))
                }
            },
        };

        match &identity {
            Some(identity) => {
                if let Some(token) = &identity.token {
                    self.state.write().token = Some(token.clone());
                    if let Err(e) = self.token_store.set(token) {
                        warn!(error = %e, "Failed to persist session token");
                    }
                }
                info!(
                    has_token = identity.token.is_some(),
                    has_team = identity.current_team.is_some(),
                    "Identity fetched"
                );
            }
            None => {
                warn!("Identity fetch returned no user");
                self.state.write().error = true;
            }
        }

        self.identity_store.set(identity.clone());
        let redirect = self.redirect.maybe_redirect(location, identity.as_ref());
        self.resolver.set_context(&location.host, params);

        match identity {
            Some(_) => BootstrapOutcome::Authenticated { redirect },
            None => BootstrapOutcome::NoIdentity,
        }
    }

    fn configure_graph(&self) {
        let token = self.state.read().token.clone();
        self.graph.configure(Arc::new(SessionHeaders::new(
            self.config.default_headers.clone(),
            self.config.token_header.clone(),
            self.config.team_header.clone(),
            token,
            self.context.clone(),
        )));
    }

    /// Sign out, drop the stored token and reload at the current origin.
    pub async fn logout(&self, location: &Location) -> Result<(), RestFailure> {
        match self
            .rest
            .request("delete", "users/sign_out", FormData::new(), &BTreeMap::new())
            .await
        {
            Ok(_) => {
                if let Err(e) = self.token_store.remove() {
                    warn!(error = %e, "Failed to clear stored token");
                }
                info!("Signed out");
                self.navigator.assign(&location.origin());
                Ok(())
            }
            Err(failure) => {
                warn!(message = %failure.message, "Sign out failed");
                self.state.write().message = Some(failure.message.clone());
                Err(failure)
            }
        }
    }

    /// URL to open in the provider login window
    pub fn login_url(&self, provider: LoginProvider) -> String {
        self.rest.url_for(&format!(
            "users/auth/{}?destination=/close.html",
            provider.as_str()
        ))
    }

    /// Wait for the provider window to close, then clear the error flag so the
    /// next [`start`](Self::start) re-checks the session.
    pub async fn await_provider_window<P>(&self, mut window_closed: P)
    where
        P: FnMut() -> bool,
    {
        let start = tokio::time::Instant::now() + PROVIDER_WINDOW_POLL;
        let mut interval = tokio::time::interval_at(start, PROVIDER_WINDOW_POLL);
        loop {
            interval.tick().await;
            if window_closed() {
                break;
            }
        }
        info!("Provider window closed; session will be re-checked");
        self.state.write().error = false;
    }
}
