//! Shared test utilities for integration tests
//!
//! Mock backend served on an ephemeral localhost port, plus helpers to build
//! sessions against it.

use axum::Router;
use checkdesk::config::CheckdeskConfig;
use checkdesk::identity::MemoryIdentityStore;
use checkdesk::navigation::RecordingNavigator;
use checkdesk::session::SessionBootstrap;
use checkdesk::store::TokenStore;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

/// Root host used by session tests; team subdomains hang off it.
pub const ROOT_HOST: &str = "checkmedia.test";

/// Global mutex serializing tests that touch process environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Serve `app` on 127.0.0.1 with a random port and return `http://addr`.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Address that refuses connections: bound once, then released.
pub async fn closed_address() -> String {
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Config pointing both transports at a mock backend
pub fn config_for(base: &str) -> CheckdeskConfig {
    CheckdeskConfig {
        rest_base_url: format!("{}/api/", base),
        graph_endpoint: format!("{}/api/graphql", base),
        root_host: ROOT_HOST.to_string(),
        scheme: "http".to_string(),
        ..CheckdeskConfig::default()
    }
}

pub struct TestSession {
    pub session: SessionBootstrap,
    pub navigator: Arc<RecordingNavigator>,
    pub identities: Arc<MemoryIdentityStore>,
}

pub fn session_for(config: CheckdeskConfig, tokens: Arc<dyn TokenStore>) -> TestSession {
    let navigator = Arc::new(RecordingNavigator::new());
    let identities = Arc::new(MemoryIdentityStore::new());
    let session =
        SessionBootstrap::new(config, tokens, identities.clone(), navigator.clone()).unwrap();
    TestSession {
        session,
        navigator,
        identities,
    }
}

/// Run `f` with the given environment variables set, restoring them afterwards.
pub fn with_env<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let previous: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(k, _)| (k.to_string(), std::env::var(k).ok()))
        .collect();
    for (k, v) in vars {
        std::env::set_var(k, v);
    }

    let result = f();

    for (k, v) in previous {
        match v {
            Some(v) => std::env::set_var(&k, v),
            None => std::env::remove_var(&k),
        }
    }
    result
}
