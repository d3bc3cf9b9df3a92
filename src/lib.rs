//! Checkdesk: session and transport core
//!
//! Acquires and persists the session token, dispatches REST and batched
//! query-language requests, and resolves the team/project context the client
//! is scoped to after the first identity fetch.

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod identity;
pub mod logging;
pub mod navigation;
pub mod rest;
pub mod session;
pub mod store;
