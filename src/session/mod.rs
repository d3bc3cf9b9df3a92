//! Session core: context, context resolution, redirect decision and the
//! bootstrap that ties them to the transports.

pub mod bootstrap;
pub mod context;
pub mod redirect;
pub mod resolver;

pub use bootstrap::{BootstrapOutcome, LoginProvider, SessionBootstrap, SessionState};
pub use context::{ContextSnapshot, ProjectRef, SessionContext, TeamRef};
pub use redirect::{Redirect, RedirectDecider, RedirectState};
pub use resolver::{ContextResolver, ContextUpdate};
