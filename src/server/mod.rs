//! Readiness-driven server plumbing.
//!
//! The [`Server`] owns a one-shot [`reactor::Reactor`], the listening socket
//! ([`listener::Acceptor`]) and the [`registry::Registry`] of live
//! connections, and runs them all on the calling thread.

pub mod driver;
pub mod listener;
pub mod reactor;
pub mod registry;

pub use driver::Server;
