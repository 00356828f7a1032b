//! Ferrule - single-threaded, readiness-driven HTTP/1.1 server
//!
//! Core library: arena allocation, the one-shot reactor, connection registry,
//! and the resumable HTTP state machines.

pub mod arena;
pub mod config;
pub mod http;
pub mod server;
