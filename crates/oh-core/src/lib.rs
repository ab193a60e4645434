//! Core OH client library (config, transport, session, auth).

pub mod auth;
pub mod config;
pub mod endpoint;
pub mod logging;
pub mod session;
pub mod transport;
