#![allow(clippy::module_inception)]
/// Load testing simulator for the coin shop API.
pub mod config;
pub mod registry;
pub mod session;
pub mod simulator;
