/// Coinload library - exposes modules for testing and external use.
pub mod error;
pub mod http;
pub mod report;
pub mod simulator;
