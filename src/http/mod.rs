/// HTTP client for the coin shop API.
pub mod client;
pub mod rest;
