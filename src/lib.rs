// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) parses arguments, loads credentials and hands a connected
// client to one of the flows in `ui`.
//
// Module responsibilities:
// - `auth`: service-account key loading and token exchange.
// - `api`: the `DriveApi` seam and its blocking HTTP implementation.
// - `query`: the `files.list` filter expression and parameters.
// - `resolver`: name lookups and one-level folder listings.
// - `fetcher`: chunked downloads with progress and a single final write.
// - `ui`: console flows and the interactive menu.
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod query;
pub mod resolver;
pub mod ui;

pub use error::DriveError;
