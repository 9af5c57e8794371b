//! storyflow: scheduled story ingestion with live update fan-out and a
//! cached, token-protected read API.

pub mod pipeline;
pub mod server;
