//! `slacksearch` — search exported Slack archives with Slack's own query
//! syntax.
//!
//! This crate provides the query parser, the per-message matcher, archive
//! enumeration, and result rendering used by the `slacksearch` binary.

pub mod archive;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod search;
