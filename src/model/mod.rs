//! Core data model types for archived messages, users, and timestamps.

pub mod message;
pub mod timestamp;
pub mod user;
