//! # Application Module
//!
//! - [`session`] - session lifecycle against one tool provider
//! - [`extract`] - decoding search payloads into listing records
//! - [`report`] - deterministic terminal rendering
//! - [`summary`] - delegated summarization through a text generator

pub mod extract;
pub mod report;
pub mod session;
pub mod summary;
