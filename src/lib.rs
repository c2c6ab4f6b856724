//! Turn-based text adventure driven by locally hosted language models.
//!
//! The engine composes prompts from the session, routes them to narrator
//! and resolver models, repairs whatever comes back, and merges the result
//! into the session. Malformed model output degrades the story; it never
//! stops the loop.

pub mod config;
pub mod engine;
pub mod model;
