//! asl-relay: turns English messages into simplified text, an ASL gloss and a
//! sentiment label, then hands them to the avatar bus.

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod services;
