//! The Egyptian: a chess server where a human plays White against an LLM
//! opponent that plays Black and comments in Arabic.

pub mod ai;
pub mod api;
pub mod chat;
pub mod config;
pub mod engine;
pub mod llm;
pub mod session;
pub mod ws;
