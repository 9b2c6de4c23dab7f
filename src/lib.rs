// Public API for integration tests and potential library usage

pub mod api;
pub mod auth;
pub mod llm;
pub mod persist;
pub mod protocol;
pub mod ranking;
pub mod session;
pub mod source;
pub mod state;
pub mod store;
pub mod types;
pub mod ws;
