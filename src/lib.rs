pub mod chat;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod prompts;
pub mod provider;
pub mod runner;
pub mod session;
pub mod streaming;
pub mod theme;
pub mod tools;
pub mod workflow;
