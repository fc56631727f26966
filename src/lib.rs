pub mod app;
pub mod auth;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod gate;
pub mod notify;
pub mod state;
