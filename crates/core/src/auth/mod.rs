//! Bearer token acquisition and refresh

pub mod ports;
mod token_manager;

pub use token_manager::TokenManager;
