//! Library crate for playkers-back, exposing modules for binaries and integration tests.

pub mod client;
pub mod config;
pub mod dao;
pub mod dto;
mod error;
pub mod identity;
pub mod routes;
pub mod services;
pub mod state;
