pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod hash;
pub mod infra;
pub mod limiter;
pub mod router;
pub mod state;
pub mod token;
pub mod usecase;
