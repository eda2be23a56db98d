//! Gym management backend: trainee and trainer accounts, generated
//! credentials, bearer-token authentication and an append-only training log.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod models;
pub mod repository;
pub mod services;

pub use errors::{GymError, GymResult};
