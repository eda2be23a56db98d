// API routes and handlers

pub mod health;
pub mod routes;
pub mod trainee;
pub mod trainer;
pub mod training;
pub mod user;

pub use routes::{create_routes, AppState};
