// Domain entities and request/response payloads

pub mod trainee;
pub mod trainer;
pub mod training;
pub mod user;

pub use trainee::*;
pub use trainer::*;
pub use training::*;
pub use user::*;
