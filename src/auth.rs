//! JWT acquisition: the auth-service client, the token model, and the signing middleware.

pub mod client;
pub mod middleware;
pub mod secret;
pub mod token;

pub use client::*;
pub use middleware::*;
pub use secret::*;
pub use token::*;
