pub mod env_config;
pub mod keycloak_rest;
pub mod keycloak_token_manager;

pub use env_config::*;
pub use keycloak_rest::*;
pub use keycloak_token_manager::*;
