mod authenticator;
mod jwks;
mod validator;

pub mod dtos;
pub mod guards;
pub mod handlers;
pub mod model;
pub mod routes;
pub mod services;

pub use authenticator::Authenticator;
pub use jwks::JwksClient;
pub use validator::JwtValidator;
