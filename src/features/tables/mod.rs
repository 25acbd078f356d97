pub mod dtos;
pub mod handlers;
pub mod identifiers;
pub mod routes;
pub mod services;

pub use services::TableService;
