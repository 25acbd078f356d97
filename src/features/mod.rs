//! Feature modules: each owns its DTOs, handlers, routes and services.

pub mod auth;
pub mod file_records;
pub mod folders;
pub mod sections;
pub mod tables;
pub mod uploads;
