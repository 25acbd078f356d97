//! Adapters for services outside the database (object storage).

pub mod storage;
