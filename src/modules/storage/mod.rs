//! Storage module for uploaded files
//!
//! Provides a MinIO/S3-compatible client holding the raw bytes behind each
//! uploaded record.

mod minio_client;

pub use minio_client::MinIOClient;
