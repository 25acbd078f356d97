pub mod file_record_service;

pub use file_record_service::FileRecordService;
