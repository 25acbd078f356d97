pub mod file_record_dto;

pub use file_record_dto::{
    AdminFileRecordDto, AdminFileRecordQueryParams, CreateFileRecordDto, FileRecordDto,
    FileRecordQueryParams, NewFileRecordDto, ReplaceFileRecordDto, UpdateFileRecordDto,
};
