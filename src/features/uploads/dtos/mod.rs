pub mod upload_dto;

pub use upload_dto::{
    IncomingFile, UploadErrorDto, UploadFormDto, UploadQueryParams, UploadResponseDto,
    UploadedFileDto, MAX_TITLE_LEN,
};
