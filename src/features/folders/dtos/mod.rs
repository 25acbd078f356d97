pub mod folder_dto;

pub use folder_dto::{
    AdminFolderDto, AdminFolderQueryParams, CreateFolderDto, FolderDto, FolderQueryParams,
    NewFolderDto, ReplaceFolderDto, UpdateFolderDto,
};
