pub mod section_dto;

pub use section_dto::{
    AdminSectionDto, AdminSectionQueryParams, NewSectionDto, SectionDto, SectionTreeDto,
    UpdateSectionDto,
};
