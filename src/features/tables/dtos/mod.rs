pub mod table_dto;

pub use table_dto::{TablePreviewDto, TableQueryParams, TableSummaryDto};
