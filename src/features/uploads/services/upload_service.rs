use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::tables::services::TableService;
use crate::features::uploads::dtos::{
    IncomingFile, UploadQueryParams, UploadResponseDto, UploadedFileDto,
};
use crate::features::uploads::models::UploadedFile;
use crate::modules::storage::MinIOClient;
use crate::shared::constants::TABULAR_EXTENSION;
use crate::shared::types::PaginationQuery;

const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully";

/// Stored object plus the name it should be downloaded as
pub struct DownloadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

pub struct UploadService {
    pool: PgPool,
    storage: Arc<MinIOClient>,
}

impl UploadService {
    pub fn new(pool: PgPool, storage: Arc<MinIOClient>) -> Self {
        Self { pool, storage }
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("Uploaded file {} not found", id))
    }

    /// Store `file`, record it and, for CSV, materialize its backing table.
    ///
    /// The record and the table commit together. Any failure after the object
    /// is stored removes it again.
    pub async fn upload(
        &self,
        uploaded_by: Option<Uuid>,
        title: &str,
        file_type: &str,
        file: IncomingFile,
    ) -> Result<UploadResponseDto> {
        let key = self.storage.generate_key(&file.file_name);
        self.storage
            .upload(&key, &file.data, &file.content_type)
            .await?;

        match self.record(uploaded_by, title, file_type, &key, &file.data).await {
            Ok(response) => {
                tracing::info!(
                    "Upload stored: id={}, key={}, type={}, table={}",
                    response.id,
                    key,
                    file_type,
                    response.table_name
                );
                Ok(response)
            }
            Err(e) => {
                tracing::warn!("Upload of {} failed, removing stored object: {}", key, e);
                self.storage.delete_quietly(&key).await;
                Err(e)
            }
        }
    }

    async fn record(
        &self,
        uploaded_by: Option<Uuid>,
        title: &str,
        file_type: &str,
        key: &str,
        data: &[u8],
    ) -> Result<UploadResponseDto> {
        let mut tx = self.pool.begin().await?;

        let mut record = sqlx::query_as::<_, UploadedFile>(
            r#"
            INSERT INTO core_uploaded_files (title, file_path, file_type, uploaded_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, file_path, file_type, table_name, uploaded_by, uploaded_at
            "#,
        )
        .bind(title)
        .bind(key)
        .bind(file_type)
        .bind(uploaded_by)
        .fetch_one(&mut *tx)
        .await?;

        let mut row_count = 0;
        if file_type == TABULAR_EXTENSION {
            let outcome = TableService::ingest(&mut tx, data, title).await?;

            sqlx::query("UPDATE core_uploaded_files SET table_name = $1 WHERE id = $2")
                .bind(&outcome.table_name)
                .bind(record.id)
                .execute(&mut *tx)
                .await?;

            record.table_name = outcome.table_name;
            row_count = outcome.row_count;
        }

        tx.commit().await?;

        Ok(UploadResponseDto {
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            file_path: record.file_path,
            id: record.id,
            title: record.title,
            file_type: record.file_type,
            table_name: record.table_name,
            row_count,
        })
    }

    /// Newest first
    pub async fn list(
        &self,
        page: &PaginationQuery,
        params: &UploadQueryParams,
    ) -> Result<(Vec<UploadedFileDto>, i64)> {
        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM core_uploaded_files");
        push_filters(&mut count, params);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT id, title, file_path, file_type, table_name, uploaded_by, uploaded_at
            FROM core_uploaded_files
            "#,
        );
        push_filters(&mut query, params);
        query
            .push(" ORDER BY uploaded_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query
            .build_query_as::<UploadedFile>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(UploadedFileDto::from).collect(), total))
    }

    async fn find(&self, id: Uuid) -> Result<UploadedFile> {
        sqlx::query_as::<_, UploadedFile>(
            r#"
            SELECT id, title, file_path, file_type, table_name, uploaded_by, uploaded_at
            FROM core_uploaded_files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Self::not_found(id))
    }

    pub async fn get(&self, id: Uuid) -> Result<UploadedFileDto> {
        Ok(UploadedFileDto::from(self.find(id).await?))
    }

    /// Fetch the stored object of an uploaded record
    pub async fn download(&self, id: Uuid) -> Result<DownloadedFile> {
        let record = self.find(id).await?;
        let data = self.storage.download(&record.file_path).await?;

        Ok(DownloadedFile {
            file_name: download_name(&record),
            content_type: content_type_for(&record.file_type).to_string(),
            data,
        })
    }

    /// Remove the record together with its backing table, then the stored object
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, UploadedFile>(
            r#"
            SELECT id, title, file_path, file_type, table_name, uploaded_by, uploaded_at
            FROM core_uploaded_files
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Self::not_found(id))?;

        TableService::release(&mut tx, &record.table_name).await?;

        sqlx::query("DELETE FROM core_uploaded_files WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.storage.delete_quietly(&record.file_path).await;
        tracing::info!("Deleted uploaded file {} ({})", id, record.file_path);
        Ok(())
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, params: &UploadQueryParams) {
    builder.push(" WHERE TRUE");

    if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR file_type ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(file_type) = params.file_type.as_deref().filter(|s| !s.is_empty()) {
        builder
            .push(" AND file_type = ")
            .push_bind(file_type.to_lowercase());
    }
}

/// Title plus the original extension
fn download_name(record: &UploadedFile) -> String {
    let suffix = format!(".{}", record.file_type);
    if record.title.to_lowercase().ends_with(&suffix) {
        record.title.clone()
    } else {
        format!("{}{}", record.title, suffix)
    }
}

fn content_type_for(file_type: &str) -> &'static str {
    match file_type {
        "csv" => "text/csv",
        "geojson" => "application/geo+json",
        "kml" => "application/vnd.google-earth.kml+xml",
        "gml" => "application/gml+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::test_storage;
    use chrono::Utc;

    fn record(title: &str, file_type: &str) -> UploadedFile {
        UploadedFile {
            id: Uuid::nil(),
            title: title.to_string(),
            file_path: format!("uploads/x/{}", title),
            file_type: file_type.to_string(),
            table_name: String::new(),
            uploaded_by: None,
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_download_name_appends_extension_once() {
        assert_eq!(download_name(&record("Roads 2024", "csv")), "Roads 2024.csv");
        assert_eq!(download_name(&record("roads.CSV", "csv")), "roads.CSV");
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("csv"), "text/csv");
        assert_eq!(content_type_for("shp"), "application/octet-stream");
    }

    #[test]
    fn test_filters_sql() {
        let params = UploadQueryParams {
            search: Some("roads".to_string()),
            file_type: Some("CSV".to_string()),
        };
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM core_uploaded_files");
        push_filters(&mut builder, &params);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM core_uploaded_files WHERE TRUE AND (title ILIKE $1 OR file_type ILIKE $2) AND file_type = $3"
        );
    }

    #[test]
    fn test_empty_filters_sql() {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1");
        push_filters(&mut builder, &UploadQueryParams::default());
        assert_eq!(builder.sql(), "SELECT 1 WHERE TRUE");
    }

    async fn record_count(pool: &PgPool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM core_uploaded_files")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_failed_ingestion_persists_no_record(pool: PgPool) {
        let service = UploadService::new(pool.clone(), test_storage());

        let result = service
            .record(None, "Broken", "csv", "uploads/x/broken.csv", b"a,b\n1\n")
            .await;
        assert!(matches!(result, Err(AppError::Ingestion(_))));

        assert_eq!(record_count(&pool).await, 0);
        let tables = TableService::new(pool.clone());
        assert!(tables.list_catalog(None).await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_delete_drops_backing_table(pool: PgPool) {
        let service = UploadService::new(pool.clone(), test_storage());

        let response = service
            .record(None, "My Data!", "csv", "uploads/x/my_data.csv", b"a\n1\n2\n")
            .await
            .unwrap();
        assert_eq!(response.table_name, "my_data");
        assert_eq!(response.row_count, 2);
        assert_eq!(service.get(response.id).await.unwrap().table_name, "my_data");

        service.delete(response.id).await.unwrap();

        let remaining: Option<String> = sqlx::query_scalar("SELECT to_regclass('my_data')::text")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, None);
        assert_eq!(record_count(&pool).await, 0);
        assert!(matches!(
            service.delete(response.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_delete_without_table_leaves_catalog_alone(pool: PgPool) {
        let service = UploadService::new(pool.clone(), test_storage());
        let tables = TableService::new(pool.clone());

        let kept = service
            .record(None, "Roads", "csv", "uploads/x/roads.csv", b"name\nJl. Asia Afrika\n")
            .await
            .unwrap();
        let shape = service
            .record(None, "Boundaries", "geojson", "uploads/x/b.geojson", b"{}")
            .await
            .unwrap();
        assert_eq!(shape.table_name, "");
        assert_eq!(shape.row_count, 0);

        service.delete(shape.id).await.unwrap();

        let catalog: Vec<String> = tables
            .list_catalog(None)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.table_name)
            .collect();
        assert_eq!(catalog, vec![kept.table_name]);
        assert_eq!(record_count(&pool).await, 1);
    }
}
