use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::core::error::{map_db_error, AppError, Result};
use crate::features::file_records::dtos::{
    AdminFileRecordDto, AdminFileRecordQueryParams, FileRecordDto, NewFileRecordDto,
    UpdateFileRecordDto,
};
use crate::features::file_records::models::FileRecord;
use crate::shared::types::PaginationQuery;

/// File records, always reached through folder → section → owner
pub struct FileRecordService {
    pool: PgPool,
}

impl FileRecordService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("File {} not found", id))
    }

    /// 404 unless the folder belongs to one of the caller's sections
    async fn ensure_folder_owned(&self, user_id: Uuid, folder_id: Uuid) -> Result<()> {
        let owned: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM core_folders f
                JOIN core_sections s ON s.id = f.section_id
                WHERE f.id = $1 AND s.user_id = $2
            )
            "#,
        )
        .bind(folder_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        if !owned {
            return Err(AppError::NotFound(format!("Folder {} not found", folder_id)));
        }
        Ok(())
    }

    /// The caller's files, optionally limited to one folder
    pub async fn list(&self, user_id: Uuid, folder_id: Option<Uuid>) -> Result<Vec<FileRecordDto>> {
        let records = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT r.id, r.folder_id, r.name, r.file_type, r.display_order, r.created_at
            FROM core_file_records r
            JOIN core_folders f ON f.id = r.folder_id
            JOIN core_sections s ON s.id = f.section_id
            WHERE s.user_id = $1 AND ($2::uuid IS NULL OR r.folder_id = $2)
            ORDER BY r.display_order, r.created_at
            "#,
        )
        .bind(user_id)
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(FileRecordDto::from).collect())
    }

    /// Files of the given folders, ordered for display; used to assemble nested responses
    pub async fn list_in_folders(&self, folder_ids: &[Uuid]) -> Result<Vec<FileRecordDto>> {
        if folder_ids.is_empty() {
            return Ok(Vec::new());
        }

        let records = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, folder_id, name, file_type, display_order, created_at
            FROM core_file_records
            WHERE folder_id = ANY($1)
            ORDER BY display_order, created_at
            "#,
        )
        .bind(folder_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(FileRecordDto::from).collect())
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<FileRecordDto> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT r.id, r.folder_id, r.name, r.file_type, r.display_order, r.created_at
            FROM core_file_records r
            JOIN core_folders f ON f.id = r.folder_id
            JOIN core_sections s ON s.id = f.section_id
            WHERE r.id = $1 AND s.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Self::not_found(id))?;

        Ok(FileRecordDto::from(record))
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        folder_id: Uuid,
        dto: NewFileRecordDto,
    ) -> Result<FileRecordDto> {
        self.ensure_folder_owned(user_id, folder_id).await?;

        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            INSERT INTO core_file_records (folder_id, name, file_type, display_order)
            VALUES ($1, $2, $3, $4)
            RETURNING id, folder_id, name, file_type, display_order, created_at
            "#,
        )
        .bind(folder_id)
        .bind(&dto.name)
        .bind(&dto.file_type)
        .bind(dto.order)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        tracing::debug!("Created file record {} in folder {}", record.id, folder_id);
        Ok(FileRecordDto::from(record))
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        dto: UpdateFileRecordDto,
    ) -> Result<FileRecordDto> {
        if let Some(folder_id) = dto.folder_id {
            self.ensure_folder_owned(user_id, folder_id).await?;
        }

        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            UPDATE core_file_records r
            SET name = COALESCE($3, r.name),
                file_type = COALESCE($4, r.file_type),
                display_order = COALESCE($5, r.display_order),
                folder_id = COALESCE($6, r.folder_id)
            FROM core_folders f
            JOIN core_sections s ON s.id = f.section_id
            WHERE r.id = $1 AND f.id = r.folder_id AND s.user_id = $2
            RETURNING r.id, r.folder_id, r.name, r.file_type, r.display_order, r.created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(dto.name)
        .bind(dto.file_type)
        .bind(dto.order)
        .bind(dto.folder_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| Self::not_found(id))?;

        Ok(FileRecordDto::from(record))
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM core_file_records r
            USING core_folders f, core_sections s
            WHERE r.id = $1 AND f.id = r.folder_id AND s.id = f.section_id AND s.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    /// Cross-user listing for staff, ordered by (order, created_at)
    pub async fn admin_list(
        &self,
        page: &PaginationQuery,
        params: &AdminFileRecordQueryParams,
    ) -> Result<(Vec<AdminFileRecordDto>, i64)> {
        let mut count: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM core_file_records r JOIN core_folders f ON f.id = r.folder_id",
        );
        push_admin_filters(&mut count, params);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT r.id, r.name, r.file_type, r.display_order, r.created_at,
                   r.folder_id, f.name AS folder_name
            FROM core_file_records r
            JOIN core_folders f ON f.id = r.folder_id
            "#,
        );
        push_admin_filters(&mut query, params);
        query
            .push(" ORDER BY r.display_order, r.created_at LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query
            .build_query_as::<AdminFileRecordDto>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }
}

fn push_admin_filters(builder: &mut QueryBuilder<'_, Postgres>, params: &AdminFileRecordQueryParams) {
    builder.push(" WHERE TRUE");

    if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (r.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR f.name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(ref file_type) = params.file_type {
        builder.push(" AND r.file_type = ").push_bind(file_type.clone());
    }
    if let Some(folder_id) = params.folder_id {
        builder.push(" AND r.folder_id = ").push_bind(folder_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_filters_sql() {
        let params = AdminFileRecordQueryParams {
            search: Some("  roads ".to_string()),
            file_type: Some("csv".to_string()),
            folder_id: None,
        };
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 FROM core_file_records r");
        push_admin_filters(&mut builder, &params);

        assert_eq!(
            builder.sql(),
            "SELECT 1 FROM core_file_records r WHERE TRUE AND (r.name ILIKE $1 OR f.name ILIKE $2) AND r.file_type = $3"
        );
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let params = AdminFileRecordQueryParams {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1");
        push_admin_filters(&mut builder, &params);
        assert_eq!(builder.sql(), "SELECT 1 WHERE TRUE");
    }
}
