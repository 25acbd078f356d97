use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{map_db_error, AppError, Result};
use crate::features::file_records::FileRecordService;
use crate::features::folders::dtos::{
    AdminFolderDto, AdminFolderQueryParams, FolderDto, NewFolderDto, UpdateFolderDto,
};
use crate::features::folders::models::Folder;
use crate::shared::types::PaginationQuery;

/// Folders, always reached through their section's owner
pub struct FolderService {
    pool: PgPool,
    files: Arc<FileRecordService>,
}

impl FolderService {
    pub fn new(pool: PgPool, files: Arc<FileRecordService>) -> Self {
        Self { pool, files }
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("Folder {} not found", id))
    }

    async fn ensure_section_owned(&self, user_id: Uuid, section_id: Uuid) -> Result<()> {
        let owned: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM core_sections WHERE id = $1 AND user_id = $2)",
        )
        .bind(section_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        if !owned {
            return Err(AppError::NotFound(format!("Section {} not found", section_id)));
        }
        Ok(())
    }

    async fn with_files(&self, folders: Vec<Folder>) -> Result<Vec<FolderDto>> {
        let ids: Vec<Uuid> = folders.iter().map(|f| f.id).collect();
        let files = self.files.list_in_folders(&ids).await?;
        Ok(FolderDto::assemble(folders, files))
    }

    /// The caller's folders with their files, optionally limited to one section
    pub async fn list(&self, user_id: Uuid, section_id: Option<Uuid>) -> Result<Vec<FolderDto>> {
        let folders = sqlx::query_as::<_, Folder>(
            r#"
            SELECT f.id, f.section_id, f.name, f.display_order, f.created_at
            FROM core_folders f
            JOIN core_sections s ON s.id = f.section_id
            WHERE s.user_id = $1 AND ($2::uuid IS NULL OR f.section_id = $2)
            ORDER BY f.display_order, f.created_at
            "#,
        )
        .bind(user_id)
        .bind(section_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_files(folders).await
    }

    /// Folders of the given sections with their files; used to assemble section responses
    pub async fn list_in_sections(&self, section_ids: &[Uuid]) -> Result<Vec<FolderDto>> {
        if section_ids.is_empty() {
            return Ok(Vec::new());
        }

        let folders = sqlx::query_as::<_, Folder>(
            r#"
            SELECT id, section_id, name, display_order, created_at
            FROM core_folders
            WHERE section_id = ANY($1)
            ORDER BY display_order, created_at
            "#,
        )
        .bind(section_ids)
        .fetch_all(&self.pool)
        .await?;

        self.with_files(folders).await
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<FolderDto> {
        let folder = sqlx::query_as::<_, Folder>(
            r#"
            SELECT f.id, f.section_id, f.name, f.display_order, f.created_at
            FROM core_folders f
            JOIN core_sections s ON s.id = f.section_id
            WHERE f.id = $1 AND s.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Self::not_found(id))?;

        let files = self.files.list_in_folders(&[folder.id]).await?;
        Ok(FolderDto {
            files,
            ..FolderDto::from(folder)
        })
    }

    pub async fn create(&self, user_id: Uuid, section_id: Uuid, dto: NewFolderDto) -> Result<FolderDto> {
        self.ensure_section_owned(user_id, section_id).await?;

        let folder = sqlx::query_as::<_, Folder>(
            r#"
            INSERT INTO core_folders (section_id, name, display_order)
            VALUES ($1, $2, $3)
            RETURNING id, section_id, name, display_order, created_at
            "#,
        )
        .bind(section_id)
        .bind(&dto.name)
        .bind(dto.order)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        tracing::debug!("Created folder {} in section {}", folder.id, section_id);
        Ok(FolderDto::from(folder))
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, dto: UpdateFolderDto) -> Result<FolderDto> {
        if let Some(section_id) = dto.section_id {
            self.ensure_section_owned(user_id, section_id).await?;
        }

        let folder = sqlx::query_as::<_, Folder>(
            r#"
            UPDATE core_folders f
            SET name = COALESCE($3, f.name),
                display_order = COALESCE($4, f.display_order),
                section_id = COALESCE($5, f.section_id)
            FROM core_sections s
            WHERE f.id = $1 AND s.id = f.section_id AND s.user_id = $2
            RETURNING f.id, f.section_id, f.name, f.display_order, f.created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(dto.name)
        .bind(dto.order)
        .bind(dto.section_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| Self::not_found(id))?;

        let files = self.files.list_in_folders(&[folder.id]).await?;
        Ok(FolderDto {
            files,
            ..FolderDto::from(folder)
        })
    }

    /// Delete a folder; its files go with it
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM core_folders f
            USING core_sections s
            WHERE f.id = $1 AND s.id = f.section_id AND s.user_id = $2
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
        params: &AdminFolderQueryParams,
    ) -> Result<(Vec<AdminFolderDto>, i64)> {
        let mut count: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM core_folders f JOIN core_sections s ON s.id = f.section_id",
        );
        push_admin_filters(&mut count, params);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT f.id, f.name, f.display_order, f.created_at,
                   f.section_id, s.name AS section_name,
                   (SELECT COUNT(*) FROM core_file_records r WHERE r.folder_id = f.id) AS file_count
            FROM core_folders f
            JOIN core_sections s ON s.id = f.section_id
            "#,
        );
        push_admin_filters(&mut query, params);
        query
            .push(" ORDER BY f.display_order, f.created_at LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query
            .build_query_as::<AdminFolderDto>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }
}

fn push_admin_filters(builder: &mut QueryBuilder<'_, Postgres>, params: &AdminFolderQueryParams) {
    builder.push(" WHERE TRUE");

    if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (f.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR s.name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(section_id) = params.section_id {
        builder.push(" AND f.section_id = ").push_bind(section_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::folders::dtos::NewFolderDto;
    use crate::features::sections::dtos::NewSectionDto;
    use crate::features::sections::SectionService;
    use crate::shared::test_helpers::insert_user;

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_folder_of_another_user_is_not_found(pool: PgPool) {
        let files = Arc::new(FileRecordService::new(pool.clone()));
        let folders = Arc::new(FolderService::new(pool.clone(), files));
        let sections = SectionService::new(pool.clone(), Arc::clone(&folders));

        let alice = insert_user(&pool, "alice@example.com").await;
        let bob = insert_user(&pool, "bob@example.com").await;

        let section = sections
            .create(
                alice.user_id,
                NewSectionDto {
                    name: "Maps".to_string(),
                    order: 0,
                },
            )
            .await
            .unwrap();
        let folder = folders
            .create(
                alice.user_id,
                section.id,
                NewFolderDto {
                    name: "Roads".to_string(),
                    order: 0,
                },
            )
            .await
            .unwrap();

        assert!(folders.get(alice.user_id, folder.id).await.is_ok());
        assert!(matches!(
            folders.get(bob.user_id, folder.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            folders.delete(bob.user_id, folder.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(folders.list(bob.user_id, None).await.unwrap().is_empty());
        assert!(matches!(
            folders
                .create(
                    bob.user_id,
                    section.id,
                    NewFolderDto {
                        name: "Sneaky".to_string(),
                        order: 0,
                    },
                )
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_admin_filters_sql() {
        let params = AdminFolderQueryParams {
            search: Some("roads".to_string()),
            section_id: Some(Uuid::nil()),
        };
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1");
        push_admin_filters(&mut builder, &params);
        assert_eq!(
            builder.sql(),
            "SELECT 1 WHERE TRUE AND (f.name ILIKE $1 OR s.name ILIKE $2) AND f.section_id = $3"
        );
    }
}
