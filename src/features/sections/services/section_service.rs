use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{map_db_error, AppError, Result};
use crate::features::folders::FolderService;
use crate::features::sections::dtos::{
    AdminSectionDto, AdminSectionQueryParams, NewSectionDto, SectionDto, SectionTreeDto,
    UpdateSectionDto,
};
use crate::features::sections::models::Section;
use crate::shared::types::PaginationQuery;

/// Sections owned by the caller, the root of the organization tree
pub struct SectionService {
    pool: PgPool,
    folders: Arc<FolderService>,
}

impl SectionService {
    pub fn new(pool: PgPool, folders: Arc<FolderService>) -> Self {
        Self { pool, folders }
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("Section {} not found", id))
    }

    async fn with_folders(&self, sections: Vec<Section>) -> Result<Vec<SectionDto>> {
        let ids: Vec<Uuid> = sections.iter().map(|s| s.id).collect();
        let folders = self.folders.list_in_sections(&ids).await?;
        Ok(SectionDto::assemble(sections, folders))
    }

    /// The caller's sections with nested folders and files
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<SectionDto>> {
        let sections = sqlx::query_as::<_, Section>(
            r#"
            SELECT id, name, display_order, created_at
            FROM core_sections
            WHERE user_id = $1
            ORDER BY display_order, created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_folders(sections).await
    }

    /// Same content as [`SectionService::list`], shaped as the navigation tree
    pub async fn tree(&self, user_id: Uuid) -> Result<Vec<SectionTreeDto>> {
        let sections = self.list(user_id).await?;
        Ok(sections.into_iter().map(SectionTreeDto::from).collect())
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<SectionDto> {
        let section = sqlx::query_as::<_, Section>(
            r#"
            SELECT id, name, display_order, created_at
            FROM core_sections
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Self::not_found(id))?;

        let folders = self.folders.list_in_sections(&[section.id]).await?;
        Ok(SectionDto {
            folders,
            ..SectionDto::from(section)
        })
    }

    pub async fn create(&self, user_id: Uuid, dto: NewSectionDto) -> Result<SectionDto> {
        let section = sqlx::query_as::<_, Section>(
            r#"
            INSERT INTO core_sections (user_id, name, display_order)
            VALUES ($1, $2, $3)
            RETURNING id, name, display_order, created_at
            "#,
        )
        .bind(user_id)
        .bind(&dto.name)
        .bind(dto.order)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        tracing::debug!("Created section {} for user {}", section.id, user_id);
        Ok(SectionDto::from(section))
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, dto: UpdateSectionDto) -> Result<SectionDto> {
        let section = sqlx::query_as::<_, Section>(
            r#"
            UPDATE core_sections
            SET name = COALESCE($3, name),
                display_order = COALESCE($4, display_order)
            WHERE id = $1 AND user_id = $2
            RETURNING id, name, display_order, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(dto.name)
        .bind(dto.order)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| Self::not_found(id))?;

        let folders = self.folders.list_in_sections(&[section.id]).await?;
        Ok(SectionDto {
            folders,
            ..SectionDto::from(section)
        })
    }

    /// Delete a section; folders and files cascade
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM core_sections WHERE id = $1 AND user_id = $2")
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
        params: &AdminSectionQueryParams,
    ) -> Result<(Vec<AdminSectionDto>, i64)> {
        let mut count: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM core_sections s JOIN core_users u ON u.id = s.user_id",
        );
        push_admin_filters(&mut count, params);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT s.id, s.name, s.display_order, s.created_at,
                   s.user_id, u.email AS user_email,
                   (SELECT COUNT(*) FROM core_folders f WHERE f.section_id = s.id) AS folder_count
            FROM core_sections s
            JOIN core_users u ON u.id = s.user_id
            "#,
        );
        push_admin_filters(&mut query, params);
        query
            .push(" ORDER BY s.display_order, s.created_at LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query
            .build_query_as::<AdminSectionDto>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }
}

fn push_admin_filters(builder: &mut QueryBuilder<'_, Postgres>, params: &AdminSectionQueryParams) {
    builder.push(" WHERE TRUE");

    if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (s.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(user_id) = params.user_id {
        builder.push(" AND s.user_id = ").push_bind(user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::file_records::dtos::NewFileRecordDto;
    use crate::features::file_records::FileRecordService;
    use crate::features::folders::dtos::NewFolderDto;
    use crate::shared::test_helpers::insert_user;

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_tree_nests_in_display_order_and_delete_cascades(pool: PgPool) {
        let files = Arc::new(FileRecordService::new(pool.clone()));
        let folders = Arc::new(FolderService::new(pool.clone(), Arc::clone(&files)));
        let sections = SectionService::new(pool.clone(), Arc::clone(&folders));
        let user = insert_user(&pool, "carol@example.com").await;

        let second = sections
            .create(user.user_id, NewSectionDto { name: "B".to_string(), order: 2 })
            .await
            .unwrap();
        let first = sections
            .create(user.user_id, NewSectionDto { name: "A".to_string(), order: 1 })
            .await
            .unwrap();
        let folder = folders
            .create(user.user_id, first.id, NewFolderDto { name: "Roads".to_string(), order: 0 })
            .await
            .unwrap();
        files
            .create(
                user.user_id,
                folder.id,
                NewFileRecordDto {
                    name: "toll.kml".to_string(),
                    file_type: "kml".to_string(),
                    order: 0,
                },
            )
            .await
            .unwrap();

        let tree = sections.tree(user.user_id).await.unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id, first.id);
        assert_eq!(tree[1].id, second.id);
        assert_eq!(tree[0].folders[0].files[0].name, "toll.kml");

        sections.delete(user.user_id, first.id).await.unwrap();
        assert!(matches!(
            folders.get(user.user_id, folder.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(files.list(user.user_id, None).await.unwrap().is_empty());
    }

    #[test]
    fn test_admin_filters_sql() {
        let params = AdminSectionQueryParams {
            search: None,
            user_id: Some(Uuid::nil()),
        };
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1");
        push_admin_filters(&mut builder, &params);
        assert_eq!(builder.sql(), "SELECT 1 WHERE TRUE AND s.user_id = $1");
    }
}
