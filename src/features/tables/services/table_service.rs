use std::collections::HashSet;

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::core::error::{AppError, Result};
use crate::features::tables::dtos::{TablePreviewDto, TableSummaryDto};
use crate::features::tables::identifiers::{
    derive_table_name, is_internal_table, quote_ident, resolve_table_name, sanitize_headers,
    ColumnLayout, PRIMARY_KEY_COLUMN,
};
use crate::shared::constants::PREVIEW_ROW_LIMIT;

/// Advisory lock key serializing backing-table name reservation
const TABLE_RESERVATION_LOCK: i64 = 0x6765_6f6c_6179_6572;

/// Postgres accepts at most this many bind parameters per statement
const MAX_BIND_PARAMS: usize = 65_535;

/// Result of materializing a delimited file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub table_name: String,
    pub row_count: u64,
    pub column_count: usize,
}

/// Header layout plus projected data rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCsv {
    pub layout: ColumnLayout,
    pub rows: Vec<Vec<String>>,
}

/// Parse a delimited file whose first row is the header.
///
/// Rows must have as many cells as the header. Cells under a blank header are dropped.
pub fn parse_csv(data: &[u8]) -> Result<ParsedCsv> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| AppError::Ingestion(format!("Could not read CSV header: {}", e)))?
        .clone();

    let layout = sanitize_headers(&headers.iter().collect::<Vec<_>>());
    if layout.names.is_empty() {
        return Err(AppError::Ingestion("CSV header row is empty".to_string()));
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            AppError::Ingestion(format!("Could not parse CSV row {}: {}", index + 2, e))
        })?;
        rows.push(
            layout
                .positions
                .iter()
                .map(|&p| record.get(p).unwrap_or_default().to_string())
                .collect(),
        );
    }

    Ok(ParsedCsv { layout, rows })
}

/// Rows per multi-row INSERT so the statement stays under the bind-parameter limit
fn rows_per_insert(column_count: usize) -> usize {
    (MAX_BIND_PARAMS / column_count.max(1)).max(1)
}

fn create_table_sql(table: &str, columns: &[String]) -> Result<String> {
    let mut defs = vec![format!("{} SERIAL PRIMARY KEY", quote_ident(PRIMARY_KEY_COLUMN)?)];
    for column in columns {
        defs.push(format!("{} TEXT", quote_ident(column)?));
    }
    Ok(format!("CREATE TABLE {} ({})", quote_ident(table)?, defs.join(", ")))
}

fn ingestion_error(table: &str, e: sqlx::Error) -> AppError {
    tracing::error!("Ingestion into table {} failed: {}", table, e);
    AppError::Ingestion(e.to_string())
}

/// Backing-table lifecycle plus the admin catalog
pub struct TableService {
    pool: PgPool,
}

impl TableService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Materialize `data` as a new backing table named after `title`.
    ///
    /// Runs on the caller's transaction; nothing persists unless it commits.
    pub async fn ingest(conn: &mut PgConnection, data: &[u8], title: &str) -> Result<IngestOutcome> {
        let parsed = parse_csv(data)?;
        let table_name = Self::reserve_table_name(conn, title).await?;

        sqlx::query(&create_table_sql(&table_name, &parsed.layout.names)?)
            .execute(&mut *conn)
            .await
            .map_err(|e| ingestion_error(&table_name, e))?;

        let row_count =
            Self::insert_rows(conn, &table_name, &parsed.layout.names, &parsed.rows).await?;

        tracing::info!(
            "Ingested table {}: rows={}, columns={}",
            table_name,
            row_count,
            parsed.layout.names.len()
        );

        Ok(IngestOutcome {
            table_name,
            row_count,
            column_count: parsed.layout.names.len(),
        })
    }

    /// Pick a free name for `title` while holding the reservation lock until the transaction ends
    async fn reserve_table_name(conn: &mut PgConnection, title: &str) -> Result<String> {
        let base = derive_table_name(title);

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(TABLE_RESERVATION_LOCK)
            .execute(&mut *conn)
            .await
            .map_err(|e| ingestion_error(&base, e))?;

        let taken: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT c.relname::text
            FROM pg_class c
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE n.nspname IN (current_schema(), 'pg_catalog')
              AND (c.relname::text = $1 OR left(c.relname::text, length($1) + 1) = $1 || '_')
            "#,
        )
        .bind(&base)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| ingestion_error(&base, e))?;

        let taken: HashSet<String> = taken.into_iter().collect();
        Ok(resolve_table_name(&base, &taken))
    }

    async fn insert_rows(
        conn: &mut PgConnection,
        table: &str,
        columns: &[String],
        rows: &[Vec<String>],
    ) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let quoted_columns = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Result<Vec<_>>>()?;
        let prefix = format!(
            "INSERT INTO {} ({}) ",
            quote_ident(table)?,
            quoted_columns.join(", ")
        );

        let mut inserted = 0u64;
        for chunk in rows.chunks(rows_per_insert(columns.len())) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(&prefix);
            builder.push_values(chunk, |mut b, row| {
                for value in row {
                    b.push_bind(value.as_str());
                }
            });

            let result = builder
                .build()
                .execute(&mut *conn)
                .await
                .map_err(|e| ingestion_error(table, e))?;
            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    /// Drop a record's backing table on the caller's transaction. Empty name is a no-op.
    pub async fn release(conn: &mut PgConnection, table_name: &str) -> Result<()> {
        if table_name.is_empty() {
            return Ok(());
        }

        sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", quote_ident(table_name)?))
            .execute(&mut *conn)
            .await?;

        tracing::info!("Dropped backing table {}", table_name);
        Ok(())
    }

    /// Non-internal tables in the current schema with their row counts
    pub async fn list_catalog(&self, search: Option<&str>) -> Result<Vec<TableSummaryDto>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT tablename::text FROM pg_tables WHERE schemaname = current_schema() ORDER BY tablename",
        )
        .fetch_all(&self.pool)
        .await?;

        let search = search.map(str::to_lowercase);
        let mut tables = Vec::new();
        for name in names {
            if is_internal_table(&name) {
                continue;
            }
            if let Some(ref needle) = search {
                if !name.contains(needle.as_str()) {
                    continue;
                }
            }

            match self.count_rows(&name).await {
                Ok(row_count) => tables.push(TableSummaryDto {
                    table_name: name,
                    row_count,
                }),
                Err(e) => tracing::warn!("Skipping table {} in catalog: {}", name, e),
            }
        }

        Ok(tables)
    }

    async fn count_rows(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table)?);
        Ok(sqlx::query_scalar(&sql).fetch_one(&self.pool).await?)
    }

    fn reject_internal(name: &str) -> Result<()> {
        if is_internal_table(name) {
            return Err(AppError::Forbidden(format!(
                "Table {} belongs to the application schema",
                name
            )));
        }
        Ok(())
    }

    /// 404 unless `name` is an existing table we can address safely
    async fn ensure_table_exists(conn: &mut PgConnection, name: &str) -> Result<()> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM pg_tables WHERE schemaname = current_schema() AND tablename::text = $1)",
        )
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;

        if !exists || quote_ident(name).is_err() {
            return Err(AppError::NotFound(format!("Table {} not found", name)));
        }
        Ok(())
    }

    /// Columns in ordinal order plus the first rows as JSON objects
    pub async fn preview(&self, name: &str) -> Result<TablePreviewDto> {
        Self::reject_internal(name)?;
        let mut conn = self.pool.acquire().await?;
        Self::ensure_table_exists(&mut conn, name).await?;

        let columns: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT column_name::text
            FROM information_schema.columns
            WHERE table_schema = current_schema() AND table_name = $1
            ORDER BY ordinal_position
            "#,
        )
        .bind(name)
        .fetch_all(&mut *conn)
        .await?;

        let quoted = quote_ident(name)?;
        let order_by = if columns.iter().any(|c| c == PRIMARY_KEY_COLUMN) {
            format!(" ORDER BY {}", quote_ident(PRIMARY_KEY_COLUMN)?)
        } else {
            String::new()
        };

        let rows: Vec<serde_json::Value> = sqlx::query_scalar(&format!(
            "SELECT to_jsonb(t) FROM {} t{} LIMIT $1",
            quoted, order_by
        ))
        .bind(PREVIEW_ROW_LIMIT)
        .fetch_all(&mut *conn)
        .await?;

        let row_count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", quoted))
            .fetch_one(&mut *conn)
            .await?;

        Ok(TablePreviewDto {
            table_name: name.to_string(),
            truncated: row_count > rows.len() as i64,
            columns,
            rows,
            row_count,
        })
    }

    /// Drop a table from the admin catalog, along with views built on it, and
    /// detach it from any owning record
    pub async fn drop_table(&self, name: &str) -> Result<()> {
        Self::reject_internal(name)?;
        let mut tx = self.pool.begin().await?;
        Self::ensure_table_exists(&mut tx, name).await?;

        sqlx::query(&format!("DROP TABLE {} CASCADE", quote_ident(name)?))
            .execute(&mut *tx)
            .await?;

        let detached = sqlx::query("UPDATE core_uploaded_files SET table_name = '' WHERE table_name = $1")
            .bind(name)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        tracing::info!(
            "Dropped table {} from admin catalog (detached from {} records)",
            name,
            detached
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_projects_non_blank_headers() {
        let data = b"Name,,2nd Col,Name\nAda,x,1815,Lovelace\nGrace,y,1906,Hopper\n";
        let parsed = parse_csv(data).unwrap();

        assert_eq!(parsed.layout.names, vec!["name", "col_2nd_col", "name_1"]);
        assert_eq!(
            parsed.rows,
            vec![
                vec!["Ada", "1815", "Lovelace"],
                vec!["Grace", "1906", "Hopper"],
            ]
        );
    }

    #[test]
    fn test_parse_csv_header_only() {
        let parsed = parse_csv(b"a,b,c\n").unwrap();
        assert_eq!(parsed.layout.names.len(), 3);
        assert!(parsed.rows.is_empty());
    }

    #[test]
    fn test_parse_csv_quoted_cells_and_bom() {
        let data = "\u{feff}city,note\n\"Bandung\",\"a, b\"\nSurabaya,\"line\nbreak\"\n";
        let parsed = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(parsed.layout.names, vec!["city", "note"]);
        assert_eq!(parsed.rows[0], vec!["Bandung", "a, b"]);
        assert_eq!(parsed.rows[1], vec!["Surabaya", "line\nbreak"]);
    }

    #[test]
    fn test_parse_csv_rejects_blank_header() {
        let cases: [&[u8]; 3] = [b"", b" , ,\n1,2,3\n", b"\n"];
        for data in cases {
            let err = parse_csv(data).unwrap_err();
            match err {
                AppError::Ingestion(msg) => assert_eq!(msg, "CSV header row is empty"),
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_csv_rejects_ragged_rows() {
        let err = parse_csv(b"a,b\n1,2\n3\n").unwrap_err();
        assert!(matches!(err, AppError::Ingestion(msg) if msg.contains("row 3")));
    }

    #[test]
    fn test_rows_per_insert_respects_bind_limit() {
        assert_eq!(rows_per_insert(1), MAX_BIND_PARAMS);
        assert_eq!(rows_per_insert(3), 21_845);
        assert!(rows_per_insert(700) * 700 <= MAX_BIND_PARAMS);
        assert_eq!(rows_per_insert(100_000), 1);
    }

    #[test]
    fn test_create_table_sql() {
        let sql = create_table_sql("my_data", &["name".to_string(), "col_2nd_col".to_string()])
            .unwrap();
        assert_eq!(
            sql,
            r#"CREATE TABLE "my_data" ("id" SERIAL PRIMARY KEY, "name" TEXT, "col_2nd_col" TEXT)"#
        );
        assert!(create_table_sql("my data", &[]).is_err());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_ingest_creates_table_with_all_rows(pool: PgPool) {
        let mut csv = String::from("Region,Population,Area km2\n");
        for i in 0..250 {
            csv.push_str(&format!("r{},{},{}\n", i, i * 10, i + 1));
        }

        let mut tx = pool.begin().await.unwrap();
        let outcome = TableService::ingest(&mut tx, csv.as_bytes(), "Population 2024")
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(outcome.table_name, "population_2024");
        assert_eq!(outcome.row_count, 250);
        assert_eq!(outcome.column_count, 3);

        let service = TableService::new(pool.clone());
        let preview = service.preview("population_2024").await.unwrap();
        assert_eq!(preview.columns, vec!["id", "region", "population", "area_km2"]);
        assert_eq!(preview.row_count, 250);
        assert_eq!(preview.rows[0]["region"], "r0");
        assert!(!preview.truncated);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_ingest_suffixes_on_collision_and_release_drops(pool: PgPool) {
        let mut names = Vec::new();
        for _ in 0..3 {
            let mut tx = pool.begin().await.unwrap();
            let outcome = TableService::ingest(&mut tx, b"a\n1\n", "My Data!").await.unwrap();
            tx.commit().await.unwrap();
            names.push(outcome.table_name);
        }
        assert_eq!(names, vec!["my_data", "my_data_1", "my_data_2"]);

        let service = TableService::new(pool.clone());
        let catalog = service.list_catalog(Some("my_data")).await.unwrap();
        assert_eq!(catalog.len(), 3);

        let mut tx = pool.begin().await.unwrap();
        TableService::release(&mut tx, "my_data_1").await.unwrap();
        TableService::release(&mut tx, "").await.unwrap();
        tx.commit().await.unwrap();

        let catalog = service.list_catalog(None).await.unwrap();
        let remaining: Vec<_> = catalog.iter().map(|t| t.table_name.as_str()).collect();
        assert_eq!(remaining, vec!["my_data", "my_data_2"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_system_catalog_title_gets_its_own_table(pool: PgPool) {
        for data in [&b"a\n"[..], &b"a\n1\n"[..]] {
            let mut tx = pool.begin().await.unwrap();
            let outcome = TableService::ingest(&mut tx, data, "pg_class").await.unwrap();
            tx.commit().await.unwrap();
            assert_eq!(outcome.table_name, "t_pg_class");

            let mut tx = pool.begin().await.unwrap();
            TableService::release(&mut tx, &outcome.table_name).await.unwrap();
            tx.commit().await.unwrap();

            let remaining: Option<String> =
                sqlx::query_scalar("SELECT to_regclass('t_pg_class')::text")
                    .fetch_one(&pool)
                    .await
                    .unwrap();
            assert_eq!(remaining, None);
        }

        let service = TableService::new(pool.clone());
        assert!(service.list_catalog(Some("pg_class")).await.unwrap().is_empty());
        assert!(matches!(
            service.preview("pg_class").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_drop_table_removes_dependent_views(pool: PgPool) {
        let mut tx = pool.begin().await.unwrap();
        let outcome = TableService::ingest(&mut tx, b"city\nBandung\n", "Cities").await.unwrap();
        tx.commit().await.unwrap();

        sqlx::query("CREATE VIEW cities_view AS SELECT city FROM cities")
            .execute(&pool)
            .await
            .unwrap();

        let service = TableService::new(pool.clone());
        service.drop_table(&outcome.table_name).await.unwrap();

        let (table, view): (Option<String>, Option<String>) = sqlx::query_as(
            "SELECT to_regclass('cities')::text, to_regclass('cities_view')::text",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(table, None);
        assert_eq!(view, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_failed_ingest_leaves_nothing_behind(pool: PgPool) {
        let mut tx = pool.begin().await.unwrap();
        let result = TableService::ingest(&mut tx, b"a,b\n1,2\n3\n", "broken").await;
        assert!(matches!(result, Err(AppError::Ingestion(_))));
        tx.rollback().await.unwrap();

        let service = TableService::new(pool);
        assert!(service.list_catalog(None).await.unwrap().is_empty());
        assert!(matches!(
            service.drop_table("core_users").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.preview("missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}
