//! Naming rules for backing tables and their columns.
//!
//! Everything here is pure; collision checks against the live catalog happen in
//! [`TableService`](super::services::TableService) while holding the reservation lock.

use std::collections::HashSet;

use crate::core::error::{AppError, Result};
use crate::shared::constants::INTERNAL_TABLE_PREFIXES;
use crate::shared::validation::is_valid_identifier;

/// Postgres truncates identifiers past NAMEDATALEN - 1 bytes
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Bytes kept free on a table base for a `_<n>` collision suffix
const TABLE_SUFFIX_RESERVE: usize = 6;

/// Column every backing table gets as its primary key
pub const PRIMARY_KEY_COLUMN: &str = "id";

/// Header row after sanitization: which source cells survive and what they are called
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Positions of non-blank header cells; data rows are projected through these
    pub positions: Vec<usize>,
    pub names: Vec<String>,
}

fn truncate(name: &str, max: usize) -> &str {
    // inputs are ASCII by the time they reach here
    &name[..name.len().min(max)]
}

fn is_internal_prefix(name: &str) -> bool {
    INTERNAL_TABLE_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Tables owned by the application schema, or named like a system catalog
pub fn is_internal_table(name: &str) -> bool {
    is_internal_prefix(name)
}

/// Base table name for a title: `"My Data!"` becomes `my_data`
pub fn derive_table_name(title: &str) -> String {
    let mapped: String = title
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut base = mapped.trim_matches('_').to_string();
    if base.is_empty() {
        base = "table".to_string();
    }
    if base.starts_with(|c: char| c.is_ascii_digit()) || is_internal_prefix(&base) {
        base = format!("t_{}", base);
    }

    truncate(&base, MAX_IDENTIFIER_LEN - TABLE_SUFFIX_RESERVE)
        .trim_end_matches('_')
        .to_string()
}

/// First of `base`, `base_1`, `base_2`, … not present in `taken`
pub fn resolve_table_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }

    (1u32..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Column identifier for one header cell: `"2nd Col"` becomes `col_2nd_col`
pub fn sanitize_column(cell: &str) -> String {
    let mapped: String = cell
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut name = mapped.trim_matches('_').to_string();
    if name.is_empty() {
        name = "column".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name = format!("col_{}", name);
    }

    truncate(&name, MAX_IDENTIFIER_LEN).to_string()
}

/// Sanitize a header row. Blank cells are dropped; names are unique within the
/// row and never collide with the primary key column.
pub fn sanitize_headers<S: AsRef<str>>(cells: &[S]) -> ColumnLayout {
    let mut taken: HashSet<String> = HashSet::from([PRIMARY_KEY_COLUMN.to_string()]);
    let mut layout = ColumnLayout {
        positions: Vec::new(),
        names: Vec::new(),
    };

    for (position, cell) in cells.iter().enumerate() {
        let cell = cell.as_ref();
        if cell.trim().is_empty() {
            continue;
        }

        let base = sanitize_column(cell);
        let mut name = base.clone();
        let mut n = 1u32;
        while taken.contains(&name) {
            let suffix = format!("_{}", n);
            name = format!(
                "{}{}",
                truncate(&base, MAX_IDENTIFIER_LEN - suffix.len()),
                suffix
            );
            n += 1;
        }

        taken.insert(name.clone());
        layout.positions.push(position);
        layout.names.push(name);
    }

    layout
}

/// Double-quote an identifier after checking it against the safe alphabet
pub fn quote_ident(name: &str) -> Result<String> {
    if !is_valid_identifier(name) {
        return Err(AppError::Internal(format!(
            "Refusing to use unsafe SQL identifier {:?}",
            name
        )));
    }
    Ok(format!("\"{}\"", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::validation::IDENTIFIER_REGEX;
    use fake::faker::lorem::en::Sentence;
    use fake::{Fake, Faker};

    #[test]
    fn test_derive_table_name_examples() {
        assert_eq!(derive_table_name("My Data!"), "my_data");
        assert_eq!(derive_table_name("  Roads -- 2024 "), "roads____2024");
        assert_eq!(derive_table_name("Kepadatan Penduduk"), "kepadatan_penduduk");
        assert_eq!(derive_table_name("!!!"), "table");
        assert_eq!(derive_table_name(""), "table");
        assert_eq!(derive_table_name("2024 census"), "t_2024_census");
        assert_eq!(derive_table_name("core_users"), "t_core_users");
        assert_eq!(derive_table_name("pg_class"), "t_pg_class");
        assert_eq!(derive_table_name("PG Tables"), "t_pg_tables");
        assert_eq!(derive_table_name("Ünïcode"), "n_code");
    }

    #[test]
    fn test_derive_table_name_leaves_room_for_suffix() {
        let name = derive_table_name(&"abc".repeat(40));
        assert_eq!(name.len(), MAX_IDENTIFIER_LEN - TABLE_SUFFIX_RESERVE);
        assert!(is_valid_identifier(&format!("{}_99999", name)));
    }

    #[test]
    fn test_resolve_table_name_suffixes() {
        let mut taken = HashSet::new();
        assert_eq!(resolve_table_name("my_data", &taken), "my_data");

        taken.insert("my_data".to_string());
        assert_eq!(resolve_table_name("my_data", &taken), "my_data_1");

        taken.insert("my_data_1".to_string());
        taken.insert("my_data_3".to_string());
        assert_eq!(resolve_table_name("my_data", &taken), "my_data_2");
    }

    #[test]
    fn test_sanitize_headers_examples() {
        let layout = sanitize_headers(&["Name", "2nd Col", "Name"]);
        assert_eq!(layout.names, vec!["name", "col_2nd_col", "name_1"]);
        assert_eq!(layout.positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_sanitize_headers_drops_blank_cells_positionally() {
        let layout = sanitize_headers(&["a", "", "  ", "b"]);
        assert_eq!(layout.names, vec!["a", "b"]);
        assert_eq!(layout.positions, vec![0, 3]);
    }

    #[test]
    fn test_sanitize_headers_reserves_primary_key() {
        let layout = sanitize_headers(&["ID", "id", "value"]);
        assert_eq!(layout.names, vec!["id_1", "id_2", "value"]);
    }

    #[test]
    fn test_sanitize_column_edge_cases() {
        assert_eq!(sanitize_column("__Total (IDR)__"), "total__idr");
        assert_eq!(sanitize_column("%%%"), "column");
        assert_eq!(sanitize_column("1"), "col_1");
        assert_eq!(sanitize_column(&"x".repeat(100)).len(), MAX_IDENTIFIER_LEN);
    }

    #[test]
    fn test_sanitize_headers_dedupes_truncated_names() {
        let long = "y".repeat(80);
        let layout = sanitize_headers(&[long.as_str(), long.as_str()]);
        assert_eq!(layout.names[0].len(), MAX_IDENTIFIER_LEN);
        assert_eq!(layout.names[1].len(), MAX_IDENTIFIER_LEN);
        assert!(layout.names[1].ends_with("_1"));
        assert_ne!(layout.names[0], layout.names[1]);
    }

    #[test]
    fn test_random_headers_are_valid_and_unique() {
        for _ in 0..200 {
            let count = (1..12).fake::<usize>();
            let cells: Vec<String> = (0..count)
                .map(|i| {
                    if i % 3 == 0 {
                        Sentence(1..4).fake()
                    } else {
                        Faker.fake()
                    }
                })
                .collect();

            let layout = sanitize_headers(&cells);
            let unique: HashSet<&String> = layout.names.iter().collect();
            assert_eq!(unique.len(), layout.names.len(), "duplicates in {:?}", cells);
            for name in &layout.names {
                assert!(IDENTIFIER_REGEX.is_match(name), "bad column {:?}", name);
                assert!(!name.starts_with(|c: char| c.is_ascii_digit()));
                assert_ne!(name, PRIMARY_KEY_COLUMN);
            }
        }
    }

    #[test]
    fn test_random_titles_yield_valid_table_names() {
        for _ in 0..200 {
            let title: String = if (0..2).fake::<u8>() == 0 {
                Sentence(1..8).fake()
            } else {
                Faker.fake()
            };
            let name = derive_table_name(&title);
            assert!(IDENTIFIER_REGEX.is_match(&name), "bad table {:?}", name);
            assert!(!is_internal_table(&name));
        }
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("my_data").unwrap(), "\"my_data\"");
        assert!(quote_ident("bad\"name").is_err());
        assert!(quote_ident("Upper").is_err());
    }

    #[test]
    fn test_is_internal_table() {
        assert!(is_internal_table("core_users"));
        assert!(is_internal_table("_sqlx_migrations"));
        assert!(is_internal_table("pg_user"));
        assert!(!is_internal_table("roads"));
    }
}
