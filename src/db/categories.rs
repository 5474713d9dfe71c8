//! Category storage and name normalization.

use super::Database;
use crate::error::ApiError;
use crate::types::Category;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

/// Maximum length of a normalized category name, in characters.
pub const MAX_CATEGORY_NAME_LEN: usize = 100;

/// Normalize a category name: trim surrounding whitespace, uppercase the first
/// character and lowercase the rest. Returns an empty string for blank input.
pub fn normalize_category_name(name: &str) -> String {
    let trimmed = name.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let mut normalized: String = first.to_uppercase().collect();
            normalized.push_str(&chars.as_str().to_lowercase());
            normalized
        }
    }
}

/// Validate and normalize a category name for storage.
pub fn validate_category_name(name: &str) -> std::result::Result<String, ApiError> {
    let normalized = normalize_category_name(name);
    if normalized.is_empty() {
        return Err(ApiError::invalid_input(
            "name",
            "Category name is empty after normalization",
        ));
    }
    if normalized.chars().count() > MAX_CATEGORY_NAME_LEN {
        return Err(ApiError::invalid_input(
            "name",
            format!(
                "Category name is too long (max {} characters)",
                MAX_CATEGORY_NAME_LEN
            ),
        ));
    }
    Ok(normalized)
}

/// Fetch a category using an existing connection.
pub(crate) fn get_category_internal(
    conn: &Connection,
    category_id: i64,
) -> Result<Option<Category>> {
    let category = conn
        .query_row(
            "SELECT id, name FROM categories WHERE id = ?1",
            params![category_id],
            |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(category)
}

impl Database {
    /// List all categories ordered by name.
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name FROM categories ORDER BY name COLLATE NOCASE ASC")?;
            let categories = stmt
                .query_map([], |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(categories)
        })
    }

    /// Get a category by ID.
    pub fn get_category(&self, category_id: i64) -> Result<Option<Category>> {
        self.with_conn(|conn| get_category_internal(conn, category_id))
    }

    /// Create a category. The name is normalized before the uniqueness check,
    /// so "home" and "HOME " collide.
    pub fn create_category(&self, name: &str) -> Result<Category> {
        let normalized = validate_category_name(name)?;

        self.with_conn(|conn| {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM categories WHERE name = ?1 COLLATE NOCASE",
                    params![normalized],
                    |row| row.get(0),
                )
                .optional()?;

            if existing.is_some() {
                return Err(ApiError::conflict(format!(
                    "Category \"{}\" already exists",
                    normalized
                ))
                .with_field("name")
                .into());
            }

            conn.execute(
                "INSERT INTO categories (name) VALUES (?1)",
                params![normalized],
            )?;
            let id = conn.last_insert_rowid();
            debug!(id, name = %normalized, "Created category");

            Ok(Category {
                id,
                name: normalized,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_capitalizes() {
        assert_eq!(normalize_category_name(" groceries "), "Groceries");
        assert_eq!(normalize_category_name("wORK"), "Work");
        assert_eq!(normalize_category_name("a"), "A");
    }

    #[test]
    fn test_normalize_blank_is_empty() {
        assert_eq!(normalize_category_name(""), "");
        assert_eq!(normalize_category_name("   \t"), "");
    }

    #[test]
    fn test_normalize_non_ascii() {
        assert_eq!(normalize_category_name("ÉCOLE"), "École");
        assert_eq!(normalize_category_name("ação"), "Ação");
    }

    #[test]
    fn test_validate_rejects_overlong_names() {
        let name = "x".repeat(MAX_CATEGORY_NAME_LEN + 1);
        let err = validate_category_name(&name).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("name"));

        let ok = "x".repeat(MAX_CATEGORY_NAME_LEN);
        assert!(validate_category_name(&ok).is_ok());
    }
}
