//! Category procedures.

use crate::db::Database;
use crate::error::ApiResult;
use crate::types::{Category, CreateCategoryInput};
use tracing::info;

pub fn get_all(db: &Database) -> ApiResult<Vec<Category>> {
    Ok(db.list_categories()?)
}

pub fn create(db: &Database, input: CreateCategoryInput) -> ApiResult<Category> {
    let category = db.create_category(&input.name)?;
    info!(id = category.id, name = %category.name, "Category created");
    Ok(category)
}
