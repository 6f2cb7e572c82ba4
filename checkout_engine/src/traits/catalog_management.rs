use thiserror::Error;

use crate::db_types::CatalogItem;

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Catalog backend error: {0}")]
    DatabaseError(String),
    #[error("Catalog data is corrupt: {0}")]
    DataIntegrityError(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Fetches the item with the given id, including all its variants. Returns `None` for unknown items.
    async fn fetch_item(&self, item_id: &str) -> Result<Option<CatalogItem>, CatalogError>;
}
