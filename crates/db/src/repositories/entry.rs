//! Entry repository for reading ledger entries.

use remit_core::ledger::Entry;
use remit_shared::types::{AccountId, EntryId, PageRequest, PageResponse};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use super::error::RepositoryError;
use crate::entities::entries;

/// Read-only repository for ledger entries.
///
/// Entries are written only by transfers.
#[derive(Debug, Clone)]
pub struct EntryRepository {
    db: DatabaseConnection,
}

impl EntryRepository {
    /// Creates a new entry repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Gets an entry by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the entry does not exist.
    pub async fn get_entry(&self, id: EntryId) -> Result<Entry, RepositoryError> {
        entries::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .map(Entry::from)
            .ok_or(RepositoryError::NotFound {
                entity: "entry",
                id: id.into_inner(),
            })
    }

    /// Lists the entries of one account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_entries(
        &self,
        account_id: AccountId,
        page: PageRequest,
    ) -> Result<PageResponse<Entry>, RepositoryError> {
        let query = entries::Entity::find()
            .filter(entries::Column::AccountId.eq(account_id.into_inner()))
            .order_by_asc(entries::Column::CreatedAt)
            .order_by_asc(entries::Column::Id);

        let total = query.clone().count(&self.db).await?;
        let entries = query
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?
            .into_iter()
            .map(Entry::from)
            .collect();

        Ok(PageResponse::new(entries, page, total))
    }
}
