//! Transfer repository for reading transfer records.

use remit_core::ledger::Transfer;
use remit_shared::types::{AccountId, PageRequest, PageResponse, TransferId};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use super::error::RepositoryError;
use crate::entities::transfers;

/// Filter options for listing transfers. Set fields are combined with AND.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferFilter {
    /// Only transfers out of this account.
    pub from_account_id: Option<AccountId>,
    /// Only transfers into this account.
    pub to_account_id: Option<AccountId>,
}

/// Read-only repository for transfer records.
#[derive(Debug, Clone)]
pub struct TransferRepository {
    db: DatabaseConnection,
}

impl TransferRepository {
    /// Creates a new transfer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Gets a transfer by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the transfer does not exist.
    pub async fn get_transfer(&self, id: TransferId) -> Result<Transfer, RepositoryError> {
        transfers::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .map(Transfer::from)
            .ok_or(RepositoryError::NotFound {
                entity: "transfer",
                id: id.into_inner(),
            })
    }

    /// Lists transfers, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_transfers(
        &self,
        filter: TransferFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Transfer>, RepositoryError> {
        let mut query = transfers::Entity::find()
            .order_by_asc(transfers::Column::CreatedAt)
            .order_by_asc(transfers::Column::Id);

        if let Some(from) = filter.from_account_id {
            query = query.filter(transfers::Column::FromAccountId.eq(from.into_inner()));
        }
        if let Some(to) = filter.to_account_id {
            query = query.filter(transfers::Column::ToAccountId.eq(to.into_inner()));
        }

        let total = query.clone().count(&self.db).await?;
        let transfers = query
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?
            .into_iter()
            .map(Transfer::from)
            .collect();

        Ok(PageResponse::new(transfers, page, total))
    }
}
