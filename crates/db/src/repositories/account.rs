//! Account repository for account database operations.

use chrono::Utc;
use remit_core::ledger::Account;
use remit_shared::types::{AccountId, CurrencyCode, PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::error::RepositoryError;
use crate::entities::{accounts, entries, transfers};

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Account holder name.
    pub owner: String,
    /// Opening balance in the smallest currency unit.
    pub balance: i64,
    /// Currency the account is denominated in.
    pub currency: CurrencyCode,
}

/// Filter options for listing accounts.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    /// Only accounts held by this owner.
    pub owner: Option<String>,
}

/// Account repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new account.
    ///
    /// Balances are only written directly here; afterwards they change
    /// exclusively through transfers.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_account(
        &self,
        input: CreateAccountInput,
    ) -> Result<Account, RepositoryError> {
        let model = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            owner: Set(input.owner),
            balance: Set(input.balance),
            currency: Set(input.currency.into()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        Ok(Account::try_from(model)?)
    }

    /// Gets an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, RepositoryError> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound {
                entity: "account",
                id: id.into_inner(),
            })?;

        Ok(Account::try_from(model)?)
    }

    /// Lists accounts ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_accounts(
        &self,
        filter: AccountFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Account>, RepositoryError> {
        let mut query = accounts::Entity::find().order_by_asc(accounts::Column::Id);

        if let Some(owner) = filter.owner {
            query = query.filter(accounts::Column::Owner.eq(owner));
        }

        let total = query.clone().count(&self.db).await?;
        let models = query
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        let accounts = models
            .into_iter()
            .map(Account::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(accounts, page, total))
    }

    /// Deletes an account.
    ///
    /// Accounts referenced by entries or transfers cannot be deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Account not found
    /// - Account has entries or transfers
    pub async fn delete_account(&self, id: AccountId) -> Result<(), RepositoryError> {
        let uuid = id.into_inner();

        let entry_count = entries::Entity::find()
            .filter(entries::Column::AccountId.eq(uuid))
            .count(&self.db)
            .await?;
        let transfer_count = transfers::Entity::find()
            .filter(
                Condition::any()
                    .add(transfers::Column::FromAccountId.eq(uuid))
                    .add(transfers::Column::ToAccountId.eq(uuid)),
            )
            .count(&self.db)
            .await?;

        let references = entry_count + transfer_count;
        if references > 0 {
            return Err(RepositoryError::AccountInUse(references));
        }

        let result = accounts::Entity::delete_by_id(uuid).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "account",
                id: uuid,
            });
        }

        Ok(())
    }
}
