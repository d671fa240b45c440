//! `SeaORM` Entity for accounts table.

use remit_core::ledger::Account;
use remit_shared::types::{AccountId, InvalidCurrencyCode};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner: String,
    pub balance: i64,
    pub currency: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Account {
    type Error = InvalidCurrencyCode;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: AccountId::from_uuid(model.id),
            owner: model.owner,
            balance: model.balance,
            currency: model.currency.parse()?,
            created_at: model.created_at.to_utc(),
        })
    }
}
