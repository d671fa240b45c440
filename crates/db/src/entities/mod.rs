//! `SeaORM` entity definitions.

pub mod accounts;
pub mod entries;
pub mod transfers;

pub mod prelude {
    //! Entity re-exports.
    pub use super::accounts::Entity as Accounts;
    pub use super::entries::Entity as Entries;
    pub use super::transfers::Entity as Transfers;
}
