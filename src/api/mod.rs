//! Access to the Remote Ledger API, the system of record for balances,
//! transactions and notes.

use async_trait::async_trait;

use crate::{
    Error, Identity,
    models::{NewNote, NewTransaction, Note, RecordId, Transaction, UserProfile},
};

pub use http::HttpLedgerApi;

mod http;

/// The operations the Remote Ledger API offers.
///
/// Every call is a single request/response exchange. Implementations do not
/// retry and do not cache.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Get the profile, including the balance, of the user.
    async fn get_user(&self, identity: &Identity) -> Result<UserProfile, Error>;

    /// Overwrite the balance of the user, returning the server's message.
    async fn update_balance(&self, identity: &Identity, balance: f64) -> Result<String, Error>;

    /// List all transactions of the user, in the order the server returns them.
    async fn list_transactions(&self, identity: &Identity) -> Result<Vec<Transaction>, Error>;

    /// Create a transaction for the user.
    async fn create_transaction(
        &self,
        identity: &Identity,
        transaction: &NewTransaction,
    ) -> Result<(), Error>;

    /// Delete the transaction with the ID `id`.
    async fn delete_transaction(&self, identity: &Identity, id: RecordId) -> Result<(), Error>;

    /// List all notes of the user, in the order the server returns them.
    async fn list_notes(&self, identity: &Identity) -> Result<Vec<Note>, Error>;

    /// Create a note for the user.
    async fn create_note(&self, identity: &Identity, note: &NewNote) -> Result<(), Error>;

    /// Delete the note with the ID `id`.
    async fn delete_note(&self, identity: &Identity, id: RecordId) -> Result<(), Error>;
}
