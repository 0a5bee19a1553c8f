//! An in-memory stand-in for the Remote Ledger API.
//!
//! It implements the same routes and JSON shapes as the real service, so the
//! client can be developed and tested without network access. Nothing is
//! persisted: every [StubLedger] starts empty.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use time::OffsetDateTime;

use crate::{
    endpoints,
    models::{Note, RecordId, Transaction, TransactionType},
};

use handlers::{
    create_note, create_transaction, delete_note, delete_transaction, get_user, list_notes,
    list_transactions, require_token, update_balance,
};

mod handlers;

/// The shared state of the stub server.
///
/// Clones share the same data, so tests can keep a handle to inspect and
/// seed the ledger while the server runs.
#[derive(Debug, Clone, Default)]
pub struct StubLedger {
    data: Arc<Mutex<LedgerData>>,
}

#[derive(Debug, Default)]
struct LedgerData {
    next_id: RecordId,
    balances: HashMap<String, f64>,
    transactions: Vec<(String, Transaction)>,
    notes: Vec<(String, Note)>,
    required_token: Option<String>,
}

impl LedgerData {
    fn next_id(&mut self) -> RecordId {
        self.next_id += 1;
        self.next_id
    }
}

impl StubLedger {
    /// Create an empty ledger that accepts requests without a token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject requests that do not carry `Authorization: Bearer <token>`.
    pub fn require_token(&self, token: &str) {
        self.lock().required_token = Some(token.to_owned());
    }

    /// Add a transaction for `user_id` with an explicit creation time.
    pub fn insert_transaction(
        &self,
        user_id: &str,
        kind: TransactionType,
        ref_number: &str,
        amount: f64,
        created_at: OffsetDateTime,
    ) -> Transaction {
        let mut data = self.lock();
        let transaction = Transaction {
            id: data.next_id(),
            ref_number: ref_number.to_owned(),
            amount,
            kind,
            created_at,
        };
        data.transactions
            .push((user_id.to_owned(), transaction.clone()));

        transaction
    }

    /// Add a note for `user_id` with an explicit creation time.
    pub fn insert_note(&self, user_id: &str, content: &str, created_at: OffsetDateTime) -> Note {
        let mut data = self.lock();
        let note = Note {
            id: data.next_id(),
            content: content.to_owned(),
            created_at,
        };
        data.notes.push((user_id.to_owned(), note.clone()));

        note
    }

    /// Set the balance of `user_id`.
    pub fn set_balance(&self, user_id: &str, balance: f64) {
        self.lock().balances.insert(user_id.to_owned(), balance);
    }

    /// The transactions of `user_id` in insertion order.
    pub fn transactions(&self, user_id: &str) -> Vec<Transaction> {
        self.lock()
            .transactions
            .iter()
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, transaction)| transaction.clone())
            .collect()
    }

    /// The notes of `user_id` in insertion order.
    pub fn notes(&self, user_id: &str) -> Vec<Note> {
        self.lock()
            .notes
            .iter()
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, note)| note.clone())
            .collect()
    }

    /// The balance of `user_id`, if one was set.
    pub fn balance(&self, user_id: &str) -> Option<f64> {
        self.lock().balances.get(user_id).copied()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerData> {
        self.data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Return a router with all the ledger API routes.
pub fn build_router(ledger: StubLedger) -> Router {
    Router::new()
        .route(endpoints::USER, get(get_user))
        .route(endpoints::UPDATE_BALANCE, post(update_balance))
        .route(endpoints::TRANSACTIONS, get(list_transactions))
        .route(endpoints::NEW_TRANSACTION, post(create_transaction))
        .route(endpoints::DELETE_TRANSACTION, delete(delete_transaction))
        .route(endpoints::NOTES, get(list_notes))
        .route(endpoints::NEW_NOTE, post(create_note))
        .route(endpoints::DELETE_NOTE, delete(delete_note))
        .layer(middleware::from_fn_with_state(ledger.clone(), require_token))
        .with_state(ledger)
}
