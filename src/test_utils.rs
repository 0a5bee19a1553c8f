//! An in-memory [LedgerApi] for testing the view models.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime, macros::datetime};
use tokio::sync::oneshot;

use crate::{
    Error, Identity, UserId,
    api::LedgerApi,
    models::{NewNote, NewTransaction, Note, RecordId, Transaction, TransactionType, UserProfile},
};

/// The operations of [LedgerApi], used to inject failures and gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    GetUser,
    UpdateBalance,
    ListTransactions,
    CreateTransaction,
    DeleteTransaction,
    ListNotes,
    CreateNote,
    DeleteNote,
}

/// A call made to the fake, with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    GetUser,
    UpdateBalance(f64),
    ListTransactions,
    CreateTransaction(NewTransaction),
    DeleteTransaction(RecordId),
    ListNotes,
    CreateNote(NewNote),
    DeleteNote(RecordId),
}

#[derive(Default)]
struct FakeData {
    next_id: RecordId,
    balance: Option<f64>,
    transactions: Vec<Transaction>,
    notes: Vec<Note>,
    calls: Vec<Call>,
    failures: HashMap<Op, Error>,
    gates: HashMap<Op, VecDeque<oneshot::Receiver<()>>>,
}

/// A fake ledger for a single user.
///
/// Each call records itself, computes its result from the current data, and
/// then waits for its gate (if one was set with [FakeLedger::gate]) before
/// returning. Results are therefore fixed at call time, not at release time.
#[derive(Default)]
pub(crate) struct FakeLedger {
    data: Mutex<FakeData>,
}

impl FakeLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_transactions(transactions: Vec<Transaction>) -> Self {
        let ledger = Self::new();
        {
            let mut data = ledger.lock();
            data.next_id = transactions.iter().map(|t| t.id).max().unwrap_or(0);
            data.transactions = transactions;
        }
        ledger
    }

    pub(crate) fn set_balance(&self, balance: f64) {
        self.lock().balance = Some(balance);
    }

    pub(crate) fn add_transaction(&self, transaction: Transaction) {
        self.lock().transactions.push(transaction);
    }

    pub(crate) fn add_note(&self, note: Note) {
        self.lock().notes.push(note);
    }

    /// Make every call of `op` fail with `error` until [FakeLedger::heal] is called.
    pub(crate) fn fail(&self, op: Op, error: Error) {
        self.lock().failures.insert(op, error);
    }

    pub(crate) fn heal(&self, op: Op) {
        self.lock().failures.remove(&op);
    }

    /// Hold the next not yet gated call of `op` until the returned sender
    /// fires (or is dropped).
    pub(crate) fn gate(&self, op: Op) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        self.lock().gates.entry(op).or_default().push_back(receiver);
        sender
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Yield until at least `count` calls have been made.
    pub(crate) async fn wait_for_calls(&self, count: usize) {
        while self.call_count() < count {
            tokio::task::yield_now().await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeData> {
        self.data.lock().expect("Could not acquire fake ledger lock")
    }

    /// Record `call`, compute the result with `respond` unless `op` is set
    /// to fail, then wait for the gate of `op`, if any.
    async fn handle<T>(
        &self,
        op: Op,
        call: Call,
        respond: impl FnOnce(&mut FakeData) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let (result, gate) = {
            let mut data = self.lock();
            data.calls.push(call);
            let failure = data.failures.get(&op).cloned();
            let result = match failure {
                Some(error) => Err(error),
                None => respond(&mut data),
            };
            let gate = data.gates.get_mut(&op).and_then(VecDeque::pop_front);
            (result, gate)
        };

        if let Some(gate) = gate {
            let _ = gate.await;
        }

        result
    }
}

fn not_found() -> Error {
    Error::RemoteRejected {
        status: 404,
        message: None,
    }
}

#[async_trait]
impl LedgerApi for FakeLedger {
    async fn get_user(&self, _identity: &Identity) -> Result<UserProfile, Error> {
        self.handle(Op::GetUser, Call::GetUser, |data| {
            Ok(UserProfile {
                balance: data.balance,
            })
        })
        .await
    }

    async fn update_balance(&self, _identity: &Identity, balance: f64) -> Result<String, Error> {
        self.handle(Op::UpdateBalance, Call::UpdateBalance(balance), |data| {
            data.balance = Some(balance);
            Ok("Balance updated successfully".to_owned())
        })
        .await
    }

    async fn list_transactions(&self, _identity: &Identity) -> Result<Vec<Transaction>, Error> {
        self.handle(Op::ListTransactions, Call::ListTransactions, |data| {
            Ok(data.transactions.clone())
        })
        .await
    }

    async fn create_transaction(
        &self,
        _identity: &Identity,
        transaction: &NewTransaction,
    ) -> Result<(), Error> {
        let call = Call::CreateTransaction(transaction.clone());
        self.handle(Op::CreateTransaction, call, |data| {
            data.next_id += 1;
            let id = data.next_id;
            data.transactions.push(Transaction {
                id,
                ref_number: transaction.ref_number.clone(),
                amount: transaction.amount,
                kind: transaction.kind,
                created_at: timestamp(id),
            });
            Ok(())
        })
        .await
    }

    async fn delete_transaction(&self, _identity: &Identity, id: RecordId) -> Result<(), Error> {
        self.handle(Op::DeleteTransaction, Call::DeleteTransaction(id), |data| {
            let count_before = data.transactions.len();
            data.transactions.retain(|transaction| transaction.id != id);

            if data.transactions.len() == count_before {
                Err(not_found())
            } else {
                Ok(())
            }
        })
        .await
    }

    async fn list_notes(&self, _identity: &Identity) -> Result<Vec<Note>, Error> {
        self.handle(Op::ListNotes, Call::ListNotes, |data| Ok(data.notes.clone()))
            .await
    }

    async fn create_note(&self, _identity: &Identity, note: &NewNote) -> Result<(), Error> {
        self.handle(Op::CreateNote, Call::CreateNote(note.clone()), |data| {
            data.next_id += 1;
            let id = data.next_id;
            data.notes.push(Note {
                id,
                content: note.content.clone(),
                created_at: timestamp(id),
            });
            Ok(())
        })
        .await
    }

    async fn delete_note(&self, _identity: &Identity, id: RecordId) -> Result<(), Error> {
        self.handle(Op::DeleteNote, Call::DeleteNote(id), |data| {
            let count_before = data.notes.len();
            data.notes.retain(|note| note.id != id);

            if data.notes.len() == count_before {
                Err(not_found())
            } else {
                Ok(())
            }
        })
        .await
    }
}

/// A deterministic creation time, `minutes` after a fixed instant.
pub(crate) fn timestamp(minutes: i64) -> OffsetDateTime {
    datetime!(2025-07-01 08:00 UTC) + Duration::minutes(minutes)
}

pub(crate) fn identity() -> Identity {
    Identity::new(
        UserId::new("user_2abc").expect("Could not create user ID"),
        "consolacion@example.com",
    )
}

pub(crate) fn transaction(id: RecordId, ref_number: &str, minutes: i64) -> Transaction {
    Transaction {
        id,
        ref_number: ref_number.to_owned(),
        amount: 100.0,
        kind: TransactionType::CashIn,
        created_at: timestamp(minutes),
    }
}

pub(crate) fn note(id: RecordId, content: &str, minutes: i64) -> Note {
    Note {
        id,
        content: content.to_owned(),
        created_at: timestamp(minutes),
    }
}

pub(crate) fn server_error() -> Error {
    Error::RemoteRejected {
        status: 500,
        message: None,
    }
}
