//! The remote-list view model behind the transactions and notes screens.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::{
    Alert, Error, Identity,
    api::LedgerApi,
    models::{
        NewNote, NewTransaction, Note, NoteDraft, Record, RecordId, Searchable, Transaction,
        TransactionDraft,
    },
    view_model::{
        derive::{ViewOptions, derive_view},
        fence::{LoadFence, LoadOutcome},
    },
};

/// Knows how to read and change one kind of record through the ledger API.
#[async_trait]
pub trait ListSource: Send + Sync {
    /// The record type of the list.
    type Item: Record + Searchable + Clone + Send + Sync;
    /// The raw user input for creating a record.
    type Draft: Send;
    /// The validated request body for creating a record.
    type Payload: Send + Sync;

    /// The name of the record type for log messages, e.g. "transaction".
    fn noun(&self) -> &'static str;

    /// The default way the list is shown.
    fn view_options(&self) -> ViewOptions<Self::Item>;

    /// Check user input before anything is sent.
    fn validate(&self, draft: Self::Draft) -> Result<Self::Payload, Error>;

    /// The alert to show after a record was created.
    fn created_alert(&self) -> Alert;

    /// The alert to show after a record was deleted.
    fn deleted_alert(&self) -> Alert;

    /// Fetch all records of the user.
    async fn fetch(
        &self,
        api: &dyn LedgerApi,
        identity: &Identity,
    ) -> Result<Vec<Self::Item>, Error>;

    /// Create a record for the user.
    async fn create(
        &self,
        api: &dyn LedgerApi,
        identity: &Identity,
        payload: &Self::Payload,
    ) -> Result<(), Error>;

    /// Delete the record with the ID `id`.
    async fn delete(&self, api: &dyn LedgerApi, identity: &Identity, id: RecordId)
    -> Result<(), Error>;
}

/// The user's transactions, newest first, searchable by reference number.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionList;

#[async_trait]
impl ListSource for TransactionList {
    type Item = Transaction;
    type Draft = TransactionDraft;
    type Payload = NewTransaction;

    fn noun(&self) -> &'static str {
        "transaction"
    }

    fn view_options(&self) -> ViewOptions<Transaction> {
        ViewOptions::newest_first().searchable()
    }

    fn validate(&self, draft: TransactionDraft) -> Result<NewTransaction, Error> {
        draft.validate()
    }

    fn created_alert(&self) -> Alert {
        Alert::success("Success", "Transaction saved")
    }

    fn deleted_alert(&self) -> Alert {
        Alert::success("Deleted", "Transaction has been deleted.")
    }

    async fn fetch(
        &self,
        api: &dyn LedgerApi,
        identity: &Identity,
    ) -> Result<Vec<Transaction>, Error> {
        api.list_transactions(identity).await
    }

    async fn create(
        &self,
        api: &dyn LedgerApi,
        identity: &Identity,
        payload: &NewTransaction,
    ) -> Result<(), Error> {
        api.create_transaction(identity, payload).await
    }

    async fn delete(
        &self,
        api: &dyn LedgerApi,
        identity: &Identity,
        id: RecordId,
    ) -> Result<(), Error> {
        api.delete_transaction(identity, id).await
    }
}

/// The user's notes, in the order the server returns them, searchable by content.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteList;

#[async_trait]
impl ListSource for NoteList {
    type Item = Note;
    type Draft = NoteDraft;
    type Payload = NewNote;

    fn noun(&self) -> &'static str {
        "note"
    }

    fn view_options(&self) -> ViewOptions<Note> {
        ViewOptions::unchanged().searchable()
    }

    fn validate(&self, draft: NoteDraft) -> Result<NewNote, Error> {
        draft.validate()
    }

    fn created_alert(&self) -> Alert {
        Alert::success("Success", "Note saved successfully")
    }

    fn deleted_alert(&self) -> Alert {
        Alert::success("Deleted", "Note has been deleted.")
    }

    async fn fetch(&self, api: &dyn LedgerApi, identity: &Identity) -> Result<Vec<Note>, Error> {
        api.list_notes(identity).await
    }

    async fn create(
        &self,
        api: &dyn LedgerApi,
        identity: &Identity,
        payload: &NewNote,
    ) -> Result<(), Error> {
        api.create_note(identity, payload).await
    }

    async fn delete(
        &self,
        api: &dyn LedgerApi,
        identity: &Identity,
        id: RecordId,
    ) -> Result<(), Error> {
        api.delete_note(identity, id).await
    }
}

/// A snapshot of a [RemoteListViewModel] for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModelState<R> {
    /// The records of the last successful load, in fetch order.
    pub items: Vec<R>,
    /// Whether a load is in flight.
    pub loading: bool,
    /// The current search text.
    pub query: String,
    /// The record the user asked to delete and has not confirmed or cancelled yet.
    pub pending_delete: Option<RecordId>,
}

/// Proof that the user asked to delete a record.
///
/// Only [RemoteListViewModel::request_delete] hands these out, and
/// [RemoteListViewModel::confirm_delete] consumes one, so a delete always
/// takes two separate steps.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingDelete {
    id: RecordId,
    request: u64,
}

impl PendingDelete {
    /// The ID of the record to delete.
    pub fn id(&self) -> RecordId {
        self.id
    }
}

/// The result of a create or delete that the server accepted.
#[derive(Debug, PartialEq)]
pub struct MutationOutcome {
    /// The alert confirming the change to the user.
    pub alert: Alert,
    /// The outcome of the reload that followed the change.
    ///
    /// An error here means the change went through but the list could not
    /// be refreshed, so it may be out of date.
    pub refresh: Result<LoadOutcome, Error>,
}

struct ListState<R> {
    items: Vec<R>,
    query: String,
    pending_delete: Option<(RecordId, u64)>,
    delete_requests: u64,
    fence: LoadFence,
}

impl<R> Default for ListState<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            query: String::new(),
            pending_delete: None,
            delete_requests: 0,
            fence: LoadFence::default(),
        }
    }
}

/// Owns a local copy of a remote record list and keeps it in sync with the
/// ledger API.
///
/// The local list is only ever replaced by a successful load; creates and
/// deletes go to the server and are followed by a reload. Methods take
/// `&self`, so one instance can be shared (e.g. in an [Arc]) by the code that
/// renders it and the tasks that drive it.
pub struct RemoteListViewModel<S: ListSource> {
    api: Arc<dyn LedgerApi>,
    source: S,
    options: ViewOptions<S::Item>,
    state: Mutex<ListState<S::Item>>,
    mutation_lock: tokio::sync::Mutex<()>,
}

/// The view model of the transactions screen.
pub type TransactionsViewModel = RemoteListViewModel<TransactionList>;

/// The view model of the notes screen.
pub type NotesViewModel = RemoteListViewModel<NoteList>;

impl<S: ListSource + Default> RemoteListViewModel<S> {
    /// Create an empty, active view model.
    pub fn new(api: Arc<dyn LedgerApi>) -> Self {
        Self::with_source(api, S::default())
    }
}

impl<S: ListSource> RemoteListViewModel<S> {
    /// Create an empty, active view model for `source`.
    pub fn with_source(api: Arc<dyn LedgerApi>, source: S) -> Self {
        Self {
            api,
            options: source.view_options(),
            source,
            state: Mutex::new(ListState::default()),
            mutation_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Replace the options used by [RemoteListViewModel::view].
    pub fn with_options(mut self, options: ViewOptions<S::Item>) -> Self {
        self.options = options;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ListState<S::Item>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> ViewModelState<S::Item> {
        let state = self.lock();

        ViewModelState {
            items: state.items.clone(),
            loading: state.fence.is_loading(),
            query: state.query.clone(),
            pending_delete: state.pending_delete.map(|(id, _)| id),
        }
    }

    /// Whether a load is in flight.
    pub fn is_loading(&self) -> bool {
        self.lock().fence.is_loading()
    }

    /// Set the search text used by [RemoteListViewModel::view].
    pub fn set_query(&self, query: &str) {
        self.lock().query = query.to_owned();
    }

    /// The records to show: the loaded list, filtered by the current query,
    /// sorted and limited according to the view options.
    pub fn view(&self) -> Vec<S::Item> {
        let state = self.lock();
        derive_view(&state.items, &state.query, &self.options)
    }

    /// Stop applying results. Call this when the view is closed; late
    /// responses are then dropped instead of updating a view nobody sees.
    pub fn deactivate(&self) {
        self.lock().fence.deactivate();
    }

    /// Fetch the list for `identity` and replace the local copy with it.
    ///
    /// Does nothing and returns [LoadOutcome::Deferred] if `identity` is
    /// `None`, i.e. authentication has not resolved yet. If a newer load is
    /// started before this one resolves, this one's result is discarded.
    ///
    /// # Errors
    /// Returns the API error if the fetch failed. The local list is left as
    /// it was.
    pub async fn load(&self, identity: Option<&Identity>) -> Result<LoadOutcome, Error> {
        let Some(identity) = identity else {
            tracing::debug!("Deferring {} load until signed in", self.source.noun());
            return Ok(LoadOutcome::Deferred);
        };

        let Some(ticket) = self.lock().fence.begin() else {
            return Ok(LoadOutcome::Inactive);
        };

        let result = self.source.fetch(self.api.as_ref(), identity).await;

        let mut state = self.lock();
        let outcome = state.fence.finish(ticket);

        match (outcome, result) {
            (LoadOutcome::Applied, Ok(items)) => {
                tracing::info!("Loaded {} {}s", items.len(), self.source.noun());
                state.items = items;
                Ok(LoadOutcome::Applied)
            }
            (LoadOutcome::Applied, Err(error)) => {
                tracing::error!("Could not load {}s: {error}", self.source.noun());
                Err(error)
            }
            (outcome, result) => {
                tracing::debug!(
                    "Discarding {} load result ({outcome:?}), success: {}",
                    self.source.noun(),
                    result.is_ok()
                );
                Ok(outcome)
            }
        }
    }

    /// Validate `draft`, create the record on the server, then reload.
    ///
    /// # Errors
    /// This function will return a:
    /// - validation error if `draft` is invalid, without making a request,
    /// - [Error::AuthNotReady] if `identity` is `None`,
    /// - or the API error if the server did not create the record.
    ///
    /// On error the local list is unchanged.
    pub async fn create(
        &self,
        identity: Option<&Identity>,
        draft: S::Draft,
    ) -> Result<MutationOutcome, Error> {
        let payload = self.source.validate(draft)?;
        let identity = identity.ok_or(Error::AuthNotReady)?;

        {
            let _mutation = self.mutation_lock.lock().await;

            if let Err(error) = self
                .source
                .create(self.api.as_ref(), identity, &payload)
                .await
            {
                tracing::error!("Could not create {}: {error}", self.source.noun());
                return Err(error);
            }
        }

        tracing::info!("Created {} for {}", self.source.noun(), identity.id);

        Ok(MutationOutcome {
            alert: self.source.created_alert(),
            refresh: self.load(Some(identity)).await,
        })
    }

    /// Ask to delete the record with the ID `id`.
    ///
    /// No request is made. The presentation layer should ask the user to
    /// confirm and then pass the returned token to
    /// [RemoteListViewModel::confirm_delete]. A new request replaces any
    /// earlier one.
    pub fn request_delete(&self, id: RecordId) -> PendingDelete {
        let mut state = self.lock();
        state.delete_requests += 1;
        let request = state.delete_requests;
        state.pending_delete = Some((id, request));

        PendingDelete { id, request }
    }

    /// Forget the pending delete request, if any.
    pub fn cancel_delete(&self) {
        self.lock().pending_delete = None;
    }

    /// Delete the record the user asked to delete, then reload.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::AuthNotReady] if `identity` is `None`, the request stays pending,
    /// - [Error::DeleteNotConfirmed] if `pending` was cancelled or replaced,
    /// - or the API error if the server did not delete the record.
    ///
    /// On error the local list is unchanged; the record is not removed until
    /// a reload shows that the server removed it.
    pub async fn confirm_delete(
        &self,
        identity: Option<&Identity>,
        pending: PendingDelete,
    ) -> Result<MutationOutcome, Error> {
        let identity = identity.ok_or(Error::AuthNotReady)?;

        {
            let mut state = self.lock();
            if state.pending_delete != Some((pending.id, pending.request)) {
                return Err(Error::DeleteNotConfirmed);
            }
            state.pending_delete = None;
        }

        {
            let _mutation = self.mutation_lock.lock().await;

            if let Err(error) = self
                .source
                .delete(self.api.as_ref(), identity, pending.id)
                .await
            {
                tracing::error!(
                    "Could not delete {} {}: {error}",
                    self.source.noun(),
                    pending.id
                );
                return Err(error);
            }
        }

        tracing::info!("Deleted {} {}", self.source.noun(), pending.id);

        Ok(MutationOutcome {
            alert: self.source.deleted_alert(),
            refresh: self.load(Some(identity)).await,
        })
    }
}
