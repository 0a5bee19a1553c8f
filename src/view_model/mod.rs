//! The view models behind the app's screens.
//!
//! A view model owns a local copy of some remote data, keeps it in sync with
//! the ledger API and exposes derived views of it for rendering. The local
//! copy only ever changes through a successful load.

pub mod derive;
mod fence;
mod home;
mod list;
mod profile;

pub use derive::{FilterPredicate, SortOrder, ViewOptions, derive_view, matches_query};
pub use fence::LoadOutcome;
pub use home::{HomeState, HomeViewModel};
pub use list::{
    ListSource, MutationOutcome, NoteList, NotesViewModel, PendingDelete, RemoteListViewModel,
    TransactionList, TransactionsViewModel, ViewModelState,
};
pub use profile::ProfileViewModel;
