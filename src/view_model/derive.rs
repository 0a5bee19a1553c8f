//! Derived views: read-only filtered, sorted and limited projections of a
//! record list.

use crate::models::{Record, Searchable};

/// Decides whether a record matches a search query.
pub type FilterPredicate<R> = fn(&R, &str) -> bool;

/// The order to sort records by creation time in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first.
    Ascending,
    /// Newest first.
    Descending,
}

/// Defines how [derive_view] projects a list of records.
///
/// The steps are applied in the order filter, sort, limit.
pub struct ViewOptions<R> {
    /// Orders records by `created_at`. None keeps the order the records were
    /// fetched in.
    pub sort_by: Option<SortOrder>,
    /// Selects up to the first N (`limit`) records after sorting.
    pub limit: Option<usize>,
    /// Keeps only the records that match the query. None keeps all records.
    pub filter: Option<FilterPredicate<R>>,
}

impl<R> ViewOptions<R> {
    /// Options that keep every record in fetch order.
    pub fn unchanged() -> Self {
        Self {
            sort_by: None,
            limit: None,
            filter: None,
        }
    }

    /// Options that sort records newest first.
    pub fn newest_first() -> Self {
        Self {
            sort_by: Some(SortOrder::Descending),
            ..Self::unchanged()
        }
    }

    /// Keep only the first `limit` records.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Filter records with `filter`.
    pub fn filter(mut self, filter: FilterPredicate<R>) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl<R: Searchable> ViewOptions<R> {
    /// Filter records with [matches_query] on their search field.
    pub fn searchable(self) -> Self {
        self.filter(matches_query::<R>)
    }
}

impl<R> Clone for ViewOptions<R> {
    fn clone(&self) -> Self {
        Self {
            sort_by: self.sort_by,
            limit: self.limit,
            filter: self.filter,
        }
    }
}

impl<R> std::fmt::Debug for ViewOptions<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewOptions")
            .field("sort_by", &self.sort_by)
            .field("limit", &self.limit)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

/// Whether the search field of `record` contains `query`, ignoring case.
pub fn matches_query<R: Searchable>(record: &R, query: &str) -> bool {
    record
        .search_text()
        .to_lowercase()
        .contains(&query.to_lowercase())
}

/// Project `items` according to `options`.
///
/// An empty or whitespace-only `query` matches every record. Sorting is
/// stable, so records with equal timestamps keep the order they were fetched
/// in. `items` is never modified.
pub fn derive_view<R>(items: &[R], query: &str, options: &ViewOptions<R>) -> Vec<R>
where
    R: Record + Clone,
{
    let mut view: Vec<R> = match options.filter {
        Some(filter) if !query.trim().is_empty() => items
            .iter()
            .filter(|record| filter(record, query))
            .cloned()
            .collect(),
        _ => items.to_vec(),
    };

    match options.sort_by {
        Some(SortOrder::Ascending) => view.sort_by_key(|record| record.created_at()),
        Some(SortOrder::Descending) => {
            view.sort_by(|a, b| b.created_at().cmp(&a.created_at()))
        }
        None => {}
    }

    if let Some(limit) = options.limit {
        view.truncate(limit);
    }

    view
}
