//! The Remote Ledger API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/notes/{user_id}', use [path_segments].

/// The route for getting a user's profile, including their balance.
pub const USER: &str = "/api/users/{user_id}";
/// The route for overwriting a user's balance.
pub const UPDATE_BALANCE: &str = "/api/users/update-balance";
/// The route for listing a user's transactions.
pub const TRANSACTIONS: &str = "/api/transactions/{user_id}";
/// The route for creating a transaction for a user.
pub const NEW_TRANSACTION: &str = "/api/transactions/new-transaction/{user_id}";
/// The route for deleting a transaction.
pub const DELETE_TRANSACTION: &str = "/api/transactions/delete/{id}";
/// The route for listing a user's notes.
pub const NOTES: &str = "/api/notes/{user_id}";
/// The route for creating a note for a user.
pub const NEW_NOTE: &str = "/api/notes/add-notes/{user_id}";
/// The route for deleting a note.
pub const DELETE_NOTE: &str = "/api/notes/delete/{id}";

/// Split `endpoint_path` into its path segments, with the parameter in
/// braces replaced by `value`.
///
/// `value` is returned as a single raw segment, so it must be percent-encoded
/// when it is put into a URL, e.g. with [reqwest::Url::path_segments_mut].
pub fn path_segments<'a>(endpoint_path: &'a str, value: &'a str) -> impl Iterator<Item = &'a str> {
    endpoint_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(move |segment| {
            if segment.starts_with('{') && segment.ends_with('}') {
                value
            } else {
                segment
            }
        })
}

#[cfg(test)]
mod tests {
    use crate::endpoints::{self, path_segments};

    fn segments(endpoint_path: &str, value: &str) -> Vec<String> {
        path_segments(endpoint_path, value).map(str::to_owned).collect()
    }

    #[test]
    fn substitutes_user_parameter() {
        assert_eq!(
            segments(endpoints::NEW_TRANSACTION, "user_2abc"),
            ["api", "transactions", "new-transaction", "user_2abc"]
        );
    }

    #[test]
    fn substitutes_id_parameter() {
        assert_eq!(
            segments(endpoints::DELETE_NOTE, "42"),
            ["api", "notes", "delete", "42"]
        );
    }

    #[test]
    fn keeps_reserved_characters_in_one_segment() {
        assert_eq!(
            segments(endpoints::NOTES, "alice/../bob?x=1#top"),
            ["api", "notes", "alice/../bob?x=1#top"]
        );
    }

    #[test]
    fn leaves_endpoint_without_parameter_unchanged() {
        assert_eq!(
            segments(endpoints::UPDATE_BALANCE, "ignored"),
            ["api", "users", "update-balance"]
        );
    }
}
