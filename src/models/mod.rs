//! This module defines the domain data types.

use serde::{Deserialize, Deserializer, de};
use time::OffsetDateTime;

pub use note::{NewNote, Note, NoteDraft};
pub use transaction::{NewTransaction, Transaction, TransactionDraft, TransactionType};
pub use user::{BalanceUpdate, UserProfile, parse_balance};

mod note;
mod transaction;
pub(crate) mod user;

/// Alias for the integer type the ledger API uses for record IDs.
pub type RecordId = i64;

/// A record that the ledger API stores for a user, e.g. a transaction or a note.
pub trait Record {
    /// The server assigned ID of the record.
    fn id(&self) -> RecordId;

    /// When the server created the record.
    fn created_at(&self) -> OffsetDateTime;
}

/// A record with a designated text field that searches match against.
pub trait Searchable {
    /// The text that a search query is matched against.
    fn search_text(&self) -> &str;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Number(f64),
    Text(String),
}

impl AmountRepr {
    fn into_f64<E: de::Error>(self) -> Result<f64, E> {
        match self {
            AmountRepr::Number(number) => Ok(number),
            AmountRepr::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .ok_or_else(|| E::custom(format!("\"{text}\" is not a number"))),
        }
    }
}

/// Deserialize an amount sent either as a JSON number or as a numeric string.
///
/// Decimal columns are commonly serialized as strings, e.g. `"100.00"`.
pub(crate) fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    AmountRepr::deserialize(deserializer)?.into_f64()
}

/// Like [deserialize_amount], but also accepts `null`.
pub(crate) fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<AmountRepr>::deserialize(deserializer)?
        .map(AmountRepr::into_f64)
        .transpose()
}
