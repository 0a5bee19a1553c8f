//! The user profile as far as the ledger is concerned: their balance.

use serde::{Deserialize, Serialize};

use crate::{
    Error, UserId,
    models::{deserialize_amount, deserialize_optional_amount},
};

/// A user's profile as returned by the ledger API.
///
/// The balance is stored by the server independently of the transactions and
/// is not guaranteed to equal their sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user's current balance, `None` if the server has not set one.
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub balance: Option<f64>,
}

/// The envelope around [UserProfile] in API responses: `{ "user": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: UserProfile,
}

/// The request body for overwriting a user's balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    /// The user whose balance to set.
    #[serde(rename = "userId")]
    pub user_id: UserId,
    /// The new balance.
    #[serde(deserialize_with = "deserialize_amount")]
    pub balance: f64,
}

/// The body of responses that only carry a message, e.g. `{ "message": "Balance updated" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct MessageResponse {
    pub message: String,
}

/// Parse the balance typed into the profile form.
///
/// Unlike transaction amounts, a balance may be zero or negative.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyField] if `input` is empty,
/// - or [Error::InvalidAmount] if `input` is not a finite number.
pub fn parse_balance(input: &str) -> Result<f64, Error> {
    let input = input.trim();

    if input.is_empty() {
        return Err(Error::EmptyField("balance"));
    }

    input
        .parse::<f64>()
        .ok()
        .filter(|balance| balance.is_finite())
        .ok_or_else(|| Error::InvalidAmount(input.to_owned()))
}
