//! This file defines the type `Transaction`, the core type of the ledger, and
//! the types used to create one.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    models::{Record, RecordId, Searchable, deserialize_amount},
};

/// The direction money moved in a [Transaction].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money paid in, sent as `"cashin"`.
    CashIn,
    /// Money paid out, sent as `"cashout"`.
    CashOut,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::CashIn => write!(f, "Cash In"),
            TransactionType::CashOut => write!(f, "Cash Out"),
        }
    }
}

/// A cash in or cash out event, as stored by the ledger API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: RecordId,
    /// The reference number the user entered, e.g. from a payment receipt.
    ///
    /// Not guaranteed to be unique.
    #[serde(rename = "refnumber", alias = "refNumber")]
    pub ref_number: String,
    /// The amount of money that moved. The direction is given by `kind`.
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: f64,
    /// Whether this was a cash in or a cash out.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// When the server recorded the transaction.
    #[serde(
        rename = "created_at",
        alias = "createdAt",
        with = "time::serde::rfc3339"
    )]
    pub created_at: OffsetDateTime,
}

impl Record for Transaction {
    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

impl Searchable for Transaction {
    fn search_text(&self) -> &str {
        &self.ref_number
    }
}

/// The raw input of the cash in and cash out forms.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    /// Which form the draft came from.
    pub kind: TransactionType,
    /// The reference number as typed.
    pub ref_number: String,
    /// The amount as typed, e.g. "100.00".
    pub amount: String,
}

impl TransactionDraft {
    /// Create a draft from form input.
    pub fn new(kind: TransactionType, ref_number: &str, amount: &str) -> Self {
        Self {
            kind,
            ref_number: ref_number.to_owned(),
            amount: amount.to_owned(),
        }
    }

    /// Check the draft and turn it into a request body.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::EmptyField] if the reference number or amount is empty,
    /// - or [Error::InvalidAmount] if the amount is not a finite number greater than zero.
    pub fn validate(self) -> Result<NewTransaction, Error> {
        let ref_number = self.ref_number.trim();
        let amount_text = self.amount.trim();

        if ref_number.is_empty() {
            return Err(Error::EmptyField("reference number"));
        }

        if amount_text.is_empty() {
            return Err(Error::EmptyField("amount"));
        }

        let amount = amount_text
            .parse::<f64>()
            .ok()
            .filter(|amount| amount.is_finite() && *amount > 0.0)
            .ok_or_else(|| Error::InvalidAmount(amount_text.to_owned()))?;

        Ok(NewTransaction {
            kind: self.kind,
            ref_number: ref_number.to_owned(),
            amount,
        })
    }
}

/// The request body for creating a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Whether this is a cash in or a cash out.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The user supplied reference number.
    #[serde(rename = "refNumber")]
    pub ref_number: String,
    /// The amount of money, always positive.
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: f64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use crate::{
        Error,
        models::{NewTransaction, Transaction, TransactionDraft, TransactionType},
    };

    #[test]
    fn deserializes_api_response() {
        let response = json!({
            "id": 7,
            "refnumber": "0012 345 6789",
            "amount": "100.50",
            "type": "cashout",
            "created_at": "2025-07-01T09:30:00.000Z",
            "user_id": "user_2abc"
        });

        let transaction: Transaction = serde_json::from_value(response).unwrap();

        assert_eq!(
            transaction,
            Transaction {
                id: 7,
                ref_number: "0012 345 6789".to_owned(),
                amount: 100.5,
                kind: TransactionType::CashOut,
                created_at: datetime!(2025-07-01 09:30 UTC),
            }
        );
    }

    #[test]
    fn deserializes_numeric_amount() {
        let response = json!({
            "id": 1,
            "refnumber": "1",
            "amount": 42,
            "type": "cashin",
            "created_at": "2025-07-01T09:30:00+08:00"
        });

        let transaction: Transaction = serde_json::from_value(response).unwrap();

        assert_eq!(transaction.amount, 42.0);
        assert_eq!(transaction.kind, TransactionType::CashIn);
    }

    #[test]
    fn rejects_non_numeric_amount() {
        let response = json!({
            "id": 1,
            "refnumber": "1",
            "amount": "lots",
            "type": "cashin",
            "created_at": "2025-07-01T09:30:00Z"
        });

        assert!(serde_json::from_value::<Transaction>(response).is_err());
    }

    #[test]
    fn serializes_request_body() {
        let body = NewTransaction {
            kind: TransactionType::CashIn,
            ref_number: "12345".to_owned(),
            amount: 100.0,
        };

        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({ "type": "cashin", "refNumber": "12345", "amount": 100.0 })
        );
    }

    #[test]
    fn validate_trims_and_parses() {
        let draft = TransactionDraft::new(TransactionType::CashOut, " 12345 ", " 100.00 ");

        assert_eq!(
            draft.validate(),
            Ok(NewTransaction {
                kind: TransactionType::CashOut,
                ref_number: "12345".to_owned(),
                amount: 100.0,
            })
        );
    }

    #[test]
    fn validate_fails_on_empty_ref_number() {
        let draft = TransactionDraft::new(TransactionType::CashIn, "  ", "100");

        assert_eq!(draft.validate(), Err(Error::EmptyField("reference number")));
    }

    #[test]
    fn validate_fails_on_empty_amount() {
        let draft = TransactionDraft::new(TransactionType::CashIn, "12345", "");

        assert_eq!(draft.validate(), Err(Error::EmptyField("amount")));
    }

    #[test]
    fn validate_fails_on_invalid_amounts() {
        for amount in ["abc", "0", "-5", "NaN", "inf"] {
            let draft = TransactionDraft::new(TransactionType::CashIn, "12345", amount);

            assert_eq!(
                draft.validate(),
                Err(Error::InvalidAmount(amount.to_owned())),
                "{amount} should be rejected"
            );
        }
    }

    #[test]
    fn transaction_type_display() {
        assert_eq!(TransactionType::CashIn.to_string(), "Cash In");
        assert_eq!(TransactionType::CashOut.to_string(), "Cash Out");
    }
}
