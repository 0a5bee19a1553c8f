//! Route handlers for the stub ledger server.

use axum::{
    Json,
    extract::{Path, Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    models::{
        BalanceUpdate, NewNote, NewTransaction, Note, RecordId, Transaction, UserProfile,
        user::{MessageResponse, UserEnvelope},
    },
    stub::StubLedger,
};

/// An error response with a JSON body of the form `{ "message": ... }`.
#[derive(Debug)]
pub(super) struct StubError {
    status: StatusCode,
    message: String,
}

impl StubError {
    fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_owned(),
        }
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        tracing::warn!("Rejecting request with {}: {}", self.status, self.message);
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

/// Middleware that rejects requests without the bearer token set with
/// [StubLedger::require_token].
pub(super) async fn require_token(
    State(ledger): State<StubLedger>,
    request: Request,
    next: Next,
) -> Response {
    let required_token = ledger.lock().required_token.clone();

    if let Some(required_token) = required_token {
        let provided_token = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        if provided_token != Some(required_token.as_str()) {
            return StubError::new(StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    }

    next.run(request).await
}

pub(super) async fn get_user(
    State(ledger): State<StubLedger>,
    Path(user_id): Path<String>,
) -> Json<UserEnvelope> {
    Json(UserEnvelope {
        user: UserProfile {
            balance: ledger.balance(&user_id),
        },
    })
}

pub(super) async fn update_balance(
    State(ledger): State<StubLedger>,
    Json(update): Json<BalanceUpdate>,
) -> Json<MessageResponse> {
    ledger.set_balance(update.user_id.as_str(), update.balance);
    tracing::info!("Set balance of {} to {}", update.user_id, update.balance);

    Json(MessageResponse {
        message: "Balance updated successfully".to_owned(),
    })
}

pub(super) async fn list_transactions(
    State(ledger): State<StubLedger>,
    Path(user_id): Path<String>,
) -> Json<Vec<Transaction>> {
    Json(ledger.transactions(&user_id))
}

pub(super) async fn create_transaction(
    State(ledger): State<StubLedger>,
    Path(user_id): Path<String>,
    Json(new_transaction): Json<NewTransaction>,
) -> Result<(StatusCode, Json<Transaction>), StubError> {
    if new_transaction.ref_number.trim().is_empty() {
        return Err(StubError::new(
            StatusCode::BAD_REQUEST,
            "Reference number is required",
        ));
    }

    let transaction = ledger.insert_transaction(
        &user_id,
        new_transaction.kind,
        &new_transaction.ref_number,
        new_transaction.amount,
        OffsetDateTime::now_utc(),
    );
    tracing::info!("Created transaction {} for {user_id}", transaction.id);

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub(super) async fn delete_transaction(
    State(ledger): State<StubLedger>,
    Path(id): Path<RecordId>,
) -> Result<Json<MessageResponse>, StubError> {
    let mut data = ledger.lock();
    let count_before = data.transactions.len();
    data.transactions
        .retain(|(_, transaction)| transaction.id != id);

    if data.transactions.len() == count_before {
        return Err(StubError::new(
            StatusCode::NOT_FOUND,
            "Transaction not found",
        ));
    }

    tracing::info!("Deleted transaction {id}");
    Ok(Json(MessageResponse {
        message: "Transaction deleted successfully".to_owned(),
    }))
}

pub(super) async fn list_notes(
    State(ledger): State<StubLedger>,
    Path(user_id): Path<String>,
) -> Json<Vec<Note>> {
    Json(ledger.notes(&user_id))
}

pub(super) async fn create_note(
    State(ledger): State<StubLedger>,
    Path(user_id): Path<String>,
    Json(new_note): Json<NewNote>,
) -> Result<(StatusCode, Json<Note>), StubError> {
    if new_note.content.trim().is_empty() {
        return Err(StubError::new(StatusCode::BAD_REQUEST, "Content is required"));
    }

    let note = ledger.insert_note(&user_id, &new_note.content, OffsetDateTime::now_utc());
    tracing::info!("Created note {} for {user_id}", note.id);

    Ok((StatusCode::CREATED, Json(note)))
}

pub(super) async fn delete_note(
    State(ledger): State<StubLedger>,
    Path(id): Path<RecordId>,
) -> Result<Json<MessageResponse>, StubError> {
    let mut data = ledger.lock();
    let count_before = data.notes.len();
    data.notes.retain(|(_, note)| note.id != id);

    if data.notes.len() == count_before {
        return Err(StubError::new(StatusCode::NOT_FOUND, "Note not found"));
    }

    tracing::info!("Deleted note {id}");
    Ok(Json(MessageResponse {
        message: "Note deleted successfully".to_owned(),
    }))
}
