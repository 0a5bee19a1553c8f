use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{Error, Identity, api::LedgerApi, models::parse_balance};

/// Marks a balance update as in flight until dropped, including when the
/// update's future is cancelled.
struct Submitting<'a>(&'a AtomicBool);

impl<'a> Submitting<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for Submitting<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The profile screen, where the user sets their balance.
pub struct ProfileViewModel {
    api: Arc<dyn LedgerApi>,
    submitting: AtomicBool,
}

impl ProfileViewModel {
    /// Create a profile view model.
    pub fn new(api: Arc<dyn LedgerApi>) -> Self {
        Self {
            api,
            submitting: AtomicBool::new(false),
        }
    }

    /// Whether a balance update is in flight.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    /// Set the balance of `identity` to the number in `input` and return the
    /// server's confirmation message.
    ///
    /// # Errors
    /// This function will return a:
    /// - validation error if `input` is not a number, without making a request,
    /// - [Error::AuthNotReady] if `identity` is `None`,
    /// - or the API error if the update failed.
    pub async fn update_balance(
        &self,
        identity: Option<&Identity>,
        input: &str,
    ) -> Result<String, Error> {
        let balance = parse_balance(input)?;
        let identity = identity.ok_or(Error::AuthNotReady)?;

        let result = {
            let _submitting = Submitting::start(&self.submitting);
            self.api.update_balance(identity, balance).await
        };

        match &result {
            Ok(_) => tracing::info!("Set balance of {} to {balance}", identity.id),
            Err(error) => tracing::error!("Could not update balance: {error}"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use tokio::time::timeout;

    use crate::{
        Error,
        api::LedgerApi,
        test_utils::{Call, FakeLedger, Op, identity, server_error},
        view_model::ProfileViewModel,
    };

    #[tokio::test]
    async fn updates_balance() {
        let ledger = Arc::new(FakeLedger::new());
        let profile = ProfileViewModel::new(ledger.clone());

        let message = profile
            .update_balance(Some(&identity()), " 1500.50 ")
            .await
            .unwrap();

        assert_eq!(message, "Balance updated successfully");
        assert_eq!(ledger.calls(), vec![Call::UpdateBalance(1500.5)]);
        let user = ledger.get_user(&identity()).await.unwrap();
        assert_eq!(user.balance, Some(1500.5));
        assert!(!profile.is_submitting());
    }

    #[tokio::test]
    async fn invalid_input_makes_no_request() {
        let ledger = Arc::new(FakeLedger::new());
        let profile = ProfileViewModel::new(ledger.clone());

        assert_eq!(
            profile.update_balance(Some(&identity()), "").await,
            Err(Error::EmptyField("balance"))
        );
        assert_eq!(
            profile.update_balance(Some(&identity()), "lots").await,
            Err(Error::InvalidAmount("lots".to_owned()))
        );
        assert_eq!(ledger.call_count(), 0);
    }

    #[tokio::test]
    async fn without_identity_is_not_ready() {
        let ledger = Arc::new(FakeLedger::new());
        let profile = ProfileViewModel::new(ledger.clone());

        assert_eq!(
            profile.update_balance(None, "100").await,
            Err(Error::AuthNotReady)
        );
        assert_eq!(ledger.call_count(), 0);
    }

    #[tokio::test]
    async fn surfaces_api_error() {
        let ledger = Arc::new(FakeLedger::new());
        ledger.fail(Op::UpdateBalance, server_error());
        let profile = ProfileViewModel::new(ledger.clone());

        let result = profile.update_balance(Some(&identity()), "100").await;

        assert_eq!(result, Err(server_error()));
        assert!(!profile.is_submitting());
    }

    #[tokio::test]
    async fn submitting_while_in_flight_and_after_cancel() {
        let ledger = Arc::new(FakeLedger::new());
        let _gate = ledger.gate(Op::UpdateBalance);
        let profile = ProfileViewModel::new(ledger.clone());

        let identity = identity();

        let mut update = Box::pin(profile.update_balance(Some(&identity), "100"));
        let result = timeout(Duration::from_millis(50), &mut update).await;

        assert!(result.is_err(), "the gated update should time out");
        assert!(profile.is_submitting());

        drop(update);
        assert!(!profile.is_submitting());
    }
}
