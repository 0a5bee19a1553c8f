use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    ClientConfig, Error, Identity,
    api::LedgerApi,
    models::Transaction,
    view_model::{
        derive::{ViewOptions, derive_view},
        fence::{LoadFence, LoadOutcome},
    },
};

/// A snapshot of the home screen.
#[derive(Debug, Clone, PartialEq)]
pub struct HomeState {
    /// The balance of the last successful load, `None` before the first one or
    /// if the user never set one.
    pub balance: Option<f64>,
    /// The most recent transactions, newest first.
    pub recent: Vec<Transaction>,
    /// Whether a load is in flight.
    pub loading: bool,
}

#[derive(Default)]
struct HomeData {
    balance: Option<f64>,
    transactions: Vec<Transaction>,
    fence: LoadFence,
}

/// The home screen: the account balance and the latest few transactions.
///
/// Both are fetched together and committed together, so the screen never
/// shows a balance from one load next to transactions from another.
pub struct HomeViewModel {
    api: Arc<dyn LedgerApi>,
    recent_options: ViewOptions<Transaction>,
    data: Mutex<HomeData>,
}

impl HomeViewModel {
    /// Create an empty home view model showing `config.recent_limit`
    /// transactions.
    pub fn new(api: Arc<dyn LedgerApi>, config: &ClientConfig) -> Self {
        Self {
            api,
            recent_options: ViewOptions::newest_first().limit(config.recent_limit),
            data: Mutex::new(HomeData::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HomeData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The balance of the last successful load.
    pub fn balance(&self) -> Option<f64> {
        self.lock().balance
    }

    /// The most recent transactions, newest first.
    pub fn recent(&self) -> Vec<Transaction> {
        derive_view(&self.lock().transactions, "", &self.recent_options)
    }

    /// A snapshot of the screen.
    pub fn state(&self) -> HomeState {
        let data = self.lock();

        HomeState {
            balance: data.balance,
            recent: derive_view(&data.transactions, "", &self.recent_options),
            loading: data.fence.is_loading(),
        }
    }

    /// Stop applying results, see [super::RemoteListViewModel::deactivate].
    pub fn deactivate(&self) {
        self.lock().fence.deactivate();
    }

    /// Fetch the balance and the transactions of `identity` concurrently.
    ///
    /// Nothing is committed unless both requests succeed. Returns
    /// [LoadOutcome::Deferred] without making a request if `identity` is `None`.
    ///
    /// # Errors
    /// Returns the first error of the two requests. The previous balance and
    /// transactions are kept.
    pub async fn load(&self, identity: Option<&Identity>) -> Result<LoadOutcome, Error> {
        let Some(identity) = identity else {
            tracing::debug!("Deferring home load until signed in");
            return Ok(LoadOutcome::Deferred);
        };

        let Some(ticket) = self.lock().fence.begin() else {
            return Ok(LoadOutcome::Inactive);
        };

        let result = tokio::try_join!(
            self.api.get_user(identity),
            self.api.list_transactions(identity)
        );

        let mut data = self.lock();
        let outcome = data.fence.finish(ticket);

        match (outcome, result) {
            (LoadOutcome::Applied, Ok((profile, transactions))) => {
                tracing::info!(
                    "Loaded home screen with {} transactions",
                    transactions.len()
                );
                data.balance = profile.balance;
                data.transactions = transactions;
                Ok(LoadOutcome::Applied)
            }
            (LoadOutcome::Applied, Err(error)) => {
                tracing::error!("Could not load home screen: {error}");
                Err(error)
            }
            (outcome, _) => {
                tracing::debug!("Discarding home load result ({outcome:?})");
                Ok(outcome)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use tokio::time::timeout;

    use crate::{
        ClientConfig,
        test_utils::{FakeLedger, Op, identity, server_error, transaction},
        view_model::{HomeViewModel, LoadOutcome},
    };

    fn ledger_with_six_transactions() -> Arc<FakeLedger> {
        let transactions = (1..=6)
            .map(|id| transaction(id, &format!("REF-{id}"), id * 10))
            .collect();
        let ledger = Arc::new(FakeLedger::with_transactions(transactions));
        ledger.set_balance(2500.0);
        ledger
    }

    #[tokio::test]
    async fn load_commits_balance_and_recent_transactions() {
        let ledger = ledger_with_six_transactions();
        let home = HomeViewModel::new(ledger.clone(), &ClientConfig::default());

        assert_eq!(home.load(Some(&identity())).await, Ok(LoadOutcome::Applied));

        assert_eq!(home.balance(), Some(2500.0));
        let ids: Vec<_> = home.recent().iter().map(|t| t.id).collect();
        assert_eq!(ids, [6, 5, 4, 3]);
        assert!(!home.state().loading);
        assert_eq!(ledger.call_count(), 2);
    }

    #[tokio::test]
    async fn recent_limit_comes_from_config() {
        let ledger = ledger_with_six_transactions();
        let config = ClientConfig {
            recent_limit: 2,
            ..Default::default()
        };
        let home = HomeViewModel::new(ledger, &config);

        home.load(Some(&identity())).await.unwrap();

        assert_eq!(home.state().recent.len(), 2);
    }

    #[tokio::test]
    async fn load_without_identity_is_deferred() {
        let ledger = ledger_with_six_transactions();
        let home = HomeViewModel::new(ledger.clone(), &ClientConfig::default());

        assert_eq!(home.load(None).await, Ok(LoadOutcome::Deferred));
        assert_eq!(ledger.call_count(), 0);
    }

    #[tokio::test]
    async fn failed_balance_commits_nothing() {
        let ledger = ledger_with_six_transactions();
        let home = HomeViewModel::new(ledger.clone(), &ClientConfig::default());
        ledger.fail(Op::GetUser, server_error());

        assert_eq!(home.load(Some(&identity())).await, Err(server_error()));

        let state = home.state();
        assert_eq!(state.balance, None);
        assert!(state.recent.is_empty());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn failed_transactions_keep_previous_balance() {
        let ledger = ledger_with_six_transactions();
        let home = HomeViewModel::new(ledger.clone(), &ClientConfig::default());
        home.load(Some(&identity())).await.unwrap();
        let before = home.state();

        ledger.set_balance(10.0);
        ledger.fail(Op::ListTransactions, server_error());
        assert_eq!(home.load(Some(&identity())).await, Err(server_error()));

        assert_eq!(home.state(), before);
    }

    #[tokio::test]
    async fn stale_home_load_is_discarded() {
        let ledger = ledger_with_six_transactions();
        let first_gate = ledger.gate(Op::GetUser);
        let home = Arc::new(HomeViewModel::new(ledger.clone(), &ClientConfig::default()));

        let first = tokio::spawn({
            let home = home.clone();
            async move { home.load(Some(&identity())).await }
        });
        ledger.wait_for_calls(2).await;
        ledger.set_balance(99.0);

        assert_eq!(home.load(Some(&identity())).await, Ok(LoadOutcome::Applied));
        first_gate.send(()).unwrap();

        assert_eq!(first.await.unwrap(), Ok(LoadOutcome::Superseded));
        assert_eq!(home.balance(), Some(99.0));
    }

    #[tokio::test]
    async fn cancelled_home_load_stops_loading() {
        let ledger = ledger_with_six_transactions();
        let _gate = ledger.gate(Op::GetUser);
        let home = HomeViewModel::new(ledger.clone(), &ClientConfig::default());

        let result = timeout(Duration::from_millis(50), home.load(Some(&identity()))).await;

        assert!(result.is_err(), "the gated load should time out");
        let state = home.state();
        assert!(!state.loading);
        assert_eq!(state.balance, None);
        assert!(state.recent.is_empty());
    }

    #[tokio::test]
    async fn deactivated_home_drops_late_response() {
        let ledger = ledger_with_six_transactions();
        let gate = ledger.gate(Op::ListTransactions);
        let home = Arc::new(HomeViewModel::new(ledger.clone(), &ClientConfig::default()));

        let load = tokio::spawn({
            let home = home.clone();
            async move { home.load(Some(&identity())).await }
        });
        ledger.wait_for_calls(2).await;
        home.deactivate();
        gate.send(()).unwrap();

        assert_eq!(load.await.unwrap(), Ok(LoadOutcome::Inactive));
        assert_eq!(home.balance(), None);
    }
}
