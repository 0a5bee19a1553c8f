//! The [LedgerApi] implementation that talks to the real server over HTTP.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    ClientConfig, Error, Identity,
    api::LedgerApi,
    endpoints::{self, path_segments},
    logging::log_response,
    models::{
        BalanceUpdate, NewNote, NewTransaction, Note, RecordId, Transaction, UserProfile,
        user::{MessageResponse, UserEnvelope},
    },
};

/// A client for the Remote Ledger API.
///
/// Cheap to clone, clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpLedgerApi {
    client: Client,
    base_url: Url,
}

impl HttpLedgerApi {
    /// Create a client for the API at `config.api_base_url`.
    ///
    /// # Errors
    /// Returns [Error::InvalidConfig] if the HTTP client could not be built
    /// or the base URL is not an absolute http(s) URL.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| Error::InvalidConfig(format!("could not build HTTP client: {error}")))?;

        let base_url = Url::parse(config.api_base_url.trim_end_matches('/')).map_err(|error| {
            Error::InvalidConfig(format!("invalid API URL \"{}\": {error}", config.api_base_url))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "invalid API URL \"{}\"",
                config.api_base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// The URL of `endpoint` with its parameter set to `value`.
    ///
    /// `value` is percent-encoded as a single path segment, so IDs containing
    /// '/', '?' or '#' cannot change which resource is requested.
    fn url(&self, endpoint: &str, value: &str) -> Url {
        let mut url = self.base_url.clone();

        // `new` rejects URLs that cannot be a base, so this always succeeds.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(path_segments(endpoint, value));
        }

        url
    }

    fn request(&self, method: Method, url: Url, identity: &Identity) -> RequestBuilder {
        let builder = self.client.request(method, url);

        match &identity.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send `request` and return the response body if the status is a success.
    async fn send(&self, request: RequestBuilder) -> Result<String, Error> {
        let request = request.build()?;
        let method = request.method().to_string();
        let url = request.url().to_string();

        tracing::debug!("Sending {method} {url}");
        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;
        log_response(&method, &url, status.as_u16(), &body);

        if !status.is_success() {
            let message = serde_json::from_str::<MessageResponse>(&body)
                .ok()
                .map(|response| response.message)
                .filter(|message| !message.trim().is_empty());

            return Err(Error::RemoteRejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, identity: &Identity) -> Result<T, Error> {
        let body = self.send(self.request(Method::GET, url, identity)).await?;

        Ok(serde_json::from_str(&body)?)
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        url: Url,
        identity: &Identity,
        payload: &B,
    ) -> Result<String, Error> {
        self.send(self.request(Method::POST, url, identity).json(payload))
            .await
    }

    async fn delete(&self, url: Url, identity: &Identity) -> Result<(), Error> {
        self.send(self.request(Method::DELETE, url, identity))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl LedgerApi for HttpLedgerApi {
    async fn get_user(&self, identity: &Identity) -> Result<UserProfile, Error> {
        let url = self.url(endpoints::USER, identity.id.as_str());
        let envelope: UserEnvelope = self.get_json(url, identity).await?;

        Ok(envelope.user)
    }

    async fn update_balance(&self, identity: &Identity, balance: f64) -> Result<String, Error> {
        let body = BalanceUpdate {
            user_id: identity.id.clone(),
            balance,
        };

        let url = self.url(endpoints::UPDATE_BALANCE, "");
        let response = self.post_json(url, identity, &body).await?;
        let response: MessageResponse = serde_json::from_str(&response)?;

        Ok(response.message)
    }

    async fn list_transactions(&self, identity: &Identity) -> Result<Vec<Transaction>, Error> {
        let url = self.url(endpoints::TRANSACTIONS, identity.id.as_str());
        self.get_json(url, identity).await
    }

    async fn create_transaction(
        &self,
        identity: &Identity,
        transaction: &NewTransaction,
    ) -> Result<(), Error> {
        let url = self.url(endpoints::NEW_TRANSACTION, identity.id.as_str());
        self.post_json(url, identity, transaction).await.map(|_| ())
    }

    async fn delete_transaction(&self, identity: &Identity, id: RecordId) -> Result<(), Error> {
        let url = self.url(endpoints::DELETE_TRANSACTION, &id.to_string());
        self.delete(url, identity).await
    }

    async fn list_notes(&self, identity: &Identity) -> Result<Vec<Note>, Error> {
        let url = self.url(endpoints::NOTES, identity.id.as_str());
        self.get_json(url, identity).await
    }

    async fn create_note(&self, identity: &Identity, note: &NewNote) -> Result<(), Error> {
        let url = self.url(endpoints::NEW_NOTE, identity.id.as_str());
        self.post_json(url, identity, note).await.map(|_| ())
    }

    async fn delete_note(&self, identity: &Identity, id: RecordId) -> Result<(), Error> {
        let url = self.url(endpoints::DELETE_NOTE, &id.to_string());
        self.delete(url, identity).await
    }
}
