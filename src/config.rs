//! Settings for talking to the ledger API and presenting its data.

use std::{env, time::Duration};

use crate::Error;

/// The ledger API that the mobile app was built against.
pub const DEFAULT_API_BASE_URL: &str = "https://tcash-api.onrender.com";

/// The config for the client and its view models.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// The scheme and host of the ledger API, without a trailing slash.
    pub api_base_url: String,
    /// How long to wait for a response before giving up on a request.
    pub request_timeout: Duration,
    /// How many transactions the home screen shows.
    pub recent_limit: usize,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Manila".
    pub timezone: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            request_timeout: Duration::from_secs(30),
            recent_limit: 4,
            timezone: "Etc/UTC".to_owned(),
        }
    }
}

impl ClientConfig {
    /// Read the config from the `TCASH_*` environment variables, using the
    /// defaults for any that are not set.
    ///
    /// # Errors
    /// Returns [Error::InvalidConfig] if a variable is set to a value that
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();

        if let Some(url) = lookup("TCASH_API_URL") {
            config = config.with_api_base_url(&url)?;
        }

        if let Some(seconds) = lookup("TCASH_TIMEOUT_SECS") {
            let seconds: u64 = seconds.trim().parse().map_err(|_| {
                Error::InvalidConfig(format!("TCASH_TIMEOUT_SECS \"{seconds}\" is not a number"))
            })?;
            config.request_timeout = Duration::from_secs(seconds);
        }

        if let Some(limit) = lookup("TCASH_RECENT_LIMIT") {
            config.recent_limit = limit.trim().parse().map_err(|_| {
                Error::InvalidConfig(format!("TCASH_RECENT_LIMIT \"{limit}\" is not a number"))
            })?;
        }

        if let Some(timezone) = lookup("TCASH_TIMEZONE") {
            config = config.with_timezone(&timezone)?;
        }

        Ok(config)
    }

    /// Use `url` as the API base URL.
    ///
    /// # Errors
    /// Returns [Error::InvalidConfig] if `url` is not an http(s) URL.
    pub fn with_api_base_url(mut self, url: &str) -> Result<Self, Error> {
        let url = url.trim().trim_end_matches('/');

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "the API URL \"{url}\" must start with http:// or https://"
            )));
        }

        self.api_base_url = url.to_owned();
        Ok(self)
    }

    /// Use `timezone` for displaying dates.
    ///
    /// # Errors
    /// Returns [Error::InvalidConfig] if `timezone` is not a canonical timezone name.
    pub fn with_timezone(mut self, timezone: &str) -> Result<Self, Error> {
        let timezone = timezone.trim();

        if time_tz::timezones::get_by_name(timezone).is_none() {
            return Err(Error::InvalidConfig(format!(
                "\"{timezone}\" is not a canonical timezone name"
            )));
        }

        self.timezone = timezone.to_owned();
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use crate::{ClientConfig, Error};

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        move |name| vars.get(name).cloned()
    }

    #[test]
    fn uses_defaults_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.recent_limit, 4);
    }

    #[test]
    fn reads_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("TCASH_API_URL", "http://localhost:3000/"),
            ("TCASH_TIMEOUT_SECS", "5"),
            ("TCASH_RECENT_LIMIT", "10"),
            ("TCASH_TIMEZONE", "Asia/Manila"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "http://localhost:3000");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.recent_limit, 10);
        assert_eq!(config.timezone, "Asia/Manila");
    }

    #[test]
    fn rejects_invalid_timeout() {
        let result = ClientConfig::from_lookup(lookup_from(&[("TCASH_TIMEOUT_SECS", "soon")]));

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_unknown_timezone() {
        let result = ClientConfig::default().with_timezone("Middle/Earth");

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_url_without_scheme() {
        let result = ClientConfig::default().with_api_base_url("tcash-api.onrender.com");

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
