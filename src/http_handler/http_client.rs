use std::time::Duration;

/// A thin wrapper around `reqwest::Client` bound to the base URL of the
/// MAV2Rest gateway that relays MAVLink traffic to the flight controller.
#[derive(Debug)]
pub(crate) struct HTTPClient {
    /// The underlying `reqwest::Client` used to perform HTTP requests.
    client: reqwest::Client,
    /// Base URL for the API, prepended to all endpoint paths.
    base_url: String,
}

impl HTTPClient {
    /// Default timeout applied to every request that does not override it.
    pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Constructs a new `HTTPClient` with the given base URL.
    ///
    /// A trailing slash on `base_url` is stripped so endpoint paths can always
    /// start with `/`.
    ///
    /// # Errors
    /// Fails if the TLS backend or the connection pool cannot be initialised.
    pub(crate) fn new(base_url: &str) -> Result<HTTPClient, reqwest::Error> {
        Ok(HTTPClient {
            client: reqwest::Client::builder().timeout(Self::DEFAULT_TIMEOUT).build()?,
            base_url: String::from(base_url.trim_end_matches('/')),
        })
    }

    /// Returns a reference to the internal `reqwest::Client`.
    pub(crate) fn client(&self) -> &reqwest::Client { &self.client }
    /// Returns the base URL that the client was initialized with.
    pub(crate) fn url(&self) -> &str { self.base_url.as_str() }
}
