use std::fmt;
#[cfg(not(target_arch = "wasm32"))]
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::{header, Method};
use serde::{de::DeserializeOwned, Serialize};

// tokio::time::sleep is only available on non-WASM targets.
#[cfg(not(target_arch = "wasm32"))]
use tokio::time::sleep;

use crate::{wire, CampusCardError, ClientOptions, Connectivity, ConnectivityState, Result};

#[cfg(not(target_arch = "wasm32"))]
use tokio::task::JoinHandle;

/// HTTP client for the campus lost-and-found card service.
///
/// Every call goes through a bounded retry loop with linear backoff and
/// feeds the shared [`ConnectivityState`]: a success marks the service
/// [`Connectivity::Connected`], an exhausted retry budget marks it
/// [`Connectivity::Disconnected`] and surfaces a user-visible notification.
///
/// Cloning is cheap; clones share the connectivity flag and the heartbeat.
#[derive(Clone)]
pub struct CampusCardClient {
    http: reqwest::Client,
    base_url: String,
    options: ClientOptions,
    status: ConnectivityState,
    #[cfg(not(target_arch = "wasm32"))]
    pub(crate) heartbeat: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl fmt::Debug for CampusCardClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CampusCardClient")
            .field("base_url", &self.base_url)
            .field("options", &self.options)
            .field("status", &self.status)
            .finish()
    }
}

impl CampusCardClient {
    /// Creates a client for a service rooted at `base_url`
    /// (e.g. `http://localhost:5000`). A trailing slash is tolerated.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            http: reqwest::Client::new(),
            base_url,
            options: ClientOptions::default(),
            status: ConnectivityState::new(),
            #[cfg(not(target_arch = "wasm32"))]
            heartbeat: Arc::new(Mutex::new(None)),
        }
    }

    /// Creates a client from the `CAMPUSCARD_BASE_URL` environment variable.
    ///
    /// **Not available on `wasm32` targets** — environment variables do not
    /// exist in browser runtimes. Use [`CampusCardClient::new`] and receive
    /// the URL from JavaScript via `wasm-bindgen`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> std::result::Result<Self, String> {
        let url = std::env::var("CAMPUSCARD_BASE_URL")
            .map_err(|_| "missing CAMPUSCARD_BASE_URL environment variable".to_owned())?;
        if url.trim().is_empty() {
            return Err("CAMPUSCARD_BASE_URL is set but empty".to_owned());
        }
        Ok(Self::new(url))
    }

    /// Applies client options such as timeout and retry behavior.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    /// Installs the callback that shows the exhausted-retries notification.
    pub fn with_notifier(mut self, notifier: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.status = self.status.with_notifier(notifier);
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Shared connectivity flag, for the presentation collaborator.
    pub fn status(&self) -> &ConnectivityState {
        &self.status
    }

    pub fn connectivity(&self) -> Connectivity {
        self.status.current()
    }

    /// Issues a GET request with the default attempt budget.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.call(path, Method::GET, None::<&()>).await
    }

    /// Issues a POST request carrying a JSON payload.
    pub async fn post<T, B>(&self, path: &str, payload: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.call(path, Method::POST, Some(payload)).await
    }

    /// Issues a request with the default attempt budget from
    /// [`ClientOptions::max_attempts`].
    pub async fn call<T, B>(&self, path: &str, method: Method, payload: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.call_with_attempts(path, method, payload, self.options.max_attempts)
            .await
    }

    /// Issues a request, retrying up to `max_attempts` times in total.
    ///
    /// Attempts are strictly sequential. Every failure kind — transport
    /// error, non-2xx status, an `error` field in the body, malformed JSON —
    /// is retried identically after a linear backoff of
    /// `backoff_base_ms * attempt_number`; this uniform treatment (no
    /// classification, no jitter) is the service's documented default.
    /// Exhausting the budget marks the service disconnected, notifies the
    /// user and returns the final attempt's error.
    pub async fn call_with_attempts<T, B>(
        &self,
        path: &str,
        method: Method,
        payload: Option<&B>,
        max_attempts: u32,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            match self.send_once(path, &method, payload).await {
                Ok(value) => {
                    self.status.set(Connectivity::Connected);
                    return Ok(value);
                }
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt, max_attempts, %err, "api call attempt failed");

                    if attempt >= max_attempts {
                        self.status.set(Connectivity::Disconnected);
                        self.status.notify_failure(&format!(
                            "operation failed: {}; check your network connection and retry",
                            err.reason()
                        ));
                        return Err(err);
                    }

                    self.wait_before_retry(attempt).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn send_once<T, B>(&self, path: &str, method: &Method, payload: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        // Build the request. On WASM, reqwest uses AbortController for
        // timeout; the `.timeout()` method is available on both targets.
        let mut request = self
            .http
            .request(method.clone(), self.endpoint_url(path))
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(Duration::from_millis(self.options.timeout_ms));
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(CampusCardError::Transport)?;
        let status = response.status();
        let body = response.text().await.map_err(CampusCardError::Transport)?;
        wire::decode_body(status.as_u16(), status.is_success(), &body)
    }

    pub(crate) fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Waits before the next retry attempt.
    ///
    /// On native targets: linear backoff sleep via `tokio::time::sleep`.
    /// On WASM targets: no-op — browser embedders prefer fast failure over
    /// sleeping, and `tokio::time::sleep` is not available.
    async fn wait_before_retry(&self, attempt: u32) {
        let delay_ms = backoff_delay_ms(attempt, self.options.backoff_base_ms);

        #[cfg(feature = "tracing")]
        tracing::debug!("retrying api call after {} ms", delay_ms);

        #[cfg(not(target_arch = "wasm32"))]
        sleep(Duration::from_millis(delay_ms)).await;

        // WASM: no sleep implementation — suppress unused variable warning.
        #[cfg(target_arch = "wasm32")]
        let _ = delay_ms;
    }
}

/// Backoff after attempt `attempt` (1-based): `base * attempt`.
///
/// The default base of 1000 ms yields the sequence 1000, 2000, … between
/// consecutive attempts.
pub(crate) fn backoff_delay_ms(attempt: u32, base_ms: u64) -> u64 {
    base_ms.saturating_mul(u64::from(attempt))
}
