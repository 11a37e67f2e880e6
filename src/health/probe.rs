//! Health probe targets.

use futures_util::future::BoxFuture;
use url::Url;

use crate::error::ResilienceError;

/// A single reachability check against a lightweight health surface.
///
/// The returned future must be `'static` so the monitor can bound it with a
/// detaching timeout; implementations clone what they need up front.
pub trait Probe: Send + Sync {
    fn check(&self) -> BoxFuture<'static, Result<(), ResilienceError>>;
}

/// HTTP GET probe: any 2xx response is a success, anything else a failure.
pub struct HttpProbe {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpProbe {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

impl Probe for HttpProbe {
    fn check(&self) -> BoxFuture<'static, Result<(), ResilienceError>> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        Box::pin(async move {
            let response = client
                .get(endpoint)
                .send()
                .await
                .map_err(|e| ResilienceError::Network(e.to_string()))?;
            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(ResilienceError::Backend(format!(
                    "health endpoint returned {status}"
                )))
            }
        })
    }
}

impl<F> Probe for F
where
    F: Fn() -> BoxFuture<'static, Result<(), ResilienceError>> + Send + Sync,
{
    fn check(&self) -> BoxFuture<'static, Result<(), ResilienceError>> {
        self()
    }
}
