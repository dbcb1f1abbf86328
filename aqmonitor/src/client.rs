use crate::errors::{Error, Result};
use crate::metrics::{PROVIDER_FAILURES_TOTAL, PROVIDER_LATENCY_SECONDS, PROVIDER_REQUESTS_TOTAL};
use reqwest::header::HeaderMap;
use reqwest::{Client, Request, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::{debug, error, info};

/// Query parameters whose values never reach the logs.
const REDACTED_PARAMS: &[&str] = &["key"];

/// Outbound HTTP client for the air-quality provider.
///
/// Every request is resolved against the configured base URL and logged on
/// the way out, and every response (or failure) is logged on the way back.
/// Failures are always returned to the caller as [`Error`], never swallowed.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: Client,
    base_url: Url,
}

impl ProviderClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        info!("API_URL: {}", base_url);
        let base_url = parse_base_url(base_url)?;
        info!("Setting new base URL: {}", base_url);
        Ok(Self { http, base_url })
    }

    pub fn set_base_url(&mut self, url: &str) -> Result<()> {
        info!("Setting new base URL: {}", url);
        self.base_url = parse_base_url(url)?;
        Ok(())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Issues a GET for `path` (relative to the base URL, `""` for the base
    /// itself) and decodes the JSON body.
    pub async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = self.build_get(path, query)?;
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            error!("Response error: {}", e);
            debug!("{:?}", e);
            Error::Json(e)
        })
    }

    fn build_get(&self, path: &str, query: &[(&str, String)]) -> Result<Request> {
        let url = self.resolve(path)?;
        self.http.get(url).query(query).build().map_err(|e| {
            error!("Request error: {}", e);
            debug!("{}", error_chain(&e));
            Error::Http(e)
        })
    }

    async fn execute(&self, request: Request) -> Result<String> {
        info!(
            "Request - Method: {}, URL: {}, Data: {}, Headers: {}",
            request.method(),
            redacted_url(request.url()),
            request_body(&request),
            headers_json(request.headers())
        );

        PROVIDER_REQUESTS_TOTAL.inc();
        let start = Instant::now();
        let outcome = self.http.execute(request).await;
        PROVIDER_LATENCY_SECONDS.observe(start.elapsed().as_secs_f64());

        let response = outcome.map_err(|e| {
            PROVIDER_FAILURES_TOTAL.inc();
            error!("Response error: {}", e);
            debug!("{}", error_chain(&e));
            Error::Http(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            PROVIDER_FAILURES_TOTAL.inc();
            error!("Response error: {}", e);
            debug!("{}", error_chain(&e));
            Error::Http(e)
        })?;

        if !status.is_success() {
            PROVIDER_FAILURES_TOTAL.inc();
            error!(
                "Response error - Status: {}, StatusText: {}, Data: {}",
                status.as_u16(),
                status_text(status),
                body
            );
            return Err(Error::Provider {
                status: status.as_u16(),
                status_text: status_text(status).to_string(),
                body,
            });
        }

        info!(
            "Response - Status: {}, StatusText: {}, Data: {}",
            status.as_u16(),
            status_text(status),
            body
        );
        Ok(body)
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Ok(self.base_url.clone());
        }
        let joined = format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| Error::BaseUrl(format!("{}: {}", joined, e)))
    }
}

fn parse_base_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| Error::BaseUrl(format!("{}: {}", url, e)))
}

fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("")
}

fn request_body(request: &Request) -> String {
    request
        .body()
        .and_then(|body| body.as_bytes())
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_else(|| "null".to_string())
}

fn headers_json(headers: &HeaderMap) -> String {
    let map: serde_json::Map<String, serde_json::Value> = headers
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or("<binary>").to_string();
            (name.as_str().to_string(), serde_json::Value::String(value))
        })
        .collect();
    serde_json::Value::Object(map).to_string()
}

fn redacted_url(url: &Url) -> Url {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if REDACTED_PARAMS.contains(&k.as_ref()) {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    if !pairs.is_empty() {
        redacted.query_pairs_mut().clear().extend_pairs(pairs);
    }
    redacted
}

/// Renders an error and its sources, one per line.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\n  caused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
