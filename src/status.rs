use std::io::{self, Write};

use reqwest::StatusCode;

use crate::{AccountId, ClientConfig, StatusResult};

/// Anything that can resolve the status of an account
///
/// A lookup never fails. Problems talking to the status source are folded
/// into [`StatusResult::api_error`] by the implementation.
pub trait StatusLookup {
    fn lookup(&mut self, account_id: &AccountId) -> StatusResult;
}

impl<L: StatusLookup + ?Sized> StatusLookup for &mut L {
    fn lookup(&mut self, account_id: &AccountId) -> StatusResult {
        (**self).lookup(account_id)
    }
}

/// Reasons a lookup degrades to [`StatusResult::api_error`]
///
/// The messages complete the sentence `Request to <uri> ...`.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("resulted in a {0} status code")]
    UnexpectedStatus(u16),
    #[error("returned a malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
    #[error("failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The body the status endpoint answers with on success
///
/// Besides these two fields, the endpoint also echoes the `account_id`, which is ignored.
#[derive(Debug, serde::Deserialize)]
struct StatusResponse {
    status: String,
    created_on: String,
}

/// A blocking client for the account status endpoint
///
/// Every lookup issues exactly one `GET <base_url><account_id>`. Degraded
/// lookups are reported as a single line on the diagnostics writer, which
/// is stderr unless configured otherwise.
#[derive(Debug)]
pub struct AccountStatusClient<D = io::Stderr> {
    config: ClientConfig,
    http: reqwest::blocking::Client,
    diagnostics: D,
}

impl AccountStatusClient {
    /// Creates a client reporting to stderr
    pub fn new(config: ClientConfig) -> reqwest::Result<Self> {
        Self::with_diagnostics(config, io::stderr())
    }
}

impl<D: Write> AccountStatusClient<D> {
    /// Creates a client reporting degraded lookups to `diagnostics`
    pub fn with_diagnostics(config: ClientConfig, diagnostics: D) -> reqwest::Result<Self> {
        let http = reqwest::blocking::Client::builder().build()?;
        Ok(Self { config, http, diagnostics })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The writer degraded lookups are reported to
    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    /// The uri the status of `account_id` is requested from
    pub fn uri_for(&self, account_id: &AccountId) -> String {
        format!("{}{}", self.config.base_url(), account_id)
    }

    /// Requests the status and classifies the answer
    /// `Ok(None)` means the endpoint does not know the account
    fn fetch(&self, uri: &str) -> Result<Option<StatusResponse>, LookupError> {
        let response = self.http.get(uri).send()?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text()?;
                Ok(Some(serde_json::from_str(&body)?))
            }
            StatusCode::NOT_FOUND => Ok(None),
            other => Err(LookupError::UnexpectedStatus(other.as_u16())),
        }
    }
}

impl<D: Write> StatusLookup for AccountStatusClient<D> {
    fn lookup(&mut self, account_id: &AccountId) -> StatusResult {
        let uri = self.uri_for(account_id);

        match self.fetch(&uri) {
            Ok(Some(response)) => StatusResult::found(response.status, response.created_on),
            Ok(None) => StatusResult::not_found(),
            Err(error) => {
                tracing::debug!(%uri, %error, "status lookup degraded");
                // a broken diagnostics stream must not stop the merge
                let _ = writeln!(self.diagnostics, "Request to {uri} {error}.");
                StatusResult::api_error()
            }
        }
    }
}
