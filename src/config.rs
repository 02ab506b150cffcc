/// The environment variable that overrides the status endpoint
pub const BASE_URL_VAR: &str = "WPE_API";

/// The status endpoint used when no override is configured
pub const DEFAULT_BASE_URL: &str = "http://interview.wpengine.io/v1/accounts/";

/// Settings for the [`AccountStatusClient`](crate::AccountStatusClient)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
}

impl ClientConfig {
    /// Creates a config pointing at the given base url
    ///
    /// The account id is appended to the url as is, so it usually ends in a `/`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    /// Reads the config from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let base_url = lookup(BASE_URL_VAR)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        Self { base_url }
    }

    /// The url every account id is appended to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
