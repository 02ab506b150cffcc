use std::fmt;

/// The status reported for accounts the endpoint does not know
pub const STATUS_NOT_FOUND: &str = "not found";
/// The status reported when the endpoint could not be asked successfully
pub const STATUS_API_ERROR: &str = "api error";

/// The identifier of an account in the export
///
/// Ids are opaque. They are appended to the status endpoint without any
/// encoding, so the export is trusted to only contain url-safe ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AccountId(String);

impl AccountId {
    /// Wraps a raw id, returning `None` for an empty one
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        (!id.is_empty()).then(|| Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for AccountId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: serde::Serializer
    {
        serializer.serialize_str(&self.0)
    }
}

/// The outcome of one status lookup
///
/// There are three shapes:
/// 1. Found:
///    Status and status date are whatever the endpoint returned.
/// 2. Not found:
///    The endpoint does not know the account. See [`StatusResult::not_found`].
/// 3. Api error:
///    Anything else went wrong. See [`StatusResult::api_error`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusResult {
    status: String,
    created_on: Option<String>,
}

impl StatusResult {
    /// A status reported by the endpoint
    pub fn found(status: impl Into<String>, created_on: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            created_on: Some(created_on.into()),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: STATUS_NOT_FOUND.to_owned(),
            created_on: None,
        }
    }

    pub fn api_error() -> Self {
        Self {
            status: STATUS_API_ERROR.to_owned(),
            created_on: None,
        }
    }

    /// The status of the account
    pub fn status(&self) -> &str {
        &self.status
    }

    /// When the status was set, as reported by the endpoint
    /// Only populated for accounts that were found
    pub fn created_on(&self) -> Option<&str> {
        self.created_on.as_deref()
    }

    /// Whether the lookup degraded to [`STATUS_API_ERROR`]
    pub fn is_api_error(&self) -> bool {
        self.created_on.is_none() && self.status == STATUS_API_ERROR
    }

    pub(crate) fn into_parts(self) -> (String, Option<String>) {
        (self.status, self.created_on)
    }
}
