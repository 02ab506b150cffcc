use csv::StringRecord;

use crate::account::STATUS_API_ERROR;
use crate::date::{self, CreatedOn};
use crate::{AccountId, StatusLookup};

/// The header of the merged output, in column order
pub const OUTPUT_HEADER: [&str; 5] = ["Account ID", "First Name", "Created On", "Status", "Status Set On"];

/// One row of the account export
///
/// Columns are read by position: account id, account name, first name and
/// creation date. Empty or missing cells are `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputRow {
    account_id: Option<AccountId>,
    account_name: Option<String>,
    first_name: Option<String>,
    created_on: Option<CreatedOn>,
}

impl InputRow {
    pub fn new(
        account_id: Option<&str>,
        account_name: Option<&str>,
        first_name: Option<&str>,
        created_on: Option<&str>,
    ) -> Self {
        fn cell(value: Option<&str>) -> Option<&str> {
            value.filter(|value| !value.is_empty())
        }

        Self {
            account_id: cell(account_id).and_then(AccountId::new),
            account_name: cell(account_name).map(str::to_owned),
            first_name: cell(first_name).map(str::to_owned),
            created_on: cell(created_on).map(date::normalize),
        }
    }

    /// Builds a row from a csv record, normalizing the "Created On" cell
    pub fn from_record(record: &StringRecord) -> Self {
        Self::new(record.get(0), record.get(1), record.get(2), record.get(3))
    }

    pub fn account_id(&self) -> Option<&AccountId> {
        self.account_id.as_ref()
    }

    /// The account name, which does not make it into the output
    pub fn account_name(&self) -> Option<&str> {
        self.account_name.as_deref()
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn created_on(&self) -> Option<&CreatedOn> {
        self.created_on.as_ref()
    }
}

/// One row of the merged output
///
/// See [`OUTPUT_HEADER`] for the column layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputRow {
    account_id: AccountId,
    first_name: String,
    created_on: CreatedOn,
    status: String,
    status_set_on: Option<String>,
}

impl OutputRow {
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn created_on(&self) -> &CreatedOn {
        &self.created_on
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// When the status was set
    /// Empty unless the endpoint found the account
    pub fn status_set_on(&self) -> Option<&str> {
        self.status_set_on.as_deref()
    }

    /// Whether the status lookup for this row degraded
    pub fn is_api_error(&self) -> bool {
        self.status_set_on.is_none() && self.status == STATUS_API_ERROR
    }
}

impl serde::Serialize for OutputRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: serde::Serializer
    {
        use serde::ser::SerializeStruct;
        let mut row = serializer.serialize_struct("OutputRow", 5)?;

        row.serialize_field(OUTPUT_HEADER[0], &self.account_id)?;
        row.serialize_field(OUTPUT_HEADER[1], &self.first_name)?;
        row.serialize_field(OUTPUT_HEADER[2], &self.created_on)?;
        row.serialize_field(OUTPUT_HEADER[3], &self.status)?;
        row.serialize_field(OUTPUT_HEADER[4], &self.status_set_on)?;

        row.end()
    }
}

/// Turns input rows into output rows by asking a [`StatusLookup`]
#[derive(Debug)]
pub struct RowProcessor<L> {
    lookup: L,
}

impl<L: StatusLookup> RowProcessor<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub fn into_lookup(self) -> L {
        self.lookup
    }

    /// Merges the status of the row's account into the row
    ///
    /// Rows without an account id, first name or creation date are skipped
    /// by returning `None`. The lookup is not consulted for them.
    pub fn process(&mut self, row: InputRow) -> Option<OutputRow> {
        let InputRow { account_id, account_name: _, first_name, created_on } = row;
        let (account_id, first_name, created_on) = (account_id?, first_name?, created_on?);

        let (status, status_set_on) = self.lookup.lookup(&account_id).into_parts();

        Some(OutputRow {
            account_id,
            first_name,
            created_on,
            status,
            status_set_on,
        })
    }
}
