pub use self::{
    account::{AccountId, StatusResult, STATUS_API_ERROR, STATUS_NOT_FOUND},
    config::{ClientConfig, BASE_URL_VAR, DEFAULT_BASE_URL},
    date::{normalize, CreatedOn, INPUT_DATE_FORMAT},
    input::InputDefect,
    pipeline::{MergeError, MergeOptions, MergePipeline, MergeSummary},
    row::{InputRow, OutputRow, RowProcessor, OUTPUT_HEADER},
    status::{AccountStatusClient, LookupError, StatusLookup},
};

mod account;
mod config;
mod date;
mod input;
mod pipeline;
mod row;
mod status;
#[cfg(test)]
mod test_support;
