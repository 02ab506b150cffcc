use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::input::{InputDefect, InputError, InputReader};
use crate::row::{InputRow, RowProcessor, OUTPUT_HEADER};
use crate::StatusLookup;

/// Possible errors to occur while setting up or running a merge
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("Input file doesn't exist.")]
    InputMissing(PathBuf),
    #[error("Output file cannot be written.")]
    OutputUnwritable(PathBuf),
    #[error("Output file already exists.")]
    OutputExists(PathBuf),
    #[error("Invalid input CSV file.")]
    MalformedInput(#[source] InputDefect),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<InputError> for MergeError {
    fn from(error: InputError) -> Self {
        match error {
            InputError::Malformed(defect) => Self::MalformedInput(defect),
            InputError::Csv(error) => Self::Csv(error),
            InputError::Io(error) => Self::Io(error),
        }
    }
}

/// Knobs for [`MergePipeline::with_options`]
#[derive(Clone, Copy, Debug, Default)]
pub struct MergeOptions {
    /// Refuse to replace an already existing output file
    pub no_clobber: bool,
}

/// What happened during a merge
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Data rows read from the input, header excluded
    pub rows_read: usize,
    /// Rows without any content
    pub blank_rows: usize,
    /// Rows missing an account id, first name or creation date
    pub skipped_rows: usize,
    /// Rows appended to the output
    pub written_rows: usize,
    /// Written rows whose status lookup degraded to an api error
    pub api_errors: usize,
}

/// Merges an account export with the account status endpoint
///
/// The output file is created and receives its header as soon as the
/// pipeline is constructed. The input is only opened by [`MergePipeline::merge`],
/// which streams it one record at a time.
#[derive(Debug)]
pub struct MergePipeline<L> {
    input: PathBuf,
    output: PathBuf,
    writer: csv::Writer<File>,
    processor: RowProcessor<L>,
}

impl<L: StatusLookup> MergePipeline<L> {
    /// Checks both paths and prepares the output file
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>, lookup: L) -> Result<Self, MergeError> {
        Self::with_options(input, output, lookup, MergeOptions::default())
    }

    pub fn with_options(
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        lookup: L,
        options: MergeOptions,
    ) -> Result<Self, MergeError> {
        let input = input.as_ref().to_path_buf();
        if !input.exists() {
            return Err(MergeError::InputMissing(input));
        }

        let output = absolute(output.as_ref())?;
        if options.no_clobber && output.exists() {
            return Err(MergeError::OutputExists(output));
        }
        if !parent_is_writable(&output) {
            return Err(MergeError::OutputUnwritable(output));
        }

        let file = File::create(&output).map_err(|error| unwritable_or_io(&output, error))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(OUTPUT_HEADER)?;
        writer.flush()?;

        tracing::debug!(input = %input.display(), output = %output.display(), "merge prepared");

        Ok(Self {
            input,
            output,
            writer,
            processor: RowProcessor::new(lookup),
        })
    }

    /// The absolute path of the output file
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Runs the merge to completion and closes the output
    ///
    /// The output is flushed and closed on every path. Rows written before a
    /// malformed input record is hit stay in the output.
    pub fn merge(mut self) -> Result<MergeSummary, MergeError> {
        tracing::info!(input = %self.input.display(), output = %self.output.display(), "merging accounts");

        let result = self.run();
        // the run's error wins over a failing flush
        let closed = self.writer.flush();
        drop(self);

        let summary = result?;
        closed?;

        tracing::info!(
            rows = summary.rows_read,
            written = summary.written_rows,
            skipped = summary.skipped_rows,
            blank = summary.blank_rows,
            api_errors = summary.api_errors,
            "merge finished",
        );
        Ok(summary)
    }

    fn run(&mut self) -> Result<MergeSummary, MergeError> {
        let mut reader = InputReader::open(&self.input)?;

        let mut summary = MergeSummary::default();
        let mut record = csv::StringRecord::new();

        while reader.read_record(&mut record)? {
            summary.rows_read += 1;
            if record.iter().all(str::is_empty) {
                summary.blank_rows += 1;
                continue;
            }

            let row = InputRow::from_record(&record);
            match self.processor.process(row) {
                Some(output) => {
                    tracing::debug!(account_id = %output.account_id(), status = output.status(), "row merged");
                    if output.is_api_error() {
                        summary.api_errors += 1;
                    }
                    self.writer.serialize(&output)?;
                    summary.written_rows += 1;
                }
                None => summary.skipped_rows += 1,
            }
        }

        Ok(summary)
    }
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

// a parent with write bits can still refuse the create when it belongs to someone else
fn unwritable_or_io(output: &Path, error: io::Error) -> MergeError {
    match error.kind() {
        io::ErrorKind::PermissionDenied => MergeError::OutputUnwritable(output.to_path_buf()),
        _ => MergeError::Io(error),
    }
}

fn parent_is_writable(path: &Path) -> bool {
    path.parent()
        .and_then(|parent| fs::metadata(parent).ok())
        .map(|metadata| metadata.is_dir() && !metadata.permissions().readonly())
        .unwrap_or(false)
}
