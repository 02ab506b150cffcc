use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::StringRecord;

/// Ways an account export can fail to be valid CSV
#[derive(Debug, thiserror::Error)]
pub enum InputDefect {
    #[error("the input is not valid UTF-8: {0}")]
    Encoding(#[source] csv::Error),
    #[error("stray quote in an unquoted field at byte {0}")]
    StrayQuote(u64),
    #[error("unexpected text after a closing quote at byte {0}")]
    TextAfterQuote(u64),
    #[error("the quoted field opened at byte {0} is never closed")]
    UnclosedQuote(u64),
}

/// Errors while streaming the account export
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error(transparent)]
    Malformed(#[from] InputDefect),
    #[error(transparent)]
    Csv(csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for InputError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Utf8 { .. } => Self::Malformed(InputDefect::Encoding(error)),
            _ => Self::Csv(error),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Quoting {
    FieldStart,
    Unquoted,
    Quoted { opened: u64 },
    /// A quote inside a quoted field, either closing it or escaping the next one
    Closing { opened: u64 },
}

/// Follows the quoting of the raw input alongside the csv reader
///
/// The csv reader is lenient: it takes an unterminated quote as running to
/// the end of the file, and keeps quotes inside unquoted fields as text.
/// Both are rejected here.
#[derive(Debug)]
struct QuoteScanner {
    state: Quoting,
    offset: u64,
}

impl QuoteScanner {
    fn new() -> Self {
        Self { state: Quoting::FieldStart, offset: 0 }
    }

    fn feed(&mut self, bytes: &[u8]) -> Result<(), InputDefect> {
        use Quoting::*;

        for &byte in bytes {
            let at = self.offset;
            self.offset += 1;
            self.state = match (self.state, byte) {
                (Quoted { opened }, b'"') => Closing { opened },
                (Quoted { opened }, _) => Quoted { opened },
                (Closing { opened }, b'"') => Quoted { opened },
                (Closing { opened }, b' ' | b'\t') => Closing { opened },
                (_, b',' | b'\r' | b'\n') => FieldStart,
                (Closing { .. }, _) => return Err(InputDefect::TextAfterQuote(at)),
                (FieldStart, b'"') => Quoted { opened: at },
                (Unquoted, b'"') => return Err(InputDefect::StrayQuote(at)),
                (FieldStart | Unquoted, _) => Unquoted,
            };
        }

        Ok(())
    }

    /// Records never end inside a quoted field
    fn end_of_record(&self) -> Result<(), InputDefect> {
        match self.state {
            Quoting::Quoted { opened } => Err(InputDefect::UnclosedQuote(opened)),
            _ => Ok(()),
        }
    }
}

/// A streaming reader for the account export
///
/// Records come from the csv reader. The bytes each record was parsed from are
/// read from a second handle and checked for well formed quoting before
/// the record is handed out.
pub struct InputReader {
    records: csv::Reader<File>,
    raw: BufReader<File>,
    scanner: QuoteScanner,
}

impl InputReader {
    /// Opens the export and consumes its header
    pub fn open(path: &Path) -> Result<Self, InputError> {
        let records = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;
        let raw = BufReader::new(File::open(path)?);

        let mut reader = Self { records, raw, scanner: QuoteScanner::new() };
        // the header is dropped, but it still has to be valid
        reader.records.headers()?;
        reader.check_consumed()?;

        Ok(reader)
    }

    /// Reads the next record, returning `false` at the end of the input
    pub fn read_record(&mut self, record: &mut StringRecord) -> Result<bool, InputError> {
        let more = self.records.read_record(record)?;
        self.check_consumed()?;
        Ok(more)
    }

    fn check_consumed(&mut self) -> Result<(), InputError> {
        let end = self.records.position().byte();
        let mut span = Vec::new();
        (&mut self.raw)
            .take(end.saturating_sub(self.scanner.offset))
            .read_to_end(&mut span)?;

        self.scanner.feed(&span)?;
        self.scanner.end_of_record()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn scan(input: &str) -> Result<(), InputDefect> {
        let mut scanner = QuoteScanner::new();
        scanner.feed(input.as_bytes())?;
        scanner.end_of_record()
    }

    macro_rules! scan_test {
        ($name:ident $input:literal => ok) => {
            #[test]
            fn $name() {
                assert!(scan($input).is_ok());
            }
        };
        ($name:ident $input:literal => $defect:ident $at:literal) => {
            #[test]
            fn $name() {
                assert!(matches!(scan($input), Err(InputDefect::$defect($at))));
            }
        };
    }

    scan_test!(plain_fields "1,Foo Inc,Uno,1/1/11\n" => ok);
    scan_test!(quoted_fields "\"1\",\"Foo, Inc\",Uno,1/1/11\r\n" => ok);
    scan_test!(escaped_quote "1,\"Foo \"\"Big\"\" Inc\",Uno,1/1/11\n" => ok);
    scan_test!(quoted_newline "1,\"Foo\nInc\",Uno,1/1/11\n" => ok);
    scan_test!(space_after_closing_quote "1,\"Foo\" ,Uno\n" => ok);
    scan_test!(empty_quoted_field "1,\"\",Uno\n" => ok);
    scan_test!(unterminated_quote "1,\"Foo Inc,Uno,1/1/11\n2,Two,Dos,2/2/12\n" => UnclosedQuote 2);
    scan_test!(quote_inside_unquoted "1,Fo\"o Inc,Uno,1/1/11\n" => StrayQuote 4);
    scan_test!(text_after_closing_quote "1,\"Foo\"bar,Uno\n" => TextAfterQuote 7);

    fn reader_for(dir: &TempDir, content: &str) -> InputReader {
        let path = dir.path().join("input.csv");
        fs::write(&path, content).unwrap();
        InputReader::open(&path).unwrap()
    }

    #[test]
    fn reads_records_after_the_header() {
        let dir = TempDir::new().unwrap();
        let mut reader = reader_for(&dir, "Account ID,Name\n1,\"One, Inc\"\n\n2,Two\n");
        let mut record = StringRecord::new();

        assert!(reader.read_record(&mut record).unwrap());
        assert_eq!(record, vec!["1", "One, Inc"]);
        assert!(reader.read_record(&mut record).unwrap());
        assert_eq!(record, vec!["2", "Two"]);
        assert!(!reader.read_record(&mut record).unwrap());
    }

    #[test]
    fn unterminated_quote_is_caught_on_its_record() {
        let dir = TempDir::new().unwrap();
        let mut reader = reader_for(&dir, "Account ID,Name\n1,One\n2,\"Two\n3,Three\n");
        let mut record = StringRecord::new();

        assert!(reader.read_record(&mut record).unwrap());
        assert!(matches!(
            reader.read_record(&mut record),
            Err(InputError::Malformed(InputDefect::UnclosedQuote(24))),
        ));
    }

    #[test]
    fn malformed_header_fails_on_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.csv");
        fs::write(&path, "Account \"ID,Name\n1,One\n").unwrap();

        assert!(matches!(
            InputReader::open(&path),
            Err(InputError::Malformed(InputDefect::StrayQuote(8))),
        ));
    }
}
