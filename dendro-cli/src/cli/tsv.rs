//! Tab-separated ingestion and output for distance and data matrices.
//!
//! Two layouts are read. A distance table starts with a header row of item
//! names followed by one row of distances per item. A data table starts with
//! a header row of column names (the first cell is a free-form corner label)
//! and every following row opens with its row name.
//!
//! Records go through the `csv` crate with a tab delimiter and quoting
//! disabled. Rows whose cells are all blank are skipped.

use std::io::{self, Read, Write};

use csv::{Position, QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use thiserror::Error;

/// Errors raised while parsing tab-separated input.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TsvError {
    /// The reader failed on I/O or invalid UTF-8. The wrapped error carries
    /// the record position when one is known.
    #[error("failed to read input: {0}")]
    Read(#[from] csv::Error),
    /// The input held no header row.
    #[error("input is empty")]
    Empty,
    /// A row carried the wrong number of cells.
    #[error("line {line}: expected {expected} cells, found {found}")]
    Ragged {
        /// One-based line number.
        line: u64,
        /// Cells required by the header.
        expected: usize,
        /// Cells present on the line.
        found: usize,
    },
    /// A cell did not parse as a number.
    #[error("line {line}, column {column}: `{value}` is not a number")]
    InvalidNumber {
        /// One-based line number.
        line: u64,
        /// One-based column number.
        column: usize,
        /// Raw cell contents.
        value: String,
    },
}

/// Square distance matrix labelled by its header row.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceTable {
    /// Item names in row order.
    pub names: Vec<String>,
    /// Distances, one row per name.
    pub matrix: Vec<Vec<f64>>,
}

/// Numeric observations labelled by row and column.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    /// Column names from the header row.
    pub columns: Vec<String>,
    /// Row names from the first cell of each row.
    pub rows: Vec<String>,
    /// Values, one vector per row.
    pub values: Vec<Vec<f64>>,
}

/// Parses a distance table.
///
/// Row count is not checked against the header here; the clustering
/// validation reports non-square input with its own error code.
///
/// # Errors
/// Returns [`TsvError`] when the input is empty, a row is ragged, or a cell
/// is not a number.
///
/// # Examples
/// ```
/// use dendro_cli::cli::tsv::read_distance_table;
///
/// let table = read_distance_table("a\tb\n0\t1.5\n1.5\t0\n".as_bytes())?;
/// assert_eq!(table.names, ["a", "b"]);
/// assert_eq!(table.matrix[0][1], 1.5);
/// # Ok::<(), dendro_cli::cli::tsv::TsvError>(())
/// ```
pub fn read_distance_table(reader: impl Read) -> Result<DistanceTable, TsvError> {
    let mut records = content_records(reader);
    let header = records.next().ok_or(TsvError::Empty)??;
    let names: Vec<String> = header.iter().map(str::to_owned).collect();

    let mut matrix = Vec::with_capacity(names.len());
    for record in records {
        let record = record?;
        let line = line_of(&record);
        expect_cells(line, names.len(), record.len())?;
        matrix.push(parse_numbers(line, &record, 0)?);
    }
    Ok(DistanceTable { names, matrix })
}

/// Parses a data table.
///
/// # Errors
/// Returns [`TsvError`] when the input is empty, a row is ragged, or a value
/// cell is not a number.
pub fn read_data_table(reader: impl Read) -> Result<DataTable, TsvError> {
    let mut records = content_records(reader);
    let header = records.next().ok_or(TsvError::Empty)??;
    let columns: Vec<String> = header.iter().skip(1).map(str::to_owned).collect();

    let mut rows = Vec::new();
    let mut values = Vec::new();
    for record in records {
        let record = record?;
        let line = line_of(&record);
        expect_cells(line, columns.len() + 1, record.len())?;
        rows.push(record.get(0).unwrap_or_default().to_owned());
        values.push(parse_numbers(line, &record, 1)?);
    }
    Ok(DataTable {
        columns,
        rows,
        values,
    })
}

/// Writes `matrix` as a distance table headed by `names`.
///
/// The output can be fed back to [`read_distance_table`].
///
/// # Errors
/// Returns [`io::Error`] if writing fails.
pub fn write_distance_table(
    names: &[String],
    matrix: &[Vec<f64>],
    writer: impl Write,
) -> io::Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .from_writer(writer);
    writer.write_record(names)?;
    for row in matrix {
        writer.write_record(row.iter().map(f64::to_string))?;
    }
    writer.flush()
}

fn content_records(
    reader: impl Read,
) -> impl Iterator<Item = Result<StringRecord, TsvError>> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader)
        .into_records()
        .filter_map(|record| match record {
            Ok(record) if record.iter().all(|cell| cell.trim().is_empty()) => None,
            Ok(record) => Some(Ok(record)),
            Err(err) => Some(Err(TsvError::Read(err))),
        })
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, Position::line)
}

fn expect_cells(line: u64, expected: usize, found: usize) -> Result<(), TsvError> {
    if expected == found {
        Ok(())
    } else {
        Err(TsvError::Ragged {
            line,
            expected,
            found,
        })
    }
}

/// Parses every cell from index `skip` onwards, reporting one-based columns.
fn parse_numbers(line: u64, record: &StringRecord, skip: usize) -> Result<Vec<f64>, TsvError> {
    record
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(index, cell)| {
            cell.trim()
                .parse::<f64>()
                .map_err(|_| TsvError::InvalidNumber {
                    line,
                    column: index + 1,
                    value: cell.to_owned(),
                })
        })
        .collect()
}
