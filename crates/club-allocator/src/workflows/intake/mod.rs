//! Loads request sheets and previous-session exports into an [`AllocationSession`].

mod parser;

use crate::workflows::allocation::{
    AllocationSession, HistoricalAllocations, ParseError, DEFAULT_CLUB_CAPACITY,
};
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug)]
pub enum IntakeError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { line: u64, source: ParseError },
}

impl std::fmt::Display for IntakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakeError::Io(err) => write!(f, "failed to read submissions: {}", err),
            IntakeError::Csv(err) => write!(f, "invalid submission CSV data: {}", err),
            IntakeError::Row { line, source } => {
                write!(f, "invalid submission on line {}: {}", line, source)
            }
        }
    }
}

impl std::error::Error for IntakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IntakeError::Io(err) => Some(err),
            IntakeError::Csv(err) => Some(err),
            IntakeError::Row { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for IntakeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for IntakeError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Inputs that shape a session besides the submissions themselves.
#[derive(Debug, Clone)]
pub struct IntakeOptions {
    pub default_capacity: u32,
    pub history: HistoricalAllocations,
}

impl Default for IntakeOptions {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_CLUB_CAPACITY,
            history: HistoricalAllocations::new(),
        }
    }
}

impl IntakeOptions {
    pub fn with_history(mut self, history: HistoricalAllocations) -> Self {
        self.history = history;
        self
    }
}

pub struct SubmissionImporter;

impl SubmissionImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        options: &IntakeOptions,
    ) -> Result<AllocationSession, IntakeError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, options)
    }

    /// Builds a session from every row, aborting on the first invalid one.
    pub fn from_reader<R: Read>(
        reader: R,
        options: &IntakeOptions,
    ) -> Result<AllocationSession, IntakeError> {
        let mut session = AllocationSession::new(options.default_capacity);
        let records = parser::parse_submissions(reader)?;
        let rows = records.len();

        for record in records {
            session
                .ingest(&record.row, &options.history)
                .map_err(|source| IntakeError::Row {
                    line: record.line,
                    source,
                })?;
        }

        info!(
            rows,
            pupils = session.pupils().len(),
            clubs = session.clubs().len(),
            "submissions ingested"
        );
        Ok(session)
    }
}

/// Reads a previous session's pupil export: `Name, Class, allocations..`.
pub fn load_history<R: Read>(reader: R) -> Result<HistoricalAllocations, IntakeError> {
    let history: HistoricalAllocations = parser::parse_history(reader)?.into_iter().collect();
    info!(pupils = history.len(), "historical allocations loaded");
    Ok(history)
}

pub fn load_history_from_path<P: AsRef<Path>>(
    path: P,
) -> Result<HistoricalAllocations, IntakeError> {
    let file = std::fs::File::open(path)?;
    load_history(file)
}
