//! Append-only score log, one `date, player, seconds` line per won game.

use chrono::NaiveDate;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use thiserror::Error;

/// Day-first date format of the log.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

const SEPARATOR: &str = ", ";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordParseError {
    #[error("expected 3 fields, found {0}")]
    FieldCount(usize),
    #[error("invalid date {0:?}")]
    Date(String),
    #[error("invalid elapsed seconds {0:?}")]
    Seconds(String),
}

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Could not access score log")]
    Io(#[from] std::io::Error),
    #[error("Malformed score on line {line}")]
    Malformed {
        line: usize,
        #[source]
        source: RecordParseError,
    },
    #[error("Player name {0:?} cannot be stored in the score log")]
    InvalidPlayerName(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub date: NaiveDate,
    pub player: String,
    pub elapsed_secs: u32,
}

impl ScoreRecord {
    fn check_player(&self) -> Result<(), ScoreError> {
        let player = self.player.as_str();
        if player.contains(SEPARATOR) || player.contains(['\n', '\r']) {
            Err(ScoreError::InvalidPlayerName(self.player.clone()))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for ScoreRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.date.format(DATE_FORMAT),
            self.player,
            self.elapsed_secs
        )
    }
}

impl FromStr for ScoreRecord {
    type Err = RecordParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.trim_end().split(SEPARATOR).collect();
        let [date, player, elapsed_secs] = fields.as_slice() else {
            return Err(RecordParseError::FieldCount(fields.len()));
        };

        let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|_| RecordParseError::Date(date.to_string()))?;
        let elapsed_secs = elapsed_secs
            .parse()
            .map_err(|_| RecordParseError::Seconds(elapsed_secs.to_string()))?;

        Ok(Self {
            date,
            player: player.to_string(),
            elapsed_secs,
        })
    }
}

/// Writes one newline-terminated record.
pub fn append_record<W: Write + ?Sized>(
    writer: &mut W,
    record: &ScoreRecord,
) -> Result<(), ScoreError> {
    record.check_player()?;
    writeln!(writer, "{record}")?;
    log::debug!("Appended score: {}", record);
    Ok(())
}

/// Reads every record of a log, fastest first.
pub fn read_leaderboard<R: BufRead>(reader: R) -> Result<Leaderboard, ScoreError> {
    let mut entries = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = line.parse().map_err(|source| ScoreError::Malformed {
            line: index + 1,
            source,
        })?;
        entries.push(record);
    }
    log::trace!("Read {} scores", entries.len());
    Ok(Leaderboard::from_records(entries))
}

/// Records sorted ascending by elapsed seconds; ties keep log order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<ScoreRecord>,
}

impl Leaderboard {
    pub fn from_records(mut entries: Vec<ScoreRecord>) -> Self {
        entries.sort_by_key(|record| record.elapsed_secs);
        Self { entries }
    }

    pub fn insert(&mut self, record: ScoreRecord) {
        let at = self
            .entries
            .partition_point(|entry| entry.elapsed_secs <= record.elapsed_secs);
        self.entries.insert(at, record);
    }

    /// The `n` fastest entries, fewer if the log is shorter.
    pub fn top(&self, n: usize) -> &[ScoreRecord] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn entries(&self) -> &[ScoreRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
