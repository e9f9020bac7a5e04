use crate::cli::Command;
use crate::config::Config;
use anyhow::Context;
use iptag_index::{error_kind, ErrorKind, RangeIndex};
use iptag_primitives::{format_address, format_range, parse_address, parse_range, TaggedRange, MAX_ADDRESS};
use iptag_storage::MarkerStore;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::info;


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RangeRecord {
    pub id: String,
    pub reason: String,
    pub first: String,
    pub last: String
}


impl From<&TaggedRange> for RangeRecord {
    fn from(range: &TaggedRange) -> Self {
        Self {
            id: range.id.clone(),
            reason: range.reason.clone(),
            first: format_address(range.first),
            last: format_address(range.last)
        }
    }
}


#[derive(Debug, Clone, Deserialize)]
struct ImportRecord {
    range: String,
    reason: String,
    #[serde(default)]
    id: Option<String>
}


/// Executes text commands against a range index.
pub struct Service<S> {
    index: RangeIndex<S>,
    config: Config
}


impl<S: MarkerStore> Service<S> {
    pub fn new(store: S, config: Config) -> anyhow::Result<Self> {
        Ok(Self {
            index: RangeIndex::open(store)?,
            config
        })
    }

    pub fn index(&self) -> &RangeIndex<S> {
        &self.index
    }

    pub fn execute(&self, command: &Command, out: &mut impl Write) -> anyhow::Result<()> {
        match command {
            Command::Tag { range, reason, id } => {
                let id = self.tag(range, reason, id.as_deref())?;
                writeln!(out, "{}", id)?;
            },
            Command::Untag { range } => {
                let (first, last) = parse_range(range)?;
                let affected = self.index.untag(first, last)?;
                writeln!(out, "untagged {} range(s)", affected)?;
            },
            Command::Lookup { address } => {
                let address = parse_address(address)?;
                match self.index.get_range(address)? {
                    Some(range) => write_record(out, &range)?,
                    None => writeln!(out, "not found")?
                }
            },
            Command::List { range } => {
                let (first, last) = match range {
                    Some(range) => parse_range(range)?,
                    None => (0, MAX_ADDRESS)
                };
                let snapshot = self.index.snapshot();
                for range in snapshot.ranges_overlapping(first, last) {
                    write_record(out, &range?)?;
                }
            },
            Command::Relabel { range, reason } => {
                let (first, last) = parse_range(range)?;
                let reason = self.config.resolve_reason(reason);
                let updated = self.index.update_reasons(first, last, |_| reason.to_string())?;
                writeln!(out, "relabeled {} range(s)", updated)?;
            },
            Command::Import { file } => {
                let count = self.import_file(file)?;
                writeln!(out, "imported {} range(s)", count)?;
            },
            Command::Clear => {
                self.index.clear()?;
                writeln!(out, "cleared")?;
            },
            Command::Check => {
                let ranges = self.index.check_integrity()?;
                writeln!(out, "ok, {} range(s)", ranges)?;
            }
        }
        Ok(())
    }

    /// Tags a range given in text form, returns the id of the new range.
    pub fn tag(&self, range: &str, reason: &str, id: Option<&str>) -> anyhow::Result<String> {
        let (first, last) = parse_range(range)?;
        let reason = self.config.resolve_reason(reason);
        let id = match id {
            Some(id) => id.to_string(),
            None => uuid::Uuid::now_v7().to_string()
        };
        let replaced = self.index.tag(first, last, &id, reason)?;
        if replaced > 0 {
            info!(
                id = %id,
                range = %format_range(first, last),
                replaced,
                "tag replaced older ranges"
            );
        }
        Ok(id)
    }

    pub fn import_file(&self, file: &Path) -> anyhow::Result<usize> {
        let input = std::fs::File::open(file).with_context(|| {
            format!("failed to open {}", file.display())
        })?;
        self.import(std::io::BufReader::new(input))
    }

    /// Tags ranges read from JSON lines, in order, stopping at the first bad line.
    pub fn import(&self, input: impl BufRead) -> anyhow::Result<usize> {
        let mut count = 0;
        for (line_idx, line) in input.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue
            }
            self.import_line(&line).with_context(|| {
                format!("failed to import line {}", line_idx + 1)
            })?;
            count += 1;
        }
        info!(ranges = count, "import finished");
        Ok(count)
    }

    fn import_line(&self, line: &str) -> anyhow::Result<()> {
        let record: ImportRecord = serde_json::from_str(line)?;
        self.tag(&record.range, &record.reason, record.id.as_deref())?;
        Ok(())
    }
}


fn write_record(out: &mut impl Write, range: &TaggedRange) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, &RangeRecord::from(range))?;
    writeln!(out)?;
    Ok(())
}


/// Process exit status for a failed command.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match error_kind(err) {
        kind if kind.is_bad_input() => 2,
        ErrorKind::StoreUnavailable => 3,
        _ => 1
    }
}

