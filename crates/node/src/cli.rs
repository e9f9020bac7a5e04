use clap::{Parser, Subcommand};
use std::path::PathBuf;


#[derive(Parser, Debug)]
#[command(version, about = "Tags IPv4 address ranges", long_about = None)]
pub struct CLI {
    /// Config file with database settings and reason aliases
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database directory, overrides the one from the config
    #[arg(long = "db", value_name = "DIR")]
    pub database_dir: Option<PathBuf>,

    /// Enable rocksdb stats collection
    #[arg(long)]
    pub rocksdb_stats: bool,

    #[command(subcommand)]
    pub command: Command
}


#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Tag a range, replacing whatever was tagged inside it before
    Tag {
        /// Address, CIDR block or "FIRST - LAST" span
        range: String,
        /// Reason text or a configured alias
        reason: String,
        /// Range id, a fresh UUIDv7 by default
        #[arg(long)]
        id: Option<String>
    },
    /// Remove all tags from a range
    Untag {
        range: String
    },
    /// Print the tagged range containing an address
    Lookup {
        address: String
    },
    /// Print tagged ranges, one JSON object per line
    List {
        /// Only ranges overlapping this one
        range: Option<String>
    },
    /// Set the reason of every range overlapping the given one
    Relabel {
        range: String,
        reason: String
    },
    /// Tag ranges from a file of JSON lines: {"range": .., "reason": .., "id": ..}
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf
    },
    /// Remove all tags
    Clear,
    /// Verify the stored range boundaries
    Check
}
