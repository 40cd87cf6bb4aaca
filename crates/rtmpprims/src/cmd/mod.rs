use clap::{Args, Subcommand};
use std::path::PathBuf;

use rtmpprims_chunk::{DEFAULT_CHUNK_SIZE, OVER_CONNECTION};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a chunk stream and print every message it carries.
    Decode(DecodeArgs),
    /// Encode commands into a chunk stream over one channel history.
    Encode(EncodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Binary chunk stream to read. Reads stdin when omitted or `-`.
    #[arg(conflicts_with = "hex")]
    pub file: Option<PathBuf>,
    /// Hex-encoded chunk stream instead of a file.
    #[arg(long)]
    pub hex: Option<String>,
    /// Inbound chunk size the stream starts with.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Command name.
    #[arg(long, short = 'n', required_unless_present = "file", conflicts_with = "file")]
    pub name: Option<String>,
    /// Transaction id.
    #[arg(long, short = 't', default_value_t = 0, allow_negative_numbers = true)]
    pub transaction: i32,
    /// Arguments as a JSON array, e.g. '[{"app":"live"}]'.
    #[arg(long, conflicts_with = "file")]
    pub args: Option<String>,
    /// Chunk stream (channel) id.
    #[arg(long, short = 'c', default_value_t = OVER_CONNECTION)]
    pub channel: u32,
    /// Message stream id.
    #[arg(long, default_value_t = 0)]
    pub stream: u32,
    /// Message timestamp in milliseconds.
    #[arg(long, default_value_t = 0)]
    pub timestamp: u32,
    /// JSON file with one command object or an array of them.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Outbound chunk size.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
