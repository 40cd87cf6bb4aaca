use std::fmt;
use std::io;

use rtmpprims_amf::AmfError;
use rtmpprims_chunk::ChunkError;
use rtmpprims_command::CommandError;

// Exit codes shared with the other *prims command-line tools.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn amf_error(context: &str, err: AmfError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn chunk_error(context: &str, err: ChunkError) -> CliError {
    match err {
        ChunkError::Io(source) => io_error(context, source),
        ChunkError::InvalidChunkSize(_) | ChunkError::InvalidChunkStreamId(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        ChunkError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn command_error(context: &str, err: CommandError) -> CliError {
    match err {
        CommandError::Chunk(err) => chunk_error(context, err),
        CommandError::MalformedValue(err) => amf_error(context, err),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}
