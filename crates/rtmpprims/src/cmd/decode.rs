use std::fs;
use std::io::Read;

use bytes::BytesMut;
use rtmpprims_chunk::{ChunkDecoder, ChunkError};
use rtmpprims_command::Command;
use tracing::{debug, warn};

use crate::cmd::DecodeArgs;
use crate::exit::{chunk_error, io_error, CliResult, DATA_INVALID, SUCCESS};
use crate::hex::decode_hex;
use crate::output::{print_decoded, Decoded, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = read_input(&args)?;
    let mut decoder = ChunkDecoder::new();
    decoder
        .set_chunk_size(args.chunk_size)
        .map_err(|err| chunk_error("invalid --chunk-size", err))?;

    let mut src = BytesMut::from(input.as_slice());
    let messages =
        decode_stream(&mut decoder, &mut src).map_err(|err| chunk_error("decode failed", err))?;
    print_decoded(&messages, format);
    Ok(stream_status(&decoder, &src, &messages))
}

/// Exit code for a decoded input: invalid if it ended inside a chunk or a
/// message, or if any command failed to decode.
fn stream_status(decoder: &ChunkDecoder, rest: &BytesMut, messages: &[Decoded]) -> i32 {
    if !rest.is_empty() {
        warn!(remaining = rest.len(), "input ends inside an incomplete chunk");
        return DATA_INVALID;
    }
    if decoder.has_partial() {
        warn!("input ends inside an incomplete message");
        return DATA_INVALID;
    }
    if messages
        .iter()
        .any(|decoded| matches!(decoded.command, Some(Err(_))))
    {
        return DATA_INVALID;
    }
    SUCCESS
}

fn read_input(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    if let Some(hex) = &args.hex {
        return decode_hex(hex);
    }
    match &args.file {
        Some(path) if path.as_os_str() != "-" => fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err)),
        _ => {
            let mut input = Vec::new();
            std::io::stdin()
                .read_to_end(&mut input)
                .map_err(|err| io_error("failed reading stdin", err))?;
            Ok(input)
        }
    }
}

/// Reassemble every complete message in `src`. Command messages are decoded;
/// a command that fails to decode is reported alongside the others.
pub fn decode_stream(
    decoder: &mut ChunkDecoder,
    src: &mut BytesMut,
) -> Result<Vec<Decoded>, ChunkError> {
    let mut messages = Vec::new();
    while let Some(message) = decoder.decode(src)? {
        let command = message
            .header
            .message_type
            .is_command()
            .then(|| Command::decode_message(&message).map_err(|err| err.to_string()));
        debug!(
            channel_id = message.header.channel_id,
            message_type = %message.header.message_type,
            body_len = message.body.len(),
            "decoded message"
        );
        messages.push(Decoded { message, command });
    }
    Ok(messages)
}
