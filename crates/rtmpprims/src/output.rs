use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use rtmpprims_chunk::{channel_name, HeaderForm, Message};
use rtmpprims_command::Command;
use serde::Serialize;

use crate::convert::amf_to_json;
use crate::hex::encode_hex;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One reassembled message and, for command messages, its decoded command.
pub struct Decoded {
    pub message: Message,
    pub command: Option<Result<Command, String>>,
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    index: usize,
    channel_id: u32,
    channel_name: &'a str,
    message_stream_id: u32,
    timestamp: u32,
    message_type: String,
    body_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<CommandOutput<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

#[derive(Serialize)]
struct CommandOutput<'a> {
    name: &'a str,
    transaction_id: i32,
    arguments: Vec<serde_json::Value>,
}

impl<'a> MessageOutput<'a> {
    fn new(index: usize, decoded: &'a Decoded) -> Self {
        let header = &decoded.message.header;
        let (command, error) = match &decoded.command {
            Some(Ok(command)) => (
                Some(CommandOutput {
                    name: &command.name,
                    transaction_id: command.transaction_id,
                    arguments: command.arguments.iter().map(amf_to_json).collect(),
                }),
                None,
            ),
            Some(Err(err)) => (None, Some(err.as_str())),
            None => (None, None),
        };
        Self {
            index,
            channel_id: header.channel_id,
            channel_name: channel_name(header.channel_id),
            message_stream_id: header.message_stream_id,
            timestamp: header.timestamp,
            message_type: header.message_type.to_string(),
            body_len: decoded.message.body.len(),
            command,
            error,
        }
    }

    fn summary(&self) -> String {
        match (&self.command, self.error) {
            (Some(command), _) => format!(
                "{}({}) {}",
                command.name,
                command.transaction_id,
                arguments_preview(&command.arguments)
            ),
            (None, Some(error)) => format!("<error: {error}>"),
            (None, None) => format!("<{} bytes>", self.body_len),
        }
    }
}

pub fn print_decoded(messages: &[Decoded], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for (index, decoded) in messages.iter().enumerate() {
                let out = MessageOutput::new(index, decoded);
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "CHANNEL", "STREAM", "TIMESTAMP", "TYPE", "COMMAND"]);
            for (index, decoded) in messages.iter().enumerate() {
                let out = MessageOutput::new(index, decoded);
                table.add_row(vec![
                    index.to_string(),
                    format!("{} ({})", out.channel_id, out.channel_name),
                    out.message_stream_id.to_string(),
                    out.timestamp.to_string(),
                    out.message_type.clone(),
                    out.summary(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (index, decoded) in messages.iter().enumerate() {
                let out = MessageOutput::new(index, decoded);
                println!(
                    "#{index} channel={} ({}) stream={} ts={} type={} {}",
                    out.channel_id,
                    out.channel_name,
                    out.message_stream_id,
                    out.timestamp,
                    out.message_type,
                    out.summary()
                );
            }
        }
        OutputFormat::Raw => {
            for decoded in messages {
                print_raw(decoded.message.body.as_ref());
            }
        }
    }
}

/// One command as written by `encode`.
pub struct Encoded {
    pub command: Command,
    pub form: HeaderForm,
    pub bytes: usize,
}

#[derive(Serialize)]
struct EncodedCommandOutput<'a> {
    name: &'a str,
    transaction_id: i32,
    channel_id: u32,
    message_stream_id: u32,
    header: &'a str,
    bytes: usize,
}

#[derive(Serialize)]
struct EncodeOutput<'a> {
    commands: Vec<EncodedCommandOutput<'a>>,
    total_bytes: usize,
    hex: String,
}

fn form_name(form: HeaderForm) -> &'static str {
    match form {
        HeaderForm::Full => "full",
        HeaderForm::Compressed => "compressed",
    }
}

pub fn print_encoded(encoded: &[Encoded], wire: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EncodeOutput {
                commands: encoded
                    .iter()
                    .map(|item| EncodedCommandOutput {
                        name: &item.command.name,
                        transaction_id: item.command.transaction_id,
                        channel_id: item.command.channel_id,
                        message_stream_id: item.command.message_stream_id,
                        header: form_name(item.form),
                        bytes: item.bytes,
                    })
                    .collect(),
                total_bytes: wire.len(),
                hex: encode_hex(wire),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "TRANSACTION", "CHANNEL", "HEADER", "BYTES"]);
            for item in encoded {
                table.add_row(vec![
                    item.command.name.clone(),
                    item.command.transaction_id.to_string(),
                    item.command.channel_id.to_string(),
                    form_name(item.form).to_string(),
                    item.bytes.to_string(),
                ]);
            }
            println!("{table}");
            println!("{}", encode_hex(wire));
        }
        OutputFormat::Pretty => {
            for item in encoded {
                println!(
                    "{} header={} bytes={}",
                    item.command,
                    form_name(item.form),
                    item.bytes
                );
            }
            println!("{}", encode_hex(wire));
        }
        OutputFormat::Raw => print_raw(wire),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn arguments_preview(arguments: &[serde_json::Value]) -> String {
    serde_json::to_string(arguments).unwrap_or_else(|_| "[]".to_string())
}
