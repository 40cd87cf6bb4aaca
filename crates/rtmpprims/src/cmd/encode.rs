use std::fs;

use rtmpprims_chunk::OVER_CONNECTION;
use rtmpprims_command::{Command, CommandWriter};
use serde::Deserialize;
use serde_json::Value as Json;

use crate::cmd::EncodeArgs;
use crate::convert::json_to_amf;
use crate::exit::{command_error, io_error, CliError, CliResult, SUCCESS};
use crate::output::{print_encoded, Encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let commands = resolve_commands(&args)?;

    let mut writer = CommandWriter::new(Vec::<u8>::new());
    writer
        .set_chunk_size(args.chunk_size)
        .map_err(|err| command_error("invalid --chunk-size", err))?;

    let mut encoded = Vec::with_capacity(commands.len());
    for command in commands {
        let form = writer.next_form(&command);
        let bytes = writer
            .send(&command)
            .map_err(|err| command_error(&format!("encoding {} failed", command.name), err))?;
        encoded.push(Encoded {
            command,
            form,
            bytes,
        });
    }

    print_encoded(&encoded, &writer.into_inner(), format);
    Ok(SUCCESS)
}

/// One command in an `--file` document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandSpec {
    name: String,
    #[serde(default, alias = "transaction_id")]
    transaction: i32,
    #[serde(default)]
    args: Vec<Json>,
    #[serde(default = "default_channel")]
    channel: u32,
    #[serde(default)]
    stream: u32,
    #[serde(default)]
    timestamp: u32,
}

fn default_channel() -> u32 {
    OVER_CONNECTION
}

impl CommandSpec {
    fn into_command(self) -> CliResult<Command> {
        if self.name.is_empty() {
            return Err(CliError::usage("command name must not be empty"));
        }
        Ok(Command::new(self.name, self.transaction)
            .on_channel(self.channel)
            .on_stream(self.stream)
            .at_timestamp(self.timestamp)
            .with_arguments(self.args.iter().map(json_to_amf)))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CommandFile {
    Many(Vec<CommandSpec>),
    One(CommandSpec),
}

fn resolve_commands(args: &EncodeArgs) -> CliResult<Vec<Command>> {
    if let Some(path) = &args.file {
        let text = fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        return parse_command_file(&text);
    }

    let spec = CommandSpec {
        name: args.name.clone().unwrap_or_default(),
        transaction: args.transaction,
        args: parse_arguments(args.args.as_deref())?,
        channel: args.channel,
        stream: args.stream,
        timestamp: args.timestamp,
    };
    Ok(vec![spec.into_command()?])
}

fn parse_command_file(text: &str) -> CliResult<Vec<Command>> {
    let file: CommandFile = serde_json::from_str(text)
        .map_err(|err| CliError::usage(format!("command file is not valid: {err}")))?;
    let specs = match file {
        CommandFile::Many(specs) => specs,
        CommandFile::One(spec) => vec![spec],
    };
    specs.into_iter().map(CommandSpec::into_command).collect()
}

fn parse_arguments(raw: Option<&str>) -> CliResult<Vec<Json>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    match serde_json::from_str::<Json>(raw) {
        Ok(Json::Array(items)) => Ok(items),
        Ok(_) => Err(CliError::usage("--args must be a JSON array")),
        Err(err) => Err(CliError::usage(format!("--args is not valid JSON: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use rtmpprims_amf::Value;

    use super::*;
    use crate::exit::USAGE;

    #[test]
    fn file_accepts_single_object_and_array() {
        let one = parse_command_file(r#"{"name": "connect", "transaction": 1}"#).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].channel_id, OVER_CONNECTION);

        let many = parse_command_file(
            r#"[
                {"name": "connect", "transaction_id": 1, "args": [{"app": "live"}]},
                {"name": "play", "channel": 8, "stream": 1, "args": [null, "key"]}
            ]"#,
        )
        .unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[0].transaction_id, 1);
        assert_eq!(
            many[1].arguments,
            vec![Value::Null, Value::text("key")]
        );
        assert_eq!((many[1].channel_id, many[1].message_stream_id), (8, 1));
    }

    #[test]
    fn file_rejects_unknown_fields_and_empty_names() {
        let err = parse_command_file(r#"{"name": "x", "bogus": 1}"#).unwrap_err();
        assert_eq!(err.code, USAGE);
        let err = parse_command_file(r#"{"name": ""}"#).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn args_must_be_an_array() {
        assert!(parse_arguments(None).unwrap().is_empty());
        assert_eq!(parse_arguments(Some("[1, true]")).unwrap().len(), 2);
        assert_eq!(parse_arguments(Some("{}")).unwrap_err().code, USAGE);
        assert_eq!(parse_arguments(Some("[")).unwrap_err().code, USAGE);
    }
}
