use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::PathBuf;

use crate::config::{self, MappingDocument, TimestampPolicy};
use crate::engine::Converter;
use crate::model::RawRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub input: PathBuf,
    pub mapping: Option<PathBuf>,
    pub external: bool,
    pub source: Option<String>,
    pub preserve_raw: bool,
    pub lenient: bool,
    pub ndjson: bool,
    pub output: Option<PathBuf>,
}

/// Parse `snowgraph <input> [flags]` arguments.
///
/// Supported forms:
///   snowgraph incident.json
///   snowgraph incidents.json --ndjson -o out.ndjson
///   snowgraph incident.json --mapping map.yaml --external --source servicenow
pub fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut input: Option<PathBuf> = None;
    let mut mapping: Option<PathBuf> = None;
    let mut external = false;
    let mut source: Option<String> = None;
    let mut preserve_raw = false;
    let mut lenient = false;
    let mut ndjson = false;
    let mut output: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--mapping" | "-m" => {
                i += 1;
                match args.get(i) {
                    Some(value) => mapping = Some(PathBuf::from(value)),
                    None => bail!("Missing value for --mapping flag"),
                }
            }
            "--source" | "-s" => {
                i += 1;
                match args.get(i) {
                    Some(value) => source = Some(value.clone()),
                    None => bail!("Missing value for --source flag"),
                }
            }
            "--output" | "-o" => {
                i += 1;
                match args.get(i) {
                    Some(value) => output = Some(PathBuf::from(value)),
                    None => bail!("Missing value for --output flag"),
                }
            }
            "--external" => external = true,
            "--preserve-raw" => preserve_raw = true,
            "--lenient" => lenient = true,
            "--ndjson" => ndjson = true,
            other if other.starts_with('-') => bail!("Unknown flag: {other}"),
            other => {
                if input.is_some() {
                    bail!("Only one input file is accepted, got a second: {other}");
                }
                input = Some(PathBuf::from(other));
            }
        }
        i += 1;
    }

    let Some(input) = input else {
        bail!("Usage: snowgraph <input.json> [--mapping <file>] [--external --source <tag>] [--preserve-raw] [--lenient] [--ndjson] [-o <file>]");
    };
    if external && source.is_none() {
        bail!("--external requires --source <tag>");
    }

    Ok(CliArgs {
        input,
        mapping,
        external,
        source,
        preserve_raw,
        lenient,
        ndjson,
        output,
    })
}

/// Load the mapping document, convert the input, and write the result.
pub fn run(args: CliArgs) -> Result<()> {
    let document = match &args.mapping {
        Some(path) => config::load_mapping(path)?,
        None => MappingDocument::default(),
    };

    // CLI flags win over document values
    let mut options = document.options();
    if args.preserve_raw {
        options.preserve_raw = true;
    }
    if args.lenient {
        options.timestamp_policy = TimestampPolicy::Lenient;
    }

    let converter = Converter::from_document(&document, options)?;

    let contents = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read input from {}", args.input.display()))?;
    let parsed: Value = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse JSON from {}", args.input.display()))?;

    let (records, batch_input) = match parsed {
        Value::Array(items) => {
            let records = items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    as_record(item).with_context(|| format!("Record {index} in input array"))
                })
                .collect::<Result<Vec<RawRecord>>>()?;
            (records, true)
        }
        Value::Object(map) => (vec![map], false),
        _ => bail!("Input must be a JSON object or an array of objects"),
    };
    let total = records.len();

    let batch = converter.convert_batch(&records);
    let mut failed = batch.failures.len();
    if !batch_input {
        if let Some(failure) = batch.failures.into_iter().next() {
            return Err(failure.error.into());
        }
    }

    let mut outputs: Vec<Value> = Vec::new();
    for conversion in batch.converted {
        if args.external {
            let source = args.source.as_deref().unwrap_or_default();
            match converter.convert_to_external_item(&conversion.object, source) {
                Ok(item) => outputs.push(serde_json::to_value(item)?),
                Err(err) => {
                    if !batch_input {
                        return Err(err.into());
                    }
                    failed += 1;
                    tracing::error!("external item build failed: {err}");
                }
            }
        } else {
            outputs.push(Value::from(conversion.object));
        }
    }

    if outputs.is_empty() && failed > 0 {
        bail!("All {failed} record(s) failed to convert");
    }
    if failed > 0 {
        tracing::warn!("{failed} of {total} record(s) failed to convert");
    }

    let mut body = if args.ndjson {
        outputs
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?
            .join("\n")
    } else if batch_input {
        serde_json::to_string_pretty(&Value::Array(outputs))?
    } else {
        serde_json::to_string_pretty(&outputs[0])?
    };
    body.push('\n');

    match &args.output {
        Some(path) => std::fs::write(path, &body)
            .with_context(|| format!("Failed to write output to {}", path.display()))?,
        None => print!("{body}"),
    }

    Ok(())
}

fn as_record(value: Value) -> Result<RawRecord> {
    match value {
        Value::Object(map) => Ok(map),
        other => bail!("Expected a JSON object, got {other}"),
    }
}

pub fn print_help() {
    println!("snowgraph — normalize ServiceNow incident JSON\n");
    println!("USAGE:");
    println!("  snowgraph <input.json> [flags]");
    println!();
    println!("FLAGS:");
    println!("  -m, --mapping <file>   Mapping/options document (JSON, YAML, or TOML)");
    println!("      --external         Emit external items instead of schema objects");
    println!("  -s, --source <tag>     Source tag for external items (required with --external)");
    println!("      --preserve-raw     Attach the untouched record under `raw`");
    println!("      --lenient          Downgrade per-field failures to diagnostics");
    println!("      --ndjson           One JSON object per line");
    println!("  -o, --output <file>    Write output to a file instead of stdout");
    println!();
    println!("EXAMPLES:");
    println!("  snowgraph incident.json");
    println!("  snowgraph incidents.json --ndjson -o incidents.ndjson");
    println!("  snowgraph incident.json --mapping map.yaml --external --source servicenow");
}
