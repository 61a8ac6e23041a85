// Idiomatic Rust CLI for CMF.
//
// `dump` prints the tokens of a CMF buffer, `encode` builds a CMF buffer
// from a JSON token list, `config` prints codec constants.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use serde_json::json;

use crate::message::Message;
use crate::wire::decoder::MessageParser;
use crate::wire::header::{ESCAPE_TAG, ValueType};
use crate::wire::value::{Token, Value};
use crate::wire::varint::MAX_VARINT_LEN;

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// CMF compact message format tool.
#[derive(Parser, Debug)]
#[command(
    name = "cmf",
    version,
    about = "Inspect and build CMF tag-value buffers",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the tokens of a CMF buffer.
    Dump(DumpArgs),
    /// Encode a JSON token list as a CMF buffer.
    Encode(EncodeArgs),
    /// Print build/codec details.
    Config,
}

#[derive(Args, Debug)]
struct DumpArgs {
    /// Print tokens as a JSON array instead of one per line.
    #[arg(long = "json")]
    json_output: bool,

    /// CMF input file (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Input JSON file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Dump,
    Encode,
    Config,
}

struct Options {
    command: Command,
    use_stdout: bool,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

fn resolve_options(cli: Cli) -> Options {
    let base = Options {
        command: Command::Config,
        use_stdout: false,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: false,
        input_file: None,
        output_file: None,
    };

    match cli.command {
        Cmd::Dump(args) => Options {
            command: Command::Dump,
            json_output: args.json_output,
            input_file: args.input,
            ..base
        },
        Cmd::Encode(args) => Options {
            command: Command::Encode,
            use_stdout: args.stdout,
            input_file: args.input.or(args.input_pos),
            output_file: args.output.or(args.output_pos),
            ..base
        },
        Cmd::Config => base,
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("cmf".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// JSON token mapping
// ---------------------------------------------------------------------------

/// Render a token as `{"tag", "type", "value"}`.
///
/// Numbers are written as their wire magnitude; the type carries the sign.
pub fn token_to_json(token: &Token) -> serde_json::Value {
    let value = match &token.value {
        Value::Positive(m) | Value::Negative(m) => json!(m),
        Value::String(s) => json!(s),
        Value::Bytes(b) => json!(b),
        Value::Bool(b) => json!(b),
        Value::Double(d) => json!(d),
        Value::Unsupported(_) => serde_json::Value::Null,
    };
    match token.value_type() {
        Some(t) => json!({ "tag": token.tag, "type": t.name(), "value": value }),
        None => json!({
            "tag": token.tag,
            "type": "Unsupported",
            "wire_type": token.value.wire_type(),
            "value": value,
        }),
    }
}

/// Parse a token from its JSON form.
///
/// `type` may be omitted, in which case it is inferred from the JSON shape
/// of `value`: integers by sign, other numbers as doubles, strings, booleans,
/// and arrays of byte values.
pub fn token_from_json(obj: &serde_json::Value) -> Result<Token, String> {
    let tag = obj
        .get("tag")
        .and_then(serde_json::Value::as_u64)
        .ok_or("missing or invalid \"tag\"")?;
    let raw = obj.get("value").unwrap_or(&serde_json::Value::Null);

    let value = match obj.get("type").and_then(serde_json::Value::as_str) {
        Some(name) => typed_value(name.parse::<ValueType>()?, raw)?,
        None => inferred_value(raw)?,
    };
    Ok(Token { tag, value })
}

fn typed_value(value_type: ValueType, raw: &serde_json::Value) -> Result<Value, String> {
    let bad = || format!("value {raw} is not valid for type {value_type}");
    let value = match value_type {
        ValueType::PositiveNumber => Value::Positive(raw.as_u64().ok_or_else(bad)?),
        ValueType::NegativeNumber => match (raw.as_u64(), raw.as_i64()) {
            (Some(m), _) => Value::Negative(m),
            (None, Some(n)) => Value::Negative(n.unsigned_abs()),
            _ => return Err(bad()),
        },
        ValueType::String => Value::String(raw.as_str().ok_or_else(bad)?.to_owned()),
        ValueType::ByteArray => Value::Bytes(json_bytes(raw).ok_or_else(bad)?),
        ValueType::BoolTrue | ValueType::BoolFalse => {
            let flag = value_type == ValueType::BoolTrue;
            if !(raw.is_null() || raw.as_bool() == Some(flag)) {
                return Err(bad());
            }
            Value::Bool(flag)
        }
        ValueType::Double => Value::Double(raw.as_f64().ok_or_else(bad)?),
    };
    Ok(value)
}

fn inferred_value(raw: &serde_json::Value) -> Result<Value, String> {
    use serde_json::Value as J;
    match raw {
        J::Null => Err("cannot infer a type for a null value".into()),
        J::Bool(b) => Ok(Value::Bool(*b)),
        J::Number(n) => Ok(match (n.as_u64(), n.as_i64(), n.as_f64()) {
            (Some(m), _, _) => Value::Positive(m),
            (None, Some(i), _) => Value::from(i),
            (None, None, Some(d)) => Value::Double(d),
            _ => return Err(format!("unrepresentable number {n}")),
        }),
        J::String(s) => Ok(Value::String(s.clone())),
        J::Array(_) => json_bytes(raw)
            .map(Value::Bytes)
            .ok_or_else(|| format!("array {raw} is not a list of byte values")),
        J::Object(_) => Err("cannot infer a type for an object value".into()),
    }
}

fn json_bytes(raw: &serde_json::Value) -> Option<Vec<u8>> {
    raw.as_array()?
        .iter()
        .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect()
}

// ---------------------------------------------------------------------------
// I/O helpers
// ---------------------------------------------------------------------------

fn read_input(path: Option<&Path>) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    match path {
        Some(path) => {
            BufReader::with_capacity(BUF_SIZE, File::open(path)?).read_to_end(&mut data)?;
        }
        None => {
            io::stdin().lock().read_to_end(&mut data)?;
        }
    }
    Ok(data)
}

fn input_name(path: Option<&Path>) -> String {
    path.map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string())
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("cmf version {version} (Rust)");
    eprintln!("VALUE_TYPES={}", ValueType::ALL.len());
    eprintln!("ESCAPE_TAG={ESCAPE_TAG}");
    eprintln!("MAX_VARINT_LEN={MAX_VARINT_LEN}");
    eprintln!("sizeof(usize)={}", std::mem::size_of::<usize>());
    0
}

// ---------------------------------------------------------------------------
// Dump command
// ---------------------------------------------------------------------------

fn cmd_dump(opts: &Options) -> i32 {
    let path = opts.input_file.as_deref();
    let data = match read_input(path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("cmf: input file: {}: {e}", input_name(path));
            return 1;
        }
    };

    let stdout = io::stdout();
    let mut out = BufWriter::with_capacity(BUF_SIZE, stdout.lock());
    let mut parser = MessageParser::new(&data);
    let mut tokens = Vec::new();
    let mut count = 0usize;
    let mut failure = None;

    loop {
        let offset = parser.position();
        match parser.next_token() {
            Ok(Some(token)) => {
                count += 1;
                if opts.json_output {
                    tokens.push(token_to_json(&token));
                } else {
                    let line = if opts.verbose > 0 {
                        writeln!(out, "{offset:>8}  {token}")
                    } else {
                        writeln!(out, "{token}")
                    };
                    if let Err(e) = line {
                        eprintln!("cmf: dump: write: {e}");
                        return 1;
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    if opts.json_output {
        let rendered = serde_json::to_string_pretty(&serde_json::Value::Array(tokens));
        let written = rendered
            .map_err(io::Error::other)
            .and_then(|s| writeln!(out, "{s}"));
        if let Err(e) = written {
            eprintln!("cmf: dump: write: {e}");
            return 1;
        }
    }
    if let Err(e) = out.flush() {
        eprintln!("cmf: dump: write flush error: {e}");
        return 1;
    }

    if let Some(e) = failure {
        eprintln!("cmf: decode error: {e}");
        return 1;
    }
    if opts.verbose > 0 && !opts.quiet {
        eprintln!("cmf: dump: {count} tokens, {} bytes", data.len());
    }
    0
}

// ---------------------------------------------------------------------------
// Encode command
// ---------------------------------------------------------------------------

fn cmd_encode(opts: &Options) -> i32 {
    let path = opts.input_file.as_deref();
    let text = match read_input(path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("cmf: input file: {}: {e}", input_name(path));
            return 1;
        }
    };

    let parsed: serde_json::Value = match serde_json::from_slice(&text) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("cmf: {}: invalid JSON: {e}", input_name(path));
            return 1;
        }
    };
    let Some(items) = parsed.as_array() else {
        eprintln!("cmf: {}: expected a JSON array of tokens", input_name(path));
        return 1;
    };

    let mut message = Message::new();
    for (i, item) in items.iter().enumerate() {
        match token_from_json(item) {
            Ok(token) => message.push(token),
            Err(e) => {
                eprintln!("cmf: token {i}: {e}");
                return 1;
            }
        }
    }

    let encoded = match message.to_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("cmf: encode error: {e}");
            return 1;
        }
    };

    let mut writer: Box<dyn Write> = match (opts.use_stdout, &opts.output_file) {
        (true, _) | (_, None) => Box::new(BufWriter::with_capacity(BUF_SIZE, io::stdout().lock())),
        (false, Some(path)) => {
            if path.exists() && !opts.force {
                eprintln!(
                    "cmf: output file exists, use -f to overwrite: {}",
                    path.display()
                );
                return 1;
            }
            match File::create(path) {
                Ok(f) => Box::new(BufWriter::with_capacity(BUF_SIZE, f)),
                Err(e) => {
                    eprintln!("cmf: output file: {}: {e}", path.display());
                    return 1;
                }
            }
        }
    };

    if let Err(e) = writer.write_all(&encoded).and_then(|()| writer.flush()) {
        eprintln!("cmf: encode: write: {e}");
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "cmf: encode: {} tokens, output {} bytes",
            message.len(),
            encoded.len()
        );
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();
    let opts = resolve_options(cli);
    log::debug!("cmf: running {:?}", opts.command);

    let exit_code = match opts.command {
        Command::Dump => cmd_dump(&opts),
        Command::Encode => cmd_encode(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
