//! `tlwire-dump`: decode a TL payload against one or more schema files and
//! print the result as JSON.
//!
//! ```text
//! tlwire-dump --schema mtproto.tl:mtproto --schema api.tl [--type Updates] [--hex] <payload|->
//! ```
//!
//! Without `--type` the payload is decoded as a top-level object (RPC
//! results, errors, updates, service messages). Set `RUST_LOG=trace` to
//! follow the dispatch.

use std::io::Read;
use std::sync::Arc;

use clap::Parser;
use tlwire_codec::{Cursor, Decoder, DecoderConfig};
use tlwire_schema::{Origin, SchemaBuilder};

// ── Arguments ─────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "tlwire-dump")]
#[command(about = "Decode a TL payload against one or more schema files and print it as JSON.", long_about = None)]
struct Cli {
    /// Schema file, optionally suffixed with `:mtproto`, `:api` or `:secret`.
    #[arg(long = "schema", short = 's', required = true, value_parser = parse_schema_arg)]
    schemas: Vec<SchemaArg>,

    /// Decode as this type expression instead of a top-level object.
    #[arg(long = "type", short = 't')]
    ty: Option<String>,

    /// The payload is hex text.
    #[arg(long)]
    hex: bool,

    /// Inflated size cap for `gzip_packed`, in bytes.
    #[arg(long)]
    max_inflated: Option<usize>,

    /// Payload file, or `-` for stdin.
    payload: String,
}

#[derive(Clone, Debug, PartialEq)]
struct SchemaArg {
    path: String,
    origin: Origin,
}

fn parse_origin(name: &str) -> Result<Origin, String> {
    match name {
        "mtproto" => Ok(Origin::MtProto),
        "api" => Ok(Origin::Api),
        "secret" => Ok(Origin::Secret),
        other => Err(format!("unknown schema origin `{other}`")),
    }
}

/// `path` or `path:origin`. Files named `mtproto*.tl` default to the
/// service origin, everything else to `api`.
fn parse_schema_arg(arg: &str) -> Result<SchemaArg, String> {
    if let Some((path, origin)) = arg.rsplit_once(':') {
        if let Ok(origin) = parse_origin(origin) {
            return Ok(SchemaArg { path: path.to_owned(), origin });
        }
    }
    if arg.is_empty() {
        return Err("empty schema path".to_owned());
    }
    let file = arg.rsplit(['/', '\\']).next().unwrap_or(arg);
    let origin = if file.starts_with("mtproto") { Origin::MtProto } else { Origin::Api };
    Ok(SchemaArg { path: arg.to_owned(), origin })
}

// ── Payload ───────────────────────────────────────────────────────────────────

/// Hex text with any whitespace, as copied from a packet dump.
fn decode_hex(text: &[u8]) -> Result<Vec<u8>, hex::FromHexError> {
    let compact: Vec<u8> = text.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect();
    hex::decode(compact)
}

fn read_payload(cli: &Cli) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let raw = if cli.payload == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        buf
    } else {
        std::fs::read(&cli.payload)?
    };
    Ok(if cli.hex { decode_hex(&raw)? } else { raw })
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut builder = SchemaBuilder::new();
    for SchemaArg { path, origin } in &cli.schemas {
        let text = std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
        builder.add_source(&text, *origin).map_err(|e| format!("{path}: {e}"))?;
    }
    let schema = builder.build()?;
    log::info!("[tlwire-dump] {} constructors, layer {:?}", schema.len(), schema.layer());

    let mut config = DecoderConfig::default();
    if let Some(max) = cli.max_inflated {
        config.max_inflated_len = max;
    }
    let decoder = Decoder::new(Arc::new(schema), config)?;

    let payload = read_payload(&cli)?;
    let mut cur = Cursor::from_slice(&payload);
    let value = match &cli.ty {
        Some(ty) => decoder.decode_type(&mut cur, ty)?,
        None => decoder.decode_object_from(&mut cur)?,
    };
    if !cur.is_empty() {
        log::warn!("[tlwire-dump] {} bytes left after offset {}", cur.remaining(), cur.pos());
    }

    println!("{}", serde_json::to_string_pretty(&value.to_json())?);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        eprintln!("✗ {e}");
        std::process::exit(1);
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("tlwire-dump").chain(args.iter().copied()))
    }

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn full_command_line() {
        let cli = parse(&[
            "--schema", "tl/mtproto.tl", "-s", "tl/secret.tl:secret", "--type", "Vector<long>", "--hex", "dump.txt",
        ])
        .unwrap();
        assert_eq!(
            cli.schemas,
            vec![
                SchemaArg { path: "tl/mtproto.tl".into(), origin: Origin::MtProto },
                SchemaArg { path: "tl/secret.tl".into(), origin: Origin::Secret },
            ],
        );
        assert_eq!(cli.ty.as_deref(), Some("Vector<long>"));
        assert!(cli.hex);
        assert_eq!(cli.max_inflated, None);
        assert_eq!(cli.payload, "dump.txt");
    }

    #[test]
    fn schema_origin_defaults_to_api() {
        assert_eq!(parse_schema_arg("api.tl"), Ok(SchemaArg { path: "api.tl".into(), origin: Origin::Api }));
        assert_eq!(parse_schema_arg("C:/tl/x.tl"), Ok(SchemaArg { path: "C:/tl/x.tl".into(), origin: Origin::Api }));
    }

    #[test]
    fn max_inflated_is_numeric() {
        assert_eq!(parse(&["-s", "api.tl", "--max-inflated", "4096", "-"]).unwrap().max_inflated, Some(4096));
        assert!(parse(&["-s", "api.tl", "--max-inflated", "lots", "-"]).is_err());
    }

    #[test]
    fn missing_schema_or_payload() {
        assert!(parse(&["payload.bin"]).is_err());
        assert!(parse(&["--schema", "api.tl"]).is_err());
        assert!(parse(&["--schema", "api.tl", "a", "b"]).is_err());
        assert!(parse(&["--schema", "api.tl", "--bogus", "a"]).is_err());
    }

    #[test]
    fn hex_with_whitespace() {
        assert_eq!(decode_hex(b"15c4b51c\n 00000000\n").unwrap(), vec![0x15, 0xc4, 0xb5, 0x1c, 0, 0, 0, 0]);
        assert!(decode_hex(b"zz").is_err());
    }
}
