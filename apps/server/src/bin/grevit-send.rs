// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: send a component collection to a Grevit receiver
//!
//! Reads a collection as JSON from a file (or stdin with `-`), applies the
//! command line flags and performs the echo handshake. A flag overrides the
//! file's own `update`, `delete` or `scale`; the defaults below only fill
//! fields the file leaves out.
//!
//! Usage:
//!   grevit-send <collection.json> [options]

use std::env;
use std::io::Read;
use std::time::Duration;

use anyhow::{bail, Context};
use grevit_core::{codec, ComponentCollection};
use grevit_transport::{Sender, SenderConfig};

/// Grasshopper models are usually in meters, Revit works in feet.
const DEFAULT_SCALE: f64 = 3.28084;

#[derive(Debug)]
struct Options {
    input: String,
    config: SenderConfig,
    update: Option<bool>,
    erase: Option<bool>,
    scale: Option<f64>,
}

fn parse_args(args: &[String]) -> anyhow::Result<Options> {
    let input = match args.get(1) {
        Some(input) => input.clone(),
        None => bail!("missing <collection.json> argument"),
    };

    let mut options = Options {
        input,
        config: SenderConfig::default(),
        update: None,
        erase: None,
        scale: None,
    };

    let mut i = 2;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--host" => options.config.host = value(args, &mut i, flag)?.to_string(),
            "--port" => {
                options.config.port = value(args, &mut i, flag)?
                    .parse()
                    .context("invalid port")?
            }
            "--timeout" => {
                let ms: u64 = value(args, &mut i, flag)?
                    .parse()
                    .context("invalid timeout")?;
                options.config.timeout = Duration::from_millis(ms);
            }
            "--max-attempts" => {
                let attempts: u32 = value(args, &mut i, flag)?
                    .parse()
                    .context("invalid attempt count")?;
                options.config.max_attempts = Some(attempts);
            }
            "--scale" => {
                let scale: f64 = value(args, &mut i, flag)?
                    .parse()
                    .context("invalid scale")?;
                if !scale.is_finite() || scale <= 0.0 {
                    bail!("scale must be a positive finite number, got {scale}");
                }
                options.scale = Some(scale);
            }
            "--update" => options.update = Some(true),
            "--no-update" => options.update = Some(false),
            "--erase" => options.erase = Some(true),
            "--no-erase" => options.erase = Some(false),
            other => bail!("unknown option: {other}"),
        }
        i += 1;
    }

    Ok(options)
}

/// Advances past a flag and returns its value.
fn value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> anyhow::Result<&'a str> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .with_context(|| format!("{flag} needs a value"))
}

/// Settles `update`, `delete` and `scale`: flag first, then the file's own
/// value, then the sender default.
fn apply_flags(
    mut collection: ComponentCollection,
    text: &str,
    options: &Options,
) -> anyhow::Result<ComponentCollection> {
    let fields: serde_json::Value =
        serde_json::from_str(text).context("reading collection fields")?;
    let given = |key: &str| fields.get(key).is_some();

    collection.update = options
        .update
        .or_else(|| given("update").then_some(collection.update))
        .unwrap_or(true);
    collection.delete = options
        .erase
        .or_else(|| given("delete").then_some(collection.delete))
        .unwrap_or(false);
    collection.scale = options
        .scale
        .or_else(|| given("scale").then_some(collection.scale))
        .unwrap_or(DEFAULT_SCALE);

    Ok(collection)
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {input}"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return Ok(());
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("Error: {err:#}");
            print_usage();
            std::process::exit(1);
        }
    };

    let text = read_input(&options.input)?;
    let text = text.trim();
    let collection = codec::decode(text).with_context(|| format!("decoding {}", options.input))?;
    let collection = apply_flags(collection, text, &options)?;

    println!(
        "Sending {} components to {} (update: {}, erase: {}, scale: {})",
        collection.len(),
        options.config.address(),
        collection.update,
        collection.delete,
        collection.scale
    );

    let sender = Sender::new(options.config);
    let outcome = sender.send(&collection).await?;

    println!("Delivered after {} attempt(s)", outcome.attempts);
    match outcome.catalog {
        Some(catalog) => {
            for category in &catalog.categories {
                println!("{}", category.name);
                for family in &category.families {
                    println!("  {} ({})", family.name, family.types.join(", "));
                }
            }
        }
        None => println!("Receiver catalog could not be read"),
    }

    Ok(())
}

fn print_usage() {
    println!(
        r#"grevit-send - Send a component collection to a Grevit receiver

USAGE:
  grevit-send <collection.json> [OPTIONS]

ARGUMENTS:
  <collection.json>         Collection file, or - to read stdin

OPTIONS:
  --host <host>             Receiver host (default: 127.0.0.1)
  --port <port>             Receiver port (default: 8002)
  --timeout <ms>            Socket timeout in milliseconds (default: 10000)
  --max-attempts <n>        Give up after n mismatched echoes (default: retry forever)
  --scale <factor>          Unit factor to native units (default: 3.28084)
  --update / --no-update    Reconcile against earlier sends (default: on)
  --erase / --no-erase      Delete elements not sent again (default: off)
  -h, --help                Show this help message

Flags override the update, delete and scale fields of the input file.
Defaults apply only to fields the file leaves out.
"#
    );
}
