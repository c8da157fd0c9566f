//! Command-line interface for `jsondiff`.
//!
//! Diffs two JSON (or YAML) documents into an RFC 6902 patch, applies a
//! patch to a document, or prints the inverse of a diff. Logging goes to
//! STDERR and is controlled by the `JSONDIFF_LOG` environment variable.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use jsondiff_core::{DiffOptions, Node, Patch};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "JSONDIFF_LOG";

const EXAMPLES: &str = r#"Examples:
  jsondiff a.json b.json
  cat b.json | jsondiff a.json
  jsondiff --factorize --invertible a.json b.json
  jsondiff -o patch.json a.json b.json; jsondiff -p patch.json a.json
  jsondiff --opts '{"rationalize":true,"ignores":["/meta"]}' a.json b.json"#;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "jsondiff",
    version,
    about = "Diff and patch JSON and YAML documents using RFC 6902 JSON Patch.",
    long_about = "Prints the JSON Patch turning FILE1 into FILE2 to STDOUT.\n\
                  When FILE2 is omitted the second input is read from STDIN.\n\
                  When patching (-p) FILE1 is a patch.",
    after_help = EXAMPLES,
    override_usage = "jsondiff [OPTION]... FILE1 [FILE2]"
)]
struct Cli {
    /// Collapse remove/add pairs into moves and reuse unchanged values with copies.
    #[arg(long = "factorize", action = ArgAction::SetTrue)]
    factorize: bool,

    /// Replace a subtree's operations with one replace when that is shorter.
    #[arg(long = "rationalize", action = ArgAction::SetTrue)]
    rationalize: bool,

    /// Guard destructive operations with tests and never emit copies.
    #[arg(long = "invertible", action = ArgAction::SetTrue)]
    invertible: bool,

    /// Treat arrays holding the same elements in any order as equal.
    #[arg(long = "equivalent", action = ArgAction::SetTrue)]
    equivalent: bool,

    /// JSON Pointer to leave out of the comparison. May be repeated.
    #[arg(long = "ignore", value_name = "POINTER")]
    ignore: Vec<String>,

    /// JSON-encoded diff options, combined with the flags above.
    #[arg(long = "opts", value_name = "JSON")]
    opts: Option<String>,

    /// Read and write YAML instead of JSON.
    #[arg(long = "yaml", action = ArgAction::SetTrue)]
    yaml: bool,

    /// Pretty-print JSON output.
    #[arg(long = "pretty", action = ArgAction::SetTrue)]
    pretty: bool,

    /// Write output to FILE instead of STDOUT.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Apply patch FILE1 to FILE2 or STDIN.
    #[arg(short = 'p', long = "patch", action = ArgAction::SetTrue, conflicts_with = "invert")]
    patch: bool,

    /// Print the patch that turns FILE2 back into FILE1.
    #[arg(long = "invert", action = ArgAction::SetTrue)]
    invert: bool,

    /// Format of log lines written to STDERR.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Positional inputs (FILE1 \[FILE2]).
    #[arg(required = true, num_args = 1..=2, value_name = "FILE")]
    inputs: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let _ = writeln!(io::stderr(), "{err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

fn run(cli: &Cli) -> Result<i32> {
    let (first, second) = match cli.inputs.as_slice() {
        [first] => (InputSource::File(first.clone()), InputSource::Stdin),
        [first, second] => (InputSource::File(first.clone()), InputSource::File(second.clone())),
        _ => bail!("expected FILE1 [FILE2]"),
    };
    let first_text = read_input(&first)?;
    let second_text = read_input(&second)?;

    if cli.patch {
        return run_patch(cli, &first_text, &second_text);
    }

    let source = parse_node(&first_text, cli.yaml).context("failed to parse first input")?;
    let target = parse_node(&second_text, cli.yaml).context("failed to parse second input")?;
    let options = build_options(cli)?;
    debug!(options = %options, "diffing documents");

    let mut patch = source.diff(&target, &options).context("failed to compute diff")?;
    if cli.invert {
        patch = patch.invert(&source).context("failed to invert diff")?;
    }
    info!(operations = patch.len(), "computed patch");

    write_output(cli, &render_patch(cli, &patch)?)?;
    Ok(if patch.is_empty() { 0 } else { 1 })
}

fn run_patch(cli: &Cli, patch_text: &str, document_text: &str) -> Result<i32> {
    let patch: Patch = if cli.yaml {
        serde_yaml::from_str(patch_text).context("failed to parse patch")?
    } else {
        serde_json::from_str(patch_text).context("failed to parse patch")?
    };
    let document = parse_node(document_text, cli.yaml).context("failed to parse document")?;
    let patched = document.apply_patch(&patch).context("failed to apply patch")?;
    info!(operations = patch.len(), "applied patch");

    let rendered = if cli.yaml {
        serde_yaml::to_string(&patched).context("failed to serialize YAML")?
    } else if cli.pretty {
        serde_json::to_string_pretty(&patched).context("failed to serialize JSON")?
    } else {
        patched.to_json_string()
    };
    write_output(cli, &rendered)?;
    Ok(0)
}

#[derive(Debug)]
enum InputSource {
    File(PathBuf),
    Stdin,
}

fn read_input(source: &InputSource) -> Result<String> {
    match source {
        InputSource::File(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        InputSource::Stdin => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).context("failed to read STDIN")?;
            Ok(buffer)
        }
    }
}

fn parse_node(input: &str, yaml: bool) -> Result<Node> {
    if yaml {
        Node::from_yaml_str(input).map_err(|err| anyhow!(err))
    } else {
        Node::from_json_str(input).map_err(|err| anyhow!(err))
    }
}

fn build_options(cli: &Cli) -> Result<DiffOptions> {
    let flags = DiffOptions::default()
        .with_factorize(cli.factorize)
        .with_rationalize(cli.rationalize)
        .with_invertible(cli.invertible)
        .with_equivalent(cli.equivalent)
        .with_ignores(&cli.ignore)
        .context("invalid --ignore pointer")?;
    match &cli.opts {
        Some(raw) => Ok(flags.merged_with(&parse_opts_json(raw)?)),
        None => Ok(flags),
    }
}

fn parse_opts_json(raw: &str) -> Result<DiffOptions> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("--opts requires a JSON object");
    }
    serde_json::from_str(trimmed).with_context(|| format!("failed to parse --opts JSON: {trimmed}"))
}

fn render_patch(cli: &Cli, patch: &Patch) -> Result<String> {
    if cli.yaml {
        return serde_yaml::to_string(patch).context("failed to serialize YAML");
    }
    let rendered = if cli.pretty { patch.to_json_string_pretty() } else { patch.to_json_string() };
    rendered.context("failed to render JSON Patch")
}

fn write_output(cli: &Cli, rendered: &str) -> Result<()> {
    if let Some(path) = &cli.output {
        fs::write(path, rendered.as_bytes())
            .with_context(|| format!("failed to write output to {}", path.display()))?;
    } else {
        print!("{rendered}");
        io::stdout().flush().ok();
    }
    Ok(())
}
