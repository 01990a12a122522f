use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use glob::glob;
use log::{LevelFilter, info, warn};
use snifcap_core::ipsec::scan_tunnels;
use snifcap_core::{
    ConversionError, ConvertOptions, Dialect, DumpError, LinkType, TextLineSource,
    convert_file, extract_tunnel_keys_from_file, resolve_esp_sa_path,
};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("SNIFCAP_BUILD_COMMIT"),
    ", ",
    env!("SNIFCAP_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "snifcap")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Convert firewall sniffer text dumps to pcapng and extract IPsec tunnel keys.",
    long_about = None,
    after_help = "Examples:\n  snifcap convert sniffer.txt -o sniffer.pcapng\n  snifcap convert sniffer.txt --max-packets 100000 --exclude port9\n  snifcap ipsec tunnels.txt --stdout"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a sniffer text dump into a pcapng capture.
    Convert(ConvertArgs),
    /// Append IPsec tunnel keys found in a dump to Wireshark's esp_sa table.
    Ipsec(IpsecArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Sniffer dump (a glob pattern matching exactly one file is accepted)
    input: PathBuf,

    /// Output capture path [default: <input>.pcapng]
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Only accept `0xNNNN` offsets (no tcpdump-style lines)
    #[arg(long)]
    strict: bool,

    /// Do not split ASCII columns glued to the last hex group
    #[arg(long)]
    no_normalize: bool,

    /// Abort on the first malformed packet line
    #[arg(long)]
    stop_on_error: bool,

    /// Split output into .partNNN files of at most this many packets
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    max_packets: Option<u64>,

    /// Start a new pcapng section every N packets
    #[arg(long, value_name = "N")]
    section_size: Option<usize>,

    /// Skip the first N packets that pass the interface filters
    #[arg(long, value_name = "N", default_value_t = 0)]
    skip: u64,

    /// Stop after writing N packets
    #[arg(long, value_name = "N")]
    limit: Option<u64>,

    /// Keep packets shorter than their IPv4 total length
    #[arg(long)]
    no_checks: bool,

    /// Only convert these interfaces
    #[arg(long, value_name = "IFACE", value_delimiter = ',')]
    include: Vec<String>,

    /// Never convert these interfaces
    #[arg(long, value_name = "IFACE", value_delimiter = ',')]
    exclude: Vec<String>,

    /// Point-to-point interfaces (fake Ethernet header removed)
    #[arg(long, value_name = "IFACE", value_delimiter = ',')]
    p2p: Vec<String>,

    /// Interfaces carrying raw IP without link header
    #[arg(long, value_name = "IFACE", value_delimiter = ',')]
    nolink: Vec<String>,

    /// PPP interfaces
    #[arg(long, value_name = "IFACE", value_delimiter = ',')]
    ppp: Vec<String>,

    /// Append the dump line number to every packet comment
    #[arg(long)]
    packet_line: bool,

    /// Log conversion progress
    #[arg(long)]
    progress: bool,

    /// Fail when the output file already exists
    #[arg(long)]
    no_overwrite: bool,

    /// Print the conversion summary as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct IpsecArgs {
    /// Sniffer dump containing `diagnose vpn tunnel list` output
    input: PathBuf,

    /// esp_sa file to append to [default: ~/.wireshark/esp_sa]
    #[arg(long, value_name = "PATH")]
    esp_sa: Option<PathBuf>,

    /// Print the rows instead of appending them
    #[arg(long, conflicts_with_all = ["esp_sa", "json"])]
    stdout: bool,

    /// Print the extraction summary as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Convert(args) => cmd_convert(args, cli.quiet),
        Commands::Ipsec(args) => cmd_ipsec(args, cli.quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, _) => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

/// Reported as an `error:` line, plus a `hint:` line when one applies.
#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<&'static str>,
}

impl CliError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            hint: None,
        }
    }

    fn hint(mut self, hint: &'static str) -> Self {
        self.hint = Some(hint);
        self
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"))
    }
}

impl From<ConversionError> for CliError {
    fn from(err: ConversionError) -> Self {
        let hint = match &err {
            ConversionError::OutputExists(_) => Some("remove it or drop --no-overwrite"),
            ConversionError::Source(_) | ConversionError::Dump(DumpError::Source(_)) => {
                Some("check that the dump exists and is readable")
            }
            ConversionError::Dump(DumpError::Parse(_)) => {
                Some("rerun without --stop-on-error to skip malformed lines")
            }
            ConversionError::Writer(_) => Some("check the output directory"),
            ConversionError::Encode(_) => None,
        };
        CliError {
            message: err.to_string(),
            hint,
        }
    }
}

fn cmd_convert(args: ConvertArgs, quiet: bool) -> Result<(), CliError> {
    let input = resolve_input_path(&args.input)?;
    validate_input_file(&input)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&input));
    ensure_distinct_paths(&input, &output)?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }

    let options = convert_options(&args)?;
    info!("converting {} -> {}", input.display(), output.display());
    let summary = convert_file(&input, &output, &options)?;

    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("JSON serialization failed")?;
        println!("{json}");
    }
    if !quiet {
        eprintln!(
            "OK: {} packets written -> {}",
            summary.packets_converted,
            summary.output_files.join(", ")
        );
    }
    Ok(())
}

fn convert_options(args: &ConvertArgs) -> Result<ConvertOptions, CliError> {
    let mut link_types = HashMap::new();
    let marked = [
        (&args.p2p, LinkType::Null),
        (&args.nolink, LinkType::Raw),
        (&args.ppp, LinkType::Ppp),
    ];
    for (interfaces, link_type) in marked {
        for interface in interfaces {
            if let Some(previous) = link_types.insert(interface.clone(), link_type) {
                if previous != link_type {
                    return Err(CliError::new(format!(
                        "interface '{interface}' is given more than one link type"
                    ))
                    .hint("use only one of --p2p, --nolink, --ppp per interface"));
                }
            }
        }
    }

    Ok(ConvertOptions {
        dialect: if args.strict {
            Dialect::Strict
        } else {
            Dialect::Compatible
        },
        normalize_lines: !args.no_normalize,
        stop_on_error: args.stop_on_error,
        max_packets_per_file: args.max_packets,
        section_size: args.section_size,
        skip: args.skip,
        limit: args.limit,
        check_packet_size: !args.no_checks,
        include: args.include.iter().cloned().collect::<HashSet<_>>(),
        exclude: args.exclude.iter().cloned().collect::<HashSet<_>>(),
        link_types,
        include_packet_line: args.packet_line,
        report_progress: args.progress,
        overwrite: !args.no_overwrite,
        ..ConvertOptions::default()
    })
}

fn cmd_ipsec(args: IpsecArgs, quiet: bool) -> Result<(), CliError> {
    let input = resolve_input_path(&args.input)?;
    validate_input_file(&input)?;

    if args.stdout {
        let mut source = TextLineSource::open(&input)
            .with_context(|| format!("Failed to open dump: {}", input.display()))?;
        let tunnels = scan_tunnels(&mut source)
            .with_context(|| format!("Failed to scan tunnels: {}", input.display()))?;
        let rows = tunnels.esp_sa_rows();
        let mut out = io::stdout().lock();
        for row in &rows.rows {
            writeln!(out, "{row}").context("Failed to write to stdout")?;
        }
        return Ok(());
    }

    let esp_sa = match args.esp_sa {
        Some(path) => path,
        None => match resolve_esp_sa_path() {
            Some(path) => path,
            None => {
                warn!("neither HOME nor APPDATA is set, tunnel keys not extracted");
                return Ok(());
            }
        },
    };

    let summary = extract_tunnel_keys_from_file(&input, &esp_sa).map_err(|err| {
        CliError::new(format!("tunnel key extraction failed: {err}"))
            .hint("check the dump path and that the esp_sa location is writable")
    })?;

    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("JSON serialization failed")?;
        println!("{json}");
    }
    if !quiet {
        eprintln!(
            "OK: {} esp_sa rows from {} tunnels -> {}",
            summary.rows_written,
            summary.tunnels_found,
            esp_sa.display()
        );
    }
    Ok(())
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(".pcapng");
    PathBuf::from(name)
}

fn ensure_distinct_paths(input: &Path, output: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    // The output may not exist yet; compare it once it does.
    if let Ok(output_abs) = fs::canonicalize(output) {
        if output_abs == input_abs {
            return Err(CliError::new(format!(
                "output path must differ from input: {}",
                output.display()
            ))
            .hint("choose a different output path"));
        }
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    let problem = if !input.exists() {
        "input file not found"
    } else if !input.is_file() {
        "input is not a file"
    } else {
        return Ok(());
    };
    Err(CliError::new(format!("{problem}: {}", input.display()))
        .hint("pass the text file saved from the sniffer session"))
}

/// Expand a glob pattern that must name exactly one dump.
fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let invalid = |detail: String| {
        CliError::new(format!("invalid input pattern '{pattern}': {detail}"))
            .hint("quote the pattern so the shell does not expand it")
    };
    let mut matches = Vec::new();
    for entry in glob(&pattern).map_err(|err| invalid(err.msg.to_string()))? {
        let path = entry.map_err(|err| invalid(err.to_string()))?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(CliError::new(format!("no files match pattern '{pattern}'"))
            .hint("check the path or quote the pattern")),
        count => Err(CliError::new(format!(
            "multiple files match pattern '{pattern}' ({count} matches)"
        ))
        .hint("pass a single dump file, or run once per file")),
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
