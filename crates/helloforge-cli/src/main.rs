use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, Level};

use helloforge_core::fingerprint::fingerprint_record;
use helloforge_core::profile::{BrowserVersion, ProfileRegistry};
use helloforge_core::selftest::{compare_echoed, verify_template};
use helloforge_core::template::TemplateStore;

use crate::config::Config;
use crate::discovery::Discovery;
use crate::monitor::{parse_interval, Monitor};
use crate::output::OutputFormat;

mod client;
mod config;
mod discovery;
mod generate;
mod monitor;
mod output;

#[derive(Parser)]
#[command(name = "helloforge")]
#[command(about = "Generate and verify browser TLS ClientHello templates by JA3/JA4 fingerprint")]
struct Cli {
    /// Configuration file
    /// [default: ~/.config/helloforge/config.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging and raw fingerprint strings
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a template for a Chrome Stable version
    Generate {
        /// Chrome version, e.g. 120.0.6099.109 [default: latest stable]
        #[arg(long)]
        version: Option<String>,

        /// Output directory [default: templates.dir from config]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing template
        #[arg(short, long, default_value_t = false)]
        force: bool,

        /// Output format: "text" or "json"
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Rebuild a template's ClientHello and check its fingerprints
    Test {
        /// Template file
        #[arg(short, long)]
        template: PathBuf,

        /// Also send the ClientHello to a helloforge-echo server
        #[arg(short, long)]
        server: Option<String>,

        /// Output format: "text" or "json"
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Parse a captured ClientHello record and print its fingerprints
    Inspect {
        /// File holding the raw record
        file: PathBuf,

        /// The file holds hex text instead of raw bytes
        #[arg(long, default_value_t = false)]
        hex: bool,

        /// Output format: "text" or "json"
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Watch for new Chrome Stable releases
    Monitor {
        /// Check interval, e.g. 30m, 1h, 6h [default: monitor.interval from config]
        #[arg(short, long)]
        interval: Option<String>,

        /// Generate a template for each new version
        #[arg(short, long, default_value_t = false)]
        auto_generate: bool,

        /// Output directory for generated templates
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the default configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    if let Commands::Config = cli.command {
        print!("{}", Config::generate_default());
        return Ok(ExitCode::SUCCESS);
    }

    let config = Config::load_or_default(cli.config.as_deref());
    config.validate().context("Invalid configuration")?;
    let registry = ProfileRegistry::builtin();

    match cli.command {
        Commands::Generate {
            version,
            output,
            force,
            format,
        } => {
            let format = OutputFormat::parse(&format)?;
            let version = match version {
                Some(v) => v
                    .parse::<BrowserVersion>()
                    .with_context(|| format!("Invalid --version '{}'", v))?,
                None => {
                    info!("Fetching latest Chrome Stable version...");
                    Discovery::from_config(&config.discovery)?
                        .latest_stable()
                        .await?
                }
            };
            info!("Generating template for Chrome {}", version);

            let template =
                generate::build_template(&registry, &version, &config.templates.server_name)?;
            let store = TemplateStore::new(output.unwrap_or(config.templates.dir));
            let path = store
                .save(&template, force)
                .context("Failed to write template (use --force to overwrite)")?;
            output::print_generated(&template, &path, format)?;
        }

        Commands::Test {
            template,
            server,
            format,
        } => {
            let format = OutputFormat::parse(&format)?;
            let server = server.or(config.test.server);
            let timeout = Duration::from_secs(config.test.timeout_secs);
            let passed = run_test(&template, server.as_deref(), timeout, format).await?;
            if !passed {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Inspect { file, hex, format } => {
            let format = OutputFormat::parse(&format)?;
            let raw = read_capture(&file, hex)?;
            let fp = fingerprint_record(&raw)
                .with_context(|| format!("Failed to parse ClientHello in {}", file.display()))?;
            output::print_inspection(&file, &fp, format, cli.verbose)?;
        }

        Commands::Monitor {
            interval,
            auto_generate,
            output,
        } => {
            let interval = interval.unwrap_or(config.monitor.interval);
            let period = parse_interval(&interval)?;
            let store = (auto_generate || config.monitor.auto_generate)
                .then(|| TemplateStore::new(output.unwrap_or(config.templates.dir)));

            info!("Starting Chrome version monitor (interval: {})", interval);
            if let Some(store) = &store {
                info!("Auto-generate enabled (output: {})", store.dir().display());
            }
            info!("Press Ctrl+C to stop\n");

            let discovery = Discovery::from_config(&config.discovery)?;
            Monitor::new(discovery, registry, store, config.templates.server_name)
                .run(period)
                .await?;
        }

        Commands::Config => {}
    }

    Ok(ExitCode::SUCCESS)
}

/// Local self-test, then the echo server when one is configured. Returns
/// whether every check matched.
async fn run_test(
    path: &Path,
    server: Option<&str>,
    timeout: Duration,
    format: OutputFormat,
) -> Result<bool> {
    let template = TemplateStore::load(path)
        .with_context(|| format!("Failed to read template {}", path.display()))?;

    let local = verify_template(&template)
        .with_context(|| format!("Failed to rebuild ClientHello from {}", path.display()))?;
    output::print_verification(&template, "local", &local, format)?;
    let mut passed = local.passed();

    if let Some(addr) = server {
        let record = template.client_hello_bytes()?;
        let echoed = client::echo_fingerprints(addr, &record, timeout).await?;
        debug!("server JA3 raw: {}", echoed.ja3_raw);

        let remote = compare_echoed(&template, &echoed.ja3, &echoed.ja3_raw, &echoed.ja4)?;
        output::print_verification(&template, addr, &remote, format)?;
        passed &= remote.passed();
    }

    Ok(passed)
}

/// Raw record bytes, or hex text with whitespace ignored.
fn read_capture(path: &Path, is_hex: bool) -> Result<Vec<u8>> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if !is_hex {
        return Ok(data);
    }
    let text: String = String::from_utf8(data)
        .context("Hex input is not UTF-8")?
        .split_whitespace()
        .collect();
    hex::decode(text.trim_start_matches("0x")).context("Invalid hex input")
}
