//! Domain Oracle - canonical domain status from the command line
//!
//! Prints one JSON document on stdout: a single resolution for one domain,
//! or a batch with status counts for several domains or a keyword search.
//! Logs go to stderr.

use anyhow::Context;
use clap::Parser;
use domain_oracle::{config, domain, DomainOracleError, LookupOptions, StatusResolver};
use serde::Serialize;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit code for invalid input, matching clap's usage errors
const EXIT_INVALID_INPUT: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "domain-oracle")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve whether domains are available, taken, parked or for sale")]
struct Args {
    /// Domains to resolve (e.g. example.com)
    #[arg(value_name = "DOMAINS", conflicts_with = "keyword")]
    domains: Vec<String>,

    /// Search one keyword across TLDs instead of naming domains
    #[arg(short = 'k', long = "keyword", value_name = "KEYWORD")]
    keyword: Option<String>,

    /// TLDs for keyword search (comma separated or repeated)
    #[arg(short = 't', long = "tld", value_name = "TLD", value_delimiter = ',', action = clap::ArgAction::Append, requires = "keyword")]
    tlds: Vec<String>,

    /// Named TLD set for keyword search: default, popular, startup, enterprise
    #[arg(long = "preset", value_name = "NAME", requires = "keyword", conflicts_with = "tlds")]
    preset: Option<String>,

    /// Attach registrar pricing
    #[arg(long = "pricing")]
    pricing: bool,

    /// Query aftermarket providers for registered domains
    #[arg(long = "aftermarket")]
    aftermarket: bool,

    /// Probe live sites for parking and for-sale pages
    #[arg(long = "parking")]
    parking: bool,

    /// Per-hop HTTP probe timeout in seconds
    #[arg(long = "timeout", value_name = "SECS")]
    timeout: Option<u64>,

    /// Pretty-print JSON output
    #[arg(short = 'p', long = "pretty")]
    pretty: bool,
}

impl Args {
    fn options(&self) -> LookupOptions {
        LookupOptions {
            include_pricing: self.pricing,
            include_aftermarket: self.aftermarket,
            include_parking: self.parking,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("domain_oracle=info")))
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let invalid_input = e
                .downcast_ref::<DomainOracleError>()
                .map(DomainOracleError::is_validation)
                .unwrap_or(false);
            if invalid_input {
                ExitCode::from(EXIT_INVALID_INPUT)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    if args.domains.is_empty() && args.keyword.is_none() {
        return Err(DomainOracleError::validation("Provide at least one domain or --keyword").into());
    }

    let mut config = config::load_from_env().context("Failed to load configuration")?;
    if let Some(secs) = args.timeout {
        if secs == 0 {
            return Err(DomainOracleError::validation("--timeout must be greater than zero").into());
        }
        config = config.with_http_timeout(Duration::from_secs(secs));
    }

    let resolver = StatusResolver::new(config)?;
    let options = args.options();
    tracing::debug!(
        pricing = options.include_pricing,
        aftermarket = options.include_aftermarket,
        parking = options.include_parking,
        providers = ?resolver.providers().pricing_names(),
        "Resolver ready"
    );

    if let Some(keyword) = &args.keyword {
        let tlds = match &args.preset {
            Some(name) => domain::get_tld_list(name)
                .ok_or_else(|| DomainOracleError::validation(format!("Unknown TLD preset '{}'", name)))?,
            None => args.tlds.clone(),
        };
        let batch = resolver.search_keyword(keyword, &tlds, options).await?;
        return print_json(&batch, args.pretty);
    }

    if let [single] = args.domains.as_slice() {
        let resolution = resolver.resolve_domain(single, options).await?;
        return print_json(&resolution, args.pretty);
    }

    let batch = resolver.resolve_batch(&args.domains, options).await?;
    print_json(&batch, args.pretty)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
