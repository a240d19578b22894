use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use pasal_verify::{
    analyze_text, enumerate_inputs, load_config, read_input, summarize, CitationExtractor, CitationVerifier, VerificationResult,
    VerifierConfig,
};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Extract pasal citations from AI-generated legal memos and check them against public legal search sites.
#[derive(Debug, Parser)]
#[command(name = "pasalcheck", version)]
struct Cli {
    /// Glob patterns for memo text files (e.g. "./memos/**/*.txt"). Reads stdin when empty.
    inputs: Vec<String>,

    /// YAML config file; environment variables and flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-probe timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Also try a general web search when both legal sites miss. Off unless set.
    #[arg(long)]
    enable_fallback_search: bool,

    /// Stop scanning memo text after this many characters.
    #[arg(long)]
    max_input_chars: Option<usize>,

    /// Print extracted citations without contacting any site.
    #[arg(long)]
    extract_only: bool,

    /// Emit log lines as JSON.
    #[arg(long)]
    log_json: bool,
}

/// What one memo produced: verified results, or bare keys with `--extract-only`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum Outcome {
    Results(Vec<VerificationResult>),
    Citations(Vec<String>),
}

impl Outcome {
    fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Outcome::Results(r) => serde_json::to_string_pretty(r),
            Outcome::Citations(c) => serde_json::to_string_pretty(c),
        }
    }
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    #[serde(flatten)]
    outcome: Outcome,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pasal_verify=info,pasalcheck=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<VerifierConfig> {
    let mut cfg = match &cli.config {
        Some(path) => load_config(path)?,
        None => VerifierConfig::default(),
    };
    cfg.apply_env()?;
    if let Some(ms) = cli.timeout_ms {
        cfg.provider_timeout_ms = ms;
    }
    if cli.enable_fallback_search {
        cfg.enable_fallback_search = true;
    }
    if let Some(n) = cli.max_input_chars {
        cfg.max_input_chars = n;
    }
    cfg.validate()?;
    Ok(cfg)
}

async fn process(text: &str, cli: &Cli, extractor: &CitationExtractor, verifier: &CitationVerifier) -> Outcome {
    if cli.extract_only {
        let keys = extractor.extract(text);
        info!(tool = "extract_citations", count = keys.len(), "extracted");
        return Outcome::Citations(keys.iter().map(|k| k.to_string()).collect());
    }
    let results = analyze_text(text, extractor, verifier).await;
    let summary = summarize(&results);
    info!(
        tool = "verify_all",
        total = summary.total,
        verified = summary.verified,
        unverified = summary.unverified,
        "verification finished"
    );
    Outcome::Results(results)
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let cfg = match resolve_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(tool = "load_config", error = %e, error_code = 3, "invalid configuration");
            return Ok(3);
        }
    };
    info!(
        tool = "load_config",
        timeout_ms = cfg.provider_timeout_ms,
        fallback_search = cfg.enable_fallback_search,
        max_input_chars = cfg.max_input_chars,
        "config ok"
    );

    let extractor = CitationExtractor::from_config(&cfg);
    let verifier = CitationVerifier::from_config(&cfg).context("building HTTP client")?;

    if cli.inputs.is_empty() {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).context("reading stdin")?;
        let outcome = process(&text, &cli, &extractor, &verifier).await;
        println!("{}", outcome.to_json()?);
        return Ok(0);
    }

    let files = match enumerate_inputs(&cli.inputs) {
        Ok(files) => files,
        Err(e) => {
            error!(tool = "enumerate_inputs", error = %e, error_code = 1, "no input files");
            return Ok(1);
        }
    };
    info!(tool = "enumerate_inputs", count = files.len(), "inputs found");

    let mut reports = Vec::with_capacity(files.len());
    for file in files {
        let text = match read_input(&file) {
            Ok(t) => t,
            Err(e) => {
                error!(tool = "read_input", file = %file.display(), error = %e, error_code = 1, "unreadable input");
                return Ok(1);
            }
        };
        let outcome = process(&text, &cli, &extractor, &verifier).await;
        reports.push(FileReport { file: file.display().to_string(), outcome });
    }
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(0)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    let code = run(cli).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
