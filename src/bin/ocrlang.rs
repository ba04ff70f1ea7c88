//! CLI binary for ocr-langdetect.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use ocr_langdetect::catalog;
use ocr_langdetect::{
    describe, detect_stream, extract_batch, name_of, BatchItem, DetectionResult, EngineKind,
    ExtractionConfig, ExtractionProgressCallback, ExtractionResult, ProgressCallback, Tier,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn orange(s: &str) -> String {
    format!("\x1b[38;5;208m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

/// Render a tier label in its colour hint.
fn tier_badge(tier: Tier) -> String {
    let d = describe(tier);
    match d.color_hint {
        "green" => green(d.label),
        "yellow" => yellow(d.label),
        "orange" => orange(d.label),
        _ => red(d.label),
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// file. Files complete out of order when running concurrently.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<String, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn elapsed_secs(&self, file: &str) -> f64 {
        self.start_times
            .lock()
            .remove(file)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.reset_eta();
    }

    fn on_detection_start(&self, file: &str) {
        self.start_times
            .lock()
            .insert(file.to_string(), Instant::now());
        self.bar.set_message(format!("detecting {file}"));
    }

    fn on_detection_complete(&self, file: &str, primary: Option<&str>, tier: Tier) {
        let lang = primary.map_or_else(|| "none".to_string(), name_of);
        self.bar.println(format!(
            "  {} {:<28} {}  {}",
            cyan("◆"),
            file,
            lang,
            tier_badge(tier)
        ));
    }

    fn on_extraction_start(&self, file: &str, language: &str) {
        self.start_times
            .lock()
            .entry(file.to_string())
            .or_insert_with(Instant::now);
        self.bar.set_message(format!("reading {file} ({language})"));
    }

    fn on_extraction_complete(&self, file: &str, _language: &str, chars: usize) {
        let secs = self.elapsed_secs(file);
        self.bar.println(format!(
            "  {} {:<28} {}  {}",
            green("✓"),
            file,
            dim(&format!("{chars:>6} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_failed(&self, file: &str, error: &str) {
        let secs = self.elapsed_secs(file);
        let first_line = error.lines().next().unwrap_or_default();
        let msg = if first_line.chars().count() > 80 {
            let cut: String = first_line.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            first_line.to_string()
        };
        self.bar.println(format!(
            "  {} {:<28} {}  {}",
            red("✗"),
            file,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = total_files.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} files extracted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files extracted  ({} failed)",
                if failed == total_files {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Detect the language and extract text (stdout)
  ocrlang scan.png

  # Skip detection, read as Spanish
  ocrlang --lang es receipt.jpg

  # Detection only, several files, JSON
  ocrlang --detect-only --json page1.png page2.png

  # Use the toolkit HTTP API (images and PDFs)
  ocrlang --engine remote --remote-url http://localhost:8080/api contract.pdf

  # Use a specific vision model
  ocrlang --provider anthropic --model claude-sonnet-4-20250514 poster.jpg

  # Show supported language codes
  ocrlang --list-languages

CONFIDENCE TIERS:
  High      >= 80    language used as-is
  Medium    50-79    alternatives suggested
  Low       30-49    alternatives suggested
  Very Low  < 30     alternatives suggested

ENVIRONMENT VARIABLES:
  OCRLANG_REMOTE_URL      Toolkit API base URL (selects the remote engine)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
"#;

/// Detect document language and extract text with OCR.
#[derive(Parser, Debug)]
#[command(
    name = "ocrlang",
    version,
    about = "Detect document language and extract text with OCR",
    long_about = "Detect the language of scanned documents and images (local files or URLs), \
then extract their text with OCR in that language. Backed by a vision LLM (OpenAI, Anthropic, \
Gemini, Ollama, ...) or by the toolkit's HTTP OCR API.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file paths or HTTP/HTTPS URLs (images or PDFs).
    #[arg(required_unless_present = "list_languages")]
    inputs: Vec<String>,

    /// Language code to extract in; skips detection (e.g. en, es, zh-cn).
    #[arg(short, long, env = "OCRLANG_LANG")]
    lang: Option<String>,

    /// Only detect languages, do not extract text.
    #[arg(long, conflicts_with = "lang")]
    detect_only: bool,

    /// Engine: auto, vision, remote.
    #[arg(long, env = "OCRLANG_ENGINE", value_enum, default_value = "auto")]
    engine: EngineArg,

    /// Toolkit API base URL for the remote engine.
    #[arg(long, env = "OCRLANG_REMOTE_URL")]
    remote_url: Option<String>,

    /// Vision LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Vision LLM model ID (e.g. gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Path to a text file with a custom transcription prompt ({language} placeholder).
    #[arg(long, env = "OCRLANG_EXTRACTION_PROMPT")]
    extraction_prompt: Option<PathBuf>,

    /// Max vision output tokens per call.
    #[arg(long, env = "OCRLANG_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Number of files processed concurrently.
    #[arg(short, long, env = "OCRLANG_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Output structured JSON instead of text.
    #[arg(long, env = "OCRLANG_JSON")]
    json: bool,

    /// Print the supported language codes and exit.
    #[arg(long)]
    list_languages: bool,

    /// Disable progress bar.
    #[arg(long, env = "OCRLANG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OCRLANG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "OCRLANG_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "OCRLANG_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-engine-call timeout in seconds.
    #[arg(long, env = "OCRLANG_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum EngineArg {
    Auto,
    Vision,
    Remote,
}

impl From<EngineArg> for EngineKind {
    fn from(v: EngineArg) -> Self {
        match v {
            EngineArg::Auto => EngineKind::Auto,
            EngineArg::Vision => EngineKind::Vision,
            EngineArg::Remote => EngineKind::Remote,
        }
    }
}

#[derive(Serialize)]
struct LanguageEntry<'a> {
    code: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectionReport {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detection: Option<DetectionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs when it is active.
    let show_progress =
        !cli.quiet && !cli.no_progress && !cli.json && !cli.detect_only && cli.inputs.len() > 1;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── List languages ───────────────────────────────────────────────────
    if cli.list_languages {
        print_languages(cli.json)?;
        return Ok(());
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Detect-only mode ─────────────────────────────────────────────────
    if cli.detect_only {
        let failed = run_detect_only(&cli, &config).await?;
        if failed > 0 {
            std::process::exit(1);
        }
        return Ok(());
    }

    // ── Run extraction ───────────────────────────────────────────────────
    let items = extract_batch(cli.inputs.clone(), cli.lang.clone(), &config)
        .await
        .context("Extraction failed")?;
    let failed = items.iter().filter(|i| !i.result.success).count();

    if cli.json {
        let json = if let [single] = items.as_slice() {
            serde_json::to_string_pretty(&single.result)
        } else {
            serde_json::to_string_pretty(&items)
        }
        .context("Failed to serialise output")?;
        println!("{json}");
    } else {
        print_items(&cli, &items)?;
    }

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .engine(cli.engine.clone().into())
        .max_tokens(cli.max_tokens)
        .concurrency(cli.concurrency)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref path) = cli.extraction_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read extraction prompt from {:?}", path))?;
        builder = builder.extraction_prompt(prompt);
    }
    if let Some(ref url) = cli.remote_url {
        builder = builder.remote_url(url.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Detect every input with bounded concurrency, reporting in input order.
/// Returns the number of failures.
async fn run_detect_only(cli: &Cli, config: &ExtractionConfig) -> Result<usize> {
    let stream = detect_stream(cli.inputs.clone(), config).context("Engine setup failed")?;
    let mut outcomes: Vec<_> = stream.collect().await;
    outcomes.sort_by_key(|o| o.index);

    let items: Vec<DetectionReport> = outcomes
        .into_iter()
        .map(|o| match o.result {
            Ok(detection) => DetectionReport {
                input: o.input,
                detection: Some(detection),
                error: None,
            },
            Err(e) => DetectionReport {
                input: o.input,
                detection: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    if cli.json {
        let json = serde_json::to_string_pretty(&items).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        items.iter().for_each(print_detection);
    }
    Ok(items.iter().filter(|i| i.error.is_some()).count())
}

fn print_detection(item: &DetectionReport) {
    match (&item.detection, &item.error) {
        (Some(d), _) => {
            println!("{}", bold(&item.input));
            println!("  Script:      {}", d.detected_script);
            match d.primary_language {
                Some(ref p) => println!(
                    "  Language:    {} ({})  {:.1}  {}",
                    name_of(&p.code),
                    p.code,
                    d.confidence,
                    tier_badge(d.confidence_tier)
                ),
                None => println!("  Language:    {}", red("none detected")),
            }
            for c in d.candidates.iter().skip(1) {
                println!(
                    "  {:<12} {} ({})  {:.1}",
                    "",
                    name_of(&c.code),
                    c.code,
                    c.confidence_score
                );
            }
        }
        (None, Some(e)) => eprintln!("{} {}: {}", red("✗"), item.input, e),
        (None, None) => {}
    }
}

fn print_items(cli: &Cli, items: &[BatchItem]) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let many = items.len() > 1;

    for item in items {
        let r = &item.result;
        if !r.success {
            eprintln!(
                "{} {}: {}",
                red("✗"),
                item.input,
                r.error_detail.as_deref().unwrap_or("unknown error")
            );
            continue;
        }
        let text = r.text.as_deref().unwrap_or_default();
        if many {
            writeln!(handle, "==> {} <==", item.input).context("Failed to write to stdout")?;
        }
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        if !text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
        if !cli.quiet {
            print_summary(&item.input, r);
        }
    }
    Ok(())
}

/// One stderr line with language, confidence and any suggestions.
fn print_summary(input: &str, r: &ExtractionResult) {
    let code = r.language.as_deref().unwrap_or_default();
    let mut line = format!("{} {}  {} ({})", dim("›"), input, name_of(code), code);
    if let Some(ref d) = r.detection {
        line.push_str(&format!(
            "  {:.1}  {}",
            d.confidence,
            tier_badge(d.confidence_tier)
        ));
    }
    eprintln!("{line}");
    if !r.suggestions.is_empty() {
        let alternatives: Vec<String> = r
            .suggestions
            .iter()
            .map(|s| format!("{} ({s})", name_of(s)))
            .collect();
        eprintln!(
            "  {} not sure; retry with --lang: {}",
            yellow("?"),
            alternatives.join(", ")
        );
    }
}

fn print_languages(json: bool) -> Result<()> {
    let langs = catalog::languages();
    if json {
        let entries: Vec<LanguageEntry<'_>> = langs
            .iter()
            .map(|&(code, name)| LanguageEntry { code, name })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("Failed to serialise languages")?
        );
    } else {
        for (code, name) in langs {
            println!("{:<8} {}", code, name);
        }
    }
    Ok(())
}
