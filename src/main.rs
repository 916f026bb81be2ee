use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use tracing::info;

mod aggregate;
mod backend;
mod calendar;
mod coerce;
mod error;
mod extract;
mod models;
mod normalize;
mod pipeline;
mod report;
mod settings;

use backend::{BackendKind, ExtractionBackend, LocalBackend, RemoteBackend};
use models::NormalizedRecord;
use pipeline::{BatchOptions, BatchState, Source};
use settings::Settings;

#[derive(Parser)]
#[command(name = "syllabus-scout")]
#[command(about = "Extract deadlines from course syllabi into a semester plan", long_about = None)]
struct Cli {
    /// Settings file holding the API key and backend options
    #[arg(long, global = true, default_value = "scout.toml")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze syllabi and write the report, tables and calendar
    #[command(group(
        ArgGroup::new("pasted")
            .args(["paste_file", "paste"])
            .multiple(false)
    ))]
    Analyze {
        /// PDF syllabi, processed in the order given
        files: Vec<PathBuf>,
        /// Read a pasted syllabus from this file
        #[arg(long)]
        paste_file: Option<PathBuf>,
        /// Read a pasted syllabus from stdin
        #[arg(long)]
        paste: bool,
        #[arg(long, default_value = "semester-plan")]
        out_dir: PathBuf,
        #[arg(long, value_enum)]
        backend: Option<BackendKind>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        pacing_ms: Option<u64>,
    },
    /// Coerce and normalize a saved model response without calling a backend
    Normalize {
        #[arg(long)]
        response: PathBuf,
        #[arg(long)]
        course: String,
    },
    /// Print the text extracted from a PDF
    ExtractText { file: PathBuf },
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            files,
            paste_file,
            paste,
            out_dir,
            backend,
            model,
            base_url,
            api_key,
            pacing_ms,
        } => {
            let mut settings = Settings::load(&cli.settings)?;
            if let Some(kind) = backend {
                settings.backend = kind;
            }
            settings.model = model.or(settings.model);
            settings.base_url = base_url.or(settings.base_url);
            settings.api_key = api_key.or(settings.api_key);
            if let Some(ms) = pacing_ms {
                settings.pacing_ms = ms;
            }

            ensure_key_source(&settings, paste)?;

            let mut sources: Vec<Source> =
                files.iter().map(|path| Source::from_path(path)).collect();
            if let Some(path) = paste_file {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                sources.push(Source::pasted(text));
            } else if paste {
                let mut text = String::new();
                io::stdin()
                    .read_to_string(&mut text)
                    .context("failed to read pasted syllabus from stdin")?;
                sources.push(Source::pasted(text));
            }
            if sources.is_empty() {
                anyhow::bail!("nothing to analyze: pass PDF files, --paste-file or --paste");
            }

            let backend = build_backend(&mut settings)?;
            info!(
                backend = backend.name(),
                sources = sources.len(),
                "starting analysis"
            );
            let options = BatchOptions {
                pacing: Duration::from_millis(settings.pacing_ms),
                max_input_chars: settings.max_input_chars,
            };
            let outcome = pipeline::run_batch(backend.as_ref(), sources, &options).await;

            for failure in outcome.failures.iter() {
                eprintln!("Skipped {}", failure);
            }

            if outcome.state() == BatchState::NothingFound {
                println!("No data found in the uploaded syllabi.");
                return Ok(());
            }

            write_outputs(&out_dir, &outcome)?;
        }
        Commands::Normalize { response, course } => {
            let raw = std::fs::read_to_string(&response)
                .with_context(|| format!("failed to read {}", response.display()))?;
            let records = coerce::coerce_response(&raw, &course)?;
            let partition = normalize::normalize(records, &course);

            println!("Scheduled:");
            print_records(&partition.scheduled);
            println!("TBD:");
            print_records(&partition.unscheduled);
        }
        Commands::ExtractText { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let text = extract::extract_text(&bytes);
            if text.is_empty() {
                anyhow::bail!("no text could be extracted from {}", file.display());
            }
            println!("{text}");
        }
    }

    Ok(())
}

fn build_backend(settings: &mut Settings) -> anyhow::Result<Box<dyn ExtractionBackend>> {
    match settings.backend {
        BackendKind::Local => Ok(Box::new(LocalBackend::new(
            settings.base_url(),
            settings.model(),
        ))),
        BackendKind::Remote => {
            let api_key = match settings.api_key.take() {
                Some(key) => key,
                None => prompt_api_key()?,
            };
            let remote = RemoteBackend::new(settings.base_url(), settings.model(), &api_key)
                .context("cannot start the remote backend")?;
            Ok(Box::new(remote))
        }
    }
}

/// Pasted text consumes stdin, so the key cannot be prompted for afterwards.
fn ensure_key_source(settings: &Settings, paste: bool) -> anyhow::Result<()> {
    if paste && settings.backend == BackendKind::Remote && settings.api_key.is_none() {
        anyhow::bail!("pass --api-key or SCOUT_API_KEY when using --paste");
    }
    Ok(())
}

fn prompt_api_key() -> anyhow::Result<String> {
    eprint!("API key: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read API key")?;
    Ok(line.trim().to_string())
}

fn write_outputs(out_dir: &Path, outcome: &pipeline::BatchOutcome) -> anyhow::Result<()> {
    let dataset = &outcome.dataset;
    let summary = report::summarize(dataset);

    println!(
        "Extraction complete: {} of {} sources contributed.",
        outcome.sources_contributing, outcome.sources_processed
    );
    println!("- Total assignments: {}", summary.total);
    println!("- Scheduled events: {}", summary.scheduled);
    println!("- TBD items: {}", summary.unscheduled);
    println!("- Heaviest month: {}", summary.heaviest_month_label());

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let report_path = out_dir.join("report.md");
    std::fs::write(&report_path, report::build_report(dataset, &outcome.failures))
        .with_context(|| format!("failed to write {}", report_path.display()))?;
    report::write_scheduled_csv(&out_dir.join("scheduled.csv"), &dataset.scheduled)?;
    report::write_unscheduled_csv(&out_dir.join("unscheduled.csv"), &dataset.unscheduled)?;
    println!("Report written to {}.", report_path.display());

    if !dataset.scheduled.is_empty() {
        let ics_path = out_dir.join(calendar::CALENDAR_FILE_NAME);
        std::fs::write(&ics_path, calendar::build_calendar(&dataset.scheduled))
            .with_context(|| format!("failed to write {}", ics_path.display()))?;
        println!("Calendar written to {}.", ics_path.display());
    }

    Ok(())
}

fn print_records(records: &[NormalizedRecord]) {
    if records.is_empty() {
        println!("  (none)");
        return;
    }
    for record in records {
        println!(
            "- {} {} [{}] weight {}",
            record.display_date(),
            record.event_label(),
            record.kind_label(),
            calendar::format_weight(record.weight)
        );
    }
}
