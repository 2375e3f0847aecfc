use anyhow::{Context, Result, bail};
use clap::Parser;
use humansize::{BINARY, format_size};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use reclaim::application::dto::{JobOutcome, JobReport, JobRequest, ScanOptions};
use reclaim::application::{JobEvent, RecoveryJob, spawn_job};
use reclaim::domain::entities::FileCategory;
use reclaim::domain::repositories::VolumeReader;
use reclaim::domain::services::SignatureRegistry;
use reclaim::infrastructure::block_device::{FileVolume, resolve_raw_device};
use reclaim::presentation::cli::{Cli, Commands, ProgressReporter, build_selection};

const EXIT_FAILED: u8 = 1;
const EXIT_CANCELLED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FAILED)
        }
    }
}

/// Installs the stderr subscriber; RECLAIM_LOG or RUST_LOG override the flags
fn init_logging(verbose: bool, debug: bool) {
    let default_level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_env("RECLAIM_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Recover {
            volume,
            output,
            types,
            category,
            deep_scan,
            raw_device,
            chunk_size,
            config,
            report,
        } => {
            let mut options = match &config {
                Some(path) => ScanOptions::from_toml_file(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => ScanOptions::default(),
            };
            if let Some(size) = chunk_size {
                options = options.with_chunk_size(size);
            }

            let selection = build_selection(&types, &category);
            let mut request = JobRequest::new(volume, selection, output).with_deep_scan(deep_scan);
            if let Some(device) = raw_device {
                request = request.with_raw_device(device);
            }

            let job: RecoveryJob = RecoveryJob::new(request, options)?;
            run_recovery(job, report.as_deref())
        }
        Commands::ListSignatures => {
            list_signatures();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Info { device } => {
            show_info(&device)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_recovery(job: RecoveryJob, report_path: Option<&Path>) -> Result<ExitCode> {
    let request = job.request();
    println!("Volume: {}", request.volume_id);
    println!(
        "Types:  {}",
        request.selection.iter().collect::<Vec<_>>().join(" ")
    );
    if request.deep_scan {
        println!("Device: {}", request.carve_device());
    }
    println!();

    let handle = spawn_job(job).context("Failed to start recovery worker")?;

    let token = handle.cancellation_token().clone();
    ctrlc::set_handler(move || token.cancel()).context("Failed to set Ctrl+C handler")?;

    let mut reporter = ProgressReporter::new();
    for event in handle.events().iter() {
        if let JobEvent::Progress(progress) = event {
            reporter.update(&progress);
        }
    }
    let report = handle.join();
    reporter.finish(&report.outcome.to_string());

    println!();
    print!("{}", report.summary());

    if let Some(path) = report_path {
        write_report(&report, path)?;
        println!("Report: {}", path.display());
    }

    Ok(match report.outcome {
        JobOutcome::Completed { .. } => ExitCode::SUCCESS,
        JobOutcome::Cancelled { .. } => ExitCode::from(EXIT_CANCELLED),
        JobOutcome::Failed { .. } => ExitCode::from(EXIT_FAILED),
    })
}

fn write_report(report: &JobReport, path: &Path) -> Result<()> {
    if let Some(dir) = &report.output_dir {
        let inside_output = path
            .parent()
            .and_then(|p| p.canonicalize().ok())
            .zip(dir.canonicalize().ok())
            .is_some_and(|(parent, dir)| parent.starts_with(dir));
        if inside_output {
            bail!("Report must be written outside the output directory");
        }
    }

    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    Ok(())
}

fn list_signatures() {
    let registry = SignatureRegistry::global();

    println!("Supported signatures:\n");
    println!("{:<8} {:<36} {}", "EXT", "MAGIC", "CATEGORY");
    println!("{}", "-".repeat(56));

    for signature in registry.signatures() {
        let magic = signature
            .magic()
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ");
        let category = FileCategory::ALL
            .iter()
            .find(|c| c.extensions().contains(&signature.extension()))
            .map(|c| c.name())
            .unwrap_or("-");
        println!("{:<8} {:<36} {}", signature.extension(), magic, category);
    }

    println!(
        "\n{} signatures, longest magic {} bytes",
        registry.signature_count(),
        registry.max_magic_length()
    );
}

fn show_info(device: &str) -> Result<()> {
    let raw = resolve_raw_device(device);
    let volume =
        FileVolume::open(&raw).with_context(|| format!("Failed to open device: {}", raw))?;

    println!("Device: {}", volume.id());
    if raw != device {
        println!("Volume: {}", device);
    }
    match volume.size() {
        Ok(size) => println!("Size:   {} ({} bytes)", format_size(size, BINARY), size),
        Err(e) => println!("Size:   unknown ({})", e),
    }
    if PathBuf::from(device).is_dir() {
        println!("Type:   mounted directory");
    }
    volume.close();
    Ok(())
}
