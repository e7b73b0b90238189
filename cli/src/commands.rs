//! Subcommand handlers.

use anyhow::{bail, Context};
use log::warn;
use tokio::sync::broadcast::error::RecvError;

use audi::display::{self, format_seconds};
use audi::{Config, CoordinatorError, Job, JobCoordinator, JobStatus};

use crate::cli::ProcessArgs;

pub async fn process(config: &Config, args: ProcessArgs) -> anyhow::Result<()> {
    let chunk_seconds = display::resolve_chunk_duration(
        args.chunk_value.as_deref(),
        Some(args.chunk_unit.as_str()),
        args.chunk_seconds.as_deref(),
        config.default_chunk_seconds,
    );

    let coordinator =
        JobCoordinator::from_config(config).with_base64(config.make_base64 && !args.no_base64);
    if args.transcribe && !coordinator.transcription_available() {
        warn!(
            "Transcription requested but WHISPER_BIN is not configured; \
             chunks will not be transcribed"
        );
    }

    let file_name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("input path has no file name")?;
    let upload = tokio::fs::File::open(&args.file)
        .await
        .with_context(|| format!("failed to open {}", args.file.display()))?;

    let mut events = coordinator.subscribe();
    let (job, mut handle) = coordinator
        .ingest(&file_name, upload, chunk_seconds, args.transcribe)
        .await?;
    println!(
        "Job {} queued, chunk length {}",
        job.id,
        display::format_duration_human(chunk_seconds)
    );

    let mut interrupted = false;
    let mut events_open = true;
    let finished = loop {
        tokio::select! {
            result = &mut handle => break result.context("processing task panicked")?,
            event = events.recv(), if events_open => match event {
                Ok(event) if event.job_id == job.id => {
                    eprintln!("[{}] {}", event.phase, event.message);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Skipped {} progress events", skipped);
                }
                Err(RecvError::Closed) => events_open = false,
            },
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                eprintln!("Interrupted, cancelling job {}...", job.id);
                coordinator.shutdown();
            }
        }
    };

    print_job(&coordinator, &finished, false);
    if finished.status == JobStatus::Failed {
        bail!("job {} failed", finished.id);
    }
    Ok(())
}

pub async fn list(config: &Config, json: bool) -> anyhow::Result<()> {
    let coordinator = JobCoordinator::from_config(config);
    let jobs = coordinator.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }
    if jobs.is_empty() {
        println!("No jobs in {}", coordinator.store().jobs_root().display());
        return Ok(());
    }

    for job in &jobs {
        println!(
            "{:<22} {:<10} {}  {:>3} chunk{}  {}",
            job.id,
            job.status.as_str(),
            job.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
            job.chunks.len(),
            display::plural_suffix(job.chunks.len()),
            job.original_file_name
        );
    }
    Ok(())
}

pub async fn show(config: &Config, id: &str, with_log: bool, json: bool) -> anyhow::Result<()> {
    let coordinator = JobCoordinator::from_config(config);
    let job = coordinator
        .load(id)
        .await
        .with_context(|| format!("job {} could not be loaded", id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&job)?);
    } else {
        print_job(&coordinator, &job, with_log);
    }
    Ok(())
}

/// Each invocation has its own coordinator, so a job another `audi-cli`
/// process is running is only visible through its record.
pub async fn delete(config: &Config, id: &str, force: bool) -> anyhow::Result<()> {
    let coordinator = JobCoordinator::from_config(config);
    let result = if force {
        coordinator.delete(id).await
    } else {
        coordinator.delete_settled(id).await
    };
    match result {
        Ok(()) => {
            println!("Job {} deleted", id);
            Ok(())
        }
        Err(CoordinatorError::Busy(busy_id)) => bail!(
            "job {} is still pending or processing (use --force if its run crashed)",
            busy_id
        ),
        Err(e) => Err(e.into()),
    }
}

fn print_job(coordinator: &JobCoordinator, job: &Job, with_log: bool) {
    let total = display::total_duration_seconds(&job.chunks);

    println!("Job:         {}", job.id);
    println!("File:        {}", job.original_file_name);
    println!("Status:      {}", job.status);
    println!(
        "Created:     {}",
        job.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
    );
    match job.completed_at {
        Some(completed_at) if job.is_done() => println!(
            "Finished:    {}",
            completed_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
        ),
        _ => println!("Finished:    not yet"),
    }
    println!(
        "Chunk size:  {}",
        display::format_duration_human(job.chunk_duration_seconds)
    );
    println!("Length:      {}", format_seconds(total));
    if let Some(error) = &job.error_message {
        println!("Error:       {}", error);
    }
    if let Some(warning) = display::chunk_warning(job, total) {
        println!("Note:        {}", warning);
    }

    for chunk in &job.chunks {
        let audio = coordinator
            .asset_path(&job.id, &chunk.audio_file)
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| chunk.audio_file.clone());
        println!(
            "  #{:<3} {} +{}  {}",
            chunk.index,
            format_seconds(chunk.start_seconds),
            format_seconds(chunk.duration_seconds),
            audio
        );
        if let Some(base64_file) = &chunk.base64_file {
            println!("        base64: {}", base64_file);
        }
        if let Some(preview) = &chunk.transcript_preview {
            println!("        {}", preview.replace('\n', " "));
        }
    }

    if with_log {
        if let Some(log) = &job.processing_log {
            println!();
            println!("{}", log);
        }
    }
}
