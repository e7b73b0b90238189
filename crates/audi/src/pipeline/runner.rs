use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::broadcast::job_progress::JobPhase;
use crate::processor::{self, PREVIEW_LIMIT};
use crate::sanitize;
use crate::worker::job::Chunk;

use super::command::{CommandRunner, SystemCommandRunner};
use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::PipelineError;
use super::progress::{ProgressEvent, ProgressReporter};

const CHUNK_PATTERN: &str = "chunk_%03d.wav";
const CHUNK_GLOB: &str = "chunk_*.wav";

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    runner: Arc<dyn CommandRunner>,
}

impl Pipeline {
    /// Production constructor, runs real binaries.
    pub fn from_config(config: Arc<PipelineConfig>) -> Self {
        Self::with_runner(config, Arc::new(SystemCommandRunner))
    }

    /// Builds a pipeline around a specific command runner.
    pub fn with_runner(config: Arc<PipelineConfig>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Splits the input into WAV chunks and builds the chunk manifest.
    ///
    /// The context is always handed back so the caller can persist partial
    /// chunks and logs even when a step fails.
    pub async fn run(
        &self,
        mut ctx: PipelineContext,
        cancel: &CancellationToken,
        progress: &dyn ProgressReporter,
    ) -> (Result<(), PipelineError>, PipelineContext) {
        let span = info_span!("pipeline",
            job_dir = %sanitize::redact_path(&ctx.job_dir),
            input = %sanitize::redact_path(&ctx.input_path),
            chunk_seconds = ctx.options.chunk_duration_seconds,
        );

        let result = self
            .run_steps(&mut ctx, cancel, progress)
            .instrument(span)
            .await;

        if let Err(PipelineError::Cancelled) = result {
            ctx.chunks.clear();
        }
        (result, ctx)
    }

    async fn run_steps(
        &self,
        ctx: &mut PipelineContext,
        cancel: &CancellationToken,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        self.step_check_dependencies()?;
        self.step_prepare_directories(ctx).await?;

        progress.report(ProgressEvent::Phase {
            phase: JobPhase::Transcoding,
            message: "Extracting audio chunks...".to_string(),
        });
        self.step_transcode(ctx)
            .instrument(info_span!("transcode"))
            .await?;

        self.step_discover_chunks(ctx)?;

        progress.report(ProgressEvent::Phase {
            phase: JobPhase::ProcessingChunks,
            message: format!("Processing {} chunks...", ctx.chunk_files.len()),
        });
        self.step_process_chunks(ctx, cancel, progress)
            .instrument(info_span!("process_chunks"))
            .await?;

        info!(chunks = ctx.chunks.len(), "pipeline finished");
        Ok(())
    }

    fn step_check_dependencies(&self) -> Result<(), PipelineError> {
        match self.runner.resolve(&self.config.ffmpeg_bin) {
            Some(path) => {
                debug!("Using transcoder at {}", path.display());
                Ok(())
            }
            None => Err(PipelineError::Dependency {
                program: self.config.ffmpeg_bin.clone(),
            }),
        }
    }

    async fn step_prepare_directories(&self, ctx: &PipelineContext) -> Result<(), PipelineError> {
        for dir in [ctx.chunks_dir(), ctx.base64_dir(), ctx.transcripts_dir()] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| PipelineError::io("creating processing directory", &dir, e))?;
        }
        Ok(())
    }

    async fn step_transcode(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let program = &self.config.ffmpeg_bin;
        let args = transcoder_args(
            &ctx.input_path,
            &ctx.chunks_dir().join(CHUNK_PATTERN),
            ctx.options.chunk_duration_seconds,
        );

        let output = match self.runner.run(program, &args).await {
            Ok(output) => output,
            Err(e) => {
                ctx.logs.push(format!("failed to start {}: {}", program, e));
                return Err(PipelineError::Spawn {
                    program: program.clone(),
                    source: e,
                });
            }
        };

        ctx.logs.push(output.log.clone());
        if !output.success {
            return Err(PipelineError::CommandFailed {
                program: program.clone(),
                status: output.status_text(),
            });
        }
        Ok(())
    }

    fn step_discover_chunks(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let chunks_dir = ctx.chunks_dir();
        let pattern = format!(
            "{}/{}",
            glob::Pattern::escape(&chunks_dir.to_string_lossy()),
            CHUNK_GLOB
        );

        let entries = glob::glob(&pattern).map_err(|e| PipelineError::Glob(e.to_string()))?;
        let mut files = Vec::new();
        for entry in entries {
            files.push(entry.map_err(|e| PipelineError::Glob(e.to_string()))?);
        }
        files.sort();

        if files.is_empty() {
            return Err(PipelineError::NoOutput);
        }

        debug!("Discovered {} chunk files", files.len());
        ctx.chunk_files = files;
        Ok(())
    }

    async fn step_process_chunks(
        &self,
        ctx: &mut PipelineContext,
        cancel: &CancellationToken,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let transcribe = ctx.options.transcribe && self.config.transcription_available();
        if ctx.options.transcribe && !transcribe {
            warn!("Transcription requested but no transcription binary is configured");
        }

        let files = ctx.chunk_files.clone();
        let total = files.len();

        for (index, chunk_path) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            progress.report(ProgressEvent::Chunk { index, total });

            let chunk = self
                .process_chunk(ctx, index, chunk_path, transcribe)
                .await?;
            ctx.chunks.push(chunk);
        }

        Ok(())
    }

    async fn process_chunk(
        &self,
        ctx: &mut PipelineContext,
        index: usize,
        chunk_path: &Path,
        transcribe: bool,
    ) -> Result<Chunk, PipelineError> {
        let file_name = chunk_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("chunk_{:03}.wav", index));
        let stem = chunk_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("chunk_{:03}", index));

        let duration = inspect_duration(chunk_path.to_path_buf()).await?;

        let mut chunk = Chunk {
            index,
            start_seconds: index as f64 * f64::from(ctx.options.chunk_duration_seconds),
            duration_seconds: duration,
            audio_file: format!("chunks/{}", file_name),
            base64_file: None,
            transcript_file: None,
            transcript_preview: None,
        };

        if ctx.options.make_base64 {
            let base64_name = format!("{}.b64.txt", stem);
            let base64_path = ctx.base64_dir().join(&base64_name);
            dump_base64(chunk_path.to_path_buf(), base64_path).await?;
            chunk.base64_file = Some(format!("base64/{}", base64_name));
        }

        if transcribe {
            self.transcribe_chunk(ctx, &mut chunk, chunk_path, &stem).await;
        }

        Ok(chunk)
    }

    /// Runs the transcription binary for one chunk. Failures only affect the
    /// chunk's preview text.
    async fn transcribe_chunk(
        &self,
        ctx: &mut PipelineContext,
        chunk: &mut Chunk,
        chunk_path: &Path,
        stem: &str,
    ) {
        let Some(program) = self.config.whisper_bin.as_deref() else {
            return;
        };

        let prefix = ctx.transcripts_dir().join(stem);
        let transcript_name = format!("{}.txt", stem);
        let transcript_path = ctx.transcripts_dir().join(&transcript_name);

        let mut args = self.config.whisper_args.clone();
        args.extend([
            "-f".to_string(),
            chunk_path.to_string_lossy().into_owned(),
            "-otxt".to_string(),
            "-of".to_string(),
            prefix.to_string_lossy().into_owned(),
        ]);

        let output = match self.runner.run(program, &args).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Transcription of chunk {} could not start: {}", chunk.index, e);
                ctx.logs.push(format!("failed to start {}: {}", program, e));
                chunk.transcript_preview = Some(format!("transcription failed: {}", e));
                return;
            }
        };

        ctx.logs.push(output.log.clone());
        if !output.success {
            warn!(
                "Transcription of chunk {} failed: {}",
                chunk.index,
                output.status_text()
            );
            chunk.transcript_preview =
                Some(format!("transcription failed: {}", output.status_text()));
            return;
        }

        match processor::read_preview(&transcript_path, PREVIEW_LIMIT).await {
            Ok(preview) => {
                chunk.transcript_preview = Some(preview);
                chunk.transcript_file = Some(format!("transcripts/{}", transcript_name));
            }
            Err(e) => {
                warn!("Transcript for chunk {} unreadable: {}", chunk.index, e);
                chunk.transcript_preview = Some(format!("unable to read transcript: {}", e));
            }
        }
    }
}

/// ffmpeg arguments: audio only, mono 16 kHz 16-bit PCM, fixed-length segments.
pub fn transcoder_args(input: &Path, output_pattern: &Path, chunk_seconds: u32) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-vn".to_string(),
        "-acodec".to_string(),
        "pcm_s16le".to_string(),
        "-ar".to_string(),
        "16000".to_string(),
        "-ac".to_string(),
        "1".to_string(),
        "-f".to_string(),
        "segment".to_string(),
        "-segment_time".to_string(),
        chunk_seconds.to_string(),
        "-reset_timestamps".to_string(),
        "1".to_string(),
        output_pattern.to_string_lossy().into_owned(),
    ]
}

async fn inspect_duration(path: PathBuf) -> Result<f64, PipelineError> {
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || processor::wav_duration_path(&task_path))
        .await
        .map_err(|e| PipelineError::io("inspecting chunk", &path, std::io::Error::other(e)))?
        .map_err(|source| PipelineError::Wav { path, source })
}

async fn dump_base64(src: PathBuf, dst: PathBuf) -> Result<(), PipelineError> {
    let task_src = src.clone();
    let task_dst = dst.clone();
    tokio::task::spawn_blocking(move || processor::write_base64_file(&task_src, &task_dst))
        .await
        .map_err(|e| PipelineError::io("encoding chunk", &src, std::io::Error::other(e)))?
        .map_err(|source| PipelineError::Base64 { path: dst, source })
}
