//! Test harness for isolated job processing.
//!
//! `TestHarness` owns a temporary jobs root and builds a `JobCoordinator`
//! whose pipeline talks to a `ScriptedRunner` instead of real binaries.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use audi::pipeline::{CommandOutput, CommandRunner};
use audi::storage::JOB_FILE_NAME;
use audi::{Job, JobCoordinator, JobStore, Pipeline, PipelineConfig};

pub const FFMPEG: &str = "ffmpeg";
pub const WHISPER: &str = "whisper";

/// Fake ffmpeg/whisper: the transcoder writes the configured segments, the
/// transcriber writes `transcript for chunk N`.
#[derive(Default)]
pub struct ScriptedRunner {
    segments: Vec<Vec<u8>>,
    ffmpeg_exit_code: Option<i32>,
    missing: HashSet<String>,
    failing_transcripts: HashSet<usize>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedRunner {
    pub fn new(segments: Vec<Vec<u8>>) -> Self {
        Self {
            segments,
            ..Self::default()
        }
    }

    /// The transcoder exits with `code` and writes nothing.
    pub fn ffmpeg_exits_with(mut self, code: i32) -> Self {
        self.ffmpeg_exit_code = Some(code);
        self
    }

    /// `program` is not found on `PATH`.
    pub fn missing(mut self, program: &str) -> Self {
        self.missing.insert(program.to_string());
        self
    }

    pub fn fail_transcript(mut self, index: usize) -> Self {
        self.failing_transcripts.insert(index);
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> usize {
        self.calls().iter().filter(|(p, _)| p == program).count()
    }

    fn run_ffmpeg(&self, args: &[String]) -> std::io::Result<CommandOutput> {
        if let Some(code) = self.ffmpeg_exit_code {
            return Ok(CommandOutput {
                log: "Invalid data found when processing input".to_string(),
                success: false,
                code: Some(code),
            });
        }

        let pattern = args.last().cloned().unwrap_or_default();
        for (i, bytes) in self.segments.iter().enumerate() {
            std::fs::write(pattern.replace("%03d", &format!("{:03}", i)), bytes)?;
        }
        Ok(CommandOutput {
            log: format!("ffmpeg: wrote {} segments", self.segments.len()),
            success: true,
            code: Some(0),
        })
    }

    fn run_whisper(&self, args: &[String]) -> std::io::Result<CommandOutput> {
        let value_after = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .cloned()
                .unwrap_or_default()
        };
        let chunk = value_after("-f");
        let prefix = value_after("-of");
        let index: usize = Path::new(&chunk)
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.rsplit('_').next())
            .and_then(|n| n.parse().ok())
            .unwrap_or_default();

        if self.failing_transcripts.contains(&index) {
            return Ok(CommandOutput {
                log: format!("whisper: failed to decode chunk {}", index),
                success: false,
                code: Some(2),
            });
        }

        std::fs::write(
            format!("{}.txt", prefix),
            format!("transcript for chunk {}", index),
        )?;
        Ok(CommandOutput {
            log: format!("whisper: transcribed chunk {}", index),
            success: true,
            code: Some(0),
        })
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));

        match program {
            FFMPEG => self.run_ffmpeg(args),
            WHISPER => self.run_whisper(args),
            other => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not scripted", other),
            )),
        }
    }

    fn resolve(&self, program: &str) -> Option<PathBuf> {
        (!self.missing.contains(program)).then(|| PathBuf::from("/usr/bin").join(program))
    }
}

/// Isolated environment for coordinator tests.
pub struct TestHarness {
    temp_dir: TempDir,
    pub jobs_root: PathBuf,
    pub runner: Arc<ScriptedRunner>,
    transcription: bool,
    make_base64: bool,
}

impl TestHarness {
    /// Harness whose transcoder produces `runner`'s segments, without a
    /// transcription binary.
    pub fn new(runner: ScriptedRunner) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let jobs_root = temp_dir.path().join("data").join("jobs");

        Self {
            temp_dir,
            jobs_root,
            runner: Arc::new(runner),
            transcription: false,
            make_base64: true,
        }
    }

    pub fn with_transcription(mut self) -> Self {
        self.transcription = true;
        self
    }

    pub fn without_base64(mut self) -> Self {
        self.make_base64 = false;
        self
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn store(&self) -> JobStore {
        JobStore::new(&self.jobs_root)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            ffmpeg_bin: FFMPEG.to_string(),
            whisper_bin: self.transcription.then(|| WHISPER.to_string()),
            whisper_args: vec!["-m".to_string(), "models/ggml-base.bin".to_string()],
        }
    }

    pub fn coordinator(&self) -> JobCoordinator {
        let runner: Arc<dyn CommandRunner> = self.runner.clone();
        let pipeline = Pipeline::with_runner(Arc::new(self.pipeline_config()), runner);
        JobCoordinator::new(self.store(), Arc::new(pipeline)).with_base64(self.make_base64)
    }

    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.jobs_root.join(job_id)
    }

    /// Raw `job.json` of a job, parsed as untyped JSON.
    pub fn read_record(&self, job_id: &str) -> serde_json::Value {
        let path = self.job_dir(job_id).join(JOB_FILE_NAME);
        let data = std::fs::read(&path).expect("Failed to read job record");
        serde_json::from_slice(&data).expect("Job record is not JSON")
    }

    /// Ingests `content` as an upload and waits for processing to finish.
    pub async fn run_job(
        &self,
        coordinator: &JobCoordinator,
        file_name: &str,
        content: &[u8],
        chunk_seconds: u32,
        transcribe: bool,
    ) -> Job {
        let (_pending, handle) = coordinator
            .ingest(file_name, content, chunk_seconds, transcribe)
            .await
            .expect("Failed to ingest upload");
        handle.await.expect("Processing task panicked")
    }
}
