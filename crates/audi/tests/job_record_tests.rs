//! On-disk job record format: key names, optional fields, and reading
//! records written by other tools.

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use audi::storage::JOB_FILE_NAME;
use audi::{Chunk, Job, JobStatus, JobStore};

const RECORD: &str = r#"{
  "id": "20260314-093000-0042",
  "originalFileName": "interview.mkv",
  "originalVideoPath": "original/interview.mkv",
  "createdAt": "2026-03-14T09:30:00Z",
  "completedAt": "2026-03-14T09:31:12.5Z",
  "chunkDurationSeconds": 300,
  "transcriptionRequested": true,
  "status": "completed",
  "chunks": [
    {
      "index": 0,
      "startSeconds": 0,
      "durationSeconds": 300,
      "audioFile": "chunks/chunk_000.wav",
      "base64File": "base64/chunk_000.b64.txt",
      "transcriptFile": "transcripts/chunk_000.txt",
      "transcriptPreview": "Welcome back to the show"
    },
    {
      "index": 1,
      "startSeconds": 300,
      "durationSeconds": 41.187375,
      "audioFile": "chunks/chunk_001.wav",
      "transcriptPreview": "transcription failed: exit status 1"
    }
  ],
  "processingLog": "ffmpeg output\n---\nwhisper output\n---\nwhisper failed"
}"#;

fn write_record(root: &std::path::Path, id: &str, json: &str) {
    let dir = root.join(id);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(JOB_FILE_NAME), json).unwrap();
}

#[tokio::test]
async fn test_reads_existing_record() {
    let tmp = TempDir::new().unwrap();
    write_record(tmp.path(), "20260314-093000-0042", RECORD);
    let store = JobStore::new(tmp.path());

    let job = store.load_by_id("20260314-093000-0042").await.unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.original_file_name, "interview.mkv");
    assert_eq!(
        job.created_at,
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    );
    assert!(job.completed_at.is_some());
    assert!(job.error_message.is_none());
    assert_eq!(job.chunks.len(), 2);
    assert_eq!(job.chunks[1].duration_seconds, 41.187375);
    assert!(job.chunks[1].base64_file.is_none());
    assert!(job.chunks[1].transcript_file.is_none());
}

#[tokio::test]
async fn test_saved_record_uses_camel_case_and_omits_empty_fields() {
    let tmp = TempDir::new().unwrap();
    let store = JobStore::new(tmp.path());

    let job = Job::new("20260314-100000-0001", "talk.mp4", 120, false);
    let dir = store.job_dir(&job.id).unwrap();
    store.save(&dir, &job).await.unwrap();

    let raw = std::fs::read_to_string(dir.join(JOB_FILE_NAME)).unwrap();
    assert!(raw.contains("\n  \"id\""), "record is not two-space indented");

    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object["status"], "pending");
    assert_eq!(object["originalVideoPath"], "original/talk.mp4");
    assert_eq!(object["chunkDurationSeconds"], 120);
    assert_eq!(object["transcriptionRequested"], false);
    assert_eq!(object["chunks"], serde_json::json!([]));
    assert!(!object.contains_key("completedAt"));
    assert!(!object.contains_key("errorMessage"));
    assert!(!object.contains_key("processingLog"));
}

#[tokio::test]
async fn test_fractional_durations_survive_save_and_load() {
    let tmp = TempDir::new().unwrap();
    let store = JobStore::new(tmp.path());

    let mut job = Job::new("20260314-100000-0002", "talk.mp4", 7, false);
    job.begin_processing().unwrap();
    job.complete(
        vec![Chunk {
            index: 0,
            start_seconds: 0.0,
            duration_seconds: 6.999_937_5,
            audio_file: "chunks/chunk_000.wav".to_string(),
            base64_file: None,
            transcript_file: None,
            transcript_preview: None,
        }],
        String::new(),
        Utc::now(),
    )
    .unwrap();

    let dir = store.job_dir(&job.id).unwrap();
    store.save(&dir, &job).await.unwrap();
    let loaded = store.load(&dir).await.unwrap();

    assert_eq!(loaded.chunks[0].duration_seconds, 6.999_937_5);
    assert_eq!(loaded, job);
}

#[tokio::test]
async fn test_unknown_status_is_corrupt() {
    let tmp = TempDir::new().unwrap();
    let record = RECORD.replace("\"completed\"", "\"exploded\"");
    write_record(tmp.path(), "bad", &record);
    let store = JobStore::new(tmp.path());

    let err = store.load_by_id("bad").await.unwrap_err();
    assert!(matches!(err, audi::StoreError::Corrupt { .. }));
    assert!(store.list().await.unwrap().is_empty());
}
