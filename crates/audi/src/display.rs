//! Presentation helpers for job pages and CLI output.

use std::fmt;
use std::str::FromStr;

use crate::worker::job::{Chunk, Job};

/// Unit offered next to the chunk length input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkUnit {
    Seconds,
    Minutes,
    Hours,
}

impl ChunkUnit {
    pub const ALL: [ChunkUnit; 3] = [ChunkUnit::Seconds, ChunkUnit::Minutes, ChunkUnit::Hours];

    pub fn as_str(self) -> &'static str {
        match self {
            ChunkUnit::Seconds => "seconds",
            ChunkUnit::Minutes => "minutes",
            ChunkUnit::Hours => "hours",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChunkUnit::Seconds => "Seconds",
            ChunkUnit::Minutes => "Minutes",
            ChunkUnit::Hours => "Hours",
        }
    }

    pub fn multiplier(self) -> u32 {
        match self {
            ChunkUnit::Seconds => 1,
            ChunkUnit::Minutes => 60,
            ChunkUnit::Hours => 3600,
        }
    }
}

impl fmt::Display for ChunkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChunkUnit::ALL
            .into_iter()
            .find(|unit| unit.as_str() == s)
            .ok_or_else(|| format!("unknown chunk unit '{}'", s))
    }
}

/// Renders seconds as `mm:ss`, or `hh:mm:ss` from one hour up. Negative
/// values show as zero.
pub fn format_seconds(value: f64) -> String {
    let total = if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// `"1 hour"`, `"5 minutes"`, `"90 seconds"`; zero is `"instant"`.
pub fn format_duration_human(seconds: u32) -> String {
    if seconds == 0 {
        return "instant".to_string();
    }
    let (value, unit) = seconds_to_value_unit(seconds);
    let name = match unit {
        ChunkUnit::Seconds => "second",
        ChunkUnit::Minutes => "minute",
        ChunkUnit::Hours => "hour",
    };
    format!("{} {}{}", value, name, plural_suffix(value as usize))
}

/// Largest unit that divides `seconds` evenly, for pre-filling the form.
pub fn seconds_to_value_unit(seconds: u32) -> (u32, ChunkUnit) {
    if seconds >= 3600 && seconds % 3600 == 0 {
        return (seconds / 3600, ChunkUnit::Hours);
    }
    if seconds >= 60 && seconds % 60 == 0 {
        return (seconds / 60, ChunkUnit::Minutes);
    }
    (seconds.max(1), ChunkUnit::Seconds)
}

/// Chunk length from raw form values: `value` × `unit` when both are valid,
/// then a legacy seconds field, then `fallback`.
pub fn resolve_chunk_duration(
    value: Option<&str>,
    unit: Option<&str>,
    legacy_seconds: Option<&str>,
    fallback: u32,
) -> u32 {
    let scaled = value
        .and_then(parse_positive)
        .zip(unit.and_then(|u| u.trim().parse::<ChunkUnit>().ok()))
        .and_then(|(value, unit)| value.checked_mul(unit.multiplier()));
    if let Some(seconds) = scaled {
        return seconds;
    }

    legacy_seconds.and_then(parse_positive).unwrap_or(fallback)
}

fn parse_positive(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|v| *v > 0)
}

/// End of the last chunk, i.e. the recording length covered by the job.
pub fn total_duration_seconds(chunks: &[Chunk]) -> f64 {
    chunks
        .iter()
        .map(|c| c.start_seconds + c.duration_seconds)
        .fold(0.0, f64::max)
}

/// Advisory shown when the chosen chunk length produced very few chunks.
pub fn chunk_warning(job: &Job, total_seconds: f64) -> Option<String> {
    let chunk_seconds = job.chunk_duration_seconds;
    let chunk_count = job.chunks.len();
    if chunk_count == 0 || chunk_seconds == 0 {
        return None;
    }

    let total_rounded = if total_seconds.is_finite() {
        total_seconds.round()
    } else {
        0.0
    };
    let human_chunk = format_duration_human(chunk_seconds);

    if total_rounded > 0.0 && f64::from(chunk_seconds) >= total_rounded {
        return Some(format!(
            "Chunk duration was set to {}, which is longer than this {} recording, so only one chunk was generated. Choose a smaller duration on the upload form to create more splits.",
            human_chunk,
            format_seconds(total_seconds)
        ));
    }

    if chunk_count <= 2 && chunk_seconds >= 1800 {
        return Some(format!(
            "Chunk duration was set to {}, so only {} chunk{} were needed. Try something like 5 minutes to produce shorter segments.",
            human_chunk,
            chunk_count,
            plural_suffix(chunk_count)
        ));
    }

    None
}

pub fn plural_suffix(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
