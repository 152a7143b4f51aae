use chrono::{DateTime, Local, NaiveDateTime};

use crate::model::{Video, VideoStatus};

use super::progress::{PlaylistProgress, format_minutes};

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}

/// Renders API timestamps in local time. The API sends either RFC 3339 or a
/// zone-less `LocalDateTime`; anything else is shown verbatim.
pub(crate) fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub(crate) fn status_marker(status: VideoStatus) -> &'static str {
    match status {
        VideoStatus::Completed => "[x]",
        VideoStatus::Watching => "[>]",
        VideoStatus::ToWatch => "[ ]",
    }
}

pub(crate) fn video_duration_text(video: &Video) -> String {
    video
        .duration
        .as_deref()
        .map(str::trim)
        .filter(|duration| !duration.is_empty())
        .unwrap_or("--:--")
        .to_string()
}

pub(crate) fn progress_summary(progress: &PlaylistProgress) -> String {
    format!(
        "{}% complete | {}/{} videos | {} watched of {} ({} left)",
        progress.percentage,
        progress.completed,
        progress.total,
        format_minutes(progress.watched_minutes),
        format_minutes(progress.total_minutes),
        format_minutes(progress.remaining_minutes()),
    )
}
