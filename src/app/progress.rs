use crate::model::{Video, VideoStatus};

/// Minutes assumed for a video whose duration is missing or unparseable.
pub(crate) const DEFAULT_VIDEO_MINUTES: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PlaylistProgress {
    pub(crate) percentage: u32,
    pub(crate) completed: usize,
    pub(crate) watching: usize,
    pub(crate) total: usize,
    pub(crate) remaining: usize,
    pub(crate) total_minutes: u32,
    pub(crate) watched_minutes: u32,
}

impl PlaylistProgress {
    pub(crate) fn remaining_minutes(&self) -> u32 {
        self.total_minutes.saturating_sub(self.watched_minutes)
    }

    pub(crate) fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.completed as f64 / self.total as f64).clamp(0.0, 1.0)
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

pub(crate) fn calculate_progress(videos: &[Video]) -> PlaylistProgress {
    if videos.is_empty() {
        return PlaylistProgress::default();
    }

    let total = videos.len();
    let completed = count_status(videos, VideoStatus::Completed);
    let watching = count_status(videos, VideoStatus::Watching);
    let percentage = (completed as f64 * 100.0 / total as f64).round() as u32;

    let total_minutes: f64 = videos
        .iter()
        .map(|video| parse_duration_minutes(video.duration.as_deref()))
        .sum();
    let watched_minutes: f64 = videos
        .iter()
        .filter(|video| video.status == VideoStatus::Completed)
        .map(|video| parse_duration_minutes(video.duration.as_deref()))
        .sum();

    PlaylistProgress {
        percentage: percentage.min(100),
        completed,
        watching,
        total,
        remaining: total - completed,
        total_minutes: total_minutes.round() as u32,
        watched_minutes: watched_minutes.round() as u32,
    }
}

fn count_status(videos: &[Video], status: VideoStatus) -> usize {
    videos.iter().filter(|video| video.status == status).count()
}

/// Parses `"M:SS"` or `"H:MM:SS"` into fractional minutes. Anything else,
/// including a missing value, yields [`DEFAULT_VIDEO_MINUTES`].
pub(crate) fn parse_duration_minutes(raw: Option<&str>) -> f64 {
    raw.and_then(try_parse_duration_minutes)
        .unwrap_or(DEFAULT_VIDEO_MINUTES)
}

fn try_parse_duration_minutes(raw: &str) -> Option<f64> {
    let parts = raw
        .trim()
        .split(':')
        .map(parse_component)
        .collect::<Option<Vec<u32>>>()?;

    match parts.as_slice() {
        [minutes, seconds] if *seconds < 60 => Some(*minutes as f64 + *seconds as f64 / 60.0),
        [hours, minutes, seconds] if *minutes < 60 && *seconds < 60 => {
            Some(*hours as f64 * 60.0 + *minutes as f64 + *seconds as f64 / 60.0)
        }
        _ => None,
    }
}

fn parse_component(part: &str) -> Option<u32> {
    let part = part.trim();
    if part.is_empty() || !part.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

pub(crate) fn format_minutes(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minute_and_hour_forms() {
        assert!((parse_duration_minutes(Some("7:30")) - 7.5).abs() < 1e-9);
        assert!((parse_duration_minutes(Some("1:02:30")) - 62.5).abs() < 1e-9);
        assert!((parse_duration_minutes(Some("0:45")) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn malformed_durations_fall_back_to_default() {
        for raw in ["", "abc", "12", "5:75", "-1:30", "1:2:3:4", "10:", ":30", "1.5:00", "1:60:00"] {
            assert_eq!(
                parse_duration_minutes(Some(raw)),
                DEFAULT_VIDEO_MINUTES,
                "input {raw:?} should use the default"
            );
        }
        assert_eq!(parse_duration_minutes(None), DEFAULT_VIDEO_MINUTES);
    }

    #[test]
    fn format_minutes_switches_to_hours() {
        assert_eq!(format_minutes(35), "35m");
        assert_eq!(format_minutes(60), "1h 0m");
        assert_eq!(format_minutes(125), "2h 5m");
    }
}
