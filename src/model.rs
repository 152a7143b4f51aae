use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoStatus {
    #[default]
    ToWatch,
    Watching,
    Completed,
}

impl VideoStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToWatch => "TO_WATCH",
            Self::Watching => "WATCHING",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ToWatch => "To watch",
            Self::Watching => "Watching",
            Self::Completed => "Completed",
        }
    }

    fn rank(self) -> u8 {
        match self {
            Self::ToWatch => 0,
            Self::Watching => 1,
            Self::Completed => 2,
        }
    }

    /// True when moving from `self` to `target` follows the usual
    /// `TO_WATCH -> WATCHING -> COMPLETED` direction.
    pub fn advances_to(self, target: Self) -> bool {
        target.rank() > self.rank()
    }

    /// Next status in the manual override cycle.
    pub fn cycle(self) -> Self {
        match self {
            Self::ToWatch => Self::Watching,
            Self::Watching => Self::Completed,
            Self::Completed => Self::ToWatch,
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "TO_WATCH" | "TODO" => Ok(Self::ToWatch),
            "WATCHING" => Ok(Self::Watching),
            "COMPLETED" | "DONE" => Ok(Self::Completed),
            _ => Err(format!(
                "unknown status `{raw}` (expected to_watch, watching or completed)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistRef {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub status: VideoStatus,
    #[serde(default)]
    pub playlist: Option<PlaylistRef>,
}

impl Video {
    pub fn playlist_id(&self) -> Option<i64> {
        self.playlist.as_ref().map(|playlist| playlist.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDraft {
    pub title: String,
    pub description: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistPreview {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub channel_title: Option<String>,
    #[serde(default)]
    pub video_count: Option<u32>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    #[serde(default)]
    pub imported_videos: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub content: String,
    #[serde(default)]
    pub video_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    pub content: String,
    pub video_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub playlist: Option<PlaylistRef>,
    #[serde(default)]
    pub certificate_url: Option<String>,
    #[serde(default)]
    pub earned_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressStats {
    pub total_playlists: u32,
    pub total_videos: u32,
    pub completed_videos: u32,
    pub watching_videos: u32,
    pub to_watch_videos: u32,
    pub completion_percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_without_status_or_duration_deserializes_with_defaults() {
        let video: Video = serde_json::from_str(r#"{"id":3,"title":"Intro"}"#)
            .expect("minimal video should parse");
        assert_eq!(video.status, VideoStatus::ToWatch);
        assert_eq!(video.duration, None);
        assert_eq!(video.playlist_id(), None);
    }

    #[test]
    fn video_status_uses_wire_names() {
        let video: Video = serde_json::from_str(
            r#"{"id":1,"title":"A","status":"COMPLETED","playlist":{"id":9}}"#,
        )
        .expect("video should parse");
        assert_eq!(video.status, VideoStatus::Completed);
        assert_eq!(video.playlist_id(), Some(9));
        assert_eq!(
            serde_json::to_string(&VideoStatus::ToWatch).expect("serialize"),
            "\"TO_WATCH\""
        );
    }

    #[test]
    fn video_status_parses_cli_spellings() {
        assert_eq!("to-watch".parse::<VideoStatus>(), Ok(VideoStatus::ToWatch));
        assert_eq!("watching".parse::<VideoStatus>(), Ok(VideoStatus::Watching));
        assert_eq!(" Completed ".parse::<VideoStatus>(), Ok(VideoStatus::Completed));
        assert!("paused".parse::<VideoStatus>().is_err());
    }

    #[test]
    fn advances_to_only_moves_forward() {
        assert!(VideoStatus::ToWatch.advances_to(VideoStatus::Watching));
        assert!(VideoStatus::Watching.advances_to(VideoStatus::Completed));
        assert!(!VideoStatus::Completed.advances_to(VideoStatus::Watching));
        assert!(!VideoStatus::Watching.advances_to(VideoStatus::Watching));
    }

    #[test]
    fn progress_stats_tolerates_missing_fields() {
        let stats: ProgressStats =
            serde_json::from_str(r#"{"totalVideos":4,"completionPercentage":25.0}"#)
                .expect("stats should parse");
        assert_eq!(stats.total_videos, 4);
        assert_eq!(stats.completed_videos, 0);
        assert!((stats.completion_percentage - 25.0).abs() < f64::EPSILON);
    }
}
