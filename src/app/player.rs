use std::thread::{self, ScopedJoinHandle};

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::http::ApiError;
use crate::model::{Achievement, Note, Playlist, Video, VideoStatus};

use super::progress::{PlaylistProgress, calculate_progress};
use super::sequencer::{SequenceStep, VideoSequencer};

/// The slice of the API the player flow needs. Kept as a trait so the flow
/// can run against an in-memory backend in tests.
pub(crate) trait StudyApi: Sync {
    fn get_playlist(&self, id: i64) -> Result<Playlist, ApiError>;
    fn videos_for_playlist(&self, playlist_id: i64) -> Result<Vec<Video>, ApiError>;
    fn get_video(&self, id: i64) -> Result<Video, ApiError>;
    fn notes_for_video(&self, video_id: i64) -> Result<Vec<Note>, ApiError>;
    fn update_video_status(&self, id: i64, status: VideoStatus) -> Result<(), ApiError>;
    fn create_achievement(&self, user_id: i64, playlist_id: i64) -> Result<Achievement, ApiError>;
}

impl StudyApi for ApiClient {
    fn get_playlist(&self, id: i64) -> Result<Playlist, ApiError> {
        ApiClient::get_playlist(self, id)
    }

    fn videos_for_playlist(&self, playlist_id: i64) -> Result<Vec<Video>, ApiError> {
        ApiClient::videos_for_playlist(self, playlist_id)
    }

    fn get_video(&self, id: i64) -> Result<Video, ApiError> {
        ApiClient::get_video(self, id)
    }

    fn notes_for_video(&self, video_id: i64) -> Result<Vec<Note>, ApiError> {
        ApiClient::notes_for_video(self, video_id)
    }

    fn update_video_status(&self, id: i64, status: VideoStatus) -> Result<(), ApiError> {
        ApiClient::update_video_status(self, id, status)
    }

    fn create_achievement(
        &self,
        user_id: i64,
        playlist_id: i64,
    ) -> Result<Achievement, ApiError> {
        ApiClient::create_achievement(self, user_id, playlist_id)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PlayerView {
    pub(crate) video: Video,
    pub(crate) notes: Vec<Note>,
    pub(crate) playlist_videos: Vec<Video>,
    pub(crate) unlocked: bool,
    pub(crate) status_advanced: bool,
}

impl PlayerView {
    pub(crate) fn sequencer(&self) -> VideoSequencer<'_> {
        VideoSequencer::new(&self.playlist_videos, self.video.id)
    }

    pub(crate) fn progress(&self) -> PlaylistProgress {
        calculate_progress(&self.playlist_videos)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CompletionOutcome {
    Advance { next: Video },
    SequenceComplete { achievement: Option<Achievement> },
    /// The video has no playlist, or is no longer listed in it.
    Standalone,
}

#[derive(Debug, Clone)]
pub(crate) struct CompletionReport {
    pub(crate) outcome: CompletionOutcome,
    pub(crate) progress: PlaylistProgress,
}

fn join_fetch<T>(handle: ScopedJoinHandle<'_, Result<T, ApiError>>, what: &str) -> Result<T> {
    handle
        .join()
        .map_err(|_| anyhow!("{what} fetch panicked"))?
        .with_context(|| format!("failed to fetch {what}"))
}

/// Playlist metadata and its ordered videos, fetched side by side.
pub(crate) fn load_playlist(api: &impl StudyApi, playlist_id: i64) -> Result<(Playlist, Vec<Video>)> {
    thread::scope(|scope| {
        let playlist = scope.spawn(|| api.get_playlist(playlist_id));
        let videos = scope.spawn(|| api.videos_for_playlist(playlist_id));
        let playlist = join_fetch(playlist, "playlist");
        let videos = join_fetch(videos, "playlist videos");
        Ok((playlist?, videos?))
    })
}

/// Fetches the video, its notes and its playlist's videos, and works out
/// whether the video is unlocked. Changes nothing on the server.
pub(crate) fn load_video(api: &impl StudyApi, video_id: i64, strict: bool) -> Result<PlayerView> {
    let (video, notes) = thread::scope(|scope| {
        let video = scope.spawn(|| api.get_video(video_id));
        let notes = scope.spawn(|| api.notes_for_video(video_id));
        (join_fetch(video, "video"), join_fetch(notes, "notes"))
    });
    let video = video?;
    let notes = notes?;

    let playlist_videos = match video.playlist_id() {
        Some(playlist_id) => api
            .videos_for_playlist(playlist_id)
            .context("failed to fetch playlist videos")?,
        None => Vec::new(),
    };

    let unlocked = VideoSequencer::new(&playlist_videos, video.id).current_unlocked(strict);
    Ok(PlayerView {
        video,
        notes,
        playlist_videos,
        unlocked,
        status_advanced: false,
    })
}

/// Loads the player view and, when the video is unlocked and still
/// `TO_WATCH`, moves it to `WATCHING`. A failed status update fails the open.
pub(crate) fn open_video(api: &impl StudyApi, video_id: i64, strict: bool) -> Result<PlayerView> {
    let mut view = load_video(api, video_id, strict)?;
    if !view.unlocked || view.video.status != VideoStatus::ToWatch {
        return Ok(view);
    }

    api.update_video_status(view.video.id, VideoStatus::Watching)
        .context("failed to mark video as watching")?;
    debug!(video_id = view.video.id, "status advanced to WATCHING");
    view.video.status = VideoStatus::Watching;
    if let Some(listed) = view
        .playlist_videos
        .iter_mut()
        .find(|v| v.id == view.video.id)
    {
        listed.status = VideoStatus::Watching;
    }
    view.status_advanced = true;
    Ok(view)
}

/// Marks the viewed video `COMPLETED` and works out what comes next. Reaching
/// the end of the playlist records an achievement; failing to record it does
/// not fail the completion.
pub(crate) fn complete_video(
    api: &impl StudyApi,
    user_id: i64,
    view: &PlayerView,
    strict: bool,
) -> Result<CompletionReport> {
    if strict && !view.unlocked {
        let blocker = view
            .sequencer()
            .previous()
            .map(|video| video.title.clone())
            .unwrap_or_else(|| "the previous video".to_string());
        bail!("video is locked: complete \"{blocker}\" first");
    }

    api.update_video_status(view.video.id, VideoStatus::Completed)
        .context("failed to mark video as completed")?;
    info!(video_id = view.video.id, "video completed");

    let Some(playlist_id) = view.video.playlist_id() else {
        return Ok(CompletionReport {
            outcome: CompletionOutcome::Standalone,
            progress: PlaylistProgress::default(),
        });
    };

    let videos = api
        .videos_for_playlist(playlist_id)
        .context("failed to refresh playlist videos")?;
    let progress = calculate_progress(&videos);
    let outcome = match VideoSequencer::new(&videos, view.video.id).next() {
        SequenceStep::Next(next) => CompletionOutcome::Advance { next: next.clone() },
        SequenceStep::Complete => {
            let achievement = match api.create_achievement(user_id, playlist_id) {
                Ok(achievement) => Some(achievement),
                Err(err) => {
                    warn!(playlist_id, %err, "failed to record achievement");
                    None
                }
            };
            CompletionOutcome::SequenceComplete { achievement }
        }
        SequenceStep::NotFound => CompletionOutcome::Standalone,
    };

    Ok(CompletionReport { outcome, progress })
}

/// Explicit status override. Any direction is allowed; moving backwards is
/// only logged.
pub(crate) fn override_status(
    api: &impl StudyApi,
    video_id: i64,
    target: VideoStatus,
) -> Result<VideoStatus> {
    let current = api
        .get_video(video_id)
        .context("failed to fetch video")?
        .status;
    if current == target {
        return Ok(current);
    }
    if !current.advances_to(target) {
        info!(video_id, from = %current, to = %target, "status moved backwards by override");
    }
    api.update_video_status(video_id, target)
        .context("failed to update status")?;
    Ok(current)
}
