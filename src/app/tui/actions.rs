use anyhow::{Result, anyhow, bail};
use ratatui::widgets::TableState;

use crate::model::VideoStatus;

use super::super::AppContext;
use super::super::player::{
    CompletionOutcome, complete_video, load_playlist, load_video, open_video, override_status,
};
use super::super::sequencer::{SequenceStep, VideoSequencer};
use super::super::timer::{Phase, TimerEvent, TimerSettings};
use super::{PendingDelete, PendingNotice, Screen, TuiState};

/// Keeps the selection on `preferred` when it is still listed, otherwise
/// clamps the old selection into range.
fn reselect(table: &mut TableState, ids: &[i64], preferred: Option<i64>) {
    if ids.is_empty() {
        table.select(None);
        return;
    }

    if let Some(id) = preferred
        && let Some(idx) = ids.iter().position(|candidate| *candidate == id)
    {
        table.select(Some(idx));
        return;
    }

    match table.selected() {
        Some(selected) => table.select(Some(selected.min(ids.len() - 1))),
        None => table.select(Some(0)),
    }
}

pub(super) fn refresh_playlists(
    ctx: &AppContext,
    state: &mut TuiState,
    preferred_id: Option<i64>,
) -> Result<()> {
    state.playlists = ctx.api.playlists_for_user(state.user.id)?;
    let ids: Vec<i64> = state.playlists.iter().map(|playlist| playlist.id).collect();
    reselect(&mut state.playlist_table, &ids, preferred_id);
    Ok(())
}

pub(super) fn refresh_videos(
    ctx: &AppContext,
    state: &mut TuiState,
    preferred_id: Option<i64>,
) -> Result<()> {
    let Some(playlist_id) = state.open_playlist.as_ref().map(|playlist| playlist.id) else {
        bail!("no playlist open");
    };
    state.videos = ctx.api.videos_for_playlist(playlist_id)?;
    let ids: Vec<i64> = state.videos.iter().map(|video| video.id).collect();
    reselect(&mut state.video_table, &ids, preferred_id);
    Ok(())
}

pub(super) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(super) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

pub(super) fn open_selected_playlist(ctx: &AppContext, state: &mut TuiState) -> Result<String> {
    let Some(playlist_id) = state.selected_playlist().map(|playlist| playlist.id) else {
        bail!("no playlist selected");
    };
    let (playlist, videos) = load_playlist(&ctx.api, playlist_id)?;

    // Land on the first video that still needs watching.
    let resume = videos
        .iter()
        .position(|video| video.status != VideoStatus::Completed)
        .or((!videos.is_empty()).then_some(0));
    state.video_table.select(resume);
    state.videos = videos;
    state.player = None;
    state.screen = Screen::Videos;

    let message = format!("Opened {}.", playlist.title);
    state.open_playlist = Some(playlist);
    Ok(message)
}

pub(super) fn open_selected_video(ctx: &AppContext, state: &mut TuiState) -> Result<String> {
    let Some(video_id) = state.selected_video().map(|video| video.id) else {
        bail!("no video selected");
    };
    let view = open_video(&ctx.api, video_id, state.strict)?;
    if !view.playlist_videos.is_empty() {
        state.videos = view.playlist_videos.clone();
    }

    let message = if !view.unlocked {
        let blocker = view
            .sequencer()
            .previous()
            .map(|video| video.title.clone())
            .unwrap_or_else(|| "the previous video".to_string());
        format!("Locked: complete \"{blocker}\" first.")
    } else if view.status_advanced {
        format!("Now watching: {}", view.video.title)
    } else {
        format!("Opened {}.", view.video.title)
    };
    state.player = Some(view);
    Ok(message)
}

pub(super) fn complete_selected_video(ctx: &AppContext, state: &mut TuiState) -> Result<String> {
    let Some(video_id) = state.selected_video().map(|video| video.id) else {
        bail!("no video selected");
    };
    let view = match state.player.take() {
        Some(view) if view.video.id == video_id => view,
        _ => load_video(&ctx.api, video_id, state.strict)?,
    };
    let report = match complete_video(&ctx.api, state.user.id, &view, state.strict) {
        Ok(report) => report,
        Err(err) => {
            state.player = Some(view);
            return Err(err);
        }
    };

    let message = match report.outcome {
        CompletionOutcome::Advance { next } => {
            refresh_videos(ctx, state, Some(next.id))?;
            format!("Completed. Up next: {} ({}%)", next.title, report.progress.percentage)
        }
        CompletionOutcome::SequenceComplete { achievement } => {
            refresh_videos(ctx, state, Some(video_id))?;
            let earned = match achievement {
                Some(achievement) => format!(
                    "\n\nEarned: {}",
                    achievement
                        .title
                        .unwrap_or_else(|| format!("Achievement #{}", achievement.id))
                ),
                None => String::new(),
            };
            state.pending_notice = Some(PendingNotice {
                title: "Playlist Complete",
                message: format!(
                    "You finished every video in this playlist.{earned}\n\n[any key] Close"
                ),
            });
            "Playlist complete.".to_string()
        }
        CompletionOutcome::Standalone => format!("Completed {}.", view.video.title),
    };
    Ok(message)
}

pub(super) fn cycle_selected_status(ctx: &AppContext, state: &mut TuiState) -> Result<String> {
    let Some((video_id, title, status)) = state
        .selected_video()
        .map(|video| (video.id, video.title.clone(), video.status))
    else {
        bail!("no video selected");
    };
    let target = status.cycle();
    let previous = override_status(&ctx.api, video_id, target)?;
    state.player = None;
    refresh_videos(ctx, state, Some(video_id))?;
    Ok(format!("{title}: {} -> {}", previous.label(), target.label()))
}

pub(super) fn select_adjacent_video(state: &mut TuiState, forward: bool) -> Result<String> {
    let Some(video_id) = state.selected_video().map(|video| video.id) else {
        bail!("no video selected");
    };
    let sequencer = VideoSequencer::new(&state.videos, video_id);
    let target = if forward {
        match sequencer.next() {
            SequenceStep::Next(video) => video.id,
            SequenceStep::Complete => bail!("already at the last video"),
            SequenceStep::NotFound => bail!("selected video is no longer listed"),
        }
    } else {
        sequencer
            .previous()
            .map(|video| video.id)
            .ok_or_else(|| anyhow!("already at the first video"))?
    };

    let landed = VideoSequencer::new(&state.videos, target);
    state.video_table.select(landed.current_index());
    Ok(format!("Video {}", landed.position_label()))
}

pub(super) fn delete_playlist(
    ctx: &AppContext,
    state: &mut TuiState,
    dialog: &PendingDelete,
) -> Result<String> {
    ctx.api.delete_playlist(dialog.playlist_id)?;
    if state
        .open_playlist
        .as_ref()
        .is_some_and(|playlist| playlist.id == dialog.playlist_id)
    {
        state.open_playlist = None;
        state.videos.clear();
    }
    refresh_playlists(ctx, state, None)?;
    Ok(format!("Deleted {}.", dialog.title))
}

/// Shifts the study or break length by `delta` minutes. Applying new
/// settings stops the timer.
pub(super) fn adjust_timer_minutes(state: &mut TuiState, phase: Phase, delta: i32) -> String {
    let current = state.timer.settings().unwrap_or_default();
    let settings = match phase {
        Phase::Study => TimerSettings::new(
            current.study_minutes().saturating_add_signed(delta),
            current.break_minutes(),
        ),
        Phase::Break => TimerSettings::new(
            current.study_minutes(),
            current.break_minutes().saturating_add_signed(delta),
        ),
    };
    state.timer.apply_settings(settings);
    format!(
        "Study {}m / break {}m. Timer stopped.",
        settings.study_minutes(),
        settings.break_minutes()
    )
}

/// Feeds elapsed ticker beats into the timer and raises a notice when a
/// phase ends.
pub(super) fn apply_timer_ticks(state: &mut TuiState, ticks: usize) {
    for _ in 0..ticks {
        let Some(TimerEvent::Expired(phase)) = state.timer.tick() else {
            continue;
        };
        let message = match phase {
            Phase::Study => "Study session complete! Take a break.",
            Phase::Break => "Break time over! Ready to study?",
        };
        state.status = status_info(message);
        state.pending_notice = Some(PendingNotice {
            title: "Timer",
            message: format!("{message}\n\nPress t to start the next phase.\n\n[any key] Close"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::User;

    fn state() -> TuiState {
        TuiState::new(
            User {
                id: 1,
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            },
            false,
        )
    }

    #[test]
    fn reselect_prefers_requested_id_then_clamps() {
        let mut table = TableState::default();
        reselect(&mut table, &[4, 5, 6], Some(6));
        assert_eq!(table.selected(), Some(2));

        reselect(&mut table, &[4, 5], Some(9));
        assert_eq!(table.selected(), Some(1));

        reselect(&mut table, &[], None);
        assert_eq!(table.selected(), None);
    }

    #[test]
    fn adjusting_study_minutes_clamps_and_stops_timer() {
        let mut state = state();
        state.timer.start();
        let msg = adjust_timer_minutes(&mut state, Phase::Study, -40);
        assert_eq!(msg, "Study 1m / break 5m. Timer stopped.");
        assert!(!state.timer.is_running());
        assert_eq!(state.timer.display(), "01:00");
    }

    #[test]
    fn break_length_is_adjustable_and_clamped() {
        let mut state = state();
        let msg = adjust_timer_minutes(&mut state, Phase::Break, 5);
        assert_eq!(msg, "Study 25m / break 10m. Timer stopped.");

        let msg = adjust_timer_minutes(&mut state, Phase::Break, 100);
        assert_eq!(msg, "Study 25m / break 60m. Timer stopped.");

        adjust_timer_minutes(&mut state, Phase::Break, -100);
        assert_eq!(state.timer.settings().map(|s| s.break_minutes()), Some(1));
        assert_eq!(state.timer.display(), "25:00");
    }

    #[test]
    fn finished_study_phase_raises_notice() {
        let mut state = state();
        adjust_timer_minutes(&mut state, Phase::Study, -40);
        state.timer.start();
        apply_timer_ticks(&mut state, 60);
        let notice = state.pending_notice.expect("notice");
        assert_eq!(notice.title, "Timer");
        assert!(notice.message.starts_with("Study session complete!"));
        assert_eq!(state.timer.phase(), Phase::Break);
    }
}
