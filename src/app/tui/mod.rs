mod actions;
mod render;
mod terminal;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;

use crate::model::{Playlist, User, Video};

use super::AppContext;
use super::player::PlayerView;
use super::ticker::Ticker;
use super::timer::{CountdownTimer, Phase, TimerSettings};

use self::actions::{
    adjust_timer_minutes, apply_timer_ticks, complete_selected_video, cycle_selected_status,
    delete_playlist, open_selected_playlist, open_selected_video, refresh_playlists,
    refresh_videos, select_adjacent_video, status_error, status_info,
};
use self::render::draw_tui;
use self::terminal::TerminalGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Playlists,
    Videos,
}

impl Screen {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Playlists => "PLAYLISTS",
            Self::Videos => "VIDEOS",
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct PendingDelete {
    pub(super) playlist_id: i64,
    pub(super) title: String,
}

#[derive(Debug, Clone)]
pub(super) struct PendingNotice {
    pub(super) title: &'static str,
    pub(super) message: String,
}

pub(super) struct TuiState {
    pub(super) user: User,
    pub(super) strict: bool,
    pub(super) screen: Screen,
    pub(super) playlists: Vec<Playlist>,
    pub(super) playlist_table: TableState,
    pub(super) open_playlist: Option<Playlist>,
    pub(super) videos: Vec<Video>,
    pub(super) video_table: TableState,
    /// The last video opened with Enter, with its notes.
    pub(super) player: Option<PlayerView>,
    pub(super) status: String,
    pub(super) pending_delete: Option<PendingDelete>,
    pub(super) pending_notice: Option<PendingNotice>,
    pub(super) timer: CountdownTimer,
}

impl TuiState {
    pub(super) fn new(user: User, strict: bool) -> Self {
        Self {
            user,
            strict,
            screen: Screen::Playlists,
            playlists: Vec::new(),
            playlist_table: TableState::default(),
            open_playlist: None,
            videos: Vec::new(),
            video_table: TableState::default(),
            player: None,
            status: status_info("Ready."),
            pending_delete: None,
            pending_notice: None,
            timer: CountdownTimer::study_break(TimerSettings::default()),
        }
    }

    pub(super) fn selected_playlist(&self) -> Option<&Playlist> {
        self.playlist_table
            .selected()
            .and_then(|idx| self.playlists.get(idx))
    }

    pub(super) fn selected_video(&self) -> Option<&Video> {
        self.video_table.selected().and_then(|idx| self.videos.get(idx))
    }

    fn active_table(&mut self) -> (&mut TableState, usize) {
        match self.screen {
            Screen::Playlists => (&mut self.playlist_table, self.playlists.len()),
            Screen::Videos => (&mut self.video_table, self.videos.len()),
        }
    }

    pub(super) fn move_selection(&mut self, down: bool) {
        let (table, len) = self.active_table();
        let Some(selected) = table.selected() else {
            return;
        };
        let next = if down {
            (selected + 1).min(len.saturating_sub(1))
        } else {
            selected.saturating_sub(1)
        };
        table.select(Some(next));
    }
}

pub(crate) fn run_tui(ctx: &mut AppContext) -> Result<()> {
    let user = ctx.session.require_user()?.clone();
    let mut state = TuiState::new(user, ctx.strict);
    if let Err(err) = refresh_playlists(ctx, &mut state, None) {
        state.status = status_error(&format!("Failed to fetch playlists: {err:#}"));
    } else if state.playlists.is_empty() {
        state.status = status_info("No playlists yet. Run `studytrack import <url>` to add one.");
    }

    let mut guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;
    let ticker = Ticker::every(Duration::from_secs(1));

    loop {
        apply_timer_ticks(&mut state, ticker.drain());
        terminal.draw(|frame| draw_tui(frame, &mut state))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if state.pending_notice.is_some() {
            state.pending_notice = None;
            continue;
        }

        if let Some(dialog) = state.pending_delete.clone() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    state.pending_delete = None;
                    state.status = match delete_playlist(ctx, &mut state, &dialog) {
                        Ok(msg) => status_info(&msg),
                        Err(err) => status_error(&format!("Delete failed: {err:#}")),
                    };
                }
                KeyCode::Esc | KeyCode::Char('n') => {
                    state.pending_delete = None;
                    state.status = status_info("Delete canceled.");
                }
                _ => {}
            }
            continue;
        }

        let result = match (state.screen, key.code) {
            (_, KeyCode::Char('q')) => break,
            (_, KeyCode::Up) => {
                state.move_selection(false);
                continue;
            }
            (_, KeyCode::Down) => {
                state.move_selection(true);
                continue;
            }
            (_, KeyCode::Char('t')) => {
                state.timer.toggle();
                Ok(format!("Timer {}.", state.timer.state().label().to_lowercase()))
            }
            (_, KeyCode::Char('T')) => {
                state.timer.reset();
                Ok("Timer reset.".to_string())
            }
            (_, KeyCode::Char('+')) => Ok(adjust_timer_minutes(&mut state, Phase::Study, 5)),
            (_, KeyCode::Char('-')) => Ok(adjust_timer_minutes(&mut state, Phase::Study, -5)),
            (_, KeyCode::Char(']')) => Ok(adjust_timer_minutes(&mut state, Phase::Break, 1)),
            (_, KeyCode::Char('[')) => Ok(adjust_timer_minutes(&mut state, Phase::Break, -1)),
            (Screen::Playlists, KeyCode::Enter) => open_selected_playlist(ctx, &mut state),
            (Screen::Playlists, KeyCode::Char('r')) => {
                let preferred = state.selected_playlist().map(|playlist| playlist.id);
                refresh_playlists(ctx, &mut state, preferred).map(|()| "Refreshed.".to_string())
            }
            (Screen::Playlists, KeyCode::Char('d')) => {
                let target = state.selected_playlist().map(|playlist| PendingDelete {
                    playlist_id: playlist.id,
                    title: playlist.title.clone(),
                });
                match target {
                    Some(dialog) => {
                        state.pending_delete = Some(dialog);
                        Ok("Confirm delete: y/Enter to delete, n/Esc to cancel.".to_string())
                    }
                    None => Err(anyhow!("no playlist selected")),
                }
            }
            (Screen::Videos, KeyCode::Esc | KeyCode::Backspace) => {
                state.screen = Screen::Playlists;
                state.player = None;
                let preferred = state.open_playlist.as_ref().map(|playlist| playlist.id);
                refresh_playlists(ctx, &mut state, preferred)
                    .map(|()| "Back to playlists.".to_string())
            }
            (Screen::Videos, KeyCode::Enter) => open_selected_video(ctx, &mut state),
            (Screen::Videos, KeyCode::Char('c')) => complete_selected_video(ctx, &mut state),
            (Screen::Videos, KeyCode::Char('s')) => cycle_selected_status(ctx, &mut state),
            (Screen::Videos, KeyCode::Char('n')) => select_adjacent_video(&mut state, true),
            (Screen::Videos, KeyCode::Char('p')) => select_adjacent_video(&mut state, false),
            (Screen::Videos, KeyCode::Char('r')) => {
                let preferred = state.selected_video().map(|video| video.id);
                refresh_videos(ctx, &mut state, preferred).map(|()| "Refreshed.".to_string())
            }
            _ => continue,
        };

        state.status = match result {
            Ok(msg) => status_info(&msg),
            Err(err) => status_error(&format!("{err:#}")),
        };
    }

    drop(ticker);
    terminal.show_cursor()?;
    guard.leave()?;
    Ok(())
}
