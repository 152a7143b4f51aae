use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Clear, Gauge, Padding, Paragraph, Row, Table, Wrap,
};

use crate::model::VideoStatus;

use super::super::format::{format_timestamp, status_marker, truncate, video_duration_text};
use super::super::notes::extract_attachments;
use super::super::progress::{PlaylistProgress, calculate_progress, format_minutes};
use super::super::sequencer::is_unlocked;
use super::super::timer::TimerState;
use super::{Screen, TuiState};

const ACCENT: Color = Color::Rgb(110, 170, 255);
const MUTED: Color = Color::Rgb(185, 195, 210);

pub(super) fn draw_tui(frame: &mut Frame, state: &mut TuiState) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, state, chunks[0]);

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[1]);
    let details_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(body_chunks[1]);

    match state.screen {
        Screen::Playlists => draw_playlists(frame, state, body_chunks[0], details_chunks[0]),
        Screen::Videos => draw_videos(frame, state, body_chunks[0], details_chunks[0]),
    }

    let progress = match state.screen {
        Screen::Playlists => state
            .selected_playlist()
            .map(|playlist| calculate_progress(&playlist.videos)),
        Screen::Videos => Some(calculate_progress(&state.videos)),
    };
    if let Some(progress) = progress {
        frame.render_widget(progress_gauge(&progress), details_chunks[1]);
    }
    draw_timer(frame, state, details_chunks[2]);

    let command_bar = Paragraph::new(controls_line(state.screen))
        .alignment(Alignment::Center)
        .block(panel_block("Controls"));
    frame.render_widget(command_bar, chunks[2]);

    let status_widget = Paragraph::new(state.status.clone())
        .style(status_style(&state.status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[3]);

    if let Some(confirm) = state.pending_delete.as_ref() {
        let popup_text = format!(
            "Delete playlist?\n\n{}\n\nIts videos and notes go with it.\n\n[y / Enter] Delete   [n / Esc] Cancel",
            truncate(&confirm.title, 56)
        );
        render_popup(frame, "Confirm Delete", &popup_text);
    } else if let Some(notice) = state.pending_notice.as_ref() {
        render_popup(frame, notice.title, &notice.message);
    }
}

fn draw_header(frame: &mut Frame, state: &TuiState, area: Rect) {
    let context = match (state.screen, state.open_playlist.as_ref()) {
        (Screen::Videos, Some(playlist)) => truncate(&playlist.title, 40),
        _ => format!("{} playlists", state.playlists.len()),
    };
    let mut spans = vec![
        Span::styled(
            "STUDYTRACK",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(state.user.name.clone(), Style::default().fg(MUTED)),
        Span::raw("   "),
        Span::styled(context, Style::default().fg(MUTED)),
        Span::raw("   "),
        Span::styled(state.screen.label(), Style::default().fg(Color::Yellow)),
    ];
    if state.strict {
        spans.push(Span::raw("   "));
        spans.push(Span::styled("STRICT", Style::default().fg(Color::Rgb(255, 145, 120))));
    }
    let header = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(panel_block("Dashboard"));
    frame.render_widget(header, area);
}

fn draw_playlists(frame: &mut Frame, state: &mut TuiState, list_area: Rect, details_area: Rect) {
    let rows: Vec<Row> = state
        .playlists
        .iter()
        .map(|playlist| {
            let progress = calculate_progress(&playlist.videos);
            Row::new(vec![
                Cell::from(playlist.title.clone()),
                Cell::from(progress.total.to_string()),
                Cell::from(format!("{}%", progress.percentage)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(70),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(header_row(vec!["Title", "Videos", "Done"]))
    .block(panel_block("Playlists"))
    .row_highlight_style(highlight_style())
    .highlight_symbol("▸ ");
    frame.render_stateful_widget(table, list_area, &mut state.playlist_table);

    let details = match state.selected_playlist() {
        Some(playlist) => {
            let progress = calculate_progress(&playlist.videos);
            let description = playlist
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or("-");
            format!(
                "Title\n{}\n\nDescription\n{}\n\nVideos\n{} done, {} watching, {} left\n\nTime\n{} of {}",
                truncate(&playlist.title, 40),
                truncate(description, 120),
                progress.completed,
                progress.watching,
                progress.remaining,
                format_minutes(progress.watched_minutes),
                format_minutes(progress.total_minutes),
            )
        }
        None => "No playlists yet.\n\nRun `studytrack import <url>` to add one.".to_string(),
    };
    frame.render_widget(details_paragraph(details, "Selected"), details_area);
}

fn draw_videos(frame: &mut Frame, state: &mut TuiState, list_area: Rect, details_area: Rect) {
    let rows: Vec<Row> = state
        .videos
        .iter()
        .enumerate()
        .map(|(idx, video)| {
            let locked = state.strict && !is_unlocked(&state.videos, idx);
            let title = if locked {
                format!("{} (locked)", video.title)
            } else {
                video.title.clone()
            };
            let style = match video.status {
                VideoStatus::Completed => Style::default().fg(Color::Rgb(130, 200, 140)),
                VideoStatus::Watching => Style::default().fg(Color::Yellow),
                VideoStatus::ToWatch if locked => Style::default().fg(Color::Rgb(110, 115, 125)),
                VideoStatus::ToWatch => Style::default().fg(Color::Rgb(230, 230, 230)),
            };
            Row::new(vec![
                Cell::from((idx + 1).to_string()),
                Cell::from(status_marker(video.status)),
                Cell::from(title),
                Cell::from(video_duration_text(video)),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Percentage(70),
            Constraint::Length(9),
        ],
    )
    .header(header_row(vec!["#", "", "Title", "Length"]))
    .block(panel_block("Videos"))
    .row_highlight_style(highlight_style())
    .highlight_symbol("▸ ");
    frame.render_stateful_widget(table, list_area, &mut state.video_table);

    let details = match state.selected_video() {
        Some(video) => {
            let mut text = format!(
                "Title\n{}\n\nChannel\n{}\n\nStatus\n{}   Length {}",
                truncate(&video.title, 40),
                video.channel.as_deref().unwrap_or("-"),
                video.status.label(),
                video_duration_text(video),
            );
            if let Some(view) = state.player.as_ref().filter(|view| view.video.id == video.id) {
                text.push_str(&format!("\n\nPosition\n{}", view.sequencer().position_label()));
                if let Some(url) = view.video.url.as_deref() {
                    text.push_str(&format!("\n\nURL\n{url}"));
                }
                text.push_str(&format!("\n\nNotes ({})", view.notes.len()));
                for note in &view.notes {
                    let stamp = note
                        .updated_at
                        .as_deref()
                        .or(note.created_at.as_deref())
                        .map(format_timestamp)
                        .unwrap_or_default();
                    let first_line = note.content.lines().next().unwrap_or_default();
                    text.push_str(&format!("\n- {} {}", stamp, truncate(first_line, 60)));
                    for attachment in extract_attachments(&note.content) {
                        text.push_str(&format!("\n    📎 {}", truncate(&attachment.title, 40)));
                    }
                }
            } else {
                text.push_str("\n\nPress Enter to open and load notes.");
            }
            text
        }
        None => "This playlist has no videos yet.".to_string(),
    };
    frame.render_widget(details_paragraph(details, "Video"), details_area);
}

fn draw_timer(frame: &mut Frame, state: &TuiState, area: Rect) {
    let timer = &state.timer;
    let color = match timer.state() {
        TimerState::Running => Color::Rgb(130, 200, 140),
        TimerState::Paused => Color::Yellow,
        TimerState::Idle | TimerState::Expired => MUTED,
    };
    let label = format!(
        "{}  {}  ({})",
        timer.phase().label(),
        timer.display(),
        timer.state().label()
    );
    let gauge = Gauge::default()
        .block(panel_block("Timer"))
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .label(label)
        .ratio(timer.elapsed_ratio());
    frame.render_widget(gauge, area);
}

fn progress_gauge(progress: &PlaylistProgress) -> Gauge<'static> {
    let label = if progress.is_finished() {
        "Complete".to_string()
    } else {
        format!(
            "{}%  {}/{}  {} left",
            progress.percentage,
            progress.completed,
            progress.total,
            format_minutes(progress.remaining_minutes())
        )
    };
    Gauge::default()
        .block(panel_block("Progress"))
        .gauge_style(
            Style::default()
                .fg(Color::Rgb(130, 190, 255))
                .bg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .label(label)
        .ratio(progress.ratio())
}

fn details_paragraph(text: String, title: &'static str) -> Paragraph<'static> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::Rgb(230, 230, 230)))
        .wrap(Wrap { trim: false })
        .block(panel_block(title))
        .alignment(Alignment::Left)
}

fn header_row(labels: Vec<&'static str>) -> Row<'static> {
    Row::new(labels).style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
}

fn highlight_style() -> Style {
    Style::default()
        .bg(ACCENT)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn modal_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(
            Style::default()
                .fg(Color::Rgb(160, 190, 235))
                .add_modifier(Modifier::BOLD),
        )
        .title(title)
        .padding(Padding::new(2, 2, 1, 1))
}

fn controls_line(screen: Screen) -> Line<'static> {
    let keys = match screen {
        Screen::Playlists => "↑/↓ move  Enter open  r refresh  d delete",
        Screen::Videos => "↑/↓ move  Enter open  c complete  s status  n/p next/prev  Esc back",
    };
    Line::from(vec![
        Span::styled(keys, Style::default().fg(MUTED)),
        Span::styled(
            "   t timer  T reset  +/- study  [/] break  q quit",
            Style::default().fg(Color::Rgb(150, 160, 175)),
        ),
    ])
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(Color::Rgb(205, 165, 255))
    } else {
        Style::default().fg(Color::Rgb(230, 235, 242))
    }
}

fn render_popup(frame: &mut Frame, title: &'static str, text: &str) {
    let popup_area = popup_rect_for_text(frame.area(), text);
    render_popup_shadow(frame, popup_area);
    frame.render_widget(Clear, popup_area);
    let popup = Paragraph::new(text.to_string())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(modal_block(title));
    frame.render_widget(popup, popup_area);
}

fn render_popup_shadow(frame: &mut Frame, popup_area: Rect) {
    let area = frame.area();
    let shadow = Rect::new(
        (popup_area.x + 1).min(area.x + area.width.saturating_sub(1)),
        (popup_area.y + 1).min(area.y + area.height.saturating_sub(1)),
        popup_area.width.saturating_sub(1),
        popup_area.height.saturating_sub(1),
    );
    if shadow.width == 0 || shadow.height == 0 {
        return;
    }
    let shadow_block = Block::default().style(Style::default().bg(Color::Rgb(14, 16, 24)));
    frame.render_widget(shadow_block, shadow);
}

fn popup_rect_for_text(area: Rect, text: &str) -> Rect {
    let widest = text
        .lines()
        .map(|line| line.chars().count() as u16)
        .max()
        .unwrap_or(0);
    let line_count = text.lines().count() as u16;

    let available_width = area.width.saturating_sub(2).max(1);
    let width = widest
        .saturating_add(12)
        .clamp(44.min(available_width), 72.min(available_width));

    let available_height = area.height.saturating_sub(2).max(1);
    let height = line_count
        .saturating_add(6)
        .clamp(8.min(available_height), 18.min(available_height));

    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_fits_inside_small_terminals() {
        let area = Rect::new(0, 0, 30, 6);
        let popup = popup_rect_for_text(area, "Study session complete! Take a break.");
        assert!(popup.width <= 28);
        assert!(popup.height <= 4);
        assert!(popup.x + popup.width <= area.width);
    }

    #[test]
    fn status_style_highlights_errors() {
        assert!(status_style("ERROR: boom").add_modifier.contains(Modifier::BOLD));
        assert!(!status_style("INFO: ok").add_modifier.contains(Modifier::BOLD));
    }
}
