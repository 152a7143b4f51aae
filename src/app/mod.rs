mod format;
mod notes;
mod player;
mod progress;
mod sequencer;
mod session;
mod ticker;
mod timer;
mod tui;


use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::api::ApiClient;
use crate::cli::{AttachmentArgs, Cli, Command, NotesCommand, TimerArgs};
use crate::config::Config;
use crate::db::Database;
use crate::model::{Note, NoteDraft, PlaylistDraft, User, VideoStatus};
use crate::paths::database_file_path;

use self::format::{
    format_timestamp, progress_summary, status_marker, truncate, video_duration_text,
};
use self::notes::{append_attachment, extract_attachments, validate_note_content};
use self::player::{
    CompletionOutcome, complete_video, load_playlist, load_video, open_video, override_status,
};
use self::progress::calculate_progress;
use self::sequencer::{SequenceStep, is_unlocked};
use self::session::Session;
use self::ticker::Ticker;
use self::timer::{CountdownTimer, Phase, TimerEvent, TimerSettings};

pub(crate) struct AppContext {
    pub(crate) api: ApiClient,
    pub(crate) session: Session<Database>,
    pub(crate) strict: bool,
}

pub fn run(cli: Cli, config: Config) -> Result<()> {
    let db = open_db()?;
    let mut session = Session::new(db);
    session.restore();
    let mut ctx = AppContext {
        api: ApiClient::new(&config),
        session,
        strict: config.strict_sequencing,
    };

    match cli.command {
        Some(Command::Login { email, password }) => run_login(&mut ctx, &email, &password)?,
        Some(Command::Signup {
            name,
            email,
            password,
        }) => run_signup(&mut ctx, &name, &email, &password)?,
        Some(Command::Logout) => run_logout(&mut ctx)?,
        Some(Command::Whoami) => run_whoami(&mut ctx)?,
        Some(Command::Playlists) => run_playlists(&ctx)?,
        Some(Command::Playlist { id }) => run_playlist(&ctx, id)?,
        Some(Command::CreatePlaylist { title, description }) => {
            run_create_playlist(&ctx, &title, &description)?
        }
        Some(Command::UpdatePlaylist {
            id,
            title,
            description,
        }) => run_update_playlist(&ctx, id, title, description)?,
        Some(Command::DeletePlaylist { id }) => run_delete_playlist(&ctx, id)?,
        Some(Command::Preview { url }) => run_preview(&ctx, &url)?,
        Some(Command::Import { url }) => run_import(&ctx, &url)?,
        Some(Command::AddVideo { playlist_id, url }) => run_add_video(&ctx, playlist_id, &url)?,
        Some(Command::DeleteVideo { id }) => run_delete_video(&ctx, id)?,
        Some(Command::Status { video_id, status }) => run_status(&ctx, video_id, status)?,
        Some(Command::Open { video_id }) => run_open(&ctx, video_id)?,
        Some(Command::Complete { video_id }) => run_complete(&ctx, video_id)?,
        Some(Command::Notes(command)) => run_notes(&ctx, command)?,
        Some(Command::Achievements { playlist }) => run_achievements(&ctx, playlist)?,
        Some(Command::Stats) => run_stats(&ctx)?,
        Some(Command::Timer(args)) => run_timer(&args)?,
        Some(Command::Tui) | None => tui::run_tui(&mut ctx)?,
    }

    Ok(())
}

fn open_db() -> Result<Database> {
    let db_path = database_file_path()?;
    let db = Database::open(&db_path)?;
    db.migrate()?;
    Ok(db)
}

fn run_login(ctx: &mut AppContext, email: &str, password: &str) -> Result<()> {
    let user = ctx.api.login(email, password).context("login failed")?;
    let user = ctx.session.login(user)?;
    println!("Logged in as {} <{}>", user.name, user.email);
    Ok(())
}

fn run_signup(ctx: &mut AppContext, name: &str, email: &str, password: &str) -> Result<()> {
    let user = ctx
        .api
        .create_user(name, email, password)
        .context("signup failed")?;
    let user = ctx.session.login(user)?;
    println!("Account created. Logged in as {} <{}>", user.name, user.email);
    Ok(())
}

fn run_logout(ctx: &mut AppContext) -> Result<()> {
    match ctx.session.logout()? {
        Some(user) => println!("Logged out {}.", user.email),
        None => println!("No active session."),
    }
    Ok(())
}

fn run_whoami(ctx: &mut AppContext) -> Result<()> {
    let Some(user) = ctx.session.user().cloned() else {
        println!("No active session. Run `studytrack login` first.");
        return Ok(());
    };
    let current = match ctx.api.get_user(user.id) {
        Ok(current) => current,
        Err(err) if err.status() == Some(404) => {
            ctx.session.logout()?;
            println!("Stored user {} no longer exists. Logged out.", user.email);
            return Ok(());
        }
        Err(err) => {
            info!(%err, "could not refresh user, showing stored session");
            user
        }
    };
    println!("{} <{}> (id {})", current.name, current.email, current.id);
    println!("API: {}", ctx.api.base_url());
    Ok(())
}

fn current_user(ctx: &AppContext) -> Result<&User> {
    ctx.session.require_user()
}

fn run_playlists(ctx: &AppContext) -> Result<()> {
    let user = current_user(ctx)?;
    let playlists = ctx
        .api
        .playlists_for_user(user.id)
        .context("failed to fetch playlists")?;
    if playlists.is_empty() {
        println!("No playlists yet. Run `studytrack create-playlist` or `studytrack import`.");
        return Ok(());
    }

    println!("{:<8} {:<44} {:>7} {:>6}", "ID", "TITLE", "VIDEOS", "DONE");
    for playlist in playlists {
        let progress = calculate_progress(&playlist.videos);
        println!(
            "{:<8} {:<44} {:>7} {:>5}%",
            playlist.id,
            truncate(&playlist.title, 44),
            progress.total,
            progress.percentage
        );
    }
    Ok(())
}

fn run_playlist(ctx: &AppContext, id: i64) -> Result<()> {
    let (playlist, videos) = load_playlist(&ctx.api, id)?;
    let progress = calculate_progress(&videos);

    println!("{}", playlist.title);
    if let Some(description) = playlist.description.as_deref().filter(|d| !d.trim().is_empty()) {
        println!("  {}", truncate(description.trim(), 100));
    }
    println!("  {}", progress_summary(&progress));
    println!();

    if videos.is_empty() {
        println!("No videos yet. Run `studytrack add-video {id} <url>`.");
        return Ok(());
    }

    println!(
        "{:<4} {:<3} {:<8} {:<48} {:>8} {}",
        "#", "", "ID", "TITLE", "LENGTH", "STATUS"
    );
    for (idx, video) in videos.iter().enumerate() {
        let lock = if ctx.strict && !is_unlocked(&videos, idx) {
            " (locked)"
        } else {
            ""
        };
        println!(
            "{:<4} {:<3} {:<8} {:<48} {:>8} {}{}",
            idx + 1,
            status_marker(video.status),
            video.id,
            truncate(&video.title, 48),
            video_duration_text(video),
            video.status.label(),
            lock
        );
    }
    Ok(())
}

fn run_create_playlist(ctx: &AppContext, title: &str, description: &str) -> Result<()> {
    let user = current_user(ctx)?;
    let playlist = ctx
        .api
        .create_playlist(&PlaylistDraft {
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            user_id: user.id,
        })
        .context("failed to create playlist")?;
    println!("Created playlist {} (id {})", playlist.title, playlist.id);
    Ok(())
}

fn run_update_playlist(
    ctx: &AppContext,
    id: i64,
    title: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let user = current_user(ctx)?;
    let existing = ctx.api.get_playlist(id).context("failed to fetch playlist")?;
    let draft = PlaylistDraft {
        title: title.unwrap_or(existing.title),
        description: description
            .or(existing.description)
            .unwrap_or_default(),
        user_id: user.id,
    };
    let playlist = ctx
        .api
        .update_playlist(id, &draft)
        .context("failed to update playlist")?;
    println!("Updated playlist {} (id {})", playlist.title, playlist.id);
    Ok(())
}

fn run_delete_playlist(ctx: &AppContext, id: i64) -> Result<()> {
    current_user(ctx)?;
    ctx.api
        .delete_playlist(id)
        .context("failed to delete playlist")?;
    println!("Deleted playlist {id}.");
    Ok(())
}

fn run_preview(ctx: &AppContext, url: &str) -> Result<()> {
    let preview = ctx
        .api
        .preview_playlist(url)
        .context("failed to fetch playlist details")?;
    println!("{}", preview.title);
    if let Some(channel) = preview.channel_title.as_deref() {
        println!("  Channel: {channel}");
    }
    if let Some(count) = preview.video_count {
        println!("  Videos: {count}");
    }
    if let Some(description) = preview.description.as_deref().filter(|d| !d.trim().is_empty()) {
        println!("  {}", truncate(description.trim(), 200));
    }
    Ok(())
}

/// Preview, create the local playlist, then ask the API to pull its videos.
fn run_import(ctx: &AppContext, url: &str) -> Result<()> {
    let user = current_user(ctx)?;
    let preview = ctx
        .api
        .preview_playlist(url)
        .context("failed to fetch playlist details")?;
    let description = preview
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or("Imported from YouTube")
        .to_string();
    let playlist = ctx
        .api
        .create_playlist(&PlaylistDraft {
            title: preview.title.clone(),
            description,
            user_id: user.id,
        })
        .context("failed to create playlist for import")?;
    let result = ctx
        .api
        .import_playlist(url, playlist.id)
        .context("failed to import playlist")?;
    println!(
        "Imported {} videos into {} (id {})",
        result.imported_videos, playlist.title, playlist.id
    );
    Ok(())
}

fn run_add_video(ctx: &AppContext, playlist_id: i64, url: &str) -> Result<()> {
    current_user(ctx)?;
    let video = ctx
        .api
        .add_video(playlist_id, url)
        .context("failed to add video")?;
    println!("Added {} (id {})", video.title, video.id);
    Ok(())
}

fn run_delete_video(ctx: &AppContext, id: i64) -> Result<()> {
    current_user(ctx)?;
    ctx.api.delete_video(id).context("failed to delete video")?;
    println!("Deleted video {id}.");
    Ok(())
}

fn run_status(ctx: &AppContext, video_id: i64, status: VideoStatus) -> Result<()> {
    current_user(ctx)?;
    let previous = override_status(&ctx.api, video_id, status)?;
    if previous == status {
        println!("Video {video_id} is already {}.", status.label());
    } else {
        println!(
            "Video {video_id}: {} -> {}",
            previous.label(),
            status.label()
        );
    }
    Ok(())
}

fn run_open(ctx: &AppContext, video_id: i64) -> Result<()> {
    current_user(ctx)?;
    let view = open_video(&ctx.api, video_id, ctx.strict)?;
    let video = &view.video;
    let sequencer = view.sequencer();

    println!("{}", video.title);
    if let Some(channel) = video.channel.as_deref() {
        println!("  Channel: {channel}");
    }
    println!("  Duration: {}", video_duration_text(video));
    println!("  Status: {}", video.status.label());
    if let Some(url) = video.url.as_deref() {
        println!("  URL: {url}");
    }
    if !view.unlocked {
        let blocker = sequencer
            .previous()
            .map(|prev| prev.title.as_str())
            .unwrap_or("the previous video");
        println!("  Locked: complete \"{blocker}\" to unlock this video.");
    }

    if !view.playlist_videos.is_empty() {
        println!("  Position: {}", sequencer.position_label());
        println!("  Playlist: {}", progress_summary(&view.progress()));
        if let Some(prev) = sequencer.previous() {
            println!("  Previous: {} (id {})", prev.title, prev.id);
        }
        match sequencer.next() {
            SequenceStep::Next(next) => println!("  Next: {} (id {})", next.title, next.id),
            SequenceStep::Complete => println!("  Next: none, this is the last video"),
            SequenceStep::NotFound => {}
        }
    }

    println!();
    if view.notes.is_empty() {
        println!("No notes yet.");
    } else {
        print_notes(&view.notes);
    }
    Ok(())
}

fn run_complete(ctx: &AppContext, video_id: i64) -> Result<()> {
    let user = current_user(ctx)?;
    let view = load_video(&ctx.api, video_id, ctx.strict)?;
    let report = complete_video(&ctx.api, user.id, &view, ctx.strict)?;
    println!("Marked \"{}\" as completed.", view.video.title);

    match report.outcome {
        CompletionOutcome::Advance { next } => {
            println!("  {}", progress_summary(&report.progress));
            println!("Up next: {} (run `studytrack open {}`)", next.title, next.id);
        }
        CompletionOutcome::SequenceComplete { achievement } => {
            println!("  {}", progress_summary(&report.progress));
            println!("Playlist complete. Congratulations!");
            if let Some(achievement) = achievement {
                let label = achievement
                    .title
                    .unwrap_or_else(|| format!("Achievement #{}", achievement.id));
                println!("  Earned: {label}");
                if let Some(url) = achievement.certificate_url {
                    println!("  Certificate: {url}");
                }
            }
        }
        CompletionOutcome::Standalone => {}
    }
    Ok(())
}

fn print_notes(notes: &[Note]) {
    for note in notes {
        let stamp = note
            .updated_at
            .as_deref()
            .or(note.created_at.as_deref())
            .map(format_timestamp)
            .unwrap_or_default();
        println!("#{} {}", note.id, stamp);
        for line in note.content.lines() {
            println!("  {line}");
        }
        let attachments = extract_attachments(&note.content);
        if !attachments.is_empty() {
            println!("  Attachments:");
            for attachment in attachments {
                println!("    - {}: {}", attachment.title, attachment.url);
            }
        }
        println!();
    }
}

fn build_note_content(content: &str, attachment: &AttachmentArgs) -> Result<String> {
    let content = validate_note_content(content)?;
    match (&attachment.attach_title, &attachment.attach_url) {
        (Some(title), Some(url)) => append_attachment(content, title, url),
        _ => Ok(content.to_string()),
    }
}

fn run_notes(ctx: &AppContext, command: NotesCommand) -> Result<()> {
    let user = current_user(ctx)?;
    match command {
        NotesCommand::List { video_id } => {
            let notes = ctx
                .api
                .notes_for_video(video_id)
                .context("failed to fetch notes")?;
            if notes.is_empty() {
                println!("No notes yet for video {video_id}.");
            } else {
                print_notes(&notes);
            }
        }
        NotesCommand::Add {
            video_id,
            content,
            attachment,
        } => {
            let draft = NoteDraft {
                content: build_note_content(&content, &attachment)?,
                video_id,
                user_id: user.id,
            };
            let note = ctx.api.create_note(&draft).context("failed to save note")?;
            println!("Note saved (id {}).", note.id);
        }
        NotesCommand::Edit {
            note_id,
            video_id,
            content,
            attachment,
        } => {
            let draft = NoteDraft {
                content: build_note_content(&content, &attachment)?,
                video_id,
                user_id: user.id,
            };
            ctx.api
                .update_note(note_id, &draft)
                .context("failed to update note")?;
            println!("Note {note_id} updated.");
        }
        NotesCommand::Delete { note_id } => {
            ctx.api
                .delete_note(note_id)
                .context("failed to delete note")?;
            println!("Note {note_id} deleted.");
        }
    }
    Ok(())
}

fn run_achievements(ctx: &AppContext, playlist: Option<i64>) -> Result<()> {
    let user = current_user(ctx)?;
    if let Some(playlist_id) = playlist {
        let progress = ctx
            .api
            .playlist_progress(playlist_id)
            .context("failed to fetch playlist progress")?;
        println!("{}", serde_json::to_string_pretty(&progress)?);
        return Ok(());
    }

    let achievements = ctx
        .api
        .achievements_for_user(user.id)
        .context("failed to fetch achievements")?;
    if achievements.is_empty() {
        println!("No achievements yet. Finish a playlist to earn one.");
        return Ok(());
    }
    for achievement in achievements {
        let title = achievement
            .title
            .clone()
            .or_else(|| achievement.playlist.as_ref().and_then(|p| p.title.clone()))
            .unwrap_or_else(|| format!("Achievement #{}", achievement.id));
        let earned = achievement
            .earned_at
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string());
        println!("{:<48} {}", truncate(&title, 48), earned);
        if let Some(url) = achievement.certificate_url.as_deref() {
            println!("  Certificate: {url}");
        }
    }
    Ok(())
}

fn run_stats(ctx: &AppContext) -> Result<()> {
    let user = current_user(ctx)?;
    let stats = ctx
        .api
        .progress_stats(user.id)
        .context("failed to fetch progress stats")?;
    println!("Learning progress for {}", user.name);
    println!("  Playlists:  {}", stats.total_playlists);
    println!("  Videos:     {}", stats.total_videos);
    println!(
        "  Completed:  {} ({:.0}% done)",
        stats.completed_videos, stats.completion_percentage
    );
    println!("  Watching:   {}", stats.watching_videos);
    println!("  To watch:   {}", stats.to_watch_videos);
    if stats.completion_percentage >= 50.0 {
        println!("Over halfway there. Keep going!");
    }
    Ok(())
}

/// Runs study/break phases in the foreground until the requested number of
/// study sessions has finished.
fn run_timer(args: &TimerArgs) -> Result<()> {
    let settings = TimerSettings::new(args.study_minutes, args.break_minutes);
    let mut timer = CountdownTimer::study_break(settings).with_completion(|phase| match phase {
        Phase::Study => info!("study session complete"),
        Phase::Break => info!("break over"),
    });
    let ticker = Ticker::every(Duration::from_secs(1));
    let mut finished_study = 0;
    let cycles = args.cycles.max(1);

    println!(
        "Study {} min, break {} min, {} session(s).",
        settings.study_minutes(),
        settings.break_minutes(),
        cycles
    );
    timer.start();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "\r{}: {}  ", timer.phase().label(), timer.display())?;
        stdout.flush()?;

        if !ticker.wait(Duration::from_secs(2)) {
            continue;
        }
        match timer.tick() {
            Some(TimerEvent::Expired(Phase::Study)) => {
                finished_study += 1;
                println!("\rStudy session complete! Take a break.");
                if finished_study >= cycles {
                    break;
                }
                timer.start();
            }
            Some(TimerEvent::Expired(Phase::Break)) => {
                println!("\rBreak time over! Ready to study?");
                timer.start();
            }
            None => {}
        }
    }
    Ok(())
}
