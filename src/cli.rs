use clap::{Args, Parser, Subcommand};

use crate::model::VideoStatus;

#[derive(Debug, Parser)]
#[command(
    name = "studytrack",
    version,
    about = "Curate study playlists, track watch progress and take notes"
)]
pub struct Cli {
    /// Base URL of the study-playlist API.
    #[arg(
        long,
        global = true,
        env = "STUDYTRACK_API_URL",
        default_value = "http://localhost:8080/api"
    )]
    pub api_url: String,

    /// Connect/read timeout for API requests, in seconds.
    #[arg(long, global = true, env = "STUDYTRACK_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Only unlock a video once the one before it is completed.
    #[arg(long, global = true, env = "STUDYTRACK_STRICT")]
    pub strict: bool,

    /// Log filter, e.g. `info` or `studytrack=debug`.
    #[arg(long, global = true, env = "STUDYTRACK_LOG")]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    Playlists,
    Playlist {
        id: i64,
    },
    CreatePlaylist {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    UpdatePlaylist {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    DeletePlaylist {
        id: i64,
    },
    Preview {
        url: String,
    },
    Import {
        url: String,
    },
    AddVideo {
        playlist_id: i64,
        url: String,
    },
    DeleteVideo {
        id: i64,
    },
    /// Set a video's status directly, in any direction.
    Status {
        video_id: i64,
        status: VideoStatus,
    },
    Open {
        video_id: i64,
    },
    Complete {
        video_id: i64,
    },
    #[command(subcommand)]
    Notes(NotesCommand),
    Achievements {
        /// Show the server's progress record for one playlist instead.
        #[arg(long)]
        playlist: Option<i64>,
    },
    Stats,
    Timer(TimerArgs),
    Tui,
}

#[derive(Debug, Subcommand)]
pub enum NotesCommand {
    List {
        video_id: i64,
    },
    Add {
        video_id: i64,
        content: String,
        #[command(flatten)]
        attachment: AttachmentArgs,
    },
    Edit {
        note_id: i64,
        video_id: i64,
        content: String,
        #[command(flatten)]
        attachment: AttachmentArgs,
    },
    Delete {
        note_id: i64,
    },
}

#[derive(Debug, Args)]
pub struct AttachmentArgs {
    #[arg(long, requires = "attach_url")]
    pub attach_title: Option<String>,
    #[arg(long, requires = "attach_title")]
    pub attach_url: Option<String>,
}

#[derive(Debug, Args)]
pub struct TimerArgs {
    #[arg(long = "study", default_value_t = 25)]
    pub study_minutes: u32,
    #[arg(long = "break", default_value_t = 5)]
    pub break_minutes: u32,
    /// Number of study sessions to run before exiting.
    #[arg(long, default_value_t = 1)]
    pub cycles: u32,
}
