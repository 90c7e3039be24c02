use std::fmt;
use std::io::Error;
use std::path::PathBuf;
use std::time::Duration;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

#[derive(Debug)]
pub enum TSError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    ExportFailed(String),
    Clipboard(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl fmt::Display for TSError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TSError::IoError(e) => write!(f, "io error: {e}"),
            TSError::PolarsError(e) => write!(f, "dataframe error: {e}"),
            TSError::LoadingFailed(msg) => write!(f, "loading failed: {msg}"),
            TSError::ExportFailed(msg) => write!(f, "export failed: {msg}"),
            TSError::Clipboard(msg) => write!(f, "clipboard unavailable: {msg}"),
            TSError::FileNotFound => write!(f, "file not found"),
            TSError::PermissionDenied => write!(f, "permission denied"),
            TSError::UnknownFileType => write!(f, "unsupported file type"),
        }
    }
}

impl std::error::Error for TSError {}

impl From<Error> for TSError {
    fn from(err: Error) -> Self {
        TSError::IoError(err)
    }
}

impl From<PolarsError> for TSError {
    fn from(err: PolarsError) -> Self {
        TSError::PolarsError(err)
    }
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct TSConfig {
    /// Milliseconds the controller waits for a terminal event before emitting a tick.
    pub event_poll_time: u64,
    /// Cells longer than this many chars are clipped in the table.
    pub max_column_width: usize,
    /// Simulated latency of the mock login and chat operations.
    pub mock_latency: Duration,
    pub operation_timeout: Duration,
    pub status_message_ttl: Duration,
    pub export_dir: PathBuf,
}

impl Default for TSConfig {
    fn default() -> Self {
        TSConfig {
            event_poll_time: 100,
            max_column_width: 40,
            mock_latency: Duration::from_millis(1000),
            operation_timeout: Duration::from_secs(10),
            status_message_ttl: Duration::from_secs(3),
            export_dir: std::env::temp_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    Tick,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MoveBeginning,
    MoveEnd,
    Enter,
    Exit,
    EditCell,
    Search,
    CycleFilter,
    ClearSearch,
    ViewRow,
    DeleteRow,
    ShowDashboard,
    ShowUpload,
    ShowValidate,
    SelectFile,
    SubmitUpload,
    ExportReport,
    ToggleChat,
    Logout,
    Help,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
Pages
  1            Dashboard
  2            Upload
  3 / V        Validation report
  L            Logout

Table
  ↑ ↓ ← →      Move selection (also k j h l)
  g / G        First / last row
  Enter / e    Edit cell (editable columns only)
  Enter        Commit edit
  Esc          Cancel edit / close popup
  v            View row
  d            Delete row
  /            Search
  f            Cycle filter mode
  c            Clear search

Upload page
  o            Choose file
  s            Upload selected file

Validation page
  x            Export report

Other
  C            Toggle chat assistant
  ?            Help
  q            Quit
";
