use std::io::Error;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

/// Errors surfaced by the application shell. The list controller itself
/// never fails; loading and terminal handling do.
#[derive(Debug)]
pub enum HrError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    MissingColumn(String),
}

impl From<Error> for HrError {
    fn from(err: Error) -> Self {
        HrError::IoError(err)
    }
}

impl From<PolarsError> for HrError {
    fn from(err: PolarsError) -> Self {
        HrError::PolarsError(err)
    }
}

impl std::fmt::Display for HrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HrError::IoError(e) => write!(f, "io error: {e}"),
            HrError::PolarsError(e) => write!(f, "dataframe error: {e}"),
            HrError::LoadingFailed(s) => write!(f, "loading failed: {s}"),
            HrError::FileNotFound => write!(f, "file not found"),
            HrError::PermissionDenied => write!(f, "permission denied"),
            HrError::MissingColumn(s) => write!(f, "missing column \"{s}\""),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Role {
    Employee,
    Owner,
    FinanceExecutive,
    HrManager,
    SuperAdmin,
}

/// Explicit session context, built once at startup from the CLI and passed
/// into the model. Replaces any ambient user/designation state.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: String,
    pub role: Role,
}

impl Session {
    pub fn new(user: impl Into<String>, role: Role) -> Self {
        Session {
            user: user.into(),
            role,
        }
    }

    /// Collections reachable for this role. Reachability only; the backend
    /// owns real authorization.
    pub fn collections(&self) -> &'static [Collection] {
        match self.role {
            Role::Employee => &[Collection::Tickets],
            Role::Owner | Role::FinanceExecutive | Role::HrManager => {
                &[Collection::Tickets, Collection::Employees]
            }
            Role::SuperAdmin => &[
                Collection::Tickets,
                Collection::Employees,
                Collection::Companies,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Collection {
    Tickets,
    Employees,
    Companies,
}

impl Collection {
    pub fn title(&self) -> &'static str {
        match self {
            Collection::Tickets => "Tickets",
            Collection::Employees => "Employees",
            Collection::Companies => "Companies",
        }
    }
}

#[derive(Debug, Clone, Setters)]
pub struct AppConfig {
    pub event_poll_time: u64,
    pub page_size: usize,
    pub max_column_width: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            event_poll_time: 100,
            page_size: 10,
            max_column_width: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CmdMode {
    Search,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MoveBeginning,
    MoveEnd,
    NextPage,
    PrevPage,
    CyclePageSize,
    SortAscending,
    SortDescending,
    Search,
    ToggleSelect,
    SelectAll,
    ClearSelection,
    Delete,
    Confirm,
    Abort,
    NextCollection,
    CopyCell,
    CopyRow,
    Help,
    Exit,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
 hrview keys

 j / Down      move cursor down
 k / Up        move cursor up
 h / Left      previous column
 l / Right     next column
 g / Home      first row of page
 G / End       last row of page
 n / PageDown  next page
 p / PageUp    previous page
 z             cycle page size (10/25/50)
 s / S         sort current column asc / desc
 /             search all columns
 Space         toggle row selection
 a             select all rows on page
 c             clear selection
 d             delete row under cursor (y/Enter confirms, Esc cancels)
 t             switch collection
 x             copy cell, X copy row
 ?             this help
 Esc           close popup / cancel
 q             quit
";
