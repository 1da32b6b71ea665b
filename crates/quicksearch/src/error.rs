#[derive(Debug, thiserror::Error)]
pub enum QuicksearchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid name filter: {0}")]
    Pattern(String),

    #[error("Launch error: {0}")]
    Launch(#[from] desktop_entry::DesktopEntryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, QuicksearchError>;
