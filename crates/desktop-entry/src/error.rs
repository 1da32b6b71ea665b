#[derive(Debug, thiserror::Error)]
pub enum DesktopEntryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot launch an empty command")]
    EmptyCommand,

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DesktopEntryError>;
