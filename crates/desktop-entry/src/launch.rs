//! Detached process launching.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use crate::entry::DesktopEntry;
use crate::error::{DesktopEntryError, Result};

/// Spawns `command` detached from the caller and returns its pid.
///
/// The working directory defaults to the user's home. Standard streams are
/// redirected to null and a background thread reaps the child.
pub fn launch(command: &[String], working_dir: Option<&Path>) -> Result<u32> {
    let (program, args) = command.split_first().ok_or(DesktopEntryError::EmptyCommand)?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let working_dir: Option<PathBuf> = working_dir
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .or_else(dirs::home_dir);
    if let Some(dir) = working_dir.filter(|dir| dir.is_dir()) {
        cmd.current_dir(dir);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut child = cmd.spawn().map_err(|source| DesktopEntryError::Spawn {
        program: program.clone(),
        source,
    })?;
    let pid = child.id();
    log::info!("launched {program} (pid {pid})");

    thread::spawn(move || {
        if let Err(error) = child.wait() {
            log::debug!("failed to reap pid {pid}: {error}");
        }
    });

    Ok(pid)
}

impl DesktopEntry {
    /// Launches the entry's command in its configured working directory.
    pub fn launch(&self) -> Result<u32> {
        let working_dir = Path::new(&self.working_directory);
        launch(&self.command, Some(working_dir))
    }
}
