//! Process reloader — replaces the running process with a fresh copy of
//! itself so newly installed dependencies are picked up.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use crate::error::DaemonError;

/// Re-launches the current process.
///
/// A real implementation does not return on success; `Ok(())` exists so
/// test doubles can report a reload without replacing the test process.
#[cfg_attr(test, mockall::automock)]
pub trait Reloader: Send + Sync {
    fn reload(&self) -> Result<(), DaemonError>;
}

/// Replaces the process image with `current_exe()` and the original
/// arguments (minus argv[0]).
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecReloader;

impl Reloader for ExecReloader {
    fn reload(&self) -> Result<(), DaemonError> {
        let exe = std::env::current_exe().map_err(|err| DaemonError::ReloadFailed {
            reason: format!("cannot locate current executable: {err}"),
        })?;
        let args: Vec<OsString> = std::env::args_os().skip(1).collect();
        tracing::info!(exe = %exe.display(), args = args.len(), "replacing process image");
        replace_process(&exe, &args)
    }
}

#[cfg(unix)]
fn replace_process(exe: &Path, args: &[OsString]) -> Result<(), DaemonError> {
    use std::os::unix::process::CommandExt;

    // exec only returns on failure.
    let err = Command::new(exe).args(args).exec();
    Err(DaemonError::ReloadFailed {
        reason: format!("exec {} failed: {err}", exe.display()),
    })
}

#[cfg(not(unix))]
fn replace_process(exe: &Path, args: &[OsString]) -> Result<(), DaemonError> {
    Command::new(exe)
        .args(args)
        .spawn()
        .map_err(|err| DaemonError::ReloadFailed {
            reason: format!("spawn {} failed: {err}", exe.display()),
        })?;
    std::process::exit(0)
}
