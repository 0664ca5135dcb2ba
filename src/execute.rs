//! Execution stage: spawn the run command, time it, account memory.
//!
//! Memory is read from the rusage that `wait4` reports for exactly
//! the reaped pid. Differencing a cumulative children counter around
//! the wait would be distorted whenever sibling workers run children
//! in the same window; the per-pid figure is not.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::toolchain::ResolvedCommand;

/// Knobs for the execution stage, shared by all jobs in a run.
#[derive(Debug, Clone, Default)]
pub struct ExecConfig {
    /// Kill the child and classify as a runtime error after this long.
    /// `None` means wait forever.
    pub timeout: Option<Duration>,
    /// Redirect the child's stdout/stderr into
    /// `<dir>/<file_name>.stdout` / `.stderr` instead of discarding.
    pub capture_dir: Option<PathBuf>,
}

/// Result of running one job's program.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    /// Exited 0.
    Completed { time_seconds: f64, memory_kb: i64 },
    /// Could not start, exited non-zero, or was killed on timeout.
    Failed(String),
}

/// Spawn the resolved run command and wait for it, measuring
/// wall-clock time and the child's peak RSS.
///
/// `file_name` keys the capture files; `cwd` is set for policies that
/// must run from the source's directory. All failures, including an
/// unreachable runtime binary, classify this job only.
pub fn run(
    cmd: &ResolvedCommand,
    cwd: Option<&Path>,
    file_name: &str,
    config: &ExecConfig,
) -> ExecOutcome {
    let mut command = Command::new(&cmd.program);
    command.args(&cmd.args).stdin(Stdio::null());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    match stdio_for(config, file_name) {
        Ok((out, err)) => {
            command.stdout(out).stderr(err);
        }
        Err(e) => return ExecOutcome::Failed(format!("cannot set up output capture: {e}")),
    }

    let start = Instant::now();
    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return ExecOutcome::Failed(format!("runtime not found: {}", cmd.program));
        }
        Err(e) => return ExecOutcome::Failed(format!("failed to start {}: {}", cmd.program, e)),
    };

    match wait_measured(child, config.timeout) {
        Ok(WaitOutcome {
            success: true,
            max_rss_kb,
            ..
        }) => ExecOutcome::Completed {
            time_seconds: start.elapsed().as_secs_f64(),
            memory_kb: max_rss_kb,
        },
        Ok(WaitOutcome { killed: true, .. }) => {
            let timeout = config.timeout.unwrap_or_default();
            ExecOutcome::Failed(format!(
                "timed out after {:.1}s and was killed",
                timeout.as_secs_f64()
            ))
        }
        Ok(wait) => ExecOutcome::Failed(format!("runtime error ({})", wait.describe_status)),
        Err(e) => ExecOutcome::Failed(format!("waiting for child: {e}")),
    }
}

fn stdio_for(config: &ExecConfig, file_name: &str) -> std::io::Result<(Stdio, Stdio)> {
    let Some(dir) = &config.capture_dir else {
        return Ok((Stdio::null(), Stdio::null()));
    };
    std::fs::create_dir_all(dir)?;
    let out = std::fs::File::create(dir.join(format!("{file_name}.stdout")))?;
    let err = std::fs::File::create(dir.join(format!("{file_name}.stderr")))?;
    Ok((Stdio::from(out), Stdio::from(err)))
}

/// What the blocking wait learned about the child.
struct WaitOutcome {
    success: bool,
    killed: bool,
    max_rss_kb: i64,
    describe_status: String,
}

#[cfg(unix)]
fn wait_measured(
    child: std::process::Child,
    timeout: Option<Duration>,
) -> std::io::Result<WaitOutcome> {
    use std::sync::mpsc;

    let pid = child.id() as libc::pid_t;

    // Watchdog: kills the child if the wait outlives the timeout.
    // Disarmed through the channel once the child has been reaped.
    let watchdog = timeout.map(|limit| {
        let (disarm, armed) = mpsc::channel::<()>();
        let handle = std::thread::spawn(move || {
            if armed.recv_timeout(limit).is_err() {
                unsafe {
                    libc::kill(pid, libc::SIGKILL);
                }
                return true;
            }
            false
        });
        (disarm, handle)
    });

    let mut status: libc::c_int = 0;
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let wait_result = loop {
        let ret = unsafe { libc::wait4(pid, &mut status, 0, &mut usage) };
        if ret >= 0 {
            break Ok(());
        }
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EINTR) {
            break Err(err);
        }
    };

    let killed = match watchdog {
        Some((disarm, handle)) => {
            let _ = disarm.send(());
            handle.join().unwrap_or(false)
        }
        None => false,
    };

    // The child was reaped by wait4; dropping the handle only closes
    // its stdio descriptors.
    drop(child);
    wait_result?;

    let exit_status = {
        use std::os::unix::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(status)
    };

    Ok(WaitOutcome {
        success: exit_status.success(),
        killed,
        max_rss_kb: max_rss_to_kb(usage.ru_maxrss as i64),
        describe_status: exit_status.to_string(),
    })
}

/// ru_maxrss is kilobytes on Linux but bytes on macOS.
#[cfg(unix)]
fn max_rss_to_kb(raw: i64) -> i64 {
    if cfg!(target_os = "macos") {
        raw / 1024
    } else {
        raw
    }
}

#[cfg(not(unix))]
fn wait_measured(
    mut child: std::process::Child,
    timeout: Option<Duration>,
) -> std::io::Result<WaitOutcome> {
    let deadline = timeout.map(|t| Instant::now() + t);
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Ok(WaitOutcome {
                    success: false,
                    killed: true,
                    max_rss_kb: 0,
                    describe_status: "killed".to_string(),
                });
            }
        }
        std::thread::sleep(Duration::from_millis(5));
    };

    Ok(WaitOutcome {
        success: status.success(),
        killed: false,
        // No per-child rusage off Unix.
        max_rss_kb: 0,
        describe_status: status.to_string(),
    })
}
