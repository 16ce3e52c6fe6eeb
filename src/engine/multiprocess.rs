//! Signal and liveness helpers for the engine child process.

use std::process::Child;
use std::time::{Duration, Instant};

/// Check if a process is still alive.
pub fn pid_is_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }

    #[cfg(unix)]
    {
        // Signal 0 doesn't send a signal but checks if the process exists
        let result = unsafe { libc::kill(pid as libc::pid_t, 0) };
        if result == 0 {
            return true;
        }
        // EPERM means it exists but we don't have permission
        std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }

    #[cfg(not(unix))]
    {
        true // Non-Unix: can't check liveness, assume running
    }
}

/// Send SIGINT to a child. Returns false if the signal could not be delivered.
#[cfg(unix)]
pub fn send_interrupt(child: &Child) -> bool {
    unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGINT) == 0 }
}

#[cfg(not(unix))]
pub fn send_interrupt(_child: &Child) -> bool {
    // No SIGINT on this platform; callers fall back to a hard kill.
    false
}

/// Poll a child until it exits or `timeout` elapses, reaping it on exit.
pub fn wait_for_exit(child: &mut Child, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;

    loop {
        match child.try_wait() {
            Ok(Some(_)) => return true,
            Ok(None) => {}
            Err(e) => {
                log::debug!("try_wait failed for PID {}: {}", child.id(), e);
                return false;
            }
        }

        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// Stop a child gracefully.
///
/// Sends SIGINT and waits up to `timeout`, then SIGKILLs and reaps.
/// Returns true if the process is gone afterwards.
pub fn stop_child(child: &mut Child, timeout: Duration) -> bool {
    let pid = child.id();

    if let Ok(Some(_)) = child.try_wait() {
        log::debug!("Engine PID {} already exited", pid);
        return true;
    }

    if send_interrupt(child) && wait_for_exit(child, timeout) {
        return true;
    }

    log::warn!("Engine PID {} did not respond to SIGINT, killing", pid);

    if let Err(e) = child.kill() {
        log::error!("Failed to kill engine PID {}: {}", pid, e);
    }
    child.wait().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_is_alive_current() {
        let pid = std::process::id();
        assert!(pid_is_alive(pid));
    }

    #[test]
    fn test_pid_is_alive_zero() {
        assert!(!pid_is_alive(0));
    }

    #[cfg(unix)]
    #[test]
    fn test_stop_child_interrupts_sleep() {
        let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id();
        assert!(pid_is_alive(pid));

        assert!(stop_child(&mut child, Duration::from_secs(5)));
        assert!(matches!(child.try_wait(), Ok(Some(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_stop_child_already_exited() {
        let mut child = std::process::Command::new("true").spawn().unwrap();
        child.wait().unwrap();
        assert!(stop_child(&mut child, Duration::from_millis(100)));
    }
}
