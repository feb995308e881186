//! Cross-platform signal shim (§9 design notes): POSIX uses real signals;
//! Windows uses process termination for kill and no-op state flips for
//! suspend/resume (a documented platform gap, not a bug).

use std::io;

#[cfg(unix)]
pub fn kill_graceful(pid: u32) -> io::Result<()> {
    send(pid, libc::SIGTERM)
}

#[cfg(unix)]
pub fn kill_force(pid: u32) -> io::Result<()> {
    send(pid, libc::SIGKILL)
}

#[cfg(unix)]
pub fn suspend(pid: u32) -> io::Result<()> {
    send(pid, libc::SIGSTOP)
}

#[cfg(unix)]
pub fn resume(pid: u32) -> io::Result<()> {
    send(pid, libc::SIGCONT)
}

#[cfg(unix)]
fn send(pid: u32, signal: libc::c_int) -> io::Result<()> {
    let ret = unsafe { libc::kill(pid as libc::pid_t, signal) };
    if ret == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(windows)]
pub fn kill_graceful(pid: u32) -> io::Result<()> {
    taskkill(pid, false)
}

#[cfg(windows)]
pub fn kill_force(pid: u32) -> io::Result<()> {
    taskkill(pid, true)
}

/// No real suspend/resume primitive without a dedicated Windows API binding;
/// the job registry flips `JobState` without touching the OS process.
#[cfg(windows)]
pub fn suspend(_pid: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(windows)]
pub fn resume(_pid: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(windows)]
fn taskkill(pid: u32, force: bool) -> io::Result<()> {
    let mut cmd = std::process::Command::new("taskkill");
    cmd.arg("/PID").arg(pid.to_string());
    if force {
        cmd.arg("/F");
    }
    cmd.status().map(|_| ())
}
