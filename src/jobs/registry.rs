//! Job registry: tracks background processes by id, supervises their exit,
//! and exposes signal-based kill/suspend/resume. Exclusively owns
//! `session.jobs`/`next_job_id`; safe for concurrent callers (§5).

use super::signals;
use crate::bus::{self, Dispatcher, Message};
use crate::types::{Job, JobState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio::sync::{Mutex, Notify};

const GRACEFUL_KILL_TIMEOUT: Duration = Duration::from_secs(5);
const GC_INTERVAL: Duration = Duration::from_secs(5);
const RETENTION: chrono::Duration = chrono::Duration::hours(24);

struct JobEntry {
    job: Arc<Mutex<Job>>,
    pid: Option<u32>,
    killed: Arc<AtomicBool>,
    done: Arc<Notify>,
}

/// Handle returned by `start`, letting the evaluator correlate a background
/// dispatch with the job it created.
pub struct StartedJob {
    pub id: u64,
    pub pid: Option<u32>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JobStats {
    pub running: usize,
    pub stopped: usize,
    pub completed: usize,
    pub failed: usize,
    pub killed: usize,
    pub total: usize,
}

#[derive(Clone)]
pub struct JobRegistry {
    entries: Arc<Mutex<HashMap<u64, JobEntry>>>,
    next_id: Arc<AtomicU64>,
}

impl JobRegistry {
    pub fn new() -> Self {
        let registry = Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        };
        registry.spawn_gc();
        registry
    }

    fn spawn_gc(&self) {
        let entries = self.entries.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(GC_INTERVAL);
            loop {
                interval.tick().await;
                let now = chrono::Utc::now();
                let mut map = entries.lock().await;
                let mut stale = Vec::new();
                for (id, entry) in map.iter() {
                    let job = entry.job.lock().await;
                    if job.state.is_terminal() {
                        if let Some(end) = job.end_time {
                            if now - end > RETENTION {
                                stale.push(*id);
                            }
                        }
                    }
                }
                for id in stale {
                    map.remove(&id);
                }
            }
        });
    }

    /// Start supervising `child`, spawning reader tasks for stdout/stderr
    /// that emit `Message`s in order within each stream (no cross-stream
    /// ordering guarantee, per §5).
    pub async fn start(
        &self,
        mut child: Child,
        command: String,
        args: Vec<String>,
        cwd: String,
        env: HashMap<String, String>,
        dispatcher: Option<Dispatcher>,
    ) -> StartedJob {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let pid = child.id();

        bus::emit(
            &dispatcher,
            Message::Started {
                cmd: command.clone(),
                pid,
                err: None,
            },
        );

        let job = Job {
            id,
            command: command.clone(),
            args,
            pid,
            state: JobState::Running,
            start_time: chrono::Utc::now(),
            end_time: None,
            exit_code: None,
            working_dir: cwd,
            environment: env,
        };
        let job = Arc::new(Mutex::new(job));
        let killed = Arc::new(AtomicBool::new(false));
        let done = Arc::new(Notify::new());

        self.entries.lock().await.insert(
            id,
            JobEntry {
                job: job.clone(),
                pid,
                killed: killed.clone(),
                done: done.clone(),
            },
        );

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let dispatcher_out = dispatcher.clone();
        if let Some(stdout) = stdout {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    bus::emit(&dispatcher_out, Message::Stdout { line });
                }
            });
        }
        let dispatcher_err = dispatcher.clone();
        if let Some(stderr) = stderr {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    bus::emit(&dispatcher_err, Message::Stderr { line });
                }
            });
        }

        tokio::spawn(async move {
            let status = child.wait().await;
            let mut j = job.lock().await;
            j.end_time = Some(chrono::Utc::now());
            match status {
                Ok(status) if killed.load(Ordering::SeqCst) => {
                    j.state = JobState::Killed;
                    j.exit_code = status.code();
                }
                Ok(status) => {
                    let code = status.code().unwrap_or(1);
                    j.exit_code = Some(code);
                    j.state = if code == 0 {
                        JobState::Completed
                    } else {
                        JobState::Failed
                    };
                }
                Err(_) => {
                    j.state = JobState::Failed;
                    j.exit_code = Some(1);
                }
            }
            bus::emit(
                &dispatcher,
                Message::Exited {
                    code: j.exit_code.unwrap_or(1),
                    err: None,
                },
            );
            done.notify_waiters();
        });

        StartedJob { id, pid }
    }

    pub async fn get(&self, id: u64) -> Option<Job> {
        let map = self.entries.lock().await;
        let entry = map.get(&id)?;
        Some(entry.job.lock().await.clone())
    }

    pub async fn list(&self) -> Vec<Job> {
        let map = self.entries.lock().await;
        let mut jobs = Vec::with_capacity(map.len());
        for entry in map.values() {
            jobs.push(entry.job.lock().await.clone());
        }
        jobs.sort_by_key(|j| j.id);
        jobs
    }

    pub async fn highest_id(&self) -> Option<u64> {
        self.list().await.iter().map(|j| j.id).max()
    }

    pub async fn second_highest_id(&self) -> Option<u64> {
        let mut ids: Vec<u64> = self.list().await.iter().map(|j| j.id).collect();
        ids.sort_unstable();
        ids.iter().rev().nth(1).copied()
    }

    pub async fn find_by_prefix(&self, prefix: &str) -> Option<u64> {
        let mut jobs = self.list().await;
        jobs.sort_by_key(|j| std::cmp::Reverse(j.start_time));
        jobs.into_iter()
            .find(|j| j.command.starts_with(prefix))
            .map(|j| j.id)
    }

    /// Remove a job from tracking without signaling it (`disown`).
    pub async fn disown(&self, id: u64) -> Result<(), String> {
        let mut map = self.entries.lock().await;
        map.remove(&id)
            .map(|_| ())
            .ok_or_else(|| format!("%{id}: no such job"))
    }

    /// Graceful kill with a 5s wait before forcing termination.
    pub async fn kill(&self, id: u64) -> Result<(), String> {
        let (pid, killed, done, terminal) = {
            let map = self.entries.lock().await;
            let entry = map.get(&id).ok_or_else(|| format!("%{id}: no such job"))?;
            let terminal = entry.job.lock().await.state.is_terminal();
            (entry.pid, entry.killed.clone(), entry.done.clone(), terminal)
        };

        if terminal {
            return Err("not running".to_string());
        }
        let Some(pid) = pid else {
            return Err("not running".to_string());
        };

        killed.store(true, Ordering::SeqCst);
        signals::kill_graceful(pid).map_err(|e| e.to_string())?;

        let waited = tokio::time::timeout(GRACEFUL_KILL_TIMEOUT, done.notified()).await;
        if waited.is_err() {
            let _ = signals::kill_force(pid);
        }
        Ok(())
    }

    pub async fn suspend(&self, id: u64) -> Result<(), String> {
        let map = self.entries.lock().await;
        let entry = map.get(&id).ok_or_else(|| format!("%{id}: no such job"))?;
        let Some(pid) = entry.pid else {
            return Err("not running".to_string());
        };
        signals::suspend(pid).map_err(|e| e.to_string())?;
        entry.job.lock().await.state = JobState::Stopped;
        Ok(())
    }

    pub async fn resume(&self, id: u64) -> Result<(), String> {
        let map = self.entries.lock().await;
        let entry = map.get(&id).ok_or_else(|| format!("%{id}: no such job"))?;
        let Some(pid) = entry.pid else {
            return Err("not running".to_string());
        };
        signals::resume(pid).map_err(|e| e.to_string())?;
        entry.job.lock().await.state = JobState::Running;
        Ok(())
    }

    pub async fn wait(&self, id: u64, timeout: Option<Duration>) -> Result<Job, String> {
        let (job_handle, done) = {
            let map = self.entries.lock().await;
            let entry = map.get(&id).ok_or_else(|| format!("%{id}: no such job"))?;
            (entry.job.clone(), entry.done.clone())
        };

        if job_handle.lock().await.state.is_terminal() {
            return Ok(job_handle.lock().await.clone());
        }

        let notified = done.notified();
        match timeout {
            Some(d) => {
                if tokio::time::timeout(d, notified).await.is_err() {
                    return Err(format!("timed out waiting for job %{id}"));
                }
            }
            None => notified.await,
        }
        Ok(job_handle.lock().await.clone())
    }

    pub async fn stats(&self) -> JobStats {
        let jobs = self.list().await;
        let mut stats = JobStats::default();
        for job in &jobs {
            match job.state {
                JobState::Running => stats.running += 1,
                JobState::Stopped => stats.stopped += 1,
                JobState::Completed => stats.completed += 1,
                JobState::Failed => stats.failed += 1,
                JobState::Killed => stats.killed += 1,
            }
        }
        stats.total = jobs.len();
        stats
    }

    /// Stop the sweeper (implicitly, by dropping all clones) and signal
    /// every running job to terminate. Called on session teardown (§4.7).
    pub async fn shutdown(&self) {
        let running: Vec<(u64, Option<u32>)> = {
            let map = self.entries.lock().await;
            let mut out = Vec::new();
            for (id, entry) in map.iter() {
                if !entry.job.lock().await.state.is_terminal() {
                    out.push((*id, entry.pid));
                }
            }
            out
        };
        for (_id, pid) in running {
            if let Some(pid) = pid {
                let _ = signals::kill_graceful(pid);
            }
        }
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    async fn spawn_sleep(secs: &str) -> Child {
        Command::new("sleep")
            .arg(secs)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("sleep must be on PATH for this test")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn start_and_wait_for_completion() {
        let registry = JobRegistry::new();
        let child = spawn_sleep("0");
        let started = registry
            .start(
                child.await,
                "sleep 0".to_string(),
                vec!["0".to_string()],
                "/".to_string(),
                HashMap::new(),
                None,
            )
            .await;
        let job = registry
            .wait(started.id, Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.exit_code, Some(0));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn kill_already_terminated_job_errors() {
        let registry = JobRegistry::new();
        let child = spawn_sleep("0");
        let started = registry
            .start(
                child.await,
                "sleep 0".to_string(),
                Vec::new(),
                "/".to_string(),
                HashMap::new(),
                None,
            )
            .await;
        registry
            .wait(started.id, Some(Duration::from_secs(5)))
            .await
            .unwrap();
        let err = registry.kill(started.id).await.unwrap_err();
        assert_eq!(err, "not running");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stats_counts_by_state() {
        let registry = JobRegistry::new();
        let child = spawn_sleep("0");
        let started = registry
            .start(
                child.await,
                "sleep 0".to_string(),
                Vec::new(),
                "/".to_string(),
                HashMap::new(),
                None,
            )
            .await;
        registry
            .wait(started.id, Some(Duration::from_secs(5)))
            .await
            .unwrap();
        let stats = registry.stats().await;
        assert_eq!(stats.total, 1);
        assert_eq!(stats.completed, 1);
    }
}
