//! Background task execution.
//!
//! Scans run on a dedicated rayon pool and report back over a crossbeam
//! channel, which the control thread drains. Each task is keyed by what it
//! scans; launching a task for a key cancels the task already running for
//! it. Every task sends exactly one completion, cancelled or not.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use fnv::FnvHashMap;

use crate::cancel::CancellationToken;
use crate::error::{QuicksearchError, Result};
use crate::scan::ScanSet;
use crate::watcher::{ChangeSink, FeedEvent};

/// Identifies the target of a background task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ScanKey {
    Root,
    Directory(PathBuf),
    Applications,
    Subdirectories(PathBuf),
    Thumbnail(PathBuf),
}

#[derive(Debug)]
pub(crate) enum TaskResult {
    /// `None` when cancelled.
    Scan(Option<ScanSet>),
    Applications {
        scan: Option<ScanSet>,
        /// Registry directories to watch.
        roots: Vec<PathBuf>,
    },
    Subdirectories {
        dir: PathBuf,
        subdirs: Option<Vec<PathBuf>>,
    },
    Thumbnail {
        path: PathBuf,
        /// Outer `None` when cancelled before generating.
        thumbnail: Option<Option<PathBuf>>,
    },
}

#[derive(Debug)]
pub(crate) struct TaskCompletion {
    pub key: ScanKey,
    pub task: u64,
    pub generation: u64,
    pub elapsed: Duration,
    pub result: TaskResult,
}

#[derive(Debug)]
pub(crate) enum TaskMessage {
    Completed(TaskCompletion),
    Feed(FeedEvent),
}

pub(crate) struct TaskPool {
    pool: rayon::ThreadPool,
    sender: Sender<TaskMessage>,
    receiver: Receiver<TaskMessage>,
    running: FnvHashMap<ScanKey, (u64, CancellationToken)>,
    next_task: u64,
    outstanding: usize,
}

impl TaskPool {
    /// `worker_threads == 0` lets rayon pick.
    pub fn new(worker_threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|index| format!("quicksearch-scan-{index}"))
            .build()
            .map_err(|error| {
                QuicksearchError::Internal(format!("failed to start scan workers: {error}"))
            })?;
        let (sender, receiver) = crossbeam_channel::unbounded();
        Ok(Self {
            pool,
            sender,
            receiver,
            running: FnvHashMap::default(),
            next_task: 0,
            outstanding: 0,
        })
    }

    pub fn sink(&self) -> ChangeSink {
        ChangeSink::new(self.sender.clone())
    }

    /// Runs `job` in the background, cancelling the previous task for `key`.
    /// Returns the task id its completion will carry.
    pub fn spawn<F>(&mut self, key: ScanKey, token: CancellationToken, job: F) -> u64
    where
        F: FnOnce(&CancellationToken) -> TaskResult + Send + 'static,
    {
        self.next_task += 1;
        let task = self.next_task;
        if let Some((_, previous)) = self.running.insert(key.clone(), (task, token.clone())) {
            previous.cancel();
        }
        self.outstanding += 1;

        let sender = self.sender.clone();
        self.pool.spawn(move || {
            let started = Instant::now();
            let result = job(&token);
            let completion = TaskCompletion {
                key,
                task,
                generation: token.generation(),
                elapsed: started.elapsed(),
                result,
            };
            let _ = sender.send(TaskMessage::Completed(completion));
        });
        task
    }

    /// Bookkeeping for a received completion. Returns false if the task was
    /// superseded or cancelled since it was launched.
    pub fn finish(&mut self, completion: &TaskCompletion) -> bool {
        self.outstanding = self.outstanding.saturating_sub(1);
        let current = self
            .running
            .get(&completion.key)
            .is_some_and(|(task, _)| *task == completion.task);
        if current {
            self.running.remove(&completion.key);
        }
        current
    }

    pub fn cancel_all(&mut self) {
        for (_, (_, token)) in self.running.drain() {
            token.cancel();
        }
    }

    /// Tasks launched but not yet received back.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn try_recv(&self) -> Option<TaskMessage> {
        self.receiver.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<TaskMessage> {
        self.receiver.recv_timeout(timeout).ok()
    }
}
