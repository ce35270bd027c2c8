//! Worker task scheduling
//!
//! A small fixed pool of OS threads. Frame compilation is scheduled as
//! [`TaskType::Small`] work, which workers always take before any queued
//! [`TaskType::Large`] work such as asset processing.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

use crate::error::{RenderError, RenderResult};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Scheduling class of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    /// Short, latency sensitive work that must finish within a frame
    Small,
    /// Long running work that fills gaps between small tasks
    Large,
}

/// Handle to a scheduled task's result
///
/// Dropping the handle does not cancel the task; the result is discarded.
pub struct TaskHandle<T> {
    receiver: mpsc::Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Attempts to retrieve the result without blocking.
    pub fn try_recv(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Blocks until the task completes and returns the result.
    ///
    /// Fails with [`RenderError::TaskDropped`] if the task panicked.
    pub fn recv(self) -> RenderResult<T> {
        self.receiver.recv().map_err(|_| RenderError::TaskDropped)
    }
}

#[derive(Default)]
struct TaskQueues {
    small: VecDeque<Job>,
    large: VecDeque<Job>,
    shutting_down: bool,
}

impl TaskQueues {
    fn pop(&mut self) -> Option<Job> {
        self.small.pop_front().or_else(|| self.large.pop_front())
    }
}

struct Shared {
    queues: Mutex<TaskQueues>,
    available: Condvar,
}

/// Fixed-size worker pool
///
/// Dropping the scheduler runs every task still queued, then joins the
/// workers.
pub struct TaskScheduler {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl TaskScheduler {
    /// Start `num_workers` worker threads (at least one)
    pub fn new(num_workers: usize) -> Self {
        let shared = Arc::new(Shared {
            queues: Mutex::new(TaskQueues::default()),
            available: Condvar::new(),
        });

        let workers = (0..num_workers.max(1))
            .map(|index| {
                let shared = shared.clone();
                std::thread::Builder::new()
                    .name(format!("render-worker-{index}"))
                    .spawn(move || worker_loop(&shared))
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(err) => {
                    log::error!("Failed to spawn worker thread: {err}");
                    None
                }
            })
            .collect::<Vec<_>>();

        log::info!("Task scheduler started with {} workers", workers.len());
        Self { shared, workers }
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Queue a task for execution on a worker
    pub fn schedule_task<F>(&self, task_type: TaskType, task: F) -> RenderResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.workers.is_empty() {
            return Err(RenderError::SchedulerShutDown);
        }

        let mut queues = self.shared.queues.lock();
        if queues.shutting_down {
            return Err(RenderError::SchedulerShutDown);
        }
        match task_type {
            TaskType::Small => queues.small.push_back(Box::new(task)),
            TaskType::Large => queues.large.push_back(Box::new(task)),
        }
        drop(queues);

        self.shared.available.notify_one();
        Ok(())
    }

    /// Queue a task and get a handle to its result
    pub fn spawn<T, F>(&self, task_type: TaskType, task: F) -> RenderResult<TaskHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        self.schedule_task(task_type, move || {
            let _ = sender.send(task());
        })?;
        Ok(TaskHandle { receiver })
    }

    /// Stop accepting tasks
    ///
    /// Tasks already queued still run. Workers exit once the queues are empty
    /// and are joined when the scheduler is dropped.
    pub fn shut_down(&self) {
        self.shared.queues.lock().shutting_down = true;
        self.shared.available.notify_all();
    }

    /// Tasks waiting for a worker
    pub fn pending_count(&self) -> usize {
        let queues = self.shared.queues.lock();
        queues.small.len() + queues.large.len()
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        self.shut_down();

        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("Worker thread exited abnormally");
            }
        }
        log::debug!("Task scheduler shut down");
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut queues = shared.queues.lock();
            loop {
                if let Some(job) = queues.pop() {
                    break job;
                }
                if queues.shutting_down {
                    return;
                }
                shared.available.wait(&mut queues);
            }
        };

        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            log::error!("Task panicked; worker continues");
        }
    }
}
