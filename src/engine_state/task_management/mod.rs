//! # Task Management System
//!
//! This module provides a small worker pool for executing [`Task`]s on
//! background threads while the coordinating thread keeps running its frame.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: owns the workers and distributes tasks round-robin
//! - `TaskChannel`: the task sender and result receiver of one worker
//! - `WorkQueue`: the FIFO used by schedulers to hold work not yet published
//!
//! ## Task Lifecycle
//! 1. The caller checks `has_capacity()` and publishes a task
//! 2. The manager sends it to the next worker below `MAX_TASKS_IN_FLIGHT`
//! 3. The worker runs `Task::process` and sends the output back
//! 4. The caller polls `collect_completed()` once per frame; nothing blocks
//!
//! ## Failure Model
//! Spawning a worker can fail, and a worker that panics drops its channel
//! ends. Both surface as errors so the caller can switch to running tasks on
//! its own thread. The manager never retries a failed worker.

pub mod task;
pub mod work_queue;

use std::{
    sync::mpsc::{channel, Receiver, Sender, TryRecvError},
    thread::{self, JoinHandle},
};

use log::info;

use crate::core::{Error, Result};
use task::Task;

pub use work_queue::WorkQueue;

/// A communication channel between the coordinating thread and one worker.
///
/// # Fields
/// - `task_sender`: Sends tasks to the worker
/// - `result_receiver`: Receives task outputs from the worker
/// - `num_tasks_in_flight`: Tasks sent but not yet collected
/// - `_worker`: Handle to the worker thread
struct TaskChannel<T: Task> {
    task_sender: Sender<T>,
    result_receiver: Receiver<T::Output>,
    num_tasks_in_flight: usize,
    _worker: JoinHandle<()>,
}

/// Why a task could not be published. The task is handed back either way.
#[derive(Debug)]
pub enum PublishError<T> {
    /// Every worker already holds `MAX_TASKS_IN_FLIGHT` tasks.
    Busy(T),
    /// The chosen worker has exited.
    Disconnected(T),
}

impl<T> PublishError<T> {
    pub fn into_task(self) -> T {
        match self {
            PublishError::Busy(task) | PublishError::Disconnected(task) => task,
        }
    }
}

/// Manages a pool of worker threads running one kind of task.
pub struct TaskManager<T: Task> {
    channels: Vec<TaskChannel<T>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// Two keeps a worker busy while its previous output waits to be collected.
pub const MAX_TASKS_IN_FLIGHT: usize = 2;

impl<T: Task> TaskManager<T> {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create
    /// * `name` - Thread name prefix, suffixed with the worker index
    ///
    /// # Errors
    /// `Error::WorkerSpawn` if any thread fails to start. Workers spawned
    /// before the failure shut down when their channels drop.
    pub fn new(num_workers: usize, name: &str) -> Result<Self> {
        info!(
            "Starting {num_workers} {name} threads, available parallelism: {:?}",
            thread::available_parallelism()
        );

        let mut channels = Vec::with_capacity(num_workers);
        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<T>();
            let (result_tx, result_rx) = channel::<T::Output>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    if result_tx.send(task.process()).is_err() {
                        break;
                    }
                }
            };

            let worker = thread::Builder::new()
                .name(format!("{name}-{index}"))
                .spawn(task_closure)
                .map_err(|source| Error::WorkerSpawn { index, source })?;

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                _worker: worker,
            });
        }

        Ok(TaskManager {
            channels,
            current_channel: 0,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of tasks sent to workers and not yet collected.
    pub fn in_flight(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum()
    }

    /// Whether a published task would be accepted right now.
    pub fn has_capacity(&self) -> bool {
        self.find_available_channel().is_some()
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was sent; the in-flight counter is incremented
    /// - `Err(task)` if the worker has exited
    fn try_send_task(&mut self, task: T, channel_idx: usize) -> std::result::Result<(), T> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(error) => Err(error.0),
        }
    }

    /// Finds the next channel below `MAX_TASKS_IN_FLIGHT`, round-robin from
    /// the last used one.
    fn find_available_channel(&self) -> Option<usize> {
        let len = self.channels.len();
        (0..len)
            .map(|offset| (self.current_channel + offset) % len)
            .find(|&idx| self.channels[idx].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT)
    }

    /// Publishes a task to the next available worker.
    ///
    /// # Returns
    /// `Ok(())` if a worker accepted the task; otherwise the task is returned
    /// inside the error so the caller can keep or run it.
    pub fn publish_task(&mut self, task: T) -> std::result::Result<(), PublishError<T>> {
        let Some(channel_idx) = self.find_available_channel() else {
            return Err(PublishError::Busy(task));
        };
        match self.try_send_task(task, channel_idx) {
            Ok(()) => {
                self.current_channel = (channel_idx + 1) % self.channels.len();
                Ok(())
            }
            Err(task) => Err(PublishError::Disconnected(task)),
        }
    }

    /// Moves every finished output into `completed` without blocking.
    ///
    /// # Errors
    /// `Error::WorkerDisconnected` if a worker exited with tasks still in
    /// flight. Outputs received before the failure are still in `completed`.
    pub fn collect_completed(&mut self, completed: &mut Vec<T::Output>) -> Result<()> {
        let mut disconnected = false;
        for channel in &mut self.channels {
            loop {
                match channel.result_receiver.try_recv() {
                    Ok(output) => {
                        channel.num_tasks_in_flight = channel.num_tasks_in_flight.saturating_sub(1);
                        completed.push(output);
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected |= channel.num_tasks_in_flight > 0;
                        break;
                    }
                }
            }
        }
        if disconnected {
            return Err(Error::WorkerDisconnected);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[derive(Debug)]
    struct Square(u64);

    impl Task for Square {
        type Output = u64;

        fn process(self) -> u64 {
            self.0 * self.0
        }
    }

    #[derive(Debug)]
    struct Explode;

    impl Task for Explode {
        type Output = ();

        fn process(self) -> Self::Output {
            panic!("worker failure");
        }
    }

    fn collect_until<T: Task>(manager: &mut TaskManager<T>, count: usize) -> Vec<T::Output> {
        let mut outputs = Vec::new();
        for _ in 0..500 {
            manager.collect_completed(&mut outputs).unwrap();
            if outputs.len() >= count {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        outputs
    }

    #[test]
    fn test_round_trip_through_workers() {
        let mut manager = TaskManager::new(2, "test-worker").unwrap();
        for n in 1..=4 {
            manager.publish_task(Square(n)).unwrap();
        }
        assert_eq!(manager.in_flight(), 4);

        let mut outputs = collect_until(&mut manager, 4);
        outputs.sort();
        assert_eq!(outputs, vec![1, 4, 9, 16]);
        assert_eq!(manager.in_flight(), 0);
    }

    #[test]
    fn test_busy_hands_task_back() {
        let mut manager = TaskManager::new(1, "test-worker").unwrap();
        for n in 0..MAX_TASKS_IN_FLIGHT as u64 {
            manager.publish_task(Square(n)).unwrap();
        }
        assert!(!manager.has_capacity());
        match manager.publish_task(Square(9)) {
            Err(PublishError::Busy(task)) => assert_eq!(task.0, 9),
            other => panic!("expected busy, got {:?}", other.map_err(|e| e.into_task().0)),
        }
    }

    #[test]
    fn test_zero_workers_never_accepts() {
        let mut manager = TaskManager::<Square>::new(0, "test-worker").unwrap();
        assert!(!manager.has_capacity());
        assert!(matches!(manager.publish_task(Square(1)), Err(PublishError::Busy(_))));
    }

    #[test]
    fn test_panicking_worker_reports_disconnect() {
        let mut manager = TaskManager::new(1, "test-worker").unwrap();
        manager.publish_task(Explode).unwrap();

        let mut outputs = Vec::new();
        let mut result = Ok(());
        for _ in 0..500 {
            result = manager.collect_completed(&mut outputs);
            if result.is_err() {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        assert!(matches!(result, Err(Error::WorkerDisconnected)));
        assert!(matches!(manager.publish_task(Explode), Err(PublishError::Disconnected(_))));
    }
}
