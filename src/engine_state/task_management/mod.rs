//! # Task Management System
//!
//! A small worker pool for chunk generation and remeshing.
//!
//! ## Architecture Overview
//! - `TaskManager`: Central coordinator for task distribution and worker management
//! - `Task`: A unit of work that can be executed asynchronously
//! - `TaskResult`: The result of a completed task, which can spawn additional tasks
//! - `TaskChannel`: Communication channel between the main thread and one worker
//!
//! Each worker is an OS thread with a dedicated pair of `mpsc` channels. Tasks are
//! distributed round-robin with at most [`MAX_TASKS_IN_FLIGHT`] per worker; anything
//! beyond that waits in a FIFO queue on the main thread.
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager hands each task to the next free worker
//! 3. Workers process tasks and send the results back
//! 4. Results are handled on the main thread in `process_completed_tasks()`
//! 5. Results can spawn new tasks or issue render commands
//!
//! ## Example Usage
//! ```no_run
//! use curved_voxel_engine::engine_state::{rendering::RenderResources, task_management::TaskManager};
//!
//! let mut task_manager = TaskManager::new(4);
//! let mut render_resources = RenderResources::new();
//!
//! // In the main loop:
//! task_manager.process_completed_tasks(&mut render_resources);
//! task_manager.process_queued_tasks();
//! ```

pub mod task;

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};
use web_time::Instant;

use task::{Task, TaskResult};

use super::rendering::RenderResources;

/// A communication channel between the main thread and one worker thread.
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task>>,
    result_receiver: Receiver<Box<dyn TaskResult>>,
    num_tasks_in_flight: usize,
    _worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// Dropping the manager closes every task channel, which ends the worker loops.
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

/// Pause between polls while waiting for workers to drain.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(1);

impl TaskManager {
    /// Creates a new `TaskManager` with `num_workers` worker threads.
    ///
    /// With zero workers every published task stays queued.
    pub fn new(num_workers: usize) -> Self {
        info!(
            "starting {} task workers, available parallelism: {:?}",
            num_workers,
            thread::available_parallelism()
        );

        let mut channels = Vec::with_capacity(num_workers);
        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task>>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult>>();

            let worker = thread::Builder::new()
                .name(format!("task-worker-{}", index))
                .spawn(move || {
                    while let Ok(task) = task_rx.recv() {
                        let result = task.process();
                        if result_tx.send(result).is_err() {
                            break;
                        }
                    }
                });

            match worker {
                Ok(worker) => channels.push(TaskChannel {
                    task_sender: task_tx,
                    result_receiver: result_rx,
                    num_tasks_in_flight: 0,
                    _worker: worker,
                }),
                Err(err) => warn!("failed to spawn task worker {}: {}", index, err),
            }
        }

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        }
    }

    /// Number of live worker channels.
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was handed to the worker
    /// - `Err(task)` if the worker has disconnected
    fn try_send_task(&mut self, task: Box<dyn Task>, channel_idx: usize) -> Result<(), Box<dyn Task>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => Err(task.0),
        }
    }

    /// Finds the next channel, round-robin from the last one used, that can take a task.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        let start_channel = self.current_channel;
        let mut current = start_channel;
        loop {
            if self.channels[current].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT {
                return Some(current);
            }
            current = (current + 1) % self.channels.len();
            if current == start_channel {
                return None;
            }
        }
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// - `true` if the task was immediately scheduled on an available worker
    /// - `false` if the task was queued because all workers are busy
    pub fn publish_task(&mut self, task: Box<dyn Task>) -> bool {
        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Hands queued tasks, oldest first, to workers until none are free.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                return;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    // Worker disconnected; keep the task and stop.
                    self.queued_tasks.push_front(task);
                    return;
                }
            }
        }
    }

    /// Handles every completed result on the main thread.
    ///
    /// Render commands are applied to `render_resources` immediately; follow-up tasks
    /// are published once all available results have been handled.
    ///
    /// # Returns
    /// The number of results handled.
    pub fn process_completed_tasks(&mut self, render_resources: &mut RenderResources) -> usize {
        let mut tasks_to_queue = Vec::new();
        let mut handled = 0;

        for channel in &mut self.channels {
            while let Ok(result) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight -= 1;
                handled += 1;
                let (new_tasks, render_commands) = result.handle_result();
                for command in render_commands {
                    render_resources.apply(command);
                }
                tasks_to_queue.extend(new_tasks);
            }
        }

        for task in tasks_to_queue {
            self.publish_task(task);
        }
        handled
    }

    /// Returns `true` when nothing is queued or in flight.
    pub fn is_idle(&self) -> bool {
        self.queued_tasks.is_empty()
            && self
                .channels
                .iter()
                .all(|channel| channel.num_tasks_in_flight == 0)
    }

    /// Number of tasks waiting for a free worker.
    pub fn queued_len(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Pumps results and the queue until every task, including follow-ups, has finished.
    ///
    /// # Returns
    /// `false` if `timeout` elapsed first.
    pub fn run_until_idle(&mut self, render_resources: &mut RenderResources, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            self.process_completed_tasks(render_resources);
            self.process_queued_tasks();
            if self.is_idle() {
                return true;
            }
            if self.channels.is_empty() || start.elapsed() > timeout {
                debug!("task manager still busy after {:?}", start.elapsed());
                return false;
            }
            thread::sleep(IDLE_POLL_INTERVAL);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use cgmath::Point3;

    use super::*;
    use crate::engine_state::rendering::RenderCommand;

    struct CountingTask {
        processed: Arc<AtomicUsize>,
        follow_ups: usize,
    }

    struct CountingResult {
        processed: Arc<AtomicUsize>,
        follow_ups: usize,
    }

    impl Task for CountingTask {
        fn process(&self) -> Box<dyn TaskResult> {
            self.processed.fetch_add(1, Ordering::SeqCst);
            Box::new(CountingResult {
                processed: self.processed.clone(),
                follow_ups: self.follow_ups,
            })
        }
    }

    impl TaskResult for CountingResult {
        fn handle_result(self: Box<Self>) -> (Vec<Box<dyn Task>>, Vec<RenderCommand>) {
            let mut tasks: Vec<Box<dyn Task>> = Vec::new();
            if self.follow_ups > 0 {
                tasks.push(Box::new(CountingTask {
                    processed: self.processed.clone(),
                    follow_ups: self.follow_ups - 1,
                }));
            }
            let release = RenderCommand::ReleaseMesh {
                position: Point3::new(0, 0, 0),
            };
            (tasks, vec![release])
        }
    }

    #[test]
    fn overflow_is_queued_then_drained() {
        let mut manager = TaskManager::new(2);
        let processed = Arc::new(AtomicUsize::new(0));
        let scheduled: Vec<bool> = (0..5)
            .map(|_| {
                manager.publish_task(Box::new(CountingTask {
                    processed: processed.clone(),
                    follow_ups: 0,
                }))
            })
            .collect();

        assert_eq!(scheduled, vec![true, true, false, false, false]);
        assert_eq!(manager.queued_len(), 3);

        let mut resources = RenderResources::new();
        assert!(manager.run_until_idle(&mut resources, Duration::from_secs(10)));
        assert_eq!(processed.load(Ordering::SeqCst), 5);
        assert!(manager.is_idle());
    }

    #[test]
    fn follow_up_tasks_are_published() {
        let mut manager = TaskManager::new(1);
        let processed = Arc::new(AtomicUsize::new(0));
        manager.publish_task(Box::new(CountingTask {
            processed: processed.clone(),
            follow_ups: 3,
        }));

        let mut resources = RenderResources::new();
        assert!(manager.run_until_idle(&mut resources, Duration::from_secs(10)));
        assert_eq!(processed.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn without_workers_tasks_wait() {
        let mut manager = TaskManager::new(0);
        let processed = Arc::new(AtomicUsize::new(0));
        assert!(!manager.publish_task(Box::new(CountingTask {
            processed: processed.clone(),
            follow_ups: 0,
        })));

        let mut resources = RenderResources::new();
        assert!(!manager.run_until_idle(&mut resources, Duration::from_millis(5)));
        assert_eq!(processed.load(Ordering::SeqCst), 0);
        assert_eq!(manager.queued_len(), 1);
    }
}
