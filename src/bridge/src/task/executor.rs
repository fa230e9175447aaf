//! A cooperative priority executor.

use super::{Task, TaskId, TimerQueue};
use alloc::{collections::BTreeMap, sync::Arc};
use core::sync::atomic::{AtomicBool, Ordering};
use core::task::Context;
use crossbeam_queue::ArrayQueue;
use futures_util::task::{waker_ref, ArcWake};
use log::{trace, warn};
use ps2bridge_hal::{Clock, Delay};

/// Ready-queue slots per priority level.
const QUEUE_CAPACITY: usize = 64;

/// Longest idle delay; wakeups from other cores are noticed this late.
pub const IDLE_DELAY_US: u32 = 100;

const LEVELS: usize = 2;

/// Runs tasks by priority, one snapshot of each ready queue per pass.
pub struct Executor {
    tasks: BTreeMap<TaskId, Task>,
    task_queues: [Arc<ArrayQueue<TaskId>>; LEVELS],
    waker_cache: BTreeMap<TaskId, Arc<TaskWaker>>,
    timers: Arc<TimerQueue>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    /// Create a new executor.
    pub fn new() -> Self {
        Executor {
            tasks: BTreeMap::new(),
            task_queues: [
                Arc::new(ArrayQueue::new(QUEUE_CAPACITY)), // Normal
                Arc::new(ArrayQueue::new(QUEUE_CAPACITY)), // High
            ],
            waker_cache: BTreeMap::new(),
            timers: Arc::new(TimerQueue::new()),
        }
    }

    /// Timer queue whose sleepers this executor wakes.
    pub fn timers(&self) -> &Arc<TimerQueue> {
        &self.timers
    }

    /// Spawn a new task on the executor.
    pub fn spawn(&mut self, task: Task) {
        let task_id = task.id;
        let waker = Arc::new(TaskWaker {
            task_id,
            queued: AtomicBool::new(false),
            task_queue: self.task_queues[task.priority as usize].clone(),
        });
        self.tasks.insert(task_id, task);
        waker.schedule();
        self.waker_cache.insert(task_id, waker);
    }

    /// Number of tasks not yet finished.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Poll every task that was ready when its priority level was reached.
    ///
    /// `High` runs before `Normal`. A task woken while it runs is polled
    /// again on the next pass, so it cannot starve the lower level.
    /// Returns `true` if any task was polled.
    pub fn run_ready(&mut self) -> bool {
        let mut polled = false;
        for priority in (0..LEVELS).rev() {
            let ready = self.task_queues[priority].len();
            for _ in 0..ready {
                let Some(task_id) = self.task_queues[priority].pop() else {
                    break;
                };
                polled = true;
                self.poll_task(task_id);
            }
        }
        polled
    }

    fn poll_task(&mut self, task_id: TaskId) {
        let (Some(task), Some(waker)) =
            (self.tasks.get_mut(&task_id), self.waker_cache.get(&task_id))
        else {
            return;
        };

        waker.queued.store(false, Ordering::Release);
        let finished = {
            let waker = waker_ref(waker);
            let mut context = Context::from_waker(&waker);
            task.poll(&mut context).is_ready()
        };
        if finished {
            trace!("executor: task {:?} finished", task_id);
            self.tasks.remove(&task_id);
            self.waker_cache.remove(&task_id);
        }
    }

    /// Wake sleepers due at `now_us`, then run one pass.
    ///
    /// Returns `true` if any task was polled.
    pub fn tick(&mut self, now_us: u64) -> bool {
        self.timers.wake_expired(now_us);
        self.run_ready()
    }

    /// Run forever, idling through `delay` when no task is ready.
    ///
    /// An idle executor waits until the earliest sleeper is due, but never
    /// longer than [`IDLE_DELAY_US`].
    pub fn run<C: Clock, D: Delay>(&mut self, clock: &C, delay: &mut D) -> ! {
        loop {
            let now = clock.now_us();
            if self.tick(now) {
                continue;
            }
            let wait = match self.timers.next_deadline() {
                Some(deadline) => deadline.saturating_sub(now).min(IDLE_DELAY_US as u64) as u32,
                None => IDLE_DELAY_US,
            };
            if wait > 0 {
                delay.delay_us(wait);
            }
        }
    }
}

struct TaskWaker {
    task_id: TaskId,
    queued: AtomicBool,
    task_queue: Arc<ArrayQueue<TaskId>>,
}

impl TaskWaker {
    fn schedule(&self) {
        // At most one queue entry per task.
        if self.queued.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.task_queue.push(self.task_id).is_err() {
            self.queued.store(false, Ordering::Release);
            warn!("executor: ready queue full; task {:?} not scheduled", self.task_id);
        }
    }
}

impl ArcWake for TaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.schedule();
    }
}
