//! Scheduling onto the host UI thread.

use std::collections::VecDeque;
use std::sync::Mutex;

pub type Task = Box<dyn FnOnce() + Send>;

/// The host toolkit's "run this later on the UI thread" primitive.
pub trait UiExecutor: Send + Sync {
    fn invoke_later(&self, task: Task);
}

/// FIFO of UI tasks drained by the host from its UI thread.
#[derive(Default)]
pub struct TaskQueue {
    tasks: Mutex<VecDeque<Task>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.tasks.lock().map(|t| t.len()).unwrap_or(0)
    }

    /// Run queued tasks until the queue is empty, including tasks queued by
    /// the tasks themselves. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = match self.tasks.lock() {
                Ok(mut tasks) => tasks.pop_front(),
                Err(poisoned) => poisoned.into_inner().pop_front(),
            };
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl UiExecutor for TaskQueue {
    fn invoke_later(&self, task: Task) {
        match self.tasks.lock() {
            Ok(mut tasks) => tasks.push_back(task),
            Err(poisoned) => poisoned.into_inner().push_back(task),
        }
    }
}

/// Runs tasks on the calling thread. For hosts that only ever signal the
/// widget from their UI thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl UiExecutor for InlineExecutor {
    fn invoke_later(&self, task: Task) {
        task();
    }
}
