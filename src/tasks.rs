use std::collections::BTreeMap;

use chrono::{DateTime, Local};

use crate::ringing::model::ToolId;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskKey {
    Blink,
    TimeSince(ToolId),
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTask {
    period: chrono::Duration,
    next_due: DateTime<Local>,
}

/// Recurring callbacks keyed by purpose. A key holds at most one task;
/// starting it again replaces the previous schedule.
#[derive(Debug, Default)]
pub struct ScheduledTasks {
    tasks: BTreeMap<TaskKey, ScheduledTask>,
}

impl ScheduledTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when an existing task under `key` was cancelled. A
    /// period that would land past the last representable instant leaves the
    /// key unscheduled.
    pub fn start(&mut self, key: TaskKey, period: chrono::Duration, now: DateTime<Local>) -> bool {
        let period = period.max(chrono::Duration::milliseconds(1));
        let Some(next_due) = now.checked_add_signed(period) else {
            return self.tasks.remove(&key).is_some();
        };
        self.tasks
            .insert(key, ScheduledTask { period, next_due })
            .is_some()
    }

    pub fn cancel(&mut self, key: &TaskKey) -> bool {
        self.tasks.remove(key).is_some()
    }

    pub fn cancel_time_since(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks
            .retain(|key, _| !matches!(key, TaskKey::TimeSince(_)));
        before - self.tasks.len()
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn is_active(&self, key: &TaskKey) -> bool {
        self.tasks.contains_key(key)
    }

    pub fn next_due(&self) -> Option<DateTime<Local>> {
        self.tasks.values().map(|task| task.next_due).min()
    }

    /// Collects every task due at `now`, each at most once, ordered by due
    /// time. A task that fell more than one period behind is rescheduled
    /// from `now` instead of replaying the missed ticks. A task whose next
    /// run cannot be represented fires this last time and is dropped.
    pub fn take_due(&mut self, now: DateTime<Local>) -> Vec<TaskKey> {
        let mut due = Vec::new();
        let mut exhausted = Vec::new();
        for (key, task) in &mut self.tasks {
            if task.next_due > now {
                continue;
            }
            due.push((task.next_due, key.clone()));
            let next = match task.next_due.checked_add_signed(task.period) {
                Some(next) if next > now => Some(next),
                _ => now.checked_add_signed(task.period),
            };
            match next {
                Some(next) => task.next_due = next,
                None => exhausted.push(key.clone()),
            }
        }
        for key in &exhausted {
            self.tasks.remove(key);
        }
        due.sort();
        due.into_iter().map(|(_, key)| key).collect()
    }
}
