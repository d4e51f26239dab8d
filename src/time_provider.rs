use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Local};

pub trait TimeProvider {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to. Clones share the same instant, so a
/// driver can keep one handle while the coordinator owns another.
#[derive(Debug, Clone)]
pub struct ManualTimeProvider {
    current: Rc<Cell<DateTime<Local>>>,
}

impl ManualTimeProvider {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            current: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, instant: DateTime<Local>) {
        self.current.set(instant);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.current.set(self.current.get() + by);
    }
}

impl TimeProvider for ManualTimeProvider {
    fn now(&self) -> DateTime<Local> {
        self.current.get()
    }
}
