use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::errors::{DomainError, DomainResult};

/// Violations seen since `date` began. `count` is meaningless for any other date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounter {
    pub date: NaiveDate,
    pub count: u64,
}

impl DailyCounter {
    pub fn new(date: NaiveDate) -> Self {
        Self { date, count: 0 }
    }

    fn roll_to(&mut self, today: NaiveDate) {
        if self.date != today {
            info!(previous = %self.date, total = self.count, today = %today, "daily counter rollover");
            self.date = today;
            self.count = 0;
        }
    }
}

pub type StatsSnapshot = DailyCounter;

/// Process-wide, date-scoped violation total.
///
/// Every read and write goes through the one mutex, and the lock is only ever held for the field
/// updates themselves.
#[derive(Debug)]
pub struct DailyAggregator {
    counter: Mutex<DailyCounter>,
}

impl DailyAggregator {
    pub fn new(today: NaiveDate) -> Self {
        Self { counter: Mutex::new(DailyCounter::new(today)) }
    }

    fn lock(&self) -> DomainResult<MutexGuard<'_, DailyCounter>> {
        self.counter
            .lock()
            .map_err(|_| DomainError::Aggregation("counter lock poisoned".into()))
    }

    /// Resets the counter if `today` differs from its date, then adds `new_violations`.
    pub fn record_and_rollover(&self, new_violations: u64, today: NaiveDate) -> DomainResult<StatsSnapshot> {
        let mut counter = self.lock()?;
        counter.roll_to(today);
        counter.count = counter.count.saturating_add(new_violations);
        Ok(*counter)
    }

    pub fn snapshot(&self) -> DomainResult<StatsSnapshot> {
        Ok(*self.lock()?)
    }

    /// Rollover-then-read in one critical section, for reporting on days with no uploads yet.
    pub fn snapshot_at(&self, today: NaiveDate) -> DomainResult<StatsSnapshot> {
        let mut counter = self.lock()?;
        counter.roll_to(today);
        Ok(*counter)
    }
}
