use chrono::{Local, NaiveDateTime};

use crate::application::ports::ClockPort;

/// Local wall clock; "today" follows the host's time zone.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self { Self }
}

impl ClockPort for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
