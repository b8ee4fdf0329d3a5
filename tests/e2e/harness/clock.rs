/// Deterministic commit timestamps.
///
/// Every commit made by a scenario gets the current clock value as both its
/// author and committer date; the clock then moves forward one day.
#[derive(Debug, Clone)]
pub struct CommitClock {
    current: i64,
}

impl CommitClock {
    /// 2017-07-14, a day the library's history was busy.
    pub const START: i64 = 1_500_000_000;

    pub fn new() -> Self {
        Self {
            current: Self::START,
        }
    }

    /// Timestamp for the next commit, advancing the clock.
    pub fn tick(&mut self) -> i64 {
        let now = self.current;
        self.current += 86_400;
        now
    }

    /// Advance time by days without committing.
    pub fn advance_days(&mut self, days: u64) {
        self.current += days as i64 * 86_400;
    }

    pub fn now(&self) -> i64 {
        self.current
    }
}

impl Default for CommitClock {
    fn default() -> Self {
        Self::new()
    }
}
