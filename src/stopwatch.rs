//! Start/pause/resume/finish state machine for one tracking session.
use chrono::{DateTime, Duration, Local};

use crate::types::Interval;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StopwatchError {
    #[error("Stopwatch has already been started")]
    AlreadyStarted,
    #[error("Stopwatch is not running")]
    NotRunning,
    #[error("Stopwatch is already running")]
    AlreadyRunning,
    #[error("Stopwatch has not been started")]
    NotStarted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopwatchState {
    Idle,
    Running,
    Paused,
}

/// Intervals are kept in insertion order. At most the last one is open.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stopwatch {
    intervals: Vec<Interval>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a stopwatch from persisted intervals.
    pub fn from_intervals(intervals: Vec<Interval>) -> Self {
        Self { intervals }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn state(&self) -> StopwatchState {
        match self.intervals.last() {
            None => StopwatchState::Idle,
            Some(interval) if interval.end_time.is_none() => StopwatchState::Running,
            Some(_) => StopwatchState::Paused,
        }
    }

    pub fn start(&mut self, now: DateTime<Local>) -> Result<(), StopwatchError> {
        if self.state() != StopwatchState::Idle {
            return Err(StopwatchError::AlreadyStarted);
        }
        self.open(now);
        Ok(())
    }

    pub fn pause(&mut self, now: DateTime<Local>) -> Result<(), StopwatchError> {
        match self.state() {
            StopwatchState::Running => {
                self.close(now);
                Ok(())
            }
            StopwatchState::Paused => Err(StopwatchError::NotRunning),
            StopwatchState::Idle => Err(StopwatchError::NotStarted),
        }
    }

    pub fn resume(&mut self, now: DateTime<Local>) -> Result<(), StopwatchError> {
        match self.state() {
            StopwatchState::Paused => {
                self.open(now);
                Ok(())
            }
            StopwatchState::Running => Err(StopwatchError::AlreadyRunning),
            StopwatchState::Idle => Err(StopwatchError::NotStarted),
        }
    }

    /// Closes a running interval and hands back the finalized pairs.
    pub fn finish(mut self, now: DateTime<Local>) -> Result<Vec<Interval>, StopwatchError> {
        match self.state() {
            StopwatchState::Idle => Err(StopwatchError::NotStarted),
            StopwatchState::Running => {
                self.close(now);
                Ok(self.intervals)
            }
            StopwatchState::Paused => Ok(self.intervals),
        }
    }

    /// Elapsed time including a running interval measured up to `now`.
    pub fn elapsed(&self, now: DateTime<Local>) -> Duration {
        self.intervals
            .iter()
            .map(|interval| {
                let end = interval.end_time.unwrap_or(now);
                end.signed_duration_since(interval.start_time).max(Duration::zero())
            })
            .fold(Duration::zero(), |total, part| total + part)
    }

    fn open(&mut self, now: DateTime<Local>) {
        self.intervals.push(Interval {
            id: None,
            start_time: now,
            end_time: None,
        });
    }

    fn close(&mut self, now: DateTime<Local>) {
        if let Some(interval) = self.intervals.last_mut() {
            interval.end_time = Some(now.max(interval.start_time));
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 10, h, m, 0).earliest().unwrap()
    }

    #[test]
    fn pause_and_resume_produce_separate_intervals() {
        let mut watch = Stopwatch::new();
        watch.start(at(10, 0)).unwrap();
        watch.pause(at(10, 5)).unwrap();
        watch.resume(at(10, 30)).unwrap();
        assert_eq!(watch.state(), StopwatchState::Running);
        assert_eq!(watch.elapsed(at(10, 32)), Duration::minutes(7));

        let intervals = watch.finish(at(10, 32)).unwrap();
        assert_eq!(intervals.len(), 2);
        assert!(intervals.iter().all(|i| i.end_time.is_some()));
    }

    #[test]
    fn rejects_invalid_transitions() {
        let mut watch = Stopwatch::new();
        assert_eq!(watch.pause(at(9, 0)), Err(StopwatchError::NotStarted));
        watch.start(at(9, 0)).unwrap();
        assert_eq!(watch.start(at(9, 1)), Err(StopwatchError::AlreadyStarted));
        assert_eq!(watch.resume(at(9, 1)), Err(StopwatchError::AlreadyRunning));
        watch.pause(at(9, 2)).unwrap();
        assert_eq!(watch.pause(at(9, 3)), Err(StopwatchError::NotRunning));
        assert_eq!(Stopwatch::new().finish(at(9, 0)), Err(StopwatchError::NotStarted));
    }

    #[test]
    fn end_before_start_is_clamped() {
        let mut watch = Stopwatch::new();
        watch.start(at(11, 0)).unwrap();
        let intervals = watch.finish(at(10, 0)).unwrap();
        assert_eq!(intervals[0].end_time, Some(at(11, 0)));
    }
}
