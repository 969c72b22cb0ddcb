//! Per-question countdown
//!
//! The countdown does not own a clock. Like every other timed event in
//! the client it asks its owner to deliver an alarm after a delay, and
//! reacts when that alarm comes back. Each run is numbered; alarms from a
//! run that has since been stopped or replaced are ignored, which is what
//! makes `stop` safe against ticks that are already in flight.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::timing::{TICK_MILLIS, WARNING_THRESHOLD};

/// Alarm messages driving the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// One second of the given run has elapsed
    Tick {
        /// Run number the tick belongs to
        run: u64,
    },
}

/// Events produced by the countdown when an alarm is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Seconds left in the current run
    Tick(u64),
    /// The run reached zero; emitted exactly once per run
    Expired,
}

/// Interval between two ticks
pub fn tick_interval() -> Duration {
    Duration::from_millis(TICK_MILLIS)
}

/// A cancellable countdown in whole seconds
#[derive(Debug, Clone, Default)]
pub struct Countdown {
    run: u64,
    remaining: Option<u64>,
}

impl Countdown {
    /// Starts a new run, stopping any previous one first
    pub fn start<S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        duration: Duration,
        mut schedule_message: S,
    ) {
        self.stop();
        self.run = self.run.wrapping_add(1);
        self.remaining = Some(duration.as_secs());
        schedule_message(AlarmMessage::Tick { run: self.run }.into(), tick_interval());
    }

    /// Cancels the current run; calling it while stopped does nothing
    pub fn stop(&mut self) {
        self.remaining = None;
    }

    /// Whether a run is in progress
    pub fn is_running(&self) -> bool {
        self.remaining.is_some()
    }

    /// Seconds left in the current run
    pub fn remaining(&self) -> Option<u64> {
        self.remaining
    }

    /// Whether the current run is close to expiring
    pub fn is_warning(&self) -> bool {
        self.remaining.is_some_and(|r| r <= WARNING_THRESHOLD)
    }

    /// Handles a delivered tick
    ///
    /// Returns the events caused by the tick: nothing for a stale tick, a
    /// `Tick` while time is left, and `Tick(0)` followed by `Expired` when
    /// the run ends. The next tick is scheduled only while time is left.
    pub fn receive_alarm<S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        message: &AlarmMessage,
        mut schedule_message: S,
    ) -> Vec<TimerEvent> {
        let AlarmMessage::Tick { run } = message;
        if *run != self.run {
            return Vec::new();
        }
        let Some(remaining) = self.remaining else {
            return Vec::new();
        };

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            self.remaining = None;
            vec![TimerEvent::Tick(0), TimerEvent::Expired]
        } else {
            self.remaining = Some(remaining);
            schedule_message(AlarmMessage::Tick { run: self.run }.into(), tick_interval());
            vec![TimerEvent::Tick(remaining)]
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn unwrap_tick(message: crate::AlarmMessage) -> AlarmMessage {
        match message {
            crate::AlarmMessage::Countdown(tick) => tick,
            other => panic!("Expected countdown alarm, got {other:?}"),
        }
    }

    /// Runs the countdown to completion, delivering every scheduled alarm
    fn drain(countdown: &mut Countdown, mut pending: Vec<crate::AlarmMessage>) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        while let Some(message) = pending.pop() {
            let mut scheduled = Vec::new();
            events.extend(countdown.receive_alarm(&unwrap_tick(message), |m, _| {
                scheduled.push(m);
            }));
            pending.extend(scheduled);
        }
        events
    }

    #[test]
    fn test_start_schedules_first_tick() {
        let mut countdown = Countdown::default();
        let mut scheduled = Vec::new();
        countdown.start(Duration::from_secs(3), |m, d| scheduled.push((m, d)));

        assert!(countdown.is_running());
        assert_eq!(countdown.remaining(), Some(3));
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].1, tick_interval());
    }

    #[test]
    fn test_full_run_ticks_down_and_expires_once() {
        let mut countdown = Countdown::default();
        let mut scheduled = Vec::new();
        countdown.start(Duration::from_secs(3), |m, _| scheduled.push(m));

        let events = drain(&mut countdown, scheduled);

        assert_eq!(
            events,
            vec![
                TimerEvent::Tick(2),
                TimerEvent::Tick(1),
                TimerEvent::Tick(0),
                TimerEvent::Expired
            ]
        );
        assert!(!countdown.is_running());
    }

    #[test]
    fn test_stop_discards_in_flight_tick() {
        let mut countdown = Countdown::default();
        let mut scheduled = Vec::new();
        countdown.start(Duration::from_secs(1), |m, _| scheduled.push(m));
        countdown.stop();

        let events = drain(&mut countdown, scheduled);

        assert!(events.is_empty());
        assert!(!countdown.is_running());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut countdown = Countdown::default();
        countdown.stop();
        countdown.stop();
        assert!(!countdown.is_running());
        assert_eq!(countdown.remaining(), None);
    }

    #[test]
    fn test_restart_ignores_previous_run() {
        let mut countdown = Countdown::default();
        let mut first = Vec::new();
        countdown.start(Duration::from_secs(1), |m, _| first.push(m));

        let mut second = Vec::new();
        countdown.start(Duration::from_secs(2), |m, _| second.push(m));

        // The first run's tick would have expired a one-second run.
        assert!(drain(&mut countdown, first).is_empty());
        assert_eq!(countdown.remaining(), Some(2));

        let events = drain(&mut countdown, second);
        assert_eq!(
            events.iter().filter(|e| **e == TimerEvent::Expired).count(),
            1
        );
    }

    #[test]
    fn test_stop_then_start_race_expires_once() {
        let mut countdown = Countdown::default();
        let mut stale = Vec::new();
        countdown.start(Duration::from_secs(1), |m, _| stale.push(m));
        countdown.stop();
        let mut fresh = Vec::new();
        countdown.start(Duration::from_secs(1), |m, _| fresh.push(m));

        stale.extend(fresh);
        let events = drain(&mut countdown, stale);

        assert_eq!(events, vec![TimerEvent::Tick(0), TimerEvent::Expired]);
    }

    #[test]
    fn test_tick_after_expiry_is_ignored() {
        let mut countdown = Countdown::default();
        let mut scheduled = Vec::new();
        countdown.start(Duration::from_secs(1), |m, _| scheduled.push(m));
        let tick = unwrap_tick(scheduled[0].clone());

        assert_eq!(countdown.receive_alarm(&tick, |_, _| {}).len(), 2);
        assert!(countdown.receive_alarm(&tick, |_, _| {}).is_empty());
    }

    #[test]
    fn test_warning_threshold() {
        let mut countdown = Countdown::default();
        assert!(!countdown.is_warning());

        countdown.start(Duration::from_secs(WARNING_THRESHOLD + 1), |_, _| {});
        assert!(!countdown.is_warning());

        countdown.start(Duration::from_secs(WARNING_THRESHOLD), |_, _| {});
        assert!(countdown.is_warning());
    }
}
