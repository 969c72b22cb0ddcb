//! # Quizclock
//!
//! This library provides the client side of a timed multiple-choice quiz.
//! It talks to a remote quiz service that owns the questions and the
//! grading, runs a per-question countdown that submits automatically when
//! time runs out, and drives a session state machine that tells a
//! presentation layer what to draw.
//!
//! The state machine in [`controller`] is synchronous. It schedules its
//! timed events and remote calls through closures, and [`runtime`] turns
//! those into tokio tasks that feed results back one at a time.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::ignored_unit_patterns)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
use serde::{Deserialize, Serialize};

pub mod client;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod quiz;
pub mod runtime;
pub mod timer;
pub mod tunnel;

/// Alarm messages for every timed event in the client
///
/// Components schedule these through a `schedule_message` closure and
/// receive them back once the delay has passed.
#[derive(Debug, Clone, derive_more::From, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Per-question countdown ticks
    Countdown(timer::AlarmMessage),
    /// Controller timeouts, such as the end of the feedback interval
    Controller(controller::AlarmMessage),
}

impl AlarmMessage {
    /// Converts the alarm to a JSON string for logging or persistence
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_alarm_message_from_countdown() {
        let alarm: AlarmMessage = timer::AlarmMessage::Tick { run: 3 }.into();
        assert!(matches!(
            alarm,
            AlarmMessage::Countdown(timer::AlarmMessage::Tick { run: 3 })
        ));
        assert_eq!(alarm.to_message(), r#"{"Countdown":{"Tick":{"run":3}}}"#);
    }

    #[test]
    fn test_alarm_message_round_trip() {
        let alarm: AlarmMessage = controller::AlarmMessage::FeedbackElapsed {
            ticket: controller::Ticket::default(),
        }
        .into();
        let parsed: AlarmMessage = serde_json::from_str(&alarm.to_message()).unwrap();
        assert!(matches!(
            parsed,
            AlarmMessage::Controller(controller::AlarmMessage::FeedbackElapsed { .. })
        ));
    }
}
