//! Presentation boundary
//!
//! This module defines what the controller tells whatever is drawing the
//! quiz, and the yes/no collaborator it consults before ending a quiz.
//! Implementations might print to a terminal, emit JSON lines, or drive a
//! GUI; the controller only ever sees these traits.

use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::{
    controller::State,
    quiz::{Question, QuizResults, Selection},
};

/// How prominent a notice should be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Something went as hoped
    Success,
    /// Neutral information
    Info,
    /// Attention needed, but nothing failed
    Warning,
    /// Something failed or the answer was wrong
    Error,
}

/// A short message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Text to show
    pub message: String,
    /// How to show it
    pub severity: Severity,
}

impl Notice {
    /// Creates a notice
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

/// Correctness information shown while the controller settles on a verdict
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    /// Whether the submitted option was correct
    pub is_correct: bool,
    /// The correct option, when the service revealed it
    pub correct_answer_index: Option<usize>,
}

/// Everything needed to draw the current screen
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Controller state
    pub state: State,
    /// The active question, while one is loaded
    pub question: Option<Question>,
    /// One-based position and total, when known
    pub position: Option<(u32, u32)>,
    /// The user's current choice
    pub selection: Selection,
    /// Seconds left on the countdown, while it is running
    pub time_remaining: Option<u64>,
    /// Whether the countdown is close to expiring
    pub warning: bool,
    /// Session score so far
    pub score: u64,
    /// Verdict on the last submission, while it is being shown
    pub feedback: Option<Feedback>,
    /// Final results, once available
    pub results: Option<QuizResults>,
}

impl Frame {
    /// Converts the frame to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Trait for sending screen updates to the user
///
/// The controller calls `render` after every state change and every
/// countdown tick, and `notify` for transient messages. Implementations
/// must only read what they are given; they never mutate quiz state.
pub trait Tunnel {
    /// Draws the given frame
    fn render(&self, frame: &Frame);

    /// Shows a transient message
    fn notify(&self, notice: &Notice);
}

/// Asks the user a yes/no question
pub trait Confirmation {
    /// Returns `true` if the user agreed to `prompt`
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirmation for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// A confirmation that was already answered before it was asked
///
/// Front ends that collect the answer as part of the input itself (a
/// terminal reading "y" after "q") hand the controller one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answered(pub bool);

impl Confirmation for Answered {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
