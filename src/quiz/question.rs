//! Questions and the user's selection
//!
//! A question arrives from the quiz service either as the first question
//! of a new session or as the follow-up of a graded answer. It is
//! immutable once received. The correct answer is never part of it; the
//! client only learns it from an answer outcome.

use std::time::Duration;

use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::constants::question::{
    MAX_OPTION_COUNT, MAX_TEXT_LENGTH, MAX_TIME_LIMIT, MIN_OPTION_COUNT, MIN_TEXT_LENGTH,
    MIN_TIME_LIMIT,
};

type ValidationResult = garde::Result;

/// Validates that a duration falls within specified bounds.
///
/// # Errors
///
/// Returns a `garde::Error` if the duration is outside the inclusive range
/// `[MIN_SECONDS, MAX_SECONDS]`.
pub fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    val: &Duration,
    _ctx: &(),
) -> ValidationResult {
    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "outside of bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

/// A multiple choice question as delivered by the quiz service
#[serde_with::serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Service-side identifier, when the service sends one
    #[garde(skip)]
    id: Option<u64>,
    /// The question text
    #[serde(rename = "question")]
    #[garde(length(min = MIN_TEXT_LENGTH, max = MAX_TEXT_LENGTH))]
    text: String,
    /// Answer options in display order
    #[garde(length(min = MIN_OPTION_COUNT, max = MAX_OPTION_COUNT))]
    options: Vec<String>,
    /// How long the user has to answer
    #[garde(custom(validate_duration::<MIN_TIME_LIMIT, MAX_TIME_LIMIT>))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    time_limit: Duration,
    /// One-based position of this question in the session
    #[garde(skip)]
    question_number: Option<u32>,
    /// Number of questions in the session
    #[garde(skip)]
    total_questions: Option<u32>,
}

impl Question {
    /// Creates a question without position information
    pub fn new<I, S>(text: impl Into<String>, options: I, time_limit: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: None,
            text: text.into(),
            options: options.into_iter().map(Into::into).collect(),
            time_limit,
            question_number: None,
            total_questions: None,
        }
    }

    /// Attaches a one-based position and the session's question total
    #[must_use]
    pub fn with_position(mut self, number: u32, total: u32) -> Self {
        self.question_number = Some(number);
        self.total_questions = Some(total);
        self
    }

    /// Returns the question text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the answer options
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Returns the time limit for answering
    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Returns the `(number, total)` position if the service sent both
    pub fn position(&self) -> Option<(u32, u32)> {
        self.question_number.zip(self.total_questions)
    }

    /// Whether `index` names one of this question's options
    pub fn has_option(&self, index: usize) -> bool {
        index < self.options.len()
    }
}

/// The user's chosen option for the active question, or none
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::From,
)]
#[serde(transparent)]
pub struct Selection(Option<usize>);

impl Selection {
    /// No option chosen
    pub const NONE: Selection = Selection(None);

    /// A selection of the option at `index`
    pub fn of(index: usize) -> Self {
        Self(Some(index))
    }

    /// The chosen index, if any
    pub fn index(self) -> Option<usize> {
        self.0
    }

    /// Whether no option is chosen
    pub fn is_none(self) -> bool {
        self.0.is_none()
    }
}
