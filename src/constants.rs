//! Configuration constants for the quiz client
//!
//! This module contains the limits and pacing values used throughout the
//! client to validate what the quiz service sends and to drive the
//! countdown and feedback timing.

/// Quiz session constants
pub mod quiz {
    /// Minimum number of questions a session can be created with
    pub const MIN_QUESTION_COUNT: u32 = 1;
    /// Maximum number of questions a session can be created with
    pub const MAX_QUESTION_COUNT: u32 = 25;
    /// Question count used when the user does not pick one
    pub const DEFAULT_QUESTION_COUNT: u32 = 10;
}

/// Question constants
pub mod question {
    /// Minimum length of a question text
    pub const MIN_TEXT_LENGTH: usize = 1;
    /// Maximum length of a question text
    pub const MAX_TEXT_LENGTH: usize = 500;
    /// Minimum number of answer options
    pub const MIN_OPTION_COUNT: usize = 2;
    /// Maximum number of answer options
    pub const MAX_OPTION_COUNT: usize = 8;
    /// Minimum time limit in seconds for answering a question
    pub const MIN_TIME_LIMIT: u64 = 1;
    /// Maximum time limit in seconds for answering a question
    pub const MAX_TIME_LIMIT: u64 = 240;
}

/// Countdown and pacing constants
pub mod timing {
    /// Interval between two countdown ticks, in milliseconds
    pub const TICK_MILLIS: u64 = 1000;
    /// Remaining seconds at or below which the countdown is flagged as urgent
    pub const WARNING_THRESHOLD: u64 = 10;
    /// Settling interval after feedback is shown, in milliseconds
    pub const FEEDBACK_DELAY_MILLIS: u64 = 2000;
}

/// Result grading constants
pub mod performance {
    /// Minimum accuracy for an excellent rating
    pub const EXCELLENT: u32 = 90;
    /// Minimum accuracy for a great rating
    pub const GREAT: u32 = 80;
    /// Minimum accuracy for a good rating
    pub const GOOD: u32 = 70;
    /// Minimum accuracy for a fair rating
    pub const FAIR: u32 = 60;
}
