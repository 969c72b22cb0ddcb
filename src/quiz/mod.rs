//! Quiz data model
//!
//! This module contains the data the client exchanges with the quiz
//! service: questions, the user's selection, graded answers, final
//! results, and the opaque session handle.

pub mod outcome;
pub mod question;
pub mod session_id;

pub use outcome::{AnswerDetail, AnswerOutcome, Performance, QuizResults};
pub use question::{Question, Selection};
pub use session_id::SessionId;
