//! Answer outcomes and final results
//!
//! These are the verdicts the quiz service produces: one `AnswerOutcome`
//! per submitted question and one `QuizResults` per finished session.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::question::Question;
use crate::constants::performance::{EXCELLENT, FAIR, GOOD, GREAT};

/// The service's verdict on a submitted answer
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    /// Whether the submitted option was correct
    pub is_correct: bool,
    /// The correct option, when the service reveals it
    #[serde(rename = "correctAnswer")]
    pub correct_answer_index: Option<usize>,
    /// Session score after this answer
    #[serde(rename = "score")]
    pub updated_score: u64,
    /// Whether this was the last question
    pub is_completed: bool,
    /// The next question, absent once the session is completed
    pub next_question: Option<Question>,
    /// Percentage of questions answered so far
    pub progress: Option<u32>,
    /// Final results, when the service sends them with the last outcome
    pub results: Option<QuizResults>,
}

/// Per-question line of the final results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDetail {
    /// The question text
    pub question: String,
    /// Whether the user answered it correctly
    pub is_correct: bool,
}

/// Terminal artifact of a quiz session
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResults {
    /// Final score
    pub score: u64,
    /// Number of correctly answered questions
    #[serde(rename = "correctAnswers")]
    pub correct_answer_count: u32,
    /// Correct answers as a percentage of answered questions
    pub accuracy_percentage: u32,
    /// Wall time of the session
    pub duration_seconds: u64,
    /// Number of questions in the session, when reported
    pub total_questions: Option<u32>,
    /// One entry per answered question, in order
    #[serde(default)]
    pub answer_details: Vec<AnswerDetail>,
}

impl QuizResults {
    /// Rates the session by accuracy
    pub fn performance(&self) -> Performance {
        Performance::from_accuracy(self.accuracy_percentage)
    }

    /// Numbered lines of the per-question breakdown
    pub fn detail_lines(&self) -> Vec<String> {
        self.answer_details
            .iter()
            .enumerate()
            .map(|(i, detail)| {
                format!(
                    "{}. {} - {}",
                    i + 1,
                    detail.question,
                    if detail.is_correct {
                        "Correct"
                    } else {
                        "Incorrect"
                    }
                )
            })
            .collect_vec()
    }
}

/// Coarse rating of a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Performance {
    /// 90% and above
    Excellent,
    /// 80% and above
    Great,
    /// 70% and above
    Good,
    /// 60% and above
    Fair,
    /// Below 60%
    NeedsPractice,
}

impl Performance {
    /// Rates an accuracy percentage
    pub fn from_accuracy(accuracy: u32) -> Self {
        match accuracy {
            a if a >= EXCELLENT => Self::Excellent,
            a if a >= GREAT => Self::Great,
            a if a >= GOOD => Self::Good,
            a if a >= FAIR => Self::Fair,
            _ => Self::NeedsPractice,
        }
    }

    /// Short encouragement shown under the results
    pub fn message(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent! Outstanding performance!",
            Self::Great => "Great job! Well done!",
            Self::Good => "Good work! Keep it up!",
            Self::Fair => "Not bad! Room for improvement.",
            Self::NeedsPractice => "Keep studying! Practice makes perfect!",
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_deserialize_minimal() {
        let json = r#"{"isCorrect": true, "score": 10, "isCompleted": true, "nextQuestion": null}"#;
        let outcome: AnswerOutcome = serde_json::from_str(json).unwrap();

        assert!(outcome.is_correct);
        assert_eq!(outcome.updated_score, 10);
        assert!(outcome.is_completed);
        assert!(outcome.next_question.is_none());
        assert!(outcome.correct_answer_index.is_none());
        assert!(outcome.results.is_none());
    }

    #[test]
    fn test_outcome_deserialize_with_next_question() {
        let json = r#"{
            "isCorrect": false,
            "correctAnswer": 2,
            "score": 20,
            "isCompleted": false,
            "progress": 40,
            "nextQuestion": {"question": "Next?", "options": ["a", "b"], "timeLimit": 30}
        }"#;
        let outcome: AnswerOutcome = serde_json::from_str(json).unwrap();

        assert!(!outcome.is_correct);
        assert_eq!(outcome.correct_answer_index, Some(2));
        assert_eq!(outcome.progress, Some(40));
        assert_eq!(outcome.next_question.unwrap().text(), "Next?");
    }

    #[test]
    fn test_results_deserialize() {
        let json = r#"{
            "score": 30,
            "correctAnswers": 3,
            "accuracyPercentage": 75,
            "durationSeconds": 64,
            "answerDetails": [
                {"question": "Q1", "isCorrect": true},
                {"question": "Q2", "isCorrect": false}
            ]
        }"#;
        let results: QuizResults = serde_json::from_str(json).unwrap();

        assert_eq!(results.correct_answer_count, 3);
        assert_eq!(results.duration_seconds, 64);
        assert_eq!(results.answer_details.len(), 2);
        assert_eq!(results.performance(), Performance::Good);
        assert_eq!(
            results.detail_lines(),
            vec!["1. Q1 - Correct", "2. Q2 - Incorrect"]
        );
    }

    #[test]
    fn test_results_without_details() {
        let json = r#"{"score": 0, "correctAnswers": 0, "accuracyPercentage": 0, "durationSeconds": 5}"#;
        let results: QuizResults = serde_json::from_str(json).unwrap();
        assert!(results.answer_details.is_empty());
        assert!(results.detail_lines().is_empty());
    }

    #[test]
    fn test_performance_tiers() {
        assert_eq!(Performance::from_accuracy(100), Performance::Excellent);
        assert_eq!(Performance::from_accuracy(90), Performance::Excellent);
        assert_eq!(Performance::from_accuracy(89), Performance::Great);
        assert_eq!(Performance::from_accuracy(80), Performance::Great);
        assert_eq!(Performance::from_accuracy(70), Performance::Good);
        assert_eq!(Performance::from_accuracy(60), Performance::Fair);
        assert_eq!(Performance::from_accuracy(59), Performance::NeedsPractice);
        assert_eq!(Performance::from_accuracy(0), Performance::NeedsPractice);
    }
}
