//! Quiz session state machine
//!
//! The controller owns everything that changes during a quiz attempt: the
//! session handle, the active question, the user's selection, and the
//! countdown. It reacts to three kinds of stimuli, one at a time: user
//! intents, alarms it scheduled earlier, and responses to requests it
//! issued earlier. It never waits. Remote calls leave through
//! `send_request` and come back through `receive_response`; timed events
//! leave through `schedule_message` and come back through `receive_alarm`.
//!
//! Every request carries a `Ticket`. A response is applied only when its
//! ticket is the one the controller is still waiting for, so replies that
//! arrive after a restart or after the controller moved on are dropped.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    client::{Call, CreatedSession, Reply},
    constants::{
        quiz::{MAX_QUESTION_COUNT, MIN_QUESTION_COUNT},
        timing::FEEDBACK_DELAY_MILLIS,
    },
    error::{Error, Result, ServiceError},
    quiz::{AnswerOutcome, Question, QuizResults, Selection, SessionId},
    timer::{Countdown, TimerEvent},
    tunnel::{Confirmation, Feedback, Frame, Notice, Severity, Tunnel},
};

/// Prompt shown before ending a quiz early
pub const END_QUIZ_PROMPT: &str = "Are you sure you want to end the quiz?";

/// The phases of a quiz attempt
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    /// No quiz; waiting for the user to start one
    #[default]
    Idle,
    /// Waiting for the service to create a session
    AwaitingStart,
    /// A question is on screen and the countdown is running
    InProgress,
    /// An answer was sent and its verdict is outstanding
    SubmissionPending,
    /// The verdict is on screen for the settling interval
    ShowingFeedback,
    /// The quiz is over; results are shown or being loaded
    ShowingResults,
}

/// Identifies one request within one quiz attempt
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    attempt: u64,
    sequence: u64,
}

/// A remote call the controller wants performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Must be echoed back on the response
    pub ticket: Ticket,
    /// The operation to perform
    pub call: Call,
}

/// The answer to a `Request`
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Ticket of the request being answered
    pub ticket: Ticket,
    /// What the service said
    pub reply: std::result::Result<Reply, ServiceError>,
}

/// Alarm messages for the controller's own timed events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// The settling interval after the verdict of `ticket` has passed
    FeedbackElapsed {
        /// Ticket of the submission whose verdict was shown
        ticket: Ticket,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Create,
    Submit,
    End,
    FetchResults,
}

impl From<&Call> for Pending {
    fn from(call: &Call) -> Self {
        match call {
            Call::Create { .. } => Pending::Create,
            Call::Submit { .. } => Pending::Submit,
            Call::End { .. } => Pending::End,
            Call::FetchResults { .. } => Pending::FetchResults,
        }
    }
}

/// The quiz session controller
#[derive(Debug)]
pub struct Controller {
    state: State,
    session_id: Option<SessionId>,
    question: Option<Question>,
    selection: Selection,
    countdown: Countdown,
    outcome: Option<AnswerOutcome>,
    results: Option<QuizResults>,
    score: u64,
    requested_count: u32,
    total_questions: Option<u32>,
    question_number: u32,
    ticket: Ticket,
    pending: Option<(Ticket, Pending)>,
    feedback_delay: Duration,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(Duration::from_millis(FEEDBACK_DELAY_MILLIS))
    }
}

impl Controller {
    /// Creates an idle controller that shows each verdict for `feedback_delay`
    pub fn new(feedback_delay: Duration) -> Self {
        Self {
            state: State::Idle,
            session_id: None,
            question: None,
            selection: Selection::NONE,
            countdown: Countdown::default(),
            outcome: None,
            results: None,
            score: 0,
            requested_count: 0,
            total_questions: None,
            question_number: 0,
            ticket: Ticket::default(),
            pending: None,
            feedback_delay,
        }
    }

    /// Current phase
    pub fn state(&self) -> State {
        self.state
    }

    /// Handle of the running session
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// The question on screen
    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    /// The user's current choice
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Session score so far
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Verdict of the last submission
    pub fn outcome(&self) -> Option<&AnswerOutcome> {
        self.outcome.as_ref()
    }

    /// Final results, once known
    pub fn results(&self) -> Option<&QuizResults> {
        self.results.as_ref()
    }

    /// Seconds left on the countdown
    pub fn time_remaining(&self) -> Option<u64> {
        self.countdown.remaining()
    }

    /// Whether the countdown is running
    pub fn is_timer_running(&self) -> bool {
        self.countdown.is_running()
    }

    /// Builds the frame describing the current screen
    pub fn frame(&self) -> Frame {
        Frame {
            state: self.state,
            question: self.question.clone(),
            position: self.question.as_ref().and_then(|q| {
                q.position()
                    .or_else(|| self.total_questions.map(|t| (self.question_number, t)))
            }),
            selection: self.selection,
            time_remaining: self.countdown.remaining(),
            warning: self.countdown.is_warning(),
            score: self.score,
            feedback: match self.state {
                State::ShowingFeedback => self.outcome.as_ref().map(|o| Feedback {
                    is_correct: o.is_correct,
                    correct_answer_index: o.correct_answer_index,
                }),
                _ => None,
            },
            results: self.results.clone(),
        }
    }

    /// Attempts to transition from one state to another
    ///
    /// Returns `true` if the current state was `before` and is now `after`.
    fn change_state(&mut self, before: State, after: State) -> bool {
        if self.state == before {
            self.state = after;

            true
        } else {
            false
        }
    }

    fn issue<R: FnMut(Request)>(&mut self, call: Call, mut send_request: R) {
        self.ticket.sequence += 1;
        self.pending = Some((self.ticket, Pending::from(&call)));
        send_request(Request {
            ticket: self.ticket,
            call,
        });
    }

    /// Starts a quiz with `question_count` questions
    ///
    /// Does nothing unless the controller is idle.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if `question_count` is outside
    /// `[MIN_QUESTION_COUNT, MAX_QUESTION_COUNT]`.
    pub fn start_quiz<T: Tunnel, R: FnMut(Request)>(
        &mut self,
        question_count: u32,
        tunnel: &T,
        send_request: R,
    ) -> Result<()> {
        if self.state != State::Idle {
            debug!(state = ?self.state, "ignoring start outside of idle");
            return Ok(());
        }
        if !(MIN_QUESTION_COUNT..=MAX_QUESTION_COUNT).contains(&question_count) {
            let message = format!(
                "Please enter a valid number of questions ({MIN_QUESTION_COUNT}-{MAX_QUESTION_COUNT})"
            );
            tunnel.notify(&Notice::new(message.clone(), Severity::Error));
            return Err(Error::InvalidArgument(message));
        }

        self.change_state(State::Idle, State::AwaitingStart);
        self.requested_count = question_count;
        tunnel.render(&self.frame());
        self.issue(Call::Create { question_count }, send_request);
        Ok(())
    }

    /// Chooses the option at `index` for the active question
    ///
    /// Does nothing unless a question is accepting answers.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if the question has no such option.
    pub fn select_option<T: Tunnel>(&mut self, index: usize, tunnel: &T) -> Result<()> {
        if self.state != State::InProgress {
            debug!(state = ?self.state, index, "ignoring selection");
            return Ok(());
        }
        let Some(question) = &self.question else {
            return Ok(());
        };
        if !question.has_option(index) {
            let message = format!(
                "Option {} does not exist; choose 1-{}",
                index + 1,
                question.options().len()
            );
            tunnel.notify(&Notice::new(message.clone(), Severity::Error));
            return Err(Error::InvalidArgument(message));
        }

        self.selection = Selection::of(index);
        tunnel.render(&self.frame());
        Ok(())
    }

    /// Submits the current selection, which may be none
    ///
    /// Does nothing unless a question is accepting answers, so a second
    /// submit for the same question is ignored.
    pub fn submit_answer<T: Tunnel, R: FnMut(Request)>(&mut self, tunnel: &T, send_request: R) {
        if self.state != State::InProgress {
            debug!(state = ?self.state, "ignoring submit");
            return;
        }
        self.submit(tunnel, send_request);
    }

    fn submit<T: Tunnel, R: FnMut(Request)>(&mut self, tunnel: &T, send_request: R) {
        let Some(session_id) = self.session_id.clone() else {
            warn!("no session to submit to");
            return;
        };
        if self.change_state(State::InProgress, State::SubmissionPending) {
            self.countdown.stop();
            tunnel.render(&self.frame());
            self.issue(
                Call::Submit {
                    session_id,
                    selection: self.selection,
                },
                send_request,
            );
        }
    }

    /// Ends the quiz early after asking `confirmation`
    ///
    /// Does nothing unless a question is accepting answers.
    ///
    /// # Errors
    ///
    /// Returns `Error::UserCancelled` if the user declines; nothing changes.
    pub fn end_quiz<C: Confirmation + ?Sized, T: Tunnel, R: FnMut(Request)>(
        &mut self,
        confirmation: &C,
        tunnel: &T,
        send_request: R,
    ) -> Result<()> {
        if self.state != State::InProgress {
            debug!(state = ?self.state, "ignoring end");
            return Ok(());
        }
        let Some(session_id) = self.session_id.clone() else {
            return Ok(());
        };
        if !confirmation.confirm(END_QUIZ_PROMPT) {
            tunnel.notify(&Notice::new("Quiz continues.", Severity::Info));
            return Err(Error::UserCancelled);
        }

        self.countdown.stop();
        self.change_state(State::InProgress, State::ShowingResults);
        self.results = None;
        tunnel.render(&self.frame());
        self.issue(Call::End { session_id }, send_request);
        Ok(())
    }

    /// Asks for the results again after loading them failed
    pub fn reload_results<R: FnMut(Request)>(&mut self, send_request: R) {
        if self.state != State::ShowingResults || self.results.is_some() || self.pending.is_some()
        {
            return;
        }
        if let Some(session_id) = self.session_id.clone() {
            self.issue(Call::FetchResults { session_id }, send_request);
        }
    }

    /// Abandons whatever is going on and returns to idle
    pub fn restart_quiz<T: Tunnel>(&mut self, tunnel: &T) {
        self.countdown.stop();
        self.state = State::Idle;
        self.session_id = None;
        self.question = None;
        self.selection = Selection::NONE;
        self.outcome = None;
        self.results = None;
        self.score = 0;
        self.requested_count = 0;
        self.total_questions = None;
        self.question_number = 0;
        self.pending = None;
        self.ticket = Ticket {
            attempt: self.ticket.attempt + 1,
            sequence: 0,
        };
        tunnel.render(&self.frame());
    }

    fn load_question<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        question: Question,
        tunnel: &T,
        schedule_message: S,
    ) {
        self.question_number += 1;
        self.countdown.start(question.time_limit(), schedule_message);
        self.question = Some(question);
        self.selection = Selection::NONE;
        self.outcome = None;
        self.state = State::InProgress;
        tunnel.render(&self.frame());
    }

    /// Applies a response to an earlier request
    ///
    /// Responses whose ticket is not the one outstanding are discarded.
    pub fn receive_response<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        response: Response,
        tunnel: &T,
        mut schedule_message: S,
    ) {
        let Some((ticket, pending)) = self.pending else {
            debug!(ticket = ?response.ticket, "discarding unsolicited response");
            return;
        };
        if ticket != response.ticket {
            debug!(ticket = ?response.ticket, expected = ?ticket, "discarding stale response");
            return;
        }
        self.pending = None;

        match (pending, response.reply) {
            (Pending::Create, Ok(Reply::Created(created))) => {
                self.on_created(created, tunnel, &mut schedule_message);
            }
            (Pending::Submit, Ok(Reply::Submitted(outcome))) => {
                self.on_submitted(outcome, tunnel, &mut schedule_message);
            }
            (Pending::End, Ok(Reply::Ended(results)))
            | (Pending::FetchResults, Ok(Reply::Results(results))) => {
                info!(score = results.score, "quiz finished");
                self.results = Some(results);
                tunnel.render(&self.frame());
            }
            (Pending::Create, Err(err)) => {
                warn!(error = %err, "failed to start quiz");
                self.change_state(State::AwaitingStart, State::Idle);
                tunnel.notify(&Notice::new(
                    "Failed to start quiz. Please try again.",
                    Severity::Error,
                ));
                tunnel.render(&self.frame());
            }
            (Pending::Submit, Err(err)) => {
                warn!(error = %err, "failed to submit answer");
                self.rearm(tunnel, &mut schedule_message);
                tunnel.notify(&Notice::new(
                    "Failed to submit answer. Please try again.",
                    Severity::Error,
                ));
            }
            (Pending::End, Err(err)) => {
                warn!(error = %err, "failed to end quiz");
                self.rearm(tunnel, &mut schedule_message);
                tunnel.notify(&Notice::new(
                    "Failed to end quiz. Please try again.",
                    Severity::Error,
                ));
            }
            (Pending::FetchResults, Err(err)) => {
                warn!(error = %err, "failed to load results");
                tunnel.notify(&Notice::new(
                    "Failed to load results. Please try again.",
                    Severity::Error,
                ));
                tunnel.render(&self.frame());
            }
            (pending, Ok(reply)) => {
                warn!(?pending, ?reply, "reply does not match request");
            }
        }
    }

    /// Returns to the question after a failed call, with a full countdown
    fn rearm<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        tunnel: &T,
        schedule_message: S,
    ) {
        let Some(limit) = self.question.as_ref().map(Question::time_limit) else {
            return;
        };
        self.state = State::InProgress;
        self.countdown.start(limit, schedule_message);
        tunnel.render(&self.frame());
    }

    fn on_created<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        created: CreatedSession,
        tunnel: &T,
        schedule_message: S,
    ) {
        if self.state != State::AwaitingStart {
            return;
        }
        let total = created.total_questions.unwrap_or(self.requested_count);
        info!(session = %created.session_id, total, "quiz started");
        self.session_id = Some(created.session_id);
        self.total_questions = Some(total);
        self.score = 0;
        self.load_question(created.first_question, tunnel, schedule_message);
        tunnel.notify(&Notice::new(
            format!(
                "Quiz started with {}! Good luck!",
                pluralizer::pluralize(
                    "question",
                    isize::try_from(total).unwrap_or(isize::MAX),
                    true
                )
            ),
            Severity::Info,
        ));
    }

    fn on_submitted<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        outcome: AnswerOutcome,
        tunnel: &T,
        mut schedule_message: S,
    ) {
        if !self.change_state(State::SubmissionPending, State::ShowingFeedback) {
            return;
        }
        self.score = outcome.updated_score;
        let notice = if outcome.is_correct {
            Notice::new("Correct! Well done!", Severity::Success)
        } else {
            Notice::new("Incorrect. Better luck next time!", Severity::Error)
        };
        self.outcome = Some(outcome);
        tunnel.render(&self.frame());
        tunnel.notify(&notice);
        schedule_message(
            AlarmMessage::FeedbackElapsed {
                ticket: self.ticket,
            }
            .into(),
            self.feedback_delay,
        );
    }

    fn advance<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration), R: FnMut(Request)>(
        &mut self,
        tunnel: &T,
        schedule_message: S,
        send_request: R,
    ) {
        let Some(outcome) = self.outcome.take() else {
            return;
        };
        match outcome.next_question {
            Some(next) if !outcome.is_completed => {
                self.load_question(next, tunnel, schedule_message);
            }
            next => {
                if next.is_none() && !outcome.is_completed {
                    warn!("service sent no next question for an unfinished quiz");
                }
                self.state = State::ShowingResults;
                self.results = outcome.results;
                tunnel.render(&self.frame());
                if self.results.is_none() {
                    self.reload_results(send_request);
                }
            }
        }
    }

    /// Handles a scheduled alarm
    ///
    /// Countdown ticks re-render the question; expiry submits whatever is
    /// selected. The end of the settling interval moves on to the next
    /// question or to the results. Alarms from a countdown run or verdict
    /// that is no longer current are ignored.
    pub fn receive_alarm<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration), R: FnMut(Request)>(
        &mut self,
        message: &crate::AlarmMessage,
        tunnel: &T,
        mut schedule_message: S,
        send_request: R,
    ) {
        match message {
            crate::AlarmMessage::Countdown(tick) => {
                if self.state != State::InProgress {
                    return;
                }
                for event in self.countdown.receive_alarm(tick, &mut schedule_message) {
                    match event {
                        TimerEvent::Tick(_) => tunnel.render(&self.frame()),
                        TimerEvent::Expired => {
                            tunnel.notify(&Notice::new(
                                "Time's up! Submitting your answer...",
                                Severity::Warning,
                            ));
                            self.submit(tunnel, send_request);
                            return;
                        }
                    }
                }
            }
            crate::AlarmMessage::Controller(AlarmMessage::FeedbackElapsed { ticket }) => {
                if self.state == State::ShowingFeedback && *ticket == self.ticket {
                    self.advance(tunnel, schedule_message, send_request);
                }
            }
        }
    }
}
