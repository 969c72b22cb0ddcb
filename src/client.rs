//! Session client for the remote quiz service
//!
//! This module wraps the quiz service's four operations into typed calls.
//! It holds no quiz state and never retries: each call either resolves with
//! a parsed, validated result or fails with a `ServiceError`.

use std::time::Duration;

use async_trait::async_trait;
use garde::Validate;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_with::skip_serializing_none;
use url::Url;

use crate::{
    constants::quiz::{MAX_QUESTION_COUNT, MIN_QUESTION_COUNT},
    error::{ErrorKind, ServiceError},
    quiz::{AnswerOutcome, Question, QuizResults, Selection, SessionId},
};

/// Body of the create call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    /// Number of questions the session should have
    #[garde(range(min = MIN_QUESTION_COUNT, max = MAX_QUESTION_COUNT))]
    pub question_count: u32,
}

/// Body of the submit call
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    /// Session being answered
    pub session_id: SessionId,
    /// Chosen option; omitted when the user chose nothing
    pub selected_answer: Option<usize>,
}

/// Body of the end call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndQuizRequest {
    /// Session to end
    pub session_id: SessionId,
}

/// Result of the create call
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSession {
    /// Handle for all later calls
    pub session_id: SessionId,
    /// Number of questions in the session, when reported
    pub total_questions: Option<u32>,
    /// The question to show first
    pub first_question: Question,
}

#[derive(Debug, Deserialize)]
struct EndedSession {
    results: QuizResults,
}

/// The quiz service as seen by the client
#[async_trait]
pub trait QuizService: Send + Sync {
    /// Creates a session with `question_count` questions
    async fn create(&self, question_count: u32) -> Result<CreatedSession, ServiceError>;

    /// Submits the selection for the session's current question
    async fn submit(
        &self,
        session_id: &SessionId,
        selection: Selection,
    ) -> Result<AnswerOutcome, ServiceError>;

    /// Ends the session early and returns its results
    async fn end(&self, session_id: &SessionId) -> Result<QuizResults, ServiceError>;

    /// Fetches the results of a completed session
    async fn fetch_results(&self, session_id: &SessionId) -> Result<QuizResults, ServiceError>;
}

/// A single remote operation, detached from any service instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// Create a session
    Create {
        /// Requested question count
        question_count: u32,
    },
    /// Submit an answer
    Submit {
        /// Session being answered
        session_id: SessionId,
        /// The user's choice, possibly none
        selection: Selection,
    },
    /// End a session early
    End {
        /// Session to end
        session_id: SessionId,
    },
    /// Fetch final results
    FetchResults {
        /// Session whose results are wanted
        session_id: SessionId,
    },
}

/// The successful result of a `Call`
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A session was created
    Created(CreatedSession),
    /// An answer was graded
    Submitted(AnswerOutcome),
    /// A session was ended early
    Ended(QuizResults),
    /// Results were fetched
    Results(QuizResults),
}

impl Call {
    /// Performs the call against `service`
    ///
    /// # Errors
    ///
    /// Returns whatever `ServiceError` the service operation produced.
    pub async fn execute(self, service: &dyn QuizService) -> Result<Reply, ServiceError> {
        match self {
            Call::Create { question_count } => {
                service.create(question_count).await.map(Reply::Created)
            }
            Call::Submit {
                session_id,
                selection,
            } => service
                .submit(&session_id, selection)
                .await
                .map(Reply::Submitted),
            Call::End { session_id } => service.end(&session_id).await.map(Reply::Ended),
            Call::FetchResults { session_id } => service
                .fetch_results(&session_id)
                .await
                .map(Reply::Results),
        }
    }
}

/// Rejects questions the client cannot present
fn check_question(question: &Question) -> Result<(), ServiceError> {
    question
        .validate()
        .map_err(|e| ServiceError::unavailable(format!("malformed question in response: {e}")))
}

/// `QuizService` over HTTP/JSON
#[derive(Debug, Clone)]
pub struct HttpQuizService {
    client: Client,
    base_url: Url,
}

impl HttpQuizService {
    /// Creates a client for the service rooted at `base_url`
    ///
    /// # Errors
    ///
    /// Returns a `ServiceError` if the HTTP client cannot be built.
    pub fn new(mut base_url: Url, timeout: Duration) -> Result<Self, ServiceError> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|e| ServiceError::unavailable(format!("invalid endpoint {path}: {e}")))
    }

    fn results_endpoint(&self, session_id: &SessionId) -> Result<Url, ServiceError> {
        let mut url = self.endpoint("api/quiz/")?;
        url.path_segments_mut()
            .map_err(|()| ServiceError::unavailable("service URL cannot have a path"))?
            .pop_if_empty()
            .push(session_id.as_str())
            .push("results");
        Ok(url)
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        Self::read(response).await
    }

    async fn read<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.trim().to_string()
            };
            return Err(ServiceError::from_status(status.as_u16(), message));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl QuizService for HttpQuizService {
    async fn create(&self, question_count: u32) -> Result<CreatedSession, ServiceError> {
        let request = CreateQuizRequest { question_count };
        request.validate().map_err(|e| ServiceError {
            kind: ErrorKind::InvalidArgument,
            status_code: None,
            message: e.to_string(),
        })?;
        let created: CreatedSession = self.post("api/quiz/create", &request).await?;
        check_question(&created.first_question)?;
        Ok(created)
    }

    async fn submit(
        &self,
        session_id: &SessionId,
        selection: Selection,
    ) -> Result<AnswerOutcome, ServiceError> {
        let request = SubmitAnswerRequest {
            session_id: session_id.clone(),
            selected_answer: selection.index(),
        };
        let outcome: AnswerOutcome = self.post("api/quiz/answer", &request).await?;
        if let Some(next) = &outcome.next_question {
            check_question(next)?;
        }
        Ok(outcome)
    }

    async fn end(&self, session_id: &SessionId) -> Result<QuizResults, ServiceError> {
        let request = EndQuizRequest {
            session_id: session_id.clone(),
        };
        let ended: EndedSession = self.post("api/quiz/end", &request).await?;
        Ok(ended.results)
    }

    async fn fetch_results(&self, session_id: &SessionId) -> Result<QuizResults, ServiceError> {
        let url = self.results_endpoint(session_id)?;
        tracing::debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        Self::read(response).await
    }
}
