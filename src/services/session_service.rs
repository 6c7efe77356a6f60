use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::dto::session_dto::{AnswerSubmission, SessionView, StartSessionResponse};
use crate::error::{Error, Result};
use crate::models::grading::GradingResult;
use crate::models::session::{Session, StoredAnswer};
use crate::repository::QuizStore;
use crate::services::grading_service::GradingService;
use crate::utils::time::Clock;

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn QuizStore>,
    clock: Clock,
}

impl SessionService {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self::with_clock(store, Clock::System)
    }

    pub fn with_clock(store: Arc<dyn QuizStore>, clock: Clock) -> Self {
        Self { store, clock }
    }

    /// Creates a session for `user_id` with a frozen subset of the template's
    /// question pool. A pool smaller than the requested count is not an error;
    /// the response is flagged as degraded instead.
    pub async fn start_session(
        &self,
        template_id: Uuid,
        user_id: &str,
    ) -> Result<StartSessionResponse> {
        let template = self.store.load_template(template_id).await?;
        if template.count_of_questions <= 0 {
            return Err(Error::InvalidRequest(format!(
                "Template {} must request at least one question",
                template.id
            )));
        }
        let requested = template.count_of_questions as usize;

        let questions = if template.is_random {
            let mut drawn = self
                .store
                .load_random_questions(requested, template.topic_id)
                .await?;
            drawn.truncate(requested);
            drawn
        } else {
            let mut pool = self.store.load_questions_by_topic(template.topic_id).await?;
            pool.truncate(requested);
            pool
        };

        let degraded = questions.len() < requested;
        if degraded {
            tracing::warn!(
                template_id = %template.id,
                requested,
                available = questions.len(),
                "Question pool smaller than requested count"
            );
        }

        let now = self.clock.now();
        let session = Session::assemble(&template, user_id, questions, now);
        let session = self.store.create_session(&session).await?;

        tracing::info!(
            session_id = %session.id,
            template_id = %template.id,
            user_id,
            total_questions = session.total_questions,
            "Session started"
        );

        Ok(StartSessionResponse {
            session: SessionView::from_session(&session, now),
            requested_questions: template.count_of_questions,
            degraded,
        })
    }

    pub async fn get_session(&self, session_id: Uuid, user_id: &str) -> Result<SessionView> {
        let session = self.load_owned(session_id, user_id).await?;
        Ok(SessionView::from_session(&session, self.clock.now()))
    }

    /// Replaces the stored answers of the submitted questions.
    ///
    /// Ids that are not part of the session are ignored; when an id repeats,
    /// the last submission wins.
    pub async fn save_answers(
        &self,
        session_id: Uuid,
        answers: Vec<AnswerSubmission>,
        user_id: &str,
    ) -> Result<SessionView> {
        let session = self.load_owned(session_id, user_id).await?;
        if session.is_expired(self.clock.now()) {
            tracing::warn!(session_id = %session.id, user_id, "Rejected save on expired session");
            return Err(Error::SessionExpired);
        }

        let submitted = answers.len();
        let mut latest: HashMap<Uuid, StoredAnswer> = HashMap::new();
        let mut order: Vec<Uuid> = Vec::new();
        for a in answers {
            if session.question(a.session_question_id).is_none() {
                continue;
            }
            if !latest.contains_key(&a.session_question_id) {
                order.push(a.session_question_id);
            }
            latest.insert(
                a.session_question_id,
                StoredAnswer::new(a.selected_option_ids, a.text_answer),
            );
        }

        let replacements: Vec<(Uuid, StoredAnswer)> = order
            .into_iter()
            .filter_map(|id| latest.remove(&id).map(|answer| (id, answer)))
            .collect();

        let updated = if replacements.is_empty() {
            0
        } else {
            self.store
                .replace_session_answers(session.id, &replacements)
                .await?
        };

        if updated < submitted {
            tracing::debug!(
                session_id = %session.id,
                submitted,
                updated,
                "Some submitted answers did not match session questions"
            );
        }
        tracing::info!(session_id = %session.id, updated, "Answers saved");

        let refreshed = self.store.load_session(session.id).await?;
        Ok(SessionView::from_session(&refreshed, self.clock.now()))
    }

    /// Grades the session's current answers. Read only; safe to repeat.
    pub async fn check_answers(&self, session_id: Uuid, user_id: &str) -> Result<GradingResult> {
        let session = self.load_owned(session_id, user_id).await?;
        Ok(GradingService::grade_session(&session, self.clock.now()))
    }

    async fn load_owned(&self, session_id: Uuid, user_id: &str) -> Result<Session> {
        let session = self.store.load_session(session_id).await?;
        if !session.is_owned_by(user_id) {
            return Err(Error::Forbidden(
                "You do not have access to this session".to_string(),
            ));
        }
        Ok(session)
    }
}
