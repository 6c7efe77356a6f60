use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rand::seq::SliceRandom;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::question::Question;
use crate::models::session::{Session, StoredAnswer};
use crate::models::template::TestTemplate;
use crate::repository::QuizStore;

#[derive(Default)]
struct Inner {
    templates: HashMap<Uuid, TestTemplate>,
    // Insertion order is the catalog order.
    questions: Vec<Question>,
    sessions: HashMap<Uuid, Session>,
}

/// Process-local store for tests and prototyping.
///
/// A single lock guards everything, so every write is atomic with respect to
/// every read.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| Error::Internal(format!("store lock poisoned: {}", e)))
    }

    pub fn insert_template(&self, template: TestTemplate) -> Result<()> {
        self.lock()?.templates.insert(template.id, template);
        Ok(())
    }

    pub fn insert_question(&self, question: Question) -> Result<()> {
        let mut guard = self.lock()?;
        guard.questions.retain(|q| q.id != question.id);
        guard.questions.push(question);
        Ok(())
    }

    pub fn session_count(&self) -> Result<usize> {
        Ok(self.lock()?.sessions.len())
    }
}

fn matches_topic(question: &Question, topic_id: Option<Uuid>) -> bool {
    topic_id.map_or(true, |t| question.topic_id == Some(t))
}

#[async_trait]
impl QuizStore for InMemoryStore {
    async fn load_template(&self, template_id: Uuid) -> Result<TestTemplate> {
        self.lock()?
            .templates
            .get(&template_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Template {} not found", template_id)))
    }

    async fn load_questions_by_topic(&self, topic_id: Option<Uuid>) -> Result<Vec<Question>> {
        Ok(self
            .lock()?
            .questions
            .iter()
            .filter(|q| matches_topic(q, topic_id))
            .cloned()
            .collect())
    }

    async fn load_random_questions(
        &self,
        count: usize,
        topic_id: Option<Uuid>,
    ) -> Result<Vec<Question>> {
        let pool = self.load_questions_by_topic(topic_id).await?;
        let mut rng = rand::thread_rng();
        Ok(pool.choose_multiple(&mut rng, count).cloned().collect())
    }

    async fn create_session(&self, session: &Session) -> Result<Session> {
        let mut guard = self.lock()?;
        if guard.sessions.contains_key(&session.id) {
            return Err(Error::Internal(format!(
                "session {} already exists",
                session.id
            )));
        }
        guard.sessions.insert(session.id, session.clone());
        Ok(session.clone())
    }

    async fn load_session(&self, session_id: Uuid) -> Result<Session> {
        self.lock()?
            .sessions
            .get(&session_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Session {} not found", session_id)))
    }

    async fn replace_session_answers(
        &self,
        session_id: Uuid,
        answers: &[(Uuid, StoredAnswer)],
    ) -> Result<usize> {
        let mut guard = self.lock()?;
        let session = guard
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| Error::NotFound(format!("Session {} not found", session_id)))?;

        let mut updated = 0;
        for (session_question_id, answer) in answers {
            if let Some(sq) = session
                .questions
                .iter_mut()
                .find(|q| q.id == *session_question_id)
            {
                sq.answer = answer.clone();
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn list_sessions_by_template(&self, template_id: Uuid) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .lock()?
            .sessions
            .values()
            .filter(|s| s.template_id == template_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(sessions)
    }
}
