pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::question::Question;
use crate::models::session::{Session, StoredAnswer};
use crate::models::template::TestTemplate;

pub use memory::InMemoryStore;
pub use postgres::PgQuizStore;

/// Persistence contract used by the session and analytics services.
///
/// Missing templates and sessions surface as `Error::NotFound`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn load_template(&self, template_id: Uuid) -> Result<TestTemplate>;

    /// All questions, optionally restricted to a topic, in catalog order.
    async fn load_questions_by_topic(&self, topic_id: Option<Uuid>) -> Result<Vec<Question>>;

    /// Up to `count` distinct questions drawn uniformly at random.
    async fn load_random_questions(
        &self,
        count: usize,
        topic_id: Option<Uuid>,
    ) -> Result<Vec<Question>>;

    /// Stores the session together with all of its questions, or nothing.
    async fn create_session(&self, session: &Session) -> Result<Session>;

    async fn load_session(&self, session_id: Uuid) -> Result<Session>;

    /// Replaces the stored answers of the listed session questions in one
    /// atomic step. Ids that do not belong to the session are skipped.
    /// Returns how many questions were updated.
    async fn replace_session_answers(
        &self,
        session_id: Uuid,
        answers: &[(Uuid, StoredAnswer)],
    ) -> Result<usize>;

    /// Sessions of a template ordered by creation time, then id.
    async fn list_sessions_by_template(&self, template_id: Uuid) -> Result<Vec<Session>>;
}
