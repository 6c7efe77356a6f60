use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::question::Question;
use crate::models::template::TestTemplate;

/// A user's attempt at a template (stored as `user_tests`).
///
/// The question list is frozen when the session is created; later saves only
/// touch the stored answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: String,
    pub template_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expire_time: Option<DateTime<Utc>>,
    pub total_questions: i32,
    pub questions: Vec<SessionQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionQuestion {
    pub id: Uuid,
    pub session_id: Uuid,
    pub position: i32,
    pub question: Question,
    #[serde(default)]
    pub answer: StoredAnswer,
}

/// The answer currently stored for one session question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAnswer {
    #[serde(default)]
    pub selected_option_ids: BTreeSet<Uuid>,
    pub text: Option<String>,
}

impl StoredAnswer {
    pub fn new(selected_option_ids: impl IntoIterator<Item = Uuid>, text: Option<String>) -> Self {
        Self {
            selected_option_ids: selected_option_ids.into_iter().collect(),
            text,
        }
    }
}

impl Session {
    /// Builds a new session for `template` with one entry per selected question.
    pub fn assemble(
        template: &TestTemplate,
        user_id: &str,
        questions: Vec<Question>,
        now: DateTime<Utc>,
    ) -> Self {
        let id = Uuid::new_v4();
        let questions: Vec<SessionQuestion> = questions
            .into_iter()
            .enumerate()
            .map(|(idx, question)| SessionQuestion {
                id: Uuid::new_v4(),
                session_id: id,
                position: idx as i32,
                question,
                answer: StoredAnswer::default(),
            })
            .collect();

        Self {
            id,
            user_id: user_id.to_string(),
            template_id: template.id,
            created_at: now,
            expire_time: template.time_limit().map(|limit| now + limit),
            total_questions: questions.len() as i32,
            questions,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_time.is_some_and(|t| now >= t)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn question(&self, session_question_id: Uuid) -> Option<&SessionQuestion> {
        self.questions.iter().find(|q| q.id == session_question_id)
    }
}
