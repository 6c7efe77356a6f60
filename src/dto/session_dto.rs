use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::question::QuestionType;
use crate::models::session::{Session, SessionQuestion};

/// Option as shown to the test taker; correctness stays server side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicAnswerOption {
    pub id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionQuestionView {
    pub id: Uuid,
    pub question_id: Uuid,
    pub position: i32,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: Vec<PublicAnswerOption>,
    pub selected_option_ids: Vec<Uuid>,
    pub text_answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: Uuid,
    pub template_id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expire_time: Option<DateTime<Utc>>,
    pub expired: bool,
    pub total_questions: i32,
    pub questions: Vec<SessionQuestionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub session: SessionView,
    pub requested_questions: i32,
    /// Set when the pool held fewer questions than the template asks for.
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnswerSubmission {
    pub session_question_id: Uuid,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub selected_option_ids: Vec<Uuid>,
    #[validate(length(max = 10000))]
    pub text_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SaveAnswersRequest {
    #[validate(length(max = 500), nested)]
    pub answers: Vec<AnswerSubmission>,
}

impl From<&SessionQuestion> for SessionQuestionView {
    fn from(sq: &SessionQuestion) -> Self {
        Self {
            id: sq.id,
            question_id: sq.question.id,
            position: sq.position,
            text: sq.question.text.clone(),
            question_type: sq.question.question_type,
            options: sq
                .question
                .options
                .iter()
                .map(|o| PublicAnswerOption {
                    id: o.id,
                    text: o.text.clone(),
                })
                .collect(),
            selected_option_ids: sq.answer.selected_option_ids.iter().copied().collect(),
            text_answer: sq.answer.text.clone(),
        }
    }
}

impl SessionView {
    pub fn from_session(session: &Session, now: DateTime<Utc>) -> Self {
        Self {
            id: session.id,
            template_id: session.template_id,
            user_id: session.user_id.clone(),
            created_at: session.created_at,
            expire_time: session.expire_time,
            expired: session.is_expired(now),
            total_questions: session.total_questions,
            questions: session.questions.iter().map(SessionQuestionView::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{AnswerOption, Question};
    use crate::models::session::StoredAnswer;
    use crate::utils::time::fixed_now;

    #[test]
    fn view_never_serializes_correctness() {
        let question = Question {
            id: Uuid::new_v4(),
            text: "2+2?".into(),
            question_type: QuestionType::OpenText,
            topic_id: None,
            options: vec![AnswerOption {
                id: Uuid::new_v4(),
                text: "4".into(),
                is_correct: true,
            }],
            correct_text_answer: Some("four".into()),
        };
        let session = Session {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            template_id: Uuid::new_v4(),
            created_at: fixed_now(),
            expire_time: None,
            total_questions: 1,
            questions: vec![SessionQuestion {
                id: Uuid::new_v4(),
                session_id: Uuid::new_v4(),
                position: 0,
                question,
                answer: StoredAnswer::default(),
            }],
        };

        let view = SessionView::from_session(&session, fixed_now());
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("is_correct"));
        assert!(!json.contains("correct_text_answer"));
        assert!(!json.contains("four"));
    }
}
