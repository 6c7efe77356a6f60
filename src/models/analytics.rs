use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::grading::QuestionGrade;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub template_id: Uuid,
    pub template_name: String,
    pub total_attempts: i64,
    pub average_score_percent: f64,
    pub difficult_questions: Vec<DifficultQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<AttemptHistory>>,
}

/// A question ranked by how many attempts got it wrong.
///
/// `wrong_rate_percent` is relative to every attempt of the template, including
/// attempts that were never assigned this question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultQuestion {
    pub question_id: Uuid,
    pub question_text: String,
    pub incorrect_count: i64,
    pub wrong_rate_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptHistory {
    pub session_id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub total_questions: i32,
    pub correct_count: i32,
    pub score_percent: f64,
    pub passed: bool,
    pub questions: Vec<QuestionGrade>,
}
