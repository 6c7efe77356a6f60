use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::question::QuestionType;

/// Outcome of grading one session question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionGrade {
    pub session_question_id: Uuid,
    pub question_id: Uuid,
    pub question_text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub is_correct: bool,
    pub correct_answers: Vec<String>,
    pub selected_answers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingResult {
    pub session_id: Uuid,
    pub template_id: Uuid,
    pub total_questions: i32,
    pub correct_count: i32,
    pub score_percent: f64,
    pub expired: bool,
    pub questions: Vec<QuestionGrade>,
}
