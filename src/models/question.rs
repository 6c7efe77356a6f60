use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub topic_id: Option<Uuid>,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
    pub correct_text_answer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    Survey,
    OpenText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: Uuid,
    pub text: String,
    pub is_correct: bool,
}

impl Question {
    /// Identifiers of the options flagged as correct.
    pub fn correct_option_ids(&self) -> BTreeSet<Uuid> {
        self.options
            .iter()
            .filter(|o| o.is_correct)
            .map(|o| o.id)
            .collect()
    }
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Survey => "survey",
            QuestionType::OpenText => "open_text",
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_choice" => Ok(QuestionType::SingleChoice),
            "multiple_choice" => Ok(QuestionType::MultipleChoice),
            "survey" => Ok(QuestionType::Survey),
            "open_text" => Ok(QuestionType::OpenText),
            other => Err(format!("unknown question type '{}'", other)),
        }
    }
}
