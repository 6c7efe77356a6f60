use chrono::{DateTime, Utc};

use crate::models::grading::{GradingResult, QuestionGrade};
use crate::models::question::{Question, QuestionType};
use crate::models::session::{Session, SessionQuestion, StoredAnswer};

pub struct GradingService;

impl GradingService {
    /// Grades one stored answer against the question definition.
    ///
    /// Choice questions need the selected id set to equal the correct id set,
    /// survey questions are always correct, and open text answers must match
    /// the configured answer after trimming, ignoring case.
    pub fn grade(question: &Question, answer: &StoredAnswer) -> (bool, Vec<String>, Vec<String>) {
        match question.question_type {
            QuestionType::SingleChoice | QuestionType::MultipleChoice => {
                let correct_ids = question.correct_option_ids();
                let is_correct = !answer.selected_option_ids.is_empty()
                    && answer.selected_option_ids == correct_ids;

                let correct = question
                    .options
                    .iter()
                    .filter(|o| o.is_correct)
                    .map(|o| o.text.clone())
                    .collect();
                (is_correct, correct, selected_option_texts(question, answer))
            }
            QuestionType::Survey => (true, Vec::new(), selected_option_texts(question, answer)),
            QuestionType::OpenText => {
                let is_correct = match (&question.correct_text_answer, &answer.text) {
                    (Some(expected), Some(given)) => text_matches(expected, given),
                    _ => false,
                };
                let correct = question.correct_text_answer.iter().cloned().collect();
                let selected = answer.text.iter().cloned().collect();
                (is_correct, correct, selected)
            }
        }
    }

    pub fn grade_question(sq: &SessionQuestion) -> QuestionGrade {
        let (is_correct, correct_answers, selected_answers) = Self::grade(&sq.question, &sq.answer);
        QuestionGrade {
            session_question_id: sq.id,
            question_id: sq.question.id,
            question_text: sq.question.text.clone(),
            question_type: sq.question.question_type,
            is_correct,
            correct_answers,
            selected_answers,
        }
    }

    /// Grades every frozen question of a session. Nothing is written back.
    pub fn grade_session(session: &Session, now: DateTime<Utc>) -> GradingResult {
        let questions: Vec<QuestionGrade> =
            session.questions.iter().map(Self::grade_question).collect();
        let correct_count = questions.iter().filter(|g| g.is_correct).count() as i32;

        GradingResult {
            session_id: session.id,
            template_id: session.template_id,
            total_questions: session.total_questions,
            correct_count,
            score_percent: score_percent(correct_count, session.total_questions),
            expired: session.is_expired(now),
            questions,
        }
    }
}

pub fn score_percent(correct_count: i32, total_questions: i32) -> f64 {
    if total_questions > 0 {
        (correct_count as f64 / total_questions as f64) * 100.0
    } else {
        0.0
    }
}

fn text_matches(expected: &str, given: &str) -> bool {
    let given = given.trim();
    !given.is_empty() && expected.trim().to_lowercase() == given.to_lowercase()
}

// Option texts in catalog order; ids that are not options of the question are skipped.
fn selected_option_texts(question: &Question, answer: &StoredAnswer) -> Vec<String> {
    question
        .options
        .iter()
        .filter(|o| answer.selected_option_ids.contains(&o.id))
        .map(|o| o.text.clone())
        .collect()
}
