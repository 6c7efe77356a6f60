#![allow(dead_code)]

use std::sync::Arc;

use quiz_backend::models::question::{AnswerOption, Question, QuestionType};
use quiz_backend::models::template::TestTemplate;
use quiz_backend::repository::{InMemoryStore, QuizStore};
use quiz_backend::services::analytics_service::AnalyticsService;
use quiz_backend::services::session_service::SessionService;
use chrono::{DateTime, Utc};
use quiz_backend::utils::time::Clock;
use uuid::Uuid;

pub const PASSING_SCORE: f64 = 50.0;

/// 2023-11-14T22:13:20Z, the instant every fixed test clock starts at.
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
}

pub fn question(text: &str, question_type: QuestionType, options: &[(&str, bool)]) -> Question {
    Question {
        id: Uuid::new_v4(),
        text: text.to_string(),
        question_type,
        topic_id: None,
        options: options
            .iter()
            .map(|(t, c)| AnswerOption {
                id: Uuid::new_v4(),
                text: t.to_string(),
                is_correct: *c,
            })
            .collect(),
        correct_text_answer: None,
    }
}

pub fn open_text(text: &str, expected: &str) -> Question {
    Question {
        correct_text_answer: Some(expected.to_string()),
        ..question(text, QuestionType::OpenText, &[])
    }
}

pub fn template(count: i32, is_random: bool) -> TestTemplate {
    TestTemplate {
        id: Uuid::new_v4(),
        name: "Template".to_string(),
        count_of_questions: count,
        topic_id: None,
        is_random,
        is_private: false,
        time_limit_minutes: None,
    }
}

pub fn option_id(q: &Question, text: &str) -> Uuid {
    q.options
        .iter()
        .find(|o| o.text == text)
        .map(|o| o.id)
        .expect("option exists")
}

/// Store seeded with the given template and questions (in catalog order).
pub fn seeded_store(template: &TestTemplate, questions: &[Question]) -> InMemoryStore {
    let store = InMemoryStore::new();
    store.insert_template(template.clone()).expect("template");
    for q in questions {
        store.insert_question(q.clone()).expect("question");
    }
    store
}

pub fn session_service(store: &InMemoryStore) -> SessionService {
    session_service_at(store, Clock::fixed(fixed_now()))
}

pub fn session_service_at(store: &InMemoryStore, clock: Clock) -> SessionService {
    let store: Arc<dyn QuizStore> = Arc::new(store.clone());
    SessionService::with_clock(store, clock)
}

pub fn analytics_service(store: &InMemoryStore) -> AnalyticsService {
    let store: Arc<dyn QuizStore> = Arc::new(store.clone());
    AnalyticsService::new(store, PASSING_SCORE)
}
