use chrono::Duration;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestTemplate {
    pub id: Uuid,
    pub name: String,
    pub count_of_questions: i32,
    pub topic_id: Option<Uuid>,
    pub is_random: bool,
    pub is_private: bool,
    pub time_limit_minutes: Option<i32>,
}

impl TestTemplate {
    /// Configured time limit; zero or negative minutes mean "no limit".
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_minutes
            .filter(|m| *m > 0)
            .map(|m| Duration::minutes(m as i64))
    }
}
