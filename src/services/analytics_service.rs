use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::analytics::{Analytics, AttemptHistory, DifficultQuestion};
use crate::models::grading::QuestionGrade;
use crate::models::session::Session;
use crate::repository::QuizStore;
use crate::services::grading_service::{score_percent, GradingService};

const DIFFICULT_QUESTION_LIMIT: usize = 3;

#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn QuizStore>,
    passing_score_percent: f64,
}

struct QuestionTally {
    text: String,
    incorrect: i64,
}

struct GradedAttempt {
    session: Session,
    grades: Vec<QuestionGrade>,
    correct_count: i32,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn QuizStore>, passing_score_percent: f64) -> Self {
        Self {
            store,
            passing_score_percent,
        }
    }

    /// Aggregates every attempt of a template.
    ///
    /// A template nobody attempted yields a zeroed summary. With
    /// `include_history`, each attempt is listed with its per-question grades.
    /// Private templates are only summarized when `include_private` is set.
    pub async fn summarize(
        &self,
        template_id: Uuid,
        include_history: bool,
        include_private: bool,
    ) -> Result<Analytics> {
        let template = self.store.load_template(template_id).await?;
        if template.is_private && !include_private {
            tracing::warn!(template_id = %template.id, "Analytics denied for private template");
            return Err(Error::Forbidden(format!(
                "Analytics of template {} are restricted",
                template_id
            )));
        }
        let sessions = self.store.list_sessions_by_template(template.id).await?;

        let attempts: Vec<GradedAttempt> = sessions.into_iter().map(grade_attempt).collect();
        let total_attempts = attempts.len() as i64;

        let percents: Vec<f64> = attempts
            .iter()
            .filter(|a| a.session.total_questions > 0)
            .map(|a| score_percent(a.correct_count, a.session.total_questions))
            .collect();
        let average_score_percent = if percents.is_empty() {
            0.0
        } else {
            percents.iter().sum::<f64>() / percents.len() as f64
        };

        let difficult_questions = rank_difficult_questions(&attempts, total_attempts);

        let history = include_history.then(|| {
            attempts
                .iter()
                .map(|a| {
                    let score = score_percent(a.correct_count, a.session.total_questions);
                    AttemptHistory {
                        session_id: a.session.id,
                        user_id: a.session.user_id.clone(),
                        created_at: a.session.created_at,
                        total_questions: a.session.total_questions,
                        correct_count: a.correct_count,
                        score_percent: score,
                        passed: a.session.total_questions > 0
                            && score >= self.passing_score_percent,
                        questions: a.grades.clone(),
                    }
                })
                .collect()
        });

        tracing::info!(
            template_id = %template.id,
            total_attempts,
            average_score_percent,
            "Analytics summarized"
        );

        Ok(Analytics {
            template_id: template.id,
            template_name: template.name,
            total_attempts,
            average_score_percent,
            difficult_questions,
            history,
        })
    }
}

fn grade_attempt(session: Session) -> GradedAttempt {
    let grades: Vec<QuestionGrade> = session
        .questions
        .iter()
        .map(GradingService::grade_question)
        .collect();
    let correct_count = grades.iter().filter(|g| g.is_correct).count() as i32;
    GradedAttempt {
        session,
        grades,
        correct_count,
    }
}

/// Top questions by wrong rate. The rate divides by all attempts of the
/// template, so a question assigned to few random sessions ranks lower than
/// its per-assignment failure rate would suggest.
fn rank_difficult_questions(
    attempts: &[GradedAttempt],
    total_attempts: i64,
) -> Vec<DifficultQuestion> {
    if total_attempts == 0 {
        return Vec::new();
    }

    // Keyed by question id so the iteration order never depends on hashing.
    let mut tallies: BTreeMap<Uuid, QuestionTally> = BTreeMap::new();
    for attempt in attempts {
        for grade in &attempt.grades {
            let tally = tallies.entry(grade.question_id).or_insert_with(|| QuestionTally {
                text: grade.question_text.clone(),
                incorrect: 0,
            });
            if !grade.is_correct {
                tally.incorrect += 1;
            }
        }
    }

    let mut ranked: Vec<DifficultQuestion> = tallies
        .into_iter()
        .map(|(question_id, tally)| DifficultQuestion {
            question_id,
            question_text: tally.text,
            incorrect_count: tally.incorrect,
            wrong_rate_percent: (tally.incorrect as f64 / total_attempts as f64) * 100.0,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.wrong_rate_percent
            .partial_cmp(&a.wrong_rate_percent)
            .unwrap_or(Ordering::Equal)
            .then(b.incorrect_count.cmp(&a.incorrect_count))
            .then(a.question_id.cmp(&b.question_id))
    });
    ranked.truncate(DIFFICULT_QUESTION_LIMIT);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Question, QuestionType};
    use crate::models::session::{SessionQuestion, StoredAnswer};
    use crate::utils::time::fixed_now;

    fn open_question(id: Uuid) -> Question {
        Question {
            id,
            text: format!("Q {}", id),
            question_type: QuestionType::OpenText,
            topic_id: None,
            options: Vec::new(),
            correct_text_answer: Some("yes".into()),
        }
    }

    // `answers[i]` is whether question `ids[i]` was answered correctly.
    fn session(ids: &[Uuid], answers: &[bool]) -> Session {
        let session_id = Uuid::new_v4();
        Session {
            id: session_id,
            user_id: "u".into(),
            template_id: Uuid::nil(),
            created_at: fixed_now(),
            expire_time: None,
            total_questions: ids.len() as i32,
            questions: ids
                .iter()
                .zip(answers)
                .enumerate()
                .map(|(i, (id, ok))| SessionQuestion {
                    id: Uuid::new_v4(),
                    session_id,
                    position: i as i32,
                    question: open_question(*id),
                    answer: StoredAnswer::new([], Some(if *ok { "yes" } else { "no" }.into())),
                })
                .collect(),
        }
    }

    #[test]
    fn ranking_uses_total_attempts_as_denominator() {
        let q1 = Uuid::from_u128(1);
        let q2 = Uuid::from_u128(2);
        let attempts: Vec<GradedAttempt> = vec![
            session(&[q1, q2], &[false, true]),
            session(&[q1], &[false]),
            session(&[q2], &[false]),
            session(&[], &[]),
        ]
        .into_iter()
        .map(grade_attempt)
        .collect();

        let ranked = rank_difficult_questions(&attempts, attempts.len() as i64);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].question_id, q1);
        assert_eq!(ranked[0].incorrect_count, 2);
        assert_eq!(ranked[0].wrong_rate_percent, 50.0);
        assert_eq!(ranked[1].question_id, q2);
        assert_eq!(ranked[1].wrong_rate_percent, 25.0);
    }

    #[test]
    fn ranking_keeps_top_three_with_stable_ties() {
        let ids: Vec<Uuid> = (1..=5).map(Uuid::from_u128).collect();
        let attempts = vec![grade_attempt(session(&ids, &[false; 5]))];

        let ranked = rank_difficult_questions(&attempts, 1);
        assert_eq!(
            ranked.iter().map(|d| d.question_id).collect::<Vec<_>>(),
            ids[..3].to_vec()
        );
    }

    #[test]
    fn no_attempts_means_no_ranking() {
        assert!(rank_difficult_questions(&[], 0).is_empty());
    }
}
