use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::question::{AnswerOption, Question, QuestionType};
use crate::models::session::{Session, SessionQuestion, StoredAnswer};
use crate::models::template::TestTemplate;
use crate::repository::QuizStore;

#[derive(FromRow)]
struct QuestionRow {
    id: Uuid,
    text: String,
    question_type: String,
    topic_id: Option<Uuid>,
    correct_text_answer: Option<String>,
}

#[derive(FromRow)]
struct OptionRow {
    id: Uuid,
    question_id: Uuid,
    text: String,
    is_correct: bool,
}

#[derive(FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: String,
    template_id: Uuid,
    created_at: DateTime<Utc>,
    expire_time: Option<DateTime<Utc>>,
    total_questions: i32,
}

#[derive(FromRow)]
struct SessionQuestionRow {
    id: Uuid,
    user_test_id: Uuid,
    question_id: Uuid,
    position: i32,
    text_answer: Option<String>,
}

#[derive(FromRow)]
struct SelectedRow {
    user_test_question_id: Uuid,
    answer_option_id: Uuid,
}

#[derive(Clone)]
pub struct PgQuizStore {
    pool: PgPool,
}

impl PgQuizStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads questions with their options, keeping the order of `rows`.
    async fn hydrate_questions(&self, rows: Vec<QuestionRow>) -> Result<Vec<Question>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let option_rows = sqlx::query_as::<_, OptionRow>(
            r#"SELECT id, question_id, text, is_correct
               FROM answer_options
               WHERE question_id = ANY($1)
               ORDER BY question_id, position, id"#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut options: HashMap<Uuid, Vec<AnswerOption>> = HashMap::new();
        for o in option_rows {
            options.entry(o.question_id).or_default().push(AnswerOption {
                id: o.id,
                text: o.text,
                is_correct: o.is_correct,
            });
        }

        rows.into_iter()
            .map(|r| -> Result<Question> {
                let question_type = r
                    .question_type
                    .parse::<QuestionType>()
                    .map_err(Error::Internal)?;
                Ok(Question {
                    id: r.id,
                    text: r.text,
                    question_type,
                    topic_id: r.topic_id,
                    options: options.remove(&r.id).unwrap_or_default(),
                    correct_text_answer: r.correct_text_answer,
                })
            })
            .collect()
    }

    async fn load_questions_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"SELECT id, text, question_type, topic_id, correct_text_answer
               FROM questions WHERE id = ANY($1)"#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(self
            .hydrate_questions(rows)
            .await?
            .into_iter()
            .map(|q| (q.id, q))
            .collect())
    }

    /// Attaches questions and stored answers to session rows.
    async fn hydrate_sessions(&self, rows: Vec<SessionRow>) -> Result<Vec<Session>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let session_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let sq_rows = sqlx::query_as::<_, SessionQuestionRow>(
            r#"SELECT id, user_test_id, question_id, position, text_answer
               FROM user_test_questions
               WHERE user_test_id = ANY($1)
               ORDER BY user_test_id, position"#,
        )
        .bind(&session_ids)
        .fetch_all(&self.pool)
        .await?;

        let sq_ids: Vec<Uuid> = sq_rows.iter().map(|r| r.id).collect();
        let selected_rows = sqlx::query_as::<_, SelectedRow>(
            r#"SELECT user_test_question_id, answer_option_id
               FROM user_test_selected_options
               WHERE user_test_question_id = ANY($1)"#,
        )
        .bind(&sq_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut selected: HashMap<Uuid, BTreeSet<Uuid>> = HashMap::new();
        for s in selected_rows {
            selected
                .entry(s.user_test_question_id)
                .or_default()
                .insert(s.answer_option_id);
        }

        let mut question_ids: Vec<Uuid> = sq_rows.iter().map(|r| r.question_id).collect();
        question_ids.sort();
        question_ids.dedup();
        let questions = self.load_questions_by_ids(&question_ids).await?;

        let mut by_session: HashMap<Uuid, Vec<SessionQuestion>> = HashMap::new();
        for r in sq_rows {
            let question = questions.get(&r.question_id).cloned().ok_or_else(|| {
                Error::Internal(format!("question {} missing from catalog", r.question_id))
            })?;
            by_session.entry(r.user_test_id).or_default().push(SessionQuestion {
                id: r.id,
                session_id: r.user_test_id,
                position: r.position,
                question,
                answer: StoredAnswer {
                    selected_option_ids: selected.remove(&r.id).unwrap_or_default(),
                    text: r.text_answer,
                },
            });
        }

        Ok(rows
            .into_iter()
            .map(|r| Session {
                questions: by_session.remove(&r.id).unwrap_or_default(),
                id: r.id,
                user_id: r.user_id,
                template_id: r.template_id,
                created_at: r.created_at,
                expire_time: r.expire_time,
                total_questions: r.total_questions,
            })
            .collect())
    }
}

#[async_trait]
impl QuizStore for PgQuizStore {
    async fn load_template(&self, template_id: Uuid) -> Result<TestTemplate> {
        sqlx::query_as::<_, TestTemplate>(
            r#"SELECT id, name, count_of_questions, topic_id, is_random, is_private,
                      time_limit_minutes
               FROM test_templates WHERE id = $1"#,
        )
        .bind(template_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Template {} not found", template_id)))
    }

    async fn load_questions_by_topic(&self, topic_id: Option<Uuid>) -> Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"SELECT id, text, question_type, topic_id, correct_text_answer
               FROM questions
               WHERE ($1::uuid IS NULL OR topic_id = $1)
               ORDER BY catalog_order"#,
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_questions(rows).await
    }

    async fn load_random_questions(
        &self,
        count: usize,
        topic_id: Option<Uuid>,
    ) -> Result<Vec<Question>> {
        let limit = i64::try_from(count)
            .map_err(|_| Error::InvalidRequest(format!("question count {} too large", count)))?;
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"SELECT id, text, question_type, topic_id, correct_text_answer
               FROM questions
               WHERE ($1::uuid IS NULL OR topic_id = $1)
               ORDER BY RANDOM()
               LIMIT $2"#,
        )
        .bind(topic_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_questions(rows).await
    }

    async fn create_session(&self, session: &Session) -> Result<Session> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO user_tests
                   (id, user_id, template_id, created_at, expire_time, total_questions)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(session.id)
        .bind(&session.user_id)
        .bind(session.template_id)
        .bind(session.created_at)
        .bind(session.expire_time)
        .bind(session.total_questions)
        .execute(&mut *tx)
        .await?;

        for sq in &session.questions {
            sqlx::query(
                r#"INSERT INTO user_test_questions
                       (id, user_test_id, question_id, position, text_answer)
                   VALUES ($1, $2, $3, $4, $5)"#,
            )
            .bind(sq.id)
            .bind(session.id)
            .bind(sq.question.id)
            .bind(sq.position)
            .bind(&sq.answer.text)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(session.clone())
    }

    async fn load_session(&self, session_id: Uuid) -> Result<Session> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"SELECT id, user_id, template_id, created_at, expire_time, total_questions
               FROM user_tests WHERE id = $1"#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Session {} not found", session_id)))?;

        self.hydrate_sessions(vec![row])
            .await?
            .pop()
            .ok_or_else(|| Error::NotFound(format!("Session {} not found", session_id)))
    }

    async fn replace_session_answers(
        &self,
        session_id: Uuid,
        answers: &[(Uuid, StoredAnswer)],
    ) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent saves of the same session.
        sqlx::query_scalar::<_, Uuid>(r#"SELECT id FROM user_tests WHERE id = $1 FOR UPDATE"#)
            .bind(session_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Session {} not found", session_id)))?;

        let mut updated = 0;
        for (session_question_id, answer) in answers {
            let result = sqlx::query(
                r#"UPDATE user_test_questions SET text_answer = $1
                   WHERE id = $2 AND user_test_id = $3"#,
            )
            .bind(&answer.text)
            .bind(session_question_id)
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                continue;
            }

            sqlx::query(
                r#"DELETE FROM user_test_selected_options WHERE user_test_question_id = $1"#,
            )
            .bind(session_question_id)
            .execute(&mut *tx)
            .await?;

            for option_id in &answer.selected_option_ids {
                sqlx::query(
                    r#"INSERT INTO user_test_selected_options
                           (user_test_question_id, answer_option_id)
                       VALUES ($1, $2)"#,
                )
                .bind(session_question_id)
                .bind(option_id)
                .execute(&mut *tx)
                .await?;
            }
            updated += 1;
        }

        tx.commit().await?;
        Ok(updated)
    }

    async fn list_sessions_by_template(&self, template_id: Uuid) -> Result<Vec<Session>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"SELECT id, user_id, template_id, created_at, expire_time, total_questions
               FROM user_tests
               WHERE template_id = $1
               ORDER BY created_at, id"#,
        )
        .bind(template_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_sessions(rows).await
    }
}
