// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        answer::{Answer, Mode},
        content::{App, Channel, Help, Paper},
        question::{Choice, DailyQuiz, OptionSet, Question, QuestionBody, Topic, TopicSummary},
        user::{NewUser, User},
    },
    store::{CatalogStore, ContentStore, LedgerStore, UserStore},
};

/// Postgres-backed store. Schema lives in `migrations/`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn corrupt(what: &str, detail: String) -> AppError {
    AppError::InternalServerError(format!("corrupt {} row: {}", what, detail))
}

/// Escapes LIKE wildcards so the needle is matched literally.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Helper struct for the 'users' table.
#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    fullname: String,
    email: String,
    password: String,
    security_question: String,
    security_answer: String,
    role: String,
    total_time_consumed: i64,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            fullname: row.fullname,
            email: row.email,
            password: row.password,
            security_question: row.security_question,
            security_answer: row.security_answer,
            role: row.role,
            total_time_consumed: row.total_time_consumed.max(0) as u64,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, fullname, email, password, security_question, security_answer, \
     role, total_time_consumed, created_at";

#[derive(FromRow)]
struct AnswerRow {
    question_id: Uuid,
    mode: String,
    choice: String,
    is_correct: bool,
    time_spent: i64,
    answered_at: DateTime<Utc>,
}

impl TryFrom<AnswerRow> for Answer {
    type Error = AppError;

    fn try_from(row: AnswerRow) -> Result<Self, Self::Error> {
        Ok(Answer {
            question_id: row.question_id,
            mode: row.mode.parse::<Mode>().map_err(|e| corrupt("answer", e))?,
            choice: row.choice.parse::<Choice>().map_err(|e| corrupt("answer", e))?,
            is_correct: row.is_correct,
            time_spent: u32::try_from(row.time_spent)
                .map_err(|e| corrupt("answer", e.to_string()))?,
            answered_at: row.answered_at,
        })
    }
}

const ANSWER_COLUMNS: &str = "question_id, mode, choice, is_correct, time_spent, answered_at";

/// Shared column set of daily quizzes and topic questions.
#[derive(FromRow)]
struct QuestionRow {
    id: Uuid,
    question: String,
    option_a: String,
    option_b: String,
    option_c: String,
    option_d: String,
    correct_option: String,
}

impl QuestionRow {
    fn into_body(self) -> Result<(Uuid, QuestionBody), AppError> {
        let correct_option = self
            .correct_option
            .parse::<Choice>()
            .map_err(|e| corrupt("question", e))?;
        Ok((
            self.id,
            QuestionBody {
                question: self.question,
                options: OptionSet {
                    option_a: self.option_a,
                    option_b: self.option_b,
                    option_c: self.option_c,
                    option_d: self.option_d,
                },
                correct_option,
            },
        ))
    }

    fn into_question(self) -> Result<Question, AppError> {
        let (id, body) = self.into_body()?;
        Ok(Question { id, body })
    }
}

#[derive(FromRow)]
struct DailyQuizRow {
    #[sqlx(flatten)]
    question: QuestionRow,
    created_at: DateTime<Utc>,
}

impl TryFrom<DailyQuizRow> for DailyQuiz {
    type Error = AppError;

    fn try_from(row: DailyQuizRow) -> Result<Self, Self::Error> {
        let (id, body) = row.question.into_body()?;
        Ok(DailyQuiz {
            id,
            body,
            created_at: row.created_at,
        })
    }
}

const QUESTION_COLUMNS: &str = "id, question, option_a, option_b, option_c, option_d, correct_option";

#[derive(FromRow)]
struct TopicRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let email = user.email.clone();
        let user = user.into_user();

        sqlx::query(
            r#"
            INSERT INTO users
            (id, fullname, email, password, security_question, security_answer, role, total_time_consumed, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.fullname)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.security_question)
        .bind(&user.security_answer)
        .bind(&user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("User already exists with email '{}'", email))
            } else {
                tracing::error!("Failed to create user: {:?}", e);
                AppError::from(e)
            }
        })?;

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn find_answer(
        &self,
        user_id: Uuid,
        question_id: Uuid,
        mode: Mode,
    ) -> Result<Option<Answer>, AppError> {
        let row = sqlx::query_as::<_, AnswerRow>(&format!(
            "SELECT {} FROM answers WHERE user_id = $1 AND question_id = $2 AND mode = $3",
            ANSWER_COLUMNS
        ))
        .bind(user_id)
        .bind(question_id)
        .bind(mode.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Answer::try_from).transpose()
    }

    async fn find_answers(
        &self,
        user_id: Uuid,
        question_ids: &[Uuid],
        mode: Mode,
    ) -> Result<Vec<Answer>, AppError> {
        if question_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, AnswerRow>(&format!(
            "SELECT {} FROM answers WHERE user_id = $1 AND mode = $2 AND question_id = ANY($3) ORDER BY seq",
            ANSWER_COLUMNS
        ))
        .bind(user_id)
        .bind(mode.as_str())
        .bind(question_ids)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Answer::try_from).collect()
    }

    async fn list_answers(&self, user_id: Uuid) -> Result<Vec<Answer>, AppError> {
        let rows = sqlx::query_as::<_, AnswerRow>(&format!(
            "SELECT {} FROM answers WHERE user_id = $1 ORDER BY seq",
            ANSWER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Answer::try_from).collect()
    }

    async fn record_answer(&self, user_id: Uuid, answer: &Answer) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE users SET total_time_consumed = total_time_consumed + $1 WHERE id = $2",
        )
        .bind(i64::from(answer.time_spent))
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        // The unique constraint decides races: the loser inserts nothing and rolls back.
        let inserted = sqlx::query(
            r#"
            INSERT INTO answers
            (id, user_id, question_id, mode, choice, is_correct, time_spent, answered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT ON CONSTRAINT answers_once_per_mode DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(answer.question_id)
        .bind(answer.mode.as_str())
        .bind(answer.choice.as_str())
        .bind(answer.is_correct)
        .bind(i64::from(answer.time_spent))
        .bind(answer.answered_at)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(AppError::DuplicateAnswer);
        }

        tx.commit().await?;
        Ok(())
    }
}

impl PgStore {
    async fn questions_of(&self, topic_id: Uuid) -> Result<Vec<Question>, AppError> {
        let rows = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {} FROM topic_questions WHERE topic_id = $1 ORDER BY seq",
            QUESTION_COLUMNS
        ))
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(QuestionRow::into_question).collect()
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn active_daily_quiz(&self) -> Result<Option<DailyQuiz>, AppError> {
        let row = sqlx::query_as::<_, DailyQuizRow>(&format!(
            "SELECT {}, created_at FROM daily_quizzes ORDER BY created_at DESC LIMIT 1",
            QUESTION_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?;
        row.map(DailyQuiz::try_from).transpose()
    }

    async fn find_daily_quiz(&self, id: Uuid) -> Result<Option<DailyQuiz>, AppError> {
        let row = sqlx::query_as::<_, DailyQuizRow>(&format!(
            "SELECT {}, created_at FROM daily_quizzes WHERE id = $1",
            QUESTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(DailyQuiz::try_from).transpose()
    }

    async fn insert_daily_quiz(&self, quiz: &DailyQuiz) -> Result<(), AppError> {
        let b = &quiz.body;
        sqlx::query(
            r#"
            INSERT INTO daily_quizzes
            (id, question, option_a, option_b, option_c, option_d, correct_option, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(quiz.id)
        .bind(&b.question)
        .bind(&b.options.option_a)
        .bind(&b.options.option_b)
        .bind(&b.options.option_c)
        .bind(&b.options.option_d)
        .bind(b.correct_option.as_str())
        .bind(quiz.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_daily_quiz(
        &self,
        id: Uuid,
        body: &QuestionBody,
    ) -> Result<Option<DailyQuiz>, AppError> {
        let row = sqlx::query_as::<_, DailyQuizRow>(&format!(
            r#"
            UPDATE daily_quizzes
            SET question = $1, option_a = $2, option_b = $3, option_c = $4, option_d = $5, correct_option = $6
            WHERE id = $7
            RETURNING {}, created_at
            "#,
            QUESTION_COLUMNS
        ))
        .bind(&body.question)
        .bind(&body.options.option_a)
        .bind(&body.options.option_b)
        .bind(&body.options.option_c)
        .bind(&body.options.option_d)
        .bind(body.correct_option.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(DailyQuiz::try_from).transpose()
    }

    async fn delete_daily_quiz(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM daily_quizzes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_topics(&self) -> Result<Vec<TopicSummary>, AppError> {
        let rows = sqlx::query_as::<_, TopicRow>(
            "SELECT id, name, created_at FROM topics ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| TopicSummary {
                id: r.id,
                name: r.name,
            })
            .collect())
    }

    async fn find_topic(&self, id: Uuid) -> Result<Option<Topic>, AppError> {
        let Some(row) = sqlx::query_as::<_, TopicRow>(
            "SELECT id, name, created_at FROM topics WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let questions = self.questions_of(row.id).await?;
        Ok(Some(Topic {
            id: row.id,
            name: row.name,
            questions,
            created_at: row.created_at,
        }))
    }

    async fn insert_topic(&self, topic: &Topic) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO topics (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(topic.id)
            .bind(&topic.name)
            .bind(topic.created_at)
            .execute(&mut *tx)
            .await?;

        for question in &topic.questions {
            let b = &question.body;
            sqlx::query(
                r#"
                INSERT INTO topic_questions
                (id, topic_id, question, option_a, option_b, option_c, option_d, correct_option)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(question.id)
            .bind(topic.id)
            .bind(&b.question)
            .bind(&b.options.option_a)
            .bind(&b.options.option_b)
            .bind(&b.options.option_c)
            .bind(&b.options.option_d)
            .bind(b.correct_option.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_topic(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM topics WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_question(&self, topic_id: Uuid, question: &Question) -> Result<bool, AppError> {
        let b = &question.body;
        // INSERT ... SELECT inserts nothing when the topic is missing.
        let result = sqlx::query(
            r#"
            INSERT INTO topic_questions
            (id, topic_id, question, option_a, option_b, option_c, option_d, correct_option)
            SELECT $1, t.id, $3, $4, $5, $6, $7, $8 FROM topics t WHERE t.id = $2
            "#,
        )
        .bind(question.id)
        .bind(topic_id)
        .bind(&b.question)
        .bind(&b.options.option_a)
        .bind(&b.options.option_b)
        .bind(&b.options.option_c)
        .bind(&b.options.option_d)
        .bind(b.correct_option.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_question(
        &self,
        topic_id: Uuid,
        question_id: Uuid,
        body: &QuestionBody,
    ) -> Result<Option<Question>, AppError> {
        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            r#"
            UPDATE topic_questions
            SET question = $1, option_a = $2, option_b = $3, option_c = $4, option_d = $5, correct_option = $6
            WHERE id = $7 AND topic_id = $8
            RETURNING {}
            "#,
            QUESTION_COLUMNS
        ))
        .bind(&body.question)
        .bind(&body.options.option_a)
        .bind(&body.options.option_b)
        .bind(&body.options.option_c)
        .bind(&body.options.option_d)
        .bind(body.correct_option.as_str())
        .bind(question_id)
        .bind(topic_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(QuestionRow::into_question).transpose()
    }

    async fn delete_question(&self, topic_id: Uuid, question_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM topic_questions WHERE id = $1 AND topic_id = $2")
            .bind(question_id)
            .bind(topic_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_question(&self, question_id: Uuid) -> Result<Option<Question>, AppError> {
        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {} FROM topic_questions WHERE id = $1",
            QUESTION_COLUMNS
        ))
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(QuestionRow::into_question).transpose()
    }
}

#[derive(FromRow)]
struct PaperRow {
    id: Uuid,
    topic_name: String,
    description: String,
    pdf_url: String,
    created_at: DateTime<Utc>,
}

impl From<PaperRow> for Paper {
    fn from(r: PaperRow) -> Self {
        Paper {
            id: r.id,
            topic_name: r.topic_name,
            description: r.description,
            pdf_url: r.pdf_url,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct ChannelRow {
    id: Uuid,
    name: String,
    description: String,
    url: String,
    photo_url: String,
    created_at: DateTime<Utc>,
}

impl From<ChannelRow> for Channel {
    fn from(r: ChannelRow) -> Self {
        Channel {
            id: r.id,
            name: r.name,
            description: r.description,
            url: r.url,
            photo_url: r.photo_url,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct AppRow {
    id: Uuid,
    name: String,
    features: String,
    download_url: String,
    photo_url: String,
    created_at: DateTime<Utc>,
}

impl From<AppRow> for App {
    fn from(r: AppRow) -> Self {
        App {
            id: r.id,
            name: r.name,
            features: r.features,
            download_url: r.download_url,
            photo_url: r.photo_url,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct HelpRow {
    id: Uuid,
    pdf_url: String,
    updated_at: DateTime<Utc>,
}

impl From<HelpRow> for Help {
    fn from(r: HelpRow) -> Self {
        Help {
            id: r.id,
            pdf_url: r.pdf_url,
            updated_at: r.updated_at,
        }
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn list_papers(&self) -> Result<Vec<Paper>, AppError> {
        let rows = sqlx::query_as::<_, PaperRow>(
            "SELECT id, topic_name, description, pdf_url, created_at FROM papers ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Paper::from).collect())
    }

    async fn search_papers(&self, needle: &str) -> Result<Vec<Paper>, AppError> {
        let rows = sqlx::query_as::<_, PaperRow>(
            r#"
            SELECT id, topic_name, description, pdf_url, created_at
            FROM papers
            WHERE topic_name ILIKE $1 ESCAPE '\'
            ORDER BY created_at DESC
            "#,
        )
        .bind(like_pattern(needle))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Paper::from).collect())
    }

    async fn insert_paper(&self, paper: &Paper) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO papers (id, topic_name, description, pdf_url, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(paper.id)
        .bind(&paper.topic_name)
        .bind(&paper.description)
        .bind(&paper.pdf_url)
        .bind(paper.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_paper(&self, paper: &Paper) -> Result<Option<Paper>, AppError> {
        let row = sqlx::query_as::<_, PaperRow>(
            r#"
            UPDATE papers SET topic_name = $1, description = $2, pdf_url = $3
            WHERE id = $4
            RETURNING id, topic_name, description, pdf_url, created_at
            "#,
        )
        .bind(&paper.topic_name)
        .bind(&paper.description)
        .bind(&paper.pdf_url)
        .bind(paper.id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Paper::from))
    }

    async fn delete_paper(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM papers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_channels(&self) -> Result<Vec<Channel>, AppError> {
        let rows = sqlx::query_as::<_, ChannelRow>(
            "SELECT id, name, description, url, photo_url, created_at FROM channels ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Channel::from).collect())
    }

    async fn insert_channel(&self, channel: &Channel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO channels (id, name, description, url, photo_url, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(channel.id)
        .bind(&channel.name)
        .bind(&channel.description)
        .bind(&channel.url)
        .bind(&channel.photo_url)
        .bind(channel.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_channel(&self, channel: &Channel) -> Result<Option<Channel>, AppError> {
        let row = sqlx::query_as::<_, ChannelRow>(
            r#"
            UPDATE channels SET name = $1, description = $2, url = $3, photo_url = $4
            WHERE id = $5
            RETURNING id, name, description, url, photo_url, created_at
            "#,
        )
        .bind(&channel.name)
        .bind(&channel.description)
        .bind(&channel.url)
        .bind(&channel.photo_url)
        .bind(channel.id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Channel::from))
    }

    async fn delete_channel(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM channels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_apps(&self) -> Result<Vec<App>, AppError> {
        let rows = sqlx::query_as::<_, AppRow>(
            "SELECT id, name, features, download_url, photo_url, created_at FROM apps ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(App::from).collect())
    }

    async fn insert_app(&self, app: &App) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO apps (id, name, features, download_url, photo_url, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(app.id)
        .bind(&app.name)
        .bind(&app.features)
        .bind(&app.download_url)
        .bind(&app.photo_url)
        .bind(app.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_app(&self, app: &App) -> Result<Option<App>, AppError> {
        let row = sqlx::query_as::<_, AppRow>(
            r#"
            UPDATE apps SET name = $1, features = $2, download_url = $3, photo_url = $4
            WHERE id = $5
            RETURNING id, name, features, download_url, photo_url, created_at
            "#,
        )
        .bind(&app.name)
        .bind(&app.features)
        .bind(&app.download_url)
        .bind(&app.photo_url)
        .bind(app.id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(App::from))
    }

    async fn delete_app(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM apps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn current_help(&self) -> Result<Option<Help>, AppError> {
        let row = sqlx::query_as::<_, HelpRow>(
            "SELECT id, pdf_url, updated_at FROM help_documents ORDER BY updated_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Help::from))
    }

    async fn insert_help(&self, help: &Help) -> Result<(), AppError> {
        sqlx::query("INSERT INTO help_documents (id, pdf_url, updated_at) VALUES ($1, $2, $3)")
            .bind(help.id)
            .bind(&help.pdf_url)
            .bind(help.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_help(&self, help: &Help) -> Result<Option<Help>, AppError> {
        let row = sqlx::query_as::<_, HelpRow>(
            r#"
            UPDATE help_documents SET pdf_url = $1, updated_at = $2
            WHERE id = $3
            RETURNING id, pdf_url, updated_at
            "#,
        )
        .bind(&help.pdf_url)
        .bind(help.updated_at)
        .bind(help.id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Help::from))
    }

    async fn delete_help(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM help_documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
