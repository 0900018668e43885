//! Daily Burundi trivia quiz. Stateless; the date picks the questions.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::error::ApiResult;
use super::extract::{Json, Query};
use crate::services::quiz::{self, PublicQuestion, QuizAnswers, QuizScore};

#[derive(Deserialize)]
pub struct DailyQuery {
    pub date: Option<Date>,
}

#[derive(Serialize)]
pub struct DailyQuiz {
    pub date: String,
    pub questions: Vec<PublicQuestion>,
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// `GET /api/quiz/daily?date=YYYY-MM-DD` — the day's questions without answers.
pub async fn daily(Query(query): Query<DailyQuery>) -> Json<DailyQuiz> {
    let date = query.date.unwrap_or_else(today);
    let questions = quiz::daily_questions(date)
        .into_iter()
        .map(PublicQuestion::from)
        .collect();
    Json(DailyQuiz { date: date.to_string(), questions })
}

/// `POST /api/quiz/daily/answers` — score a set of answers.
pub async fn submit_answers(Json(body): Json<QuizAnswers>) -> ApiResult<Json<QuizScore>> {
    let date = body.date.unwrap_or_else(today);
    Ok(Json(quiz::score(date, &body.answers)?))
}
