// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        course::{COURSE_COLUMNS, Course, CreateCourseRequest},
        question::{Choice, CreateQuestionRequest, Question, QuestionWithChoices},
    },
    utils::html::clean_html,
};

/// Creates a new course.
/// Admin only. The description is sanitised before it is stored.
pub async fn create_course(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let course = sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (name, description, image_url) VALUES (?, ?, ?) RETURNING {COURSE_COLUMNS}"
    ))
    .bind(payload.name.trim())
    .bind(clean_html(&payload.description))
    .bind(payload.image_url.as_deref().map(str::trim))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create course: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(course_id = course.id, "Course created: {}", course.name);

    Ok((StatusCode::CREATED, Json(course)))
}

/// Deletes a course together with its questions, enrollments and submissions.
/// Admin only.
pub async fn delete_course(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete course: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Course not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Adds a question and its choices to a course.
/// Admin only. The response includes choice ids and correctness flags.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    Path(course_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = pool.begin().await?;

    let course_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM courses WHERE id = ?")
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await?;
    if course_exists.is_none() {
        return Err(AppError::NotFound("Course not found".to_string()));
    }

    let question = sqlx::query_as::<_, Question>(
        "INSERT INTO questions (course_id, content, grade) VALUES (?, ?, ?)
         RETURNING id, course_id, content, grade",
    )
    .bind(course_id)
    .bind(clean_html(&payload.content))
    .bind(payload.grade)
    .fetch_one(&mut *tx)
    .await?;

    let mut choices = Vec::with_capacity(payload.choices.len());
    for choice in &payload.choices {
        let choice = sqlx::query_as::<_, Choice>(
            "INSERT INTO choices (question_id, content, is_correct) VALUES (?, ?, ?)
             RETURNING id, question_id, content, is_correct",
        )
        .bind(question.id)
        .bind(clean_html(&choice.content))
        .bind(choice.is_correct)
        .fetch_one(&mut *tx)
        .await?;
        choices.push(choice);
    }

    tx.commit().await?;

    if !choices.iter().any(|c| c.is_correct) {
        tracing::warn!(
            question_id = question.id,
            "Question has no correct choice; it is graded correct when left blank"
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(QuestionWithChoices { question, choices }),
    ))
}

/// Deletes a question and its choices.
/// Admin only.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
