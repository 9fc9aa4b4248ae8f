// src/handlers/course.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    config::COURSE_LIST_LIMIT,
    error::AppError,
    models::{
        course::{COURSE_COLUMNS, Course, CourseDetail, CourseListItem},
        question::{ExamRow, QuestionWithChoices, assemble_exam},
    },
    utils::jwt::Claims,
};

/// Lists the most popular courses.
///
/// Ordered by `total_enrollment` (highest first). When the caller is logged
/// in, `is_enrolled` reflects their enrollments; otherwise it is false.
pub async fn list_courses(
    State(pool): State<SqlitePool>,
    claims: Option<Extension<Claims>>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = match claims {
        Some(Extension(claims)) => Some(claims.user_id()?),
        None => None,
    };

    let courses = sqlx::query_as::<_, CourseListItem>(
        r#"
        SELECT
            c.id, c.name, c.description, c.image_url, c.total_enrollment, c.pub_date,
            EXISTS (
                SELECT 1 FROM enrollments e WHERE e.course_id = c.id AND e.user_id = ?
            ) AS is_enrolled
        FROM courses c
        ORDER BY c.total_enrollment DESC, c.id ASC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(COURSE_LIST_LIMIT)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list courses: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(courses))
}

/// Retrieves a course with its exam questions. Correct answers are not included.
pub async fn get_course(
    State(pool): State<SqlitePool>,
    claims: Option<Extension<Claims>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = fetch_course(&pool, id).await?;

    let is_enrolled = match claims {
        Some(Extension(claims)) => check_if_enrolled(&pool, claims.user_id()?, id).await?,
        None => false,
    };

    let questions = load_exam(&pool, id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(CourseDetail {
        course,
        is_enrolled,
        questions,
    }))
}

/// Loads a course or fails with 404.
pub(crate) async fn fetch_course(pool: &SqlitePool, id: i64) -> Result<Course, AppError> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
}

/// All questions of a course with their choices, in question id order.
pub(crate) async fn load_exam(
    pool: &SqlitePool,
    course_id: i64,
) -> Result<Vec<QuestionWithChoices>, AppError> {
    let rows = sqlx::query_as::<_, ExamRow>(
        r#"
        SELECT
            q.id AS question_id,
            q.course_id,
            q.content AS question_content,
            q.grade,
            ch.id AS choice_id,
            ch.content AS choice_content,
            ch.is_correct
        FROM questions q
        LEFT JOIN choices ch ON ch.question_id = q.id
        WHERE q.course_id = ?
        ORDER BY q.id ASC, ch.id ASC
        "#,
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to load exam for course {}: {:?}", course_id, e);
        AppError::from(e)
    })?;

    Ok(assemble_exam(rows))
}

pub(crate) async fn check_if_enrolled(
    pool: &SqlitePool,
    user_id: i64,
    course_id: i64,
) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM enrollments WHERE user_id = ? AND course_id = ?",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}
