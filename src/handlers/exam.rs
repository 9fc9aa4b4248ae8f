// src/handlers/exam.rs

use std::collections::BTreeSet;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::AppError,
    grading::{self, GradingMode, QuestionKey},
    handlers::{
        course::{fetch_course, load_exam},
        enrollment::fetch_enrollment,
    },
    models::submission::{
        ExamResultResponse, SubmissionCreated, SubmissionSummary, SubmitExamRequest, Submission,
    },
    utils::jwt::Claims,
};

/// Rows per `submission_choices` insert; each row binds two values.
const INSERT_CHUNK_SIZE: usize = 1000;

/// Stores an exam attempt for the current user.
///
/// * Requires an enrollment in the course (404 otherwise).
/// * Keeps only ids that are choices of this course; anything else is dropped.
/// * The submission row and its choice rows are written in one transaction.
pub async fn submit_exam(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
    Json(req): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let course = fetch_course(&pool, course_id).await?;
    let enrollment = fetch_enrollment(&pool, user_id, course.id).await?;

    let requested = req.choice_ids();

    let mut tx = pool.begin().await?;

    // One fixed query per course; the submitted list can be arbitrarily long.
    let selected: Vec<i64> = if requested.is_empty() {
        Vec::new()
    } else {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT ch.id
            FROM choices ch
            JOIN questions q ON ch.question_id = q.id
            WHERE q.course_id = ?
            ORDER BY ch.id
            "#,
        )
        .bind(course.id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .filter(|id| requested.contains(id))
        .collect()
    };

    let submission_id = sqlx::query("INSERT INTO submissions (enrollment_id) VALUES (?)")
        .bind(enrollment.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create submission: {:?}", e);
            AppError::from(e)
        })?
        .last_insert_rowid();

    for chunk in selected.chunks(INSERT_CHUNK_SIZE) {
        let mut query_builder =
            QueryBuilder::<Sqlite>::new("INSERT INTO submission_choices (submission_id, choice_id) ");
        query_builder.push_values(chunk, |mut row, choice_id| {
            row.push_bind(submission_id).push_bind(*choice_id);
        });
        query_builder.build().execute(&mut *tx).await?;
    }

    tx.commit().await?;

    tracing::info!(
        user_id,
        course_id,
        submission_id,
        dropped = requested.len() - selected.len(),
        "Exam submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmissionCreated {
            submission_id,
            course_id,
            selected_choices: selected,
        }),
    ))
}

/// Grades a stored submission and returns the per-question breakdown.
///
/// Only the owner of the submission can read it; anyone else gets 404.
pub async fn show_exam_result(
    State(pool): State<SqlitePool>,
    State(grading_mode): State<GradingMode>,
    Extension(claims): Extension<Claims>,
    Path((course_id, submission_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let course = fetch_course(&pool, course_id).await?;

    let submission = sqlx::query_as::<_, Submission>(
        r#"
        SELECT s.id, s.enrollment_id, s.created_at
        FROM submissions s
        JOIN enrollments e ON s.enrollment_id = e.id
        WHERE s.id = ? AND e.course_id = ? AND e.user_id = ?
        "#,
    )
    .bind(submission_id)
    .bind(course.id)
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

    let selected: BTreeSet<i64> =
        sqlx::query_scalar::<_, i64>("SELECT choice_id FROM submission_choices WHERE submission_id = ?")
            .bind(submission.id)
            .fetch_all(&pool)
            .await?
            .into_iter()
            .collect();

    let exam = load_exam(&pool, course.id).await?;
    let answer_key: Vec<QuestionKey> = exam.iter().map(|q| q.answer_key()).collect();
    let outcome = grading::grade(&answer_key, &selected, grading_mode);

    Ok(Json(ExamResultResponse::build(
        course.id,
        submission.id,
        exam,
        &selected,
        &outcome,
        grading_mode,
    )))
}

/// Lists the caller's submissions for a course, newest first.
pub async fn list_submissions(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let course = fetch_course(&pool, course_id).await?;
    let enrollment = fetch_enrollment(&pool, user_id, course.id).await?;

    let submissions = sqlx::query_as::<_, SubmissionSummary>(
        r#"
        SELECT
            s.id,
            s.created_at,
            (SELECT COUNT(*) FROM submission_choices sc WHERE sc.submission_id = s.id) AS selected_count
        FROM submissions s
        WHERE s.enrollment_id = ?
        ORDER BY s.created_at DESC, s.id DESC
        "#,
    )
    .bind(enrollment.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(submissions))
}
