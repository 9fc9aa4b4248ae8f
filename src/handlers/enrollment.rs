// src/handlers/enrollment.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    config::DEFAULT_ENROLLMENT_MODE,
    error::AppError,
    models::{
        course::EnrollResponse,
        enrollment::{ENROLLMENT_COLUMNS, Enrollment},
    },
    utils::jwt::Claims,
};

/// Enrolls the current user in a course.
///
/// * 404 if the course does not exist.
/// * Enrolling again is a no-op: the counter only moves when a row is inserted.
pub async fn enroll(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let mut tx = pool.begin().await?;

    let course_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM courses WHERE id = ?")
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await?;
    if course_exists.is_none() {
        return Err(AppError::NotFound("Course not found".to_string()));
    }

    // UNIQUE(user_id, course_id) turns a duplicate into zero affected rows.
    let result = sqlx::query(
        r#"
        INSERT INTO enrollments (user_id, course_id, mode)
        VALUES (?, ?, ?)
        ON CONFLICT (user_id, course_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .bind(DEFAULT_ENROLLMENT_MODE)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create enrollment: {:?}", e);
        AppError::from(e)
    })?;
    let inserted = result.rows_affected() == 1;

    if inserted {
        sqlx::query("UPDATE courses SET total_enrollment = total_enrollment + 1 WHERE id = ?")
            .bind(course_id)
            .execute(&mut *tx)
            .await?;
    }

    let total_enrollment: i64 =
        sqlx::query_scalar("SELECT total_enrollment FROM courses WHERE id = ?")
            .bind(course_id)
            .fetch_one(&mut *tx)
            .await?;

    tx.commit().await?;

    if inserted {
        tracing::info!(user_id, course_id, "User enrolled");
    }

    Ok(Json(EnrollResponse {
        course_id,
        enrolled: true,
        newly_enrolled: inserted,
        total_enrollment,
    }))
}

/// The caller's enrollment in a course, or 404.
pub(crate) async fn fetch_enrollment(
    pool: &SqlitePool,
    user_id: i64,
    course_id: i64,
) -> Result<Enrollment, AppError> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE user_id = ? AND course_id = ?"
    ))
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))
}
