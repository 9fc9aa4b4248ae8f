// src/models/enrollment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'enrollments' table in the database.
/// At most one row exists per (user_id, course_id).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,

    /// 'audit', 'honor' or 'BETA'.
    pub mode: String,

    pub rating: f64,

    pub date_enrolled: chrono::DateTime<chrono::Utc>,
}

pub const ENROLLMENT_COLUMNS: &str = "id, user_id, course_id, mode, rating, date_enrolled";
