// src/models/course.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

use crate::models::question::PublicQuestion;

/// Represents the 'courses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,

    /// Course title.
    pub name: String,

    /// Sanitised HTML description.
    pub description: String,

    pub image_url: Option<String>,

    /// Number of enrollments ever created for this course.
    pub total_enrollment: i64,

    pub pub_date: chrono::DateTime<chrono::Utc>,
}

pub const COURSE_COLUMNS: &str = "id, name, description, image_url, total_enrollment, pub_date";

/// Course list row, annotated for the calling user.
#[derive(Debug, Serialize, FromRow)]
pub struct CourseListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub course: Course,
    pub is_enrolled: bool,
}

/// Course detail with its exam, answers hidden.
#[derive(Debug, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub is_enrolled: bool,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for creating a new course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 20000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 500), custom(function = validate_url_string))]
    pub image_url: Option<String>,
}

/// Validates that a string is a correctly formatted URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

/// Response of the enroll endpoint.
#[derive(Debug, Serialize)]
pub struct EnrollResponse {
    pub course_id: i64,
    pub enrolled: bool,
    /// False when the user was already enrolled.
    pub newly_enrolled: bool,
    pub total_enrollment: i64,
}
