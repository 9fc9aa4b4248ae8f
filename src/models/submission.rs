// src/models/submission.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::grading::{ExamOutcome, GradingMode};
use crate::models::question::QuestionWithChoices;

/// Represents the 'submissions' table in the database.
/// The selected choices live in 'submission_choices'.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub enrollment_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A choice id as sent by a client: form-style strings or JSON integers.
/// Any other JSON value lands in `Other` and is dropped like a malformed string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubmittedChoiceId {
    Int(i64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

impl SubmittedChoiceId {
    pub fn parse(&self) -> Option<i64> {
        match self {
            SubmittedChoiceId::Int(id) => Some(*id),
            SubmittedChoiceId::Text(raw) => raw.trim().parse().ok(),
            SubmittedChoiceId::Other(_) => None,
        }
    }
}

/// DTO for submitting an exam attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitExamRequest {
    #[serde(default)]
    pub selected_choices: Vec<SubmittedChoiceId>,
}

impl SubmitExamRequest {
    /// Unique, parseable ids. Malformed entries are dropped.
    pub fn choice_ids(&self) -> BTreeSet<i64> {
        self.selected_choices
            .iter()
            .filter_map(SubmittedChoiceId::parse)
            .collect()
    }
}

/// Response after a submission has been stored.
#[derive(Debug, Serialize)]
pub struct SubmissionCreated {
    pub submission_id: i64,
    pub course_id: i64,
    /// Ids actually stored, i.e. valid choices of this course.
    pub selected_choices: Vec<i64>,
}

/// Entry of the caller's submission history.
#[derive(Debug, Serialize, FromRow)]
pub struct SubmissionSummary {
    pub id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub selected_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ChoiceResult {
    pub id: i64,
    pub content: String,
    pub is_correct: bool,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct QuestionResult {
    pub question_id: i64,
    pub content: String,
    pub grade: i64,
    pub is_correct: bool,
    pub choices: Vec<ChoiceResult>,
}

/// Graded submission, ready for display.
#[derive(Debug, Serialize)]
pub struct ExamResultResponse {
    pub course_id: i64,
    pub submission_id: i64,
    pub total_score: i64,
    pub possible_score: i64,
    pub grading_mode: GradingMode,
    pub question_results: Vec<QuestionResult>,
}

impl ExamResultResponse {
    pub fn build(
        course_id: i64,
        submission_id: i64,
        exam: Vec<QuestionWithChoices>,
        selected: &BTreeSet<i64>,
        outcome: &ExamOutcome,
        grading_mode: GradingMode,
    ) -> Self {
        let question_results = exam
            .into_iter()
            .map(|q| QuestionResult {
                question_id: q.question.id,
                is_correct: outcome.is_correct(q.question.id),
                content: q.question.content,
                grade: q.question.grade,
                choices: q
                    .choices
                    .into_iter()
                    .map(|c| ChoiceResult {
                        selected: selected.contains(&c.id),
                        id: c.id,
                        content: c.content,
                        is_correct: c.is_correct,
                    })
                    .collect(),
            })
            .collect();

        Self {
            course_id,
            submission_id,
            total_score: outcome.total_score,
            possible_score: outcome.possible_score,
            grading_mode,
            question_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_ids_accept_strings_and_numbers() {
        let req: SubmitExamRequest =
            serde_json::from_value(serde_json::json!({ "selected_choices": [1, "2", " 3 ", 2] }))
                .unwrap();
        assert_eq!(req.choice_ids(), BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn test_malformed_ids_are_dropped() {
        let req: SubmitExamRequest =
            serde_json::from_value(serde_json::json!({ "selected_choices": ["abc", "", "7"] }))
                .unwrap();
        assert_eq!(req.choice_ids(), BTreeSet::from([7]));
    }

    #[test]
    fn test_non_integer_values_are_dropped() {
        let req: SubmitExamRequest = serde_json::from_str(
            r#"{"selected_choices": [null, 1.5, 1e30, 99999999999999999999, true, [1], {"id": 2}, "4", 5]}"#,
        )
        .unwrap();
        assert_eq!(req.choice_ids(), BTreeSet::from([4, 5]));
    }

    #[test]
    fn test_missing_selection_is_empty() {
        let req: SubmitExamRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(req.choice_ids().is_empty());
    }
}
