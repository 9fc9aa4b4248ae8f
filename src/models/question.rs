// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::grading::{ChoiceKey, QuestionKey};

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub course_id: i64,

    /// The text content of the question.
    pub content: String,

    /// Points awarded for answering correctly.
    pub grade: i64,
}

/// Represents the 'choices' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub content: String,
    pub is_correct: bool,
}

/// A question together with all of its choices, correctness flags included.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionWithChoices {
    #[serde(flatten)]
    pub question: Question,
    pub choices: Vec<Choice>,
}

impl QuestionWithChoices {
    /// The grader's view of this question.
    pub fn answer_key(&self) -> QuestionKey {
        QuestionKey {
            id: self.question.id,
            grade: self.question.grade,
            choices: self
                .choices
                .iter()
                .map(|c| ChoiceKey {
                    id: c.id,
                    is_correct: c.is_correct,
                })
                .collect(),
        }
    }
}

/// One row of `questions LEFT JOIN choices`.
/// Choice columns are NULL for a question without choices.
#[derive(Debug, FromRow)]
pub struct ExamRow {
    pub question_id: i64,
    pub course_id: i64,
    pub question_content: String,
    pub grade: i64,
    pub choice_id: Option<i64>,
    pub choice_content: Option<String>,
    pub is_correct: Option<bool>,
}

/// Folds joined rows, ordered by question id, into questions with choices.
pub fn assemble_exam(rows: Vec<ExamRow>) -> Vec<QuestionWithChoices> {
    let mut exam: Vec<QuestionWithChoices> = Vec::new();

    for row in rows {
        let starts_new = exam
            .last()
            .is_none_or(|q| q.question.id != row.question_id);

        if starts_new {
            exam.push(QuestionWithChoices {
                question: Question {
                    id: row.question_id,
                    course_id: row.course_id,
                    content: row.question_content,
                    grade: row.grade,
                },
                choices: Vec::new(),
            });
        }

        if let (Some(id), Some(content), Some(current)) =
            (row.choice_id, row.choice_content, exam.last_mut())
        {
            current.choices.push(Choice {
                id,
                question_id: row.question_id,
                content,
                is_correct: row.is_correct.unwrap_or(false),
            });
        }
    }

    exam
}

/// DTO for sending a choice to a student (excludes `is_correct`).
#[derive(Debug, Serialize)]
pub struct PublicChoice {
    pub id: i64,
    pub content: String,
}

/// DTO for sending a question to a student.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub content: String,
    pub grade: i64,
    pub choices: Vec<PublicChoice>,
}

impl From<QuestionWithChoices> for PublicQuestion {
    fn from(q: QuestionWithChoices) -> Self {
        Self {
            id: q.question.id,
            content: q.question.content,
            grade: q.question.grade,
            choices: q
                .choices
                .into_iter()
                .map(|c| PublicChoice {
                    id: c.id,
                    content: c.content,
                })
                .collect(),
        }
    }
}

/// DTO for a choice inside `CreateQuestionRequest`.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateChoiceRequest {
    #[validate(length(min = 1, max = 500))]
    pub content: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    #[validate(range(min = 0, max = 1000))]
    pub grade: i64,
    #[validate(length(min = 1, max = 20), nested)]
    pub choices: Vec<CreateChoiceRequest>,
}
