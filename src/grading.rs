// src/grading.rs

//! Exam scoring.
//!
//! Grading is a pure function over a course's answer key and the set of
//! choice ids a user selected. Selections are partitioned by the question
//! that owns each choice before any question is scored.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// How a question's selections are compared with its correct choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradingMode {
    /// Correct when every correct choice was selected. Extra incorrect
    /// selections are not penalised.
    #[default]
    Lenient,
    /// Correct only when the selections equal the set of correct choices.
    Exact,
}

impl FromStr for GradingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(GradingMode::Lenient),
            "exact" => Ok(GradingMode::Exact),
            other => Err(format!("unknown grading mode '{}'", other)),
        }
    }
}

impl fmt::Display for GradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingMode::Lenient => f.write_str("lenient"),
            GradingMode::Exact => f.write_str("exact"),
        }
    }
}

/// A choice as seen by the grader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceKey {
    pub id: i64,
    pub is_correct: bool,
}

/// A question's weight and its full set of choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionKey {
    pub id: i64,
    pub grade: i64,
    pub choices: Vec<ChoiceKey>,
}

impl QuestionKey {
    fn correct_ids(&self) -> BTreeSet<i64> {
        self.choices
            .iter()
            .filter(|c| c.is_correct)
            .map(|c| c.id)
            .collect()
    }

    /// The subset of `selected` that belongs to this question.
    fn attributed(&self, selected: &BTreeSet<i64>) -> BTreeSet<i64> {
        self.choices
            .iter()
            .map(|c| c.id)
            .filter(|id| selected.contains(id))
            .collect()
    }

    fn is_answered_correctly(&self, selected: &BTreeSet<i64>, mode: GradingMode) -> bool {
        let correct = self.correct_ids();
        let attributed = self.attributed(selected);

        match mode {
            GradingMode::Lenient => {
                let selected_correct = attributed.intersection(&correct).count();
                correct.len() == selected_correct
            }
            GradingMode::Exact => attributed == correct,
        }
    }
}

/// Scored exam.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExamOutcome {
    pub total_score: i64,
    /// Sum of every question's grade.
    pub possible_score: i64,
    /// Question id -> answered correctly.
    pub question_results: BTreeMap<i64, bool>,
}

impl ExamOutcome {
    pub fn is_correct(&self, question_id: i64) -> bool {
        self.question_results
            .get(&question_id)
            .copied()
            .unwrap_or(false)
    }
}

/// Scores `selected` against the questions of a course.
///
/// Ids in `selected` that belong to none of `questions` are ignored.
pub fn grade(questions: &[QuestionKey], selected: &BTreeSet<i64>, mode: GradingMode) -> ExamOutcome {
    let mut outcome = ExamOutcome::default();

    for question in questions {
        let is_correct = question.is_answered_correctly(selected, mode);
        outcome.question_results.insert(question.id, is_correct);
        outcome.possible_score += question.grade;

        if is_correct {
            outcome.total_score += question.grade;
        }
    }

    outcome
}
