//! Per-type question checks plus the lesson and subject name rules.
//!
//! Every validator stops at the first rule that fails; the error's `Display`
//! is the message shown to the author.

use std::collections::HashSet;

use indexmap::IndexMap;
use thiserror::Error;

use super::draft::{DropdownChoice, ReorderItemDraft, SubQuestionDraft};
use super::question::{BlankAnswers, MatchingPair};
use super::slot::{self, SlotError};
use crate::constants::{
    INVALID_SUBJECT_CHARS, MAX_LESSON_ID_LEN, MAX_LESSON_NAME_LEN, MAX_PAIRS_MATCHING,
    MAX_SUBJECT_NAME_LEN, MIN_CORRECT_ANSWERS_MCM, MIN_ITEMS_REORDERING, MIN_OPTIONS_MC,
    MIN_PAIRS_MATCHING, MIN_SUBQUESTIONS_READING,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Question text is required")]
    MissingQuestionText,

    #[error("Passage text is required")]
    MissingPassage,

    #[error("Need at least {min} options")]
    TooFewOptions { min: usize },

    #[error("Option {index} is empty")]
    EmptyOption { index: usize },

    #[error("Correct index must be between 0 and {max}")]
    CorrectOutOfRange { max: usize },

    #[error("Select at least {} correct answer", MIN_CORRECT_ANSWERS_MCM)]
    NoCorrectAnswers,

    #[error("Cannot have more correct answers ({found}) than options ({options})")]
    TooManyCorrectAnswers { found: usize, options: usize },

    #[error("Correct answer {index} is selected more than once")]
    DuplicateCorrectAnswer { index: i64 },

    #[error("Correct answer {index} must be between 0 and {max}")]
    CorrectAnswerOutOfRange { index: i64, max: usize },

    #[error("Correct answer must be 0 (True) or 1 (False)")]
    TrueFalseAnswer,

    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error("Need at least {min} pairs")]
    TooFewPairs { min: usize },

    #[error("Too many pairs: found {found}, maximum is {max}")]
    TooManyPairs { found: usize, max: usize },

    #[error("Pair {pair} left side is empty")]
    PairLeftEmpty { pair: usize },

    #[error("Pair {pair} right side is empty")]
    PairRightEmpty { pair: usize },

    #[error("Pair {pair} missing ID")]
    PairMissingId { pair: usize },

    #[error("Need at least {min} items")]
    TooFewItems { min: usize },

    #[error("Item {item} text is empty")]
    ItemTextEmpty { item: usize },

    #[error("Item {item} missing order")]
    ItemMissingOrder { item: usize },

    #[error("Duplicate item: '{text}'")]
    DuplicateItem { text: String },

    #[error("Need at least {} sub-question", MIN_SUBQUESTIONS_READING)]
    NoSubQuestions,

    #[error("Sub-question {sub} text is empty")]
    SubQuestionTextEmpty { sub: usize },

    #[error("Sub-question {sub} needs at least {min} options")]
    SubQuestionTooFewOptions { sub: usize, min: usize },

    #[error("Sub-question {sub}, option {option} is empty")]
    SubQuestionEmptyOption { sub: usize, option: usize },

    #[error("Sub-question {sub} has invalid correct answer")]
    SubQuestionInvalidCorrect { sub: usize },

    #[error("Unknown question type: {type_name}")]
    UnknownType { type_name: String },

    #[error("Lesson name cannot be empty")]
    LessonNameEmpty,

    #[error("Lesson name too long (max {} characters)", MAX_LESSON_NAME_LEN)]
    LessonNameTooLong,

    #[error("Lesson name already exists")]
    LessonNameExists,

    #[error("Lesson ID cannot be empty")]
    LessonIdEmpty,

    #[error("Lesson ID too long (max {} characters)", MAX_LESSON_ID_LEN)]
    LessonIdTooLong,

    #[error("Subject name cannot be empty")]
    SubjectNameEmpty,

    #[error("Subject name cannot contain '{ch}'")]
    SubjectNameInvalidChar { ch: char },

    #[error("Subject name too long (max {} characters)", MAX_SUBJECT_NAME_LEN)]
    SubjectNameTooLong,
}

/// The `(is_valid, message)` pair a form displays. The message is empty when valid.
pub fn status(result: &Result<(), ValidationError>) -> (bool, String) {
    match result {
        Ok(()) => (true, String::new()),
        Err(err) => (false, err.to_string()),
    }
}

fn blank(text: &str) -> bool {
    text.trim().is_empty()
}

fn require_text(text: &str) -> Result<(), ValidationError> {
    if blank(text) {
        return Err(ValidationError::MissingQuestionText);
    }
    Ok(())
}

fn check_options(options: &[String]) -> Result<(), ValidationError> {
    if options.len() < MIN_OPTIONS_MC {
        return Err(ValidationError::TooFewOptions {
            min: MIN_OPTIONS_MC,
        });
    }
    match options.iter().position(|o| blank(o)) {
        Some(index) => Err(ValidationError::EmptyOption { index }),
        None => Ok(()),
    }
}

fn in_range(index: i64, len: usize) -> bool {
    usize::try_from(index).is_ok_and(|i| i < len)
}

pub fn validate_multiple_choice(
    text: &str,
    options: &[String],
    correct: i64,
) -> Result<(), ValidationError> {
    require_text(text)?;
    check_options(options)?;
    if !in_range(correct, options.len()) {
        return Err(ValidationError::CorrectOutOfRange {
            max: options.len() - 1,
        });
    }
    Ok(())
}

pub fn validate_multiple_choice_multiple(
    text: &str,
    options: &[String],
    correct: &[i64],
) -> Result<(), ValidationError> {
    require_text(text)?;
    check_options(options)?;

    if correct.len() < MIN_CORRECT_ANSWERS_MCM {
        return Err(ValidationError::NoCorrectAnswers);
    }
    if correct.len() > options.len() {
        return Err(ValidationError::TooManyCorrectAnswers {
            found: correct.len(),
            options: options.len(),
        });
    }
    let mut seen = HashSet::new();
    if let Some(&index) = correct.iter().find(|&&c| !seen.insert(c)) {
        return Err(ValidationError::DuplicateCorrectAnswer { index });
    }
    if let Some(&index) = correct.iter().find(|&&c| !in_range(c, options.len())) {
        return Err(ValidationError::CorrectAnswerOutOfRange {
            index,
            max: options.len() - 1,
        });
    }
    Ok(())
}

pub fn validate_true_false(text: &str, correct: i64) -> Result<(), ValidationError> {
    require_text(text)?;
    if !matches!(correct, 0 | 1) {
        return Err(ValidationError::TrueFalseAnswer);
    }
    Ok(())
}

pub fn validate_fill_in_blank(text: &str, answers: &BlankAnswers) -> Result<(), ValidationError> {
    require_text(text)?;
    slot::check_blanks(text, answers)?;
    Ok(())
}

pub fn validate_dropdown(
    text: &str,
    dropdowns: &IndexMap<String, DropdownChoice>,
) -> Result<(), ValidationError> {
    require_text(text)?;
    slot::check_dropdowns(text, dropdowns)?;
    Ok(())
}

pub fn validate_matching(text: &str, pairs: &[MatchingPair]) -> Result<(), ValidationError> {
    require_text(text)?;
    if pairs.len() < MIN_PAIRS_MATCHING {
        return Err(ValidationError::TooFewPairs {
            min: MIN_PAIRS_MATCHING,
        });
    }
    if pairs.len() > MAX_PAIRS_MATCHING {
        return Err(ValidationError::TooManyPairs {
            found: pairs.len(),
            max: MAX_PAIRS_MATCHING,
        });
    }
    for (i, pair) in pairs.iter().enumerate() {
        let n = i + 1;
        if blank(&pair.left) {
            return Err(ValidationError::PairLeftEmpty { pair: n });
        }
        if blank(&pair.right) {
            return Err(ValidationError::PairRightEmpty { pair: n });
        }
        if pair.id.is_empty() {
            return Err(ValidationError::PairMissingId { pair: n });
        }
    }
    Ok(())
}

pub fn validate_reordering(text: &str, items: &[ReorderItemDraft]) -> Result<(), ValidationError> {
    require_text(text)?;
    if items.len() < MIN_ITEMS_REORDERING {
        return Err(ValidationError::TooFewItems {
            min: MIN_ITEMS_REORDERING,
        });
    }
    for (i, item) in items.iter().enumerate() {
        if blank(&item.text) {
            return Err(ValidationError::ItemTextEmpty { item: i + 1 });
        }
        if item.order.is_none() {
            return Err(ValidationError::ItemMissingOrder { item: i + 1 });
        }
    }
    let mut seen = HashSet::new();
    if let Some(item) = items.iter().find(|item| !seen.insert(item.text.trim())) {
        return Err(ValidationError::DuplicateItem {
            text: item.text.trim().to_string(),
        });
    }
    Ok(())
}

pub fn validate_reading_comprehension(
    passage: &str,
    sub_questions: &[SubQuestionDraft],
) -> Result<(), ValidationError> {
    if blank(passage) {
        return Err(ValidationError::MissingPassage);
    }
    if sub_questions.len() < MIN_SUBQUESTIONS_READING {
        return Err(ValidationError::NoSubQuestions);
    }
    for (i, sq) in sub_questions.iter().enumerate() {
        let sub = i + 1;
        if blank(&sq.question) {
            return Err(ValidationError::SubQuestionTextEmpty { sub });
        }
        if sq.options.len() < MIN_OPTIONS_MC {
            return Err(ValidationError::SubQuestionTooFewOptions {
                sub,
                min: MIN_OPTIONS_MC,
            });
        }
        if let Some(option) = sq.options.iter().position(|o| blank(o)) {
            return Err(ValidationError::SubQuestionEmptyOption { sub, option });
        }
        if !sq.correct.is_some_and(|c| in_range(c, sq.options.len())) {
            return Err(ValidationError::SubQuestionInvalidCorrect { sub });
        }
    }
    Ok(())
}

pub fn validate_lesson_name<S: AsRef<str>>(
    name: &str,
    existing: &[S],
) -> Result<(), ValidationError> {
    if blank(name) {
        return Err(ValidationError::LessonNameEmpty);
    }
    if name.chars().count() > MAX_LESSON_NAME_LEN {
        return Err(ValidationError::LessonNameTooLong);
    }
    if existing.iter().any(|n| n.as_ref() == name) {
        return Err(ValidationError::LessonNameExists);
    }
    Ok(())
}

pub fn validate_lesson_id(id: &str) -> Result<(), ValidationError> {
    if blank(id) {
        return Err(ValidationError::LessonIdEmpty);
    }
    if id.chars().count() > MAX_LESSON_ID_LEN {
        return Err(ValidationError::LessonIdTooLong);
    }
    Ok(())
}

pub fn validate_subject_name(name: &str) -> Result<(), ValidationError> {
    if blank(name) {
        return Err(ValidationError::SubjectNameEmpty);
    }
    if let Some(ch) = INVALID_SUBJECT_CHARS.into_iter().find(|c| name.contains(*c)) {
        return Err(ValidationError::SubjectNameInvalidChar { ch });
    }
    if name.chars().count() > MAX_SUBJECT_NAME_LEN {
        return Err(ValidationError::SubjectNameTooLong);
    }
    Ok(())
}
