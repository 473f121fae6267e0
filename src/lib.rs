//! Authoring core for quiz content: subjects made of lessons and typed questions,
//! stored as one JSON document per subject.

pub mod constants;
pub mod quiz;
pub mod store;

pub use quiz::{Lesson, Question, QuestionDraft, QuestionKind, Subject};
pub use store::{DataManager, StoreError};
