mod draft;
mod lesson;
mod question;
mod subject;

pub mod document;
pub mod slot;
pub mod validate;

pub use document::{LoadError, MigrationReport};
pub use draft::{
    ChoiceDraft, DropdownChoice, DropdownDraft, FillInBlankDraft, ImageDraft, MatchingDraft,
    MultiChoiceDraft, QuestionDraft, ReadingComprehensionDraft, ReorderItemDraft,
    ReorderingDraft, SubQuestionDraft, TrueFalseDraft,
};
pub use lesson::{lesson_id, Lesson};
pub use question::{
    clamp_scale, pair_id, passage_id, BlankAnswers, Dropdown, DropdownQuestion, FillInBlank,
    Matching, MatchingPair, MultipleChoice, MultipleChoiceMultiple, Question, QuestionKind,
    ReadingComprehension, ReorderItem, Reordering, SubQuestion, TrueFalse,
};
pub use slot::{SlotError, SlotId, SlotKind, SlotSections};
pub use subject::{Subject, SubjectError};
pub use validate::{status, ValidationError};
