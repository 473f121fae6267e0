use thiserror::Error;

use super::draft::QuestionDraft;
use super::lesson::{lesson_id, Lesson};
use super::question::Question;
use super::validate::{validate_lesson_id, validate_lesson_name, ValidationError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubjectError {
    #[error("Lesson '{id}' not found")]
    LessonNotFound { id: String },

    #[error("Question {id} not found")]
    QuestionNotFound { id: u32 },

    #[error("Lesson ID '{id}' already exists")]
    DuplicateLessonId { id: String },

    #[error("Question ID {id} already exists")]
    DuplicateQuestionId { id: u32 },

    #[error("No question IDs left after {}", u32::MAX)]
    QuestionIdsExhausted,

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A subject file in memory: its lessons and its questions.
///
/// Every change goes through a method here. Methods check their inputs before
/// touching anything, so a failed call leaves the subject as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    name: String,
    filename: String,
    lessons: Vec<Lesson>,
    questions: Vec<Question>,
}

impl Subject {
    pub fn new(name: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            lessons: Vec::new(),
            questions: Vec::new(),
        }
    }

    /// Assemble a subject from loaded records. Records are taken as found on disk.
    pub(crate) fn from_parts(
        name: impl Into<String>,
        filename: impl Into<String>,
        lessons: Vec<Lesson>,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            lessons,
            questions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn lesson(&self, id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    pub fn question(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    fn lesson_mut(&mut self, id: &str) -> Result<&mut Lesson, SubjectError> {
        self.lessons
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| SubjectError::LessonNotFound { id: id.to_string() })
    }

    fn question_mut(&mut self, id: u32) -> Result<&mut Question, SubjectError> {
        self.questions
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or(SubjectError::QuestionNotFound { id })
    }

    fn require_lesson(&self, id: Option<&str>) -> Result<(), SubjectError> {
        match id {
            Some(id) if self.lesson(id).is_none() => Err(SubjectError::LessonNotFound {
                id: id.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn require_questions(&self, ids: &[u32]) -> Result<(), SubjectError> {
        match ids.iter().find(|&&id| self.question(id).is_none()) {
            Some(&id) => Err(SubjectError::QuestionNotFound { id }),
            None => Ok(()),
        }
    }

    /// Questions whose `lessonId` is exactly `lesson_id`; `None` selects unassigned ones.
    pub fn questions_by_lesson(&self, lesson_id: Option<&str>) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.lesson_id.as_deref() == lesson_id)
            .collect()
    }

    /// Questions in the "Others" bucket: unassigned, or pointing at a lesson that no longer exists.
    pub fn others(&self) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| self.bucket_of(q).is_none())
            .collect()
    }

    /// The lesson a question is listed under, `None` for "Others".
    pub fn bucket_of(&self, question: &Question) -> Option<&Lesson> {
        question.lesson_id.as_deref().and_then(|id| self.lesson(id))
    }

    pub fn enabled_questions_count(&self, lesson_id: Option<&str>) -> usize {
        self.questions_by_lesson(lesson_id)
            .iter()
            .filter(|q| q.enabled)
            .count()
    }

    /// One past the highest question id, 1 for an empty subject.
    pub fn next_question_id(&self) -> Result<u32, SubjectError> {
        match self.questions.iter().map(|q| q.id).max() {
            Some(id) => id.checked_add(1).ok_or(SubjectError::QuestionIdsExhausted),
            None => Ok(1),
        }
    }

    /// One past the highest numbered `L<n>` id. Ids without a number are skipped.
    pub fn next_lesson_id(&self) -> String {
        let next = self
            .lessons
            .iter()
            .filter_map(Lesson::sequence)
            .max()
            .map_or(1, |n| n.saturating_add(1));
        lesson_id(next)
    }

    fn lesson_names_except(&self, id: Option<&str>) -> Vec<&str> {
        self.lessons
            .iter()
            .filter(|l| Some(l.id.as_str()) != id)
            .map(|l| l.name.as_str())
            .collect()
    }

    pub fn add_lesson(&mut self, lesson: Lesson) -> Result<(), SubjectError> {
        validate_lesson_id(&lesson.id)?;
        validate_lesson_name(&lesson.name, &self.lesson_names_except(None))?;
        if self.lesson(&lesson.id).is_some() {
            return Err(SubjectError::DuplicateLessonId { id: lesson.id });
        }
        self.lessons.push(lesson);
        Ok(())
    }

    /// Add a lesson under the next free id.
    pub fn create_lesson(&mut self, name: &str) -> Result<&Lesson, SubjectError> {
        let lesson = Lesson::new(self.next_lesson_id(), name.trim());
        self.add_lesson(lesson)?;
        Ok(&self.lessons[self.lessons.len() - 1])
    }

    pub fn rename_lesson(&mut self, id: &str, name: &str) -> Result<(), SubjectError> {
        let name = name.trim();
        self.require_lesson(Some(id))?;
        validate_lesson_name(name, &self.lesson_names_except(Some(id)))?;
        self.lesson_mut(id)?.name = name.to_string();
        Ok(())
    }

    /// Remove a lesson. Its questions are kept and move to "Others".
    pub fn remove_lesson(&mut self, id: &str) -> Result<Lesson, SubjectError> {
        let index = self
            .lessons
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| SubjectError::LessonNotFound { id: id.to_string() })?;
        let lesson = self.lessons.remove(index);
        for question in &mut self.questions {
            if question.lesson_id.as_deref() == Some(id) {
                question.lesson_id = None;
            }
        }
        Ok(lesson)
    }

    /// Swap a lesson with the one before it. Returns false if it is already first.
    pub fn move_lesson_up(&mut self, id: &str) -> Result<bool, SubjectError> {
        let index = self.lesson_index(id)?;
        if index == 0 {
            return Ok(false);
        }
        self.lessons.swap(index, index - 1);
        Ok(true)
    }

    /// Swap a lesson with the one after it. Returns false if it is already last.
    pub fn move_lesson_down(&mut self, id: &str) -> Result<bool, SubjectError> {
        let index = self.lesson_index(id)?;
        if index + 1 >= self.lessons.len() {
            return Ok(false);
        }
        self.lessons.swap(index, index + 1);
        Ok(true)
    }

    fn lesson_index(&self, id: &str) -> Result<usize, SubjectError> {
        self.lessons
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| SubjectError::LessonNotFound { id: id.to_string() })
    }

    /// Enable or disable a lesson; with `cascade` its questions follow.
    pub fn set_lesson_enabled(
        &mut self,
        id: &str,
        enabled: bool,
        cascade: bool,
    ) -> Result<(), SubjectError> {
        self.lesson_mut(id)?.enabled = enabled;
        if cascade {
            for question in &mut self.questions {
                if question.lesson_id.as_deref() == Some(id) {
                    question.enabled = enabled;
                }
            }
        }
        Ok(())
    }

    /// Flip a lesson's state and return the new one.
    pub fn toggle_lesson_enabled(&mut self, id: &str, cascade: bool) -> Result<bool, SubjectError> {
        let enabled = !self.lesson(id).map_or(true, |l| l.enabled);
        self.set_lesson_enabled(id, enabled, cascade)?;
        Ok(enabled)
    }

    pub fn add_question(&mut self, question: Question) -> Result<(), SubjectError> {
        if self.question(question.id).is_some() {
            return Err(SubjectError::DuplicateQuestionId { id: question.id });
        }
        self.require_lesson(question.lesson_id.as_deref())?;
        self.questions.push(question);
        Ok(())
    }

    /// Replace the question stored under `id`, keeping its position.
    pub fn update_question(&mut self, id: u32, mut question: Question) -> Result<(), SubjectError> {
        self.require_lesson(question.lesson_id.as_deref())?;
        question.id = id;
        *self.question_mut(id)? = question;
        Ok(())
    }

    pub fn remove_question(&mut self, id: u32) -> Result<Question, SubjectError> {
        let index = self
            .questions
            .iter()
            .position(|q| q.id == id)
            .ok_or(SubjectError::QuestionNotFound { id })?;
        Ok(self.questions.remove(index))
    }

    /// Validate a draft and store it as a new question. Returns the new id.
    pub fn add_draft(
        &mut self,
        draft: QuestionDraft,
        lesson_id: Option<&str>,
    ) -> Result<u32, SubjectError> {
        self.require_lesson(lesson_id)?;
        let id = self.next_question_id()?;
        let question = draft.into_question(id, lesson_id.map(str::to_string))?;
        self.questions.push(question);
        Ok(id)
    }

    /// Validate a draft and replace question `id` with it. Lesson and enabled state are kept.
    pub fn update_draft(&mut self, id: u32, draft: QuestionDraft) -> Result<(), SubjectError> {
        let current = self
            .question(id)
            .ok_or(SubjectError::QuestionNotFound { id })?;
        let (lesson_id, enabled) = (current.lesson_id.clone(), current.enabled);

        let mut question = draft.into_question(id, lesson_id)?;
        question.enabled = enabled;
        *self.question_mut(id)? = question;
        Ok(())
    }

    /// Reassign a question; `None` moves it to "Others".
    pub fn move_question(&mut self, id: u32, lesson_id: Option<&str>) -> Result<(), SubjectError> {
        self.move_questions(&[id], lesson_id)
    }

    pub fn move_questions(
        &mut self,
        ids: &[u32],
        lesson_id: Option<&str>,
    ) -> Result<(), SubjectError> {
        self.require_lesson(lesson_id)?;
        self.require_questions(ids)?;
        for question in &mut self.questions {
            if ids.contains(&question.id) {
                question.lesson_id = lesson_id.map(str::to_string);
            }
        }
        Ok(())
    }

    pub fn set_question_enabled(&mut self, id: u32, enabled: bool) -> Result<(), SubjectError> {
        self.question_mut(id)?.enabled = enabled;
        Ok(())
    }

    pub fn toggle_question_enabled(&mut self, id: u32) -> Result<bool, SubjectError> {
        let question = self.question_mut(id)?;
        question.enabled = !question.enabled;
        Ok(question.enabled)
    }

    /// Flip several lessons and questions at once.
    ///
    /// `cascade` applies to every lesson in the batch: each toggled lesson's
    /// questions take the lesson's new state. Selected questions are flipped
    /// afterwards, so a question selected alongside its cascading lesson ends
    /// up opposite to the lesson.
    pub fn bulk_toggle(
        &mut self,
        lesson_ids: &[&str],
        question_ids: &[u32],
        cascade: bool,
    ) -> Result<(), SubjectError> {
        if let Some(id) = lesson_ids.iter().find(|id| self.lesson(id).is_none()) {
            return Err(SubjectError::LessonNotFound { id: id.to_string() });
        }
        self.require_questions(question_ids)?;

        for id in lesson_ids {
            self.toggle_lesson_enabled(id, cascade)?;
        }
        for &id in question_ids {
            self.toggle_question_enabled(id)?;
        }
        Ok(())
    }

    /// Every image path referenced by any question.
    pub fn image_paths(&self) -> Vec<&str> {
        self.questions.iter().flat_map(Question::image_paths).collect()
    }
}
