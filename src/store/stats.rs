use indexmap::IndexMap;
use serde::Serialize;

use crate::quiz::Subject;

/// Counts shown for a subject. Per-type, per-lesson, unassigned and image
/// counts only include enabled questions.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SubjectStats {
    pub total_questions: usize,
    pub total_lessons: usize,
    pub enabled_questions: usize,
    pub disabled_questions: usize,
    pub enabled_lessons: usize,
    pub disabled_lessons: usize,
    pub questions_by_type: IndexMap<String, usize>,
    /// Lesson name to enabled question count, for enabled lessons that have any.
    pub questions_by_lesson: IndexMap<String, usize>,
    pub questions_with_images: usize,
    pub unassigned_questions: usize,
}

impl SubjectStats {
    pub fn collect(subject: &Subject) -> Self {
        let questions = subject.questions();
        let lessons = subject.lessons();
        let enabled_questions = questions.iter().filter(|q| q.enabled).count();
        let enabled_lessons = lessons.iter().filter(|l| l.enabled).count();

        let mut questions_by_type = IndexMap::new();
        for q in questions.iter().filter(|q| q.enabled) {
            *questions_by_type.entry(q.type_name().to_string()).or_insert(0) += 1;
        }

        let questions_by_lesson = lessons
            .iter()
            .filter(|l| l.enabled)
            .map(|l| (l.name.clone(), subject.enabled_questions_count(Some(&l.id))))
            .filter(|(_, count)| *count > 0)
            .collect();

        Self {
            total_questions: questions.len(),
            total_lessons: lessons.len(),
            enabled_questions,
            disabled_questions: questions.len() - enabled_questions,
            enabled_lessons,
            disabled_lessons: lessons.len() - enabled_lessons,
            questions_by_type,
            questions_by_lesson,
            questions_with_images: questions
                .iter()
                .filter(|q| q.enabled && q.question_image.is_some())
                .count(),
            unassigned_questions: subject.others().iter().filter(|q| q.enabled).count(),
        }
    }
}
