//! The on-disk shape of a subject: `{"lessons": [...], "questions": [...]}`.
//!
//! Loading is three steps. The text is parsed into a loose JSON value,
//! [`migrate`] back-fills fields older documents lack, and only then are
//! typed lessons and questions built from it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::lesson::Lesson;
use super::question::Question;
use super::subject::Subject;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Root must be an object")]
    RootNotObject,

    #[error("Missing 'questions' array")]
    MissingQuestions,

    #[error("'{field}' must be an array")]
    NotAnArray { field: &'static str },

    #[error("Lesson {index} must be an object")]
    LessonNotObject { index: usize },

    #[error("Question {index} must be an object")]
    QuestionNotObject { index: usize },

    #[error("Lesson {index} is malformed: {source}")]
    Lesson {
        index: usize,
        source: serde_json::Error,
    },

    #[error("Question {index} is malformed: {source}")]
    Question {
        index: usize,
        source: serde_json::Error,
    },
}

/// What [`migrate`] filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub added_lessons_array: bool,
    pub added_questions_array: bool,
    /// Names of lessons that were given `enabled = true`.
    pub enabled_lessons: Vec<String>,
    pub enabled_questions: usize,
    pub unassigned_questions: usize,
}

impl MigrationReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether the file on disk differs from what [`save`] would write.
    ///
    /// A missing `lessonId` does not count: null lesson ids are saved by omission.
    pub fn needs_rewrite(&self) -> bool {
        self.added_lessons_array
            || self.added_questions_array
            || !self.enabled_lessons.is_empty()
            || self.enabled_questions > 0
    }
}

fn array_mut<'a>(
    root: &'a mut Map<String, Value>,
    field: &'static str,
    added: &mut bool,
) -> Result<&'a mut Vec<Value>, LoadError> {
    let value = root.entry(field).or_insert_with(|| {
        *added = true;
        Value::Array(Vec::new())
    });
    value.as_array_mut().ok_or(LoadError::NotAnArray { field })
}

/// Back-fill fields that older documents do not carry.
///
/// Missing `lessons`/`questions` arrays become empty ones, lessons and
/// questions without `enabled` are enabled, and questions without `lessonId`
/// get `null`. Running it twice changes nothing the second time.
pub fn migrate(document: &mut Value) -> Result<MigrationReport, LoadError> {
    let root = document.as_object_mut().ok_or(LoadError::RootNotObject)?;
    let mut report = MigrationReport::default();

    let lessons = array_mut(root, "lessons", &mut report.added_lessons_array)?;
    for (index, lesson) in lessons.iter_mut().enumerate() {
        let lesson = lesson
            .as_object_mut()
            .ok_or(LoadError::LessonNotObject { index })?;
        if !lesson.contains_key("enabled") {
            lesson.insert("enabled".into(), Value::Bool(true));
            let name = lesson
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string();
            tracing::info!(lesson = %name, "migration: added enabled=true to lesson");
            report.enabled_lessons.push(name);
        }
    }

    let questions = array_mut(root, "questions", &mut report.added_questions_array)?;
    for (index, question) in questions.iter_mut().enumerate() {
        let question = question
            .as_object_mut()
            .ok_or(LoadError::QuestionNotObject { index })?;
        if !question.contains_key("enabled") {
            question.insert("enabled".into(), Value::Bool(true));
            report.enabled_questions += 1;
        }
        if !question.contains_key("lessonId") {
            question.insert("lessonId".into(), Value::Null);
            report.unassigned_questions += 1;
        }
    }
    if report.enabled_questions > 0 {
        tracing::info!(
            count = report.enabled_questions,
            "migration: added enabled=true to questions"
        );
    }

    Ok(report)
}

/// Check a document's outer shape without building anything.
///
/// Stricter than [`load`]: the `questions` array must be present.
pub fn inspect(raw: &str) -> Result<(), LoadError> {
    let document: Value = serde_json::from_str(raw)?;
    let root = document.as_object().ok_or(LoadError::RootNotObject)?;
    match root.get("questions") {
        None => return Err(LoadError::MissingQuestions),
        Some(questions) if !questions.is_array() => {
            return Err(LoadError::NotAnArray {
                field: "questions",
            })
        }
        Some(_) => {}
    }
    if root.get("lessons").is_some_and(|lessons| !lessons.is_array()) {
        return Err(LoadError::NotAnArray { field: "lessons" });
    }
    Ok(())
}

/// Parse, migrate and build a subject. Nothing is returned unless every record is well formed.
pub fn load(raw: &str, name: &str, filename: &str) -> Result<Subject, LoadError> {
    let mut document: Value = serde_json::from_str(raw)?;
    migrate(&mut document)?;
    Subject::from_document(name, filename, &document)
}

/// Pretty-printed document text for a subject, two-space indented, UTF-8 left unescaped.
pub fn save(subject: &Subject) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&subject.to_document()?)
}

fn records<'a>(document: &'a Value, field: &str) -> &'a [Value] {
    document
        .get(field)
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice)
}

impl Subject {
    /// Build from an already migrated document.
    pub fn from_document(name: &str, filename: &str, document: &Value) -> Result<Self, LoadError> {
        let lessons = records(document, "lessons")
            .iter()
            .enumerate()
            .map(|(index, value)| {
                Lesson::deserialize(value).map_err(|source| LoadError::Lesson { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let questions = records(document, "questions")
            .iter()
            .enumerate()
            .map(|(index, value)| {
                Question::from_value(value).map_err(|source| LoadError::Question { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Subject::from_parts(name, filename, lessons, questions))
    }

    pub fn to_document(&self) -> Result<Value, serde_json::Error> {
        let lessons = self
            .lessons()
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        let questions = self
            .questions()
            .iter()
            .map(Question::to_value)
            .collect::<Result<Vec<_>, _>>()?;

        let mut document = Map::new();
        document.insert("lessons".into(), Value::Array(lessons));
        document.insert("questions".into(), Value::Array(questions));
        Ok(Value::Object(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_document_is_back_filled() {
        let mut document = json!({
            "lessons": [{"id": "L001", "name": "Capitals"}],
            "questions": [
                {"id": 1, "type": "true_false", "question": "Rome is in Italy", "correct": 0}
            ]
        });
        let report = migrate(&mut document).unwrap();
        assert_eq!(report.enabled_lessons, ["Capitals"]);
        assert_eq!(report.enabled_questions, 1);
        assert_eq!(report.unassigned_questions, 1);
        assert_eq!(document["questions"][0]["enabled"], true);
        assert_eq!(document["questions"][0]["lessonId"], Value::Null);

        // second run is a no-op
        let again = migrate(&mut document).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn missing_arrays_are_injected() {
        let mut document = json!({});
        let report = migrate(&mut document).unwrap();
        assert!(report.added_lessons_array);
        assert!(report.added_questions_array);
        assert_eq!(document, json!({"lessons": [], "questions": []}));
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        assert!(matches!(
            migrate(&mut json!([1, 2])),
            Err(LoadError::RootNotObject)
        ));
        assert!(matches!(
            migrate(&mut json!({"questions": {}})),
            Err(LoadError::NotAnArray { field: "questions" })
        ));
        assert!(matches!(
            migrate(&mut json!({"questions": [3]})),
            Err(LoadError::QuestionNotObject { index: 0 })
        ));
        assert!(matches!(
            load("{not json", "geo", "f.json"),
            Err(LoadError::Json(_))
        ));
        assert!(matches!(
            load(r#"{"lessons": [{"id": 5, "name": "numeric id"}]}"#, "geo", "f.json"),
            Err(LoadError::Lesson { index: 0, .. })
        ));
    }

    #[test]
    fn inspect_requires_questions() {
        assert!(matches!(inspect("{}"), Err(LoadError::MissingQuestions)));
        assert!(matches!(
            inspect(r#"{"questions": [], "lessons": 4}"#),
            Err(LoadError::NotAnArray { field: "lessons" })
        ));
        assert!(inspect(r#"{"questions": []}"#).is_ok());
        assert_eq!(
            inspect("[]").unwrap_err().to_string(),
            "Root must be an object"
        );
    }

    #[test]
    fn save_is_pretty_and_unescaped() {
        let subject = load(
            r#"{"lessons": [{"id": "L001", "name": "Città"}], "questions": []}"#,
            "geo",
            "questions/questions-geo.json",
        )
        .unwrap();
        let text = save(&subject).unwrap();
        assert!(text.contains("Città"));
        assert!(text.starts_with("{\n  \"lessons\": [\n    {\n      \"id\": \"L001\""));
    }

    #[test]
    fn load_save_load_is_stable() {
        let raw = json!({
            "lessons": [{"id": "L001", "name": "Capitals", "enabled": false}],
            "questions": [
                {"id": 1, "type": "fill_in_blank", "question": "_Q1_ is the capital of _Q2_",
                 "correct": {"Q1": ["Rome"], "Q2": ["Italy"]}, "lessonId": "L001"},
                {"id": 2, "type": "hotspot", "regions": [1, 2, 3]},
                {"id": 3, "type": "reordering", "question": "Order",
                 "items": [{"text": "b", "order": 2}, {"text": "a", "order": 1}]}
            ]
        })
        .to_string();
        let first = load(&raw, "geo", "f.json").unwrap();
        let second = load(&save(&first).unwrap(), "geo", "f.json").unwrap();
        assert_eq!(first, second);
        assert!(!second.lesson("L001").unwrap().enabled);
        assert_eq!(second.question(2).unwrap().type_name(), "hotspot");
    }
}
