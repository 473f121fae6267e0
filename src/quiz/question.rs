use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::slot::{SlotId, SlotKind};
use crate::constants::{
    DEFAULT_IMAGE_SCALE, DROPDOWN, FILL_IN_BLANK, MATCHING, MAX_IMAGE_SCALE, MIN_IMAGE_SCALE,
    MULTIPLE_CHOICE, MULTIPLE_CHOICE_MULTIPLE, READING_COMPREHENSION, REORDERING, TRUE_FALSE,
};

/// Keys shared by every question record; everything else belongs to the payload.
const ENVELOPE_KEYS: [&str; 6] = [
    "id",
    "type",
    "lessonId",
    "enabled",
    "questionImage",
    "questionImageScale",
];

pub(crate) fn default_true() -> bool {
    true
}

fn default_scale() -> u32 {
    DEFAULT_IMAGE_SCALE
}

fn default_type() -> String {
    MULTIPLE_CHOICE.to_string()
}

/// Clamp an image scale percentage into the supported range.
pub fn clamp_scale(scale: u32) -> u32 {
    scale.clamp(MIN_IMAGE_SCALE, MAX_IMAGE_SCALE)
}

/// A question of any type, with the fields every type shares.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: u32,
    /// `None` places the question in the "Others" bucket.
    pub lesson_id: Option<String>,
    pub enabled: bool,
    /// Path relative to the data root, e.g. `images/geo/q3_main.png`.
    pub question_image: Option<String>,
    pub question_image_scale: u32,
    pub kind: QuestionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuestionKind {
    MultipleChoice(MultipleChoice),
    MultipleChoiceMultiple(MultipleChoiceMultiple),
    TrueFalse(TrueFalse),
    FillInBlank(FillInBlank),
    Dropdown(DropdownQuestion),
    Matching(Matching),
    Reordering(Reordering),
    ReadingComprehension(ReadingComprehension),
    /// A type this version does not know. The payload is kept verbatim so it
    /// survives a load/save cycle.
    Unknown {
        type_name: String,
        fields: Map<String, Value>,
    },
}

impl QuestionKind {
    pub fn type_name(&self) -> &str {
        match self {
            QuestionKind::MultipleChoice(_) => MULTIPLE_CHOICE,
            QuestionKind::MultipleChoiceMultiple(_) => MULTIPLE_CHOICE_MULTIPLE,
            QuestionKind::TrueFalse(_) => TRUE_FALSE,
            QuestionKind::FillInBlank(_) => FILL_IN_BLANK,
            QuestionKind::Dropdown(_) => DROPDOWN,
            QuestionKind::Matching(_) => MATCHING,
            QuestionKind::Reordering(_) => REORDERING,
            QuestionKind::ReadingComprehension(_) => READING_COMPREHENSION,
            QuestionKind::Unknown { type_name, .. } => type_name,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default)]
    id: u32,
    #[serde(rename = "type", default = "default_type")]
    question_type: String,
    #[serde(default)]
    lesson_id: Option<String>,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    question_image: Option<String>,
    #[serde(default = "default_scale")]
    question_image_scale: u32,
}

impl Question {
    pub fn new(id: u32, kind: QuestionKind) -> Self {
        Self {
            id,
            lesson_id: None,
            enabled: true,
            question_image: None,
            question_image_scale: DEFAULT_IMAGE_SCALE,
            kind,
        }
    }

    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    /// Build a question from one record of a subject document.
    ///
    /// The `type` field picks the variant; a missing `type` is read as
    /// `multiple_choice`, an unrecognised one becomes [`QuestionKind::Unknown`].
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let envelope = Envelope::deserialize(value)?;

        let kind = match envelope.question_type.as_str() {
            MULTIPLE_CHOICE => QuestionKind::MultipleChoice(MultipleChoice::deserialize(value)?),
            MULTIPLE_CHOICE_MULTIPLE => {
                QuestionKind::MultipleChoiceMultiple(MultipleChoiceMultiple::deserialize(value)?)
            }
            TRUE_FALSE => QuestionKind::TrueFalse(TrueFalse::deserialize(value)?),
            FILL_IN_BLANK => QuestionKind::FillInBlank(FillInBlank::deserialize(value)?),
            DROPDOWN => QuestionKind::Dropdown(DropdownQuestion::deserialize(value)?),
            MATCHING => QuestionKind::Matching(Matching::deserialize(value)?),
            REORDERING => QuestionKind::Reordering(Reordering::deserialize(value)?),
            READING_COMPREHENSION => {
                QuestionKind::ReadingComprehension(ReadingComprehension::deserialize(value)?)
            }
            other => QuestionKind::Unknown {
                type_name: other.to_string(),
                fields: value
                    .as_object()
                    .map(|obj| {
                        obj.iter()
                            .filter(|(k, _)| !ENVELOPE_KEYS.contains(&k.as_str()))
                            .map(|(k, v)| (k.clone(), v.clone()))
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        };

        Ok(Self {
            id: envelope.id,
            lesson_id: envelope.lesson_id,
            enabled: envelope.enabled,
            question_image: envelope.question_image,
            question_image_scale: envelope.question_image_scale,
            kind,
        })
    }

    /// The record written to a subject document. Absent optional fields are omitted.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let mut record = Map::new();
        record.insert("id".into(), self.id.into());
        record.insert("type".into(), self.type_name().into());
        if let Some(lesson_id) = &self.lesson_id {
            record.insert("lessonId".into(), lesson_id.as_str().into());
        }
        record.insert("enabled".into(), self.enabled.into());
        if let Some(image) = &self.question_image {
            record.insert("questionImage".into(), image.as_str().into());
        }
        record.insert("questionImageScale".into(), self.question_image_scale.into());

        let payload = match &self.kind {
            QuestionKind::MultipleChoice(p) => serde_json::to_value(p)?,
            QuestionKind::MultipleChoiceMultiple(p) => serde_json::to_value(p)?,
            QuestionKind::TrueFalse(p) => serde_json::to_value(p)?,
            QuestionKind::FillInBlank(p) => serde_json::to_value(p)?,
            QuestionKind::Dropdown(p) => serde_json::to_value(p)?,
            QuestionKind::Matching(p) => serde_json::to_value(p)?,
            QuestionKind::Reordering(p) => serde_json::to_value(p)?,
            QuestionKind::ReadingComprehension(p) => serde_json::to_value(p)?,
            QuestionKind::Unknown { fields, .. } => Value::Object(fields.clone()),
        };
        if let Value::Object(fields) = payload {
            record.extend(fields.into_iter().filter(|(_, v)| !v.is_null()));
        }

        Ok(Value::Object(record))
    }

    /// Question text, or the passage for reading comprehension.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            QuestionKind::MultipleChoice(p) => Some(&p.question),
            QuestionKind::MultipleChoiceMultiple(p) => Some(&p.question),
            QuestionKind::TrueFalse(p) => Some(&p.question),
            QuestionKind::FillInBlank(p) => Some(&p.question),
            QuestionKind::Dropdown(p) => Some(&p.question),
            QuestionKind::Matching(p) => Some(&p.question),
            QuestionKind::Reordering(p) => Some(&p.question),
            QuestionKind::ReadingComprehension(p) => Some(&p.passage),
            QuestionKind::Unknown { fields, .. } => fields.get("question").and_then(Value::as_str),
        }
    }

    /// Every image path this question references.
    pub fn image_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.question_image.iter().map(String::as_str).collect();
        let option_images = match &self.kind {
            QuestionKind::MultipleChoice(p) => p.option_images.as_ref(),
            QuestionKind::MultipleChoiceMultiple(p) => p.option_images.as_ref(),
            _ => None,
        };
        if let Some(images) = option_images {
            paths.extend(images.values().map(String::as_str));
        }
        paths
    }
}

impl Serialize for Question {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Question {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Question::from_value(&value).map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoice {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct: usize,
    /// Option index (as a string key) to image path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_images: Option<IndexMap<String, String>>,
    #[serde(default = "default_scale")]
    pub option_image_scale: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceMultiple {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_images: Option<IndexMap<String, String>>,
    #[serde(default = "default_scale")]
    pub option_image_scale: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrueFalse {
    #[serde(default)]
    pub question: String,
    /// 0 is True, 1 is False.
    #[serde(default)]
    pub correct: u8,
}

impl TrueFalse {
    pub fn answer(&self) -> bool {
        self.correct == 0
    }
}

/// Acceptable answers of a fill-in-blank question.
///
/// The flat list predates multi-blank support and is used when the text has
/// no `_Q<n>_` placeholders. The two shapes are told apart by the JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlankAnswers {
    Single(Vec<String>),
    PerSlot(IndexMap<String, Vec<String>>),
}

impl Default for BlankAnswers {
    fn default() -> Self {
        BlankAnswers::Single(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillInBlank {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub correct: BlankAnswers,
}

impl FillInBlank {
    pub fn is_multi_blank(&self) -> bool {
        matches!(self.correct, BlankAnswers::PerSlot(_))
    }

    pub fn blank_count(&self) -> usize {
        match &self.correct {
            BlankAnswers::Single(_) => 1,
            BlankAnswers::PerSlot(map) => map.len(),
        }
    }

    /// Blank ids in numeric order. A single-blank question reports `Q1`.
    pub fn blank_ids(&self) -> Vec<String> {
        match &self.correct {
            BlankAnswers::Single(_) => vec![SlotId::blank(1).to_string()],
            BlankAnswers::PerSlot(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort_by_key(|k| {
                    SlotId::parse(SlotKind::Blank, k).map_or(u32::MAX, |s| s.number())
                });
                keys.into_iter().cloned().collect()
            }
        }
    }

    pub fn acceptable_answers(&self, blank_id: &str) -> &[String] {
        match &self.correct {
            BlankAnswers::Single(list) => list,
            BlankAnswers::PerSlot(map) => map.get(blank_id).map_or(&[][..], Vec::as_slice),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dropdown {
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropdownQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub dropdowns: IndexMap<String, Dropdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingPair {
    #[serde(default, alias = "country")]
    pub left: String,
    #[serde(default, alias = "capital")]
    pub right: String,
    #[serde(default)]
    pub id: String,
}

impl MatchingPair {
    pub fn new(left: impl Into<String>, right: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            id: id.into(),
        }
    }
}

/// Pair id for the pair at `index`: `a`, `b`, `c`, ... up to `z`.
///
/// `None` past the 26th pair, which is also the most a matching question may hold.
pub fn pair_id(index: usize) -> Option<String> {
    let offset = u8::try_from(index).ok().filter(|&i| i < 26)?;
    Some(char::from(b'a' + offset).to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matching {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub pairs: Vec<MatchingPair>,
    /// Pair id to right-hand value. Derived from `pairs` but stored with them.
    #[serde(default)]
    pub correct: IndexMap<String, String>,
}

impl Matching {
    pub fn from_pairs(question: impl Into<String>, pairs: Vec<MatchingPair>) -> Self {
        let correct = pairs
            .iter()
            .map(|p| (p.id.clone(), p.right.clone()))
            .collect();
        Self {
            question: question.into(),
            pairs,
            correct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderItem {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reordering {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub items: Vec<ReorderItem>,
}

impl Reordering {
    /// Items in their correct sequence, ascending by `order`.
    pub fn canonical_order(&self) -> Vec<&ReorderItem> {
        let mut items: Vec<&ReorderItem> = self.items.iter().collect();
        items.sort_by_key(|item| item.order);
        items
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuestion {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingComprehension {
    #[serde(default)]
    pub passage: String,
    #[serde(default)]
    pub passage_id: String,
    #[serde(default)]
    pub questions: Vec<SubQuestion>,
}

/// Passage id assigned to a reading comprehension question.
pub fn passage_id(question_id: u32) -> String {
    format!("passage_{question_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn routes_on_type() {
        let q = Question::from_value(&json!({
            "id": 4,
            "type": "true_false",
            "question": "The earth is flat",
            "correct": 1
        }))
        .unwrap();
        assert_eq!(q.id, 4);
        assert!(q.enabled);
        assert_eq!(q.question_image_scale, 50);
        match q.kind {
            QuestionKind::TrueFalse(tf) => assert!(!tf.answer()),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn missing_type_reads_as_multiple_choice() {
        let q = Question::from_value(&json!({"id": 1, "question": "?", "options": ["a", "b"]}))
            .unwrap();
        assert_eq!(q.type_name(), "multiple_choice");
    }

    #[test]
    fn unknown_type_is_preserved() {
        let record = json!({
            "id": 9,
            "type": "hotspot",
            "lessonId": "L002",
            "enabled": false,
            "questionImageScale": 50,
            "regions": [{"x": 1, "y": 2}]
        });
        let q = Question::from_value(&record).unwrap();
        assert_eq!(q.type_name(), "hotspot");
        assert!(!q.enabled);
        assert_eq!(q.to_value().unwrap(), record);
    }

    #[test]
    fn absent_optionals_are_omitted() {
        let mut q = Question::new(
            3,
            QuestionKind::MultipleChoice(MultipleChoice {
                question: "Pick".into(),
                options: vec!["a".into(), "b".into()],
                correct: 1,
                option_images: None,
                option_image_scale: 50,
            }),
        );
        let value = q.to_value().unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("lessonId"));
        assert!(!obj.contains_key("questionImage"));
        assert!(!obj.contains_key("optionImages"));
        assert_eq!(obj["type"], "multiple_choice");

        q.lesson_id = Some("L001".into());
        assert_eq!(q.to_value().unwrap()["lessonId"], "L001");
    }

    #[test]
    fn fill_in_blank_shapes() {
        let legacy = Question::from_value(&json!({
            "id": 1, "type": "fill_in_blank", "question": "Capital of Italy?", "correct": ["Rome"]
        }))
        .unwrap();
        let QuestionKind::FillInBlank(legacy) = legacy.kind else {
            panic!("expected fill in blank");
        };
        assert!(!legacy.is_multi_blank());
        assert_eq!(legacy.blank_ids(), vec!["Q1"]);
        assert_eq!(legacy.acceptable_answers("Q1"), ["Rome"]);

        let multi = Question::from_value(&json!({
            "id": 2, "type": "fill_in_blank",
            "question": "_Q10_ _Q2_ _Q1_",
            "correct": {"Q10": ["ten"], "Q2": ["two"], "Q1": ["one"]}
        }))
        .unwrap();
        let QuestionKind::FillInBlank(multi) = multi.kind else {
            panic!("expected fill in blank");
        };
        assert!(multi.is_multi_blank());
        assert_eq!(multi.blank_count(), 3);
        assert_eq!(multi.blank_ids(), vec!["Q1", "Q2", "Q10"]);
        assert!(multi.acceptable_answers("Q5").is_empty());
    }

    #[test]
    fn legacy_matching_keys() {
        let q = Question::from_value(&json!({
            "id": 5, "type": "matching", "question": "Match",
            "pairs": [{"country": "Italy", "capital": "Rome", "id": "a"}],
            "correct": {"a": "Rome"}
        }))
        .unwrap();
        let value = q.to_value().unwrap();
        assert_eq!(value["pairs"][0], json!({"left": "Italy", "right": "Rome", "id": "a"}));
    }

    #[test]
    fn matching_derives_correct_map() {
        let m = Matching::from_pairs(
            "Match",
            vec![
                MatchingPair::new("Italy", "Rome", pair_id(0).unwrap()),
                MatchingPair::new("France", "Paris", pair_id(1).unwrap()),
            ],
        );
        assert_eq!(m.correct.get("a").map(String::as_str), Some("Rome"));
        assert_eq!(m.correct.get("b").map(String::as_str), Some("Paris"));
    }

    #[test]
    fn pair_ids_stop_at_z() {
        assert_eq!(pair_id(0).as_deref(), Some("a"));
        assert_eq!(pair_id(25).as_deref(), Some("z"));
        assert_eq!(pair_id(26), None);
        assert_eq!(pair_id(300), None);
    }

    #[test]
    fn reordering_canonical_order() {
        let r = Reordering {
            question: "Order".into(),
            items: vec![
                ReorderItem { text: "third".into(), order: 3 },
                ReorderItem { text: "first".into(), order: 1 },
                ReorderItem { text: "second".into(), order: 2 },
            ],
        };
        let texts: Vec<&str> = r.canonical_order().iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }

    #[test]
    fn image_paths_include_option_images() {
        let mut images = IndexMap::new();
        images.insert("0".to_string(), "images/geo/q1_option_0.png".to_string());
        let mut q = Question::new(
            1,
            QuestionKind::MultipleChoice(MultipleChoice {
                question: "Which flag?".into(),
                options: vec!["Option 0".into(), "Option 1".into()],
                correct: 0,
                option_images: Some(images),
                option_image_scale: 50,
            }),
        );
        q.question_image = Some("images/geo/q1_main.png".into());
        assert_eq!(
            q.image_paths(),
            ["images/geo/q1_main.png", "images/geo/q1_option_0.png"]
        );
    }

    #[test]
    fn scale_is_clamped() {
        assert_eq!(clamp_scale(10), 25);
        assert_eq!(clamp_scale(75), 75);
        assert_eq!(clamp_scale(500), 200);
    }
}
