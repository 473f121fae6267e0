//! Raw field values collected by an editing form, before they become a [`Question`].
//!
//! A draft carries indices as plain integers and leaves derived fields
//! (matching answers, sub-question ids, passage ids) to the build step, so a
//! form can hand over exactly what the author typed. Nothing is built until
//! the draft validates.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::question::{
    clamp_scale, pair_id, passage_id, BlankAnswers, Dropdown, DropdownQuestion, FillInBlank,
    Matching, MatchingPair, MultipleChoice, MultipleChoiceMultiple, Question, QuestionKind,
    ReadingComprehension, ReorderItem, Reordering, SubQuestion, TrueFalse,
};
use super::validate::{self, ValidationError};
use crate::constants::DEFAULT_IMAGE_SCALE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionDraft {
    MultipleChoice(ChoiceDraft),
    MultipleChoiceMultiple(MultiChoiceDraft),
    TrueFalse(TrueFalseDraft),
    FillInBlank(FillInBlankDraft),
    Dropdown(DropdownDraft),
    Matching(MatchingDraft),
    Reordering(ReorderingDraft),
    ReadingComprehension(ReadingComprehensionDraft),
}

/// Question image shared by every draft type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_image_scale: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceDraft {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_images: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_image_scale: Option<u32>,
    #[serde(flatten)]
    pub image: ImageDraft,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiChoiceDraft {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_images: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_image_scale: Option<u32>,
    #[serde(flatten)]
    pub image: ImageDraft,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrueFalseDraft {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub correct: i64,
    #[serde(flatten)]
    pub image: ImageDraft,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FillInBlankDraft {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub correct: BlankAnswers,
    #[serde(flatten)]
    pub image: ImageDraft,
}

/// One dropdown as entered: its options and the index of the right one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DropdownChoice {
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DropdownDraft {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub dropdowns: IndexMap<String, DropdownChoice>,
    #[serde(flatten)]
    pub image: ImageDraft,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchingDraft {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub pairs: Vec<MatchingPair>,
    #[serde(flatten)]
    pub image: ImageDraft,
}

impl MatchingDraft {
    /// Pairs from (left, right) rows, ids assigned `a`, `b`, `c`, ...
    ///
    /// Rows past the 26th get an empty id; validation rejects that many pairs.
    pub fn from_rows<L, R>(question: impl Into<String>, rows: impl IntoIterator<Item = (L, R)>) -> Self
    where
        L: Into<String>,
        R: Into<String>,
    {
        let pairs = rows
            .into_iter()
            .enumerate()
            .map(|(i, (left, right))| {
                MatchingPair::new(left, right, pair_id(i).unwrap_or_default())
            })
            .collect();
        Self {
            question: question.into(),
            pairs,
            image: ImageDraft::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReorderItemDraft {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReorderingDraft {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub items: Vec<ReorderItemDraft>,
    #[serde(flatten)]
    pub image: ImageDraft,
}

impl ReorderingDraft {
    /// One item per non-blank line, in the order given.
    pub fn from_lines(question: impl Into<String>, lines: &str) -> Self {
        let items = lines
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(i, line)| ReorderItemDraft {
                text: line.to_string(),
                order: Some(i as i64 + 1),
            })
            .collect();
        Self {
            question: question.into(),
            items,
            image: ImageDraft::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubQuestionDraft {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingComprehensionDraft {
    #[serde(default)]
    pub passage: String,
    #[serde(default)]
    pub questions: Vec<SubQuestionDraft>,
    #[serde(flatten)]
    pub image: ImageDraft,
}

// validated indices are in range and non-negative
fn index(value: i64) -> usize {
    usize::try_from(value).unwrap_or_default()
}

impl QuestionDraft {
    pub fn type_name(&self) -> &'static str {
        use crate::constants::*;
        match self {
            QuestionDraft::MultipleChoice(_) => MULTIPLE_CHOICE,
            QuestionDraft::MultipleChoiceMultiple(_) => MULTIPLE_CHOICE_MULTIPLE,
            QuestionDraft::TrueFalse(_) => TRUE_FALSE,
            QuestionDraft::FillInBlank(_) => FILL_IN_BLANK,
            QuestionDraft::Dropdown(_) => DROPDOWN,
            QuestionDraft::Matching(_) => MATCHING,
            QuestionDraft::Reordering(_) => REORDERING,
            QuestionDraft::ReadingComprehension(_) => READING_COMPREHENSION,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            QuestionDraft::MultipleChoice(d) => {
                validate::validate_multiple_choice(&d.question, &d.options, d.correct)
            }
            QuestionDraft::MultipleChoiceMultiple(d) => {
                validate::validate_multiple_choice_multiple(&d.question, &d.options, &d.correct)
            }
            QuestionDraft::TrueFalse(d) => validate::validate_true_false(&d.question, d.correct),
            QuestionDraft::FillInBlank(d) => {
                validate::validate_fill_in_blank(&d.question, &d.correct)
            }
            QuestionDraft::Dropdown(d) => validate::validate_dropdown(&d.question, &d.dropdowns),
            QuestionDraft::Matching(d) => validate::validate_matching(&d.question, &d.pairs),
            QuestionDraft::Reordering(d) => validate::validate_reordering(&d.question, &d.items),
            QuestionDraft::ReadingComprehension(d) => {
                validate::validate_reading_comprehension(&d.passage, &d.questions)
            }
        }
    }

    fn image(&self) -> &ImageDraft {
        match self {
            QuestionDraft::MultipleChoice(d) => &d.image,
            QuestionDraft::MultipleChoiceMultiple(d) => &d.image,
            QuestionDraft::TrueFalse(d) => &d.image,
            QuestionDraft::FillInBlank(d) => &d.image,
            QuestionDraft::Dropdown(d) => &d.image,
            QuestionDraft::Matching(d) => &d.image,
            QuestionDraft::Reordering(d) => &d.image,
            QuestionDraft::ReadingComprehension(d) => &d.image,
        }
    }

    fn image_mut(&mut self) -> &mut ImageDraft {
        match self {
            QuestionDraft::MultipleChoice(d) => &mut d.image,
            QuestionDraft::MultipleChoiceMultiple(d) => &mut d.image,
            QuestionDraft::TrueFalse(d) => &mut d.image,
            QuestionDraft::FillInBlank(d) => &mut d.image,
            QuestionDraft::Dropdown(d) => &mut d.image,
            QuestionDraft::Matching(d) => &mut d.image,
            QuestionDraft::Reordering(d) => &mut d.image,
            QuestionDraft::ReadingComprehension(d) => &mut d.image,
        }
    }

    /// Validate, then build the question that will be stored under `id`.
    pub fn into_question(
        self,
        id: u32,
        lesson_id: Option<String>,
    ) -> Result<Question, ValidationError> {
        self.validate()?;

        let image = self.image().clone();
        let kind = match self {
            QuestionDraft::MultipleChoice(d) => QuestionKind::MultipleChoice(MultipleChoice {
                question: d.question,
                options: d.options,
                correct: index(d.correct),
                option_images: d.option_images,
                option_image_scale: clamp_scale(d.option_image_scale.unwrap_or(DEFAULT_IMAGE_SCALE)),
            }),
            QuestionDraft::MultipleChoiceMultiple(d) => {
                let mut correct: Vec<usize> = d.correct.into_iter().map(index).collect();
                correct.sort_unstable();
                QuestionKind::MultipleChoiceMultiple(MultipleChoiceMultiple {
                    question: d.question,
                    options: d.options,
                    correct,
                    option_images: d.option_images,
                    option_image_scale: clamp_scale(
                        d.option_image_scale.unwrap_or(DEFAULT_IMAGE_SCALE),
                    ),
                })
            }
            QuestionDraft::TrueFalse(d) => QuestionKind::TrueFalse(TrueFalse {
                question: d.question,
                correct: u8::from(d.correct == 1),
            }),
            QuestionDraft::FillInBlank(d) => QuestionKind::FillInBlank(FillInBlank {
                question: d.question,
                correct: d.correct,
            }),
            QuestionDraft::Dropdown(d) => QuestionKind::Dropdown(DropdownQuestion {
                question: d.question,
                dropdowns: d
                    .dropdowns
                    .into_iter()
                    .map(|(key, choice)| {
                        let dropdown = Dropdown {
                            options: choice.options,
                            correct: index(choice.correct),
                        };
                        (key, dropdown)
                    })
                    .collect(),
            }),
            QuestionDraft::Matching(d) => {
                QuestionKind::Matching(Matching::from_pairs(d.question, d.pairs))
            }
            QuestionDraft::Reordering(d) => QuestionKind::Reordering(Reordering {
                question: d.question,
                items: d
                    .items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| ReorderItem {
                        text: item.text,
                        order: item.order.unwrap_or(i as i64 + 1),
                    })
                    .collect(),
            }),
            QuestionDraft::ReadingComprehension(d) => {
                QuestionKind::ReadingComprehension(ReadingComprehension {
                    passage: d.passage,
                    passage_id: passage_id(id),
                    questions: d
                        .questions
                        .into_iter()
                        .enumerate()
                        .map(|(i, sub)| SubQuestion {
                            id: format!("q{}", i + 1),
                            question: sub.question,
                            options: sub.options,
                            correct: index(sub.correct.unwrap_or_default()),
                        })
                        .collect(),
                })
            }
        };

        Ok(Question {
            id,
            lesson_id,
            enabled: true,
            question_image: image.question_image,
            question_image_scale: clamp_scale(
                image.question_image_scale.unwrap_or(DEFAULT_IMAGE_SCALE),
            ),
            kind,
        })
    }

    /// The draft a form would show when editing `question`. Unknown types have none.
    pub fn from_question(question: &Question) -> Option<Self> {
        let image = ImageDraft {
            question_image: question.question_image.clone(),
            question_image_scale: Some(question.question_image_scale),
        };

        let mut draft = match &question.kind {
            QuestionKind::MultipleChoice(q) => QuestionDraft::MultipleChoice(ChoiceDraft {
                question: q.question.clone(),
                options: q.options.clone(),
                correct: q.correct as i64,
                option_images: q.option_images.clone(),
                option_image_scale: Some(q.option_image_scale),
                image: ImageDraft::default(),
            }),
            QuestionKind::MultipleChoiceMultiple(q) => {
                QuestionDraft::MultipleChoiceMultiple(MultiChoiceDraft {
                    question: q.question.clone(),
                    options: q.options.clone(),
                    correct: q.correct.iter().map(|&c| c as i64).collect(),
                    option_images: q.option_images.clone(),
                    option_image_scale: Some(q.option_image_scale),
                    image: ImageDraft::default(),
                })
            }
            QuestionKind::TrueFalse(q) => QuestionDraft::TrueFalse(TrueFalseDraft {
                question: q.question.clone(),
                correct: i64::from(q.correct),
                image: ImageDraft::default(),
            }),
            QuestionKind::FillInBlank(q) => QuestionDraft::FillInBlank(FillInBlankDraft {
                question: q.question.clone(),
                correct: q.correct.clone(),
                image: ImageDraft::default(),
            }),
            QuestionKind::Dropdown(q) => QuestionDraft::Dropdown(DropdownDraft {
                question: q.question.clone(),
                dropdowns: q
                    .dropdowns
                    .iter()
                    .map(|(key, d)| {
                        let choice = DropdownChoice {
                            options: d.options.clone(),
                            correct: d.correct as i64,
                        };
                        (key.clone(), choice)
                    })
                    .collect(),
                image: ImageDraft::default(),
            }),
            QuestionKind::Matching(q) => QuestionDraft::Matching(MatchingDraft {
                question: q.question.clone(),
                pairs: q.pairs.clone(),
                image: ImageDraft::default(),
            }),
            QuestionKind::Reordering(q) => QuestionDraft::Reordering(ReorderingDraft {
                question: q.question.clone(),
                items: q
                    .items
                    .iter()
                    .map(|item| ReorderItemDraft {
                        text: item.text.clone(),
                        order: Some(item.order),
                    })
                    .collect(),
                image: ImageDraft::default(),
            }),
            QuestionKind::ReadingComprehension(q) => {
                QuestionDraft::ReadingComprehension(ReadingComprehensionDraft {
                    passage: q.passage.clone(),
                    questions: q
                        .questions
                        .iter()
                        .map(|sub| SubQuestionDraft {
                            question: sub.question.clone(),
                            options: sub.options.clone(),
                            correct: Some(sub.correct as i64),
                        })
                        .collect(),
                    image: ImageDraft::default(),
                })
            }
            QuestionKind::Unknown { .. } => return None,
        };

        *draft.image_mut() = image;
        Some(draft)
    }
}

impl Question {
    /// Re-run the validator for this question's type over its stored fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match QuestionDraft::from_question(self) {
            Some(draft) => draft.validate(),
            None => Err(ValidationError::UnknownType {
                type_name: self.type_name().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_from_tagged_form_fields() {
        let draft: QuestionDraft = serde_json::from_value(json!({
            "type": "multiple_choice",
            "question": "Capital of France?",
            "options": ["Rome", "Paris"],
            "correct": 1,
            "questionImage": "images/geo/q1_main.png"
        }))
        .unwrap();
        let QuestionDraft::MultipleChoice(choice) = &draft else {
            panic!("expected multiple choice draft");
        };
        assert_eq!(choice.correct, 1);
        assert_eq!(
            choice.image.question_image.as_deref(),
            Some("images/geo/q1_main.png")
        );
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn invalid_draft_builds_nothing() {
        let draft = QuestionDraft::MultipleChoice(ChoiceDraft {
            question: "Pick".into(),
            options: vec!["a".into(), "b".into()],
            correct: 2,
            ..Default::default()
        });
        let err = draft.into_question(1, None).unwrap_err();
        assert_eq!(err.to_string(), "Correct index must be between 0 and 1");
    }

    #[test]
    fn matching_rows_get_letter_ids() {
        let draft = MatchingDraft::from_rows("Match", [("Italy", "Rome"), ("France", "Paris")]);
        let q = QuestionDraft::Matching(draft)
            .into_question(7, Some("L001".into()))
            .unwrap();
        let QuestionKind::Matching(m) = &q.kind else {
            panic!("expected matching");
        };
        assert_eq!(m.pairs[1].id, "b");
        assert_eq!(m.correct.get("a").map(String::as_str), Some("Rome"));
        assert_eq!(q.lesson_id.as_deref(), Some("L001"));
    }

    #[test]
    fn matching_rows_past_z_are_rejected() {
        let rows: Vec<(String, String)> = (0..27)
            .map(|i| (format!("l{i}"), format!("r{i}")))
            .collect();
        let draft = MatchingDraft::from_rows("Match", rows);
        assert_eq!(draft.pairs[25].id, "z");
        assert_eq!(draft.pairs[26].id, "");
        assert_eq!(
            QuestionDraft::Matching(draft).validate(),
            Err(ValidationError::TooManyPairs { found: 27, max: 26 })
        );
    }

    #[test]
    fn reordering_from_lines() {
        let draft = ReorderingDraft::from_lines("Order these", "first\n\n  second \nthird\n");
        assert_eq!(draft.items.len(), 3);
        assert_eq!(draft.items[1].text, "second");
        assert_eq!(draft.items[2].order, Some(3));
    }

    #[test]
    fn reading_comprehension_ids_are_derived() {
        let draft = QuestionDraft::ReadingComprehension(ReadingComprehensionDraft {
            passage: "Rome was not built in a day.".into(),
            questions: vec![
                SubQuestionDraft {
                    question: "Was Rome built in a day?".into(),
                    options: vec!["Yes".into(), "No".into()],
                    correct: Some(1),
                },
                SubQuestionDraft {
                    question: "Which city?".into(),
                    options: vec!["Rome".into(), "Milan".into()],
                    correct: Some(0),
                },
            ],
            image: ImageDraft::default(),
        });
        let q = draft.into_question(12, None).unwrap();
        let QuestionKind::ReadingComprehension(rc) = &q.kind else {
            panic!("expected reading comprehension");
        };
        assert_eq!(rc.passage_id, "passage_12");
        assert_eq!(rc.questions[1].id, "q2");
    }

    #[test]
    fn image_scale_is_clamped_on_build() {
        let draft = QuestionDraft::TrueFalse(TrueFalseDraft {
            question: "Water is wet".into(),
            correct: 0,
            image: ImageDraft {
                question_image: None,
                question_image_scale: Some(900),
            },
        });
        assert_eq!(draft.into_question(1, None).unwrap().question_image_scale, 200);
    }

    #[test]
    fn stored_question_round_trips_through_draft() {
        let mut dropdowns = IndexMap::new();
        dropdowns.insert(
            "DD1".to_string(),
            DropdownChoice {
                options: vec!["Rome".into(), "Paris".into(), "Berlin".into()],
                correct: 0,
            },
        );
        let built = QuestionDraft::Dropdown(DropdownDraft {
            question: "The capital of Italy is [DD1].".into(),
            dropdowns,
            image: ImageDraft::default(),
        })
        .into_question(3, None)
        .unwrap();

        let draft = QuestionDraft::from_question(&built).unwrap();
        assert_eq!(draft.clone().into_question(3, None).unwrap(), built);
        assert!(built.validate().is_ok());
    }

    #[test]
    fn unknown_questions_have_no_draft() {
        let q = Question::from_value(&json!({"id": 1, "type": "hotspot"})).unwrap();
        assert!(QuestionDraft::from_question(&q).is_none());
        assert_eq!(
            q.validate().unwrap_err().to_string(),
            "Unknown question type: hotspot"
        );
    }
}
