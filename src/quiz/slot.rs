//! Placeholder slots embedded in question text.
//!
//! Fill-in-blank questions mark blanks with `_Q<n>_` and dropdown questions
//! mark selections with `[DD<n>]`. Text is scanned once into [`SlotId`]s and
//! every later check (mode, numbering, reconciliation against the answer map)
//! works on that list.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use thiserror::Error;

use super::draft::DropdownChoice;
use super::question::BlankAnswers;
use crate::constants::{
    BLANK_ID_PREFIX, BLANK_PLACEHOLDER_PATTERN, BLANK_PLACEHOLDER_PREFIX, BLANK_PLACEHOLDER_SUFFIX,
    DROPDOWN_ID_PREFIX, DROPDOWN_PLACEHOLDER_PATTERN, DROPDOWN_PLACEHOLDER_PREFIX,
    DROPDOWN_PLACEHOLDER_SUFFIX, MAX_BLANKS_FILL, MAX_DROPDOWNS, MAX_OPTIONS_PER_DROPDOWN,
    MIN_ANSWERS_FILL, MIN_DROPDOWNS, MIN_OPTIONS_PER_DROPDOWN,
};

static BLANK_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(BLANK_PLACEHOLDER_PATTERN).expect("blank placeholder regex is invalid")
});

static DROPDOWN_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(DROPDOWN_PLACEHOLDER_PATTERN).expect("dropdown placeholder regex is invalid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotKind {
    Blank,
    Dropdown,
}

impl SlotKind {
    fn pattern(self) -> &'static Regex {
        match self {
            SlotKind::Blank => &BLANK_PLACEHOLDER,
            SlotKind::Dropdown => &DROPDOWN_PLACEHOLDER,
        }
    }

    /// Prefix of the answer-map key, `Q` or `DD`.
    pub fn id_prefix(self) -> &'static str {
        match self {
            SlotKind::Blank => BLANK_ID_PREFIX,
            SlotKind::Dropdown => DROPDOWN_ID_PREFIX,
        }
    }

    /// Fewest placeholders the text may carry. Blanks accept zero (legacy single-blank mode).
    pub fn min_slots(self) -> usize {
        match self {
            SlotKind::Blank => 0,
            SlotKind::Dropdown => MIN_DROPDOWNS,
        }
    }

    pub fn max_slots(self) -> usize {
        match self {
            SlotKind::Blank => MAX_BLANKS_FILL,
            SlotKind::Dropdown => MAX_DROPDOWNS,
        }
    }

    fn noun(self) -> &'static str {
        match self {
            SlotKind::Blank => "blank",
            SlotKind::Dropdown => "dropdown",
        }
    }
}

/// One placeholder, identified by kind and its numeric suffix.
///
/// Ordering is numeric, so `Q2` sorts before `Q10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId {
    kind: SlotKind,
    number: u32,
}

impl SlotId {
    pub fn new(kind: SlotKind, number: u32) -> Self {
        Self { kind, number }
    }

    pub fn blank(number: u32) -> Self {
        Self::new(SlotKind::Blank, number)
    }

    pub fn dropdown(number: u32) -> Self {
        Self::new(SlotKind::Dropdown, number)
    }

    /// Parse an answer-map key such as `Q3` or `DD1`.
    ///
    /// Only the canonical spelling is accepted: `Q01` is not `Q1`.
    pub fn parse(kind: SlotKind, key: &str) -> Option<Self> {
        let digits = key.strip_prefix(kind.id_prefix())?;
        parse_number(digits).map(|number| Self::new(kind, number))
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// The token as it appears in question text: `_Q3_` or `[DD1]`.
    pub fn placeholder(&self) -> String {
        match self.kind {
            SlotKind::Blank => format!(
                "{BLANK_PLACEHOLDER_PREFIX}{}{BLANK_PLACEHOLDER_SUFFIX}",
                self.number
            ),
            SlotKind::Dropdown => format!(
                "{DROPDOWN_PLACEHOLDER_PREFIX}{}{DROPDOWN_PLACEHOLDER_SUFFIX}",
                self.number
            ),
        }
    }
}

// ASCII digits without leading zeros, within u32
fn parse_number(digits: &str) -> Option<u32> {
    if digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
        || (digits.len() > 1 && digits.starts_with('0'))
    {
        return None;
    }
    digits.parse().ok()
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.id_prefix(), self.number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMode {
    /// No placeholders: a fill-in-blank question with a flat answer list.
    Single,
    /// One or more placeholders: answers keyed by slot id.
    Multi,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    #[error("{}", no_placeholders_message(.kind))]
    NoPlaceholders { kind: SlotKind },

    #[error("Invalid placeholder '{token}' (use {})", first_placeholder(.kind))]
    InvalidPlaceholder { kind: SlotKind, token: String },

    #[error("Too many {}s: found {found}, maximum is {max}", .kind.noun())]
    TooManySlots {
        kind: SlotKind,
        found: usize,
        max: usize,
    },

    #[error("Placeholders must be numbered consecutively from 1: {} is missing", .missing.placeholder())]
    NonConsecutive { missing: SlotId },

    #[error("{}", missing_entry_message(.slot))]
    MissingEntry { slot: SlotId },

    #[error("{}", placeholder_not_found_message(.slot))]
    PlaceholderNotFound { slot: SlotId },

    #[error("Invalid {} key '{key}' (expected {}1, {}2, ...)", .kind.noun(), .kind.id_prefix(), .kind.id_prefix())]
    InvalidKey { kind: SlotKind, key: String },

    #[error("Need at least {} acceptable answer", MIN_ANSWERS_FILL)]
    NoAcceptableAnswers,

    #[error("Answer {index} is empty")]
    EmptyAnswer { index: usize },

    #[error("Blank {}: need at least {} acceptable answer", .slot.placeholder(), MIN_ANSWERS_FILL)]
    NoAcceptableAnswersFor { slot: SlotId },

    #[error("Blank {}: answer {index} is empty", .slot.placeholder())]
    EmptyAnswerFor { slot: SlotId, index: usize },

    #[error(
        "Dropdown {} needs {}-{} options (found {found})",
        .slot.placeholder(),
        MIN_OPTIONS_PER_DROPDOWN,
        MAX_OPTIONS_PER_DROPDOWN
    )]
    DropdownOptionCount { slot: SlotId, found: usize },

    #[error("Dropdown {}: option {index} is empty", .slot.placeholder())]
    EmptyDropdownOption { slot: SlotId, index: usize },

    #[error("Dropdown {}: correct index must be between 0 and {max}", .slot.placeholder())]
    DropdownCorrectOutOfRange { slot: SlotId, max: usize },
}

fn first_placeholder(kind: &SlotKind) -> String {
    SlotId::new(*kind, 1).placeholder()
}

fn no_placeholders_message(kind: &SlotKind) -> String {
    format!(
        "No {} placeholder found in question text (use {})",
        kind.noun(),
        first_placeholder(kind)
    )
}

fn missing_entry_message(slot: &SlotId) -> String {
    match slot.kind {
        SlotKind::Blank => format!("Placeholder {} has no acceptable answers", slot.placeholder()),
        SlotKind::Dropdown => format!("Placeholder {} has no dropdown options", slot.placeholder()),
    }
}

fn placeholder_not_found_message(slot: &SlotId) -> String {
    match slot.kind {
        SlotKind::Blank => format!(
            "Answers provided for {slot} but no placeholder {} in question text",
            slot.placeholder()
        ),
        SlotKind::Dropdown => format!(
            "Options provided for {slot} but placeholder {} not found in question text",
            slot.placeholder()
        ),
    }
}

/// Slot ids referenced by a piece of question text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotScan {
    kind: SlotKind,
    // first appearance, no duplicates
    slots: Vec<SlotId>,
    // placeholder tokens whose number is not a canonical u32, e.g. `_Q01_`
    invalid: Vec<String>,
}

impl SlotScan {
    pub fn new(kind: SlotKind, text: &str) -> Self {
        let mut seen = HashSet::new();
        let mut slots = Vec::new();
        let mut invalid = Vec::new();
        for caps in kind.pattern().captures_iter(text) {
            match parse_number(&caps[1]) {
                Some(number) => {
                    let slot = SlotId::new(kind, number);
                    if seen.insert(slot) {
                        slots.push(slot);
                    }
                }
                None => invalid.push(caps[0].to_string()),
            }
        }
        Self {
            kind,
            slots,
            invalid,
        }
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    /// Slots in the order they first appear in the text.
    pub fn in_text_order(&self) -> &[SlotId] {
        &self.slots
    }

    /// Slots sorted by number, the order used for processing and display.
    pub fn sorted(&self) -> Vec<SlotId> {
        let mut slots = self.slots.clone();
        slots.sort();
        slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, slot: &SlotId) -> bool {
        self.slots.contains(slot)
    }

    /// Fails on the first placeholder whose number could not be read.
    pub fn check_placeholders(&self) -> Result<(), SlotError> {
        match self.invalid.first() {
            Some(token) => Err(SlotError::InvalidPlaceholder {
                kind: self.kind,
                token: token.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Any placeholder, readable or not, puts the text in multi-slot mode.
    pub fn mode(&self) -> SlotMode {
        if self.slots.is_empty() && self.invalid.is_empty() {
            SlotMode::Single
        } else {
            SlotMode::Multi
        }
    }

    /// Slot numbers must be exactly `1..=N`, whatever order they were typed in.
    pub fn check_numbering(&self) -> Result<(), SlotError> {
        let numbers: HashSet<u32> = self.slots.iter().map(SlotId::number).collect();
        match (1..=self.slots.len() as u32).find(|n| !numbers.contains(n)) {
            Some(missing) => Err(SlotError::NonConsecutive {
                missing: SlotId::new(self.kind, missing),
            }),
            None => Ok(()),
        }
    }
}

/// Slot ids referenced by `text`, sorted numerically.
pub fn extract_slot_ids(kind: SlotKind, text: &str) -> Vec<SlotId> {
    SlotScan::new(kind, text).sorted()
}

/// Match the slots found in text against a per-slot answer map.
///
/// Checks run in a fixed order and the first failure is returned: unreadable
/// placeholders, slot count bounds, consecutive numbering, every text slot present in the map, every
/// map key present in the text. On success the map entries are returned in
/// slot order.
pub fn reconcile<'a, V>(
    scan: &SlotScan,
    entries: &'a IndexMap<String, V>,
) -> Result<Vec<(SlotId, &'a V)>, SlotError> {
    let kind = scan.kind();

    scan.check_placeholders()?;
    if scan.len() < kind.min_slots() {
        return Err(SlotError::NoPlaceholders { kind });
    }
    if scan.len() > kind.max_slots() {
        return Err(SlotError::TooManySlots {
            kind,
            found: scan.len(),
            max: kind.max_slots(),
        });
    }
    scan.check_numbering()?;

    let mut matched = Vec::with_capacity(scan.len());
    for slot in scan.sorted() {
        let entry = entries
            .get(&slot.to_string())
            .ok_or(SlotError::MissingEntry { slot })?;
        matched.push((slot, entry));
    }

    for key in entries.keys() {
        let slot = SlotId::parse(kind, key).ok_or_else(|| SlotError::InvalidKey {
            kind,
            key: key.clone(),
        })?;
        if !scan.contains(&slot) {
            return Err(SlotError::PlaceholderNotFound { slot });
        }
    }

    Ok(matched)
}

/// Validate fill-in-blank answers against the blanks in `text`.
pub fn check_blanks(text: &str, answers: &BlankAnswers) -> Result<(), SlotError> {
    let scan = SlotScan::new(SlotKind::Blank, text);
    scan.check_placeholders()?;

    match answers {
        BlankAnswers::Single(list) => {
            if scan.mode() == SlotMode::Multi {
                // text has placeholders but the answers are a flat list
                let first = scan.sorted()[0];
                return Err(SlotError::MissingEntry { slot: first });
            }
            check_answer_list(list, None)
        }
        BlankAnswers::PerSlot(map) => {
            if scan.mode() == SlotMode::Single && map.is_empty() {
                return Err(SlotError::NoAcceptableAnswers);
            }
            for (slot, list) in reconcile(&scan, map)? {
                check_answer_list(list, Some(slot))?;
            }
            Ok(())
        }
    }
}

fn check_answer_list(answers: &[String], slot: Option<SlotId>) -> Result<(), SlotError> {
    if answers.len() < MIN_ANSWERS_FILL {
        return Err(match slot {
            Some(slot) => SlotError::NoAcceptableAnswersFor { slot },
            None => SlotError::NoAcceptableAnswers,
        });
    }
    match answers.iter().position(|a| a.trim().is_empty()) {
        Some(i) => Err(match slot {
            Some(slot) => SlotError::EmptyAnswerFor { slot, index: i + 1 },
            None => SlotError::EmptyAnswer { index: i + 1 },
        }),
        None => Ok(()),
    }
}

/// Validate dropdown definitions against the `[DD<n>]` placeholders in `text`.
pub fn check_dropdowns(
    text: &str,
    dropdowns: &IndexMap<String, DropdownChoice>,
) -> Result<(), SlotError> {
    let scan = SlotScan::new(SlotKind::Dropdown, text);

    for (slot, choice) in reconcile(&scan, dropdowns)? {
        let found = choice.options.len();
        if !(MIN_OPTIONS_PER_DROPDOWN..=MAX_OPTIONS_PER_DROPDOWN).contains(&found) {
            return Err(SlotError::DropdownOptionCount { slot, found });
        }
        if let Some(index) = choice.options.iter().position(|o| o.trim().is_empty()) {
            return Err(SlotError::EmptyDropdownOption { slot, index });
        }
        if choice.correct < 0 || choice.correct >= found as i64 {
            return Err(SlotError::DropdownCorrectOutOfRange {
                slot,
                max: found - 1,
            });
        }
    }
    Ok(())
}

/// What a [`SlotSections::sync`] call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionChanges {
    pub added: Vec<SlotId>,
    pub removed: Vec<SlotId>,
}

impl SectionChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Per-slot entry state of an editing surface, kept in step with the text.
///
/// Entries are created for placeholders as they are typed and dropped when
/// their placeholder disappears. When the text has no placeholders at all the
/// first slot's entry survives, so a fill-in-blank question falls back to
/// single-blank mode without losing what the author already entered.
#[derive(Debug, Clone)]
pub struct SlotSections<T> {
    kind: SlotKind,
    entries: IndexMap<SlotId, T>,
}

impl<T: Default> SlotSections<T> {
    /// Starts with a single entry for slot 1.
    pub fn new(kind: SlotKind) -> Self {
        let mut entries = IndexMap::new();
        entries.insert(SlotId::new(kind, 1), T::default());
        Self { kind, entries }
    }

    pub fn sync(&mut self, text: &str) -> SectionChanges {
        let scan = SlotScan::new(self.kind, text);
        let mut changes = SectionChanges::default();

        for slot in scan.in_text_order() {
            if !self.entries.contains_key(slot) {
                self.entries.insert(*slot, T::default());
                changes.added.push(*slot);
            }
        }

        if scan.is_empty() {
            let first = SlotId::new(self.kind, 1);
            if !self.entries.contains_key(&first) {
                // keep the lowest entry's content under slot 1
                let lowest = self.entries.keys().min().copied();
                let value = lowest
                    .and_then(|slot| self.entries.shift_remove(&slot).map(|v| (slot, v)))
                    .map(|(slot, v)| {
                        changes.removed.push(slot);
                        v
                    })
                    .unwrap_or_default();
                self.entries.insert(first, value);
                changes.added.push(first);
            }
            self.retain(|slot| *slot == first, &mut changes);
        } else {
            self.retain(|slot| scan.contains(slot), &mut changes);
        }

        self.entries.sort_keys();
        changes
    }

    fn retain(&mut self, keep: impl Fn(&SlotId) -> bool, changes: &mut SectionChanges) {
        let removed: Vec<SlotId> = self.entries.keys().filter(|s| !keep(s)).copied().collect();
        for slot in removed {
            self.entries.shift_remove(&slot);
            changes.removed.push(slot);
        }
    }
}

impl<T> SlotSections<T> {
    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    pub fn ids(&self) -> Vec<SlotId> {
        self.entries.keys().copied().collect()
    }

    pub fn get(&self, slot: &SlotId) -> Option<&T> {
        self.entries.get(slot)
    }

    pub fn get_mut(&mut self, slot: &SlotId) -> Option<&mut T> {
        self.entries.get_mut(slot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SlotSections<Vec<String>> {
    /// Answers for the current text: a flat list without placeholders, a map otherwise.
    pub fn blank_answers(&self, text: &str) -> BlankAnswers {
        let scan = SlotScan::new(SlotKind::Blank, text);
        if scan.is_empty() {
            let first = SlotId::blank(1);
            return BlankAnswers::Single(self.entries.get(&first).cloned().unwrap_or_default());
        }
        BlankAnswers::PerSlot(
            scan.sorted()
                .into_iter()
                .filter_map(|slot| Some((slot.to_string(), self.entries.get(&slot)?.clone())))
                .collect(),
        )
    }
}

impl SlotSections<DropdownChoice> {
    /// Dropdown definitions for the placeholders present in `text`.
    pub fn dropdowns(&self, text: &str) -> IndexMap<String, DropdownChoice> {
        SlotScan::new(SlotKind::Dropdown, text)
            .sorted()
            .into_iter()
            .filter_map(|slot| Some((slot.to_string(), self.entries.get(&slot)?.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn per_slot(entries: &[(&str, &[&str])]) -> BlankAnswers {
        BlankAnswers::PerSlot(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
                .collect(),
        )
    }

    fn choice(options: &[&str], correct: i64) -> DropdownChoice {
        DropdownChoice {
            options: options.iter().map(|s| s.to_string()).collect(),
            correct,
        }
    }

    #[test]
    fn extraction_sorts_numerically() {
        let ids = extract_slot_ids(SlotKind::Blank, "_Q3_ then _Q1_ then _Q2_ and _Q1_ again");
        let names: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, ["Q1", "Q2", "Q3"]);
    }

    #[test]
    fn scan_keeps_first_appearance_order() {
        let scan = SlotScan::new(SlotKind::Blank, "_Q2_ _Q1_ _Q2_");
        assert_eq!(scan.in_text_order(), &[SlotId::blank(2), SlotId::blank(1)]);
        assert_eq!(scan.len(), 2);
    }

    #[test]
    fn two_sorts_before_ten() {
        let ids = extract_slot_ids(SlotKind::Dropdown, "[DD10] [DD2] [DD1]");
        assert_eq!(
            ids,
            vec![SlotId::dropdown(1), SlotId::dropdown(2), SlotId::dropdown(10)]
        );
    }

    #[test]
    fn slot_id_parse_rejects_malformed_keys() {
        assert_eq!(SlotId::parse(SlotKind::Blank, "Q7"), Some(SlotId::blank(7)));
        assert_eq!(SlotId::parse(SlotKind::Blank, "Q"), None);
        assert_eq!(SlotId::parse(SlotKind::Blank, "Q1a"), None);
        assert_eq!(SlotId::parse(SlotKind::Blank, "DD1"), None);
        assert_eq!(SlotId::parse(SlotKind::Dropdown, "DD3"), Some(SlotId::dropdown(3)));
    }

    #[test]
    fn placeholder_tokens() {
        assert_eq!(SlotId::blank(4).placeholder(), "_Q4_");
        assert_eq!(SlotId::dropdown(2).placeholder(), "[DD2]");
    }

    #[test]
    fn gap_in_numbering_is_rejected_whatever_the_answers() {
        let text = "Fill _Q1_ and _Q3_.";
        for answers in [
            per_slot(&[("Q1", &["a"]), ("Q3", &["c"])]),
            per_slot(&[("Q1", &["a"])]),
            per_slot(&[]),
        ] {
            let err = check_blanks(text, &answers).unwrap_err();
            assert_eq!(
                err,
                SlotError::NonConsecutive {
                    missing: SlotId::blank(2)
                }
            );
        }
    }

    #[test]
    fn out_of_order_typing_is_allowed() {
        let answers = per_slot(&[("Q1", &["one"]), ("Q2", &["two"])]);
        assert!(check_blanks("_Q2_ comes before _Q1_", &answers).is_ok());
    }

    #[test]
    fn extra_answer_key_is_reported() {
        let answers = per_slot(&[("Q1", &["a"]), ("Q2", &["b"])]);
        let err = check_blanks("Only _Q1_ here", &answers).unwrap_err();
        assert_eq!(
            err,
            SlotError::PlaceholderNotFound {
                slot: SlotId::blank(2)
            }
        );
        assert!(err.to_string().contains("Q2"));
        assert!(err.to_string().contains("no placeholder"));
    }

    #[test]
    fn missing_answer_key_is_reported() {
        let answers = per_slot(&[("Q1", &["a"])]);
        let err = check_blanks("_Q1_ and _Q2_", &answers).unwrap_err();
        assert_eq!(
            err,
            SlotError::MissingEntry {
                slot: SlotId::blank(2)
            }
        );
    }

    #[test]
    fn legacy_mode_needs_one_answer() {
        let err = check_blanks("The capital of Italy is ___", &BlankAnswers::Single(vec![]))
            .unwrap_err();
        assert_eq!(err, SlotError::NoAcceptableAnswers);
        assert_eq!(err.to_string(), "Need at least 1 acceptable answer");

        let ok = BlankAnswers::Single(vec!["Rome".into(), "roma".into()]);
        assert!(check_blanks("The capital of Italy is ___", &ok).is_ok());

        let blank = BlankAnswers::Single(vec!["Rome".into(), "  ".into()]);
        assert_eq!(
            check_blanks("The capital of Italy is ___", &blank).unwrap_err(),
            SlotError::EmptyAnswer { index: 2 }
        );
    }

    #[test]
    fn flat_list_with_placeholders_is_rejected() {
        let answers = BlankAnswers::Single(vec!["Rome".into()]);
        assert!(matches!(
            check_blanks("Capital: _Q1_", &answers),
            Err(SlotError::MissingEntry { .. })
        ));
    }

    #[test]
    fn per_slot_answers_checked_individually() {
        let answers = per_slot(&[("Q1", &["a"]), ("Q2", &[])]);
        assert_eq!(
            check_blanks("_Q1_ _Q2_", &answers).unwrap_err(),
            SlotError::NoAcceptableAnswersFor {
                slot: SlotId::blank(2)
            }
        );
    }

    #[test]
    fn blank_cap_is_enforced() {
        let text: String = (1..=11).map(|n| format!("_Q{n}_ ")).collect();
        let answers = BlankAnswers::PerSlot(
            (1..=11)
                .map(|n| (format!("Q{n}"), vec!["x".to_string()]))
                .collect(),
        );
        assert_eq!(
            check_blanks(&text, &answers).unwrap_err(),
            SlotError::TooManySlots {
                kind: SlotKind::Blank,
                found: 11,
                max: 10
            }
        );
    }

    #[test]
    fn invalid_answer_key() {
        let answers = per_slot(&[("Q1", &["a"]), ("blank", &["b"])]);
        assert!(matches!(
            check_blanks("_Q1_", &answers),
            Err(SlotError::InvalidKey { .. })
        ));
    }

    #[test]
    fn oversized_placeholder_number_is_reported() {
        let err = check_blanks("_Q1_ and _Q99999999999_", &per_slot(&[("Q1", &["a"])]))
            .unwrap_err();
        assert_eq!(
            err,
            SlotError::InvalidPlaceholder {
                kind: SlotKind::Blank,
                token: "_Q99999999999_".into()
            }
        );
        assert!(err.to_string().contains("_Q1_"));

        // an unreadable placeholder is still a placeholder, so a flat list does not pass either
        assert!(matches!(
            check_blanks("_Q99999999999_", &BlankAnswers::Single(vec!["x".into()])),
            Err(SlotError::InvalidPlaceholder { .. })
        ));
        let scan = SlotScan::new(SlotKind::Blank, "_Q99999999999_");
        assert_eq!(scan.mode(), SlotMode::Multi);
        assert!(scan.is_empty());

        let mut dropdowns = IndexMap::new();
        dropdowns.insert("DD1".to_string(), choice(&["a", "b", "c"], 0));
        assert!(matches!(
            check_dropdowns("[DD1] [DD4294967296]", &dropdowns),
            Err(SlotError::InvalidPlaceholder { .. })
        ));
    }

    #[test]
    fn only_ascii_digits_form_placeholders() {
        // Arabic-Indic one is text, not a blank
        let text = "_Q\u{0661}_";
        assert!(extract_slot_ids(SlotKind::Blank, text).is_empty());
        assert_eq!(SlotScan::new(SlotKind::Blank, text).mode(), SlotMode::Single);
        assert!(check_blanks(text, &BlankAnswers::Single(vec!["x".into()])).is_ok());
        assert_eq!(SlotId::parse(SlotKind::Blank, "Q\u{0661}"), None);
    }

    #[test]
    fn leading_zeros_are_not_slot_ids() {
        assert_eq!(SlotId::parse(SlotKind::Blank, "Q01"), None);
        assert_eq!(SlotId::parse(SlotKind::Dropdown, "DD007"), None);

        let err = check_blanks("_Q1_", &per_slot(&[("Q1", &["a"]), ("Q01", &["b"])])).unwrap_err();
        assert_eq!(
            err,
            SlotError::InvalidKey {
                kind: SlotKind::Blank,
                key: "Q01".into()
            }
        );

        let err = check_blanks("_Q01_", &per_slot(&[("Q01", &["a"])])).unwrap_err();
        assert_eq!(
            err,
            SlotError::InvalidPlaceholder {
                kind: SlotKind::Blank,
                token: "_Q01_".into()
            }
        );
    }

    #[test]
    fn dropdown_round_trip_through_text_edit() {
        let mut dropdowns = IndexMap::new();
        dropdowns.insert("DD1".to_string(), choice(&["Rome", "Paris", "Berlin"], 0));
        assert!(check_dropdowns("The capital is [DD1].", &dropdowns).is_ok());

        let err = check_dropdowns("The capital is unknown.", &dropdowns).unwrap_err();
        assert_eq!(
            err,
            SlotError::NoPlaceholders {
                kind: SlotKind::Dropdown
            }
        );
        assert!(err.to_string().contains("placeholder found"));
    }

    #[test]
    fn dropdown_key_without_placeholder() {
        let mut dropdowns = IndexMap::new();
        dropdowns.insert("DD1".to_string(), choice(&["a", "b", "c"], 0));
        dropdowns.insert("DD2".to_string(), choice(&["a", "b", "c"], 1));
        let err = check_dropdowns("Pick [DD1]", &dropdowns).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn dropdown_content_rules() {
        let text = "[DD1]";
        let mut dropdowns = IndexMap::new();

        dropdowns.insert("DD1".to_string(), choice(&["a", "b"], 0));
        assert_eq!(
            check_dropdowns(text, &dropdowns).unwrap_err(),
            SlotError::DropdownOptionCount {
                slot: SlotId::dropdown(1),
                found: 2
            }
        );

        dropdowns.insert("DD1".to_string(), choice(&["a", "b", "c", "d", "e"], 0));
        assert!(matches!(
            check_dropdowns(text, &dropdowns),
            Err(SlotError::DropdownOptionCount { found: 5, .. })
        ));

        dropdowns.insert("DD1".to_string(), choice(&["a", "", "c"], 0));
        assert!(matches!(
            check_dropdowns(text, &dropdowns),
            Err(SlotError::EmptyDropdownOption { index: 1, .. })
        ));

        dropdowns.insert("DD1".to_string(), choice(&["a", "b", "c"], 3));
        assert!(matches!(
            check_dropdowns(text, &dropdowns),
            Err(SlotError::DropdownCorrectOutOfRange { max: 2, .. })
        ));
    }

    #[test]
    fn dropdown_cap_is_enforced() {
        let text: String = (1..=6).map(|n| format!("[DD{n}] ")).collect();
        let dropdowns: IndexMap<String, DropdownChoice> = (1..=6)
            .map(|n| (format!("DD{n}"), choice(&["a", "b", "c"], 0)))
            .collect();
        assert!(matches!(
            check_dropdowns(&text, &dropdowns),
            Err(SlotError::TooManySlots { found: 6, max: 5, .. })
        ));
    }

    #[test]
    fn sections_follow_text_edits() {
        let mut sections: SlotSections<Vec<String>> = SlotSections::new(SlotKind::Blank);
        assert_eq!(sections.ids(), vec![SlotId::blank(1)]);

        let changes = sections.sync("_Q1_ and _Q2_ and _Q3_");
        assert_eq!(changes.added, vec![SlotId::blank(2), SlotId::blank(3)]);
        assert!(changes.removed.is_empty());

        sections
            .get_mut(&SlotId::blank(1))
            .unwrap()
            .push("kept".into());

        let changes = sections.sync("_Q1_ only");
        assert_eq!(changes.removed, vec![SlotId::blank(2), SlotId::blank(3)]);
        assert_eq!(sections.ids(), vec![SlotId::blank(1)]);

        // dropping every placeholder keeps the first entry
        let changes = sections.sync("no placeholders left");
        assert!(changes.is_empty());
        assert_eq!(sections.get(&SlotId::blank(1)).unwrap(), &vec!["kept".to_string()]);
        assert_eq!(
            sections.blank_answers("no placeholders left"),
            BlankAnswers::Single(vec!["kept".into()])
        );
    }

    #[test]
    fn sections_rekey_lowest_entry_when_placeholders_vanish() {
        let mut sections: SlotSections<Vec<String>> = SlotSections::new(SlotKind::Blank);
        sections.sync("_Q2_ _Q3_");
        assert_eq!(sections.ids(), vec![SlotId::blank(2), SlotId::blank(3)]);
        sections
            .get_mut(&SlotId::blank(2))
            .unwrap()
            .push("draft".into());

        let changes = sections.sync("plain text");
        assert_eq!(changes.added, vec![SlotId::blank(1)]);
        assert_eq!(changes.removed, vec![SlotId::blank(2), SlotId::blank(3)]);
        assert_eq!(sections.get(&SlotId::blank(1)).unwrap(), &vec!["draft".to_string()]);
    }

    #[test]
    fn sections_collect_dropdowns_in_slot_order() {
        let mut sections: SlotSections<DropdownChoice> = SlotSections::new(SlotKind::Dropdown);
        let text = "[DD2] before [DD1]";
        sections.sync(text);
        *sections.get_mut(&SlotId::dropdown(1)).unwrap() = choice(&["a", "b", "c"], 2);
        *sections.get_mut(&SlotId::dropdown(2)).unwrap() = choice(&["x", "y", "z"], 0);

        let dropdowns = sections.dropdowns(text);
        assert_eq!(dropdowns.keys().collect::<Vec<_>>(), ["DD1", "DD2"]);
        assert!(check_dropdowns(text, &dropdowns).is_ok());
    }
}
