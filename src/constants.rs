//! Fixed vocabulary shared by the model, the validators and the data manager.

pub const APP_NAME: &str = "Quiz Admin";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// question types
pub const MULTIPLE_CHOICE: &str = "multiple_choice";
pub const MULTIPLE_CHOICE_MULTIPLE: &str = "multiple_choice_multiple";
pub const TRUE_FALSE: &str = "true_false";
pub const FILL_IN_BLANK: &str = "fill_in_blank";
pub const DROPDOWN: &str = "dropdown";
pub const MATCHING: &str = "matching";
pub const REORDERING: &str = "reordering";
pub const READING_COMPREHENSION: &str = "reading_comprehension";

pub const QUESTION_TYPES: [&str; 8] = [
    MULTIPLE_CHOICE,
    MULTIPLE_CHOICE_MULTIPLE,
    TRUE_FALSE,
    FILL_IN_BLANK,
    DROPDOWN,
    MATCHING,
    REORDERING,
    READING_COMPREHENSION,
];

/// Human readable name for a question type, `None` for types this tool does not know.
pub fn question_type_name(question_type: &str) -> Option<&'static str> {
    match question_type {
        MULTIPLE_CHOICE => Some("Multiple Choice"),
        MULTIPLE_CHOICE_MULTIPLE => Some("Multiple Choice (Multiple Answers)"),
        TRUE_FALSE => Some("True/False"),
        FILL_IN_BLANK => Some("Fill in the Blank"),
        DROPDOWN => Some("Drop-Down Selection"),
        MATCHING => Some("Matching"),
        REORDERING => Some("Reordering"),
        READING_COMPREHENSION => Some("Reading Comprehension"),
        _ => None,
    }
}

// files
pub const QUESTIONS_DIR: &str = "questions";
pub const QUESTIONS_FILE_PREFIX: &str = "questions-";
pub const QUESTIONS_FILE_SUFFIX: &str = ".json";
pub const IMAGES_DIR: &str = "images";
pub const BACKUP_MARKER: &str = ".backup_";

// images
pub const MAX_IMAGE_SIZE: u64 = 5 * 1024 * 1024;
pub const SUPPORTED_IMAGE_FORMATS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
pub const DEFAULT_IMAGE_SCALE: u32 = 50;
pub const MIN_IMAGE_SCALE: u32 = 25;
pub const MAX_IMAGE_SCALE: u32 = 200;

// cardinalities
pub const MIN_OPTIONS_MC: usize = 2;
pub const MIN_PAIRS_MATCHING: usize = 2;
pub const MAX_PAIRS_MATCHING: usize = 26;
pub const MIN_ITEMS_REORDERING: usize = 2;
pub const MIN_ANSWERS_FILL: usize = 1;
pub const MIN_SUBQUESTIONS_READING: usize = 1;
pub const MIN_CORRECT_ANSWERS_MCM: usize = 1;

// fill in the blank: _Q1_, _Q2_, ...
pub const MAX_BLANKS_FILL: usize = 10;
pub const BLANK_PLACEHOLDER_PREFIX: &str = "_Q";
pub const BLANK_PLACEHOLDER_SUFFIX: &str = "_";
pub const BLANK_PLACEHOLDER_PATTERN: &str = r"_Q([0-9]+)_";
pub const BLANK_ID_PREFIX: &str = "Q";

// dropdowns: [DD1], [DD2], ...
pub const MIN_DROPDOWNS: usize = 1;
pub const MAX_DROPDOWNS: usize = 5;
pub const MIN_OPTIONS_PER_DROPDOWN: usize = 3;
pub const MAX_OPTIONS_PER_DROPDOWN: usize = 4;
pub const DROPDOWN_PLACEHOLDER_PREFIX: &str = "[DD";
pub const DROPDOWN_PLACEHOLDER_SUFFIX: &str = "]";
pub const DROPDOWN_PLACEHOLDER_PATTERN: &str = r"\[DD([0-9]+)\]";
pub const DROPDOWN_ID_PREFIX: &str = "DD";

// lessons
pub const LESSON_ID_PREFIX: &str = "L";
pub const LESSON_ID_PADDING: usize = 3;
pub const MAX_LESSON_NAME_LEN: usize = 100;
pub const MAX_LESSON_ID_LEN: usize = 10;

// subjects
pub const MAX_SUBJECT_NAME_LEN: usize = 50;
pub const INVALID_SUBJECT_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Display name of the virtual bucket holding questions without a lesson.
pub const OTHERS_CATEGORY: &str = "Others";
