mod images;
mod manager;
mod stats;

pub use images::{image_file_name, ImageSlot};
pub use manager::{DataManager, StoreError};
pub use stats::SubjectStats;
