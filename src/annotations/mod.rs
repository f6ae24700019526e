//! Human-reviewed detection samples used as the precision reference.

mod parser;
mod types;

pub use parser::parse_annotation_file;
pub use types::{AnnotatedInstance, Verdict};
