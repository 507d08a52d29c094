//! Voyager prompt system.
//!
//! Fixed prompt contracts for the two generation calls in the query
//! pipeline (normalization and grounded answer composition), plus the
//! canned user-visible messages.

pub mod builder;
pub mod templates;

pub use builder::{answer_system_prompt, build_answer_prompt, build_normalization_prompt};
pub use templates::{EMPTY_QUERY_MESSAGE, NOT_FOUND_MESSAGE, OFF_TOPIC_MESSAGE};
