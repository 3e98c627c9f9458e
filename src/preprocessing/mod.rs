//! Image preprocessing module for OCR enhancement
//!
//! Fixed step sequence tuned for photographed medicine labels.

pub mod pipeline;
pub mod steps;

pub use pipeline::{preprocess, Preprocessed};
