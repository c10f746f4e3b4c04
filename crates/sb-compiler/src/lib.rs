//! SafariBlocker Filter List Converter
//!
//! Converts AdGuard/uBO-style filter rules into the declarative JSON
//! format consumed by Safari's content blocker engine.
//!
//! The pipeline is strictly forward: text → parsed rule → output entry
//! → categorized → exception-adjusted → compacted → serialized. Rules
//! the target engine cannot express are rejected with precise reasons;
//! no error aborts a conversion.

pub mod compactor;
pub mod error;
pub mod exceptions;
pub mod finalizer;
pub mod parser;
pub mod pipeline;
pub mod translator;
pub mod trigger;
pub mod validate;

pub use error::ConvertError;
pub use parser::create_rule;
pub use pipeline::{
    convert_array, convert_line, ContentBlockerBuckets, ConversionResult, ConvertInput,
};
pub use translator::{translate_css, translate_rule, translate_url};
