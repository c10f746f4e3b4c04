//! Conversion error type
//!
//! Every error is non-fatal: the pipeline records the message together
//! with the offending rule text and continues with the next rule.

/// Error raised while converting a single rule, or while finalizing the
/// converted set.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Rule text could not be parsed by the rule builder.
    #[error("cannot parse rule: {0}")]
    Parse(String),
    /// Rule uses a construct the target engine cannot express.
    #[error("unsupported rule: {0}")]
    Unsupported(&'static str),
    /// url-filter regex violates the target engine restrictions.
    #[error("{0}")]
    RegexRejected(&'static str),
    /// Document-blocking rule lacks the required domain or load-type
    /// scoping.
    #[error("blocking rules with document resource type must be limited to if-domain or third-party load type")]
    DocumentBlockPolicy,
    /// Both permitted and restricted domains present on one rule.
    #[error("both permitted and restricted domains are not supported")]
    DomainScopeConflict,
    /// CSS exception application left a hide rule with both domain
    /// scopes populated.
    #[error("exception application left both if-domain and unless-domain populated")]
    ExceptionApplicationDropped,
    /// Output truncated to the configured rule cap.
    #[error("{0} limit is achieved. Next rules will be ignored.")]
    LimitExceeded(usize),
}
