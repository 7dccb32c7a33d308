//! Error types for span loading and matching.
//!
//! Two error families mirror the two failure classes in the spec: a
//! span or scenario can be malformed at load time ([`SpanError`]), or
//! the match engine itself can hit an internal inconsistency while
//! reducing or hashing otherwise well-typed input ([`MatchError`]). A
//! missed match is never represented as an error — callers see
//! `Ok(None)`.

use thiserror::Error;

/// Errors raised while validating or hashing a single recorded span.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpanError {
    /// A schema node referenced a child that failed to reduce (for
    /// example, `items` present without `properties` compatible with
    /// the value shape).
    #[error("malformed schema: {0}")]
    MalformedSchema(String),

    /// A scenario or span file supplied a timestamp that could not be
    /// interpreted as epoch milliseconds.
    #[error("malformed timestamp: {0}")]
    MalformedTimestamp(String),

    /// A scenario referenced an enum string (match type, match scope)
    /// this crate does not recognise.
    #[error("unknown enum value: {0}")]
    UnknownEnum(String),
}

/// Errors raised by the match engine or the span store.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    /// A candidate span or request could not be reduced/hashed because
    /// of malformed input discovered mid-match (spec §7, failure class 2).
    #[error("internal inconsistency while matching: {0}")]
    Span(#[from] SpanError),

    /// The supplied [`crate::config::MatcherConfig`] failed validation.
    #[error("invalid matcher config: {0}")]
    InvalidConfig(String),
}
