//! Error types for identifier encoding

use compact_str::CompactString;
use thiserror::Error;

pub type IdResult<T> = Result<T, IdError>;

/// Failures raised while producing an outbound wire identifier.
///
/// Decoding never fails: malformed input becomes an `Unknown` identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Component ID exceeds {limit} character limit: {length} chars")]
    LimitExceeded { length: usize, limit: usize },

    #[error("Component ID identity must not be empty")]
    EmptyIdentity,

    #[error("Component ID identity '{0}' contains the ':' delimiter")]
    DelimiterInIdentity(CompactString),

    #[error("Cannot encode a component ID with unknown routing or component kind")]
    UnknownKind,
}
