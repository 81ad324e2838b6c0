//! Error types.

use thiserror::Error;

/// Errors raised by direct lookups.
///
/// Capacity exhaustion and absence are expected outcomes of the concurrent
/// operations and are reported through [`Option`] or `Result<(), T>`
/// instead; this type only covers lookups that promise a value.
#[derive(Clone, Copy, Debug, Error, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
  /// The requested key is not present in the dictionary.
  #[error("key not in dictionary")]
  KeyNotFound,
}
