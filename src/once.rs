//! Single-shot gate.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result;

use crate::sync::atomic::AtomicBool;
use crate::sync::atomic::Ordering::AcqRel;
use crate::sync::atomic::Ordering::Acquire;
use crate::sync::atomic::Ordering::Release;

/// A gate that lets exactly one caller through per arming period.
///
/// The latch starts armed. [`check()`] atomically consumes it, so among any
/// number of concurrent callers exactly one observes `true`. [`reset()`]
/// re-arms it.
///
/// # Examples
///
/// ```
/// use fixatom::OnceLatch;
///
/// let latch: OnceLatch = OnceLatch::new();
///
/// assert!(latch.check());
/// assert!(!latch.check());
///
/// latch.reset();
/// assert!(latch.check());
/// ```
///
/// A `reset()` racing concurrent `check()` calls opens a new period at an
/// arbitrary point among them; callers that need exactly one winner per
/// period must not reset while checks are in flight.
///
/// [`check()`]: Self::check
/// [`reset()`]: Self::reset
pub struct OnceLatch {
  armed: AtomicBool,
}

impl OnceLatch {
  /// Creates a new, armed latch.
  #[inline]
  pub fn new() -> Self {
    Self {
      armed: AtomicBool::new(true),
    }
  }

  /// Consumes the latch, returning `true` if it was armed.
  #[inline]
  pub fn check(&self) -> bool {
    self.armed.swap(false, AcqRel)
  }

  /// Consumes the latch, returning `true` if it was already consumed.
  ///
  /// Equivalent to `!self.check()`. This is not a query: an armed latch is
  /// consumed by the call and this caller becomes the period's one winner.
  /// Use [`is_armed()`] to inspect the latch without consuming it.
  ///
  /// # Examples
  ///
  /// ```
  /// use fixatom::OnceLatch;
  ///
  /// let latch: OnceLatch = OnceLatch::new();
  ///
  /// assert!(!latch.try_consume_failed());
  /// assert!(latch.try_consume_failed());
  /// assert!(!latch.is_armed());
  /// ```
  ///
  /// [`is_armed()`]: Self::is_armed
  #[inline]
  pub fn try_consume_failed(&self) -> bool {
    !self.check()
  }

  /// Returns `true` if the latch is armed, without consuming it.
  ///
  /// The result may be stale by the time it is inspected.
  #[inline]
  pub fn is_armed(&self) -> bool {
    self.armed.load(Acquire)
  }

  /// Re-arms the latch.
  #[inline]
  pub fn reset(&self) {
    self.armed.store(true, Release);
  }
}

impl Debug for OnceLatch {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    f.debug_struct("OnceLatch")
      .field("armed", &self.is_armed())
      .finish()
  }
}

impl Default for OnceLatch {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}
