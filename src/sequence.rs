//! Monotonic ticket counter.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result;

use crate::int::Unsigned;
use crate::sync::atomic::Ordering::Relaxed;
use crate::sync::atomic::Ordering::Release;

/// An atomic counter handing out increasing ticket numbers.
///
/// Every call to [`next()`] returns the current value and advances it by one,
/// so no two calls observe the same ticket until the counter wraps around at
/// `T::MAX`. Wrapping is defined behavior, not an error.
///
/// # Examples
///
/// ```
/// use fixatom::SequenceCounter;
///
/// let tickets: SequenceCounter<u8> = SequenceCounter::new(3);
///
/// assert_eq!(tickets.next(), 3);
/// assert_eq!(tickets.next(), 4);
/// assert_eq!(tickets.load(), 5);
/// ```
///
/// # Copies
///
/// Cloning snapshots the source with a relaxed load and publishes it into the
/// destination with a release store. The copy is not a single atomic step
/// relative to concurrent [`next()`] calls on the source.
///
/// [`next()`]: Self::next
pub struct SequenceCounter<T = u32>
where
  T: Unsigned,
{
  value: T::Atomic,
}

impl<T> SequenceCounter<T>
where
  T: Unsigned,
{
  /// Creates a new counter whose first ticket is `initial`.
  #[inline]
  pub fn new(initial: T) -> Self {
    Self {
      value: T::atomic_new(initial),
    }
  }

  /// Returns the current ticket and advances the counter.
  ///
  /// Wraps to zero after `T::MAX`.
  #[inline]
  pub fn next(&self) -> T {
    T::atomic_fetch_add(&self.value, T::ONE, Relaxed)
  }

  /// Returns the ticket the next call to [`next()`] would hand out, without
  /// advancing the counter.
  ///
  /// [`next()`]: Self::next
  #[inline]
  pub fn load(&self) -> T {
    T::atomic_load(&self.value, Relaxed)
  }

  /// Overwrites the counter.
  ///
  /// The store is relaxed: another thread is only guaranteed to observe it
  /// through some other happens-before edge established by the caller.
  #[inline]
  pub fn set(&self, value: T) {
    T::atomic_store(&self.value, value, Relaxed);
  }
}

impl<T> Clone for SequenceCounter<T>
where
  T: Unsigned,
{
  #[inline]
  fn clone(&self) -> Self {
    Self::new(self.load())
  }

  #[inline]
  fn clone_from(&mut self, source: &Self) {
    T::atomic_store(&self.value, source.load(), Release);
  }
}

impl<T> Debug for SequenceCounter<T>
where
  T: Unsigned,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    f.debug_tuple("SequenceCounter").field(&self.load()).finish()
  }
}

impl<T> Default for SequenceCounter<T>
where
  T: Unsigned,
{
  #[inline]
  fn default() -> Self {
    Self::new(T::ZERO)
  }
}

impl<T> From<T> for SequenceCounter<T>
where
  T: Unsigned,
{
  #[inline]
  fn from(initial: T) -> Self {
    Self::new(initial)
  }
}
