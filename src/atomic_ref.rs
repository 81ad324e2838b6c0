//! Atomic access to plain integer storage.

use core::cmp::Ordering as CmpOrdering;
use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::ops::AddAssign;
use core::ops::SubAssign;
use core::sync::atomic::Ordering::SeqCst;

use crate::int::Integer;

/// An atomic view over an integer that was not declared atomic.
///
/// `AtomicRef` borrows existing storage and performs every access through the
/// native atomic instructions for `T`, always with [`SeqCst`] ordering.
/// Arithmetic wraps on overflow.
///
/// The view is [`Copy`]: create it once from a unique borrow, then hand copies
/// to as many threads as needed.
///
/// # Examples
///
/// ```
/// use fixatom::AtomicRef;
/// use std::thread;
///
/// let mut hits: u64 = 0;
///
/// {
///   let shared: AtomicRef<'_, u64> = AtomicRef::new(&mut hits);
///
///   thread::scope(|scope| {
///     for _ in 0..4 {
///       scope.spawn(move || {
///         for _ in 0..100 {
///           shared.fetch_add(1);
///         }
///       });
///     }
///   });
/// }
///
/// assert_eq!(hits, 400);
/// ```
///
/// # Contract
///
/// Once storage is shared through an `AtomicRef`, every concurrent access to
/// it must go through an `AtomicRef` (or another atomic path). Constructing
/// from `&mut T` enforces this for the lifetime `'a`; [`from_ptr()`] leaves it
/// to the caller.
///
/// [`SeqCst`]: core::sync::atomic::Ordering::SeqCst
/// [`from_ptr()`]: Self::from_ptr
pub struct AtomicRef<'a, T>
where
  T: Integer,
{
  native: &'a T::Native,
}

impl<'a, T> AtomicRef<'a, T>
where
  T: Integer,
{
  const ASSERT_LAYOUT: () = {
    assert!(
      align_of::<T>() == align_of::<T::Native>(),
      "invalid target: integer alignment differs from its atomic counterpart",
    );
    assert!(
      size_of::<T>() == size_of::<T::Native>(),
      "invalid target: integer width differs from its atomic counterpart",
    );
  };

  /// Creates an atomic view over `value`.
  ///
  /// Fails to compile on targets where `T` is less aligned than its atomic
  /// counterpart (for example `u64` on 32-bit x86).
  #[inline]
  pub fn new(value: &'a mut T) -> Self {
    let () = Self::ASSERT_LAYOUT;

    // SAFETY:
    // - `value` is a unique borrow, so no non-atomic access can happen while
    //   the view (and its copies) are alive.
    // - Size and alignment match the native atomic type (checked above).
    unsafe { Self::from_ptr(value) }
  }

  /// Creates an atomic view over the integer at `ptr`.
  ///
  /// # Safety
  ///
  /// - `ptr` must be valid for reads and writes for `'a` and aligned to
  ///   `align_of::<T::Native>()`.
  /// - For the duration of `'a`, every concurrent access to the pointee must
  ///   be atomic. Mixing plain reads or writes with this view is a data race.
  #[inline]
  pub unsafe fn from_ptr(ptr: *mut T) -> Self {
    let () = Self::ASSERT_LAYOUT;

    Self {
      // SAFETY: Forwarded to the caller.
      native: unsafe { T::native_from_ptr(ptr) },
    }
  }

  /// Loads the current value.
  #[inline]
  pub fn load(&self) -> T {
    T::native_load(self.native, SeqCst)
  }

  /// Stores `value`.
  #[inline]
  pub fn store(&self, value: T) {
    T::native_store(self.native, value, SeqCst);
  }

  /// Stores `value`, returning the previous value.
  #[inline]
  pub fn swap(&self, value: T) -> T {
    T::native_swap(self.native, value, SeqCst)
  }

  /// Stores `desired` if the current value equals `expected`.
  ///
  /// This is a strong compare-and-swap: it only fails if the value really
  /// differs. On success returns the previous value (equal to `expected`); on
  /// failure returns the value that was observed instead.
  #[inline]
  pub fn compare_exchange(&self, expected: T, desired: T) -> Result<T, T> {
    T::native_compare_exchange(self.native, expected, desired, SeqCst, SeqCst)
  }

  /// Stores `desired` if the current value equals `*expected`.
  ///
  /// Returns `true` on success. On failure, `*expected` is updated to the
  /// observed value, ready for the next attempt of a retry loop.
  #[inline]
  pub fn compare_exchange_in_place(&self, expected: &mut T, desired: T) -> bool {
    match self.compare_exchange(*expected, desired) {
      Ok(_) => true,
      Err(observed) => {
        *expected = observed;
        false
      }
    }
  }

  /// Adds `value`, returning the previous value.
  #[inline]
  pub fn fetch_add(&self, value: T) -> T {
    T::native_fetch_add(self.native, value, SeqCst)
  }

  /// Subtracts `value`, returning the previous value.
  #[inline]
  pub fn fetch_sub(&self, value: T) -> T {
    T::native_fetch_sub(self.native, value, SeqCst)
  }

  /// Adds one, returning the new value.
  #[inline]
  pub fn increment(&self) -> T {
    T::wrapping_add(self.fetch_add(T::ONE), T::ONE)
  }

  /// Subtracts one, returning the new value.
  #[inline]
  pub fn decrement(&self) -> T {
    T::wrapping_sub(self.fetch_sub(T::ONE), T::ONE)
  }

  /// Adds one, returning the previous value.
  #[inline]
  pub fn post_increment(&self) -> T {
    self.fetch_add(T::ONE)
  }

  /// Subtracts one, returning the previous value.
  #[inline]
  pub fn post_decrement(&self) -> T {
    self.fetch_sub(T::ONE)
  }

  /// Returns `true` if the current value is zero.
  #[inline]
  pub fn is_zero(&self) -> bool {
    self.load() == T::ZERO
  }
}

impl<T> Clone for AtomicRef<'_, T>
where
  T: Integer,
{
  #[inline]
  fn clone(&self) -> Self {
    *self
  }
}

impl<T> Copy for AtomicRef<'_, T> where T: Integer {}

impl<T> AddAssign<T> for AtomicRef<'_, T>
where
  T: Integer,
{
  #[inline]
  fn add_assign(&mut self, value: T) {
    self.fetch_add(value);
  }
}

impl<T> SubAssign<T> for AtomicRef<'_, T>
where
  T: Integer,
{
  #[inline]
  fn sub_assign(&mut self, value: T) {
    self.fetch_sub(value);
  }
}

impl<T> PartialEq<T> for AtomicRef<'_, T>
where
  T: Integer,
{
  #[inline]
  fn eq(&self, other: &T) -> bool {
    self.load() == *other
  }
}

impl<T> PartialOrd<T> for AtomicRef<'_, T>
where
  T: Integer,
{
  #[inline]
  fn partial_cmp(&self, other: &T) -> Option<CmpOrdering> {
    Some(self.load().cmp(other))
  }
}

impl<T> Debug for AtomicRef<'_, T>
where
  T: Integer,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_tuple("AtomicRef").field(&self.load()).finish()
  }
}
