//! Integer types with a native atomic counterpart.
//!
//! [`Integer`] is implemented for every primitive integer of 1, 2, 4, or 8
//! bytes that the target can operate on atomically. [`Unsigned`] narrows it to
//! the unsigned ones, which is what [`SequenceCounter`] accepts.
//!
//! Both traits are sealed.
//!
//! [`SequenceCounter`]: crate::SequenceCounter

use core::fmt::Debug;
use core::hash::Hash;

/// A primitive integer of 1, 2, 4, or 8 bytes with a native atomic type.
///
/// This trait is sealed and cannot be implemented outside of this crate.
pub trait Integer: Copy + Debug + Eq + Hash + Ord + Send + Sync + 'static + private::Sealed {}

/// An unsigned [`Integer`].
///
/// This trait is sealed and cannot be implemented outside of this crate.
pub trait Unsigned: Integer {}

pub(crate) mod private {
  use core::sync::atomic::Ordering;

  pub trait Sealed: Sized {
    /// The atomic type used for storage the crate owns.
    ///
    /// Swapped for a model-checked type under loom and shuttle.
    type Atomic: Send + Sync;

    /// The native atomic type used to overlay storage the crate does not own.
    type Native: Send + Sync;

    const ZERO: Self;
    const ONE: Self;

    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;

    fn atomic_new(value: Self) -> Self::Atomic;
    fn atomic_load(atomic: &Self::Atomic, order: Ordering) -> Self;
    fn atomic_store(atomic: &Self::Atomic, value: Self, order: Ordering);
    fn atomic_fetch_add(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;

    /// Reinterprets `ptr` as a reference to the native atomic type.
    ///
    /// # Safety
    ///
    /// See [`AtomicUsize::from_ptr`] for the full contract.
    ///
    /// [`AtomicUsize::from_ptr`]: core::sync::atomic::AtomicUsize::from_ptr
    unsafe fn native_from_ptr<'a>(ptr: *mut Self) -> &'a Self::Native;
    fn native_load(native: &Self::Native, order: Ordering) -> Self;
    fn native_store(native: &Self::Native, value: Self, order: Ordering);
    fn native_swap(native: &Self::Native, value: Self, order: Ordering) -> Self;
    fn native_compare_exchange(
      native: &Self::Native,
      current: Self,
      new: Self,
      success: Ordering,
      failure: Ordering,
    ) -> Result<Self, Self>;
    fn native_fetch_add(native: &Self::Native, value: Self, order: Ordering) -> Self;
    fn native_fetch_sub(native: &Self::Native, value: Self, order: Ordering) -> Self;
  }
}

macro_rules! integer {
  ($($(#[$meta:meta])* $int:ident => $atomic:ident, $kind:ident;)+) => {
    $(
      $(#[$meta])*
      impl private::Sealed for $int {
        type Atomic = crate::sync::atomic::$atomic;
        type Native = ::core::sync::atomic::$atomic;

        const ZERO: Self = 0;
        const ONE: Self = 1;

        #[inline]
        fn wrapping_add(self, rhs: Self) -> Self {
          $int::wrapping_add(self, rhs)
        }

        #[inline]
        fn wrapping_sub(self, rhs: Self) -> Self {
          $int::wrapping_sub(self, rhs)
        }

        #[inline]
        fn atomic_new(value: Self) -> Self::Atomic {
          crate::sync::atomic::$atomic::new(value)
        }

        #[inline]
        fn atomic_load(atomic: &Self::Atomic, order: ::core::sync::atomic::Ordering) -> Self {
          atomic.load(order)
        }

        #[inline]
        fn atomic_store(atomic: &Self::Atomic, value: Self, order: ::core::sync::atomic::Ordering) {
          atomic.store(value, order);
        }

        #[inline]
        fn atomic_fetch_add(
          atomic: &Self::Atomic,
          value: Self,
          order: ::core::sync::atomic::Ordering,
        ) -> Self {
          atomic.fetch_add(value, order)
        }

        #[inline]
        unsafe fn native_from_ptr<'a>(ptr: *mut Self) -> &'a Self::Native {
          // SAFETY: Forwarded to the caller.
          unsafe { ::core::sync::atomic::$atomic::from_ptr(ptr) }
        }

        #[inline]
        fn native_load(native: &Self::Native, order: ::core::sync::atomic::Ordering) -> Self {
          native.load(order)
        }

        #[inline]
        fn native_store(native: &Self::Native, value: Self, order: ::core::sync::atomic::Ordering) {
          native.store(value, order);
        }

        #[inline]
        fn native_swap(
          native: &Self::Native,
          value: Self,
          order: ::core::sync::atomic::Ordering,
        ) -> Self {
          native.swap(value, order)
        }

        #[inline]
        fn native_compare_exchange(
          native: &Self::Native,
          current: Self,
          new: Self,
          success: ::core::sync::atomic::Ordering,
          failure: ::core::sync::atomic::Ordering,
        ) -> Result<Self, Self> {
          native.compare_exchange(current, new, success, failure)
        }

        #[inline]
        fn native_fetch_add(
          native: &Self::Native,
          value: Self,
          order: ::core::sync::atomic::Ordering,
        ) -> Self {
          native.fetch_add(value, order)
        }

        #[inline]
        fn native_fetch_sub(
          native: &Self::Native,
          value: Self,
          order: ::core::sync::atomic::Ordering,
        ) -> Self {
          native.fetch_sub(value, order)
        }
      }

      $(#[$meta])*
      impl Integer for $int {}

      integer!(@kind $(#[$meta])* $int, $kind);
    )+
  };
  (@kind $(#[$meta:meta])* $int:ident, unsigned) => {
    $(#[$meta])*
    impl Unsigned for $int {}
  };
  (@kind $(#[$meta:meta])* $int:ident, signed) => {};
}

integer! {
  u8 => AtomicU8, unsigned;
  u16 => AtomicU16, unsigned;
  u32 => AtomicU32, unsigned;
  #[cfg(target_has_atomic = "64")]
  u64 => AtomicU64, unsigned;
  usize => AtomicUsize, unsigned;
  i8 => AtomicI8, signed;
  i16 => AtomicI16, signed;
  i32 => AtomicI32, signed;
  #[cfg(target_has_atomic = "64")]
  i64 => AtomicI64, signed;
  isize => AtomicIsize, signed;
}
