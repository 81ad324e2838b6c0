//! Cache-aligned fixed-length allocation.
//!
//! Every bounded structure in the crate keeps its slots in one allocation whose
//! length is a const generic, so it never grows or shrinks after construction.

use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::mem::MaybeUninit;
use core::ops::Deref;
use core::ptr::NonNull;
use core::slice;

use crossbeam_utils::CachePadded;

use crate::alloc::Layout;
use crate::alloc::alloc;
use crate::alloc::dealloc;
use crate::alloc::handle_alloc_error;

/// The size of a cache line in bytes.
///
/// Slot storage starts on a cache-line boundary so that it never shares a line
/// with the atomic indices of another structure.
pub const CACHE_LINE: usize = size_of::<CachePadded<u8>>();

const _: () = assert!(
  CACHE_LINE.is_power_of_two(),
  "invalid params: `CACHE_LINE` must be a power of two",
);

/// A heap-allocated array of exactly `N` elements with cache-line alignment.
pub(crate) struct Array<T, const N: usize> {
  nonnull: NonNull<T>,
  phantom: PhantomData<T>,
}

impl<T, const N: usize> Array<T, N> {
  /// Creates a new array, initializing each element with the given function.
  #[inline]
  pub(crate) fn new<F>(init: F) -> Self
  where
    F: Fn(usize) -> T,
  {
    let this: Array<MaybeUninit<T>, N> = Self::new_uninit();

    let mut index: usize = 0;

    while index < N {
      // SAFETY: `index < N` and the allocation holds `N` elements.
      let ptr: NonNull<MaybeUninit<T>> = unsafe { this.nonnull.add(index) };

      // SAFETY: Pointer is valid and aligned; we have exclusive access.
      let uninit: &mut MaybeUninit<T> = unsafe { &mut *ptr.as_ptr() };

      uninit.write(init(index));

      index += 1;
    }

    // SAFETY: All `N` elements initialized by the loop.
    unsafe { this.assume_init() }
  }

  /// Creates a new array without initializing its contents.
  #[inline]
  pub(crate) fn new_uninit() -> Array<MaybeUninit<T>, N> {
    let layout: Layout = Self::layout();

    // Zero-sized storage needs no allocation; a dangling pointer is aligned
    // and valid for zero-byte accesses.
    if layout.size() == 0 {
      return Array {
        nonnull: NonNull::dangling(),
        phantom: PhantomData,
      };
    }

    // SAFETY: `layout` has non-zero size.
    let raw: *mut u8 = unsafe { alloc(layout) };

    Array {
      nonnull: match NonNull::new(raw.cast()) {
        Some(ptr) => ptr,
        None => handle_alloc_error(layout),
      },
      phantom: PhantomData,
    }
  }

  /// Returns the allocation layout for `N` elements aligned to a cache line.
  #[inline]
  pub(crate) fn layout() -> Layout {
    let Ok(layout) = Layout::array::<T>(N) else {
      panic!("invalid params: array of `N` elements must be representable");
    };

    let Ok(layout) = layout.align_to(CACHE_LINE) else {
      panic!("invalid params: array of `N` elements must be representable");
    };

    layout
  }

  /// Returns a raw pointer to the array.
  #[inline]
  pub(crate) const fn as_ptr(&self) -> *const T {
    self.nonnull.as_ptr()
  }

  #[inline]
  pub(crate) const fn as_slice(&self) -> &[T] {
    // SAFETY: Contiguous allocation of `N` initialized elements.
    unsafe { slice::from_raw_parts(self.as_ptr(), N) }
  }

  #[inline]
  pub(crate) const fn as_mut_slice(&mut self) -> &mut [T] {
    // SAFETY: Contiguous allocation of `N` initialized elements, borrowed
    // uniquely through `&mut self`.
    unsafe { slice::from_raw_parts_mut(self.nonnull.as_ptr(), N) }
  }
}

impl<T, const N: usize> Array<MaybeUninit<T>, N> {
  /// Converts to an initialized array.
  ///
  /// # Safety
  ///
  /// All `N` elements must be initialized.
  #[inline]
  pub(crate) unsafe fn assume_init(self) -> Array<T, N> {
    Array {
      // Prevent drop from running on `self` (would deallocate).
      nonnull: ManuallyDrop::new(self).nonnull.cast(),
      phantom: PhantomData,
    }
  }
}

impl<T, const N: usize> Deref for Array<T, N> {
  type Target = [T];

  #[inline]
  fn deref(&self) -> &Self::Target {
    self.as_slice()
  }
}

impl<T, const N: usize> Drop for Array<T, N> {
  fn drop(&mut self) {
    let layout: Layout = Self::layout();

    // SAFETY: Elements are initialized (`MaybeUninit` arrays skip this through
    // `needs_drop`) and are dropped exactly once here.
    unsafe {
      core::ptr::drop_in_place(self.as_mut_slice());
    }

    if layout.size() != 0 {
      // SAFETY: Allocated with this exact layout in `new_uninit`.
      unsafe {
        dealloc(self.nonnull.cast().as_ptr(), layout);
      }
    }
  }
}

// SAFETY: `Array` uniquely owns its elements, like `Box<[T]>`.
unsafe impl<T: Send, const N: usize> Send for Array<T, N> {}

// SAFETY: Shared access only hands out `&T`, like `Box<[T]>`.
unsafe impl<T: Sync, const N: usize> Sync for Array<T, N> {}
