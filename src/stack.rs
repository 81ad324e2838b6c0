//! Bounded lock-free LIFO.
//!
//! Capacity is reserved through a single atomic counter; each slot carries its
//! own state word so that a reserved slot is never read before its value is
//! published, nor overwritten before its previous value is taken.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::mem::MaybeUninit;

use crossbeam_utils::CachePadded;
use tracing::trace;

use crate::array::Array;
use crate::cell::UnsafeCell;
use crate::sync::atomic::AtomicU8;
use crate::sync::atomic::AtomicUsize;
use crate::sync::atomic::Ordering::Acquire;
use crate::sync::atomic::Ordering::Relaxed;
use crate::sync::atomic::Ordering::Release;
use crate::sync::spin;

/// Slot holds no value.
const EMPTY: u8 = 0;
/// Slot is being written or read by the thread that claimed it.
const BUSY: u8 = 1;
/// Slot holds a published value.
const READY: u8 = 2;

/// A fixed-capacity lock-free stack.
///
/// Holds at most `S` items. [`push()`] hands the item back when the stack is
/// full and [`pop()`] returns [`None`] when it is empty; neither ever blocks on
/// capacity.
///
/// # Examples
///
/// ```
/// use fixatom::BoundedLockFreeStack;
///
/// let stack: BoundedLockFreeStack<u32, 4> = BoundedLockFreeStack::new();
///
/// stack.push(1).unwrap();
/// stack.push(2).unwrap();
/// stack.push(3).unwrap();
///
/// assert_eq!(stack.pop(), Some(3));
/// assert_eq!(stack.pop(), Some(2));
/// assert_eq!(stack.pop(), Some(1));
/// assert_eq!(stack.pop(), None);
/// ```
///
/// # Concurrency
///
/// Any number of threads may push and pop concurrently. A push first reserves
/// an index by advancing the counter, then claims the slot at that index; a pop
/// reserves by retreating the counter, then claims the slot below it. When a
/// reserved slot is still owned by a peer that reserved it earlier (a write not
/// yet published, or a read not yet finished), the thread spins until that
/// peer's few remaining instructions complete. If that peer is descheduled in
/// between, the wait lasts until it runs again, so the stack is not lock-free
/// in the strict progress sense.
///
/// LIFO order is exact whenever pushes and pops do not overlap. Under
/// contention two overlapping operations on the same index may complete in
/// either order, but every pushed item is popped exactly once.
///
/// # Capacity
///
/// `S` must be bigger than 2; smaller capacities fail to compile.
///
/// [`push()`]: Self::push
/// [`pop()`]: Self::pop
pub struct BoundedLockFreeStack<T, const S: usize> {
  /// Number of reserved slots; the next push claims `slots[count]`.
  count: CachePadded<AtomicUsize>,
  slots: Array<Slot<T>, S>,
}

impl<T, const S: usize> BoundedLockFreeStack<T, S> {
  const ASSERT_CAPACITY: () = assert!(S > 2, "invalid params: capacity must be bigger than 2");

  /// Creates a new, empty stack.
  #[inline]
  pub fn new() -> Self {
    let () = Self::ASSERT_CAPACITY;

    Self {
      count: CachePadded::new(AtomicUsize::new(0)),
      slots: Array::new(|_| Slot::new()),
    }
  }

  /// Returns the maximum number of items the stack can hold.
  #[inline]
  pub const fn capacity(&self) -> usize {
    S
  }

  /// Returns the number of reserved slots.
  ///
  /// Includes pushes still writing their item and excludes pops still reading
  /// theirs. The value may change immediately due to concurrent operations.
  #[inline]
  pub fn len(&self) -> usize {
    self.count.load(Relaxed)
  }

  /// Returns `true` if the stack holds no items.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns `true` if the stack is at capacity.
  #[inline]
  pub fn is_full(&self) -> bool {
    self.len() >= S
  }

  /// Pushes an item onto the stack.
  ///
  /// Returns the item back as `Err` if the stack is full.
  #[inline]
  pub fn push(&self, item: T) -> Result<(), T> {
    let Some(index) = self.reserve_push() else {
      return Err(self.reject_push(item));
    };

    self.slots[index].publish(item);

    Ok(())
  }

  /// Pops the most recently pushed item off the stack.
  ///
  /// Returns [`None`] if the stack is empty.
  #[inline]
  pub fn pop(&self) -> Option<T> {
    let Some(index) = self.reserve_pop() else {
      return self.reject_pop();
    };

    Some(self.slots[index].take())
  }

  /// Advances the counter, returning the reserved index.
  #[inline]
  fn reserve_push(&self) -> Option<usize> {
    let mut current: usize = self.count.load(Relaxed);

    loop {
      if current >= S {
        return None;
      }

      match self
        .count
        .compare_exchange_weak(current, current + 1, Relaxed, Relaxed)
      {
        Ok(_) => return Some(current),
        Err(next) => current = next,
      }
    }
  }

  /// Retreats the counter, returning the reserved index.
  #[inline]
  fn reserve_pop(&self) -> Option<usize> {
    let mut current: usize = self.count.load(Relaxed);

    loop {
      if current == 0 {
        return None;
      }

      match self
        .count
        .compare_exchange_weak(current, current - 1, Relaxed, Relaxed)
      {
        Ok(_) => return Some(current - 1),
        Err(next) => current = next,
      }
    }
  }

  #[cold]
  #[inline(never)]
  fn reject_push(&self, item: T) -> T {
    trace!(capacity = S, "stack full; push rejected");
    item
  }

  #[cold]
  #[inline(never)]
  fn reject_pop(&self) -> Option<T> {
    trace!(capacity = S, "stack empty; pop rejected");
    None
  }
}

impl<T, const S: usize> Debug for BoundedLockFreeStack<T, S> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("BoundedLockFreeStack")
      .field("capacity", &S)
      .field("len", &self.len())
      .finish()
  }
}

impl<T, const S: usize> Default for BoundedLockFreeStack<T, S> {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

// SAFETY: Items are moved in and out through slots whose ownership is handed
// between threads by the slot state word; no `&T` is ever shared, so `T: Send`
// is sufficient.
unsafe impl<T, const S: usize> Sync for BoundedLockFreeStack<T, S> where T: Send {}

// -----------------------------------------------------------------------------
// Slot
// -----------------------------------------------------------------------------

struct Slot<T> {
  state: AtomicU8,
  value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
  #[inline]
  fn new() -> Self {
    Self {
      state: AtomicU8::new(EMPTY),
      value: UnsafeCell::new(MaybeUninit::uninit()),
    }
  }

  /// Claims the slot in state `from`, spinning while a peer still owns it.
  #[inline]
  fn claim(&self, from: u8) {
    while self
      .state
      .compare_exchange_weak(from, BUSY, Acquire, Relaxed)
      .is_err()
    {
      spin();
    }
  }

  #[inline]
  fn publish(&self, item: T) {
    self.claim(EMPTY);

    // SAFETY: `BUSY` grants exclusive access; the slot holds no value.
    self.value.with_mut(|ptr| unsafe {
      ptr.write(MaybeUninit::new(item));
    });

    self.state.store(READY, Release);
  }

  #[inline]
  fn take(&self) -> T {
    self.claim(READY);

    // SAFETY: `BUSY` grants exclusive access; the value was published by the
    // `Release` store of `READY` that the claim acquired.
    let item: T = self.value.with(|ptr| unsafe { ptr.read().assume_init() });

    self.state.store(EMPTY, Release);

    item
  }
}

impl<T> Drop for Slot<T> {
  fn drop(&mut self) {
    if self.state.load(Relaxed) == READY {
      // SAFETY: `&mut self` grants exclusive access; `READY` means the value
      // is initialized and was never taken.
      self.value.with_mut(|ptr| unsafe {
        (*ptr).assume_init_drop();
      });
    }
  }
}
