//! Bounded single-producer single-consumer FIFO.

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::mem::MaybeUninit;

use crossbeam_utils::CachePadded;
use tracing::trace;

use crate::array::Array;
use crate::cell::UnsafeCell;
use crate::sync::atomic::AtomicUsize;
use crate::sync::atomic::Ordering::Acquire;
use crate::sync::atomic::Ordering::Relaxed;
use crate::sync::atomic::Ordering::Release;

/// A fixed-capacity wait-free ring buffer for one producer and one consumer.
///
/// The buffer has `S` slots and keeps one of them free to tell "full" apart
/// from "empty", so it holds at most `S - 1` items.
///
/// # Examples
///
/// ```
/// use fixatom::BoundedRingBuffer;
///
/// let mut ring: BoundedRingBuffer<u32, 4> = BoundedRingBuffer::new();
///
/// assert_eq!(ring.capacity(), 3);
///
/// ring.push(1).unwrap();
/// ring.push(2).unwrap();
/// ring.push(3).unwrap();
/// assert_eq!(ring.push(4), Err(4));
///
/// assert_eq!(ring.pop(), Some(1));
/// ring.push(4).unwrap();
///
/// assert_eq!(ring.pop(), Some(2));
/// assert_eq!(ring.pop(), Some(3));
/// assert_eq!(ring.pop(), Some(4));
/// assert_eq!(ring.pop(), None);
/// ```
///
/// # Producer and consumer
///
/// [`split()`] hands out one [`Producer`] and one [`Consumer`], which may be
/// moved to different threads:
///
/// ```
/// use fixatom::BoundedRingBuffer;
/// use std::thread;
///
/// let mut ring: BoundedRingBuffer<u64, 8> = BoundedRingBuffer::new();
/// let (mut tx, mut rx) = ring.split();
///
/// thread::scope(|scope| {
///   scope.spawn(move || {
///     for item in 0..100 {
///       let mut item = item;
///       while let Err(back) = tx.push(item) {
///         item = back;
///         thread::yield_now();
///       }
///     }
///   });
///
///   let mut expected: u64 = 0;
///   while expected < 100 {
///     if let Some(item) = rx.pop() {
///       assert_eq!(item, expected);
///       expected += 1;
///     }
///   }
/// });
/// ```
///
/// # Capacity
///
/// `S` must be bigger than 2; smaller capacities fail to compile.
///
/// [`split()`]: Self::split
pub struct BoundedRingBuffer<T, const S: usize> {
  /// Next slot to read; written only by the consumer.
  head: CachePadded<AtomicUsize>,
  /// Next slot to write; written only by the producer.
  tail: CachePadded<AtomicUsize>,
  slots: Array<UnsafeCell<MaybeUninit<T>>, S>,
}

impl<T, const S: usize> BoundedRingBuffer<T, S> {
  const ASSERT_CAPACITY: () = assert!(S > 2, "invalid params: capacity must be bigger than 2");

  /// Creates a new, empty ring buffer.
  #[inline]
  pub fn new() -> Self {
    let () = Self::ASSERT_CAPACITY;

    Self {
      head: CachePadded::new(AtomicUsize::new(0)),
      tail: CachePadded::new(AtomicUsize::new(0)),
      slots: Array::new(|_| UnsafeCell::new(MaybeUninit::uninit())),
    }
  }

  /// Returns the maximum number of items the buffer can hold.
  #[inline]
  pub const fn capacity(&self) -> usize {
    S - 1
  }

  /// Returns the number of items in the buffer.
  ///
  /// From a third thread this is only a snapshot.
  #[inline]
  pub fn len(&self) -> usize {
    let head: usize = self.head.load(Acquire);
    let tail: usize = self.tail.load(Acquire);

    if tail >= head { tail - head } else { S - head + tail }
  }

  /// Returns `true` if the buffer holds no items.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.head.load(Acquire) == self.tail.load(Acquire)
  }

  /// Returns `true` if the buffer holds [`capacity()`] items.
  ///
  /// [`capacity()`]: Self::capacity
  #[inline]
  pub fn is_full(&self) -> bool {
    Self::advance(self.tail.load(Acquire)) == self.head.load(Acquire)
  }

  /// Appends an item, returning it back as `Err` if the buffer is full.
  #[inline]
  pub fn push(&mut self, item: T) -> Result<(), T> {
    // SAFETY: `&mut self` excludes every other producer.
    unsafe { self.push_unchecked(item) }
  }

  /// Removes the oldest item, or returns [`None`] if the buffer is empty.
  #[inline]
  pub fn pop(&mut self) -> Option<T> {
    // SAFETY: `&mut self` excludes every other consumer.
    unsafe { self.pop_unchecked() }
  }

  /// Splits the buffer into its producer and consumer halves.
  #[inline]
  pub fn split(&mut self) -> (Producer<'_, T, S>, Consumer<'_, T, S>) {
    let this: &Self = self;

    (Producer { ring: this }, Consumer { ring: this })
  }

  /// Appends an item through a shared reference.
  ///
  /// Returns the item back as `Err` if the buffer is full.
  ///
  /// # Safety
  ///
  /// No other thread may run [`push_unchecked()`] (or push through a
  /// [`Producer`]) on this buffer concurrently.
  ///
  /// [`push_unchecked()`]: Self::push_unchecked
  #[inline]
  pub unsafe fn push_unchecked(&self, item: T) -> Result<(), T> {
    let tail: usize = self.tail.load(Relaxed);
    let next: usize = Self::advance(tail);

    if next == self.head.load(Acquire) {
      return Err(Self::reject_push(item));
    }

    // SAFETY: The slot at `tail` is outside `head..tail`, so the consumer does
    // not read it, and the caller guarantees no other producer writes it.
    self.slots[tail].with_mut(|ptr| unsafe {
      ptr.write(MaybeUninit::new(item));
    });

    self.tail.store(next, Release);

    Ok(())
  }

  /// Removes the oldest item through a shared reference.
  ///
  /// Returns [`None`] if the buffer is empty.
  ///
  /// # Safety
  ///
  /// No other thread may run [`pop_unchecked()`] (or pop through a
  /// [`Consumer`]) on this buffer concurrently.
  ///
  /// [`pop_unchecked()`]: Self::pop_unchecked
  #[inline]
  pub unsafe fn pop_unchecked(&self) -> Option<T> {
    let head: usize = self.head.load(Relaxed);

    if head == self.tail.load(Acquire) {
      return None;
    }

    // SAFETY: The slot at `head` was published by the producer's `Release`
    // store of `tail`, and the caller guarantees no other consumer reads it.
    let item: T = self.slots[head].with(|ptr| unsafe { ptr.read().assume_init() });

    self.head.store(Self::advance(head), Release);

    Some(item)
  }

  #[inline]
  const fn advance(index: usize) -> usize {
    let next: usize = index + 1;

    if next == S { 0 } else { next }
  }

  #[cold]
  #[inline(never)]
  fn reject_push(item: T) -> T {
    trace!(capacity = S - 1, "ring full; push rejected");
    item
  }
}

impl<T, const S: usize> Debug for BoundedRingBuffer<T, S> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("BoundedRingBuffer")
      .field("capacity", &self.capacity())
      .field("len", &self.len())
      .finish()
  }
}

impl<T, const S: usize> Default for BoundedRingBuffer<T, S> {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

impl<T, const S: usize> Drop for BoundedRingBuffer<T, S> {
  fn drop(&mut self) {
    while self.pop().is_some() {}
  }
}

// SAFETY: Every `&self` path that touches slots is either `unsafe` or reached
// through the single `Producer`/`Consumer` pair, so items only ever move
// between one writer and one reader; `T: Send` is sufficient.
unsafe impl<T, const S: usize> Sync for BoundedRingBuffer<T, S> where T: Send {}

// -----------------------------------------------------------------------------
// Producer / Consumer
// -----------------------------------------------------------------------------

/// The writing half of a [`BoundedRingBuffer`].
pub struct Producer<'a, T, const S: usize> {
  ring: &'a BoundedRingBuffer<T, S>,
}

impl<T, const S: usize> Producer<'_, T, S> {
  /// Appends an item, returning it back as `Err` if the buffer is full.
  #[inline]
  pub fn push(&mut self, item: T) -> Result<(), T> {
    // SAFETY: `split()` creates exactly one producer, and `&mut self`
    // serializes its use.
    unsafe { self.ring.push_unchecked(item) }
  }

  /// Returns `true` if a push would currently fail.
  #[inline]
  pub fn is_full(&self) -> bool {
    self.ring.is_full()
  }

  /// Returns the number of items in the buffer.
  #[inline]
  pub fn len(&self) -> usize {
    self.ring.len()
  }

  /// Returns `true` if the buffer holds no items.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.ring.is_empty()
  }
}

impl<T, const S: usize> Debug for Producer<'_, T, S> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_tuple("Producer").field(self.ring).finish()
  }
}

/// The reading half of a [`BoundedRingBuffer`].
pub struct Consumer<'a, T, const S: usize> {
  ring: &'a BoundedRingBuffer<T, S>,
}

impl<T, const S: usize> Consumer<'_, T, S> {
  /// Removes the oldest item, or returns [`None`] if the buffer is empty.
  #[inline]
  pub fn pop(&mut self) -> Option<T> {
    // SAFETY: `split()` creates exactly one consumer, and `&mut self`
    // serializes its use.
    unsafe { self.ring.pop_unchecked() }
  }

  /// Returns the number of items in the buffer.
  #[inline]
  pub fn len(&self) -> usize {
    self.ring.len()
  }

  /// Returns `true` if the buffer holds no items.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.ring.is_empty()
  }
}

impl<T, const S: usize> Debug for Consumer<'_, T, S> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_tuple("Consumer").field(self.ring).finish()
  }
}
