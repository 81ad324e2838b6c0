//! Reference-counted links with a deletion mark, backed by [`sdd`].
//!
//! A [`Link`] is an atomic pointer to a shared node. Its low tag bit is the
//! *mark*: a node whose outgoing link is marked has been logically removed and
//! only waits for a predecessor to splice it out. Nodes stay readable for as
//! long as a [`Guard`] that observed them is alive.
//!
//! [`sdd`]: https://crates.io/crates/sdd

use core::ops::Deref;
use core::sync::atomic::Ordering;

const UNMARKED: sdd::Tag = sdd::Tag::None;
const MARKED: sdd::Tag = sdd::Tag::First;

/// Drives the epoch forward until retired nodes are dropped.
#[cfg(all(test, not(any(loom, shuttle))))]
#[inline]
pub(crate) fn flush() {
  // sdd reclaims after three new epochs; one extra covers a lagging local one.
  const EPOCH: usize = 4;

  for _ in 0..EPOCH {
    sdd::Guard::new().accelerate();
  }
}

// -----------------------------------------------------------------------------
// Guard
// -----------------------------------------------------------------------------

/// Keeps every node observed through it alive.
#[repr(transparent)]
pub(crate) struct Guard {
  inner: sdd::Guard,
}

impl Guard {
  #[inline]
  pub(crate) fn new() -> Self {
    Self {
      inner: sdd::Guard::new(),
    }
  }
}

// -----------------------------------------------------------------------------
// Owned
// -----------------------------------------------------------------------------

/// A counted handle to a node, not tied to any guard.
#[repr(transparent)]
pub(crate) struct Owned<T> {
  inner: sdd::Shared<T>,
}

impl<T> Owned<T>
where
  T: 'static,
{
  #[inline]
  pub(crate) fn new(value: T) -> Self {
    Self {
      inner: sdd::Shared::new(value),
    }
  }
}

impl<T> Deref for Owned<T> {
  type Target = T;

  #[inline]
  fn deref(&self) -> &Self::Target {
    &self.inner
  }
}

// -----------------------------------------------------------------------------
// Shared
// -----------------------------------------------------------------------------

/// A possibly marked pointer to a node, valid while `'guard` lasts.
#[repr(transparent)]
pub(crate) struct Shared<'guard, T> {
  inner: sdd::Ptr<'guard, T>,
}

impl<'guard, T> Shared<'guard, T> {
  /// Returns `true` if the link this pointer was loaded from is marked.
  #[inline]
  pub(crate) fn is_marked(&self) -> bool {
    self.inner.tag() != UNMARKED
  }

  /// Returns the node, ignoring the mark.
  #[inline]
  pub(crate) fn as_ref(&self) -> Option<&'guard T> {
    self.inner.as_ref()
  }

  /// Takes a counted handle to the node.
  ///
  /// The outer `None` means the node was reclaimed since it was loaded, so a
  /// link holding it can no longer be trusted; callers reload and retry.
  #[inline]
  fn counted(self) -> Option<Option<sdd::Shared<T>>> {
    if self.inner.is_null() {
      return Some(None);
    }

    self.inner.get_shared().map(Some)
  }
}

impl<T> Clone for Shared<'_, T> {
  #[inline]
  fn clone(&self) -> Self {
    *self
  }
}

impl<T> Copy for Shared<'_, T> {}

// -----------------------------------------------------------------------------
// Link
// -----------------------------------------------------------------------------

/// An atomic, markable pointer to a shared node.
#[repr(transparent)]
pub(crate) struct Link<T> {
  inner: sdd::AtomicShared<T>,
}

impl<T> Link<T> {
  #[inline]
  pub(crate) const fn null() -> Self {
    Self {
      inner: sdd::AtomicShared::null(),
    }
  }

  #[inline]
  pub(crate) fn load<'guard>(&self, order: Ordering, guard: &'guard Guard) -> Shared<'guard, T> {
    Shared {
      inner: self.inner.load(order, &guard.inner),
    }
  }

  /// Points a link that no other thread can see yet at `target`.
  ///
  /// Returns `false` if `target` was reclaimed in the meantime.
  #[inline]
  pub(crate) fn prepare(&self, target: Shared<'_, T>) -> bool {
    let Some(target) = target.counted() else {
      return false;
    };

    drop(self.inner.swap((target, UNMARKED), Ordering::Relaxed));

    true
  }

  /// Replaces `current` with `node`, unmarked.
  #[inline]
  pub(crate) fn publish<'guard>(
    &self,
    current: Shared<'guard, T>,
    node: &Owned<T>,
    guard: &'guard Guard,
  ) -> Result<(), Shared<'guard, T>> {
    self.exchange(current, Some(node.inner.clone()), UNMARKED, guard)
  }

  /// Sets the mark on a link that still holds `current`.
  ///
  /// Fails if the link moved or is already marked.
  #[inline]
  pub(crate) fn mark<'guard>(
    &self,
    current: Shared<'guard, T>,
    guard: &'guard Guard,
  ) -> Result<(), Shared<'guard, T>> {
    if current.is_marked() {
      return Err(current);
    }

    let Some(target) = current.counted() else {
      return Err(self.load(Ordering::Acquire, guard));
    };

    self.exchange(current, target, MARKED, guard)
  }

  /// Replaces `current` with `successor`, unmarked.
  ///
  /// `successor` may be loaded from a marked link; the mark is not carried
  /// over.
  #[inline]
  pub(crate) fn splice<'guard>(
    &self,
    current: Shared<'guard, T>,
    successor: Shared<'guard, T>,
    guard: &'guard Guard,
  ) -> Result<(), Shared<'guard, T>> {
    let Some(target) = successor.counted() else {
      return Err(self.load(Ordering::Acquire, guard));
    };

    self.exchange(current, target, UNMARKED, guard)
  }

  /// Detaches the whole chain behind this link.
  #[inline]
  pub(crate) fn take(&self) -> Option<Owned<T>> {
    let (inner, _): (Option<sdd::Shared<T>>, sdd::Tag) =
      self.inner.swap((None, UNMARKED), Ordering::AcqRel);

    inner.map(|inner| Owned { inner })
  }

  #[inline]
  fn exchange<'guard>(
    &self,
    current: Shared<'guard, T>,
    target: Option<sdd::Shared<T>>,
    tag: sdd::Tag,
    guard: &'guard Guard,
  ) -> Result<(), Shared<'guard, T>> {
    match self.inner.compare_exchange(
      current.inner,
      (target, tag),
      Ordering::AcqRel,
      Ordering::Acquire,
      &guard.inner,
    ) {
      Ok(_) => Ok(()),
      Err((_, actual)) => Err(Shared { inner: actual }),
    }
  }
}
