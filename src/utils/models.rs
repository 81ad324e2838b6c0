#[cfg(all(loom, shuttle))]
compile_error!("cannot use loom and shuttle at once");

#[cfg(loom)]
pub(crate) mod alloc {
  pub(crate) use ::loom::alloc::Layout;
  pub(crate) use ::loom::alloc::alloc;
  pub(crate) use ::loom::alloc::dealloc;
  pub(crate) use ::std::alloc::handle_alloc_error;
}

#[cfg(not(loom))]
pub(crate) mod alloc {
  pub(crate) use ::std::alloc::Layout;
  pub(crate) use ::std::alloc::alloc;
  pub(crate) use ::std::alloc::dealloc;
  pub(crate) use ::std::alloc::handle_alloc_error;
}

#[cfg(not(any(loom, shuttle)))]
pub(crate) mod sync {
  pub(crate) mod atomic {
    pub(crate) use ::core::sync::atomic::AtomicBool;
    pub(crate) use ::core::sync::atomic::AtomicI8;
    pub(crate) use ::core::sync::atomic::AtomicI16;
    pub(crate) use ::core::sync::atomic::AtomicI32;
    #[cfg(target_has_atomic = "64")]
    pub(crate) use ::core::sync::atomic::AtomicI64;
    pub(crate) use ::core::sync::atomic::AtomicIsize;
    pub(crate) use ::core::sync::atomic::AtomicU8;
    pub(crate) use ::core::sync::atomic::AtomicU16;
    pub(crate) use ::core::sync::atomic::AtomicU32;
    #[cfg(target_has_atomic = "64")]
    pub(crate) use ::core::sync::atomic::AtomicU64;
    pub(crate) use ::core::sync::atomic::AtomicUsize;
    pub(crate) use ::core::sync::atomic::Ordering;
  }

  /// Hint issued while waiting on a peer that owns a slot mid-operation.
  #[inline]
  pub(crate) fn spin() {
    ::core::hint::spin_loop();
  }
}

#[cfg(loom)]
pub(crate) mod sync {
  pub(crate) mod atomic {
    pub(crate) use ::loom::sync::atomic::AtomicBool;
    pub(crate) use ::loom::sync::atomic::AtomicI8;
    pub(crate) use ::loom::sync::atomic::AtomicI16;
    pub(crate) use ::loom::sync::atomic::AtomicI32;
    #[cfg(target_has_atomic = "64")]
    pub(crate) use ::loom::sync::atomic::AtomicI64;
    pub(crate) use ::loom::sync::atomic::AtomicIsize;
    pub(crate) use ::loom::sync::atomic::AtomicU8;
    pub(crate) use ::loom::sync::atomic::AtomicU16;
    pub(crate) use ::loom::sync::atomic::AtomicU32;
    #[cfg(target_has_atomic = "64")]
    pub(crate) use ::loom::sync::atomic::AtomicU64;
    pub(crate) use ::loom::sync::atomic::AtomicUsize;
    pub(crate) use ::loom::sync::atomic::Ordering;
  }

  // loom rejects busy loops that never yield to the scheduler.
  #[inline]
  pub(crate) fn spin() {
    ::loom::thread::yield_now();
  }
}

#[cfg(shuttle)]
pub(crate) mod sync {
  pub(crate) mod atomic {
    pub(crate) use ::shuttle::sync::atomic::AtomicBool;
    pub(crate) use ::shuttle::sync::atomic::AtomicI8;
    pub(crate) use ::shuttle::sync::atomic::AtomicI16;
    pub(crate) use ::shuttle::sync::atomic::AtomicI32;
    #[cfg(target_has_atomic = "64")]
    pub(crate) use ::shuttle::sync::atomic::AtomicI64;
    pub(crate) use ::shuttle::sync::atomic::AtomicIsize;
    pub(crate) use ::shuttle::sync::atomic::AtomicU8;
    pub(crate) use ::shuttle::sync::atomic::AtomicU16;
    pub(crate) use ::shuttle::sync::atomic::AtomicU32;
    #[cfg(target_has_atomic = "64")]
    pub(crate) use ::shuttle::sync::atomic::AtomicU64;
    pub(crate) use ::shuttle::sync::atomic::AtomicUsize;
    pub(crate) use ::shuttle::sync::atomic::Ordering;
  }

  #[inline]
  pub(crate) fn spin() {
    ::shuttle::thread::yield_now();
  }
}

#[cfg(loom)]
pub(crate) mod cell {
  pub(crate) use ::loom::cell::UnsafeCell;
}

#[cfg(not(loom))]
pub(crate) mod cell {
  /// An [`UnsafeCell`] exposing the closure-based access API of loom's cell.
  ///
  /// [`UnsafeCell`]: core::cell::UnsafeCell
  #[derive(Debug)]
  #[repr(transparent)]
  pub(crate) struct UnsafeCell<T> {
    inner: ::core::cell::UnsafeCell<T>,
  }

  impl<T> UnsafeCell<T> {
    #[inline]
    pub(crate) const fn new(value: T) -> Self {
      Self {
        inner: ::core::cell::UnsafeCell::new(value),
      }
    }

    #[inline]
    pub(crate) fn with<F, R>(&self, f: F) -> R
    where
      F: FnOnce(*const T) -> R,
    {
      f(self.inner.get())
    }

    #[inline]
    pub(crate) fn with_mut<F, R>(&self, f: F) -> R
    where
      F: FnOnce(*mut T) -> R,
    {
      f(self.inner.get())
    }
  }
}
