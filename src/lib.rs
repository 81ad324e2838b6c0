//! Fixed-capacity lock-free containers and atomic adapters.
//!
//! `fixatom` provides a small family of concurrent building blocks that never
//! take a lock and never grow after construction:
//!
//! - [`SequenceCounter`]: hands out increasing ticket numbers.
//! - [`OnceLatch`]: lets exactly one caller through until it is reset.
//! - [`BoundedLockFreeStack`]: a fixed-capacity multi-producer multi-consumer
//!   LIFO.
//! - [`BoundedRingBuffer`]: a fixed-capacity single-producer single-consumer
//!   FIFO.
//! - [`ConcurrentHashDictionary`]: a hash map over a fixed number of lock-free
//!   bucket chains.
//! - [`AtomicRef`]: atomic access to an integer that was declared plain.
//!
//! # Usage
//!
//! ```
//! use fixatom::{BoundedLockFreeStack, ConcurrentHashDictionary, SequenceCounter};
//!
//! let tickets: SequenceCounter<u64> = SequenceCounter::new(1);
//! let pending: BoundedLockFreeStack<u64, 64> = BoundedLockFreeStack::new();
//! let owners: ConcurrentHashDictionary<u64, &str> = ConcurrentHashDictionary::new();
//!
//! let ticket = tickets.next();
//!
//! pending.push(ticket).unwrap();
//! owners.insert_or_assign(ticket, "worker-1");
//!
//! let job = pending.pop().unwrap();
//! assert_eq!(owners.find(&job), Some("worker-1"));
//! ```
//!
//! # Backpressure
//!
//! Nothing in this crate waits for capacity. A full container hands the
//! rejected item back, an empty one returns [`None`], and the caller decides
//! whether to retry, back off, or drop work:
//!
//! ```
//! use fixatom::BoundedLockFreeStack;
//!
//! let stack: BoundedLockFreeStack<&str, 3> = BoundedLockFreeStack::new();
//!
//! for item in ["a", "b", "c"] {
//!   stack.push(item).unwrap();
//! }
//!
//! assert_eq!(stack.push("d"), Err("d"));
//! ```
//!
//! Rejections are reported through [`tracing`] at `TRACE` level; install a
//! subscriber to see them.
//!
//! The one place a thread waits on another is inside
//! [`BoundedLockFreeStack`]: when a push and a pop reserve the same index, the
//! later one spins until the earlier one has finished writing or reading that
//! slot. The wait is a handful of instructions unless the peer is descheduled
//! in between, in which case it lasts until the peer runs again. The ring
//! buffer, the dictionary and the scalar types never wait on a peer.
//!
//! # Capacity
//!
//! Capacities and bucket counts are const generics. The stack and ring buffer
//! require a capacity bigger than 2 and the dictionary at least one bucket;
//! anything smaller fails to compile:
//!
//! ```compile_fail
//! use fixatom::BoundedRingBuffer;
//!
//! let ring: BoundedRingBuffer<u32, 2> = BoundedRingBuffer::new();
//! ```
//!
//! ```compile_fail
//! use fixatom::BoundedLockFreeStack;
//!
//! let stack: BoundedLockFreeStack<u32, 2> = BoundedLockFreeStack::new();
//! ```
//!
//! ```compile_fail
//! use fixatom::ConcurrentHashDictionary;
//!
//! let map: ConcurrentHashDictionary<u32, u32, 0> = ConcurrentHashDictionary::new();
//! ```
//!
//! ## Memory Reclamation
//!
//! Dictionary nodes are reference counted and released through epoch-based
//! reclamation via [`sdd`]. A reader that reached a node keeps a valid view of
//! it even while another thread removes it.
//!
//! # Memory Layout
//!
//! Slot storage is allocated once, aligned to [`CACHE_LINE`], and the
//! producer-side and consumer-side indices live on separate cache lines.
//!
//! [`sdd`]: https://docs.rs/sdd
//! [`tracing`]: https://docs.rs/tracing
//! [`CACHE_LINE`]: crate::array::CACHE_LINE
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod atomic_ref;
mod dictionary;
mod error;
mod once;
mod reclaim;
mod ring;
mod sequence;
mod stack;
mod utils;

pub mod array;
pub mod int;

#[cfg(all(test, not(any(loom, shuttle))))]
mod tests;

pub(crate) use crate::utils::alloc;
pub(crate) use crate::utils::cell;
pub(crate) use crate::utils::sync;

pub mod implementation {
  #![doc = include_str!("../IMPLEMENTATION.md")]
}

pub use self::atomic_ref::AtomicRef;
pub use self::dictionary::ConcurrentHashDictionary;
pub use self::error::Error;
pub use self::once::OnceLatch;
pub use self::ring::BoundedRingBuffer;
pub use self::ring::Consumer;
pub use self::ring::Producer;
pub use self::sequence::SequenceCounter;
pub use self::stack::BoundedLockFreeStack;
