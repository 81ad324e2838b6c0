#![cfg(loom)]

use loom::sync::Arc;
use loom::thread;
use loom::thread::JoinHandle;
use std::ops::Deref;

use fixatom::BoundedLockFreeStack;
use fixatom::BoundedRingBuffer;
use fixatom::OnceLatch;
use fixatom::SequenceCounter;

type Push = JoinHandle<Result<(), usize>>;
type Pop = JoinHandle<Option<usize>>;

type ArcStack = Arc<BoundedLockFreeStack<usize, 3>>;
type ArcRing = Arc<BoundedRingBuffer<usize, 3>>;

struct LoomStack {
  inner: ArcStack,
}

impl LoomStack {
  fn new() -> Self {
    Self {
      inner: Arc::new(BoundedLockFreeStack::new()),
    }
  }

  fn spawn_push(&self, value: usize) -> Push {
    let stack: ArcStack = ArcStack::clone(&self.inner);
    thread::spawn(move || stack.push(value))
  }

  fn spawn_pop(&self) -> Pop {
    let stack: ArcStack = ArcStack::clone(&self.inner);
    thread::spawn(move || stack.pop())
  }
}

impl Deref for LoomStack {
  type Target = ArcStack;

  #[inline]
  fn deref(&self) -> &Self::Target {
    &self.inner
  }
}

// -----------------------------------------------------------------------------
// Stack
// -----------------------------------------------------------------------------

#[test]
fn test_stack_push() {
  loom::model(|| {
    let stack: LoomStack = LoomStack::new();

    let thread_a: Push = stack.spawn_push(1);
    let thread_b: Push = stack.spawn_push(2);

    assert_eq!(thread_a.join().unwrap(), Ok(()));
    assert_eq!(thread_b.join().unwrap(), Ok(()));
    assert_eq!(stack.len(), 2);

    let mut popped: [usize; 2] = [stack.pop().unwrap(), stack.pop().unwrap()];

    popped.sort_unstable();

    assert_eq!(popped, [1, 2]);
    assert_eq!(stack.pop(), None);
  });
}

#[test]
fn test_stack_push_full() {
  loom::model(|| {
    let stack: LoomStack = LoomStack::new();

    stack.push(1).unwrap();
    stack.push(2).unwrap();

    let thread_a: Push = stack.spawn_push(3);
    let thread_b: Push = stack.spawn_push(4);

    let result_a: Result<(), usize> = thread_a.join().unwrap();
    let result_b: Result<(), usize> = thread_b.join().unwrap();

    assert!(result_a.is_ok() ^ result_b.is_ok());
    assert!(stack.is_full());
  });
}

#[test]
fn test_stack_push_pop() {
  loom::model(|| {
    let stack: LoomStack = LoomStack::new();

    stack.push(1).unwrap();

    let push: Push = stack.spawn_push(2);
    let pop: Pop = stack.spawn_pop();

    assert_eq!(push.join().unwrap(), Ok(()));

    let popped: usize = pop.join().unwrap().unwrap();
    let rest: usize = stack.pop().unwrap();

    assert!(matches!((popped, rest), (1, 2) | (2, 1)));
    assert_eq!(stack.pop(), None);
  });
}

#[test]
fn test_stack_pop_pop() {
  loom::model(|| {
    let stack: LoomStack = LoomStack::new();

    stack.push(1).unwrap();
    stack.push(2).unwrap();

    let pop_a: Pop = stack.spawn_pop();
    let pop_b: Pop = stack.spawn_pop();

    let mut popped: [usize; 2] = [pop_a.join().unwrap().unwrap(), pop_b.join().unwrap().unwrap()];

    popped.sort_unstable();

    assert_eq!(popped, [1, 2]);
    assert!(stack.is_empty());
  });
}

#[test]
fn test_stack_pop_waits_for_pending_push() {
  loom::model(|| {
    let stack: LoomStack = LoomStack::new();

    // The pop may reserve index 0 before the push has published into it.
    let push: Push = stack.spawn_push(1);
    let popped: Option<usize> = stack.pop();

    assert_eq!(push.join().unwrap(), Ok(()));

    let popped: Option<usize> = popped.or_else(|| stack.pop());

    assert_eq!(popped, Some(1));
    assert!(stack.is_empty());
  });
}

// -----------------------------------------------------------------------------
// Ring Buffer
// -----------------------------------------------------------------------------

#[test]
fn test_ring_push_pop() {
  loom::model(|| {
    let ring: ArcRing = Arc::new(BoundedRingBuffer::new());
    let producer: ArcRing = ArcRing::clone(&ring);

    let push: JoinHandle<()> = thread::spawn(move || {
      // SAFETY: This is the only pushing thread.
      unsafe {
        assert_eq!(producer.push_unchecked(1), Ok(()));
        assert_eq!(producer.push_unchecked(2), Ok(()));
      }
    });

    let mut popped: Vec<usize> = Vec::with_capacity(2);

    // SAFETY: This is the only popping thread.
    if let Some(item) = unsafe { ring.pop_unchecked() } {
      popped.push(item);
    }

    push.join().unwrap();

    // SAFETY: The producer has finished.
    while let Some(item) = unsafe { ring.pop_unchecked() } {
      popped.push(item);
    }

    assert_eq!(popped, [1, 2]);
  });
}

// -----------------------------------------------------------------------------
// Latch / Sequence
// -----------------------------------------------------------------------------

#[test]
fn test_latch_single_winner() {
  loom::model(|| {
    let latch: Arc<OnceLatch> = Arc::new(OnceLatch::new());

    let handles: Vec<JoinHandle<bool>> = (0..2)
      .map(|_| {
        let latch: Arc<OnceLatch> = Arc::clone(&latch);
        thread::spawn(move || latch.check())
      })
      .collect();

    let winners: usize = handles
      .into_iter()
      .map(|handle| handle.join().unwrap())
      .filter(|won| *won)
      .count();

    assert_eq!(winners, 1);
  });
}

#[test]
fn test_sequence_unique() {
  loom::model(|| {
    let counter: Arc<SequenceCounter<u8>> = Arc::new(SequenceCounter::new(0));
    let other: Arc<SequenceCounter<u8>> = Arc::clone(&counter);

    let handle: JoinHandle<u8> = thread::spawn(move || other.next());
    let local: u8 = counter.next();
    let remote: u8 = handle.join().unwrap();

    assert_ne!(local, remote);
    assert_eq!(counter.load(), 2);
  });
}
