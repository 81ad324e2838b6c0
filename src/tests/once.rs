use std::sync::Arc;
use std::sync::Barrier;
use std::thread;

use crate::once::OnceLatch;

#[test]
fn fires_once() {
  let latch: OnceLatch = OnceLatch::new();

  assert!(latch.is_armed());
  assert!(latch.check());
  assert!(!latch.is_armed());
  assert!(!latch.check());
  assert!(!latch.check());
}

#[test]
fn reset_rearms() {
  let latch: OnceLatch = OnceLatch::default();

  assert!(latch.check());

  latch.reset();

  assert!(latch.is_armed());
  assert!(latch.check());
  assert!(!latch.check());
}

#[test]
fn try_consume_failed_consumes() {
  let latch: OnceLatch = OnceLatch::new();

  assert!(latch.is_armed());
  assert!(!latch.try_consume_failed());
  assert!(!latch.is_armed());
  assert!(latch.try_consume_failed());
  assert!(!latch.check());

  latch.reset();

  assert!(!latch.try_consume_failed());
}

#[test]
fn single_winner_across_threads() {
  const THREADS: usize = 8;

  let latch: Arc<OnceLatch> = Arc::new(OnceLatch::new());
  let barrier: Arc<Barrier> = Arc::new(Barrier::new(THREADS));

  let handles: Vec<thread::JoinHandle<bool>> = (0..THREADS)
    .map(|_| {
      let latch: Arc<OnceLatch> = Arc::clone(&latch);
      let barrier: Arc<Barrier> = Arc::clone(&barrier);

      thread::spawn(move || {
        barrier.wait();
        latch.check()
      })
    })
    .collect();

  let winners: usize = handles
    .into_iter()
    .map(|handle| handle.join().unwrap())
    .filter(|won| *won)
    .count();

  assert_eq!(winners, 1);
}
