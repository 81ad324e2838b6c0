#![cfg(shuttle)]

use shuttle::sync::Arc;
use shuttle::thread;
use shuttle::thread::JoinHandle;

use fixatom::BoundedLockFreeStack;
use fixatom::BoundedRingBuffer;

const ITERATIONS: usize = 1000;

type ArcStack = Arc<BoundedLockFreeStack<usize, 4>>;

#[test]
fn test_stack_mixed() {
  shuttle::check_random(
    || {
      let stack: ArcStack = Arc::new(BoundedLockFreeStack::new());

      let handles: Vec<JoinHandle<usize>> = (0..3)
        .map(|worker| {
          let stack: ArcStack = ArcStack::clone(&stack);

          thread::spawn(move || {
            let mut pushed: usize = 0;

            for item in 0..2 {
              if stack.push(worker * 10 + item).is_ok() {
                pushed += 1;
              }

              if item == 0 {
                drop(stack.pop());
              }
            }

            pushed
          })
        })
        .collect();

      let pushed: usize = handles.into_iter().map(|handle| handle.join().unwrap()).sum();

      assert!(pushed <= 6);
      assert!(stack.len() <= stack.capacity());
    },
    ITERATIONS,
  );
}

#[test]
fn test_stack_exactly_once() {
  shuttle::check_random(
    || {
      let stack: ArcStack = Arc::new(BoundedLockFreeStack::new());

      let pushers: Vec<JoinHandle<()>> = (0..2)
        .map(|worker| {
          let stack: ArcStack = ArcStack::clone(&stack);
          thread::spawn(move || {
            for item in 0..2 {
              stack.push(worker * 2 + item).unwrap();
            }
          })
        })
        .collect();

      let poppers: Vec<JoinHandle<Vec<usize>>> = (0..2)
        .map(|_| {
          let stack: ArcStack = ArcStack::clone(&stack);
          thread::spawn(move || (0..2).filter_map(|_| stack.pop()).collect())
        })
        .collect();

      for handle in pushers {
        handle.join().unwrap();
      }

      let mut seen: Vec<usize> = poppers
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();

      while let Some(item) = stack.pop() {
        seen.push(item);
      }

      seen.sort_unstable();

      assert_eq!(seen, [0, 1, 2, 3]);
    },
    ITERATIONS,
  );
}

#[test]
fn test_stack_pop_waits_for_pending_push() {
  shuttle::check_random(
    || {
      let stack: ArcStack = Arc::new(BoundedLockFreeStack::new());
      let pusher: ArcStack = ArcStack::clone(&stack);

      let push: JoinHandle<Result<(), usize>> = thread::spawn(move || pusher.push(7));
      let popped: Option<usize> = stack.pop();

      assert_eq!(push.join().unwrap(), Ok(()));
      assert_eq!(popped.or_else(|| stack.pop()), Some(7));
      assert!(stack.is_empty());
    },
    ITERATIONS,
  );
}

#[test]
fn test_ring_fifo() {
  shuttle::check_random(
    || {
      let ring: Arc<BoundedRingBuffer<usize, 3>> = Arc::new(BoundedRingBuffer::new());
      let producer: Arc<BoundedRingBuffer<usize, 3>> = Arc::clone(&ring);

      let push: JoinHandle<()> = thread::spawn(move || {
        for item in 0..4 {
          let mut item: usize = item;

          // SAFETY: This is the only pushing thread.
          while let Err(back) = unsafe { producer.push_unchecked(item) } {
            item = back;
            thread::yield_now();
          }
        }
      });

      let mut expected: usize = 0;

      while expected < 4 {
        // SAFETY: This is the only popping thread.
        match unsafe { ring.pop_unchecked() } {
          Some(item) => {
            assert_eq!(item, expected);
            expected += 1;
          }
          None => thread::yield_now(),
        }
      }

      push.join().unwrap();
    },
    ITERATIONS,
  );
}
