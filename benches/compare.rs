use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::RwLock;

use crossbeam_queue::ArrayQueue;
use divan::Bencher;
use divan::bench;
use divan::bench_group;
use divan::black_box;
use fixatom::BoundedLockFreeStack;
use fixatom::ConcurrentHashDictionary;

const CAPACITY: usize = 1 << 12;

type Stack<T> = BoundedLockFreeStack<T, CAPACITY>;
type Dictionary<K, V> = ConcurrentHashDictionary<K, V, 256>;

const OPS: &[usize] = &[1 << 4, 1 << 6, 1 << 8, 1 << 10, 1 << 12];

const THREADS: &[usize] = &[0, 1, 4, 8, 16];

// -----------------------------------------------------------------------------
// Unify APIs for Simplicity
// -----------------------------------------------------------------------------

trait Bounded<T>: Sized + Send + Sync + 'static
where
  T: Send + 'static,
{
  fn new() -> Self;

  fn put(&self, value: T) -> bool;

  fn take(&self) -> Option<T>;
}

impl<T> Bounded<T> for Stack<T>
where
  T: Send + 'static,
{
  fn new() -> Self {
    BoundedLockFreeStack::new()
  }

  fn put(&self, value: T) -> bool {
    self.push(value).is_ok()
  }

  fn take(&self) -> Option<T> {
    self.pop()
  }
}

impl<T> Bounded<T> for ArrayQueue<T>
where
  T: Send + 'static,
{
  fn new() -> Self {
    ArrayQueue::new(CAPACITY)
  }

  fn put(&self, value: T) -> bool {
    self.push(value).is_ok()
  }

  fn take(&self) -> Option<T> {
    self.pop()
  }
}

impl<T> Bounded<T> for Mutex<Vec<T>>
where
  T: Send + 'static,
{
  fn new() -> Self {
    Mutex::new(Vec::with_capacity(CAPACITY))
  }

  fn put(&self, value: T) -> bool {
    let mut guard: MutexGuard<'_, Vec<T>> = self.lock().unwrap();

    if guard.len() == CAPACITY {
      return false;
    }

    guard.push(value);
    true
  }

  fn take(&self) -> Option<T> {
    self.lock().unwrap().pop()
  }
}

trait Map: Sized + Send + Sync + 'static {
  fn new() -> Self;

  fn set(&self, key: usize, value: usize);

  fn get(&self, key: usize) -> Option<usize>;
}

impl Map for Dictionary<usize, usize> {
  fn new() -> Self {
    ConcurrentHashDictionary::new()
  }

  fn set(&self, key: usize, value: usize) {
    self.insert_or_assign(key, value);
  }

  fn get(&self, key: usize) -> Option<usize> {
    self.find(&key)
  }
}

impl Map for RwLock<HashMap<usize, usize>> {
  fn new() -> Self {
    RwLock::new(HashMap::new())
  }

  fn set(&self, key: usize, value: usize) {
    self.write().unwrap().insert(key, value);
  }

  fn get(&self, key: usize) -> Option<usize> {
    self.read().unwrap().get(&key).copied()
  }
}

// -----------------------------------------------------------------------------
// Actual Benchmarks
// -----------------------------------------------------------------------------

#[bench_group(name = "PushPop", skip_ext_time, threads = THREADS)]
mod push_pop {
  use super::bench;
  use super::*;

  fn bench<T>(bencher: Bencher<'_, '_>, ops: usize)
  where
    T: Bounded<usize>,
  {
    let this: T = <T as Bounded<usize>>::new();

    bencher.counter(ops).bench(move || {
      for index in 0..ops {
        let pushed: bool = black_box(this.put(black_box(index)));
        let popped: Option<usize> = black_box(this.take());
        _ = black_box((pushed, popped));
      }
    });
  }

  #[bench(args = OPS)]
  fn bench_stack(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<Stack<usize>>(bencher, ops);
  }

  #[bench(args = OPS)]
  fn bench_array_queue(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<ArrayQueue<usize>>(bencher, ops);
  }

  #[bench(args = OPS)]
  fn bench_mutex(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<Mutex<Vec<usize>>>(bencher, ops);
  }
}

#[bench_group(name = "Fill", skip_ext_time)]
mod fill {
  use super::bench;
  use super::*;

  fn bench<T>(bencher: Bencher<'_, '_>, ops: usize)
  where
    T: Bounded<usize>,
  {
    bencher
      .counter(ops)
      .with_inputs(<T as Bounded<usize>>::new)
      .bench_local_refs(move |this: &mut T| {
        for index in 0..ops {
          let pushed: bool = black_box(this.put(black_box(index)));
          _ = black_box(pushed);
        }
      });
  }

  #[bench(args = OPS)]
  fn bench_stack(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<Stack<usize>>(bencher, ops);
  }

  #[bench(args = OPS)]
  fn bench_array_queue(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<ArrayQueue<usize>>(bencher, ops);
  }

  #[bench(args = OPS)]
  fn bench_mutex(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<Mutex<Vec<usize>>>(bencher, ops);
  }
}

#[bench_group(name = "ReadHot", skip_ext_time, threads = THREADS)]
mod read_hot {
  use super::bench;
  use super::*;

  fn bench<T>(bencher: Bencher<'_, '_>, ops: usize)
  where
    T: Map,
  {
    let this: T = T::new();

    for key in 0..ops {
      this.set(key, key);
    }

    bencher.counter(ops).bench(move || {
      for key in 0..ops {
        let item: Option<usize> = black_box(this.get(black_box(key)));
        _ = black_box(item.unwrap());
      }
    });
  }

  #[bench(args = OPS)]
  fn bench_dictionary(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<Dictionary<usize, usize>>(bencher, ops);
  }

  #[bench(args = OPS)]
  fn bench_rwlock(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<RwLock<HashMap<usize, usize>>>(bencher, ops);
  }
}

#[bench_group(name = "Assign", skip_ext_time, threads = THREADS)]
mod assign {
  use super::bench;
  use super::*;

  fn bench<T>(bencher: Bencher<'_, '_>, ops: usize)
  where
    T: Map,
  {
    let this: T = T::new();

    bencher.counter(ops).bench(move || {
      for key in 0..ops {
        this.set(black_box(key % 64), key);
      }
    });
  }

  #[bench(args = OPS)]
  fn bench_dictionary(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<Dictionary<usize, usize>>(bencher, ops);
  }

  #[bench(args = OPS)]
  fn bench_rwlock(bencher: Bencher<'_, '_>, ops: usize) {
    bench::<RwLock<HashMap<usize, usize>>>(bencher, ops);
  }
}

// -----------------------------------------------------------------------------
// Main
// -----------------------------------------------------------------------------

fn main() {
  divan::main();
}
