//! Fixed-bucket concurrent hash dictionary.
//!
//! Every bucket is a lock-free singly linked chain. New nodes are always
//! prepended with a CAS on the bucket head. Removal is two-phase: the victim's
//! outgoing link is marked first (logical removal), then the node is spliced
//! out of its predecessor. Any writer that walks past a marked node helps
//! splice it out. Nodes are reference counted and released through epochs, so a
//! reader that reached a node keeps a valid view of it until its guard drops.

use core::borrow::Borrow;
use core::fmt::Debug;
use core::fmt::DebugMap;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::hash::BuildHasher;
use core::hash::Hash;
use std::hash::RandomState;

use crossbeam_utils::CachePadded;
use tracing::trace;

use crate::array::Array;
use crate::error::Error;
use crate::reclaim::Guard;
use crate::reclaim::Link;
use crate::reclaim::Owned;
use crate::reclaim::Shared;
use crate::sync::atomic::AtomicUsize;
use crate::sync::atomic::Ordering::Acquire;
use crate::sync::atomic::Ordering::Relaxed;

struct Node<K, V> {
  key: K,
  value: V,
  next: Link<Node<K, V>>,
}

impl<K, V> Node<K, V> {
  #[inline]
  const fn new(key: K, value: V) -> Self {
    Self {
      key,
      value,
      next: Link::null(),
    }
  }
}

/// A concurrent hash map over a fixed number of buckets.
///
/// `S` is the bucket count (16 by default) and never changes; chains simply
/// grow as entries are added. Keys are hashed with `H`, which defaults to the
/// standard library's [`RandomState`].
///
/// # Examples
///
/// ```
/// use fixatom::ConcurrentHashDictionary;
///
/// let dict: ConcurrentHashDictionary<&str, u32> = ConcurrentHashDictionary::new();
///
/// dict.insert_or_assign("a", 1);
/// dict.insert_or_assign("a", 2);
/// assert_eq!(dict.find("a"), Some(2));
///
/// assert!(dict.remove("a"));
/// assert!(!dict.contains("a"));
/// ```
///
/// # Duplicates
///
/// [`insert()`] and [`emplace()`] always add a node, even if the key is
/// already present; lookups then return whichever node comes first in the
/// chain. [`insert_or_assign()`] and [`try_emplace()`] keep one node per key.
///
/// # Consistency
///
/// Each operation is linearizable on its own bucket. [`len()`] is a counter
/// maintained next to the chains and may briefly disagree with them while
/// writers are in flight. [`each()`] and [`keys()`] walk the live chains and
/// may observe some concurrent changes but not others.
///
/// [`insert()`]: Self::insert
/// [`emplace()`]: Self::emplace
/// [`insert_or_assign()`]: Self::insert_or_assign
/// [`try_emplace()`]: Self::try_emplace
/// [`len()`]: Self::len
/// [`each()`]: Self::each
/// [`keys()`]: Self::keys
pub struct ConcurrentHashDictionary<K, V, const S: usize = 16, H = RandomState> {
  buckets: Array<Link<Node<K, V>>, S>,
  count: CachePadded<AtomicUsize>,
  hasher: H,
}

impl<K, V, const S: usize> ConcurrentHashDictionary<K, V, S> {
  /// Creates a new, empty dictionary with a randomly seeded hasher.
  #[inline]
  pub fn new() -> Self {
    Self::with_hasher(RandomState::new())
  }
}

impl<K, V, const S: usize, H> ConcurrentHashDictionary<K, V, S, H> {
  const ASSERT_BUCKETS: () = assert!(S > 0, "invalid params: bucket count must be non-zero");

  /// Creates a new, empty dictionary that hashes keys with `hasher`.
  #[inline]
  pub fn with_hasher(hasher: H) -> Self {
    let () = Self::ASSERT_BUCKETS;

    Self {
      buckets: Array::new(|_| Link::null()),
      count: CachePadded::new(AtomicUsize::new(0)),
      hasher,
    }
  }

  /// Returns the number of buckets.
  #[inline]
  pub const fn buckets(&self) -> usize {
    S
  }

  /// Returns the hasher used for bucket selection.
  #[inline]
  pub const fn hasher(&self) -> &H {
    &self.hasher
  }

  /// Returns the number of entries.
  ///
  /// Approximate while other threads are inserting or removing.
  #[inline]
  pub fn len(&self) -> usize {
    self.count.load(Relaxed)
  }

  /// Returns `true` if the dictionary has no entries.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Calls `f` on every live entry, bucket by bucket.
  pub fn each<F>(&self, mut f: F)
  where
    F: FnMut(&K, &V),
  {
    let guard: Guard = Guard::new();

    for link in self.buckets.as_slice() {
      let mut current: Shared<'_, Node<K, V>> = link.load(Acquire, &guard);

      while let Some(node) = current.as_ref() {
        let next: Shared<'_, Node<K, V>> = node.next.load(Acquire, &guard);

        if !next.is_marked() {
          f(&node.key, &node.value);
        }

        current = next;
      }
    }
  }

  /// Returns a copy of every live key.
  pub fn keys(&self) -> Vec<K>
  where
    K: Clone,
  {
    let mut keys: Vec<K> = Vec::new();

    self.each(|key, _| keys.push(key.clone()));

    keys
  }

  /// Removes every entry.
  pub fn clear(&mut self) {
    for link in self.buckets.as_slice() {
      drop(link.take());
    }

    self.count.store(0, Relaxed);
  }

  /// Returns the first live node for `key` at or after `current`.
  fn scan<'guard, Q>(
    mut current: Shared<'guard, Node<K, V>>,
    key: &Q,
    guard: &'guard Guard,
  ) -> Option<&'guard Node<K, V>>
  where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
  {
    while let Some(node) = current.as_ref() {
      let next: Shared<'guard, Node<K, V>> = node.next.load(Acquire, guard);

      if !next.is_marked() && node.key.borrow() == key {
        return Some(node);
      }

      current = next;
    }

    None
  }

  /// Marks `node` as removed. Returns `false` if another thread got there first.
  fn delete<'guard>(node: &'guard Node<K, V>, guard: &'guard Guard) -> bool {
    let mut next: Shared<'guard, Node<K, V>> = node.next.load(Acquire, guard);

    loop {
      if next.is_marked() {
        return false;
      }

      match node.next.mark(next, guard) {
        Ok(()) => return true,
        Err(actual) => next = actual,
      }
    }
  }

  /// Splices every marked node out of the chain in bucket `index`.
  fn purge(&self, index: usize, guard: &Guard) {
    let head: &Link<Node<K, V>> = &self.buckets[index];

    'restart: loop {
      let mut prev: &Link<Node<K, V>> = head;
      let mut current: Shared<'_, Node<K, V>> = prev.load(Acquire, guard);

      while let Some(node) = current.as_ref() {
        // The predecessor itself was removed; its link is frozen.
        if current.is_marked() {
          continue 'restart;
        }

        let next: Shared<'_, Node<K, V>> = node.next.load(Acquire, guard);

        if next.is_marked() {
          if prev.splice(current, next, guard).is_err() {
            continue 'restart;
          }

          trace!(bucket = index, "unlinked removed node");

          current = prev.load(Acquire, guard);
        } else {
          prev = &node.next;
          current = next;
        }
      }

      break;
    }
  }
}

impl<K, V, const S: usize, H> ConcurrentHashDictionary<K, V, S, H>
where
  K: Eq + Hash,
  H: BuildHasher,
{
  /// Calls `f` with the value for `key`, if present.
  ///
  /// The value is borrowed in place; no copy is made.
  pub fn with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
  where
    K: Borrow<Q>,
    Q: Eq + Hash + ?Sized,
    F: FnOnce(&V) -> R,
  {
    let guard: Guard = Guard::new();
    let head: Shared<'_, Node<K, V>> = self.buckets[self.index(key)].load(Acquire, &guard);

    Self::scan(head, key, &guard).map(|node| f(&node.value))
  }

  /// Returns a copy of the value for `key`, if present.
  #[inline]
  pub fn find<Q>(&self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Eq + Hash + ?Sized,
    V: Clone,
  {
    self.with(key, V::clone)
  }

  /// Returns a copy of the value for `key`.
  ///
  /// # Errors
  ///
  /// Returns [`Error::KeyNotFound`] if the key is not present.
  #[inline]
  pub fn at<Q>(&self, key: &Q) -> Result<V, Error>
  where
    K: Borrow<Q>,
    Q: Eq + Hash + ?Sized,
    V: Clone,
  {
    self.find(key).ok_or(Error::KeyNotFound)
  }

  /// Returns `true` if `key` is present.
  #[inline]
  pub fn contains<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Eq + Hash + ?Sized,
  {
    self.with(key, |_| ()).is_some()
  }

  /// Removes one entry for `key`. Returns `false` if none was present.
  pub fn remove<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Eq + Hash + ?Sized,
  {
    let guard: Guard = Guard::new();
    let index: usize = self.index(key);

    loop {
      let head: Shared<'_, Node<K, V>> = self.buckets[index].load(Acquire, &guard);

      let Some(node) = Self::scan(head, key, &guard) else {
        return false;
      };

      // Losing the mark race means a concurrent remover took this node;
      // rescan for another entry with the same key.
      if Self::delete(node, &guard) {
        self.count.fetch_sub(1, Relaxed);
        self.purge(index, &guard);
        return true;
      }
    }
  }

  #[inline]
  fn index<Q>(&self, key: &Q) -> usize
  where
    Q: Hash + ?Sized,
  {
    (self.hasher.hash_one(key) % S as u64) as usize
  }
}

impl<K, V, const S: usize, H> ConcurrentHashDictionary<K, V, S, H>
where
  K: Eq + Hash + 'static,
  V: 'static,
  H: BuildHasher,
{
  /// Adds an entry, even if `key` is already present.
  pub fn insert(&self, key: K, value: V) {
    let guard: Guard = Guard::new();
    let index: usize = self.index(&key);
    let node: Owned<Node<K, V>> = Owned::new(Node::new(key, value));

    self.count.fetch_add(1, Relaxed);
    self.prepend(index, &node, &guard);
  }

  /// Adds an entry whose value is built by `init`, even if `key` is already
  /// present.
  ///
  /// `init` runs exactly once, before the entry becomes visible.
  #[inline]
  pub fn emplace<F>(&self, key: K, init: F)
  where
    F: FnOnce() -> V,
  {
    self.insert(key, init());
  }

  /// Sets the value for `key`, replacing any existing entries.
  ///
  /// The new entry shadows older ones as soon as it is published; the older
  /// ones are then removed. Returns `true` if at least one was replaced.
  pub fn insert_or_assign(&self, key: K, value: V) -> bool {
    let guard: Guard = Guard::new();
    let index: usize = self.index(&key);
    let node: Owned<Node<K, V>> = Owned::new(Node::new(key, value));

    self.count.fetch_add(1, Relaxed);
    self.prepend(index, &node, &guard);

    let mut replaced: bool = false;
    let mut current: Shared<'_, Node<K, V>> = node.next.load(Acquire, &guard);

    while let Some(older) = current.as_ref() {
      if older.key == node.key && Self::delete(older, &guard) {
        self.count.fetch_sub(1, Relaxed);
        replaced = true;
      }

      current = older.next.load(Acquire, &guard);
    }

    if replaced {
      self.purge(index, &guard);
    }

    replaced
  }

  /// Adds an entry only if `key` is absent. Returns `true` if it was added.
  ///
  /// The check and the insertion are one atomic step: of several concurrent
  /// calls for the same absent key, exactly one succeeds.
  pub fn try_emplace(&self, key: K, value: V) -> bool {
    let guard: Guard = Guard::new();
    let index: usize = self.index(&key);
    let link: &Link<Node<K, V>> = &self.buckets[index];
    let node: Owned<Node<K, V>> = Owned::new(Node::new(key, value));

    self.count.fetch_add(1, Relaxed);

    let mut retries: usize = 0;

    loop {
      let head: Shared<'_, Node<K, V>> = link.load(Acquire, &guard);

      if Self::scan(head, &node.key, &guard).is_some() {
        self.count.fetch_sub(1, Relaxed);
        return false;
      }

      // Every insertion moves the head, so publishing against the scanned
      // head proves the key is still absent.
      if node.next.prepare(head) && link.publish(head, &node, &guard).is_ok() {
        break;
      }

      retries += 1;
    }

    if retries != 0 {
      trace!(bucket = index, retries, "contended insert-if-absent");
    }

    true
  }

  fn prepend(&self, index: usize, node: &Owned<Node<K, V>>, guard: &Guard) {
    let link: &Link<Node<K, V>> = &self.buckets[index];
    let mut head: Shared<'_, Node<K, V>> = link.load(Acquire, guard);
    let mut retries: usize = 0;

    loop {
      if node.next.prepare(head) {
        match link.publish(head, node, guard) {
          Ok(()) => break,
          Err(actual) => head = actual,
        }
      } else {
        head = link.load(Acquire, guard);
      }

      retries += 1;
    }

    if retries != 0 {
      trace!(bucket = index, retries, "contended bucket head");
    }
  }
}

impl<K, V, const S: usize, H> Debug for ConcurrentHashDictionary<K, V, S, H>
where
  K: Debug,
  V: Debug,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    let mut map: DebugMap<'_, '_> = f.debug_map();

    self.each(|key, value| {
      map.entry(key, value);
    });

    map.finish()
  }
}

impl<K, V, const S: usize, H> Default for ConcurrentHashDictionary<K, V, S, H>
where
  H: Default,
{
  #[inline]
  fn default() -> Self {
    Self::with_hasher(H::default())
  }
}
