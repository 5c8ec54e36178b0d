use crate::gc::{Handle, Heap};
use crate::value::Value;

use std::mem;

/// FNV-1a, the hash cached by every interned string
pub fn hash_str(chars: &str) -> u32 {
  let mut hash: u32 = 2_166_136_261;
  for byte in chars.bytes() {
    hash ^= u32::from(byte);
    hash = hash.wrapping_mul(16_777_619);
  }
  hash
}

/// An interned string handle paired with its cached hash.
///
/// Strings are interned, so key equality is handle equality and probing never
/// has to look at the heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StringKey {
  pub string: Handle,
  pub hash: u32,
}

#[derive(Clone, Copy, Debug)]
enum Bucket {
  Empty,
  Tombstone,
  Entry { key: StringKey, value: Value },
}

/// An open-addressed hash table keyed by interned strings.
///
/// Power-of-two capacity, linear probing, grown at 75% load. Deleted entries
/// leave tombstones so probe sequences stay intact; growth drops them.
#[derive(Debug)]
pub struct Table {
  buckets: Vec<Bucket>,
  // live entries plus tombstones, compared against the load limit
  count: usize,
}

impl Table {
  pub fn new() -> Self {
    Self {
      buckets: Vec::new(),
      count: 0,
    }
  }

  pub fn get(&self, key: StringKey) -> Option<Value> {
    if self.buckets.is_empty() {
      return None;
    }

    let mut index = (key.hash as usize) & (self.buckets.len() - 1);
    loop {
      match self.buckets[index] {
        Bucket::Empty => return None,
        Bucket::Tombstone => {}
        Bucket::Entry { key: found, value } => {
          if found.string == key.string {
            return Some(value);
          }
        }
      }
      index = (index + 1) & (self.buckets.len() - 1);
    }
  }

  /// Inserts a value, returning true if the key was not already present
  pub fn insert(&mut self, key: StringKey, value: Value) -> bool {
    if (self.count + 1) * 4 > self.buckets.len() * 3 {
      self.grow();
    }

    let index = self.find_slot(key);
    match self.buckets[index] {
      Bucket::Entry { .. } => {
        self.buckets[index] = Bucket::Entry { key, value };
        false
      }
      Bucket::Tombstone => {
        self.buckets[index] = Bucket::Entry { key, value };
        true
      }
      Bucket::Empty => {
        self.buckets[index] = Bucket::Entry { key, value };
        self.count += 1;
        true
      }
    }
  }

  pub fn remove(&mut self, key: StringKey) -> bool {
    if self.buckets.is_empty() {
      return false;
    }

    let index = self.find_slot(key);
    if matches!(self.buckets[index], Bucket::Entry { .. }) {
      self.buckets[index] = Bucket::Tombstone;
      true
    } else {
      false
    }
  }

  /// The slot holding `key`, or the slot an insert of `key` should use
  /// (the first tombstone on the probe path, otherwise the empty bucket).
  fn find_slot(&self, key: StringKey) -> usize {
    let mut index = (key.hash as usize) & (self.buckets.len() - 1);
    let mut tombstone = None;

    loop {
      match self.buckets[index] {
        Bucket::Empty => return tombstone.unwrap_or(index),
        Bucket::Tombstone => {
          if tombstone.is_none() {
            tombstone = Some(index);
          }
        }
        Bucket::Entry { key: found, .. } => {
          if found.string == key.string {
            return index;
          }
        }
      }
      index = (index + 1) & (self.buckets.len() - 1);
    }
  }

  fn grow(&mut self) {
    let capacity = (self.buckets.len() * 2).max(8);
    let old = mem::replace(&mut self.buckets, vec![Bucket::Empty; capacity]);
    self.count = 0;

    for bucket in old {
      if let Bucket::Entry { key, value } = bucket {
        let mut index = (key.hash as usize) & (capacity - 1);
        while matches!(self.buckets[index], Bucket::Entry { .. }) {
          index = (index + 1) & (capacity - 1);
        }
        self.buckets[index] = Bucket::Entry { key, value };
        self.count += 1;
      }
    }
  }

  /// Looks up a string by contents. Only used whilst interning, before the
  /// string in question has a handle.
  pub fn find_string(&self, heap: &Heap, chars: &str, hash: u32) -> Option<Handle> {
    if self.buckets.is_empty() {
      return None;
    }

    let mut index = (hash as usize) & (self.buckets.len() - 1);
    loop {
      match self.buckets[index] {
        Bucket::Empty => return None,
        Bucket::Tombstone => {}
        Bucket::Entry { key, .. } => {
          if key.hash == hash && heap[key.string].as_string().chars == chars {
            return Some(key.string);
          }
        }
      }
      index = (index + 1) & (self.buckets.len() - 1);
    }
  }

  /// Drops every entry whose key string is unmarked. Run over the intern
  /// table before sweeping, so freed strings do not leave dangling keys.
  pub fn remove_white(&mut self, heap: &Heap) {
    for bucket in &mut self.buckets {
      if let Bucket::Entry { key, .. } = bucket {
        if !heap.is_marked(key.string) {
          *bucket = Bucket::Tombstone;
        }
      }
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = (StringKey, Value)> + '_ {
    self.buckets.iter().filter_map(|bucket| match bucket {
      Bucket::Entry { key, value } => Some((*key, *value)),
      _ => None,
    })
  }

  pub fn size_bytes(&self) -> usize {
    self.buckets.len() * mem::size_of::<Bucket>()
  }
}

impl Default for Table {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::gc::Heap;
  use crate::object::{GcString, Object};

  fn intern(heap: &mut Heap, chars: &str) -> StringKey {
    let hash = hash_str(chars);
    let string = heap.allocate(Object::String(GcString {
      chars: chars.into(),
      hash,
    }));
    StringKey { string, hash }
  }

  #[test]
  fn insert_get_and_overwrite() {
    let mut heap = Heap::new();
    let mut table = Table::new();
    let key = intern(&mut heap, "answer");

    assert_eq!(table.get(key), None);
    assert!(table.insert(key, Value::Number(41.0)));
    assert!(!table.insert(key, Value::Number(42.0)));
    assert_eq!(table.get(key), Some(Value::Number(42.0)));
  }

  #[test]
  fn removal_leaves_probe_sequences_intact() {
    let mut heap = Heap::new();
    let mut table = Table::new();

    let keys: Vec<StringKey> = (0..32)
      .map(|i| intern(&mut heap, &format!("key{i}")))
      .collect();
    for (i, key) in keys.iter().enumerate() {
      table.insert(*key, Value::Number(i as f64));
    }

    assert!(table.remove(keys[7]));
    assert!(!table.remove(keys[7]));

    assert_eq!(table.get(keys[7]), None);
    for (i, key) in keys.iter().enumerate() {
      if i != 7 {
        assert_eq!(table.get(*key), Some(Value::Number(i as f64)));
      }
    }
  }

  #[test]
  fn tombstones_are_reused_by_insert() {
    let mut heap = Heap::new();
    let mut table = Table::new();
    let key = intern(&mut heap, "transient");

    table.insert(key, Value::Nil);
    table.remove(key);
    assert!(table.insert(key, Value::Boolean(true)));
    assert_eq!(table.get(key), Some(Value::Boolean(true)));
  }

  #[test]
  fn load_stays_under_three_quarters() {
    let mut heap = Heap::new();
    let mut table = Table::new();

    for i in 0..100 {
      let key = intern(&mut heap, &format!("entry{i}"));
      table.insert(key, Value::Number(i as f64));
    }

    assert!(table.count * 4 <= table.buckets.len() * 3);
  }

  #[test]
  fn find_string_matches_by_contents() {
    let mut heap = Heap::new();
    let mut table = Table::new();
    let key = intern(&mut heap, "shared");
    table.insert(key, Value::Nil);

    let hash = hash_str("shared");
    assert_eq!(table.find_string(&heap, "shared", hash), Some(key.string));
    assert_eq!(
      table.find_string(&heap, "missing", hash_str("missing")),
      None
    );
  }

  #[test]
  fn remove_white_drops_unmarked_keys() {
    let mut heap = Heap::new();
    let mut table = Table::new();
    let kept = intern(&mut heap, "kept");
    let dropped = intern(&mut heap, "dropped");
    table.insert(kept, Value::Nil);
    table.insert(dropped, Value::Nil);

    heap.mark(kept.string);
    table.remove_white(&heap);

    assert_eq!(table.get(kept), Some(Value::Nil));
    assert_eq!(table.get(dropped), None);
  }
}
