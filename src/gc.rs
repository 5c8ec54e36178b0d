use crate::object::{Object, Upvalue};
use crate::value::Value;

use smallvec::SmallVec;
use std::ops::{Index, IndexMut};

/// A stable index into the heap's object slots
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Handle(u32);

#[derive(Debug)]
struct Slot {
  object: Object,
  marked: bool,
}

const FIRST_COLLECTION: usize = 1024 * 1024;

/// The garbage-collected heap.
///
/// Objects live in a slot vector and reference each other through handles, so
/// the mark and sweep phases only touch flags and the free list. The gray
/// worklist is allocated once and reused across collections.
#[derive(Debug)]
pub struct Heap {
  slots: Vec<Option<Slot>>,
  free: Vec<u32>,
  gray: Vec<Handle>,
  bytes_allocated: usize,
  next_collection: usize,
}

impl Heap {
  pub fn new() -> Self {
    Self {
      slots: Vec::with_capacity(64),
      free: Vec::new(),
      gray: Vec::new(),
      bytes_allocated: 0,
      next_collection: FIRST_COLLECTION,
    }
  }

  pub fn allocate(&mut self, object: Object) -> Handle {
    self.bytes_allocated += object.size();

    let slot = Some(Slot {
      object,
      marked: false,
    });

    match self.free.pop() {
      Some(index) => {
        self.slots[index as usize] = slot;
        Handle(index)
      }
      None => {
        self.slots.push(slot);
        Handle((self.slots.len() - 1) as u32)
      }
    }
  }

  pub fn should_collect(&self) -> bool {
    #[cfg(feature = "gc-stress")]
    {
      true
    }

    #[cfg(not(feature = "gc-stress"))]
    {
      self.bytes_allocated > self.next_collection
    }
  }

  pub fn bytes_allocated(&self) -> usize {
    self.bytes_allocated
  }

  pub fn is_marked(&self, handle: Handle) -> bool {
    matches!(
      &self.slots[handle.0 as usize],
      Some(slot) if slot.marked
    )
  }

  /// Marks an object gray: flagged as reachable, children not yet traced
  pub fn mark(&mut self, handle: Handle) {
    if let Some(slot) = &mut self.slots[handle.0 as usize] {
      if !slot.marked {
        slot.marked = true;
        self.gray.push(handle);
      }
    }
  }

  pub fn mark_value(&mut self, value: Value) {
    if let Value::Object(handle) = value {
      self.mark(handle);
    }
  }

  /// Blackens gray objects until the worklist is empty
  pub fn trace(&mut self) {
    while let Some(handle) = self.gray.pop() {
      let mut children = SmallVec::<[Handle; 8]>::new();
      if let Some(slot) = &self.slots[handle.0 as usize] {
        collect_children(&slot.object, &mut children);
      }

      for child in children {
        self.mark(child);
      }
    }
  }

  /// Frees every unmarked object and clears the marks of survivors.
  ///
  /// Byte accounting is recomputed from the survivors, and the next
  /// collection threshold set to double the live size.
  pub fn sweep(&mut self) {
    let mut bytes = 0;

    for (index, entry) in self.slots.iter_mut().enumerate() {
      match entry {
        Some(slot) if slot.marked => {
          slot.marked = false;
          bytes += slot.object.size();
        }
        Some(_) => {
          *entry = None;
          self.free.push(index as u32);
        }
        None => {}
      }
    }

    self.bytes_allocated = bytes;
    self.next_collection = (bytes * 2).max(FIRST_COLLECTION);
  }
}

fn push_value(value: Value, children: &mut SmallVec<[Handle; 8]>) {
  if let Value::Object(handle) = value {
    children.push(handle);
  }
}

fn collect_children(object: &Object, children: &mut SmallVec<[Handle; 8]>) {
  match object {
    Object::String(_) | Object::Native(_) => {}
    Object::Closure(closure) => children.extend(closure.upvalues.iter().copied()),
    Object::Upvalue(Upvalue::Closed(value)) => push_value(*value, children),
    Object::Upvalue(Upvalue::Open(_)) => {}
    Object::Class(class) => {
      children.push(class.name);
      for (key, value) in class.methods.iter() {
        children.push(key.string);
        push_value(value, children);
      }
    }
    Object::Instance(instance) => {
      children.push(instance.class);
      for (key, value) in instance.fields.iter() {
        children.push(key.string);
        push_value(value, children);
      }
    }
    Object::BoundMethod(bound) => {
      push_value(bound.receiver, children);
      children.push(bound.method);
    }
  }
}

impl Default for Heap {
  fn default() -> Self {
    Self::new()
  }
}

impl Index<Handle> for Heap {
  type Output = Object;

  fn index(&self, index: Handle) -> &Self::Output {
    match &self.slots[index.0 as usize] {
      Some(slot) => &slot.object,
      None => unreachable!("use after free"),
    }
  }
}
impl IndexMut<Handle> for Heap {
  fn index_mut(&mut self, index: Handle) -> &mut Self::Output {
    match &mut self.slots[index.0 as usize] {
      Some(slot) => &mut slot.object,
      None => unreachable!("use after free"),
    }
  }
}
