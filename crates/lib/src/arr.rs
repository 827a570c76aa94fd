//! Growable container backing commands, process lists and byte buffers.
//!
//! `Array<T>` is a thin layer over `Vec<T>` that pins down the growth policy:
//! the first allocation holds [`MIN_CAPACITY`] elements and every later
//! growth doubles the capacity. Truncating never releases memory, so a build
//! program can reuse one array across many steps without reallocating.
//!
//! Running out of memory while growing aborts the process, the same way the
//! standard collections do.

use std::io;
use std::ops::{Deref, DerefMut};

/// Number of elements reserved by the first allocation.
pub const MIN_CAPACITY: usize = 128;

#[derive(Debug)]
pub struct Array<T> {
  items: Vec<T>,
  capacity: usize,
}

impl<T> Array<T> {
  /// Create an empty array without allocating.
  pub const fn new() -> Self {
    Self {
      items: Vec::new(),
      capacity: 0,
    }
  }

  /// Number of elements in use.
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// Number of elements the array can hold before it grows again.
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Make room for at least `needed` elements in total.
  ///
  /// Capacity starts at [`MIN_CAPACITY`] and doubles until it covers `needed`.
  pub fn reserve(&mut self, needed: usize) {
    if needed <= self.capacity {
      return;
    }

    let mut capacity = self.capacity;
    while needed > capacity {
      capacity = if capacity == 0 { MIN_CAPACITY } else { capacity * 2 };
    }

    self.items.reserve_exact(capacity - self.items.len());
    self.capacity = capacity;
  }

  pub fn append(&mut self, item: T) {
    self.reserve(self.items.len() + 1);
    self.items.push(item);
  }

  /// Drop everything past the first `len` elements, keeping the allocation.
  pub fn truncate(&mut self, len: usize) {
    self.items.truncate(len);
  }

  /// Reset the length to zero, keeping the allocation.
  pub fn clear(&mut self) {
    self.items.clear();
  }

  pub fn into_vec(self) -> Vec<T> {
    self.items
  }
}

impl<T: Clone> Array<T> {
  pub fn append_many(&mut self, items: &[T]) {
    self.reserve(self.items.len() + items.len());
    self.items.extend_from_slice(items);
  }
}

/// Clones keep the source's capacity, so they grow on the same schedule.
impl<T: Clone> Clone for Array<T> {
  fn clone(&self) -> Self {
    let mut array = Array::new();
    array.reserve(self.capacity);
    array.append_many(&self.items);
    array
  }
}

/// Equality looks at the elements only.
impl<T: PartialEq> PartialEq for Array<T> {
  fn eq(&self, other: &Self) -> bool {
    self.items == other.items
  }
}

impl<T: Eq> Eq for Array<T> {}

impl<T> Default for Array<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Deref for Array<T> {
  type Target = [T];

  fn deref(&self) -> &[T] {
    &self.items
  }
}

impl<T> DerefMut for Array<T> {
  fn deref_mut(&mut self) -> &mut [T] {
    &mut self.items
  }
}

impl<T> Extend<T> for Array<T> {
  fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
    let iter = iter.into_iter();
    let (lower, _) = iter.size_hint();
    self.reserve(self.items.len() + lower);
    for item in iter {
      self.append(item);
    }
  }
}

impl<T> FromIterator<T> for Array<T> {
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    let mut array = Array::new();
    array.extend(iter);
    array
  }
}

impl<T> IntoIterator for Array<T> {
  type Item = T;
  type IntoIter = std::vec::IntoIter<T>;

  fn into_iter(self) -> Self::IntoIter {
    self.items.into_iter()
  }
}

impl<'a, T> IntoIterator for &'a Array<T> {
  type Item = &'a T;
  type IntoIter = std::slice::Iter<'a, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.items.iter()
  }
}

/// Byte arrays double as write targets, e.g. for `serde_json::to_writer`.
impl io::Write for Array<u8> {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.append_many(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}
