//! Scratch arena for short-lived strings.
//!
//! A fixed-capacity bump allocator: allocations only move a high-water mark
//! forward and are never freed one by one. The caller rewinds the whole arena
//! with [`Scratch::reset`] between build steps. `reset` takes `&mut self`, so
//! the compiler rejects any arena-backed string still alive at that point.
//!
//! The arena never grows. Asking for more than is left is a bug in the
//! caller and panics.

use std::cell::Cell;
use std::fmt::{self, Write};

use bumpalo::Bump;
use bumpalo::collections::String as BumpString;

/// 8 MiB.
pub const DEFAULT_CAPACITY: usize = 8 * 1024 * 1024;

/// Format into a [`Scratch`] arena, like `format!`.
///
/// ```
/// let scratch = nobuild::Scratch::new();
/// let flag = nobuild::scratch_format!(scratch, "/Fe:{}", "nob.exe");
/// assert_eq!(flag, "/Fe:nob.exe");
/// ```
#[macro_export]
macro_rules! scratch_format {
  ($scratch:expr, $($arg:tt)*) => {
    $scratch.format(::std::format_args!($($arg)*))
  };
}

#[derive(Debug)]
pub struct Scratch {
  bump: Bump,
  capacity: usize,
  used: Cell<usize>,
}

impl Scratch {
  pub fn new() -> Self {
    Self::with_capacity(DEFAULT_CAPACITY)
  }

  pub fn with_capacity(capacity: usize) -> Self {
    let bump = Bump::with_capacity(capacity);
    bump.set_allocation_limit(Some(capacity));
    Self {
      bump,
      capacity,
      used: Cell::new(0),
    }
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Bytes handed out since the last reset.
  pub fn used(&self) -> usize {
    self.used.get()
  }

  pub fn remaining(&self) -> usize {
    self.capacity - self.used.get()
  }

  /// Allocate `size` zeroed bytes.
  ///
  /// # Panics
  ///
  /// Panics if the arena has fewer than `size` bytes left.
  pub fn alloc(&self, size: usize) -> &mut [u8] {
    self.claim(size);
    self.bump.alloc_slice_fill_copy(size, 0u8)
  }

  /// Format `args` into the arena. The string lives until the next reset.
  ///
  /// # Panics
  ///
  /// Panics if the formatted text does not fit in the remaining space, or
  /// if a formatting trait implementation returns an error, as `format!` does.
  pub fn format(&self, args: fmt::Arguments<'_>) -> &str {
    let mut counter = Counter(0);
    if counter.write_fmt(args).is_err() {
      panic!("a formatting trait implementation returned an error");
    }
    self.claim(counter.0);

    let mut out = BumpString::with_capacity_in(counter.0, &self.bump);
    if out.write_fmt(args).is_err() || out.len() != counter.0 {
      panic!("formatted text changed between measuring and writing");
    }
    out.into_bump_str()
  }

  /// Rewind the high-water mark, invalidating every previous allocation.
  pub fn reset(&mut self) {
    self.bump.reset();
    self.used.set(0);
  }

  fn claim(&self, size: usize) {
    let used = self.used.get();
    if size > self.capacity - used {
      panic!(
        "scratch arena exhausted: {} bytes requested, {} of {} in use",
        size, used, self.capacity
      );
    }
    self.used.set(used + size);
  }
}

impl Default for Scratch {
  fn default() -> Self {
    Self::new()
  }
}

/// Measures formatted output without storing it.
struct Counter(usize);

impl Write for Counter {
  fn write_str(&mut self, s: &str) -> fmt::Result {
    self.0 += s.len();
    Ok(())
  }
}
