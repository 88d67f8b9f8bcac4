//! Synthetic memory identifiers
//!
//! Every declared entity gets an id from one strictly increasing counter so
//! that the visualizer can treat ids as distinct addresses. Arrays take a
//! contiguous range sized by element count and element size.

use log::trace;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

/// First id handed out by a fresh allocator.
pub const DEFAULT_ID_BASE: u64 = 100_000;

/// Most ids a single array may take. Ranges serialize element by element.
pub const MAX_ARRAY_IDS: u64 = 1 << 20;

/// Byte size used to scale array id ranges. Class and unknown types count as 1.
pub fn size_of(data_type: &str) -> u64 {
    match data_type {
        "int" | "float" => 4,
        "double" | "long" => 8,
        "char" | "bool" | "void" => 1,
        "string" => 32,
        _ => 1,
    }
}

/// Ids an array of `dimensions` takes, or `None` past [`MAX_ARRAY_IDS`].
pub fn array_len(data_type: &str, dimensions: &[u64]) -> Option<u64> {
    dimensions
        .iter()
        .try_fold(size_of(data_type), |len, &dim| len.checked_mul(dim))
        .filter(|&len| len <= MAX_ARRAY_IDS)
}

/// A single id, or the half-open range `start..start + len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryId {
    Single(u64),
    Range { start: u64, len: u64 },
}

impl MemoryId {
    pub fn start(&self) -> u64 {
        match *self {
            MemoryId::Single(id) => id,
            MemoryId::Range { start, .. } => start,
        }
    }

    pub fn len(&self) -> u64 {
        match *self {
            MemoryId::Single(_) => 1,
            MemoryId::Range { len, .. } => len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One past the last id covered.
    pub fn end(&self) -> u64 {
        self.start() + self.len()
    }

    pub fn contains(&self, id: u64) -> bool {
        (self.start()..self.end()).contains(&id)
    }

    pub fn overlaps(&self, other: &MemoryId) -> bool {
        self.start() < other.end() && other.start() < self.end()
    }
}

impl Serialize for MemoryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            MemoryId::Single(id) => serializer.serialize_u64(id),
            MemoryId::Range { start, len } => {
                let mut seq = serializer.serialize_seq(Some(len as usize))?;
                for id in start..start + len {
                    seq.serialize_element(&id)?;
                }
                seq.end()
            }
        }
    }
}

/// Hands out ids from a strictly increasing counter.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    base: u64,
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_ID_BASE)
    }
}

impl IdAllocator {
    pub fn new(base: u64) -> Self {
        Self { base, next: base }
    }

    /// Single id for a scalar, pointer, parameter, member, object or function.
    pub fn allocate(&mut self) -> MemoryId {
        let id = self.next;
        self.next += 1;
        trace!("allocated id {}", id);
        MemoryId::Single(id)
    }

    /// `count` elements of `data_type`. A count of one is a single id.
    ///
    /// `None` when the range is too large; the counter is left untouched.
    pub fn allocate_id(&mut self, data_type: &str, count: u64) -> Option<MemoryId> {
        if count == 1 {
            return Some(self.allocate());
        }
        self.allocate_array(data_type, &[count])
    }

    /// Contiguous range for an array with the given dimensions.
    ///
    /// `None` when the range is too large; the counter is left untouched.
    pub fn allocate_array(&mut self, data_type: &str, dimensions: &[u64]) -> Option<MemoryId> {
        let len = array_len(data_type, dimensions)?;
        self.allocate_range(len)
    }

    fn allocate_range(&mut self, len: u64) -> Option<MemoryId> {
        let start = self.next;
        self.next = start.checked_add(len)?;
        trace!("allocated ids {}..{}", start, self.next);
        Some(MemoryId::Range { start, len })
    }

    /// Id the next allocation will start at.
    pub fn peek_next(&self) -> u64 {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = self.base;
    }
}
