//! Identifiers and simple allocators for core entities.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct LayerId(pub u32);

/// Monotonic allocator for LayerId.
/// Ids are never reused within one manager, even after a layer is removed.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_layer: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_layer(&mut self) -> LayerId {
        let id = LayerId(self.next_layer);
        self.next_layer = self.next_layer.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_layer(), LayerId(0));
        assert_eq!(alloc.alloc_layer(), LayerId(1));
        alloc.reset();
        assert_eq!(alloc.alloc_layer(), LayerId(0));
    }
}
