use std::sync::atomic::{AtomicI64, Ordering};

use crate::models::EntityId;

/// Issues unique identifiers for newly created entities.
///
/// The in-memory variant hands out a strictly increasing sequence; a
/// persistence-backed store relies on the database's own key generation
/// and never consults the allocator.
pub trait IdAllocator: Send + Sync + std::fmt::Debug {
    fn next_id(&self) -> EntityId;
}

/// Atomic counter starting at 1. Ids are never reused, even after a
/// bulk clear.
#[derive(Debug)]
pub struct SequentialIdAllocator {
    next: AtomicI64,
}

impl SequentialIdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicI64::new(1),
        }
    }
}

impl Default for SequentialIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator for SequentialIdAllocator {
    fn next_id(&self) -> EntityId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn starts_at_one_and_increases() {
        let allocator = SequentialIdAllocator::new();
        assert_eq!(allocator.next_id(), 1);
        assert_eq!(allocator.next_id(), 2);
        assert_eq!(allocator.next_id(), 3);
    }

    #[test]
    fn unique_under_concurrent_allocation() {
        let allocator = Arc::new(SequentialIdAllocator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let allocator = Arc::clone(&allocator);
            handles.push(std::thread::spawn(move || {
                (0..1000).map(|_| allocator.next_id()).collect::<Vec<_>>()
            }));
        }

        let mut all_ids = Vec::new();
        for handle in handles {
            all_ids.extend(handle.join().unwrap());
        }
        all_ids.sort_unstable();
        all_ids.dedup();
        assert_eq!(all_ids.len(), 8000);
        assert_eq!(all_ids[0], 1);
    }
}
