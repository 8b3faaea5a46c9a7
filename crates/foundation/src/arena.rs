/// Fixed-capacity arena.
///
/// Capacity never changes implicitly: `alloc` fails once the arena is full
/// and growth happens only through [`Arena::ensure_capacity`], which models
/// recreating the backing container. Indices of existing items survive a
/// reallocation.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<T>,
    capacity: usize,
    allocations: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("arena full: capacity={capacity}")]
pub struct ArenaFull {
    pub capacity: usize,
}

impl<T> Arena<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Arena {
            items: Vec::with_capacity(capacity),
            capacity,
            allocations: 1,
        }
    }

    pub fn alloc(&mut self, v: T) -> Result<usize, ArenaFull> {
        if self.items.len() >= self.capacity {
            return Err(ArenaFull {
                capacity: self.capacity,
            });
        }
        self.items.push(v);
        Ok(self.items.len() - 1)
    }

    /// Grows the arena so that it can hold `n` items.
    ///
    /// Returns `true` if the backing container had to be recreated.
    pub fn ensure_capacity(&mut self, n: usize) -> bool {
        if n <= self.capacity {
            return false;
        }
        let new_capacity = n.next_power_of_two().max(self.capacity.saturating_mul(2));
        let mut items = Vec::with_capacity(new_capacity);
        items.append(&mut self.items);
        self.items = items;
        self.capacity = new_capacity;
        self.allocations += 1;
        true
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.items.get_mut(idx)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of backing containers created over the arena's lifetime.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Drops all items but keeps the container.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drops all items and the container itself.
    pub fn release(&mut self) {
        self.items = Vec::new();
        self.capacity = 0;
    }
}
