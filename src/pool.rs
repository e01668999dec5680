use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use serde::{Deserialize, Serialize};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

type Factory<T> = Box<dyn FnMut() -> Result<T> + Send>;

/// Ticket for an entity checked out of a [`Pool`].
///
/// A handle is only meaningful to the pool that issued it, and only for the
/// checkout that produced it. Once released, it never matches a later checkout
/// of the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    pool_id: u64,
    generation: u32,
    slot: usize,
    checkout: u64,
}

/// Point-in-time occupancy of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolStats {
    pub available: usize,
    pub in_use: usize,
    pub total: usize,
}

/// Acquire/release pool for expensive, frequently recycled entities.
///
/// Every entity produced by the factory lives in exactly one of the available
/// stack or the in-use set until [`Pool::clear`] drops them all. Reuse is LIFO:
/// the most recently released entity is handed out first.
pub struct Pool<T> {
    id: u64,
    generation: u32,
    factory: Factory<T>,
    entities: Vec<T>,
    available: Vec<usize>,
    /// Checked-out slots mapped to the checkout number of their live handle.
    in_use: HashMap<usize, u64>,
    next_checkout: u64,
}

impl<T> Pool<T> {
    /// Builds a pool pre-populated with `initial_size` entities.
    ///
    /// Construction is atomic: if the factory fails part way through, the error
    /// is returned and the entities built so far are dropped with the pool.
    pub fn new<F>(factory: F, initial_size: usize) -> Result<Self>
    where
        F: FnMut() -> Result<T> + Send + 'static,
    {
        let mut pool = Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            generation: 0,
            factory: Box::new(factory),
            entities: Vec::with_capacity(initial_size),
            available: Vec::with_capacity(initial_size),
            in_use: HashMap::new(),
            next_checkout: 0,
        };
        for _ in 0..initial_size {
            let slot = pool.create()?;
            pool.available.push(slot);
        }
        Ok(pool)
    }

    /// Checks out an entity, creating a new one when none is available.
    ///
    /// A failing factory leaves the pool exactly as it was.
    pub fn acquire(&mut self) -> Result<PoolHandle> {
        let slot = match self.available.pop() {
            Some(slot) => slot,
            None => self.create()?,
        };
        let checkout = self.next_checkout;
        self.next_checkout = self.next_checkout.wrapping_add(1);
        self.in_use.insert(slot, checkout);
        Ok(self.handle(slot, checkout))
    }

    /// Returns a checked-out entity to the available stack.
    ///
    /// Handles that are not currently checked out (double release, a stale
    /// handle whose slot was handed out again, another pool's handle, a handle
    /// from before [`Pool::clear`]) are ignored and
    /// `false` is returned. Entity state is left untouched.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        let Some(slot) = self.checked_out_slot(handle) else {
            return false;
        };
        self.in_use.remove(&slot);
        self.available.push(slot);
        true
    }

    pub fn stats(&self) -> PoolStats {
        let available = self.available.len();
        let in_use = self.in_use.len();
        PoolStats {
            available,
            in_use,
            total: available + in_use,
        }
    }

    /// Drops every entity the pool tracks. Outstanding handles become stale.
    pub fn clear(&mut self) {
        self.available.clear();
        self.in_use.clear();
        self.entities.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn is_in_use(&self, handle: PoolHandle) -> bool {
        self.checked_out_slot(handle).is_some()
    }

    /// Borrows a checked-out entity.
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.checked_out_slot(handle)
            .and_then(|slot| self.entities.get(slot))
    }

    /// Mutably borrows a checked-out entity.
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        let slot = self.checked_out_slot(handle)?;
        self.entities.get_mut(slot)
    }

    /// Iterates over the handles currently checked out, in no particular order.
    pub fn in_use(&self) -> impl Iterator<Item = PoolHandle> + '_ {
        self.in_use
            .iter()
            .map(|(&slot, &checkout)| self.handle(slot, checkout))
    }

    fn create(&mut self) -> Result<usize> {
        let entity = (self.factory)()?;
        self.entities.push(entity);
        Ok(self.entities.len() - 1)
    }

    fn handle(&self, slot: usize, checkout: u64) -> PoolHandle {
        PoolHandle {
            pool_id: self.id,
            generation: self.generation,
            slot,
            checkout,
        }
    }

    fn checked_out_slot(&self, handle: PoolHandle) -> Option<usize> {
        if handle.pool_id != self.id || handle.generation != self.generation {
            return None;
        }
        (self.in_use.get(&handle.slot) == Some(&handle.checkout)).then_some(handle.slot)
    }
}

impl<T> std::fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .field("stats", &self.stats())
            .finish()
    }
}
