//! Reusable-object pool.
//!
//! Objects released back to the pool are reset and handed out again by the
//! next `acquire`, so spawn/despawn churn does not turn into allocation churn.
//! The pool is a cache, not an owner of simulation state: dropping it loses
//! nothing the simulation depends on.

/// Counters describing how the pool has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Objects built by the factory.
    pub created: u64,
    /// Acquisitions served from the free list.
    pub reused: u64,
    pub released: u64,
    /// Releases dropped because the free list was full.
    pub discarded: u64,
}

/// A bounded free list in front of a factory.
pub struct ResourcePool<T> {
    free: Vec<T>,
    factory: Box<dyn FnMut() -> T>,
    reset: Option<Box<dyn FnMut(&mut T)>>,
    max_free: usize,
    stats: PoolStats,
}

impl<T> ResourcePool<T> {
    /// Create a pool that keeps at most `max_free` idle objects.
    pub fn new(max_free: usize, factory: impl FnMut() -> T + 'static) -> Self {
        Self {
            free: Vec::with_capacity(max_free.min(1024)),
            factory: Box::new(factory),
            reset: None,
            max_free,
            stats: PoolStats::default(),
        }
    }

    /// Run `reset` on every object as it comes back to the pool.
    pub fn with_reset(mut self, reset: impl FnMut(&mut T) + 'static) -> Self {
        self.reset = Some(Box::new(reset));
        self
    }

    /// Fill the free list up to `count` objects (bounded by `max_free`).
    pub fn prewarm(&mut self, count: usize) {
        let target = count.min(self.max_free);
        while self.free.len() < target {
            let item = (self.factory)();
            self.stats.created += 1;
            self.free.push(item);
        }
    }

    /// Take an idle object, or build a new one.
    pub fn acquire(&mut self) -> T {
        match self.free.pop() {
            Some(item) => {
                self.stats.reused += 1;
                item
            }
            None => {
                self.stats.created += 1;
                (self.factory)()
            }
        }
    }

    /// Return an object; dropped when the free list is full.
    pub fn release(&mut self, mut item: T) {
        self.stats.released += 1;
        if self.free.len() >= self.max_free {
            self.stats.discarded += 1;
            return;
        }
        if let Some(reset) = self.reset.as_mut() {
            reset(&mut item);
        }
        self.free.push(item);
    }

    /// Number of idle objects ready to hand out.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Get the pool counters.
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Drop every pooled object. Counters are kept.
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

impl<T> std::fmt::Debug for ResourcePool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePool")
            .field("available", &self.free.len())
            .field("max_free", &self.max_free)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_pool(max_free: usize) -> ResourcePool<u32> {
        let mut next = 0;
        ResourcePool::new(max_free, move || {
            next += 1;
            next
        })
    }

    #[test]
    fn test_release_then_acquire_reuses() {
        let mut pool = counter_pool(4);
        let a = pool.acquire();
        pool.release(a);
        assert_eq!(pool.acquire(), a);
        assert_eq!(pool.stats().created, 1);
        assert_eq!(pool.stats().reused, 1);
    }

    #[test]
    fn test_prewarm_is_bounded() {
        let mut pool = counter_pool(3);
        pool.prewarm(10);
        assert_eq!(pool.available(), 3);
        assert_eq!(pool.stats().created, 3);
    }

    #[test]
    fn test_full_pool_discards() {
        let mut pool = counter_pool(1);
        let a = pool.acquire();
        let b = pool.acquire();
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.stats().discarded, 1);
    }

    #[test]
    fn test_reset_runs_on_release() {
        let mut pool = ResourcePool::new(2, Vec::<u8>::new).with_reset(|v| v.clear());
        let mut buf = pool.acquire();
        buf.extend_from_slice(&[1, 2, 3]);
        pool.release(buf);
        assert!(pool.acquire().is_empty());
    }
}
