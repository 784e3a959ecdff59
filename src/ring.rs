//! The ring itself: a slot array of atomic pointers and two monotonic cursors.

use core::fmt;
use core::marker::PhantomData;
use core::ptr;

use crossbeam_utils::CachePadded;

use crate::error::{CapacityError, PopError, PushError};
use crate::sync::{spin_loop, yield_now, AtomicPtr, AtomicU64, Ordering};
use crate::trace::{debug, error, trace};

/// Consecutive transient-race spins tolerated before each retry yields.
const SPIN_LIMIT: u32 = 16;

/// Bounded lock-free MPMC ring buffer.
///
/// Ownership of a generation is decided by a CAS on the matching cursor;
/// only the winner then touches the slot, with a second CAS that must
/// succeed. A slot is null when empty and otherwise points at a boxed value
/// owned by the ring. Consumers clear the slot after taking the value so a
/// producer on the next lap can tell a free slot from a leftover.
///
/// At most `capacity - 1` values are resident at once.
pub struct RingBuffer<T> {
    slots: Box<[CachePadded<AtomicPtr<T>>]>,
    mask: u64,
    write: CachePadded<AtomicU64>,
    read: CachePadded<AtomicU64>,
    _marker: PhantomData<T>,
}

impl<T> RingBuffer<T> {
    /// Creates an empty ring with `capacity` slots.
    ///
    /// `capacity` must be a power of two greater than 1.
    pub fn new(capacity: usize) -> Result<Self, CapacityError> {
        if capacity <= 1 || !capacity.is_power_of_two() {
            return Err(CapacityError::InvalidCapacity(capacity));
        }

        let slots: Vec<CachePadded<AtomicPtr<T>>> = (0..capacity)
            .map(|_| CachePadded::new(AtomicPtr::new(ptr::null_mut())))
            .collect();

        debug!(capacity, "ring buffer created");

        Ok(RingBuffer {
            slots: slots.into_boxed_slice(),
            mask: capacity as u64 - 1,
            write: CachePadded::new(AtomicU64::new(0)),
            read: CachePadded::new(AtomicU64::new(0)),
            _marker: PhantomData,
        })
    }

    /// Pushes `value`, returning the physical slot index it was written to.
    ///
    /// Returns [`PushError::Full`] with the value when the ring is full.
    /// Never blocks; retries internally only while a consumer from the
    /// previous lap has not yet cleared the target slot.
    pub fn push(&self, value: T) -> Result<usize, PushError<T>> {
        // Exactly one of `value` and `node` holds the item at any time; it is
        // boxed only once an attempt gets past the full check.
        let mut value = Some(value);
        let mut node: *mut T = ptr::null_mut();
        let mut spins = 0u32;

        loop {
            // Read cursor first: a fresher write cursor means fewer false fulls.
            let p_read = self.read.load(Ordering::Acquire);
            let p_write = self.write.load(Ordering::Acquire);

            // Distance rather than `(p_write + 1) & mask == p_read & mask`: a
            // stale `p_read` can put the gap at `capacity` or beyond.
            if p_write.wrapping_sub(p_read) >= self.mask {
                let value = match value.take() {
                    Some(value) => value,
                    // SAFETY: `node` was never published, this thread still owns it.
                    None => *unsafe { Box::from_raw(node) },
                };
                return Err(PushError::Full(value));
            }

            let w_idx = self.index(p_write);
            let slot = &self.slots[w_idx];

            if !slot.load(Ordering::Acquire).is_null() {
                spins = backoff(spins);
                if spins > SPIN_LIMIT {
                    trace!(
                        slot = w_idx,
                        p_read,
                        p_write,
                        spins,
                        "push retry: slot not yet cleared by previous lap"
                    );
                }
                continue;
            }

            if let Some(value) = value.take() {
                node = Box::into_raw(Box::new(value));
            }

            if self
                .write
                .compare_exchange(
                    p_write,
                    p_write.wrapping_add(1),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_err()
            {
                continue;
            }

            if slot
                .compare_exchange(ptr::null_mut(), node, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                self.ownership_violated("push", w_idx, p_read, p_write);
            }

            return Ok(w_idx);
        }
    }

    /// Pushes an optional value. `None` is rejected with
    /// [`PushError::Rejected`] without touching the ring.
    pub fn push_opt(&self, value: Option<T>) -> Result<usize, PushError<T>> {
        match value {
            Some(value) => self.push(value),
            None => Err(PushError::Rejected),
        }
    }

    /// Pops the oldest published value.
    ///
    /// Returns [`PopError::Empty`] when both cursors sit on the same
    /// generation. Retries internally only while the producer that reserved
    /// the next generation has not yet published its value.
    pub fn pop(&self) -> Result<T, PopError> {
        let mut spins = 0u32;

        loop {
            let p_read = self.read.load(Ordering::Acquire);
            let p_write = self.write.load(Ordering::Acquire);

            if p_read == p_write {
                return Err(PopError::Empty);
            }

            let r_idx = self.index(p_read);
            let slot = &self.slots[r_idx];

            // Reserved but not yet published by its producer.
            let node = slot.load(Ordering::Acquire);
            if node.is_null() {
                spins = backoff(spins);
                if spins > SPIN_LIMIT {
                    trace!(
                        slot = r_idx,
                        p_read,
                        p_write,
                        spins,
                        "pop retry: slot not yet published"
                    );
                }
                continue;
            }

            if self
                .read
                .compare_exchange(
                    p_read,
                    p_read.wrapping_add(1),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_err()
            {
                continue;
            }

            if slot
                .compare_exchange(node, ptr::null_mut(), Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                self.ownership_violated("pop", r_idx, p_read, p_write);
            }

            // SAFETY: winning the read cursor for `p_read` and clearing the slot
            // gives this thread sole ownership of `node`, boxed by `push`.
            let value = unsafe { Box::from_raw(node) };
            return Ok(*value);
        }
    }

    /// Pushes `items` in order until the ring reports full.
    ///
    /// Returns the values that were not accepted, in their original order.
    pub fn push_batch(&self, items: Vec<T>) -> Vec<T> {
        let mut items = items.into_iter();
        while let Some(item) = items.next() {
            if let Err(err) = self.push(item) {
                let mut rest = Vec::with_capacity(items.len() + 1);
                rest.extend(err.into_inner());
                rest.extend(items);
                return rest;
            }
        }
        Vec::new()
    }

    /// Pops up to `max` values, stopping early when the ring is empty.
    pub fn pop_batch(&self, max: usize) -> Vec<T> {
        let mut out = Vec::new();
        while out.len() < max {
            match self.pop() {
                Ok(value) => out.push(value),
                Err(PopError::Empty) => break,
            }
        }
        out
    }

    /// Current read cursor: the number of successful pops so far.
    pub fn read_count(&self) -> u64 {
        self.read.load(Ordering::Acquire)
    }

    /// Current write cursor: the number of successful pushes so far.
    pub fn write_count(&self) -> u64 {
        self.write.load(Ordering::Acquire)
    }

    /// Number of physical slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Maximum number of values resident at once (`capacity - 1`).
    pub fn usable_capacity(&self) -> usize {
        self.slots.len() - 1
    }

    /// Approximate number of resident values. Racy under concurrent use.
    pub fn len(&self) -> usize {
        let read = self.read_count();
        let write = self.write_count();
        write.wrapping_sub(read).min(self.mask) as usize
    }

    /// Whether the ring looked empty when sampled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the ring looked full when sampled.
    pub fn is_full(&self) -> bool {
        self.len() == self.usable_capacity()
    }

    #[inline(always)]
    fn index(&self, cursor: u64) -> usize {
        (cursor & self.mask) as usize
    }

    #[cold]
    #[inline(never)]
    fn ownership_violated(&self, op: &str, idx: usize, p_read: u64, p_write: u64) -> ! {
        error!(
            op,
            slot = idx,
            p_read,
            p_write,
            read = self.read_count(),
            write = self.write_count(),
            "slot CAS failed after winning its cursor"
        );
        panic!(
            "ring buffer state error: {op} won cursor but lost slot {idx} \
             (p_read {p_read}, p_write {p_write})"
        );
    }
}

// SAFETY: values cross threads only by moving through the slots, and each
// value is owned by exactly one side at a time.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("mask", &self.mask)
            .field("write", &self.write_count())
            .field("read", &self.read_count())
            .finish()
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        for slot in self.slots.iter() {
            let node = slot.swap(ptr::null_mut(), Ordering::Acquire);
            if !node.is_null() {
                // SAFETY: `&mut self` rules out concurrent access; a non-null
                // slot holds a value boxed by `push` that no pop has taken.
                drop(unsafe { Box::from_raw(node) });
            }
        }
    }
}

/// Spin a few times, then yield on every further retry.
#[inline(always)]
fn backoff(spins: u32) -> u32 {
    let spins = spins.saturating_add(1);
    if spins > SPIN_LIMIT {
        yield_now();
    } else {
        spin_loop();
    }
    spins
}
