//! Bounded transition store with uniform sampling.
use super::Transition;
use crate::error::PixelqError;
use crate::frame_stack::StackedState;
use log::info;
use rand::{rngs::StdRng, seq::index, SeedableRng};

/// Fixed-capacity replay memory with oldest-first eviction.
///
/// A classic circular buffer: fixed backing storage, a head index pointing
/// at the oldest entry and a length. Appending at capacity overwrites the
/// oldest transition; nothing else ever removes one.
///
/// Two invariants hold at all times:
///
/// * at most one transition is open, and if one is, it is the newest;
/// * [`sample`](ReplayMemory::sample) only ever returns closed transitions.
pub struct ReplayMemory {
    slots: Vec<Option<Transition>>,
    head: usize,
    len: usize,
    rng: StdRng,
}

impl ReplayMemory {
    /// Constructs a memory holding up to `capacity` transitions.
    ///
    /// `seed` fixes the sampling order; the same seed and call sequence
    /// reproduce the same batches.
    pub fn new(capacity: usize, seed: u64) -> Self {
        assert!(capacity > 0, "replay capacity must be positive");
        info!("Constructed replay memory with capacity {}", capacity);

        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);

        Self {
            slots,
            head: 0,
            len: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Maximum number of stored transitions.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Current number of stored transitions.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no transitions are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once appending evicts.
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    fn physical(&self, logical: usize) -> usize {
        (self.head + logical) % self.capacity()
    }

    fn slot(&self, logical: usize) -> &Transition {
        self.slots[self.physical(logical)]
            .as_ref()
            .expect("slots within len are occupied")
    }

    /// The transition at `logical` insertion position, oldest first.
    pub fn get(&self, logical: usize) -> Option<&Transition> {
        if logical < self.len {
            Some(self.slot(logical))
        } else {
            None
        }
    }

    /// Stored transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> + '_ {
        (0..self.len).map(move |i| self.slot(i))
    }

    /// Appends a transition, evicting the oldest when full.
    pub fn append(&mut self, transition: Transition) {
        let capacity = self.capacity();
        let at = (self.head + self.len) % capacity;
        self.slots[at] = Some(transition);
        if self.len == capacity {
            self.head = (self.head + 1) % capacity;
        } else {
            self.len += 1;
        }
    }

    /// Records the outcome of the most recently appended transition.
    ///
    /// The reward and resulting state of an action are observed one
    /// environment step after the action is taken, so transitions are
    /// appended open and closed here on the following decision.
    pub fn close_last(
        &mut self,
        reward: f32,
        state_out: StackedState,
        terminal: bool,
    ) -> Result<(), PixelqError> {
        if self.len == 0 {
            return Err(PixelqError::EmptyMemoryClose);
        }
        let last = self.physical(self.len - 1);
        match self.slots[last].as_mut() {
            Some(t) if t.is_open() => {
                t.close(reward, state_out, terminal);
                Ok(())
            }
            _ => Err(PixelqError::EmptyMemoryClose),
        }
    }

    fn closed_len(&self) -> usize {
        if self.len > 0 && self.slot(self.len - 1).is_open() {
            self.len - 1
        } else {
            self.len
        }
    }

    /// Samples `batch_size` closed transitions uniformly, without
    /// replacement within the batch.
    ///
    /// An open transition is never selected; if fewer closed transitions
    /// than `batch_size` exist, [`PixelqError::InsufficientData`] is
    /// returned and the caller is expected to skip training this step.
    pub fn sample(&mut self, batch_size: usize) -> Result<Vec<&Transition>, PixelqError> {
        let available = self.closed_len();
        if available < batch_size {
            return Err(PixelqError::InsufficientData {
                requested: batch_size,
                available,
            });
        }

        // Only the newest transition can be open, so closed transitions are
        // exactly the logical prefix 0..available.
        let ixs = index::sample(&mut self.rng, available, batch_size);
        let this: &Self = self;
        Ok(ixs.iter().map(move |i| this.slot(i)).collect())
    }
}
