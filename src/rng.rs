//! Thread-local randomness for deterministic augmentation.
//!
//! Data-loading workers seed a thread-local `StdRng` once per epoch; every
//! random transform draws from it so that a run can be replayed exactly from
//! `(worker_id, epoch, base_seed)`. Outside a worker context the helpers fall
//! back to the process RNG.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::cell::RefCell;

thread_local! {
    /// Thread-local RNG for deterministic randomness in workers.
    pub static WORKER_RNG: RefCell<Option<StdRng>> = const { RefCell::new(None) };
}

/// Initialize this thread's RNG from worker_id, epoch, and base seed.
/// Seed formula: base_seed + (epoch << 32) + worker_id
/// This ensures each worker has unique but deterministic randomness.
pub fn init_worker_rng(worker_id: usize, epoch: usize, base_seed: u64) {
    WORKER_RNG.with(|rng| {
        let seed = base_seed
            .wrapping_add((epoch as u64) << 32)
            .wrapping_add(worker_id as u64);
        *rng.borrow_mut() = Some(StdRng::seed_from_u64(seed));
    })
}

/// Run `f` with this thread's RNG, or the process RNG if no worker RNG was
/// initialized. Transforms use this for all of their sampling.
pub fn with_worker_rng<T>(f: impl FnOnce(&mut dyn RngCore) -> T) -> T {
    WORKER_RNG.with(|rng| {
        let mut slot = rng.borrow_mut();
        match slot.as_mut() {
            Some(rng) => f(rng),
            None => {
                let mut fallback = rand::rng();
                f(&mut fallback)
            }
        }
    })
}
