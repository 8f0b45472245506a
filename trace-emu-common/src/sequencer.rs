use core::{
    num::NonZeroU32,
    sync::atomic::{AtomicU64, Ordering},
};

/// single replay cursor over a circular trace of `len` slots
///
/// `next_index` is one `fetch_add`, so concurrent callers are wait-free and
/// totally ordered by the atomic's modification order: each caller gets a
/// distinct slot within a lap and slots are handed out strictly in sequence.
/// the raw counter is 64-bit; modulo continuity only breaks after 2^64 packets.
#[derive(Debug)]
pub struct TraceSequencer {
    consumed: AtomicU64,
    len: NonZeroU32,
}

impl TraceSequencer {
    pub const fn new(len: NonZeroU32) -> Self {
        Self {
            consumed: AtomicU64::new(0),
            len,
        }
    }

    #[allow(clippy::len_without_is_empty)]
    #[inline(always)]
    pub const fn len(&self) -> u32 {
        self.len.get()
    }

    /// returns the current slot and advances the cursor by one, wrapping at `len`
    #[inline(always)]
    pub fn next_index(&self) -> u32 {
        let ticket = self.consumed.fetch_add(1, Ordering::Relaxed);
        (ticket % u64::from(self.len.get())) as u32
    }

    /// slot the next call to `next_index` would return (snapshot only)
    pub fn position(&self) -> u32 {
        (self.consumed.load(Ordering::Relaxed) % u64::from(self.len.get())) as u32
    }
}
