use {libc::timespec, trace_emu_common::MonotonicClock};

/// CLOCK_MONOTONIC, the same time base the kernel uses for skb departure stamps
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl MonotonicClock for SystemClock {
    #[inline]
    fn now_ns(&self) -> u64 {
        let mut ts = timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // cannot fail for CLOCK_MONOTONIC with a valid pointer
        unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
        (ts.tv_sec as u64)
            .saturating_mul(1_000_000_000)
            .saturating_add(ts.tv_nsec as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic() {
        let clock = SystemClock;
        let a = clock.now_ns();
        let b = clock.now_ns();
        assert!(a > 0);
        assert!(b >= a);
    }
}
