/// the only observable output of one engine invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    PassUnmodified,
    /// earliest departure time, monotonic nanoseconds
    ForwardAtTime(u64),
    Drop,
}

/// monotonic nanosecond counter supplied by the host
pub trait MonotonicClock {
    fn now_ns(&self) -> u64;
}

impl<F: Fn() -> u64> MonotonicClock for F {
    #[inline(always)]
    fn now_ns(&self) -> u64 {
        self()
    }
}

/// turns one trace value into a verdict
pub trait DecisionPolicy {
    type Value: Copy;

    fn decide<C: MonotonicClock + ?Sized>(&self, value: Self::Value, clock: &C) -> Verdict;
}

/// value is a delay in nanoseconds; the packet departs no earlier than `now + delay`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelayPolicy;

impl DecisionPolicy for DelayPolicy {
    type Value = u32;

    #[inline(always)]
    fn decide<C: MonotonicClock + ?Sized>(&self, delay_ns: u32, clock: &C) -> Verdict {
        Verdict::ForwardAtTime(clock.now_ns().saturating_add(u64::from(delay_ns)))
    }
}

/// value is a drop flag; the clock is never read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LossPolicy;

impl DecisionPolicy for LossPolicy {
    type Value = bool;

    #[inline(always)]
    fn decide<C: MonotonicClock + ?Sized>(&self, drop: bool, _clock: &C) -> Verdict {
        if drop {
            Verdict::Drop
        } else {
            Verdict::PassUnmodified
        }
    }
}
