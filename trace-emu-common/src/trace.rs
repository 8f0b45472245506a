/// read-only view of a replay trace, keyed by slot index
///
/// `None` means the slot was never populated by the control plane.
pub trait TraceStore {
    type Value: Copy;

    fn lookup(&self, index: u32) -> Option<Self::Value>;
}

impl<T: TraceStore + ?Sized> TraceStore for &T {
    type Value = T::Value;

    #[inline(always)]
    fn lookup(&self, index: u32) -> Option<Self::Value> {
        (**self).lookup(index)
    }
}

impl<V: Copy> TraceStore for [Option<V>] {
    type Value = V;

    #[inline(always)]
    fn lookup(&self, index: u32) -> Option<V> {
        self.get(index as usize).copied().flatten()
    }
}

impl<V: Copy, const N: usize> TraceStore for [Option<V>; N] {
    type Value = V;

    #[inline(always)]
    fn lookup(&self, index: u32) -> Option<V> {
        self.get(index as usize).copied().flatten()
    }
}
