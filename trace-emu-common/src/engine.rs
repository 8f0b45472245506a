use {
    crate::{
        filter::PortFilter,
        packet::{parse, PacketBytes},
        policy::{DecisionPolicy, MonotonicClock, Verdict},
        sequencer::TraceSequencer,
        trace::TraceStore,
    },
    core::num::NonZeroU32,
};

/// parse -> filter -> sequence -> lookup -> policy for one frame
///
/// any frame that cannot be confidently classified yields `PassUnmodified`.
/// the cursor advances once per admitted frame, before the lookup, so a frame
/// whose slot is unpopulated still consumes that slot.
#[inline(always)]
pub fn decide<F, S, P, C>(
    frame: &F,
    filter: &PortFilter,
    sequencer: &TraceSequencer,
    store: &S,
    policy: &P,
    clock: &C,
) -> Verdict
where
    F: PacketBytes + ?Sized,
    S: TraceStore<Value = P::Value> + ?Sized,
    P: DecisionPolicy,
    C: MonotonicClock + ?Sized,
{
    if filter.admits(&parse(frame)).is_none() {
        return Verdict::PassUnmodified;
    }
    let index = sequencer.next_index();
    match store.lookup(index) {
        Some(value) => policy.decide(value, clock),
        None => Verdict::PassUnmodified,
    }
}

/// one decision engine instance: owns its replay cursor for its whole lifetime
#[derive(Debug)]
pub struct Engine<S, P> {
    filter: PortFilter,
    sequencer: TraceSequencer,
    store: S,
    policy: P,
}

impl<S, P> Engine<S, P>
where
    S: TraceStore<Value = P::Value>,
    P: DecisionPolicy,
{
    pub fn new(filter: PortFilter, trace_len: NonZeroU32, store: S, policy: P) -> Self {
        Self {
            filter,
            sequencer: TraceSequencer::new(trace_len),
            store,
            policy,
        }
    }

    #[inline]
    pub fn decide<F, C>(&self, frame: &F, clock: &C) -> Verdict
    where
        F: PacketBytes + ?Sized,
        C: MonotonicClock + ?Sized,
    {
        decide(
            frame,
            &self.filter,
            &self.sequencer,
            &self.store,
            &self.policy,
            clock,
        )
    }

    pub fn filter(&self) -> &PortFilter {
        &self.filter
    }

    pub fn sequencer(&self) -> &TraceSequencer {
        &self.sequencer
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            packet::tests::frame,
            policy::{DelayPolicy, LossPolicy},
            ETH_P_IP, IPPROTO_TCP, IPPROTO_UDP,
        },
    };

    fn len(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn test_delay_engine_walks_the_trace() {
        let engine = Engine::new(
            PortFilter::single(2112),
            len(3),
            [Some(10u32), Some(20), Some(30)],
            DelayPolicy,
        );
        let pkt = frame(ETH_P_IP, IPPROTO_UDP, 5000, 2112);
        let got: Vec<Verdict> = (0..4)
            .map(|_| engine.decide(pkt.as_slice(), &|| 100u64))
            .collect();
        assert_eq!(
            got,
            vec![
                Verdict::ForwardAtTime(110),
                Verdict::ForwardAtTime(120),
                Verdict::ForwardAtTime(130),
                Verdict::ForwardAtTime(110),
            ]
        );
    }

    #[test]
    fn test_unmatched_frames_leave_cursor_alone() {
        let engine = Engine::new(
            PortFilter::single(2112),
            len(2),
            [Some(true), Some(false)],
            LossPolicy,
        );
        let http = frame(ETH_P_IP, IPPROTO_TCP, 50000, 80);
        let arp = frame(0x0806, 0, 0, 0);
        let clock = || 0u64;

        assert_eq!(engine.decide(http.as_slice(), &clock), Verdict::PassUnmodified);
        assert_eq!(engine.decide(arp.as_slice(), &clock), Verdict::PassUnmodified);
        assert_eq!(engine.decide(&http[..20], &clock), Verdict::PassUnmodified);
        assert_eq!(engine.sequencer().position(), 0);

        let watched = frame(ETH_P_IP, IPPROTO_TCP, 2112, 80);
        assert_eq!(engine.decide(watched.as_slice(), &clock), Verdict::Drop);
        assert_eq!(engine.sequencer().position(), 1);
    }

    #[test]
    fn test_absent_slot_passes_and_consumes() {
        let engine = Engine::new(
            PortFilter::single(2112),
            len(3),
            [Some(7u32), None, Some(9)],
            DelayPolicy,
        );
        let pkt = frame(ETH_P_IP, IPPROTO_UDP, 2112, 1);
        let clock = || 1_000u64;

        assert_eq!(engine.decide(pkt.as_slice(), &clock), Verdict::ForwardAtTime(1_007));
        assert_eq!(engine.decide(pkt.as_slice(), &clock), Verdict::PassUnmodified);
        assert_eq!(engine.sequencer().position(), 2);
        assert_eq!(engine.decide(pkt.as_slice(), &clock), Verdict::ForwardAtTime(1_009));
    }

    #[test]
    fn test_free_function_over_borrowed_parts() {
        let filter = PortFilter::new(2112, 5201);
        let sequencer = TraceSequencer::new(len(2));
        let store: &[Option<bool>] = &[Some(false), Some(true)];
        let pkt = frame(ETH_P_IP, IPPROTO_UDP, 5201, 6000);
        let clock = || 0u64;

        assert_eq!(
            decide(pkt.as_slice(), &filter, &sequencer, store, &LossPolicy, &clock),
            Verdict::PassUnmodified
        );
        assert_eq!(
            decide(pkt.as_slice(), &filter, &sequencer, store, &LossPolicy, &clock),
            Verdict::Drop
        );
    }
}
