#![no_std]
#![no_main]

use {
    aya_ebpf::{
        bindings::{xdp_action, TC_ACT_OK, TC_ACT_SHOT},
        helpers::bpf_ktime_get_ns,
        macros::{classifier, map, xdp},
        maps::Array,
        programs::{TcContext, XdpContext},
    },
    core::num::NonZeroU32,
    trace_emu_common::{
        decide, DelayPolicy, LossPolicy, MonotonicClock, PacketBytes, PortFilter,
        TraceSequencer, TraceStore, Verdict, DEFAULT_WATCHED_PORT, TRACE_LEN,
    },
};

// slot index -> delay in nanoseconds, written by the userspace loader
#[map]
static DELAY_TRACE: Array<u32> = Array::with_max_entries(TRACE_LEN, 0);

// slot index -> drop flag (non-zero drops)
#[map]
static LOSS_TRACE: Array<u32> = Array::with_max_entries(TRACE_LEN, 0);

// rewritten at load time through EbpfLoader::set_global
#[no_mangle]
static WATCHED_PORTS: [u16; 2] = [DEFAULT_WATCHED_PORT, DEFAULT_WATCHED_PORT];

const TRACE_SLOTS: NonZeroU32 = match NonZeroU32::new(TRACE_LEN) {
    Some(len) => len,
    None => panic!("TRACE_LEN must be non-zero"),
};

// one replay cursor per program, shared by every cpu running it
static DELAY_CURSOR: TraceSequencer = TraceSequencer::new(TRACE_SLOTS);
static LOSS_CURSOR: TraceSequencer = TraceSequencer::new(TRACE_SLOTS);

/// [data, data_end) of the packet under inspection
struct Frame {
    start: usize,
    end: usize,
}

impl PacketBytes for Frame {
    #[inline(always)]
    fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline(always)]
    fn load_u8(&self, offset: usize) -> Option<u8> {
        let at = self.start.checked_add(offset)?;
        // the verifier needs this exact comparison against data_end
        if at + 1 > self.end {
            return None;
        }
        Some(unsafe { *(at as *const u8) })
    }
}

struct Ktime;

impl MonotonicClock for Ktime {
    #[inline(always)]
    fn now_ns(&self) -> u64 {
        unsafe { bpf_ktime_get_ns() }
    }
}

struct DelaySlots;

impl TraceStore for DelaySlots {
    type Value = u32;

    #[inline(always)]
    fn lookup(&self, index: u32) -> Option<u32> {
        DELAY_TRACE.get(index).copied()
    }
}

struct LossSlots;

impl TraceStore for LossSlots {
    type Value = bool;

    #[inline(always)]
    fn lookup(&self, index: u32) -> Option<bool> {
        LOSS_TRACE.get(index).map(|flag| *flag != 0)
    }
}

#[inline(always)]
fn watched_ports() -> PortFilter {
    let [first, second] = unsafe { core::ptr::read_volatile(&WATCHED_PORTS) };
    PortFilter::new(first, second)
}

#[classifier]
pub fn edt_delay(ctx: TcContext) -> i32 {
    let frame = Frame {
        start: ctx.data(),
        end: ctx.data_end(),
    };
    match decide(
        &frame,
        &watched_ports(),
        &DELAY_CURSOR,
        &DelaySlots,
        &DelayPolicy,
        &Ktime,
    ) {
        Verdict::ForwardAtTime(departure) => {
            // fq on the egress device holds the skb until this time
            unsafe { (*ctx.skb.skb).tstamp = departure };
            TC_ACT_OK
        }
        Verdict::Drop => TC_ACT_SHOT,
        Verdict::PassUnmodified => TC_ACT_OK,
    }
}

#[xdp]
pub fn xdp_loss(ctx: XdpContext) -> u32 {
    let frame = Frame {
        start: ctx.data(),
        end: ctx.data_end(),
    };
    match decide(
        &frame,
        &watched_ports(),
        &LOSS_CURSOR,
        &LossSlots,
        &LossPolicy,
        &Ktime,
    ) {
        Verdict::Drop => xdp_action::XDP_DROP,
        // xdp cannot defer transmission
        Verdict::ForwardAtTime(_) | Verdict::PassUnmodified => xdp_action::XDP_PASS,
    }
}

#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    unsafe { core::hint::unreachable_unchecked() }
}
