#![cfg_attr(not(test), no_std)]

// decision core shared by the kernel programs and the userspace engines.
// nothing in here allocates, blocks or loops over packet content.

pub mod engine;
pub mod filter;
pub mod packet;
pub mod policy;
pub mod sequencer;
pub mod trace;

pub use {
    engine::{decide, Engine},
    filter::PortFilter,
    packet::{parse, PacketBytes, ParseOutcome, ParsedHeaders, PortPair},
    policy::{DecisionPolicy, DelayPolicy, LossPolicy, MonotonicClock, Verdict},
    sequencer::TraceSequencer,
    trace::TraceStore,
};

/// number of slots in a replay trace (kernel map capacity)
pub const TRACE_LEN: u32 = 10_000;

/// port watched when nothing else is configured
pub const DEFAULT_WATCHED_PORT: u16 = 2112;

pub const ETH_P_IP: u16 = 0x0800;
pub const IPPROTO_TCP: u8 = 6;
pub const IPPROTO_UDP: u8 = 17;

pub const ETH_HEADER_SIZE: usize = 14;
/// minimum IPv4 header (IHL = 5)
pub const IPV4_MIN_HEADER_SIZE: usize = 20;
/// source + destination port
pub const L4_PORTS_SIZE: usize = 4;

// names shared between the kernel object and the userspace loader
pub const DELAY_PROGRAM: &str = "edt_delay";
pub const LOSS_PROGRAM: &str = "xdp_loss";
pub const DELAY_TRACE_MAP: &str = "DELAY_TRACE";
pub const LOSS_TRACE_MAP: &str = "LOSS_TRACE";
pub const WATCHED_PORTS_GLOBAL: &str = "WATCHED_PORTS";
