// userspace side of the trace emulator: in-memory trace stores and engines,
// trace files, and the loader for the kernel programs.

pub mod clock;
pub mod config;
pub mod derive;
pub mod engine;
pub mod error;
#[cfg(target_os = "linux")]
pub mod program;
pub mod trace;

pub use {
    clock::SystemClock,
    config::EmulatorConfig,
    engine::{delay_engine, loss_engine, DelayEngine, LossEngine},
    error::{Error, Result},
    trace::{SlotTrace, TraceValue},
    trace_emu_common::{
        self as common, parse, DecisionPolicy, DelayPolicy, LossPolicy, MonotonicClock,
        PacketBytes, ParseOutcome, ParsedHeaders, PortFilter, PortPair, TraceSequencer,
        TraceStore, Verdict, TRACE_LEN,
    },
};
