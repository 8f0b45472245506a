use {
    crate::{
        config::EmulatorConfig,
        error::{Error, Result},
        trace::{SlotTrace, TraceValue},
    },
    trace_emu_common::{DelayPolicy, Engine, LossPolicy},
};

/// delay variant over an in-memory trace of nanosecond delays
pub type DelayEngine = Engine<SlotTrace<u32>, DelayPolicy>;

/// loss variant over an in-memory trace of drop flags
pub type LossEngine = Engine<SlotTrace<bool>, LossPolicy>;

fn check_capacity<V: TraceValue>(config: &EmulatorConfig, trace: &SlotTrace<V>) -> Result<()> {
    config.validate()?;
    if trace.capacity() != config.trace_len {
        return Err(Error::CapacityMismatch {
            expected: config.trace_len,
            actual: trace.capacity(),
        });
    }
    Ok(())
}

pub fn delay_engine(config: &EmulatorConfig, trace: SlotTrace<u32>) -> Result<DelayEngine> {
    check_capacity(config, &trace)?;
    log::info!(
        "delay engine: watching ports {:?}, {} of {} slots populated",
        config.watched_ports,
        trace.populated(),
        config.trace_len
    );
    Ok(Engine::new(
        config.port_filter(),
        config.sequencer_len()?,
        trace,
        DelayPolicy,
    ))
}

pub fn loss_engine(config: &EmulatorConfig, trace: SlotTrace<bool>) -> Result<LossEngine> {
    check_capacity(config, &trace)?;
    log::info!(
        "loss engine: watching ports {:?}, {} of {} slots populated",
        config.watched_ports,
        trace.populated(),
        config.trace_len
    );
    Ok(Engine::new(
        config.port_filter(),
        config.sequencer_len()?,
        trace,
        LossPolicy,
    ))
}
