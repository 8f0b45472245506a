use {
    crate::error::{Error, Result},
    std::num::NonZeroU32,
    trace_emu_common::{PortFilter, DEFAULT_WATCHED_PORT, TRACE_LEN},
};

/// load-time settings shared by both engine variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmulatorConfig {
    /// a frame is emulated when its source or destination port is one of these
    pub watched_ports: [u16; 2],
    /// number of slots in the circular trace
    pub trace_len: u32,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            watched_ports: [DEFAULT_WATCHED_PORT, DEFAULT_WATCHED_PORT],
            trace_len: TRACE_LEN,
        }
    }
}

impl EmulatorConfig {
    pub fn with_watched_ports(mut self, first: u16, second: u16) -> Self {
        self.watched_ports = [first, second];
        self
    }

    pub fn with_watched_port(self, port: u16) -> Self {
        self.with_watched_ports(port, port)
    }

    pub fn with_trace_len(mut self, trace_len: u32) -> Self {
        self.trace_len = trace_len;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.sequencer_len().map(|_| ())
    }

    pub fn sequencer_len(&self) -> Result<NonZeroU32> {
        NonZeroU32::new(self.trace_len)
            .ok_or_else(|| Error::Config("trace length must be at least one slot".into()))
    }

    pub fn port_filter(&self) -> PortFilter {
        let [first, second] = self.watched_ports;
        PortFilter::new(first, second)
    }
}
