use std::{io, path::PathBuf};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("trace index {index} out of range for capacity {capacity}")]
    IndexOutOfRange { index: u32, capacity: u32 },

    #[error("trace store capacity {actual} does not match trace length {expected}")]
    CapacityMismatch { expected: u32, actual: u32 },

    #[error("trace file has more than {capacity} entries")]
    TraceTooLong { capacity: u32 },

    #[error("trace line {line}: cannot parse {text:?}")]
    TraceParse { line: usize, text: String },

    #[error("failed to read trace {path}: {source}")]
    TraceFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[cfg(target_os = "linux")]
    #[error(transparent)]
    Ebpf(#[from] aya::EbpfError),

    #[cfg(target_os = "linux")]
    #[error(transparent)]
    Program(#[from] aya::programs::ProgramError),

    #[cfg(target_os = "linux")]
    #[error(transparent)]
    Map(#[from] aya::maps::MapError),

    #[error("program {0} not found in eBPF object")]
    MissingProgram(&'static str),

    #[error("map {0} not found in eBPF object")]
    MissingMap(&'static str),

    #[error("tc {command}: {detail}")]
    Tc { command: String, detail: String },

    #[error("capability {capability}: {detail}")]
    Capability { capability: String, detail: String },
}
