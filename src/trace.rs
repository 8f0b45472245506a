use {
    crate::error::{Error, Result},
    std::{
        fs::File,
        io::{BufRead, BufReader},
        marker::PhantomData,
        path::Path,
        sync::{
            atomic::{AtomicU64, Ordering},
            Arc,
        },
    },
    trace_emu_common::TraceStore,
};

// slot word for a slot the control plane never wrote
const EMPTY: u64 = u64::MAX;

/// a value that can live in one trace slot
pub trait TraceValue: Copy + Send + Sync + 'static {
    /// must never produce `u64::MAX`
    fn encode(self) -> u64;

    fn decode(word: u64) -> Self;

    /// one line of a trace file
    fn parse_text(text: &str) -> Option<Self>;
}

/// nanosecond delay
impl TraceValue for u32 {
    fn encode(self) -> u64 {
        u64::from(self)
    }

    fn decode(word: u64) -> Self {
        word as u32
    }

    fn parse_text(text: &str) -> Option<Self> {
        if let Ok(ns) = text.parse::<u32>() {
            return Some(ns);
        }
        // trace tooling sometimes writes "1500000.0"
        let ns = text.parse::<f64>().ok()?;
        (ns.is_finite() && (0.0..=f64::from(u32::MAX)).contains(&ns)).then(|| ns.round() as u32)
    }
}

/// drop flag
impl TraceValue for bool {
    fn encode(self) -> u64 {
        u64::from(self)
    }

    fn decode(word: u64) -> Self {
        word != 0
    }

    fn parse_text(text: &str) -> Option<Self> {
        match text {
            "1" | "true" | "True" => Some(true),
            "0" | "false" | "False" => Some(false),
            _ => None,
        }
    }
}

/// fixed-capacity in-memory trace with lock-free slot reads and writes
///
/// clones share the same slots, so one handle can sit inside an engine while
/// another keeps updating entries.
#[derive(Debug)]
pub struct SlotTrace<V> {
    slots: Arc<[AtomicU64]>,
    _value: PhantomData<fn() -> V>,
}

impl<V> Clone for SlotTrace<V> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
            _value: PhantomData,
        }
    }
}

impl<V: TraceValue> SlotTrace<V> {
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            slots: (0..capacity).map(|_| AtomicU64::new(EMPTY)).collect(),
            _value: PhantomData,
        }
    }

    /// slot `i` gets `values[i]`; `None` entries stay absent
    pub fn from_entries(capacity: u32, values: &[Option<V>]) -> Result<Self> {
        let trace = Self::with_capacity(capacity);
        trace.fill(values)?;
        Ok(trace)
    }

    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    fn slot(&self, index: u32) -> Result<&AtomicU64> {
        self.slots
            .get(index as usize)
            .ok_or(Error::IndexOutOfRange {
                index,
                capacity: self.capacity(),
            })
    }

    pub fn set(&self, index: u32, value: V) -> Result<()> {
        self.slot(index)?.store(value.encode(), Ordering::Release);
        Ok(())
    }

    pub fn clear(&self, index: u32) -> Result<()> {
        self.slot(index)?.store(EMPTY, Ordering::Release);
        Ok(())
    }

    /// writes every `Some` entry at its position, returns how many were written
    pub fn fill(&self, values: &[Option<V>]) -> Result<usize> {
        if values.len() > self.slots.len() {
            return Err(Error::TraceTooLong {
                capacity: self.capacity(),
            });
        }
        let mut written = 0;
        for (slot, value) in self.slots.iter().zip(values) {
            if let Some(value) = value {
                slot.store(value.encode(), Ordering::Release);
                written += 1;
            }
        }
        log::debug!("filled {written} of {} trace slots", self.slots.len());
        Ok(written)
    }

    pub fn populated(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.load(Ordering::Relaxed) != EMPTY)
            .count()
    }
}

impl<V: TraceValue> TraceStore for SlotTrace<V> {
    type Value = V;

    #[inline]
    fn lookup(&self, index: u32) -> Option<V> {
        let word = self.slots.get(index as usize)?.load(Ordering::Acquire);
        (word != EMPTY).then(|| V::decode(word))
    }
}

/// one value per line, the zero-based line number is the slot index.
/// blank lines leave their slot absent.
pub fn parse_trace<V: TraceValue, R: BufRead>(reader: R, capacity: u32) -> Result<Vec<Option<V>>> {
    let mut entries = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if index >= capacity as usize {
            if line.trim().is_empty() {
                continue;
            }
            return Err(Error::TraceTooLong { capacity });
        }
        let text = line.trim();
        if text.is_empty() {
            entries.push(None);
            continue;
        }
        let value = V::parse_text(text).ok_or_else(|| Error::TraceParse {
            line: index + 1,
            text: text.to_owned(),
        })?;
        entries.push(Some(value));
    }
    // trailing blank lines carry no information
    while matches!(entries.last(), Some(None)) {
        entries.pop();
    }
    Ok(entries)
}

pub fn load_trace<V: TraceValue>(path: impl AsRef<Path>, capacity: u32) -> Result<Vec<Option<V>>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::TraceFile {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = parse_trace(BufReader::new(file), capacity)?;
    log::info!("read {} trace entries from {}", entries.len(), path.display());
    Ok(entries)
}

pub fn parse_delay_trace<R: BufRead>(reader: R, capacity: u32) -> Result<Vec<Option<u32>>> {
    parse_trace(reader, capacity)
}

pub fn parse_loss_trace<R: BufRead>(reader: R, capacity: u32) -> Result<Vec<Option<bool>>> {
    parse_trace(reader, capacity)
}

pub fn load_delay_trace(path: impl AsRef<Path>, capacity: u32) -> Result<Vec<Option<u32>>> {
    load_trace(path, capacity)
}

pub fn load_loss_trace(path: impl AsRef<Path>, capacity: u32) -> Result<Vec<Option<bool>>> {
    load_trace(path, capacity)
}
