// turns a probe-level measurement (one-way delay per probe, 0 = probe lost)
// into the delay and loss traces the engines replay.

/// delay and loss traces in packet arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedTraces {
    pub delay: Vec<u32>,
    pub loss: Vec<bool>,
}

/// milliseconds as measured by the probe tooling, to whole nanoseconds
pub fn millis_to_nanos(ms: f64) -> u32 {
    if !ms.is_finite() || ms <= 0.0 {
        return 0;
    }
    let ns = (ms * 1_000_000.0).round();
    if ns >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        ns as u32
    }
}

/// probe `i` leaves at `i * send_interval_ns`.
///
/// a delivered probe arrives `delay` later. a lost probe (delay 0) is given the
/// previous probe's effective delay, or one send interval for the first probe, so
/// it still has a place in arrival order. probes are then replayed in arrival
/// order: the delay trace carries each probe's effective delay, the loss trace
/// flags the lost ones.
pub fn derive_traces(delays_ns: &[u32], send_interval_ns: u64) -> DerivedTraces {
    let first_carry = u32::try_from(send_interval_ns).unwrap_or(u32::MAX);

    let mut probes = Vec::with_capacity(delays_ns.len());
    let mut carry = first_carry;
    for (i, &delay) in delays_ns.iter().enumerate() {
        let lost = delay == 0;
        let effective = if lost { carry } else { delay };
        carry = effective;
        let sent = (i as u64).saturating_mul(send_interval_ns);
        probes.push((sent.saturating_add(u64::from(effective)), effective, lost));
    }

    // stable: probes arriving together keep send order
    probes.sort_by_key(|&(arrival, _, _)| arrival);

    let (delay, loss) = probes
        .into_iter()
        .map(|(_, effective, lost)| (effective, lost))
        .unzip();
    let derived = DerivedTraces { delay, loss };
    log::info!(
        "derived {} trace entries, {} lost",
        derived.loss.len(),
        derived.loss.iter().filter(|lost| **lost).count()
    );
    derived
}
