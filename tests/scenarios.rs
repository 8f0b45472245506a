use trace_emu::{
    delay_engine, loss_engine, EmulatorConfig, PacketBytes, SlotTrace, Verdict,
};

const ETH_P_IP: u16 = 0x0800;
const TCP: u8 = 6;
const UDP: u8 = 17;

fn frame(ether_type: u16, proto: u8, src: u16, dst: u16) -> Vec<u8> {
    let mut buf = vec![0u8; 14 + 20 + 8];
    buf[12..14].copy_from_slice(&ether_type.to_be_bytes());
    buf[14] = 0x45;
    buf[23] = proto;
    buf[34..36].copy_from_slice(&src.to_be_bytes());
    buf[36..38].copy_from_slice(&dst.to_be_bytes());
    buf
}

fn config(trace_len: u32) -> EmulatorConfig {
    EmulatorConfig::default()
        .with_watched_port(2112)
        .with_trace_len(trace_len)
}

#[test]
fn test_delay_replay_scenario() {
    let trace = SlotTrace::from_entries(4, &[Some(100u32), Some(0), Some(500), Some(200)]).unwrap();
    let engine = delay_engine(&config(4), trace).unwrap();
    let pkt = frame(ETH_P_IP, UDP, 40000, 2112);

    let departures: Vec<Verdict> = [1000u64, 1500, 2000, 2500, 3000]
        .into_iter()
        .map(|now| engine.decide(pkt.as_slice(), &move || now))
        .collect();

    assert_eq!(
        departures,
        vec![
            Verdict::ForwardAtTime(1100),
            Verdict::ForwardAtTime(1500),
            Verdict::ForwardAtTime(2500),
            Verdict::ForwardAtTime(2700),
            Verdict::ForwardAtTime(3100),
        ]
    );
}

#[test]
fn test_loss_replay_scenario() {
    let trace =
        SlotTrace::from_entries(4, &[Some(true), Some(false), Some(false), Some(true)]).unwrap();
    let engine = loss_engine(&config(4), trace).unwrap();
    let pkt = frame(ETH_P_IP, UDP, 40000, 2112);
    let clock = || 0u64;

    let verdicts: Vec<Verdict> = (0..4).map(|_| engine.decide(pkt.as_slice(), &clock)).collect();
    assert_eq!(
        verdicts,
        vec![
            Verdict::Drop,
            Verdict::PassUnmodified,
            Verdict::PassUnmodified,
            Verdict::Drop,
        ]
    );
}

#[test]
fn test_unwatched_tcp_never_moves_cursor() {
    let trace = SlotTrace::from_entries(4, &[Some(true); 4]).unwrap();
    let engine = loss_engine(&config(4), trace).unwrap();
    let http = frame(ETH_P_IP, TCP, 51000, 80);
    let clock = || 0u64;

    for _ in 0..10 {
        assert_eq!(engine.decide(http.as_slice(), &clock), Verdict::PassUnmodified);
    }
    assert_eq!(engine.sequencer().position(), 0);
}

#[test]
fn test_interleaved_traffic_consumes_in_order() {
    // slot value == slot index, so each departure reveals which slot was consumed
    let values: Vec<Option<u32>> = (0..5).map(Some).collect();
    let engine = delay_engine(&config(5), SlotTrace::from_entries(5, &values).unwrap()).unwrap();

    let watched = frame(ETH_P_IP, UDP, 2112, 9);
    let noise = [
        frame(ETH_P_IP, TCP, 443, 51000),
        frame(0x86dd, UDP, 2112, 2112),
        frame(ETH_P_IP, 1, 2112, 2112),
        frame(ETH_P_IP, UDP, 2112, 2112)[..30].to_vec(),
    ];

    let mut consumed = Vec::new();
    for round in 0..12 {
        let other = &noise[round % noise.len()];
        assert_eq!(engine.decide(other.as_slice(), &|| 0u64), Verdict::PassUnmodified);
        match engine.decide(watched.as_slice(), &|| 0u64) {
            Verdict::ForwardAtTime(slot) => consumed.push(slot),
            other => panic!("unexpected verdict {other:?}"),
        }
    }
    assert_eq!(consumed, vec![0, 1, 2, 3, 4, 0, 1, 2, 3, 4, 0, 1]);
}

#[test]
fn test_wraparound_after_trace_len() {
    let len = 16;
    let values: Vec<Option<u32>> = (0..len).map(Some).collect();
    let engine = delay_engine(&config(len), SlotTrace::from_entries(len, &values).unwrap()).unwrap();
    let pkt = frame(ETH_P_IP, UDP, 2112, 2112);

    for _ in 0..len {
        engine.decide(pkt.as_slice(), &|| 0u64);
    }
    assert_eq!(engine.sequencer().position(), 0);
    assert_eq!(engine.decide(pkt.as_slice(), &|| 0u64), Verdict::ForwardAtTime(0));
}

#[test]
fn test_absent_slot_consumed_in_both_variants() {
    let pkt = frame(ETH_P_IP, UDP, 2112, 1);
    let clock = || 10u64;

    let delay = delay_engine(
        &config(3),
        SlotTrace::from_entries(3, &[None, Some(5u32), None]).unwrap(),
    )
    .unwrap();
    let loss = loss_engine(
        &config(3),
        SlotTrace::from_entries(3, &[None, Some(true), None]).unwrap(),
    )
    .unwrap();

    assert_eq!(delay.decide(pkt.as_slice(), &clock), Verdict::PassUnmodified);
    assert_eq!(loss.decide(pkt.as_slice(), &clock), Verdict::PassUnmodified);
    assert_eq!(delay.sequencer().position(), 1);
    assert_eq!(loss.sequencer().position(), 1);

    assert_eq!(delay.decide(pkt.as_slice(), &clock), Verdict::ForwardAtTime(15));
    assert_eq!(loss.decide(pkt.as_slice(), &clock), Verdict::Drop);
}

#[test]
fn test_trace_updated_while_running() {
    let trace = SlotTrace::<u32>::with_capacity(2);
    let control = trace.clone();
    let engine = delay_engine(&config(2), trace).unwrap();
    let pkt = frame(ETH_P_IP, UDP, 2112, 2112);

    assert_eq!(engine.decide(pkt.as_slice(), &|| 100u64), Verdict::PassUnmodified);
    control.set(1, 50).unwrap();
    control.set(0, 7).unwrap();
    assert_eq!(engine.decide(pkt.as_slice(), &|| 100u64), Verdict::ForwardAtTime(150));
    assert_eq!(engine.decide(pkt.as_slice(), &|| 100u64), Verdict::ForwardAtTime(107));
}

#[test]
fn test_frame_helper_is_a_full_udp_header() {
    let pkt = frame(ETH_P_IP, UDP, 1, 2);
    assert_eq!(pkt.as_slice().load_be_u16(12), Some(ETH_P_IP));
}
