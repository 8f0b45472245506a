extern crate clap;
extern crate trace_emu;

use {
    clap::Parser,
    std::{
        path::PathBuf,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        thread,
        time::Duration,
    },
    trace_emu::{
        program::{install_fq, raise_capabilities, TraceEmuProgram, XdpMode, DEFAULT_OBJECT_PATH},
        trace::{load_delay_trace, load_loss_trace},
        EmulatorConfig, TRACE_LEN,
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about = "attach trace-driven delay/loss emulation", long_about = None)]
struct Opt {
    #[arg(short, long, default_value = "eth0")]
    interface: String,

    /// compiled emu-ebpf object
    #[arg(long, default_value = DEFAULT_OBJECT_PATH)]
    object: PathBuf,

    /// watched port (give twice to watch two ports)
    #[arg(short, long = "port", default_values_t = [2112u16])]
    ports: Vec<u16>,

    /// one delay in nanoseconds per line
    #[arg(long)]
    delay_trace: Option<PathBuf>,

    /// one 0/1 drop flag per line
    #[arg(long)]
    loss_trace: Option<PathBuf>,

    /// force generic (skb) xdp mode
    #[arg(long)]
    xdp_generic: bool,

    /// leave the root qdisc alone instead of installing fq
    #[arg(long)]
    no_fq: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opt = Opt::parse();

    let (first, second) = match opt.ports.as_slice() {
        [port] => (*port, *port),
        [first, second] => (*first, *second),
        _ => {
            eprintln!("error: give one or two --port values");
            std::process::exit(1);
        }
    };
    if opt.delay_trace.is_none() && opt.loss_trace.is_none() {
        eprintln!("error: nothing to do, give --delay-trace and/or --loss-trace");
        std::process::exit(1);
    }

    if let Err(e) = raise_capabilities() {
        eprintln!("{e}");
        eprintln!("run with: sudo -E cargo run --example attach -- <args>");
        std::process::exit(1);
    }

    let config = EmulatorConfig::default().with_watched_ports(first, second);
    let mut program = TraceEmuProgram::load(&opt.object, &config)?;

    if let Some(path) = &opt.delay_trace {
        let entries = load_delay_trace(path, TRACE_LEN)?;
        program.populate_delay(&entries)?;
        if !opt.no_fq {
            install_fq(&opt.interface)?;
        }
        program.attach_delay(&opt.interface)?;
    }

    if let Some(path) = &opt.loss_trace {
        let entries = load_loss_trace(path, TRACE_LEN)?;
        program.populate_loss(&entries)?;
        let mode = if opt.xdp_generic {
            XdpMode::Generic
        } else {
            XdpMode::Auto
        };
        program.attach_loss(&opt.interface, mode)?;
    }

    let exit = Arc::new(AtomicBool::new(false));
    {
        let exit = Arc::clone(&exit);
        ctrlc::set_handler(move || exit.store(true, Ordering::Relaxed))?;
    }
    println!("emulating on {} ports {first}/{second}, ctrl-c to detach", opt.interface);
    while !exit.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(200));
    }

    drop(program);
    println!("detached");
    Ok(())
}
