extern crate clap;
extern crate trace_emu;

use {
    clap::Parser,
    std::{
        fs::{self, File},
        io::{BufWriter, Write},
        path::PathBuf,
    },
    trace_emu::derive::{derive_traces, millis_to_nanos},
};

#[derive(Parser, Debug)]
#[command(author, version, about = "derive delay/loss replay traces from probe delays", long_about = None)]
struct Opt {
    /// one-way delay per probe in milliseconds, one per line, 0 = lost
    input: PathBuf,

    #[arg(long, default_value = "delay_trace.txt")]
    delay_out: PathBuf,

    #[arg(long, default_value = "loss_trace.txt")]
    loss_out: PathBuf,

    /// probe send interval in milliseconds
    #[arg(long, default_value_t = 10.0)]
    interval_ms: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opt = Opt::parse();

    let text = fs::read_to_string(&opt.input)?;
    let mut delays = Vec::new();
    for (line, value) in text.lines().enumerate() {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let ms: f64 = value
            .parse()
            .map_err(|e| format!("{}:{}: {e}", opt.input.display(), line + 1))?;
        delays.push(millis_to_nanos(ms));
    }

    let derived = derive_traces(&delays, u64::from(millis_to_nanos(opt.interval_ms)));

    let mut out = BufWriter::new(File::create(&opt.delay_out)?);
    for delay in &derived.delay {
        writeln!(out, "{delay}")?;
    }
    out.flush()?;

    let mut out = BufWriter::new(File::create(&opt.loss_out)?);
    for lost in &derived.loss {
        writeln!(out, "{}", u8::from(*lost))?;
    }
    out.flush()?;

    println!(
        "wrote {} entries to {} and {}",
        derived.delay.len(),
        opt.delay_out.display(),
        opt.loss_out.display()
    );
    Ok(())
}
