#![allow(clippy::arithmetic_side_effects)]

use {
    crate::{
        config::EmulatorConfig,
        error::{Error, Result},
    },
    aya::{
        maps::Array,
        programs::{tc, SchedClassifier, TcAttachType, Xdp, XdpFlags},
        Ebpf, EbpfLoader,
    },
    caps::{CapSet, Capability},
    std::{path::Path, process::Command},
    trace_emu_common::{
        DELAY_PROGRAM, DELAY_TRACE_MAP, LOSS_PROGRAM, LOSS_TRACE_MAP, TRACE_LEN,
        WATCHED_PORTS_GLOBAL,
    },
};

/// default location of the object built from `emu-ebpf`
pub const DEFAULT_OBJECT_PATH: &str = "target/bpf/trace-emu-ebpf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XdpMode {
    /// native driver mode, falling back to generic (skb) mode
    #[default]
    Auto,
    Native,
    Generic,
}

/// raise what loading and attaching needs; run as root or with file caps
pub fn raise_capabilities() -> Result<()> {
    for cap in [Capability::CAP_NET_ADMIN, Capability::CAP_BPF] {
        caps::raise(None, CapSet::Effective, cap).map_err(|e| Error::Capability {
            capability: format!("{cap:?}"),
            detail: e.to_string(),
        })?;
    }
    Ok(())
}

/// the loaded kernel object; dropping it detaches both programs
pub struct TraceEmuProgram {
    ebpf: Ebpf,
}

impl TraceEmuProgram {
    /// load the object with the watched ports baked into its read-only globals
    pub fn load(path: impl AsRef<Path>, config: &EmulatorConfig) -> Result<Self> {
        config.validate()?;
        if config.trace_len != TRACE_LEN {
            return Err(Error::Config(format!(
                "kernel trace maps are built with {TRACE_LEN} slots, config asks for {}",
                config.trace_len
            )));
        }

        let path = path.as_ref();
        let ebpf = EbpfLoader::new()
            .set_global(WATCHED_PORTS_GLOBAL, &config.watched_ports, true)
            .load_file(path)?;

        log::debug!("programs in {}:", path.display());
        for (name, _) in ebpf.programs() {
            log::debug!("  - {name}");
        }
        log::info!(
            "loaded {} watching ports {:?}",
            path.display(),
            config.watched_ports
        );

        Ok(Self { ebpf })
    }

    /// delay engine on egress: stamps the earliest departure time on matching packets
    pub fn attach_delay(&mut self, iface: &str) -> Result<()> {
        // fails when the qdisc is already there, which is fine
        if let Err(e) = tc::qdisc_add_clsact(iface) {
            log::warn!("clsact on {iface}: {e}");
        }

        let program: &mut SchedClassifier = self
            .ebpf
            .program_mut(DELAY_PROGRAM)
            .ok_or(Error::MissingProgram(DELAY_PROGRAM))?
            .try_into()?;
        program.load()?;
        program.attach(iface, TcAttachType::Egress)?;

        log::info!("{DELAY_PROGRAM} attached to {iface} egress");
        Ok(())
    }

    /// loss engine on ingress (xdp)
    pub fn attach_loss(&mut self, iface: &str, mode: XdpMode) -> Result<()> {
        let program: &mut Xdp = self
            .ebpf
            .program_mut(LOSS_PROGRAM)
            .ok_or(Error::MissingProgram(LOSS_PROGRAM))?
            .try_into()?;
        program.load()?;

        match mode {
            XdpMode::Native => {
                program.attach(iface, XdpFlags::DRV_MODE)?;
            }
            XdpMode::Generic => {
                program.attach(iface, XdpFlags::SKB_MODE)?;
            }
            // try native mode first, fall back to SKB mode if it fails
            XdpMode::Auto => match program.attach(iface, XdpFlags::DRV_MODE) {
                Ok(_) => log::info!("{LOSS_PROGRAM} attached to {iface} in DRV mode (native)"),
                Err(e) => {
                    log::warn!("failed to attach in DRV mode: {e}, trying SKB mode");
                    program.attach(iface, XdpFlags::SKB_MODE)?;
                    log::info!("{LOSS_PROGRAM} attached to {iface} in SKB mode (generic)");
                }
            },
        }
        Ok(())
    }

    /// write delay slots; `None` entries are left untouched
    pub fn populate_delay(&mut self, entries: &[Option<u32>]) -> Result<usize> {
        self.populate(DELAY_TRACE_MAP, entries.iter().copied())
    }

    /// write loss slots; `None` entries are left untouched
    pub fn populate_loss(&mut self, entries: &[Option<bool>]) -> Result<usize> {
        self.populate(LOSS_TRACE_MAP, entries.iter().map(|v| v.map(u32::from)))
    }

    pub fn set_delay(&mut self, index: u32, delay_ns: u32) -> Result<()> {
        self.trace_map(DELAY_TRACE_MAP)?.set(index, delay_ns, 0)?;
        log::debug!("{DELAY_TRACE_MAP}[{index}] = {delay_ns}");
        Ok(())
    }

    pub fn set_loss(&mut self, index: u32, drop: bool) -> Result<()> {
        self.trace_map(LOSS_TRACE_MAP)?
            .set(index, u32::from(drop), 0)?;
        log::debug!("{LOSS_TRACE_MAP}[{index}] = {drop}");
        Ok(())
    }

    fn trace_map(&mut self, name: &'static str) -> Result<Array<&mut aya::maps::MapData, u32>> {
        let map = self.ebpf.map_mut(name).ok_or(Error::MissingMap(name))?;
        Ok(Array::try_from(map)?)
    }

    fn populate(
        &mut self,
        name: &'static str,
        entries: impl ExactSizeIterator<Item = Option<u32>>,
    ) -> Result<usize> {
        if entries.len() > TRACE_LEN as usize {
            return Err(Error::TraceTooLong {
                capacity: TRACE_LEN,
            });
        }
        let mut map = self.trace_map(name)?;
        let mut written = 0;
        for (index, value) in entries.enumerate() {
            if let Some(value) = value {
                map.set(index as u32, value, 0)?;
                written += 1;
            }
        }
        log::info!("populated {written} slots of {name}");
        Ok(written)
    }
}

/// replace the root qdisc with fq, which holds skbs until their departure stamp
pub fn install_fq(iface: &str) -> Result<()> {
    let args = ["qdisc", "replace", "dev", iface, "root", "fq"];
    let output = Command::new("tc").args(args).output()?;
    if !output.status.success() {
        return Err(Error::Tc {
            command: args.join(" "),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    log::info!("fq installed as root qdisc on {iface}");
    Ok(())
}
