// ethernet / ipv4 / l4-port extraction over untrusted, possibly truncated frames.
// parsing is straight-line: at most one read per field, every read bounds-checked.

use crate::{
    ETH_HEADER_SIZE, ETH_P_IP, IPPROTO_TCP, IPPROTO_UDP, IPV4_MIN_HEADER_SIZE, L4_PORTS_SIZE,
};

/// read-only view of one frame as seen at the hook point
///
/// implementations must return `None` for any read that would cross `len()`.
pub trait PacketBytes {
    fn len(&self) -> usize;

    fn load_u8(&self, offset: usize) -> Option<u8>;

    #[inline(always)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// network byte order u16 at `offset`, converted to host order
    #[inline(always)]
    fn load_be_u16(&self, offset: usize) -> Option<u16> {
        let hi = self.load_u8(offset)?;
        let lo = self.load_u8(offset.checked_add(1)?)?;
        Some(u16::from_be_bytes([hi, lo]))
    }
}

impl PacketBytes for [u8] {
    #[inline(always)]
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    #[inline(always)]
    fn load_u8(&self, offset: usize) -> Option<u8> {
        self.get(offset).copied()
    }
}

impl<const N: usize> PacketBytes for [u8; N] {
    #[inline(always)]
    fn len(&self) -> usize {
        N
    }

    #[inline(always)]
    fn load_u8(&self, offset: usize) -> Option<u8> {
        self.get(offset).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortPair {
    pub src: u16,
    pub dst: u16,
}

/// fields extracted so far; a field is only present if its header was fully in bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParsedHeaders {
    pub ether_type: Option<u16>,
    pub ip_proto: Option<u8>,
    pub ports: Option<PortPair>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// ipv4 + tcp/udp, ports extracted
    Applicable(ParsedHeaders),
    /// well-formed up to a header we do not emulate (arp, ipv6, icmp, ...)
    NotApplicable(ParsedHeaders),
    /// a header ran past the end of the buffer or contradicts its own length
    Truncated(ParsedHeaders),
}

impl ParseOutcome {
    #[inline(always)]
    pub fn headers(&self) -> &ParsedHeaders {
        match self {
            Self::Applicable(h) | Self::NotApplicable(h) | Self::Truncated(h) => h,
        }
    }

    #[inline(always)]
    pub fn is_fully_parsed(&self) -> bool {
        !matches!(self, Self::Truncated(_))
    }

    /// ports of an applicable frame; partial fields of other outcomes are never exposed here
    #[inline(always)]
    pub fn ports(&self) -> Option<PortPair> {
        match self {
            Self::Applicable(h) => h.ports,
            Self::NotApplicable(_) | Self::Truncated(_) => None,
        }
    }
}

#[inline(always)]
pub fn parse<F: PacketBytes + ?Sized>(frame: &F) -> ParseOutcome {
    let mut headers = ParsedHeaders::default();
    let len = frame.len();

    // ethernet
    if len < ETH_HEADER_SIZE {
        return ParseOutcome::Truncated(headers);
    }
    let Some(ether_type) = frame.load_be_u16(12) else {
        return ParseOutcome::Truncated(headers);
    };
    headers.ether_type = Some(ether_type);
    if ether_type != ETH_P_IP {
        return ParseOutcome::NotApplicable(headers);
    }

    // ipv4, fixed part first so ihl/protocol are in bounds
    let ip_off = ETH_HEADER_SIZE;
    if len < ip_off + IPV4_MIN_HEADER_SIZE {
        return ParseOutcome::Truncated(headers);
    }
    let Some(version_ihl) = frame.load_u8(ip_off) else {
        return ParseOutcome::Truncated(headers);
    };
    let ihl = usize::from(version_ihl & 0x0f) * 4;
    if version_ihl >> 4 != 4 || ihl < IPV4_MIN_HEADER_SIZE {
        return ParseOutcome::Truncated(headers);
    }
    if len < ip_off + ihl {
        return ParseOutcome::Truncated(headers);
    }
    let Some(proto) = frame.load_u8(ip_off + 9) else {
        return ParseOutcome::Truncated(headers);
    };
    headers.ip_proto = Some(proto);
    if proto != IPPROTO_TCP && proto != IPPROTO_UDP {
        return ParseOutcome::NotApplicable(headers);
    }

    // first four bytes of tcp and udp are the two ports
    let l4_off = ip_off + ihl;
    if len < l4_off + L4_PORTS_SIZE {
        return ParseOutcome::Truncated(headers);
    }
    let (Some(src), Some(dst)) = (frame.load_be_u16(l4_off), frame.load_be_u16(l4_off + 2))
    else {
        return ParseOutcome::Truncated(headers);
    };
    headers.ports = Some(PortPair { src, dst });

    ParseOutcome::Applicable(headers)
}
