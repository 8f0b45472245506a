use crate::packet::{ParseOutcome, PortPair};

/// watch-list gate: only frames whose source or destination port is watched are emulated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortFilter {
    watched: [u16; 2],
}

impl PortFilter {
    /// the two ports may be equal
    pub const fn new(first: u16, second: u16) -> Self {
        Self {
            watched: [first, second],
        }
    }

    pub const fn single(port: u16) -> Self {
        Self::new(port, port)
    }

    pub const fn watched(&self) -> [u16; 2] {
        self.watched
    }

    #[inline(always)]
    fn is_watched(&self, port: u16) -> bool {
        port == self.watched[0] || port == self.watched[1]
    }

    #[inline(always)]
    pub fn matches(&self, ports: PortPair) -> bool {
        self.is_watched(ports.src) || self.is_watched(ports.dst)
    }

    /// ports of a frame that should be emulated, `None` for everything else
    #[inline(always)]
    pub fn admits(&self, outcome: &ParseOutcome) -> Option<PortPair> {
        outcome.ports().filter(|ports| self.matches(*ports))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            packet::{parse, tests::frame, ParsedHeaders},
            ETH_P_IP, IPPROTO_TCP, IPPROTO_UDP,
        },
    };

    #[test]
    fn test_matches_either_direction() {
        let filter = PortFilter::single(2112);
        assert!(filter.matches(PortPair { src: 2112, dst: 9 }));
        assert!(filter.matches(PortPair { src: 9, dst: 2112 }));
        assert!(!filter.matches(PortPair { src: 9, dst: 80 }));
    }

    #[test]
    fn test_second_port() {
        let filter = PortFilter::new(2112, 5201);
        assert!(filter.matches(PortPair { src: 5201, dst: 1 }));
        assert!(filter.matches(PortPair { src: 1, dst: 2112 }));
        assert!(!filter.matches(PortPair { src: 1, dst: 2 }));
    }

    #[test]
    fn test_admits_only_applicable() {
        let filter = PortFilter::single(2112);

        let udp = frame(ETH_P_IP, IPPROTO_UDP, 1, 2112);
        assert_eq!(
            filter.admits(&parse(udp.as_slice())),
            Some(PortPair { src: 1, dst: 2112 })
        );

        let http = frame(ETH_P_IP, IPPROTO_TCP, 50000, 80);
        assert_eq!(filter.admits(&parse(http.as_slice())), None);

        // partial fields never leak through a truncated outcome
        let truncated = ParseOutcome::Truncated(ParsedHeaders {
            ether_type: Some(ETH_P_IP),
            ip_proto: Some(IPPROTO_UDP),
            ports: Some(PortPair {
                src: 2112,
                dst: 2112,
            }),
        });
        assert_eq!(filter.admits(&truncated), None);
    }
}
