//! Decoding RTM_NEWLINK messages into link records.

use winnow::prelude::*;
use winnow::token::take;
use zerocopy::FromBytes;

use super::error::{Error, Result};
use super::parse::{PResult, cut, next_attr, parse_string_from_bytes};
use super::types::link::{IfInfoMsg, arphrd, iff, ifla};

/// One decoded link message: the identity and link-layer address of a
/// network device.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LinkRecord {
    /// Kernel interface index.
    pub index: i32,
    /// Hardware device type (ARPHRD_*).
    pub device_type: u16,
    /// Device flags (IFF_*).
    pub flags: u32,
    /// Interface name (IFLA_IFNAME).
    pub name: Option<String>,
    /// Link-layer address, already rendered for display (IFLA_ADDRESS).
    pub hw_address: Option<String>,
}

impl LinkRecord {
    /// Decode a single RTM_NEWLINK payload.
    pub fn from_message(payload: &[u8]) -> Result<Self> {
        let mut input = payload;
        Self::parse(&mut input)
            .map_err(|_| Error::InvalidMessage("malformed link message".into()))
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header_bytes: &[u8] = take(IfInfoMsg::SIZE).parse_next(input)?;
        let header = IfInfoMsg::read_from_bytes(header_bytes).map_err(|_| cut())?;

        let mut record = LinkRecord {
            index: header.ifi_index,
            device_type: header.ifi_type,
            flags: header.ifi_flags,
            ..Default::default()
        };

        while let Some((attr_type, data)) = next_attr(input)? {
            match attr_type {
                ifla::IFNAME => {
                    record.name = Some(parse_string_from_bytes(data));
                }
                ifla::ADDRESS => {
                    // Only the first link-layer address attribute counts.
                    if record.hw_address.is_none() && !data.is_empty() {
                        record.hw_address =
                            Some(format_hw_address(header.ifi_type, data));
                    }
                }
                _ => {}
            }
        }

        Ok(record)
    }

    /// Check if the interface is administratively up.
    pub fn is_up(&self) -> bool {
        self.flags & iff::UP != 0
    }

    /// Check if the interface is a loopback.
    pub fn is_loopback(&self) -> bool {
        self.flags & iff::LOOPBACK != 0
    }
}

/// Render a raw link-layer address for display.
///
/// Tunnel devices carry an IP address in IFLA_ADDRESS; everything else
/// gets the colon-separated uppercase hex form (`AA:BB:CC:DD:EE:FF`).
pub fn format_hw_address(device_type: u16, raw: &[u8]) -> String {
    match (device_type, raw.len()) {
        (arphrd::TUNNEL | arphrd::IPGRE | arphrd::SIT, 4) => {
            std::net::Ipv4Addr::new(raw[0], raw[1], raw[2], raw[3]).to_string()
        }
        (arphrd::TUNNEL6, 16) => {
            let octets: [u8; 16] = raw.try_into().unwrap();
            std::net::Ipv6Addr::from(octets).to_string()
        }
        _ => {
            let mut out = String::with_capacity(raw.len() * 3);
            for (i, byte) in raw.iter().enumerate() {
                if i > 0 {
                    out.push(':');
                }
                out.push_str(&format!("{:02X}", byte));
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(attr_type: u16, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&((4 + payload.len()) as u16).to_ne_bytes());
        buf.extend_from_slice(&attr_type.to_ne_bytes());
        buf.extend_from_slice(payload);
        while buf.len() % 4 != 0 {
            buf.push(0);
        }
        buf
    }

    fn link_payload(index: i32, device_type: u16, attrs: &[Vec<u8>]) -> Vec<u8> {
        let header = IfInfoMsg {
            ifi_type: device_type,
            ifi_index: index,
            ifi_flags: iff::UP | iff::RUNNING,
            ..Default::default()
        };
        let mut buf = header.as_bytes().to_vec();
        for a in attrs {
            buf.extend_from_slice(a);
        }
        buf
    }

    #[test]
    fn decodes_name_and_ethernet_address() {
        let payload = link_payload(
            2,
            arphrd::ETHER,
            &[
                attr(ifla::IFNAME, b"eth0\0"),
                attr(ifla::ADDRESS, &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
            ],
        );

        let record = LinkRecord::from_message(&payload).unwrap();
        assert_eq!(record.index, 2);
        assert_eq!(record.name.as_deref(), Some("eth0"));
        assert_eq!(record.hw_address.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
        assert!(record.is_up());
    }

    #[test]
    fn first_address_attribute_wins() {
        let payload = link_payload(
            3,
            arphrd::ETHER,
            &[
                attr(ifla::ADDRESS, &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
                attr(ifla::ADDRESS, &[0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB]),
            ],
        );

        let record = LinkRecord::from_message(&payload).unwrap();
        assert_eq!(record.hw_address.as_deref(), Some("00:11:22:33:44:55"));
    }

    #[test]
    fn tunnel_addresses_render_as_ip() {
        assert_eq!(
            format_hw_address(arphrd::SIT, &[192, 0, 2, 1]),
            "192.0.2.1"
        );
        assert_eq!(
            format_hw_address(arphrd::TUNNEL, &[10, 0, 0, 1]),
            "10.0.0.1"
        );

        let mut v6 = [0u8; 16];
        v6[0] = 0x20;
        v6[1] = 0x01;
        v6[2] = 0x0d;
        v6[3] = 0xb8;
        v6[15] = 0x01;
        assert_eq!(format_hw_address(arphrd::TUNNEL6, &v6), "2001:db8::1");
    }

    #[test]
    fn non_tunnel_four_byte_payload_stays_hex() {
        assert_eq!(
            format_hw_address(arphrd::ETHER, &[192, 0, 2, 1]),
            "C0:00:02:01"
        );
    }

    #[test]
    fn truncated_header_is_invalid() {
        let err = LinkRecord::from_message(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, Error::InvalidMessage(_)));
    }
}
