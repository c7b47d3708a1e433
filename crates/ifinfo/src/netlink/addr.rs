//! Decoding RTM_NEWADDR messages into address records.

use std::net::{Ipv4Addr, Ipv6Addr};

use winnow::prelude::*;
use winnow::token::take;
use zerocopy::FromBytes;

use super::error::{Error, Result};
use super::parse::{PResult, cut, next_attr};
use super::types::addr::{IfAddrMsg, ifa, scope_name};

/// IPv4 address family.
pub const AF_INET: u8 = 2;
/// IPv6 address family.
pub const AF_INET6: u8 = 10;

/// Address family of an [`AddressRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Family {
    /// IPv4.
    V4,
    /// IPv6.
    V6,
}

impl Family {
    /// The AF_* constant for this family.
    pub fn af(self) -> u8 {
        match self {
            Family::V4 => AF_INET,
            Family::V6 => AF_INET6,
        }
    }

    fn from_af(value: u8) -> Option<Self> {
        match value {
            AF_INET => Some(Family::V4),
            AF_INET6 => Some(Family::V6),
            _ => None,
        }
    }
}

/// One configured address on a device.
///
/// `broadcast` is only ever populated for IPv4 records.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AddressRecord {
    /// Address family.
    pub family: Family,
    /// Kernel index of the device the address is configured on.
    pub index: u32,
    /// Local address, in presentation form.
    pub local: String,
    /// Point-to-point peer address, if one is configured.
    pub peer: Option<String>,
    /// Prefix length (0..=32 for IPv4, 0..=128 for IPv6).
    pub prefix_len: u8,
    /// Broadcast address (IPv4 only).
    pub broadcast: Option<String>,
    /// Scope name ("global", "link", "host", ...).
    pub scope: String,
}

impl AddressRecord {
    /// Decode a single RTM_NEWADDR payload.
    ///
    /// Returns `Ok(None)` for address families other than IPv4/IPv6;
    /// those records are skipped, not errors.
    pub fn from_message(payload: &[u8]) -> Result<Option<Self>> {
        let mut input = payload;
        Self::parse(&mut input)
            .map_err(|_| Error::InvalidMessage("malformed address message".into()))
    }

    fn parse(input: &mut &[u8]) -> PResult<Option<Self>> {
        let header_bytes: &[u8] = take(IfAddrMsg::SIZE).parse_next(input)?;
        let header = IfAddrMsg::read_from_bytes(header_bytes).map_err(|_| cut())?;

        let Some(family) = Family::from_af(header.ifa_family) else {
            return Ok(None);
        };

        let mut address: Option<&[u8]> = None;
        let mut local: Option<&[u8]> = None;
        let mut broadcast: Option<&[u8]> = None;

        while let Some((attr_type, data)) = next_attr(input)? {
            match attr_type {
                ifa::ADDRESS => address = Some(data),
                ifa::LOCAL => local = Some(data),
                ifa::BROADCAST => broadcast = Some(data),
                _ => {}
            }
        }

        // IFA_LOCAL is the local endpoint; IFA_ADDRESS doubles as the
        // point-to-point peer when both are present and differ. IPv6
        // messages usually carry only IFA_ADDRESS.
        let local_raw = local.or(address);
        let Some(local_raw) = local_raw else {
            return Err(cut());
        };
        let local_str = format_ip(family, local_raw).ok_or_else(cut)?;

        let peer = match (local, address) {
            (Some(l), Some(a)) if a != l => format_ip(family, a),
            _ => None,
        };

        let broadcast = match family {
            Family::V4 => broadcast.and_then(|b| format_ip(family, b)),
            Family::V6 => None,
        };

        Ok(Some(AddressRecord {
            family,
            index: header.ifa_index,
            local: local_str,
            peer,
            prefix_len: header.ifa_prefixlen,
            broadcast,
            scope: scope_name(header.ifa_scope),
        }))
    }
}

/// Presentation formatting for a raw address attribute payload.
fn format_ip(family: Family, raw: &[u8]) -> Option<String> {
    match family {
        Family::V4 => {
            let octets: [u8; 4] = raw.try_into().ok()?;
            Some(Ipv4Addr::from(octets).to_string())
        }
        Family::V6 => {
            let octets: [u8; 16] = raw.try_into().ok()?;
            Some(Ipv6Addr::from(octets).to_string())
        }
    }
}
