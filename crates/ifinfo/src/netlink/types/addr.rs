//! Address message header (struct ifaddrmsg), IFA_ constants and scopes.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Fixed header of RTM_*ADDR messages (mirrors struct ifaddrmsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IfAddrMsg {
    /// Address family (AF_INET / AF_INET6).
    pub ifa_family: u8,
    /// Prefix length.
    pub ifa_prefixlen: u8,
    /// Address flags (IFA_F_*).
    pub ifa_flags: u8,
    /// Address scope (RT_SCOPE_*).
    pub ifa_scope: u8,
    /// Interface index.
    pub ifa_index: u32,
}

impl IfAddrMsg {
    /// Size of the fixed header in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Create an empty header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address family.
    pub fn with_family(mut self, family: u8) -> Self {
        self.ifa_family = family;
        self
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }
}

/// Address attribute IDs (IFA_*).
pub mod ifa {
    pub const ADDRESS: u16 = 1;
    pub const LOCAL: u16 = 2;
    pub const BROADCAST: u16 = 4;
}

/// Address scope values (RT_SCOPE_*).
pub mod scope {
    pub const UNIVERSE: u8 = 0;
    pub const SITE: u8 = 200;
    pub const LINK: u8 = 253;
    pub const HOST: u8 = 254;
    pub const NOWHERE: u8 = 255;
}

/// Render a scope value the way iproute2 names it; unknown values fall
/// back to their decimal form.
pub fn scope_name(value: u8) -> String {
    match value {
        scope::UNIVERSE => "global".to_string(),
        scope::SITE => "site".to_string(),
        scope::LINK => "link".to_string(),
        scope::HOST => "host".to_string(),
        scope::NOWHERE => "nowhere".to_string(),
        other => other.to_string(),
    }
}
