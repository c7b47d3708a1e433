//! Per-device record store and query facade.
//!
//! An [`Interface`] is one device the caller is inspecting: it owns
//! the accumulated [`InterfaceRecord`] and a share of the pooled
//! rtnetlink connection, and knows how to refresh the record from the
//! kernel.

use std::sync::Arc;

use crate::netlink::{
    AddressRecord, ConnectionPool, Error, Family, LinkRecord, PoolHandle, Result,
};

/// Everything known about one device.
///
/// The name is fixed at creation; the kernel index is resolved lazily
/// and cached for the record's lifetime. Address lists always reflect
/// the most recent completed dump.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct InterfaceRecord {
    /// Device name.
    pub name: String,
    /// Kernel interface index, once resolved.
    pub index: Option<i32>,
    /// Hardware device type (ARPHRD_*), from the last link query.
    pub device_type: Option<u16>,
    /// Rendered link-layer address.
    pub hw_address: Option<String>,
    /// Configured IPv4 addresses.
    pub ipv4_addresses: Vec<AddressRecord>,
    /// Configured IPv6 addresses.
    pub ipv6_addresses: Vec<AddressRecord>,
}

impl InterfaceRecord {
    /// Create an empty record for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Fold a decoded link message into the record.
    ///
    /// The device type follows current kernel state, but the hardware
    /// address is first-write-wins: once populated it is never
    /// overwritten for the lifetime of the record.
    pub fn merge_link(&mut self, link: &LinkRecord) {
        if self.index.is_none() {
            self.index = Some(link.index);
        }
        self.device_type = Some(link.device_type);
        if self.hw_address.is_none() {
            self.hw_address = link.hw_address.clone();
        }
    }

    /// Replace one family's address list.
    pub fn set_addresses(&mut self, family: Family, addresses: Vec<AddressRecord>) {
        match family {
            Family::V4 => self.ipv4_addresses = addresses,
            Family::V6 => self.ipv6_addresses = addresses,
        }
    }

    /// Addresses for one family.
    pub fn addresses(&self, family: Family) -> &[AddressRecord] {
        match family {
            Family::V4 => &self.ipv4_addresses,
            Family::V6 => &self.ipv6_addresses,
        }
    }

    // Single-value accessors return the *last* list entry, the
    // one-address-per-family view older callers expect.

    /// Last configured IPv4 address, if any.
    pub fn ipv4_address(&self) -> Option<&str> {
        self.ipv4_addresses.last().map(|a| a.local.as_str())
    }

    /// Prefix length of the last configured IPv4 address.
    pub fn ipv4_netmask(&self) -> Option<u8> {
        self.ipv4_addresses.last().map(|a| a.prefix_len)
    }

    /// Broadcast of the last configured IPv4 address.
    pub fn ipv4_broadcast(&self) -> Option<&str> {
        self.ipv4_addresses
            .last()
            .and_then(|a| a.broadcast.as_deref())
    }

    /// Last configured IPv6 address, if any.
    pub fn ipv6_address(&self) -> Option<&str> {
        self.ipv6_addresses.last().map(|a| a.local.as_str())
    }

    /// Prefix length of the last configured IPv6 address.
    pub fn ipv6_netmask(&self) -> Option<u8> {
        self.ipv6_addresses.last().map(|a| a.prefix_len)
    }

    /// Scope of the last configured IPv6 address.
    pub fn ipv6_scope(&self) -> Option<&str> {
        self.ipv6_addresses.last().map(|a| a.scope.as_str())
    }
}

/// Query facade for one device.
///
/// Holds the injected [`ConnectionPool`] and at most one live
/// [`PoolHandle`]: opening an already-open interface does not bump
/// the pool count again, so open/close stay balanced per object no
/// matter how often queries run.
pub struct Interface {
    pool: Arc<ConnectionPool>,
    handle: Option<PoolHandle>,
    record: InterfaceRecord,
}

impl Interface {
    /// Create a query object for `name` against the given pool.
    pub fn new(name: impl Into<String>, pool: Arc<ConnectionPool>) -> Self {
        Self {
            pool,
            handle: None,
            record: InterfaceRecord::new(name),
        }
    }

    /// The accumulated record.
    pub fn record(&self) -> &InterfaceRecord {
        &self.record
    }

    /// Consume the facade, keeping the record.
    pub fn into_record(self) -> InterfaceRecord {
        self.record
    }

    /// Device name.
    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Acquire a share of the pooled connection. Idempotent per
    /// object: an already-open interface is left untouched.
    pub fn open(&mut self) -> Result<()> {
        if self.handle.is_none() {
            self.handle = Some(self.pool.acquire()?);
        }
        Ok(())
    }

    /// Release this object's share of the pooled connection. The
    /// record survives; the next query reopens.
    pub fn close(&mut self) {
        self.handle = None;
    }

    /// Whether this object currently holds a connection share.
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    fn ensure_open(&mut self) -> Result<&PoolHandle> {
        self.open()?;
        Ok(self.handle.as_ref().expect("handle just acquired"))
    }

    /// Resolve and cache the kernel index for this device.
    ///
    /// Fails with [`Error::NoSuchDevice`] if no interface carries the
    /// name. The index never changes once cached.
    pub async fn resolve_index(&mut self) -> Result<i32> {
        if let Some(index) = self.record.index {
            return Ok(index);
        }
        let name = self.record.name.clone();
        let handle = self.ensure_open()?;
        let index = handle.resolve_index(&name).await?;
        self.record.index = Some(index);
        Ok(index)
    }

    /// Refresh identity and link-layer address from a link dump.
    ///
    /// Applied to the record only after the dump completes; a failed
    /// dump leaves the record in its pre-call state.
    pub async fn query_link(&mut self) -> Result<()> {
        let index = self.resolve_index().await?;
        let handle = self.ensure_open()?;
        let link = handle.dump_link(index).await?;
        match link {
            Some(link) => {
                self.record.merge_link(&link);
                Ok(())
            }
            None => Err(Error::NoSuchDevice {
                name: self.record.name.clone(),
            }),
        }
    }

    /// Rebuild one family's address list from an address dump.
    ///
    /// The existing list is replaced only after the dump decodes
    /// completely; repeated calls never accumulate duplicates. A
    /// device with no addresses ends up with an empty list.
    pub async fn query_addresses(&mut self, family: Family) -> Result<()> {
        let index = self.resolve_index().await?;
        let handle = self.ensure_open()?;
        let addresses = handle.dump_addresses(Some(index), family).await?;
        self.record.set_addresses(family, addresses);
        Ok(())
    }

    /// Refresh the whole record: link info plus both address families.
    pub async fn refresh(&mut self) -> Result<()> {
        self.query_link().await?;
        self.query_addresses(Family::V4).await?;
        self.query_addresses(Family::V6).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(index: i32, hw: Option<&str>) -> LinkRecord {
        LinkRecord {
            index,
            device_type: 1,
            flags: 0,
            name: Some("eth0".into()),
            hw_address: hw.map(String::from),
        }
    }

    fn v4(local: &str) -> AddressRecord {
        AddressRecord {
            family: Family::V4,
            index: 2,
            local: local.into(),
            peer: None,
            prefix_len: 24,
            broadcast: None,
            scope: "global".into(),
        }
    }

    #[test]
    fn hardware_address_first_write_wins() {
        let mut record = InterfaceRecord::new("eth0");
        record.merge_link(&link(2, Some("AA:BB:CC:DD:EE:FF")));
        record.merge_link(&link(2, Some("11:22:33:44:55:66")));
        assert_eq!(record.hw_address.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
    }

    #[test]
    fn merge_without_address_leaves_field_empty() {
        let mut record = InterfaceRecord::new("eth0");
        record.merge_link(&link(2, None));
        assert_eq!(record.hw_address, None);
        record.merge_link(&link(2, Some("AA:BB:CC:DD:EE:FF")));
        assert_eq!(record.hw_address.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
    }

    #[test]
    fn index_is_cached_once_set() {
        let mut record = InterfaceRecord::new("eth0");
        record.merge_link(&link(2, None));
        record.merge_link(&link(9, None));
        assert_eq!(record.index, Some(2));
    }

    #[test]
    fn address_lists_are_replaced_not_appended() {
        let mut record = InterfaceRecord::new("eth0");
        record.set_addresses(Family::V4, vec![v4("192.168.1.10")]);
        record.set_addresses(Family::V4, vec![v4("192.168.1.10")]);
        assert_eq!(record.ipv4_addresses.len(), 1);
    }

    #[test]
    fn single_value_accessors_return_last_entry() {
        let mut record = InterfaceRecord::new("eth0");
        record.set_addresses(
            Family::V4,
            vec![v4("192.168.1.10"), v4("10.0.0.1")],
        );
        assert_eq!(record.ipv4_address(), Some("10.0.0.1"));
        assert_eq!(record.ipv4_netmask(), Some(24));
        assert_eq!(record.ipv4_broadcast(), None);
        assert_eq!(record.ipv6_address(), None);
    }

    #[tokio::test]
    async fn open_is_idempotent_per_object() {
        let pool = ConnectionPool::new();
        let mut iface = Interface::new("lo", Arc::clone(&pool));

        iface.open().unwrap();
        iface.open().unwrap();
        assert_eq!(pool.users(), 1);

        iface.close();
        assert_eq!(pool.users(), 0);
        assert!(!pool.is_open());
    }

    #[tokio::test]
    async fn drop_releases_the_pool_share() {
        let pool = ConnectionPool::new();
        let mut iface = Interface::new("lo", Arc::clone(&pool));
        iface.open().unwrap();
        drop(iface);
        assert_eq!(pool.users(), 0);
    }
}
