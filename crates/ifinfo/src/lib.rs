//! Query live network interface configuration on Linux.
//!
//! This crate reads link and address state over rtnetlink, enumerates
//! devices, and exposes hardware/offload settings over the ethtool
//! ioctl interface. It is read-mostly: the only mutating surface is
//! the offload/coalesce/ring setters on [`ethtool::ControlSocket`].
//!
//! # Features
//!
//! - `serde` - `Serialize` derives on the public record types
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ifinfo::{Interface, netlink::ConnectionPool};
//!
//! #[tokio::main]
//! async fn main() -> ifinfo::Result<()> {
//!     let pool = ConnectionPool::new();
//!
//!     let mut eth0 = Interface::new("eth0", Arc::clone(&pool));
//!     eth0.refresh().await?;
//!
//!     let record = eth0.record();
//!     println!("{}: {:?}", record.name, record.hw_address);
//!     for addr in &record.ipv4_addresses {
//!         println!("  {}/{}", addr.local, addr.prefix_len);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Connection sharing
//!
//! All [`Interface`] objects created against one
//! [`ConnectionPool`](netlink::ConnectionPool) share a single routing
//! socket, opened on first use and closed when the last user is done.
//! Queries are plain request/response; concurrent dumps from multiple
//! tasks on the one shared socket can interleave their replies, so
//! serialize queries or use separate pools if you need parallelism.

pub mod devices;
pub mod ethtool;
mod interface;
pub mod netlink;

// Re-export common types at crate root for convenience
pub use interface::{Interface, InterfaceRecord};
pub use netlink::{AddressRecord, ConnectionPool, Error, Family, LinkRecord, Result};
