//! rtnetlink protocol implementation for link and address queries.
//!
//! Everything here is request/response over NETLINK_ROUTE: build a
//! dump request, send it on the shared socket, and decode the reply
//! stream into [`LinkRecord`]s and [`AddressRecord`]s. Connection
//! lifetime is handled by [`ConnectionPool`], which shares one socket
//! across all live query objects.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use ifinfo::netlink::{ConnectionPool, Family};
//!
//! let pool = ConnectionPool::new();
//! let conn = pool.acquire()?;
//!
//! let index = conn.resolve_index("eth0").await?;
//! let link = conn.dump_link(index).await?;
//! let v4 = conn.dump_addresses(Some(index), Family::V4).await?;
//! ```

pub mod addr;
pub mod attr;
mod builder;
mod error;
pub mod link;
pub mod message;
mod parse;
mod pool;
mod reader;
pub mod request;
mod socket;
pub mod types;

pub use addr::{AddressRecord, Family};
pub use builder::MessageBuilder;
pub use error::{Error, Result};
pub use link::LinkRecord;
pub use message::{MessageIter, NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
pub use pool::{ConnectionPool, PoolHandle};
pub use request::{DumpKind, dump_request};
pub use socket::NetlinkSocket;
