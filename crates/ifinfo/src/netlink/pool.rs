//! Shared rtnetlink connection management.
//!
//! A process only ever needs one routing socket for read-only dumps,
//! but many query objects may be alive at once. The pool opens the
//! socket on first acquire, hands out reference-counted handles, and
//! closes the socket again once the last handle is dropped. The pool
//! is passed explicitly (by `Arc`) to whoever needs it; there is no
//! hidden process-global.

use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use super::addr::{AddressRecord, Family};
use super::error::{Error, Result};
use super::link::LinkRecord;
use super::message::NlMsgType;
use super::reader::run_dump;
use super::request::{DumpKind, dump_request};
use super::socket::NetlinkSocket;

/// Reference-counted owner of the shared routing socket.
pub struct ConnectionPool {
    state: Mutex<PoolState>,
    /// Back-reference handed to handles so they can release on drop.
    self_ref: Weak<ConnectionPool>,
}

struct PoolState {
    socket: Option<Arc<NetlinkSocket>>,
    users: usize,
}

impl ConnectionPool {
    /// Create an empty pool. No socket is opened until the first
    /// [`acquire`](Self::acquire).
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            state: Mutex::new(PoolState {
                socket: None,
                users: 0,
            }),
            self_ref: self_ref.clone(),
        })
    }

    /// Open (if necessary) the shared connection and return a handle
    /// to it. Every handle must eventually be dropped; the socket is
    /// closed when the last one goes.
    ///
    /// Socket creation failure surfaces as [`Error::Io`] and leaves
    /// the pool unopened; there is no retry.
    pub fn acquire(&self) -> Result<PoolHandle> {
        let mut state = self.state.lock().expect("pool mutex poisoned");

        let socket = match &state.socket {
            Some(socket) => Arc::clone(socket),
            None => {
                let socket = Arc::new(NetlinkSocket::open()?);
                debug!("opened shared rtnetlink connection");
                state.socket = Some(Arc::clone(&socket));
                socket
            }
        };

        state.users += 1;
        Ok(PoolHandle {
            pool: self.self_ref.upgrade().expect("pool still referenced"),
            socket,
        })
    }

    fn release(&self) {
        let mut state = self.state.lock().expect("pool mutex poisoned");
        debug_assert!(state.users > 0, "release without matching acquire");
        state.users = state.users.saturating_sub(1);
        if state.users == 0 {
            state.socket = None;
            debug!("closed shared rtnetlink connection");
        }
    }

    /// Number of live handles.
    pub fn users(&self) -> usize {
        self.state.lock().expect("pool mutex poisoned").users
    }

    /// Whether the shared socket is currently open.
    pub fn is_open(&self) -> bool {
        self.state
            .lock()
            .expect("pool mutex poisoned")
            .socket
            .is_some()
    }
}

/// One user's handle on the shared connection.
///
/// Dump operations live here: a handle is proof the connection is
/// open. Dropping the handle releases the user's reference.
pub struct PoolHandle {
    pool: Arc<ConnectionPool>,
    socket: Arc<NetlinkSocket>,
}

impl Drop for PoolHandle {
    fn drop(&mut self) {
        self.pool.release();
    }
}

impl PoolHandle {
    /// Dump links, optionally keeping only the device with the given
    /// kernel index.
    pub async fn dump_links(&self, ifindex: Option<i32>) -> Result<Vec<LinkRecord>> {
        let request = dump_request(DumpKind::Links, ifindex);
        let mut records = Vec::new();

        run_dump(&self.socket, request, |header, payload| {
            if header.nlmsg_type != NlMsgType::RTM_NEWLINK {
                return Ok(());
            }
            let record = LinkRecord::from_message(payload)?;
            if ifindex.is_none_or(|idx| record.index == idx) {
                records.push(record);
            }
            Ok(())
        })
        .await?;

        Ok(records)
    }

    /// Dump the link record for one device, by kernel index.
    ///
    /// Returns `None` if the index matches no device.
    pub async fn dump_link(&self, ifindex: i32) -> Result<Option<LinkRecord>> {
        let mut records = self.dump_links(Some(ifindex)).await?;
        Ok(records.pop())
    }

    /// Dump configured addresses for one family, optionally filtered
    /// to a single device.
    ///
    /// A device with no configured addresses yields an empty list.
    pub async fn dump_addresses(
        &self,
        ifindex: Option<i32>,
        family: Family,
    ) -> Result<Vec<AddressRecord>> {
        let request = dump_request(DumpKind::Addresses(family), ifindex);
        let mut records = Vec::new();

        run_dump(&self.socket, request, |header, payload| {
            if header.nlmsg_type != NlMsgType::RTM_NEWADDR {
                return Ok(());
            }
            // Other families are skipped, not errors.
            let Some(record) = AddressRecord::from_message(payload)? else {
                return Ok(());
            };
            if record.family == family
                && ifindex.is_none_or(|idx| record.index == idx as u32)
            {
                records.push(record);
            }
            Ok(())
        })
        .await?;

        Ok(records)
    }

    /// Resolve a device name to its kernel index with an unfiltered
    /// link dump.
    pub async fn resolve_index(&self, name: &str) -> Result<i32> {
        let links = self.dump_links(None).await?;
        links
            .into_iter()
            .find(|link| link.name.as_deref() == Some(name))
            .map(|link| link.index)
            .ok_or_else(|| Error::NoSuchDevice {
                name: name.to_string(),
            })
    }
}
