//! The dump receive loop.
//!
//! This is the protocol state machine behind every query: send one
//! dump request, then read datagrams until the kernel signals the end
//! of the dump, streaming each data message to a consumer.

use tracing::{debug, warn};

use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::message::{MessageIter, NlMsgError, NlMsgHdr, NlMsgType};
use super::socket::NetlinkSocket;

/// Send `request` on `socket` and feed every matching data message to
/// `consume` until the dump completes.
///
/// Receive-side rules:
/// - datagrams from a non-kernel sender (port != 0) are discarded;
/// - transport-truncated datagrams are logged and the receive retried;
/// - messages whose sequence number or port id do not match the
///   request are skipped (stale replies from earlier dumps);
/// - `NLMSG_DONE` ends the dump; `NLMSG_ERROR` aborts it, where a
///   frame too short to hold `nlmsgerr` surfaces as
///   [`Error::Truncated`] instead of a kernel errno;
/// - a message split at the end of the buffer continues the outer
///   receive loop for the remainder.
///
/// Any consumer error aborts the dump and propagates unchanged.
pub(crate) async fn run_dump<F>(
    socket: &NetlinkSocket,
    mut request: MessageBuilder,
    mut consume: F,
) -> Result<()>
where
    F: FnMut(&NlMsgHdr, &[u8]) -> Result<()>,
{
    let seq = socket.next_seq();
    request.set_seq(seq);
    request.set_pid(socket.pid());
    socket.send(&request.finish()).await?;

    loop {
        let datagram = socket.recv_datagram().await?;

        if datagram.sender_port != 0 {
            warn!(
                port = datagram.sender_port,
                "discarding datagram from non-kernel sender"
            );
            continue;
        }

        if datagram.truncated {
            warn!("datagram exceeded receive buffer, retrying receive");
            continue;
        }

        for item in MessageIter::new(&datagram.data) {
            let (header, payload) = match item {
                Ok(parts) => parts,
                // A message claiming more bytes than the datagram
                // holds: the remainder arrives in the next datagram.
                Err(_) => break,
            };

            if header.nlmsg_seq != seq || header.nlmsg_pid != socket.pid() {
                continue;
            }

            if header.is_done() {
                debug!(seq, "dump complete");
                return Ok(());
            }

            if header.is_error() {
                let err = NlMsgError::from_bytes(payload)?;
                if err.is_ack() {
                    continue;
                }
                return Err(Error::from_errno(err.error));
            }

            if header.nlmsg_type == NlMsgType::NOOP {
                continue;
            }

            consume(header, payload)?;
        }
    }
}
