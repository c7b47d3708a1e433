//! Dump request construction.

use super::addr::Family;
use super::builder::MessageBuilder;
use super::message::{NLM_F_DUMP, NLM_F_REQUEST, NlMsgType};
use super::types::addr::IfAddrMsg;
use super::types::link::IfInfoMsg;

/// The dump requests this crate issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpKind {
    /// RTM_GETLINK over all devices.
    Links,
    /// RTM_GETADDR for one address family.
    Addresses(Family),
}

/// Build a dump request, optionally carrying an interface index.
///
/// The index is stamped into the fixed header. Link dumps issued
/// before the index is known go out unfiltered and are matched by
/// name from the response; address dumps are additionally filtered by
/// index on the receive side, since the kernel ignores the header
/// index for address dumps.
///
/// Pure construction: sequence number and port id are stamped by the
/// reader when the request is sent.
pub fn dump_request(kind: DumpKind, ifindex: Option<i32>) -> MessageBuilder {
    match kind {
        DumpKind::Links => {
            let mut builder =
                MessageBuilder::new(NlMsgType::RTM_GETLINK, NLM_F_REQUEST | NLM_F_DUMP);
            let header = IfInfoMsg::new().with_index(ifindex.unwrap_or(0));
            builder.append_bytes(header.as_bytes());
            builder
        }
        DumpKind::Addresses(family) => {
            let mut builder =
                MessageBuilder::new(NlMsgType::RTM_GETADDR, NLM_F_REQUEST | NLM_F_DUMP);
            let mut header = IfAddrMsg::new().with_family(family.af());
            header.ifa_index = ifindex.unwrap_or(0) as u32;
            builder.append_bytes(header.as_bytes());
            builder
        }
    }
}
