//! Low-level async rtnetlink socket operations.

use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicU32, Ordering};

use netlink_sys::{Socket, SocketAddr, protocols};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

use super::error::{Error, Result};

/// Receive buffer size for a single netlink datagram.
///
/// rtnetlink dump replies are chunked by the kernel well below this,
/// so a larger datagram indicates truncation and is retried.
pub const RECV_BUF_LEN: usize = 32768;

/// One datagram as read off the socket, with the transport-level
/// metadata the dump reader needs to judge it.
#[derive(Debug)]
pub(crate) struct Datagram {
    /// Message bytes (up to [`RECV_BUF_LEN`]).
    pub data: Vec<u8>,
    /// Netlink port of the sender; the kernel always sends from port 0.
    pub sender_port: u32,
    /// The datagram was larger than the buffer and has been cut short.
    pub truncated: bool,
}

/// Async NETLINK_ROUTE socket.
///
/// Wraps a non-blocking `netlink-sys` socket in an [`AsyncFd`] and owns
/// the per-socket sequence counter and kernel-assigned port id used to
/// correlate dump replies.
pub struct NetlinkSocket {
    /// The underlying async file descriptor.
    fd: AsyncFd<Socket>,
    /// Sequence number counter.
    seq: AtomicU32,
    /// Local port ID (assigned by kernel).
    pid: u32,
}

impl NetlinkSocket {
    /// Open a routing-netlink socket, bind it and record the assigned port.
    pub fn open() -> Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_ROUTE)?;
        socket.set_non_blocking(true)?;

        // Bind to get a port ID
        let mut addr = SocketAddr::new(0, 0);
        socket.bind(&addr)?;
        socket.get_address(&mut addr)?;
        let pid = addr.port_number();

        set_cloexec(socket.as_raw_fd())?;

        let fd = AsyncFd::new(socket)?;

        Ok(Self {
            fd,
            seq: AtomicU32::new(1),
            pid,
        })
    }

    /// Get the next sequence number.
    pub fn next_seq(&self) -> u32 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Get the local port ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Send a message.
    pub async fn send(&self, msg: &[u8]) -> Result<()> {
        loop {
            let mut guard = self.fd.ready(Interest::WRITABLE).await?;

            match guard.try_io(|inner| inner.get_ref().send(msg, 0)) {
                Ok(result) => {
                    result?;
                    return Ok(());
                }
                Err(_would_block) => continue,
            }
        }
    }

    /// Receive one datagram together with its sender address and
    /// truncation flag.
    ///
    /// `EINTR` is retried; would-block re-arms the readiness loop.
    pub(crate) async fn recv_datagram(&self) -> Result<Datagram> {
        loop {
            let mut guard = self.fd.ready(Interest::READABLE).await?;

            match guard.try_io(|inner| recvfrom_nl(inner.get_ref().as_raw_fd())) {
                Ok(result) => return result.map_err(Error::from),
                Err(_would_block) => continue,
            }
        }
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.get_ref().as_raw_fd()
    }
}

/// Force close-on-exec on the netlink descriptor.
fn set_cloexec(fd: RawFd) -> Result<()> {
    // SAFETY: plain fcntl on a descriptor we own.
    let ret = unsafe { libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC) };
    if ret < 0 {
        return Err(Error::Io(std::io::Error::last_os_error()));
    }
    Ok(())
}

/// Raw `recvfrom` with `MSG_TRUNC` so oversized datagrams report their
/// real length, and with the sender `sockaddr_nl` captured so replies
/// not originating from the kernel (port != 0) can be rejected.
fn recvfrom_nl(fd: RawFd) -> std::io::Result<Datagram> {
    let mut buf = vec![0u8; RECV_BUF_LEN];

    loop {
        let mut sender: libc::sockaddr_nl = unsafe { std::mem::zeroed() };
        let mut addr_len = std::mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t;

        // SAFETY: buf and sender outlive the call; addr_len matches the
        // sockaddr_nl storage handed to the kernel.
        let n = unsafe {
            libc::recvfrom(
                fd,
                buf.as_mut_ptr().cast(),
                buf.len(),
                libc::MSG_TRUNC,
                std::ptr::addr_of_mut!(sender).cast::<libc::sockaddr>(),
                &mut addr_len,
            )
        };

        if n < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }

        let n = n as usize;
        let truncated = n > buf.len();
        buf.truncate(n.min(RECV_BUF_LEN));

        return Ok(Datagram {
            data: buf,
            sender_port: sender.nl_pid,
            truncated,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_sets_close_on_exec() {
        let socket = NetlinkSocket::open().expect("open routing socket");

        let fd = socket.as_raw_fd();
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
        assert!(flags >= 0);
        assert_ne!(flags & libc::FD_CLOEXEC, 0);
    }

    #[tokio::test]
    async fn sequence_numbers_are_monotonic() {
        let socket = NetlinkSocket::open().expect("open routing socket");
        let a = socket.next_seq();
        let b = socket.next_seq();
        assert_eq!(b, a + 1);
    }
}
