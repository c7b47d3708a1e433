//! Hardware queries over the `SIOCETHTOOL` ioctl control protocol.
//!
//! Unlike the netlink side, this is stateless request/response: each
//! operation fills an `ifreq`, points it at a command struct and
//! issues one ioctl on an `AF_INET` datagram control socket. No
//! caching, no shared state, no concurrency concerns.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use crate::netlink::{Error, Result};

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = 16;

// Ethtool command numbers (linux/ethtool.h).
const ETHTOOL_GDRVINFO: u32 = 0x0000_0003;
const ETHTOOL_GCOALESCE: u32 = 0x0000_000e;
const ETHTOOL_SCOALESCE: u32 = 0x0000_000f;
const ETHTOOL_GRINGPARAM: u32 = 0x0000_0010;
const ETHTOOL_SRINGPARAM: u32 = 0x0000_0011;
const ETHTOOL_GSG: u32 = 0x0000_0018;
const ETHTOOL_SSG: u32 = 0x0000_0019;
const ETHTOOL_GTSO: u32 = 0x0000_001e;
const ETHTOOL_STSO: u32 = 0x0000_001f;
const ETHTOOL_GUFO: u32 = 0x0000_0021;
const ETHTOOL_SUFO: u32 = 0x0000_0022;
const ETHTOOL_GGSO: u32 = 0x0000_0023;
const ETHTOOL_SGSO: u32 = 0x0000_0024;

/// Driver identification (`ETHTOOL_GDRVINFO`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DriverInfo {
    /// Driver short name (e.g. "e1000e").
    pub driver: String,
    /// Driver version.
    pub version: String,
    /// Firmware version.
    pub fw_version: String,
    /// Bus address (e.g. "0000:00:1f.6").
    pub bus_info: String,
}

/// Interrupt coalescing parameters (`struct ethtool_coalesce`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coalesce {
    // Command slot read by the kernel, not by us.
    #[cfg_attr(feature = "serde", serde(skip))]
    #[allow(dead_code)]
    cmd: u32,
    pub rx_coalesce_usecs: u32,
    pub rx_max_coalesced_frames: u32,
    pub rx_coalesce_usecs_irq: u32,
    pub rx_max_coalesced_frames_irq: u32,
    pub tx_coalesce_usecs: u32,
    pub tx_max_coalesced_frames: u32,
    pub tx_coalesce_usecs_irq: u32,
    pub tx_max_coalesced_frames_irq: u32,
    pub stats_block_coalesce_usecs: u32,
    pub use_adaptive_rx_coalesce: u32,
    pub use_adaptive_tx_coalesce: u32,
    pub pkt_rate_low: u32,
    pub rx_coalesce_usecs_low: u32,
    pub rx_max_coalesced_frames_low: u32,
    pub tx_coalesce_usecs_low: u32,
    pub tx_max_coalesced_frames_low: u32,
    pub pkt_rate_high: u32,
    pub rx_coalesce_usecs_high: u32,
    pub rx_max_coalesced_frames_high: u32,
    pub tx_coalesce_usecs_high: u32,
    pub tx_max_coalesced_frames_high: u32,
    pub rate_sample_interval: u32,
}

/// Ring buffer sizes (`struct ethtool_ringparam`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RingParam {
    // Command slot read by the kernel, not by us.
    #[cfg_attr(feature = "serde", serde(skip))]
    #[allow(dead_code)]
    cmd: u32,
    pub rx_max_pending: u32,
    pub rx_mini_max_pending: u32,
    pub rx_jumbo_max_pending: u32,
    pub tx_max_pending: u32,
    pub rx_pending: u32,
    pub rx_mini_pending: u32,
    pub rx_jumbo_pending: u32,
    pub tx_pending: u32,
}

/// `struct ethtool_drvinfo`. The full kernel layout must be present
/// for the ioctl even though only the string fields are consumed.
#[repr(C)]
#[allow(dead_code)]
struct EthtoolDrvinfo {
    cmd: u32,
    driver: [u8; 32],
    version: [u8; 32],
    fw_version: [u8; 32],
    bus_info: [u8; 32],
    erom_version: [u8; 32],
    reserved2: [u8; 12],
    n_priv_flags: u32,
    n_stats: u32,
    testinfo_len: u32,
    eedump_len: u32,
    regdump_len: u32,
}

/// `struct ethtool_value`.
#[repr(C)]
#[derive(Default)]
struct EthtoolValue {
    #[allow(dead_code)]
    cmd: u32,
    data: u32,
}

/// Per-device offload toggles reachable through `ETHTOOL_G*`/`S*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offload {
    /// TCP segmentation offload.
    Tso,
    /// UDP fragmentation offload.
    Ufo,
    /// Generic segmentation offload.
    Gso,
    /// Scatter-gather.
    Sg,
}

impl Offload {
    fn get_cmd(self) -> u32 {
        match self {
            Offload::Tso => ETHTOOL_GTSO,
            Offload::Ufo => ETHTOOL_GUFO,
            Offload::Gso => ETHTOOL_GGSO,
            Offload::Sg => ETHTOOL_GSG,
        }
    }

    fn set_cmd(self) -> u32 {
        match self {
            Offload::Tso => ETHTOOL_STSO,
            Offload::Ufo => ETHTOOL_SUFO,
            Offload::Gso => ETHTOOL_SGSO,
            Offload::Sg => ETHTOOL_SSG,
        }
    }
}

/// `AF_INET` datagram socket used as the ioctl endpoint.
pub struct ControlSocket {
    fd: OwnedFd,
}

impl ControlSocket {
    /// Open a control socket.
    pub fn open() -> Result<Self> {
        // SAFETY: plain socket(2); the descriptor is checked before use.
        let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM | libc::SOCK_CLOEXEC, 0) };
        if fd < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }
        // SAFETY: fd is a freshly created, owned descriptor.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(Self { fd })
    }

    fn ioctl(&self, request: libc::c_ulong, ifr: &mut libc::ifreq) -> Result<()> {
        // SAFETY: ifr is a fully initialized ifreq owned by the caller.
        let ret = unsafe { libc::ioctl(self.fd.as_raw_fd(), request, ifr as *mut libc::ifreq) };
        if ret < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Issue one `SIOCETHTOOL` command with `payload` as its argument
    /// block. The kernel reads and/or rewrites it in place.
    fn ethtool<T>(&self, dev: &str, payload: &mut T) -> Result<()> {
        let mut ifr = ifreq_for(dev)?;
        ifr.ifr_ifru.ifru_data = (payload as *mut T).cast::<libc::c_char>();
        self.ioctl(libc::SIOCETHTOOL, &mut ifr)
    }

    /// Driver name, version and bus info (`ETHTOOL_GDRVINFO`).
    pub fn driver_info(&self, dev: &str) -> Result<DriverInfo> {
        // SAFETY: all fields are plain integers/byte arrays.
        let mut info: EthtoolDrvinfo = unsafe { std::mem::zeroed() };
        info.cmd = ETHTOOL_GDRVINFO;
        self.ethtool(dev, &mut info)?;

        Ok(DriverInfo {
            driver: fixed_string(&info.driver),
            version: fixed_string(&info.version),
            fw_version: fixed_string(&info.fw_version),
            bus_info: fixed_string(&info.bus_info),
        })
    }

    /// Current interrupt coalescing parameters.
    pub fn coalesce(&self, dev: &str) -> Result<Coalesce> {
        let mut coal = Coalesce {
            cmd: ETHTOOL_GCOALESCE,
            ..Default::default()
        };
        self.ethtool(dev, &mut coal)?;
        Ok(coal)
    }

    /// Apply interrupt coalescing parameters.
    pub fn set_coalesce(&self, dev: &str, params: &Coalesce) -> Result<()> {
        let mut coal = *params;
        coal.cmd = ETHTOOL_SCOALESCE;
        self.ethtool(dev, &mut coal)
    }

    /// Current ring buffer sizes.
    pub fn ring_param(&self, dev: &str) -> Result<RingParam> {
        let mut ring = RingParam {
            cmd: ETHTOOL_GRINGPARAM,
            ..Default::default()
        };
        self.ethtool(dev, &mut ring)?;
        Ok(ring)
    }

    /// Apply ring buffer sizes.
    pub fn set_ring_param(&self, dev: &str, params: &RingParam) -> Result<()> {
        let mut ring = *params;
        ring.cmd = ETHTOOL_SRINGPARAM;
        self.ethtool(dev, &mut ring)
    }

    /// Query one offload toggle.
    pub fn offload(&self, dev: &str, which: Offload) -> Result<bool> {
        let mut value = EthtoolValue {
            cmd: which.get_cmd(),
            ..Default::default()
        };
        self.ethtool(dev, &mut value)?;
        Ok(value.data != 0)
    }

    /// Enable or disable one offload toggle.
    pub fn set_offload(&self, dev: &str, which: Offload, enable: bool) -> Result<()> {
        let mut value = EthtoolValue {
            cmd: which.set_cmd(),
            data: enable as u32,
        };
        self.ethtool(dev, &mut value)
    }

    /// Device flags (`SIOCGIFFLAGS`).
    pub fn flags(&self, dev: &str) -> Result<libc::c_short> {
        let mut ifr = ifreq_for(dev)?;
        self.ioctl(libc::SIOCGIFFLAGS, &mut ifr)?;
        // SAFETY: the kernel filled ifru_flags for this request.
        Ok(unsafe { ifr.ifr_ifru.ifru_flags })
    }

    /// Hardware address (`SIOCGIFHWADDR`), rendered lowercase as the
    /// ioctl interface always has.
    pub fn hw_address(&self, dev: &str) -> Result<String> {
        let mut ifr = ifreq_for(dev)?;
        self.ioctl(libc::SIOCGIFHWADDR, &mut ifr)?;
        // SAFETY: the kernel filled ifru_hwaddr for this request.
        let sa_data = unsafe { ifr.ifr_ifru.ifru_hwaddr.sa_data };
        let octets: Vec<String> = sa_data[..6]
            .iter()
            .map(|b| format!("{:02x}", *b as u8))
            .collect();
        Ok(octets.join(":"))
    }

    /// Primary IPv4 address (`SIOCGIFADDR`).
    pub fn ip_address(&self, dev: &str) -> Result<String> {
        self.inet_ioctl(dev, libc::SIOCGIFADDR)
    }

    /// IPv4 netmask (`SIOCGIFNETMASK`).
    pub fn netmask(&self, dev: &str) -> Result<String> {
        self.inet_ioctl(dev, libc::SIOCGIFNETMASK)
    }

    /// IPv4 broadcast address (`SIOCGIFBRDADDR`).
    pub fn broadcast(&self, dev: &str) -> Result<String> {
        self.inet_ioctl(dev, libc::SIOCGIFBRDADDR)
    }

    fn inet_ioctl(&self, dev: &str, request: libc::c_ulong) -> Result<String> {
        let mut ifr = ifreq_for(dev)?;
        self.ioctl(request, &mut ifr)?;
        // SAFETY: the kernel filled ifru_addr with a sockaddr_in for
        // every request routed through here.
        let addr = unsafe {
            *std::ptr::addr_of!(ifr.ifr_ifru.ifru_addr).cast::<libc::sockaddr_in>()
        };
        Ok(std::net::Ipv4Addr::from(u32::from_be(addr.sin_addr.s_addr)).to_string())
    }

    /// Names reported by `SIOCGIFCONF`, deduplicated.
    ///
    /// The reply only covers AF_INET-capable interfaces. The buffer
    /// grows until the kernel leaves slack in it, since an exactly
    /// full reply may have been clipped.
    pub(crate) fn interface_names(&self) -> Result<Vec<String>> {
        let ifreq_size = std::mem::size_of::<libc::ifreq>();
        let mut capacity = 30usize;

        loop {
            // SAFETY: ifreq is plain data; zeroed entries are valid.
            let mut entries: Vec<libc::ifreq> =
                vec![unsafe { std::mem::zeroed() }; capacity];

            let mut ifc: libc::ifconf = unsafe { std::mem::zeroed() };
            ifc.ifc_len = (capacity * ifreq_size) as libc::c_int;
            ifc.ifc_ifcu.ifcu_req = entries.as_mut_ptr();

            // SAFETY: ifc points at `entries`, which outlives the call
            // and is at least ifc_len bytes.
            let ret = unsafe {
                libc::ioctl(self.fd.as_raw_fd(), libc::SIOCGIFCONF, &mut ifc)
            };
            if ret < 0 {
                return Err(Error::Io(io::Error::last_os_error()));
            }

            if ifc.ifc_len as usize == capacity * ifreq_size {
                capacity += 10;
                continue;
            }

            let count = ifc.ifc_len as usize / ifreq_size;
            let mut names = Vec::with_capacity(count);
            for entry in &entries[..count] {
                let name = fixed_string(unsafe {
                    &*std::ptr::addr_of!(entry.ifr_name).cast::<[u8; IFNAMSIZ]>()
                });
                if !name.is_empty() && !names.contains(&name) {
                    names.push(name);
                }
            }
            return Ok(names);
        }
    }
}

/// Build an `ifreq` carrying the device name.
fn ifreq_for(name: &str) -> Result<libc::ifreq> {
    if name.is_empty() || name.len() >= IFNAMSIZ || name.contains('\0') {
        return Err(Error::InvalidName(name.to_string()));
    }
    // SAFETY: an all-zero ifreq is a valid value for every request.
    let mut ifr: libc::ifreq = unsafe { std::mem::zeroed() };
    for (dst, src) in ifr.ifr_name.iter_mut().zip(name.as_bytes()) {
        *dst = *src as libc::c_char;
    }
    Ok(ifr)
}

/// Decode a fixed-size, null-padded byte field.
fn fixed_string(raw: &[u8]) -> String {
    let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..len]).into_owned()
}
