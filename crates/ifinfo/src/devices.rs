//! Device enumeration.
//!
//! Two views of "what interfaces exist": everything the kernel lists
//! in `/proc/net/dev`, and the subset that is administratively up
//! according to `SIOCGIFCONF`/`SIOCGIFFLAGS`.

use std::fs;
use std::io::{BufRead, BufReader};

use crate::ethtool::ControlSocket;
use crate::netlink::Result;

const PROC_NET_DEV: &str = "/proc/net/dev";

/// List every interface name known to the kernel.
pub fn get_devices() -> Result<Vec<String>> {
    let file = fs::File::open(PROC_NET_DEV)?;
    let reader = BufReader::new(file);

    let mut names = Vec::new();
    // The first two lines are column headers.
    for line in reader.lines().skip(2) {
        let line = line?;
        if let Some(name) = line.split(':').next() {
            let name = name.trim();
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
    }

    Ok(names)
}

/// List interfaces that are administratively up.
///
/// `SIOCGIFCONF` only reports AF_INET-capable interfaces; the reply
/// buffer is grown and the ioctl retried for as long as the kernel
/// fills it completely, since an exactly-full buffer may have been
/// clipped.
pub fn get_active_devices() -> Result<Vec<String>> {
    let socket = ControlSocket::open()?;

    let names = socket.interface_names()?;
    let mut active = Vec::new();
    for name in names {
        // Interfaces can vanish between the two ioctls; skip quietly.
        if let Ok(flags) = socket.flags(&name)
            && (flags as libc::c_int) & libc::IFF_UP != 0
        {
            active.push(name);
        }
    }

    Ok(active)
}
