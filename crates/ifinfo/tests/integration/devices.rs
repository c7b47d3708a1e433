//! Device enumeration tests.

use ifinfo::devices::{get_active_devices, get_devices};
use ifinfo::ethtool::ControlSocket;

#[test]
fn loopback_is_enumerated() {
    let devices = get_devices().expect("read /proc/net/dev");
    assert!(devices.iter().any(|d| d == "lo"));
}

#[test]
fn active_devices_all_report_up() {
    let socket = ControlSocket::open().expect("control socket");
    for name in get_active_devices().expect("enumerate") {
        let flags = socket.flags(&name).expect("SIOCGIFFLAGS") as libc::c_int;
        assert_ne!(flags & libc::IFF_UP, 0, "{name} listed active but not up");
    }
}

#[test]
fn enumeration_has_no_duplicates() {
    let devices = get_devices().expect("read /proc/net/dev");
    let mut sorted = devices.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), devices.len());
}
