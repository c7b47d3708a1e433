//! Link dump tests against the running kernel.

use std::sync::Arc;

use ifinfo::netlink::ConnectionPool;
use ifinfo::{Error, Interface};

#[tokio::test]
async fn loopback_resolves_and_dumps() {
    let pool = ConnectionPool::new();
    let mut lo = Interface::new("lo", Arc::clone(&pool));

    let index = lo.resolve_index().await.expect("resolve lo");
    assert!(index > 0);

    lo.query_link().await.expect("dump lo link");
    let record = lo.record();
    assert_eq!(record.index, Some(index));
    // Loopback has an all-zero 6-byte hardware address.
    assert_eq!(record.hw_address.as_deref(), Some("00:00:00:00:00:00"));
}

#[tokio::test]
async fn every_active_device_dumps_its_own_name() {
    let pool = ConnectionPool::new();
    let conn = pool.acquire().expect("acquire");

    for name in ifinfo::devices::get_active_devices().expect("enumerate") {
        // Alias labels ("eth0:1") are not devices of their own.
        if name.contains(':') {
            continue;
        }
        let index = conn.resolve_index(&name).await.expect("resolve");
        let link = conn
            .dump_link(index)
            .await
            .expect("dump link")
            .expect("device present");
        assert_eq!(link.name.as_deref(), Some(name.as_str()));
        assert!(link.is_up());
    }
}

#[tokio::test]
async fn unknown_device_is_no_such_device() {
    let pool = ConnectionPool::new();
    let mut missing = Interface::new("zz-no-such-dev", Arc::clone(&pool));

    let err = missing.resolve_index().await.unwrap_err();
    assert!(
        matches!(err, Error::NoSuchDevice { ref name } if name == "zz-no-such-dev"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn second_link_query_keeps_first_hw_address() {
    let pool = ConnectionPool::new();
    let mut lo = Interface::new("lo", Arc::clone(&pool));

    lo.query_link().await.expect("first dump");
    let first = lo.record().hw_address.clone();
    lo.query_link().await.expect("second dump");
    assert_eq!(lo.record().hw_address, first);
}
