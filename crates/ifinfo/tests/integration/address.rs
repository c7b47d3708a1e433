//! Address dump tests against the running kernel.

use std::sync::Arc;

use ifinfo::netlink::ConnectionPool;
use ifinfo::{Family, Interface};

#[tokio::test]
async fn loopback_ipv4_is_127_0_0_1_slash_8() {
    let pool = ConnectionPool::new();
    let mut lo = Interface::new("lo", Arc::clone(&pool));

    lo.query_addresses(Family::V4).await.expect("dump v4");
    let record = lo.record();

    let addr = record
        .ipv4_addresses
        .iter()
        .find(|a| a.local == "127.0.0.1")
        .expect("loopback address configured");
    assert_eq!(addr.family, Family::V4);
    assert_eq!(addr.prefix_len, 8);
    assert_eq!(addr.broadcast, None);
    assert_eq!(addr.scope, "host");
}

#[tokio::test]
async fn repeated_queries_do_not_accumulate() {
    let pool = ConnectionPool::new();
    let mut lo = Interface::new("lo", Arc::clone(&pool));

    lo.query_addresses(Family::V4).await.expect("first dump");
    let first = lo.record().ipv4_addresses.clone();

    lo.query_addresses(Family::V4).await.expect("second dump");
    assert_eq!(lo.record().ipv4_addresses, first);
}

#[tokio::test]
async fn families_are_kept_apart() {
    let pool = ConnectionPool::new();
    let mut lo = Interface::new("lo", Arc::clone(&pool));
    lo.refresh().await.expect("refresh");

    let record = lo.record();
    assert!(record.ipv4_addresses.iter().all(|a| a.family == Family::V4));
    assert!(record.ipv6_addresses.iter().all(|a| a.family == Family::V6));
    // IPv6 records never carry a broadcast address.
    assert!(record.ipv6_addresses.iter().all(|a| a.broadcast.is_none()));
}

#[tokio::test]
async fn compat_accessors_follow_the_lists() {
    let pool = ConnectionPool::new();
    let mut lo = Interface::new("lo", Arc::clone(&pool));
    lo.query_addresses(Family::V4).await.expect("dump v4");

    let record = lo.record();
    match record.ipv4_addresses.last() {
        Some(last) => {
            assert_eq!(record.ipv4_address(), Some(last.local.as_str()));
            assert_eq!(record.ipv4_netmask(), Some(last.prefix_len));
        }
        None => {
            assert_eq!(record.ipv4_address(), None);
            assert_eq!(record.ipv4_netmask(), None);
        }
    }
}
