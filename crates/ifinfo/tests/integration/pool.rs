//! Shared-connection lifecycle tests.

use std::sync::Arc;

use ifinfo::netlink::ConnectionPool;
use ifinfo::{Family, Interface};

#[tokio::test]
async fn n_records_acquire_and_release_symmetrically() {
    let pool = ConnectionPool::new();

    let mut interfaces: Vec<_> = (0..5)
        .map(|_| Interface::new("lo", Arc::clone(&pool)))
        .collect();
    for iface in &mut interfaces {
        iface.open().expect("acquire");
    }
    assert_eq!(pool.users(), 5);
    assert!(pool.is_open());

    // Fewer than N releases leave the connection open.
    interfaces.truncate(1);
    assert_eq!(pool.users(), 1);
    assert!(pool.is_open());

    interfaces.clear();
    assert_eq!(pool.users(), 0);
    assert!(!pool.is_open());
}

#[tokio::test]
async fn queries_share_the_pooled_connection() {
    let pool = ConnectionPool::new();

    let mut a = Interface::new("lo", Arc::clone(&pool));
    let mut b = Interface::new("lo", Arc::clone(&pool));

    a.query_link().await.expect("query a");
    b.query_addresses(Family::V4).await.expect("query b");

    // One socket, two users.
    assert_eq!(pool.users(), 2);

    a.close();
    assert!(pool.is_open());
    b.close();
    assert!(!pool.is_open());
}

#[tokio::test]
async fn concurrent_acquire_release_keeps_the_count_straight() {
    let pool = ConnectionPool::new();

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                let handle = pool.acquire().expect("acquire");
                tokio::task::yield_now().await;
                drop(handle);
            })
        })
        .collect();

    for task in tasks {
        task.await.expect("join");
    }

    assert_eq!(pool.users(), 0);
    assert!(!pool.is_open());
}
