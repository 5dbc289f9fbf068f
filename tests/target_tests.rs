use llm_scan_rs::netdetect::ipv4_to_default_cidr;
use llm_scan_rs::target::{resolve, TargetMode};
use std::net::Ipv4Addr;

#[test]
fn default_cidr_is_24() {
    let cidr = ipv4_to_default_cidr(Ipv4Addr::new(192, 168, 42, 99));
    assert_eq!(cidr.to_string(), "192.168.42.0/24");
}

#[test]
fn single_address() {
    assert_eq!(resolve("10.0.0.5", TargetMode::Single), vec!["10.0.0.5"]);
}

#[test]
fn inclusive_range() {
    assert_eq!(
        resolve("10.0.0.1-10.0.0.3", TargetMode::Range),
        vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]
    );
    assert_eq!(
        resolve(" 10.0.0.254 - 10.0.1.1 ", TargetMode::Range),
        vec!["10.0.0.254", "10.0.0.255", "10.0.1.0", "10.0.1.1"]
    );
}

#[test]
fn cidr_excludes_network_and_broadcast() {
    assert_eq!(
        resolve("192.168.1.0/30", TargetMode::Cidr),
        vec!["192.168.1.1", "192.168.1.2"]
    );
}

#[test]
fn cidr_allows_host_bits_and_caps_at_256() {
    let ips = resolve("172.16.5.77/16", TargetMode::Cidr);
    assert_eq!(ips.len(), 256);
    assert_eq!(ips[0], "172.16.0.1");
}

#[test]
fn malformed_input_is_empty() {
    assert!(resolve("not-an-ip", TargetMode::Range).is_empty());
    assert!(resolve("10.0.0.1-", TargetMode::Range).is_empty());
    assert!(resolve("10.0.0.0/24/1", TargetMode::Cidr).is_empty());
}

#[test]
fn single_is_passed_through_even_when_blank() {
    assert_eq!(resolve("   ", TargetMode::Single), vec![""]);
}
