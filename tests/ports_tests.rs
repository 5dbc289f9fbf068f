use llm_scan_rs::catalog::{default_services, known_ports};
use llm_scan_rs::config::ScanConfig;
use llm_scan_rs::ports::{parse_ports_str, EXCLUDED_PORTS};

#[test]
fn parse_single_and_ranges_and_comments() {
    let input = r#"
        # vLLM deployments seen in the wild
        8001
        8888  # jupyter-adjacent
        9000-9002
        9001  # duplicate
        # blank line follows

    "#;

    let ports = parse_ports_str(input).expect("parse ok");
    assert_eq!(ports, vec![8001, 8888, 9000, 9001, 9002]);
}

#[test]
fn invalid_port_rejected() {
    assert!(parse_ports_str("0\n").is_err());
}

#[test]
fn default_sweep_never_touches_excluded_or_catalog_ports() {
    let known = known_ports(&default_services());
    let cands = ScanConfig::default().sweep_candidates();
    assert!(!cands.is_empty());
    assert!(cands.iter().all(|p| !EXCLUDED_PORTS.contains(p)));
    assert!(cands.iter().all(|p| !known.contains(p)));
    for p in [1433, 1434, 5432, 5900, 8000, 8080, 8443, 9200, 11434, 39281] {
        assert!(!cands.contains(&p), "{p} should be skipped");
    }
}
