use anyhow::{bail, Context, Result};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

/// Ranges walked by the full-port sweep (inclusive). Adjacent ranges share
/// their boundary port; the union is deduplicated.
pub const SWEEP_RANGES: &[(u16, u16)] = &[
    (1024, 1500),
    (3000, 3100),
    (4000, 5000),
    (5000, 6000),
    (7000, 9000),
    (9000, 10000),
    (10000, 12000),
    (30000, 40000),
];

/// Well-known non-LLM service ports the sweep never touches.
pub const EXCLUDED_PORTS: &[u16] = &[
    20, 21, 22, 23, 25, 53, 67, 68, 69, 80, 110, 111, 119, 123, 135, 137, 138, 139, 143, 161,
    162, 389, 443, 445, 465, 514, 515, 548, 554, 587, 631, 636, 873, 902, 993, 995, 1433, 1434,
    1521, 2049, 3306, 3389, 5432, 5900, 5901, 6379, 8443, 9200, 9300, 27017,
];

/// Union of [`SWEEP_RANGES`] in ascending order.
pub fn default_sweep_ports() -> Vec<u16> {
    let set: BTreeSet<u16> = SWEEP_RANGES
        .iter()
        .flat_map(|&(start, end)| start..=end)
        .collect();
    set.into_iter().collect()
}

/// Ports the sweep will actually test: `sweep` minus `excluded` minus `known`,
/// first-appearance order, no duplicates.
pub fn sweep_candidates(sweep: &[u16], excluded: &[u16], known: &BTreeSet<u16>) -> Vec<u16> {
    let excluded: HashSet<u16> = excluded.iter().copied().collect();
    let mut seen = HashSet::new();
    sweep
        .iter()
        .copied()
        .filter(|p| !excluded.contains(p) && !known.contains(p))
        .filter(|p| seen.insert(*p))
        .collect()
}

/// Parse a ports file content into a deduplicated list of TCP ports (1..=65535).
///
/// Supported formats per line:
/// - single port number: `80`
/// - inclusive range: `8000-8010`
/// - comments: everything after `#` is ignored
/// - whitespace and blank lines are ignored
pub fn parse_ports_str(s: &str) -> Result<Vec<u16>> {
    let mut out: Vec<u16> = Vec::new();
    let mut seen = HashSet::new();

    for (idx, raw_line) in s.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.split('#').next().map(str::trim).unwrap_or("");
        if line.is_empty() {
            continue;
        }

        if let Some((a, b)) = line.split_once('-') {
            let start = parse_port_str(a.trim())
                .with_context(|| format!("line {line_no}: invalid start in range: {a}"))?;
            let end = parse_port_str(b.trim())
                .with_context(|| format!("line {line_no}: invalid end in range: {b}"))?;
            if start > end {
                bail!("line {line_no}: invalid range {start}-{end} (start > end)");
            }
            for p in start..=end {
                if seen.insert(p) {
                    out.push(p);
                }
            }
            continue;
        }

        let p = parse_port_str(line)
            .with_context(|| format!("line {line_no}: invalid port value: {line}"))?;
        if seen.insert(p) {
            out.push(p);
        }
    }

    Ok(out)
}

/// Load sweep ports from a file. Errors if the file cannot be read, parsed,
/// or lists no ports at all.
pub fn load_ports_from_path(path: impl AsRef<Path>) -> Result<Vec<u16>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read ports file: {}", path.display()))?;
    let ports = parse_ports_str(&content)
        .with_context(|| format!("failed to parse ports file: {}", path.display()))?;
    if ports.is_empty() {
        bail!("ports file lists no ports: {}", path.display());
    }
    Ok(ports)
}

fn parse_port_str(s: &str) -> Result<u16> {
    let val: u32 = s.parse::<u32>().map_err(|e| anyhow::anyhow!(e))?;
    if val == 0 || val > 65535 {
        bail!("port out of range: {val}");
    }
    Ok(val as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{default_services, known_ports};

    #[test]
    fn parse_ranges_and_dedup() {
        let input = "8000-8002\n80\n8001\n";
        let ports = parse_ports_str(input).unwrap();
        assert_eq!(ports, vec![8000, 8001, 8002, 80]);
    }

    #[test]
    fn invalid_values_error() {
        assert!(parse_ports_str("70000\n").is_err());
        assert!(parse_ports_str("9-3\n").is_err());
    }

    #[test]
    fn default_sweep_is_union_of_ranges() {
        let ports = default_sweep_ports();
        // 477 + 101 + 1001 + 1001 + 2001 + 1001 + 2001 + 10001, minus 3 shared bounds
        assert_eq!(ports.len(), 17_581);
        assert_eq!(ports.first(), Some(&1024));
        assert_eq!(ports.last(), Some(&40000));
        assert!(ports.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn candidates_skip_excluded_and_known() {
        let known = known_ports(&default_services());
        let cands = sweep_candidates(&default_sweep_ports(), EXCLUDED_PORTS, &known);
        for p in &cands {
            assert!(!EXCLUDED_PORTS.contains(p), "excluded port {p} in sweep");
            assert!(!known.contains(p), "catalog port {p} in sweep");
        }
        assert!(cands.contains(&8001));
        assert!(!cands.contains(&8000));
        assert!(!cands.contains(&1433));
        assert!(!cands.contains(&39281));
    }

    #[test]
    fn candidates_dedup_custom_lists() {
        let known = BTreeSet::from([8000]);
        let cands = sweep_candidates(&[9001, 22, 8000, 9001, 9002], &[22], &known);
        assert_eq!(cands, vec![9001, 9002]);
    }
}
