use std::collections::BTreeSet;

/// Parses a comma-separated port list.  Tokens that are not valid 16-bit port numbers are
/// dropped; the result is deduplicated and sorted ascending.
pub fn parse_ports(csv: &str) -> Vec<u16> {
    csv.split(',')
        .filter_map(|tok| tok.trim().parse::<u16>().ok())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn format_ports(ports: &[u16]) -> String {
    ports.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(",")
}
