use crate::utils::exec::HostEnvironment;
use crate::utils::string::value_after;

/// Destination used to ask the kernel which source address it would pick
const ROUTE_PROBE: &str = "1.1.1.1";

/// Detect the host's primary IPv4 address
///
/// Prefers the source address of the default route, falling back to the first
/// address from `hostname -I`. Returns `None` when neither yields anything.
pub fn primary_ipv4(host: &dyn HostEnvironment) -> Option<String> {
    if let Ok(route) = host.capture("ip", &["-4", "route", "get", ROUTE_PROBE]) {
        if let Some(ip) = route.lines().find_map(|line| value_after(line, "src")) {
            return Some(ip.to_string());
        }
    }

    match host.capture("hostname", &["-I"]) {
        Ok(addresses) => addresses
            .split_whitespace()
            .find(|ip| ip.contains('.'))
            .map(str::to_string),
        Err(err) => {
            tracing::warn!(error = %err, "could not detect primary IP");
            None
        }
    }
}
