/// Convert bytes to a trimmed string, handling UTF-8 conversion errors gracefully
pub fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

/// Return the whitespace-separated token that follows `key` in `line`
///
/// `ip route get` prints `... dev eth0 src 192.168.1.20 uid 0`; asking for
/// `src` yields the address.
pub fn value_after<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == key {
            return tokens.next();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_to_string_trims() {
        assert_eq!(bytes_to_string(b"  v1.16.5\n"), "v1.16.5");
        assert_eq!(bytes_to_string(&[0xff, b'a']), "\u{fffd}a");
    }

    #[test]
    fn test_value_after() {
        let line = "1.1.1.1 via 10.0.0.1 dev eth0 src 10.0.0.42 uid 0";
        assert_eq!(value_after(line, "src"), Some("10.0.0.42"));
        assert_eq!(value_after(line, "dev"), Some("eth0"));
        assert_eq!(value_after(line, "missing"), None);
        assert_eq!(value_after("trailing src", "src"), None);
    }
}
