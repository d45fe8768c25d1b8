//! Vendor command normalization.

/// Sentinel state for commands outside the known vocabulary.
pub const UNKNOWN_STATE: &str = "unknown";

/// Map a Somfy RTS command keyword to its hub state.
///
/// Matching is case-insensitive and total: an unmapped command normalizes
/// to [`UNKNOWN_STATE`], never an error.
pub fn map_command(command: &str) -> &'static str {
    match command.to_ascii_lowercase().as_str() {
        "up" => "open",
        "down" => "closed",
        "stop" => "stopped",
        "my" => "preset",
        "prog" => "programming",
        _ => UNKNOWN_STATE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_commands() {
        assert_eq!(map_command("up"), "open");
        assert_eq!(map_command("down"), "closed");
        assert_eq!(map_command("stop"), "stopped");
        assert_eq!(map_command("my"), "preset");
        assert_eq!(map_command("prog"), "programming");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(map_command("UP"), "open");
        assert_eq!(map_command("Down"), "closed");
        assert_eq!(map_command("MY"), "preset");
    }

    #[test]
    fn test_total_mapping() {
        let known = ["open", "closed", "stopped", "preset", "programming", "unknown"];
        for input in ["", "sideways", "UPWARD", "stop ", "42", "🎛"] {
            assert!(known.contains(&map_command(input)), "input {input:?}");
        }
        assert_eq!(map_command("sideways"), UNKNOWN_STATE);
    }
}
