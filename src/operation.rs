use crate::error::StreamRestoreError;
use std::str::FromStr;

/// A single change requested for the targeted client
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mutation {
    /// Set every channel to this fraction of full scale (`0.0..=1.0`)
    SetVolume(f64),
    /// Add this signed fraction to the current average volume
    AdjustVolume(f64),
    ToggleMute,
    Mute,
    Unmute,
}

/// Parses the command-line action: `toggle`, `mute`, `unmute`, an absolute
/// percentage in `[0, 100]`, or a sign-prefixed relative percentage.
impl FromStr for Mutation {
    type Err = StreamRestoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toggle" => return Ok(Self::ToggleMute),
            "mute" => return Ok(Self::Mute),
            "unmute" => return Ok(Self::Unmute),
            _ => {}
        }

        let relative = s.starts_with('+') || s.starts_with('-');
        let number_len = numeric_prefix_len(s);
        if number_len == 0 {
            return Err(StreamRestoreError::InvalidMutation(format!(
                "Invalid argument '{}' could not be read a number",
                s
            )));
        }
        if number_len < s.len() {
            return Err(StreamRestoreError::InvalidMutation(format!(
                "Extra characters '{}' after number '{}'",
                &s[number_len..],
                &s[..number_len]
            )));
        }

        let percent: f64 = s.parse().map_err(|_| {
            StreamRestoreError::InvalidMutation(format!(
                "Invalid argument '{}' could not be read a number",
                s
            ))
        })?;
        if !percent.is_finite() {
            return Err(StreamRestoreError::InvalidMutation(format!(
                "Invalid volume '{}'",
                s
            )));
        }

        if relative {
            Ok(Self::AdjustVolume(percent / 100.0))
        } else if (0.0..=100.0).contains(&percent) {
            Ok(Self::SetVolume(percent / 100.0))
        } else {
            Err(StreamRestoreError::InvalidMutation(format!(
                "Invalid volume {}. Must be between 0 and 100.",
                percent
            )))
        }
    }
}

/// Length of the leading decimal number in `s` (optional sign, digits,
/// optional fraction, optional exponent)
fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - frac_start;
        i = j;
    }
    if digits == 0 {
        return 0;
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

/// What one invocation asks for
///
/// Built once before the session starts and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Operation {
    /// Client name to report on or modify; `None` reports every client
    pub target: Option<String>,
    /// Pending change for the target; `None` only reports
    pub mutation: Option<Mutation>,
    /// Output device to store alongside any mutation
    pub device: Option<String>,
    /// Include the output device in report lines
    pub show_device: bool,
}

impl Operation {
    /// Report every stored client
    pub fn report_all() -> Self {
        Self::default()
    }

    /// Report a single client
    pub fn report(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..Self::default()
        }
    }

    /// Apply `mutation` to `target`
    pub fn mutate(target: impl Into<String>, mutation: Mutation) -> Self {
        Self {
            target: Some(target.into()),
            mutation: Some(mutation),
            ..Self::default()
        }
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn with_show_device(mut self, show_device: bool) -> Self {
        self.show_device = show_device;
        self
    }

    /// Whether `client` is the explicitly targeted client
    pub fn targets(&self, client: &str) -> bool {
        self.target.as_deref() == Some(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Mutation {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_mute_keywords() {
        assert_eq!(parse("toggle"), Mutation::ToggleMute);
        assert_eq!(parse("mute"), Mutation::Mute);
        assert_eq!(parse("unmute"), Mutation::Unmute);
    }

    #[test]
    fn test_parse_absolute_percentage() {
        assert_eq!(parse("66"), Mutation::SetVolume(0.66));
        assert_eq!(parse("0"), Mutation::SetVolume(0.0));
        assert_eq!(parse("100"), Mutation::SetVolume(1.0));
        assert!(matches!(parse("50.1"), Mutation::SetVolume(v) if (v - 0.501).abs() < 1e-12));
    }

    #[test]
    fn test_parse_sign_selects_relative() {
        assert_eq!(parse("+10"), Mutation::AdjustVolume(0.1));
        assert_eq!(parse("-25"), Mutation::AdjustVolume(-0.25));
        // relative deltas are not range checked; clamping happens on update
        assert_eq!(parse("+150"), Mutation::AdjustVolume(1.5));
    }

    #[test]
    fn test_parse_rejects_out_of_range_absolute() {
        let err = "101".parse::<Mutation>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid volume 101. Must be between 0 and 100.");
    }

    #[test]
    fn test_parse_rejects_trailing_characters() {
        let err = "50%".parse::<Mutation>().unwrap_err();
        assert_eq!(err.to_string(), "Extra characters '%' after number '50'");
    }

    #[test]
    fn test_parse_rejects_non_numbers() {
        assert!("loud".parse::<Mutation>().is_err());
        assert!("inf".parse::<Mutation>().is_err());
        assert!("nan".parse::<Mutation>().is_err());
        assert!("+".parse::<Mutation>().is_err());
    }

    #[test]
    fn test_targets_only_matches_explicit_client() {
        assert!(Operation::report("paplay").targets("paplay"));
        assert!(!Operation::report("paplay").targets("mpv"));
        assert!(!Operation::report_all().targets("paplay"));
    }
}
