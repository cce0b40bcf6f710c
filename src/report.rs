use crate::types::{Record, Volume};
use std::fmt;

/// One line of human-readable output describing a stored client
///
/// Renders as `client: <name> <volume>[ [<device>]][ (muted)]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub client: String,
    pub volume: Volume,
    /// `Some` when the device column is shown; the inner `None` is the server default
    pub device: Option<Option<String>>,
    pub muted: bool,
}

impl ReportLine {
    /// Describe `record`, reporting full scale when its volume was never set
    pub fn from_record(client: &str, record: &Record, show_device: bool) -> Self {
        let volume = if record.volume.is_unset() {
            Volume::NORM
        } else {
            record.volume.average()
        };

        Self {
            client: client.to_string(),
            volume,
            device: show_device.then(|| record.device.clone()),
            muted: record.muted,
        }
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client: {} {}", self.client, self.volume)?;
        if let Some(device) = &self.device {
            write!(f, " [{}]", device.as_deref().unwrap_or("default"))?;
        }
        if self.muted {
            f.write_str(" (muted)")?;
        }
        Ok(())
    }
}
