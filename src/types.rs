use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of channels a stored record may carry
pub const CHANNELS_MAX: usize = 32;

/// Channel count used when a stored record never had its layout or volume set
pub const DEFAULT_CHANNELS: usize = 2;

/// Integer volume of a single channel
///
/// `NORM` is 100%, `MUTED` is silence, anything above `MAX` is invalid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Volume(pub u32);

impl Volume {
    pub const MUTED: Volume = Volume(0);
    pub const NORM: Volume = Volume(0x10000);
    pub const MAX: Volume = Volume(u32::MAX / 2);

    /// Clamp a raw volume value into `[MUTED, MAX]`, truncating any fraction
    pub fn clamped(raw: f64) -> Self {
        if raw.is_nan() || raw <= Self::MUTED.0 as f64 {
            Self::MUTED
        } else if raw >= Self::MAX.0 as f64 {
            Self::MAX
        } else {
            Volume(raw as u32)
        }
    }

    /// Volume for a fraction of full scale (1.0 is 100%)
    pub fn from_fraction(fraction: f64) -> Self {
        Self::clamped(fraction * Self::NORM.0 as f64)
    }

    /// This volume as a fraction of full scale
    pub fn fraction(self) -> f64 {
        self.0 as f64 / Self::NORM.0 as f64
    }

    pub fn is_valid(self) -> bool {
        self <= Self::MAX
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return f.write_str("(invalid)");
        }
        let norm = u64::from(Self::NORM.0);
        let percent = (u64::from(self.0) * 100 + norm / 2) / norm;
        write!(f, "{}%", percent)
    }
}

/// Per-channel volumes; the vector length is the channel count
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelVolumes(pub Vec<Volume>);

impl ChannelVolumes {
    /// Uniform volume across `channels` channels
    pub fn uniform(channels: usize, volume: Volume) -> Self {
        Self(vec![volume; channels])
    }

    pub fn channels(&self) -> usize {
        self.0.len()
    }

    /// Whether the volume was never set (zero channels)
    pub fn is_unset(&self) -> bool {
        self.0.is_empty()
    }

    /// Average volume across channels, `MUTED` when unset
    pub fn average(&self) -> Volume {
        if self.0.is_empty() {
            return Volume::MUTED;
        }
        let sum: u64 = self.0.iter().map(|v| u64::from(v.0)).sum();
        let avg = sum / self.0.len() as u64;
        Volume(u32::try_from(avg).unwrap_or(u32::MAX))
    }

    /// Set every channel to `volume`, keeping the channel count
    pub fn set_all(&mut self, volume: Volume) {
        for v in &mut self.0 {
            *v = volume;
        }
    }
}

/// Speaker position assigned to one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ChannelPosition {
    Mono,
    FrontLeft,
    FrontRight,
    FrontCenter,
    RearLeft,
    RearRight,
    Lfe,
    SideLeft,
    SideRight,
    Aux(u8),
}

impl fmt::Display for ChannelPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mono => "mono",
            Self::FrontLeft => "front-left",
            Self::FrontRight => "front-right",
            Self::FrontCenter => "front-center",
            Self::RearLeft => "rear-left",
            Self::RearRight => "rear-right",
            Self::Lfe => "lfe",
            Self::SideLeft => "side-left",
            Self::SideRight => "side-right",
            Self::Aux(n) => return write!(f, "aux{}", n),
        };
        f.write_str(name)
    }
}

impl FromStr for ChannelPosition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "mono" => Self::Mono,
            "front-left" | "left" => Self::FrontLeft,
            "front-right" | "right" => Self::FrontRight,
            "front-center" | "center" => Self::FrontCenter,
            "rear-left" => Self::RearLeft,
            "rear-right" => Self::RearRight,
            "lfe" | "subwoofer" => Self::Lfe,
            "side-left" => Self::SideLeft,
            "side-right" => Self::SideRight,
            other => {
                let n = other
                    .strip_prefix("aux")
                    .and_then(|n| n.parse::<u8>().ok())
                    .filter(|n| usize::from(*n) < CHANNELS_MAX)
                    .ok_or_else(|| format!("unknown channel position '{}'", other))?;
                Self::Aux(n)
            }
        })
    }
}

impl From<ChannelPosition> for String {
    fn from(position: ChannelPosition) -> Self {
        position.to_string()
    }
}

impl TryFrom<String> for ChannelPosition {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// Channel layout of a stored record; empty means never set
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelMap(pub Vec<ChannelPosition>);

impl ChannelMap {
    /// Front left and right; the layout given to records stored without one
    pub fn stereo() -> Self {
        Self(vec![ChannelPosition::FrontLeft, ChannelPosition::FrontRight])
    }

    pub fn channels(&self) -> usize {
        self.0.len()
    }

    pub fn is_unset(&self) -> bool {
        self.0.is_empty()
    }
}

/// Kind of client identifier a record key carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Streams matched by their application name
    ApplicationName,
    /// Streams matched by their media role
    MediaRole,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::ApplicationName, Category::MediaRole];

    /// Key prefix, without the trailing `:`
    pub fn prefix(self) -> &'static str {
        match self {
            Self::ApplicationName => "sink-input-by-application-name",
            Self::MediaRole => "sink-input-by-media-role",
        }
    }

    /// Split a record key into its category and client name
    ///
    /// Keys from other categories (sources, device-level entries, ...) yield `None`.
    pub fn classify(key: &str) -> Option<(Category, &str)> {
        let (prefix, client) = key.split_once(':')?;
        Self::ALL
            .into_iter()
            .find(|category| category.prefix() == prefix)
            .map(|category| (category, client))
    }

    /// Record key for a client in this category
    pub fn key(self, client: &str) -> String {
        format!("{}:{}", self.prefix(), client)
    }
}

/// One stored stream-restore entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// `<category>:<client>` as stored by the server
    pub key: String,

    #[serde(default)]
    pub channel_map: ChannelMap,

    #[serde(default)]
    pub volume: ChannelVolumes,

    #[serde(default)]
    pub muted: bool,

    /// Output device (sink name); `None` follows the server default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

impl Record {
    /// Empty record with unset layout and volume
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            channel_map: ChannelMap::default(),
            volume: ChannelVolumes::default(),
            muted: false,
            device: None,
        }
    }

    /// Record for a client addressed by application name
    pub fn application(client: &str) -> Self {
        Self::new(Category::ApplicationName.key(client))
    }

    /// Stereo layout with both channels at `volume`
    pub fn with_stereo_volume(mut self, volume: Volume) -> Self {
        self.channel_map = ChannelMap::stereo();
        self.volume = ChannelVolumes::uniform(DEFAULT_CHANNELS, volume);
        self
    }

    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Category and client name, if the key belongs to a recognized category
    pub fn identity(&self) -> Option<(Category, &str)> {
        Category::classify(&self.key)
    }
}
