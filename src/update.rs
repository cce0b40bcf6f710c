use crate::operation::Mutation;
use crate::types::{ChannelMap, ChannelVolumes, Record, Volume, DEFAULT_CHANNELS};

/// Build the record to write back for `old` with `mutation` applied
///
/// Records whose layout or volume was never set get a stereo default first.
/// A device override, when given, is stored as well.
pub fn apply(old: &Record, mutation: Mutation, device: Option<&str>) -> Record {
    let mut new = old.clone();

    if new.channel_map.is_unset() {
        new.channel_map = ChannelMap::stereo();
    }
    if new.volume.is_unset() {
        new.volume = ChannelVolumes::uniform(DEFAULT_CHANNELS, Volume::MUTED);
    }
    if new.volume.channels() != new.channel_map.channels() {
        tracing::warn!(
            "{}: volume has {} channels but channel map has {}",
            new.key,
            new.volume.channels(),
            new.channel_map.channels()
        );
    }

    match mutation {
        Mutation::SetVolume(fraction) => {
            new.volume.set_all(Volume::from_fraction(fraction));
        }
        Mutation::AdjustVolume(delta) => {
            let current = old.volume.average().fraction();
            new.volume.set_all(Volume::from_fraction(current + delta));
        }
        Mutation::ToggleMute => new.muted = !new.muted,
        Mutation::Mute => new.muted = true,
        Mutation::Unmute => new.muted = false,
    }

    if let Some(device) = device {
        new.device = Some(device.to_string());
    }

    new
}
