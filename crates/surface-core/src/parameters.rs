//! What a knob controls
//!
//! A [`ParameterProvider`] maps the knob row onto values of the document.
//! Lookups are page-relative and resolve through the bank window, so a knob
//! beyond the live item count reports `None` instead of failing.

use crate::daw::{absolute_index, page_item, BankKind, DawModel, ParameterInfo, TrackCommand, TrackInfo};
use crate::normalize;

/// Knob-indexed view of a set of parameters
pub trait ParameterProvider {
    /// Number of knobs served
    fn knob_count(&self) -> usize;

    /// Current value (0-127) of the parameter behind a knob
    fn value(&self, daw: &dyn DawModel, index: usize) -> Option<u8>;

    /// Display name of the parameter behind a knob
    fn name(&self, daw: &dyn DawModel, index: usize) -> Option<String>;

    /// Write a new value; no-op when the parameter does not exist
    fn set_value(&self, daw: &mut dyn DawModel, index: usize, value: u8);
}

/// Parameters of a parameter bank (user or device parameters)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankParameterProvider {
    kind: BankKind,
    knobs: usize,
}

impl BankParameterProvider {
    pub fn new(kind: BankKind, knobs: usize) -> Self {
        Self { kind, knobs }
    }

    fn item(&self, daw: &dyn DawModel, index: usize) -> Option<ParameterInfo> {
        if index >= self.knobs {
            return None;
        }
        let item: ParameterInfo = page_item(daw, self.kind, index);
        item.exists.then_some(item)
    }
}

impl ParameterProvider for BankParameterProvider {
    fn knob_count(&self) -> usize {
        self.knobs
    }

    fn value(&self, daw: &dyn DawModel, index: usize) -> Option<u8> {
        self.item(daw, index).map(|p| p.value)
    }

    fn name(&self, daw: &dyn DawModel, index: usize) -> Option<String> {
        self.item(daw, index).map(|p| p.name)
    }

    fn set_value(&self, daw: &mut dyn DawModel, index: usize, value: u8) {
        if self.item(daw, index).is_none() {
            return;
        }
        if let Some(absolute) = absolute_index(daw, self.kind, index) {
            daw.set_parameter(self.kind, absolute, value);
        }
    }
}

/// Track attribute a knob of a track mode controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackAttribute {
    Volume,
    Pan,
    /// Armed reads as 127; writing 64 or more arms
    RecArm,
}

/// One attribute of each track in the current track page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackParameterProvider {
    attribute: TrackAttribute,
    knobs: usize,
}

impl TrackParameterProvider {
    pub fn new(attribute: TrackAttribute, knobs: usize) -> Self {
        Self { attribute, knobs }
    }

    pub fn attribute(&self) -> TrackAttribute {
        self.attribute
    }

    fn track(&self, daw: &dyn DawModel, index: usize) -> Option<TrackInfo> {
        if index >= self.knobs {
            return None;
        }
        let track: TrackInfo = page_item(daw, BankKind::Tracks, index);
        track.exists.then_some(track)
    }
}

impl ParameterProvider for TrackParameterProvider {
    fn knob_count(&self) -> usize {
        self.knobs
    }

    fn value(&self, daw: &dyn DawModel, index: usize) -> Option<u8> {
        self.track(daw, index).map(|track| match self.attribute {
            TrackAttribute::Volume => track.volume,
            TrackAttribute::Pan => track.pan,
            TrackAttribute::RecArm => normalize::from_bool(track.rec_arm),
        })
    }

    fn name(&self, daw: &dyn DawModel, index: usize) -> Option<String> {
        self.track(daw, index).map(|track| track.name)
    }

    fn set_value(&self, daw: &mut dyn DawModel, index: usize, value: u8) {
        let Some(track) = self.track(daw, index) else {
            return;
        };
        let command = match self.attribute {
            TrackAttribute::Volume => TrackCommand::SetVolume(value),
            TrackAttribute::Pan => TrackCommand::SetPan(value),
            TrackAttribute::RecArm => TrackCommand::SetRecArm(normalize::is_on(value)),
        };
        daw.track_command(track.index, command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDaw;

    #[test]
    fn test_bank_parameters_sentinel() {
        let mut daw = FakeDaw::new(4, 2);
        daw.add_parameters(BankKind::DeviceParameters, &["Cutoff", "Resonance"]);
        let provider = BankParameterProvider::new(BankKind::DeviceParameters, 8);

        assert_eq!(provider.name(&daw, 1), Some("Resonance".to_string()));
        assert_eq!(provider.value(&daw, 2), None);
        assert_eq!(provider.value(&daw, 8), None);

        provider.set_value(&mut daw, 0, 99);
        assert_eq!(provider.value(&daw, 0), Some(99));
        // Absent parameter is ignored
        provider.set_value(&mut daw, 5, 99);
    }

    #[test]
    fn test_track_rec_arm_threshold() {
        let mut daw = FakeDaw::new(4, 2);
        let provider = TrackParameterProvider::new(TrackAttribute::RecArm, 8);

        assert_eq!(provider.value(&daw, 1), Some(0));
        provider.set_value(&mut daw, 1, 64);
        assert!(daw.track(1).rec_arm);
        assert_eq!(provider.value(&daw, 1), Some(127));
        provider.set_value(&mut daw, 1, 63);
        assert!(!daw.track(1).rec_arm);

        assert_eq!(provider.value(&daw, 4), None);
    }

    #[test]
    fn test_track_volume_follows_page() {
        let mut daw = FakeDaw::new(10, 2);
        daw.bank_mut(BankKind::Tracks).unwrap().scroll_to_page(1);
        let provider = TrackParameterProvider::new(TrackAttribute::Volume, 8);

        provider.set_value(&mut daw, 0, 42);
        assert_eq!(daw.track(8).volume, 42);
        assert_eq!(provider.value(&daw, 2), None);
    }
}
