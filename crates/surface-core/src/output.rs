//! MIDI output for LED feedback
//!
//! [`MidiLedSurface`] implements [`Surface`] by encoding LED writes as MIDI
//! messages and handing them to the output thread over a flume channel.
//! Writes that would not change what the controller shows are dropped.

use crate::colors::PadLight;
use crate::config::{ControllerFamily, DeviceProfile, MidiControlConfig};
use crate::surface::{ButtonId, PadGrid, Surface};
use flume::{Receiver, Sender};
use std::collections::HashMap;

/// Capacity of the dispatch-to-output channel
pub const OUTPUT_CHANNEL_CAPACITY: usize = 1024;

/// What the output thread receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMessage {
    /// Complete MIDI message for the controller
    Midi(Vec<u8>),
    /// Text for the host's popup/status line
    Notification(String),
}

pub fn output_channel() -> (Sender<OutputMessage>, Receiver<OutputMessage>) {
    flume::bounded(OUTPUT_CHANNEL_CAPACITY)
}

/// Key for tracking last sent values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MidiOutputKey {
    channel: u8,
    note_or_cc: u8,
    is_note: bool,
}

impl MidiOutputKey {
    fn from_control(control: &MidiControlConfig) -> Self {
        match control {
            MidiControlConfig::Note { channel, note } => Self {
                channel: *channel,
                note_or_cc: *note,
                is_note: true,
            },
            MidiControlConfig::ControlChange { channel, cc } => Self {
                channel: *channel,
                note_or_cc: *cc,
                is_note: false,
            },
        }
    }

    fn control(&self) -> MidiControlConfig {
        if self.is_note {
            MidiControlConfig::note(self.channel, self.note_or_cc)
        } else {
            MidiControlConfig::cc(self.channel, self.note_or_cc)
        }
    }
}

fn encode(control: &MidiControlConfig, value: u8) -> Vec<u8> {
    match control {
        MidiControlConfig::Note { channel, note } if value > 0 => vec![0x90 | channel, *note, value],
        MidiControlConfig::Note { channel, note } => vec![0x80 | channel, *note, 0],
        MidiControlConfig::ControlChange { channel, cc } => vec![0xB0 | channel, *cc, value],
    }
}

/// LED surface of one MIDI controller
pub struct MidiLedSurface {
    tx: Sender<OutputMessage>,
    family: ControllerFamily,
    grid_channel: u8,
    grid: PadGrid,
    buttons: HashMap<ButtonId, MidiControlConfig>,
    /// Last light shown per pad note
    last_pads: HashMap<u8, PadLight>,
    /// Last sent button values (to avoid redundant sends)
    last_values: HashMap<MidiOutputKey, u8>,
}

impl MidiLedSurface {
    pub fn new(profile: &DeviceProfile, tx: Sender<OutputMessage>) -> Self {
        Self {
            tx,
            family: profile.family,
            grid_channel: profile.grid.channel,
            grid: profile.grid.layout.clone(),
            buttons: profile.buttons.iter().map(|m| (m.button, m.control.clone())).collect(),
            last_pads: HashMap::new(),
            last_values: HashMap::new(),
        }
    }

    fn send_message(&self, message: OutputMessage) -> bool {
        match self.tx.try_send(message) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("output: Failed to queue message: {}", e);
                false
            }
        }
    }

    fn send(&self, control: &MidiControlConfig, value: u8) -> bool {
        log::trace!("output: {:?} val={}", control, value);
        self.send_message(OutputMessage::Midi(encode(control, value)))
    }

    /// Send MIDI message if value has changed
    fn send_if_changed(&mut self, control: &MidiControlConfig, value: u8) {
        let key = MidiOutputKey::from_control(control);
        if self.last_values.get(&key) == Some(&value) {
            return;
        }
        if self.send(control, value) {
            self.last_values.insert(key, value);
        }
    }

    fn write_pad(&self, note: u8, light: PadLight) -> bool {
        let base = MidiControlConfig::note(self.grid_channel, note);
        if !self.send(&base, light.color.velocity()) {
            return false;
        }
        let (Some(blink), Some((flash, pulse))) = (light.blink, self.family.blink_channels()) else {
            return true;
        };
        let channel = if light.fast_blink { pulse } else { flash };
        let overlay = MidiControlConfig::note((self.grid_channel + channel) & 0x0F, note);
        self.send(&overlay, blink.velocity())
    }

    /// Turn off every LED this surface has lit
    pub fn clear_all(&mut self) {
        let pads: Vec<u8> = self.last_pads.keys().copied().collect();
        for note in pads {
            self.write_pad(note, PadLight::off());
        }
        self.last_pads.clear();

        let keys: Vec<MidiOutputKey> = self.last_values.keys().copied().collect();
        for key in keys {
            self.send(&key.control(), 0);
        }
        self.last_values.clear();
    }
}

impl Surface for MidiLedSurface {
    fn light_pad(&mut self, column: usize, row: usize, light: PadLight) {
        let Some(note) = self.grid.note_at(column, row) else {
            log::trace!("output: No pad at ({}, {})", column, row);
            return;
        };
        // A steady light after a blinking one must still be written to stop the blink
        if self.last_pads.get(&note) == Some(&light) {
            return;
        }
        if self.write_pad(note, light) {
            self.last_pads.insert(note, light);
        }
    }

    fn set_button_light(&mut self, button: ButtonId, color: u8) {
        let Some(control) = self.buttons.get(&button).cloned() else {
            return;
        };
        self.send_if_changed(&control, color);
    }

    fn notify(&mut self, text: &str) {
        log::info!("output: Notify '{}'", text);
        self.send_message(OutputMessage::Notification(text.to_string()));
    }
}

impl Drop for MidiLedSurface {
    fn drop(&mut self) {
        self.clear_all();
    }
}
