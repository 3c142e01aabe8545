//! MIDI input handling
//!
//! Raw bytes arrive on the MIDI driver thread. They are timestamped and
//! forwarded over a bounded flume channel; the dispatch thread parses them
//! with midly and routes them through the device profile to
//! [`SurfaceEvent`]s.

use crate::config::{ButtonMapping, DeviceProfile, MidiControlConfig, ModeSelectMapping};
use crate::modes::ModeId;
use crate::normalize;
use crate::surface::{ButtonId, PadGrid};
use flume::{Receiver, Sender};
use midly::live::LiveEvent;
use midly::MidiMessage;
use std::time::Instant;

/// Capacity of the driver-to-dispatch channel
pub const INPUT_CHANNEL_CAPACITY: usize = 256;

/// Raw MIDI input event (before profile mapping)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInput {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, cc: u8, value: u8 },
}

impl RawInput {
    /// Parse one MIDI message
    ///
    /// Note On with velocity 0 is reported as Note Off. Anything other than
    /// notes and CCs (pitch bend, aftertouch, sysex) is ignored.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let event = match LiveEvent::parse(data) {
            Ok(event) => event,
            Err(e) => {
                log::trace!("input: Unparseable MIDI {:02X?}: {}", data, e);
                return None;
            }
        };
        let LiveEvent::Midi { channel, message } = event else {
            return None;
        };
        let channel = channel.as_int();

        match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => Some(Self::NoteOff {
                channel,
                note: key.as_int(),
                velocity: 0,
            }),
            MidiMessage::NoteOn { key, vel } => Some(Self::NoteOn {
                channel,
                note: key.as_int(),
                velocity: vel.as_int(),
            }),
            MidiMessage::NoteOff { key, vel } => Some(Self::NoteOff {
                channel,
                note: key.as_int(),
                velocity: vel.as_int(),
            }),
            MidiMessage::Controller { controller, value } => Some(Self::ControlChange {
                channel,
                cc: controller.as_int(),
                value: value.as_int(),
            }),
            _ => None,
        }
    }

    pub fn channel(&self) -> u8 {
        match self {
            Self::NoteOn { channel, .. } | Self::NoteOff { channel, .. } | Self::ControlChange { channel, .. } => {
                *channel
            }
        }
    }

    /// Check if this event comes from a configured control
    pub fn matches(&self, control: &MidiControlConfig) -> bool {
        match (self, control) {
            (
                Self::NoteOn { channel, note, .. } | Self::NoteOff { channel, note, .. },
                MidiControlConfig::Note { channel: cc, note: cn },
            ) => channel == cc && note == cn,
            (
                Self::ControlChange { channel, cc, .. },
                MidiControlConfig::ControlChange {
                    channel: ctrl_ch,
                    cc: ctrl_cc,
                },
            ) => channel == ctrl_ch && cc == ctrl_cc,
            _ => false,
        }
    }

    /// Note On, or CC at or above the switch threshold
    pub fn is_press(&self) -> bool {
        match self {
            Self::NoteOn { velocity, .. } => *velocity > 0,
            Self::ControlChange { value, .. } => normalize::is_on(*value),
            Self::NoteOff { .. } => false,
        }
    }

    /// Velocity for notes, value for CC
    pub fn value(&self) -> u8 {
        match self {
            Self::NoteOn { velocity, .. } | Self::NoteOff { velocity, .. } => *velocity,
            Self::ControlChange { value, .. } => *value,
        }
    }
}

/// Input in controller terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// Grid pad; velocity 0 is a release
    Pad { note: u8, velocity: u8 },
    Button { button: ButtonId, pressed: bool, velocity: u8 },
    Knob { index: usize, value: u8 },
    ModeSelect(ModeId),
}

/// Maps raw MIDI to surface events through one device profile
#[derive(Debug, Clone)]
pub struct InputRouter {
    grid_channel: u8,
    grid: PadGrid,
    buttons: Vec<ButtonMapping>,
    knobs: Vec<MidiControlConfig>,
    mode_select: Vec<ModeSelectMapping>,
}

impl InputRouter {
    pub fn new(profile: &DeviceProfile) -> Self {
        Self {
            grid_channel: profile.grid.channel,
            grid: profile.grid.layout.clone(),
            buttons: profile.buttons.clone(),
            knobs: profile.knobs.clone(),
            mode_select: profile.mode_select.clone(),
        }
    }

    /// Route a parsed message; `None` for controls the profile doesn't know
    pub fn route(&self, event: &RawInput) -> Option<SurfaceEvent> {
        let selectors: Vec<&ModeSelectMapping> = self
            .mode_select
            .iter()
            .filter(|m| event.matches(&m.control))
            .collect();
        if !selectors.is_empty() {
            return selectors
                .into_iter()
                .find(|m| match m.value {
                    Some(value) => matches!(event, RawInput::ControlChange { .. }) && event.value() == value,
                    None => event.is_press(),
                })
                .map(|m| SurfaceEvent::ModeSelect(m.mode));
        }

        if let Some(mapping) = self.buttons.iter().find(|m| event.matches(&m.control)) {
            return Some(SurfaceEvent::Button {
                button: mapping.button,
                pressed: event.is_press(),
                velocity: event.value(),
            });
        }

        if let RawInput::ControlChange { value, .. } = event {
            if let Some(index) = self.knobs.iter().position(|knob| event.matches(knob)) {
                return Some(SurfaceEvent::Knob { index, value: *value });
            }
        }

        match *event {
            RawInput::NoteOn { channel, note, velocity } | RawInput::NoteOff { channel, note, velocity }
                if channel == self.grid_channel && self.grid.physical(note).is_some() =>
            {
                let velocity = if event.is_press() { velocity } else { 0 };
                Some(SurfaceEvent::Pad { note, velocity })
            }
            _ => {
                log::trace!("input: Unmapped {:?}", event);
                None
            }
        }
    }

    /// Parse and route raw bytes
    pub fn route_bytes(&self, data: &[u8]) -> Option<SurfaceEvent> {
        self.route(&RawInput::parse(data)?)
    }
}

/// Raw bytes as received, with their arrival time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedInput {
    pub at: Instant,
    pub bytes: Vec<u8>,
}

/// Bounded channel bridging the MIDI driver thread and the dispatch thread
pub fn input_channel() -> (Sender<TimedInput>, Receiver<TimedInput>) {
    flume::bounded(INPUT_CHANNEL_CAPACITY)
}

/// Forward bytes from a driver callback; must not block
///
/// Returns false if the message was dropped because the channel is full or
/// the controller is gone.
pub fn forward_raw(tx: &Sender<TimedInput>, data: &[u8]) -> bool {
    let input = TimedInput {
        at: Instant::now(),
        bytes: data.to_vec(),
    };
    match tx.try_send(input) {
        Ok(()) => true,
        Err(flume::TrySendError::Full(_)) => {
            log::warn!("input: Message channel full, dropping message");
            false
        }
        Err(flume::TrySendError::Disconnected(_)) => false,
    }
}
