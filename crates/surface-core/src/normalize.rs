//! Value normalization for knobs and encoders
//!
//! Every parameter the surface touches is exchanged as a 7-bit value (0-127).
//! Absolute knobs already send one. Relative encoders send a signed step that
//! is scaled by the knob sensitivity settings and then applied to the current
//! value:
//! - sensitivity 0: one encoder tick moves one step
//! - sensitivity -100..0: slower, down to a quarter step per tick
//! - sensitivity 0..100: faster, up to four steps per tick

use crate::config::EncoderMode;

/// Highest 7-bit value
pub const MIDI_MAX: u8 = 127;

/// Step multiplier for a sensitivity setting (-100..=100)
fn sensitivity_factor(sensitivity: i32) -> f32 {
    let s = sensitivity.clamp(-100, 100) as f32;
    2f32.powf(s / 50.0)
}

/// Signed value step for one relative encoder message
///
/// `Relative` encoders send sign and magnitude: bit 6 set means
/// counter-clockwise, the low six bits are the tick count. `RelativeSigned`
/// encoders send an offset from 64. The tick count is scaled by
/// `sensitivity`; a turn never scales down to nothing. Absolute knobs have
/// no step.
pub fn knob_step(midi_value: u8, mode: EncoderMode, sensitivity: i32) -> i32 {
    let ticks = match mode {
        EncoderMode::Absolute => return 0,
        EncoderMode::Relative if midi_value & 0x40 != 0 => -i32::from(midi_value & 0x3F),
        EncoderMode::Relative => i32::from(midi_value & 0x3F),
        EncoderMode::RelativeSigned => i32::from(midi_value) - 64,
    };
    if ticks == 0 {
        return 0;
    }
    match (ticks as f32 * sensitivity_factor(sensitivity)).round() as i32 {
        0 => ticks.signum(),
        step => step,
    }
}

/// Apply a signed step to a 7-bit value, clamped to 0-127
pub fn apply_delta(value: u8, delta: i32) -> u8 {
    (value as i32 + delta).clamp(0, MIDI_MAX as i32) as u8
}

/// Resolve an incoming knob message to the new 7-bit value
///
/// Absolute knobs pass through; relative encoders move `current`.
pub fn knob_target(current: u8, midi_value: u8, mode: EncoderMode, sensitivity: i32) -> u8 {
    match mode {
        EncoderMode::Absolute => midi_value.min(MIDI_MAX),
        EncoderMode::Relative | EncoderMode::RelativeSigned => {
            apply_delta(current, knob_step(midi_value, mode, sensitivity))
        }
    }
}

/// Map a 7-bit value onto a boolean (upper half is on)
pub fn is_on(value: u8) -> bool {
    value >= 64
}

/// Map a boolean onto the 7-bit extremes
pub fn from_bool(on: bool) -> u8 {
    if on {
        MIDI_MAX
    } else {
        0
    }
}
