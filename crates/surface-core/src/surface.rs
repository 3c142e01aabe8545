//! Physical control surface abstraction
//!
//! Buttons and pads are addressed by [`ButtonId`] and pad notes. The
//! [`Surface`] trait is the only way views reach the hardware: LED writes and
//! user-facing notifications. [`PadGrid`] translates between pad notes and
//! grid coordinates, and [`PressTracker`] turns press/release timestamps into
//! long-press events.

use crate::colors::PadLight;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Physical button identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonId {
    Scene1,
    Scene2,
    Shift,
    Play,
    Record,
    Undo,
    TapTempo,
    New,
    NudgeMinus,
    NudgePlus,
    Repeat,
    Footswitch,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
}

impl ButtonId {
    /// Scene buttons in order
    pub const SCENES: [ButtonId; 2] = [ButtonId::Scene1, ButtonId::Scene2];

    pub fn is_scene_button(self) -> bool {
        Self::SCENES.contains(&self)
    }

    /// Zero-based index of a scene button
    pub fn scene_index(self) -> Option<usize> {
        Self::SCENES.iter().position(|b| *b == self)
    }
}

/// Button edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonEvent {
    Down,
    Up,
    /// Button held past the long-press threshold (reported once per hold)
    Long,
}

/// Output side of a controller
pub trait Surface {
    /// Light the pad at a physical grid position (row 0 = top)
    fn light_pad(&mut self, column: usize, row: usize, light: PadLight);
    /// Set a button LED to a palette colour index
    fn set_button_light(&mut self, button: ButtonId, color: u8);
    /// Show a transient single-line message to the user
    fn notify(&mut self, text: &str);
}

/// Logical row a pad resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridRow {
    /// Row handed to the active pad mode (track toggles)
    Control,
    /// Clip slot row, relative to the scene bank page
    Slot(usize),
}

/// Column and logical row of a pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPosition {
    pub column: usize,
    pub row: GridRow,
}

/// Note layout of the pad matrix
///
/// Each physical row is a run of consecutive notes starting at
/// `row_notes[row]`; row 0 is the top row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadGrid {
    pub columns: usize,
    pub row_notes: Vec<u8>,
}

impl Default for PadGrid {
    /// Launchkey Mini MK3 session pads: top row 0x60.., bottom row 0x70..
    fn default() -> Self {
        Self {
            columns: 8,
            row_notes: vec![0x60, 0x70],
        }
    }
}

impl PadGrid {
    pub fn rows(&self) -> usize {
        self.row_notes.len()
    }

    /// Physical (column, row) of a pad note
    pub fn physical(&self, note: u8) -> Option<(usize, usize)> {
        self.row_notes.iter().enumerate().find_map(|(row, &start)| {
            let column = note.checked_sub(start)? as usize;
            (column < self.columns).then_some((column, row))
        })
    }

    /// Pad note at a physical (column, row)
    pub fn note_at(&self, column: usize, row: usize) -> Option<u8> {
        if column >= self.columns {
            return None;
        }
        let start = *self.row_notes.get(row)?;
        u8::try_from(start as usize + column).ok()
    }

    /// Resolve a note to a logical grid position
    ///
    /// Without a control row every physical row is a slot row. With a control
    /// row the top physical row becomes [`GridRow::Control`] and the rows
    /// below shift up by one.
    pub fn position(&self, note: u8, control_row: bool) -> Option<GridPosition> {
        let (column, row) = self.physical(note)?;
        let row = match (control_row, row) {
            (false, r) => GridRow::Slot(r),
            (true, 0) => GridRow::Control,
            (true, r) => GridRow::Slot(r - 1),
        };
        Some(GridPosition { column, row })
    }

    /// Physical row a logical row is drawn on
    pub fn physical_row(&self, row: GridRow, control_row: bool) -> Option<usize> {
        let physical = match (row, control_row) {
            (GridRow::Control, false) => return None,
            (GridRow::Control, true) => 0,
            (GridRow::Slot(r), false) => r,
            (GridRow::Slot(r), true) => r + 1,
        };
        (physical < self.rows()).then_some(physical)
    }

    /// Inverse of [`PadGrid::position`]
    pub fn note_for(&self, position: GridPosition, control_row: bool) -> Option<u8> {
        let row = self.physical_row(position.row, control_row)?;
        self.note_at(position.column, row)
    }

    /// Every pad note of the grid, row by row
    pub fn notes(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.rows()).flat_map(move |row| {
            (0..self.columns).filter_map(move |column| self.note_at(column, row))
        })
    }
}

/// Held-control bookkeeping for long-press detection
///
/// Keys are whatever identifies a control (pad note, button id).
#[derive(Debug, Clone)]
pub struct PressTracker<K> {
    threshold: Duration,
    held: HashMap<K, HeldControl>,
}

#[derive(Debug, Clone, Copy)]
struct HeldControl {
    since: Instant,
    long_reported: bool,
    /// A long-press handler acted on this hold
    long_handled: bool,
}

impl<K: Copy + Eq + Hash> PressTracker<K> {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            held: HashMap::new(),
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Record a press
    pub fn press(&mut self, key: K, at: Instant) {
        self.held.insert(
            key,
            HeldControl {
                since: at,
                long_reported: false,
                long_handled: false,
            },
        );
    }

    /// Record a release; returns how long the control was held
    ///
    /// `None` if the press was never seen.
    pub fn release(&mut self, key: K, at: Instant) -> Option<Duration> {
        self.held
            .remove(&key)
            .map(|held| at.saturating_duration_since(held.since))
    }

    /// Note that the long press of a held control did something
    pub fn mark_long_handled(&mut self, key: K) {
        if let Some(held) = self.held.get_mut(&key) {
            held.long_handled = true;
        }
    }

    /// Whether the release should be swallowed because a long press acted
    pub fn long_handled(&self, key: K) -> bool {
        self.held.get(&key).is_some_and(|held| held.long_handled)
    }

    /// Controls that crossed the threshold since the last poll
    pub fn poll_long(&mut self, now: Instant) -> Vec<K> {
        let threshold = self.threshold;
        let mut fired = Vec::new();
        for (key, held) in self.held.iter_mut() {
            if !held.long_reported && now.saturating_duration_since(held.since) >= threshold {
                held.long_reported = true;
                fired.push(*key);
            }
        }
        fired
    }

    pub fn is_held(&self, key: K) -> bool {
        self.held.contains_key(&key)
    }
}
