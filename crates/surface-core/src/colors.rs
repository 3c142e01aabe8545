//! Pad and button colours
//!
//! Named colours used by views, and their velocity index in the Novation
//! pad palette (Launchkey Mini MK3 / Launchpad). Other SKUs remap on output.

/// Named LED colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PadColor {
    #[default]
    Black,
    GreyLo,
    White,
    Rose,
    RedHi,
    Red,
    RedLo,
    AmberHi,
    Amber,
    AmberLo,
    YellowHi,
    YellowLo,
    Green,
    GreenSpring,
}

impl PadColor {
    /// Palette index sent as note velocity
    pub fn velocity(self) -> u8 {
        match self {
            Self::Black => 0,
            Self::GreyLo => 1,
            Self::White => 3,
            Self::Rose => 4,
            Self::RedHi => 5,
            Self::Red => 6,
            Self::RedLo => 7,
            Self::AmberHi => 9,
            Self::Amber => 10,
            Self::AmberLo => 11,
            Self::YellowHi => 13,
            Self::YellowLo => 15,
            Self::Green => 21,
            Self::GreenSpring => 29,
        }
    }
}

/// Scene button: scene exists
pub const COLOR_SCENE: PadColor = PadColor::Green;
/// Scene button: scene exists and is selected
pub const COLOR_SELECTED_SCENE: PadColor = PadColor::White;
/// Scene button: no scene
pub const COLOR_SCENE_OFF: PadColor = PadColor::Black;

/// What a pad shows: a colour, optionally alternating with a blink colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PadLight {
    pub color: PadColor,
    pub blink: Option<PadColor>,
    pub fast_blink: bool,
}

impl PadLight {
    /// Steady colour
    pub const fn solid(color: PadColor) -> Self {
        Self {
            color,
            blink: None,
            fast_blink: false,
        }
    }

    pub const fn off() -> Self {
        Self::solid(PadColor::Black)
    }
}

impl From<PadColor> for PadLight {
    fn from(color: PadColor) -> Self {
        Self::solid(color)
    }
}

/// Colour rule for one slot state
///
/// `blink` of `None` means a steady light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionColor {
    pub color: PadColor,
    pub blink: Option<PadColor>,
    pub fast_blink: bool,
}

impl SessionColor {
    pub const fn new(color: PadColor, blink: Option<PadColor>, fast_blink: bool) -> Self {
        Self {
            color,
            blink,
            fast_blink,
        }
    }

    pub fn light(&self) -> PadLight {
        PadLight {
            color: self.color,
            blink: self.blink,
            fast_blink: self.fast_blink,
        }
    }
}

/// Full set of slot colours used by the session grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionColors {
    pub is_recording: SessionColor,
    pub is_recording_queued: SessionColor,
    pub is_playing: SessionColor,
    pub is_playing_queued: SessionColor,
    pub has_content: SessionColor,
    pub no_content: SessionColor,
    pub rec_armed: SessionColor,
}

impl Default for SessionColors {
    fn default() -> Self {
        Self {
            is_recording: SessionColor::new(PadColor::Red, Some(PadColor::Red), false),
            is_recording_queued: SessionColor::new(PadColor::RedLo, Some(PadColor::RedLo), true),
            is_playing: SessionColor::new(PadColor::GreenSpring, Some(PadColor::Green), false),
            is_playing_queued: SessionColor::new(PadColor::GreenSpring, Some(PadColor::Green), true),
            has_content: SessionColor::new(PadColor::Amber, None, false),
            no_content: SessionColor::new(PadColor::Black, None, false),
            rec_armed: SessionColor::new(PadColor::RedLo, None, false),
        }
    }
}
