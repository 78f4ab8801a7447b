//! Controller buttons and the 8-bit state word.
//!
//! Bit order follows the NES shift register: A is shifted out first.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// One of the eight controller buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    /// All buttons in bit order.
    pub const ALL: [Button; 8] = [
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
    ];

    /// Bit index of this button in a [`ButtonState`].
    pub const fn bit(self) -> u8 {
        self as u8
    }

    /// Single-bit mask of this button.
    pub const fn mask(self) -> u8 {
        1 << self.bit()
    }

    /// Upper-case display name.
    pub const fn name(self) -> &'static str {
        match self {
            Button::A => "A",
            Button::B => "B",
            Button::Select => "SELECT",
            Button::Start => "START",
            Button::Up => "UP",
            Button::Down => "DOWN",
            Button::Left => "LEFT",
            Button::Right => "RIGHT",
        }
    }

    /// True for the four d-pad directions.
    pub const fn is_direction(self) -> bool {
        matches!(self, Button::Up | Button::Down | Button::Left | Button::Right)
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Button {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Button::ALL
            .into_iter()
            .find(|button| button.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ParseError::Button(name.to_string()))
    }
}

/// Snapshot of all eight buttons: bit *i* set means button *i* is pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ButtonState(u8);

impl ButtonState {
    /// No button pressed.
    pub const RELEASED: ButtonState = ButtonState(0);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn from_buttons(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self(buttons.into_iter().fold(0, |bits, b| bits | b.mask()))
    }

    pub const fn is_pressed(self, button: Button) -> bool {
        self.0 & button.mask() != 0
    }

    pub const fn is_released(self) -> bool {
        self.0 == 0
    }

    /// Pressed buttons in bit order.
    pub fn pressed(self) -> impl Iterator<Item = Button> {
        Button::ALL
            .into_iter()
            .filter(move |button| self.is_pressed(*button))
    }
}

impl From<u8> for ButtonState {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl From<ButtonState> for u8 {
    fn from(state: ButtonState) -> Self {
        state.0
    }
}

/// `A+UP` style; `-` when nothing is pressed.
impl fmt::Display for ButtonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_released() {
            return f.write_str("-");
        }
        for (i, button) in self.pressed().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            f.write_str(button.name())?;
        }
        Ok(())
    }
}

/// Accepts the `Display` form as well as comma-separated names (`a,up`).
impl FromStr for ButtonState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "-" || s.eq_ignore_ascii_case("none") {
            return Ok(ButtonState::RELEASED);
        }
        s.split(['+', ','])
            .map(str::parse::<Button>)
            .collect::<Result<Vec<_>, _>>()
            .map(ButtonState::from_buttons)
    }
}

/// A single button edge between two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub button: Button,
    pub pressed: bool,
}

/// Button edges going from `prev` to `next`, in bit order.
pub fn transitions(prev: ButtonState, next: ButtonState) -> impl Iterator<Item = Transition> {
    let changed = prev.bits() ^ next.bits();
    Button::ALL
        .into_iter()
        .filter(move |button| changed & button.mask() != 0)
        .map(move |button| Transition {
            button,
            pressed: next.is_pressed(button),
        })
}
