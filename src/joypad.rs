//! Joypad multiplexing over the shared JOYP pin pair.
//!
//! Up to four virtual controllers share the adapter's input registers. The
//! emulated program cycles through them with the same P15/P14 edges that
//! carry the packet protocol; the selection logic runs first on every edge.

/// Button bits reported to the embedded core, alongside the selected joypad
/// id in bits 8-9.
pub mod buttons {
    pub const A: u16 = 0x01;
    pub const B: u16 = 0x02;
    pub const SELECT: u16 = 0x04;
    pub const START: u16 = 0x08;
    pub const RIGHT: u16 = 0x10;
    pub const LEFT: u16 = 0x20;
    pub const UP: u16 = 0x40;
    pub const DOWN: u16 = 0x80;
}

/// Round-robin controller selection with a one-shot advance lock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Joypad {
    /// Currently selected controller slot.
    pub id: u8,
    /// Set after an advance; released by a 1-bit edge.
    pub lock: bool,
}

impl Joypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.id = 0;
        self.lock = false;
    }

    /// Selection handling for one pin edge. `mask` is the normalized
    /// multiplayer request field (0, 1, or 3), which bounds the slot id.
    pub fn write_pins(&mut self, p15: bool, p14: bool, mask: u8) {
        if p15 && p14 && !self.lock {
            self.lock = true;
            self.id = (self.id + 1) & mask;
        }
        if !p15 && p14 {
            self.lock = !self.lock;
        }
    }

    /// Re-bound the selection after the multiplayer field changes.
    pub fn mask_to(&mut self, mask: u8) {
        self.id &= mask;
    }
}

/// Decode one active-low joypad register into the core-facing input state
/// for slot `id`.
pub fn input_state(id: u8, register: u8) -> u16 {
    let mut state = u16::from(id) << 8;
    if register & 0x80 == 0 {
        state |= buttons::START;
    }
    if register & 0x40 == 0 {
        state |= buttons::SELECT;
    }
    if register & 0x20 == 0 {
        state |= buttons::B;
    }
    if register & 0x10 == 0 {
        state |= buttons::A;
    }
    if register & 0x08 == 0 {
        state |= buttons::DOWN;
    }
    if register & 0x04 == 0 {
        state |= buttons::UP;
    }
    if register & 0x02 == 0 {
        state |= buttons::LEFT;
    }
    if register & 0x01 == 0 {
        state |= buttons::RIGHT;
    }
    state
}
