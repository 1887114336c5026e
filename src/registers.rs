//! The adapter's memory-mapped register file.

use crate::renderer::VRAM_ROW_BYTES;

/// Control register bit 7: /RESET line (0 = stop, 1 = run).
pub const CONTROL_ENABLE: u8 = 0x80;

/// Control register bits 5-4: multiplayer select.
pub const CONTROL_MLT_MASK: u8 = 0x30;

/// Adapter registers and the rolling VRAM output buffer. Pure state; all
/// bus-visible side effects live in the facade's read/write dispatch.
pub struct Registers {
    /// Latched line-counter slot. Live 0x6000 reads come straight from the
    /// embedded core; this byte only occupies its slot in state snapshots.
    pub r6000: u8,
    /// Control register (0x6003).
    pub control: u8,
    /// Joypad state registers (0x6004-0x6007), one per slot, active low.
    pub joypad: [u8; 4],
    /// Latched packet window (0x7000-0x700F).
    pub window: [u8; 16],
    /// VRAM read cursor (0x7800), wraps at the row length.
    pub cursor: u16,
    /// Normalized multiplayer request mask: 0, 1, or 3.
    pub mlt_req: u8,
    /// Most recently rendered VRAM row.
    pub vram: [u8; VRAM_ROW_BYTES],
    /// Index of that row.
    pub vram_row: u8,
}

impl Registers {
    pub fn new() -> Self {
        Self {
            r6000: 0,
            control: 0,
            joypad: [0xFF; 4],
            window: [0; 16],
            cursor: 0,
            mlt_req: 0,
            vram: [0; VRAM_ROW_BYTES],
            vram_row: 0,
        }
    }

    /// Power-on defaults: everything cleared, joypads idle (active low).
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
