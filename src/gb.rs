//! Contract with the embedded Game Boy core.
//!
//! The adapter drives the core through a narrow seam: lifecycle
//! (load/reset), frame advancement, debug bus access, and whole-state
//! import/export through a file. The core calls back through [`SgbLink`]
//! to poll the multiplexed joypad and to report JOYP pin edges.

use std::{io, path::Path};

use thiserror::Error;

/// Size of the embedded core's exported state blob.
pub const CORE_STATE_LEN: usize = 256 * 1024;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// The embedded core could not be acquired or loaded. The adapter must
    /// not be used after this.
    #[error("embedded core load failed: {0}")]
    CoreLoad(String),
    /// A state snapshot had the wrong total length.
    #[error("state snapshot is {actual} bytes, expected {expected}")]
    StateLength { expected: usize, actual: usize },
    /// A state snapshot field was outside its valid range.
    #[error("state snapshot field out of range: {0}")]
    StateRange(&'static str),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Callbacks the embedded core invokes while running a frame.
pub trait SgbLink {
    /// JOYP line transition performed by the emulated program (P15/P14).
    /// Invoked synchronously on every change.
    fn joyp_write(&mut self, p15: bool, p14: bool);

    /// Poll the currently selected joypad. Returns the button bits of
    /// [`crate::joypad::buttons`] with the slot id in bits 8-9.
    fn poll_input(&mut self) -> u16;
}

/// The embedded Game Boy emulation core.
pub trait GameBoyCore {
    /// Load the core in forced DMG-compatibility mode.
    fn load_dmg(&mut self) -> Result<(), AdapterError>;

    /// Reset the core without reloading.
    fn reset(&mut self);

    /// Advance emulation, producing up to `samples` audio samples and
    /// writing video into `frame` (`pitch` pixels per scanline). Returns
    /// the number of samples actually produced.
    fn run_for(
        &mut self,
        frame: &mut [u32],
        pitch: usize,
        audio: &mut [u32],
        samples: usize,
        link: &mut dyn SgbLink,
    ) -> usize;

    /// Current LY scanline counter.
    fn ly_counter(&self) -> u8;

    /// Debug read from the Game Boy bus.
    fn debug_read(&mut self, addr: u16) -> u8;

    /// Debug write to the Game Boy bus.
    fn debug_write(&mut self, addr: u16, data: u8);

    /// Export the complete core state to `path`.
    fn save_state(&mut self, path: &Path) -> io::Result<()>;

    /// Import a previously exported state from `path`.
    fn load_state(&mut self, path: &Path) -> io::Result<()>;

    /// Flush battery-backed save data.
    fn save_ram(&mut self) -> io::Result<()>;
}

/// A stub core used when no emulation engine is attached: reads float high,
/// video stays blank, and the audio buffer is filled with silence.
#[derive(Default)]
pub struct NullCore;

impl GameBoyCore for NullCore {
    fn load_dmg(&mut self) -> Result<(), AdapterError> {
        Ok(())
    }

    fn reset(&mut self) {}

    fn run_for(
        &mut self,
        _frame: &mut [u32],
        _pitch: usize,
        audio: &mut [u32],
        samples: usize,
        _link: &mut dyn SgbLink,
    ) -> usize {
        let n = samples.min(audio.len());
        audio[..n].fill(0);
        n
    }

    fn ly_counter(&self) -> u8 {
        0
    }

    fn debug_read(&mut self, _addr: u16) -> u8 {
        0xFF
    }

    fn debug_write(&mut self, _addr: u16, _data: u8) {}

    fn save_state(&mut self, path: &Path) -> io::Result<()> {
        std::fs::write(path, [0u8; 0])
    }

    fn load_state(&mut self, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn save_ram(&mut self) -> io::Result<()> {
        Ok(())
    }
}
