//! Super Game Boy adapter emulation core.
//!
//! This crate models the SGB bridge cartridge: the memory-mapped register
//! interface the host console drives, the JOYP serial command-packet
//! protocol, multiplayer joypad multiplexing, and the row-by-row transfer
//! of rendered Game Boy video into the host's tile memory. The embedded
//! Game Boy core itself is an external collaborator reached through the
//! [`gb`] traits; host bus plumbing lives in the frontend.

/// Adapter facade: bus dispatch, pin-edge routing, lifecycle, boot packets.
pub mod adapter;

/// Embedded Game Boy core contract and the null stub.
pub mod gb;

/// Joypad multiplexer and input-state decoding.
pub mod joypad;

/// Command packets and the bounded pending-packet queue.
pub mod packet;

/// Serial bit-bang decoder state machine.
pub mod protocol;

/// Memory-mapped register file.
pub mod registers;

/// RGB framebuffer to 2bpp planar VRAM row conversion.
pub mod renderer;

/// Whole-adapter state snapshots.
pub mod state;
