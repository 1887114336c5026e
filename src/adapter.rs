//! The Super Game Boy adapter facade.
//!
//! Composes the register file, packet queue, serial decoder, and joypad
//! multiplexer behind the host's memory-mapped read/write contract, and
//! owns the embedded Game Boy core for its lifetime.

use std::io;

use crate::{
    gb::{AdapterError, GameBoyCore, SgbLink},
    joypad::{input_state, Joypad},
    packet::{Packet, PacketQueue, PACKET_LEN},
    protocol::{transition, ProtocolState},
    registers::{Registers, CONTROL_ENABLE, CONTROL_MLT_MASK},
    renderer::{render_row, FRAME_HEIGHT, FRAME_WIDTH, VRAM_ROW_BYTES},
    state,
};

/// Start of the cartridge header region copied by the boot packets.
const HEADER_BASE: u16 = 0x0104;

/// Header bytes carried per boot packet.
const HEADER_STRIDE: u16 = 14;

/// Number of synthetic boot packets injected on an enable transition.
const BOOT_PACKETS: u16 = 6;

/// The adapter. All host bus access and pin edges go through this type;
/// every call runs to completion before the next begins.
pub struct SuperGameBoy {
    pub(crate) core: Box<dyn GameBoyCore>,
    pub(crate) regs: Registers,
    pub(crate) queue: PacketQueue,
    pub(crate) protocol: ProtocolState,
    pub(crate) joypad: Joypad,
    pub(crate) frame: Vec<u32>,
}

impl SuperGameBoy {
    pub fn new(core: Box<dyn GameBoyCore>) -> Self {
        Self {
            core,
            regs: Registers::new(),
            queue: PacketQueue::new(),
            protocol: ProtocolState::Idle,
            joypad: Joypad::new(),
            frame: vec![0; FRAME_WIDTH * FRAME_HEIGHT],
        }
    }

    /// Power on: load the embedded core in forced DMG-compatibility mode
    /// and reset all adapter state. A load failure leaves the adapter
    /// unusable and must be propagated to the host.
    pub fn power(&mut self) -> Result<(), AdapterError> {
        self.core.load_dmg()?;
        self.reset_state();
        Ok(())
    }

    /// Reset the embedded core and adapter state without reloading.
    pub fn reset(&mut self) {
        self.core.reset();
        self.reset_state();
    }

    fn reset_state(&mut self) {
        self.regs.reset();
        self.queue.clear();
        self.joypad.reset();
        self.protocol = ProtocolState::Idle;
    }

    /// Host bus read.
    pub fn read(&mut self, addr: u16) -> u8 {
        match addr {
            // Live LY counter from the embedded core.
            0x6000 => self.core.ly_counter(),

            // Packet-ready port: reports whether a packet is pending and,
            // as a side effect, latches it into the window and pops it.
            0x6002 => match self.queue.pop() {
                Some(packet) => {
                    log::trace!("latched {} packet", packet.command_name());
                    self.regs.window = packet.data;
                    1
                }
                None => 0,
            },

            // Latched packet window.
            0x7000..=0x700F => self.regs.window[(addr & 15) as usize],

            // VRAM row cursor, auto-incrementing with wraparound.
            0x7800 => {
                let data = self.regs.vram[self.regs.cursor as usize];
                self.regs.cursor = (self.regs.cursor + 1) % VRAM_ROW_BYTES as u16;
                data
            }

            _ => 0x00,
        }
    }

    /// Host bus write.
    pub fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x6003 => {
                // 0 -> 1 on the enable bit releases /RESET: restart the
                // core and emit the boot identification packets.
                if self.regs.control & CONTROL_ENABLE == 0 && data & CONTROL_ENABLE != 0 {
                    self.reset();
                    self.inject_boot_packets();
                }

                let mut mlt = (data & CONTROL_MLT_MASK) >> 4;
                if mlt == 2 {
                    // Reserved encoding; the hardware treats it as 4-player.
                    mlt = 3;
                }
                self.regs.mlt_req = mlt;
                self.joypad.mask_to(mlt);
                self.regs.control = data;
            }

            0x6004..=0x6007 => self.regs.joypad[(addr - 0x6004) as usize] = data,

            _ => {}
        }
    }

    /// One JOYP pin edge from the host side (outside of `run`).
    pub fn write_pins(&mut self, p15: bool, p14: bool) {
        pin_edge(
            &self.regs,
            &mut self.joypad,
            &mut self.protocol,
            &mut self.queue,
            p15,
            p14,
        );
    }

    /// Select and render VRAM row `row`, resetting the read cursor.
    pub fn select_row(&mut self, row: u8) {
        self.regs.cursor = 0;
        self.regs.vram_row = row;
        render_row(&self.frame, row as usize, &mut self.regs.vram);
    }

    /// Advance emulation. With the enable bit clear the core is held in
    /// reset: a single silent sample is produced. Otherwise the embedded
    /// core runs the frame, polling input and reporting pin edges through
    /// the link callbacks.
    pub fn run(&mut self, audio: &mut [u32], samples: usize) -> usize {
        if self.regs.control & CONTROL_ENABLE == 0 {
            if let Some(first) = audio.first_mut() {
                *first = 0;
            }
            return 1;
        }

        let mut link = BusLink {
            regs: &self.regs,
            joypad: &mut self.joypad,
            protocol: &mut self.protocol,
            queue: &mut self.queue,
        };
        self.core
            .run_for(&mut self.frame, FRAME_WIDTH, audio, samples, &mut link)
    }

    /// Currently selected joypad slot.
    pub fn joypad_id(&self) -> u8 {
        self.joypad.id
    }

    /// Debug read from the embedded Game Boy bus.
    pub fn read_gb(&mut self, addr: u16) -> u8 {
        self.core.debug_read(addr)
    }

    /// Debug write to the embedded Game Boy bus.
    pub fn write_gb(&mut self, addr: u16, data: u8) {
        self.core.debug_write(addr, data);
    }

    /// Flush the embedded core's battery-backed save data.
    pub fn save_ram(&mut self) -> io::Result<()> {
        self.core.save_ram()
    }

    /// Serialize the complete adapter state, embedded core included.
    pub fn save_state(&mut self) -> Result<Vec<u8>, AdapterError> {
        state::save(self)
    }

    /// Restore a snapshot produced by [`Self::save_state`].
    pub fn load_state(&mut self, bytes: &[u8]) -> Result<(), AdapterError> {
        state::load(self, bytes)
    }

    /// Simulate the adapter's internal boot firmware: six DATA_SND-style
    /// packets carrying a checksummed copy of the cartridge header.
    fn inject_boot_packets(&mut self) {
        for i in 0..BOOT_PACKETS {
            let mut data = [0u8; PACKET_LEN];
            data[0] = 0xF1 + ((i as u8) << 1);
            let mut sum = 0u8;
            for n in 0..HEADER_STRIDE {
                let byte = self.core.debug_read(HEADER_BASE + i * HEADER_STRIDE + n);
                sum = sum.wrapping_add(byte);
                data[2 + n as usize] = byte;
            }
            data[1] = sum;
            self.queue.push(Packet::new(data));
        }
        log::debug!("injected boot identification packets");
    }
}

/// Shared pin-edge handling: selection logic first, then the packet
/// protocol. Both interpret the same edge; this ordering is load-bearing.
fn pin_edge(
    regs: &Registers,
    joypad: &mut Joypad,
    protocol: &mut ProtocolState,
    queue: &mut PacketQueue,
    p15: bool,
    p14: bool,
) {
    joypad.write_pins(p15, p14, regs.mlt_req);
    let (next, emitted) = transition(std::mem::take(protocol), p15, p14);
    *protocol = next;
    if let Some(packet) = emitted {
        queue.push(packet);
    }
}

/// Borrowed view of the adapter handed to the core during `run`, so the
/// core can poll input and report JOYP edges without aliasing itself.
struct BusLink<'a> {
    regs: &'a Registers,
    joypad: &'a mut Joypad,
    protocol: &'a mut ProtocolState,
    queue: &'a mut PacketQueue,
}

impl SgbLink for BusLink<'_> {
    fn joyp_write(&mut self, p15: bool, p14: bool) {
        pin_edge(self.regs, self.joypad, self.protocol, self.queue, p15, p14);
    }

    fn poll_input(&mut self) -> u16 {
        let id = self.joypad.id & 3;
        input_state(id, self.regs.joypad[id as usize])
    }
}
