//! Whole-adapter state snapshots.
//!
//! The layout is a fixed sequence of little-endian fields followed by the
//! embedded core's opaque 256 KiB state blob. The blob crosses the core
//! boundary through a temporary file whose cleanup is guaranteed by drop,
//! even when the core's import or export fails partway.

use std::fs;

use tempfile::NamedTempFile;

use crate::{
    adapter::SuperGameBoy,
    gb::{AdapterError, CORE_STATE_LEN},
    packet::{Packet, PACKET_LEN, QUEUE_CAPACITY},
    protocol::{ProtocolSnapshot, ProtocolState},
    renderer::VRAM_ROW_BYTES,
};

/// Adapter-state fields preceding the core blob: row index, VRAM buffer,
/// six registers, packet window, cursor, multiplayer mask, the full queue
/// backing array plus live count, and the serial decoder state.
const PREFIX_LEN: usize =
    1 + VRAM_ROW_BYTES + 6 + PACKET_LEN + 2 + 1 + QUEUE_CAPACITY * PACKET_LEN + 1 + 5 + PACKET_LEN + 3;

/// Total snapshot length.
pub const SNAPSHOT_LEN: usize = PREFIX_LEN + CORE_STATE_LEN;

pub(crate) fn save(sgb: &mut SuperGameBoy) -> Result<Vec<u8>, AdapterError> {
    let mut out = Vec::with_capacity(SNAPSHOT_LEN);

    out.push(sgb.regs.vram_row);
    out.extend_from_slice(&sgb.regs.vram);
    out.push(sgb.regs.r6000);
    out.push(sgb.regs.control);
    out.extend_from_slice(&sgb.regs.joypad);
    out.extend_from_slice(&sgb.regs.window);
    out.extend_from_slice(&sgb.regs.cursor.to_le_bytes());
    out.push(sgb.regs.mlt_req);

    for slot in sgb.queue.slots() {
        out.extend_from_slice(&slot.data);
    }
    out.push(sgb.queue.len() as u8);

    out.push(sgb.joypad.id);
    out.push(u8::from(sgb.joypad.lock));

    let snap = sgb.protocol.snapshot();
    out.push(u8::from(snap.pulse_lock));
    out.push(u8::from(snap.strobe_lock));
    out.push(u8::from(snap.packet_lock));
    out.extend_from_slice(&snap.data);
    out.push(snap.byte_offset);
    out.push(snap.accum);
    out.push(snap.bit_offset);

    let tmp = NamedTempFile::new()?;
    sgb.core.save_state(tmp.path())?;
    let mut blob = fs::read(tmp.path())?;
    blob.resize(CORE_STATE_LEN, 0);
    out.extend_from_slice(&blob);

    debug_assert_eq!(out.len(), SNAPSHOT_LEN);
    Ok(out)
}

pub(crate) fn load(sgb: &mut SuperGameBoy, bytes: &[u8]) -> Result<(), AdapterError> {
    if bytes.len() != SNAPSHOT_LEN {
        return Err(AdapterError::StateLength {
            expected: SNAPSHOT_LEN,
            actual: bytes.len(),
        });
    }

    let mut r = Reader { buf: bytes };
    let vram_row = r.u8();
    let vram: [u8; VRAM_ROW_BYTES] = r.array();
    let r6000 = r.u8();
    let control = r.u8();
    let joypad_regs: [u8; 4] = r.array();
    let window: [u8; PACKET_LEN] = r.array();
    let cursor = r.u16();
    let mlt_req = r.u8();

    let mut slots = [Packet::default(); QUEUE_CAPACITY];
    for slot in &mut slots {
        slot.data = r.array();
    }
    let count = r.u8();

    let joyp_id = r.u8();
    let joyp_lock = r.u8();

    let snap = ProtocolSnapshot {
        pulse_lock: r.u8() != 0,
        strobe_lock: r.u8() != 0,
        packet_lock: r.u8() != 0,
        data: r.array(),
        byte_offset: r.u8(),
        accum: r.u8(),
        bit_offset: r.u8(),
    };
    let blob = r.take(CORE_STATE_LEN);

    if cursor as usize >= VRAM_ROW_BYTES {
        return Err(AdapterError::StateRange("vram cursor"));
    }
    if count as usize > QUEUE_CAPACITY {
        return Err(AdapterError::StateRange("queue count"));
    }
    if joyp_id > 3 {
        return Err(AdapterError::StateRange("joypad id"));
    }
    if !snap.pulse_lock && !snap.packet_lock {
        if snap.byte_offset as usize >= PACKET_LEN {
            return Err(AdapterError::StateRange("byte offset"));
        }
        if snap.bit_offset >= 8 {
            return Err(AdapterError::StateRange("bit offset"));
        }
    }

    // Import the core blob first: a failed transfer leaves the adapter
    // untouched, and the temporary file is removed either way.
    let tmp = NamedTempFile::new()?;
    fs::write(tmp.path(), blob)?;
    sgb.core.load_state(tmp.path())?;
    drop(tmp);

    sgb.regs.vram_row = vram_row;
    sgb.regs.vram = vram;
    sgb.regs.r6000 = r6000;
    sgb.regs.control = control;
    sgb.regs.joypad = joypad_regs;
    sgb.regs.window = window;
    sgb.regs.cursor = cursor;
    sgb.regs.mlt_req = mlt_req;
    sgb.queue.restore(slots, count as usize);
    sgb.joypad.id = joyp_id;
    sgb.joypad.lock = joyp_lock != 0;
    sgb.protocol = ProtocolState::from_snapshot(&snap);
    Ok(())
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn u8(&mut self) -> u8 {
        let byte = self.buf[0];
        self.buf = &self.buf[1..];
        byte
    }

    fn u16(&mut self) -> u16 {
        let (head, rest) = self.buf.split_at(2);
        self.buf = rest;
        u16::from_le_bytes([head[0], head[1]])
    }

    fn take(&mut self, n: usize) -> &'a [u8] {
        let (head, rest) = self.buf.split_at(n);
        self.buf = rest;
        head
    }

    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N));
        out
    }
}
