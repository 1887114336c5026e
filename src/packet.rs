/// Number of bytes in one command packet.
pub const PACKET_LEN: usize = 16;

/// Maximum number of packets pending consumption by the host.
pub const QUEUE_CAPACITY: usize = 64;

/// Command mnemonics indexed by the 5-bit command id in byte 0.
pub const COMMAND_NAMES: [&str; 32] = [
    "PAL01", "PAL23", "PAL03", "PAL12", "ATTR_BLK", "ATTR_LIN", "ATTR_DIV", "ATTR_CHR", "SOUND",
    "SOU_TRN", "PAL_SET", "PAL_TRN", "ATRC_EN", "TEST_EN", "ICON_EN", "DATA_SND", "DATA_TRN",
    "MLT_REQ", "JUMP", "CHR_TRN", "PCT_TRN", "ATTR_TRN", "ATTR_SET", "MASK_EN", "OBJ_TRN",
    "19_???", "1A_???", "1B_???", "1C_???", "1D_???", "1E_ROM", "1F_???",
];

/// One 16-byte command unit transmitted over the JOYP serial protocol.
///
/// Byte 0 packs the command id in the upper 5 bits and the remaining-packet
/// count in the lower 3; the payload convention of the other 15 bytes is
/// command specific. Packets are immutable once enqueued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Packet {
    pub data: [u8; PACKET_LEN],
}

impl Packet {
    pub fn new(data: [u8; PACKET_LEN]) -> Self {
        Self { data }
    }

    /// 5-bit command id from byte 0.
    pub fn command(&self) -> u8 {
        self.data[0] >> 3
    }

    pub fn command_name(&self) -> &'static str {
        COMMAND_NAMES[self.command() as usize]
    }
}

/// Bounded FIFO of pending command packets.
///
/// Capacity is fixed at 64 entries; pushes past that are dropped without
/// signaling the producer, matching the adapter hardware's overflow policy.
pub struct PacketQueue {
    slots: [Packet; QUEUE_CAPACITY],
    len: usize,
}

impl PacketQueue {
    pub fn new() -> Self {
        Self {
            slots: [Packet::default(); QUEUE_CAPACITY],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append a packet. Returns false (and drops the packet) when full.
    pub fn push(&mut self, packet: Packet) -> bool {
        if self.len >= QUEUE_CAPACITY {
            log::debug!("packet queue full, dropping {} packet", packet.command_name());
            return false;
        }
        self.slots[self.len] = packet;
        self.len += 1;
        true
    }

    /// Remove and return the oldest pending packet.
    pub fn pop(&mut self) -> Option<Packet> {
        if self.len == 0 {
            return None;
        }
        let front = self.slots[0];
        self.slots.copy_within(1..self.len, 0);
        self.len -= 1;
        Some(front)
    }

    /// All slots, live or not, in storage order. Used by state snapshots,
    /// which persist the full backing array alongside the live count.
    pub fn slots(&self) -> &[Packet; QUEUE_CAPACITY] {
        &self.slots
    }

    /// Rebuild the queue from a snapshot's backing array and live count.
    /// `len` must not exceed the queue capacity.
    pub fn restore(&mut self, slots: [Packet; QUEUE_CAPACITY], len: usize) {
        debug_assert!(len <= QUEUE_CAPACITY);
        self.slots = slots;
        self.len = len.min(QUEUE_CAPACITY);
    }
}

impl Default for PacketQueue {
    fn default() -> Self {
        Self::new()
    }
}
