//! Serial command-packet decoder for the JOYP pin pair.
//!
//! The host program transmits packets by toggling the P15/P14 lines: a
//! both-low pulse opens a packet, each bit is framed by a both-high strobe
//! followed by a single-line edge (P15 = 0 bit, P14 = 1 bit), and a final
//! 0-bit edge after the 128th bit commits the packet. The decoder is a
//! tagged state machine with a pure transition function so that its
//! interleaving with the joypad-selection logic (which shares the same pin
//! stream) has no hidden evaluation order.

use crate::packet::{Packet, PACKET_LEN};

/// In-progress byte/packet accumulator while bits are being shifted in.
///
/// Each received bit is inserted at the accumulator MSB and shifted toward
/// the LSB, so the first bit of a byte ends up in bit 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shift {
    /// Set while the decoder expects a both-high strobe before the next bit.
    pub strobe: bool,
    /// Byte accumulator.
    pub accum: u8,
    /// Bits shifted into `accum` so far (0-7).
    pub bit: u8,
    /// Bytes committed to `data` so far (0-15).
    pub byte: u8,
    /// Committed bytes of the in-progress packet.
    pub data: [u8; PACKET_LEN],
}

impl Shift {
    fn start() -> Self {
        Self {
            strobe: true,
            accum: 0,
            bit: 0,
            byte: 0,
            data: [0; PACKET_LEN],
        }
    }
}

/// Decoder state between pin edges.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ProtocolState {
    /// Pulse-locked: a malformed sequence (or a committed packet) was seen
    /// and every edge is ignored until the next both-low pulse.
    #[default]
    Idle,
    /// Shifting bits into the in-progress packet.
    Receiving(Shift),
    /// All 16 bytes assembled; awaiting the final framing edge.
    Assembled { strobe: bool, data: [u8; PACKET_LEN] },
}

/// Advance the decoder by one pin edge. Returns the next state and the
/// completed packet, if this edge committed one.
pub fn transition(state: ProtocolState, p15: bool, p14: bool) -> (ProtocolState, Option<Packet>) {
    // A both-low pulse resynchronizes from any state, dropping whatever was
    // in progress.
    if !p15 && !p14 {
        return (ProtocolState::Receiving(Shift::start()), None);
    }

    match state {
        ProtocolState::Idle => (ProtocolState::Idle, None),

        ProtocolState::Receiving(mut shift) => {
            if p15 && p14 {
                // Strobe phase: arm the line for the next data bit.
                shift.strobe = false;
                return (ProtocolState::Receiving(shift), None);
            }
            if shift.strobe {
                // Expected a strobe but got a data edge: abandon the packet
                // and require a fresh pulse.
                log::trace!("serial desync at byte {} bit {}", shift.byte, shift.bit);
                return (ProtocolState::Idle, None);
            }

            // P15 high = 0, P14 high = 1.
            let bit = u8::from(!p15);
            shift.strobe = true;
            shift.accum = (bit << 7) | (shift.accum >> 1);
            shift.bit += 1;
            if shift.bit < 8 {
                return (ProtocolState::Receiving(shift), None);
            }

            shift.bit = 0;
            shift.data[shift.byte as usize] = shift.accum;
            shift.byte += 1;
            if shift.byte < PACKET_LEN as u8 {
                (ProtocolState::Receiving(shift), None)
            } else {
                (
                    ProtocolState::Assembled {
                        strobe: true,
                        data: shift.data,
                    },
                    None,
                )
            }
        }

        ProtocolState::Assembled { strobe, data } => {
            if p15 && p14 {
                return (ProtocolState::Assembled { strobe: false, data }, None);
            }
            if strobe {
                // Framing edge without the arming strobe: the assembled
                // packet is lost and the line pulse-locks.
                log::trace!("serial desync on packet frame");
                return (ProtocolState::Idle, None);
            }
            if p15 {
                // Armed P15-high edge: commit the packet.
                (ProtocolState::Idle, Some(Packet::new(data)))
            } else {
                // A 1-bit edge re-arms the strobe; the packet stays pending.
                (ProtocolState::Assembled { strobe: true, data }, None)
            }
        }
    }
}

/// Flat lock/offset view of the decoder, matching the persisted state
/// layout (which predates the tagged representation).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProtocolSnapshot {
    pub pulse_lock: bool,
    pub strobe_lock: bool,
    pub packet_lock: bool,
    pub data: [u8; PACKET_LEN],
    pub byte_offset: u8,
    pub accum: u8,
    pub bit_offset: u8,
}

impl ProtocolState {
    pub fn snapshot(&self) -> ProtocolSnapshot {
        match self {
            ProtocolState::Idle => ProtocolSnapshot {
                pulse_lock: true,
                ..ProtocolSnapshot::default()
            },
            ProtocolState::Receiving(shift) => ProtocolSnapshot {
                pulse_lock: false,
                strobe_lock: shift.strobe,
                packet_lock: false,
                data: shift.data,
                byte_offset: shift.byte,
                accum: shift.accum,
                bit_offset: shift.bit,
            },
            ProtocolState::Assembled { strobe, data } => ProtocolSnapshot {
                pulse_lock: false,
                strobe_lock: *strobe,
                packet_lock: true,
                data: *data,
                byte_offset: PACKET_LEN as u8,
                accum: 0,
                bit_offset: 0,
            },
        }
    }

    /// Rebuild the tagged state from a snapshot. The caller is responsible
    /// for validating the offsets against the packet dimensions.
    pub fn from_snapshot(snap: &ProtocolSnapshot) -> Self {
        if snap.pulse_lock {
            ProtocolState::Idle
        } else if snap.packet_lock {
            ProtocolState::Assembled {
                strobe: snap.strobe_lock,
                data: snap.data,
            }
        } else {
            ProtocolState::Receiving(Shift {
                strobe: snap.strobe_lock,
                accum: snap.accum,
                bit: snap.bit_offset,
                byte: snap.byte_offset,
                data: snap.data,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{transition, ProtocolState, Shift};
    use crate::packet::Packet;

    fn step(state: &mut ProtocolState, p15: bool, p14: bool) -> Option<Packet> {
        let (next, emitted) = transition(std::mem::take(state), p15, p14);
        *state = next;
        emitted
    }

    fn pulse(state: &mut ProtocolState) {
        assert!(step(state, false, false).is_none());
    }

    fn send_bit(state: &mut ProtocolState, bit: bool) -> Option<Packet> {
        assert!(step(state, true, true).is_none());
        if bit {
            step(state, false, true)
        } else {
            step(state, true, false)
        }
    }

    fn send_byte(state: &mut ProtocolState, byte: u8) -> Option<Packet> {
        let mut emitted = None;
        for i in 0..8 {
            emitted = send_bit(state, byte >> i & 1 != 0);
        }
        emitted
    }

    fn send_packet(state: &mut ProtocolState, bytes: &[u8; 16]) -> Option<Packet> {
        pulse(state);
        for &byte in bytes {
            assert!(send_byte(state, byte).is_none());
        }
        // Final framing: strobe then a 0-bit edge.
        assert!(step(state, true, true).is_none());
        step(state, true, false)
    }

    #[test]
    fn idle_ignores_everything_but_pulse() {
        let mut state = ProtocolState::Idle;
        assert!(step(&mut state, true, true).is_none());
        assert!(step(&mut state, true, false).is_none());
        assert!(step(&mut state, false, true).is_none());
        assert_eq!(state, ProtocolState::Idle);

        pulse(&mut state);
        assert!(matches!(state, ProtocolState::Receiving(_)));
    }

    #[test]
    fn bytes_assemble_low_bit_first() {
        let mut state = ProtocolState::Idle;
        pulse(&mut state);
        assert!(send_byte(&mut state, 0xA5).is_none());
        match &state {
            ProtocolState::Receiving(shift) => {
                assert_eq!(shift.byte, 1);
                assert_eq!(shift.bit, 0);
                assert_eq!(shift.data[0], 0xA5);
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn full_packet_round_trip() {
        let mut state = ProtocolState::Idle;
        let bytes: [u8; 16] = std::array::from_fn(|i| (i as u8) * 3 + 1);
        let packet = send_packet(&mut state, &bytes).expect("packet should commit");
        assert_eq!(packet.data, bytes);
        assert_eq!(state, ProtocolState::Idle);
    }

    #[test]
    fn data_edge_during_strobe_wait_locks_until_pulse() {
        let mut state = ProtocolState::Idle;
        pulse(&mut state);
        assert!(send_bit(&mut state, true).is_none());
        // The strobe is armed after the bit; a second data edge is malformed.
        assert!(step(&mut state, false, true).is_none());
        assert_eq!(state, ProtocolState::Idle);

        // A fresh pulse yields a clean packet with no leaked bits.
        let bytes = [0x55u8; 16];
        let packet = send_packet(&mut state, &bytes).expect("packet should commit");
        assert_eq!(packet.data, bytes);
    }

    #[test]
    fn assembled_one_bit_edge_keeps_packet_pending() {
        let mut state = ProtocolState::Idle;
        let bytes = [0x0Fu8; 16];
        pulse(&mut state);
        for &byte in &bytes {
            assert!(send_byte(&mut state, byte).is_none());
        }
        assert!(matches!(state, ProtocolState::Assembled { strobe: true, .. }));

        // A 1-bit edge (armed) is ignored; the packet still commits after.
        assert!(step(&mut state, true, true).is_none());
        assert!(step(&mut state, false, true).is_none());
        assert!(step(&mut state, true, true).is_none());
        let packet = step(&mut state, true, false).expect("packet should commit");
        assert_eq!(packet.data, bytes);
    }

    #[test]
    fn assembled_unarmed_frame_edge_drops_packet() {
        let mut state = ProtocolState::Idle;
        pulse(&mut state);
        for _ in 0..16 {
            assert!(send_byte(&mut state, 0xFF).is_none());
        }
        // Framing edge without the arming strobe: packet lost.
        assert!(step(&mut state, true, false).is_none());
        assert_eq!(state, ProtocolState::Idle);
    }

    #[test]
    fn pulse_wins_mid_packet() {
        let mut state = ProtocolState::Idle;
        pulse(&mut state);
        assert!(send_byte(&mut state, 0xAA).is_none());
        pulse(&mut state);
        match &state {
            ProtocolState::Receiving(shift) => {
                assert_eq!(shift.byte, 0);
                assert_eq!(shift.bit, 0);
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn snapshot_round_trips_each_state() {
        let states = [
            ProtocolState::Idle,
            ProtocolState::Receiving(Shift {
                strobe: false,
                accum: 0x5A,
                bit: 3,
                byte: 7,
                data: [0x11; 16],
            }),
            ProtocolState::Assembled {
                strobe: true,
                data: [0x22; 16],
            },
        ];
        for state in states {
            let restored = ProtocolState::from_snapshot(&state.snapshot());
            assert_eq!(restored, state);
        }
    }
}
