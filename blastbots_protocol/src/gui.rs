// UDP channel vocabulary: GUI → client input datagrams and the tags of
// the client → GUI snapshot datagrams.
//
// The GUI channel is deliberately forgiving where the TCP channel is
// strict: an inbound datagram whose size or tag doesn't match one of the
// three inputs is dropped silently, because a renderer restart or a stray
// packet must not kill the proxy. Outbound snapshots are built by the
// client from its derived state (`blastbots_client::state`) — only the
// tags and the size limit live here.

use crate::types::Direction;

/// Largest payload that fits a single UDP datagram over IPv4
/// (65535 - 20 IP - 8 UDP). A snapshot must never exceed this.
pub const MAX_DATAGRAM: usize = 65507;

/// Snapshot tag: lobby view.
pub const SNAPSHOT_LOBBY: u8 = 0;
/// Snapshot tag: in-game view.
pub const SNAPSHOT_GAME: u8 = 1;

/// An input datagram from the GUI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMessage {
    PlaceBomb,
    PlaceBlock,
    Move { direction: Direction },
}

impl InputMessage {
    /// Decode one datagram. The size must match the variant exactly;
    /// anything else — wrong length, unknown tag, direction out of range —
    /// yields `None` and the caller drops the datagram.
    pub fn decode(datagram: &[u8]) -> Option<Self> {
        match *datagram {
            [0] => Some(Self::PlaceBomb),
            [1] => Some(Self::PlaceBlock),
            [2, d] => Direction::from_u8(d).map(|direction| Self::Move { direction }),
            _ => None,
        }
    }
}
