// blastbots_protocol — wire protocol shared by the game server and client.
//
// This crate defines everything both binaries must agree on to talk over
// the network: the byte-level codec, the domain types, the two TCP message
// vocabularies, the GUI datagram vocabulary, and the explosion geometry
// (which both ends evaluate, see `types::explosion_area`). It has no
// dependency on the server or client crates.
//
// Module overview:
// - `wire.rs`:    Codec primitives over any `Read`/`Write` stream —
//                 big-endian integers, u8-length-prefixed byte strings,
//                 u32-length-prefixed lists and maps — plus `WireError`.
// - `types.rs`:   Domain types — `PlayerId`, `BombId`, `Score`,
//                 `Position`, `Player`, `Bomb`, `Direction` — and the
//                 explosion cross computation.
// - `message.rs`: The TCP frame enums: `ClientMessage`, `ServerMessage`,
//                 and the `Event` union carried inside `Turn`.
// - `gui.rs`:     The UDP channel: GUI input datagrams and the snapshot
//                 tags the client sends back.
//
// Design decisions:
// - **Hand-written codec.** The wire format is bit-exact: one tag byte per
//   union, big-endian multi-byte integers, one-byte string lengths. Every
//   message implements symmetric `read_from`/`write_to` against that
//   contract rather than deriving a serializer.
// - **`BTreeMap`/`BTreeSet` everywhere.** Maps are emitted in ascending
//   key order on the wire, so ordered containers are the natural carrier
//   on both ends.
// - **No async runtime.** The codec works on plain `std::io` streams,
//   compatible with blocking sockets and buffered wrappers.

pub mod gui;
pub mod message;
pub mod types;
pub mod wire;

pub use gui::{InputMessage, MAX_DATAGRAM};
pub use message::{ClientMessage, Event, ServerMessage};
pub use types::{explosion_area, Bomb, BombId, Direction, Player, PlayerId, Position, Score};
pub use wire::{ByteString, Wire, WireError};
