// blastbots_server — the authoritative game server.
//
// The server accepts TCP clients, runs a lobby-then-game state machine,
// advances turns on a fixed wall-clock cadence, and broadcasts a canonical
// event stream that every client can replay into an identical view.
//
// Module overview:
// - `config.rs`:  `ServerConfig` — every tunable the CLI exposes.
// - `queue.rs`:   `BlockingQueue` — the per-client lossless outbound
//                 queue with close semantics.
// - `session.rs`: All shared mutable state behind one mutex: the lobby
//                 roster, client↔player mapping, per-client queues, the
//                 latest-intent table, and the replay history that
//                 backfills late joiners.
// - `net.rs`:     TCP front end — the acceptor loop plus one reader and
//                 one writer thread per connection.
// - `game.rs`:    The game manager — a single thread that drives the
//                 lobby→game→lobby cycle and produces turn events.
//
// Threading: one acceptor, two threads per live connection, one game
// manager. The manager never touches sockets; it talks to clients only
// through `Session::broadcast`, which pushes shared frames onto the
// per-client queues while holding the session lock. That single critical
// section is what guarantees every client observes the same frame order.

pub mod config;
pub mod game;
pub mod net;
pub mod queue;
pub mod session;

pub use config::ServerConfig;
pub use net::{start_server, ServerHandle};
