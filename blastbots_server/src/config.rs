// Server configuration, filled in by the CLI in `main.rs`.

use blastbots_protocol::ByteString;

/// Everything the server needs to run a session. All numeric options are
/// validated to `(0, type_max]` by the CLI, except `explosion_radius` and
/// `initial_blocks` which may be zero.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Turns until a placed bomb explodes.
    pub bomb_timer: u16,
    /// Exact number of players a game needs.
    pub players_count: u8,
    /// Turn length in milliseconds.
    pub turn_duration: u64,
    /// Arm length of the explosion cross.
    pub explosion_radius: u16,
    /// Blocks the server scatters at game start.
    pub initial_blocks: u16,
    /// Turns per game.
    pub game_length: u16,
    /// Name announced in `Hello`, at most 255 bytes.
    pub server_name: ByteString,
    /// TCP listen port. Port 0 lets the OS pick (used by tests).
    pub port: u16,
    /// Seed for the deterministic board generator.
    pub seed: u32,
    pub size_x: u16,
    pub size_y: u16,
}
