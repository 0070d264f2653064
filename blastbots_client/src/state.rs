// The derived view of the world, rebuilt from the server's event stream.
//
// `ClientState` holds everything the GUI is ever shown. The snapshot
// encoder is a pure function of the state: two clients that applied the
// same frame sequence produce byte-identical datagrams, which is the
// client-side half of the protocol's determinism contract.
//
// The two `*_destroyed_in_turn` sets are transient accumulators, live
// only while one `Turn` frame is being applied: explosion events record
// casualties into them, and the aftermath (score bumps, block removal) is
// applied once all events are in, mirroring the server's own ordering.

use std::collections::{BTreeMap, BTreeSet};

use blastbots_protocol::gui::{MAX_DATAGRAM, SNAPSHOT_GAME, SNAPSHOT_LOBBY};
use blastbots_protocol::{
    wire, Bomb, BombId, ByteString, Player, PlayerId, Position, Score, Wire, WireError,
};

#[derive(Debug)]
pub struct ClientState {
    /// Name sent in `Join` when the user first acts in the lobby.
    pub player_name: ByteString,
    pub is_lobby: bool,

    // Server parameters from Hello.
    pub server_name: ByteString,
    pub players_count: u8,
    pub size_x: u16,
    pub size_y: u16,
    pub game_length: u16,
    pub explosion_radius: u16,
    pub bomb_timer: u16,

    // In-game view.
    pub turn: u16,
    pub players: BTreeMap<PlayerId, Player>,
    pub player_positions: BTreeMap<PlayerId, Position>,
    pub blocks: BTreeSet<Position>,
    pub bombs: BTreeMap<BombId, Bomb>,
    pub explosions: BTreeSet<Position>,
    pub scores: BTreeMap<PlayerId, Score>,

    // Scratch, valid only while applying one Turn.
    pub robots_destroyed_in_turn: BTreeSet<PlayerId>,
    pub blocks_destroyed_in_turn: BTreeSet<Position>,
}

impl ClientState {
    pub fn new(player_name: ByteString) -> Self {
        Self {
            player_name,
            is_lobby: true,
            server_name: ByteString::default(),
            players_count: 0,
            size_x: 0,
            size_y: 0,
            game_length: 0,
            explosion_radius: 0,
            bomb_timer: 0,
            turn: 0,
            players: BTreeMap::new(),
            player_positions: BTreeMap::new(),
            blocks: BTreeSet::new(),
            bombs: BTreeMap::new(),
            explosions: BTreeSet::new(),
            scores: BTreeMap::new(),
            robots_destroyed_in_turn: BTreeSet::new(),
            blocks_destroyed_in_turn: BTreeSet::new(),
        }
    }

    /// Encode the snapshot datagram for the current phase.
    pub fn snapshot(&self) -> Result<Vec<u8>, WireError> {
        let mut buf = Vec::new();
        if self.is_lobby {
            self.encode_lobby(&mut buf)?;
        } else {
            self.encode_game(&mut buf)?;
        }
        if buf.len() > MAX_DATAGRAM {
            return Err(WireError::DatagramTooLarge(buf.len()));
        }
        Ok(buf)
    }

    fn encode_lobby(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        wire::write_u8(buf, SNAPSHOT_LOBBY)?;
        self.server_name.write_to(buf)?;
        wire::write_u8(buf, self.players_count)?;
        wire::write_u16(buf, self.size_x)?;
        wire::write_u16(buf, self.size_y)?;
        wire::write_u16(buf, self.game_length)?;
        wire::write_u16(buf, self.explosion_radius)?;
        wire::write_u16(buf, self.bomb_timer)?;
        wire::write_map(buf, &self.players)
    }

    fn encode_game(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        wire::write_u8(buf, SNAPSHOT_GAME)?;
        self.server_name.write_to(buf)?;
        wire::write_u16(buf, self.size_x)?;
        wire::write_u16(buf, self.size_y)?;
        wire::write_u16(buf, self.game_length)?;
        wire::write_u16(buf, self.turn)?;
        wire::write_map(buf, &self.players)?;
        wire::write_map(buf, &self.player_positions)?;
        wire::write_set(buf, &self.blocks)?;
        // Bombs go out as a list of values in BombId order; the ids are
        // not part of the GUI format.
        #[expect(clippy::cast_possible_truncation)]
        let bomb_count = self.bombs.len() as u32;
        wire::write_u32(buf, bomb_count)?;
        for bomb in self.bombs.values() {
            bomb.write_to(buf)?;
        }
        wire::write_set(buf, &self.explosions)?;
        wire::write_map(buf, &self.scores)
    }
}
