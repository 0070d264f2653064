// TCP frame vocabulary.
//
// Two enums define the client↔server protocol, plus the `Event` union
// carried inside `Turn` frames. Every frame is a tagged union: one tag
// byte, then the tag-specific payload. An unknown tag is a hard decode
// error — on TCP there is no resynchronization, so the reading side tears
// the connection down.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use crate::types::{BombId, Direction, Player, PlayerId, Position, Score};
use crate::wire::{self, ByteString, Wire, WireError};

/// Messages sent by a client to the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientMessage {
    /// Ask to be admitted to the lobby.
    Join { name: ByteString },
    /// Drop a bomb on the robot's current cell.
    PlaceBomb,
    /// Put a block on the robot's current cell.
    PlaceBlock,
    /// Step one cell in `direction`.
    Move { direction: Direction },
}

/// Messages broadcast by the server to every connected client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerMessage {
    /// Session parameters, sent first on every connection.
    Hello {
        server_name: ByteString,
        players_count: u8,
        size_x: u16,
        size_y: u16,
        game_length: u16,
        explosion_radius: u16,
        bomb_timer: u16,
    },
    /// A client was admitted to the lobby.
    AcceptedPlayer { id: PlayerId, player: Player },
    /// The lobby filled up; the game begins.
    GameStarted {
        players: BTreeMap<PlayerId, Player>,
    },
    /// One turn's worth of events.
    Turn { turn: u16, events: Vec<Event> },
    /// The game is over; back to the lobby.
    GameEnded {
        scores: BTreeMap<PlayerId, Score>,
    },
}

/// Something that happened during one turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    BombPlaced {
        id: BombId,
        position: Position,
    },
    BombExploded {
        id: BombId,
        robots_destroyed: Vec<PlayerId>,
        blocks_destroyed: Vec<Position>,
    },
    PlayerMoved {
        id: PlayerId,
        position: Position,
    },
    BlockPlaced {
        position: Position,
    },
}

impl Wire for ClientMessage {
    fn read_from<R: Read>(r: &mut R) -> Result<Self, WireError> {
        match wire::read_u8(r)? {
            0 => Ok(Self::Join {
                name: ByteString::read_from(r)?,
            }),
            1 => Ok(Self::PlaceBomb),
            2 => Ok(Self::PlaceBlock),
            3 => Ok(Self::Move {
                direction: Direction::read_from(r)?,
            }),
            tag => Err(WireError::UnknownTag {
                what: "client message",
                tag,
            }),
        }
    }

    fn write_to<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        match self {
            Self::Join { name } => {
                wire::write_u8(w, 0)?;
                name.write_to(w)
            }
            Self::PlaceBomb => wire::write_u8(w, 1),
            Self::PlaceBlock => wire::write_u8(w, 2),
            Self::Move { direction } => {
                wire::write_u8(w, 3)?;
                direction.write_to(w)
            }
        }
    }
}

impl Wire for ServerMessage {
    fn read_from<R: Read>(r: &mut R) -> Result<Self, WireError> {
        match wire::read_u8(r)? {
            0 => Ok(Self::Hello {
                server_name: ByteString::read_from(r)?,
                players_count: wire::read_u8(r)?,
                size_x: wire::read_u16(r)?,
                size_y: wire::read_u16(r)?,
                game_length: wire::read_u16(r)?,
                explosion_radius: wire::read_u16(r)?,
                bomb_timer: wire::read_u16(r)?,
            }),
            1 => Ok(Self::AcceptedPlayer {
                id: PlayerId::read_from(r)?,
                player: Player::read_from(r)?,
            }),
            2 => Ok(Self::GameStarted {
                players: wire::read_map(r)?,
            }),
            3 => Ok(Self::Turn {
                turn: wire::read_u16(r)?,
                events: wire::read_list(r)?,
            }),
            4 => Ok(Self::GameEnded {
                scores: wire::read_map(r)?,
            }),
            tag => Err(WireError::UnknownTag {
                what: "server message",
                tag,
            }),
        }
    }

    fn write_to<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        match self {
            Self::Hello {
                server_name,
                players_count,
                size_x,
                size_y,
                game_length,
                explosion_radius,
                bomb_timer,
            } => {
                wire::write_u8(w, 0)?;
                server_name.write_to(w)?;
                wire::write_u8(w, *players_count)?;
                wire::write_u16(w, *size_x)?;
                wire::write_u16(w, *size_y)?;
                wire::write_u16(w, *game_length)?;
                wire::write_u16(w, *explosion_radius)?;
                wire::write_u16(w, *bomb_timer)
            }
            Self::AcceptedPlayer { id, player } => {
                wire::write_u8(w, 1)?;
                id.write_to(w)?;
                player.write_to(w)
            }
            Self::GameStarted { players } => {
                wire::write_u8(w, 2)?;
                wire::write_map(w, players)
            }
            Self::Turn { turn, events } => {
                wire::write_u8(w, 3)?;
                wire::write_u16(w, *turn)?;
                wire::write_list(w, events)
            }
            Self::GameEnded { scores } => {
                wire::write_u8(w, 4)?;
                wire::write_map(w, scores)
            }
        }
    }
}

impl Wire for Event {
    fn read_from<R: Read>(r: &mut R) -> Result<Self, WireError> {
        match wire::read_u8(r)? {
            0 => Ok(Self::BombPlaced {
                id: BombId::read_from(r)?,
                position: Position::read_from(r)?,
            }),
            1 => Ok(Self::BombExploded {
                id: BombId::read_from(r)?,
                robots_destroyed: wire::read_list(r)?,
                blocks_destroyed: wire::read_list(r)?,
            }),
            2 => Ok(Self::PlayerMoved {
                id: PlayerId::read_from(r)?,
                position: Position::read_from(r)?,
            }),
            3 => Ok(Self::BlockPlaced {
                position: Position::read_from(r)?,
            }),
            tag => Err(WireError::UnknownTag { what: "event", tag }),
        }
    }

    fn write_to<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        match self {
            Self::BombPlaced { id, position } => {
                wire::write_u8(w, 0)?;
                id.write_to(w)?;
                position.write_to(w)
            }
            Self::BombExploded {
                id,
                robots_destroyed,
                blocks_destroyed,
            } => {
                wire::write_u8(w, 1)?;
                id.write_to(w)?;
                wire::write_list(w, robots_destroyed)?;
                wire::write_list(w, blocks_destroyed)
            }
            Self::PlayerMoved { id, position } => {
                wire::write_u8(w, 2)?;
                id.write_to(w)?;
                position.write_to(w)
            }
            Self::BlockPlaced { position } => {
                wire::write_u8(w, 3)?;
                position.write_to(w)
            }
        }
    }
}
