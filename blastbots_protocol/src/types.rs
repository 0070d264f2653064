// Domain types shared by the server and the client.
//
// The ID types are ordered newtypes: `PlayerId` keys the roster and score
// maps, `BombId` keys the live-bomb map, and map iteration order is wire
// order, so `Ord` on these types is part of the protocol contract.
// `Position` orders by x then y for the same reason (block and explosion
// sets are emitted ascending).

use std::collections::BTreeSet;
use std::io::{Read, Write};

use crate::wire::{self, ByteString, Wire, WireError};

/// Player identifier, assigned sequentially from 0 on lobby admission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub u8);

/// Bomb identifier, assigned sequentially from 0 at game start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BombId(pub u32);

/// Times a player's robot has been destroyed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score(pub u32);

/// A board cell. Valid positions satisfy `x < size_x && y < size_y`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

/// An admitted player: the name it joined with and its remote endpoint as
/// rendered by the TCP stack.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Player {
    pub name: ByteString,
    pub address: ByteString,
}

/// A live bomb. The timer counts turns until detonation; the bomb
/// explodes on the turn its timer reaches 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bomb {
    pub position: Position,
    pub timer: u16,
}

/// A move direction. `Up` is +y.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    pub fn from_u8(val: u8) -> Option<Self> {
        match val {
            0 => Some(Self::Up),
            1 => Some(Self::Right),
            2 => Some(Self::Down),
            3 => Some(Self::Left),
            _ => None,
        }
    }

    /// The (dx, dy) this direction moves by.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, 1),
            Self::Right => (1, 0),
            Self::Down => (0, -1),
            Self::Left => (-1, 0),
        }
    }
}

impl Wire for Direction {
    fn read_from<R: Read>(r: &mut R) -> Result<Self, WireError> {
        let tag = wire::read_u8(r)?;
        Self::from_u8(tag).ok_or(WireError::UnknownTag {
            what: "direction",
            tag,
        })
    }

    fn write_to<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        wire::write_u8(w, *self as u8)
    }
}

impl Wire for PlayerId {
    fn read_from<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self(wire::read_u8(r)?))
    }

    fn write_to<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        wire::write_u8(w, self.0)
    }
}

impl Wire for BombId {
    fn read_from<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self(wire::read_u32(r)?))
    }

    fn write_to<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        wire::write_u32(w, self.0)
    }
}

impl Wire for Score {
    fn read_from<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self(wire::read_u32(r)?))
    }

    fn write_to<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        wire::write_u32(w, self.0)
    }
}

impl Wire for Position {
    fn read_from<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            x: wire::read_u16(r)?,
            y: wire::read_u16(r)?,
        })
    }

    fn write_to<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        wire::write_u16(w, self.x)?;
        wire::write_u16(w, self.y)
    }
}

impl Wire for Player {
    fn read_from<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            name: ByteString::read_from(r)?,
            address: ByteString::read_from(r)?,
        })
    }

    fn write_to<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.name.write_to(w)?;
        self.address.write_to(w)
    }
}

impl Wire for Bomb {
    fn read_from<R: Read>(r: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            position: Position::read_from(r)?,
            timer: wire::read_u16(r)?,
        })
    }

    fn write_to<W: Write>(&self, w: &mut W) -> Result<(), WireError> {
        self.position.write_to(w)?;
        wire::write_u16(w, self.timer)
    }
}

/// Cells affected by a bomb exploding at `center`.
///
/// The explosion is a cross of arm length `radius`, each arm stepped
/// outward from the bomb cell. An arm stops at the board edge (excluding
/// the out-of-bounds cell) and stops at a block after including it — the
/// block absorbs the blast. The bomb's own cell is always included.
///
/// Both the server (to decide what was destroyed) and the client (to
/// highlight the blast for the GUI) evaluate this against their current
/// block set, which is why it lives in the protocol crate.
pub fn explosion_area(
    center: Position,
    radius: u16,
    size_x: u16,
    size_y: u16,
    blocks: &BTreeSet<Position>,
) -> BTreeSet<Position> {
    let mut affected = BTreeSet::new();
    for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
        for r in 0..=i32::from(radius) {
            let x = i32::from(center.x) + dx * r;
            let y = i32::from(center.y) + dy * r;
            if x < 0 || x >= i32::from(size_x) || y < 0 || y >= i32::from(size_y) {
                break;
            }
            let pos = Position {
                x: x as u16,
                y: y as u16,
            };
            affected.insert(pos);
            if blocks.contains(&pos) {
                break;
            }
        }
    }
    affected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: u16, y: u16) -> Position {
        Position { x, y }
    }

    #[test]
    fn position_orders_x_then_y() {
        assert!(pos(0, 9) < pos(1, 0));
        assert!(pos(1, 0) < pos(1, 1));
    }

    #[test]
    fn direction_deltas() {
        assert_eq!(Direction::Up.delta(), (0, 1));
        assert_eq!(Direction::Right.delta(), (1, 0));
        assert_eq!(Direction::Down.delta(), (0, -1));
        assert_eq!(Direction::Left.delta(), (-1, 0));
    }

    #[test]
    fn direction_rejects_out_of_range() {
        assert!(Direction::from_u8(4).is_none());
        let err = Direction::read_from(&mut &[4u8][..]).unwrap_err();
        assert!(matches!(
            err,
            WireError::UnknownTag {
                what: "direction",
                tag: 4
            }
        ));
    }

    #[test]
    fn explosion_is_a_cross() {
        let area = explosion_area(pos(2, 2), 1, 5, 5, &BTreeSet::new());
        let expected: BTreeSet<Position> =
            [pos(2, 2), pos(1, 2), pos(3, 2), pos(2, 1), pos(2, 3)].into();
        assert_eq!(area, expected);
    }

    #[test]
    fn explosion_radius_zero_is_bomb_cell_only() {
        let area = explosion_area(pos(3, 3), 0, 8, 8, &BTreeSet::new());
        assert_eq!(area, BTreeSet::from([pos(3, 3)]));
    }

    #[test]
    fn explosion_clipped_at_board_edge() {
        let area = explosion_area(pos(0, 0), 2, 4, 4, &BTreeSet::new());
        let expected: BTreeSet<Position> =
            [pos(0, 0), pos(1, 0), pos(2, 0), pos(0, 1), pos(0, 2)].into();
        assert_eq!(area, expected);
    }

    #[test]
    fn block_absorbs_blast() {
        // Radius 3, block two cells east of the bomb: the arm includes the
        // block and nothing past it.
        let blocks = BTreeSet::from([pos(4, 2)]);
        let area = explosion_area(pos(2, 2), 3, 10, 10, &blocks);
        assert!(area.contains(&pos(2, 2)));
        assert!(area.contains(&pos(3, 2)));
        assert!(area.contains(&pos(4, 2)));
        assert!(!area.contains(&pos(5, 2)));
        // Other arms reach full length.
        assert!(area.contains(&pos(2, 5)));
    }

    #[test]
    fn block_on_bomb_cell_stops_every_arm() {
        let blocks = BTreeSet::from([pos(2, 2)]);
        let area = explosion_area(pos(2, 2), 3, 10, 10, &blocks);
        assert_eq!(area, BTreeSet::from([pos(2, 2)]));
    }
}
