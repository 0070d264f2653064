// The game manager: a single thread driving the lobby→game→lobby cycle.
//
// One turn is produced in a strict order, and that order is the
// determinism contract — same seed, same intents, same byte stream:
//
//   1. sleep `turn_duration`
//   2. snapshot the latest intent per admitted player
//   3. detonate bombs whose timer reached 1 (ascending `BombId`),
//      computing each blast against the pre-destruction board, then apply
//      the aftermath (scores, removals) once all explosion events are out
//   4. interpret intents in ascending `PlayerId` order, surviving robots
//      only
//   5. respawn destroyed robots in ascending `PlayerId` order
//
// All randomness flows through the MINSTD generator, and every placement
// draws x before y. The manager owns `GameState` exclusively; it reaches
// the rest of the world only through `Session`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use blastbots_prng::GameRng;
use blastbots_protocol::{
    explosion_area, Bomb, BombId, ClientMessage, Direction, Event, Player, PlayerId, Position,
    Score,
};
use log::info;

use crate::config::ServerConfig;
use crate::session::Session;

/// Board state for one game, owned by the manager thread.
#[derive(Debug, Default)]
struct GameState {
    bombs: BTreeMap<BombId, Bomb>,
    blocks: BTreeSet<Position>,
    player_positions: BTreeMap<PlayerId, Position>,
    scores: BTreeMap<PlayerId, Score>,
    next_bomb_id: BombId,
}

pub struct GameManager {
    config: ServerConfig,
    session: Arc<Session>,
    rng: GameRng,
}

impl GameManager {
    pub fn new(config: ServerConfig, session: Arc<Session>) -> Self {
        let rng = GameRng::new(config.seed);
        Self {
            config,
            session,
            rng,
        }
    }

    /// Run sessions forever: wait out the lobby, play `game_length`
    /// turns, publish the scores, repeat.
    pub fn run(&mut self) {
        loop {
            let players = self.session.wait_for_players();
            info!("game started with {} players", players.len());

            let mut state = GameState::default();
            let mut events = Vec::new();
            state.scores = players.keys().map(|id| (*id, Score(0))).collect();
            self.respawn_missing(&players, &mut state, &mut events);
            self.place_initial_blocks(&mut state, &mut events);
            self.session.close_turn(0, events);

            for turn in 1..=self.config.game_length {
                thread::sleep(Duration::from_millis(self.config.turn_duration));
                let intents = self.session.collect_intents();

                let mut events = Vec::new();
                self.update_bombs(&mut state, &mut events);
                self.interpret_intents(intents, &mut state, &mut events);
                self.respawn_missing(&players, &mut state, &mut events);
                self.session.close_turn(turn, events);
            }

            info!("game over: {:?}", state.scores);
            self.session.end_game(state.scores);
        }
    }

    /// One board draw: x first, then y.
    fn random_position(&mut self) -> Position {
        let x = (self.rng.next_u32() % u32::from(self.config.size_x)) as u16;
        let y = (self.rng.next_u32() % u32::from(self.config.size_y)) as u16;
        Position { x, y }
    }

    /// Put a robot on the board for every player that lacks one, in
    /// ascending `PlayerId` order. Covers both the initial placement and
    /// per-turn respawns.
    fn respawn_missing(
        &mut self,
        players: &BTreeMap<PlayerId, Player>,
        state: &mut GameState,
        events: &mut Vec<Event>,
    ) {
        for id in players.keys() {
            if !state.player_positions.contains_key(id) {
                let position = self.random_position();
                state.player_positions.insert(*id, position);
                events.push(Event::PlayerMoved { id: *id, position });
            }
        }
    }

    /// Scatter exactly `initial_blocks` blocks. Duplicate draws collapse
    /// in the set but still emit a `BlockPlaced` each — the event stream
    /// mirrors the draws, not the resulting set.
    fn place_initial_blocks(&mut self, state: &mut GameState, events: &mut Vec<Event>) {
        for _ in 0..self.config.initial_blocks {
            let position = self.random_position();
            state.blocks.insert(position);
            events.push(Event::BlockPlaced { position });
        }
    }

    /// Tick every bomb. Bombs at timer 1 detonate: each blast is computed
    /// against the board as it stood at the start of the turn, so two
    /// bombs exploding together both see the same blocks and robots. The
    /// aftermath — score increments, robot and block removal — lands only
    /// after every `BombExploded` event has been emitted.
    fn update_bombs(&mut self, state: &mut GameState, events: &mut Vec<Event>) {
        let mut robots_destroyed = BTreeSet::new();
        let mut blocks_destroyed = BTreeSet::new();
        let mut exploded = Vec::new();

        let bombs = &mut state.bombs;
        let blocks = &state.blocks;
        let player_positions = &state.player_positions;
        for (id, bomb) in bombs.iter_mut() {
            if bomb.timer > 1 {
                bomb.timer -= 1;
                continue;
            }

            let affected = explosion_area(
                bomb.position,
                self.config.explosion_radius,
                self.config.size_x,
                self.config.size_y,
                blocks,
            );
            let robots: Vec<PlayerId> = player_positions
                .iter()
                .filter(|(_, pos)| affected.contains(pos))
                .map(|(id, _)| *id)
                .collect();
            let hit_blocks: Vec<Position> = affected
                .iter()
                .filter(|pos| blocks.contains(pos))
                .copied()
                .collect();

            robots_destroyed.extend(robots.iter().copied());
            blocks_destroyed.extend(hit_blocks.iter().copied());
            exploded.push(*id);
            events.push(Event::BombExploded {
                id: *id,
                robots_destroyed: robots,
                blocks_destroyed: hit_blocks,
            });
        }

        for id in &robots_destroyed {
            state.scores.entry(*id).or_default().0 += 1;
            state.player_positions.remove(id);
        }
        for position in &blocks_destroyed {
            state.blocks.remove(position);
        }
        for id in exploded {
            state.bombs.remove(&id);
        }
    }

    /// Apply the collected intents in ascending `PlayerId` order. A
    /// player whose robot was destroyed this turn sits the turn out.
    fn interpret_intents(
        &mut self,
        intents: BTreeMap<PlayerId, ClientMessage>,
        state: &mut GameState,
        events: &mut Vec<Event>,
    ) {
        for (id, intent) in intents {
            let Some(&position) = state.player_positions.get(&id) else {
                continue;
            };
            match intent {
                // Join cannot occur mid-game; the collector only maps
                // admitted players, but keep the arm harmless.
                ClientMessage::Join { .. } => {}
                ClientMessage::PlaceBomb => {
                    let bomb_id = state.next_bomb_id;
                    state.next_bomb_id = BombId(bomb_id.0 + 1);
                    state.bombs.insert(
                        bomb_id,
                        Bomb {
                            position,
                            timer: self.config.bomb_timer,
                        },
                    );
                    events.push(Event::BombPlaced {
                        id: bomb_id,
                        position,
                    });
                }
                ClientMessage::PlaceBlock => {
                    if state.blocks.insert(position) {
                        events.push(Event::BlockPlaced { position });
                    }
                }
                ClientMessage::Move { direction } => {
                    self.move_player(id, position, direction, state, events);
                }
            }
        }
    }

    /// Step one cell if the target is on the board and unobstructed;
    /// otherwise the intent is silently ignored.
    fn move_player(
        &self,
        id: PlayerId,
        from: Position,
        direction: Direction,
        state: &mut GameState,
        events: &mut Vec<Event>,
    ) {
        let (dx, dy) = direction.delta();
        let x = i32::from(from.x) + dx;
        let y = i32::from(from.y) + dy;
        if x < 0 || x >= i32::from(self.config.size_x) || y < 0 || y >= i32::from(self.config.size_y)
        {
            return;
        }
        let target = Position {
            x: x as u16,
            y: y as u16,
        };
        if state.blocks.contains(&target) {
            return;
        }
        state.player_positions.insert(id, target);
        events.push(Event::PlayerMoved {
            id,
            position: target,
        });
    }
}

#[cfg(test)]
mod tests {
    use blastbots_protocol::{ByteString, Direction};

    use super::*;

    fn config(size_x: u16, size_y: u16, radius: u16, bomb_timer: u16) -> ServerConfig {
        ServerConfig {
            bomb_timer,
            players_count: 2,
            turn_duration: 10,
            explosion_radius: radius,
            initial_blocks: 0,
            game_length: 5,
            server_name: ByteString::try_from("test").unwrap(),
            port: 0,
            seed: 42,
            size_x,
            size_y,
        }
    }

    fn manager(config: ServerConfig) -> GameManager {
        let session = Arc::new(Session::new(config.clone()));
        GameManager::new(config, session)
    }

    fn pos(x: u16, y: u16) -> Position {
        Position { x, y }
    }

    fn players(n: u8) -> BTreeMap<PlayerId, Player> {
        (0..n).map(|i| (PlayerId(i), Player::default())).collect()
    }

    #[test]
    fn initial_placement_draws_match_generator() {
        let mut gm = manager(config(4, 4, 1, 2));
        let mut state = GameState::default();
        let mut events = Vec::new();
        gm.respawn_missing(&players(1), &mut state, &mut events);

        let mut rng = GameRng::new(42);
        let expected = pos(
            (rng.next_u32() % 4) as u16,
            (rng.next_u32() % 4) as u16,
        );
        assert_eq!(
            events,
            vec![Event::PlayerMoved {
                id: PlayerId(0),
                position: expected
            }]
        );
        assert_eq!(state.player_positions[&PlayerId(0)], expected);
    }

    #[test]
    fn every_block_draw_emits_an_event() {
        // 1x1 board: all draws land on (0, 0); the set absorbs them but
        // the event stream reports each one.
        let mut cfg = config(1, 1, 0, 2);
        cfg.initial_blocks = 3;
        let mut gm = manager(cfg);
        let mut state = GameState::default();
        let mut events = Vec::new();
        gm.place_initial_blocks(&mut state, &mut events);

        assert_eq!(events.len(), 3);
        assert_eq!(state.blocks.len(), 1);
        assert!(events
            .iter()
            .all(|e| matches!(e, Event::BlockPlaced { position } if *position == pos(0, 0))));
    }

    #[test]
    fn bomb_timers_tick_down_then_explode() {
        let mut gm = manager(config(5, 5, 0, 3));
        let mut state = GameState::default();
        state.bombs.insert(
            BombId(0),
            Bomb {
                position: pos(2, 2),
                timer: 2,
            },
        );

        let mut events = Vec::new();
        gm.update_bombs(&mut state, &mut events);
        assert!(events.is_empty());
        assert_eq!(state.bombs[&BombId(0)].timer, 1);

        gm.update_bombs(&mut state, &mut events);
        assert_eq!(
            events,
            vec![Event::BombExploded {
                id: BombId(0),
                robots_destroyed: Vec::new(),
                blocks_destroyed: Vec::new(),
            }]
        );
        assert!(state.bombs.is_empty());
    }

    #[test]
    fn blast_destroys_robots_in_radius_and_scores_them() {
        let mut gm = manager(config(5, 5, 2, 2));
        let mut state = GameState::default();
        state.scores = [(PlayerId(0), Score(0)), (PlayerId(1), Score(0))].into();
        // Player 0 sits on the bomb, player 1 two cells into its row.
        state.player_positions.insert(PlayerId(0), pos(1, 1));
        state.player_positions.insert(PlayerId(1), pos(3, 1));
        state.bombs.insert(
            BombId(0),
            Bomb {
                position: pos(1, 1),
                timer: 1,
            },
        );

        let mut events = Vec::new();
        gm.update_bombs(&mut state, &mut events);

        assert_eq!(
            events,
            vec![Event::BombExploded {
                id: BombId(0),
                robots_destroyed: vec![PlayerId(0), PlayerId(1)],
                blocks_destroyed: Vec::new(),
            }]
        );
        assert!(state.player_positions.is_empty());
        assert_eq!(state.scores[&PlayerId(0)], Score(1));
        assert_eq!(state.scores[&PlayerId(1)], Score(1));

        // Both respawn in the same turn, after the explosion.
        gm.respawn_missing(&players(2), &mut state, &mut events);
        assert_eq!(events.len(), 3);
        assert!(matches!(events[1], Event::PlayerMoved { id: PlayerId(0), .. }));
        assert!(matches!(events[2], Event::PlayerMoved { id: PlayerId(1), .. }));
    }

    #[test]
    fn destroyed_block_absorbs_and_is_reported() {
        let mut gm = manager(config(10, 10, 3, 2));
        let mut state = GameState::default();
        state.blocks.insert(pos(4, 2));
        state.blocks.insert(pos(6, 2)); // shadowed by the one at x=4
        state.bombs.insert(
            BombId(0),
            Bomb {
                position: pos(2, 2),
                timer: 1,
            },
        );

        let mut events = Vec::new();
        gm.update_bombs(&mut state, &mut events);

        match &events[0] {
            Event::BombExploded {
                blocks_destroyed, ..
            } => assert_eq!(blocks_destroyed, &vec![pos(4, 2)]),
            other => panic!("expected BombExploded, got {other:?}"),
        }
        assert!(!state.blocks.contains(&pos(4, 2)));
        assert!(state.blocks.contains(&pos(6, 2)));
    }

    #[test]
    fn simultaneous_blasts_see_the_same_board() {
        // Two bombs explode in one turn; the robot between them shows up
        // in both destroyed lists but scores only once.
        let mut gm = manager(config(7, 7, 2, 2));
        let mut state = GameState::default();
        state.scores.insert(PlayerId(0), Score(0));
        state.player_positions.insert(PlayerId(0), pos(3, 3));
        state.bombs.insert(
            BombId(0),
            Bomb {
                position: pos(2, 3),
                timer: 1,
            },
        );
        state.bombs.insert(
            BombId(1),
            Bomb {
                position: pos(4, 3),
                timer: 1,
            },
        );

        let mut events = Vec::new();
        gm.update_bombs(&mut state, &mut events);

        assert_eq!(events.len(), 2);
        for event in &events {
            match event {
                Event::BombExploded {
                    robots_destroyed, ..
                } => assert_eq!(robots_destroyed, &vec![PlayerId(0)]),
                other => panic!("expected BombExploded, got {other:?}"),
            }
        }
        assert_eq!(state.scores[&PlayerId(0)], Score(1));
    }

    #[test]
    fn place_bomb_assigns_sequential_ids() {
        let mut gm = manager(config(5, 5, 1, 4));
        let mut state = GameState::default();
        state.player_positions.insert(PlayerId(0), pos(2, 2));

        let mut events = Vec::new();
        gm.interpret_intents(
            [(PlayerId(0), ClientMessage::PlaceBomb)].into(),
            &mut state,
            &mut events,
        );
        gm.interpret_intents(
            [(PlayerId(0), ClientMessage::PlaceBomb)].into(),
            &mut state,
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::BombPlaced {
                    id: BombId(0),
                    position: pos(2, 2)
                },
                Event::BombPlaced {
                    id: BombId(1),
                    position: pos(2, 2)
                },
            ]
        );
        assert_eq!(state.bombs[&BombId(0)].timer, 4);
    }

    #[test]
    fn place_block_on_occupied_cell_ignored() {
        let mut gm = manager(config(5, 5, 1, 2));
        let mut state = GameState::default();
        state.player_positions.insert(PlayerId(0), pos(2, 2));
        state.blocks.insert(pos(2, 2));

        let mut events = Vec::new();
        gm.interpret_intents(
            [(PlayerId(0), ClientMessage::PlaceBlock)].into(),
            &mut state,
            &mut events,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn move_off_board_ignored() {
        let mut gm = manager(config(3, 3, 1, 2));
        let mut state = GameState::default();
        state.player_positions.insert(PlayerId(0), pos(0, 0));

        let mut events = Vec::new();
        gm.interpret_intents(
            [(
                PlayerId(0),
                ClientMessage::Move {
                    direction: Direction::Left,
                },
            )]
            .into(),
            &mut state,
            &mut events,
        );
        assert!(events.is_empty());
        assert_eq!(state.player_positions[&PlayerId(0)], pos(0, 0));
    }

    #[test]
    fn move_up_is_plus_y() {
        let mut gm = manager(config(3, 3, 1, 2));
        let mut state = GameState::default();
        state.player_positions.insert(PlayerId(0), pos(0, 0));

        let mut events = Vec::new();
        gm.interpret_intents(
            [(
                PlayerId(0),
                ClientMessage::Move {
                    direction: Direction::Up,
                },
            )]
            .into(),
            &mut state,
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::PlayerMoved {
                id: PlayerId(0),
                position: pos(0, 1)
            }]
        );
    }

    #[test]
    fn move_into_block_ignored() {
        let mut gm = manager(config(3, 3, 1, 2));
        let mut state = GameState::default();
        state.player_positions.insert(PlayerId(0), pos(0, 0));
        state.blocks.insert(pos(1, 0));

        let mut events = Vec::new();
        gm.interpret_intents(
            [(
                PlayerId(0),
                ClientMessage::Move {
                    direction: Direction::Right,
                },
            )]
            .into(),
            &mut state,
            &mut events,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn destroyed_robot_sits_out_the_turn() {
        let mut gm = manager(config(5, 5, 0, 2));
        let mut state = GameState::default();
        state.scores.insert(PlayerId(0), Score(0));
        state.player_positions.insert(PlayerId(0), pos(2, 2));
        state.bombs.insert(
            BombId(0),
            Bomb {
                position: pos(2, 2),
                timer: 1,
            },
        );

        let mut events = Vec::new();
        gm.update_bombs(&mut state, &mut events);
        gm.interpret_intents(
            [(
                PlayerId(0),
                ClientMessage::Move {
                    direction: Direction::Up,
                },
            )]
            .into(),
            &mut state,
            &mut events,
        );

        // Only the explosion; the dead robot's move is dropped.
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn mid_game_join_intent_is_a_no_op() {
        let mut gm = manager(config(5, 5, 1, 2));
        let mut state = GameState::default();
        state.player_positions.insert(PlayerId(0), pos(2, 2));

        let mut events = Vec::new();
        gm.interpret_intents(
            [(
                PlayerId(0),
                ClientMessage::Join {
                    name: ByteString::try_from("ghost").unwrap(),
                },
            )]
            .into(),
            &mut state,
            &mut events,
        );
        assert!(events.is_empty());
    }
}
