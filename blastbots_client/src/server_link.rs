// Server link: reads frames from the game server, applies them to the
// derived view, and pushes a snapshot to the GUI after every
// state-changing frame.
//
// `apply_server_message` is a pure function over `ClientState` so the
// event-application engine can be tested without sockets; `ServerLink`
// wraps it in the blocking read loop. Every frame is applied and its
// snapshot sent under one acquisition of the state lock.
//
// On `BombExploded` the client recomputes the blast cross locally instead
// of trusting the destroyed-blocks list to cover the affected area: the
// wire carries only casualties, while `explosions` — the cells the GUI
// highlights — is derived from the bomb's stored position against the
// current block set, with the same geometry the server used.

use std::io::BufReader;
use std::net::{SocketAddr, TcpStream, UdpSocket};
use std::sync::{Arc, Mutex};

use blastbots_protocol::{explosion_area, Bomb, Event, ServerMessage, Wire};
use log::debug;

use crate::state::ClientState;
use crate::ClientError;

pub struct ServerLink {
    reader: BufReader<TcpStream>,
    gui: Arc<UdpSocket>,
    gui_addr: SocketAddr,
    state: Arc<Mutex<ClientState>>,
}

impl ServerLink {
    pub fn new(
        server: TcpStream,
        gui: Arc<UdpSocket>,
        gui_addr: SocketAddr,
        state: Arc<Mutex<ClientState>>,
    ) -> Self {
        Self {
            reader: BufReader::new(server),
            gui,
            gui_addr,
            state,
        }
    }

    /// Handle server frames until the connection dies. Never returns
    /// `Ok`; the first fault is the end of the session.
    pub fn run(mut self) -> Result<(), ClientError> {
        loop {
            let message = ServerMessage::read_from(&mut self.reader)?;
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if apply_server_message(&mut state, message) {
                let datagram = state.snapshot()?;
                self.gui.send_to(&datagram, self.gui_addr)?;
            }
        }
    }
}

/// Apply one server frame to the derived view. Returns whether a
/// snapshot should be sent — `GameStarted` stays silent because the first
/// `Turn` immediately follows with the initial board.
pub fn apply_server_message(state: &mut ClientState, message: ServerMessage) -> bool {
    match message {
        ServerMessage::Hello {
            server_name,
            players_count,
            size_x,
            size_y,
            game_length,
            explosion_radius,
            bomb_timer,
        } => {
            state.server_name = server_name;
            state.players_count = players_count;
            state.size_x = size_x;
            state.size_y = size_y;
            state.game_length = game_length;
            state.explosion_radius = explosion_radius;
            state.bomb_timer = bomb_timer;
            true
        }
        ServerMessage::AcceptedPlayer { id, player } => {
            debug!("player {} accepted: {}", id.0, player.name);
            state.players.insert(id, player);
            true
        }
        ServerMessage::GameStarted { players } => {
            state.scores.clear();
            state.blocks.clear();
            state.bombs.clear();
            state.explosions.clear();

            state.is_lobby = false;
            state.scores = players.keys().map(|id| (*id, Default::default())).collect();
            state.players = players;
            false
        }
        ServerMessage::Turn { turn, events } => {
            state.turn = turn;
            state.explosions.clear();
            state.robots_destroyed_in_turn.clear();
            state.blocks_destroyed_in_turn.clear();

            for bomb in state.bombs.values_mut() {
                bomb.timer = bomb.timer.saturating_sub(1);
            }
            for event in events {
                apply_event(state, event);
            }

            // Aftermath, once every event of the turn is in.
            let ClientState {
                scores,
                blocks,
                robots_destroyed_in_turn,
                blocks_destroyed_in_turn,
                ..
            } = state;
            for id in robots_destroyed_in_turn.iter() {
                scores.entry(*id).or_default().0 += 1;
            }
            for position in blocks_destroyed_in_turn.iter() {
                blocks.remove(position);
            }
            true
        }
        ServerMessage::GameEnded { scores } => {
            state.is_lobby = true;
            state.scores = scores;
            state.players.clear();
            state.blocks.clear();
            state.bombs.clear();
            state.explosions.clear();
            true
        }
    }
}

fn apply_event(state: &mut ClientState, event: Event) {
    match event {
        Event::BombPlaced { id, position } => {
            state.bombs.insert(
                id,
                Bomb {
                    position,
                    timer: state.bomb_timer,
                },
            );
        }
        Event::BombExploded {
            id,
            robots_destroyed,
            blocks_destroyed,
        } => {
            if let Some(bomb) = state.bombs.get(&id) {
                let affected = explosion_area(
                    bomb.position,
                    state.explosion_radius,
                    state.size_x,
                    state.size_y,
                    &state.blocks,
                );
                state.explosions.extend(affected);
            }
            for position in blocks_destroyed {
                state.blocks_destroyed_in_turn.insert(position);
            }
            for player in robots_destroyed {
                state.robots_destroyed_in_turn.insert(player);
                state.player_positions.remove(&player);
            }
            state.bombs.remove(&id);
        }
        Event::PlayerMoved { id, position } => {
            state.player_positions.insert(id, position);
        }
        Event::BlockPlaced { position } => {
            state.blocks.insert(position);
        }
    }
}
