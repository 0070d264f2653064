// GUI link: turns renderer input datagrams into server frames.
//
// Runs on a helper thread. Each datagram is decoded (malformed ones are
// dropped without contacting the server), then translated under the state
// lock: in the lobby any input means "I want to play" and becomes `Join`;
// in-game the three inputs map one-to-one. The TCP write happens while
// the lock is still held — the frame for each datagram is built in a
// fresh buffer and sent whole, so one datagram produces at most one
// frame and a `Join` can never slip out after `GameStarted` landed.

use std::io::Write;
use std::net::{TcpStream, UdpSocket};
use std::sync::{Arc, Mutex};

use blastbots_protocol::{ClientMessage, InputMessage, Wire, MAX_DATAGRAM};
use log::debug;

use crate::state::ClientState;
use crate::ClientError;

pub struct GuiLink {
    gui: Arc<UdpSocket>,
    server: TcpStream,
    state: Arc<Mutex<ClientState>>,
}

impl GuiLink {
    pub fn new(gui: Arc<UdpSocket>, server: TcpStream, state: Arc<Mutex<ClientState>>) -> Self {
        Self { gui, server, state }
    }

    /// Handle GUI datagrams until a socket fails.
    pub fn run(mut self) -> Result<(), ClientError> {
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            let (len, _) = self.gui.recv_from(&mut buf)?;
            let Some(input) = InputMessage::decode(&buf[..len]) else {
                debug!("dropping malformed gui datagram ({len} bytes)");
                continue;
            };

            let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            let message = translate_input(&state, input);
            let mut frame = Vec::new();
            message.write_to(&mut frame)?;
            self.server.write_all(&frame)?;
        }
    }
}

/// Map one GUI input to the server frame it stands for. In the lobby the
/// first thing the user does is read as intent to play.
pub fn translate_input(state: &ClientState, input: InputMessage) -> ClientMessage {
    if state.is_lobby {
        return ClientMessage::Join {
            name: state.player_name.clone(),
        };
    }
    match input {
        InputMessage::PlaceBomb => ClientMessage::PlaceBomb,
        InputMessage::PlaceBlock => ClientMessage::PlaceBlock,
        InputMessage::Move { direction } => ClientMessage::Move { direction },
    }
}

#[cfg(test)]
mod tests {
    use blastbots_protocol::{ByteString, Direction};

    use super::*;

    fn lobby_state() -> ClientState {
        ClientState::new(ByteString::try_from("me").unwrap())
    }

    fn game_state() -> ClientState {
        let mut state = lobby_state();
        state.is_lobby = false;
        state
    }

    #[test]
    fn any_lobby_input_becomes_join() {
        let state = lobby_state();
        for input in [
            InputMessage::PlaceBomb,
            InputMessage::PlaceBlock,
            InputMessage::Move {
                direction: Direction::Down,
            },
        ] {
            match translate_input(&state, input) {
                ClientMessage::Join { name } => {
                    assert_eq!(name, ByteString::try_from("me").unwrap());
                }
                other => panic!("expected Join, got {other:?}"),
            }
        }
    }

    #[test]
    fn game_inputs_map_one_to_one() {
        let state = game_state();
        assert_eq!(
            translate_input(&state, InputMessage::PlaceBomb),
            ClientMessage::PlaceBomb
        );
        assert_eq!(
            translate_input(&state, InputMessage::PlaceBlock),
            ClientMessage::PlaceBlock
        );
        assert_eq!(
            translate_input(
                &state,
                InputMessage::Move {
                    direction: Direction::Left
                }
            ),
            ClientMessage::Move {
                direction: Direction::Left
            }
        );
    }
}
