// Test-only game client for end-to-end scenarios.
//
// `TestClient` wraps a real `TcpStream` speaking the real codec — the
// only test-specific machinery is the synchronous, deadline-bounded read
// API. Scenarios in `tests/` start a real server via `start_server` on an
// OS-assigned port and drive it through this client.

use std::collections::BTreeMap;
use std::io::BufReader;
use std::net::{Ipv6Addr, SocketAddr, TcpStream};
use std::time::Duration;

use blastbots_protocol::{
    ByteString, ClientMessage, Event, PlayerId, Score, ServerMessage, Wire,
};
use blastbots_server::{start_server, ServerConfig};

/// Deadline for any single blocking read. A frame that doesn't arrive in
/// this window fails the test instead of hanging it.
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// A small, fast board; tests override what they care about.
pub fn base_config() -> ServerConfig {
    ServerConfig {
        bomb_timer: 2,
        players_count: 1,
        turn_duration: 100,
        explosion_radius: 1,
        initial_blocks: 0,
        game_length: 3,
        server_name: ByteString::try_from("test-server").unwrap(),
        port: 0,
        seed: 1,
        size_x: 4,
        size_y: 4,
    }
}

/// Start a server on a random port and leave its threads running for the
/// rest of the test process. The listener binds the wildcard address, so
/// the returned address is rewritten to loopback for connecting.
pub fn start_test_server(config: ServerConfig) -> SocketAddr {
    let (_handle, addr) = start_server(config).expect("start_server failed");
    SocketAddr::new(Ipv6Addr::LOCALHOST.into(), addr.port())
}

pub struct TestClient {
    reader: BufReader<TcpStream>,
}

impl TestClient {
    pub fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect failed");
        stream.set_nodelay(true).ok();
        stream.set_read_timeout(Some(READ_TIMEOUT)).ok();
        Self {
            reader: BufReader::new(stream),
        }
    }

    pub fn send(&mut self, message: &ClientMessage) {
        let mut stream = self.reader.get_ref();
        message.write_to(&mut stream).expect("send failed");
    }

    pub fn join(&mut self, name: &str) {
        self.send(&ClientMessage::Join {
            name: ByteString::try_from(name).unwrap(),
        });
    }

    /// Read the next frame, failing the test after `READ_TIMEOUT`.
    pub fn recv(&mut self) -> ServerMessage {
        ServerMessage::read_from(&mut self.reader).expect("recv failed")
    }

    pub fn recv_turn(&mut self) -> (u16, Vec<Event>) {
        match self.recv() {
            ServerMessage::Turn { turn, events } => (turn, events),
            other => panic!("expected Turn, got {other:?}"),
        }
    }

    /// Collect turns until `GameEnded`, returning them plus the final
    /// scores. Panics on any other frame kind.
    pub fn drain_game(&mut self) -> (Vec<(u16, Vec<Event>)>, BTreeMap<PlayerId, Score>) {
        let mut turns = Vec::new();
        loop {
            match self.recv() {
                ServerMessage::Turn { turn, events } => turns.push((turn, events)),
                ServerMessage::GameEnded { scores } => return (turns, scores),
                other => panic!("expected Turn or GameEnded, got {other:?}"),
            }
        }
    }
}
