// blastbots_client — the proxy between the game server and a GUI.
//
// The client speaks the binary TCP protocol to the authoritative server
// and UDP to a local renderer. It keeps a derived view of the world,
// rebuilt deterministically from the server's event stream, and pushes a
// full snapshot datagram to the GUI after every state-changing frame.
//
// Module overview:
// - `state.rs`:       `ClientState` — the derived view plus its snapshot
//                     encoder (the GUI wire format).
// - `server_link.rs`: Applies server frames to the state and emits
//                     snapshots. Runs on the main thread.
// - `gui_link.rs`:    Translates GUI input datagrams into server frames,
//                     gated on the lobby flag. Runs on a helper thread.
//
// Both handlers share one `Mutex<ClientState>` and hold it for the whole
// of one message — including the outbound send — so a `Join` can never be
// emitted after a `GameStarted` has been applied.
//
// Error policy: the client has no isolation boundary. Any server-link or
// GUI-socket fault is fatal and the process exits non-zero; only inbound
// GUI datagrams that fail to parse are dropped silently.

pub mod gui_link;
pub mod server_link;
pub mod state;

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::sync::{Arc, Mutex};
use std::thread;

use blastbots_protocol::{ByteString, WireError};
use log::{error, info};
use thiserror::Error;

use gui_link::GuiLink;
use server_link::ServerLink;
use state::ClientState;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("server link: {0}")]
    Wire(#[from] WireError),
    #[error("i/o: {0}")]
    Io(#[from] io::Error),
    #[error("cannot resolve {0}")]
    Resolve(String),
}

/// Validated client configuration; address strings are already split into
/// host and port by the CLI.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub gui_host: String,
    pub gui_port: u16,
    pub player_name: ByteString,
    /// Local UDP port to receive GUI input on. Port 0 lets the OS pick.
    pub port: u16,
    pub server_host: String,
    pub server_port: u16,
}

/// Split `host:port` at the last colon, so bare IPv6 literals work as
/// hosts. Returns `None` when the port part is missing or unparsable.
pub fn split_host_port(s: &str) -> Option<(String, u16)> {
    let (host, port) = s.rsplit_once(':')?;
    let port = port.parse().ok()?;
    Some((host.to_string(), port))
}

/// Connect to the server and GUI, then run both handlers until one
/// fails. The GUI handler runs on a helper thread and kills the process
/// on error (the client has no recovery path); the server handler runs on
/// the calling thread and returns its error for `main` to report.
pub fn run(config: ClientConfig) -> Result<(), ClientError> {
    let server = TcpStream::connect((config.server_host.as_str(), config.server_port))?;
    server.set_nodelay(true)?;
    info!(
        "connected to server at {}:{}",
        config.server_host, config.server_port
    );

    let gui_socket = Arc::new(UdpSocket::bind(("::", config.port))?);
    let gui_addr = resolve(&config.gui_host, config.gui_port)?;

    let state = Arc::new(Mutex::new(ClientState::new(config.player_name.clone())));

    let gui = GuiLink::new(
        gui_socket.clone(),
        server.try_clone()?,
        state.clone(),
    );
    thread::spawn(move || {
        if let Err(e) = gui.run() {
            error!("gui link failed: {e}");
            std::process::exit(1);
        }
    });

    ServerLink::new(server, gui_socket, gui_addr, state).run()
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, ClientError> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| ClientError::Resolve(format!("{host}:{port}")))
}
