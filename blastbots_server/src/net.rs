// TCP front end: the acceptor loop and the per-connection threads.
//
// Architecture: thread-per-direction.
//
// - **Acceptor thread** (`TcpListener::accept()` loop): disables Nagle,
//   registers the connection with the session, and spawns the pair below.
// - **Writer thread** (one per client): blocks on the client's outbound
//   queue and serializes each frame onto the socket. Exits when the queue
//   closes or a write fails.
// - **Reader thread** (one per client): decodes inbound frames and
//   dispatches them into the session. Exits on any decode or I/O error —
//   on TCP an unknown tag is unrecoverable, so the connection dies.
//
// Teardown is symmetric: whichever side fails first shuts the socket down
// and calls `Session::erase_client`, which closes the queue (waking the
// writer) and removes every trace of the connection. `erase_client` is
// idempotent, so both threads calling it on the way out is fine.
//
// The game manager runs on its own thread, started here as well so that
// `start_server` is the one entry point for both the binary and the
// integration tests (which bind port 0 and need the real address back).

use std::io::{self, BufReader, BufWriter, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use blastbots_protocol::{ByteString, ClientMessage, Wire};
use log::{debug, error, info};

use crate::config::ServerConfig;
use crate::game::GameManager;
use crate::session::{ClientId, FrameQueue, Session};

/// Handle to a running server. Dropping it detaches the threads; the
/// binary holds onto it and parks in `join`.
pub struct ServerHandle {
    manager: JoinHandle<()>,
}

impl ServerHandle {
    /// Block on the game-manager thread. The manager loops forever, so
    /// this only returns if it panics.
    pub fn join(self) {
        let _ = self.manager.join();
    }
}

/// Bind the listen socket, start the acceptor and game-manager threads,
/// and return the actual bound address (port 0 lets the OS choose).
pub fn start_server(config: ServerConfig) -> io::Result<(ServerHandle, SocketAddr)> {
    let listener = TcpListener::bind(("::", config.port))?;
    let addr = listener.local_addr()?;
    let session = Arc::new(Session::new(config.clone()));

    let acceptor_session = session.clone();
    thread::spawn(move || run_acceptor(listener, acceptor_session));

    let manager = thread::spawn(move || GameManager::new(config, session).run());

    Ok((ServerHandle { manager }, addr))
}

fn run_acceptor(listener: TcpListener, session: Arc<Session>) {
    info!("accepting connections on {:?}", listener.local_addr());
    loop {
        match listener.accept() {
            Ok((stream, addr)) => handle_connection(stream, addr, &session),
            Err(e) => {
                // Per-connection accept errors (e.g. aborted handshakes)
                // are transient; keep accepting.
                error!("accept failed: {e}");
            }
        }
    }
}

fn handle_connection(stream: TcpStream, addr: SocketAddr, session: &Arc<Session>) {
    stream.set_nodelay(true).ok();

    let address = ByteString::try_from(addr.to_string().as_str()).unwrap_or_default();
    let client = session.accept_client();
    debug!("client {client} connected from {addr}");

    let reader_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            debug!("client {client}: clone failed: {e}");
            return;
        }
    };

    let queue = session.create_queue(client);

    let writer_session = session.clone();
    thread::spawn(move || writer_loop(stream, queue, writer_session, client));

    let reader_session = session.clone();
    thread::spawn(move || reader_loop(reader_stream, reader_session, client, address));
}

/// Drain the client's queue onto the socket until the queue closes or a
/// write fails.
fn writer_loop(stream: TcpStream, queue: Arc<FrameQueue>, session: Arc<Session>, client: ClientId) {
    let mut writer = BufWriter::new(stream);
    while let Some(frame) = queue.pop() {
        if frame.write_to(&mut writer).is_err() || writer.flush().is_err() {
            debug!("client {client}: write failed");
            break;
        }
    }
    let _ = writer.get_ref().shutdown(Shutdown::Both);
    session.erase_client(client);
}

/// Decode inbound frames and dispatch them until the stream dies.
fn reader_loop(stream: TcpStream, session: Arc<Session>, client: ClientId, address: ByteString) {
    let mut reader = BufReader::new(stream);
    loop {
        match ClientMessage::read_from(&mut reader) {
            Ok(ClientMessage::Join { name }) => {
                session.try_accept_player(client, name, address.clone());
            }
            Ok(intent) => session.record_intent(client, intent),
            Err(e) => {
                debug!("client {client} disconnected: {e}");
                break;
            }
        }
    }
    let _ = reader.get_ref().shutdown(Shutdown::Both);
    session.erase_client(client);
}
