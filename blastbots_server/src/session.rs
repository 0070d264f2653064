// Shared server state: the meeting point of every thread.
//
// One `Session` lives for the whole process. Reader threads feed it
// (admissions, intents), the game manager drains it (intent snapshots)
// and broadcasts through it (turn frames), and writer threads consume the
// per-client queues it owns. All mutation happens under a single mutex;
// one condition variable signals "enough players joined" to the manager.
//
// Broadcast ordering contract: appending a frame to the replay history
// and pushing it to every live queue happens in one critical section, and
// a new client's queue is created pre-seeded with a copy of the history
// under that same lock. A client that connects mid-phase therefore
// receives the phase's full joinable sequence — history drain first,
// then live frames, with no gap and no overlap. Both phase transitions
// (lobby→game and game→lobby) discard the history and reseed it with a
// fresh `Hello` before broadcasting the transition frame.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use blastbots_protocol::{ByteString, ClientMessage, Event, Player, PlayerId, Score, ServerMessage};
use log::{debug, info};

use crate::config::ServerConfig;
use crate::queue::BlockingQueue;

/// Connection identifier, monotonically increasing per accepted socket.
/// Distinct from `PlayerId`: every connection gets one, player or not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClientId(u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type FrameQueue = BlockingQueue<Arc<ServerMessage>>;

pub struct Session {
    config: ServerConfig,
    inner: Mutex<SessionInner>,
    players_joined: Condvar,
}

struct SessionInner {
    players: BTreeMap<PlayerId, Player>,
    player_ids: HashMap<ClientId, PlayerId>,
    queues: HashMap<ClientId, Arc<FrameQueue>>,
    last_intents: HashMap<ClientId, ClientMessage>,
    next_client_id: u64,
    is_lobby: bool,
    history: Vec<Arc<ServerMessage>>,
}

impl Session {
    pub fn new(config: ServerConfig) -> Self {
        let hello = Arc::new(hello_frame(&config));
        Self {
            config,
            inner: Mutex::new(SessionInner {
                players: BTreeMap::new(),
                player_ids: HashMap::new(),
                queues: HashMap::new(),
                last_intents: HashMap::new(),
                next_client_id: 0,
                is_lobby: true,
                history: vec![hello],
            }),
            players_joined: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Hand out the next connection id.
    pub fn accept_client(&self) -> ClientId {
        let mut inner = self.lock();
        let id = ClientId(inner.next_client_id);
        inner.next_client_id += 1;
        id
    }

    /// Create the client's outbound queue, pre-seeded with the replay
    /// history so the writer backfills the session before any live frame.
    pub fn create_queue(&self, client: ClientId) -> Arc<FrameQueue> {
        let mut inner = self.lock();
        let backlog: VecDeque<Arc<ServerMessage>> = inner.history.iter().cloned().collect();
        let queue = Arc::new(FrameQueue::seeded(backlog));
        inner.queues.insert(client, queue.clone());
        queue
    }

    /// Tear down everything the session knows about a connection: the
    /// roster entry (if the client was a player), the outbound queue
    /// (closed, which unblocks the writer), and any pending intent.
    /// Idempotent — reader and writer both call it on the way out.
    pub fn erase_client(&self, client: ClientId) {
        let mut inner = self.lock();
        if let Some(player_id) = inner.player_ids.remove(&client) {
            inner.players.remove(&player_id);
        }
        if let Some(queue) = inner.queues.remove(&client) {
            queue.close();
        }
        inner.last_intents.remove(&client);
    }

    /// Record the client's latest intent for the current turn,
    /// overwriting any earlier one.
    pub fn record_intent(&self, client: ClientId, message: ClientMessage) {
        let mut inner = self.lock();
        inner.last_intents.insert(client, message);
    }

    /// Snapshot the latest intent of every admitted player and clear the
    /// table, atomically. Intents from clients that never joined are
    /// discarded with it.
    pub fn collect_intents(&self) -> BTreeMap<PlayerId, ClientMessage> {
        let mut inner = self.lock();
        let SessionInner {
            player_ids,
            last_intents,
            ..
        } = &mut *inner;

        let mut intents = BTreeMap::new();
        for (client, message) in last_intents.drain() {
            if let Some(player_id) = player_ids.get(&client) {
                intents.insert(*player_id, message);
            }
        }
        intents
    }

    /// Admit a client to the lobby if there is room and it hasn't joined
    /// yet; otherwise ignore the request. Admission broadcasts
    /// `AcceptedPlayer` and nudges the game manager.
    pub fn try_accept_player(&self, client: ClientId, name: ByteString, address: ByteString) {
        let mut inner = self.lock();
        if !inner.is_lobby
            || inner.player_ids.contains_key(&client)
            || inner.players.len() >= usize::from(self.config.players_count)
        {
            return;
        }

        let id = PlayerId(inner.players.len() as u8);
        let player = Player { name, address };
        info!("client {client} joins as player {} ({})", id.0, player.name);

        inner.player_ids.insert(client, id);
        inner.players.insert(id, player.clone());
        broadcast(&mut inner, ServerMessage::AcceptedPlayer { id, player });
        self.players_joined.notify_all();
    }

    /// Block until the lobby holds exactly `players_count` players, then
    /// transition to game phase in one critical section: flip the flag,
    /// reseed the history, broadcast `GameStarted`, and return the
    /// roster. Stale intents from the lobby are dropped so turn 1 only
    /// sees actions sent after the game began.
    pub fn wait_for_players(&self) -> BTreeMap<PlayerId, Player> {
        let mut inner = self.lock();
        while inner.players.len() < usize::from(self.config.players_count) {
            inner = self
                .players_joined
                .wait(inner)
                .unwrap_or_else(|e| e.into_inner());
        }

        inner.is_lobby = false;
        inner.last_intents.clear();
        // The admission frames stop being joinable state once the roster
        // is final: the history restarts from a fresh Hello, and the
        // GameStarted and Turn frames accumulate on top of it.
        inner.history = vec![Arc::new(hello_frame(&self.config))];
        let players = inner.players.clone();
        broadcast(
            &mut inner,
            ServerMessage::GameStarted {
                players: players.clone(),
            },
        );
        players
    }

    /// Broadcast one finished turn.
    pub fn close_turn(&self, turn: u16, events: Vec<Event>) {
        let mut inner = self.lock();
        debug!("turn {turn}: {} events", events.len());
        broadcast(&mut inner, ServerMessage::Turn { turn, events });
    }

    /// Broadcast the final scores and return to the lobby: the roster and
    /// intent table empty out and the history restarts from a fresh
    /// `Hello`, so clients that stay connected see a clean lobby and new
    /// connections replay nothing of the finished game.
    pub fn end_game(&self, scores: BTreeMap<PlayerId, Score>) {
        let mut inner = self.lock();
        broadcast(&mut inner, ServerMessage::GameEnded { scores });
        inner.is_lobby = true;
        inner.players.clear();
        inner.player_ids.clear();
        inner.last_intents.clear();
        inner.history = vec![Arc::new(hello_frame(&self.config))];
    }
}

/// Append a frame to the history and fan it out to every open queue, all
/// under the session lock held by the caller.
fn broadcast(inner: &mut SessionInner, message: ServerMessage) {
    let frame = Arc::new(message);
    inner.history.push(frame.clone());
    for queue in inner.queues.values() {
        if queue.is_open() {
            queue.push(frame.clone());
        }
    }
}

fn hello_frame(config: &ServerConfig) -> ServerMessage {
    ServerMessage::Hello {
        server_name: config.server_name.clone(),
        players_count: config.players_count,
        size_x: config.size_x,
        size_y: config.size_y,
        game_length: config.game_length,
        explosion_radius: config.explosion_radius,
        bomb_timer: config.bomb_timer,
    }
}
