//! Turn coordinator: the single owner of session state
//!
//! Every operation runs inside one async mutex. Events are handed to the
//! [`Broadcaster`] before the lock is released, so connections observe them
//! in the same order as the state transitions that produced them.

use crate::config::GameSettings;
use crate::coordinator::turn::{resolve_flip, resolve_timeout, NextTurn, TurnStep};
use crate::error::Result;
use crate::game::{Deck, GameState, Player, RandomShuffle, Roster, Shuffle};
use crate::lobby::{AdmissionPolicy, Lobby, StartTrigger};
use crate::protocol::ServerEvent;
use crate::registry::Broadcaster;
use crate::scheduler::{spawn_after, TurnTimer};
use crate::types::{ConnectionId, ConnectionRecord, PlayerName, SessionPhase, TurnId};
use crate::utils::current_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

type TimeoutTask = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Counters kept for the lifetime of the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub games_started: u64,
    pub flips: u64,
    pub matches: u64,
    pub mismatches: u64,
    pub timeouts: u64,
    pub chat_messages: u64,
    pub rejected_admissions: u64,
}

impl SessionStats {
    fn record(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::Flip { .. } => self.flips += 1,
            ServerEvent::Match { .. } => self.matches += 1,
            ServerEvent::NoMatch { .. } => self.mismatches += 1,
            ServerEvent::Timeout { .. } => self.timeouts += 1,
            _ => {}
        }
    }
}

/// Point-in-time view of the session for logging and tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub players: Vec<Player>,
    pub current_player: Option<PlayerName>,
    pub current_turn: Option<TurnId>,
    pub pending_first_index: Option<usize>,
    pub total_cards: usize,
    pub matched_cards: usize,
    pub connections: usize,
    pub timer_armed: bool,
    pub stats: SessionStats,
}

enum Phase {
    Lobby,
    Active(GameState),
    Finished(GameState),
}

struct Session {
    lobby: Lobby,
    phase: Phase,
    turn_timer: TurnTimer,
    connections: HashMap<ConnectionId, ConnectionRecord>,
    stats: SessionStats,
}

/// Coordinates admission, turns, and timeouts for one game session
#[derive(Clone)]
pub struct TurnCoordinator {
    session: Arc<Mutex<Session>>,
    broadcaster: Arc<dyn Broadcaster>,
    shuffler: Arc<dyn Shuffle>,
    settings: Arc<GameSettings>,
}

impl TurnCoordinator {
    /// Create a coordinator that deals uniformly shuffled decks
    pub fn new(settings: GameSettings, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self::with_shuffler(settings, broadcaster, Arc::new(RandomShuffle))
    }

    pub fn with_shuffler(
        settings: GameSettings,
        broadcaster: Arc<dyn Broadcaster>,
        shuffler: Arc<dyn Shuffle>,
    ) -> Self {
        let session = Session {
            lobby: Lobby::new(AdmissionPolicy::from(&settings)),
            phase: Phase::Lobby,
            turn_timer: TurnTimer::new(),
            connections: HashMap::new(),
            stats: SessionStats::default(),
        };
        Self {
            session: Arc::new(Mutex::new(session)),
            broadcaster,
            shuffler,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Admit a new connection as the next player.
    ///
    /// The connection starts receiving broadcasts and gets `NAME` before any
    /// of them, then everyone receives `PLAYERS`.
    /// Fails with [`GameError::GameInProgress`](crate::error::GameError) or
    /// [`GameError::LobbyFull`](crate::error::GameError); the caller reports
    /// the error and closes the connection.
    pub async fn admit(&self, connection: ConnectionId) -> Result<PlayerName> {
        let mut guard = self.session.lock().await;
        let session = &mut *guard;

        let admission = match session.lobby.admit() {
            Ok(admission) => admission,
            Err(err) => {
                session.stats.rejected_admissions += 1;
                info!("Rejected connection {}: {}", connection, err);
                return Err(err);
            }
        };

        session.connections.insert(
            connection,
            ConnectionRecord {
                connection_id: connection,
                player: admission.name.clone(),
                connected_at: current_timestamp(),
            },
        );
        info!(
            "{} joined on connection {} ({} in lobby)",
            admission.name,
            connection,
            admission.players.len()
        );

        match self.broadcaster.add_connection(connection).await {
            Ok(true) => {}
            Ok(false) => debug!("Connection {} not registered for broadcasts", connection),
            Err(err) => warn!("Failed to add connection {}: {}", connection, err),
        }
        self.send(connection, ServerEvent::Name(admission.name.clone()))
            .await;
        self.publish(ServerEvent::Players(admission.players)).await;

        match admission.start {
            StartTrigger::Immediately => {
                info!("Lobby full, starting game");
                self.start_locked(session).await;
            }
            StartTrigger::AfterGrace => {
                info!(
                    "Minimum players reached, starting in {:?}",
                    self.settings.start_grace()
                );
                let coordinator = self.clone();
                spawn_after(self.settings.start_grace(), async move {
                    coordinator.start_after_grace().await;
                });
            }
            StartTrigger::None => {}
        }

        Ok(admission.name)
    }

    /// Start the game with whoever is in the lobby.
    ///
    /// Returns `false` if a game already started or nobody has joined.
    pub async fn start_game(&self) -> bool {
        let mut guard = self.session.lock().await;
        let session = &mut *guard;
        if !matches!(session.phase, Phase::Lobby) || session.lobby.players().is_empty() {
            return false;
        }
        self.start_locked(session).await;
        true
    }

    async fn start_after_grace(&self) {
        let mut guard = self.session.lock().await;
        let session = &mut *guard;
        // Reaching the maximum during the grace delay starts the game early
        if !matches!(session.phase, Phase::Lobby) || !session.lobby.can_start() {
            debug!("Grace start skipped, game already started");
            return;
        }
        self.start_locked(session).await;
    }

    async fn start_locked(&self, session: &mut Session) {
        session.lobby.close();
        let deck = Deck::new(self.settings.num_pairs, self.shuffler.as_ref());
        let roster = Roster::from_names(session.lobby.players().iter().cloned());
        let total_cards = deck.len();

        let mut game = GameState::new(deck, roster);
        let turn = game.begin_turn(0);
        let first = game
            .current_player()
            .map(|player| player.name.clone())
            .unwrap_or_default();
        session.phase = Phase::Active(game);
        session.stats.games_started += 1;
        info!(
            "Game started with {} players and {} cards",
            session.lobby.players().len(),
            total_cards
        );

        self.publish(ServerEvent::Start { total_cards }).await;
        self.publish(ServerEvent::Turn(first)).await;
        self.arm_turn_timer(session, turn);
    }

    /// Reveal card `index` on behalf of `player`.
    ///
    /// Flips from the wrong player, on invalid or matched cards, on the
    /// already open card, or outside an active game have no effect at all.
    pub async fn flip(&self, player: &str, index: usize) {
        let mut guard = self.session.lock().await;
        let session = &mut *guard;
        let Phase::Active(game) = &mut session.phase else {
            debug!("Ignoring flip {} from {}: no active game", index, player);
            return;
        };

        match resolve_flip(game, player, index) {
            Ok(step) => self.apply_step(session, step).await,
            Err(reason) => debug!("Ignoring flip {} from {}: {}", index, player, reason),
        }
    }

    /// Expire `turn` if it is still live; stale timeouts are no-ops
    pub async fn on_turn_timeout(&self, turn: TurnId) {
        let mut guard = self.session.lock().await;
        let session = &mut *guard;
        let Phase::Active(game) = &mut session.phase else {
            debug!("Ignoring timeout for {}: no active game", turn);
            return;
        };

        match resolve_timeout(game, turn) {
            Some(step) => {
                info!("{} timed out", turn);
                self.apply_step(session, step).await;
            }
            None => debug!("Ignoring stale timeout for {}", turn),
        }
    }

    /// Relay a chat line from `player` to everyone
    pub async fn chat(&self, player: &str, text: &str) {
        let mut guard = self.session.lock().await;
        guard.stats.chat_messages += 1;
        self.publish(ServerEvent::Chat {
            player: player.to_string(),
            text: text.to_string(),
        })
        .await;
    }

    /// Drop a connection from the registry.
    ///
    /// The player stays on the roster and keeps their turns, which then
    /// expire through the turn timeout.
    pub async fn disconnect(&self, connection: ConnectionId) -> Option<PlayerName> {
        let mut guard = self.session.lock().await;
        let record = guard.connections.remove(&connection);

        if let Err(err) = self.broadcaster.remove_connection(connection).await {
            warn!("Failed to remove connection {}: {}", connection, err);
        }
        match &record {
            Some(record) => info!("{} disconnected ({})", record.player, connection),
            None => debug!("Connection {} closed before admission", connection),
        }
        record.map(|record| record.player)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.lock().await;
        let (phase, game) = match &session.phase {
            Phase::Lobby => (SessionPhase::Lobby, None),
            Phase::Active(game) => (SessionPhase::Active, Some(game)),
            Phase::Finished(game) => (SessionPhase::Finished, Some(game)),
        };

        let players = match game {
            Some(game) => game.roster().players().to_vec(),
            None => session
                .lobby
                .players()
                .iter()
                .map(|name| Player::new(name.clone()))
                .collect(),
        };
        let live = game.filter(|_| phase == SessionPhase::Active);

        SessionSnapshot {
            phase,
            players,
            current_player: live
                .and_then(|game| game.current_player())
                .map(|player| player.name.clone()),
            current_turn: live.map(|game| game.current_turn()),
            pending_first_index: game.and_then(|game| game.pending_first_index()),
            total_cards: game.map(|game| game.deck().len()).unwrap_or_default(),
            matched_cards: game
                .map(|game| game.deck().matched_count())
                .unwrap_or_default(),
            connections: session.connections.len(),
            timer_armed: session.turn_timer.is_armed(),
            stats: session.stats.clone(),
        }
    }

    pub async fn stats(&self) -> SessionStats {
        self.session.lock().await.stats.clone()
    }

    async fn apply_step(&self, session: &mut Session, step: TurnStep) {
        for event in step.events {
            session.stats.record(&event);
            self.publish(event).await;
        }

        match step.next {
            NextTurn::Unchanged => {}
            NextTurn::Begin(player_index) => {
                let Phase::Active(game) = &mut session.phase else {
                    return;
                };
                let turn = game.begin_turn(player_index);
                let name = game
                    .current_player()
                    .map(|player| player.name.clone())
                    .unwrap_or_default();
                debug!("Starting {} for {}", turn, name);
                self.publish(ServerEvent::Turn(name)).await;
                self.arm_turn_timer(session, turn);
            }
            NextTurn::GameOver => {
                session.turn_timer.cancel();
                session.phase = match std::mem::replace(&mut session.phase, Phase::Lobby) {
                    Phase::Active(game) => Phase::Finished(game),
                    other => other,
                };
                info!("Game over, every pair matched");
            }
        }
    }

    fn arm_turn_timer(&self, session: &mut Session, turn: TurnId) {
        session
            .turn_timer
            .arm(turn, self.settings.turn_timeout(), self.timeout_task(turn));
    }

    fn timeout_task(&self, turn: TurnId) -> TimeoutTask {
        let coordinator = self.clone();
        Box::pin(async move {
            coordinator.on_turn_timeout(turn).await;
        })
    }

    async fn publish(&self, event: ServerEvent) {
        let kind = event.kind();
        if let Err(err) = self.broadcaster.broadcast(event).await {
            warn!("Failed to broadcast {}: {}", kind, err);
        }
    }

    async fn send(&self, connection: ConnectionId, event: ServerEvent) {
        let kind = event.kind();
        if let Err(err) = self.broadcaster.send_to(connection, event).await {
            warn!("Failed to send {} to {}: {}", kind, connection, err);
        }
    }
}
