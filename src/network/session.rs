//! Arena Session
//!
//! Owns the arena store (engine, pool, ledger, history) behind one writer
//! lock and coordinates connected spectators with the round task. All
//! store mutations happen under the lock, so a settlement sequence can
//! never interleave with a wager. Timers and oracle calls live out here;
//! the store itself stays synchronous and replayable.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::betting::ledger::{LedgerError, UserLedger};
use crate::betting::pool::{BettingPool, WagerError};
use crate::betting::settlement::settle_match;
use crate::game::engine::{MatchEngine, MatchPhase, TickOutcome};
use crate::game::events::ArenaEvent;
use crate::game::history::MatchHistory;
use crate::game::moves::Player;
use crate::network::protocol::{
    ClientMessage, ServerMessage, WelcomeInfo, PoolInfo, GatewayError, ErrorCode,
};
use crate::network::wallet::{short_address, WalletProvider};
use crate::oracle::oracle::MoveOracle;

/// Identifies one connected spectator client.
pub type ClientId = u64;

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Countdown tick cadence.
    pub tick_interval: Duration,
    /// Recent bettors shown in pool updates.
    pub recent_bettors: usize,
    /// Completed matches sent in the welcome snapshot.
    pub history_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            recent_bettors: 8,
            history_limit: 20,
        }
    }
}

/// The single owned store every mutation goes through.
#[derive(Debug, Default)]
pub struct ArenaStore {
    /// Match lifecycle state machine.
    pub engine: MatchEngine,
    /// The current match's pari-mutuel pool.
    pub pool: BettingPool,
    /// Spectator balances and bets.
    pub ledger: UserLedger,
    /// Completed matches, newest first.
    pub history: MatchHistory,
}

impl ArenaStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// One connected spectator.
struct ClientHandle {
    /// Outbox pumped to the WebSocket by the connection's writer task.
    sender: mpsc::Sender<ServerMessage>,
    /// Joined address, if any.
    address: Option<String>,
}

/// The one arena session per process.
pub struct ArenaSession {
    config: SessionConfig,
    store: RwLock<ArenaStore>,
    oracle: Arc<MoveOracle>,
    wallet: Arc<dyn WalletProvider>,
    clients: RwLock<BTreeMap<ClientId, ClientHandle>>,
    next_client_id: AtomicU64,
    event_tx: broadcast::Sender<ArenaEvent>,
    /// Self handle for spawning the round task.
    weak_self: Weak<ArenaSession>,
}

impl ArenaSession {
    /// Create a session over the given oracle and wallet provider.
    pub fn new(
        config: SessionConfig,
        oracle: Arc<MoveOracle>,
        wallet: Arc<dyn WalletProvider>,
    ) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(256);
        Arc::new_cyclic(|weak_self| Self {
            config,
            store: RwLock::new(ArenaStore::new()),
            oracle,
            wallet,
            clients: RwLock::new(BTreeMap::new()),
            next_client_id: AtomicU64::new(1),
            event_tx,
            weak_self: weak_self.clone(),
        })
    }

    /// Register a connection's outbox. Returns its client id.
    pub async fn register_client(&self, sender: mpsc::Sender<ServerMessage>) -> ClientId {
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let mut clients = self.clients.write().await;
        clients.insert(id, ClientHandle { sender, address: None });
        id
    }

    /// Remove a disconnected client. Its account and any pending bet
    /// survive for reconnection under the same address.
    pub async fn unregister_client(&self, client_id: ClientId) {
        let mut clients = self.clients.write().await;
        clients.remove(&client_id);
    }

    /// Number of connected clients.
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Current engine phase.
    pub async fn phase(&self) -> MatchPhase {
        self.store.read().await.engine.phase()
    }

    /// Subscribe to the arena event stream.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ArenaEvent> {
        self.event_tx.subscribe()
    }

    /// Cancel any countdown or round and return the engine to idle.
    ///
    /// The round task checks the phase after every sleep, so a stale tick
    /// can never fire into the next round.
    pub async fn reset(&self) {
        self.store.write().await.engine.reset();
    }

    /// Dispatch one client message.
    pub async fn handle_message(&self, client_id: ClientId, msg: ClientMessage) {
        match msg {
            ClientMessage::Join { address } => self.handle_join(client_id, address).await,
            ClientMessage::PlaceWager { player, amount } => {
                self.handle_wager(client_id, player, amount).await
            }
            ClientMessage::StartMatch => self.handle_start(client_id).await,
            ClientMessage::SyncRequest => self.handle_sync(client_id).await,
            ClientMessage::Ping { timestamp } => {
                let server_time = Utc::now().timestamp_millis().max(0) as u64;
                self.send_to(client_id, ServerMessage::Pong { timestamp, server_time })
                    .await;
            }
            ClientMessage::Leave => self.handle_leave(client_id).await,
        }
    }

    /// Broadcast a message to every connected client.
    pub async fn broadcast(&self, msg: ServerMessage) {
        let clients = self.clients.read().await;
        for handle in clients.values() {
            let _ = handle.sender.send(msg.clone()).await;
        }
    }

    // -------------------------------------------------------------------------
    // Message handlers
    // -------------------------------------------------------------------------

    async fn handle_join(&self, client_id: ClientId, address: Option<String>) {
        let address = match address.filter(|a| !a.is_empty()) {
            Some(a) => a,
            None => format!("guest-{:04}", client_id),
        };

        let wallet_info = match self.wallet.lookup(&address) {
            Ok(info) => info,
            Err(err) => {
                warn!(address = %short_address(&address), error = %err, "wallet lookup failed");
                self.send_error(client_id, ErrorCode::WalletUnavailable, err.to_string())
                    .await;
                return;
            }
        };

        let welcome = {
            let mut store = self.store.write().await;
            let account = store
                .ledger
                .open_account(&wallet_info.address, wallet_info.balance);
            let balance = account.balance;
            let active_bet = account.active_bet.clone();
            WelcomeInfo {
                address: wallet_info.address.clone(),
                balance,
                active_bet,
                round_number: store.engine.round_number(),
                history: store.history.recent(self.config.history_limit),
                pool: self.pool_info(&store),
            }
        };

        {
            let mut clients = self.clients.write().await;
            if let Some(handle) = clients.get_mut(&client_id) {
                handle.address = Some(wallet_info.address.clone());
            }
        }

        info!(
            address = %short_address(&wallet_info.address),
            balance = welcome.balance,
            "spectator joined"
        );
        self.send_to(client_id, ServerMessage::Welcome(welcome)).await;
    }

    async fn handle_wager(&self, client_id: ClientId, player: Player, amount: u64) {
        let Some(address) = self.client_address(client_id).await else {
            self.send_error(client_id, ErrorCode::NotJoined, "join before wagering")
                .await;
            return;
        };

        let result = {
            let mut store = self.store.write().await;
            let ArenaStore { pool, ledger, .. } = &mut *store;
            pool.place_wager(ledger, &address, player, amount, Utc::now())
                .map(|bet| {
                    let balance = ledger.balance(&address).unwrap_or(0);
                    let (ai1_total, ai2_total) = pool.totals();
                    (bet, balance, ai1_total, ai2_total)
                })
        };

        match result {
            Ok((bet, balance, ai1_total, ai2_total)) => {
                info!(
                    address = %short_address(&address),
                    side = %player,
                    amount,
                    "wager accepted"
                );
                self.publish(ArenaEvent::wager_placed(
                    address, player, amount, ai1_total, ai2_total,
                ));
                self.send_to(client_id, ServerMessage::WagerAccepted { bet, balance })
                    .await;
                self.broadcast_pool_update().await;
            }
            Err(err) => {
                warn!(address = %short_address(&address), error = %err, "wager rejected");
                self.send_to(client_id, ServerMessage::Error(wager_rejection(&err)))
                    .await;
            }
        }
    }

    async fn handle_start(&self, client_id: ClientId) {
        let started = { self.store.write().await.engine.start() };
        match started {
            Ok(initial) => {
                self.publish(ArenaEvent::CountdownTick {
                    seconds_remaining: initial,
                });
                self.broadcast(ServerMessage::Countdown { seconds: initial })
                    .await;

                // Upgrade always succeeds while the session is alive
                if let Some(session) = self.weak_self.upgrade() {
                    tokio::spawn(async move { session.run_round().await });
                }
            }
            Err(err) => {
                self.send_error(client_id, ErrorCode::MatchInProgress, err.to_string())
                    .await;
            }
        }
    }

    async fn handle_sync(&self, client_id: ClientId) {
        let Some(address) = self.client_address(client_id).await else {
            self.send_error(client_id, ErrorCode::NotJoined, "join before syncing")
                .await;
            return;
        };

        let welcome = {
            let store = self.store.read().await;
            let account = store.ledger.account(&address);
            WelcomeInfo {
                address: address.clone(),
                balance: account.map(|a| a.balance).unwrap_or(0),
                active_bet: account.and_then(|a| a.active_bet.clone()),
                round_number: store.engine.round_number(),
                history: store.history.recent(self.config.history_limit),
                pool: self.pool_info(&store),
            }
        };
        self.send_to(client_id, ServerMessage::Welcome(welcome)).await;
    }

    async fn handle_leave(&self, client_id: ClientId) {
        let mut clients = self.clients.write().await;
        if let Some(handle) = clients.get_mut(&client_id) {
            if let Some(address) = handle.address.take() {
                debug!(address = %short_address(&address), "spectator left");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Round task
    // -------------------------------------------------------------------------

    /// Walk one round from countdown to settlement.
    ///
    /// Spawned by `handle_start` after the engine enters countdown. The
    /// phase is re-checked after every sleep so a `reset` cancels the
    /// task instead of letting a stale tick fire into a new round.
    async fn run_round(self: Arc<Self>) {
        loop {
            tokio::time::sleep(self.config.tick_interval).await;

            let outcome = {
                let mut store = self.store.write().await;
                if !matches!(store.engine.phase(), MatchPhase::Countdown { .. }) {
                    return;
                }
                store.engine.tick()
            };

            match outcome {
                TickOutcome::Counting { ticks_remaining } => {
                    self.publish(ArenaEvent::CountdownTick {
                        seconds_remaining: ticks_remaining,
                    });
                    self.broadcast(ServerMessage::Countdown {
                        seconds: ticks_remaining,
                    })
                    .await;
                }
                TickOutcome::MovesRequested => break,
                TickOutcome::NotCounting => return,
            }
        }

        let round_number = { self.store.read().await.engine.next_round_number() };
        self.publish(ArenaEvent::RoundStarted { round_number });
        self.broadcast(ServerMessage::RoundStarted { round_number })
            .await;

        // Both slots in flight at once; joined, not raced. Each slot falls
        // back independently inside the oracle, so the join itself only
        // fails if a task dies outright.
        let oracle_ai1 = Arc::clone(&self.oracle);
        let oracle_ai2 = Arc::clone(&self.oracle);
        let ai1_task = tokio::spawn(async move { oracle_ai1.get_move(Player::Ai1).await });
        let ai2_task = tokio::spawn(async move { oracle_ai2.get_move(Player::Ai2).await });
        let (ai1_result, ai2_result) = tokio::join!(ai1_task, ai2_task);

        let (ai1_move, ai2_move) = match (ai1_result, ai2_result) {
            (Ok(m1), Ok(m2)) => (m1, m2),
            _ => {
                self.abort_round(round_number, "move request task failed to rejoin")
                    .await;
                return;
            }
        };

        let (record, outcomes) = {
            let mut store = self.store.write().await;
            let record = match store.engine.complete_round(ai1_move, ai2_move, Utc::now()) {
                Ok(record) => record,
                Err(_) => {
                    // The engine was reset while moves were in flight;
                    // pending bets roll forward to the next round.
                    debug!(round = round_number, "round cancelled before completion");
                    return;
                }
            };
            store.history.push(record.clone());
            let ArenaStore { pool, ledger, .. } = &mut *store;
            let outcomes = settle_match(pool, ledger, &record);
            (record, outcomes)
        };

        info!(
            round = record.round_number,
            ai1 = %record.ai1_move,
            ai2 = %record.ai2_move,
            outcome = %record.outcome,
            settled = outcomes.len(),
            "match completed"
        );
        self.publish(ArenaEvent::MatchCompleted {
            record: record.clone(),
        });
        self.broadcast(ServerMessage::MatchResult { record }).await;

        for outcome in outcomes {
            self.publish(ArenaEvent::bet_settled(
                outcome.address.clone(),
                outcome.bet.id,
                outcome.bet.match_id.unwrap_or(0),
                outcome.bet.won == Some(true),
                outcome.payout,
                outcome.balance,
            ));
            self.send_to_address(
                &outcome.address,
                ServerMessage::BetSettled {
                    bet: outcome.bet,
                    payout: outcome.payout,
                    balance: outcome.balance,
                },
            )
            .await;
        }

        self.broadcast_pool_update().await;
    }

    async fn abort_round(&self, round_number: u64, reason: &str) {
        {
            let mut store = self.store.write().await;
            if store.engine.is_playing() {
                let _ = store.engine.abort_round();
            }
        }
        warn!(round = round_number, reason, "round aborted");
        self.publish(ArenaEvent::round_aborted(round_number, reason));
        self.broadcast(ServerMessage::RoundAborted {
            round_number,
            reason: reason.to_string(),
        })
        .await;
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn pool_info(&self, store: &ArenaStore) -> PoolInfo {
        let (ai1_total, ai2_total) = store.pool.totals();
        PoolInfo {
            ai1_total,
            ai2_total,
            ai1_odds: store.pool.current_odds(Player::Ai1),
            ai2_odds: store.pool.current_odds(Player::Ai2),
            recent_bettors: store.pool.recent_bettors(self.config.recent_bettors),
        }
    }

    async fn broadcast_pool_update(&self) {
        let info = {
            let store = self.store.read().await;
            self.pool_info(&store)
        };
        self.broadcast(ServerMessage::PoolUpdate(info)).await;
    }

    async fn client_address(&self, client_id: ClientId) -> Option<String> {
        let clients = self.clients.read().await;
        clients.get(&client_id).and_then(|h| h.address.clone())
    }

    async fn send_to(&self, client_id: ClientId, msg: ServerMessage) {
        let sender = {
            let clients = self.clients.read().await;
            clients.get(&client_id).map(|h| h.sender.clone())
        };
        if let Some(sender) = sender {
            let _ = sender.send(msg).await;
        }
    }

    async fn send_to_address(&self, address: &str, msg: ServerMessage) {
        let senders: Vec<_> = {
            let clients = self.clients.read().await;
            clients
                .values()
                .filter(|h| h.address.as_deref() == Some(address))
                .map(|h| h.sender.clone())
                .collect()
        };
        for sender in senders {
            let _ = sender.send(msg.clone()).await;
        }
    }

    fn publish(&self, event: ArenaEvent) {
        // No subscribers is fine; the protocol stream is the primary sink
        let _ = self.event_tx.send(event);
    }
}

/// Map a wager rejection onto a protocol error.
fn wager_rejection(err: &WagerError) -> GatewayError {
    let code = match err {
        WagerError::InvalidAmount | WagerError::PoolOverflow => ErrorCode::InvalidWager,
        WagerError::Ledger(LedgerError::InsufficientFunds { .. }) => ErrorCode::InsufficientFunds,
        WagerError::Ledger(LedgerError::BetPending) => ErrorCode::BetPending,
        WagerError::Ledger(LedgerError::UnknownAccount(_)) => ErrorCode::NotJoined,
        WagerError::Ledger(LedgerError::NoActiveBet) => ErrorCode::InternalError,
    };
    GatewayError {
        code,
        message: err.to_string(),
    }
}

impl ArenaSession {
    async fn send_error(
        &self,
        client_id: ClientId,
        code: ErrorCode,
        message: impl Into<String>,
    ) {
        self.send_to(
            client_id,
            ServerMessage::Error(GatewayError {
                code,
                message: message.into(),
            }),
        )
        .await;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::game::moves::{MatchOutcome, Move};
    use crate::network::wallet::SimulatedWallet;
    use crate::oracle::provider::{CompletionError, CompletionProvider};

    /// Replies per slot, so the outcome is fixed regardless of task order:
    /// AI-1 plays rock, AI-2 plays scissors, AI-1 wins.
    struct SlotProvider;

    #[async_trait]
    impl CompletionProvider for SlotProvider {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            let reply = if prompt.contains("AI-1") { "rock" } else { "scissors" };
            Ok(reply.to_string())
        }
    }

    fn test_session(tick_interval: Duration) -> Arc<ArenaSession> {
        let oracle = Arc::new(MoveOracle::new(Arc::new(SlotProvider), 1));
        let wallet = Arc::new(SimulatedWallet::new(1000));
        ArenaSession::new(
            SessionConfig {
                tick_interval,
                ..Default::default()
            },
            oracle,
            wallet,
        )
    }

    async fn connect(session: &Arc<ArenaSession>) -> (ClientId, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(64);
        let id = session.register_client(tx).await;
        (id, rx)
    }

    async fn next_message(rx: &mut mpsc::Receiver<ServerMessage>) -> ServerMessage {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for message")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn test_join_sends_welcome() {
        let session = test_session(Duration::from_millis(10));
        let (id, mut rx) = connect(&session).await;

        session
            .handle_message(id, ClientMessage::Join { address: Some("wallet-alice".into()) })
            .await;

        match next_message(&mut rx).await {
            ServerMessage::Welcome(welcome) => {
                assert_eq!(welcome.address, "wallet-alice");
                assert_eq!(welcome.balance, 1000);
                assert_eq!(welcome.round_number, 0);
                assert!(welcome.active_bet.is_none());
                assert!(welcome.history.is_empty());
                assert_eq!(welcome.pool.ai1_total, 0);
            }
            other => panic!("expected welcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_join_without_address_gets_guest_identity() {
        let session = test_session(Duration::from_millis(10));
        let (id, mut rx) = connect(&session).await;

        session
            .handle_message(id, ClientMessage::Join { address: None })
            .await;

        match next_message(&mut rx).await {
            ServerMessage::Welcome(welcome) => {
                assert!(welcome.address.starts_with("guest-"));
                assert_eq!(welcome.balance, 1000);
            }
            other => panic!("expected welcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wager_accepted_then_pool_update() {
        let session = test_session(Duration::from_millis(10));
        let (id, mut rx) = connect(&session).await;

        session
            .handle_message(id, ClientMessage::Join { address: Some("wallet-alice".into()) })
            .await;
        let _welcome = next_message(&mut rx).await;

        session
            .handle_message(
                id,
                ClientMessage::PlaceWager { player: Player::Ai1, amount: 100 },
            )
            .await;

        match next_message(&mut rx).await {
            ServerMessage::WagerAccepted { bet, balance } => {
                assert_eq!(bet.amount, 100);
                assert_eq!(bet.player, Player::Ai1);
                assert!(!bet.settled);
                assert_eq!(balance, 900);
            }
            other => panic!("expected wager_accepted, got {:?}", other),
        }
        match next_message(&mut rx).await {
            ServerMessage::PoolUpdate(pool) => {
                assert_eq!(pool.ai1_total, 100);
                assert_eq!(pool.ai2_total, 0);
                assert_eq!(pool.recent_bettors.len(), 1);
            }
            other => panic!("expected pool_update, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wager_requires_join() {
        let session = test_session(Duration::from_millis(10));
        let (id, mut rx) = connect(&session).await;

        session
            .handle_message(
                id,
                ClientMessage::PlaceWager { player: Player::Ai2, amount: 50 },
            )
            .await;

        match next_message(&mut rx).await {
            ServerMessage::Error(err) => assert_eq!(err.code, ErrorCode::NotJoined),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_overdrawn_wager_rejected_without_effect() {
        let session = test_session(Duration::from_millis(10));
        let (id, mut rx) = connect(&session).await;

        session
            .handle_message(id, ClientMessage::Join { address: Some("wallet-alice".into()) })
            .await;
        let _welcome = next_message(&mut rx).await;

        session
            .handle_message(
                id,
                ClientMessage::PlaceWager { player: Player::Ai1, amount: 5000 },
            )
            .await;
        match next_message(&mut rx).await {
            ServerMessage::Error(err) => assert_eq!(err.code, ErrorCode::InsufficientFunds),
            other => panic!("expected error, got {:?}", other),
        }

        // Sync shows nothing changed
        session.handle_message(id, ClientMessage::SyncRequest).await;
        match next_message(&mut rx).await {
            ServerMessage::Welcome(welcome) => {
                assert_eq!(welcome.balance, 1000);
                assert!(welcome.active_bet.is_none());
                assert_eq!(welcome.pool.ai1_total, 0);
            }
            other => panic!("expected welcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_full_round_settles_the_winning_bet() {
        let session = test_session(Duration::from_millis(5));
        let (id, mut rx) = connect(&session).await;

        session
            .handle_message(id, ClientMessage::Join { address: Some("wallet-alice".into()) })
            .await;
        session
            .handle_message(
                id,
                ClientMessage::PlaceWager { player: Player::Ai1, amount: 100 },
            )
            .await;
        session.handle_message(id, ClientMessage::StartMatch).await;

        let mut countdowns = Vec::new();
        let mut saw_round_started = false;
        let mut saw_result = false;

        loop {
            match next_message(&mut rx).await {
                ServerMessage::Countdown { seconds } => countdowns.push(seconds),
                ServerMessage::RoundStarted { round_number } => {
                    assert_eq!(round_number, 1);
                    saw_round_started = true;
                }
                ServerMessage::MatchResult { record } => {
                    assert_eq!(record.round_number, 1);
                    assert_eq!(record.ai1_move, Move::Rock);
                    assert_eq!(record.ai2_move, Move::Scissors);
                    assert_eq!(record.outcome, MatchOutcome::Ai1);
                    saw_result = true;
                }
                ServerMessage::BetSettled { bet, payout, balance } => {
                    // Lone bettor: AI-2 side empty, default 2.00x
                    assert_eq!(bet.won, Some(true));
                    assert_eq!(bet.match_id, Some(1));
                    assert_eq!(payout, 200);
                    assert_eq!(balance, 1100);
                    break;
                }
                _ => {}
            }
        }

        assert_eq!(countdowns, vec![3, 2, 1]);
        assert!(saw_round_started);
        assert!(saw_result);

        // Pool cleared for the next match
        match next_message(&mut rx).await {
            ServerMessage::PoolUpdate(pool) => {
                assert_eq!(pool.ai1_total, 0);
                assert_eq!(pool.ai2_total, 0);
            }
            other => panic!("expected pool_update, got {:?}", other),
        }
        assert_eq!(session.phase().await, MatchPhase::Result);
    }

    #[tokio::test]
    async fn test_start_rejected_while_counting_down() {
        let session = test_session(Duration::from_secs(60));
        let (id1, mut rx1) = connect(&session).await;
        let (id2, mut rx2) = connect(&session).await;

        session.handle_message(id1, ClientMessage::StartMatch).await;
        // First client sees the initial countdown broadcast
        assert!(matches!(
            next_message(&mut rx1).await,
            ServerMessage::Countdown { seconds: 3 }
        ));

        session.handle_message(id2, ClientMessage::StartMatch).await;
        // Second client got the broadcast too, then the rejection
        assert!(matches!(
            next_message(&mut rx2).await,
            ServerMessage::Countdown { seconds: 3 }
        ));
        match next_message(&mut rx2).await {
            ServerMessage::Error(err) => assert_eq!(err.code, ErrorCode::MatchInProgress),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reset_cancels_pending_round() {
        let session = test_session(Duration::from_millis(10));
        let (id, _rx) = connect(&session).await;
        let mut events = session.subscribe_events();

        session.handle_message(id, ClientMessage::StartMatch).await;
        session.reset().await;
        assert_eq!(session.phase().await, MatchPhase::Idle);

        // Give the cancelled tick task time to observe the reset
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(session.phase().await, MatchPhase::Idle);

        // No round ever started
        while let Ok(event) = events.try_recv() {
            assert!(
                !matches!(event, ArenaEvent::RoundStarted { .. }),
                "round started after reset"
            );
        }
    }

    #[tokio::test]
    async fn test_event_stream_mirrors_the_round() {
        let session = test_session(Duration::from_millis(5));
        let mut events = session.subscribe_events();
        let (id, mut rx) = connect(&session).await;

        session
            .handle_message(id, ClientMessage::Join { address: Some("wallet-alice".into()) })
            .await;
        session
            .handle_message(
                id,
                ClientMessage::PlaceWager { player: Player::Ai2, amount: 40 },
            )
            .await;
        session.handle_message(id, ClientMessage::StartMatch).await;

        // Drain protocol messages until settlement lands
        loop {
            if matches!(next_message(&mut rx).await, ServerMessage::BetSettled { .. }) {
                break;
            }
        }

        let mut saw_wager = false;
        let mut saw_completed = false;
        let mut saw_settled = false;
        while let Ok(event) = events.try_recv() {
            match event {
                ArenaEvent::WagerPlaced { amount, ai2_total, .. } => {
                    assert_eq!(amount, 40);
                    assert_eq!(ai2_total, 40);
                    saw_wager = true;
                }
                ArenaEvent::MatchCompleted { record } => {
                    assert_eq!(record.outcome, MatchOutcome::Ai1);
                    saw_completed = true;
                }
                ArenaEvent::BetSettled { won, payout, .. } => {
                    // Backed AI-2, AI-1 won
                    assert!(!won);
                    assert_eq!(payout, 0);
                    saw_settled = true;
                }
                _ => {}
            }
        }
        assert!(saw_wager && saw_completed && saw_settled);
    }

    #[tokio::test]
    async fn test_disconnect_keeps_account_and_bet() {
        let session = test_session(Duration::from_millis(10));
        let (id, mut rx) = connect(&session).await;

        session
            .handle_message(id, ClientMessage::Join { address: Some("wallet-alice".into()) })
            .await;
        let _welcome = next_message(&mut rx).await;
        session
            .handle_message(
                id,
                ClientMessage::PlaceWager { player: Player::Ai1, amount: 100 },
            )
            .await;
        let _accepted = next_message(&mut rx).await;

        session.unregister_client(id).await;
        assert_eq!(session.client_count().await, 0);

        // Reconnect under the same address: balance and pending bet intact
        let (id2, mut rx2) = connect(&session).await;
        session
            .handle_message(id2, ClientMessage::Join { address: Some("wallet-alice".into()) })
            .await;
        match next_message(&mut rx2).await {
            ServerMessage::Welcome(welcome) => {
                assert_eq!(welcome.balance, 900);
                assert!(welcome.active_bet.is_some());
            }
            other => panic!("expected welcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let session = test_session(Duration::from_millis(10));
        let (id, mut rx) = connect(&session).await;

        session
            .handle_message(id, ClientMessage::Ping { timestamp: 777 })
            .await;
        match next_message(&mut rx).await {
            ServerMessage::Pong { timestamp, .. } => assert_eq!(timestamp, 777),
            other => panic!("expected pong, got {:?}", other),
        }
    }
}
