//! RPS Arena Server
//!
//! Authoritative arena server for AI-vs-AI rock-paper-scissors with
//! pari-mutuel spectator betting. Run with `--demo` to drive a few
//! rounds through the store directly instead of serving WebSocket.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rps_arena::{STARTING_BALANCE, VERSION};
use rps_arena::betting::ledger::UserLedger;
use rps_arena::betting::pool::BettingPool;
use rps_arena::betting::settlement::settle_match;
use rps_arena::core::odds::DisplayOdds;
use rps_arena::game::engine::{MatchEngine, TickOutcome};
use rps_arena::game::history::MatchHistory;
use rps_arena::game::moves::Player;
use rps_arena::network::server::{ArenaServer, ServerConfig};
use rps_arena::network::session::{ArenaSession, SessionConfig};
use rps_arena::network::wallet::SimulatedWallet;
use rps_arena::oracle::oracle::MoveOracle;
use rps_arena::oracle::provider::{
    CompletionProvider, HttpCompletionProvider, OracleConfig, SimulatedProvider,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("RPS Arena Server v{}", VERSION);

    let oracle = Arc::new(build_oracle()?);

    if std::env::args().any(|arg| arg == "--demo") {
        demo_rounds(&oracle).await;
        return Ok(());
    }

    let session = ArenaSession::new(
        SessionConfig::default(),
        oracle,
        Arc::new(SimulatedWallet::new(STARTING_BALANCE)),
    );
    let server = Arc::new(ArenaServer::new(ServerConfig::from_env(), session));

    let shutdown_server = Arc::clone(&server);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            shutdown_server.shutdown();
        }
    });

    server.run().await.context("arena server failed")?;
    Ok(())
}

/// Pick the completion provider: HTTP when an API key is configured,
/// otherwise the simulated provider.
fn build_oracle() -> anyhow::Result<MoveOracle> {
    let config = OracleConfig::from_env();
    let fallback_seed = Utc::now().timestamp_millis().max(1) as u64;

    let provider: Arc<dyn CompletionProvider> = if config.is_configured() {
        info!(model = %config.model, "using HTTP completion provider");
        Arc::new(
            HttpCompletionProvider::new(config).context("building completion client")?,
        )
    } else {
        warn!("no ARENA_ORACLE_KEY set, using simulated move provider");
        Arc::new(SimulatedProvider::new(fallback_seed))
    };

    Ok(MoveOracle::new(provider, fallback_seed))
}

/// Drive a few rounds through the store directly, with a handful of
/// simulated spectators wagering every round.
async fn demo_rounds(oracle: &MoveOracle) {
    info!("=== Starting Demo ===");

    let mut engine = MatchEngine::new();
    let mut pool = BettingPool::new();
    let mut ledger = UserLedger::new();
    let mut history = MatchHistory::new();

    let spectators = ["demo-alice", "demo-bob", "demo-carol"];
    for address in spectators {
        ledger.open_account(address, STARTING_BALANCE);
    }

    for _ in 0..5 {
        // Spread the wagers so both default and proportional odds show up
        for (i, address) in spectators.iter().enumerate() {
            let side = if (i as u64 + engine.next_round_number()) % 2 == 0 {
                Player::Ai2
            } else {
                Player::Ai1
            };
            match pool.place_wager(&mut ledger, address, side, 100, Utc::now()) {
                Ok(bet) => info!(
                    "wager: {} put {} on {} at {}",
                    address,
                    bet.amount,
                    side,
                    DisplayOdds(pool.current_odds(side))
                ),
                Err(err) => warn!("wager rejected for {}: {}", address, err),
            }
        }

        if let Err(err) = engine.start() {
            warn!("start rejected: {}", err);
            break;
        }
        loop {
            match engine.tick() {
                TickOutcome::Counting { ticks_remaining } => {
                    info!("countdown: {}", ticks_remaining);
                }
                TickOutcome::MovesRequested => break,
                TickOutcome::NotCounting => break,
            }
        }

        let ai1_move = oracle.get_move(Player::Ai1).await;
        let ai2_move = oracle.get_move(Player::Ai2).await;
        let record = match engine.complete_round(ai1_move, ai2_move, Utc::now()) {
            Ok(record) => record,
            Err(err) => {
                warn!("round failed: {}", err);
                continue;
            }
        };

        info!(
            "round {}: {} vs {} -> {}",
            record.round_number, record.ai1_move, record.ai2_move, record.outcome
        );

        let outcomes = settle_match(&mut pool, &mut ledger, &record);
        for outcome in outcomes {
            info!(
                "settled: {} {} at {} -> payout {}, balance {}",
                outcome.address,
                if outcome.bet.won == Some(true) { "won" } else { "lost" },
                DisplayOdds(outcome.odds),
                outcome.payout,
                outcome.balance
            );
        }
        history.push(record);
    }

    info!("=== Demo Results ===");
    info!("rounds completed: {}", history.len());
    for record in history.iter() {
        info!(
            "  #{}: {} vs {} -> {}",
            record.round_number, record.ai1_move, record.ai2_move, record.outcome
        );
    }
    for address in spectators {
        info!(
            "final balance for {}: {}",
            address,
            ledger.balance(address).unwrap_or(0)
        );
    }
}
