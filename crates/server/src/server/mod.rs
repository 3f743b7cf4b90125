//! Game server implementation.

use crate::config::Config;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use protocol::{FoodView, PlayerView, ServerMessage, WorldView};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

pub mod client;
pub mod game;

pub use game::{run_game_loop, GameState};

/// Per-tick world snapshot broadcast (identical for every session).
#[derive(Debug, Clone)]
pub struct SnapshotBroadcast {
    pub players: Vec<PlayerView>,
    pub food: Vec<FoodView>,
}

/// A lobby event broadcast to every session, optionally excluding one
/// connection (the joiner already knows about itself).
#[derive(Debug, Clone)]
pub struct EventBroadcast {
    /// Connection to skip, if any.
    pub exclude: Option<u32>,
    /// The event to deliver.
    pub message: ServerMessage,
}

/// A message targeted at a specific client.
#[derive(Debug, Clone)]
pub struct TargetedMessage {
    /// Target client ID.
    pub client_id: u32,
    /// The message type.
    pub message: TargetedMessageType,
}

/// Types of targeted messages.
#[derive(Debug, Clone)]
pub enum TargetedMessageType {
    /// Join reply carrying the id of the fresh player and the full world.
    Joined {
        player_id: u32,
        world: WorldView,
        players: Vec<PlayerView>,
        food: Vec<FoodView>,
    },
    /// Elimination notice for the session whose player just died.
    GameOver { final_score: u32 },
}

#[derive(Clone)]
struct AppState {
    game_state: Arc<RwLock<GameState>>,
    snapshot_tx: broadcast::Sender<SnapshotBroadcast>,
    event_tx: broadcast::Sender<EventBroadcast>,
    targeted_tx: broadcast::Sender<TargetedMessage>,
}

/// Run the game server until the process is stopped.
pub async fn run(config: Config) -> anyhow::Result<()> {
    // Create broadcast channels
    let (snapshot_tx, _) = broadcast::channel::<SnapshotBroadcast>(5);
    let (event_tx, _) = broadcast::channel::<EventBroadcast>(100);
    let (targeted_tx, _) = broadcast::channel::<TargetedMessage>(100);

    // Create shared game state
    let game_state = Arc::new(RwLock::new(GameState::new(
        &config,
        snapshot_tx.clone(),
        event_tx.clone(),
        targeted_tx.clone(),
    )));

    // Start the game loop
    let game_loop_state = Arc::clone(&game_state);
    let tick_interval = config.server.tick_interval_ms;
    tokio::spawn(async move {
        run_game_loop(game_loop_state, tick_interval).await;
    });

    let state = AppState {
        game_state,
        snapshot_tx,
        event_tx,
        targeted_tx,
    };

    // Build the axum router
    let app = Router::new()
        .route("/game", get(websocket_handler))
        .route("/health", get(health_handler))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Game WebSocket endpoint: ws://{}/game", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

/// Health/status response body.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    players: usize,
    food: usize,
}

/// Liveness endpoint reporting current entity counts.
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let game = state.game_state.read().await;
    let counts = game.status();
    Json(HealthResponse {
        status: "ok",
        players: counts.players,
        food: counts.food,
    })
}

/// Handle WebSocket connections for the game
async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    info!("WebSocket connection from {}", addr);

    ws.on_upgrade(move |socket| handle_socket(socket, addr, state))
}

/// Handle a single game session.
async fn handle_socket(socket: WebSocket, addr: SocketAddr, state: AppState) {
    // Subscribe to broadcast channels before registering, so nothing sent
    // after registration can be missed
    let mut snapshot_rx = state.snapshot_tx.subscribe();
    let mut event_rx = state.event_tx.subscribe();
    let mut targeted_rx = state.targeted_tx.subscribe();

    let (mut write, mut read) = socket.split();

    // Register session
    let client_id = {
        let mut game = state.game_state.write().await;
        game.add_client(addr)
    };

    // Message loop - handle both incoming messages and broadcasts
    loop {
        tokio::select! {
            // Handle incoming WebSocket messages
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let mut game = state.game_state.write().await;
                        if let Err(e) = game.handle_message(client_id, &text) {
                            warn!("Message error from {}: {}", addr, e);
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", addr);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => {
                        break;
                    }
                    _ => {}
                }
            }
            // Per-tick world snapshots
            snapshot = snapshot_rx.recv() => {
                if let Ok(snapshot) = snapshot {
                    let message = ServerMessage::GameUpdate {
                        players: snapshot.players,
                        food: snapshot.food,
                    };
                    if let Err(e) = send_message(&mut write, &message).await {
                        warn!("Failed to send update to {}: {}", addr, e);
                        break;
                    }
                }
            }
            // Lobby events
            event = event_rx.recv() => {
                if let Ok(event) = event {
                    if event.exclude == Some(client_id) {
                        continue;
                    }
                    if let Err(e) = send_message(&mut write, &event.message).await {
                        warn!("Failed to send event to {}: {}", addr, e);
                        break;
                    }
                }
            }
            // Messages addressed to this session only
            targeted = targeted_rx.recv() => {
                if let Ok(msg) = targeted {
                    if msg.client_id != client_id {
                        continue;
                    }
                    let message = match msg.message {
                        TargetedMessageType::Joined { player_id, world, players, food } => {
                            ServerMessage::GameJoined { player_id, world, players, food }
                        }
                        TargetedMessageType::GameOver { final_score } => {
                            ServerMessage::GameOver {
                                final_score,
                                message: format!("Game Over! You scored {} points.", final_score),
                            }
                        }
                    };
                    if let Err(e) = send_message(&mut write, &message).await {
                        warn!("Failed to send reply to {}: {}", addr, e);
                        break;
                    }
                }
            }
        }
    }

    // Remove session, along with its live player
    {
        let mut game = state.game_state.write().await;
        game.remove_client(client_id);
    }
}

async fn send_message(
    write: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> anyhow::Result<()> {
    let text = message.encode()?;
    write.send(Message::Text(text.into())).await?;
    Ok(())
}
