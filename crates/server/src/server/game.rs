//! Game state and main loop.

use crate::collision;
use crate::config::Config;
use crate::entity::Player;
use crate::world::{Boundary, Counts, World};
use futures_util::FutureExt;
use glam::Vec2;
use protocol::{ClientMessage, FoodView, PlayerView, ServerMessage, ViewportHint, WorldView};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::client::Client;
use super::{EventBroadcast, SnapshotBroadcast, TargetedMessage, TargetedMessageType};

/// Pending broadcasts to send after releasing the game state lock.
#[derive(Default)]
pub struct PendingBroadcasts {
    pub snapshot: Option<SnapshotBroadcast>,
    pub events: Vec<EventBroadcast>,
    pub targeted: Vec<TargetedMessage>,
}

/// Main game state.
pub struct GameState {
    pub config: Config,
    pub tick_count: u64,

    // ID counter for connections; world entities draw from the world's own
    next_client_id: u32,

    // Connected clients
    pub clients: HashMap<u32, Client>,

    // Game world (players, food, boundary)
    pub world: World,

    // A circular world configured without a radius adopts one from the
    // first join's viewport hint
    pending_radius: bool,

    // Snapshot broadcast channel (one per tick, identical for everyone)
    snapshot_tx: broadcast::Sender<SnapshotBroadcast>,

    // Lobby event broadcast channel
    event_tx: broadcast::Sender<EventBroadcast>,

    // Targeted message channel
    targeted_tx: broadcast::Sender<TargetedMessage>,

    // Average tick duration in milliseconds (exponential moving average).
    pub update_time_avg: f64,
}

impl GameState {
    /// Create a new game state.
    pub fn new(
        config: &Config,
        snapshot_tx: broadcast::Sender<SnapshotBroadcast>,
        event_tx: broadcast::Sender<EventBroadcast>,
        targeted_tx: broadcast::Sender<TargetedMessage>,
    ) -> Self {
        let boundary = Boundary::from_config(&config.world);
        let pending_radius =
            matches!(boundary, Boundary::ClampCircle { radius, .. } if radius <= 0.0);

        Self {
            config: config.clone(),
            tick_count: 0,
            next_client_id: 1,
            clients: HashMap::new(),
            world: World::new(boundary),
            pending_radius,
            snapshot_tx,
            event_tx,
            targeted_tx,
            update_time_avg: 0.0,
        }
    }

    /// Whether the world is still waiting on its first join to size itself.
    pub fn awaiting_radius(&self) -> bool {
        self.pending_radius
    }

    /// Add a new client.
    pub fn add_client(&mut self, addr: SocketAddr) -> u32 {
        let id = self.next_client_id;
        self.next_client_id += 1;
        let client = Client::new(id, addr);
        self.clients.insert(id, client);
        info!("Client {} connected from {}", id, addr);
        id
    }

    /// Remove a client, along with its live player if it still has one.
    pub fn remove_client(&mut self, id: u32) {
        if let Some(client) = self.clients.remove(&id) {
            info!(
                "Client {} ({}) disconnected, last active {:?} ago",
                id,
                client.addr,
                client.last_activity.elapsed()
            );
            if let Some(player_id) = client.player_id {
                // A player eliminated earlier is already gone; only an
                // actual removal announces the departure
                if self.world.remove_player(player_id).is_some() {
                    let _ = self.event_tx.send(EventBroadcast {
                        exclude: None,
                        message: ServerMessage::PlayerLeft { player_id },
                    });
                }
            }
        }
    }

    /// Handle a text message from a client.
    pub fn handle_message(&mut self, client_id: u32, text: &str) -> anyhow::Result<()> {
        let client = self
            .clients
            .get_mut(&client_id)
            .ok_or_else(|| anyhow::anyhow!("Client not found"))?;

        client.touch();

        let message = ClientMessage::parse(text)?;
        if !matches!(message, ClientMessage::Direction { .. }) {
            // Direction updates are very frequent; avoid logging them
            debug!("Client {} sent {:?}", client_id, message);
        }
        match message {
            ClientMessage::Join { name, viewport } => {
                self.handle_join(client_id, name, viewport)?;
            }
            ClientMessage::Direction { x, y } => {
                self.handle_direction(client_id, Vec2::new(x, y));
            }
        }
        Ok(())
    }

    /// Spawn a player for a client and reply with the full current world.
    /// Joining again while a previous player is still alive is a respawn
    /// and replaces it.
    fn handle_join(
        &mut self,
        client_id: u32,
        name: String,
        viewport: Option<ViewportHint>,
    ) -> anyhow::Result<()> {
        let max_len = self.config.player.max_nick_length;
        let trimmed: String = name.trim().chars().take(max_len).collect();
        let player_name = if trimmed.is_empty() {
            "Anonymous".to_string()
        } else {
            trimmed
        };

        {
            let client = self
                .clients
                .get_mut(&client_id)
                .ok_or_else(|| anyhow::anyhow!("Client not found"))?;
            client.viewport = viewport;
        }

        self.adopt_world_radius(client_id);

        if let Some(old_id) = self.clients.get(&client_id).and_then(|c| c.player_id) {
            self.world.remove_player(old_id);
        }

        let id = self.world.next_id();
        let position = self.world.boundary.random_spawn_position();
        let player = Player::new(id, player_name.clone(), position, World::random_color());
        self.world.add_player(player);
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.player_id = Some(id);
        }

        info!("Client {} joined as '{}' (player {})", client_id, player_name, id);

        let (players, food) = self.build_views();
        let _ = self.targeted_tx.send(TargetedMessage {
            client_id,
            message: TargetedMessageType::Joined {
                player_id: id,
                world: self.world_view(),
                players,
                food,
            },
        });

        // Everyone else learns about the newcomer; the joiner already has
        // the full state from the reply above
        if let Some(view) = self.world.players.get(&id).map(player_view) {
            let _ = self.event_tx.send(EventBroadcast {
                exclude: Some(client_id),
                message: ServerMessage::PlayerJoined { player: view },
            });
        }

        Ok(())
    }

    /// Store a steering intent for the client's player. Intents from
    /// clients without a live player are dropped.
    fn handle_direction(&mut self, client_id: u32, raw: Vec2) {
        let Some(player_id) = self.clients.get(&client_id).and_then(|c| c.player_id) else {
            return;
        };
        if let Some(player) = self.world.players.get_mut(&player_id) {
            player.set_direction(raw);
        }
    }

    /// Size a radius-less circular world from the first join's viewport
    /// hint, then run the deferred initial food fill. Later joins never
    /// resize the world.
    fn adopt_world_radius(&mut self, client_id: u32) {
        if !self.pending_radius {
            return;
        }
        let hint = self.clients.get(&client_id).and_then(|c| c.viewport);
        let radius = hint
            .map(|h| h.width.max(h.height))
            .filter(|r| r.is_finite())
            .unwrap_or(self.config.world.width / 2.0)
            .max(self.config.world.margin * 4.0);
        if let Boundary::ClampCircle { radius: r, .. } = &mut self.world.boundary {
            *r = radius;
        }
        self.pending_radius = false;

        let max_food = self.config.food.max_food;
        self.world.fill_food(max_food);
        info!(
            "Circular world radius set to {} from first join, {} food spawned",
            radius,
            self.world.food.len()
        );
    }

    /// Remove an eliminated player: scatter its score as food around the
    /// death position and queue the notifications.
    fn eliminate_player(&mut self, player_id: u32, pending: &mut PendingBroadcasts) {
        let Some(player) = self.world.remove_player(player_id) else {
            return;
        };

        if let Some((count, value)) = collision::death_drop(player.score) {
            for _ in 0..count {
                let position = player.position + collision::drop_offset();
                self.world.spawn_food_at(position, value);
            }
            debug!(
                "Player {} dropped {} food (value {}) at death",
                player.id, count, value
            );
        }

        info!(
            "Player {} ('{}') eliminated with score {}",
            player.id, player.name, player.score
        );

        if let Some(client_id) = self.client_for_player(player_id) {
            if let Some(client) = self.clients.get_mut(&client_id) {
                client.player_id = None;
            }
            pending.targeted.push(TargetedMessage {
                client_id,
                message: TargetedMessageType::GameOver {
                    final_score: player.score,
                },
            });
        }

        pending.events.push(EventBroadcast {
            exclude: None,
            message: ServerMessage::PlayerEliminated {
                player_id: player.id,
                player_name: player.name,
                final_score: player.score,
            },
        });
    }

    fn client_for_player(&self, player_id: u32) -> Option<u32> {
        self.clients
            .values()
            .find(|c| c.player_id == Some(player_id))
            .map(|c| c.id)
    }

    /// Run one simulation tick. Returns the broadcasts to send once the
    /// state lock has been released.
    pub fn tick(&mut self) -> PendingBroadcasts {
        let tick_start = std::time::Instant::now();
        self.tick_count += 1;

        let mut pending = PendingBroadcasts::default();

        // Phase 1: advance every player along its heading
        let move_start = std::time::Instant::now();
        let boundary = self.world.boundary;
        let speed = self.config.player.speed;
        for player in self.world.players.values_mut() {
            player.advance(&boundary, speed);
        }
        let move_time = move_start.elapsed();

        // Phase 2: food pickups. Hits are collected per player and applied
        // immediately, so an item eaten by one player is gone before the
        // next player's scan and can never be claimed twice.
        let collision_start = std::time::Instant::now();
        let player_ids: Vec<u32> = self.world.players.keys().copied().collect();
        for player_id in player_ids {
            let hits = match self.world.players.get(&player_id) {
                Some(player) => collision::food_hits(player, &self.world.food),
                None => continue,
            };
            for food_id in hits {
                let Some(item) = self.world.consume_food(food_id) else {
                    continue;
                };
                if let Some(player) = self.world.players.get_mut(&player_id) {
                    player.score += item.value;
                }
                // Keep the population steady with a fresh item elsewhere
                self.world.spawn_food();
            }
        }

        // Phase 3: eliminations. The scan runs over the fully advanced
        // state and removals apply only afterwards, so head-on players
        // take each other out in the same tick.
        let victims = collision::check_eliminations(&self.world.players);
        for player_id in victims {
            self.eliminate_player(player_id, &mut pending);
        }
        let collision_time = collision_start.elapsed();

        // Phase 4: death drops may have pushed the pool over its slack
        let evicted = self
            .world
            .evict_food(self.config.food.max_food, self.config.food.overflow_margin);
        if evicted > 0 {
            debug!("Evicted {} oldest food over capacity", evicted);
        }

        // Phase 5: snapshot for this tick's gameUpdate
        let broadcast_start = std::time::Instant::now();
        let (players, food) = self.build_views();
        pending.snapshot = Some(SnapshotBroadcast { players, food });
        let broadcast_time = broadcast_start.elapsed();

        if self.tick_count % 400 == 0 {
            let counts = self.world.counts();
            debug!(
                "Tick #{}: {:.2}ms total | move={:.2}ms collision={:.2}ms broadcast={:.2}ms | {} players, {} food",
                self.tick_count,
                tick_start.elapsed().as_secs_f64() * 1000.0,
                move_time.as_secs_f64() * 1000.0,
                collision_time.as_secs_f64() * 1000.0,
                broadcast_time.as_secs_f64() * 1000.0,
                counts.players,
                counts.food,
            );
        }

        pending
    }

    /// Build the view lists shared by snapshots and join replies.
    fn build_views(&self) -> (Vec<PlayerView>, Vec<FoodView>) {
        let players = self.world.players.values().map(player_view).collect();
        let food = self.world.food.iter().map(food_view).collect();
        (players, food)
    }

    fn world_view(&self) -> WorldView {
        match self.world.boundary {
            Boundary::Wrap { width, height } => WorldView::Wrap { width, height },
            Boundary::ClampCircle { center, radius, .. } => WorldView::Circle { center, radius },
        }
    }

    /// Read-only counts for the health endpoint.
    pub fn status(&self) -> Counts {
        self.world.counts()
    }
}

fn player_view(player: &Player) -> PlayerView {
    PlayerView {
        id: player.id,
        name: player.name.clone(),
        position: player.position,
        direction: player.direction,
        body: player.body.iter().copied().collect(),
        score: player.score,
        length: player.display_length(),
        head_radius: player.head_radius(),
        color: player.color.clone(),
    }
}

fn food_view(food: &crate::entity::Food) -> FoodView {
    FoodView {
        id: food.id,
        position: food.position,
        value: food.value,
        color: food.color.clone(),
    }
}

/// Drive the fixed-rate simulation loop for the lifetime of the process.
pub async fn run_game_loop(state: Arc<RwLock<GameState>>, tick_interval_ms: u64) {
    let start = Instant::now() + Duration::from_millis(tick_interval_ms);
    let mut ticker = interval_at(start, Duration::from_millis(tick_interval_ms));
    // Use Skip to catch up on missed ticks - ensures consistent game speed.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Initial food fill; a circular world still waiting on its radius
    // fills at first join instead
    {
        let mut game = state.write().await;
        if !game.awaiting_radius() {
            let max_food = game.config.food.max_food;
            game.world.fill_food(max_food);
            info!("World initialized: {} food", game.world.food.len());
        }
    }

    loop {
        let scheduled = ticker.tick().await;

        // Hibernate when no users are connected to reduce CPU usage
        {
            let game = state.read().await;
            if game.clients.is_empty() {
                drop(game);
                sleep(Duration::from_millis((tick_interval_ms * 4).max(100))).await;
                continue;
            }
        }

        // Drain any backlog of tick events so we always process the most
        // recent tick. This keeps player inputs up-to-date when the server
        // falls behind.
        let mut skipped = 0u32;
        while ticker.tick().now_or_never().is_some() {
            skipped += 1;
        }
        if skipped > 0 {
            debug!(
                "Skipped {} ticks to stay current (lag: {:?})",
                skipped,
                Instant::now().saturating_duration_since(scheduled)
            );
        }

        // Run tick and extract pending broadcasts
        let pending = {
            let mut game = state.write().await;
            let tick_start = std::time::Instant::now();
            let pending = game.tick();
            let tick_ms = tick_start.elapsed().as_secs_f64() * 1000.0;

            // Exponential moving average (weight 0.5, matches typical server stat smoothing)
            game.update_time_avg = game.update_time_avg * 0.5 + tick_ms * 0.5;

            let tick_budget = tick_interval_ms as f64 * 0.9;
            if tick_ms > tick_budget {
                warn!(
                    "Slow tick #{}: {:.3}ms (budget: {:.1}ms, avg: {:.3}ms) - {} players, {} food",
                    game.tick_count,
                    tick_ms,
                    tick_budget,
                    game.update_time_avg,
                    game.world.players.len(),
                    game.world.food.len()
                );
            }

            pending
        }; // Write lock released here

        // Clone channel senders once with a single read lock
        let (snapshot_tx, event_tx, targeted_tx) = {
            let game = state.read().await;
            (
                game.snapshot_tx.clone(),
                game.event_tx.clone(),
                game.targeted_tx.clone(),
            )
        }; // Read lock released here

        // Send without holding any lock; send errors just mean nobody is
        // subscribed right now
        if let Some(snapshot) = pending.snapshot {
            let _ = snapshot_tx.send(snapshot);
        }
        for event in pending.events {
            let _ = event_tx.send(event);
        }
        for message in pending.targeted {
            let _ = targeted_tx.send(message);
        }
    }
}
