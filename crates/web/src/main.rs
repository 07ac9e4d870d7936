//! Battle Server - WebSocket front end for the battle coordinator.
//!
//! This server:
//! - Accepts client connections on /ws (optional `?userID=` binds the player up front)
//! - Translates JSON `{"event", "data"}` frames into coordinator calls
//! - Pushes each client's queued events back down its socket
//! - Exposes /api/battles (JSON snapshot) and /healthz

use axum::{
    Json, Router,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use battle_core::{Action, PlayerId};
use battle_server::{BattleCoordinator, ClientEvent, ConnectionHandle, Overview, ServerConfig};
use clap::Parser;
use serde::Deserialize;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "battle-server")]
#[command(about = "Turn-based battle coordinator over WebSocket")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Seed for damage rolls (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
}

struct AppState {
    coordinator: Arc<BattleCoordinator>,
}

#[derive(Debug, Deserialize)]
struct ConnectQuery {
    #[serde(rename = "userID")]
    user_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = ServerConfig {
        seed: args.seed,
        ..ServerConfig::default()
    };
    let state = Arc::new(AppState {
        coordinator: Arc::new(BattleCoordinator::new(config)),
    });

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/battles", get(list_battles))
        .route("/healthz", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Battle server listening on http://{}", addr);
    tracing::info!("WebSocket endpoint at ws://{}/ws", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn list_battles(State(state): State<Arc<AppState>>) -> Json<Overview> {
    Json(state.coordinator.overview().await)
}

async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let player = player_from_query(query.user_id);
    let coordinator = state.coordinator.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, coordinator, player))
}

/// Browser clients send the literal "undefined" when they have no id yet.
fn player_from_query(user_id: Option<String>) -> Option<PlayerId> {
    user_id
        .filter(|id| !id.is_empty() && id != "undefined")
        .map(PlayerId::from)
}

/// Pump one client: inbound frames go to the coordinator, queued events go
/// out, and closing the socket unregisters whoever this connection was bound to.
async fn handle_socket(
    mut socket: WebSocket,
    coordinator: Arc<BattleCoordinator>,
    player: Option<PlayerId>,
) {
    let (handle, mut outbox) = coordinator.connect();
    let mut bound = None;
    if let Some(player) = player {
        coordinator.register(player.clone(), handle.clone()).await;
        bound = Some(player);
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    handle_frame(&coordinator, &handle, &mut bound, text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("Connection {} read error: {}", handle.id().0, e);
                    break;
                }
            },
            outgoing = outbox.recv() => {
                let Some(event) = outgoing else { break };
                let json = match event.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!("Failed to encode {:?}: {}", event, e);
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!("Connection {} closed", handle.id().0);
    if let Some(player) = bound {
        coordinator.unregister(&player, handle.id()).await;
    }
}

async fn handle_frame(
    coordinator: &BattleCoordinator,
    handle: &ConnectionHandle,
    bound: &mut Option<PlayerId>,
    text: &str,
) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Ignoring malformed frame on connection {}: {}", handle.id().0, e);
            return;
        }
    };

    let address = event.address().clone();
    if let Some(player) = bound.as_ref() {
        if *player != address {
            tracing::debug!(
                "Connection {} is bound to {} but sent as {}; dropped",
                handle.id().0,
                player,
                address
            );
            return;
        }
    }

    match event {
        ClientEvent::Setup { .. } => {
            *bound = Some(address.clone());
            coordinator.setup(address, handle.clone()).await;
        }
        ClientEvent::PlayerAttack { .. } => {
            submit(coordinator, handle, bound, &address, Action::Attack).await
        }
        ClientEvent::PlayerDefend { .. } => {
            submit(coordinator, handle, bound, &address, Action::Defend).await
        }
        ClientEvent::ResetBattle { .. } => {
            if bound.is_none() {
                return;
            }
            if let Err(e) = coordinator.reset_battle(&address, handle.id()).await {
                tracing::debug!("Reset from {} ignored: {}", address, e);
            }
        }
    }
}

/// Actions only count once the connection has claimed a player via setup or
/// the connect query.
async fn submit(
    coordinator: &BattleCoordinator,
    handle: &ConnectionHandle,
    bound: &Option<PlayerId>,
    player: &PlayerId,
    action: Action,
) {
    if bound.is_none() {
        tracing::debug!("Dropped {:?} from unbound connection", action);
        return;
    }
    if let Err(e) = coordinator.submit_action(player, handle.id(), action).await {
        tracing::warn!("{:?} from {} ended its battle: {}", action, player, e);
    }
}
