use battle_core::{Action, PlayerId};
use battle_server::{BattleCoordinator, BattleWinner, ConnectionId, ServerConfig, ServerEvent};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

#[tokio::main]
async fn main() {
    println!("=== Battle Coordinator Demo ===\n");

    let config = ServerConfig {
        seed: Some(42),
        ..ServerConfig::default()
    };
    let coordinator = Arc::new(BattleCoordinator::new(config));

    // Spawn two bots; they pair as soon as both have declared readiness.
    let alice = tokio::spawn(run_player(Arc::clone(&coordinator), "Alice", 40));
    let bob = tokio::spawn(run_player(Arc::clone(&coordinator), "Bob", 30));

    let _ = tokio::join!(alice, bob);

    println!("\n=== Final State ===");
    let overview = coordinator.overview().await;
    println!("Active battles: {}", overview.battles.len());
    println!("Waiting players: {}", overview.waiting.len());
}

/// Play until the battle ends: attack while healthy, defend below
/// `defend_below`.
async fn run_player(coordinator: Arc<BattleCoordinator>, name: &'static str, defend_below: i32) {
    let player = PlayerId::from(name);
    let (handle, mut events) = coordinator.connect();
    let connection = handle.id();

    coordinator.setup(player.clone(), handle).await;
    println!("[{}] Ready for battle", name);

    let bot = Bot {
        coordinator: &coordinator,
        player: &player,
        connection,
        defend_below,
    };
    let winner = bot.play(&mut events).await;
    match winner {
        Some(BattleWinner::Player(w)) if w == player => println!("[{}] Victory!", name),
        Some(winner) => println!("[{}] Battle over, winner: {}", name, winner),
        None => println!("[{}] Connection closed", name),
    }
}

struct Bot<'a> {
    coordinator: &'a BattleCoordinator,
    player: &'a PlayerId,
    connection: ConnectionId,
    defend_below: i32,
}

impl Bot<'_> {
    /// A hand-off after an action arrives as `turnUpdate` then `healthUpdate`,
    /// so the move waits for the health that goes with it. The opening turn
    /// has no health event and is played at once.
    async fn play(&self, events: &mut UnboundedReceiver<ServerEvent>) -> Option<BattleWinner> {
        let mut my_health = 100;
        let mut pending_turn = None;
        while let Some(event) = events.recv().await {
            match event {
                ServerEvent::Connected => {}
                ServerEvent::BattleStart => println!("[{}] Battle started!", self.player),
                ServerEvent::HealthUpdate {
                    player_health,
                    opponent_health,
                } => {
                    my_health = player_health;
                    println!(
                        "[{}] Health {} vs opponent {}",
                        self.player, player_health, opponent_health
                    );
                    if let Some(turn) = pending_turn.take() {
                        self.act(turn, my_health).await;
                    }
                }
                ServerEvent::TurnUpdate {
                    current_turn,
                    player_turn,
                } => {
                    if !player_turn {
                        continue;
                    }
                    if current_turn == 1 {
                        self.act(current_turn, my_health).await;
                    } else {
                        pending_turn = Some(current_turn);
                    }
                }
                ServerEvent::BattleEnd { winner } => return Some(winner),
            }
        }
        None
    }

    async fn act(&self, turn: u64, my_health: i32) {
        let action = if my_health < self.defend_below {
            Action::Defend
        } else {
            Action::Attack
        };
        println!("[{}] Turn {}: {:?}", self.player, turn, action);
        if let Err(e) = self
            .coordinator
            .submit_action(self.player, self.connection, action)
            .await
        {
            println!("[{}] Battle aborted: {}", self.player, e);
        }
    }
}
