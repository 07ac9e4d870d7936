use battle_core::{Action, DamageRange, DamageSource, Health, PlayerId, ResolveError};
use battle_server::{
    BattleCoordinator, BattleWinner, ConnectionHandle, CoordinatorError, ServerConfig,
    ServerEvent,
};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Plays back fixed rolls, then repeats `fallback`.
struct ScriptedDamage {
    rolls: VecDeque<Health>,
    fallback: Health,
}

impl DamageSource for ScriptedDamage {
    fn roll(&mut self, _range: DamageRange) -> Health {
        self.rolls.pop_front().unwrap_or(self.fallback)
    }
}

fn coordinator(rolls: &[Health], fallback: Health) -> BattleCoordinator {
    BattleCoordinator::with_damage_source(
        ServerConfig::default(),
        Box::new(ScriptedDamage {
            rolls: rolls.iter().copied().collect(),
            fallback,
        }),
    )
}

struct Client {
    player: PlayerId,
    handle: ConnectionHandle,
    rx: UnboundedReceiver<ServerEvent>,
}

impl Client {
    async fn join(coordinator: &BattleCoordinator, name: &str) -> Client {
        let (handle, mut rx) = coordinator.connect();
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::Connected);
        coordinator.setup(name.into(), handle.clone()).await;
        Client {
            player: name.into(),
            handle,
            rx,
        }
    }

    fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

fn turn(current_turn: u64, player_turn: bool) -> ServerEvent {
    ServerEvent::TurnUpdate {
        current_turn,
        player_turn,
    }
}

fn health(player_health: Health, opponent_health: Health) -> ServerEvent {
    ServerEvent::HealthUpdate {
        player_health,
        opponent_health,
    }
}

fn battle_end(winner: BattleWinner) -> ServerEvent {
    ServerEvent::BattleEnd { winner }
}

#[tokio::test]
async fn test_two_players_start_a_battle() {
    let coordinator = coordinator(&[], 15);
    let mut a = Client::join(&coordinator, "alice").await;
    assert!(a.drain().is_empty());
    assert!(coordinator.is_waiting(&a.player).await);

    let mut b = Client::join(&coordinator, "bob").await;

    assert_eq!(a.drain(), vec![ServerEvent::BattleStart, turn(1, true)]);
    assert_eq!(b.drain(), vec![ServerEvent::BattleStart, turn(1, false)]);

    let battle = coordinator.battle_of(&a.player).await.unwrap();
    assert_eq!(battle.current_turn, a.player);
    assert_eq!(battle.turn_counter, 1);
    assert!(battle.participants.iter().all(|p| p.health == 100));
    assert!(!coordinator.is_waiting(&a.player).await);
}

#[tokio::test]
async fn test_attack_hands_off_turn_and_updates_health() {
    let coordinator = coordinator(&[17], 15);
    let mut a = Client::join(&coordinator, "alice").await;
    let mut b = Client::join(&coordinator, "bob").await;
    a.drain();
    b.drain();

    let outcome = coordinator
        .submit_action(&a.player, a.handle.id(), Action::Attack)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.amount, 17);
    assert_eq!(outcome.winner, None);

    assert_eq!(a.drain(), vec![turn(2, false), health(100, 83)]);
    assert_eq!(b.drain(), vec![turn(2, true), health(83, 100)]);

    let battle = coordinator.battle_of(&b.player).await.unwrap();
    assert_eq!(battle.current_turn, b.player);
}

#[tokio::test]
async fn test_out_of_turn_actions_are_silent_no_ops() {
    let coordinator = coordinator(&[20], 15);
    let mut a = Client::join(&coordinator, "alice").await;
    let mut b = Client::join(&coordinator, "bob").await;
    a.drain();
    b.drain();

    // Bob moves before his turn.
    let result = coordinator.submit_action(&b.player, b.handle.id(), Action::Attack).await;
    assert_eq!(result, Ok(None));
    assert!(a.drain().is_empty());
    assert!(b.drain().is_empty());
    let battle = coordinator.battle_of(&a.player).await.unwrap();
    assert_eq!(battle.turn_counter, 1);
    assert_eq!(battle.current_turn, a.player);

    // Alice attacks, then tries again before Bob has moved.
    coordinator
        .submit_action(&a.player, a.handle.id(), Action::Attack)
        .await
        .unwrap();
    a.drain();
    b.drain();
    let result = coordinator.submit_action(&a.player, a.handle.id(), Action::Defend).await;
    assert_eq!(result, Ok(None));
    assert!(a.drain().is_empty());
    assert!(b.drain().is_empty());
    let battle = coordinator.battle_of(&a.player).await.unwrap();
    assert_eq!(battle.turn_counter, 2);
}

#[tokio::test]
async fn test_action_without_battle_is_dropped() {
    let coordinator = coordinator(&[], 15);
    let mut a = Client::join(&coordinator, "alice").await;

    let result = coordinator.submit_action(&a.player, a.handle.id(), Action::Attack).await;
    assert_eq!(result, Ok(None));
    assert!(a.drain().is_empty());

    let result = coordinator
        .submit_action(&"stranger".into(), a.handle.id(), Action::Defend)
        .await;
    assert_eq!(result, Ok(None));
}

#[tokio::test]
async fn test_knockout_ends_battle_for_both() {
    let coordinator = coordinator(&[], 29);
    let mut a = Client::join(&coordinator, "alice").await;
    let mut b = Client::join(&coordinator, "bob").await;

    // Alice only defends; Bob hits for 29 each turn.
    // 100 -> 71 -> 81 -> 52 -> 62 -> 33 -> 43 -> 14 -> 24 -> -5
    for round in 0..5 {
        coordinator
            .submit_action(&a.player, a.handle.id(), Action::Defend)
            .await
            .unwrap()
            .unwrap();
        let outcome = coordinator
            .submit_action(&b.player, b.handle.id(), Action::Attack)
            .await
            .unwrap()
            .unwrap();
        if round < 4 {
            assert_eq!(outcome.winner, None);
        } else {
            assert_eq!(outcome.winner, Some(b.player.clone()));
        }
    }

    let a_events = a.drain();
    let b_events = b.drain();
    assert_eq!(
        a_events[a_events.len() - 2..],
        [health(-5, 100), battle_end(BattleWinner::Player(b.player.clone()))]
    );
    assert_eq!(
        b_events[b_events.len() - 2..],
        [health(100, -5), battle_end(BattleWinner::Player(b.player.clone()))]
    );

    assert!(coordinator.battle_of(&a.player).await.is_none());
    assert!(coordinator.battle_of(&b.player).await.is_none());

    // Nothing referencing the old battle is accepted.
    assert_eq!(
        coordinator.submit_action(&b.player, b.handle.id(), Action::Attack).await,
        Ok(None)
    );
    assert_eq!(
        coordinator.submit_action(&a.player, a.handle.id(), Action::Attack).await,
        Ok(None)
    );
    assert!(a.drain().is_empty());
    assert!(b.drain().is_empty());
}

#[tokio::test]
async fn test_disconnect_mid_battle_notifies_opponent() {
    let coordinator = coordinator(&[], 15);
    let mut a = Client::join(&coordinator, "alice").await;
    let mut b = Client::join(&coordinator, "bob").await;
    a.drain();
    b.drain();

    assert!(coordinator.unregister(&b.player, b.handle.id()).await);

    assert_eq!(
        a.drain(),
        vec![battle_end(BattleWinner::OpponentDisconnected)]
    );
    assert!(coordinator.battle_of(&a.player).await.is_none());

    // Alice can queue again.
    assert!(coordinator.declare_ready(a.player.clone()).await);
    assert!(coordinator.is_waiting(&a.player).await);
}

#[tokio::test]
async fn test_disconnect_while_waiting_removes_readiness() {
    let coordinator = coordinator(&[], 15);
    let a = Client::join(&coordinator, "alice").await;
    assert!(coordinator.unregister(&a.player, a.handle.id()).await);
    assert!(!coordinator.is_waiting(&a.player).await);

    let mut b = Client::join(&coordinator, "bob").await;
    assert!(b.drain().is_empty());
    assert!(coordinator.battle_of(&b.player).await.is_none());
}

#[tokio::test]
async fn test_ready_while_fighting_is_ignored() {
    let coordinator = coordinator(&[], 15);
    let mut a = Client::join(&coordinator, "alice").await;
    let _b = Client::join(&coordinator, "bob").await;
    a.drain();

    assert!(!coordinator.declare_ready(a.player.clone()).await);
    assert!(!coordinator.is_waiting(&a.player).await);

    let mut c = Client::join(&coordinator, "carol").await;
    assert!(c.drain().is_empty());
    assert!(a.drain().is_empty());

    let overview = coordinator.overview().await;
    assert_eq!(overview.battles.len(), 1);
    assert_eq!(overview.waiting, vec![c.player.clone()]);
}

#[tokio::test]
async fn test_players_pair_in_arrival_order() {
    let coordinator = coordinator(&[], 15);
    let mut clients = Vec::new();
    for name in ["p0", "p1", "p2", "p3", "p4"] {
        clients.push(Client::join(&coordinator, name).await);
    }

    let overview = coordinator.overview().await;
    assert_eq!(overview.connections, 5);
    assert_eq!(overview.waiting, vec![PlayerId::from("p4")]);
    assert_eq!(overview.battles.len(), 2);

    let pairs: Vec<(String, String)> = overview
        .battles
        .iter()
        .map(|b| {
            (
                b.participants[0].player.to_string(),
                b.participants[1].player.to_string(),
            )
        })
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("p0".to_string(), "p1".to_string()),
            ("p2".to_string(), "p3".to_string()),
        ]
    );
    assert_eq!(overview.battles[0].current_turn, PlayerId::from("p0"));
    assert_eq!(overview.battles[1].current_turn, PlayerId::from("p2"));

    // p4 has seen nothing; p5 completes the third pair.
    assert!(clients[4].drain().is_empty());
    let mut p5 = Client::join(&coordinator, "p5").await;
    assert_eq!(p5.drain(), vec![ServerEvent::BattleStart, turn(1, false)]);
    assert_eq!(
        clients[4].drain(),
        vec![ServerEvent::BattleStart, turn(1, true)]
    );
}

#[tokio::test]
async fn test_reconnect_supersedes_old_connection() {
    let coordinator = coordinator(&[12], 15);
    let mut a_old = Client::join(&coordinator, "alice").await;
    let mut b = Client::join(&coordinator, "bob").await;
    a_old.drain();
    b.drain();

    let mut a_new = Client::join(&coordinator, "alice").await;
    // Still one battle; the second setup only swapped the connection.
    assert_eq!(coordinator.overview().await.battles.len(), 1);

    // The stale connection closing leaves the battle alone.
    assert!(!coordinator.unregister(&a_old.player, a_old.handle.id()).await);
    assert!(coordinator.battle_of(&b.player).await.is_some());

    coordinator
        .submit_action(&a_new.player, a_new.handle.id(), Action::Attack)
        .await
        .unwrap();
    assert!(a_old.drain().is_empty());
    assert_eq!(a_new.drain(), vec![turn(2, false), health(100, 88)]);
}

#[tokio::test]
async fn test_superseded_connection_cannot_act() {
    let coordinator = coordinator(&[], 15);
    let mut a_old = Client::join(&coordinator, "alice").await;
    let mut a_new = Client::join(&coordinator, "alice").await;
    let mut b = Client::join(&coordinator, "bob").await;
    a_old.drain();
    a_new.drain();
    b.drain();

    let result = coordinator
        .submit_action(&a_old.player, a_old.handle.id(), Action::Attack)
        .await;
    assert_eq!(result, Ok(None));
    let result = coordinator
        .submit_action(&a_old.player, a_old.handle.id(), Action::Defend)
        .await;
    assert_eq!(result, Ok(None));
    assert_eq!(
        coordinator.reset_battle(&a_old.player, a_old.handle.id()).await,
        Err(CoordinatorError::StaleConnection)
    );

    let battle = coordinator.battle_of(&b.player).await.unwrap();
    assert_eq!(battle.turn_counter, 1);
    assert!(a_old.drain().is_empty());
    assert!(a_new.drain().is_empty());
    assert!(b.drain().is_empty());

    // The live connection still plays.
    coordinator
        .submit_action(&a_new.player, a_new.handle.id(), Action::Attack)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(b.drain(), vec![turn(2, true), health(85, 100)]);
}

#[tokio::test]
async fn test_reset_ends_battle() {
    let coordinator = coordinator(&[], 15);
    let mut a = Client::join(&coordinator, "alice").await;
    let mut b = Client::join(&coordinator, "bob").await;
    a.drain();
    b.drain();

    coordinator.reset_battle(&b.player, b.handle.id()).await.unwrap();
    assert_eq!(a.drain(), vec![battle_end(BattleWinner::Reset)]);
    assert_eq!(b.drain(), vec![battle_end(BattleWinner::Reset)]);
    assert!(coordinator.battle_of(&a.player).await.is_none());

    assert_eq!(
        coordinator.reset_battle(&b.player, b.handle.id()).await,
        Err(CoordinatorError::NoActiveSession)
    );
}

#[tokio::test]
async fn test_out_of_range_damage_aborts_only_that_battle() {
    let coordinator = coordinator(&[30], 15);
    let mut a = Client::join(&coordinator, "alice").await;
    let mut b = Client::join(&coordinator, "bob").await;
    let mut c = Client::join(&coordinator, "carol").await;
    let mut d = Client::join(&coordinator, "dave").await;
    for client in [&mut a, &mut b, &mut c, &mut d] {
        client.drain();
    }

    let result = coordinator.submit_action(&a.player, a.handle.id(), Action::Attack).await;
    assert!(matches!(
        result,
        Err(CoordinatorError::SessionAborted(ResolveError::Damage(_)))
    ));
    assert_eq!(a.drain(), vec![battle_end(BattleWinner::Aborted)]);
    assert_eq!(b.drain(), vec![battle_end(BattleWinner::Aborted)]);

    // The other battle carries on.
    assert!(c.drain().is_empty());
    let outcome = coordinator
        .submit_action(&c.player, c.handle.id(), Action::Attack)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.amount, 15);
    assert_eq!(d.drain(), vec![turn(2, true), health(85, 100)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_actions_are_totally_ordered() {
    let coordinator = Arc::new(coordinator(&[], 10));
    let a = Client::join(&coordinator, "alice").await;
    let b = Client::join(&coordinator, "bob").await;

    let mut tasks = Vec::new();
    for i in 0..12 {
        let coordinator = Arc::clone(&coordinator);
        let (player, connection) = if i % 2 == 0 {
            (a.player.clone(), a.handle.id())
        } else {
            (b.player.clone(), b.handle.id())
        };
        tasks.push(tokio::spawn(async move {
            coordinator
                .submit_action(&player, connection, Action::Attack)
                .await
                .unwrap()
                .is_some()
        }));
    }

    let mut accepted = 0u64;
    for task in tasks {
        if task.await.unwrap() {
            accepted += 1;
        }
    }

    // Accepted attacks alternate alice, bob, alice, ... starting with alice.
    let battle = coordinator.battle_of(&a.player).await.unwrap();
    assert_eq!(battle.turn_counter, 1 + accepted);
    let by_alice = (accepted + 1) / 2;
    let by_bob = accepted / 2;
    let health_of = |name: &str| {
        battle
            .participants
            .iter()
            .find(|p| p.player.as_str() == name)
            .unwrap()
            .health
    };
    assert_eq!(health_of("bob"), 100 - 10 * by_alice as Health);
    assert_eq!(health_of("alice"), 100 - 10 * by_bob as Health);
}

#[tokio::test]
async fn test_seeded_coordinator_rolls_within_range() {
    let coordinator = BattleCoordinator::new(ServerConfig {
        seed: Some(99),
        ..ServerConfig::default()
    });
    let a = Client::join(&coordinator, "alice").await;
    let b = Client::join(&coordinator, "bob").await;

    for _ in 0..3 {
        for client in [&a, &b] {
            let outcome = coordinator
                .submit_action(&client.player, client.handle.id(), Action::Attack)
                .await
                .unwrap()
                .unwrap();
            assert!((10..=29).contains(&outcome.amount));
        }
    }
}
