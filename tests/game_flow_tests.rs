use std::time::{Duration, Instant};

use broadside::{
    AbandonOutcome, ActionKind, Board, BoardError, Game, GameError, GameState, Orientation, RematchStep, Role,
    ShipPlacement, ShotResult, BOT_USER_ID,
};
use rand::{rngs::SmallRng, SeedableRng};

const HOST: u64 = 10;
const GUEST: u64 = 20;
const WINDOW: Duration = Duration::from_secs(30);

/// Standard fleet laid out on rows 0, 2, 4, 6 and 8 from the left edge.
fn row_fleet() -> Vec<ShipPlacement> {
    [(0, 5), (2, 4), (4, 3), (6, 3), (8, 2)]
        .iter()
        .map(|&(y, size)| ShipPlacement::new(0, y, size, Orientation::Horizontal))
        .collect()
}

fn row_fleet_cells() -> Vec<(u8, u8)> {
    row_fleet()
        .iter()
        .flat_map(|p| (0..p.size).map(move |i| (p.x + i, p.y)))
        .collect()
}

fn started_game() -> Game {
    let mut game = Game::seated(1, HOST, GUEST, None);
    assert!(!game.place_ships(HOST, &row_fleet()).unwrap());
    assert!(game.place_ships(GUEST, &row_fleet()).unwrap());
    game
}

fn finished_game() -> Game {
    let mut game = started_game();
    for (x, y) in row_fleet_cells() {
        game.attack(HOST, x, y).unwrap();
    }
    assert_eq!(game.state(), GameState::Finished);
    game
}

#[test]
fn joining_fills_host_then_guest() {
    let mut game = Game::new(1);
    assert_eq!(game.state(), GameState::WaitingForPlayers);
    assert_eq!(game.join(HOST).unwrap(), Role::Host);
    assert_eq!(game.state(), GameState::WaitingForPlayers);
    assert_eq!(game.join(HOST), Err(GameError::AlreadyJoined));
    assert_eq!(game.join(GUEST).unwrap(), Role::Guest);
    assert_eq!(game.state(), GameState::WaitingForPlayer1Ships);
    assert_eq!(game.join(30), Err(GameError::GameFull));
}

#[test]
fn placement_advances_states() {
    let mut game = Game::seated(1, HOST, GUEST, None);
    assert_eq!(game.state(), GameState::WaitingForPlayer1Ships);
    assert!(!game.place_ships(HOST, &row_fleet()).unwrap());
    assert_eq!(game.state(), GameState::WaitingForPlayer2Ships);
    assert_eq!(game.place_ships(HOST, &row_fleet()), Err(GameError::ShipsAlreadyPlaced));
    assert!(game.place_ships(GUEST, &row_fleet()).unwrap());
    assert_eq!(game.state(), GameState::WaitingForPlayer1Shot);
    assert_eq!(game.turn(), Some(Role::Host));
}

#[test]
fn guest_may_place_first() {
    let mut game = Game::seated(1, HOST, GUEST, None);
    assert!(!game.place_ships(GUEST, &row_fleet()).unwrap());
    assert_eq!(game.state(), GameState::WaitingForPlayer1Ships);
    assert!(game.place_ships(HOST, &row_fleet()).unwrap());
    assert_eq!(game.state(), GameState::WaitingForPlayer1Shot);
}

#[test]
fn invalid_fleets_change_nothing() {
    let mut game = Game::seated(1, HOST, GUEST, None);

    let short = &row_fleet()[..4];
    assert!(matches!(game.place_ships(HOST, short), Err(GameError::InvalidFleet(_))));

    let mut overlapping = row_fleet();
    overlapping[1] = ShipPlacement::new(0, 0, 4, Orientation::Vertical);
    assert!(matches!(
        game.place_ships(HOST, &overlapping),
        Err(GameError::Board(BoardError::InvalidPlacement { .. }))
    ));

    assert_eq!(game.state(), GameState::WaitingForPlayer1Ships);
    assert!(!game.board(Role::Host).has_fleet());
    assert!(!game.participant(HOST).unwrap().ready);
    assert!(!game.place_ships(HOST, &row_fleet()).unwrap());
}

#[test]
fn strangers_cannot_act() {
    let mut game = started_game();
    assert_eq!(
        game.attack(99, 9, 9),
        Err(GameError::UnknownParticipant { game: 1, user: 99 })
    );
    assert!(matches!(game.snapshot(99), Err(GameError::UnknownParticipant { .. })));
}

#[test]
fn misses_alternate_the_turn() {
    let mut game = started_game();
    for i in 0..10u8 {
        let (shooter, waiting) = if i % 2 == 0 { (HOST, GUEST) } else { (GUEST, HOST) };
        assert_eq!(game.attack(waiting, 9, 9 - i / 2), Err(GameError::NotYourTurn));
        let outcome = game.attack(shooter, 9, i / 2).unwrap();
        assert_eq!(outcome.result, ShotResult::Miss);
        assert_eq!(outcome.shooter, shooter);
        let next = if i % 2 == 0 { Role::Guest } else { Role::Host };
        assert_eq!(game.turn(), Some(next));
    }
    let shots = game.actions().iter().filter(|a| a.kind == ActionKind::Attack).count();
    assert_eq!(shots, 10);
}

#[test]
fn hits_keep_the_turn() {
    let mut game = started_game();
    assert_eq!(game.attack(HOST, 0, 0).unwrap().result, ShotResult::Hit);
    assert_eq!(game.turn(), Some(Role::Host));
    assert_eq!(game.attack(HOST, 0, 8).unwrap().result, ShotResult::Hit);
    assert_eq!(game.attack(HOST, 1, 8).unwrap().result, ShotResult::Sunk);
    assert_eq!(game.turn(), Some(Role::Host));
    assert_eq!(
        game.attack(HOST, 1, 8),
        Err(GameError::Board(BoardError::AlreadyAttacked { x: 1, y: 8 }))
    );
    assert_eq!(game.turn(), Some(Role::Host));
}

#[test]
fn winner_is_recorded_once() {
    let mut game = started_game();
    let cells = row_fleet_cells();
    let (last, rest) = cells.split_last().unwrap();
    for &(x, y) in rest {
        assert!(game.attack(HOST, x, y).unwrap().winner.is_none());
    }
    let outcome = game.attack(HOST, last.0, last.1).unwrap();
    assert_eq!(outcome.result, ShotResult::Sunk);
    assert_eq!(outcome.winner, Some(HOST));
    assert_eq!(game.state(), GameState::Finished);
    assert_eq!(game.winner(), Some(HOST));

    assert!(matches!(game.attack(HOST, 9, 9), Err(GameError::InvalidStage { .. })));
    assert!(matches!(game.pass_turn(GUEST), Err(GameError::InvalidStage { .. })));
    let finished = game.actions().iter().filter(|a| a.kind == ActionKind::Finished).count();
    assert_eq!(finished, 1);
}

#[test]
fn passing_hands_over_the_turn() {
    let mut game = started_game();
    assert_eq!(game.pass_turn(GUEST), Err(GameError::NotYourTurn));
    assert_eq!(game.pass_turn(HOST).unwrap(), Role::Guest);
    assert_eq!(game.state(), GameState::WaitingForPlayer2Shot);
    assert_eq!(game.pass_turn(GUEST).unwrap(), Role::Host);
}

#[test]
fn abandoning_mid_game_gives_the_other_the_win() {
    let mut game = started_game();
    assert_eq!(game.abandon(GUEST).unwrap(), AbandonOutcome::Finished { winner: HOST });
    assert_eq!(game.state(), GameState::Finished);
    assert_eq!(game.winner(), Some(HOST));
    assert!(!game.participant(GUEST).unwrap().is_active());
    assert_eq!(game.abandon(HOST).unwrap(), AbandonOutcome::AfterFinish);
    assert_eq!(game.winner(), Some(HOST));
}

#[test]
fn last_one_out_resets_the_game() {
    let mut game = Game::new(7);
    game.join(HOST).unwrap();
    assert_eq!(game.abandon(HOST).unwrap(), AbandonOutcome::Reset);
    assert_eq!(game.state(), GameState::WaitingForPlayers);
    assert_eq!(game.active_count(), 0);
    assert_eq!(game.abandon(HOST), Err(GameError::UnknownParticipant { game: 7, user: HOST }));

    assert_eq!(game.join(GUEST).unwrap(), Role::Host);
    assert_eq!(game.role_of(GUEST), Some(Role::Host));
}

#[test]
fn roles_can_be_swapped_before_placement() {
    let mut game = Game::seated(1, HOST, GUEST, None);
    game.reassign_roles(GUEST).unwrap();
    assert_eq!(game.role_of(GUEST), Some(Role::Host));
    assert_eq!(game.role_of(HOST), Some(Role::Guest));

    game.place_ships(HOST, &row_fleet()).unwrap();
    assert!(matches!(game.reassign_roles(HOST), Err(GameError::InvalidStage { .. })));
}

#[test]
fn rematch_inside_the_window() {
    let mut game = finished_game();
    let t0 = Instant::now();
    assert_eq!(game.request_rematch(HOST, t0, WINDOW).unwrap(), RematchStep::Requested);
    assert_eq!(
        game.request_rematch(HOST, t0 + Duration::from_secs(1), WINDOW),
        Err(GameError::RematchAlreadyRequested)
    );
    assert_eq!(
        game.request_rematch(GUEST, t0 + Duration::from_secs(30), WINDOW).unwrap(),
        RematchStep::Accepted {
            host: HOST,
            guest: GUEST
        }
    );
    game.record_rematch(2);
    assert_eq!(game.rematch_game(), Some(2));
    assert_eq!(
        game.request_rematch(GUEST, t0 + Duration::from_secs(31), WINDOW),
        Err(GameError::RematchExists(2))
    );
}

#[test]
fn expired_rematch_window_starts_over() {
    let mut game = finished_game();
    let t0 = Instant::now();
    assert_eq!(game.request_rematch(HOST, t0, WINDOW).unwrap(), RematchStep::Requested);
    let late = t0 + Duration::from_secs(31);
    assert_eq!(game.request_rematch(GUEST, late, WINDOW).unwrap(), RematchStep::Requested);
    assert_eq!(
        game.request_rematch(HOST, late + Duration::from_secs(5), WINDOW).unwrap(),
        RematchStep::Accepted {
            host: HOST,
            guest: GUEST
        }
    );
}

#[test]
fn rematch_needs_a_finished_game() {
    let mut game = started_game();
    assert!(matches!(
        game.request_rematch(HOST, Instant::now(), WINDOW),
        Err(GameError::InvalidStage { .. })
    ));
}

#[test]
fn snapshot_hides_the_opponent_fleet() {
    let mut game = started_game();
    game.attack(HOST, 0, 0).unwrap();
    game.attack(HOST, 9, 9).unwrap();

    let snap = game.snapshot(HOST).unwrap();
    assert_eq!(snap.turn, Some(GUEST));
    assert_eq!(snap.own_board.cells.iter().filter(|c| c.has_ship).count(), 17);
    assert_eq!(snap.own_board.ships.len(), 5);
    let revealed: Vec<(u8, u8)> = snap
        .target_board
        .cells
        .iter()
        .filter(|c| c.has_ship)
        .map(|c| (c.x, c.y))
        .collect();
    assert_eq!(revealed, vec![(0, 0)]);
    assert!(snap.target_board.ships.is_empty());
    assert_eq!(snap.target_board.cells.iter().filter(|c| c.is_hit).count(), 2);
}

#[test]
fn bot_game_waits_for_the_human_fleet_only() {
    let mut rng = SmallRng::seed_from_u64(5);
    let mut game = Game::new_bot_game(3, HOST, Board::random_fleet(&mut rng).unwrap());
    assert!(game.is_bot_game());
    assert_eq!(game.state(), GameState::WaitingForPlayer1Ships);
    assert!(game.place_ships(HOST, &row_fleet()).unwrap());

    assert_eq!(game.attack(BOT_USER_ID, 0, 0), Err(GameError::BotOpponent));
    assert!(matches!(game.bot_attack(&mut rng), Err(GameError::InvalidStage { .. })));

    let (x, y) = game
        .board(Role::Guest)
        .cells()
        .find(|c| !c.has_ship)
        .map(|c| (c.x, c.y))
        .unwrap();
    assert_eq!(game.attack(HOST, x, y).unwrap().result, ShotResult::Miss);
    let outcome = game.bot_attack(&mut rng).unwrap();
    assert_eq!(outcome.shooter, BOT_USER_ID);
    assert_eq!(outcome.role, Role::Guest);
    assert!(game.board(Role::Host).is_attacked(outcome.x, outcome.y));
}

#[test]
fn bot_rematch_is_accepted_at_once() {
    let mut rng = SmallRng::seed_from_u64(8);
    let mut game = Game::new_bot_game(3, HOST, Board::random_fleet(&mut rng).unwrap());
    game.place_ships(HOST, &row_fleet()).unwrap();
    game.abandon(HOST).unwrap();
    assert_eq!(game.winner(), Some(BOT_USER_ID));
    assert_eq!(
        game.request_rematch(HOST, Instant::now(), WINDOW).unwrap(),
        RematchStep::Accepted {
            host: HOST,
            guest: BOT_USER_ID
        }
    );
}
