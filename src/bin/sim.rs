use broadside::{ActionKind, Board, EngineConfig, GameService, GameState, ShipPlacement, BOT_USER_ID};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde_json::json;

/// Plays one game of a random-firing user against the bot and prints a JSON
/// summary.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <seed>", args[0]);
        std::process::exit(1);
    }
    let seed: u64 = args[1].parse()?;

    let service = GameService::new(EngineConfig::instant(seed));
    let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(1));
    let human = 1;

    let game = service.create_bot_game(human).await?;
    let fleet = Board::random_fleet(&mut rng).map_err(|e| anyhow::anyhow!(e))?;
    let placements: Vec<ShipPlacement> = fleet.ships().iter().map(|s| s.placement()).collect();
    service.place_ships(game, human, &placements).await?;

    loop {
        let snapshot = service.snapshot(game, human).await?;
        if snapshot.state == GameState::Finished {
            break;
        }
        let open: Vec<(u8, u8)> = snapshot
            .target_board
            .cells
            .iter()
            .filter(|c| !c.is_hit)
            .map(|c| (c.x, c.y))
            .collect();
        if open.is_empty() {
            return Err(anyhow::anyhow!("no cells left but game {} is not finished", game));
        }
        let (x, y) = open[rng.random_range(0..open.len())];
        service.attack(game, human, x, y).await?;
    }

    let snapshot = service.snapshot(game, human).await?;
    let count = |kind: ActionKind| snapshot.actions.iter().filter(|a| a.kind == kind).count();
    let winner = match snapshot.winner {
        Some(BOT_USER_ID) => Some("bot"),
        Some(_) => Some("player"),
        None => None,
    };

    let result = json!({
        "game": game,
        "player": {"shots": count(ActionKind::Attack)},
        "bot": {"shots": count(ActionKind::BotAttack)},
        "winner": winner,
    });

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
