//! Self-play simulator for the move selector
//!
//! Plays a batch of seeded games (pig in the centre, random starting walls)
//! with the engine as the blocker and reports how often the pig is caught.
//!
//! Usage: simulate [num_games] [seed] [max_depth]

use block_the_pig::config::Config;
use block_the_pig::game::{GameSession, GameStatus};
use block_the_pig::grid::HexGrid;
use block_the_pig::selector::{MoveSelector, SelectorSettings};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;
use std::time::Instant;

fn parse_arg<T: std::str::FromStr>(args: &[String], index: usize, name: &str, default: T) -> T {
    match args.get(index) {
        None => default,
        Some(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                eprintln!("Error: {} must be a number, got: {}", name, raw);
                eprintln!("Usage: {} [num_games] [seed] [max_depth]", args[0]);
                std::process::exit(1);
            }
        },
    }
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "warn");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = Config::load_or_default();

    let num_games: u32 = parse_arg(&args, 1, "num_games", 20);
    let seed: u64 = parse_arg(&args, 2, "seed", 42);
    let max_depth: u32 = parse_arg(&args, 3, "max_depth", config.search.max_depth);

    let grid = match HexGrid::new(config.grid) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let settings = SelectorSettings::from_config(&config).with_max_depth(max_depth);
    let selector = MoveSelector::new(grid, settings);

    println!("\n═══════════════════════════════════════════════════════════");
    println!("              BLOCK-THE-PIG SELF-PLAY");
    println!("═══════════════════════════════════════════════════════════");
    println!("Games:        {}", num_games);
    println!("Seed:         {}", seed);
    println!("Max depth:    {}", max_depth);
    println!(
        "Grid:         {}x{}",
        grid.bounds().width(),
        grid.bounds().height()
    );
    println!("═══════════════════════════════════════════════════════════\n");

    let mut rng = StdRng::seed_from_u64(seed);
    let mut won = 0u32;
    let mut lost = 0u32;
    let mut unfinished = 0u32;
    let mut total_turns = 0u32;
    let start = Instant::now();

    for game_index in 0..num_games {
        let mut game = GameSession::new_random(grid, &mut rng, &config.game);
        let initial_walls = game.obstacles().len();

        let outcome = match game.play_out(&selector, config.game.max_turns) {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("Game {}: engine error: {}", game_index + 1, e);
                continue;
            }
        };

        total_turns += outcome.turns;
        let label = match outcome.status {
            GameStatus::Won => {
                won += 1;
                "WON"
            }
            GameStatus::Lost => {
                lost += 1;
                "LOST"
            }
            GameStatus::InProgress => {
                unfinished += 1;
                "TURN LIMIT"
            }
        };

        println!(
            "Game {:>3}: {:<10} {:>2} walls placed ({} initial)",
            game_index + 1,
            label,
            outcome.turns,
            initial_walls
        );
        info!("Game {} final walls: {:?}", game_index + 1, game.walls());
    }

    let played = won + lost + unfinished;
    let win_rate = if played > 0 {
        won as f64 * 100.0 / played as f64
    } else {
        0.0
    };

    println!("\n───────────────────────────────────────────────────────────");
    println!("Won:          {}", won);
    println!("Lost:         {}", lost);
    println!("Turn limit:   {}", unfinished);
    println!("Win rate:     {:.1}%", win_rate);
    if played > 0 {
        println!("Avg walls:    {:.1}", total_turns as f64 / played as f64);
    }
    println!("Elapsed:      {:.2}s", start.elapsed().as_secs_f64());
}
