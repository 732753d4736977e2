use std::io::{self, BufRead};
use std::time::Duration;

use clap::Parser;
use luckysweeper::config::MAX_LEVEL;
use luckysweeper::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Minesweeper where luck can move the mines", long_about = None)]
struct Args {
    #[arg(long, short, default_value_t = 5, help = "Mine density level, 0 to 9.")]
    density: usize,
    #[arg(long, short, default_value_t = 2, help = "Grid size level, 0 to 9.")]
    size: usize,
    #[arg(long, short, default_value = "neutral", value_enum)]
    luck: Luck,
    #[arg(long, short, help = "Let marking cycle through question marks.")]
    question_marks: bool,
    #[arg(long, default_value_t = 1000, help = "Time budget for each lucky click.")]
    timeout_ms: u64,
    #[arg(long, default_value = "search", value_enum)]
    backend: SolverBackend,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if args.density > MAX_LEVEL || args.size > MAX_LEVEL {
        anyhow::bail!("levels run from 0 to {MAX_LEVEL}");
    }
    let settings = Settings {
        density_level: args.density,
        size_level: args.size,
        luck: args.luck,
        question_marks: args.question_marks,
        timeout: Duration::from_millis(args.timeout_ms),
        backend: args.backend,
        ..Settings::default()
    };
    let mut game = GameSession::new(settings);

    println!("Commands: r X Y (reveal), m X Y (mark), c X Y (chord), n (new game),");
    println!("          l (cycle luck), q (toggle question marks), v (claim victory),");
    println!("          d+ d- (density), s+ s- (size), exit");
    print_board(&game);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => continue,
            ["exit"] => break,
            ["n"] => game.restart(),
            ["l"] => println!("Luck is now {:?}.", game.cycle_luck()),
            ["q"] => game.toggle_question_marks(),
            ["v"] => println!("{:?}", game.claim_victory()),
            [step @ ("d+" | "d-" | "s+" | "s-")] => {
                let step = match *step {
                    "d+" => LevelStep::DensityUp,
                    "d-" => LevelStep::DensityDown,
                    "s+" => LevelStep::SizeUp,
                    _ => LevelStep::SizeDown,
                };
                if !game.step_level(step) {
                    println!("Already at the end of the range.");
                    continue;
                }
            }
            [command @ ("r" | "m" | "c"), x, y] => {
                let (Ok(x), Ok(y)) = (x.parse::<usize>(), y.parse::<usize>()) else {
                    println!("Coordinates must be numbers.");
                    continue;
                };
                let point = Point { x, y };
                if game.grid().get(point).is_none() {
                    println!("({x}, {y}) is off the board.");
                    continue;
                }
                match *command {
                    "r" => report(game.click(point)),
                    "m" => {
                        game.cycle_mark(point);
                    }
                    _ => report(game.chord_reveal(point)),
                }
            }
            _ => {
                println!("Unknown command.");
                continue;
            }
        }
        print_board(&game);
    }

    Ok(())
}

fn report(outcome: ClickOutcome) {
    match outcome {
        ClickOutcome::Exploded => println!("Boom."),
        ClickOutcome::Won => println!("Cleared!"),
        ClickOutcome::Ignored | ClickOutcome::Revealed => {}
    }
}

fn print_board(game: &GameSession) {
    let grid = game.grid();
    let over = game.state() != GameState::Playing;

    println!(
        "Mines: {}   Luck: {:?}   {:?}",
        game.mines_displayed(),
        game.settings.luck,
        game.state()
    );

    // Print header
    print!("    ");
    for x in 0..grid.width() {
        print!("{:^3}", x);
    }
    println!("\n   +{}", "---".repeat(grid.width()));

    // Print rows
    for y in 0..grid.height() {
        print!("{:>3}|", y);
        for x in 0..grid.width() {
            let cell = grid.cell(Point { x, y });
            let display = if cell.exploded {
                " * ".to_string()
            } else if cell.mistake {
                " X ".to_string()
            } else if cell.flag {
                " F ".to_string()
            } else if cell.question_mark {
                " ? ".to_string()
            } else if cell.visible && cell.adjacent_mines == 0 {
                " . ".to_string()
            } else if cell.visible {
                format!(" {} ", cell.adjacent_mines)
            } else if over && cell.mine {
                " o ".to_string()
            } else {
                " ■ ".to_string()
            };
            print!("{}", display);
        }
        println!();
    }
    println!();
}
