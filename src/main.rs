//! Main CLI interface to the negabot engine.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, info, warn};

use negabot_engine::search::MAX_DEPTH;
use negabot_engine::uci::{UciCommand, UciResponse};
use negabot_engine::{Engine, EngineBuilder, EngineConfig, Game, Position};

const NAME: &str = "negabot";
const AUTHOR: &str = "negabot developers";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the best move for one position and exit
    Bestmove {
        /// Position to search, the standard start position if omitted
        #[arg(long)]
        fen: Option<String>,

        /// Space separated UCI moves played from the position
        #[arg(long, default_value = "")]
        moves: String,

        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Speak UCI over stdin and stdout (the default)
    Uci {
        #[command(flatten)]
        engine: EngineArgs,
    },
}

/// Engine parameters. Flags override values read from `--config`.
#[derive(Args, Debug, Default)]
struct EngineArgs {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fixed search depth in plies
    #[arg(long)]
    depth: Option<u32>,

    /// Time budget per move in seconds
    #[arg(long, value_name = "SECS")]
    time: Option<f64>,

    /// Search without a time limit
    #[arg(long, conflicts_with = "time")]
    no_time_limit: bool,

    /// Number of search worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Polyglot opening book file
    #[arg(long)]
    book: Option<PathBuf>,

    /// Do not consult an opening book
    #[arg(long, conflicts_with = "book")]
    no_book: bool,
}

impl EngineArgs {
    fn to_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_toml_file(path)?,
            None => EngineConfig::default(),
        };

        if let Some(depth) = self.depth {
            config.depth = depth;
        }
        if let Some(time) = self.time {
            config.max_time = Some(time);
        }
        if self.no_time_limit {
            config.max_time = None;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(book) = &self.book {
            config.book = Some(book.clone());
        }
        if self.no_book {
            config.book = None;
        }

        Ok(config.validate()?)
    }
}

fn main() {
    let cli = Cli::parse();

    // Stdout carries UCI, so logs go to stderr.
    let log_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    )
    .target(env_logger::Target::Stderr)
    .init();

    let outcome = match cli.command {
        Some(Command::Bestmove { fen, moves, engine }) => {
            bestmove(fen.as_deref(), &moves, &engine)
        }
        Some(Command::Uci { engine }) => uci_loop(&engine),
        None => uci_loop(&EngineArgs::default()),
    };

    if let Err(err) = outcome {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}

/// Search one position and print the chosen move, `0000` if there is none.
fn bestmove(fen: Option<&str>, moves: &str, args: &EngineArgs) -> Result<()> {
    let config = args.to_config()?;
    let engine = EngineBuilder::from_config(config).build()?;

    let base_position = match fen {
        Some(fen) => Position::parse_fen(fen).with_context(|| format!("bad fen {fen:?}"))?,
        None => Position::start_position(),
    };
    let game = Game::new(base_position, moves.split_whitespace())?;

    let result = engine.best_move(&game.position);
    debug!("{result}");
    println!("{}", result.uci());
    Ok(())
}

/// Minimal UCI loop. Searches run to completion; `stop` is accepted but has no effect.
fn uci_loop(args: &EngineArgs) -> Result<()> {
    let config = args.to_config()?;
    let mut engine = EngineBuilder::from_config(config.clone()).build()?;
    let mut game = Game::start_position();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<UciCommand>() {
            Ok(command) => command,
            Err(err) => {
                warn!("{:?}: {err}", line.trim());
                UciResponse::InfoString(format!("error {err}")).send(&mut out)?;
                continue;
            }
        };

        match command {
            UciCommand::Uci => {
                UciResponse::new_id(NAME, AUTHOR).send(&mut out)?;
                UciResponse::UciOk.send(&mut out)?;
            }
            UciCommand::IsReady => UciResponse::ReadyOk.send(&mut out)?,
            UciCommand::UciNewGame => {
                game = Game::start_position();
                debug!("new game");
            }
            UciCommand::Pos(new_game) => {
                game = new_game;
                debug!("set position {}", game.position);
            }
            UciCommand::Go(controls) => {
                engine.set_depth(controls.depth.unwrap_or(config.depth).min(MAX_DEPTH));
                let budget = controls.time_budget().unwrap_or_else(|| config.time_budget());
                engine.set_max_time(budget);
                go(&engine, &game, &mut out)?;
            }
            UciCommand::Stop => {}
            UciCommand::Quit => break,
        }
    }

    info!("{NAME} exiting");
    Ok(())
}

fn go<W: Write>(engine: &Engine, game: &Game, out: &mut W) -> io::Result<()> {
    let result = engine.best_move(&game.position);
    UciResponse::InfoString(format!(
        "depth {} score {} nodes {} nps {} time {} source {:?}",
        result.depth,
        result.score,
        result.nodes,
        result.nps(),
        result.elapsed.as_millis(),
        result.source,
    ))
    .send(out)?;
    UciResponse::BestMove(result.best_move).send(out)
}
