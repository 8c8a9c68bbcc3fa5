use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sweeptutor_core::{
    Advisor, Assessment, Banner, Board, CellTag, Classification, Coord, Coord2, GameConfig,
    LayoutGenerator, Observation, RandomLayoutGenerator, SearchLimits, Session, SolverCapability,
    TutorMode, TutorSettings,
};
use web_time::{SystemTime, UNIX_EPOCH};

mod fixture;
mod logger;
mod play;
mod render;

#[derive(Parser, Debug)]
#[command(version, about = "Minesweeper with a tutor that pushes for efficient clears", long_about = None)]
struct Cli {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play in the terminal with the tutor gating every move
    Play {
        #[command(flatten)]
        board: BoardArgs,
        #[command(flatten)]
        tutor: TutorArgs,
        /// Continue from a fixture instead of a fresh board
        #[arg(long, value_name = "FILE")]
        fixture: Option<PathBuf>,
    },
    /// Classify the moves on a fixture board and print the advice
    Advise {
        /// Fixture file, `-` reads stdin
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[command(flatten)]
        tutor: TutorArgs,
        /// Also print what local clue propagation can prove
        #[arg(long)]
        solver: bool,
        /// Print JSON instead of a drawing
        #[arg(long)]
        json: bool,
    },
    /// Generate a board and print it as a fixture
    New {
        #[command(flatten)]
        board: BoardArgs,
        /// Open this cell after generating, written as ROW,COL
        #[arg(long, value_parser = parse_coords)]
        open: Option<Coord2>,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Preset {
    Beginner,
    Intermediate,
    Expert,
}

#[derive(Args, Debug)]
struct BoardArgs {
    /// Difficulty preset, ignored when a custom size is given
    #[arg(long, value_enum, default_value_t = Preset::Beginner)]
    preset: Preset,
    /// Custom size, clamped to what the board supports
    #[arg(long, requires_all = ["cols", "mines"])]
    rows: Option<u32>,
    #[arg(long, requires_all = ["rows", "mines"])]
    cols: Option<u32>,
    #[arg(long, requires_all = ["rows", "cols"])]
    mines: Option<u32>,
    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,
    /// Let the first reveal hit a mine
    #[arg(long)]
    unsafe_start: bool,
}

impl BoardArgs {
    fn config(&self) -> GameConfig {
        let (Some(rows), Some(cols), Some(mines)) = (self.rows, self.cols, self.mines) else {
            return match self.preset {
                Preset::Beginner => GameConfig::beginner(),
                Preset::Intermediate => GameConfig::intermediate(),
                Preset::Expert => GameConfig::expert(),
            };
        };
        let config = GameConfig::sanitized(rows, cols, mines);
        let asked = (rows, cols, mines);
        let got: (u32, u32, u32) = (config.rows.into(), config.cols.into(), config.mines.into());
        if asked != got {
            log::warn!("Board {asked:?} is out of range, using {got:?}");
        }
        config
    }

    fn seed(&self) -> u64 {
        let seed = self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |since| since.as_nanos() as u64)
        });
        log::info!("Seed {seed}");
        seed
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModeArg {
    Off,
    Classic,
    NoFlag,
}

impl From<ModeArg> for TutorMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Off => Self::Off,
            ModeArg::Classic => Self::Classic,
            ModeArg::NoFlag => Self::NoFlag,
        }
    }
}

#[derive(Args, Debug)]
struct TutorArgs {
    #[arg(long, value_enum, default_value_t = ModeArg::Classic)]
    mode: ModeArg,
    /// Clicks the tutor looks ahead
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=5))]
    depth: u8,
    /// Stop each advisor run after this many simulated moves
    #[arg(long)]
    node_budget: Option<usize>,
}

impl TutorArgs {
    fn limits(&self) -> SearchLimits {
        let mut limits = SearchLimits::default();
        if let Some(node_budget) = self.node_budget {
            limits.node_budget = node_budget;
        }
        limits
    }

    fn settings(&self, protect_first_click: bool) -> TutorSettings {
        TutorSettings {
            mode: self.mode.into(),
            depth: self.depth,
            protect_first_click,
            limits: self.limits(),
        }
    }
}

fn parse_coords(text: &str) -> Result<Coord2> {
    let (row, col) = text.split_once(',').context("expected ROW,COL")?;
    let row: Coord = row.trim().parse().context("bad row")?;
    let col: Coord = col.trim().parse().context("bad column")?;
    Ok((row, col))
}

#[derive(Serialize)]
struct AdviceReport<'a> {
    banner: String,
    status: &'a Banner,
    classification: &'a Classification,
    tags: Vec<Vec<CellTag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    solver: Option<Vec<Vec<Option<Assessment>>>>,
}

fn advise(board: &Board, tutor: &TutorArgs, solver: bool, json: bool) -> Result<()> {
    let advisor = Advisor::new(tutor.mode.into(), tutor.depth, tutor.limits())?;
    let classification = advisor.classify(board);
    let banner = Banner::new(advisor.mode(), board.status(), &classification);
    let tags = classification.tags(board.size());
    let assessments = solver
        .then(|| SolverCapability::local().assess(&Observation::from_board(board)))
        .flatten();

    if json {
        let report = AdviceReport {
            banner: banner.to_string(),
            status: &banner,
            classification: &classification,
            tags: tags.outer_iter().map(|row| row.to_vec()).collect(),
            solver: assessments
                .as_ref()
                .map(|grid| grid.outer_iter().map(|row| row.to_vec()).collect()),
        };
        serde_json::to_writer_pretty(io::stdout().lock(), &report)?;
        println!();
        return Ok(());
    }

    print!("{}", render::board(board, Some(&tags)));
    println!("{}", render::LEGEND);
    println!("{banner}");
    if !classification.best_path.is_empty() {
        let path: Vec<String> = classification
            .best_path
            .iter()
            .map(|mv| format!("{:?} {:?}", mv.kind, mv.coords))
            .collect();
        println!("best line: {}", path.join(", "));
    }
    if let Some(grid) = assessments {
        println!("{}", render::proofs(&grid));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose.log_level()).context("installing logger")?;

    match cli.cmd {
        Command::Play {
            board,
            tutor,
            fixture: path,
        } => {
            let settings = tutor.settings(!board.unsafe_start);
            let mut session = match path {
                Some(path) => Session::from_board(fixture::read(&path)?, settings)?,
                None => Session::new(board.config(), settings, board.seed())?,
            };
            session.set_solver(SolverCapability::local());
            play::run(session, io::stdin().lock(), io::stdout().lock())?;
        }
        Command::Advise {
            path,
            tutor,
            solver,
            json,
        } => {
            let board = fixture::read(&path)?;
            advise(&board, &tutor, solver, json)?;
        }
        Command::New { board, open } => {
            let safe_cell = open.filter(|_| !board.unsafe_start);
            let layout =
                RandomLayoutGenerator::new(board.seed(), safe_cell).generate(board.config())?;
            let mut generated = Board::new(layout);
            if let Some(coords) = open {
                generated.reveal(coords)?;
            }
            print!("{}", fixture::write(&generated));
        }
    }
    Ok(())
}
