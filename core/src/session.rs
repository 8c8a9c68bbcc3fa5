use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};
use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TutorMode {
    #[default]
    Off,
    /// Flags are part of the efficient path.
    Classic,
    /// Flags are never suggested, the player clears by reveals alone.
    NoFlag,
}

impl TutorMode {
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Off)
    }

    pub const fn allows_flags(self) -> bool {
        !matches!(self, Self::NoFlag)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorSettings {
    pub mode: TutorMode,
    pub depth: u8,
    /// Keep the first revealed cell free of mines.
    pub protect_first_click: bool,
    pub limits: SearchLimits,
}

impl Default for TutorSettings {
    fn default() -> Self {
        Self {
            mode: TutorMode::Classic,
            depth: 2,
            protect_first_click: true,
            limits: SearchLimits::default(),
        }
    }
}

impl TutorSettings {
    pub fn advisor(&self) -> Result<Advisor> {
        Advisor::new(self.mode, self.depth, self.limits)
    }
}

/// Latest board version, shared with in-flight advisor runs so they can stop early.
#[derive(Clone, Debug, Default)]
pub struct StampWatch(Arc<AtomicU64>);

impl StampWatch {
    pub fn new(stamp: u64) -> Self {
        Self(Arc::new(AtomicU64::new(stamp)))
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    Reveal(Coord2),
    ToggleFlag(Coord2),
    Chord(Coord2),
    /// Left click: chord on a number, otherwise reveal or flag depending on flag mode.
    Primary(Coord2),
}

impl PlayerAction {
    pub const fn coords(self) -> Coord2 {
        match self {
            Self::Reveal(coords)
            | Self::ToggleFlag(coords)
            | Self::Chord(coords)
            | Self::Primary(coords) => coords,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionReport {
    Applied {
        mv: Move,
        log: ActionLog,
        status: GameStatus,
    },
    /// Allowed, but nothing changed.
    NoEffect { mv: Move },
    /// Stopped by the tutor. The board was not touched.
    Rejected {
        mv: Move,
        highlight: Vec<(Coord2, CellTag)>,
    },
}

/// A self-contained advisor run, safe to send to another thread.
#[derive(Clone, Debug)]
pub struct AdviceRequest {
    board: Board,
    advisor: Advisor,
    stamp: u64,
    watch: StampWatch,
}

impl AdviceRequest {
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    pub fn run(self) -> Advice {
        self.advisor.advise(&self.board, self.stamp, &self.watch)
    }
}

/// One game plus everything the tutor needs around it.
#[derive(Debug)]
pub struct Session {
    config: GameConfig,
    settings: TutorSettings,
    advisor: Advisor,
    rng: SmallRng,
    board: Board,
    /// Mines were placed before the first reveal and may still be moved.
    placeholder: bool,
    watch: StampWatch,
    advice: Option<Advice>,
    actions: u32,
    flag_mode: bool,
    solver: SolverCapability,
}

impl Session {
    pub fn new(config: GameConfig, settings: TutorSettings, seed: u64) -> Result<Self> {
        let advisor = settings.advisor()?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let board = Board::generate(config, None, &mut rng)?;
        Ok(Self {
            config,
            settings,
            advisor,
            rng,
            board,
            placeholder: true,
            watch: StampWatch::new(0),
            advice: None,
            actions: 0,
            flag_mode: false,
            solver: SolverCapability::Unavailable,
        })
    }

    /// Wraps an existing board, mines stay where they are.
    pub fn from_board(board: Board, settings: TutorSettings) -> Result<Self> {
        let advisor = settings.advisor()?;
        let (rows, cols) = board.size();
        Ok(Self {
            config: GameConfig::new_unchecked(rows, cols, board.total_mines()),
            settings,
            advisor,
            rng: SmallRng::seed_from_u64(0),
            board,
            placeholder: false,
            watch: StampWatch::new(0),
            advice: None,
            actions: 0,
            flag_mode: false,
            solver: SolverCapability::Unavailable,
        })
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn settings(&self) -> &TutorSettings {
        &self.settings
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> GameStatus {
        self.board.status()
    }

    /// Bumped on every change the advice depends on.
    pub fn version(&self) -> u64 {
        self.watch.current()
    }

    /// Effective actions so far, no-ops and rejections excluded.
    pub fn actions(&self) -> u32 {
        self.actions
    }

    pub fn flag_mode(&self) -> bool {
        self.flag_mode
    }

    pub fn set_flag_mode(&mut self, flag_mode: bool) {
        self.flag_mode = flag_mode;
    }

    pub fn solver(&self) -> &SolverCapability {
        &self.solver
    }

    pub fn set_solver(&mut self, solver: SolverCapability) {
        self.solver = solver;
    }

    /// What the attached solver makes of the visible board, if one is attached.
    pub fn assessments(&self) -> Option<Array2<Option<Assessment>>> {
        self.solver.assess(&Observation::from_board(&self.board))
    }

    pub fn metrics(&self, elapsed_ms: u64) -> Metrics {
        Metrics::compute(&self.board, self.actions, elapsed_ms)
    }

    /// Fresh board with the same configuration.
    pub fn restart(&mut self) -> Result<()> {
        self.reconfigure(self.config)
    }

    pub fn reconfigure(&mut self, config: GameConfig) -> Result<()> {
        let board = Board::generate(config, None, &mut self.rng)?;
        self.config = config;
        self.board = board;
        self.placeholder = true;
        self.actions = 0;
        self.invalidate();
        log::debug!("New {}x{} game with {} mines", config.rows, config.cols, config.mines);
        Ok(())
    }

    pub fn update_settings(&mut self, settings: TutorSettings) -> Result<()> {
        self.advisor = settings.advisor()?;
        self.settings = settings;
        self.invalidate();
        Ok(())
    }

    /// Advice matching the current board, if any has been accepted.
    pub fn advice(&self) -> Option<&Advice> {
        self.advice
            .as_ref()
            .filter(|advice| advice.stamp == self.version())
    }

    pub fn classification(&self) -> Option<&Classification> {
        self.advice().map(|advice| &advice.classification)
    }

    pub fn tags(&self) -> Array2<CellTag> {
        match self.classification() {
            Some(classification) if self.settings.mode.is_active() => {
                classification.tags(self.board.size())
            }
            _ => Array2::default(self.board.size().to_nd_index()),
        }
    }

    pub fn banner(&self) -> Banner {
        let empty = Classification::default();
        let classification = self.classification().unwrap_or(&empty);
        Banner::new(self.settings.mode, self.board.status(), classification)
    }

    /// Snapshot for an advisor run against the current version.
    pub fn request_advice(&self) -> AdviceRequest {
        AdviceRequest {
            board: self.board.clone(),
            advisor: self.advisor,
            stamp: self.version(),
            watch: self.watch.clone(),
        }
    }

    /// Keeps `advice` only when it was computed for the current version.
    pub fn accept(&mut self, advice: Advice) -> AdviceStatus {
        if advice.status == AdviceStatus::Stale || advice.stamp != self.version() {
            log::debug!(
                "Discarding advice for version {}, board is at {}",
                advice.stamp,
                self.version()
            );
            return AdviceStatus::Stale;
        }
        self.advice = Some(advice);
        AdviceStatus::Current
    }

    /// Runs the advisor inline and keeps the result.
    pub fn refresh_advice(&mut self) -> AdviceStatus {
        let advice = self.request_advice().run();
        self.accept(advice)
    }

    pub fn primary_click(&mut self, coords: Coord2) -> Result<ActionReport> {
        self.act(PlayerAction::Primary(coords))
    }

    /// Routes one player action through the tutor gate and onto the board.
    pub fn act(&mut self, action: PlayerAction) -> Result<ActionReport> {
        if self.board.is_finished() {
            return Err(GameError::AlreadyEnded);
        }
        let coords = self.board.validate_coords(action.coords())?;
        let mv = self.resolve(action, coords);

        if self.settings.mode.is_active() {
            if self.advice().is_none() {
                self.refresh_advice();
            }
            if let Some(classification) = self.classification() {
                if let Verdict::Rejected { highlight } = check(mv, classification) {
                    return Ok(ActionReport::Rejected { mv, highlight });
                }
            }
        }

        if mv.kind == MoveKind::Reveal && self.placeholder && self.board.cell(coords).is_hidden() {
            self.commit_board(coords)?;
        }

        let log = apply_in_place(&mut self.board, mv)?;
        if log.is_no_effect() {
            return Ok(ActionReport::NoEffect { mv });
        }

        self.actions += 1;
        self.invalidate();
        Ok(ActionReport::Applied {
            mv,
            log,
            status: self.board.status(),
        })
    }

    fn resolve(&self, action: PlayerAction, coords: Coord2) -> Move {
        match action {
            PlayerAction::Reveal(_) => Move::reveal(coords),
            PlayerAction::ToggleFlag(_) => Move::flag(coords),
            PlayerAction::Chord(_) => Move::chord(coords),
            PlayerAction::Primary(_) => {
                let primary = Move::primary(&self.board, coords);
                if self.flag_mode && primary.kind == MoveKind::Reveal {
                    Move::flag(coords)
                } else {
                    primary
                }
            }
        }
    }

    /// Fixes the mine layout on the first reveal, moving mines off `first` when protected.
    fn commit_board(&mut self, first: Coord2) -> Result<()> {
        self.placeholder = false;
        if !self.settings.protect_first_click {
            return Ok(());
        }

        self.board = Board::generate(self.config, Some(first), &mut self.rng)?;
        log::debug!("Placed mines around first reveal at {:?}", first);
        Ok(())
    }

    fn invalidate(&mut self) {
        self.watch.bump();
        self.advice = None;
    }
}
