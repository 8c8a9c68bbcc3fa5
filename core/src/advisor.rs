//! Efficiency tutor search.
//!
//! Scores every plausible first move by the best value gain reachable within
//! a few follow-up moves and the clicks spent getting there, then keeps the
//! first moves that are both highest-gain and cheapest.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::*;

/// Branching knobs. Defaults are the interactive values.
///
/// - `initial_classic`: first-level reveal/flag pool size when flags are allowed.
/// - `initial_no_flag`: same, for the no-flag mode.
/// - `follow_up`: pool size for every deeper level.
/// - `chord_floor`: chord candidates are never cut below this.
/// - `node_budget`: hard cap on simulated moves per run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLimits {
    pub initial_classic: usize,
    pub initial_no_flag: usize,
    pub follow_up: usize,
    pub chord_floor: usize,
    pub node_budget: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            initial_classic: 24,
            initial_no_flag: 32,
            follow_up: 18,
            chord_floor: 30,
            node_budget: 250_000,
        }
    }
}

impl SearchLimits {
    pub const fn initial_for(&self, mode: TutorMode) -> usize {
        match mode {
            TutorMode::NoFlag => self.initial_no_flag,
            TutorMode::Off | TutorMode::Classic => self.initial_classic,
        }
    }
}

/// Which moves the tutor currently accepts.
///
/// All four sets empty means no constraint. A non-empty `guess` set means
/// there is no information to work with and any of those cells is as good as
/// another.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub reveal: BTreeSet<Coord2>,
    pub flag: BTreeSet<Coord2>,
    pub chord: BTreeSet<Coord2>,
    pub guess: BTreeSet<Coord2>,
    /// Gain of the winning moves, in value units over the current progress.
    pub best_gain: Option<CellCount>,
    pub best_clicks: Option<u8>,
    /// First discovered path reaching `best_gain` with `best_clicks`.
    pub best_path: Vec<Move>,
    /// The node budget ran out before the search finished.
    pub truncated: bool,
}

impl Classification {
    /// No constraint at all.
    pub fn is_empty(&self) -> bool {
        self.reveal.is_empty() && self.flag.is_empty() && self.chord.is_empty() && self.guess.is_empty()
    }

    pub fn is_guess(&self) -> bool {
        !self.guess.is_empty()
    }

    pub fn bucket(&self, kind: MoveKind) -> &BTreeSet<Coord2> {
        match kind {
            MoveKind::Reveal => &self.reveal,
            MoveKind::Flag => &self.flag,
            MoveKind::Chord => &self.chord,
        }
    }

    pub fn contains(&self, mv: Move) -> bool {
        self.bucket(mv.kind).contains(&mv.coords)
    }

    /// Winning moves in reveal, flag, chord order.
    pub fn moves(&self) -> impl Iterator<Item = Move> + '_ {
        let reveals = self.reveal.iter().map(|&coords| Move::reveal(coords));
        let flags = self.flag.iter().map(|&coords| Move::flag(coords));
        let chords = self.chord.iter().map(|&coords| Move::chord(coords));
        reveals.chain(flags).chain(chords)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdviceStatus {
    /// Computed for the board version it is stamped with.
    Current,
    /// The board moved on while this was computed, or before it was accepted.
    Stale,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Moves simulated.
    pub nodes: usize,
    /// Deepest the frame stack got.
    pub peak_frames: usize,
}

/// Result of one advisor run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub stamp: u64,
    pub status: AdviceStatus,
    pub classification: Classification,
    pub stats: SearchStats,
}

impl Advice {
    fn stale(stamp: u64, stats: SearchStats) -> Self {
        Self {
            stamp,
            status: AdviceStatus::Stale,
            classification: Classification::default(),
            stats,
        }
    }
}

/// Depth-limited move advisor. Holds no board state, every run reads a snapshot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisor {
    mode: TutorMode,
    depth: u8,
    limits: SearchLimits,
}

impl Advisor {
    pub const MIN_DEPTH: u8 = 1;
    pub const MAX_DEPTH: u8 = 5;

    pub fn new(mode: TutorMode, depth: u8, limits: SearchLimits) -> Result<Self> {
        if !(Self::MIN_DEPTH..=Self::MAX_DEPTH).contains(&depth) {
            return Err(ConfigError::InvalidDepth(depth).into());
        }
        Ok(Self {
            mode,
            depth,
            limits,
        })
    }

    pub fn mode(&self) -> TutorMode {
        self.mode
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    /// Runs to completion with no cancellation.
    pub fn classify(&self, board: &Board) -> Classification {
        self.search(board, 0, None).classification
    }

    /// Runs on `board`, stamped `stamp`, giving up as soon as `watch` moves past it.
    pub fn advise(&self, board: &Board, stamp: u64, watch: &StampWatch) -> Advice {
        self.search(board, stamp, Some(watch))
    }

    fn search(&self, board: &Board, stamp: u64, watch: Option<&StampWatch>) -> Advice {
        let current = |stats: SearchStats, classification: Classification| Advice {
            stamp,
            status: AdviceStatus::Current,
            classification,
            stats,
        };

        if watch.is_some_and(|watch| watch.current() != stamp) {
            return Advice::stale(stamp, SearchStats::default());
        }
        if board.is_finished() || !self.mode.is_active() {
            return current(SearchStats::default(), Classification::default());
        }

        let initial = generate(
            board,
            self.mode,
            self.limits.initial_for(self.mode),
            self.limits.chord_floor,
        );
        if initial.pool == CandidatePool::Fallback {
            let guess: BTreeSet<Coord2> = board
                .cells()
                .filter(|cell| cell.is_hidden())
                .map(Cell::coords)
                .collect();
            log::debug!("No frontier, {} cells to guess from", guess.len());
            return current(
                SearchStats::default(),
                Classification {
                    guess,
                    ..Classification::default()
                },
            );
        }

        let mut run = SearchRun {
            advisor: self,
            units: segment(board),
            baseline: 0,
            registry: Registry::default(),
            stats: SearchStats::default(),
            truncated: false,
            stamp,
            watch,
        };
        run.baseline = progress(board, &run.units);

        if run.explore(board, &initial.moves).is_err() {
            log::debug!("Advisor run {} superseded after {} nodes", stamp, run.stats.nodes);
            return Advice::stale(stamp, run.stats);
        }

        let mut classification = run.registry.classify();
        classification.truncated = run.truncated;
        log::debug!(
            "Advisor run {}: {} nodes, best gain {:?} in {:?} clicks, truncated: {}",
            stamp,
            run.stats.nodes,
            classification.best_gain,
            classification.best_clicks,
            run.truncated
        );
        current(run.stats, classification)
    }
}

struct Superseded;

enum Step {
    Applied(Simulation),
    /// No effect under the board rules.
    Skipped,
    OutOfBudget,
}

/// One pending expansion.
struct Frame {
    board: Board,
    remaining: u8,
    first: usize,
    clicks: u8,
    path: Vec<Move>,
}

struct SearchRun<'a> {
    advisor: &'a Advisor,
    units: ValueUnits,
    baseline: CellCount,
    registry: Registry,
    stats: SearchStats,
    truncated: bool,
    stamp: u64,
    watch: Option<&'a StampWatch>,
}

impl SearchRun<'_> {
    fn explore(&mut self, board: &Board, initial: &[Move]) -> core::result::Result<(), Superseded> {
        let mut stack: Vec<Frame> = Vec::new();

        for &first_move in initial {
            let sim = match self.simulate(board, first_move)? {
                Step::Applied(sim) => sim,
                Step::Skipped => continue,
                Step::OutOfBudget => break,
            };

            let path = alloc::vec![first_move];
            if sim.exploded {
                self.registry.register(first_move, None, 1, &path);
                continue;
            }

            let gain = self.gain(&sim.board);
            let first = self.registry.register(first_move, Some(gain), 1, &path);
            if self.advisor.depth > 1 && !sim.board.is_finished() {
                stack.push(Frame {
                    board: sim.board,
                    remaining: self.advisor.depth - 1,
                    first,
                    clicks: 1,
                    path,
                });
            }

            while let Some(frame) = stack.pop() {
                self.stats.peak_frames = self.stats.peak_frames.max(stack.len() + 1);
                if !self.expand(frame, &mut stack)? {
                    break;
                }
            }
            if self.truncated {
                break;
            }
        }
        Ok(())
    }

    /// Registers every child of `frame` and queues the ones worth going deeper into.
    ///
    /// Children are pushed in reverse so they pop in candidate order.
    fn expand(&mut self, frame: Frame, stack: &mut Vec<Frame>) -> core::result::Result<bool, Superseded> {
        let limits = &self.advisor.limits;
        let candidates = generate(&frame.board, self.advisor.mode, limits.follow_up, limits.chord_floor);

        let mut children = Vec::new();
        for &mv in &candidates.moves {
            let sim = match self.simulate(&frame.board, mv)? {
                Step::Applied(sim) if !sim.exploded => sim,
                Step::Applied(_) | Step::Skipped => continue,
                Step::OutOfBudget => return Ok(false),
            };

            let clicks = frame.clicks.saturating_add(1);
            let mut path = frame.path.clone();
            path.push(mv);
            let gain = self.gain(&sim.board);
            self.registry.extend(frame.first, gain, clicks, &path);

            if frame.remaining > 1 && !sim.board.is_finished() {
                children.push(Frame {
                    board: sim.board,
                    remaining: frame.remaining - 1,
                    first: frame.first,
                    clicks,
                    path,
                });
            }
        }
        stack.extend(children.into_iter().rev());
        Ok(true)
    }

    fn simulate(&mut self, board: &Board, mv: Move) -> core::result::Result<Step, Superseded> {
        if self.watch.is_some_and(|watch| watch.current() != self.stamp) {
            return Err(Superseded);
        }
        if self.stats.nodes >= self.advisor.limits.node_budget {
            self.truncated = true;
            return Ok(Step::OutOfBudget);
        }
        self.stats.nodes += 1;

        match apply(board, mv) {
            Ok(sim) if sim.is_no_effect() => Ok(Step::Skipped),
            Ok(sim) => Ok(Step::Applied(sim)),
            Err(err) => {
                // candidates only name in-bounds cells of unfinished boards
                log::warn!("Skipping candidate {:?}: {}", mv, err);
                Ok(Step::Skipped)
            }
        }
    }

    fn gain(&self, board: &Board) -> i32 {
        i32::from(progress(board, &self.units)) - i32::from(self.baseline)
    }
}

/// Best outcome seen so far for one first move. `gain: None` stands for an explosion.
#[derive(Clone, Debug)]
struct Registration {
    first_move: Move,
    gain: Option<i32>,
    clicks: u8,
    path: Vec<Move>,
}

#[derive(Default)]
struct Registry {
    index: HashMap<Move, usize>,
    entries: Vec<Registration>,
}

impl Registry {
    /// Records a first move and returns its slot.
    fn register(&mut self, first_move: Move, gain: Option<i32>, clicks: u8, path: &[Move]) -> usize {
        if let Some(&slot) = self.index.get(&first_move) {
            self.update(slot, gain, clicks, path);
            return slot;
        }
        let slot = self.entries.len();
        self.index.insert(first_move, slot);
        self.entries.push(Registration {
            first_move,
            gain,
            clicks,
            path: path.to_vec(),
        });
        slot
    }

    /// Attributes a deeper outcome to the first move in `slot`.
    fn extend(&mut self, slot: usize, gain: i32, clicks: u8, path: &[Move]) {
        self.update(slot, Some(gain), clicks, path);
    }

    /// Replaces only on a strictly better gain, or an equal gain with fewer clicks.
    fn update(&mut self, slot: usize, gain: Option<i32>, clicks: u8, path: &[Move]) {
        let Some(entry) = self.entries.get_mut(slot) else {
            return;
        };
        if gain > entry.gain || (gain == entry.gain && clicks < entry.clicks) {
            entry.gain = gain;
            entry.clicks = clicks;
            entry.path.clear();
            entry.path.extend_from_slice(path);
        }
    }

    fn classify(&self) -> Classification {
        let best_gain = self.entries.iter().filter_map(|entry| entry.gain).max();
        let Some(best_gain) = best_gain.filter(|&gain| gain > 0) else {
            return Classification::default();
        };

        let best_clicks = self
            .entries
            .iter()
            .filter(|entry| entry.gain == Some(best_gain))
            .map(|entry| entry.clicks)
            .min();

        let mut classification = Classification {
            best_gain: CellCount::try_from(best_gain).ok(),
            best_clicks,
            ..Classification::default()
        };
        for entry in &self.entries {
            if entry.gain != Some(best_gain) || Some(entry.clicks) != best_clicks {
                continue;
            }
            if classification.best_path.is_empty() {
                classification.best_path = entry.path.clone();
            }
            let bucket = match entry.first_move.kind {
                MoveKind::Reveal => &mut classification.reveal,
                MoveKind::Flag => &mut classification.flag,
                MoveKind::Chord => &mut classification.chord,
            };
            bucket.insert(entry.first_move.coords);
        }
        classification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::board;

    fn advisor(mode: TutorMode, depth: u8) -> Advisor {
        Advisor::new(mode, depth, SearchLimits::default()).unwrap()
    }

    /// ```text
    /// ..1000
    /// .#1000
    /// .11000
    /// .10111
    /// #101#.
    /// .101..
    /// ```
    fn pinned_fixture() -> Board {
        let mut board = board((6, 6), &[(1, 1), (4, 0), (4, 4)]);
        board.reveal((0, 3)).unwrap();
        board
    }

    #[test]
    fn rejects_depth_out_of_range() {
        for depth in [0, 6] {
            assert_eq!(
                Advisor::new(TutorMode::Classic, depth, SearchLimits::default()),
                Err(GameError::Config(ConfigError::InvalidDepth(depth)))
            );
        }
        assert!(Advisor::new(TutorMode::Classic, 5, SearchLimits::default()).is_ok());
    }

    #[test]
    fn off_mode_and_finished_boards_have_no_constraint() {
        let board = board((6, 6), &[(0, 0)]);
        assert!(advisor(TutorMode::Off, 2).classify(&board).is_empty());

        let mut lost = board.clone();
        lost.reveal((0, 0)).unwrap();
        assert!(advisor(TutorMode::Classic, 2).classify(&lost).is_empty());
    }

    #[test]
    fn blank_board_is_all_guess() {
        let board = board((6, 6), &[(0, 0), (5, 5)]);
        let classification = advisor(TutorMode::Classic, 3).classify(&board);

        assert_eq!(classification.guess.len(), 36);
        assert!(classification.reveal.is_empty());
        assert!(classification.is_guess());
    }

    #[test]
    fn single_reveals_tie_at_depth_one() {
        let board = pinned_fixture();
        let classification = advisor(TutorMode::Classic, 1).classify(&board);

        assert_eq!(
            classification.reveal.iter().copied().collect::<Vec<_>>(),
            [(0, 1), (1, 0), (2, 0), (3, 0), (4, 5), (5, 0), (5, 4)]
        );
        assert!(classification.flag.is_empty());
        assert_eq!(classification.best_gain, Some(1));
        assert_eq!(classification.best_clicks, Some(1));
        assert_eq!(classification.best_path, [Move::reveal((3, 0))]);
    }

    #[test]
    fn no_flag_mode_never_suggests_flags() {
        let board = pinned_fixture();
        let classification = advisor(TutorMode::NoFlag, 2).classify(&board);

        assert!(classification.flag.is_empty());
        assert_eq!(classification.reveal.len(), 7);
        assert_eq!(classification.best_gain, Some(2));
        assert_eq!(classification.best_clicks, Some(2));
    }

    #[test]
    fn search_is_deterministic() {
        let board = pinned_fixture();
        let advisor = advisor(TutorMode::Classic, 3);

        assert_eq!(advisor.classify(&board), advisor.classify(&board));
    }

    #[test]
    fn registry_prefers_gain_then_fewer_clicks() {
        let mut registry = Registry::default();
        let a = Move::reveal((0, 0));
        let b = Move::reveal((0, 1));

        let slot_a = registry.register(a, Some(1), 1, &[a]);
        registry.register(b, Some(2), 1, &[b]);
        registry.extend(slot_a, 2, 2, &[a, b]);
        registry.extend(slot_a, 2, 3, &[a, b, b]);

        let classification = registry.classify();
        assert_eq!(classification.best_gain, Some(2));
        assert_eq!(classification.best_clicks, Some(1));
        assert_eq!(classification.reveal.iter().copied().collect::<Vec<_>>(), [(0, 1)]);
        assert_eq!(classification.best_path, [b]);
        assert_eq!(registry.entries[slot_a].path, [a, b]);
    }

    #[test]
    fn no_positive_gain_means_no_constraint() {
        let mut registry = Registry::default();
        registry.register(Move::flag((0, 0)), Some(0), 1, &[Move::flag((0, 0))]);
        registry.register(Move::reveal((0, 1)), None, 1, &[Move::reveal((0, 1))]);

        assert!(registry.classify().is_empty());
    }

    #[test]
    fn chords_short_of_flags_earn_nothing() {
        // nothing is flagged, so no numbered cell can be chorded yet
        let board = pinned_fixture();
        let advisor = advisor(TutorMode::Classic, 1);
        let limits = advisor.limits();
        let initial = generate(
            &board,
            advisor.mode(),
            limits.initial_for(advisor.mode()),
            limits.chord_floor,
        );
        let chords = initial.moves.iter().filter(|mv| mv.kind == MoveKind::Chord).count();
        assert!(chords > 0);

        let units = segment(&board);
        let mut run = SearchRun {
            advisor: &advisor,
            baseline: progress(&board, &units),
            units,
            registry: Registry::default(),
            stats: SearchStats::default(),
            truncated: false,
            stamp: 0,
            watch: None,
        };
        assert!(run.explore(&board, &initial.moves).is_ok());

        // simulated and counted, but never registered
        assert_eq!(run.stats.nodes, initial.moves.len());
        assert_eq!(run.registry.entries.len(), initial.moves.len() - chords);
        assert!(
            run.registry
                .entries
                .iter()
                .all(|entry| entry.first_move.kind != MoveKind::Chord)
        );
        assert!(run.registry.classify().chord.is_empty());
        assert!(advisor.classify(&board).chord.is_empty());
    }

    #[test]
    fn node_budget_truncates() {
        let board = pinned_fixture();
        let limits = SearchLimits {
            node_budget: 3,
            ..SearchLimits::default()
        };
        let advice = Advisor::new(TutorMode::Classic, 3, limits)
            .unwrap()
            .advise(&board, 0, &StampWatch::new(0));

        assert_eq!(advice.status, AdviceStatus::Current);
        assert!(advice.classification.truncated);
        assert_eq!(advice.stats.nodes, 3);
        assert_eq!(
            advice.classification.reveal.iter().copied().collect::<Vec<_>>(),
            [(3, 0)]
        );
    }

    #[test]
    fn superseded_run_is_stale() {
        let board = pinned_fixture();
        let watch = StampWatch::new(7);
        watch.bump();

        let advice = advisor(TutorMode::Classic, 2).advise(&board, 7, &watch);

        assert_eq!(advice.status, AdviceStatus::Stale);
        assert!(advice.classification.is_empty());
    }
}
