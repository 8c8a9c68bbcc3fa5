use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{Result, bail};
use sweeptutor_core::{ActionReport, Coord, GameStatus, PlayerAction, Session};
use web_time::Instant;

use crate::render;

const HELP: &str = "\
commands:
  ROW COL      primary click (chord on a number, else reveal, or flag in flag mode)
  r ROW COL    reveal
  f ROW COL    toggle flag
  c ROW COL    chord
  m            toggle flag mode
  h            show the tutor's suggestions
  p            list cells the solver can prove
  s            show stats
  n            new game
  q            quit";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Command {
    Act(PlayerAction),
    FlagMode,
    Hint,
    Probe,
    Stats,
    New,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let coords = |args: &[&str]| -> Result<(Coord, Coord)> {
        let [row, col] = args else {
            bail!("expected ROW COL");
        };
        Ok((row.parse()?, col.parse()?))
    };
    Ok(match words.as_slice() {
        ["r" | "reveal", args @ ..] => Command::Act(PlayerAction::Reveal(coords(args)?)),
        ["f" | "flag", args @ ..] => Command::Act(PlayerAction::ToggleFlag(coords(args)?)),
        ["c" | "chord", args @ ..] => Command::Act(PlayerAction::Chord(coords(args)?)),
        ["m" | "mode"] => Command::FlagMode,
        ["h" | "hint"] => Command::Hint,
        ["p" | "probe"] => Command::Probe,
        ["s" | "stats"] => Command::Stats,
        ["n" | "new"] => Command::New,
        ["?" | "help"] | [] => Command::Help,
        ["q" | "quit"] => Command::Quit,
        args => Command::Act(PlayerAction::Primary(coords(args)?)),
    })
}

/// Wall time from the first effective action until the game ends.
#[derive(Debug, Default)]
struct Clock {
    started: Option<Instant>,
    stopped: Option<Duration>,
}

impl Clock {
    fn start(&mut self) {
        self.started.get_or_insert_with(Instant::now);
    }

    fn stop(&mut self) {
        if self.stopped.is_none() {
            self.stopped = Some(self.elapsed());
        }
    }

    fn elapsed(&self) -> Duration {
        self.stopped
            .or_else(|| self.started.map(|started| started.elapsed()))
            .unwrap_or_default()
    }

    fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }
}

pub fn run(mut session: Session, input: impl BufRead, mut out: impl Write) -> Result<()> {
    let mut clock = Clock::default();
    writeln!(out, "{}", render::board(session.board(), None))?;

    for line in input.lines() {
        let command = match parse_command(&line?) {
            Ok(command) => command,
            Err(err) => {
                writeln!(out, "{err}, try `help`")?;
                continue;
            }
        };

        match command {
            Command::Act(action) => {
                let report = match session.act(action) {
                    Ok(report) => report,
                    Err(err) => {
                        writeln!(out, "{err}")?;
                        continue;
                    }
                };
                match report {
                    ActionReport::Applied { status, .. } => {
                        clock.start();
                        if status.is_finished() {
                            clock.stop();
                        }
                        writeln!(out, "{}", render::board(session.board(), None))?;
                        match status {
                            GameStatus::Won => writeln!(out, "cleared!")?,
                            GameStatus::Lost => writeln!(out, "boom")?,
                            _ => {}
                        }
                        if status.is_finished() {
                            let metrics = session.metrics(clock.elapsed_ms());
                            writeln!(out, "{}", render::metrics(&metrics))?;
                            continue;
                        }
                    }
                    ActionReport::NoEffect { mv } => {
                        writeln!(out, "{:?} at {:?} does nothing", mv.kind, mv.coords)?;
                    }
                    ActionReport::Rejected { mv, highlight } => {
                        let tags = render::highlight(session.board().size(), &highlight);
                        writeln!(out, "the tutor blocks {:?} at {:?}", mv.kind, mv.coords)?;
                        writeln!(out, "{}", render::board(session.board(), Some(&tags)))?;
                        writeln!(out, "{}", render::LEGEND)?;
                    }
                }
            }
            Command::FlagMode => {
                session.set_flag_mode(!session.flag_mode());
                let state = if session.flag_mode() { "on" } else { "off" };
                writeln!(out, "flag mode {state}")?;
                continue;
            }
            Command::Hint => {
                ensure_advice(&mut session);
                let tags = session.tags();
                writeln!(out, "{}", render::board(session.board(), Some(&tags)))?;
                writeln!(out, "{}", render::LEGEND)?;
            }
            Command::Probe => {
                match session.assessments() {
                    Some(grid) => writeln!(out, "{}", render::proofs(&grid))?,
                    None => writeln!(out, "no solver attached")?,
                }
                continue;
            }
            Command::Stats => {
                let metrics = session.metrics(clock.elapsed_ms());
                writeln!(out, "{}", render::metrics(&metrics))?;
                continue;
            }
            Command::New => {
                if let Err(err) = session.restart() {
                    writeln!(out, "{err}")?;
                    continue;
                }
                clock = Clock::default();
                writeln!(out, "{}", render::board(session.board(), None))?;
            }
            Command::Help => {
                writeln!(out, "{HELP}")?;
                continue;
            }
            Command::Quit => break,
        }

        ensure_advice(&mut session);
        writeln!(out, "{}", session.banner())?;
    }
    Ok(())
}

fn ensure_advice(session: &mut Session) {
    let settled = session.status().is_finished() || session.advice().is_some();
    if session.settings().mode.is_active() && !settled {
        let status = session.refresh_advice();
        log::debug!("Advice for version {}: {:?}", session.version(), status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweeptutor_core::{Board, GameConfig, MineLayout, TutorMode, TutorSettings};

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse_command("r 3 4").unwrap(),
            Command::Act(PlayerAction::Reveal((3, 4)))
        );
        assert_eq!(
            parse_command("  f 0 12 ").unwrap(),
            Command::Act(PlayerAction::ToggleFlag((0, 12)))
        );
        assert_eq!(
            parse_command("2 5").unwrap(),
            Command::Act(PlayerAction::Primary((2, 5)))
        );
        assert_eq!(parse_command("hint").unwrap(), Command::Hint);
        assert_eq!(parse_command("").unwrap(), Command::Help);
        assert!(parse_command("r 3").is_err());
        assert!(parse_command("c -1 2").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn scripted_game_runs_to_the_end() {
        let layout = MineLayout::from_mine_coords((6, 6), &[(0, 0)]).unwrap();
        let settings = TutorSettings::default();
        let session = Session::from_board(Board::new(layout), settings).unwrap();
        let script = "help\nr 5 5\nstats\nq\n";
        let mut out = Vec::new();

        run(session, script.as_bytes(), &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("cleared!"), "{out}");
        assert!(out.contains("value 1/1 in 1 actions"), "{out}");
    }

    #[test]
    fn new_game_on_a_tiny_fixture_keeps_playing() {
        let board = crate::fixture::parse("*..\n...\n...").unwrap();
        let settings = TutorSettings {
            mode: TutorMode::Off,
            ..TutorSettings::default()
        };
        let session = Session::from_board(board, settings).unwrap();
        let mut out = Vec::new();

        run(session, "n\nr 2 2\nq\n".as_bytes(), &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Board size 3x3 is outside the supported range"), "{out}");
        assert!(out.contains("cleared!"), "{out}");
    }

    #[test]
    fn tutor_blocks_an_inefficient_reveal() {
        let settings = TutorSettings {
            depth: 1,
            ..TutorSettings::default()
        };
        let session = Session::new(GameConfig::beginner(), settings, 3).unwrap();
        let mut out = Vec::new();

        // nothing is revealed yet, so every hidden cell is a guess and a chord is blocked
        run(session, "h\nc 4 4\nq\n".as_bytes(), &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("open any of 81 cells"), "{out}");
        assert!(out.contains("the tutor blocks Chord at (4, 4)"), "{out}");
    }
}
