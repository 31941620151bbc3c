//! Line-driven edit loop: the command-line stand-in for drag and drop.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::Rng;
use thiserror::Error;

use team_grouping::render::render_edit_view;
use team_grouping::{EditSession, Group, Grouping, Policy, StudentSource};

const HELP: &str = "\
Commands (numbers are 1-based):
  show                      print the groups and unassigned students
  move <g>.<s> <target>     move student s of group g to target group
  move u.<i> <target>       move unassigned student i to target group
                            (target 'new' starts a new group)
  remove <g> <s>            unassign student s of group g
  dissolve <g>              unassign everyone in group g and drop it
  reset                     back to the generated groups
  balance                   regroup everyone automatically
  save                      validate and keep the edits
  cancel                    discard the edits";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Index(usize),
    New,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Show,
    Move { source: StudentSource, target: Target },
    Remove { group: usize, student: usize },
    Dissolve(usize),
    Reset,
    Balance,
    Save,
    Cancel,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command \"{0}\" (try 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("\"{0}\" is not a 1-based number")]
    BadNumber(String),
}

/// How the loop ended.
#[derive(Debug)]
pub enum EditOutcome {
    Saved(Grouping),
    Cancelled(Grouping),
}

/// Parses one input line. Indices in the result are 0-based.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = words.split_first() else {
        return Err(CommandError::Usage("help"));
    };

    let command = match (head.to_lowercase().as_str(), args) {
        ("show" | "list", []) => Command::Show,
        ("move" | "mv", [source, target]) => Command::Move {
            source: parse_source(source)?,
            target: parse_target(target)?,
        },
        ("move" | "mv", _) => return Err(CommandError::Usage("move <g>.<s>|u.<i> <target>")),
        ("remove" | "rm", [group, student]) => Command::Remove {
            group: parse_index(group)?,
            student: parse_index(student)?,
        },
        ("remove" | "rm", _) => return Err(CommandError::Usage("remove <group> <student>")),
        ("dissolve", [group]) => Command::Dissolve(parse_index(group)?),
        ("dissolve", _) => return Err(CommandError::Usage("dissolve <group>")),
        ("reset", []) => Command::Reset,
        ("balance", []) => Command::Balance,
        ("save", []) => Command::Save,
        ("cancel" | "quit", []) => Command::Cancel,
        ("help" | "?", _) => Command::Help,
        _ => return Err(CommandError::Unknown(line.trim().to_string())),
    };
    Ok(command)
}

fn parse_index(text: &str) -> Result<usize, CommandError> {
    match text.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(CommandError::BadNumber(text.to_string())),
    }
}

fn parse_source(text: &str) -> Result<StudentSource, CommandError> {
    let (group, index) = text
        .split_once('.')
        .ok_or(CommandError::Usage("move <g>.<s>|u.<i> <target>"))?;
    if group.eq_ignore_ascii_case("u") {
        return Ok(StudentSource::Unassigned(parse_index(index)?));
    }
    Ok(StudentSource::Group {
        group: parse_index(group)?,
        student: parse_index(index)?,
    })
}

fn parse_target(text: &str) -> Result<Target, CommandError> {
    if text.eq_ignore_ascii_case("new") {
        return Ok(Target::New);
    }
    parse_index(text).map(Target::Index)
}

/// Runs the edit loop over `input` until save, cancel, end of input or
/// Ctrl+C. Only a successful save keeps the edits.
pub fn run_edit_loop<R, I, O>(
    grouping: &[Group],
    policy: Policy,
    rng: &mut R,
    running: Arc<AtomicBool>,
    interactive: bool,
    input: I,
    out: &mut O,
) -> io::Result<EditOutcome>
where
    R: Rng + ?Sized,
    I: BufRead,
    O: Write,
{
    let mut session = EditSession::enable(grouping, policy);

    if interactive {
        writeln!(out, "Editing {} (type 'help' for commands)", policy.display_name())?;
        write!(out, "{}", render_edit_view(session.current(), session.unassigned(), policy))?;
        write!(out, "> ")?;
        out.flush()?;
    }

    for line in input.lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let line = line?;
        if line.trim().is_empty() {
            if interactive {
                write!(out, "> ")?;
                out.flush()?;
            }
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "  ✗ {}", e)?;
                continue;
            }
        };

        let result = match command {
            Command::Show => {
                write!(out, "{}", render_edit_view(session.current(), session.unassigned(), policy))?;
                Ok(())
            }
            Command::Move { source, target } => {
                let target = match target {
                    Target::Index(i) => i,
                    Target::New => session.current().len(),
                };
                session.move_student(source, target)
            }
            Command::Remove { group, student } => session.remove_student(group, student),
            Command::Dissolve(group) => session.dissolve_group(group),
            Command::Reset => {
                session.reset_to_original();
                Ok(())
            }
            Command::Balance => {
                session.auto_balance_with(rng);
                Ok(())
            }
            Command::Save => match session.save() {
                Ok(saved) => {
                    writeln!(out, "  ✓ changes saved")?;
                    return Ok(EditOutcome::Saved(saved));
                }
                Err(rejected) => {
                    writeln!(out, "  ✗ {}", rejected.error)?;
                    session = rejected.session;
                    continue;
                }
            },
            Command::Cancel => {
                writeln!(out, "  changes cancelled")?;
                return Ok(EditOutcome::Cancelled(session.cancel()));
            }
            Command::Help => {
                writeln!(out, "{}", HELP)?;
                Ok(())
            }
        };

        match result {
            Ok(()) if interactive && !matches!(command, Command::Show | Command::Help) => {
                write!(out, "{}", render_edit_view(session.current(), session.unassigned(), policy))?;
            }
            Ok(()) => {}
            Err(conflict) => writeln!(out, "  ✗ {}", conflict)?,
        }
        if interactive {
            write!(out, "> ")?;
            out.flush()?;
        }
    }

    if !running.load(Ordering::SeqCst) {
        writeln!(out, "\nInterrupted; edits discarded.")?;
    }
    Ok(EditOutcome::Cancelled(session.cancel()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use team_grouping::{Sex, Student};

    use super::*;

    fn pairs() -> Grouping {
        ["A", "B", "C", "D"]
            .chunks(2)
            .map(|names| {
                Group::from(
                    names
                        .iter()
                        .map(|n| Student::new(*n, 60, Sex::F).unwrap())
                        .collect::<Vec<_>>(),
                )
            })
            .collect()
    }

    fn run(script: &str, running: bool) -> (EditOutcome, String) {
        let mut out = Vec::new();
        let outcome = run_edit_loop(
            &pairs(),
            Policy::RandomPairs,
            &mut StdRng::seed_from_u64(1),
            Arc::new(AtomicBool::new(running)),
            false,
            Cursor::new(script.to_string()),
            &mut out,
        )
        .unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("show").unwrap(), Command::Show);
        assert_eq!(
            parse_command("move 2.1 new").unwrap(),
            Command::Move {
                source: StudentSource::Group { group: 1, student: 0 },
                target: Target::New
            }
        );
        assert_eq!(
            parse_command("MOVE u.3 1").unwrap(),
            Command::Move {
                source: StudentSource::Unassigned(2),
                target: Target::Index(0)
            }
        );
        assert_eq!(
            parse_command("remove 1 2").unwrap(),
            Command::Remove { group: 0, student: 1 }
        );
        assert_eq!(parse_command("dissolve 3").unwrap(), Command::Dissolve(2));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_command("dissolve 0"),
            Err(CommandError::BadNumber("0".to_string()))
        );
        assert!(matches!(parse_command("move 1"), Err(CommandError::Usage(_))));
        assert!(matches!(parse_command("frobnicate"), Err(CommandError::Unknown(_))));
    }

    #[test]
    fn test_save_after_fixing_unassigned() {
        let (outcome, out) = run("remove 1 1\nsave\nmove u.1 1\nsave\n", true);
        assert!(out.contains("group 1 has only 1 student(s); minimum is 2"));
        match outcome {
            EditOutcome::Saved(grouping) => {
                assert_eq!(grouping[0].members[1].name, "A");
            }
            other => panic!("expected save, got {:?}", other),
        }
    }

    #[test]
    fn test_full_pair_reports_conflict() {
        let (_, out) = run("move 1.1 2\ncancel\n", true);
        assert!(out.contains("team is full"));
    }

    #[test]
    fn test_end_of_input_cancels() {
        let (outcome, _) = run("dissolve 1\n", true);
        match outcome {
            EditOutcome::Cancelled(grouping) => assert_eq!(grouping, pairs()),
            other => panic!("expected cancel, got {:?}", other),
        }
    }

    #[test]
    fn test_interrupt_discards_edits() {
        let (outcome, out) = run("dissolve 1\nsave\n", false);
        assert!(matches!(outcome, EditOutcome::Cancelled(_)));
        assert!(out.contains("Interrupted"));
    }
}
