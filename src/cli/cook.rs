//! RC-010: Guided cook mode — one session driven from stdin with live timers.

use super::describe_event;
use crate::core::parser;
use crate::core::session::{CookingSession, CookingSessionController, StepStatus};
use crate::core::ticker::TickReceiver;
use crate::core::types::SessionEvent;
use crate::journal::{eventlog, hasher};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

/// A parsed cook-mode command. Step numbers are 1-based as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CookCommand {
    Next,
    Prev,
    Goto(usize),
    Done(usize),
    Timer,
    Pause,
    Reset,
    Status,
    Steps,
    Finish,
    Quit,
    Help,
    Unknown(String),
}

/// Parse one input line. Blank lines yield `None`.
pub(crate) fn parse_command(line: &str) -> Option<CookCommand> {
    let mut words = line.split_whitespace();
    let verb = words.next()?.to_lowercase();
    let arg = words.next().and_then(|w| w.parse::<usize>().ok());

    let cmd = match (verb.as_str(), arg) {
        ("next" | "n", _) => CookCommand::Next,
        ("prev" | "p" | "back", _) => CookCommand::Prev,
        ("goto" | "g", Some(n)) => CookCommand::Goto(n),
        ("done" | "d", Some(n)) => CookCommand::Done(n),
        ("timer" | "t", _) => CookCommand::Timer,
        ("pause" | "resume", _) => CookCommand::Pause,
        ("reset" | "r", _) => CookCommand::Reset,
        ("status" | "s", _) => CookCommand::Status,
        ("steps" | "ls", _) => CookCommand::Steps,
        ("finish" | "f", _) => CookCommand::Finish,
        ("quit" | "q" | "exit", _) => CookCommand::Quit,
        ("help" | "h" | "?", _) => CookCommand::Help,
        _ => CookCommand::Unknown(line.trim().to_string()),
    };
    Some(cmd)
}

/// Where session events go. `None` disables journaling.
struct SessionJournal {
    dir: Option<PathBuf>,
    recipe_id: String,
}

impl SessionJournal {
    fn record(&self, event: SessionEvent) {
        let Some(ref dir) = self.dir else {
            return;
        };
        if let Err(e) = eventlog::append_event(dir, &self.recipe_id, event) {
            warn!(recipe = %self.recipe_id, error = %e, "journal write failed");
        }
    }
}

pub(super) fn cmd_cook(
    file: &Path,
    config: &Path,
    journal_dir: Option<&Path>,
) -> Result<(), String> {
    let recipe = parser::load_recipe(file)?;
    let config = parser::load_engine_config(Some(config))?;

    let journal = SessionJournal {
        dir: if config.journal.enabled {
            Some(super::resolve_journal_dir(journal_dir, &config))
        } else {
            None
        },
        recipe_id: recipe.id.clone(),
    };

    let recipe_hash = hasher::hash_recipe(&recipe)?;
    let (controller, ticks) = CookingSessionController::new(recipe, &config.timer)?;
    let session_id = eventlog::generate_session_id();
    info!(session = %session_id, recipe = %controller.recipe().id, "cook session started");
    journal.record(SessionEvent::SessionStarted {
        recipe: controller.recipe().id.clone(),
        session_id,
        recipe_hash,
        step_count: controller.steps().len(),
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("cannot start runtime: {}", e))?;

    println!("{}", controller.recipe().title);
    println!("Type `help` for commands.");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let session = runtime.block_on(drive(controller, ticks, stdin, &journal))?;

    println!(
        "Session over: {}/{} steps completed.",
        session.completed_count(),
        session.step_count()
    );
    Ok(())
}

/// Run the session until `quit`, `finish` or end of input. Returns the final session.
async fn drive<R>(
    mut controller: CookingSessionController,
    mut ticks: TickReceiver,
    input: R,
    journal: &SessionJournal,
) -> Result<CookingSession, String>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    print_step(&controller);

    loop {
        tokio::select! {
            Some(tick) = ticks.recv() => {
                if let Some(event) = controller.on_tick(tick) {
                    if matches!(event, SessionEvent::TimerExpired { .. }) {
                        println!("*** Timer finished: {} ***", controller.current_step().title);
                    }
                    journal.record(event);
                }
            }
            line = lines.next_line() => {
                let line = line.map_err(|e| format!("cannot read input: {}", e))?;
                let Some(line) = line else {
                    break;
                };
                let Some(cmd) = parse_command(&line) else {
                    continue;
                };
                match cmd {
                    CookCommand::Quit => break,
                    CookCommand::Finish => {
                        if controller.session().can_finish() {
                            println!("Bon appétit!");
                            break;
                        }
                        println!("finish is only available on the last step");
                    }
                    other => {
                        if let Some(event) = apply(&mut controller, other) {
                            println!("  {}", describe_event(&event));
                            journal.record(event);
                        }
                    }
                }
            }
        }
    }

    let session = controller.session().clone();
    journal.record(controller.close());
    Ok(session)
}

/// Apply a command that does not end the session.
fn apply(controller: &mut CookingSessionController, cmd: CookCommand) -> Option<SessionEvent> {
    let event = match cmd {
        CookCommand::Next => {
            let event = controller.advance();
            if event.is_none() {
                println!("Already on the last step. Type `finish` when done.");
            }
            event
        }
        CookCommand::Prev => {
            let event = controller.retreat();
            if event.is_none() {
                println!("Already on the first step.");
            }
            event
        }
        CookCommand::Goto(n) => {
            let event = n.checked_sub(1).and_then(|i| controller.jump_to(i));
            if event.is_none() {
                println!("No move: step {} is current or out of range.", n);
            }
            event
        }
        CookCommand::Done(n) => {
            let event = n
                .checked_sub(1)
                .and_then(|i| controller.toggle_step_complete(i));
            if event.is_none() {
                println!("No step {}.", n);
            }
            event
        }
        CookCommand::Timer => {
            let event = controller.start_step_timer();
            if event.is_none() {
                match controller.current_step().duration_minutes {
                    None | Some(0) => println!("This step has no timer."),
                    Some(_) => println!("Timer is {}.", controller.session().timer()),
                }
            }
            event
        }
        CookCommand::Pause => controller.toggle_timer(),
        CookCommand::Reset => controller.reset_timer(),
        CookCommand::Status => {
            print_status(controller);
            None
        }
        CookCommand::Steps => {
            print_steps(controller);
            None
        }
        CookCommand::Help => {
            print_help();
            None
        }
        CookCommand::Unknown(text) => {
            println!("Unknown command '{}'. Type `help`.", text);
            None
        }
        CookCommand::Finish | CookCommand::Quit => None,
    };

    if matches!(
        event,
        Some(
            SessionEvent::StepAdvanced { .. }
                | SessionEvent::StepRetreated { .. }
                | SessionEvent::StepJumped { .. }
        )
    ) {
        print_step(controller);
    }
    event
}

fn print_step(controller: &CookingSessionController) {
    let session = controller.session();
    let step = controller.current_step();
    let done = if session.is_completed(session.current_step()) {
        " [done]"
    } else {
        ""
    };
    println!();
    println!(
        "Step {} of {}: {}{}",
        session.current_step() + 1,
        session.step_count(),
        step.title,
        done
    );
    if !step.description.is_empty() {
        println!("  {}", step.description);
    }
    if let Some(t) = step.temperature_celsius {
        println!("  Oven: {}°C", t);
    }
    if let Some(d) = step.duration_minutes {
        println!("  Duration: {} min (type `timer` to start)", d);
    }
}

fn print_status(controller: &CookingSessionController) {
    let session = controller.session();
    println!(
        "  Step {} of {}, {}/{} completed ({:.0}%), timer {}",
        session.current_step() + 1,
        session.step_count(),
        session.completed_count(),
        session.step_count(),
        session.progress_percent(),
        session.timer()
    );
}

fn print_steps(controller: &CookingSessionController) {
    for (i, step) in controller.steps().iter().enumerate() {
        let marker = match controller.session().step_status(i) {
            StepStatus::Current => ">",
            StepStatus::Completed => "x",
            StepStatus::Pending => " ",
        };
        println!("  [{}] {}. {}", marker, i + 1, step.title);
    }
}

fn print_help() {
    println!("  next | prev | goto N | done N | timer | pause | reset");
    println!("  status | steps | finish | quit");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timer::TimerState;
    use crate::core::types::{Recipe, TimerPolicy};

    fn recipe() -> Recipe {
        parser::parse_recipe(
            r#"
id: tarte
title: Tarte aux pommes
steps:
  - {id: pate, order: 1, title: Pâte}
  - {id: pommes, order: 2, title: Pommes}
  - {id: cuisson, order: 3, title: Cuisson, duration_minutes: 1, temperature_celsius: 180}
"#,
        )
        .unwrap()
    }

    fn no_journal() -> SessionJournal {
        SessionJournal {
            dir: None,
            recipe_id: "tarte".to_string(),
        }
    }

    async fn run_script(script: &str, journal: &SessionJournal) -> CookingSession {
        let (controller, ticks) =
            CookingSessionController::new(recipe(), &TimerPolicy::default()).unwrap();
        drive(controller, ticks, script.as_bytes(), journal)
            .await
            .unwrap()
    }

    #[test]
    fn test_rc010_parse_commands() {
        assert_eq!(parse_command("next"), Some(CookCommand::Next));
        assert_eq!(parse_command("  N "), Some(CookCommand::Next));
        assert_eq!(parse_command("p"), Some(CookCommand::Prev));
        assert_eq!(parse_command("goto 3"), Some(CookCommand::Goto(3)));
        assert_eq!(parse_command("done 1"), Some(CookCommand::Done(1)));
        assert_eq!(parse_command("t"), Some(CookCommand::Timer));
        assert_eq!(parse_command("resume"), Some(CookCommand::Pause));
        assert_eq!(parse_command("q"), Some(CookCommand::Quit));
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn test_rc010_parse_missing_argument() {
        assert_eq!(
            parse_command("goto"),
            Some(CookCommand::Unknown("goto".to_string()))
        );
        assert_eq!(
            parse_command("done x"),
            Some(CookCommand::Unknown("done x".to_string()))
        );
    }

    #[tokio::test]
    async fn test_rc010_drive_navigation() {
        let session = run_script("next\nnext\nprev\nquit\n", &no_journal()).await;
        assert_eq!(session.current_step(), 1);
        assert_eq!(session.completed().iter().copied().collect::<Vec<_>>(), vec![0]);
    }

    #[tokio::test]
    async fn test_rc010_drive_goto_and_done() {
        let session = run_script("goto 3\ndone 3\ngoto 0\nstatus\n", &no_journal()).await;
        assert_eq!(session.current_step(), 2);
        assert!(session.is_completed(2));
    }

    #[tokio::test]
    async fn test_rc010_finish_only_on_last_step() {
        // finish on step 1 is refused; the session then ends at end of input
        let session = run_script("finish\nnext\n", &no_journal()).await;
        assert_eq!(session.current_step(), 1);
    }

    #[tokio::test]
    async fn test_rc010_end_of_input_closes() {
        let session = run_script("", &no_journal()).await;
        assert_eq!(session.current_step(), 0);
        assert_eq!(session.timer(), TimerState::Idle);
    }

    #[tokio::test]
    async fn test_rc010_unknown_and_help_are_harmless() {
        let session = run_script("dance\nhelp\nsteps\ntimer\n", &no_journal()).await;
        assert_eq!(session.current_step(), 0);
        assert_eq!(session.timer(), TimerState::Idle);
    }

    #[tokio::test]
    async fn test_rc010_journal_records_session() {
        let dir = tempfile::tempdir().unwrap();
        let journal = SessionJournal {
            dir: Some(dir.path().to_path_buf()),
            recipe_id: "tarte".to_string(),
        };
        run_script("next\ngoto 3\ntimer\npause\nreset\nq\n", &journal).await;

        let events = eventlog::read_events(dir.path(), "tarte").unwrap();
        let kinds: Vec<&SessionEvent> = events.iter().map(|e| &e.event).collect();
        assert_eq!(kinds[0], &SessionEvent::StepAdvanced { from: 0, to: 1 });
        assert_eq!(kinds[1], &SessionEvent::StepJumped { from: 1, to: 2 });
        assert_eq!(
            kinds[2],
            &SessionEvent::TimerStarted {
                step: 2,
                seconds: 60
            }
        );
        assert!(matches!(kinds[3], SessionEvent::TimerPaused { step: 2, .. }));
        assert_eq!(kinds[4], &SessionEvent::TimerReset { step: 2 });
        assert!(matches!(
            kinds.last(),
            Some(SessionEvent::SessionClosed { step_count: 3, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rc010_drive_records_timer_expiry() {
        use tokio::io::AsyncWriteExt;

        let dir = tempfile::tempdir().unwrap();
        let journal = SessionJournal {
            dir: Some(dir.path().to_path_buf()),
            recipe_id: "tarte".to_string(),
        };
        let (controller, ticks) =
            CookingSessionController::new(recipe(), &TimerPolicy::default()).unwrap();
        let (mut keyboard, input) = tokio::io::duplex(256);

        let typing = async move {
            keyboard.write_all(b"goto 3\ntimer\n").await.unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(61)).await;
            drop(keyboard);
        };
        let (session, ()) = tokio::join!(
            drive(controller, ticks, tokio::io::BufReader::new(input), &journal),
            typing
        );
        let session = session.unwrap();
        assert_eq!(session.current_step(), 2);
        assert_eq!(session.timer(), TimerState::Expired);

        let events = eventlog::read_events(dir.path(), "tarte").unwrap();
        assert!(events
            .iter()
            .any(|e| e.event == SessionEvent::TimerExpired { step: 2 }));
    }

    #[test]
    fn test_rc010_journal_disabled_writes_nothing() {
        let journal = no_journal();
        journal.record(SessionEvent::TimerReset { step: 0 });
    }
}
