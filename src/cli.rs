//! Interactive REPL acting as a virtual controller
//!
//! Each line becomes one event batch; `;` joins several commands into the
//! same batch so mode changes and pad hits can be ordered within it.

use anyhow::Result;
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::mpsc;

use crate::device::{DeviceStatus, Event, ModeButtons};
use crate::runtime::DeviceHandle;

/// One parsed REPL line
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Send(Vec<Event>),
    Status,
    Help,
    Quit,
}

const HELP: &str = "\
  btn <id> on|off            press or release a button
  tap <id>                   press and release a button
  enc <delta>                turn the encoder
  slider <id> <0.0-1.0>      move a slider
  pad <pos> on|off [p]       press or release a pad (pressure p, default 1.0)
  hit <pos> [p]              press and release a pad
  shift on|off               hold or release shift
  group on|off               hold or release group
  fixed                      tap the fixed-velocity button
  status                     show the mode state
  help                       this text
  quit                       remove the device and exit
Join commands with ';' to send them as one batch.";

/// Parse one REPL line against the device's mode buttons
pub fn parse_command(line: &str, buttons: &ModeButtons) -> Result<ReplCommand, String> {
    let line = line.trim();
    match line {
        "" => return Ok(ReplCommand::Send(Vec::new())),
        "status" => return Ok(ReplCommand::Status),
        "help" | "?" => return Ok(ReplCommand::Help),
        "quit" | "exit" => return Ok(ReplCommand::Quit),
        _ => {}
    }

    let mut events = Vec::new();
    for segment in line.split(';') {
        let words: Vec<&str> = segment.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        parse_segment(&words, buttons, &mut events)?;
    }
    Ok(ReplCommand::Send(events))
}

fn parse_segment(words: &[&str], buttons: &ModeButtons, out: &mut Vec<Event>) -> Result<(), String> {
    match words {
        ["btn", id, state] => out.push(Event::Button {
            id: parse_num(id, "button id")?,
            pressed: parse_on_off(state)?,
        }),
        ["tap", id] => {
            let id = parse_num(id, "button id")?;
            tap(id, out);
        }
        ["enc", delta] => out.push(Event::Encoder {
            delta: parse_num(delta, "encoder delta")?,
        }),
        ["slider", id, value] => out.push(Event::Slider {
            id: parse_num(id, "slider id")?,
            value: parse_num(value, "slider value")?,
        }),
        ["pad", pos, state] | ["pad", pos, state, _] => {
            let pressed = parse_on_off(state)?;
            let pressure = match words.get(3) {
                Some(p) => parse_num(p, "pressure")?,
                None if pressed => 1.0,
                None => 0.0,
            };
            out.push(Event::Grid {
                pos: parse_num(pos, "pad position")?,
                pressed,
                pressure,
            });
        }
        ["hit", pos] | ["hit", pos, _] => {
            let pos = parse_num(pos, "pad position")?;
            let pressure = match words.get(2) {
                Some(p) => parse_num(p, "pressure")?,
                None => 1.0,
            };
            out.push(Event::Grid {
                pos,
                pressed: true,
                pressure,
            });
            out.push(Event::Grid {
                pos,
                pressed: false,
                pressure: 0.0,
            });
        }
        ["shift", state] => out.push(Event::Button {
            id: buttons.shift.ok_or("device has no shift button")?,
            pressed: parse_on_off(state)?,
        }),
        ["group", state] => out.push(Event::Button {
            id: buttons.group.ok_or("device has no group button")?,
            pressed: parse_on_off(state)?,
        }),
        ["fixed"] => {
            let id = buttons
                .fixed_velocity
                .ok_or("device has no fixed-velocity button")?;
            tap(id, out);
        }
        [cmd, ..] => return Err(format!("unknown or malformed command '{}'", cmd)),
        [] => {}
    }
    Ok(())
}

fn tap(id: u32, out: &mut Vec<Event>) {
    out.push(Event::Button { id, pressed: true });
    out.push(Event::Button { id, pressed: false });
}

fn parse_on_off(word: &str) -> Result<bool, String> {
    match word {
        "on" | "down" | "1" => Ok(true),
        "off" | "up" | "0" => Ok(false),
        other => Err(format!("expected on/off, got '{}'", other)),
    }
}

fn parse_num<T: std::str::FromStr>(word: &str, what: &str) -> Result<T, String> {
    word.parse()
        .map_err(|_| format!("invalid {}: '{}'", what, word))
}

fn print_status(status: &DeviceStatus) {
    println!("\n{}", status.label.bold().cyan());
    println!("  overlay:        {}", status.overlay.bright_white());
    println!(
        "  group:          {} / {}",
        status.group_id.to_string().green(),
        status.max_groups
    );
    println!(
        "  channel:        {} (value {})",
        (status.channel + 1).to_string().green(),
        status.channel_value
    );
    let fixed = if status.fixed_velocity {
        "on".yellow()
    } else {
        "off".dimmed()
    };
    println!("  fixed velocity: {}", fixed);
    println!(
        "  pads lit:       {} (peak pressure {:.2})\n",
        status.pads_lit, status.peak_pressure
    );
}

/// Run the REPL on the current (blocking) thread
///
/// Returns when the user quits or input ends; dropping `tx` then ends the
/// event source feeding the device.
pub fn run_repl(
    tx: mpsc::Sender<Vec<Event>>,
    handle: DeviceHandle,
    buttons: ModeButtons,
) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!(
        "{} virtual controller for {} (type 'help')",
        "padbridge".bold().cyan(),
        handle.name()
    );

    loop {
        let line = match rl.readline("pads> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let _ = rl.add_history_entry(line.as_str());

        match parse_command(&line, &buttons) {
            Ok(ReplCommand::Send(events)) if events.is_empty() => {}
            Ok(ReplCommand::Send(events)) => {
                if tx.blocking_send(events).is_err() {
                    println!("{}", "device is gone".red());
                    break;
                }
            }
            Ok(ReplCommand::Status) => match handle.status_blocking() {
                Some(status) => print_status(&status),
                None => println!("{}", "no status available".dimmed()),
            },
            Ok(ReplCommand::Help) => println!("{}", HELP),
            Ok(ReplCommand::Quit) => break,
            Err(msg) => println!("{} {}", "error:".red().bold(), msg),
        }

        if !handle.is_alive() {
            println!("{}", "device is gone".red());
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buttons() -> ModeButtons {
        ModeButtons {
            shift: Some(0),
            group: Some(1),
            fixed_velocity: Some(2),
        }
    }

    fn events(line: &str) -> Vec<Event> {
        match parse_command(line, &buttons()) {
            Ok(ReplCommand::Send(events)) => events,
            other => panic!("expected events for '{}', got {:?}", line, other),
        }
    }

    #[test]
    fn test_single_commands() {
        assert_eq!(events("btn 5 on"), vec![Event::Button { id: 5, pressed: true }]);
        assert_eq!(events("enc -3"), vec![Event::Encoder { delta: -3 }]);
        assert_eq!(
            events("slider 1 0.5"),
            vec![Event::Slider { id: 1, value: 0.5 }]
        );
        assert_eq!(
            events("pad 3 on 0.25"),
            vec![Event::Grid {
                pos: 3,
                pressed: true,
                pressure: 0.25
            }]
        );
        assert_eq!(
            events("pad 3 off"),
            vec![Event::Grid {
                pos: 3,
                pressed: false,
                pressure: 0.0
            }]
        );
    }

    #[test]
    fn test_mode_words_use_layout_ids() {
        assert_eq!(events("shift on"), vec![Event::Button { id: 0, pressed: true }]);
        assert_eq!(events("group off"), vec![Event::Button { id: 1, pressed: false }]);
        assert_eq!(
            events("fixed"),
            vec![
                Event::Button { id: 2, pressed: true },
                Event::Button { id: 2, pressed: false }
            ]
        );
    }

    #[test]
    fn test_semicolon_builds_one_batch() {
        let batch = events("shift on; enc 1 ;hit 4");
        assert_eq!(batch.len(), 4);
        assert_eq!(batch[0], Event::Button { id: 0, pressed: true });
        assert_eq!(batch[1], Event::Encoder { delta: 1 });
        assert!(matches!(batch[2], Event::Grid { pos: 4, pressed: true, .. }));
        assert!(matches!(batch[3], Event::Grid { pos: 4, pressed: false, .. }));
    }

    #[test]
    fn test_control_words() {
        let b = buttons();
        assert_eq!(parse_command("status", &b), Ok(ReplCommand::Status));
        assert_eq!(parse_command(" quit ", &b), Ok(ReplCommand::Quit));
        assert_eq!(parse_command("help", &b), Ok(ReplCommand::Help));
        assert_eq!(parse_command("", &b), Ok(ReplCommand::Send(vec![])));
    }

    #[test]
    fn test_errors() {
        let b = buttons();
        assert!(parse_command("btn x on", &b).is_err());
        assert!(parse_command("pad 1 maybe", &b).is_err());
        assert!(parse_command("jump", &b).is_err());
        assert!(parse_command("enc 1; bogus", &b).is_err());

        let none = ModeButtons::default();
        assert!(parse_command("shift on", &none).is_err());
        assert!(parse_command("fixed", &none).is_err());
    }
}
