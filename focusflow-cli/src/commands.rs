//! One-line command grammar for the interactive prompt.

use focusflow_desk::{Column, SessionType};

#[derive(Clone, Debug, PartialEq)]
pub enum TimerCommand {
    Start,
    Pause,
    Reset,
    Type(SessionType),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Play,
    Stop,
    Base(f32),
    Beat(f32),
    Volume(f32),
    Status,
    Timer(TimerCommand),
    Add(String),
    Remove { id: u64, column: Column },
    Move { src: Column, src_index: usize, dst: Column, dst_index: usize },
    Clear,
    Tasks,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  play                 toggle playback
  stop                 stop playback
  base N | beat N      base frequency (200-800 Hz) / beat (1-40 Hz)
  vol N                volume percent (0-100)
  status               tones, playback and timer
  timer start|pause|reset|type NAME
  add TEXT             new task at the top of todo
  rm ID COLUMN         remove a task
  mv SRC IDX DST IDX   move a task between columns
  clear                remove every task
  tasks                show the board
  help | quit";

impl std::str::FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let args: Vec<&str> = rest.split_whitespace().collect();

        match word.to_ascii_lowercase().as_str() {
            "play" | "toggle" => Ok(Command::Play),
            "stop" => Ok(Command::Stop),
            "base" => number(&args).map(Command::Base),
            "beat" => number(&args).map(Command::Beat),
            "vol" | "volume" => number(&args).map(Command::Volume),
            "status" => Ok(Command::Status),
            "timer" => parse_timer(&args).map(Command::Timer),
            "add" if !rest.is_empty() => Ok(Command::Add(rest.to_string())),
            "add" => Err("usage: add TEXT".into()),
            "rm" => match args.as_slice() {
                [id, column] => Ok(Command::Remove {
                    id: id.parse().map_err(|_| format!("not a task id: {id}"))?,
                    column: column.parse().map_err(|e| format!("{e}"))?,
                }),
                _ => Err("usage: rm ID COLUMN".into()),
            },
            "mv" => match args.as_slice() {
                [src, si, dst, di] => Ok(Command::Move {
                    src: src.parse().map_err(|e| format!("{e}"))?,
                    src_index: index(si)?,
                    dst: dst.parse().map_err(|e| format!("{e}"))?,
                    dst_index: index(di)?,
                }),
                _ => Err("usage: mv SRC IDX DST IDX".into()),
            },
            "clear" => Ok(Command::Clear),
            "tasks" | "ls" => Ok(Command::Tasks),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            "" => Err(String::new()),
            other => Err(format!("unknown command: {other} (try `help`)")),
        }
    }
}

fn number(args: &[&str]) -> Result<f32, String> {
    match args {
        [n] => n.parse::<f32>().ok().filter(|v| v.is_finite()).ok_or_else(|| format!("not a number: {n}")),
        _ => Err("expected one number".into()),
    }
}

fn index(s: &str) -> Result<usize, String> {
    s.parse().map_err(|_| format!("not an index: {s}"))
}

fn parse_timer(args: &[&str]) -> Result<TimerCommand, String> {
    match args {
        ["start"] => Ok(TimerCommand::Start),
        ["pause"] => Ok(TimerCommand::Pause),
        ["reset"] => Ok(TimerCommand::Reset),
        ["type", name] => name.parse().map(TimerCommand::Type),
        _ => Err("usage: timer start|pause|reset|type NAME".into()),
    }
}
