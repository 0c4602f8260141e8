//! Focus Flow CLI: binaural tones, a focus timer and a task board in one prompt.

mod commands;
mod config;

use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use commands::{Command, TimerCommand, HELP};
use config::Config;
use focusflow_desk::{format_mm_ss, Board, Column, CountdownTimer, FileStore, KeyValueStore, MemoryStore, TimerEvent};
use focusflow_engine::{CpalHost, ParameterController, PlaybackState, Session};

#[derive(Debug, Default)]
struct Args {
    verbose: bool,
    list_devices: bool,
    config: Option<PathBuf>,
    device_name: Option<String>,
    sample_rate: Option<u32>,
    channels: Option<u16>,
}

fn parse_args() -> Args {
    let mut a = Args::default();
    for s in std::env::args().skip(1) {
        if s == "--verbose" || s == "-v" { a.verbose = true; continue; }
        if s == "--list-devices" { a.list_devices = true; continue; }
        if let Some(rest) = s.strip_prefix("--config=")      { a.config      = Some(PathBuf::from(rest)); continue; }
        if let Some(rest) = s.strip_prefix("--device=")      { a.device_name = Some(rest.to_string());    continue; }
        if let Some(rest) = s.strip_prefix("--sample-rate=") { a.sample_rate = rest.parse().ok();         continue; }
        if let Some(rest) = s.strip_prefix("--channels=")    { a.channels    = rest.parse().ok();         continue; }
        eprintln!("[warn] unknown arg: {s}");
    }
    a
}

fn init_logging(verbose: bool) {
    use simplelog::{Config as LogConfig, LevelFilter, WriteLogger};

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("focusflow")
        .join("focusflow.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = File::create(&log_path)
        .or_else(|_| File::create(std::env::temp_dir().join("focusflow.log")));
    match log_file {
        Ok(file) => {
            if let Err(e) = WriteLogger::init(log_level, LogConfig::default(), file) {
                eprintln!("[warn] logger not installed: {e}");
            }
        }
        Err(e) => eprintln!("[warn] logging disabled: {e}"),
    }

    log::info!("focusflow starting (log level: {:?})", log_level);
}

fn list_output_devices() -> Result<(), Box<dyn Error>> {
    println!("Available output devices:");
    for name in CpalHost::output_device_names()? {
        println!("- {name}");
    }
    Ok(())
}

fn open_store(config: &Config) -> Box<dyn KeyValueStore> {
    match config.storage_dir() {
        Some(dir) => {
            log::info!(target: "board", "task storage in {}", dir.display());
            Box::new(FileStore::new(dir))
        }
        None => {
            log::warn!(target: "board", "no data dir; tasks will not be saved");
            Box::new(MemoryStore::new())
        }
    }
}

struct App {
    tones: ParameterController<Session<CpalHost>>,
    timer: CountdownTimer,
    board: Board<Box<dyn KeyValueStore>>,
}

impl App {
    /// `false` once the user asked to quit.
    fn handle_line(&mut self, line: &str) -> bool {
        match line.parse::<Command>() {
            Ok(Command::Quit) => return false,
            Ok(cmd) => self.run(cmd),
            Err(e) if e.is_empty() => {}
            Err(e) => println!("{e}"),
        }
        true
    }

    fn run(&mut self, cmd: Command) {
        match cmd {
            Command::Play => match self.tones.sink_mut().toggle() {
                Ok(PlaybackState::Running) => println!("playing"),
                Ok(PlaybackState::Starting) => println!("waiting for the audio output..."),
                Ok(PlaybackState::Stopped) => println!("stopped"),
                Err(e) => println!("cannot play: {e}"),
            },
            Command::Stop => {
                self.tones.sink_mut().stop();
                println!("stopped");
            }
            Command::Base(hz) => println!("base {:.0} Hz", self.tones.set_base_frequency(hz)),
            Command::Beat(hz) => println!("beat {:.0} Hz", self.tones.set_beat_frequency(hz)),
            Command::Volume(v) => println!("volume {:.0}%", self.tones.set_volume(v)),
            Command::Status => self.print_status(),
            Command::Timer(t) => self.run_timer(t),
            Command::Add(text) => match self.board.add(&text) {
                Some(id) => println!("added #{id}"),
                None => println!("nothing to add"),
            },
            Command::Remove { id, column } => {
                if !self.board.remove(id, column) {
                    println!("no task #{id} in {column}");
                }
            }
            Command::Move { src, src_index, dst, dst_index } => {
                if let Err(e) = self.board.reorder(src, src_index, dst, dst_index) {
                    println!("{e}");
                }
            }
            Command::Clear => self.board.clear_all(),
            Command::Tasks => self.print_tasks(),
            Command::Help => println!("{HELP}"),
            Command::Quit => {}
        }
    }

    fn run_timer(&mut self, cmd: TimerCommand) {
        match cmd {
            TimerCommand::Start => self.timer.start(),
            TimerCommand::Pause => self.timer.pause(),
            TimerCommand::Reset => self.timer.reset(),
            TimerCommand::Type(ty) => self.timer.set_session_type(ty),
        }
        println!("{} {} ({})", self.timer.session_type(), format_mm_ss(self.timer.remaining_seconds()), self.timer.cycle_label());
    }

    fn on_tick(&mut self) {
        if let Some(TimerEvent::Finished { session_type, cycle }) = self.timer.tick() {
            println!("\n{session_type} session {cycle} finished; `timer start` for the next one");
            prompt();
        }
    }

    fn print_status(&self) {
        let p = self.tones.parameters();
        let session = self.tones.sink();
        println!(
            "tones: left {:.0} Hz, right {:.0} Hz (beat {:.0} Hz), volume {:.0}%  [{:?}]",
            p.left_frequency_hz(),
            p.right_frequency_hz(),
            p.beat_frequency_hz,
            p.volume_percent,
            session.state()
        );
        println!(
            "timer: {} {} {} ({})",
            self.timer.session_type(),
            format_mm_ss(self.timer.remaining_seconds()),
            if self.timer.is_running() { "running" } else { "paused" },
            self.timer.cycle_label()
        );
    }

    fn print_tasks(&self) {
        for column in Column::ALL {
            println!("{column}:");
            for (i, task) in self.board.column(column).iter().enumerate() {
                println!("  {i}. {} (#{})", task.text, task.id);
            }
        }
    }
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args();
    init_logging(args.verbose);

    if args.list_devices {
        list_output_devices()?;
        return Ok(());
    }

    let config = Config::load(args.config.as_deref());
    let mut host = config.host();
    if args.device_name.is_some() { host.device_name = args.device_name; }
    if args.sample_rate.is_some() { host.sample_rate = args.sample_rate; }
    if args.channels.is_some()    { host.channels    = args.channels; }

    let session = Session::new(host, config.engine_settings());
    let mut app = App {
        tones: ParameterController::new(session, config.tone_parameters()),
        timer: CountdownTimer::new(config.timer_minutes()),
        board: Board::load(open_store(&config)),
    };

    println!("focusflow: binaural focus tones. Type `help` for commands.\n");
    app.print_status();
    prompt();

    let (line_tx, line_rx) = crossbeam_channel::unbounded::<String>();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(l) => {
                    if line_tx.send(l).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("stdin closed: {e}");
                    break;
                }
            }
        }
    });
    let ticker = crossbeam_channel::tick(Duration::from_secs(1));

    loop {
        crossbeam_channel::select! {
            recv(line_rx) -> line => match line {
                Ok(line) => {
                    if !app.handle_line(&line) {
                        break;
                    }
                    prompt();
                }
                Err(_) => break,
            },
            recv(ticker) -> _ => app.on_tick(),
        }
    }

    app.tones.sink_mut().stop();
    log::info!("focusflow exiting");
    Ok(())
}
