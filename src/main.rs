//! Crowd Player CLI - Replay a crowd simulator stream.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::time::Instant;

use crowd_player::{
    PlayerError,
    playback::{EndReason, SystemClock, play},
    protocol::{FloatOrder, MessageWriter},
    render::HeadlessRenderer,
    schema::{ConfigError, PlayerConfig},
    synth::{SyntheticConfig, write_synthetic},
};

enum Command {
    Play {
        config: PlayerConfig,
        input: Option<PathBuf>,
    },
    Synth(SyntheticConfig),
    Example,
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    let command = match parse_args(args.get(1..).unwrap_or_default()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("[Config] {}", e);
            eprintln!();
            print_usage(args.first().map(String::as_str).unwrap_or("crowd-player"));
            std::process::exit(1);
        }
    };

    let result = match command {
        Command::Example => {
            print_example_config();
            Ok(())
        }
        Command::Synth(config) => run_synth(&config),
        Command::Play { config, input } => run_player(&config, input),
    };

    if let Err(e) = result {
        eprintln!("{}", e.diagnostic());
        std::process::exit(e.exit_code());
    }
}

fn parse_args(args: &[String]) -> Result<Command, ConfigError> {
    match args.first().map(String::as_str) {
        None => return Err(ConfigError::Usage("missing arguments".to_string())),
        Some("--example") => return Ok(Command::Example),
        Some("synth") => {
            let mut config = SyntheticConfig::default();
            if let Some(ticks) = args.get(1) {
                config.ticks = ticks
                    .parse()
                    .map_err(|_| ConfigError::Usage(format!("invalid tick count: {}", ticks)))?;
            }
            if let Some(scene) = args.get(2) {
                config.scene_file = scene.clone();
            }
            return Ok(Command::Synth(config));
        }
        Some(_) => {}
    }

    let mut positional = Vec::new();
    let mut config_path = None;
    let mut input = None;
    let mut no_pace = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => config_path = Some(flag_value(&mut iter, "--config")?),
            "--input" => input = Some(flag_value(&mut iter, "--input")?),
            "--no-pace" => no_pace = true,
            flag if flag.starts_with("--") => {
                return Err(ConfigError::Usage(format!("unknown option: {}", flag)));
            }
            _ => positional.push(arg),
        }
    }

    let has_config = config_path.is_some();
    let mut config = match config_path {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };

    match positional.as_slice() {
        [sprite, scale] => {
            config.sprite_path = PathBuf::from(sprite.as_str());
            config.sprite_scale = scale
                .parse()
                .map_err(|_| ConfigError::Usage(format!("invalid sprite scale: {}", scale)))?;
        }
        [] if has_config => {}
        _ => {
            return Err(ConfigError::Usage(
                "expected <sprite.svg> <sprite_scale>".to_string(),
            ));
        }
    }
    if no_pace {
        config.pace = false;
    }
    config.validate()?;

    Ok(Command::Play { config, input })
}

fn flag_value<'a>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<PathBuf, ConfigError> {
    iter.next()
        .map(PathBuf::from)
        .ok_or_else(|| ConfigError::Usage(format!("{} needs a value", flag)))
}

fn run_player(config: &PlayerConfig, input: Option<PathBuf>) -> Result<(), PlayerError> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => {
            let file = File::open(&path).map_err(|source| PlayerError::Input { path, source })?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let mut renderer = HeadlessRenderer::new(&config.window_title)
        .with_dismiss_after(config.headless_dismiss_after_polls);

    let start = Instant::now();
    let report = play(reader, &mut renderer, SystemClock::new(), config)?;
    let elapsed = start.elapsed();

    println!("Crowd Player");
    println!("============");
    println!("Messages: {}", report.messages);
    println!("Frames presented: {}", report.frames_presented);
    if report.unknown_tags > 0 {
        println!("Unknown tags skipped: {}", report.unknown_tags);
    }
    if report.out_of_bounds_cells > 0 {
        println!("Density cells outside scene: {}", report.out_of_bounds_cells);
    }
    println!("Wall time: {:.2}s", elapsed.as_secs_f32());
    match (&report.ended_by, &report.summary) {
        (EndReason::Dismissed, Some(summary)) => {
            println!();
            println!("Simulation done:");
            println!("  {}", summary);
        }
        _ => println!("Stream ended before statistics were sent."),
    }
    Ok(())
}

fn run_synth(config: &SyntheticConfig) -> Result<(), PlayerError> {
    let stdout = io::stdout().lock();
    let mut writer = MessageWriter::new(io::BufWriter::new(stdout), FloatOrder::Native);
    write_synthetic(&mut writer, config).map_err(PlayerError::Output)?;
    Ok(())
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} <sprite.svg> <sprite_scale> [--config player.json] [--input FILE] [--no-pace]",
        program
    );
    eprintln!("       {} synth [ticks] [scene.svg]", program);
    eprintln!("       {} --example", program);
    eprintln!();
    eprintln!("Replay a crowd simulator stream read from stdin (or --input).");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  sprite.svg    Person sprite drawn for every agent");
    eprintln!("  sprite_scale  Pixels per simulation unit of the sprite artwork");
    eprintln!();
    eprintln!("Example: {} synth | {} person.svg 1.0", program, program);
}

fn print_example_config() {
    let config = PlayerConfig::default();

    println!("Example configuration (player.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("[Config] {}", e),
    }
}
