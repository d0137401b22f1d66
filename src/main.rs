//! volseq CLI - Play a directory of volumes through the cached sequence reader.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::cell::RefCell;
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use volseq::{
    animation::{AnimationDriver, CueEvent, Interactor, KeyCommand, RenderTrigger},
    schema::{NoiseSpec, PlaybackConfig, SyntheticSeries},
    sequence::SequenceReader,
    volume::NrrdDecoder,
};

type Reader = SequenceReader<NrrdDecoder>;

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "--example" => {
            print_example_config();
            return;
        }
        "--generate" => {
            generate(&args[2..]);
            return;
        }
        _ => {}
    }

    let directory = PathBuf::from(&args[1]);
    let play = args.iter().any(|a| a == "--play");
    let config = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let Some(path) = args.get(i + 1) else {
                eprintln!("Error: --config requires a file argument");
                std::process::exit(1);
            };
            load_config(Path::new(path))
        }
        None => PlaybackConfig::default(),
    };

    check_directory(&directory);

    let mut reader = SequenceReader::open_directory(&directory, NrrdDecoder).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let frames = reader.number_of_files();
    println!("Volume Sequence");
    println!("===============");
    println!("Directory: {}", directory.display());
    println!("Files: {}", frames);
    if frames == 0 {
        println!("Nothing to play.");
        return;
    }

    if config.preload {
        // Cache every volume up front
        let start = Instant::now();
        if let Err(e) = reader.preload_all(|_, id| println!("Reading {}", id)) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        let stats = reader.cache().stats();
        println!(
            "Cached {} volumes ({} bytes) in {:.2}s",
            stats.entries,
            stats.bytes,
            start.elapsed().as_secs_f32()
        );
    }

    match reader.update_information() {
        Ok(Some(info)) => {
            let [w, h, d] = info.dimensions;
            let bounds = info.bounds();
            println!("Dimensions: {}x{}x{} ({:?})", w, h, d, info.scalar_type);
            println!(
                "Bounds: [{:.2}, {:.2}] x [{:.2}, {:.2}] x [{:.2}, {:.2}]",
                bounds[0], bounds[1], bounds[2], bounds[3], bounds[4], bounds[5]
            );
        }
        Ok(None) => {}
        Err(e) => eprintln!("Error: {}", e),
    }
    println!();

    let reader = Rc::new(RefCell::new(reader));
    let renderer = Rc::new(RefCell::new(FrameReport::new(Rc::clone(&reader))));

    if play {
        play_cue(&reader, &renderer, &config);
    } else {
        interact(&reader, &renderer);
    }

    let stats = reader.borrow().cache().stats();
    println!();
    println!(
        "Cache: {} entries, {} hits, {} misses, {} bytes",
        stats.entries, stats.hits, stats.misses, stats.bytes
    );
}

/// Render trigger that pulls the current volume and prints a one-line report.
struct FrameReport {
    reader: Rc<RefCell<Reader>>,
    last_render: Option<Instant>,
}

impl FrameReport {
    fn new(reader: Rc<RefCell<Reader>>) -> Self {
        Self {
            reader,
            last_render: None,
        }
    }
}

impl RenderTrigger for FrameReport {
    fn trigger_render(&mut self) {
        let mut reader = self.reader.borrow_mut();
        let volume = match reader.update() {
            Ok(Some(volume)) => volume,
            Ok(None) => return,
            Err(e) => {
                eprintln!("Error: {}", e);
                return;
            }
        };

        let now = Instant::now();
        let fps = self
            .last_render
            .map(|t| 1.0 / now.duration_since(t).as_secs_f64().max(1e-9));
        self.last_render = Some(now);

        let index = reader.current_index().unwrap_or(0);
        let name = reader
            .current_file_name()
            .map(|id| id.to_string())
            .unwrap_or_default();
        let [w, h, d] = volume.info.dimensions;
        let (lo, hi) = volume.scalar_range().unwrap_or((0.0, 0.0));
        print!(
            "[{}/{}] {}  {}x{}x{}  range [{:.3}, {:.3}]",
            index + 1,
            reader.number_of_files(),
            name,
            w,
            h,
            d,
            lo,
            hi
        );
        match fps {
            Some(fps) => println!("  FPS: {:.1}", fps),
            None => println!(),
        }
    }
}

fn play_cue(reader: &Rc<RefCell<Reader>>, renderer: &Rc<RefCell<FrameReport>>, config: &PlaybackConfig) {
    let cue = config.cue(reader.borrow().number_of_files());
    println!(
        "Playing {} ticks over [{}, {}] at {} fps",
        cue.tick_count(),
        cue.start_time,
        cue.end_time,
        cue.frame_rate
    );

    let mut driver = AnimationDriver::new();
    driver.set_target(reader);
    driver.set_render_trigger(renderer);

    let frame_time = Duration::from_secs_f64(1.0 / cue.frame_rate);
    for event in cue.events() {
        driver.observe(&event);
        if config.realtime && matches!(event, CueEvent::Tick(_)) {
            std::thread::sleep(frame_time);
        }
    }
}

fn interact(reader: &Rc<RefCell<Reader>>, renderer: &Rc<RefCell<FrameReport>>) {
    println!("Keys: n = next, p = previous, space = play through, q = quit");

    let mut interactor = Interactor::new();
    interactor.set_target(reader);
    interactor.set_render_trigger(renderer);

    // Show the first volume
    reader.borrow_mut().set_index(0);
    renderer.borrow_mut().trigger_render();

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        };
        let key = line.trim();
        let key = if key.is_empty() && !line.is_empty() { "space" } else { key };
        match KeyCommand::from_key_sym(key) {
            Some(command) => {
                if !interactor.on_key(command) {
                    break;
                }
            }
            None if key.is_empty() => {}
            None => println!("Unknown key '{}'", key),
        }
    }
}

fn check_directory(directory: &Path) {
    match fs::metadata(directory) {
        Err(_) => {
            eprintln!("ERROR: Cannot access \"{}\"", directory.display());
            std::process::exit(1);
        }
        Ok(meta) if !meta.is_dir() => {
            eprintln!(
                "ERROR: Expecting a directory. \"{}\" is not a directory",
                directory.display()
            );
            std::process::exit(1);
        }
        Ok(_) => {}
    }
}

fn load_config(path: &Path) -> PlaybackConfig {
    let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: PlaybackConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }
    config
}

fn generate(args: &[String]) {
    let Some(directory) = args.first() else {
        eprintln!("Usage: volseq --generate <directory> [count]");
        std::process::exit(1);
    };
    let frames: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(12);

    let series = SyntheticSeries {
        frames,
        noise: Some(NoiseSpec {
            amplitude: 0.02,
            seed: 42,
        }),
        ..Default::default()
    };

    match series.write_to(directory) {
        Ok(paths) => println!("Wrote {} volumes to {}", paths.len(), directory),
        Err(e) => {
            eprintln!("Error writing series: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <volume directory> [--play] [--config config.json]", program);
    eprintln!("       {} --generate <directory> [count]", program);
    eprintln!("       {} --example", program);
    eprintln!();
    eprintln!("Step through (or play) a directory of NRRD volumes.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  --play      Run the animation cue instead of reading keys from stdin");
    eprintln!("  --config    Playback configuration (see --example)");
    eprintln!("  --generate  Write a synthetic volume series");
}

fn print_example_config() {
    let config = PlaybackConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
