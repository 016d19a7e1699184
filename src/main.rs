mod config;
mod display;
mod palette;
mod scaler;
mod testcard;

use config::Config;
use display::Panel;
use scaler::{Scaler, Source, SourceFormat, SRC_HEIGHT, SRC_WIDTH};

use minifb::Key;
use std::time::{Duration, Instant};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let headless = args.iter().any(|a| a == "--headless");

    let config = Config::load();
    let mut scaler = Scaler::new(config.tuning());
    scaler.set_source_format(config.source_format());
    scaler.set_scaling(config.display.scaling);

    let mut palette_index = testcard::palette_index(&config.display.palette);
    scaler.set_palette(&testcard::build_palette(palette_index));

    if headless {
        run_headless(&mut scaler, &config);
    } else {
        run_windowed(&mut scaler, &config, &mut palette_index);
    }
}

fn run_headless(scaler: &mut Scaler, config: &Config) {
    let geometry = scaler.select_geometry(&config.geometry_preference(), |_| true);
    let format = config.source_format();

    let mut indexed = vec![0u8; SRC_WIDTH * SRC_HEIGHT];
    let mut packed = vec![0u16; SRC_WIDTH * SRC_HEIGHT];
    let mut dst = vec![0u16; geometry.pixels()];

    // ~30 seconds of emulated time (~1800 frames)
    for frame in 0..1800 {
        match format {
            SourceFormat::Indexed8 => {
                testcard::indexed_frame(frame, &mut indexed);
                scaler.scale_frame(Source::Indexed8(&indexed), &mut dst);
            }
            SourceFormat::Packed16 => {
                testcard::packed_frame(frame, &mut packed);
                scaler.scale_frame(Source::Packed16(&packed), &mut dst);
            }
        }
    }
    eprintln!(
        "Scaled 1800 frames at {}x{}",
        geometry.width(),
        geometry.height()
    );
}

fn run_windowed(scaler: &mut Scaler, config: &Config, palette_index: &mut usize) {
    let preferred = config.geometry_preference();
    let mut panel = Panel::open(&preferred).unwrap_or_else(|e| {
        eprintln!("Error opening display: {}", e);
        std::process::exit(1);
    });
    scaler.select_geometry(&preferred, |g| g == panel.geometry());
    panel.clear();

    let frame_duration = Duration::from_nanos(16_666_667); // ~60 Hz
    let format = config.source_format();

    let mut indexed = vec![0u8; SRC_WIDTH * SRC_HEIGHT];
    let mut packed = vec![0u16; SRC_WIDTH * SRC_HEIGHT];
    let mut frame = 0usize;

    while panel.is_open() && !panel.is_key_down(Key::Escape) {
        let frame_start = Instant::now();

        if panel.was_pressed(Key::P) {
            *palette_index = (*palette_index + 1) % testcard::PALETTES.len();
            scaler.set_palette(&testcard::build_palette(*palette_index));
            eprintln!("Palette: {}", testcard::PALETTES[*palette_index].0);
        }

        match format {
            SourceFormat::Indexed8 => {
                testcard::indexed_frame(frame, &mut indexed);
                scaler.scale_frame(Source::Indexed8(&indexed), panel.frame_mut());
            }
            SourceFormat::Packed16 => {
                testcard::packed_frame(frame, &mut packed);
                scaler.scale_frame(Source::Packed16(&packed), panel.frame_mut());
            }
        }

        if let Err(e) = panel.present() {
            eprintln!("{}", e);
            break;
        }
        frame += 1;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_duration {
            std::thread::sleep(frame_duration - elapsed);
        }
    }
}
