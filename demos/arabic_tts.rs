//! Arabic TTS demo.
//!
//! Usage: `cargo run --example arabic_tts --features piper -- [male|female] [speed] [text...]`
//!
//! Models are looked up as configured by `DemoConfig::from_env()`; set
//! `ARABIC_TTS_USE_GPU=1` to try CUDA first.

use std::path::PathBuf;
use std::time::Instant;

use arabic_tts::engines::piper::PiperLoader;
use arabic_tts::{DemoConfig, Response, SynthesisRequest, Synthesizer, VoiceIdentity};

const DEFAULT_TEXT: &str = "السلام عليكم ورحمة الله وبركاته. كيف حالك اليوم؟";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1).peekable();
    let voice = match args.peek().and_then(|a| VoiceIdentity::parse(a)) {
        Some(voice) => {
            args.next();
            voice
        }
        None => VoiceIdentity::Male,
    };
    let speed = match args.peek().and_then(|a| a.parse::<f32>().ok()) {
        Some(speed) => {
            args.next();
            speed
        }
        None => 1.0,
    };
    let text: Vec<String> = args.collect();
    let text = if text.is_empty() {
        DEFAULT_TEXT.to_string()
    } else {
        text.join(" ")
    };

    let config = DemoConfig::from_env();
    let synthesizer = Synthesizer::new(config.catalog(), PiperLoader::new());

    let request = SynthesisRequest::builder()
        .text(text)
        .voice(voice)
        .speed(speed)
        .acceleration(config.acceleration)
        .build()?;

    let start = Instant::now();
    match synthesizer.respond(&request) {
        Response::Audio(outcome) => {
            for warning in &outcome.warnings {
                println!("Warning: {warning}");
            }
            let elapsed = start.elapsed();
            println!(
                "Synthesized {:.2}s of {} audio at {} Hz on the {} backend in {:.2?}",
                outcome.duration_secs, outcome.voice, outcome.sample_rate, outcome.backend, elapsed
            );
            let path = PathBuf::from("output.wav");
            std::fs::write(&path, &outcome.wav)?;
            println!("Saved to {}", path.display());
        }
        Response::Warning(message) => println!("Warning: {message}"),
        Response::Error(message) => {
            eprintln!("Error: {message}");
            std::process::exit(1);
        }
    }

    Ok(())
}
