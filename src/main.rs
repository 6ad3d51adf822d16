use clap::{Parser, Subcommand};
use piano2midi::observer::VelocityTraceWriter;
use piano2midi::{validate_input, Config, CurveSet, PianoToMidi};
use std::path::PathBuf;

/// Piano-to-MIDI Decoder
#[derive(Parser)]
#[command(name = "piano2midi")]
#[command(about = "Decode transcription model output curves into a MIDI file")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a serialized curve set and write MIDI output
    Decode {
        /// Input curve set (JSON, as produced by the inference wrapper)
        input: PathBuf,

        /// Output MIDI file
        #[arg(short, long, default_value = "./output.mid")]
        output: PathBuf,

        /// Custom configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Absolute time of the first frame, in seconds
        #[arg(long, default_value_t = 0.0)]
        start_time: f32,

        /// Write a velocity trace of cadence-sampled notes to this file
        #[arg(long)]
        trace: Option<PathBuf>,

        /// Quiet output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config: PathBuf,
    },
    /// Show default configuration
    ShowConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Decode {
            input,
            output,
            config,
            start_time,
            trace,
            quiet,
        } => {
            // Load configuration
            let config = if let Some(config_path) = config {
                piano2midi::config::load_config(config_path)?
            } else {
                Config::default()
            };

            let contents = std::fs::read_to_string(&input)?;
            let curves: CurveSet = serde_json::from_str(&contents)?;

            validate_input(&curves, &config)?;

            let decoder = PianoToMidi::new(config)?;

            if !quiet {
                println!("Decoding {}...", input.display());
            }

            let transcription = if let Some(trace_path) = trace {
                let mut tracer = VelocityTraceWriter::new(trace_path);
                decoder.decode_observed(&curves, &mut tracer)?
            } else {
                decoder.decode(&curves)?
            };

            decoder.export_midi(&transcription, start_time, &output)?;

            if !quiet {
                println!(
                    "Wrote {} notes and {} pedal events to {}",
                    transcription.notes.len(),
                    transcription.pedals.as_ref().map_or(0, Vec::len),
                    output.display()
                );
            }
        }
        Commands::ValidateConfig { config } => {
            let config = piano2midi::config::load_config(config)?;
            println!("Configuration is valid");
            if let Ok(json) = serde_json::to_string_pretty(&config) {
                println!("{}", json);
            }
        }
        Commands::ShowConfig => {
            let config = Config::default();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
    }

    Ok(())
}
