//! narrate - Convert long text into a single narrated MP3 using chunked TTS

mod audio;
mod config;
mod error;
mod estimate;
mod narrator;
mod text;
mod tts;

use anyhow::{Context, Result};
use audio::FfmpegCodec;
use clap::{Parser, Subcommand};
use config::NarrateConfig;
use estimate::{Estimate, format_cost, format_duration};
use indicatif::{ProgressBar, ProgressStyle};
use narrator::{NarrationOptions, NarrationRequest, Narrator};
use speech_client::{MAX_INPUT_CHARS, Model, Voice};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "narrate")]
#[command(about = "Convert long text into a single narrated MP3 using chunked text-to-speech", long_about = None)]
#[command(version)]
struct Args {
    /// Text file to narrate (reads stdin when omitted or "-")
    input: Option<PathBuf>,

    /// Output file path (default: <input-name>.mp3 or narration.mp3)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Voice: alloy, echo, fable, onyx, nova, shimmer
    #[arg(long)]
    voice: Option<Voice>,

    /// Model: tts-1 or tts-1-hd
    #[arg(long)]
    model: Option<Model>,

    /// Maximum characters per synthesis request
    #[arg(long)]
    max_chars: Option<usize>,

    /// Join single line breaks inside paragraphs before converting
    #[arg(long)]
    fix_line_breaks: bool,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show estimated cost and narration length without converting
    Estimate {
        /// Text file (reads stdin when omitted or "-")
        input: Option<PathBuf>,

        /// Model whose rate to use
        #[arg(long)]
        model: Option<Model>,

        /// Join single line breaks inside paragraphs first
        #[arg(long)]
        fix_line_breaks: bool,
    },
    /// Join single line breaks inside paragraphs and print or save the result
    Normalize {
        /// Text file (reads stdin when omitted or "-")
        input: Option<PathBuf>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List available voices
    Voices,
    /// List available models and their prices
    Models,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default voice
    SetVoice {
        /// Voice name
        voice: Voice,
    },
    /// Set default model
    SetModel {
        /// Model name
        model: Model,
    },
    /// Set maximum characters per request
    SetMaxChars {
        /// Value (1-4096)
        value: usize,
    },
    /// Store the OpenAI API key in the config file
    SetApiKey {
        /// API key
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    // Handle subcommands
    match &args.command {
        Some(Commands::Estimate {
            input,
            model,
            fix_line_breaks,
        }) => {
            let config = NarrateConfig::load().context("Failed to load configuration")?;
            let text = load_text(input.as_deref(), *fix_line_breaks)?;
            print_estimate(&text, model.unwrap_or(config.model));
            return Ok(());
        }
        Some(Commands::Normalize { input, output }) => {
            return handle_normalize(input.as_deref(), output.as_deref());
        }
        Some(Commands::Voices) => {
            for voice in Voice::ALL {
                println!("{:<8} {}", voice, voice.description());
            }
            return Ok(());
        }
        Some(Commands::Models) => {
            for model in Model::ALL {
                println!(
                    "{:<9} {} ({} / 1M characters)",
                    model,
                    model.description(),
                    format_cost(model.rate_per_million())
                );
            }
            return Ok(());
        }
        Some(Commands::Config { action }) => {
            return handle_config_command(action);
        }
        None => {}
    }

    // Load configuration
    let config = NarrateConfig::load().context("Failed to load configuration")?;
    convert(&args, config).await
}

/// Set up env_logger: warnings by default, debug for our crates with --debug.
fn init_logging(debug: bool) {
    let default_filter = if debug {
        "narrate=debug,speech_client=debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Convert the input text into one MP3.
async fn convert(args: &Args, config: NarrateConfig) -> Result<()> {
    let text = load_text(args.input.as_deref(), args.fix_line_breaks)?;
    if text.trim().is_empty() {
        anyhow::bail!("No text to convert. Provide a non-empty text file or pipe text on stdin.");
    }

    let voice = args.voice.unwrap_or(config.voice);
    let model = args.model.unwrap_or(config.model);
    let max_chars = resolve_max_chars(args.max_chars, config.max_chunk_chars)?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(args.input.as_deref()));

    if args.debug {
        eprintln!("Input: {}", describe_input(args.input.as_deref()));
        eprintln!("Output: {}", output_path.display());
        eprintln!("Voice: {}", voice);
        eprintln!("Model: {}", model);
        eprintln!("Max chars per request: {}", max_chars);
    }

    print_estimate(&text, model);

    let provider = speech_client::get_provider(Some(&config.openai))?;
    provider.is_available()?;
    let codec = FfmpegCodec::new(config.ffmpeg.clone(), &config.bitrate);

    // Only multi-chunk requests need to decode and re-encode
    if text.chars().count() > max_chars && !codec.is_available() {
        anyhow::bail!(
            "ffmpeg not found. Install ffmpeg or set `ffmpeg = \"/path/to/ffmpeg\"` in {}",
            NarrateConfig::config_path()?.display()
        );
    }

    let options = NarrationOptions {
        max_chunk_chars: max_chars,
        oversized_tokens: config.oversized_tokens,
        temp_dir: None,
    };
    let narrator = Narrator::new(provider.as_ref(), &codec, options);

    let pb = ProgressBar::new(1);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} chunks ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    eprintln!("Converting text to speech...");
    let request = NarrationRequest { text: &text, voice, model };
    let result = narrator
        .narrate(&request, Some(&output_path), |progress| {
            pb.set_length(progress.total as u64);
            pb.set_position(progress.completed as u64);
            log::debug!("progress: {:.0}%", progress.fraction() * 100.0);
        })
        .await;

    let path = match result {
        Ok(path) => {
            pb.finish_with_message("done");
            path
        }
        Err(e) => {
            pb.abandon();
            if let Some(chunk) = e.chunk() {
                eprintln!("Stopped at chunk {}, no output was written", chunk);
            }
            return Err(e).context("Conversion failed");
        }
    };

    let metadata = std::fs::metadata(&path)?;
    let size_mb = metadata.len() as f64 / (1024.0 * 1024.0);
    eprintln!("Output: {} ({:.1} MB)", path.display(), size_mb);

    Ok(())
}

/// Pick the per-request limit from the flag or config, within 1..=4096.
fn resolve_max_chars(flag: Option<usize>, configured: usize) -> Result<usize> {
    let (value, source) = match flag {
        Some(value) => (value, "--max-chars"),
        None => (configured, "max_chunk_chars in the config file"),
    };
    if value == 0 || value > MAX_INPUT_CHARS {
        anyhow::bail!(
            "{} must be between 1 and {} (got {})",
            source,
            MAX_INPUT_CHARS,
            value
        );
    }
    Ok(value)
}

/// Read the input text and optionally join wrapped lines.
fn load_text(input: Option<&Path>, fix_line_breaks: bool) -> Result<String> {
    let text = read_input(input)?;
    if fix_line_breaks {
        Ok(text::fix_line_breaks(&text))
    } else {
        Ok(text)
    }
}

/// Read UTF-8 text from a file, or stdin for None / "-".
fn read_input(input: Option<&Path>) -> Result<String> {
    match input.filter(|p| *p != Path::new("-")) {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Input file not found: {}", path.display());
            }
            let bytes =
                std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            String::from_utf8(bytes)
                .with_context(|| format!("{} is not valid UTF-8 text", path.display()))
        }
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read text from stdin")?;
            Ok(text)
        }
    }
}

fn describe_input(input: Option<&Path>) -> String {
    match input.filter(|p| *p != Path::new("-")) {
        Some(path) => path.display().to_string(),
        None => "<stdin>".to_string(),
    }
}

/// `<input-stem>.mp3` next to the input, or `narration.mp3` for stdin.
fn default_output_path(input: Option<&Path>) -> PathBuf {
    match input.filter(|p| *p != Path::new("-")) {
        Some(path) => path.with_extension("mp3"),
        None => PathBuf::from("narration.mp3"),
    }
}

fn print_estimate(text: &str, model: Model) {
    let estimate = Estimate::for_text(text, model.rate_per_million());
    eprintln!(
        "Characters: {}, Words: {}",
        text.chars().count(),
        text.split_whitespace().count()
    );
    eprintln!("Estimated duration: {}", format_duration(estimate.duration_secs));
    eprintln!(
        "Estimated cost: {} ({}, {} / 1M characters)",
        format_cost(estimate.cost),
        model,
        format_cost(model.rate_per_million())
    );
}

fn handle_normalize(input: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let normalized = load_text(input, true)?;
    match output {
        Some(path) => {
            std::fs::write(path, &normalized)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", normalized),
    }
    Ok(())
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = NarrateConfig::load()?;
            println!("Configuration file: {:?}", NarrateConfig::config_path()?);
            println!();
            println!("voice = \"{}\"", config.voice);
            println!("model = \"{}\"", config.model);
            println!("max_chunk_chars = {}", config.max_chunk_chars);
            println!("oversized_tokens = {:?}", config.oversized_tokens);
            if let Some(ffmpeg) = &config.ffmpeg {
                println!("ffmpeg = \"{}\"", ffmpeg.display());
            } else {
                println!("ffmpeg = (from PATH)");
            }
            println!("bitrate = \"{}\"", config.bitrate);
            println!("openai.base_url = \"{}\"", config.openai.base_url());
            println!("openai.timeout_secs = {}", config.openai.timeout_secs);
            if config.openai.api_key.is_some() {
                println!("openai.api_key = (set)");
            } else {
                println!("openai.api_key = (from OPENAI_API_KEY)");
            }
        }
        ConfigAction::SetVoice { voice } => {
            let mut config = NarrateConfig::load()?;
            config.voice = *voice;
            config.save()?;
            println!("Default voice set to: {}", voice);
        }
        ConfigAction::SetModel { model } => {
            let mut config = NarrateConfig::load()?;
            config.model = *model;
            config.save()?;
            println!("Default model set to: {}", model);
        }
        ConfigAction::SetMaxChars { value } => {
            let mut config = NarrateConfig::load()?;
            config.max_chunk_chars = (*value).clamp(1, MAX_INPUT_CHARS);
            config.save()?;
            println!("Max chars per request set to: {}", config.max_chunk_chars);
        }
        ConfigAction::SetApiKey { key } => {
            let mut config = NarrateConfig::load()?;
            config.openai.api_key = Some(key.trim().to_string());
            config.save()?;
            println!("API key saved to {}", NarrateConfig::config_path()?.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Some(Path::new("books/chapter1.txt"))),
            PathBuf::from("books/chapter1.mp3")
        );
        assert_eq!(default_output_path(None), PathBuf::from("narration.mp3"));
        assert_eq!(
            default_output_path(Some(Path::new("-"))),
            PathBuf::from("narration.mp3")
        );
    }

    #[test]
    fn test_resolve_max_chars() {
        assert_eq!(resolve_max_chars(None, 4096).unwrap(), 4096);
        assert_eq!(resolve_max_chars(Some(1000), 4096).unwrap(), 1000);
        assert_eq!(resolve_max_chars(Some(MAX_INPUT_CHARS), 10).unwrap(), MAX_INPUT_CHARS);
    }

    #[test]
    fn test_resolve_max_chars_rejects_out_of_range() {
        let err = resolve_max_chars(Some(5000), 4096).unwrap_err();
        assert!(err.to_string().contains("--max-chars must be between 1 and 4096"));
        assert!(resolve_max_chars(Some(0), 4096).is_err());

        let err = resolve_max_chars(None, 8000).unwrap_err();
        assert!(err.to_string().contains("config file"));
    }

    #[test]
    fn test_load_text_with_line_fix() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.txt");
        std::fs::write(&path, "Line one\nLine two\n\nNew paragraph").unwrap();

        assert_eq!(
            load_text(Some(&path), true).unwrap(),
            "Line one Line two\n\nNew paragraph"
        );
        assert_eq!(
            load_text(Some(&path), false).unwrap(),
            "Line one\nLine two\n\nNew paragraph"
        );
    }

    #[test]
    fn test_read_input_rejects_binary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.bin");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let err = read_input(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("not valid UTF-8"));
    }

    #[test]
    fn test_read_input_missing_file() {
        let err = read_input(Some(Path::new("/nonexistent/input.txt"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_cli_parses_voice_and_model() {
        let args = Args::try_parse_from([
            "narrate", "book.txt", "--voice", "nova", "--model", "tts-1-hd", "--max-chars", "1000",
        ])
        .unwrap();
        assert_eq!(args.voice, Some(Voice::Nova));
        assert_eq!(args.model, Some(Model::Tts1Hd));
        assert_eq!(args.max_chars, Some(1000));
        assert_eq!(args.input, Some(PathBuf::from("book.txt")));
    }

    #[test]
    fn test_cli_rejects_unknown_voice() {
        assert!(Args::try_parse_from(["narrate", "book.txt", "--voice", "bob"]).is_err());
    }

    #[test]
    fn test_cli_estimate_subcommand() {
        let args = Args::try_parse_from(["narrate", "estimate", "book.txt", "--model", "tts-1"])
            .unwrap();
        assert!(matches!(
            args.command,
            Some(Commands::Estimate {
                model: Some(Model::Tts1),
                ..
            })
        ));
    }
}
