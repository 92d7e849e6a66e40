use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use voicepal::api::ApiServerBuilder;
use voicepal::conversation::Role;
use voicepal::{
    AudioStore, Config, ConversationStore, JsonFileBackend, Persona, ReplyEngine, Synthesizer,
    TurnOrchestrator, sanitize,
};

/// Voicepal - talk to a cat, a bear or a narwhal
#[derive(Parser)]
#[command(name = "voicepal", version, about)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print a persona's reply without any audio
    Reply {
        /// Persona to answer as
        #[arg(short, long, default_value = voicepal::persona::DEFAULT_PERSONA)]
        persona: String,
        /// What the user said
        text: String,
    },
    /// Print the text that would be sent to speech synthesis
    Sanitize {
        text: String,
    },
    /// Synthesize text with the configured TTS provider
    TestTts {
        /// Where to write the MP3
        #[arg(short, long, default_value = "voicepal-test.mp3")]
        out: PathBuf,
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Print a session transcript from the history file
    History {
        /// Session id
        #[arg(default_value = voicepal::conversation::DEFAULT_SESSION)]
        session: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,voicepal=info",
        1 => "info,voicepal=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cli.port).await,
        Command::Reply { persona, text } => {
            println!("{}", ReplyEngine::new().reply(&text, Persona::parse(&persona)));
            Ok(())
        }
        Command::Sanitize { text } => {
            println!("{}", sanitize(&text));
            Ok(())
        }
        Command::TestTts { out, text } => test_tts(&out, &text).await,
        Command::History { session } => history(&session),
    }
}

/// Wire the configured collaborators into a turn pipeline and serve it
async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    let store = ConversationStore::open(Box::new(JsonFileBackend::new(&config.server.state_file)));
    let mut turns = TurnOrchestrator::new(Arc::new(store)).timeout(config.voice.timeout);

    if let Some(stt) = config.transcriber()? {
        turns = turns.transcriber(Arc::new(stt));
    }
    if let Some(tts) = config.synthesizer()? {
        let audio_store = AudioStore::new(&config.server.static_dir, config.voice.audio_retention);
        turns = turns.synthesizer(Arc::new(tts), audio_store);
    }

    let server = ApiServerBuilder::new(Arc::new(turns), port.unwrap_or(config.server.port))
        .static_dir(config.server.static_dir.clone())
        .web_dir(config.server.web_dir.clone())
        .build();

    tracing::info!("voicepal ready");
    server.run().await?;

    Ok(())
}

/// Test TTS output by writing an MP3
async fn test_tts(out: &std::path::Path, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let config = Config::load()?;
    let tts = config
        .synthesizer()?
        .ok_or_else(|| anyhow::anyhow!("no TTS API key configured"))?;

    println!("Synthesizing speech with {}...", tts.name());
    let mp3_data = tts.synthesize(&sanitize(text)).await?;
    println!("Got {} bytes of audio data", mp3_data.len());

    std::fs::write(out, &mp3_data)?;
    println!("Wrote {}", out.display());

    Ok(())
}

/// Print one session's transcript
fn history(session: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let store = ConversationStore::open(Box::new(JsonFileBackend::new(&config.server.state_file)));

    let Some(messages) = store.session(session) else {
        anyhow::bail!("no session named {session:?} in {}", config.server.state_file.display());
    };

    for message in messages {
        let speaker = match message.role {
            Role::System => "system",
            Role::User => "you",
            Role::Assistant => "pal",
        };
        println!("{speaker:>6}: {}", message.content);
    }

    Ok(())
}
