use std::path::PathBuf;

use clap::Parser;
use lifemix_core::params::{Language, VoiceType, DEFAULT_TEMPO};

/// Command-line arguments for `lifemix`.
#[derive(Parser, Debug)]
#[command(name = "lifemix")]
#[command(about = "Turn photos and short clips into a song")]
#[command(version)]
pub struct Args {
    /// JPEG images or MP4 videos to upload
    #[arg(required = true)]
    pub media: Vec<PathBuf>,

    /// Song tempo in BPM (clamped to 60-200)
    #[arg(long, default_value_t = DEFAULT_TEMPO, allow_negative_numbers = true)]
    pub bpm: i64,

    /// Genre tag; repeat for several
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Lyrics language code (en, es, fr, de, it, ja, ko, zh)
    #[arg(long, default_value = "en")]
    pub language: Language,

    /// Singer voice (random, male, female)
    #[arg(long, default_value = "random")]
    pub singer: VoiceType,

    /// Save the finished audio here once it is ready
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Generation service URL [env: LIFEMIX_API_URL]
    #[arg(long)]
    pub api_url: Option<String>,

    /// Seconds between download checks [env: LIFEMIX_POLL_INTERVAL_SECS]
    #[arg(long)]
    pub poll_interval_secs: Option<u64>,

    /// HTTP request timeout in seconds [env: LIFEMIX_REQUEST_TIMEOUT_SECS]
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,
}
