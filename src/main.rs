use abz_submit::lifecycle::ShutdownHooks;
use abz_submit::lookup::{IdentifierLookup, MusicBrainzLookup, NoLookup};
use abz_submit::model::Track;
use abz_submit::submit::{
    ExtractorConfig, ExtractorHome, MessageLog, PayloadEncoding, ProgressListener, RunOutcome,
    SubmitConfig, SubmitPipeline,
};
use abz_submit::tags::{self, LoftyTagStore};
use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "abz-submit")]
#[command(about = "Analyze music with the AcousticBrainz extractor and submit the results", long_about = None)]
struct Args {
    /// Audio files to submit (instead of a Rhythmbox library)
    files: Vec<PathBuf>,

    /// AcousticBrainz streaming extractor binary (streaming_extractor_music)
    #[arg(short = 'e', long, env = "ABZ_EXTRACTOR")]
    extractor: PathBuf,

    /// Path to Rhythmbox database (rhythmdb.xml)
    #[arg(
        short = 'd',
        long,
        default_value = "~/.local/share/rhythmbox/rhythmdb.xml"
    )]
    database: String,

    /// Path to Rhythmbox playlists (playlists.xml)
    #[arg(
        short = 'p',
        long,
        default_value = "~/.local/share/rhythmbox/playlists.xml"
    )]
    playlists: String,

    /// Submit only tracks from these playlists (can be specified multiple times)
    #[arg(long = "playlist")]
    playlists_filter: Vec<String>,

    /// AcousticBrainz server
    #[arg(long, default_value = abz_submit::submit::config::DEFAULT_API_URL)]
    api_url: String,

    /// Actually gzip the payload instead of only labelling it
    #[arg(long)]
    gzip: bool,

    /// Do not search MusicBrainz for tracks without an MBID
    #[arg(long)]
    no_lookup: bool,

    /// Number of tracks analyzed in parallel
    #[arg(short = 'j', long, default_value = "1")]
    jobs: usize,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    log::info!("AcousticBrainz Submit");
    log::info!("=====================");

    let tracks = load_tracks(&args)?;
    if tracks.is_empty() {
        log::warn!("Nothing to submit");
        return Ok(());
    }
    log::info!("Submitting {} track(s) with {} worker(s)", tracks.len(), args.jobs);

    let config = SubmitConfig::new()
        .with_api_url(args.api_url.clone())
        .with_payload_encoding(if args.gzip {
            PayloadEncoding::Gzip
        } else {
            PayloadEncoding::Declared
        });

    let hooks = ShutdownHooks::new();
    let extractor = Arc::new(ExtractorHome::new(ExtractorConfig::new(args.extractor.clone())));
    extractor.register_teardown(&hooks);

    let lookup: Arc<dyn IdentifierLookup> = if args.no_lookup {
        Arc::new(NoLookup)
    } else {
        Arc::new(MusicBrainzLookup::new(config.user_agent.clone()))
    };
    let messages = Arc::new(MessageLog::new());

    let pipeline = SubmitPipeline::new(
        config,
        Arc::clone(&extractor),
        lookup,
        Arc::new(LoftyTagStore::new()),
        messages.clone(),
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.max(1))
        .build()
        .context("Failed to build worker pool")?;

    let total = tracks.len();
    let outcomes: Vec<RunOutcome> = pool.install(|| {
        tracks
            .par_iter()
            .enumerate()
            .map(|(i, track)| {
                log::info!("[{}/{}] {} - {}", i + 1, total, track.artist, track.title);
                let progress = LogProgress {
                    name: track.display_name().to_string(),
                };
                pipeline.run(track, &progress)
            })
            .collect()
    });

    hooks.run();

    let submitted = outcomes
        .iter()
        .filter(|o| matches!(o, RunOutcome::Submitted { .. }))
        .count();
    let skipped = outcomes
        .iter()
        .filter(|o| matches!(o, RunOutcome::Skipped))
        .count();
    let failed = outcomes.len() - submitted - skipped;

    for message in messages.messages() {
        log::warn!("{}", message.text);
    }
    log::info!(
        "Done: {} submitted, {} skipped, {} failed",
        submitted,
        skipped,
        failed
    );

    if failed > 0 {
        anyhow::bail!("{} of {} submissions failed", failed, total);
    }
    Ok(())
}

/// Logs progress milestones at debug level
struct LogProgress {
    name: String,
}

impl ProgressListener for LogProgress {
    fn progress(&self, fraction: f32) {
        log::debug!("{}: {:.0}%", self.name, fraction * 100.0);
    }
}

/// Tracks from the command line, or else from the Rhythmbox library
fn load_tracks(args: &Args) -> Result<Vec<Track>> {
    if !args.files.is_empty() {
        return args
            .files
            .iter()
            .map(|path| tags::read_track(path))
            .collect();
    }

    let db_path = shellexpand::tilde(&args.database);
    let playlists_path = shellexpand::tilde(&args.playlists);

    log::info!("Loading Rhythmbox library...");
    let library = abz_submit::rhythmbox::parse_library(
        PathBuf::from(db_path.as_ref()).as_path(),
        PathBuf::from(playlists_path.as_ref()).as_path(),
    )?;

    let selected = if args.playlists_filter.is_empty() {
        library.sorted_tracks()
    } else {
        log::info!(
            "Filtering to {} playlist(s): {:?}",
            args.playlists_filter.len(),
            args.playlists_filter
        );
        library.tracks_in_playlists(&args.playlists_filter)
    };

    Ok(selected.into_iter().cloned().collect())
}
