//! audio-dumper - CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use audio_dumper::{
    cli::Args,
    config::{validate_config, Config},
    download::{RunStats, TrackFetcher, TrackOutcome},
    error::{exit_codes, Error, Result},
    fs::track_filename,
    net::HttpFetcher,
    output::{
        print_banner, print_config_summary, print_error, print_info, print_run_stats,
        print_success, print_warning, BarProgress, NoProgress, ProgressSink,
    },
    remux::FfmpegRemuxer,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(stats) if stats.has_failures() => ExitCode::from(exit_codes::SOME_TRACKS_FAILED as u8),
        Ok(_) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_)
                | Error::ConfigValidation { .. }
                | Error::MissingConfig(_)
                | Error::TomlParse(_)
                | Error::Json(_) => ExitCode::from(exit_codes::CONFIG_ERROR as u8),
                Error::FFmpegNotFound => ExitCode::from(exit_codes::ABORT as u8),
                Error::Download { .. } | Error::Http(_) => {
                    ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8)
                }
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<RunStats> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    if !args.quiet {
        print_banner();
    }

    // Load configuration
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        tracing::debug!(
            "Configuration file not found: {}, using defaults",
            args.config.display()
        );
        Config::default()
    };

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);

    // Validate configuration
    validate_config(&config)?;

    let tracks = args.track_list()?;
    let directory = config.download_directory();

    if !args.quiet {
        print_config_summary(
            tracks.len(),
            &directory.display().to_string(),
            config.download.concurrency,
            &config.remux.container.to_string(),
        );
    }

    let remuxer = FfmpegRemuxer::new(&config.remux.ffmpeg_path, config.remux.container);
    remuxer.check_available().await?;

    let fetcher = HttpFetcher::new(&config.network.user_agent, config.request_timeout())?;
    let progress: Arc<dyn ProgressSink> = if args.quiet {
        Arc::new(NoProgress)
    } else {
        Arc::new(BarProgress::new())
    };
    let pipeline = TrackFetcher::new(Arc::new(fetcher), Arc::new(remuxer), progress);
    let options = config.fetch_options();

    let mut stats = RunStats::default();

    // Tracks run one after another; concurrency lives inside a track.
    for track in &tracks {
        let destination = match track_filename(track, config.remux.container) {
            Ok(name) => directory.join(name),
            Err(e) => {
                print_warning(&format!("Skipping track {}: {}", track.id, e));
                stats.failed += 1;
                stats.failures.push((track.id.clone(), e.to_string()));
                continue;
            }
        };

        print_info(&format!("Processing {}", track.label()));
        let result = pipeline.fetch_track(track, &destination, &options).await;

        match &result {
            Ok(TrackOutcome::Fetched(path)) => print_success(&format!("Saved {}", path.display())),
            Ok(TrackOutcome::Skipped(path)) => {
                print_info(&format!("Already exists: {}", path.display()))
            }
            Err(e) => print_error(&e.to_string()),
        }
        stats.record(&result);
    }

    print_run_stats(&stats);
    Ok(stats)
}
