//! Interactive runner for the montage processor.
//!
//! The binary wires the pieces of `montage_core` into one session:
//! load config, validate the environment, scan and list the input
//! folder, resolve the run mode (flags or start menu), then hand a
//! plan to the pipeline and report what it did.

mod args;
mod menu;

use std::sync::Arc;

use anyhow::{bail, Context as _};
use clap::Parser;

use montage_core::cache::RecordStore;
use montage_core::config::{ConfigManager, Settings};
use montage_core::discovery::{cleanup_intermediates, order_from_scan, output_filename, scan_input_dir};
use montage_core::environment;
use montage_core::logging::{init_tracing, init_tracing_with_file, JobLoggerBuilder, LogConfig};
use montage_core::models::AudioVisual;
use montage_core::orchestrator::{
    create_standard_pipeline, plan_run, Context, JobState, RunMode,
};
use montage_core::range::{format_range_indicator, parse_range};

use crate::args::Args;
use crate::menu::MenuChoice;

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {:#}", error);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let base_dir = match &args.base_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("resolving current directory")?,
    };
    let config_path = if args.config.is_absolute() {
        args.config.clone()
    } else {
        base_dir.join(&args.config)
    };

    let mut manager = ConfigManager::new(&config_path);
    manager
        .load_or_create()
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    apply_overrides(manager.settings_mut(), &args);
    let settings = manager.settings().clone();

    let dirs = settings.directories.resolve(&base_dir);
    environment::validate(&dirs)?;

    // Ambient diagnostics go to a rolling file so verbose runs do not
    // fight the menu and countdown for the terminal.
    let _trace_guard = if args.no_log_file {
        init_tracing(args.log_level.to_log_level());
        None
    } else {
        Some(init_tracing_with_file(
            args.log_level.to_log_level(),
            &dirs.logs,
        ))
    };

    let scan = scan_input_dir(&dirs.input)
        .with_context(|| format!("scanning {}", dirs.input.display()))?;
    let entries = order_from_scan(&scan);
    if entries.is_empty() {
        bail!(
            "no video or audio submissions found in {}",
            dirs.input.display()
        );
    }

    println!();
    println!("Files in montage order:");
    for entry in &entries {
        println!("{}", entry);
    }

    let store = RecordStore::new(&dirs.work);

    let Some(mode) = resolve_mode(&args, &settings, &store)? else {
        return Ok(());
    };
    let (selection, indicator) = select_files(&args, mode, entries.len())?;

    let plan = plan_run(mode, &selection, entries, &dirs.work);
    println!();
    println!(
        "Run: {} ({} to transform, {} to merge)",
        mode.name(),
        plan.to_process.len(),
        plan.to_merge.len()
    );

    let filename = output_filename(&dirs.input, indicator.as_deref());
    let job_name = job_name_for(&filename).to_string();

    let log_config = LogConfig::from_settings(&settings.logging, args.log_level.to_log_level());
    let logger = JobLoggerBuilder::new(&job_name, &dirs.logs)
        .config(log_config)
        .callback(Box::new(|line| println!("{}", line)))
        .log_to_file(!args.no_log_file)
        .build()
        .context("creating run logger")?;

    let context = Context::new(
        plan,
        settings.clone(),
        &job_name,
        &dirs,
        &filename,
        Arc::new(logger),
        store,
    )
    .with_progress_callback(Box::new(|step, percent, message| {
        tracing::debug!(step, percent, message, "pipeline progress");
    }));

    let pipeline = create_standard_pipeline();
    let mut state = JobState::new(&job_name);

    match pipeline.run(&context, &mut state) {
        Ok(_) => print_summary(&state),
        Err(error) => {
            print_failures(&state);
            return Err(error.into());
        }
    }

    let should_cleanup = settings.behavior.auto_cleanup
        || (!args.yes && menu::confirm("Delete intermediate files?")?);
    if should_cleanup {
        let removed = cleanup_intermediates(&dirs.work)?;
        println!("Removed {} intermediate files", removed);
    }

    Ok(())
}

/// Fold command-line overrides into the loaded settings.
fn apply_overrides(settings: &mut Settings, args: &Args) {
    if args.gpu {
        settings.encoding.use_gpu = true;
    }
    if args.no_cache {
        settings.cache.enabled = false;
    }
    if args.waveform {
        settings.audio.visual = AudioVisual::Waveform;
    }
    if let Some(image) = &args.audio_bg {
        settings.audio.background_image = Some(image.clone());
    }
}

/// Decide the run mode, from flags when given, the menu otherwise.
///
/// Returns `None` when the user quits. Clearing the cache loops back
/// to the menu so a clear can be followed by a run in one session.
fn resolve_mode(
    args: &Args,
    settings: &Settings,
    store: &RecordStore,
) -> anyhow::Result<Option<RunMode>> {
    if args.merge_only {
        return Ok(Some(RunMode::MergeOnly));
    }
    if args.re_render {
        return Ok(Some(RunMode::ReRender));
    }
    if args.yes {
        return Ok(Some(RunMode::Full));
    }

    loop {
        match menu::prompt_run_choice(settings.behavior.countdown_secs)? {
            MenuChoice::FullRun => return Ok(Some(RunMode::Full)),
            MenuChoice::MergeOnly => return Ok(Some(RunMode::MergeOnly)),
            MenuChoice::ReRender => return Ok(Some(RunMode::ReRender)),
            MenuChoice::ClearCache => {
                let removed = store.clear()?;
                println!("Cleared {} cache records", removed);
            }
            MenuChoice::Quit => return Ok(None),
        }
    }
}

/// Resolve the file selection for partial runs.
///
/// Full runs take everything and carry no indicator. For partial runs
/// the expression comes from `--range` when given (errors are fatal,
/// since there is nobody to re-ask); otherwise the user is prompted
/// until an expression parses.
fn select_files(
    args: &Args,
    mode: RunMode,
    max_index: usize,
) -> anyhow::Result<(Vec<usize>, Option<String>)> {
    let Some(tag) = mode.indicator_tag() else {
        return Ok((Vec::new(), None));
    };
    let tag = tag.to_string();

    if let Some(expr) = &args.range {
        let picked = parse_range(expr, max_index)?;
        let indicator = format_range_indicator(expr, &tag, max_index)?;
        return Ok((picked, Some(indicator)));
    }

    loop {
        let expr = menu::prompt_line(&format!(
            "Files to {} (e.g. 1,3,5-7 or 3-, max {}): ",
            mode.name(),
            max_index
        ))?;
        match parse_range(&expr, max_index) {
            Ok(picked) => {
                let indicator = format_range_indicator(&expr, &tag, max_index)?;
                return Ok((picked, Some(indicator)));
            }
            Err(error) => println!("Invalid selection: {}", error),
        }
    }
}

/// Run name for the logger, derived from the montage filename.
fn job_name_for(filename: &str) -> &str {
    filename.strip_suffix(".mp4").unwrap_or(filename)
}

/// Print the end-of-run report.
fn print_summary(state: &JobState) {
    println!();
    if let Some(normalize) = &state.normalize {
        println!(
            "Intermediates: {} reused from cache, {} freshly encoded",
            normalize.cache_hits, normalize.encoded
        );
        for violation in &normalize.duration_violations {
            println!(
                "  note: {} measured {:.2}s against a {:.0}s cap",
                violation.name, violation.actual, violation.commanded
            );
        }
    }
    if let Some(concat) = &state.concat {
        println!("Montage written to {}", concat.output_path.display());
    }
}

/// List per-file failures before the run error itself is printed.
fn print_failures(state: &JobState) {
    if let Some(normalize) = &state.normalize {
        for failure in &normalize.failures {
            eprintln!("  {}. {}: {}", failure.index, failure.name, failure.reason);
        }
    }
}
