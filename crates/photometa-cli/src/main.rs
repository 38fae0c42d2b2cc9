use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use photometa_core::library::write_preview;
use photometa_core::{
    collect::collect_results, spawn_batch, AppState, BatchEvent, DateSource, FixOptions,
    FolderLibrary, ItemSuccess, MessageTone, PhotoLibrary,
};
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "photometa", version, about = "Rewrite photo capture dates from library timestamps")]
struct Cli {
    /// Library root: every subdirectory is an album [default: ~/Pictures]
    #[arg(long, global = true, env = "PHOTOMETA_LIBRARY")]
    library: Option<PathBuf>,

    /// ExifTool executable (default: the copy bundled next to this binary)
    #[arg(long, global = true)]
    exiftool: Option<PathBuf>,

    /// Perl library directory for ExifTool
    #[arg(long, global = true)]
    exiftool_lib: Option<PathBuf>,

    /// Where rewritten copies are created
    #[arg(long, global = true)]
    temp_dir: Option<PathBuf>,

    /// Do not guess capture dates from file names
    #[arg(long, global = true)]
    no_guess: bool,

    /// More logging on stderr (-v, -vv); PHOTOMETA_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List albums
    Albums,

    /// List the photos of an album with the date that would be applied
    Photos {
        album: String,

        #[arg(long, value_enum, default_value_t)]
        date_source: DateSource,

        /// Write a small JPEG preview of every photo into this directory
        #[arg(long)]
        thumbnails: Option<PathBuf>,
    },

    /// Rewrite the EXIF dates of selected photos
    Apply {
        album: String,

        #[arg(long, value_enum, default_value_t)]
        date_source: DateSource,

        /// Every photo of the album
        #[arg(long, conflicts_with = "select", required_unless_present = "select")]
        all: bool,

        /// Photo ids, id prefixes or file names
        #[arg(long, num_args = 1..)]
        select: Vec<String>,

        /// Move rewritten copies into this directory
        #[arg(long)]
        collect: Option<PathBuf>,

        /// Print the batch report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "photometa_core=debug,info",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("PHOTOMETA_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn library_root(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(root) = &cli.library {
        return Ok(root.clone());
    }
    dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
        .context("no --library given and no home directory to default to")
}

fn options(cli: &Cli) -> FixOptions {
    let mut options = FixOptions {
        exiftool: cli.exiftool.clone(),
        exiftool_lib: cli.exiftool_lib.clone(),
        ..FixOptions::default()
    };
    if let Some(dir) = &cli.temp_dir {
        options.temp_dir = dir.clone();
    }
    options
}

/// Exact title first, then case-insensitive.
fn open_album(state: &mut AppState, library: &dyn PhotoLibrary, title: &str) -> anyhow::Result<()> {
    state.load_albums(library)?;
    let album = state
        .albums
        .iter()
        .find(|a| a.title == title)
        .or_else(|| {
            let wanted = title.to_lowercase();
            state.albums.iter().find(|a| a.title.to_lowercase() == wanted)
        })
        .cloned();
    let Some(album) = album else {
        bail!("no album named {:?}", title);
    };
    state.select_album(library, Some(album))
}

fn paint(message: &str, tone: MessageTone) -> String {
    if !std::io::stdout().is_terminal() {
        return message.to_string();
    }
    let color = match tone {
        MessageTone::Success => "32",
        MessageTone::Failure => "31",
    };
    format!("\x1b[{}m{}\x1b[0m", color, message)
}

fn list_albums(library: &FolderLibrary) -> anyhow::Result<()> {
    let mut state = AppState::default();
    state.load_albums(library)?;
    if state.albums.is_empty() {
        println!("No albums found in {}", library.root().display());
    }
    for album in &state.albums {
        println!("{}", album.title);
    }
    Ok(())
}

fn list_photos(
    library: &FolderLibrary,
    album: &str,
    date_source: DateSource,
    thumbnails: Option<&Path>,
) -> anyhow::Result<()> {
    let mut state = AppState::default();
    open_album(&mut state, library, album)?;
    state.set_date_source(date_source);

    if let Some(dir) = thumbnails {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create thumbnail directory {}", dir.display()))?;
        for photo in &state.photos {
            if write_preview(library, photo, dir)?.is_none() {
                tracing::warn!(file = %photo.file_name, "no preview available");
            }
        }
    }

    if state.photos.is_empty() {
        println!("No photos in this album.");
    }
    for row in state.photo_rows() {
        println!("{}  {}", row.short_id, row.file_name);
        println!("    Created:  {}", row.created);
        println!("    Modified: {}", row.modified);
        println!("    {}", row.apply_label(date_source));
    }
    Ok(())
}

fn show_item(item: &ItemSuccess, path: &Path) {
    println!("  {} -> {}", item.file_name, path.display());
    if !item.diagnostics.is_empty() {
        println!("    {}", item.diagnostics);
    }
}

struct ApplyArgs<'a> {
    album: &'a str,
    date_source: DateSource,
    all: bool,
    select: &'a [String],
    collect: Option<&'a Path>,
    json: bool,
}

fn apply(library: Arc<FolderLibrary>, options: &FixOptions, args: ApplyArgs) -> anyhow::Result<ExitCode> {
    let mut state = AppState::default();
    open_album(&mut state, library.as_ref(), args.album)?;
    state.set_date_source(args.date_source);

    if args.all {
        state.selected_ids = state.photos.iter().map(|p| p.id.clone()).collect();
    } else {
        for needle in args.select {
            let Some(photo) = state.find_photo(needle) else {
                bail!("no photo matching {:?} in {}", needle, args.album);
            };
            let id = photo.id.clone();
            state.selected_ids.insert(id);
        }
    }

    let Some(job) = state.begin_batch() else {
        bail!("nothing to process: no photo selected");
    };
    if !args.json {
        eprintln!("{}", state.process_message);
    }

    let tool = options
        .exiftool()
        .context("cannot locate the bundled ExifTool")?;
    let total = job.len();
    let handle = spawn_batch(job, library, Arc::new(tool), options.temp_dir.clone())?;

    let pb = ProgressBar::new(total as u64);
    pb.set_style(ProgressStyle::default_bar().template("[{bar:40}] {pos}/{len} {msg}")?);
    for event in handle.events() {
        state.apply_event(&event);
        match &event {
            BatchEvent::Progress { .. } => pb.set_message(state.process_message.clone()),
            BatchEvent::ItemFinished { outcome: Err(err), asset_id, .. } => {
                tracing::debug!(%asset_id, %err, "item failed");
                pb.inc(1);
            }
            BatchEvent::ItemFinished { .. } => pb.inc(1),
            BatchEvent::Started { .. } | BatchEvent::Finished(_) => {}
        }
    }
    pb.finish_and_clear();
    let report = handle.join()?;

    // Report first; collecting never turns a finished batch into an error.
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", paint(&state.process_message, state.message_tone()));
    }

    let mut left_behind = 0;
    match args.collect {
        Some(dir) => {
            let collected = collect_results(&report.updated, dir);
            for (item, placed) in report.updated.iter().zip(&collected) {
                match &placed.error {
                    None if !args.json => show_item(item, &placed.path),
                    None => {}
                    Some(err) => {
                        left_behind += 1;
                        eprintln!("{} left at {}: {:#}", item.file_name, placed.path.display(), err);
                    }
                }
            }
        }
        None if !args.json => {
            for item in &report.updated {
                show_item(item, &item.path);
            }
        }
        None => {}
    }

    Ok(if report.failures > 0 || left_behind > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let library = Arc::new(FolderLibrary::open(library_root(&cli)?)?.with_guess(!cli.no_guess));
    let options = options(&cli);

    match &cli.command {
        Command::Albums => list_albums(&library)?,
        Command::Photos { album, date_source, thumbnails } => {
            list_photos(&library, album, *date_source, thumbnails.as_deref())?
        }
        Command::Apply { album, date_source, all, select, collect, json } => {
            return apply(
                library,
                &options,
                ApplyArgs {
                    album,
                    date_source: *date_source,
                    all: *all,
                    select,
                    collect: collect.as_deref(),
                    json: *json,
                },
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}
