use clap::builder::NonEmptyStringValueParser;
use clap::{crate_name, crate_version, value_parser, Arg, ArgAction, Command};

use spritegif::color::parse_hex_color;
use spritegif::grid::ReadOrder;
use spritegif::progress::{AbortFlag, NoProgress, ProgressReporter};
use spritegif::{AlignMode, CropMargins, PngSequence, Repeat, RenderPlan, Settings};

use pbr::ProgressBar;

pub type BinResult<T, E = Box<dyn std::error::Error + Send + Sync>> = Result<T, E>;

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn main() {
    env_logger::init();

    if let Err(e) = bin_main() {
        eprintln!("error: {e}");
        if let Some(e) = e.source() {
            eprintln!("error: {e}");
        }
        std::process::exit(1);
    }
}

fn crop_arg(id: &'static str, side: &str) -> Arg {
    Arg::new(id)
        .long(id)
        .value_name("px")
        .help(format!("Pixels trimmed off the {side} of every cell"))
        .value_parser(value_parser!(f64))
        .default_value("0")
}

fn bin_main() -> BinResult<()> {
    let matches = Command::new(crate_name!())
        .version(crate_version!())
        .about("Turns a sprite sheet into an animated GIF")
        .arg_required_else_help(true)
        .allow_negative_numbers(true)
        .arg(Arg::new("output")
            .long("output")
            .short('o')
            .help("Destination file to write to; \"-\" means stdout")
            .num_args(1)
            .value_parser(value_parser!(OsString))
            .value_name("a.gif"))
        .arg(Arg::new("rows")
            .long("rows")
            .value_name("num")
            .help("Number of rows of cells in the sheet")
            .value_parser(value_parser!(u32).range(1..))
            .default_value("1"))
        .arg(Arg::new("cols")
            .long("cols")
            .value_name("num")
            .help("Number of columns of cells in the sheet")
            .value_parser(value_parser!(u32).range(1..))
            .default_value("1"))
        .arg(Arg::new("frames")
            .long("frames")
            .value_name("num")
            .help("How many cells hold frames (default: all of them)")
            .value_parser(value_parser!(u32).range(1..)))
        .arg(Arg::new("exclude")
            .long("exclude")
            .value_name("i,j,..")
            .help("Frame indices to skip")
            .value_delimiter(',')
            .action(ArgAction::Append)
            .value_parser(value_parser!(u32)))
        .arg(Arg::new("column-major")
            .long("column-major")
            .action(ArgAction::SetTrue)
            .help("Frames run down the columns instead of across the rows"))
        .arg(crop_arg("crop-top", "top"))
        .arg(crop_arg("crop-bottom", "bottom"))
        .arg(crop_arg("crop-left", "left"))
        .arg(crop_arg("crop-right", "right"))
        .arg(Arg::new("scale")
            .long("scale")
            .value_name("x")
            .help("Enlarge frames by this factor")
            .value_parser(value_parser!(f64))
            .default_value("1"))
        .arg(Arg::new("fps")
            .long("fps")
            .short('r')
            .value_name("num")
            .help("Frame rate of animation")
            .value_parser(value_parser!(f64))
            .default_value("10"))
        .arg(Arg::new("transparent")
            .long("transparent")
            .value_name("#rrggbb")
            .help("Background color to make transparent")
            .value_parser(NonEmptyStringValueParser::new()))
        .arg(Arg::new("tolerance")
            .long("tolerance")
            .value_name("0-100")
            .help("How far from the background color a pixel can be and still be removed")
            .value_parser(value_parser!(f64))
            .default_value("10"))
        .arg(Arg::new("global-key")
            .long("global-key")
            .action(ArgAction::SetTrue)
            .requires("transparent")
            .help("Remove every matching pixel, not only those connected to the cell edges"))
        .arg(Arg::new("auto-align")
            .long("auto-align")
            .action(ArgAction::SetTrue)
            .help("Line up the subject of every frame on a shared canvas"))
        .arg(Arg::new("align")
            .long("align")
            .value_name("mode")
            .help("Where auto-aligned subjects sit")
            .value_parser(["center", "bottom"])
            .default_value("center"))
        .arg(Arg::new("align-margin")
            .long("align-margin")
            .value_name("px")
            .help("Padding added around auto-aligned subjects")
            .value_parser(value_parser!(u32))
            .default_value("2"))
        .arg(Arg::new("max-1024")
            .long("max-1024")
            .action(ArgAction::SetTrue)
            .help("Shrink the output so its longer side is at most 1024px"))
        .arg(Arg::new("quality")
            .long("quality")
            .short('Q')
            .value_name("1-100")
            .value_parser(value_parser!(u8).range(1..=100))
            .default_value("100")
            .help("Lower quality may give smaller file"))
        .arg(Arg::new("repeat")
            .long("repeat")
            .help("Number of times the animation is repeated (-1 none, 0 forever or <value> repetitions")
            .num_args(1)
            .value_parser(value_parser!(i16))
            .value_name("num"))
        .arg(Arg::new("quiet")
            .long("quiet")
            .short('q')
            .action(ArgAction::SetTrue)
            .help("Do not display anything on standard output/console"))
        .arg(Arg::new("dump-frames")
            .long("dump-frames")
            .value_name("dir")
            .help("Also save every frame as a PNG file in this directory")
            .value_parser(value_parser!(PathBuf)))
        .arg(Arg::new("list-frames")
            .long("list-frames")
            .action(ArgAction::SetTrue)
            .help("Print which cells will be used, then exit"))
        .arg(Arg::new("FILE")
            .help("Sprite sheet PNG file")
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .required(true))
        .get_matches_from(wild::args_os());

    let input: &PathBuf = matches.get_one("FILE").ok_or("Missing input file")?;
    check_if_path_exists(input)?;

    let rows = matches.get_one::<u32>("rows").copied().ok_or("Missing rows")?;
    let cols = matches.get_one::<u32>("cols").copied().ok_or("Missing cols")?;
    let total_frames = matches.get_one::<u32>("frames").copied().unwrap_or(rows.saturating_mul(cols));
    let excluded_frames: BTreeSet<u32> = matches.get_many::<u32>("exclude").into_iter().flatten().copied().collect();

    let crop = |id: &str| matches.get_one::<f64>(id).copied().unwrap_or(0.);
    let transparent = matches.get_one::<String>("transparent").map(|s| parse_hex_color(s)).transpose()?;

    let repeat = match matches.get_one::<i16>("repeat").copied().unwrap_or(0) {
        -1 => Repeat::Finite(0),
        0 => Repeat::Infinite,
        n if n > 0 => Repeat::Finite(n as u16),
        _ => return Err("Invalid repeat count".into()),
    };

    let settings = Settings {
        rows,
        cols,
        total_frames,
        excluded_frames,
        read_order: if matches.get_flag("column-major") { ReadOrder::ColumnMajor } else { ReadOrder::RowMajor },
        crop: CropMargins {
            top: crop("crop-top"),
            bottom: crop("crop-bottom"),
            left: crop("crop-left"),
            right: crop("crop-right"),
        },
        scale: matches.get_one::<f64>("scale").copied().ok_or("Missing scale")?,
        fps: matches.get_one::<f64>("fps").copied().ok_or("Missing fps")?,
        transparent,
        tolerance: matches.get_one::<f64>("tolerance").copied().ok_or("Missing tolerance")?,
        flood_fill: !matches.get_flag("global-key"),
        auto_align: matches.get_flag("auto-align"),
        align_mode: match matches.get_one::<String>("align").map(|s| s.as_str()) {
            Some("bottom") => AlignMode::Bottom,
            _ => AlignMode::Center,
        },
        align_margin: matches.get_one::<u32>("align-margin").copied().unwrap_or(spritegif::DEFAULT_ALIGN_MARGIN),
        max_resolution: matches.get_flag("max-1024"),
        quality: matches.get_one::<u8>("quality").copied().unwrap_or(100),
        repeat,
    };
    settings.validate()?;

    let sheet = spritegif::decode_png_file(input)?;

    if matches.get_flag("list-frames") {
        let plan = RenderPlan::new(sheet.as_ref(), &settings, spritegif::color::KeyOutput::Alpha)?;
        let geom = plan.geometry();
        let mut out = io::stdout().lock();
        writeln!(out, "{} frames, {}×{} each", plan.len(), geom.output_width, geom.output_height)?;
        for slot in plan.slots() {
            writeln!(out, "frame {:>4}  row {:>3}  col {:>3}", slot.index, slot.row, slot.col)?;
        }
        return Ok(());
    }

    let output: &OsString = matches.get_one("output").ok_or("Missing output file (-o)")?;
    let output_path = DestPath::new(output);
    let quiet = matches.get_flag("quiet") || output_path == DestPath::Stdout;

    if !quiet {
        if settings.fps > 50. {
            eprintln!("warning: web browsers support max 50 fps");
        }
        if settings.quality < 20 {
            eprintln!("warning: quality {} will give really bad results", settings.quality);
        }
    }

    let abort = AbortFlag::new();

    if let Some(dir) = matches.get_one::<PathBuf>("dump-frames") {
        let mut pngs = PngSequence::new(dir)?;
        spritegif::render(sheet.as_ref(), &settings, &mut pngs, &abort)?;
        if !quiet {
            eprintln!("saved {} frames to {}", pngs.written(), DestPath::Path(dir.as_path()));
        }
    }

    let mut pb;
    let mut nopb = NoProgress {};
    let progress: &mut dyn ProgressReporter = if quiet {
        &mut nopb
    } else {
        pb = ProgressBar::new(spritegif::grid::sequence(&settings)?.len() as u64);
        pb.show_speed = false;
        pb.show_percent = false;
        pb.format(" #_. ");
        pb.message("Frame ");
        pb.set_max_refresh_rate(Some(Duration::from_millis(250)));
        &mut pb
    };

    let (gif, report) = spritegif::encode_to_vec(sheet.as_ref(), &settings, progress, &abort)?;
    for index in &report.missing_content {
        log::info!("frame {index} was drawn without alignment");
    }

    match output_path {
        DestPath::Path(p) => {
            let mut file = File::create(p)
                .map_err(|e| format!("Can't write to {}: {}", p.display(), e))?;
            file.write_all(&gif)?;
        },
        DestPath::Stdout => {
            io::stdout().lock().write_all(&gif)?;
        },
    };
    if !quiet {
        eprintln!("spritegif created {output_path} ({} frames, {}×{})", report.frames_written, report.width, report.height);
    }

    Ok(())
}

fn check_if_path_exists(path: &Path) -> BinResult<()> {
    if !path.exists() {
        let mut msg = format!("Unable to find the input file: \"{}\"", path.display());
        if path.is_relative() {
            msg += &format!(" (searched in \"{}\")", std::env::current_dir()?.display());
        }
        return Err(msg.into());
    }
    Ok(())
}

#[derive(PartialEq)]
enum DestPath<'a> {
    Path(&'a Path),
    Stdout,
}

impl<'a> DestPath<'a> {
    pub fn new(path: &'a OsString) -> Self {
        if path == "-" {
            Self::Stdout
        } else {
            Self::Path(Path::new(path))
        }
    }
}

impl fmt::Display for DestPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Path(orig_path) => {
                let abs_path = dunce::canonicalize(orig_path);
                abs_path.as_ref().map(|p| p.as_path()).unwrap_or(orig_path).display().fmt(f)
            },
            Self::Stdout => f.write_str("stdout"),
        }
    }
}
