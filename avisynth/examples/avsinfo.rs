// Prints the format of a script's output clip and optionally dumps its frames, like a tiny
// avs2yuv.
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use avisynth::clip::{Parity, ThreadMode};
use avisynth::prelude::*;
use clap::{Arg, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;

struct Args {
    script: String,
    eval: bool,
    interface_version: Option<i32>,
    start: usize,
    end: Option<usize>,
    output: Option<String>,
    audio: bool,
}

fn parse_args() -> Result<Args> {
    let matches = Command::new("avsinfo")
        .about("Prints information about an AviSynth script and dumps its frames")
        .arg(
            Arg::new("script")
                .help("The script file, or the script itself with --eval")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("eval")
                .short('e')
                .long("eval")
                .help("Evaluate the argument as script text instead of importing a file"),
        )
        .arg(
            Arg::new("interface-version")
                .long("interface-version")
                .takes_value(true)
                .value_name("N")
                .help("Interface version to request from the engine"),
        )
        .arg(
            Arg::new("start")
                .short('s')
                .long("start")
                .takes_value(true)
                .value_name("N")
                .help("First frame to output"),
        )
        .arg(
            Arg::new("end")
                .short('n')
                .long("end")
                .takes_value(true)
                .value_name("N")
                .help("Last frame to output"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .help("Write packed frames to this file, `-` for stdout"),
        )
        .arg(
            Arg::new("audio")
                .short('a')
                .long("audio")
                .help("Write the audio of each frame instead of the video"),
        )
        .get_matches();

    fn number<T: std::str::FromStr>(value: Option<&str>, name: &str) -> Result<Option<T>> {
        value
            .map(|value| {
                value
                    .parse::<T>()
                    .map_err(|_| anyhow!("couldn't parse {} \"{}\"", name, value))
            })
            .transpose()
    }

    Ok(Args {
        script: matches.value_of("script").unwrap_or_default().to_owned(),
        eval: matches.is_present("eval"),
        interface_version: number(matches.value_of("interface-version"), "interface version")?,
        start: number(matches.value_of("start"), "start")?.unwrap_or(0),
        end: number(matches.value_of("end"), "end")?,
        output: matches.value_of("output").map(str::to_owned),
        audio: matches.is_present("audio"),
    })
}

fn print_info(env: &ScriptEnvironment, clip: &Clip<'_>) {
    let vi = clip.video_info();

    println!("Interface version: {}", env.interface_version());
    if let Some(path) = env.api().library_path() {
        println!("Library: {}", path.display());
    }

    if vi.has_video() {
        println!("Width: {}", vi.width);
        println!("Height: {}", vi.height);
        println!("Frames: {}", vi.num_frames);
        println!(
            "FPS: {}/{} ({:.3} fps)",
            vi.fps_numerator,
            vi.fps_denominator,
            vi.fps()
        );
        println!("Format: {}", vi.pixel_type);
        println!("Bits per pixel: {}", vi.bits_per_pixel());

        let field_order = match clip.parity(0) {
            Parity::TopFirst => "top field first",
            Parity::BottomFirst => "bottom field first",
            Parity::Unknown => "field-based, unknown order",
            Parity::FrameBased => "progressive",
        };
        println!("Field order: {}", field_order);
    } else {
        println!("No video");
    }

    if vi.has_audio() {
        println!("Audio rate: {} Hz", vi.audio_samples_per_second);
        println!("Channels: {}", vi.audio_channels());
        println!("Bytes per sample: {}", vi.bytes_per_channel_sample());
        println!("Samples: {}", vi.num_audio_samples);
    } else {
        println!("No audio");
    }

    let thread_mode = match clip.thread_mode() {
        ThreadMode::Unknown(_) => "unknown".to_owned(),
        mode => format!("{:?}", mode),
    };
    println!("Thread mode: {}", thread_mode);
}

fn output(clip: &Clip<'_>, args: &Args, out: &mut dyn Write) -> Result<()> {
    let num_frames = clip.video_info().num_frames.max(0) as usize;
    if num_frames == 0 {
        bail!("the clip has no frames");
    }

    let end = args.end.unwrap_or(num_frames - 1);
    if end >= num_frames {
        bail!("--end {} is past the last frame {}", end, num_frames - 1);
    }
    if args.start > end {
        bail!("--start {} is past --end {}", args.start, end);
    }

    for n in args.start..=end {
        let data = if args.audio {
            clip.audio_for_frame(n)
        } else {
            clip.get_frame(n).and_then(|frame| frame.to_packed())
        }
        .with_context(|| format!("couldn't get frame {}", n))?;

        out.write_all(&data).context("couldn't write the output")?;
    }

    info!(frames = end + 1 - args.start, "done");
    Ok(())
}

fn run() -> Result<()> {
    let args = parse_args()?;

    let mut config = Config::from_env();
    if let Some(version) = args.interface_version {
        config.interface_version = version;
    }
    let env = ScriptEnvironment::with_config(&config)
        .context("couldn't create a script environment")?;

    let value = if args.eval {
        env.eval(&args.script, Some("avsinfo"))
    } else {
        let path = Path::new(&args.script)
            .canonicalize()
            .with_context(|| format!("couldn't find {}", args.script))?;
        let path = path
            .to_str()
            .ok_or_else(|| anyhow!("the script path is not valid Unicode"))?;
        env.invoke("Import", &Value::from(path), None)
    }
    .context("couldn't evaluate the script")?;

    let clip = value
        .into_clip()
        .context("the script didn't return a clip")?;

    match args.output.as_deref() {
        None => print_info(&env, &clip),
        Some("-") => output(&clip, &args, &mut io::stdout().lock())?,
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("couldn't create the output file {}", path))?;
            output(&clip, &args, &mut file)?;
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }
}
