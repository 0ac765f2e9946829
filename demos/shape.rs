use std::path::PathBuf;

use harfshape::{Script, ScriptItem, ShapeError, ShapeOutput, ShaperFlags, ShaperItem};

const HELP: &str = "\
USAGE:
    shape [OPTIONS] <FONT-FILE> [TEXT]

OPTIONS:
    -h, --help                          Show help options
        --version                       Show version number
        --font-file PATH                Set font file-name
        --face-index INDEX              Set face index [default: 0]
        --text TEXT                     Set input text
        --text-file PATH                Set input text file
        --script TAG                    Set text script as OpenType tag
                                        [default: script of the first character]
        --rtl                           Shape as a right-to-left run
        --no-kerning                    Do not apply kerning
        --design-metrics                Use unhinted design metrics
        --no-positions                  Do not output glyph offsets
        --no-clusters                   Do not output the cluster map
        --breaks                        Output line break opportunities

ARGS:
    <FONT-FILE>                         A font file
    [TEXT]                              An optional text
";

struct Args {
    help: bool,
    version: bool,
    font_file: Option<PathBuf>,
    face_index: u32,
    text: Option<String>,
    text_file: Option<PathBuf>,
    script: Option<Script>,
    rtl: bool,
    no_kerning: bool,
    design_metrics: bool,
    no_positions: bool,
    no_clusters: bool,
    breaks: bool,
    free: Vec<String>,
}

fn parse_args() -> Result<Args, pico_args::Error> {
    let mut args = pico_args::Arguments::from_env();
    let args = Args {
        help: args.contains(["-h", "--help"]),
        version: args.contains("--version"),
        font_file: args.opt_value_from_str("--font-file")?,
        face_index: args.opt_value_from_str("--face-index")?.unwrap_or(0),
        text: args.opt_value_from_str("--text")?,
        text_file: args.opt_value_from_str("--text-file")?,
        script: args.opt_value_from_fn("--script", parse_script)?,
        rtl: args.contains("--rtl"),
        no_kerning: args.contains("--no-kerning"),
        design_metrics: args.contains("--design-metrics"),
        no_positions: args.contains("--no-positions"),
        no_clusters: args.contains("--no-clusters"),
        breaks: args.contains("--breaks"),
        free: args
            .finish()
            .into_iter()
            .map(|s| s.to_string_lossy().into_owned())
            .collect(),
    };

    Ok(args)
}

fn main() {
    env_logger::init();

    let args = match parse_args() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {}.", e);
            std::process::exit(1);
        }
    };

    if args.version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if args.help {
        print!("{}", HELP);
        return;
    }

    let mut font_set_as_free_arg = false;
    let font_path = if let Some(ref path) = args.font_file {
        path.clone()
    } else if !args.free.is_empty() {
        font_set_as_free_arg = true;
        PathBuf::from(&args.free[0])
    } else {
        eprintln!("Error: font is not set.");
        std::process::exit(1);
    };

    if !font_path.exists() {
        eprintln!("Error: '{}' does not exist.", font_path.display());
        std::process::exit(1);
    }

    let font_data = std::fs::read(&font_path).unwrap();
    let mut face = match harfshape::Face::from_slice(&font_data, args.face_index) {
        Some(face) => face,
        None => {
            eprintln!("Error: '{}' is not a valid font.", font_path.display());
            std::process::exit(1);
        }
    };

    let text = if let Some(ref path) = args.text_file {
        std::fs::read_to_string(path).unwrap()
    } else if args.free.len() == 2 && font_set_as_free_arg {
        args.free[1].clone()
    } else if args.free.len() == 1 && !font_set_as_free_arg {
        args.free[0].clone()
    } else if let Some(ref text) = args.text {
        text.clone()
    } else {
        eprintln!("Error: text is not set.");
        std::process::exit(1);
    };

    let script = args
        .script
        .or_else(|| text.chars().next().map(Script::from_char))
        .unwrap_or_default();

    let utf16: Vec<u16> = text.encode_utf16().collect();
    let run = ScriptItem::new(0, utf16.len(), script, u8::from(args.rtl));

    let mut flags = ShaperFlags::empty();
    if args.no_kerning {
        flags |= ShaperFlags::NO_KERNING;
    }
    if args.design_metrics {
        flags |= ShaperFlags::USE_DESIGN_METRICS;
    }

    let item = ShaperItem::new(&utf16, run).with_flags(flags);
    let mut output = ShapeOutput::with_capacity(utf16.len());
    loop {
        match harfshape::shape(&mut face, &item, &mut output) {
            Ok(()) => break,
            Err(ShapeError::Capacity { required }) => output.grow(required),
            Err(e) => {
                eprintln!("Error: {}.", e);
                std::process::exit(1);
            }
        }
    }

    let glyphs: Vec<String> = output
        .glyphs()
        .iter()
        .zip(output.advances())
        .zip(output.offsets())
        .map(|((glyph, advance), offset)| {
            if args.no_positions || (offset.x == 0 && offset.y == 0) {
                format!("{}+{}", glyph.0, advance)
            } else {
                format!("{}@{},{}+{}", glyph.0, offset.x, offset.y, advance)
            }
        })
        .collect();
    print!("[{}]", glyphs.join("|"));

    if !args.no_clusters {
        let clusters: Vec<String> = output.log_clusters().iter().map(|c| c.to_string()).collect();
        print!(" clusters=[{}]", clusters.join(","));
    }

    if output.kerning_applied() {
        print!(" kerned");
    }
    println!();

    if args.breaks {
        match harfshape::char_attributes(&utf16, &[run]) {
            Ok(attributes) => {
                let breaks: String = attributes
                    .iter()
                    .map(|a| match a.line_break_type {
                        harfshape::LineBreakType::NoBreak => '.',
                        harfshape::LineBreakType::SoftHyphen => '-',
                        harfshape::LineBreakType::Break => '|',
                        harfshape::LineBreakType::ForcedBreak => '!',
                    })
                    .collect();
                println!("breaks=[{}]", breaks);
            }
            Err(e) => eprintln!("Error: {}.", e),
        }
    }
}

fn parse_script(s: &str) -> Result<Script, String> {
    let tag = harfshape::Tag::from_bytes_lossy(s.as_bytes());
    Script::ALL
        .iter()
        .copied()
        .find(|&script| harfshape::script_tag(script) == tag)
        .ok_or_else(|| format!("'{}' is not a supported script", s))
}
