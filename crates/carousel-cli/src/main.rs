use carousel::render::{HeadlessError, SvgRenderOptions, sanitize_svg_id};
use carousel::{PlanConfig, WeightTable};
use serde::Serialize;
use std::io::Read;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CAROUSEL_LOG";

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Carousel(HeadlessError),
    Json(serde_json::Error),
    EmptySequence,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Carousel(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::EmptySequence => write!(f, "sequence needs at least two states"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<HeadlessError> for CliError {
    fn from(value: HeadlessError) -> Self {
        Self::Carousel(value)
    }
}

impl From<carousel::Error> for CliError {
    fn from(value: carousel::Error) -> Self {
        Self::Carousel(value.into())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Plan,
    Render,
    Sequence,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    style: Option<String>,
    size: f64,
    background: Option<String>,
    diagram_id: Option<String>,
    out: Option<String>,
}

fn usage() -> &'static str {
    "carousel-cli\n\
\n\
USAGE:\n\
  carousel-cli [plan] [--pretty] [--style <path>] [<path>|-]\n\
  carousel-cli render [--style <path>] [--size <px>] [--background <css-color>|none] [--id <diagram-id>] [--out <path>] [<path>|-]\n\
  carousel-cli sequence [--pretty] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - plan/render read a weight table: {\"states\": [..], \"matrix\": [[..]]} or {\"rows\", \"columns\", \"matrix\"}.\n\
  - --style reads a JSON plan config (camelCase keys, any subset).\n\
  - sequence reads whitespace-separated state names and prints the transition table.\n\
  - render prints SVG to stdout by default; use --out to write a file.\n\
  - Set CAROUSEL_LOG (e.g. debug) to log to stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        command: Command::Plan,
        size: SvgRenderOptions::default().size,
        background: SvgRenderOptions::default().background,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "plan" => args.command = Command::Plan,
            "render" => args.command = Command::Render,
            "sequence" => args.command = Command::Sequence,
            "--pretty" => args.pretty = true,
            "--style" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.style = Some(path.clone());
            }
            "--size" => {
                let Some(size) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.size = size.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
                if !(args.size.is_finite() && args.size > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--background" => {
                let Some(bg) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let bg = bg.trim();
                args.background = match bg {
                    "" | "none" | "transparent" => None,
                    other => Some(other.to_string()),
                };
            }
            "--id" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.diagram_id = Some(sanitize_svg_id(id));
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn read_config(style: Option<&str>) -> Result<PlanConfig, CliError> {
    match style {
        None => Ok(PlanConfig::default()),
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&text)?)
        }
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;

    match args.command {
        Command::Sequence => {
            let states: Vec<&str> = text.split_whitespace().collect();
            if states.len() < 2 {
                return Err(CliError::EmptySequence);
            }
            let table = WeightTable::from_sequence(&states);
            tracing::debug!(observations = states.len(), "derived transition table");
            write_json(&table, args.pretty)
        }
        Command::Plan => {
            let table: WeightTable = serde_json::from_str(&text)?;
            let config = read_config(args.style.as_deref())?;
            let plan = carousel::plan(&table, &config)?;
            write_json(&plan, args.pretty)
        }
        Command::Render => {
            let table: WeightTable = serde_json::from_str(&text)?;
            let config = read_config(args.style.as_deref())?;
            let options = SvgRenderOptions {
                size: args.size,
                diagram_id: args.diagram_id,
                background: args.background,
                ..Default::default()
            };
            let svg = carousel::render::render_table(&table, &config, &options)?;
            write_text(&svg, args.out.as_deref())
        }
    }
}

fn main() {
    init_tracing();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
