use std::io::{self, BufWriter, Write};

use graph2d_engine::parse::{ReadOptions, parse_columns, read_points_file};
use graph2d_engine::{Graph2D, InterpolationEngine};
use tracing_subscriber::{EnvFilter, fmt};

const USAGE: &str = r#"graph2d_cli (graph2d-engine)

USAGE:
  graph2d_cli <command> <points-file> [options]

COMMANDS:
  sample      Interpolate on the npx x npy histogram grid ("x y z" per cell)
  value       Interpolate at the points given with --at
  triangles   List the Delaunay triangles as point indices
  hull        List the convex hull vertices, counter-clockwise
  contour     Trace the contour lines at --level

OPTIONS:
  --npx <n>               Bins along x (4..=500, default 40)
  --npy <n>               Bins along y (4..=500, default 40)
  --margin <f>            Fraction of the data range added on each side (0..=1)
  --margin-value <f>      Value outside the convex hull (default 0)
  --engine <name>         delaunay (walking locator) or legacy (scan)
  --delimiters <chars>    Characters separating the columns (default whitespace)
  --columns <a,b,c>       One-based columns holding x, y and z (default 1,2,3)
  --dedup                 Drop points whose (x, y) repeats an earlier one
  --max-iter <n>          Cavity operations allowed for the whole build
  --level <f>             Contour level (contour only)
  --at <x,y>              Query point (value only; repeatable)
  -h, --help              Show this help

Set RUST_LOG (e.g. RUST_LOG=debug) for diagnostics on stderr.
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Sample,
    Value,
    Triangles,
    Hull,
    Contour,
}

impl Command {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sample" => Some(Self::Sample),
            "value" => Some(Self::Value),
            "triangles" => Some(Self::Triangles),
            "hull" => Some(Self::Hull),
            "contour" => Some(Self::Contour),
            _ => None,
        }
    }
}

fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    if let Err(err) = run() {
        eprintln!("graph2d_cli error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut args = Args::new(args);

    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };
    if matches!(command.as_str(), "-h" | "--help" | "help") {
        print_usage();
        return Ok(());
    }
    let command = Command::from_name(&command)
        .ok_or_else(|| format!("unknown command `{command}`\n\n{USAGE}"))?;
    let path = args.next().ok_or("missing points file")?;

    let mut read_options = ReadOptions::default();
    let mut graph = Graph2D::new();
    let mut dedup = false;
    let mut level: Option<f64> = None;
    let mut queries: Vec<(f64, f64)> = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--npx" => graph.set_npx(parse_number(&args.value("--npx")?, "--npx")?),
            "--npy" => graph.set_npy(parse_number(&args.value("--npy")?, "--npy")?),
            "--margin" => graph.set_margin(parse_number(&args.value("--margin")?, "--margin")?),
            "--margin-value" => {
                let value = parse_number(&args.value("--margin-value")?, "--margin-value")?;
                graph.set_margin_value(value);
            }
            "--engine" => {
                let engine: InterpolationEngine = args.value("--engine")?.parse()?;
                graph.set_engine(engine);
            }
            "--delimiters" => {
                read_options = read_options.with_delimiters(args.value("--delimiters")?);
            }
            "--columns" => {
                let columns = parse_columns(&args.value("--columns")?).map_err(|e| e.to_string())?;
                read_options = read_options.with_columns(columns);
            }
            "--dedup" => dedup = true,
            "--max-iter" => {
                graph.set_max_iterations(parse_number(&args.value("--max-iter")?, "--max-iter")?);
            }
            "--level" => level = Some(parse_number(&args.value("--level")?, "--level")?),
            "--at" => queries.push(parse_pair(&args.value("--at")?)?),
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
        }
    }

    let (points, report) =
        read_points_file(&path, &read_options).map_err(|e| format!("{path}: {e}"))?;
    log::info!("{path}: {} points read, {} lines skipped", report.accepted, report.skipped);
    *graph.points_mut() = points;
    if dedup {
        let before = graph.len();
        let after = graph.remove_duplicates();
        log::info!("removed {} duplicate point(s)", before - after);
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match command {
        Command::Sample => cmd_sample(&mut graph, &mut out),
        Command::Value => cmd_value(&mut graph, &queries, &mut out),
        Command::Triangles => cmd_triangles(&mut graph, &mut out),
        Command::Hull => cmd_hull(&mut graph, &mut out),
        Command::Contour => {
            let level = level.ok_or("contour needs --level")?;
            cmd_contour(&mut graph, level, &mut out)
        }
    }?;
    out.flush().map_err(|e| format!("write output: {e}"))
}

fn print_usage() {
    println!("{USAGE}");
}

fn cmd_sample(graph: &mut Graph2D, out: &mut impl Write) -> Result<(), String> {
    let grid = graph.histogram().map_err(|e| e.to_string())?;
    let spec = grid.spec;
    if let (Some(min), Some(max)) = (grid.min, grid.max) {
        writeln!(out, "# min {min} max {max}").map_err(write_error)?;
    }
    for iy in 0..spec.ny {
        for ix in 0..spec.nx {
            let (x, y) = spec.cell_center(ix, iy);
            writeln!(out, "{x} {y} {}", grid.value(ix, iy)).map_err(write_error)?;
        }
    }
    log::debug!(
        "{} margin cell(s), {} NaN cell(s); cache {:?}",
        grid.margin_cells,
        grid.nan_cells,
        graph.cache_stats()
    );
    Ok(())
}

fn cmd_value(
    graph: &mut Graph2D,
    queries: &[(f64, f64)],
    out: &mut impl Write,
) -> Result<(), String> {
    if queries.is_empty() {
        return Err("value needs at least one --at x,y".to_string());
    }
    for &(x, y) in queries {
        let z = graph.try_value_at(x, y).map_err(|e| e.to_string())?;
        writeln!(out, "{x} {y} {z}").map_err(write_error)?;
    }
    Ok(())
}

fn cmd_triangles(graph: &mut Graph2D, out: &mut impl Write) -> Result<(), String> {
    let triangulation = graph.triangulation().map_err(|e| e.to_string())?;
    for triangle in triangulation.triangles() {
        let [a, b, c] = triangle.vertices;
        writeln!(out, "{a} {b} {c}").map_err(write_error)?;
    }
    let diagnostics = triangulation.diagnostics();
    log::info!(
        "{} triangles, {} hull vertices, {} cavity operations ({} max per point)",
        diagnostics.triangle_count,
        diagnostics.hull_vertex_count,
        diagnostics.cavity_operations,
        diagnostics.max_cavity_operations
    );
    Ok(())
}

fn cmd_hull(graph: &mut Graph2D, out: &mut impl Write) -> Result<(), String> {
    let hull = graph.triangulation().map_err(|e| e.to_string())?.hull().to_vec();
    for index in hull {
        let (x, y) = graph.points().xy(index);
        writeln!(out, "{index} {x} {y}").map_err(write_error)?;
    }
    Ok(())
}

fn cmd_contour(graph: &mut Graph2D, level: f64, out: &mut impl Write) -> Result<(), String> {
    let lines = graph.contour_lines(level).map_err(|e| e.to_string())?;
    for (i, line) in lines.iter().enumerate() {
        let kind = if line.closed { "closed" } else { "open" };
        writeln!(out, "# line {i} {kind} {} point(s)", line.len()).map_err(write_error)?;
        for &(x, y) in &line.points {
            writeln!(out, "{x} {y}").map_err(write_error)?;
        }
    }
    Ok(())
}

fn write_error(err: io::Error) -> String {
    format!("write output: {err}")
}

fn parse_number<T: std::str::FromStr>(text: &str, flag: &str) -> Result<T, String> {
    text.trim()
        .parse()
        .map_err(|_| format!("invalid value `{text}` for {flag}"))
}

fn parse_pair(text: &str) -> Result<(f64, f64), String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got `{text}`"))?;
    Ok((parse_number(x, "--at")?, parse_number(y, "--at")?))
}

struct Args {
    args: Vec<String>,
    pos: usize,
}

impl Args {
    fn new(args: Vec<String>) -> Self {
        Self { args, pos: 0 }
    }

    fn next(&mut self) -> Option<String> {
        let arg = self.args.get(self.pos)?.clone();
        self.pos += 1;
        Some(arg)
    }

    fn value(&mut self, flag: &str) -> Result<String, String> {
        self.next().ok_or_else(|| format!("missing value for {flag}"))
    }
}
