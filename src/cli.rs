// ============================================================================
// SketchFE CLI - headless replay of recorded gesture scripts
// ============================================================================
//
// Usage examples:
//   sketchfe --input square.json --output square.png
//   sketchfe -i recordings/*.json --output-dir out/ --width 800 --height 600
//   sketchfe -i doodle.json --data-url              (prints data:image/png;base64,...)
//   sketchfe -i doodle.json --background photo.jpg -o out.png
//
// A script is a JSON array of actions, e.g.
//   [{"op":"color","color":"#ff0000"}, {"op":"begin","x":10,"y":10},
//    {"op":"move","x":50,"y":10}, {"op":"end"}, {"op":"undo"}]
//
// Replay runs on a virtual clock: every pointer event advances it by
// --frame-ms, `wait_ms` advances it explicitly.  `tool`, `color` and `width`
// change state programmatically; `tool_click` simulates a click on a tool
// control and opens the engagement-suppression window.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use serde::Deserialize;

use sketchfe::components::colors::parse_hex;
use sketchfe::components::input::{GestureOutcome, PointerEvent, PointerPhase, PointerSource};
use sketchfe::components::tools::Tool;
use sketchfe::{EditorSession, EngineError, EngineSettings, io, log_info, log_warn};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// SketchFE headless gesture replayer.
///
/// Replays recorded pointer gestures against a blank sketch surface and
/// writes the result as PNG - no display required.
#[derive(Parser, Debug)]
#[command(
    name = "sketchfe",
    about = "SketchFE headless gesture replayer",
    long_about = "Replay JSON gesture scripts (strokes, bucket fills, undo/redo,\n\
                  clears and display resizes) against a blank sketch surface and\n\
                  export the result as PNG.\n\n\
                  Example:\n  \
                  sketchfe --input square.json --output square.png\n  \
                  sketchfe -i recordings/*.json --output-dir out/"
)]
pub struct CliArgs {
    /// Script file(s). Glob patterns accepted (e.g. "recordings/*.json").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output PNG path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch replay; files are named after the script stem.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Initial surface width in pixels.
    #[arg(long, default_value_t = 512)]
    pub width: u32,

    /// Initial surface height in pixels.
    #[arg(long, default_value_t = 512)]
    pub height: u32,

    /// Image placed on the surface before replay starts.
    #[arg(long, value_name = "IMAGE")]
    pub background: Option<PathBuf>,

    /// Engine settings file (key=value). Defaults to the per-user settings path.
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Virtual milliseconds between consecutive pointer events.
    #[arg(long, default_value_t = 16)]
    pub frame_ms: u64,

    /// Print the exported image as a data: URL on stdout.
    #[arg(long)]
    pub data_url: bool,

    /// Session log file (defaults to the per-OS data directory).
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Print per-action outcomes and per-file timing; enables DEBUG log lines.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Script format
// ============================================================================

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptAction {
    Tool { tool: String },
    Color { color: String },
    Width { width: u32 },
    ToolClick,
    WaitMs { ms: u64 },
    Begin {
        x: f32,
        y: f32,
        #[serde(default = "default_true")]
        on_surface: bool,
        #[serde(default)]
        source: PointerSource,
    },
    Move {
        x: f32,
        y: f32,
        #[serde(default = "default_true")]
        on_surface: bool,
    },
    End {
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
    },
    Cancel,
    Undo,
    Redo,
    Clear,
    Resize { width: u32, height: u32 },
}

pub fn parse_script(text: &str) -> Result<Vec<ScriptAction>, String> {
    serde_json::from_str(text).map_err(|e| format!("invalid script: {}", e))
}

/// Tally of what a replay did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub strokes: usize,
    pub fills: usize,
    pub ignored: usize,
    pub suppressed: usize,
    pub undos: usize,
    pub redos: usize,
    /// Undo/redo requests that hit a history boundary.
    pub rejected: usize,
}

fn pointer(
    phase: PointerPhase,
    (x, y): (f32, f32),
    on_surface: bool,
    source: PointerSource,
    at: Instant,
) -> PointerEvent {
    let ev = PointerEvent::new(phase, x, y, at).with_source(source);
    if on_surface { ev } else { ev.off_surface() }
}

/// Apply every action of `script` to `session`.
pub fn replay(
    session: &mut EditorSession,
    script: &[ScriptAction],
    frame: Duration,
    verbose: bool,
) -> Result<ReplayReport, String> {
    let mut report = ReplayReport::default();
    let mut clock = Instant::now();
    let mut source = PointerSource::Mouse;

    for (step, action) in script.iter().enumerate() {
        let pending = match action {
            ScriptAction::Tool { tool } => {
                let tool = Tool::from_name(tool)
                    .ok_or_else(|| format!("step {}: unknown tool {:?}", step, tool))?;
                session.tools_mut().set_tool(tool);
                None
            }
            ScriptAction::Color { color } => {
                let color = parse_hex(color)
                    .ok_or_else(|| format!("step {}: invalid colour {:?}", step, color))?;
                session.tools_mut().set_color(color);
                None
            }
            ScriptAction::Width { width } => {
                session.tools_mut().set_stroke_width(*width);
                None
            }
            ScriptAction::ToolClick => {
                session.note_tool_click(clock);
                None
            }
            ScriptAction::WaitMs { ms } => {
                clock += Duration::from_millis(*ms);
                None
            }
            ScriptAction::Begin { x, y, on_surface, source: s } => {
                clock += frame;
                source = *s;
                Some(pointer(PointerPhase::Begin, (*x, *y), *on_surface, source, clock))
            }
            ScriptAction::Move { x, y, on_surface } => {
                clock += frame;
                Some(pointer(PointerPhase::Move, (*x, *y), *on_surface, source, clock))
            }
            ScriptAction::End { x, y } => {
                clock += frame;
                Some(pointer(PointerPhase::End, (*x, *y), true, source, clock))
            }
            ScriptAction::Cancel => {
                clock += frame;
                Some(pointer(PointerPhase::Cancel, (0.0, 0.0), true, source, clock))
            }
            ScriptAction::Undo => {
                match session.undo() {
                    Ok(()) => report.undos += 1,
                    Err(EngineError::NothingToUndo) => report.rejected += 1,
                    Err(e) => return Err(format!("step {}: {}", step, e)),
                }
                None
            }
            ScriptAction::Redo => {
                match session.redo() {
                    Ok(()) => report.redos += 1,
                    Err(EngineError::NothingToRedo) => report.rejected += 1,
                    Err(e) => return Err(format!("step {}: {}", step, e)),
                }
                None
            }
            ScriptAction::Clear => {
                session.clear();
                None
            }
            ScriptAction::Resize { width, height } => {
                session
                    .resize_display(*width, *height)
                    .map_err(|e| format!("step {}: {}", step, e))?;
                None
            }
        };

        let Some(event) = pending else { continue };
        let result = session
            .handle_pointer(event)
            .map_err(|e| format!("step {}: {}", step, e))?;
        if verbose {
            println!("  [{:>3}] {:?} → {:?}", step, event.phase, result);
        }
        match result {
            GestureOutcome::StrokeCommitted => report.strokes += 1,
            GestureOutcome::Filled(n) if n > 0 => report.fills += 1,
            GestureOutcome::Ignored => report.ignored += 1,
            GestureOutcome::Suppressed => report.suppressed += 1,
            _ => {}
        }
    }

    // A script that ends mid-stroke still keeps what it drew
    if session.finish_gesture() == GestureOutcome::StrokeCommitted {
        report.strokes += 1;
    }
    Ok(report)
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all scripts succeeded, `1` = one or more failed.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch replay.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let settings_path = args.settings.clone().or_else(EngineSettings::settings_path);
    let settings = match settings_path {
        Some(path) => match EngineSettings::load_or_default(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: could not load settings '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => EngineSettings::default(),
    };

    let background = match &args.background {
        Some(path) => match io::load_image_file(path) {
            Ok(img) => Some(img),
            Err(e) => {
                eprintln!("error: could not load background '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!(
            "error: could not create output directory '{}': {}",
            dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        let output_path = if args.output.is_none() && args.output_dir.is_none() && args.data_url {
            None
        } else {
            match build_output_path(input_path, args.output.as_deref(), args.output_dir.as_deref()) {
                Some(p) => Some(p),
                None => {
                    eprintln!(
                        "  error: cannot determine output path for '{}'.",
                        input_path.display()
                    );
                    any_failure = true;
                    continue;
                }
            }
        };

        match run_one(
            input_path,
            output_path.as_deref(),
            &args,
            &settings,
            background.as_ref(),
        ) {
            Ok(report) => {
                if args.verbose || multi {
                    println!(
                        "  {} strokes, {} fills, {} undo, {} redo, {} suppressed ({:.0}ms)",
                        report.strokes,
                        report.fills,
                        report.undos,
                        report.redos,
                        report.suppressed,
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                    if let Some(out) = &output_path {
                        println!("  → {}", out.display());
                    }
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                log_warn!("Replay of {} failed: {}", input_path.display(), e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    input: &Path,
    output: Option<&Path>,
    args: &CliArgs,
    settings: &EngineSettings,
    background: Option<&image::RgbaImage>,
) -> Result<ReplayReport, String> {
    // -- Step 1: Load ----------------------------------------------------
    let text = std::fs::read_to_string(input).map_err(|e| format!("read failed: {}", e))?;
    let script = parse_script(&text)?;

    // -- Step 2: Replay --------------------------------------------------
    let mut session = EditorSession::new(args.width, args.height, settings.clone())
        .map_err(|e| format!("mount failed: {}", e))?;
    if let Some(img) = background {
        session.load_image(img);
    }
    let report = replay(
        &mut session,
        &script,
        Duration::from_millis(args.frame_ms),
        args.verbose,
    )?;
    log_info!("Replayed {} ({} actions): {:?}", input.display(), script.len(), report);

    // -- Step 3: Export --------------------------------------------------
    let exported = session
        .current_image()
        .map_err(|e| format!("export failed: {}", e))?;
    if let Some(out) = output {
        exported
            .write_to(out)
            .map_err(|e| format!("save failed: {}", e))?;
    }
    if args.data_url {
        println!("{}", exported.to_data_url());
    }

    Ok(report)
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
/// A script named both literally and through a pattern is replayed once, in
/// the position it was first named.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Compute the output path for a single script.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from script stem)
/// 3. Fallback: next to the script, same stem, `.png`
fn build_output_path(input: &Path, output: Option<&Path>, output_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.png", stem)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    Some(parent.join(format!("{}.png", stem)))
}
