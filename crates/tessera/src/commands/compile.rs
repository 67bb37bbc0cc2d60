//! Compile command - turn template files into render functions

use clap::{Args, ValueEnum};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tessera::config::{load_config, load_config_file};
use tessera::{CodegenMode, CompileOutput, CompilerError, DomCompilerOptions, SourceMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Output compiled JavaScript
    #[default]
    Js,
    /// Output JSON with code, source map and diagnostics
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// `return function render` with runtime helpers read from a global
    Function,
    /// ES module with `import` / `export`
    Module,
}

impl From<Mode> for CodegenMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Function => CodegenMode::Function,
            Mode::Module => CodegenMode::Module,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct CompileArgs {
    /// Template files, directories (searched for `**/*.html`) or glob patterns
    #[arg(required = true)]
    pub patterns: Vec<String>,

    /// Generate a server render function
    #[arg(long)]
    pub ssr: bool,

    /// Output shape (default: function, or the config file's value)
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Hoist static nodes and props out of the render function
    #[arg(long)]
    pub hoist_static: bool,

    /// Rewrite template identifiers to `_ctx.x`
    #[arg(long)]
    pub prefix_identifiers: bool,

    /// Cache inline event handlers
    #[arg(long)]
    pub cache_handlers: bool,

    /// Scope id attribute for scoped styles (module mode only)
    #[arg(long)]
    pub scope_id: Option<String>,

    /// Generate a source map
    #[arg(long)]
    pub source_map: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "js")]
    pub format: OutputFormat,

    /// Write one output file per template into this directory instead of stdout
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Config file (default: ./tessera.config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of threads (default: number of CPUs)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,
}

/// Result of compiling one file
struct FileResult {
    path: PathBuf,
    output: Result<CompileOutput, String>,
}

impl FileResult {
    fn has_errors(&self) -> bool {
        match &self.output {
            Ok(output) => !output.errors.is_empty(),
            Err(_) => true,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    filename: String,
    code: &'a str,
    preamble: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    map: Option<&'a SourceMap>,
    errors: &'a [CompilerError],
    warnings: &'a [CompilerError],
}

pub fn run(args: CompileArgs) -> ExitCode {
    let start = Instant::now();

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
            tracing::warn!("failed to configure thread pool: {}", e);
        }
    }

    let config = match &args.config {
        Some(path) => load_config_file(path),
        None => load_config(None),
    };
    let options = resolve_options(&args, config.compiler);

    let files = match collect_files(&args.patterns) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if files.is_empty() {
        eprintln!("No template files found matching the patterns");
        return ExitCode::FAILURE;
    }

    tracing::debug!(files = files.len(), threads = rayon::current_num_threads(), "compiling");

    let results: Vec<FileResult> = files
        .par_iter()
        .map(|path| FileResult {
            path: path.clone(),
            output: compile_file(path, &options),
        })
        .collect();

    for result in &results {
        report_diagnostics(result);
    }

    let written = match &args.out_dir {
        Some(dir) => write_outputs(dir, &results, args.format),
        None => print_outputs(&results, args.format),
    };

    let failed = results.iter().filter(|r| r.has_errors()).count();
    let success = results.len() - failed;
    let elapsed = start.elapsed().as_secs_f64();

    if failed > 0 {
        eprintln!("✗ {} file(s) failed, {} compiled in {:.4}s", failed, success, elapsed);
    } else {
        let file_word = if success == 1 { "file" } else { "files" };
        eprintln!("✓ {} {} compiled in {:.4}s", success, file_word, elapsed);
    }

    if failed > 0 || written.is_err() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Config file values with command-line flags applied on top.
fn resolve_options(args: &CompileArgs, mut options: DomCompilerOptions) -> DomCompilerOptions {
    options.ssr |= args.ssr;
    options.hoist_static |= args.hoist_static;
    options.prefix_identifiers |= args.prefix_identifiers;
    options.cache_handlers |= args.cache_handlers;
    options.source_map |= args.source_map;
    if let Some(mode) = args.mode {
        options.mode = mode.into();
    }
    if let Some(scope_id) = &args.scope_id {
        options.scope_id = Some(scope_id.as_str().into());
    }
    options
}

fn collect_files(patterns: &[String]) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();

    for pattern in patterns {
        let pattern = if Path::new(pattern).is_dir() {
            format!("{}/**/*.html", pattern.trim_end_matches('/'))
        } else {
            pattern.clone()
        };

        let entries = glob::glob(&pattern).map_err(|e| format!("invalid pattern `{}`: {}", pattern, e))?;
        let before = files.len();
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!("skipping {}: {}", e.path().display(), e),
            }
        }
        if files.len() == before {
            tracing::warn!("no files match `{}`", pattern);
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn compile_file(path: &Path, options: &DomCompilerOptions) -> Result<CompileOutput, String> {
    let source = fs::read_to_string(path).map_err(|e| format!("failed to read file: {}", e))?;

    let mut options = options.clone();
    options.filename = path.to_string_lossy().as_ref().into();

    tessera::compile(&source, &options).map_err(|e| e.to_string())
}

/// `path:line:column: error[code]: message`
fn format_diagnostic(path: &Path, severity: &str, error: &CompilerError) -> String {
    match &error.loc {
        Some(loc) => format!(
            "{}:{}:{}: {}[{}]: {}",
            path.display(),
            loc.start.line,
            loc.start.column,
            severity,
            error.code,
            error.message
        ),
        None => format!("{}: {}[{}]: {}", path.display(), severity, error.code, error.message),
    }
}

fn report_diagnostics(result: &FileResult) {
    match &result.output {
        Ok(output) => {
            for error in &output.errors {
                eprintln!("{}", format_diagnostic(&result.path, "error", error));
            }
            for warning in &output.warnings {
                eprintln!("{}", format_diagnostic(&result.path, "warning", warning));
            }
        }
        Err(e) => eprintln!("{}: error: {}", result.path.display(), e),
    }
}

fn json_output<'a>(path: &Path, output: &'a CompileOutput) -> JsonOutput<'a> {
    JsonOutput {
        filename: path.display().to_string(),
        code: &output.code,
        preamble: &output.preamble,
        map: output.map.as_ref(),
        errors: &output.errors,
        warnings: &output.warnings,
    }
}

fn print_outputs(results: &[FileResult], format: OutputFormat) -> Result<(), ()> {
    let compiled: Vec<(&Path, &CompileOutput)> = results
        .iter()
        .filter_map(|r| r.output.as_ref().ok().map(|o| (r.path.as_path(), o)))
        .collect();

    match format {
        OutputFormat::Js => {
            let many = compiled.len() > 1;
            for (path, output) in compiled {
                if many {
                    println!("// {}", path.display());
                }
                println!("{}", output.code);
            }
            Ok(())
        }
        OutputFormat::Json => {
            let outputs: Vec<JsonOutput> = compiled.into_iter().map(|(p, o)| json_output(p, o)).collect();
            match serde_json::to_string_pretty(&outputs) {
                Ok(json) => {
                    println!("{}", json);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("error: failed to serialize output: {}", e);
                    Err(())
                }
            }
        }
    }
}

/// Output file name: the template's file stem with `.js` or `.json`.
fn output_path(dir: &Path, path: &Path, format: OutputFormat) -> PathBuf {
    let ext = match format {
        OutputFormat::Js => "js",
        OutputFormat::Json => "json",
    };
    let filename = path
        .file_name()
        .map(|f| PathBuf::from(f).with_extension(ext))
        .unwrap_or_else(|| PathBuf::from("output").with_extension(ext));
    dir.join(filename)
}

fn write_outputs(dir: &Path, results: &[FileResult], format: OutputFormat) -> Result<(), ()> {
    if let Err(e) = fs::create_dir_all(dir) {
        eprintln!("error: failed to create {}: {}", dir.display(), e);
        return Err(());
    }

    let mut status = Ok(());
    for result in results {
        let Ok(output) = &result.output else {
            continue;
        };
        let out_path = output_path(dir, &result.path, format);

        let content = match format {
            OutputFormat::Js => output.code.clone(),
            OutputFormat::Json => match serde_json::to_string_pretty(&json_output(&result.path, output)) {
                Ok(json) => json,
                Err(e) => {
                    eprintln!("error: failed to serialize {}: {}", result.path.display(), e);
                    status = Err(());
                    continue;
                }
            },
        };

        if let Err(e) = fs::write(&out_path, content) {
            eprintln!("Failed to write {}: {}", out_path.display(), e);
            status = Err(());
            continue;
        }

        if format == OutputFormat::Js {
            if let Some(map) = &output.map {
                let map_path = out_path.with_extension("js.map");
                let written = map
                    .to_json()
                    .map_err(|e| e.to_string())
                    .and_then(|json| fs::write(&map_path, json).map_err(|e| e.to_string()));
                if let Err(e) = written {
                    eprintln!("Failed to write {}: {}", map_path.display(), e);
                    status = Err(());
                }
            }
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: CompileArgs,
    }

    fn parse(argv: &[&str]) -> CompileArgs {
        let mut full = vec!["tessera"];
        full.extend_from_slice(argv);
        TestCli::parse_from(full).args
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tessera-cli-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn flags_override_config() {
        let args = parse(&["a.html", "--ssr", "--mode", "module", "--scope-id", "data-v-1"]);
        let base = DomCompilerOptions {
            hoist_static: true,
            ..Default::default()
        };
        let options = resolve_options(&args, base);
        assert!(options.ssr);
        assert!(options.hoist_static);
        assert_eq!(options.mode, CodegenMode::Module);
        assert_eq!(options.scope_id.as_deref(), Some("data-v-1"));
    }

    #[test]
    fn config_mode_survives_without_flag() {
        let args = parse(&["a.html"]);
        let base = DomCompilerOptions {
            mode: CodegenMode::Module,
            ..Default::default()
        };
        assert_eq!(resolve_options(&args, base).mode, CodegenMode::Module);
        assert_eq!(args.format, OutputFormat::Js);
    }

    #[test]
    fn patterns_are_required() {
        let mut full = vec!["tessera"];
        full.push("--ssr");
        assert!(TestCli::try_parse_from(full).is_err());
    }

    #[test]
    fn directories_expand_to_html_files() {
        let dir = scratch_dir("collect");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("a.html"), "<div/>").unwrap();
        fs::write(dir.join("nested/b.html"), "<p/>").unwrap();
        fs::write(dir.join("notes.txt"), "x").unwrap();

        let files = collect_files(&[dir.display().to_string()]).unwrap();
        assert_eq!(files, vec![dir.join("a.html"), dir.join("nested/b.html")]);

        let glob = format!("{}/*.txt", dir.display());
        assert_eq!(collect_files(&[glob]).unwrap(), vec![dir.join("notes.txt")]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn invalid_glob_is_an_error() {
        assert!(collect_files(&["[".to_string()]).is_err());
    }

    #[test]
    fn diagnostic_has_code_and_location() {
        let output = tessera::compile("<div v-if></div>", &DomCompilerOptions::default()).unwrap();
        let error = &output.errors[0];
        let line = format_diagnostic(Path::new("a.html"), "error", error);
        assert!(line.starts_with("a.html:1:"), "{}", line);
        assert!(line.contains("error[28]: v-if/v-else-if is missing expression."), "{}", line);
    }

    #[test]
    fn compile_file_reports_errors() {
        let dir = scratch_dir("errors");
        let good = dir.join("good.html");
        let bad = dir.join("bad.html");
        fs::write(&good, "<div>{{ msg }}</div>").unwrap();
        fs::write(&bad, "<div v-for></div>").unwrap();

        let options = DomCompilerOptions::default();
        let good = FileResult {
            output: compile_file(&good, &options),
            path: good,
        };
        let bad = FileResult {
            output: compile_file(&bad, &options),
            path: bad,
        };
        assert!(!good.has_errors());
        assert!(bad.has_errors());

        let missing = FileResult {
            output: compile_file(&dir.join("missing.html"), &options),
            path: dir.join("missing.html"),
        };
        assert!(missing.has_errors());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn writes_js_and_source_map() {
        let dir = scratch_dir("write");
        let template = dir.join("card.html");
        fs::write(&template, "<div>{{ msg }}</div>").unwrap();
        let options = DomCompilerOptions {
            source_map: true,
            ..Default::default()
        };
        let results = vec![FileResult {
            output: compile_file(&template, &options),
            path: template,
        }];

        let out = dir.join("dist");
        write_outputs(&out, &results, OutputFormat::Js).unwrap();
        let code = fs::read_to_string(out.join("card.js")).unwrap();
        assert!(code.contains("function render("), "{}", code);
        let map = fs::read_to_string(out.join("card.js.map")).unwrap();
        assert!(map.contains("\"version\":3"), "{}", map);

        write_outputs(&out, &results, OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(out.join("card.json")).unwrap()).unwrap();
        assert!(json["code"].as_str().unwrap().contains("_toDisplayString"));
        assert_eq!(json["errors"].as_array().unwrap().len(), 0);
        assert!(json["map"].is_object());
        fs::remove_dir_all(&dir).unwrap();
    }
}
