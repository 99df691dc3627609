//! thesisdoc CLI - compile thesis markup to Word documents

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};
#[cfg(feature = "cli")]
use thesisdoc::{
    core::math::DvipngRasterizer,
    diagnostics::{check_markup, format_diagnostics},
    export_docx, CompileOptions, CompileWarning, Project, StdFileResolver,
};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "thesisdoc")]
#[command(version)]
#[command(about = "thesisdoc - Thesis markup to Word (DOCX) compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Compile a project (.json) or a markup file to .docx
    Build {
        /// Project JSON or plain markup file
        input: PathBuf,

        /// Output path (defaults to the input with a .docx extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Settings file (.json or .toml) applied over the project's settings
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Chapter prefix text, e.g. "CHƯƠNG" or "CHAPTER"
        #[arg(long)]
        chapter_prefix: Option<String>,

        /// Do not number headings
        #[arg(long)]
        no_numbering: bool,

        /// Number sub-headings without the chapter counter
        #[arg(long)]
        flat_numbering: bool,

        /// Put the chapter number and title on separate lines
        #[arg(long)]
        split_chapter: bool,

        /// Skip native equations (every equation becomes an image)
        #[arg(long)]
        no_native_math: bool,

        /// Never call the external TeX rasterizer
        #[arg(long)]
        no_raster_math: bool,

        /// Leave out the table of contents and the lists
        #[arg(long)]
        no_front_matter: bool,

        /// Strict mode: exit with error if any warnings occur
        #[arg(long)]
        strict: bool,

        /// Quiet mode: suppress warning output to stderr
        #[arg(short, long)]
        quiet: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Report markup problems without compiling
    Check {
        /// Project JSON or plain markup file
        input: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Show version and back-end availability
    Info,
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            settings,
            chapter_prefix,
            no_numbering,
            flat_numbering,
            split_chapter,
            no_native_math,
            no_raster_math,
            no_front_matter,
            strict,
            quiet,
            no_color,
        } => {
            let loaded = match Project::load(&input) {
                Ok(loaded) => loaded,
                Err(e) => fail(&format!("Error: {}", e)),
            };
            let mut warnings = loaded.warnings;
            let mut project = loaded.content;

            if let Some(ref path) = settings {
                match project.settings.overlay_file(path) {
                    Ok((merged, dropped)) => {
                        project.settings = merged;
                        warnings.extend(dropped.iter().map(|key| {
                            CompileWarning::new(format!(
                                "ignored unknown settings key '{}' in {}",
                                key,
                                path.display()
                            ))
                        }));
                    }
                    Err(e) => fail(&format!("Error: {}", e)),
                }
            }

            let s = &mut project.settings;
            if let Some(prefix) = chapter_prefix {
                s.h1_prefix = prefix;
            }
            if no_numbering {
                s.auto_numbering = false;
            }
            if flat_numbering {
                s.hierarchical_numbering = false;
            }
            if split_chapter {
                s.h1_split = true;
            }

            let options = CompileOptions {
                native_math: !no_native_math,
                raster_math: !no_raster_math,
                front_matter: !no_front_matter,
                ..CompileOptions::default()
            };

            let files = StdFileResolver::with_base_dir(project_dir(&input));
            let out_path = output.unwrap_or_else(|| input.with_extension("docx"));
            let report = export_docx(&project, &options, &files, &out_path);
            warnings.extend(report.warnings);

            if !quiet && !warnings.is_empty() {
                print_warnings_to_stderr(&warnings, !no_color);
            }

            if !report.success {
                fail(&format!("✗ {}", report.message));
            }

            if strict && !warnings.is_empty() {
                fail(&format!(
                    "Error: {} warning(s) in strict mode",
                    warnings.len()
                ));
            }

            if warnings.is_empty() {
                eprintln!("✓ {}", report.message);
            } else {
                eprintln!("⚠ {} ({} warning(s))", report.message, warnings.len());
            }
        }

        Commands::Check { input, no_color } => {
            let project = match Project::load(&input) {
                Ok(loaded) => loaded.content,
                Err(e) => fail(&format!("Error: {}", e)),
            };
            let files = StdFileResolver::with_base_dir(project_dir(&input));
            let result = check_markup(&project, &files);
            println!("{}", format_diagnostics(&result, !no_color));

            if result.has_errors() {
                std::process::exit(1);
            }
        }

        Commands::Info => {
            println!("thesisdoc - Thesis markup to Word (DOCX) compiler");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Equation back-ends:");
            println!("  ✓ Native OMML (built in)");
            if DvipngRasterizer::is_available() {
                println!("  ✓ Image fallback (latex + dvipng found)");
            } else {
                println!("  ✗ Image fallback (latex + dvipng not found on PATH)");
            }
            println!("  ✓ Placeholder text");
            println!();
        }
    }
}

/// Directory figure paths in the project are relative to
#[cfg(feature = "cli")]
fn project_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(feature = "cli")]
fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

/// Print warnings to stderr with optional color coding
#[cfg(feature = "cli")]
fn print_warnings_to_stderr(warnings: &[CompileWarning], use_color: bool) {
    let (yellow, reset) = if use_color {
        ("\x1b[33m", "\x1b[0m")
    } else {
        ("", "")
    };

    eprintln!();
    eprintln!("{}Warnings ({}):{}", yellow, warnings.len(), reset);
    eprintln!();
    for warning in warnings {
        match warning.line {
            Some(line) => eprintln!("  {}[line {}]{} {}", yellow, line, reset, warning.message),
            None => eprintln!("  {}[project]{} {}", yellow, reset, warning.message),
        }
    }
    eprintln!();
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install thesisdoc --features cli");
    eprintln!("  thesisdoc build <INPUT> [-o OUTPUT]");
}
