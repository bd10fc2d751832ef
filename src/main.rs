use anyhow::{Context, bail};
use clap::{ArgAction, Parser, Subcommand};

mod descriptor;
mod diagnostics;
mod model;
mod render;
mod spec;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "atlas-sprites")]
#[command(about = "Sprite atlas descriptor toolkit", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate descriptors, printing a summary per file.
    Check {
        #[arg(required = true)]
        descriptors: Vec<String>,
    },

    /// Write the normalized manifest of a descriptor as JSON.
    Export {
        path: String,

        /// Only include this sprite.
        #[arg(long)]
        sprite: Option<String>,

        /// Output file (stdout if omitted).
        #[arg(short = 'o', long)]
        out: Option<String>,
    },

    /// Print a descriptor in canonical text form.
    Fmt {
        path: String,

        /// Print the JSON descriptor form instead.
        #[arg(long, conflicts_with_all = ["write", "check"])]
        json: bool,

        /// Rewrite the file in place.
        #[arg(long, conflicts_with = "check")]
        write: bool,

        /// Fail if the file is not already in canonical form.
        #[arg(long)]
        check: bool,
    },

    /// Generate an HTML preview of one or more descriptors.
    Report {
        #[arg(required = true)]
        descriptors: Vec<String>,

        #[arg(short = 'o', long)]
        out: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.cmd {
        Commands::Check { descriptors } => {
            for path in &descriptors {
                let atlas = descriptor::load_descriptor(path)?;
                // Run the manifest pass too so shared-cell warnings surface here.
                model::build_manifest(path, &atlas);
                println!(
                    "ok {}: {}, grid {}x{}, scale {}, {} sprites, {} seeds",
                    path,
                    atlas.image,
                    atlas.grid.rows,
                    atlas.grid.cols,
                    atlas.scale,
                    atlas.sprites.len(),
                    atlas.seed_count()
                );
            }
        }

        Commands::Export { path, sprite, out } => {
            let atlas = descriptor::load_descriptor(&path)?;
            let manifest = match &sprite {
                Some(name) => model::build_sprite_manifest(&path, &atlas, name)?,
                None => model::build_manifest(&path, &atlas),
            };
            let json = serde_json::to_string_pretty(&manifest)?;
            match out {
                Some(out) => {
                    write_output(&out, &(json + "\n"), "manifest")?;
                    println!("Wrote {}", out);
                }
                None => println!("{}", json),
            }
        }

        Commands::Fmt {
            path,
            json,
            write,
            check,
        } => {
            let text = std::fs::read_to_string(&path).with_context(|| {
                diagnostics::error_message(format!("read descriptor file {}", path))
            })?;
            let atlas = descriptor::from_source(&text, &path)?;

            if json {
                let raw = spec::RawAtlas::from(&atlas);
                println!("{}", serde_json::to_string_pretty(&raw)?);
                return Ok(());
            }

            let canonical = descriptor::to_source(&atlas)?;
            if check {
                if descriptor::is_json(&path) || canonical != text {
                    bail!(
                        "{}",
                        diagnostics::error_message(format!(
                            "{} is not in canonical form",
                            path
                        ))
                    );
                }
                println!("{} is formatted", path);
            } else if write {
                if descriptor::is_json(&path) {
                    bail!(
                        "{}",
                        diagnostics::error_message(format!(
                            "refusing to rewrite JSON descriptor {} as text",
                            path
                        ))
                    );
                }
                if canonical != text {
                    write_output(&path, &canonical, "descriptor file")?;
                    println!("Wrote {}", path);
                } else {
                    log::info!("{} already formatted", path);
                }
            } else {
                print!("{}", canonical);
            }
        }

        Commands::Report { descriptors, out } => {
            let mut manifests = Vec::with_capacity(descriptors.len());
            for path in &descriptors {
                let atlas = descriptor::load_descriptor(path)?;
                manifests.push(model::build_manifest(path, &atlas));
            }

            let html = render::render_html_report(&manifests)?;
            write_output(&out, &html, "report")?;
            println!("Wrote {}", out);
        }
    }

    Ok(())
}

fn write_output(path: &str, contents: &str, what: &str) -> Result<()> {
    std::fs::write(path, contents)
        .with_context(|| diagnostics::error_message(format!("write {} {}", what, path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn write_failure_names_the_output() {
        let out = std::env::temp_dir()
            .join("atlas-sprites-missing-dir")
            .join("report.html");
        let out = out.to_string_lossy().into_owned();

        let err = write_output(&out, "<html></html>", "report").unwrap_err();
        assert_eq!(err.to_string(), format!("error: write report {}", out));
        assert!(err.chain().count() > 1);
    }
}
