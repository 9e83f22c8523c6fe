//! `mold` command line: run request chains from a workspace directory.
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (e.g. `RUST_LOG=request_mold=debug`).

use clap::{Parser, Subcommand};
use request_mold::config::{load_config_file, PipelineConfig};
use request_mold::executor::NativeClient;
use request_mold::loader::{FsLoader, MoldLoader};
use request_mold::models::{Mold, Response};
use request_mold::profile::{self, Profile, DEFAULT_PROFILE};
use request_mold::runner::{Runner, StepReport};
use request_mold::{chain, template};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "mold",
    version,
    about = "Build, chain and run HTTP requests defined as YAML, Starlark or Lua"
)]
struct Cli {
    /// Workspace directory holding the molds
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Configuration file (JSON or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a request together with every request it depends on
    Run {
        /// Name of the target request
        name: String,

        /// Profile to resolve variables from
        #[arg(short, long, default_value = DEFAULT_PROFILE)]
        profile: String,

        /// Extra variable, KEY=VALUE (repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,
    },

    /// Print the order in which a request's chain runs
    Chain {
        /// Name of the target request
        name: String,
    },

    /// Print the resolved variables of a profile
    Vars {
        /// Profile to resolve
        #[arg(short, long, default_value = DEFAULT_PROFILE)]
        profile: String,

        /// Extra variable, KEY=VALUE (repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,
    },

    /// List the requests in the workspace
    List,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => PipelineConfig::default(),
    };
    let loader = FsLoader::new(&config);
    let root = cli.root.as_path();

    match cli.command {
        Commands::Run {
            name,
            profile,
            vars,
        } => cmd_run(&loader, &config, root, &name, &profile, &vars),
        Commands::Chain { name } => cmd_chain(&loader, root, &name),
        Commands::Vars { profile, vars } => cmd_vars(&loader, root, &profile, &vars),
        Commands::List => cmd_list(&loader, root),
    }
}

fn find_target<'a>(molds: &'a [Mold], name: &str) -> Result<&'a Mold, Box<dyn Error>> {
    molds
        .iter()
        .find(|mold| mold.name == name)
        .ok_or_else(|| format!("no request named '{}'", name).into())
}

fn resolve_profile(
    loader: &FsLoader,
    root: &Path,
    name: &str,
    vars: &[String],
) -> Result<Profile, Box<dyn Error>> {
    let profiles = loader.read_profiles(root)?;
    Ok(profile::resolve_named(name, &profiles, vars)?)
}

fn cmd_run(
    loader: &FsLoader,
    config: &PipelineConfig,
    root: &Path,
    name: &str,
    profile_name: &str,
    vars: &[String],
) -> Result<(), Box<dyn Error>> {
    let molds = loader.read_all(root)?;
    let target = find_target(&molds, name)?;
    let profile = resolve_profile(loader, root, profile_name, vars)?;

    if let Some(url) = target.doc_url() {
        let missing: Vec<String> = template::placeholders(&template::apply_variables(
            url,
            &profile.variables,
        ));
        if !missing.is_empty() {
            log::warn!("unresolved variables in '{}': {}", target.name, missing.join(", "));
        }
    }

    let runner = Runner::new(NativeClient::new(config));
    let mut reports: Vec<StepReport> = Vec::new();
    let result = runner.run_target(target, &molds, Some(&profile), |report| {
        eprintln!(
            "[{}] {} -> {} ({} ms)",
            report.index + 1,
            report.name,
            report.status_code,
            report.duration.as_millis()
        );
        reports.push(report.clone());
    });

    // An aborted run still saves what the steps before the failure produced.
    let responses = match &result {
        Ok(responses) => responses.as_slice(),
        Err(err) => err.responses(),
    };
    for (report, response) in reports.iter().zip(responses) {
        if !response.is_success() {
            log::warn!("'{}' returned {}", report.name, response.status);
        }
    }
    for path in save_outputs(root, &reports, responses)? {
        eprintln!("saved {}", path.display());
    }

    let responses = result?;
    if let Some(last) = responses.last() {
        println!("{}", String::from_utf8_lossy(&last.body));
    }
    Ok(())
}

/// Writes the body of every step that names an output file, relative to
/// `root`. Returns the paths written.
fn save_outputs(
    root: &Path,
    reports: &[StepReport],
    responses: &[Response],
) -> std::io::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (report, response) in reports.iter().zip(responses) {
        if let Some(output) = &report.output {
            let path = root.join(output);
            fs::write(&path, &response.body)?;
            written.push(path);
        }
    }
    Ok(written)
}

fn cmd_chain(loader: &FsLoader, root: &Path, name: &str) -> Result<(), Box<dyn Error>> {
    let molds = loader.read_all(root)?;
    let target = find_target(&molds, name)?;
    for (index, mold) in chain::resolve(target, &molds)?.iter().enumerate() {
        println!("{}. {} ({})", index + 1, mold.name, mold.source.format_name());
    }
    Ok(())
}

fn cmd_vars(
    loader: &FsLoader,
    root: &Path,
    profile_name: &str,
    vars: &[String],
) -> Result<(), Box<dyn Error>> {
    let profile = resolve_profile(loader, root, profile_name, vars)?;
    for (key, value) in &profile.variables {
        println!("{}={}", key, value);
    }
    Ok(())
}

fn cmd_list(loader: &FsLoader, root: &Path) -> Result<(), Box<dyn Error>> {
    for mold in loader.read_all(root)? {
        let method = mold.doc_method().unwrap_or("-");
        let url = mold.doc_url().unwrap_or("-");
        match &mold.prev_req {
            Some(prev) => println!("{:<24} {:<7} {} (after {})", mold.name, method, url, prev),
            None => println!("{:<24} {:<7} {}", mold.name, method, url),
        }
    }
    Ok(())
}
