//! RTM command line
//!
//! Subcommands:
//! - `suites`: list suite identifiers
//! - `list <SUITE> [--json]`: print the cases of a suite
//! - `materialize <SUITE> --out DIR`: write each case's input plus `manifest.json`
//! - `sweep <KIND> --out DIR [--template FILE] [--computed-min-patch-size]`:
//!   write a convergence sweep
//! - `fingerprint <SUITE>`: print the suite's Blake3 fingerprint
//!
//! The suite may be omitted and taken from `WHICH_TESTS` or `rtm.toml`.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use rtm_document::{Document, Fingerprint};
use rtm_registry::catalog::{self, COMPONENT};
use rtm_registry::{CaseSummary, ManifestConfig, SuiteRegistry, Sweep, SweepKind, TemplateDir};
use serde::Serialize;

/// Name of the runner manifest written by `materialize`
pub const MANIFEST_FILE: &str = "manifest.json";

fn suite_arg() -> Arg {
    Arg::new("suite")
        .value_name("SUITE")
        .help("Suite identifier (default: $WHICH_TESTS, then rtm.toml)")
}

fn out_arg() -> Arg {
    Arg::new("out")
        .long("out")
        .short('o')
        .value_name("DIR")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Output directory (created if missing)")
}

/// Build the command-line interface
#[must_use]
pub fn command() -> Command {
    Command::new("rtm")
        .version(rtm_registry::VERSION)
        .about("Regression test manifest: derive, list and materialize test inputs")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("inputs")
                .long("inputs")
                .global(true)
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Inputs root holding one directory per component (default: $RTM_INPUTS_DIR)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default: ./rtm.toml if present)"),
        )
        .subcommand(Command::new("suites").about("List suite identifiers"))
        .subcommand(
            Command::new("list")
                .about("List the cases of a suite")
                .arg(suite_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("materialize")
                .about("Write every case input of a suite and a runner manifest")
                .arg(suite_arg())
                .arg(out_arg()),
        )
        .subcommand(
            Command::new("sweep")
                .about("Write a convergence-study sweep")
                .arg(
                    Arg::new("kind")
                        .value_name("KIND")
                        .required(true)
                        .value_parser(["be-struct-2d", "cn-sstruct-3d"])
                        .help("Sweep to generate"),
                )
                .arg(out_arg())
                .arg(
                    Arg::new("template")
                        .long("template")
                        .value_name("FILE")
                        .value_parser(value_parser!(PathBuf))
                        .help("Base template (default: the shipped one)"),
                )
                .arg(
                    Arg::new("computed-min-patch-size")
                        .long("computed-min-patch-size")
                        .action(ArgAction::SetTrue)
                        .help("Set the 2D regridder min_patch_size from the coarse patch size"),
                ),
        )
        .subcommand(
            Command::new("fingerprint")
                .about("Print the Blake3 fingerprint of a suite")
                .arg(suite_arg()),
        )
}

/// Resolve configuration: flags over environment over file over defaults
///
/// # Errors
///
/// Fails if an explicit or discovered config file cannot be read.
pub fn resolve_config(matches: &ArgMatches) -> Result<ManifestConfig> {
    let file = matches.get_one::<PathBuf>("config").map(PathBuf::as_path);
    let mut config = ManifestConfig::load(file)?.with_env_overrides();

    if let Some(inputs) = matches.get_one::<PathBuf>("inputs") {
        config = config.with_inputs_root(inputs);
    }
    if let Some((_, sub)) = matches.subcommand() {
        if let Ok(Some(suite)) = sub.try_get_one::<String>("suite") {
            config = config.with_suite(suite);
        }
    }
    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

/// Build the registry for the configured component
///
/// # Errors
///
/// Fails if the component has no catalog or a template is unusable.
pub fn load_registry(config: &ManifestConfig) -> Result<SuiteRegistry> {
    if config.component != COMPONENT {
        bail!("no test catalog for component '{}'", config.component);
    }
    let templates = TemplateDir::new(config.component_dir());
    catalog::phasefield(&templates)
        .with_context(|| format!("building catalog from {}", config.component_dir().display()))
}

fn selected_suite(config: &ManifestConfig) -> Result<&str> {
    config
        .suite
        .as_deref()
        .context("no suite selected (pass SUITE or set WHICH_TESTS)")
}

/// Runner manifest written next to materialized inputs
#[derive(Debug, Serialize)]
struct Manifest<'a> {
    suite: &'a str,
    component: &'a str,
    fingerprint: Fingerprint,
    cases: Vec<CaseSummary>,
}

/// Dispatch parsed arguments, writing results to `out`
///
/// # Errors
///
/// Any configuration, catalog, lookup or IO failure.
pub fn run(matches: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let config = resolve_config(matches)?;

    match matches.subcommand() {
        Some(("suites", _)) => {
            let registry = load_registry(&config)?;
            for name in registry.names() {
                writeln!(out, "{name}")?;
            }
        }
        Some(("list", args)) => {
            let registry = load_registry(&config)?;
            let suite = registry.suite(selected_suite(&config)?)?;
            let cases: Vec<CaseSummary> = suite.iter().map(|c| c.summary()).collect();

            if args.get_flag("json") {
                serde_json::to_writer_pretty(&mut *out, &cases)?;
                writeln!(out)?;
            } else {
                for case in &cases {
                    writeln!(
                        out,
                        "{}\t{}\t{}\t{}",
                        case.name, case.processes, case.platform, case.flags
                    )?;
                }
            }
        }
        Some(("materialize", args)) => {
            let dir = required_path(args, "out")?;
            let registry = load_registry(&config)?;
            let name = selected_suite(&config)?;
            let suite = registry.suite(name)?;

            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            for case in suite.iter() {
                write_document(&dir.join(case.file_name()), case.document())?;
            }
            let manifest = Manifest {
                suite: name,
                component: &config.component,
                fingerprint: suite.fingerprint(),
                cases: suite.iter().map(|c| c.summary()).collect(),
            };
            let path = dir.join(MANIFEST_FILE);
            let json = serde_json::to_string_pretty(&manifest)?;
            std::fs::write(&path, json + "\n")
                .with_context(|| format!("writing {}", path.display()))?;

            tracing::info!(suite = name, cases = suite.len(), dir = %dir.display(), "materialized");
            writeln!(out, "wrote {} inputs to {}", suite.len(), dir.display())?;
        }
        Some(("sweep", args)) => {
            let dir = required_path(args, "out")?;
            let kind: SweepKind = args
                .get_one::<String>("kind")
                .context("missing sweep kind")?
                .parse()
                .map_err(anyhow::Error::msg)?;
            let sweep = match args.get_one::<PathBuf>("template") {
                Some(path) => {
                    let text = std::fs::read_to_string(path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    let base = Document::parse_xml(&text)
                        .with_context(|| format!("parsing {}", path.display()))?;
                    Sweep::new(kind, base)
                }
                None => Sweep::with_default_template(kind)?,
            }
            .with_computed_min_patch_size(args.get_flag("computed-min-patch-size"));

            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            let rendered = sweep.render_all()?;
            for (name, document) in &rendered {
                write_document(&dir.join(format!("{name}.ups")), document)?;
            }
            tracing::info!(sweep = %kind, inputs = rendered.len(), "sweep written");
            writeln!(out, "wrote {} inputs to {}", rendered.len(), dir.display())?;
        }
        Some(("fingerprint", _)) => {
            let registry = load_registry(&config)?;
            let suite = registry.suite(selected_suite(&config)?)?;
            writeln!(out, "{}", suite.fingerprint())?;
        }
        _ => bail!("no subcommand given"),
    }
    Ok(())
}

fn required_path<'a>(args: &'a ArgMatches, id: &str) -> Result<&'a Path> {
    args.get_one::<PathBuf>(id)
        .map(PathBuf::as_path)
        .with_context(|| format!("missing --{id}"))
}

fn write_document(path: &Path, document: &Document) -> Result<()> {
    std::fs::write(path, document.to_xml()).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn suite_from_argument() {
        let matches = command().get_matches_from(["rtm", "list", "HEATTEST", "--inputs", "/tmp/in"]);
        let config = resolve_config(&matches).unwrap();
        assert_eq!(config.suite.as_deref(), Some("HEATTEST"));
        assert_eq!(config.inputs_root, PathBuf::from("/tmp/in"));
    }

    #[test]
    fn sweep_kind_is_validated() {
        assert!(command()
            .try_get_matches_from(["rtm", "sweep", "ab-struct-2d", "--out", "x"])
            .is_err());
    }

    #[test]
    fn unknown_component_rejected() {
        let config = ManifestConfig::default().with_component("Arches");
        let err = load_registry(&config).unwrap_err();
        assert!(err.to_string().contains("Arches"));
    }
}
