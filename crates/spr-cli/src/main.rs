//! `spr` - drive registration builds from manifests and inspect artifacts

mod manifest;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use manifest::Manifest;
use spr_core::{BuildSession, EngineConfig, Pass};
use spr_model::{codec, CollectingSink, DiagnosticsSink, FanoutSink, TracingSink};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("spr")
        .version(spr_core::VERSION)
        .about("Service provider registration - aggregate registry artifacts across build passes")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("build")
                .about("Run every pass of a manifest and write the registry artifacts")
                .arg(
                    Arg::new("manifest")
                        .long("manifest")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON manifest of declarations and passes"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML engine configuration"),
                )
                .arg(
                    Arg::new("source-root")
                        .long("source-root")
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory probed for hand-authored artifacts (repeatable)"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Output root, overriding the configuration"),
                )
                .arg(
                    Arg::new("depinfo")
                        .long("depinfo")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory receiving .deps provenance files"),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Print the entries of a registry artifact in order")
                .arg(
                    Arg::new("artifact")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Artifact file"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let result = match matches.subcommand() {
        Some(("build", args)) => build(args),
        Some(("inspect", args)) => inspect(args).map(|()| true),
        _ => Ok(true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn build_config(args: &ArgMatches) -> Result<EngineConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::load_from(path)?,
        None => EngineConfig::default(),
    };
    if let Some(roots) = args.get_many::<PathBuf>("source-root") {
        config = roots.fold(config, |config, root| config.with_source_root(root));
    }
    if let Some(output) = args.get_one::<PathBuf>("output") {
        config = config.with_output_root(output);
    }
    if let Some(depinfo) = args.get_one::<PathBuf>("depinfo") {
        config = config.with_depinfo_root(depinfo);
    }
    Ok(config)
}

/// Returns `false` if any error diagnostic was reported
fn build(args: &ArgMatches) -> Result<bool> {
    let manifest_path = args
        .get_one::<PathBuf>("manifest")
        .context("--manifest is required")?;
    let passes = Manifest::load(manifest_path)?.passes()?;
    let config = build_config(args)?;

    let collected = Arc::new(CollectingSink::new());
    let sink: Arc<dyn DiagnosticsSink> = Arc::new(
        FanoutSink::new()
            .with(Arc::new(TracingSink))
            .with(collected.clone()),
    );

    let session = BuildSession::from_config(&config, sink)?;
    let channel = session.open_channel();

    let (mut accepted, mut rejected, mut failed, mut skipped_passes) = (0, 0, 0, 0);
    for pass in &passes {
        let report = session.process(channel, pass)?;
        if !report.handled {
            skipped_passes += 1;
        }
        accepted += report.accepted;
        rejected += report.rejected;
        failed += report.failed;
    }
    let terminal = session.process(channel, &Pass::terminal())?;
    let mut reports: Vec<_> = terminal.finalized.into_iter().collect();
    reports.extend(session.finish());

    println!("Build summary:");
    println!("  Passes: {} ({} skipped)", passes.len(), skipped_passes);
    println!("  Registrations: {accepted} accepted, {rejected} rejected, {failed} failed");
    for report in &reports {
        for path in &report.written {
            println!("  wrote {}", config.store.output_root.join(path.to_string()).display());
        }
        for path in &report.skipped {
            println!("  skipped {path}");
        }
        for path in &report.failed {
            println!("  failed {path}");
        }
    }

    let errors = collected.error_count();
    println!("  Errors: {errors}");
    Ok(errors == 0)
}

fn inspect(args: &ArgMatches) -> Result<()> {
    let path = args
        .get_one::<PathBuf>("artifact")
        .context("artifact path is required")?;
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let entries = codec::parse(&text).with_context(|| format!("malformed artifact {}", path.display()))?;

    if args.get_flag("json") {
        let listing: Vec<_> = entries
            .sorted()
            .into_iter()
            .map(|entry| {
                serde_json::json!({
                    "id": entry.id(),
                    "position": entry.position().rank(),
                    "supersedes": entry.supersedes(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    for entry in entries.sorted() {
        let mut line = format!("{}\t{}", entry.id(), entry.position());
        if !entry.supersedes().is_empty() {
            let victims: Vec<_> = entry.supersedes().iter().map(ToString::to_string).collect();
            line.push_str(&format!("\tsupersedes {}", victims.join(",")));
        }
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    const MANIFEST: &str = r#"{
        "declarations": [
            { "id": "org.acme.Fast", "visibility": "public", "assignable_to": ["org.acme.Codec"] },
            { "id": "org.acme.Slow", "visibility": "public", "assignable_to": ["org.acme.Codec"] },
            { "id": "org.acme.Hidden", "assignable_to": ["org.acme.Codec"] }
        ],
        "passes": [
            { "requests": [ { "implementation": "org.acme.Slow", "capability": "org.acme.Codec" } ] },
            { "requests": [
                { "implementation": "org.acme.Fast", "capability": "org.acme.Codec", "position": 1 }
            ] }
        ]
    }"#;

    #[test]
    fn cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn build_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("manifest.json");
        fs::write(&manifest, MANIFEST).unwrap();
        let out = dir.path().join("out");

        let matches = cli().get_matches_from([
            "spr",
            "build",
            "--manifest",
            manifest.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ]);
        let (_, args) = matches.subcommand().unwrap();
        assert!(build(args).unwrap());

        assert_eq!(
            fs::read_to_string(out.join("META-INF/services/org.acme.Codec")).unwrap(),
            "org.acme.Fast\n#position=1\norg.acme.Slow\n"
        );
    }

    #[test]
    fn build_fails_on_rejected_registration() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("manifest.json");
        fs::write(
            &manifest,
            MANIFEST.replace("\"implementation\": \"org.acme.Slow\"", "\"implementation\": \"org.acme.Hidden\""),
        )
        .unwrap();
        let out = dir.path().join("out");

        let matches = cli().get_matches_from([
            "spr",
            "build",
            "--manifest",
            manifest.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ]);
        let (_, args) = matches.subcommand().unwrap();
        assert!(!build(args).unwrap());
    }

    #[test]
    fn config_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("spr.toml");
        fs::write(&config, "[layout]\nservices_dir = \"registry\"\n").unwrap();

        let matches = cli().get_matches_from([
            "spr",
            "build",
            "--manifest",
            "m.json",
            "--config",
            config.to_str().unwrap(),
            "--source-root",
            "a",
            "--source-root",
            "b",
            "--depinfo",
            "deps",
        ]);
        let (_, args) = matches.subcommand().unwrap();
        let config = build_config(args).unwrap();

        assert_eq!(config.layout.services_dir, "registry");
        assert_eq!(config.store.source_roots, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(config.store.depinfo_root, Some(PathBuf::from("deps")));
    }

    #[test]
    fn inspect_reads_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("org.acme.Codec");
        fs::write(&artifact, "org.acme.Slow\norg.acme.Fast\n#position=1\n#-org.acme.Old\n").unwrap();

        let matches = cli().get_matches_from(["spr", "inspect", artifact.to_str().unwrap(), "--json"]);
        let (_, args) = matches.subcommand().unwrap();
        assert!(inspect(args).is_ok());

        fs::write(&artifact, "#-org.acme.Old\n").unwrap();
        let matches = cli().get_matches_from(["spr", "inspect", artifact.to_str().unwrap()]);
        let (_, args) = matches.subcommand().unwrap();
        assert!(inspect(args).is_err());
    }
}
