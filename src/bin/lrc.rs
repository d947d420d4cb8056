//! lrc - Label Reconcile CLI tool
//!
//! Runs the metadata bookkeeping operations on YAML/JSON resource files.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use label_reconcile::{
    record_managed_annotations, record_managed_labels, reconcile, retain_annotations,
    retain_finalizers, retain_labels, Object,
};

/// Label, annotation and finalizer bookkeeping for propagated resources.
#[derive(Debug, Parser)]
#[command(name = "lrc", version, about)]
struct Cli {
    /// Output location. Use '-' for stdout
    #[arg(short, long, default_value = "-", global = true)]
    output: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Yaml, global = true)]
    format: Format,

    /// Enable debug logging (otherwise RUST_LOG is honoured)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Carry foreign labels from the observed object into the desired one
    Retain {
        /// Desired object file ('-' for stdin)
        #[arg(long)]
        desired: PathBuf,
        /// Previously observed object file
        #[arg(long)]
        observed: PathBuf,
        /// Retain annotations as well
        #[arg(long)]
        annotations: bool,
    },
    /// Record the label keys of an object in its managed-labels annotation
    Record {
        /// Object file ('-' for stdin)
        file: PathBuf,
        /// Record annotation keys as well
        #[arg(long)]
        annotations: bool,
    },
    /// Keep the observed finalizers and append the missing desired ones
    Finalizers {
        #[arg(long)]
        desired: PathBuf,
        #[arg(long)]
        observed: PathBuf,
    },
    /// Record managed keys, then retain labels, annotations and finalizers
    Reconcile {
        #[arg(long)]
        desired: PathBuf,
        #[arg(long)]
        observed: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("label_reconcile=debug,lrc=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let result = match cli.command {
        Command::Retain {
            desired,
            observed,
            annotations,
        } => {
            check_stdin(&desired, &observed)?;
            let mut desired_obj = read_object(&desired)?;
            let observed_obj = read_object(&observed)?;
            retain_labels(&mut desired_obj, &observed_obj)?;
            if annotations {
                retain_annotations(&mut desired_obj, &observed_obj)?;
            }
            desired_obj
        }
        Command::Record { file, annotations } => {
            let mut obj = read_object(&file)?;
            record_managed_labels(&mut obj)?;
            if annotations {
                record_managed_annotations(&mut obj)?;
            }
            obj
        }
        Command::Finalizers { desired, observed } => {
            check_stdin(&desired, &observed)?;
            let mut desired_obj = read_object(&desired)?;
            retain_finalizers(&mut desired_obj, &read_object(&observed)?)?;
            desired_obj
        }
        Command::Reconcile { desired, observed } => {
            check_stdin(&desired, &observed)?;
            let mut desired_obj = read_object(&desired)?;
            reconcile(&mut desired_obj, &read_object(&observed)?)?;
            desired_obj
        }
    };

    tracing::info!(
        kind = result.kind().unwrap_or_default(),
        name = result.name().unwrap_or_default(),
        "writing object"
    );
    write_object(&result, cli.format, &cli.output)
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Stdin can feed only one of the two objects; the second read would see an
/// empty stream.
fn check_stdin(desired: &Path, observed: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if is_stdin(desired) && is_stdin(observed) {
        return Err("--desired and --observed cannot both be read from stdin".into());
    }
    Ok(())
}

fn read_object(path: &Path) -> Result<Object, Box<dyn std::error::Error>> {
    let content = if is_stdin(path) {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path).map_err(|e| format!("Failed to read file {:?}: {}", path, e))?
    };

    let obj = Object::from_yaml(&content)
        .map_err(|e| format!("Failed to parse {:?}: {}", path, e))?;
    if obj.is_null() {
        return Err(format!("Failed to parse {:?}: empty document", path).into());
    }
    Ok(obj)
}

fn write_object(obj: &Object, format: Format, output: &str) -> Result<(), Box<dyn std::error::Error>> {
    let rendered = match format {
        Format::Yaml => obj.to_yaml()?,
        Format::Json => obj.to_json()? + "\n",
    };

    let mut out: Box<dyn Write> = if output == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(
            fs::File::create(output)
                .map_err(|e| format!("Failed to create output file {:?}: {}", output, e))?,
        )
    };
    write!(out, "{}", rendered)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use label_reconcile::{MANAGED_ANNOTATIONS_ANNOTATION, MANAGED_LABELS_ANNOTATION};
    use pretty_assertions::assert_eq;

    const DESIRED: &str = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: demo
  labels:
    foo: foo
  finalizers:
  - a
  - b
data:
  key: value
"#;

    const OBSERVED: &str = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: demo
  labels:
    foo: bar
    retain: retain
    deleted: deleted
  annotations:
    resourcetemplate.karmada.io/managed-labels: foo,deleted
    owner: member
  finalizers:
  - b
  - a
data:
  key: value
"#;

    fn write_fixture(dir: &Path, name: &str, content: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path.to_str().unwrap().to_string()
    }

    /// Runs `lrc -o <tmp>/out <args>` and returns the written file.
    fn run_to_file(dir: &Path, args: &[&str]) -> Result<String, Box<dyn std::error::Error>> {
        let out = dir.join("out");
        let out = out.to_str().unwrap();
        let mut argv = vec!["lrc", "-o", out];
        argv.extend_from_slice(args);
        run(Cli::try_parse_from(argv)?)?;
        Ok(fs::read_to_string(out)?)
    }

    fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_reconcile() {
        let cli = Cli::try_parse_from([
            "lrc",
            "reconcile",
            "--desired",
            "desired.yaml",
            "--observed",
            "observed.yaml",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.format, Format::Json);
        assert_eq!(cli.output, "-");
        match cli.command {
            Command::Reconcile { desired, observed } => {
                assert_eq!(desired, PathBuf::from("desired.yaml"));
                assert_eq!(observed, PathBuf::from("observed.yaml"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_record_with_annotations() {
        let cli = Cli::try_parse_from(["lrc", "-v", "record", "obj.yaml", "--annotations"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Record { annotations: true, .. }
        ));
    }

    #[test]
    fn test_retain_requires_both_objects() {
        assert!(Cli::try_parse_from(["lrc", "retain", "--desired", "d.yaml"]).is_err());
    }

    #[test]
    fn test_run_retain_writes_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let desired = write_fixture(dir.path(), "desired.yaml", DESIRED);
        let observed = write_fixture(dir.path(), "observed.yaml", OBSERVED);

        let written = run_to_file(
            dir.path(),
            &["retain", "--desired", &desired, "--observed", &observed],
        )
        .unwrap();

        let obj = Object::from_yaml(&written).unwrap();
        assert_eq!(
            obj.labels().unwrap().unwrap().into_iter().collect::<Vec<_>>(),
            pairs(&[("foo", "foo"), ("retain", "retain")])
        );
        assert_eq!(obj.annotations().unwrap(), None);
        assert_eq!(obj.finalizers().unwrap(), Some(vec!["a".into(), "b".into()]));
        assert!(written.contains("kind: ConfigMap"), "{}", written);
    }

    #[test]
    fn test_run_record_with_annotations() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_fixture(dir.path(), "desired.yaml", DESIRED);

        let written = run_to_file(dir.path(), &["record", &file, "--annotations"]).unwrap();

        let annotations = Object::from_yaml(&written)
            .unwrap()
            .annotations()
            .unwrap()
            .unwrap();
        assert_eq!(
            annotations.into_iter().collect::<Vec<_>>(),
            pairs(&[
                (
                    MANAGED_ANNOTATIONS_ANNOTATION,
                    "resourcetemplate.karmada.io/managed-annotations,resourcetemplate.karmada.io/managed-labels",
                ),
                (MANAGED_LABELS_ANNOTATION, "foo"),
            ])
        );
    }

    #[test]
    fn test_run_finalizers_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let desired = write_fixture(dir.path(), "desired.yaml", DESIRED);
        let observed = write_fixture(dir.path(), "observed.yaml", OBSERVED);

        let written = run_to_file(
            dir.path(),
            &[
                "--format",
                "json",
                "finalizers",
                "--desired",
                &desired,
                "--observed",
                &observed,
            ],
        )
        .unwrap();

        assert!(written.starts_with('{'), "{}", written);
        assert!(written.ends_with("}\n"), "{}", written);
        let obj = Object::from_yaml(&written).unwrap();
        assert_eq!(obj.finalizers().unwrap(), Some(vec!["b".into(), "a".into()]));
        assert_eq!(
            obj.labels().unwrap().unwrap().into_iter().collect::<Vec<_>>(),
            pairs(&[("foo", "foo")])
        );
    }

    #[test]
    fn test_run_reconcile() {
        let dir = tempfile::tempdir().unwrap();
        let desired = write_fixture(dir.path(), "desired.yaml", DESIRED);
        let observed = write_fixture(dir.path(), "observed.json", &{
            let obj = Object::from_yaml(OBSERVED).unwrap();
            obj.to_json().unwrap()
        });

        let written = run_to_file(
            dir.path(),
            &["reconcile", "--desired", &desired, "--observed", &observed],
        )
        .unwrap();

        let obj = Object::from_yaml(&written).unwrap();
        assert_eq!(
            obj.labels().unwrap().unwrap().into_iter().collect::<Vec<_>>(),
            pairs(&[("foo", "foo"), ("retain", "retain")])
        );
        let annotations = obj.annotations().unwrap().unwrap();
        assert_eq!(
            annotations.get(MANAGED_LABELS_ANNOTATION).map(String::as_str),
            Some("foo")
        );
        assert_eq!(annotations.get("owner").map(String::as_str), Some("member"));
        assert_eq!(obj.finalizers().unwrap(), Some(vec!["b".into(), "a".into()]));
    }

    #[test]
    fn test_run_rejects_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let desired = write_fixture(dir.path(), "desired.yaml", DESIRED);
        let observed = write_fixture(dir.path(), "observed.yaml", "# nothing here\n");

        let err = run_to_file(
            dir.path(),
            &["reconcile", "--desired", &desired, "--observed", &observed],
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Failed to parse"), "{}", message);
        assert!(message.contains("observed.yaml"), "{}", message);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_run_rejects_stdin_for_both_objects() {
        for command in ["retain", "finalizers", "reconcile"] {
            let cli = Cli::try_parse_from(["lrc", command, "--desired", "-", "--observed", "-"])
                .unwrap();
            let err = run(cli).unwrap_err();
            assert_eq!(
                err.to_string(),
                "--desired and --observed cannot both be read from stdin",
                "{}",
                command
            );
        }
    }
}
