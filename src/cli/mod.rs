//! Command-line front end: argument parsing and command execution.

mod report;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::comparison::{ComparisonCoordinator, ComparisonSummary, Side};
use crate::config::{self, AppConfig, ConfigError};
use crate::institutions::InstitutionDirectory;
use crate::model::{InputField, InputRecord, PredictionResult};
use crate::panel::PredictionPanel;
use crate::reference_data::ReferenceData;
use crate::service::{HttpPredictionService, PredictionService, ServiceError};

pub use report::{render_comparison, render_panel};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("Failed to read scenario {path}: {source}")]
    ReadScenario {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid scenario {path}: {source}")]
    ParseScenario {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Scenario {label} is missing: {fields}")]
    Incomplete { label: String, fields: String },
    #[error("{0}")]
    RequestFailed(String),
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
    #[error("Failed to encode JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) | Self::Incomplete { .. } => 2,
            _ => 1,
        }
    }
}

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
pub struct Invocation {
    pub config_path: Option<PathBuf>,
    pub service_url: Option<String>,
    pub command: Command,
}

#[derive(Debug, Default, PartialEq)]
pub enum Command {
    #[default]
    Help,
    Predict {
        scenario: Option<PathBuf>,
        overrides: Vec<(InputField, String)>,
        analysis: bool,
        json: bool,
    },
    Compare {
        scenario_a: PathBuf,
        scenario_b: PathBuf,
        json: bool,
    },
    Institutions,
    Options {
        field: Option<InputField>,
    },
    Health,
    Config {
        init: bool,
    },
}

pub fn help_text() -> &'static str {
    "degree-roi: estimate post-graduation income and loan ROI for a degree

Usage:
  degree-roi [--config FILE] [--service-url URL] <command> [options]

Commands:
  predict        Predict one scenario
                   --scenario FILE       TOML file with the five inputs
                   --degree-type V, --major-field V, --control-type V,
                   --state V, --institution-name V   (override the file)
                   --analysis            also request a narrative analysis
                   --json                print JSON instead of a report
  compare A B    Compare two scenario files side by side [--json]
  institutions   List institution names known to the service
  options [F]    List the accepted values for one field or all fields
  health         Check that the service is reachable
  config         Show the config path and effective settings [--init]"
}

/// Parse arguments, excluding the program name.
pub fn parse_args(args: Vec<String>) -> Result<Invocation, CliError> {
    let mut invocation = Invocation::default();
    let mut idx = 0usize;
    let mut rest = Vec::new();
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" if rest.is_empty() => return Ok(invocation),
            "--config" if rest.is_empty() => {
                idx += 1;
                invocation.config_path = Some(PathBuf::from(value_of(&args, idx, "--config")?));
            }
            "--service-url" if rest.is_empty() => {
                idx += 1;
                invocation.service_url = Some(value_of(&args, idx, "--service-url")?.to_string());
            }
            other => rest.push(other.to_string()),
        }
        idx += 1;
    }
    let Some((name, options)) = rest.split_first() else {
        return Ok(invocation);
    };
    invocation.command = match name.as_str() {
        "help" => Command::Help,
        "predict" => parse_predict(options)?,
        "compare" => parse_compare(options)?,
        "institutions" => {
            expect_no_options(name, options)?;
            Command::Institutions
        }
        "options" => parse_options(options)?,
        "health" => {
            expect_no_options(name, options)?;
            Command::Health
        }
        "config" => parse_config(options)?,
        unknown => {
            return Err(CliError::Usage(format!(
                "Unknown command: {unknown}\n\n{}",
                help_text()
            )));
        }
    };
    Ok(invocation)
}

fn parse_predict(args: &[String]) -> Result<Command, CliError> {
    let mut scenario = None;
    let mut overrides = Vec::new();
    let mut analysis = false;
    let mut json = false;
    let mut idx = 0usize;
    while idx < args.len() {
        let arg = args[idx].as_str();
        match arg {
            "--scenario" => {
                idx += 1;
                scenario = Some(PathBuf::from(value_of(args, idx, arg)?));
            }
            "-h" | "--help" => return Ok(Command::Help),
            "--analysis" => analysis = true,
            "--json" => json = true,
            flag if flag.starts_with("--") => {
                let field = InputField::from_wire_name(&flag[2..]).ok_or_else(|| {
                    CliError::Usage(format!("Unknown argument: {flag}\n\n{}", help_text()))
                })?;
                idx += 1;
                overrides.push((field, value_of(args, idx, flag)?.to_string()));
            }
            unknown => {
                return Err(CliError::Usage(format!(
                    "Unknown argument: {unknown}\n\n{}",
                    help_text()
                )));
            }
        }
        idx += 1;
    }
    Ok(Command::Predict {
        scenario,
        overrides,
        analysis,
        json,
    })
}

fn parse_compare(args: &[String]) -> Result<Command, CliError> {
    let mut files = Vec::new();
    let mut json = false;
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--json" => json = true,
            flag if flag.starts_with("--") => {
                return Err(CliError::Usage(format!("Unknown argument: {flag}")));
            }
            path => files.push(PathBuf::from(path)),
        }
    }
    let [scenario_a, scenario_b]: [PathBuf; 2] = files.try_into().map_err(|_| {
        CliError::Usage("compare requires exactly two scenario files".to_string())
    })?;
    Ok(Command::Compare {
        scenario_a,
        scenario_b,
        json,
    })
}

fn parse_options(args: &[String]) -> Result<Command, CliError> {
    match args {
        [] => Ok(Command::Options { field: None }),
        [name] => InputField::from_wire_name(name)
            .map(|field| Command::Options { field: Some(field) })
            .ok_or_else(|| CliError::Usage(format!("Unknown field: {name}"))),
        _ => Err(CliError::Usage("options takes at most one field".to_string())),
    }
}

fn parse_config(args: &[String]) -> Result<Command, CliError> {
    match args {
        [] => Ok(Command::Config { init: false }),
        [flag] if flag == "--init" => Ok(Command::Config { init: true }),
        _ => Err(CliError::Usage("config accepts only --init".to_string())),
    }
}

fn expect_no_options(name: &str, args: &[String]) -> Result<(), CliError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CliError::Usage(format!("{name} takes no arguments")))
    }
}

fn value_of<'a>(args: &'a [String], idx: usize, flag: &str) -> Result<&'a str, CliError> {
    match args.get(idx).map(String::as_str) {
        Some(value) if !value.starts_with("--") => Ok(value),
        _ => Err(CliError::Usage(format!("{flag} requires a value"))),
    }
}

/// Everything a command needs from the environment.
pub struct Context {
    pub config: AppConfig,
    pub config_path: PathBuf,
    pub service: Arc<dyn PredictionService>,
    pub reference: Arc<ReferenceData>,
}

impl Context {
    /// Load config and build the HTTP client it describes.
    pub fn load(invocation: &Invocation) -> Result<Self, CliError> {
        let config_path = match &invocation.config_path {
            Some(path) => path.clone(),
            None => config::config_path()?,
        };
        let config = config::load_from_path(&config_path)?;
        let base_url = invocation
            .service_url
            .as_deref()
            .unwrap_or(&config.service.base_url);
        let service = HttpPredictionService::new(base_url, config.service.timeouts())?;
        tracing::debug!("Using prediction service at {}", service.base_url());
        let reference = config.reference_data()?;
        Ok(Self {
            config,
            config_path,
            service: Arc::new(service),
            reference: Arc::new(reference),
        })
    }
}

/// Parse, load, execute. Output goes to `out`.
pub fn run(args: Vec<String>, out: &mut impl Write) -> Result<(), CliError> {
    let invocation = parse_args(args)?;
    if invocation.command == Command::Help {
        writeln!(out, "{}", help_text())?;
        return Ok(());
    }
    let context = Context::load(&invocation)?;
    execute(invocation.command, &context, out)
}

pub fn execute(command: Command, context: &Context, out: &mut impl Write) -> Result<(), CliError> {
    match command {
        Command::Help => writeln!(out, "{}", help_text())?,
        Command::Predict {
            scenario,
            overrides,
            analysis,
            json,
        } => {
            let mut input = match scenario {
                Some(path) => load_scenario(&path)?,
                None => InputRecord::default(),
            };
            for (field, value) in overrides {
                input.set(field, value);
            }
            predict(context, input, analysis, json, out)?;
        }
        Command::Compare {
            scenario_a,
            scenario_b,
            json,
        } => {
            let a = load_scenario(&scenario_a)?;
            let b = load_scenario(&scenario_b)?;
            compare(context, a, b, json, out)?;
        }
        Command::Institutions => {
            let mut directory = InstitutionDirectory::new();
            directory.begin_fetch(Arc::clone(&context.service));
            directory.wait();
            for name in directory.names() {
                writeln!(out, "{name}")?;
            }
        }
        Command::Options { field } => {
            let fields = match field {
                Some(field) => vec![field],
                None => InputField::ALL.to_vec(),
            };
            for field in fields {
                let Some(options) = context.reference.options(field) else {
                    writeln!(out, "{}: run `degree-roi institutions`", field.label())?;
                    continue;
                };
                writeln!(out, "{} ({}):", field.label(), field.wire_name())?;
                for option in options {
                    writeln!(out, "  {option}")?;
                }
            }
        }
        Command::Health => {
            let health = context.service.check_health()?;
            if !health.is_healthy() {
                return Err(CliError::RequestFailed(format!(
                    "Service reported status {:?}",
                    health.status
                )));
            }
            writeln!(out, "Service is {}", health.status)?;
        }
        Command::Config { init } => {
            if init && !context.config_path.exists() {
                config::save_to_path(&context.config, &context.config_path)?;
                tracing::info!("Wrote default config to {}", context.config_path.display());
            }
            writeln!(out, "# {}", context.config_path.display())?;
            let text = toml::to_string_pretty(&context.config).map_err(|source| {
                ConfigError::SerializeToml {
                    path: context.config_path.clone(),
                    source,
                }
            })?;
            write!(out, "{text}")?;
        }
    }
    Ok(())
}

/// Load a scenario file holding the five inputs as top-level keys.
pub fn load_scenario(path: &Path) -> Result<InputRecord, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadScenario {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| CliError::ParseScenario {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Serialize)]
struct PanelOutput<'a> {
    input: &'a InputRecord,
    prediction: Option<&'a PredictionResult>,
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis_error: Option<&'a str>,
}

impl<'a> PanelOutput<'a> {
    fn from_panel(panel: &'a PredictionPanel) -> Self {
        let state = panel.state();
        Self {
            input: &state.input,
            prediction: state.prediction.as_ref(),
            error: state.prediction_error.as_deref(),
            analysis: state.analysis.as_deref(),
            analysis_error: state.analysis_error.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct ComparisonOutput<'a> {
    a: PanelOutput<'a>,
    b: PanelOutput<'a>,
    summary: Option<ComparisonSummary>,
}

fn predict(
    context: &Context,
    input: InputRecord,
    analysis: bool,
    json: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut panel = PredictionPanel::new(
        "predict",
        Arc::clone(&context.service),
        Arc::clone(&context.reference),
    );
    panel.set_input(input);
    ensure_submittable(&panel)?;
    warn_unknown_values(&panel);

    panel.submit_prediction();
    panel.wait_until_idle();
    if analysis && panel.request_analysis() {
        panel.wait_until_idle();
    }

    if json {
        serde_json::to_writer_pretty(&mut *out, &PanelOutput::from_panel(&panel))?;
        writeln!(out)?;
    } else {
        write!(out, "{}", render_panel(&panel, None))?;
    }
    match &panel.state().prediction_error {
        Some(message) => Err(CliError::RequestFailed(message.clone())),
        None => Ok(()),
    }
}

fn compare(
    context: &Context,
    a: InputRecord,
    b: InputRecord,
    json: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut coordinator =
        ComparisonCoordinator::new(Arc::clone(&context.service), Arc::clone(&context.reference));
    coordinator.panel_mut(Side::A).set_input(a);
    coordinator.panel_mut(Side::B).set_input(b);
    for side in Side::BOTH {
        ensure_submittable(coordinator.panel(side))?;
        warn_unknown_values(coordinator.panel(side));
    }

    coordinator.submit_both();
    coordinator.wait_until_idle();
    let summary = coordinator.get_comparison();

    if json {
        let output = ComparisonOutput {
            a: PanelOutput::from_panel(coordinator.panel(Side::A)),
            b: PanelOutput::from_panel(coordinator.panel(Side::B)),
            summary,
        };
        serde_json::to_writer_pretty(&mut *out, &output)?;
        writeln!(out)?;
    } else {
        for side in Side::BOTH {
            write!(out, "{}", render_panel(coordinator.panel(side), Some(side)))?;
            writeln!(out)?;
        }
        if let Some(summary) = &summary {
            write!(out, "{}", render_comparison(summary))?;
        }
    }

    let failed: Vec<&str> = Side::BOTH
        .into_iter()
        .filter(|side| coordinator.panel(*side).state().prediction_error.is_some())
        .map(Side::label)
        .collect();
    if failed.is_empty() {
        Ok(())
    } else {
        Err(CliError::RequestFailed(format!(
            "Prediction failed for degree {}",
            failed.join(" and ")
        )))
    }
}

fn ensure_submittable(panel: &PredictionPanel) -> Result<(), CliError> {
    if panel.is_submittable() {
        return Ok(());
    }
    let fields = panel
        .input()
        .missing_fields()
        .into_iter()
        .map(InputField::wire_name)
        .collect::<Vec<_>>()
        .join(", ");
    Err(CliError::Incomplete {
        label: panel.label().to_string(),
        fields,
    })
}

fn warn_unknown_values(panel: &PredictionPanel) {
    for field in InputField::ALL {
        let value = panel.input().get(field);
        if !panel.reference_data().is_known(field, value) {
            tracing::warn!(
                panel = %panel.label(),
                "{} {value:?} is not in the known options; the service may reject it",
                field.label()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn no_arguments_means_help() {
        assert_eq!(parse_args(Vec::new()).unwrap().command, Command::Help);
        assert_eq!(parse_args(args(&["--help"])).unwrap().command, Command::Help);
    }

    #[test]
    fn predict_collects_field_overrides() {
        let invocation = parse_args(args(&[
            "--service-url",
            "http://localhost:8000",
            "predict",
            "--scenario",
            "a.toml",
            "--state",
            "NY",
            "--institution-name",
            "Columbia University in the City of New York",
            "--analysis",
        ]))
        .unwrap();
        assert_eq!(invocation.service_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(
            invocation.command,
            Command::Predict {
                scenario: Some(PathBuf::from("a.toml")),
                overrides: vec![
                    (InputField::State, "NY".to_string()),
                    (
                        InputField::InstitutionName,
                        "Columbia University in the City of New York".to_string()
                    ),
                ],
                analysis: true,
                json: false,
            }
        );
    }

    #[test]
    fn predict_rejects_unknown_flag_and_missing_value() {
        assert!(matches!(
            parse_args(args(&["predict", "--gpa", "4.0"])),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            parse_args(args(&["predict", "--state"])),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn compare_requires_two_files() {
        assert!(matches!(
            parse_args(args(&["compare", "a.toml"])),
            Err(CliError::Usage(_))
        ));
        let invocation = parse_args(args(&["compare", "a.toml", "b.toml", "--json"])).unwrap();
        assert_eq!(
            invocation.command,
            Command::Compare {
                scenario_a: PathBuf::from("a.toml"),
                scenario_b: PathBuf::from("b.toml"),
                json: true,
            }
        );
    }

    #[test]
    fn options_accepts_field_names() {
        let invocation = parse_args(args(&["options", "control-type"])).unwrap();
        assert_eq!(
            invocation.command,
            Command::Options {
                field: Some(InputField::ControlType)
            }
        );
        assert!(parse_args(args(&["options", "color"])).is_err());
    }

    #[test]
    fn flag_value_cannot_be_another_flag() {
        assert!(matches!(
            parse_args(args(&["predict", "--state", "--analysis"])),
            Err(CliError::Usage(message)) if message == "--state requires a value"
        ));
        assert!(matches!(
            parse_args(args(&["--config", "--service-url", "http://x", "health"])),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn help_flag_after_command_shows_help() {
        for list in [
            &["predict", "--help"][..],
            &["predict", "--state", "WA", "-h"][..],
            &["compare", "--help"][..],
        ] {
            assert_eq!(parse_args(args(list)).unwrap().command, Command::Help);
        }
    }

    #[test]
    fn usage_errors_exit_with_two() {
        let err = parse_args(args(&["frobnicate"])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
