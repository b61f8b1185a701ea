use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile, SessionConfig};
use crate::output::{self, OutputFormat, Report};
use crate::runner::{Options, ResourceSource, ResourceSpec, Runner, DEFAULT_ID_FIELD};
use crate::session::{self, CurrentUser, StaticSession, DEFAULT_LOGIN_PATH};

#[derive(Clone, Debug, PartialEq, Eq)]
struct ShowRequest {
    resource: Option<String>,
    id: String,
}

#[derive(Clone, Debug)]
struct RunConfig {
    verbose: u8,
    no_color: bool,
    output: Option<String>,
    output_format: Option<String>,
    options: Options,
    session: StaticSession,
    list: bool,
    nav: bool,
    show: Vec<ShowRequest>,
    open: Option<String>,
}

fn build_session(args: &CliArgs, cfg: Option<SessionConfig>) -> Result<StaticSession, String> {
    let cfg = cfg.unwrap_or_default();
    let login_path = cfg
        .login_path
        .clone()
        .unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_string());
    if args.anonymous || cfg.authenticated == Some(false) {
        return Ok(StaticSession::anonymous(login_path));
    }

    let capabilities = match args.capabilities.as_deref() {
        Some(raw) => crate::utils::parse_capabilities_csv(raw)
            .map_err(|e| format!("invalid --caps '{raw}': {e}"))?,
        None => cfg
            .capabilities
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect(),
    };
    let user = CurrentUser {
        name: cfg.name.unwrap_or_else(|| "admin".to_string()),
        role: args
            .role
            .clone()
            .or(cfg.role)
            .unwrap_or_else(|| "admin".to_string()),
        is_super_admin: args.super_admin || cfg.super_admin.unwrap_or(false),
        capabilities,
    };
    Ok(StaticSession::authenticated(user, login_path))
}

fn build_resources(args: &CliArgs, cfg: &ConfigFile) -> Result<Vec<ResourceSpec>, String> {
    let mut resources: Vec<ResourceSpec> = Vec::new();
    for (name, rc) in cfg.resources.clone().unwrap_or_default() {
        let source = match (rc.file, rc.endpoint) {
            (Some(file), _) => ResourceSource::File(config::expand_tilde_string(&file)),
            (None, Some(endpoint)) => ResourceSource::Endpoint(endpoint),
            (None, None) => {
                return Err(format!(
                    "resource '{name}' needs either an endpoint or a file"
                ))
            }
        };
        let mut spec = ResourceSpec {
            name,
            source,
            id_field: DEFAULT_ID_FIELD.to_string(),
            list_key: crate::fetch::DEFAULT_LIST_KEY.to_string(),
        };
        if let Some(id_field) = rc.id_field {
            spec = spec.id_field(id_field);
        }
        if let Some(list_key) = rc.list_key {
            spec = spec.list_key(list_key);
        }
        resources.push(spec);
    }

    for raw in args.file.iter() {
        let (name, path) = crate::utils::split_pair(raw, '=')
            .map_err(|e| format!("invalid --file '{raw}': {e}"))?;
        let path = config::expand_tilde_string(&path);
        match resources.iter_mut().find(|r| r.name == name) {
            Some(existing) => existing.source = ResourceSource::File(path),
            None => resources.push(ResourceSpec::file(name, path)),
        }
    }

    if !args.resource.is_empty() {
        for wanted in args.resource.iter() {
            if !resources.iter().any(|r| &r.name == wanted) {
                return Err(format!("unknown resource '{wanted}'"));
            }
        }
        resources.retain(|r| args.resource.contains(&r.name));
    }
    Ok(resources)
}

/// `RESOURCE:ID` only when the prefix names a configured resource, so ids that
/// contain ':' themselves (`urn:x`) stay intact.
fn parse_show(raw: &str, resources: &[ResourceSpec]) -> Result<ShowRequest, String> {
    if let Some((prefix, id)) = raw.split_once(':') {
        let prefix = prefix.trim();
        if resources.iter().any(|r| r.name == prefix) {
            if id.trim().is_empty() {
                return Err(format!("invalid --show '{raw}': missing id after '{prefix}:'"));
            }
            return Ok(ShowRequest {
                resource: Some(prefix.to_string()),
                id: id.to_string(),
            });
        }
    }
    if raw.trim().is_empty() {
        return Err("invalid --show, expected [RESOURCE:]ID".to_string());
    }
    Ok(ShowRequest {
        resource: None,
        id: raw.to_string(),
    })
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);
    let resources = build_resources(&args, &cfg)?;
    let session = build_session(&args, cfg.session.clone())?;
    let show = args
        .show
        .iter()
        .map(|raw| parse_show(raw, &resources))
        .collect::<Result<Vec<_>, _>>()?;

    let nothing_requested = !args.list && !args.nav && show.is_empty() && args.open.is_none();

    let options = Options {
        base_url: args.base_url.clone().or(cfg.base_url),
        token: args.token.clone().or(cfg.token),
        header: args.header.clone().or(cfg.header),
        timeout_seconds: args.timeout.or(cfg.timeout).unwrap_or(10),
        resources,
        nav: cfg.nav.unwrap_or_default(),
        dedicated_landing_roles: cfg.dedicated_landing_roles.unwrap_or_default(),
    };

    Ok(RunConfig {
        verbose: args.verbose,
        no_color,
        output: args.output.or(cfg.output).map(|p| config::expand_tilde_string(&p)),
        output_format: args.output_format.or(cfg.output_format),
        options,
        session,
        list: args.list || nothing_requested,
        nav: args.nav || nothing_requested,
        show,
        open: args.open,
    })
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "adminview=warn",
        1 => "adminview=info",
        _ => "adminview=debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn loading_spinner(resources: usize) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("loading {resources} list(s)"));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    let user = session::require_authenticated(&run.session).map_err(|e| e.to_string())?;

    let mut runner = Runner::new(run.options).map_err(|e| e.to_string())?;
    let mut report = Report {
        user: Some(format!("{} ({})", user.name, user.role)),
        landing: runner
            .navigator()
            .landing_target(&run.session)
            .map(str::to_string),
        ..Report::default()
    };

    let resource_names: Vec<String> = runner
        .resource_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    if !resource_names.is_empty() && (run.list || !run.show.is_empty()) {
        let pb = loading_spinner(resource_names.len());
        let loaded = runner.load(&run.session).await;
        pb.finish_and_clear();
        let loaded = loaded.map_err(|e| e.to_string())?;
        report.load_ms = Some(loaded.elapsed.as_millis());
        for failure in loaded.failures.iter() {
            report
                .notices
                .push(format!("failed to load {}: {}", failure.resource, failure.error));
        }
    }

    if run.nav {
        let visible = runner.visible_nav(&run.session);
        report.nav = Some(output::nav_records(&visible));
    }

    if let Some(nav_id) = run.open.as_deref() {
        match runner.resolve(nav_id) {
            Ok(target) => {
                let visible = runner
                    .visible_nav(&run.session)
                    .iter()
                    .any(|e| e.id == nav_id);
                if visible {
                    report.open = Some(target.to_string());
                } else {
                    report.notices.push(format!(
                        "navigation entry '{nav_id}' is not available to this session"
                    ));
                }
            }
            Err(e) => report.notices.push(e.to_string()),
        }
    }

    if run.list {
        for name in resource_names.iter() {
            if let Some(cache) = runner.cache(name) {
                report.lists.push(output::list_record(name, cache));
            }
        }
    }

    for request in run.show.iter() {
        let resource = match (request.resource.as_deref(), resource_names.as_slice()) {
            (Some(resource), _) => resource,
            (None, [only]) => only.as_str(),
            (None, _) => {
                report.notices.push(format!(
                    "ambiguous record '{}', use RESOURCE:ID",
                    request.id
                ));
                continue;
            }
        };
        match runner.show(resource, &request.id) {
            Ok(entry) => report.details.push(output::detail_record(resource, entry)),
            Err(e) => report.notices.push(e.to_string()),
        }
    }

    let output_format = run
        .output_format
        .as_deref()
        .and_then(OutputFormat::parse)
        .or_else(|| run.output.as_deref().and_then(output::infer_format_from_path))
        .unwrap_or(OutputFormat::Text);
    let rendered = output::render(&report, output_format)
        .map_err(|e| format!("failed to render report: {e}"))?;

    match run.output.as_ref() {
        Some(outfile_path) => {
            let mut outfile = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(outfile_path)
                .await
                .map_err(|e| format!("failed to open output file: {e}"))?;
            outfile
                .write_all(&rendered)
                .await
                .map_err(|_| "failed to write output file".to_string())?;
        }
        None => print!("{}", String::from_utf8_lossy(&rendered)),
    }

    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    if args.init_config {
        let path = match args.config.as_deref() {
            Some(p) => config::expand_tilde(p),
            None => config::default_config_path()
                .ok_or_else(|| "could not determine home directory".to_string())?,
        };
        config::ensure_default_config_file(&path)?;
        println!(":: Config    : {}", path.display());
        return Ok(());
    }

    let cfg = match args.config.as_deref() {
        Some(p) => config::load_config(&config::expand_tilde(p), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    init_tracing(run.verbose);
    if run.no_color {
        colored::control::set_override(false);
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
