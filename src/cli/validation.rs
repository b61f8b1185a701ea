use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --format '{raw}', expected text or json"));
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.capabilities.as_deref() {
        crate::utils::parse_capabilities_csv(raw)
            .map_err(|e| format!("invalid --caps '{raw}': {e}"))?;
    }
    for raw in args.file.iter() {
        crate::utils::split_pair(raw, '=').map_err(|e| format!("invalid --file '{raw}': {e}"))?;
    }
    for raw in args.show.iter() {
        if raw.trim().is_empty() {
            return Err("invalid --show, expected [RESOURCE:]ID".to_string());
        }
    }
    if let Some(open) = args.open.as_deref() {
        if open.trim().is_empty() {
            return Err("invalid --open, expected a navigation id".to_string());
        }
    }
    if args.anonymous && args.super_admin {
        return Err("--anonymous cannot be combined with --super-admin".to_string());
    }
    Ok(())
}
