use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "adminview",
    version,
    about = "back-office read model and navigation inspector",
    long_about = "adminview loads the bulk lists behind a back-office admin panel, keeps them in a page-scoped cache and answers detail lookups and permission-filtered navigation from it.\n\nExamples:\n  adminview --nav\n  adminview -r users --list\n  adminview -r users --show u1 --show u2\n  adminview --file autopay=./saved/autopay.json --show autopay:42 --format json\n\nTip: Use --config to keep endpoints, session and navigation in one YAML file."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        long = "format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: text or json."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the report to a file instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.adminview/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Input",
        help = "Write a commented default config file and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'b',
        long = "base-url",
        value_name = "URL",
        help_heading = "Backend",
        help = "Base URL that relative resource endpoints are joined onto."
    )]
    pub base_url: Option<String>,

    #[arg(
        short = 't',
        long = "token",
        value_name = "TOKEN",
        help_heading = "Backend",
        help = "Bearer token sent with every list request."
    )]
    pub token: Option<String>,

    #[arg(
        short = 'H',
        long = "header",
        value_name = "HEADER",
        help_heading = "Backend",
        help = "Extra request header ('Key: Value')."
    )]
    pub header: Option<String>,

    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "Backend",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'r',
        long = "resource",
        value_name = "NAME",
        action = ArgAction::Append,
        help_heading = "Data",
        help = "Only load these resources (repeatable, defaults to all configured)."
    )]
    pub resource: Vec<String>,

    #[arg(
        short = 'f',
        long = "file",
        value_name = "NAME=PATH",
        action = ArgAction::Append,
        help_heading = "Data",
        help = "Read a resource's list from a saved JSON response (repeatable)."
    )]
    pub file: Vec<String>,

    #[arg(
        short = 'l',
        long = "list",
        help_heading = "Data",
        help = "Print the loaded records of each resource."
    )]
    pub list: bool,

    #[arg(
        short = 's',
        long = "show",
        value_name = "[RESOURCE:]ID",
        action = ArgAction::Append,
        help_heading = "Data",
        help = "Show one loaded record (repeatable). A configured resource name before ':' selects it."
    )]
    pub show: Vec<String>,

    #[arg(
        short = 'n',
        long = "nav",
        help_heading = "Navigation",
        help = "Print the navigation entries visible to the session."
    )]
    pub nav: bool,

    #[arg(
        long = "open",
        value_name = "NAV_ID",
        help_heading = "Navigation",
        help = "Resolve a navigation entry to its target."
    )]
    pub open: Option<String>,

    #[arg(
        long = "role",
        value_name = "ROLE",
        help_heading = "Session",
        help = "Override the session role."
    )]
    pub role: Option<String>,

    #[arg(
        long = "caps",
        value_name = "CAPS",
        help_heading = "Session",
        help = "Override the session capabilities (comma-separated)."
    )]
    pub capabilities: Option<String>,

    #[arg(
        long = "super-admin",
        help_heading = "Session",
        help = "Treat the session user as a super admin."
    )]
    pub super_admin: bool,

    #[arg(
        long = "anonymous",
        help_heading = "Session",
        help = "Run with an unauthenticated session."
    )]
    pub anonymous: bool,
}
