use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber;

#[derive(Debug, Clone)]
pub enum Command {
    Fetch {
        url: String,
        output_dir: String,
    },
    Mirror {
        repository: String,
        path: String,
        output_dir: String,
        git_ref: Option<String>,
        api_url: Option<String>,
        token: Option<String>,
    },
    Sync {
        config_path: String,
    },
}

/// Command line overrides for the HTTP settings; unset values fall back to the config file or
/// the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct HttpOverrides {
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
    pub parallelism: Option<usize>,
    pub write_error_bodies: bool,
}

pub struct Args {
    pub command: Command,
    pub http: HttpOverrides,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "assetmirror",
    version,
    about = "Download engine assets and mirror asset directories from hosted repositories"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[command(flatten)]
    http: HttpArgs,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, ClapArgs)]
struct HttpArgs {
    #[arg(
        long = "user-agent",
        value_name = "AGENT",
        help = "User-Agent header sent with every request",
        global = true
    )]
    user_agent: Option<String>,

    #[arg(
        long = "timeout-secs",
        value_name = "SECONDS",
        help = "Connect and read-idle timeout for each HTTP request",
        global = true
    )]
    timeout_secs: Option<u64>,

    #[arg(
        long = "parallelism",
        value_name = "N",
        help = "Maximum number of listings and downloads in flight",
        global = true
    )]
    parallelism: Option<usize>,

    #[arg(
        long = "write-error-bodies",
        help = "Write the response body to disk even when the server answers with an error status",
        global = true
    )]
    write_error_bodies: bool,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Download a single file into a directory
    Fetch {
        #[arg(value_name = "URL", help = "URL of the file to download")]
        url: String,

        #[arg(
            short = 'o',
            long = "output-dir",
            value_name = "DIR",
            help = "Directory the file is written to",
            default_value = "."
        )]
        output_dir: String,
    },

    /// Recursively mirror a directory of a GitHub repository
    Mirror {
        #[arg(
            short = 'r',
            long = "repository",
            value_name = "OWNER/REPO",
            help = "Repository to mirror from"
        )]
        repository: String,

        #[arg(
            short = 'p',
            long = "path",
            value_name = "SUBDIR",
            help = "Directory inside the repository to mirror (default: repository root)",
            default_value = ""
        )]
        path: String,

        #[arg(
            short = 'o',
            long = "output-dir",
            value_name = "DIR",
            help = "Local directory receiving the mirrored tree"
        )]
        output_dir: String,

        #[arg(
            long = "ref",
            value_name = "REF",
            help = "Branch, tag or commit to read (default: the repository's default branch)"
        )]
        git_ref: Option<String>,

        #[arg(
            long = "api-url",
            value_name = "URL",
            help = "Base URL of the contents API (default: https://api.github.com)"
        )]
        api_url: Option<String>,

        #[arg(
            long = "token",
            value_name = "TOKEN",
            env = "GITHUB_TOKEN",
            hide_env_values = true,
            help = "API token used for listing requests"
        )]
        token: Option<String>,
    },

    /// Fetch every asset and mirror every directory listed in a config file
    Sync {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Sets a custom config file",
            default_value = "assets.yaml"
        )]
        config: String,
    },
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy()
                .add_directive("hyper_util=warn".parse().unwrap())
                .add_directive("reqwest=warn".parse().unwrap()),
        )
        .init();

    let command = match cli.command {
        CliCommand::Fetch { url, output_dir } => Command::Fetch { url, output_dir },
        CliCommand::Mirror {
            repository,
            path,
            output_dir,
            git_ref,
            api_url,
            token,
        } => Command::Mirror {
            repository,
            path,
            output_dir,
            git_ref,
            api_url,
            token,
        },
        CliCommand::Sync { config } => Command::Sync {
            config_path: config,
        },
    };

    let http = HttpOverrides {
        user_agent: cli.http.user_agent,
        timeout_secs: cli.http.timeout_secs,
        parallelism: cli.http.parallelism,
        write_error_bodies: cli.http.write_error_bodies,
    };

    Args {
        command,
        http,
        log_level,
    }
}
