use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use dsconf::output::print_error;
use dsconf::{
    find_config_file, generate_init_file, load_config, merge_settings, run, should_use_colors,
    Action, CliOptions, DsconfToml, OutputContext,
};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dsconf")]
#[command(version, about = "Edit INI and local.conf files in place, keeping comments and order")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Show changes in diff format
    #[arg(short, long, global = true)]
    diff: bool,

    /// Output only modified file names
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable debug logging and report unchanged files
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Overwrite files in place instead of replacing them atomically
    #[arg(long, global = true)]
    in_place: bool,

    /// Force colored output
    #[arg(long, global = true)]
    color: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Generate a template dsconf.toml configuration file
    #[arg(long)]
    init: bool,

    /// Specify config file path (overrides auto-discovery)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Set item in ini file
    #[command(name = "iniset")]
    IniSet {
        /// Name of file
        inifile: PathBuf,
        /// Name of section
        section: String,
        name: String,
        value: String,
    },

    /// Comment item in ini file
    #[command(name = "inicomment")]
    IniComment {
        inifile: PathBuf,
        section: String,
        name: String,
    },

    /// Uncomment item in ini file
    #[command(name = "iniuncomment")]
    IniUncomment {
        inifile: PathBuf,
        section: String,
        name: String,
    },

    /// Delete item from ini file
    #[command(name = "inirm")]
    IniRm {
        inifile: PathBuf,
        section: String,
        name: String,
    },

    /// Extract localrc from local.conf
    #[command(name = "extract-localrc")]
    ExtractLocalrc {
        local_conf: PathBuf,
        local_rc: PathBuf,
    },

    /// Extract and merge config from local.conf
    Extract {
        local_conf: PathBuf,
        group: String,
        conf: String,
        /// Config file to write the extracted keys to
        local_rc: PathBuf,
    },

    /// Set variable in localrc of local.conf
    Setlc {
        local_conf: PathBuf,
        name: String,
        value: String,
    },

    /// Set raw line at the end of localrc in local.conf
    #[command(name = "setlc_raw")]
    SetlcRaw {
        local_conf: PathBuf,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        items: Vec<String>,
    },

    /// Set variable in ini section of local.conf
    #[command(name = "setlc_conf")]
    SetlcConf {
        local_conf: PathBuf,
        group: String,
        conf: String,
        section: String,
        name: String,
        value: String,
    },

    /// Merge local.conf files
    #[command(name = "merge_lc")]
    MergeLc {
        local_conf: PathBuf,
        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },
}

impl From<Command> for Action {
    fn from(command: Command) -> Self {
        match command {
            Command::IniSet {
                inifile,
                section,
                name,
                value,
            } => Action::IniSet {
                inifile,
                section,
                name,
                value,
            },
            Command::IniComment {
                inifile,
                section,
                name,
            } => Action::IniComment {
                inifile,
                section,
                name,
            },
            Command::IniUncomment {
                inifile,
                section,
                name,
            } => Action::IniUncomment {
                inifile,
                section,
                name,
            },
            Command::IniRm {
                inifile,
                section,
                name,
            } => Action::IniRemove {
                inifile,
                section,
                name,
            },
            Command::ExtractLocalrc {
                local_conf,
                local_rc,
            } => Action::ExtractLocalrc {
                local_conf,
                local_rc,
            },
            Command::Extract {
                local_conf,
                group,
                conf,
                local_rc,
            } => Action::Extract {
                local_conf,
                group,
                conf,
                target: local_rc,
            },
            Command::Setlc {
                local_conf,
                name,
                value,
            } => Action::SetLocal {
                local_conf,
                line: format!("{name}={value}"),
            },
            Command::SetlcRaw { local_conf, items } => Action::SetLocal {
                local_conf,
                line: items.join(" "),
            },
            Command::SetlcConf {
                local_conf,
                group,
                conf,
                section,
                name,
                value,
            } => Action::SetConf {
                local_conf,
                group,
                conf,
                section,
                name,
                value,
            },
            Command::MergeLc {
                local_conf,
                sources,
            } => Action::Merge {
                local_conf,
                sources,
            },
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let use_colors = should_use_colors(cli.color, cli.no_color);

    // Handle --init command
    if cli.init {
        return handle_init(use_colors);
    }

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        return ExitCode::from(1);
    };

    // Merge configurations: CLI > TOML > defaults
    let toml_config = load_configuration(cli.config.as_ref());
    let cli_options = CliOptions {
        in_place: cli.in_place.then_some(true),
        diff: cli.diff.then_some(true),
        quiet: cli.quiet.then_some(true),
    };
    let settings = merge_settings(&cli_options, toml_config.as_ref());
    let ctx = OutputContext::new(settings.output_mode, use_colors, cli.verbose);

    match run(&Action::from(command), &settings, &ctx) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e.to_string(), use_colors);
            ExitCode::from(1)
        }
    }
}

// RUST_LOG wins when set; otherwise WARN, or DEBUG with --verbose.
fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn handle_init(use_colors: bool) -> ExitCode {
    match generate_init_file() {
        Ok(path) => {
            println!("Created {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_error(&e.to_string(), use_colors);
            ExitCode::from(1)
        }
    }
}

fn load_configuration(explicit_path: Option<&PathBuf>) -> Option<DsconfToml> {
    let config_path = explicit_path.cloned().or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|d| find_config_file(&d))
    });

    config_path.and_then(|p| match load_config(&p) {
        Ok(config) => {
            tracing::debug!(path = %p.display(), "using config");
            Some(config)
        }
        Err(e) => {
            eprintln!("Warning: {e}, using defaults");
            None
        }
    })
}
