use anyhow::Result;
use clap::Parser;
use ss_setup::interpreter::SystemInterpreter;
use ss_setup::probe::PythonProbe;
use ss_setup::runtime::RealRuntime;
use std::path::PathBuf;

/// ss-setup - SecretStorage setup helper
///
/// The Python SecretStorage stack needs native extension packages (dbus,
/// Crypto) that pip cannot always build inside a virtualenv. This tool finds
/// the system-wide installed copies and symlinks them into the active
/// virtualenv.
///
/// Examples:
///   ss-setup status -v   # show each package and where it was found
///   ss-setup link        # symlink the packages into $VIRTUAL_ENV
#[derive(Parser, Debug)]
#[command(author, version = env!("SS_SETUP_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// System python interpreter to inspect (also via SS_SETUP_PYTHON)
    #[arg(
        long = "python",
        env = "SS_SETUP_PYTHON",
        value_name = "PATH",
        default_value = "python3",
        global = true
    )]
    pub python: PathBuf,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Display status of secret storage setup
    Status(StatusArgs),

    /// Link system packages into the current virtualenv
    Link(LinkArgs),
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Also print per-component troubleshooting messages
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(clap::Args, Debug)]
pub struct LinkArgs {
    /// Also print per-component messages about what was linked
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;
    let interp = SystemInterpreter::new(cli.python.clone());

    match cli.command {
        Commands::Status(args) => {
            let probe = PythonProbe::for_active_env(&runtime, &cli.python);
            for line in ss_setup::commands::status::run(&runtime, &interp, &probe, args.verbose) {
                println!("{line}");
            }
        }
        Commands::Link(args) => {
            let outcome = ss_setup::commands::link::run(&runtime, &interp, args.verbose)?;
            if outcome.linked {
                println!("linking successful, run the status command to verify");
            }
            for line in outcome.lines {
                println!("{line}");
            }
        }
    }
    Ok(())
}
