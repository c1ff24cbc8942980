use anyhow::Context;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use hapsign::profile::DEFAULT_PROFILE_FILE;
use hapsign::settings::{HelperCommand, SignSettings, ToolHome, TOOL_HOME_ENV};
use hapsign::sign;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "hapsign")]
#[command(about = "Sign a HAP package with hap-sign-tool using the credentials in build-profile.json5")]
#[command(version)]
struct Cli {
    /// Unsigned input package
    in_file: PathBuf,
    /// Where the signed package is written
    out_file: PathBuf,
    /// Signing profile holding app.signingConfigs
    #[arg(long, env = "HAPSIGN_PROFILE", default_value = DEFAULT_PROFILE_FILE)]
    profile: PathBuf,
    /// SDK installation root containing toolchains/lib/hap-sign-tool.jar
    #[arg(long, env = TOOL_HOME_ENV)]
    tool_home: Option<PathBuf>,
    /// Fail instead of falling back to the built-in SDK location
    #[arg(long, env = "HAPSIGN_REQUIRE_TOOL_HOME", value_parser = FalseyValueParser::new())]
    require_tool_home: bool,
    /// Program used to launch hap-sign-tool.jar
    #[arg(long, env = "HAPSIGN_JAVA", default_value = "java")]
    java: OsString,
    /// Interpreter for the password decryption helper
    #[arg(long, env = "HAPSIGN_HELPER_PROGRAM", default_value = "node")]
    helper_program: OsString,
    /// Password decryption helper script
    #[arg(long, env = "HAPSIGN_HELPER_SCRIPT", default_value = "sign.js")]
    helper_script: PathBuf,
    /// Print the command with passwords masked instead of running it
    #[arg(long)]
    dry_run: bool,
    /// Verbose output (-vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Only report errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = match (quiet, verbose) {
        (true, _) => EnvFilter::new("error"),
        (false, 0) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        (false, 1) => EnvFilter::new("debug"),
        (false, _) => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn build_settings(cli: &Cli) -> anyhow::Result<SignSettings> {
    let working_dir = std::env::current_dir()
        .context("Failed to determine the current directory")?;

    let tool_home = if cli.require_tool_home {
        ToolHome::required(cli.tool_home.clone())
    } else {
        ToolHome::with_default(cli.tool_home.clone())
    };

    let mut settings = SignSettings::new(working_dir, &tool_home)?;
    settings.profile_path = cli.profile.clone();
    settings.java = cli.java.clone();
    settings.helper = HelperCommand {
        program: cli.helper_program.clone(),
        script: cli.helper_script.clone(),
    };

    Ok(settings)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let settings = match build_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            // hapsign errors already carry their cause in the message
            match e.downcast_ref::<hapsign::Error>() {
                Some(err) => tracing::error!("{}", err),
                None => tracing::error!("{:#}", e),
            }
            return ExitCode::FAILURE;
        }
    };

    match sign::sign_app_cmd(settings, &cli.in_file, &cli.out_file, cli.dry_run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            let code = u8::try_from(e.exit_code()).unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
