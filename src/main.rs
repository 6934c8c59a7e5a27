use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lexicon_tools::config::{self, Overrides};
use lexicon_tools::confirm::{AlwaysApprove, AlwaysDecline, ConfirmationPolicy, TerminalPrompt};
use lexicon_tools::gateway::CkanGateway;
use lexicon_tools::{Result, logging, sync};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    logging::init(cli.verbose)?;
    match cli.command {
        Command::Download(args) => execute_download(cli.remote, args),
        Command::Upload(args) => execute_upload(cli.remote, args),
        Command::Convert(args) => sync::convert(&args.path),
    }
}

fn connect(remote: RemoteArgs) -> Result<CkanGateway> {
    let credentials = config::resolve(Overrides {
        site: remote.site,
        api_key: remote.api_key,
        config: remote.config,
    })?;
    Ok(CkanGateway::new(credentials))
}

fn execute_download(remote: RemoteArgs, args: DownloadArgs) -> Result<()> {
    let gateway = connect(remote)?;
    let report = sync::download(&gateway, &args.resource_id, &args.output_dir)?;
    match report.field_count {
        Some(count) => println!(
            "Saved data dictionary ({count} fields) to {}",
            report.path.display()
        ),
        None => println!(
            "Resource {} has no datastore table; wrote null to {}",
            args.resource_id,
            report.path.display()
        ),
    }
    Ok(())
}

fn execute_upload(remote: RemoteArgs, args: UploadArgs) -> Result<()> {
    let gateway = connect(remote)?;
    let mut policy: Box<dyn ConfirmationPolicy> = if args.yes {
        Box::new(AlwaysApprove)
    } else if args.no_input {
        Box::new(AlwaysDecline)
    } else {
        Box::new(TerminalPrompt::stdio())
    };

    let report = sync::upload(
        &gateway,
        &args.resource_id,
        &args.path,
        policy.as_mut(),
        args.dry_run,
    )?;

    match &report.ack {
        Some(ack) => println!(
            "Updated data dictionary of {} ({} fields, {} type changes)",
            ack.resource_id,
            ack.field_count,
            report.approved_changes.len()
        ),
        None => {
            println!("{}", serde_json::to_string_pretty(&report.fields)?);
            println!(
                "Dry run: {} fields would be written to {}",
                report.fields.len(),
                args.resource_id
            );
        }
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    name = "lexicon",
    author,
    version,
    about = "Download and upload CKAN integrated data dictionaries."
)]
struct Cli {
    #[command(flatten)]
    remote: RemoteArgs,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct RemoteArgs {
    /// Base URL of the CKAN site.
    #[arg(long, env = "LEXICON_SITE", global = true)]
    site: Option<String>,

    /// CKAN API key.
    #[arg(long, env = "LEXICON_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Credentials file to use instead of ~/.lexicon/credentials.yaml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Save a resource's data dictionary as <resource_id>-dd.json.
    Download(DownloadArgs),
    /// Validate a definitions file and write it as the resource's data dictionary.
    Upload(UploadArgs),
    /// Convert a data dictionary to the catalog layout (not supported yet).
    Convert(ConvertArgs),
}

#[derive(Args)]
struct DownloadArgs {
    /// Identifier of the tabular resource.
    resource_id: String,

    /// Directory to write the dictionary into.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Args)]
struct UploadArgs {
    /// Identifier of the tabular resource.
    resource_id: String,

    /// Definitions file (.csv, .xlsx, or a downloaded .json dictionary).
    path: PathBuf,

    /// Approve every type change without asking.
    #[arg(long, conflicts_with = "no_input")]
    yes: bool,

    /// Never prompt; any type change aborts the upload.
    #[arg(long)]
    no_input: bool,

    /// Validate and show the fields that would be written, without writing.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct ConvertArgs {
    /// Data dictionary file to convert.
    path: PathBuf,
}
