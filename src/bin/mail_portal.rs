use anyhow::{Result, anyhow, bail};
use clap::{Parser, Subcommand};
use env_logger::{Env, Target};
use std::fs::OpenOptions;

use mail_portal::config::{load_config, log_path};
use mail_portal::portal::Portal;
use mail_portal::terminal::run_tui;
use mail_portal::terminal::ui::dashboard_rows;

#[derive(Parser)]
#[command(name = "mail_portal")]
#[command(about = "Terminal client for the email portal backend", long_about = None)]
struct Cli {
    /// Backend base url, e.g. http://localhost:8000/api
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the interactive client (default)
    Tui,

    /// Print the emails of the stored session
    Emails,

    /// Download one attachment into the download dir
    Download {
        #[arg(long)]
        email_id: String,

        #[arg(long)]
        filename: String,
    },

    /// Forget the stored session
    Logout,

    /// Show who is logged in
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cmd = cli.cmd.unwrap_or(Command::Tui);

    init_logging(matches!(cmd, Command::Tui))?;

    let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
    let mut portal = Portal::from_config(&cfg, cli.api_url.as_deref())?;

    match cmd {
        Command::Tui => {
            color_eyre::install().map_err(|e| anyhow!("{e}"))?;
            portal.restore();
            run_tui(&mut portal)
        }

        Command::Emails => {
            signed_in(&mut portal)?;
            if let Some(err) = portal.error() {
                bail!("{err}");
            }
            let emails = portal.emails();
            for (email, row) in emails.iter().zip(dashboard_rows(emails)) {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    email.id,
                    row.received,
                    row.sender,
                    row.subject,
                    row.badge.unwrap_or_default()
                );
                for att in row.attachments {
                    println!("\t- {} ({})", att.filename, att.size);
                }
            }
            println!("{} emails found", emails.len());
            Ok(())
        }

        Command::Download { email_id, filename } => {
            signed_in(&mut portal)?;
            portal.download_attachment(&email_id, &filename);
            if let Some(err) = portal.error() {
                bail!("{err}");
            }
            if let Some(ok) = portal.success() {
                println!("{ok}");
            }
            Ok(())
        }

        Command::Logout => {
            portal.logout();
            println!("Logged out");
            Ok(())
        }

        Command::Status => {
            portal.restore();
            match portal.user() {
                Some(user) => println!("Logged in as {}", user.email),
                None => println!("Not logged in"),
            }
            Ok(())
        }
    }
}

fn signed_in(portal: &mut Portal) -> Result<()> {
    portal.restore();
    if portal.user().is_none() {
        let reason = portal.error().unwrap_or("Not logged in");
        bail!("{reason} (run `mail_portal tui` to sign in)");
    }
    Ok(())
}

/// The TUI owns the terminal, so it logs to a file instead of stderr.
fn init_logging(to_file: bool) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    if to_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path()?)?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}
