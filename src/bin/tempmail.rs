#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for disposable mailboxes: runs the proxy or talks to it

use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tempmail_proxy::{
    AttachmentAction, AttachmentBlob, AttachmentOutcome, BannerKind, ClientConfig,
    FileSessionStore, Inbox, MessageDetail, MessageSummary, PreviewCategory, PreviewContent,
    ProxyClient, ProxyConfig, ProxyServer, format_size,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tempmail")]
#[command(about = "Disposable mailboxes through a mail.tm-style provider")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP proxy
    Serve,

    #[command(flatten)]
    Client(ClientCommand),
}

/// Commands that talk to a running proxy.
#[derive(Subcommand)]
enum ClientCommand {
    /// Generate a new mailbox, replacing the current one
    Generate,

    /// Show the current mailbox address
    Whoami,

    /// Refresh and list the inbox
    Inbox,

    /// Open a message and mark it read
    Read {
        /// Message id
        id: String,
    },

    /// Delete a message
    Delete {
        /// Message id
        id: String,

        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },

    /// Preview or save an attachment
    Attachment {
        /// Message id
        message_id: String,

        /// Attachment id
        attachment_id: String,

        /// Preview instead of downloading
        #[arg(long)]
        view: bool,

        /// Where to write the file (defaults to its own name)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let command = match &args.command {
        Command::Serve => {
            let config = ProxyConfig::from_env()?;
            ProxyServer::bind(&config).await?.run().await?;
            return Ok(());
        }
        Command::Client(command) => command,
    };

    let config = ClientConfig::from_env()?;
    let client = ProxyClient::new(&config.proxy_url)?;
    let mut inbox = Inbox::restore(client, FileSessionStore::new(config.session_file)).await?;

    match command {
        ClientCommand::Generate => cmd_generate(&mut inbox, &args).await?,
        ClientCommand::Whoami => cmd_whoami(&inbox, &args)?,
        ClientCommand::Inbox => cmd_inbox(&mut inbox, &args).await?,
        ClientCommand::Read { id } => cmd_read(&mut inbox, &args, id).await?,
        ClientCommand::Delete { id, yes } => cmd_delete(&mut inbox, &args, id, *yes).await?,
        ClientCommand::Attachment {
            message_id,
            attachment_id,
            view,
            output,
        } => {
            cmd_attachment(
                &mut inbox,
                message_id,
                attachment_id,
                *view,
                output.as_deref(),
            )
            .await?;
        }
    }

    if let Some(banner) = inbox.banner() {
        match banner.kind {
            BannerKind::Error => eprintln!("warning: {}", banner.text),
            BannerKind::Info => eprintln!("{}", banner.text),
        }
    }

    Ok(())
}

type FileInbox = Inbox<FileSessionStore>;

async fn cmd_generate(inbox: &mut FileInbox, args: &Args) -> anyhow::Result<()> {
    let session = inbox.generate().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(session)?);
    } else {
        println!("{}", session.address);
    }

    Ok(())
}

fn cmd_whoami(inbox: &FileInbox, args: &Args) -> anyhow::Result<()> {
    let Some(session) = inbox.session() else {
        return Err(tempmail_proxy::Error::NoSession.into());
    };

    if args.json {
        println!("{}", serde_json::json!({ "email": session.address }));
    } else {
        println!("{}", session.address);
    }

    Ok(())
}

async fn cmd_inbox(inbox: &mut FileInbox, args: &Args) -> anyhow::Result<()> {
    let messages = inbox.refresh().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(messages)?);
    } else {
        print_message_table(messages);
    }

    Ok(())
}

async fn cmd_read(inbox: &mut FileInbox, args: &Args, id: &str) -> anyhow::Result<()> {
    let detail = inbox.open_message(id).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(detail)?);
    } else {
        print_message_detail(detail);
    }

    Ok(())
}

async fn cmd_delete(
    inbox: &mut FileInbox,
    args: &Args,
    id: &str,
    yes: bool,
) -> anyhow::Result<()> {
    let deleted = inbox
        .delete_message(id, |id| yes || confirm(&format!("Delete message {id}?")))
        .await?;

    if args.json {
        println!("{}", serde_json::json!({ "id": id, "deleted": deleted }));
    } else if !deleted {
        println!("Cancelled.");
    }

    Ok(())
}

async fn cmd_attachment(
    inbox: &mut FileInbox,
    message_id: &str,
    attachment_id: &str,
    view: bool,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    inbox.open_message(message_id).await?;

    let action = if view {
        AttachmentAction::View
    } else {
        AttachmentAction::Download
    };

    match inbox.view_attachment(attachment_id, action).await? {
        AttachmentOutcome::Previewing => {
            let Some(preview) = inbox.preview() else {
                return Ok(());
            };
            match &preview.content {
                PreviewContent::Text(text) => println!("{text}"),
                PreviewContent::Image(bytes)
                | PreviewContent::Audio(bytes)
                | PreviewContent::Video(bytes) => {
                    let path = output.map_or_else(
                        || local_file_name(&preview.title, attachment_id),
                        Path::to_path_buf,
                    );
                    tokio::fs::write(&path, bytes).await?;
                    println!("{} preview written to {}", preview.category, path.display());
                }
            }
            inbox.close_preview();
        }
        AttachmentOutcome::OpenExternally(blob) => {
            let path = output.map_or_else(
                || std::env::temp_dir().join(local_file_name(&blob.filename, attachment_id)),
                Path::to_path_buf,
            );
            save_blob(&blob, &path).await?;
            println!("Open {} to view it", path.display());
        }
        AttachmentOutcome::Save(blob) => {
            let path = output.map_or_else(
                || local_file_name(&blob.filename, attachment_id),
                Path::to_path_buf,
            );
            save_blob(&blob, &path).await?;
            let size = u64::try_from(blob.bytes.len()).unwrap_or(u64::MAX);
            println!("Saved {} ({})", path.display(), format_size(size));
        }
    }

    Ok(())
}

/// Reduce a sender-supplied attachment name to a bare file name, so it
/// can only land in the directory it is joined to. Falls back to
/// `fallback` when nothing usable is left.
fn local_file_name(name: &str, fallback: &str) -> PathBuf {
    Path::new(name)
        .file_name()
        .or_else(|| Path::new(fallback).file_name())
        .map_or_else(|| PathBuf::from("attachment"), PathBuf::from)
}

async fn save_blob(blob: &AttachmentBlob, path: &Path) -> anyhow::Result<()> {
    tokio::fs::write(path, &blob.bytes).await?;
    Ok(())
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn print_message_table(messages: &[MessageSummary]) {
    if messages.is_empty() {
        println!("Waiting for emails...");
        return;
    }

    let header = format!(
        "{:<26} {:<5} {:<20} {:<28} {}",
        "ID", "", "Date", "From", "Subject"
    );
    println!("{header}");
    println!("{}", "-".repeat(110));

    for (index, message) in messages.iter().enumerate() {
        let subject = if message.subject.is_empty() {
            format!("Message {}", index + 1)
        } else {
            message.subject.clone()
        };
        println!(
            "{:<26} {:<5} {:<20} {:<28} {}",
            truncate(&message.id, 26),
            if message.seen { "Read" } else { "New" },
            message.created_at.format("%Y-%m-%d %H:%M"),
            truncate(message.from.display(), 26),
            truncate(&subject, 40),
        );
    }

    println!("\n{} message(s)", messages.len());
}

fn print_message_detail(detail: &MessageDetail) {
    let summary = &detail.summary;
    println!("From:    {} <{}>", summary.from.display(), summary.from.address);
    println!(
        "To:      {}",
        detail
            .to
            .first()
            .map_or("Unknown Recipient", |to| to.address.as_str())
    );
    println!("Date:    {}", summary.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!(
        "Subject: {}",
        if summary.subject.is_empty() {
            "No Subject"
        } else {
            summary.subject.as_str()
        }
    );

    println!("\n--- Body ---\n");
    println!("{}", detail.display_body());

    if !detail.attachments.is_empty() {
        println!("\n--- Attachments ({}) ---", detail.attachments.len());
        for attachment in &detail.attachments {
            let category = PreviewCategory::of(attachment);
            println!(
                "  {:<26} {:<32} {:>10}  {}{}",
                attachment.id,
                truncate(&attachment.filename, 30),
                format_size(attachment.size),
                category,
                if category.is_previewable() {
                    ""
                } else {
                    " (download only)"
                },
            );
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
