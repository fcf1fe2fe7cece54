use std::path::Path;

use anyhow::Context;
use blobcup_identity::{FileIdentityStore, IdentityProvider};
use blobcup_sdk::{
    AppConfig, AzureBlobStore, Blobcup, Candidate, Side, Step, VoteOutcome, WorldCup,
};
use blobcup_types::format_file_size;
use bytes::Bytes;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(&path)
        .with_context(|| format!("loading config from {}", path.display()))?;
    debug!(path = %path.display(), categories = config.categories.len(), "config loaded");

    match cli.command {
        Command::Categories => cmd_categories(&config),
        Command::Whoami => cmd_whoami(&config),
        Command::Ls(args) => cmd_ls(&connect(config)?, args).await,
        Command::Upload(args) => cmd_upload(&connect(config)?, args).await,
        Command::Board(args) => cmd_board(&connect(config)?, args).await,
        Command::Vote(args) => cmd_vote(&connect(config)?, args).await,
        Command::Cup(args) => cmd_cup(&connect(config)?, args).await,
    }
}

type Client = Blobcup<AzureBlobStore, FileIdentityStore>;

fn connect(config: AppConfig) -> anyhow::Result<Client> {
    Blobcup::connect(config).context("connecting to the blob store")
}

fn uploader(candidate: &Candidate) -> &str {
    candidate.uploader.as_deref().unwrap_or("unknown")
}

fn cmd_categories(config: &AppConfig) -> anyhow::Result<()> {
    for c in &config.categories {
        println!(
            "  {:<18} {:<10} {:<12} {}",
            c.id.bold(),
            c.kind.to_string().cyan(),
            c.container.dimmed(),
            c.name
        );
    }
    Ok(())
}

fn cmd_whoami(config: &AppConfig) -> anyhow::Result<()> {
    let identity = FileIdentityStore::open(config.resolved_profile_path())?;
    let voter = identity.voter_id()?;
    println!("Voter: {}", voter.as_str().yellow().bold());
    println!("Profile: {}", identity.path().display());
    let profile = identity.snapshot();
    if profile.ballots.is_empty() {
        println!("No local ballots.");
    }
    for (scope, candidate) in &profile.ballots {
        println!("  {} → {}", scope.bold(), candidate.as_str().green());
    }
    Ok(())
}

async fn cmd_ls(client: &Client, args: LsArgs) -> anyhow::Result<()> {
    let entries = client.list(&args.category).await?;
    if entries.is_empty() {
        println!("No files in {}.", args.category.bold());
        return Ok(());
    }
    for e in &entries {
        let modified = e
            .last_modified
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{} {:<40} {:>10}  {}",
            e.kind().icon(),
            e.name,
            format_file_size(e.size),
            modified.dimmed()
        );
    }
    println!("{} file(s)", entries.len().to_string().bold());
    Ok(())
}

async fn cmd_upload(client: &Client, args: UploadArgs) -> anyhow::Result<()> {
    let file_name = args
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no usable file name", args.path.display()))?;
    let data = tokio::fs::read(&args.path)
        .await
        .with_context(|| format!("reading {}", args.path.display()))?;
    let content_type = args
        .content_type
        .clone()
        .unwrap_or_else(|| guess_content_type(&args.path).to_string());

    let receipt = client
        .upload(
            &args.category,
            file_name,
            Bytes::from(data),
            &content_type,
            args.email.as_deref(),
        )
        .await?;
    println!("{} Uploaded {}", "✓".green().bold(), receipt.key.yellow());
    if let Some(email) = &receipt.email {
        println!("  Uploader: {}", email);
    }
    println!("  {}", receipt.locator.blue());
    Ok(())
}

async fn cmd_board(client: &Client, args: BoardArgs) -> anyhow::Result<()> {
    let board = client.board(&args.category).await?;
    if board.entries.is_empty() {
        println!("No images to vote on in {}.", board.category.name.bold());
        return Ok(());
    }
    println!("{} ({} votes)", board.category.name.bold(), board.total_votes);
    for entry in board.ranked() {
        let marker = if entry.mine { "★".yellow().bold() } else { " ".normal() };
        println!(
            "{} {:>4}  {:<40} {}",
            marker,
            entry.votes.to_string().bold(),
            entry.candidate.id.as_str(),
            uploader(&entry.candidate).dimmed()
        );
    }
    match &board.my_vote {
        Some(id) => println!("Your vote: {}", id.as_str().green()),
        None => println!("You have not voted yet."),
    }
    Ok(())
}

async fn cmd_vote(client: &Client, args: VoteArgs) -> anyhow::Result<()> {
    match client.vote(&args.category, &args.candidate).await? {
        VoteOutcome::Recorded { ledger, previous } => {
            println!("{} Voted for {}", "✓".green().bold(), args.candidate.yellow());
            if let Some(previous) = previous {
                println!("  Moved from {}", previous.as_str().dimmed());
            }
            println!("  Tally: {}", ledger.tally(&args.candidate));
        }
        VoteOutcome::Unchanged => println!("Already voted for {}.", args.candidate.yellow()),
        VoteOutcome::Busy => println!("{} A vote is still being saved.", "!".red()),
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Choice {
    Pick(Side),
    Restart,
    Quit,
}

fn parse_choice(line: &str) -> Option<Choice> {
    match line.trim() {
        "1" => Some(Choice::Pick(Side::Left)),
        "2" => Some(Choice::Pick(Side::Right)),
        "r" | "R" => Some(Choice::Restart),
        "q" | "Q" => Some(Choice::Quit),
        _ => None,
    }
}

async fn cmd_cup(client: &Client, args: CupArgs) -> anyhow::Result<()> {
    let mut cup = client.world_cup(&args.category).await?;
    println!("{} ({} entrants)", cup.category().name.bold(), cup.entrants());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let pairing = match cup.next_match() {
            Step::Insufficient => {
                println!("A world cup needs at least 2 images.");
                return Ok(());
            }
            Step::Champion(winner) => {
                print_champion(&cup, &winner);
                return Ok(());
            }
            Step::Match(pairing) => pairing,
        };

        println!();
        println!(
            "{} (round {})",
            pairing.round.to_string().cyan().bold(),
            pairing.round_number
        );
        println!(
            "  [1] {}  {}",
            pairing.left.id.as_str().bold(),
            uploader(&pairing.left).dimmed()
        );
        println!("      {}", pairing.left.locator.blue());
        println!(
            "  [2] {}  {}",
            pairing.right.id.as_str().bold(),
            uploader(&pairing.right).dimmed()
        );
        println!("      {}", pairing.right.locator.blue());
        println!("Pick 1 or 2 (r: restart, q: quit)");

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        match parse_choice(&line) {
            Some(Choice::Pick(side)) => cup.pick(side)?,
            Some(Choice::Restart) => {
                cup.restart();
                println!("{}", "Restarted.".yellow());
            }
            Some(Choice::Quit) => return Ok(()),
            None => println!("{} unrecognised choice {:?}", "!".red(), line.trim()),
        }
    }
}

fn print_champion(cup: &WorldCup, winner: &Candidate) {
    println!();
    println!(
        "{} Champion of {}: {}",
        "🏆".bold(),
        cup.category().name.bold(),
        winner.id.as_str().yellow().bold()
    );
    println!("  Uploader: {}", uploader(winner));
    println!("  {}", winner.locator.blue());
}

fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "zip" => "application/zip",
        "txt" | "md" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobcup_types::ContentKind;

    #[test]
    fn choices() {
        assert_eq!(parse_choice("1\n"), Some(Choice::Pick(Side::Left)));
        assert_eq!(parse_choice(" 2 "), Some(Choice::Pick(Side::Right)));
        assert_eq!(parse_choice("r"), Some(Choice::Restart));
        assert_eq!(parse_choice("Q"), Some(Choice::Quit));
        assert_eq!(parse_choice("3"), None);
        assert_eq!(parse_choice(""), None);
    }

    #[test]
    fn guessed_types_classify_like_listings() {
        assert_eq!(guess_content_type(Path::new("a/Cat.PNG")), "image/png");
        let kind = |name: &str| ContentKind::from_mime(guess_content_type(Path::new(name)));
        assert_eq!(kind("r.docx"), ContentKind::Word);
        assert_eq!(kind("s.xlsx"), ContentKind::Spreadsheet);
        assert_eq!(guess_content_type(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn unknown_uploader_label() {
        let id = blobcup_sdk::CandidateId::new("1_a.png").unwrap();
        let c = Candidate::new(id, "memory://images/1_a.png");
        assert_eq!(uploader(&c), "unknown");
        assert_eq!(uploader(&c.with_uploader("a@x.com")), "a@x.com");
    }
}
