use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "blobcup",
    about = "blobcup: share images, vote on them, crown a world cup winner",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to ~/.blobcup/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List configured categories
    Categories,
    /// List the files of a category
    Ls(LsArgs),
    /// Upload a file into a category
    Upload(UploadArgs),
    /// Show the voting board of a category
    Board(BoardArgs),
    /// Vote for a candidate (moves an earlier vote)
    Vote(VoteArgs),
    /// Play an image world cup
    Cup(CupArgs),
    /// Show this device's voter id and local ballots
    Whoami,
}

#[derive(Args)]
pub struct LsArgs {
    pub category: String,
}

#[derive(Args)]
pub struct UploadArgs {
    pub category: String,
    pub path: PathBuf,
    /// Uploader e-mail, recorded as attribution
    #[arg(short, long)]
    pub email: Option<String>,
    /// Override the content type guessed from the file extension
    #[arg(long)]
    pub content_type: Option<String>,
}

#[derive(Args)]
pub struct BoardArgs {
    pub category: String,
}

#[derive(Args)]
pub struct VoteArgs {
    pub category: String,
    pub candidate: String,
}

#[derive(Args)]
pub struct CupArgs {
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_categories() {
        let cli = Cli::try_parse_from(["blobcup", "categories"]).unwrap();
        assert!(matches!(cli.command, Command::Categories));
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_upload_with_email() {
        let cli = Cli::try_parse_from([
            "blobcup",
            "upload",
            "upload-images",
            "cat.png",
            "-e",
            "me@x.com",
        ])
        .unwrap();
        if let Command::Upload(args) = cli.command {
            assert_eq!(args.category, "upload-images");
            assert_eq!(args.path, PathBuf::from("cat.png"));
            assert_eq!(args.email, Some("me@x.com".into()));
            assert!(args.content_type.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_vote() {
        let cli = Cli::try_parse_from(["blobcup", "vote", "voting", "1700_cat.png"]).unwrap();
        if let Command::Vote(args) = cli.command {
            assert_eq!(args.category, "voting");
            assert_eq!(args.candidate, "1700_cat.png");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "blobcup",
            "cup",
            "worldcup",
            "-v",
            "--config",
            "/tmp/c.toml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Command::Cup(_)));
    }

    #[test]
    fn vote_requires_candidate() {
        assert!(Cli::try_parse_from(["blobcup", "vote", "voting"]).is_err());
    }
}
