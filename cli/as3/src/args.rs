//! CLI argument definitions for as3.

use as3_cli_common::LogLevel;
use clap::{Args, Parser, Subcommand};

/// Fast S3 listing.
///
/// Lists a bucket prefix with many concurrent ListObjectsV2 requests, one per
/// folder, instead of paging through the whole prefix sequentially.
///
/// ## Examples
///
/// List every key under a prefix:
///   as3 ls s3://my-bucket/logs/
///
/// Count objects, listing at most two folder levels separately:
///   as3 du s3://my-bucket/logs/ --max-level 2 --parallelism 50
#[derive(Parser, Debug)]
#[command(name = "as3")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level
    #[arg(long, value_enum, default_value = "warn", global = true)]
    pub log_level: LogLevel,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List objects in an S3 bucket.
    ///
    /// Example: as3 ls s3://bucket/key
    Ls(ListArgs),

    /// Show count and size for objects in an S3 bucket.
    ///
    /// Example: as3 du s3://bucket/key
    Du(ListArgs),
}

/// Options shared by every listing command.
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// S3 URL of the prefix to list (s3://bucket/key)
    pub s3_url: String,

    // === Crawl Options ===
    /// The maximum folder levels to traverse in separate requests. By default, traverse all levels.
    #[arg(short = 'l', long)]
    pub max_level: Option<usize>,

    /// The maximum number of folders to list in one request. By default, list all folders.
    #[arg(short = 'f', long, value_parser = parse_positive_usize)]
    pub max_folders: Option<usize>,

    /// Repeat the operation multiple times to calculate average elapsed time.
    #[arg(short, long, default_value = "1", value_parser = parse_positive_usize)]
    pub repeat: usize,

    /// The maximum number of concurrent requests to AWS S3.
    #[arg(short, long, default_value = "100", value_parser = parse_positive_usize)]
    pub parallelism: usize,

    /// Delimiter for 'folders'.
    #[arg(short, long, default_value = "/", value_parser = parse_delimiter)]
    pub delimiter: char,

    // === S3 Configuration ===
    /// Custom S3 endpoint URL (for LocalStack)
    #[arg(long, env = "AS3_S3_ENDPOINT")]
    pub endpoint: Option<String>,

    /// AWS region
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// AWS profile name
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30", value_parser = parse_positive_u64)]
    pub timeout: u64,
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}

fn parse_positive_u64(s: &str) -> Result<u64, String> {
    parse_positive_usize(s).map(|v| v as u64)
}

fn parse_delimiter(s: &str) -> Result<char, String> {
    as3_crawler::parse_delimiter(s).map_err(|_| "Delimiter must be exactly one character.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_args(argv: &[&str]) -> ListArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Ls(args) | Command::Du(args) => args,
        }
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["as3", "du", "s3://bucket/key"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Warn);

        let Command::Du(args) = cli.command else {
            panic!("expected du");
        };
        assert_eq!(args.s3_url, "s3://bucket/key");
        assert_eq!(args.max_level, None);
        assert_eq!(args.max_folders, None);
        assert_eq!(args.repeat, 1);
        assert_eq!(args.parallelism, 100);
        assert_eq!(args.delimiter, '/');
    }

    #[test]
    fn test_short_flags() {
        let args = list_args(&[
            "as3", "ls", "s3://b/", "-l", "2", "-f", "5", "-r", "3", "-p", "8", "-d", "_",
        ]);
        assert_eq!(args.max_level, Some(2));
        assert_eq!(args.max_folders, Some(5));
        assert_eq!(args.repeat, 3);
        assert_eq!(args.parallelism, 8);
        assert_eq!(args.delimiter, '_');
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["as3", "ls", "s3://b/", "-d", "ab"]).is_err());
        assert!(Cli::try_parse_from(["as3", "ls", "s3://b/", "-p", "0"]).is_err());
        assert!(Cli::try_parse_from(["as3", "ls", "s3://b/", "-r", "0"]).is_err());
        assert!(Cli::try_parse_from(["as3", "ls", "s3://b/", "-f", "0"]).is_err());
        assert!(Cli::try_parse_from(["as3", "ls"]).is_err());
    }

    #[test]
    fn test_delimiter_message() {
        let err = parse_delimiter("ab").unwrap_err();
        assert_eq!(err, "Delimiter must be exactly one character.");
    }

    #[test]
    fn test_log_level_is_global() {
        let cli = Cli::try_parse_from(["as3", "ls", "s3://b/", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
    }
}
