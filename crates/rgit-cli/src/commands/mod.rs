pub mod add;
pub mod cat_file;
pub mod check_ignore;
pub mod checkout;
pub mod commit;
pub mod hash_object;
pub mod init;
pub mod log;
pub mod ls_files;
pub mod ls_tree;
pub mod rev_parse;
pub mod rm;
pub mod show_ref;
pub mod status;
pub mod tag;

use anyhow::Result;
use clap::Subcommand;

use crate::Cli;

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty Git repository
    Init(init::InitArgs),
    /// Provide content or type information for a repository object
    CatFile(cat_file::CatFileArgs),
    /// Compute the object ID for a file, optionally writing it to the object database
    HashObject(hash_object::HashObjectArgs),
    /// Show the commit ancestry graph reachable from a commit
    Log(log::LogArgs),
    /// List the contents of a tree object
    LsTree(ls_tree::LsTreeArgs),
    /// Materialize a commit's tree into a new directory
    Checkout(checkout::CheckoutArgs),
    /// List references in the repository
    ShowRef(show_ref::ShowRefArgs),
    /// Create, list, or delete tags
    Tag(tag::TagArgs),
    /// Resolve a name to an object ID
    RevParse(rev_parse::RevParseArgs),
    /// Show information about files in the index
    LsFiles(ls_files::LsFilesArgs),
    /// Check whether paths are excluded by gitignore rules
    CheckIgnore(check_ignore::CheckIgnoreArgs),
    /// Show the working tree status
    Status(status::StatusArgs),
    /// Remove files from the working tree and the index
    Rm(rm::RmArgs),
    /// Add file contents to the index
    Add(add::AddArgs),
    /// Record changes to the repository
    Commit(commit::CommitArgs),
}

impl Commands {
    /// Get the command name as used in error messages.
    pub fn command_name(&self) -> &str {
        match self {
            Commands::Init(_) => "init",
            Commands::CatFile(_) => "cat-file",
            Commands::HashObject(_) => "hash-object",
            Commands::Log(_) => "log",
            Commands::LsTree(_) => "ls-tree",
            Commands::Checkout(_) => "checkout",
            Commands::ShowRef(_) => "show-ref",
            Commands::Tag(_) => "tag",
            Commands::RevParse(_) => "rev-parse",
            Commands::LsFiles(_) => "ls-files",
            Commands::CheckIgnore(_) => "check-ignore",
            Commands::Status(_) => "status",
            Commands::Rm(_) => "rm",
            Commands::Add(_) => "add",
            Commands::Commit(_) => "commit",
        }
    }
}

/// Discover the repository rooted at (or above) the current directory.
pub fn open_repo(_cli: &Cli) -> Result<rgit_repository::Repository> {
    Ok(rgit_repository::Repository::discover(".")?)
}

pub fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Init(args) => init::run(args, &cli),
        Commands::CatFile(args) => cat_file::run(args, &cli),
        Commands::HashObject(args) => hash_object::run(args, &cli),
        Commands::Log(args) => log::run(args, &cli),
        Commands::LsTree(args) => ls_tree::run(args, &cli),
        Commands::Checkout(args) => checkout::run(args, &cli),
        Commands::ShowRef(args) => show_ref::run(args, &cli),
        Commands::Tag(args) => tag::run(args, &cli),
        Commands::RevParse(args) => rev_parse::run(args, &cli),
        Commands::LsFiles(args) => ls_files::run(args, &cli),
        Commands::CheckIgnore(args) => check_ignore::run(args, &cli),
        Commands::Status(args) => status::run(args, &cli),
        Commands::Rm(args) => rm::run(args, &cli),
        Commands::Add(args) => add::run(args, &cli),
        Commands::Commit(args) => commit::run(args, &cli),
    }
}
