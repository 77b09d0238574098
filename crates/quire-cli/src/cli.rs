//! Command-line surface

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "quire",
    about = "Keep a documentation catalog's category, topic and document files in sync",
    version
)]
pub(crate) struct Cli {
    /// Catalog root (default: QUIRE_ROOT, PROJECT_ROOT, then the working directory)
    #[clap(long, global = true)]
    pub(crate) root: Option<PathBuf>,

    /// Log as JSON lines on stderr
    #[clap(long, global = true)]
    pub(crate) json: bool,

    #[clap(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Create the catalog directories and empty index files
    Init,

    /// Manage categories
    Category {
        #[clap(subcommand)]
        command: CategoryCommand,
    },

    /// Manage topics
    Topic {
        #[clap(subcommand)]
        command: TopicCommand,
    },

    /// List the documents of a topic
    Docs {
        /// Topic slug
        topic: String,
    },

    /// List snapshots of a catalog file, oldest first
    Backups {
        /// File path, relative to the catalog root
        file: PathBuf,
    },

    /// Restore a catalog file from its latest snapshot
    Restore {
        /// File path, relative to the catalog root
        file: PathBuf,
    },

    /// Print file change notifications as JSON lines until interrupted
    Watch,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CategoryCommand {
    /// Show categories with topic and article counts
    List,

    /// Append an empty category
    Add {
        /// Display title
        title: String,
        /// URL slug, also the id
        slug: String,
    },

    /// Change a category's title or slug
    Update {
        /// Current id
        id: String,
        /// New title
        #[clap(long)]
        title: Option<String>,
        /// New slug
        #[clap(long)]
        slug: Option<String>,
    },

    /// Delete an empty category
    Delete {
        /// Category id
        id: String,
    },

    /// Put categories in the given order
    Reorder {
        /// Category ids; unlisted ones follow
        #[clap(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum TopicCommand {
    /// Print a topic with its chapters and articles
    Show {
        /// Topic slug
        slug: String,
    },

    /// Create a topic under a category
    Add(AddTopic),

    /// Replace a topic's details from a JSON file
    Update {
        /// Topic JSON, as printed by `topic show`
        #[clap(long)]
        file: PathBuf,
    },

    /// Delete a topic without articles
    Delete {
        /// Topic slug
        slug: String,
    },

    /// Redistribute topics from a JSON map of category id to slugs
    Reorder {
        /// JSON object, e.g. {"backend": ["go", "rust"]}
        #[clap(long)]
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
pub(crate) struct AddTopic {
    /// Owning category id
    pub(crate) category: String,
    /// Display name
    pub(crate) name: String,
    /// URL slug
    pub(crate) slug: String,
    /// Short description
    #[clap(long, default_value = "")]
    pub(crate) description: String,
    /// Cover image
    #[clap(long, default_value = "")]
    pub(crate) image: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["quire", "category", "list", "--root", "/site", "--json"]).unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/site")));
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Command::Category {
                command: CategoryCommand::List
            }
        ));
    }

    #[test]
    fn topic_add_defaults() {
        let cli = Cli::try_parse_from(["quire", "topic", "add", "backend", "Go", "go"]).unwrap();
        let Command::Topic {
            command: TopicCommand::Add(add),
        } = cli.command
        else {
            panic!("expected topic add");
        };
        assert_eq!(add.category, "backend");
        assert_eq!(add.slug, "go");
        assert!(add.description.is_empty());
    }

    #[test]
    fn reorder_needs_ids() {
        assert!(Cli::try_parse_from(["quire", "category", "reorder"]).is_err());
        assert!(Cli::try_parse_from(["quire", "topic", "update"]).is_err());
    }
}
