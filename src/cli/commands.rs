use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pd", about = concat!("passdeck v", env!("CARGO_PKG_VERSION"), " - ordered, grouped credential entries"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: <config dir>/passdeck/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Store file, overriding the config
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the config file and an empty store
    Init(InitArgs),
    /// List entries in display order
    List(ListArgs),
    /// List groups with entry counts
    Groups,
    /// List every tag in use
    Tags,
    /// Show entry details
    Show(ShowArgs),
    /// Add an entry
    Add(AddArgs),
    /// Edit an entry
    Edit(EditArgs),
    /// Move an entry to a group, or out of every group
    Mv(MvArgs),
    /// Reorder an entry onto another entry's position
    Order(OrderArgs),
    /// Delete one or more entries
    Rm(RmArgs),
    /// Group management
    Group(GroupCmd),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config file with defaults
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Only entries in this group
    #[arg(long)]
    pub group: Option<String>,
    /// Case-insensitive text to match in title, username, urls or notes
    #[arg(long, short = 's')]
    pub search: Option<String>,
    /// Only entries carrying this tag
    #[arg(long)]
    pub tag: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Entry ID
    pub id: String,
    /// Print the password in clear
    #[arg(long)]
    pub reveal: bool,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Entry title
    pub title: String,
    #[arg(long, short = 'u')]
    pub username: Option<String>,
    #[arg(long, short = 'p')]
    pub password: Option<String>,
    /// URL (repeatable)
    #[arg(long)]
    pub url: Vec<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Tag (repeatable)
    #[arg(long)]
    pub tag: Vec<String>,
    /// Group ID
    #[arg(long)]
    pub group: Option<String>,
    #[arg(long)]
    pub icon: Option<String>,
    /// Base32 TOTP secret
    #[arg(long)]
    pub totp: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Entry ID
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, short = 'u')]
    pub username: Option<String>,
    #[arg(long, short = 'p')]
    pub password: Option<String>,
    /// Replace all URLs (repeatable)
    #[arg(long)]
    pub url: Vec<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Replace all tags (repeatable)
    #[arg(long)]
    pub tag: Vec<String>,
    /// Remove every tag
    #[arg(long, conflicts_with = "tag")]
    pub clear_tags: bool,
    #[arg(long)]
    pub icon: Option<String>,
    /// Base32 TOTP secret
    #[arg(long)]
    pub totp: Option<String>,
    /// Remove the TOTP secret
    #[arg(long, conflicts_with = "totp")]
    pub clear_totp: bool,
}

#[derive(Args)]
pub struct MvArgs {
    /// Entry ID
    pub id: String,
    /// Destination group ID
    #[arg(long, required_unless_present = "ungrouped")]
    pub group: Option<String>,
    /// Remove the entry from its group
    #[arg(long, conflicts_with = "group")]
    pub ungrouped: bool,
}

#[derive(Args)]
pub struct OrderArgs {
    /// Entry ID to move
    pub id: String,
    /// Entry whose position it takes
    #[arg(long)]
    pub onto: String,
    /// Reorder within this group's view
    #[arg(long)]
    pub group: Option<String>,
    /// Reorder within this tag's view
    #[arg(long)]
    pub tag: Option<String>,
}

#[derive(Args)]
pub struct RmArgs {
    /// Entry IDs
    #[arg(required = true)]
    pub ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Group management
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct GroupCmd {
    #[command(subcommand)]
    pub action: GroupAction,
}

#[derive(Subcommand)]
pub enum GroupAction {
    /// Create a group at the end of the list
    Add(GroupAddArgs),
    /// Rename a group or change its icon or color
    Edit(GroupEditArgs),
    /// Move a group onto another group's position
    Order(GroupOrderArgs),
    /// Delete an empty group
    Rm(GroupIdArg),
}

#[derive(Args)]
pub struct GroupAddArgs {
    /// Group name
    pub name: String,
    #[arg(long)]
    pub icon: Option<String>,
}

#[derive(Args)]
pub struct GroupEditArgs {
    /// Group ID
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub icon: Option<String>,
    /// Hex color, e.g. "#3b82f6"
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long, conflicts_with = "color")]
    pub clear_color: bool,
}

#[derive(Args)]
pub struct GroupOrderArgs {
    /// Group ID to move
    pub id: String,
    /// Group whose position it takes
    #[arg(long)]
    pub onto: String,
}

#[derive(Args)]
pub struct GroupIdArg {
    /// Group ID
    pub id: String,
}
