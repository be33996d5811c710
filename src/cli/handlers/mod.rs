mod init;
pub use init::cmd_init;

use std::path::PathBuf;

use tracing::debug;

use crate::backend::FileBackend;
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::FileLock;
use crate::model::config::AppConfig;
use crate::ops::entry_ops::{EntryDraft, EntryPatch};
use crate::ops::group_ops::GroupPatch;
use crate::ops::membership::{GroupKey, count_for};
use crate::session::Session;
use crate::session::gateway::Commit;

/// Resolved locations and settings for one invocation
struct Context {
    config: AppConfig,
    store: PathBuf,
    json: bool,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = cli.config.clone().unwrap_or_else(config_io::default_config_path);

    if let Commands::Init(args) = cli.command {
        return cmd_init(args, &config_path, cli.store.as_deref());
    }

    let config = config_io::load_config(&config_path);
    let store = cli.store.clone().unwrap_or_else(|| config_io::store_path(&config));
    debug!(config = %config_path.display(), store = %store.display(), "resolved paths");
    let ctx = Context {
        config,
        store,
        json: cli.json,
    };

    match cli.command {
        // Handled above
        Commands::Init(_) => Ok(()),

        // Read commands
        Commands::List(args) => cmd_list(&ctx, args),
        Commands::Groups => cmd_groups(&ctx),
        Commands::Tags => cmd_tags(&ctx),
        Commands::Show(args) => cmd_show(&ctx, args),

        // Write commands
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::Edit(args) => cmd_edit(&ctx, args),
        Commands::Mv(args) => cmd_mv(&ctx, args),
        Commands::Order(args) => cmd_order(&ctx, args),
        Commands::Rm(args) => cmd_rm(&ctx, args),

        // Group management
        Commands::Group(cmd) => match cmd.action {
            GroupAction::Add(args) => cmd_group_add(&ctx, args),
            GroupAction::Edit(args) => cmd_group_edit(&ctx, args),
            GroupAction::Order(args) => cmd_group_order(&ctx, args),
            GroupAction::Rm(args) => cmd_group_rm(&ctx, args),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_session(ctx: &Context) -> Result<Session<FileBackend>, Box<dyn std::error::Error>> {
    Ok(Session::open(FileBackend::new(&ctx.store), &ctx.config)?)
}

fn print_commit(commit: Commit, what: &str) {
    match commit {
        Commit::Unchanged => println!("{}: no change", what),
        Commit::Applied { .. } => println!("{}", what),
    }
}

fn require_group(session: &Session<FileBackend>, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    if session.group(id).is_none() {
        return Err(format!("group not found: {}", id).into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context, args: ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(ctx)?;
    session.select_group(args.group.as_deref())?;
    session.set_tag(args.tag);
    session.set_search(args.search.unwrap_or_default());
    let entries = session.visible_entries();

    if ctx.json {
        let out: Vec<EntryJson> = entries.iter().map(entry_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        let groups = session.sorted_groups();
        for entry in &entries {
            println!("{}", format_entry_line(entry, &groups));
        }
    }
    Ok(())
}

fn cmd_groups(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session(ctx)?;
    let counts = session.counts_by_group();
    let groups = session.sorted_groups();
    let ungrouped = counts.get(&GroupKey::Ungrouped).copied().unwrap_or(0);
    let total = session.sorted_entries().len();

    if ctx.json {
        let out = GroupListJson {
            groups: groups
                .iter()
                .map(|g| group_to_json(g, count_for(&counts, &g.id)))
                .collect(),
            ungrouped,
            total,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("all ({})", total);
        for group in &groups {
            println!("{}", format_group_line(group, count_for(&counts, &group.id)));
        }
        println!("{} ({})", GroupKey::Ungrouped, ungrouped);
    }
    Ok(())
}

fn cmd_tags(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session(ctx)?;
    let tags = session.all_tags();
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&tags)?);
    } else {
        for tag in &tags {
            println!("#{}", tag);
        }
    }
    Ok(())
}

fn cmd_show(ctx: &Context, args: ShowArgs) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session(ctx)?;
    let entry = session
        .entry(&args.id)
        .ok_or_else(|| format!("entry not found: {}", args.id))?;

    if ctx.json {
        let out = entry_detail_to_json(entry, args.reveal);
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for line in format_entry_detail(entry, &session.sorted_groups(), args.reveal) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = FileLock::acquire_default(&ctx.store)?;
    let mut session = open_session(ctx)?;
    if let Some(group) = &args.group {
        require_group(&session, group)?;
    }

    let id = session.add_entry(EntryDraft {
        title: args.title,
        username: args.username.unwrap_or_default(),
        password: args.password.unwrap_or_default(),
        url: args.url,
        notes: args.notes.unwrap_or_default(),
        totp_secret: args.totp,
        icon: args.icon,
        tags: args.tag,
        group_id: args.group,
    })?;
    println!("{}", id);
    Ok(())
}

fn cmd_edit(ctx: &Context, args: EditArgs) -> Result<(), Box<dyn std::error::Error>> {
    let patch = EntryPatch {
        title: args.title,
        username: args.username,
        password: args.password,
        url: (!args.url.is_empty()).then_some(args.url),
        notes: args.notes,
        totp_secret: if args.clear_totp {
            Some(None)
        } else {
            args.totp.map(Some)
        },
        icon: args.icon.map(Some),
        tags: if args.clear_tags {
            Some(Vec::new())
        } else {
            (!args.tag.is_empty()).then_some(args.tag)
        },
    };
    if patch.is_empty() {
        return Err("nothing to change: pass at least one field".into());
    }

    let _lock = FileLock::acquire_default(&ctx.store)?;
    let mut session = open_session(ctx)?;
    let commit = session.edit_entry(&args.id, patch)?;
    print_commit(commit, &args.id);
    Ok(())
}

fn cmd_mv(ctx: &Context, args: MvArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = FileLock::acquire_default(&ctx.store)?;
    let mut session = open_session(ctx)?;
    let target = if args.ungrouped { None } else { args.group };
    if let Some(group) = &target {
        require_group(&session, group)?;
    }
    let commit = session.move_entry_to_group(&args.id, target.as_deref())?;
    print_commit(commit, &args.id);
    Ok(())
}

fn cmd_order(ctx: &Context, args: OrderArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = FileLock::acquire_default(&ctx.store)?;
    let mut session = open_session(ctx)?;
    session.select_group(args.group.as_deref())?;
    session.set_tag(args.tag);
    let commit = session.reorder_entries(&args.id, &args.onto)?;
    print_commit(commit, &args.id);
    Ok(())
}

fn cmd_rm(ctx: &Context, args: RmArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = FileLock::acquire_default(&ctx.store)?;
    let mut session = open_session(ctx)?;
    let report = session.batch_delete(&args.ids, |progress| {
        debug!(
            done = progress.done,
            total = progress.total,
            id = progress.id,
            ok = progress.ok,
            "delete"
        );
        None
    });

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&batch_to_json(&report))?);
    } else {
        for line in format_batch_report(&report) {
            println!("{}", line);
        }
    }
    report.into_result()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Group management
// ---------------------------------------------------------------------------

fn cmd_group_add(ctx: &Context, args: GroupAddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = FileLock::acquire_default(&ctx.store)?;
    let mut session = open_session(ctx)?;
    let id = session.add_group(&args.name, args.icon.as_deref())?;
    println!("{}", id);
    Ok(())
}

fn cmd_group_edit(ctx: &Context, args: GroupEditArgs) -> Result<(), Box<dyn std::error::Error>> {
    let patch = GroupPatch {
        name: args.name,
        icon: args.icon,
        color: if args.clear_color {
            Some(None)
        } else {
            args.color.map(Some)
        },
    };
    if patch == GroupPatch::default() {
        return Err("nothing to change: pass at least one field".into());
    }

    let _lock = FileLock::acquire_default(&ctx.store)?;
    let mut session = open_session(ctx)?;
    let commit = session.edit_group(&args.id, patch)?;
    print_commit(commit, &args.id);
    Ok(())
}

fn cmd_group_order(ctx: &Context, args: GroupOrderArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = FileLock::acquire_default(&ctx.store)?;
    let mut session = open_session(ctx)?;
    let commit = session.reorder_groups(&args.id, &args.onto)?;
    print_commit(commit, &args.id);
    Ok(())
}

fn cmd_group_rm(ctx: &Context, args: GroupIdArg) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = FileLock::acquire_default(&ctx.store)?;
    let mut session = open_session(ctx)?;
    let commit = session.delete_group(&args.id)?;
    print_commit(commit, &args.id);
    Ok(())
}
