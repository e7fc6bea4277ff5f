use std::path::Path;

use crate::cli::core::{required_arg, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{line, section as output_section};
use crate::cli::registry::CommandEntry;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("load", "Open a stored ledger", "load <name>", cmd_load),
        CommandEntry::new(
            "save",
            "Save the ledger, optionally under a new name",
            "save [name]",
            cmd_save,
        ),
        CommandEntry::new("import", "Replace entries from a JSON file", "import <path>", cmd_import),
        CommandEntry::new("export", "Write entries to a JSON file", "export <path>", cmd_export),
        CommandEntry::new("backup", "Snapshot the current ledger", "backup [note]", cmd_backup),
        CommandEntry::new("backups", "List backups of the current ledger", "backups", cmd_backups),
        CommandEntry::new(
            "restore",
            "Restore the current ledger from a backup",
            "restore <backup>",
            cmd_restore,
        ),
    ]
}

fn cmd_load(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = required_arg(args, 0, "load <name>")?;
    let metadata = context.manager.load(name)?;
    context.report_warnings(&metadata.warnings);
    context.remember_ledger(name)?;
    io::print_success(format!(
        "Loaded ledger `{}` ({} entries).",
        name, metadata.entries
    ));
    Ok(())
}

fn cmd_save(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first() {
        Some(name) => {
            context.manager.save_as(name)?;
            context.remember_ledger(name)?;
            io::print_success(format!("Ledger saved as `{}`.", name));
        }
        None => {
            context.manager.save()?;
            io::print_success("Ledger saved.");
        }
    }
    Ok(())
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = required_arg(args, 0, "import <path>")?;
    let metadata = context.manager.import(Path::new(path))?;
    context.report_warnings(&metadata.warnings);
    io::print_success(format!("Imported {} entries from {}.", metadata.entries, path));
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = required_arg(args, 0, "export <path>")?;
    context.manager.export(Path::new(path))?;
    io::print_success(format!("Exported {} entries to {}.", context.manager.entries().len(), path));
    Ok(())
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = if args.is_empty() {
        None
    } else {
        Some(args.join(" "))
    };
    let name = context.manager.backup(note.as_deref())?;
    io::print_success(format!("Backup created: {}", name));
    Ok(())
}

fn cmd_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.manager.list_backups()?;
    if backups.is_empty() {
        io::print_info("No backups yet.");
        return Ok(());
    }
    output_section("Backups");
    for (index, name) in backups.iter().enumerate() {
        line(format!("  {:>2}. {}", index + 1, name));
    }
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let backup = required_arg(args, 0, "restore <backup>")?;
    let metadata = context.manager.restore(backup)?;
    context.report_warnings(&metadata.warnings);
    io::print_success(format!("Restored {} entries from {}.", metadata.entries, backup));
    Ok(())
}
