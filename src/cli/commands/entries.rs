use crate::cli::core::{parse_amount, parse_date, required_arg, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{line, section as output_section};
use crate::cli::registry::CommandEntry;
use crate::core::services::TransactionService;
use crate::ledger::{BillDefinition, Frequency, LedgerEntry, Transaction};

const ADD_TXN_USAGE: &str = "add-txn <date> <amount> <description> [id]";
const ADD_BILL_USAGE: &str = "add-bill <name> <amount> <due-date> <frequency> [id]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "list",
            "List entries; `all` includes hidden bill payments",
            "list [all]",
            cmd_list,
        )
        .completing(0, &["all"]),
        CommandEntry::new("add-txn", "Record a bank transaction", ADD_TXN_USAGE, cmd_add_txn),
        CommandEntry::new("add-bill", "Define a recurring bill", ADD_BILL_USAGE, cmd_add_bill)
            .completing(3, &Frequency::LABELS),
        CommandEntry::new("remove", "Delete a transaction or bill", "remove <id>", cmd_remove),
    ]
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let show_all = match args.first() {
        None => false,
        Some(flag) if flag.eq_ignore_ascii_case("all") => true,
        Some(other) => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown list option `{}` (expected `all`)",
                other
            )))
        }
    };

    let entries = context.manager.entries();
    let shown: Vec<&LedgerEntry> = if show_all {
        entries.iter().collect()
    } else {
        TransactionService::visible(entries)
    };
    if shown.is_empty() {
        io::print_info("No entries.");
        return Ok(());
    }

    output_section("Entries");
    for entry in shown {
        line(describe(entry));
    }
    Ok(())
}

fn describe(entry: &LedgerEntry) -> String {
    match entry {
        LedgerEntry::Bill(def) => {
            let due = def
                .bill
                .due_date
                .map(|date| date.to_string())
                .unwrap_or_else(|| "no due date".into());
            format!(
                "  {:<38} BILL {:<24} {:>10.2}  {} from {} ({} paid)",
                def.id(),
                def.bill.name,
                def.bill.amount,
                def.bill.frequency.label(),
                due,
                def.bill.payments.len() + def.bill.paid_dates.len()
            )
        }
        LedgerEntry::Transaction(txn) => {
            let link = txn
                .matched_to_bill_id
                .as_deref()
                .map(|bill| format!("  -> {}", bill))
                .unwrap_or_default();
            format!(
                "  {:<38} {} {:<24} {:>10.2}{}",
                txn.key(),
                txn.date,
                txn.display_name(),
                txn.amount,
                link
            )
        }
    }
}

fn cmd_add_txn(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let date = parse_date(required_arg(args, 0, ADD_TXN_USAGE)?)?;
    let amount = parse_amount(required_arg(args, 1, ADD_TXN_USAGE)?)?;
    let description = required_arg(args, 2, ADD_TXN_USAGE)?;

    let mut txn = Transaction::new(date, description, amount);
    if let Some(id) = args.get(3) {
        ensure_unused_id(context, id)?;
        txn = txn.with_id(*id);
    }
    let key = context.manager.add_entry(txn.into());
    io::print_success(format!("Transaction added: {}", key));
    Ok(())
}

fn cmd_add_bill(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = required_arg(args, 0, ADD_BILL_USAGE)?;
    let amount = parse_amount(required_arg(args, 1, ADD_BILL_USAGE)?)?;
    let due = parse_date(required_arg(args, 2, ADD_BILL_USAGE)?)?;
    let raw_frequency = required_arg(args, 3, ADD_BILL_USAGE)?;
    let frequency = Frequency::parse(raw_frequency).ok_or_else(|| {
        CommandError::InvalidArguments(format!(
            "unknown frequency `{}` ({})",
            raw_frequency,
            Frequency::LABELS.join(", ")
        ))
    })?;

    let mut bill = BillDefinition::new(name, amount.abs(), due, frequency);
    if let Some(id) = args.get(4) {
        ensure_unused_id(context, id)?;
        bill = bill.with_id(*id);
    }
    let key = context.manager.add_entry(bill.into());
    io::print_success(format!("Bill added: {}", key));
    Ok(())
}

fn ensure_unused_id(context: &ShellContext, id: &str) -> Result<(), CommandError> {
    if TransactionService::find(context.manager.entries(), id).is_some() {
        return Err(CommandError::InvalidArguments(format!("id `{}` is already in use", id)));
    }
    Ok(())
}

fn cmd_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let key = required_arg(args, 0, "remove <id>")?;
    let removed = context.manager.remove(key)?;
    io::print_success(format!("Removed {}", removed.transaction().display_name()));
    Ok(())
}
