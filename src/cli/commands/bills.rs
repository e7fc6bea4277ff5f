use crate::cli::core::{
    parse_amount, parse_date, parse_month, required_arg, CommandError, CommandResult, ShellContext,
};
use crate::cli::io;
use crate::cli::output::{line, section as output_section};
use crate::cli::registry::CommandEntry;

const MATCH_USAGE: &str = "match <txn-id> <bill-id> <occurrence-date> [tolerance]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("bills", "Show bill occurrences for a month", "bills <YYYY-MM>", cmd_bills),
        CommandEntry::new(
            "reconcile",
            "Auto-match transactions to bills",
            "reconcile <YYYY-MM>",
            cmd_reconcile,
        ),
        CommandEntry::new(
            "suggest",
            "Show likely matches below the auto-match threshold",
            "suggest <YYYY-MM>",
            cmd_suggest,
        ),
        CommandEntry::new("match", "Link a transaction to a bill occurrence", MATCH_USAGE, cmd_match),
        CommandEntry::new("unmatch", "Remove a transaction's bill link", "unmatch <txn-id>", cmd_unmatch),
        CommandEntry::new(
            "mark-paid",
            "Mark a bill occurrence as paid without a transaction",
            "mark-paid <bill-id> <date>",
            cmd_mark_paid,
        ),
        CommandEntry::new(
            "clear-paid",
            "Forget the payment recorded for a bill occurrence",
            "clear-paid <bill-id> <date>",
            cmd_clear_paid,
        ),
        CommandEntry::new(
            "migrate",
            "Convert legacy paid dates into payments",
            "migrate",
            cmd_migrate,
        ),
    ]
}

fn cmd_bills(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let window = parse_month(required_arg(args, 0, "bills <YYYY-MM>")?)?;
    let occurrences = context.manager.occurrences(window);
    if occurrences.is_empty() {
        io::print_info(format!("No bills due in {}.", window));
        return Ok(());
    }

    output_section(format!("Bills for {}", window));
    for occurrence in occurrences {
        let status = match &occurrence.payment {
            Some(payment) if payment.manually_marked => format!("paid (manual) {}", payment.transaction_date),
            Some(payment) => format!("paid {} {:.2}", payment.transaction_date, payment.transaction_amount),
            None => "unpaid".to_string(),
        };
        line(format!(
            "  {}  {:<24} {:>10.2}  {:<28} [{}]",
            occurrence.occurrence_date, occurrence.bill_name, occurrence.bill_amount, status, occurrence.bill_id
        ));
    }
    Ok(())
}

fn cmd_reconcile(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let window = parse_month(required_arg(args, 0, "reconcile <YYYY-MM>")?)?;
    let settings = context.settings().clone();
    let report = context.manager.reconcile(window, &settings);
    if report.applied.is_empty() {
        io::print_info("No new matches.");
        return Ok(());
    }

    output_section(format!("Reconciled {}", window));
    for applied in &report.applied {
        line(format!(
            "  {} -> {} ({}) score {}",
            applied.transaction_id, applied.bill_id, applied.occurrence_date, applied.score
        ));
    }
    io::print_success(format!("Matched {} transaction(s).", report.applied.len()));
    Ok(())
}

fn cmd_suggest(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let window = parse_month(required_arg(args, 0, "suggest <YYYY-MM>")?)?;
    let suggestions = context.manager.suggestions(window, context.settings());
    if suggestions.is_empty() {
        io::print_info("No suggestions.");
        return Ok(());
    }

    output_section(format!("Suggestions for {}", window));
    for suggestion in suggestions {
        let Some(occurrence) = suggestion.matched_bill else {
            continue;
        };
        line(format!(
            "  {} -> {} {} ({}) score {}",
            suggestion.transaction_id,
            occurrence.bill_name,
            occurrence.occurrence_date,
            occurrence.bill_id,
            suggestion.match_score
        ));
    }
    Ok(())
}

fn cmd_match(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let txn_id = required_arg(args, 0, MATCH_USAGE)?;
    let bill_id = required_arg(args, 1, MATCH_USAGE)?;
    let occurrence_date = parse_date(required_arg(args, 2, MATCH_USAGE)?)?;
    let tolerance = match args.get(3) {
        Some(raw) => parse_amount(raw)?,
        None => context.config.manual_match_tolerance,
    };
    if tolerance < 0.0 {
        return Err(CommandError::InvalidArguments(
            "tolerance must not be negative".into(),
        ));
    }

    context
        .manager
        .manual_match(txn_id, bill_id, occurrence_date, tolerance)?;
    io::print_success(format!(
        "Linked {} to {} for {}.",
        txn_id, bill_id, occurrence_date
    ));
    Ok(())
}

fn cmd_unmatch(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let txn_id = required_arg(args, 0, "unmatch <txn-id>")?;
    context.manager.unmatch(txn_id)?;
    io::print_success(format!("Unlinked {}.", txn_id));
    Ok(())
}

fn cmd_mark_paid(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let bill_id = required_arg(args, 0, "mark-paid <bill-id> <date>")?;
    let date = parse_date(required_arg(args, 1, "mark-paid <bill-id> <date>")?)?;
    context.manager.mark_paid(bill_id, date)?;
    io::print_success(format!("Marked {} paid for {}.", bill_id, date));
    Ok(())
}

fn cmd_clear_paid(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let bill_id = required_arg(args, 0, "clear-paid <bill-id> <date>")?;
    let date = parse_date(required_arg(args, 1, "clear-paid <bill-id> <date>")?)?;
    context.manager.clear_payment(bill_id, date)?;
    io::print_success(format!("Cleared payment of {} for {}.", bill_id, date));
    Ok(())
}

fn cmd_migrate(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let migrated = context.manager.migrate_legacy_payments();
    if migrated == 0 {
        io::print_info("No legacy paid dates found.");
    } else {
        io::print_success(format!("Migrated {} legacy paid date(s).", migrated));
    }
    Ok(())
}
