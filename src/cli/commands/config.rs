use crate::cli::core::{parse_amount, required_arg, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{line, section as output_section};
use crate::cli::registry::CommandEntry;

const SET_USAGE: &str = "set <setting> <value>";
const SETTING_NAMES: &[&str] = &[
    "amount-tolerance",
    "date-window-days",
    "minimum-score",
    "require-description-match",
    "require-amount-match",
    "require-date-window",
    "manual-match-tolerance",
];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("settings", "Show matching settings", "settings", cmd_settings),
        CommandEntry::new("set", "Change a matching setting", SET_USAGE, cmd_set)
            .completing(0, SETTING_NAMES),
    ]
}

fn cmd_settings(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let settings = context.settings();
    output_section("Matching settings");
    line(format!("  amount-tolerance          {:.2}", settings.amount_tolerance));
    line(format!("  date-window-days          {}", settings.date_window_days));
    line(format!("  minimum-score             {}", settings.minimum_score));
    line(format!("  require-description-match {}", settings.require_description_match));
    line(format!("  require-amount-match      {}", settings.require_amount_match));
    line(format!("  require-date-window       {}", settings.require_date_window));
    line(format!(
        "  manual-match-tolerance    {:.2}",
        context.config.manual_match_tolerance
    ));
    line(format!("  config file               {}", context.config_manager.path().display()));
    Ok(())
}

fn cmd_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = required_arg(args, 0, SET_USAGE)?;
    let value = required_arg(args, 1, SET_USAGE)?;

    let applied = context
        .config
        .matching
        .apply(name, value)
        .map_err(CommandError::InvalidArguments)?;
    if !applied {
        if name.replace(['-', '_'], "").eq_ignore_ascii_case("manualmatchtolerance") {
            context.config.manual_match_tolerance = parse_amount(value)?;
        } else {
            return Err(CommandError::InvalidArguments(format!(
                "unknown setting `{}`; see `settings`",
                name
            )));
        }
    }

    context.persist_config()?;
    io::print_success(format!("{} = {}", name, value));
    Ok(())
}
