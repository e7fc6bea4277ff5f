pub mod bills;
pub mod config;
pub mod entries;
pub mod ledger;
pub mod system;

use crate::cli::registry::CommandRegistry;

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    let definitions = system::definitions()
        .into_iter()
        .chain(ledger::definitions())
        .chain(entries::definitions())
        .chain(bills::definitions())
        .chain(config::definitions());
    for entry in definitions {
        registry.register(entry);
    }
}
