#![doc(test(attr(deny(warnings))))]

//! BillSync Core expands recurring bills into monthly occurrences and matches
//! bank transactions against them, automatically or by hand.

pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!(
            build = %utils::build_info::current().summary(),
            "BillSync Core tracing initialized."
        );
    });
}
