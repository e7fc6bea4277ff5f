//! Expansion of bill definitions into concrete monthly occurrences.
//!
//! Occurrences are never stored. They are recomputed from the current bill
//! definitions for whichever month a caller asks about, including months that
//! precede a bill's first due date so older transactions can still be matched.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use super::time_interval::{month_difference, MonthWindow};
use super::transaction::{BillDefinition, BillFields, BillPayment, Frequency, LedgerEntry};

const WEEK_DAYS: i64 = 7;
const QUARTER_MONTHS: i64 = 3;

/// One calendar instance of a bill definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillOccurrence {
    pub bill_id: String,
    pub bill_name: String,
    pub bill_amount: f64,
    pub occurrence_date: NaiveDate,
    pub due_day: u32,
    pub category: String,
    pub source_description: Option<String>,
    pub payment: Option<BillPayment>,
}

impl BillOccurrence {
    fn new(def: &BillDefinition, occurrence_date: NaiveDate) -> Self {
        Self {
            bill_id: def.id(),
            bill_name: def.bill.name.clone(),
            bill_amount: def.bill.amount,
            occurrence_date,
            due_day: occurrence_date.day(),
            category: def.transaction.category.clone(),
            source_description: def.bill.source_description.clone(),
            payment: lookup_payment(&def.bill, occurrence_date),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.payment.is_some()
    }

    /// Resolves the bill definition this occurrence was generated from.
    pub fn bill<'a>(&self, entries: &'a [LedgerEntry]) -> Option<&'a BillDefinition> {
        find_bill(entries, &self.bill_id)
    }

    /// Key used to enforce one payment per occurrence.
    pub fn slot(&self) -> (String, NaiveDate) {
        (self.bill_id.clone(), self.occurrence_date)
    }
}

/// Dates on which `bill` falls inside `window`, in ascending order.
///
/// A bill without a due date yields nothing.
pub fn expand(bill: &BillFields, window: MonthWindow) -> Vec<NaiveDate> {
    let Some(due) = bill.due_date else {
        return Vec::new();
    };
    let start = MonthWindow::of(due);

    match bill.frequency {
        Frequency::OneTime => {
            if window.contains(due) {
                vec![due]
            } else {
                Vec::new()
            }
        }
        Frequency::Monthly => vec![window.clamped_day(due.day())],
        Frequency::Quarterly => {
            if month_difference(start, window).rem_euclid(QUARTER_MONTHS) == 0 {
                vec![window.clamped_day(due.day())]
            } else {
                Vec::new()
            }
        }
        Frequency::Yearly => {
            if window.month() == due.month() {
                vec![window.clamped_day(due.day())]
            } else {
                Vec::new()
            }
        }
        Frequency::Weekly => weekly_dates(due, window),
    }
}

/// Every date in `window` that is a whole number of weeks away from `anchor`,
/// before or after it.
fn weekly_dates(anchor: NaiveDate, window: MonthWindow) -> Vec<NaiveDate> {
    let first_day = window.start();
    let offset = (first_day - anchor).num_days().rem_euclid(WEEK_DAYS);
    let last_day = window.end();
    let mut next = first_day.checked_add_signed(Duration::days((WEEK_DAYS - offset) % WEEK_DAYS));

    let mut dates = Vec::new();
    while let Some(current) = next.filter(|date| *date <= last_day) {
        dates.push(current);
        next = current.checked_add_signed(Duration::days(WEEK_DAYS));
    }
    dates
}

/// The payment recorded for `occurrence_date`, if any.
///
/// Structured payments win; a date only present in the legacy `paid_dates`
/// list is reported as a manual payment of the full bill amount.
pub fn lookup_payment(bill: &BillFields, occurrence_date: NaiveDate) -> Option<BillPayment> {
    if let Some(payment) = bill
        .payments
        .iter()
        .find(|payment| payment.occurrence_date == occurrence_date)
    {
        return Some(payment.clone());
    }
    if bill.paid_dates.contains(&occurrence_date) {
        return Some(BillPayment {
            occurrence_date,
            transaction_date: occurrence_date,
            transaction_amount: -bill.amount,
            transaction_description: String::new(),
            manually_marked: true,
        });
    }
    None
}

/// All bill occurrences for `window`, in bill source order then date order.
pub fn generate_occurrences(entries: &[LedgerEntry], window: MonthWindow) -> Vec<BillOccurrence> {
    entries
        .iter()
        .filter_map(LedgerEntry::as_bill)
        .flat_map(|def| {
            expand(&def.bill, window)
                .into_iter()
                .map(move |date| BillOccurrence::new(def, date))
        })
        .collect()
}

/// Occurrences for every window, concatenated in window order.
pub fn generate_for_windows<I>(entries: &[LedgerEntry], windows: I) -> Vec<BillOccurrence>
where
    I: IntoIterator<Item = MonthWindow>,
{
    windows
        .into_iter()
        .flat_map(|window| generate_occurrences(entries, window))
        .collect()
}

pub fn find_bill<'a>(entries: &'a [LedgerEntry], bill_id: &str) -> Option<&'a BillDefinition> {
    entries
        .iter()
        .filter_map(LedgerEntry::as_bill)
        .find(|def| def.id() == bill_id)
}
