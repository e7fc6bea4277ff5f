//! Scoring of transactions against bill occurrences.

use serde::Serialize;

use crate::config::BillMatchingSettings;
use crate::ledger::{BillOccurrence, Transaction};

pub const DESCRIPTION_POINTS: u32 = 40;
pub const AMOUNT_POINTS: u32 = 30;
pub const EXACT_AMOUNT_BONUS: u32 = 10;
pub const MAX_DATE_POINTS: i64 = 30;
pub const DATE_POINTS_PER_DAY: i64 = 3;

const EXACT_AMOUNT_EPSILON: f64 = 0.01;
const MIN_SHARED_TOKEN_LEN: usize = 4;

/// Which signals fired when scoring one transaction against one occurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    pub description_match: bool,
    pub amount_match: bool,
    pub exact_amount: bool,
    pub days_diff: i64,
    pub within_window: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchScore {
    pub score: u32,
    pub details: MatchDetails,
}

impl MatchScore {
    fn meets(&self, settings: &BillMatchingSettings) -> bool {
        (!settings.require_description_match || self.details.description_match)
            && (!settings.require_amount_match || self.details.amount_match)
            && (!settings.require_date_window || self.details.within_window)
    }
}

/// Best occurrence found for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBillMatch {
    pub transaction_id: String,
    pub matched_bill: Option<BillOccurrence>,
    pub match_score: u32,
    pub match_details: MatchDetails,
}

impl TransactionBillMatch {
    fn unmatched(transaction: &Transaction) -> Self {
        Self {
            transaction_id: transaction.key(),
            matched_bill: None,
            match_score: 0,
            match_details: MatchDetails::default(),
        }
    }

    pub fn is_match(&self) -> bool {
        self.matched_bill.is_some()
    }
}

pub struct MatchingService;

impl MatchingService {
    /// Sums the description, amount, and date signals. Income always scores zero.
    pub fn score(
        transaction: &Transaction,
        occurrence: &BillOccurrence,
        settings: &BillMatchingSettings,
    ) -> MatchScore {
        if !transaction.is_expense() {
            return MatchScore::default();
        }

        let description_match = descriptions_match(transaction, occurrence);

        let difference = (transaction.amount.abs() - occurrence.bill_amount).abs();
        let amount_match = difference <= settings.amount_tolerance;
        let exact_amount = amount_match && difference < EXACT_AMOUNT_EPSILON;

        let days_diff = (transaction.date - occurrence.occurrence_date)
            .num_days()
            .abs();
        let within_window = days_diff <= settings.date_window_days;
        let date_points = (MAX_DATE_POINTS - DATE_POINTS_PER_DAY * days_diff).max(0) as u32;

        let mut score = date_points;
        if description_match {
            score += DESCRIPTION_POINTS;
        }
        if amount_match {
            score += AMOUNT_POINTS;
        }
        if exact_amount {
            score += EXACT_AMOUNT_BONUS;
        }

        MatchScore {
            score,
            details: MatchDetails {
                description_match,
                amount_match,
                exact_amount,
                days_diff,
                within_window,
            },
        }
    }

    /// Highest-scoring occurrence satisfying the required signals. The first of
    /// equally scored candidates wins, and a zero score never matches.
    pub fn find_best_match(
        transaction: &Transaction,
        occurrences: &[BillOccurrence],
        settings: &BillMatchingSettings,
    ) -> TransactionBillMatch {
        let mut best = TransactionBillMatch::unmatched(transaction);
        for occurrence in occurrences {
            let scored = Self::score(transaction, occurrence, settings);
            if scored.score > best.match_score && scored.meets(settings) {
                best.matched_bill = Some(occurrence.clone());
                best.match_score = scored.score;
                best.match_details = scored.details;
            }
        }
        best
    }
}

fn descriptions_match(transaction: &Transaction, occurrence: &BillOccurrence) -> bool {
    if let Some(source) = occurrence.source_description.as_deref() {
        if transaction.description == source {
            return true;
        }
    }

    let name = transaction.display_name().trim().to_lowercase();
    let bill = occurrence.bill_name.trim().to_lowercase();
    if name.is_empty() || bill.is_empty() {
        return false;
    }
    if name == bill || name.contains(&bill) || bill.contains(&name) {
        return true;
    }

    let name_tokens: Vec<&str> = significant_tokens(&name).collect();
    let shared = significant_tokens(&bill).any(|bill_token| {
        name_tokens
            .iter()
            .any(|token| token.contains(bill_token) || bill_token.contains(token))
    });
    shared
}

fn significant_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .filter(|token| token.chars().count() >= MIN_SHARED_TOKEN_LEN)
}
