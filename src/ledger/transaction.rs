use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single ledger line. Negative amounts are expenses, positive amounts income.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_to_bill_id: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden_as_bill_payment: bool,
}

impl Transaction {
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: f64) -> Self {
        Self {
            id: Some(Uuid::new_v4().to_string()),
            date,
            description: description.into(),
            amount,
            category: String::new(),
            merchant_name: None,
            memo: None,
            matched_to_bill_id: None,
            hidden_as_bill_payment: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant_name = Some(merchant.into());
        self
    }

    /// Stable identity: the explicit id, or `date|description` when none was assigned.
    pub fn key(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{}|{}", self.date, self.description),
        }
    }

    /// Merchant override when present, raw description otherwise.
    pub fn display_name(&self) -> &str {
        match self.merchant_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.description,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    pub fn is_matched(&self) -> bool {
        self.matched_to_bill_id.is_some()
    }

    pub fn link_to_bill(&mut self, bill_id: &str) {
        self.matched_to_bill_id = Some(bill_id.to_string());
        self.hidden_as_bill_payment = true;
    }

    pub fn clear_bill_link(&mut self) {
        self.matched_to_bill_id = None;
        self.hidden_as_bill_payment = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    OneTime,
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// Canonical spellings accepted by [`Frequency::parse`].
    pub const LABELS: [&'static str; 5] = ["one-time", "weekly", "monthly", "quarterly", "yearly"];

    pub fn label(&self) -> &'static str {
        match self {
            Frequency::OneTime => "one-time",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "one-time" | "onetime" | "once" => Some(Frequency::OneTime),
            "weekly" => Some(Frequency::Weekly),
            "monthly" => Some(Frequency::Monthly),
            "quarterly" => Some(Frequency::Quarterly),
            "yearly" | "annual" | "annually" => Some(Frequency::Yearly),
            _ => None,
        }
    }
}

/// One confirmed payment for one bill occurrence, with a snapshot of the paying transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillPayment {
    pub occurrence_date: NaiveDate,
    pub transaction_date: NaiveDate,
    pub transaction_amount: f64,
    #[serde(default)]
    pub transaction_description: String,
    #[serde(default)]
    pub manually_marked: bool,
}

impl BillPayment {
    pub fn from_transaction(
        occurrence_date: NaiveDate,
        transaction: &Transaction,
        manually_marked: bool,
    ) -> Self {
        Self {
            occurrence_date,
            transaction_date: transaction.date,
            transaction_amount: transaction.amount,
            transaction_description: transaction.description.clone(),
            manually_marked,
        }
    }
}

/// Bill-specific fields carried by a bill definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BillFields {
    pub name: String,
    pub amount: f64,
    pub due_date: Option<NaiveDate>,
    pub frequency: Frequency,
    pub source_description: Option<String>,
    pub paid_dates: Vec<NaiveDate>,
    pub payments: Vec<BillPayment>,
}

/// A bill definition: the ledger line that created it plus its schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct BillDefinition {
    pub transaction: Transaction,
    pub bill: BillFields,
}

impl BillDefinition {
    pub fn new(
        name: impl Into<String>,
        amount: f64,
        due_date: NaiveDate,
        frequency: Frequency,
    ) -> Self {
        let name = name.into();
        let mut transaction = Transaction::new(due_date, name.clone(), -amount.abs());
        transaction.category = "Bills".into();
        Self {
            transaction,
            bill: BillFields {
                name,
                amount: amount.abs(),
                due_date: Some(due_date),
                frequency,
                ..BillFields::default()
            },
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.transaction.id = Some(id.into());
        self
    }

    pub fn with_source_description(mut self, source: impl Into<String>) -> Self {
        self.bill.source_description = Some(source.into());
        self
    }

    pub fn id(&self) -> String {
        self.transaction.key()
    }
}

/// The persisted collection holds bills and plain transactions side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EntryRecord", into = "EntryRecord")]
pub enum LedgerEntry {
    Transaction(Transaction),
    Bill(BillDefinition),
}

impl LedgerEntry {
    pub fn key(&self) -> String {
        self.transaction().key()
    }

    /// The ledger line shared by both variants.
    pub fn transaction(&self) -> &Transaction {
        match self {
            LedgerEntry::Transaction(txn) => txn,
            LedgerEntry::Bill(def) => &def.transaction,
        }
    }

    pub fn as_bill(&self) -> Option<&BillDefinition> {
        match self {
            LedgerEntry::Bill(def) => Some(def),
            LedgerEntry::Transaction(_) => None,
        }
    }

    pub fn as_bill_mut(&mut self) -> Option<&mut BillDefinition> {
        match self {
            LedgerEntry::Bill(def) => Some(def),
            LedgerEntry::Transaction(_) => None,
        }
    }

    /// Plain (non-bill) transactions only.
    pub fn as_plain(&self) -> Option<&Transaction> {
        match self {
            LedgerEntry::Transaction(txn) => Some(txn),
            LedgerEntry::Bill(_) => None,
        }
    }

    pub fn as_plain_mut(&mut self) -> Option<&mut Transaction> {
        match self {
            LedgerEntry::Transaction(txn) => Some(txn),
            LedgerEntry::Bill(_) => None,
        }
    }

    pub fn is_bill(&self) -> bool {
        matches!(self, LedgerEntry::Bill(_))
    }
}

impl From<Transaction> for LedgerEntry {
    fn from(txn: Transaction) -> Self {
        LedgerEntry::Transaction(txn)
    }
}

impl From<BillDefinition> for LedgerEntry {
    fn from(def: BillDefinition) -> Self {
        LedgerEntry::Bill(def)
    }
}

/// Flat on-disk shape: a transaction object with optional bill fields and an `isBill` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryRecord {
    #[serde(flatten)]
    transaction: Transaction,
    #[serde(default, skip_serializing_if = "is_false")]
    is_bill: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bill_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bill_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    frequency: Option<Frequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    paid_dates: Vec<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    payments: Vec<BillPayment>,
}

impl From<EntryRecord> for LedgerEntry {
    fn from(record: EntryRecord) -> Self {
        if !record.is_bill {
            return LedgerEntry::Transaction(record.transaction);
        }
        let name = record
            .bill_name
            .unwrap_or_else(|| record.transaction.description.clone());
        LedgerEntry::Bill(BillDefinition {
            bill: BillFields {
                name,
                amount: record
                    .bill_amount
                    .unwrap_or_else(|| record.transaction.amount.abs()),
                due_date: record.due_date,
                frequency: record.frequency.unwrap_or_default(),
                source_description: record.source_description,
                paid_dates: record.paid_dates,
                payments: record.payments,
            },
            transaction: record.transaction,
        })
    }
}

impl From<LedgerEntry> for EntryRecord {
    fn from(entry: LedgerEntry) -> Self {
        match entry {
            LedgerEntry::Transaction(transaction) => EntryRecord {
                transaction,
                is_bill: false,
                bill_name: None,
                bill_amount: None,
                due_date: None,
                frequency: None,
                source_description: None,
                paid_dates: Vec::new(),
                payments: Vec::new(),
            },
            LedgerEntry::Bill(BillDefinition { transaction, bill }) => EntryRecord {
                transaction,
                is_bill: true,
                bill_name: Some(bill.name),
                bill_amount: Some(bill.amount),
                due_date: bill.due_date,
                frequency: Some(bill.frequency),
                source_description: bill.source_description,
                paid_dates: bill.paid_dates,
                payments: bill.payments,
            },
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn key_falls_back_to_date_and_description() {
        let mut txn = Transaction::new(date(2024, 2, 6), "NETFLIX.COM", -15.49);
        txn.id = None;
        assert_eq!(txn.key(), "2024-02-06|NETFLIX.COM");
    }

    #[test]
    fn display_name_prefers_merchant() {
        let txn = Transaction::new(date(2024, 2, 6), "POS 1234 NFLX", -15.49).with_merchant("Netflix");
        assert_eq!(txn.display_name(), "Netflix");
        let blank = Transaction::new(date(2024, 2, 6), "POS 1234", -1.0).with_merchant("  ");
        assert_eq!(blank.display_name(), "POS 1234");
    }

    #[test]
    fn bill_records_deserialize_into_bill_variant() {
        let raw = json!({
            "date": "2024-01-05",
            "description": "Netflix",
            "amount": -15.49,
            "category": "Subscriptions",
            "isBill": true,
            "billName": "Netflix",
            "billAmount": 15.49,
            "dueDate": "2024-01-05",
            "frequency": "monthly",
            "paidDates": ["2024-01-05"]
        });
        let entry: LedgerEntry = serde_json::from_value(raw).unwrap();
        let def = entry.as_bill().expect("bill variant");
        assert_eq!(def.bill.frequency, Frequency::Monthly);
        assert_eq!(def.bill.paid_dates, vec![date(2024, 1, 5)]);
        assert_eq!(def.id(), "2024-01-05|Netflix");
    }

    #[test]
    fn plain_transactions_serialize_without_bill_fields() {
        let entry = LedgerEntry::from(Transaction::new(date(2024, 3, 1), "Coffee", -4.5).with_id("t1"));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["id"], "t1");
        assert_eq!(value["date"], "2024-03-01");
        assert!(value.get("isBill").is_none());
        assert!(value.get("payments").is_none());
        assert!(value.get("hiddenAsBillPayment").is_none());
    }

    #[test]
    fn missing_frequency_defaults_to_monthly() {
        let raw = json!({
            "date": "2024-01-05",
            "description": "Gym",
            "amount": -30.0,
            "isBill": true,
            "billName": "Gym",
            "billAmount": 30.0
        });
        let entry: LedgerEntry = serde_json::from_value(raw).unwrap();
        let def = entry.as_bill().unwrap();
        assert_eq!(def.bill.frequency, Frequency::Monthly);
        assert!(def.bill.due_date.is_none());
    }

    #[test]
    fn frequency_uses_kebab_case() {
        assert_eq!(serde_json::to_value(Frequency::OneTime).unwrap(), "one-time");
        assert_eq!(Frequency::parse("Quarterly"), Some(Frequency::Quarterly));
        assert_eq!(Frequency::parse("fortnightly"), None);
    }
}
