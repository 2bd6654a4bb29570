// src/model/ledger.rs

use crate::error::{SimulationError, ValidationError};
use crate::model::money::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Sale,
    Purchase,
    Fee,
    Fine,
    Spoilage,
}

/// One line of the audit trail. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub seq: u64,
    pub day: u32,
    pub kind: TransactionKind,
    pub sku: Option<String>,
    pub quantity: u32,
    /// Signed: positive for money in, negative for money out.
    pub amount: Money,
    pub balance_after: Money,
    pub note: String,
}

/// What a ledger entry is about, apart from its amount.
#[derive(Debug, Clone)]
pub struct Entry {
    pub day: u32,
    pub kind: TransactionKind,
    pub sku: Option<String>,
    pub quantity: u32,
    pub note: String,
}

impl Entry {
    pub fn new(day: u32, kind: TransactionKind) -> Self {
        Self {
            day,
            kind,
            sku: None,
            quantity: 0,
            note: String::new(),
        }
    }

    pub fn sku(mut self, sku: &str, quantity: u32) -> Self {
        self.sku = Some(sku.to_string());
        self.quantity = quantity;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// Cash balance plus the append-only transaction log behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ledger {
    opening_balance: Money,
    balance: Money,
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(opening_balance: Money) -> Self {
        Self {
            opening_balance,
            balance: opening_balance,
            transactions: Vec::new(),
        }
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn opening_balance(&self) -> Money {
        self.opening_balance
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Records money coming in. Zero-amount credits are allowed
    /// (spoilage write-downs go through here).
    pub fn credit(&mut self, amount: Money, entry: Entry) -> &Transaction {
        debug_assert!(!amount.is_negative(), "credit amounts are non-negative");
        self.append(amount, entry)
    }

    /// Records money going out. Fails without touching the balance if the
    /// payment would overdraw the account.
    pub fn debit(&mut self, amount: Money, entry: Entry) -> Result<&Transaction, ValidationError> {
        self.can_afford(amount)?;
        Ok(self.append(-amount, entry))
    }

    /// Checks a prospective debit without recording anything.
    pub fn can_afford(&self, amount: Money) -> Result<(), ValidationError> {
        if self.balance - amount < Money::ZERO {
            return Err(ValidationError::InsufficientFunds {
                needed: amount,
                available: self.balance,
            });
        }
        Ok(())
    }

    /// A charge the business cannot refuse. It may drive cash negative.
    pub fn charge(&mut self, amount: Money, entry: Entry) -> &Transaction {
        self.append(-amount, entry)
    }

    /// The daily operating fee. Applied once per day before the agent acts.
    pub fn apply_daily_fee(&mut self, fee: Money, day: u32) -> &Transaction {
        self.charge(
            fee,
            Entry::new(day, TransactionKind::Fee).note(format!("Day {} operating fee", day)),
        )
    }

    /// Replays the log and checks it still adds up to the balance.
    pub fn verify(&self) -> Result<(), SimulationError> {
        let replayed = self.opening_balance + self.transactions.iter().map(|t| t.amount).sum::<Money>();
        if replayed != self.balance {
            return Err(SimulationError::invariant(format!(
                "ledger balance {} does not match replayed transactions {}",
                self.balance, replayed
            )));
        }
        Ok(())
    }

    fn append(&mut self, amount: Money, entry: Entry) -> &Transaction {
        self.balance += amount;
        let seq = self.transactions.len() as u64;
        self.transactions.push(Transaction {
            seq,
            day: entry.day,
            kind: entry.kind,
            sku: entry.sku,
            quantity: entry.quantity,
            amount,
            balance_after: self.balance,
            note: entry.note,
        });
        &self.transactions[self.transactions.len() - 1]
    }
}
