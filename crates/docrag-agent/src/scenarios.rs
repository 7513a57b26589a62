//! Synthetic Nigerian banking transactions for the fraud monitor.
//!
//! Ten templates: two normal, two suspicious and six that describe a known
//! fraud pattern. Amounts are in naira and drawn uniformly from each
//! template's range.

use std::fmt;

use rand::Rng;

/// Cities used for locations.
pub const NIGERIAN_LOCATIONS: &[&str] = &[
    "Lagos",
    "Abuja",
    "Port Harcourt",
    "Ibadan",
    "Kano",
    "Benin City",
    "Enugu",
];

/// Broad class of a generated transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioKind {
    /// Everyday activity.
    Normal,
    /// Unusual but not tied to a documented pattern.
    Suspicious,
    /// Matches a documented fraud pattern.
    FraudPattern,
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Suspicious => write!(f, "suspicious"),
            Self::FraudPattern => write!(f, "fraud_pattern"),
        }
    }
}

/// Documented fraud pattern a scenario was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FraudPattern {
    /// Same card in two distant cities too quickly.
    GeographicImpossibility,
    /// Failed logins from abroad.
    AccountTakeover,
    /// Spending out of character for the customer.
    UnusualMerchant,
    /// Many transactions in a short window.
    VelocityViolation,
    /// SIM swap followed by a transfer.
    SimSwap,
    /// Deposits split to stay below a reporting threshold.
    Structuring,
}

impl fmt::Display for FraudPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GeographicImpossibility => "geographic_impossibility",
            Self::AccountTakeover => "account_takeover",
            Self::UnusualMerchant => "unusual_merchant",
            Self::VelocityViolation => "velocity_violation",
            Self::SimSwap => "sim_swap",
            Self::Structuring => "structuring",
        };
        f.write_str(name)
    }
}

/// One generated transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionScenario {
    /// Broad class.
    pub kind: ScenarioKind,
    /// Free-text description sent for analysis.
    pub description: String,
    /// Amount in naira, when the template has one.
    pub amount: Option<u64>,
    /// Merchant or channel, for normal and suspicious templates.
    pub merchant: Option<&'static str>,
    /// Location, for normal and suspicious templates.
    pub location: Option<String>,
    /// Time of day (`HH:MM`), for normal and suspicious templates.
    pub time: Option<&'static str>,
    /// Pattern, for fraud-pattern templates.
    pub pattern: Option<FraudPattern>,
}

impl TransactionScenario {
    fn plain(
        kind: ScenarioKind,
        description: String,
        amount: u64,
        merchant: &'static str,
        location: impl Into<String>,
        time: &'static str,
    ) -> Self {
        Self {
            kind,
            description,
            amount: Some(amount),
            merchant: Some(merchant),
            location: Some(location.into()),
            time: Some(time),
            pattern: None,
        }
    }

    fn fraud(pattern: FraudPattern, description: String, amount: Option<u64>) -> Self {
        Self {
            kind: ScenarioKind::FraudPattern,
            description,
            amount,
            merchant: None,
            location: None,
            time: None,
            pattern: Some(pattern),
        }
    }
}

fn pick<'a, R: Rng>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

/// Draw one scenario, every template equally likely.
pub fn generate<R: Rng>(rng: &mut R) -> TransactionScenario {
    match rng.random_range(0..10u8) {
        0 => {
            let amount = rng.random_range(5_000..=50_000);
            let location = pick(rng, NIGERIAN_LOCATIONS);
            TransactionScenario::plain(
                ScenarioKind::Normal,
                format!("POS purchase of ₦{amount} at supermarket in {location}"),
                amount,
                "Supermarket",
                location,
                "14:30",
            )
        }
        1 => {
            let amount = rng.random_range(150_000..=500_000);
            TransactionScenario::plain(
                ScenarioKind::Normal,
                format!("Salary deposit of ₦{amount} from employer"),
                amount,
                "Salary",
                "Lagos",
                "09:00",
            )
        }
        2 => {
            let amount = rng.random_range(1_000..=5_000);
            TransactionScenario::plain(
                ScenarioKind::Suspicious,
                format!("Multiple POS withdrawals of ₦{amount} within 10 minutes at same location"),
                amount,
                "POS",
                pick(rng, NIGERIAN_LOCATIONS),
                "23:45",
            )
        }
        3 => {
            let amount = rng.random_range(500_000..=2_000_000);
            TransactionScenario::plain(
                ScenarioKind::Suspicious,
                format!("Large transfer of ₦{amount} to unknown beneficiary in China"),
                amount,
                "International Transfer",
                "China",
                "03:15",
            )
        }
        4 => {
            let from = pick(rng, &["Lagos", "Abuja"]);
            let to = pick(rng, &["Kano", "Port Harcourt"]);
            TransactionScenario::fraud(
                FraudPattern::GeographicImpossibility,
                format!("Card used in {from} at 14:00 and {to} at 15:30 same day"),
                None,
            )
        }
        5 => {
            let origin = pick(rng, &["China", "Ghana", "UK"]);
            TransactionScenario::fraud(
                FraudPattern::AccountTakeover,
                format!("Multiple failed login attempts from IP address in {origin}"),
                None,
            )
        }
        6 => {
            let amount = rng.random_range(100_000..=500_000);
            TransactionScenario::fraud(
                FraudPattern::UnusualMerchant,
                format!("Elderly customer's card used for ₦{amount} at luxury electronics store"),
                Some(amount),
            )
        }
        7 => {
            let amount = rng.random_range(10_000..=20_000);
            TransactionScenario::fraud(
                FraudPattern::VelocityViolation,
                format!("Rapid transactions of ₦{amount} at same merchant within 5 minutes"),
                Some(amount),
            )
        }
        8 => {
            let amount = rng.random_range(50_000..=300_000);
            TransactionScenario::fraud(
                FraudPattern::SimSwap,
                format!("SIM swap detected, password reset followed by ₦{amount} transfer"),
                Some(amount),
            )
        }
        _ => {
            let amount = rng.random_range(4_500_000..=4_900_000);
            TransactionScenario::fraud(
                FraudPattern::Structuring,
                format!("Multiple cash deposits of ₦{amount} to avoid reporting threshold"),
                Some(amount),
            )
        }
    }
}

/// Draw `count` scenarios.
pub fn generate_batch<R: Rng>(rng: &mut R, count: usize) -> Vec<TransactionScenario> {
    (0..count).map(|_| generate(rng)).collect()
}
