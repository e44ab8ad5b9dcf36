use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// How an expense is divided among members.
///
/// `eachPaysOwn` is self-funded: everyone covers their own share, so it never
/// moves balances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SplitType {
    #[default]
    Equal,
    Selected,
    Percentage,
    Custom,
    EachPaysOwn,
}

/// Expense category; informational only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Travel,
    Food,
    Stay,
    Shopping,
    #[default]
    Misc,
}

/// Whether an expense was fronted by a member or drawn from the shared pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentSource {
    #[default]
    Member,
    Pool,
}

pub mod trip {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TripNew {
        pub name: String,
        pub start_date: Option<DateTime<Utc>>,
        /// Members to create together with the trip.
        pub members: Option<Vec<member::MemberNew>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TripUpdate {
        pub name: Option<String>,
        pub start_date: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TripView {
        pub id: Uuid,
        pub name: String,
        pub start_date: DateTime<Utc>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod member {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberNew {
        pub name: String,
        pub contact: Option<String>,
        pub avatar: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MemberView {
        pub id: Uuid,
        pub name: String,
        pub contact: Option<String>,
        pub avatar: Option<String>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod expense {
    use super::*;

    /// One member's percentage in a `percentage` split request.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PercentShare {
        pub member: Uuid,
        pub percentage: f64,
    }

    /// One member's fixed amount in a `custom` split request.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CustomSplit {
        pub member: Uuid,
        pub amount: f64,
    }

    /// Request body for creating an expense.
    ///
    /// Which of the optional split fields matter depends on `split_type`:
    /// `selectedMembers` for `selected`, `percentages` for `percentage`,
    /// `customSplits` for `custom`, `amountPerPerson` for `eachPaysOwn`.
    /// `amount` is required for everything except `eachPaysOwn`, where it is
    /// derived.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseNew {
        pub description: String,
        pub amount: Option<f64>,
        pub category: Option<Category>,
        pub date: Option<DateTime<Utc>>,
        pub paid_by: Option<Uuid>,
        #[serde(default)]
        pub split_type: SplitType,
        pub selected_members: Option<Vec<Uuid>>,
        pub percentages: Option<Vec<PercentShare>>,
        pub custom_splits: Option<Vec<CustomSplit>>,
        pub amount_per_person: Option<f64>,
        pub settled: Option<bool>,
        pub payment_source: Option<PaymentSource>,
    }

    /// Partial update; absent fields keep their stored value. Supplying any
    /// split field (or `amount`) re-runs the allocator.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseUpdate {
        pub description: Option<String>,
        pub amount: Option<f64>,
        pub category: Option<Category>,
        pub date: Option<DateTime<Utc>>,
        pub paid_by: Option<Uuid>,
        pub split_type: Option<SplitType>,
        pub selected_members: Option<Vec<Uuid>>,
        pub percentages: Option<Vec<PercentShare>>,
        pub custom_splits: Option<Vec<CustomSplit>>,
        pub amount_per_person: Option<f64>,
        pub settled: Option<bool>,
        pub payment_source: Option<PaymentSource>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitView {
        pub member: Uuid,
        pub amount: f64,
        pub percentage: Option<f64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseView {
        pub id: Uuid,
        pub description: String,
        pub amount: f64,
        pub category: Category,
        pub date: DateTime<Utc>,
        pub paid_by: Option<Uuid>,
        pub split_type: SplitType,
        pub splits: Vec<SplitView>,
        pub amount_per_person: Option<f64>,
        pub settled: bool,
        pub payment_source: PaymentSource,
    }
}

pub mod contribution {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ContributionNew {
        pub member_id: Uuid,
        pub amount: f64,
        pub date: Option<DateTime<Utc>>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ContributionView {
        pub id: Uuid,
        pub member_id: Uuid,
        pub member_name: String,
        pub amount: f64,
        pub date: DateTime<Utc>,
        pub notes: Option<String>,
    }
}

pub mod settlement {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberRef {
        pub id: Uuid,
        pub name: String,
    }

    /// `balance = paid - share`: positive receives, negative owes.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerEntryView {
        pub member: MemberRef,
        pub paid: f64,
        pub share: f64,
        pub balance: f64,
    }

    /// One suggested payment, by member name.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub from: String,
        pub to: String,
        pub amount: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TotalsView {
        pub total_expense: f64,
        pub category_wise: BTreeMap<String, f64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementResponse {
        pub ledger: Vec<LedgerEntryView>,
        pub transactions: Vec<TransferView>,
        pub totals: TotalsView,
    }
}

pub mod pool {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ContributorView {
        pub member: settlement::MemberRef,
        pub contributed: f64,
        /// Proportional share of the remaining balance; 0 when overdrawn.
        pub return_amount: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PoolSummaryResponse {
        pub total_contributions: f64,
        pub total_spent_from_pool: f64,
        pub remaining_balance: f64,
        pub contributors: Vec<ContributorView>,
        pub contribution_count: usize,
        pub expense_count: usize,
    }
}

pub mod activity {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ActivityView {
        pub id: Uuid,
        pub message: String,
        pub timestamp: DateTime<Utc>,
    }
}

pub mod summary {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TripStats {
        pub name: String,
        pub total_expense: f64,
        pub member_count: usize,
        pub expense_count: usize,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AiSummaryResponse {
        pub summary: String,
        pub trip: TripStats,
    }
}
