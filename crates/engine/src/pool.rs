//! Shared-pool accounting.
//!
//! Contributions build a trip pool; expenses with `paymentSource = pool` are
//! drawn from it without touching individual balances. The summary reports
//! how much each contributor put in and what a proportional refund of the
//! remaining balance would be.

use serde::{Deserialize, Serialize};

use crate::{
    contributions::Contribution,
    expenses::Expense,
    money::round2,
    settlement::MemberSummary,
};

/// One contributor's totals inside a [`PoolSummary`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContributorSummary {
    pub member: MemberSummary,
    pub contributed: f64,
    /// Proportional share of the remaining pool balance; 0 when the pool is
    /// overdrawn.
    pub return_amount: f64,
}

/// Aggregate view of the trip pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub total_contributions: f64,
    pub total_spent_from_pool: f64,
    pub remaining_balance: f64,
    pub contributors: Vec<ContributorSummary>,
    pub contribution_count: usize,
    pub expense_count: usize,
}

/// Summarizes the pool from contributions and the pool-funded expenses.
///
/// `pool_expenses` must already be filtered to `paymentSource = pool`;
/// contributors appear in first-contribution order.
#[must_use]
pub fn compute_pool_summary(
    contributions: &[(Contribution, MemberSummary)],
    pool_expenses: &[Expense],
) -> PoolSummary {
    let total_contributions: f64 = contributions.iter().map(|(c, _)| c.amount).sum();
    let total_spent_from_pool: f64 = pool_expenses.iter().map(|e| e.amount).sum();
    let remaining_balance = round2(total_contributions - total_spent_from_pool);

    let mut contributors: Vec<ContributorSummary> = Vec::new();
    for (contribution, member) in contributions {
        match contributors
            .iter_mut()
            .find(|entry| entry.member.id == member.id)
        {
            Some(entry) => entry.contributed += contribution.amount,
            None => contributors.push(ContributorSummary {
                member: member.clone(),
                contributed: contribution.amount,
                return_amount: 0.0,
            }),
        }
    }

    for entry in &mut contributors {
        entry.contributed = round2(entry.contributed);
        if remaining_balance > 0.0 && total_contributions > 0.0 {
            let ratio = entry.contributed / total_contributions;
            entry.return_amount = round2(remaining_balance * ratio);
        }
    }

    PoolSummary {
        total_contributions: round2(total_contributions),
        total_spent_from_pool: round2(total_spent_from_pool),
        remaining_balance,
        contribution_count: contributions.len(),
        expense_count: pool_expenses.len(),
        contributors,
    }
}
