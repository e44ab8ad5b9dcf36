//! Balance ledger and debt simplification for one trip.
//!
//! Given the trip's members and expenses, builds a per-member ledger (total
//! paid vs. total share) and reduces it to a short list of pairwise transfers
//! via greedy largest-magnitude-first matching. The matching is an
//! approximation: it is not guaranteed to produce the globally minimal
//! transaction count, but it terminates in at most `creditors + debtors - 1`
//! transfers and drives every balance to within [`SETTLE_EPSILON`] of zero.
//!
//! Pure computation over an already-fetched snapshot; no I/O, no domain
//! errors. Expenses or splits referencing a member absent from the supplied
//! member list are skipped rather than failing the whole settlement.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    expenses::{Expense, PaymentSource},
    members::Member,
    money::{SETTLE_EPSILON, round2},
    splits::SplitType,
};

/// Member identity carried in settlement output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub id: Uuid,
    pub name: String,
}

/// Per-member paid/share/balance summary.
///
/// `balance = round2(paid - share)`: positive means the member should
/// receive, negative means the member owes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub member: MemberSummary,
    pub paid: f64,
    pub share: f64,
    pub balance: f64,
}

/// One suggested payment from a debtor to a creditor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

/// Settlement output: the full ledger (zero-balance members included) and the
/// non-trivial transfers that zero it out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub ledger: Vec<LedgerEntry>,
    pub transactions: Vec<Transfer>,
}

/// Expense totals reported alongside a settlement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpenseTotals {
    pub total_expense: f64,
    pub category_wise: BTreeMap<String, f64>,
}

/// Builds the ledger and the transfer list for a trip snapshot.
///
/// Expenses make no ledger contribution when they are self-funded
/// (`eachPaysOwn`), already settled, or paid from the shared pool. An expense
/// whose payer is missing or unknown is skipped wholesale; an unknown member
/// inside a split list loses only that split.
#[must_use]
pub fn compute_settlement(members: &[Member], expenses: &[Expense]) -> Settlement {
    let mut index: HashMap<Uuid, usize> = HashMap::with_capacity(members.len());
    let mut ledger: Vec<LedgerEntry> = Vec::with_capacity(members.len());
    for member in members {
        index.insert(member.id, ledger.len());
        ledger.push(LedgerEntry {
            member: MemberSummary {
                id: member.id,
                name: member.name.clone(),
            },
            paid: 0.0,
            share: 0.0,
            balance: 0.0,
        });
    }

    for expense in expenses {
        if expense.split_type == SplitType::EachPaysOwn
            || expense.settled
            || expense.payment_source == PaymentSource::Pool
        {
            continue;
        }

        let Some(payer_idx) = expense.paid_by.and_then(|payer| index.get(&payer).copied())
        else {
            continue;
        };
        ledger[payer_idx].paid += expense.amount;

        for split in &expense.splits {
            if let Some(idx) = index.get(&split.member).copied() {
                ledger[idx].share += split.amount;
            }
        }
    }

    for entry in &mut ledger {
        entry.balance = round2(entry.paid - entry.share);
    }

    // Scratch copies: the sweep consumes balances, the reported ledger keeps
    // the pre-sweep values.
    let mut creditors: Vec<(usize, f64)> = Vec::new();
    let mut debtors: Vec<(usize, f64)> = Vec::new();
    for (idx, entry) in ledger.iter().enumerate() {
        if entry.balance > 0.0 {
            creditors.push((idx, entry.balance));
        } else if entry.balance < 0.0 {
            debtors.push((idx, entry.balance));
        }
    }
    creditors.sort_by(|a, b| b.1.total_cmp(&a.1));
    debtors.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut transactions = Vec::new();
    let mut i = 0;
    let mut j = 0;
    while i < debtors.len() && j < creditors.len() {
        let amount = debtors[i].1.abs().min(creditors[j].1.abs());

        if amount > SETTLE_EPSILON {
            transactions.push(Transfer {
                from: ledger[debtors[i].0].member.name.clone(),
                to: ledger[creditors[j].0].member.name.clone(),
                amount: round2(amount),
            });
        }

        debtors[i].1 = round2(debtors[i].1 + amount);
        creditors[j].1 = round2(creditors[j].1 - amount);

        if debtors[i].1.abs() < SETTLE_EPSILON {
            i += 1;
        }
        if creditors[j].1.abs() < SETTLE_EPSILON {
            j += 1;
        }
    }

    Settlement {
        ledger,
        transactions,
    }
}

/// Sums all expenses (skipped ones included) overall and per category.
#[must_use]
pub fn expense_totals(expenses: &[Expense]) -> ExpenseTotals {
    let mut category_wise: BTreeMap<String, f64> = BTreeMap::new();
    let mut total_expense = 0.0;
    for expense in expenses {
        total_expense += expense.amount;
        *category_wise
            .entry(expense.category.as_str().to_string())
            .or_insert(0.0) += expense.amount;
    }
    ExpenseTotals {
        total_expense: round2(total_expense),
        category_wise: category_wise
            .into_iter()
            .map(|(category, sum)| (category, round2(sum)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::expenses::Category;
    use crate::splits::{Split, SplitSpec, allocate_splits};

    fn member(name: &str, trip_id: Uuid) -> Member {
        Member::new(trip_id, name.to_string(), None, None)
    }

    fn equal_expense(trip_id: Uuid, amount: f64, payer: Uuid, members: &[Member]) -> Expense {
        let ids: Vec<Uuid> = members.iter().map(|m| m.id).collect();
        let splits = allocate_splits(amount, &SplitSpec::Equal, &ids).unwrap();
        Expense {
            id: Uuid::new_v4(),
            trip_id,
            description: "expense".to_string(),
            amount,
            category: Category::Misc,
            date: Utc::now(),
            paid_by: Some(payer),
            split_type: SplitType::Equal,
            splits,
            amount_per_person: None,
            settled: false,
            payment_source: PaymentSource::Member,
        }
    }

    fn custom_expense(
        trip_id: Uuid,
        amount: f64,
        payer: Uuid,
        shares: Vec<(Uuid, f64)>,
    ) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            trip_id,
            description: "expense".to_string(),
            amount,
            category: Category::Misc,
            date: Utc::now(),
            paid_by: Some(payer),
            split_type: SplitType::Custom,
            splits: shares
                .into_iter()
                .map(|(member, amount)| Split {
                    member,
                    amount,
                    percentage: None,
                })
                .collect(),
            amount_per_person: None,
            settled: false,
            payment_source: PaymentSource::Member,
        }
    }

    /// Applies the transfers back onto the reported balances.
    fn apply(transactions: &[Transfer], ledger: &[LedgerEntry]) -> Vec<f64> {
        let mut balances: Vec<f64> = ledger.iter().map(|e| e.balance).collect();
        for tx in transactions {
            let from = ledger
                .iter()
                .position(|e| e.member.name == tx.from)
                .unwrap();
            let to = ledger.iter().position(|e| e.member.name == tx.to).unwrap();
            balances[from] += tx.amount;
            balances[to] -= tx.amount;
        }
        balances
    }

    #[test]
    fn end_to_end_four_member_trip() {
        let trip_id = Uuid::new_v4();
        let members: Vec<Member> = ["Jeevan", "Nagesh", "Rohit", "Akshay"]
            .iter()
            .map(|name| member(name, trip_id))
            .collect();

        // 400 dinner paid by Jeevan and 380 snacks paid by Nagesh, both split
        // four ways: every member owes 100 + 95 = 195.
        let expenses = vec![
            equal_expense(trip_id, 400.0, members[0].id, &members),
            equal_expense(trip_id, 380.0, members[1].id, &members),
        ];

        let settlement = compute_settlement(&members, &expenses);

        assert_eq!(settlement.ledger[0].paid, 400.0);
        assert_eq!(settlement.ledger[0].share, 195.0);
        let balances: Vec<f64> = settlement.ledger.iter().map(|e| e.balance).collect();
        assert_eq!(balances, vec![205.0, 185.0, -195.0, -195.0]);

        assert_eq!(
            settlement.transactions,
            vec![
                Transfer {
                    from: "Rohit".to_string(),
                    to: "Jeevan".to_string(),
                    amount: 195.0,
                },
                Transfer {
                    from: "Akshay".to_string(),
                    to: "Jeevan".to_string(),
                    amount: 10.0,
                },
                Transfer {
                    from: "Akshay".to_string(),
                    to: "Nagesh".to_string(),
                    amount: 185.0,
                },
            ]
        );
        assert!(settlement.transactions.len() <= members.len() - 1);

        for balance in apply(&settlement.transactions, &settlement.ledger) {
            assert!(balance.abs() < 0.01, "unsettled balance {balance}");
        }
    }

    #[test]
    fn greedy_sweep_matches_largest_magnitudes_first() {
        // Contrived A(+300) B(+285) C(-100) D(-100) E(-100) F(-95) G(-90),
        // built from custom splits (which are allowed to not sum to the
        // expense amount).
        let trip_id = Uuid::new_v4();
        let names = ["A", "B", "C", "D", "E", "F", "G"];
        let members: Vec<Member> = names.iter().map(|n| member(n, trip_id)).collect();

        let expenses = vec![
            custom_expense(
                trip_id,
                300.0,
                members[0].id,
                vec![
                    (members[2].id, 100.0),
                    (members[3].id, 100.0),
                    (members[4].id, 100.0),
                ],
            ),
            custom_expense(
                trip_id,
                285.0,
                members[1].id,
                vec![(members[5].id, 95.0), (members[6].id, 90.0)],
            ),
        ];

        let settlement = compute_settlement(&members, &expenses);
        let balances: Vec<f64> = settlement.ledger.iter().map(|e| e.balance).collect();
        assert_eq!(
            balances,
            vec![300.0, 285.0, -100.0, -100.0, -100.0, -95.0, -90.0]
        );

        let names_of = |tx: &Transfer| (tx.from.clone(), tx.to.clone(), tx.amount);
        let got: Vec<_> = settlement.transactions.iter().map(names_of).collect();
        assert_eq!(
            got,
            vec![
                ("C".to_string(), "A".to_string(), 100.0),
                ("D".to_string(), "A".to_string(), 100.0),
                ("E".to_string(), "A".to_string(), 100.0),
                ("F".to_string(), "B".to_string(), 95.0),
                ("G".to_string(), "B".to_string(), 90.0),
            ]
        );
        assert!(settlement.transactions.len() <= members.len() - 1);

        // every debtor ends within a cent of zero
        for (balance, name) in apply(&settlement.transactions, &settlement.ledger)
            .into_iter()
            .zip(names)
        {
            if name != "B" {
                assert!(balance.abs() < 0.01, "{name} left at {balance}");
            }
        }
    }

    #[test]
    fn ledger_is_zero_sum_for_member_funded_expenses() {
        let trip_id = Uuid::new_v4();
        let members: Vec<Member> = ["a", "b", "c"].iter().map(|n| member(n, trip_id)).collect();
        let expenses = vec![
            equal_expense(trip_id, 100.0, members[0].id, &members),
            equal_expense(trip_id, 59.99, members[1].id, &members),
        ];

        let settlement = compute_settlement(&members, &expenses);
        let paid: f64 = settlement.ledger.iter().map(|e| e.paid).sum();
        let share: f64 = settlement.ledger.iter().map(|e| e.share).sum();
        let balance: f64 = settlement.ledger.iter().map(|e| e.balance).sum();
        assert!((paid - share).abs() < 3.0 * 0.005);
        assert!(balance.abs() < 3.0 * 0.005);
    }

    #[test]
    fn pool_settled_and_each_pays_own_expenses_are_skipped() {
        let trip_id = Uuid::new_v4();
        let members: Vec<Member> = ["a", "b"].iter().map(|n| member(n, trip_id)).collect();

        let mut pool = equal_expense(trip_id, 80.0, members[0].id, &members);
        pool.payment_source = PaymentSource::Pool;
        let mut settled = equal_expense(trip_id, 60.0, members[0].id, &members);
        settled.settled = true;
        let mut own = equal_expense(trip_id, 240.0, members[0].id, &members);
        own.split_type = SplitType::EachPaysOwn;
        own.amount_per_person = Some(120.0);

        let with_skipped = compute_settlement(&members, &[pool, settled, own]);
        let without = compute_settlement(&members, &[]);
        assert_eq!(with_skipped.ledger, without.ledger);
        assert!(with_skipped.transactions.is_empty());
    }

    #[test]
    fn unknown_payer_skips_expense_unknown_split_member_skips_split() {
        let trip_id = Uuid::new_v4();
        let members: Vec<Member> = ["a", "b"].iter().map(|n| member(n, trip_id)).collect();
        let stranger = Uuid::new_v4();

        // payer unknown: no ledger effect at all
        let mut orphan = equal_expense(trip_id, 50.0, members[0].id, &members);
        orphan.paid_by = Some(stranger);

        // one split points at a removed member: only that share is dropped
        let mut partial = equal_expense(trip_id, 90.0, members[0].id, &members);
        partial.splits[1].member = stranger;

        let settlement = compute_settlement(&members, &[orphan, partial]);
        assert_eq!(settlement.ledger[0].paid, 90.0);
        assert_eq!(settlement.ledger[0].share, 45.0);
        assert_eq!(settlement.ledger[1].share, 0.0);
    }

    #[test]
    fn transfers_are_positive_and_above_threshold() {
        let trip_id = Uuid::new_v4();
        let members: Vec<Member> = ["a", "b", "c"].iter().map(|n| member(n, trip_id)).collect();
        let expenses = vec![equal_expense(trip_id, 100.0, members[0].id, &members)];

        let settlement = compute_settlement(&members, &expenses);
        assert!(!settlement.transactions.is_empty());
        for tx in &settlement.transactions {
            assert!(tx.amount > 0.01);
            assert_eq!(tx.amount, round2(tx.amount));
            assert_eq!(tx.to, "a");
        }
    }

    #[test]
    fn totals_cover_skipped_expenses_too() {
        let trip_id = Uuid::new_v4();
        let members: Vec<Member> = ["a", "b"].iter().map(|n| member(n, trip_id)).collect();
        let mut food = equal_expense(trip_id, 120.0, members[0].id, &members);
        food.category = Category::Food;
        let mut travel = equal_expense(trip_id, 80.0, members[1].id, &members);
        travel.category = Category::Travel;
        travel.settled = true;

        let totals = expense_totals(&[food, travel]);
        assert_eq!(totals.total_expense, 200.0);
        assert_eq!(totals.category_wise.get("Food"), Some(&120.0));
        assert_eq!(totals.category_wise.get("Travel"), Some(&80.0));
    }
}
