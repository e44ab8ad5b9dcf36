//! Split allocation for a single expense.
//!
//! Converts a requested split policy plus its inputs into the concrete,
//! persistable list of per-member shares. Pure computation; the caller owns
//! persistence and any cross-checks it wants on top (percentages summing to
//! 100 and custom shares summing to the expense total are deliberately not
//! validated here).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, money::round2};

/// How an expense is divided between members.
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

impl SplitType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Selected => "selected",
            Self::Percentage => "percentage",
            Self::Custom => "custom",
            Self::EachPaysOwn => "eachPaysOwn",
        }
    }
}

impl TryFrom<&str> for SplitType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "equal" => Ok(Self::Equal),
            "selected" => Ok(Self::Selected),
            "percentage" => Ok(Self::Percentage),
            "custom" => Ok(Self::Custom),
            "eachPaysOwn" => Ok(Self::EachPaysOwn),
            other => Err(EngineError::InvalidSplit(format!(
                "invalid split type: {other}"
            ))),
        }
    }
}

/// A (member, percentage) pair for [`SplitSpec::Percentage`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PercentShare {
    pub member: Uuid,
    pub percentage: f64,
}

/// A (member, amount) pair for [`SplitSpec::Custom`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CustomShare {
    pub member: Uuid,
    pub amount: f64,
}

/// Split request: one variant per [`SplitType`], carrying exactly the inputs
/// that policy needs. Unknown split types are rejected at the wire boundary,
/// before a `SplitSpec` can exist.
#[derive(Clone, Debug, PartialEq)]
pub enum SplitSpec {
    /// Divide evenly between all trip members.
    Equal,
    /// Divide evenly between an explicit subset. An empty subset falls back
    /// to all trip members.
    Selected { members: Vec<Uuid> },
    /// Each listed member owes `amount * percentage / 100`.
    Percentage { shares: Vec<PercentShare> },
    /// Each listed member owes the amount given, verbatim.
    Custom { shares: Vec<CustomShare> },
    /// Every member pays the same per-person amount out of pocket; the
    /// expense total is derived as `amount_per_person * member_count`.
    EachPaysOwn { amount_per_person: f64 },
}

impl SplitSpec {
    pub fn split_type(&self) -> SplitType {
        match self {
            Self::Equal => SplitType::Equal,
            Self::Selected { .. } => SplitType::Selected,
            Self::Percentage { .. } => SplitType::Percentage,
            Self::Custom { .. } => SplitType::Custom,
            Self::EachPaysOwn { .. } => SplitType::EachPaysOwn,
        }
    }
}

/// One member's computed share of an expense.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub member: Uuid,
    pub amount: f64,
    pub percentage: Option<f64>,
}

/// Computes the per-member shares for one expense.
///
/// `member_ids` is the full member set of the trip, in creation order; it is
/// the target set for `Equal` and `EachPaysOwn` and the fallback for an empty
/// `Selected` subset.
///
/// # Errors
///
/// - [`EngineError::InvalidSplit`] when the target member set is empty.
/// - [`EngineError::InvalidAmount`] when `EachPaysOwn` carries a non-positive
///   per-person amount.
pub fn allocate_splits(
    amount: f64,
    spec: &SplitSpec,
    member_ids: &[Uuid],
) -> Result<Vec<Split>, EngineError> {
    if let SplitSpec::EachPaysOwn { amount_per_person } = spec {
        if *amount_per_person <= 0.0 {
            return Err(EngineError::InvalidAmount(
                "amountPerPerson is required for eachPaysOwn splits".to_string(),
            ));
        }
        if member_ids.is_empty() {
            return Err(EngineError::InvalidSplit(
                "no members to split with".to_string(),
            ));
        }
        let per_person = round2(*amount_per_person);
        return Ok(member_ids
            .iter()
            .map(|member| Split {
                member: *member,
                amount: per_person,
                percentage: None,
            })
            .collect());
    }

    let selected = match spec {
        SplitSpec::Selected { members } if !members.is_empty() => members.as_slice(),
        _ => member_ids,
    };
    if selected.is_empty() {
        return Err(EngineError::InvalidSplit(
            "no members to split with".to_string(),
        ));
    }

    match spec {
        SplitSpec::Percentage { shares } => Ok(shares
            .iter()
            .map(|share| Split {
                member: share.member,
                amount: round2(amount * share.percentage / 100.0),
                percentage: Some(share.percentage),
            })
            .collect()),
        SplitSpec::Custom { shares } => Ok(shares
            .iter()
            .map(|share| Split {
                member: share.member,
                amount: round2(share.amount),
                percentage: None,
            })
            .collect()),
        // Equal and Selected divide evenly; the per-head remainder is not
        // redistributed.
        _ => {
            let per_head = round2(amount / selected.len() as f64);
            Ok(selected
                .iter()
                .map(|member| Split {
                    member: *member,
                    amount: per_head,
                    percentage: None,
                })
                .collect())
        }
    }
}
