use chrono::{DateTime, Utc};
use std::collections::HashMap;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};
use uuid::Uuid;

pub use activity::{ACTIVITY_CAP, ActivityEntry};
pub use contributions::Contribution;
pub use error::EngineError;
pub use expenses::{Category, Expense, ExpenseUpdate, NewExpense, PaymentSource};
pub use members::{Member, NewMember};
pub use money::{SETTLE_EPSILON, format_amount, round2};
pub use pool::{ContributorSummary, PoolSummary, compute_pool_summary};
use sea_orm::{
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};
pub use settlement::{
    ExpenseTotals, LedgerEntry, MemberSummary, Settlement, Transfer, compute_settlement,
    expense_totals,
};
pub use splits::{CustomShare, PercentShare, Split, SplitSpec, SplitType, allocate_splits};
pub use trips::Trip;

mod activity;
mod contributions;
mod error;
mod expense_splits;
mod expenses;
mod members;
mod money;
mod pool;
mod settlement;
mod splits;
mod trips;

type ResultEngine<T> = Result<T, EngineError>;

/// Key used for duplicate member-name detection: NFKD, combining marks
/// stripped, lowercased, whitespace collapsed.
fn member_name_key(name: &str) -> String {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in name.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_whitespace() {
            if !out.is_empty() && !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
            prev_space = false;
        }
    }
    out.trim_end().to_string()
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    async fn require_trip(&self, trip_id: Uuid) -> ResultEngine<Trip> {
        let model = trips::Entity::find_by_id(trip_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("trip not exists".to_string()))?;
        Trip::try_from(model)
    }

    async fn require_member(&self, trip_id: Uuid, member_id: Uuid) -> ResultEngine<Member> {
        let model = members::Entity::find_by_id(member_id.to_string())
            .filter(members::Column::TripId.eq(trip_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("member not exists".to_string()))?;
        Member::try_from(model)
    }

    /// Record a feed line for a trip, pruning entries past the cap.
    async fn record_activity(&self, trip_id: Uuid, message: &str) -> ResultEngine<()> {
        activity::active_model(trip_id, message)
            .insert(&self.database)
            .await?;

        let stale: Vec<String> = activity::Entity::find()
            .filter(activity::Column::TripId.eq(trip_id.to_string()))
            .order_by_desc(activity::Column::Timestamp)
            .offset(ACTIVITY_CAP)
            .limit(ACTIVITY_CAP)
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| model.id)
            .collect();
        if !stale.is_empty() {
            activity::Entity::delete_many()
                .filter(activity::Column::Id.is_in(stale))
                .exec(&self.database)
                .await?;
        }
        Ok(())
    }

    /// Create a trip, optionally with an initial member list.
    pub async fn new_trip(
        &self,
        name: &str,
        start_date: Option<DateTime<Utc>>,
        initial_members: Vec<NewMember>,
    ) -> ResultEngine<Trip> {
        let trip = Trip::new(name.to_string(), start_date);

        let mut seen: Vec<String> = Vec::new();
        let mut members = Vec::with_capacity(initial_members.len());
        for input in initial_members {
            let key = member_name_key(&input.name);
            if key.is_empty() {
                return Err(EngineError::InvalidName(
                    "member name must not be empty".to_string(),
                ));
            }
            if seen.contains(&key) {
                return Err(EngineError::ExistingKey(input.name));
            }
            seen.push(key);
            members.push(Member::new(trip.id, input.name, input.contact, input.avatar));
        }

        let db_tx = self.database.begin().await?;
        trips::ActiveModel::from(&trip).insert(&db_tx).await?;
        for member in &members {
            members::ActiveModel::from(member).insert(&db_tx).await?;
        }
        db_tx.commit().await?;

        self.record_activity(trip.id, &format!("Trip \"{}\" was created", trip.name))
            .await?;
        Ok(trip)
    }

    /// List every trip, most recently created first.
    pub async fn trips(&self) -> ResultEngine<Vec<Trip>> {
        let models = trips::Entity::find()
            .order_by_desc(trips::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Trip::try_from).collect()
    }

    /// Return a single trip.
    pub async fn trip(&self, trip_id: Uuid) -> ResultEngine<Trip> {
        self.require_trip(trip_id).await
    }

    /// Rename a trip or move its start date.
    pub async fn update_trip(
        &self,
        trip_id: Uuid,
        name: Option<&str>,
        start_date: Option<DateTime<Utc>>,
    ) -> ResultEngine<Trip> {
        let mut trip = self.require_trip(trip_id).await?;
        if let Some(name) = name {
            trip.name = name.to_string();
        }
        if let Some(start_date) = start_date {
            trip.start_date = start_date;
        }
        trips::ActiveModel::from(&trip).save(&self.database).await?;
        Ok(trip)
    }

    /// Delete a trip and everything hanging off it.
    pub async fn delete_trip(&self, trip_id: Uuid) -> ResultEngine<()> {
        self.require_trip(trip_id).await?;
        let trip_key = trip_id.to_string();

        let expense_ids: Vec<String> = expenses::Entity::find()
            .filter(expenses::Column::TripId.eq(trip_key.clone()))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| model.id)
            .collect();

        let db_tx = self.database.begin().await?;
        if !expense_ids.is_empty() {
            expense_splits::Entity::delete_many()
                .filter(expense_splits::Column::ExpenseId.is_in(expense_ids))
                .exec(&db_tx)
                .await?;
        }
        expenses::Entity::delete_many()
            .filter(expenses::Column::TripId.eq(trip_key.clone()))
            .exec(&db_tx)
            .await?;
        contributions::Entity::delete_many()
            .filter(contributions::Column::TripId.eq(trip_key.clone()))
            .exec(&db_tx)
            .await?;
        activity::Entity::delete_many()
            .filter(activity::Column::TripId.eq(trip_key.clone()))
            .exec(&db_tx)
            .await?;
        members::Entity::delete_many()
            .filter(members::Column::TripId.eq(trip_key.clone()))
            .exec(&db_tx)
            .await?;
        trips::Entity::delete_many()
            .filter(trips::Column::Id.eq(trip_key))
            .exec(&db_tx)
            .await?;
        db_tx.commit().await?;
        Ok(())
    }

    /// Add a member to a trip. Names are unique per trip under Unicode-aware,
    /// case-insensitive comparison.
    pub async fn add_member(
        &self,
        trip_id: Uuid,
        name: &str,
        contact: Option<String>,
        avatar: Option<String>,
    ) -> ResultEngine<Member> {
        self.require_trip(trip_id).await?;

        let key = member_name_key(name);
        if key.is_empty() {
            return Err(EngineError::InvalidName(
                "member name must not be empty".to_string(),
            ));
        }
        let existing = self.members(trip_id).await?;
        if existing
            .iter()
            .any(|member| member_name_key(&member.name) == key)
        {
            return Err(EngineError::ExistingKey(name.to_string()));
        }

        let member = Member::new(trip_id, name.to_string(), contact, avatar);
        members::ActiveModel::from(&member)
            .insert(&self.database)
            .await?;
        self.record_activity(trip_id, &format!("{} joined the trip", member.name))
            .await?;
        Ok(member)
    }

    /// List the members of a trip in join order.
    pub async fn members(&self, trip_id: Uuid) -> ResultEngine<Vec<Member>> {
        self.require_trip(trip_id).await?;
        let models = members::Entity::find()
            .filter(members::Column::TripId.eq(trip_id.to_string()))
            .order_by_asc(members::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Member::try_from).collect()
    }

    /// Remove a member, provided no expense references them as payer or split
    /// participant.
    pub async fn remove_member(&self, trip_id: Uuid, member_id: Uuid) -> ResultEngine<()> {
        let member = self.require_member(trip_id, member_id).await?;

        let paid = expenses::Entity::find()
            .filter(expenses::Column::TripId.eq(trip_id.to_string()))
            .filter(expenses::Column::PaidBy.eq(member_id.to_string()))
            .count(&self.database)
            .await?;
        let owed = expense_splits::Entity::find()
            .filter(expense_splits::Column::MemberId.eq(member_id.to_string()))
            .join(JoinType::InnerJoin, expense_splits::Relation::Expenses.def())
            .filter(expenses::Column::TripId.eq(trip_id.to_string()))
            .count(&self.database)
            .await?;
        if paid > 0 || owed > 0 {
            return Err(EngineError::MemberInUse(member.name));
        }

        members::Entity::delete_many()
            .filter(members::Column::Id.eq(member_id.to_string()))
            .exec(&self.database)
            .await?;
        self.record_activity(trip_id, &format!("{} left the trip", member.name))
            .await?;
        Ok(())
    }

    /// Create an expense, running the allocator on its split spec.
    ///
    /// For `eachPaysOwn` the total is derived from the per-person amount and
    /// the current member count; for every other spec the total is required.
    pub async fn new_expense(&self, trip_id: Uuid, input: NewExpense) -> ResultEngine<Expense> {
        self.require_trip(trip_id).await?;
        let members = self.members(trip_id).await?;
        let member_ids: Vec<Uuid> = members.iter().map(|member| member.id).collect();

        if let Some(payer) = input.paid_by
            && !member_ids.contains(&payer)
        {
            return Err(EngineError::KeyNotFound("member not exists".to_string()));
        }

        let amount = match &input.spec {
            SplitSpec::EachPaysOwn { amount_per_person } => {
                if member_ids.is_empty() {
                    return Err(EngineError::InvalidSplit(
                        "no members to split with".to_string(),
                    ));
                }
                round2(amount_per_person * member_ids.len() as f64)
            }
            _ => input
                .amount
                .ok_or_else(|| EngineError::InvalidAmount("amount is required".to_string()))?,
        };

        let splits = allocate_splits(amount, &input.spec, &member_ids)?;

        let mut expense = Expense::new(
            trip_id,
            input.description,
            amount,
            input.category,
            input.date.unwrap_or_else(Utc::now),
            input.paid_by,
            input.spec.split_type(),
            input.payment_source,
        )?;
        expense.settled = input.settled;
        if let SplitSpec::EachPaysOwn { amount_per_person } = &input.spec {
            expense.amount_per_person = Some(round2(*amount_per_person));
        }
        expense.splits = splits;

        let db_tx = self.database.begin().await?;
        expenses::ActiveModel::from(&expense).insert(&db_tx).await?;
        for split in &expense.splits {
            expense_splits::active_model(expense.id, split)
                .insert(&db_tx)
                .await?;
        }
        db_tx.commit().await?;

        let message = match expense.paid_by {
            Some(payer) => {
                let payer_name = members
                    .iter()
                    .find(|member| member.id == payer)
                    .map(|member| member.name.as_str())
                    .unwrap_or("someone");
                format!(
                    "{payer_name} added {} for \"{}\"",
                    format_amount(expense.amount),
                    expense.description
                )
            }
            None => format!(
                "\"{}\" ({}) was paid from the trip pool",
                expense.description,
                format_amount(expense.amount)
            ),
        };
        self.record_activity(trip_id, &message).await?;
        Ok(expense)
    }

    /// List a trip's expenses, newest first, with splits attached.
    pub async fn expenses(&self, trip_id: Uuid) -> ResultEngine<Vec<Expense>> {
        self.require_trip(trip_id).await?;
        let models = expenses::Entity::find()
            .filter(expenses::Column::TripId.eq(trip_id.to_string()))
            .order_by_desc(expenses::Column::Date)
            .all(&self.database)
            .await?;

        let expense_ids: Vec<String> = models.iter().map(|model| model.id.clone()).collect();
        let mut splits_by_expense: HashMap<String, Vec<Split>> = HashMap::new();
        if !expense_ids.is_empty() {
            let split_models = expense_splits::Entity::find()
                .filter(expense_splits::Column::ExpenseId.is_in(expense_ids))
                .all(&self.database)
                .await?;
            for model in split_models {
                let expense_id = model.expense_id.clone();
                splits_by_expense
                    .entry(expense_id)
                    .or_default()
                    .push(Split::try_from(model)?);
            }
        }

        let mut out = Vec::with_capacity(models.len());
        for model in models {
            let splits = splits_by_expense.remove(&model.id).unwrap_or_default();
            let mut expense = Expense::try_from(model)?;
            expense.splits = splits;
            out.push(expense);
        }
        Ok(out)
    }

    async fn expense_with_splits(&self, trip_id: Uuid, expense_id: Uuid) -> ResultEngine<Expense> {
        let model = expenses::Entity::find_by_id(expense_id.to_string())
            .filter(expenses::Column::TripId.eq(trip_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
        let split_models = expense_splits::Entity::find()
            .filter(expense_splits::Column::ExpenseId.eq(expense_id.to_string()))
            .all(&self.database)
            .await?;
        let mut expense = Expense::try_from(model)?;
        expense.splits = split_models
            .into_iter()
            .map(Split::try_from)
            .collect::<Result<_, _>>()?;
        Ok(expense)
    }

    /// Rebuild a split spec equivalent to what an expense has stored, for
    /// re-allocation when only the total changes.
    fn stored_spec(expense: &Expense) -> SplitSpec {
        match expense.split_type {
            SplitType::Equal => SplitSpec::Equal,
            SplitType::Selected => SplitSpec::Selected {
                members: expense.splits.iter().map(|split| split.member).collect(),
            },
            SplitType::Percentage => SplitSpec::Percentage {
                shares: expense
                    .splits
                    .iter()
                    .filter_map(|split| {
                        split.percentage.map(|percentage| PercentShare {
                            member: split.member,
                            percentage,
                        })
                    })
                    .collect(),
            },
            SplitType::Custom => SplitSpec::Custom {
                shares: expense
                    .splits
                    .iter()
                    .map(|split| CustomShare {
                        member: split.member,
                        amount: split.amount,
                    })
                    .collect(),
            },
            SplitType::EachPaysOwn => SplitSpec::EachPaysOwn {
                amount_per_person: expense.amount_per_person.unwrap_or_default(),
            },
        }
    }

    /// Update an expense. Splits are re-allocated when the spec or the total
    /// changes; metadata-only updates leave them untouched.
    pub async fn update_expense(
        &self,
        trip_id: Uuid,
        expense_id: Uuid,
        update: ExpenseUpdate,
    ) -> ResultEngine<Expense> {
        let mut expense = self.expense_with_splits(trip_id, expense_id).await?;
        let members = self.members(trip_id).await?;
        let member_ids: Vec<Uuid> = members.iter().map(|member| member.id).collect();

        if let Some(payer) = update.paid_by {
            if !member_ids.contains(&payer) {
                return Err(EngineError::KeyNotFound("member not exists".to_string()));
            }
            expense.paid_by = Some(payer);
        }
        if let Some(description) = update.description {
            expense.description = description;
        }
        if let Some(category) = update.category {
            expense.category = category;
        }
        if let Some(date) = update.date {
            expense.date = date;
        }
        if let Some(settled) = update.settled {
            expense.settled = settled;
        }
        if let Some(payment_source) = update.payment_source {
            expense.payment_source = payment_source;
        }

        let reallocate = update.spec.is_some() || update.amount.is_some();
        if reallocate {
            let spec = update.spec.unwrap_or_else(|| Self::stored_spec(&expense));
            let amount = match &spec {
                SplitSpec::EachPaysOwn { amount_per_person } => {
                    if member_ids.is_empty() {
                        return Err(EngineError::InvalidSplit(
                            "no members to split with".to_string(),
                        ));
                    }
                    round2(amount_per_person * member_ids.len() as f64)
                }
                _ => update.amount.unwrap_or(expense.amount),
            };
            if amount <= 0.0 {
                return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
            }
            expense.splits = allocate_splits(amount, &spec, &member_ids)?;
            expense.amount = amount;
            expense.split_type = spec.split_type();
            expense.amount_per_person = match &spec {
                SplitSpec::EachPaysOwn { amount_per_person } => Some(round2(*amount_per_person)),
                _ => None,
            };
        }
        if expense.paid_by.is_none() && expense.payment_source != PaymentSource::Pool {
            return Err(EngineError::InvalidAmount(
                "paidBy is required unless the expense is pool-funded".to_string(),
            ));
        }

        let db_tx = self.database.begin().await?;
        if reallocate {
            expense_splits::Entity::delete_many()
                .filter(expense_splits::Column::ExpenseId.eq(expense_id.to_string()))
                .exec(&db_tx)
                .await?;
            for split in &expense.splits {
                expense_splits::active_model(expense.id, split)
                    .insert(&db_tx)
                    .await?;
            }
        }
        expenses::ActiveModel::from(&expense).save(&db_tx).await?;
        db_tx.commit().await?;

        self.record_activity(
            trip_id,
            &format!("Expense \"{}\" was updated", expense.description),
        )
        .await?;
        Ok(expense)
    }

    /// Delete an expense and its splits.
    pub async fn delete_expense(&self, trip_id: Uuid, expense_id: Uuid) -> ResultEngine<()> {
        let expense = self.expense_with_splits(trip_id, expense_id).await?;

        let db_tx = self.database.begin().await?;
        expense_splits::Entity::delete_many()
            .filter(expense_splits::Column::ExpenseId.eq(expense_id.to_string()))
            .exec(&db_tx)
            .await?;
        expenses::Entity::delete_many()
            .filter(expenses::Column::Id.eq(expense_id.to_string()))
            .exec(&db_tx)
            .await?;
        db_tx.commit().await?;

        self.record_activity(
            trip_id,
            &format!("Expense \"{}\" was removed", expense.description),
        )
        .await?;
        Ok(())
    }

    /// Record a pool contribution from a trip member.
    pub async fn add_contribution(
        &self,
        trip_id: Uuid,
        member_id: Uuid,
        amount: f64,
        date: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> ResultEngine<Contribution> {
        if amount <= 0.0 {
            return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
        }
        let member = self.require_member(trip_id, member_id).await?;

        let contribution = Contribution::new(
            trip_id,
            member_id,
            amount,
            date.unwrap_or_else(Utc::now),
            notes,
        );
        contributions::ActiveModel::from(&contribution)
            .insert(&self.database)
            .await?;
        self.record_activity(
            trip_id,
            &format!(
                "{} contributed {} to the trip pool",
                member.name,
                format_amount(amount)
            ),
        )
        .await?;
        Ok(contribution)
    }

    /// List contributions with their contributor, newest first.
    pub async fn contributions(&self, trip_id: Uuid) -> ResultEngine<Vec<(Contribution, Member)>> {
        self.require_trip(trip_id).await?;
        let rows = contributions::Entity::find()
            .filter(contributions::Column::TripId.eq(trip_id.to_string()))
            .order_by_desc(contributions::Column::Date)
            .find_also_related(members::Entity)
            .all(&self.database)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for (contribution_model, member_model) in rows {
            let member_model = member_model
                .ok_or_else(|| EngineError::KeyNotFound("member not exists".to_string()))?;
            out.push((
                Contribution::try_from(contribution_model)?,
                Member::try_from(member_model)?,
            ));
        }
        Ok(out)
    }

    /// Delete a pool contribution.
    pub async fn delete_contribution(
        &self,
        trip_id: Uuid,
        contribution_id: Uuid,
    ) -> ResultEngine<()> {
        let deleted = contributions::Entity::delete_many()
            .filter(contributions::Column::Id.eq(contribution_id.to_string()))
            .filter(contributions::Column::TripId.eq(trip_id.to_string()))
            .exec(&self.database)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(
                "contribution not exists".to_string(),
            ));
        }
        self.record_activity(trip_id, "A pool contribution was removed")
            .await?;
        Ok(())
    }

    /// Summarize the trip pool: totals, remaining balance, and proportional
    /// returns per contributor.
    pub async fn pool_summary(&self, trip_id: Uuid) -> ResultEngine<PoolSummary> {
        self.require_trip(trip_id).await?;
        let rows = contributions::Entity::find()
            .filter(contributions::Column::TripId.eq(trip_id.to_string()))
            .order_by_asc(contributions::Column::Date)
            .find_also_related(members::Entity)
            .all(&self.database)
            .await?;

        let mut contributions = Vec::with_capacity(rows.len());
        for (contribution_model, member_model) in rows {
            let member_model = member_model
                .ok_or_else(|| EngineError::KeyNotFound("member not exists".to_string()))?;
            let member = Member::try_from(member_model)?;
            contributions.push((
                Contribution::try_from(contribution_model)?,
                MemberSummary {
                    id: member.id,
                    name: member.name,
                },
            ));
        }

        let pool_expenses: Vec<Expense> = self
            .expenses(trip_id)
            .await?
            .into_iter()
            .filter(|expense| expense.payment_source == PaymentSource::Pool)
            .collect();

        Ok(compute_pool_summary(&contributions, &pool_expenses))
    }

    /// Compute the settlement for a trip: ledger, simplified transfers, and
    /// expense totals.
    pub async fn settlement(&self, trip_id: Uuid) -> ResultEngine<(Settlement, ExpenseTotals)> {
        let members = self.members(trip_id).await?;
        let expenses = self.expenses(trip_id).await?;
        let settlement = compute_settlement(&members, &expenses);
        let totals = expense_totals(&expenses);
        Ok((settlement, totals))
    }

    /// The trip's activity feed, newest first, capped.
    pub async fn activity(&self, trip_id: Uuid) -> ResultEngine<Vec<ActivityEntry>> {
        self.require_trip(trip_id).await?;
        let models = activity::Entity::find()
            .filter(activity::Column::TripId.eq(trip_id.to_string()))
            .order_by_desc(activity::Column::Timestamp)
            .limit(ACTIVITY_CAP)
            .all(&self.database)
            .await?;
        models.into_iter().map(ActivityEntry::try_from).collect()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
        }
    }
}
