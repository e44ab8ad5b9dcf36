//! Initial schema migration - creates all tables from scratch.
//!
//! The complete schema for TripSplit:
//!
//! - `trips`: top-level grouping
//! - `members`: people on a trip
//! - `expenses`: spending records with their split metadata
//! - `expense_splits`: one owed share per (expense, member)
//! - `contributions`: money paid into the shared trip pool
//! - `activity`: capped per-trip feed of human-readable events

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Trips {
    Table,
    Id,
    Name,
    StartDate,
    CreatedAt,
}

#[derive(Iden)]
enum Members {
    Table,
    Id,
    TripId,
    Name,
    Contact,
    Avatar,
    CreatedAt,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    TripId,
    Description,
    Amount,
    Category,
    Date,
    PaidBy,
    SplitType,
    AmountPerPerson,
    Settled,
    PaymentSource,
}

#[derive(Iden)]
enum ExpenseSplits {
    Table,
    Id,
    ExpenseId,
    MemberId,
    Amount,
    Percentage,
}

#[derive(Iden)]
enum Contributions {
    Table,
    Id,
    TripId,
    MemberId,
    Amount,
    Date,
    Notes,
}

#[derive(Iden)]
enum Activity {
    Table,
    Id,
    TripId,
    Message,
    Timestamp,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Trips
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Trips::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Trips::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Trips::Name).string().not_null())
                    .col(ColumnDef::new(Trips::StartDate).timestamp().not_null())
                    .col(ColumnDef::new(Trips::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Members::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Members::TripId).string().not_null())
                    .col(ColumnDef::new(Members::Name).string().not_null())
                    .col(ColumnDef::new(Members::Contact).string())
                    .col(ColumnDef::new(Members::Avatar).string())
                    .col(ColumnDef::new(Members::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-members-trip_id")
                            .from(Members::Table, Members::TripId)
                            .to(Trips::Table, Trips::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-members-trip_id-name-unique")
                    .table(Members::Table)
                    .col(Members::TripId)
                    .col(Members::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::TripId).string().not_null())
                    .col(ColumnDef::new(Expenses::Description).string().not_null())
                    .col(ColumnDef::new(Expenses::Amount).double().not_null())
                    .col(ColumnDef::new(Expenses::Category).string().not_null())
                    .col(ColumnDef::new(Expenses::Date).timestamp().not_null())
                    .col(ColumnDef::new(Expenses::PaidBy).string())
                    .col(ColumnDef::new(Expenses::SplitType).string().not_null())
                    .col(ColumnDef::new(Expenses::AmountPerPerson).double())
                    .col(ColumnDef::new(Expenses::Settled).boolean().not_null())
                    .col(
                        ColumnDef::new(Expenses::PaymentSource)
                            .string()
                            .not_null()
                            .default("member"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-trip_id")
                            .from(Expenses::Table, Expenses::TripId)
                            .to(Trips::Table, Trips::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-trip_id-date")
                    .table(Expenses::Table)
                    .col(Expenses::TripId)
                    .col(Expenses::Date)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Expense splits
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ExpenseSplits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseSplits::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExpenseSplits::ExpenseId).string().not_null())
                    .col(ColumnDef::new(ExpenseSplits::MemberId).string().not_null())
                    .col(ColumnDef::new(ExpenseSplits::Amount).double().not_null())
                    .col(ColumnDef::new(ExpenseSplits::Percentage).double())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_splits-expense_id")
                            .from(ExpenseSplits::Table, ExpenseSplits::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_splits-expense_id")
                    .table(ExpenseSplits::Table)
                    .col(ExpenseSplits::ExpenseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_splits-member_id")
                    .table(ExpenseSplits::Table)
                    .col(ExpenseSplits::MemberId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Contributions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Contributions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contributions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contributions::TripId).string().not_null())
                    .col(ColumnDef::new(Contributions::MemberId).string().not_null())
                    .col(ColumnDef::new(Contributions::Amount).double().not_null())
                    .col(ColumnDef::new(Contributions::Date).timestamp().not_null())
                    .col(ColumnDef::new(Contributions::Notes).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-contributions-trip_id")
                            .from(Contributions::Table, Contributions::TripId)
                            .to(Trips::Table, Trips::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-contributions-member_id")
                            .from(Contributions::Table, Contributions::MemberId)
                            .to(Members::Table, Members::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-contributions-trip_id-date")
                    .table(Contributions::Table)
                    .col(Contributions::TripId)
                    .col(Contributions::Date)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Activity
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Activity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Activity::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Activity::TripId).string().not_null())
                    .col(ColumnDef::new(Activity::Message).string().not_null())
                    .col(ColumnDef::new(Activity::Timestamp).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-activity-trip_id")
                            .from(Activity::Table, Activity::TripId)
                            .to(Trips::Table, Trips::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-activity-trip_id-timestamp")
                    .table(Activity::Table)
                    .col(Activity::TripId)
                    .col(Activity::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Activity::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contributions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExpenseSplits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Trips::Table).to_owned())
            .await
    }
}
