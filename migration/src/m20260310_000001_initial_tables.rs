//! Initial schema: agents, sessions, clicks, conversions.
//!
//! Sessions carry a unique index on session_code so concurrent first
//! clicks for the same visitor collapse into one row.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Agents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Agents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Agents::Code).string_len(16).not_null())
                    .col(ColumnDef::new(Agents::Name).string().not_null())
                    .col(ColumnDef::new(Agents::Memo).text().null())
                    .col(ColumnDef::new(Agents::Contact).string().null())
                    .col(ColumnDef::new(Agents::CommissionType).string_len(16).not_null())
                    .col(ColumnDef::new(Agents::CommissionAmount).big_integer().null())
                    .col(ColumnDef::new(Agents::CommissionRate).double().null())
                    .col(
                        ColumnDef::new(Agents::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Agents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Agents::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_agents_code")
                    .table(Agents::Table)
                    .col(Agents::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sessions::SessionCode).string_len(64).not_null())
                    .col(ColumnDef::new(Sessions::AgentId).big_integer().not_null())
                    .col(ColumnDef::new(Sessions::DeviceType).string_len(16).not_null())
                    .col(ColumnDef::new(Sessions::Browser).string_len(32).not_null())
                    .col(ColumnDef::new(Sessions::Os).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Sessions::PageViews)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Sessions::Converted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Sessions::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::LastSeenAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::EndedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Uniqueness is what makes the session upsert race-safe.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sessions_code")
                    .table(Sessions::Table)
                    .col(Sessions::SessionCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sessions_agent")
                    .table(Sessions::Table)
                    .col(Sessions::AgentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Clicks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Clicks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Clicks::AgentId).big_integer().not_null())
                    .col(ColumnDef::new(Clicks::SessionCode).string_len(64).not_null())
                    .col(ColumnDef::new(Clicks::Ip).string_len(64).null())
                    .col(ColumnDef::new(Clicks::UserAgent).text().null())
                    .col(ColumnDef::new(Clicks::Referrer).text().null())
                    .col(ColumnDef::new(Clicks::LandingUrl).text().null())
                    .col(
                        ColumnDef::new(Clicks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Latest-click lookup for conversions runs on (agent, session).
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_clicks_agent_session")
                    .table(Clicks::Table)
                    .col(Clicks::AgentId)
                    .col(Clicks::SessionCode)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Conversions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Conversions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Conversions::AgentId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Conversions::SessionCode)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Conversions::ClickId).big_integer().null())
                    .col(ColumnDef::new(Conversions::FormData).text().not_null())
                    .col(
                        ColumnDef::new(Conversions::EstimatedValue)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Conversions::CommissionAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Conversions::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Conversions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Conversions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_conversions_agent_status")
                    .table(Conversions::Table)
                    .col(Conversions::AgentId)
                    .col(Conversions::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_conversions_agent_status").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Conversions::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_clicks_agent_session").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Clicks::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_sessions_agent").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_sessions_code").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_agents_code").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Agents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Agents {
    #[sea_orm(iden = "agents")]
    Table,
    Id,
    Code,
    Name,
    Memo,
    Contact,
    CommissionType,
    CommissionAmount,
    CommissionRate,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Sessions {
    #[sea_orm(iden = "sessions")]
    Table,
    Id,
    SessionCode,
    AgentId,
    DeviceType,
    Browser,
    Os,
    PageViews,
    Converted,
    StartedAt,
    LastSeenAt,
    EndedAt,
}

#[derive(DeriveIden)]
enum Clicks {
    #[sea_orm(iden = "clicks")]
    Table,
    Id,
    AgentId,
    SessionCode,
    Ip,
    UserAgent,
    Referrer,
    LandingUrl,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Conversions {
    #[sea_orm(iden = "conversions")]
    Table,
    Id,
    AgentId,
    SessionCode,
    ClickId,
    FormData,
    EstimatedValue,
    CommissionAmount,
    Status,
    CreatedAt,
    UpdatedAt,
}
