use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Credentials of the seeded admin account. Change the password after
/// first login.
pub const SEED_ADMIN_EMAIL: &str = "admin@platter.local";
pub const SEED_ADMIN_PASSWORD: &str = "admin1234";

fn hash_seed_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(SEED_ADMIN_PASSWORD.as_bytes(), &salt)
        .expect("Failed to hash seed admin password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Dishes)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Orders)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(OrderItems)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Seed the admin account; signup only ever creates customers.
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_seed_password();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                crate::entities::users::Column::Name,
                crate::entities::users::Column::Email,
                crate::entities::users::Column::PasswordHash,
                crate::entities::users::Column::Role,
                crate::entities::users::Column::Active,
                crate::entities::users::Column::CreatedAt,
                crate::entities::users::Column::UpdatedAt,
            ])
            .values_panic([
                "Administrator".into(),
                SEED_ADMIN_EMAIL.into(),
                password_hash.into(),
                "admin".into(),
                true.into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderItems).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Dishes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
