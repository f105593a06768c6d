//! This file serves as the root for all SeaORM entity modules.
//! Ownership between users and products lives on the product side only
//! (`products.user_id`); reverse lookups are plain queries.

pub mod product;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::product::Entity as Product;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, QueryFilter, Set,
    };

    use super::*;
    use crate::Principal;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    fn new_user(email: &str, username: &str) -> user::ActiveModel {
        user::ActiveModel {
            email: Set(email.to_string()),
            username: Set(username.to_string()),
            password: Set("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let owner = new_user("ana@example.com", "ana").insert(&db).await?;

        let lamp = product::ActiveModel {
            name: Set("Desk lamp".to_string()),
            price: Set(24.5),
            description: Set("Warm white LED lamp".to_string()),
            image: Set(None),
            user_id: Set(Some(owner.id)),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        product::ActiveModel {
            name: Set("Orphan mug".to_string()),
            price: Set(7.0),
            description: Set("Nobody owns this one".to_string()),
            image: Set(None),
            user_id: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Reverse lookup through the relation
        let owned = owner.find_related(Product).all(&db).await?;
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, lamp.id);

        // And forward lookup from the product side
        let (found, found_owner) = Product::find_by_id(lamp.id)
            .find_also_related(User)
            .one(&db)
            .await?
            .expect("product should exist");
        assert_eq!(found.name, "Desk lamp");
        assert_eq!(found_owner.map(|u| u.username), Some("ana".to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn test_email_is_unique() -> Result<(), DbErr> {
        let db = setup_db().await?;

        new_user("dup@example.com", "first").insert(&db).await?;
        let err = new_user("dup@example.com", "second")
            .insert(&db)
            .await
            .expect_err("duplicate email must be rejected");
        assert!(err.to_string().to_lowercase().contains("unique"));

        Ok(())
    }

    #[tokio::test]
    async fn test_removing_owner_detaches_products() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let owner = new_user("gone@example.com", "gone").insert(&db).await?;
        let chair = product::ActiveModel {
            name: Set("Chair".to_string()),
            price: Set(80.0),
            description: Set("Oak chair".to_string()),
            image: Set(None),
            user_id: Set(Some(owner.id)),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        owner.delete(&db).await?;

        let chair = Product::find_by_id(chair.id)
            .one(&db)
            .await?
            .expect("product survives owner removal");
        assert_eq!(chair.user_id, None);

        let orphans = Product::find()
            .filter(product::Column::UserId.is_null())
            .all(&db)
            .await?;
        assert_eq!(orphans.len(), 1);

        Ok(())
    }

    #[test]
    fn test_user_is_a_principal() {
        let user = user::Model {
            id: 1,
            email: "ana@example.com".to_string(),
            username: "ana".to_string(),
            password: "hash".to_string(),
        };

        assert_eq!(user.identifier(), "ana@example.com");
        assert_eq!(user.credential_hash(), "hash");
        assert!(user.has_role("ROLE_USER"));
        assert!(!user.has_role("ROLE_ADMIN"));
    }
}
