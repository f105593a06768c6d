use sea_orm::entity::prelude::*;

use crate::principal::Principal;

/// A registered user of the store.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub username: String,
    /// Argon2 PHC string. Never serialized into responses.
    pub password: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A user can own multiple products.
    #[sea_orm(has_many = "super::product::Entity")]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Principal for Model {
    fn identifier(&self) -> &str {
        &self.email
    }

    fn roles(&self) -> &[&'static str] {
        &["ROLE_USER"]
    }

    fn credential_hash(&self) -> &str {
        &self.password
    }
}
