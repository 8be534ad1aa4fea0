//! User database entity for SeaORM.

use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::{generate_user_id, CreateUser, User};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    #[sea_orm(unique, indexed)]
    pub phone_number: String,
    #[sea_orm(unique)]
    pub email: Option<String>,
    pub country: String,
    pub data_created: Option<DateTime>,
    pub date_modified: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// Assigns the generated id on insert and stamps `date_modified` on every save.
#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert && self.id.is_not_set() {
            self.id = Set(generate_user_id());
        }
        self.date_modified = Set(Some(chrono::Utc::now().naive_utc()));
        Ok(self)
    }
}

impl From<CreateUser> for ActiveModel {
    fn from(user: CreateUser) -> Self {
        ActiveModel {
            name: Set(user.name),
            surname: Set(user.surname),
            patronymic: Set(user.patronymic),
            phone_number: Set(user.phone_number),
            email: Set(user.email),
            country: Set(user.country),
            ..Default::default()
        }
    }
}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            name: model.name,
            surname: model.surname,
            patronymic: model.patronymic,
            phone_number: model.phone_number,
            email: model.email,
            country: model.country,
            country_code: None,
            data_created: model.data_created,
            date_modified: model.date_modified,
        }
    }
}
