// src/db/mongo/user_repo.rs

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::ReturnDocument, Collection, Database};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        mongo::{parse_uuid, USERS},
        UserRepository,
    },
    models::auth::User,
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    id: String,
    username: String,
    password: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    membership_paid: bool,
}

impl UserDocument {
    fn into_user(self) -> Result<User, AppError> {
        Ok(User {
            id: parse_uuid(&self.id)?,
            username: self.username,
            password: self.password,
            name: self.name,
            role: self.role,
            membership_paid: self.membership_paid,
        })
    }
}

#[derive(Clone)]
pub struct MongoUserRepository {
    collection: Collection<UserDocument>,
}

impl MongoUserRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(USERS),
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn list(&self) -> Result<Vec<User>, AppError> {
        let documents: Vec<UserDocument> = self
            .collection
            .find(doc! {})
            .sort(doc! { "username": 1 })
            .await?
            .try_collect()
            .await?;
        documents.into_iter().map(UserDocument::into_user).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.collection
            .find_one(doc! { "id": id.to_string() })
            .await?
            .map(UserDocument::into_user)
            .transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.collection
            .find_one(doc! { "username": username })
            .await?
            .map(UserDocument::into_user)
            .transpose()
    }

    async fn update_membership(&self, id: Uuid, membership_paid: bool) -> Result<Option<User>, AppError> {
        self.collection
            .find_one_and_update(
                doc! { "id": id.to_string() },
                doc! { "$set": { "membershipPaid": membership_paid } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .map(UserDocument::into_user)
            .transpose()
    }
}
