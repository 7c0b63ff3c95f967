//! MongoDB-backed repositories.
//!
//! Orders live in the `orders` collection and users in `users`, both keyed by
//! a UUID string `_id`. Dates are stored as `YYYY-MM-DD` strings, so the range
//! and prefix clauses built by [`OrderFilter::to_document`] compare them
//! lexicographically.

use async_trait::async_trait;
use bson::{doc, Bson};
use futures_util::TryStreamExt;
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use tracing::{debug, instrument};

use crate::entities::order::{NewOrder, Order};
use crate::entities::user::User;
use crate::errors::RepoErr;
use crate::filters::{FilterField, OrderFilter};
use crate::repositories::{ListOrdersQuery, OrderRepository, UserRepository};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoOrderRepository {
    orders: Collection<Order>,
}

impl MongoOrderRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            orders: db.collection("orders"),
        }
    }
}

#[async_trait]
impl OrderRepository for MongoOrderRepository {
    #[instrument(skip_all)]
    async fn create(&self, new: NewOrder) -> Result<Order, RepoErr> {
        let order = Order::from_new(new);
        self.orders.insert_one(&order).await?;
        debug!(order_id = %order.id, "order inserted");
        Ok(order)
    }

    async fn get_by_id(&self, id: &str) -> Result<Order, RepoErr> {
        self.orders
            .find_one(doc! { "_id": id })
            .await?
            .ok_or(RepoErr::NotFound)
    }

    #[instrument(skip_all, fields(skip = q.skip, limit = ?q.limit))]
    async fn list(&self, q: ListOrdersQuery) -> Result<Vec<Order>, RepoErr> {
        let filter = q.filter.to_document();
        debug!(%filter, "listing orders");
        let mut find = self
            .orders
            .find(filter)
            .sort(q.sort.to_document())
            .skip(q.skip);
        if let Some(limit) = q.limit.filter(|&l| l > 0) {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        let cursor = find.await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self, filter: &OrderFilter) -> Result<u64, RepoErr> {
        Ok(self.orders.count_documents(filter.to_document()).await?)
    }

    async fn distinct(&self, field: FilterField) -> Result<Vec<String>, RepoErr> {
        let raw = self.orders.distinct(field.key(), doc! {}).await?;
        let mut values: Vec<String> = raw
            .into_iter()
            .filter_map(|v| match v {
                Bson::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect();
        values.sort();
        Ok(values)
    }

    #[instrument(skip(self, new))]
    async fn update(&self, id: &str, new: NewOrder) -> Result<Order, RepoErr> {
        let current = self.get_by_id(id).await?;
        let next = current.replace_with(new);
        let res = self.orders.replace_one(doc! { "_id": id }, &next).await?;
        if res.matched_count == 0 {
            return Err(RepoErr::NotFound);
        }
        Ok(next)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<(), RepoErr> {
        let res = self.orders.delete_one(doc! { "_id": id }).await?;
        if res.deleted_count == 0 {
            return Err(RepoErr::NotFound);
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct MongoUserRepository {
    users: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            users: db.collection("users"),
        }
    }

    /// Unique index on `email`; safe to call on every start.
    pub async fn ensure_indexes(&self) -> Result<(), RepoErr> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users.create_index(index).await?;
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn create(&self, user: User) -> Result<User, RepoErr> {
        match self.users.insert_one(&user).await {
            Ok(_) => Ok(user),
            Err(e) if is_duplicate_key(&e) => Err(RepoErr::Duplicate("email")),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoErr> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }
}
