pub mod in_memory;
pub mod mongo;

use async_trait::async_trait;

use crate::{
    entities::{
        order::{NewOrder, Order},
        user::User,
    },
    errors::RepoErr,
    filters::{FilterField, OrderFilter, SortOrder},
};

#[derive(Debug, Clone)]
pub struct ListOrdersQuery {
    pub filter: OrderFilter,
    pub sort: SortOrder,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl Default for ListOrdersQuery {
    fn default() -> Self {
        Self {
            filter: OrderFilter::default(),
            sort: SortOrder::OpeningDesc,
            skip: 0,
            limit: None,
        }
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, new: NewOrder) -> Result<Order, RepoErr>;
    async fn get_by_id(&self, id: &str) -> Result<Order, RepoErr>;
    async fn list(&self, q: ListOrdersQuery) -> Result<Vec<Order>, RepoErr>;
    async fn count(&self, filter: &OrderFilter) -> Result<u64, RepoErr>;
    /// Distinct non-empty values of `field`, sorted.
    async fn distinct(&self, field: FilterField) -> Result<Vec<String>, RepoErr>;
    async fn update(&self, id: &str, new: NewOrder) -> Result<Order, RepoErr>;
    async fn delete(&self, id: &str) -> Result<(), RepoErr>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `RepoErr::Duplicate("email")` when the email is taken.
    async fn create(&self, user: User) -> Result<User, RepoErr>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoErr>;
}
