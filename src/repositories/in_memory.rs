use crate::entities::order::{NewOrder, Order};
use crate::entities::user::User;
use crate::errors::RepoErr;
use crate::filters::{FilterField, OrderFilter};
use crate::repositories::{ListOrdersQuery, OrderRepository, UserRepository};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    inner: Arc<RwLock<HashMap<String, Order>>>,
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, new: NewOrder) -> Result<Order, RepoErr> {
        let mut map = self.inner.write().await;
        let order = Order::from_new(new);
        map.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn get_by_id(&self, id: &str) -> Result<Order, RepoErr> {
        let map = self.inner.read().await;
        map.get(id).cloned().ok_or(RepoErr::NotFound)
    }

    async fn list(&self, q: ListOrdersQuery) -> Result<Vec<Order>, RepoErr> {
        let map = self.inner.read().await;
        let mut items: Vec<Order> = map
            .values()
            .filter(|o| q.filter.matches(o))
            .cloned()
            .collect();
        items.sort_by(|a, b| q.sort.compare(a, b));

        let start = q.skip as usize;
        if start >= items.len() {
            return Ok(vec![]);
        }
        let end = q
            .limit
            .filter(|&l| l > 0)
            .map(|l| start + l as usize)
            .unwrap_or(items.len())
            .min(items.len());

        Ok(items[start..end].to_vec())
    }

    async fn count(&self, filter: &OrderFilter) -> Result<u64, RepoErr> {
        let map = self.inner.read().await;
        Ok(map.values().filter(|o| filter.matches(o)).count() as u64)
    }

    async fn distinct(&self, field: FilterField) -> Result<Vec<String>, RepoErr> {
        let map = self.inner.read().await;
        let values: BTreeSet<String> = map
            .values()
            .filter_map(|o| field.value_of(o))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        Ok(values.into_iter().collect())
    }

    async fn update(&self, id: &str, new: NewOrder) -> Result<Order, RepoErr> {
        let mut map = self.inner.write().await;
        let o = map.get_mut(id).ok_or(RepoErr::NotFound)?;
        *o = o.replace_with(new);
        Ok(o.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), RepoErr> {
        let mut map = self.inner.write().await;
        map.remove(id).map(|_| ()).ok_or(RepoErr::NotFound)
    }
}

/// Users keyed by email.
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    inner: Arc<RwLock<HashMap<String, User>>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, RepoErr> {
        let mut map = self.inner.write().await;
        if map.contains_key(&user.email) {
            return Err(RepoErr::Duplicate("email"));
        }
        map.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoErr> {
        let map = self.inner.read().await;
        Ok(map.get(email).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::entities::order::{Flag, OrderStatus};
    use crate::entities::user::Role;
    use crate::filters::SortOrder;

    fn sample(reg: &str, day: u32) -> NewOrder {
        let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        NewOrder {
            entry_date: date,
            entry_time: "12:00".into(),
            registration: reg.into(),
            enquiry_type: "Reservation".into(),
            opening_date: date,
            closing_date: None,
            closing_time: None,
            sales_executive: "John Doe".into(),
            location: "London".into(),
            customer: "Edsger Dijkstra".into(),
            is_pct_sheet_received_within_time: None,
            pct_status: None,
            order_status: OrderStatus::Active,
            is_show_up: None,
            is_deal: None,
            reason_for_action: None,
            reason_detail: None,
            is_loss_deal: None,
        }
    }

    async fn seed(repo: &InMemoryOrderRepository, n: u32) -> Vec<Order> {
        let mut out = Vec::new();
        for day in 1..=n {
            out.push(repo.create(sample(&format!("REG{day}"), day)).await.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn list_sorts_newest_first_and_pages() {
        let repo = InMemoryOrderRepository::default();
        seed(&repo, 15).await;

        let page = |skip| ListOrdersQuery {
            filter: OrderFilter::new(),
            sort: SortOrder::OpeningDesc,
            skip,
            limit: Some(10),
        };
        let first = repo.list(page(0)).await.unwrap();
        let second = repo.list(page(10)).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 5);
        assert_eq!(first[0].registration, "REG15");
        assert!(first.iter().all(|a| second.iter().all(|b| a.id != b.id)));
        assert!(repo.list(page(20)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn count_and_distinct() {
        let repo = InMemoryOrderRepository::default();
        let mut other = sample("XYZ1", 2);
        other.location = "Leeds".into();
        repo.create(other).await.unwrap();
        seed(&repo, 2).await;

        let leeds = OrderFilter::new().with_values(FilterField::Location, ["Leeds"]);
        assert_eq!(repo.count(&leeds).await.unwrap(), 1);
        assert_eq!(repo.count(&OrderFilter::new()).await.unwrap(), 3);
        assert_eq!(
            repo.distinct(FilterField::Location).await.unwrap(),
            vec!["Leeds", "London"]
        );
        assert!(repo.distinct(FilterField::IsDeal).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_fields_and_bumps_timestamp() {
        let repo = InMemoryOrderRepository::default();
        let created = repo.create(sample("ABC1", 3)).await.unwrap();

        let mut next = sample("ABC1", 3);
        next.order_status = OrderStatus::Inactive;
        next.is_deal = Some(Flag::No);
        let updated = repo.update(&created.id, next).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.order_status, OrderStatus::Inactive);
        assert!(updated.updated >= created.updated);
        assert_eq!(repo.get_by_id(&created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn delete_removes_order() {
        let repo = InMemoryOrderRepository::default();
        let created = repo.create(sample("DEL1", 4)).await.unwrap();
        repo.delete(&created.id).await.unwrap();
        assert!(matches!(repo.get_by_id(&created.id).await, Err(RepoErr::NotFound)));
    }

    #[tokio::test]
    async fn delete_nonexistent_returns_not_found() {
        let repo = InMemoryOrderRepository::default();
        assert!(matches!(repo.delete("nope").await, Err(RepoErr::NotFound)));
        assert!(matches!(
            repo.update("nope", sample("X1", 1)).await,
            Err(RepoErr::NotFound)
        ));
    }

    #[tokio::test]
    async fn users_are_unique_by_email() {
        let repo = InMemoryUserRepository::default();
        let u = User::new("Ada".into(), "ada@example.com".into(), "h".into(), Role::Admin);
        repo.create(u.clone()).await.unwrap();
        assert!(matches!(repo.create(u).await, Err(RepoErr::Duplicate("email"))));
        let found = repo.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(found.role, Role::Admin);
        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
    }
}
