use crate::auth::AuthService;
use crate::repositories::{OrderRepository, UserRepository};
use actix_web::web::Data;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderRepository>,
    pub users: Arc<dyn UserRepository>,
    pub auth: AuthService,
}

impl AppState {
    pub fn new<R, U>(orders: R, users: U, auth: AuthService) -> Data<Self>
    where
        R: OrderRepository + 'static,
        U: UserRepository + 'static,
    {
        Data::new(Self {
            orders: Arc::new(orders),
            users: Arc::new(users),
            auth,
        })
    }
}
