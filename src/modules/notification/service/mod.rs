pub mod email;

use crate::{
    modules::{
        order::repository::{Order, OrderItem},
        product::repository::Product,
        user::repository::User,
    },
    types::Context,
};
use async_trait::async_trait;
use std::sync::Arc;

pub mod types {
    use super::{Order, OrderItem, Product, User};

    #[derive(Clone, Debug)]
    pub struct Registered {
        pub user: User,
    }

    #[derive(Clone, Debug)]
    pub struct OrderConfirmed {
        pub customer: User,
        pub order: Order,
        pub items: Vec<OrderItem>,
    }

    #[derive(Clone, Debug)]
    pub struct OrderStatusUpdated {
        pub customer: User,
        pub order: Order,
    }

    #[derive(Clone, Debug)]
    pub struct BackInStock {
        pub email: String,
        pub product: Product,
    }
}

#[derive(Clone, Debug)]
pub enum Notification {
    Registered(types::Registered),
    OrderConfirmed(types::OrderConfirmed),
    OrderStatusUpdated(types::OrderStatusUpdated),
    BackInStock(types::BackInStock),
}

impl Notification {
    pub fn registered(user: User) -> Self {
        Notification::Registered(types::Registered { user })
    }

    pub fn order_confirmed(customer: User, order: Order, items: Vec<OrderItem>) -> Self {
        Notification::OrderConfirmed(types::OrderConfirmed {
            customer,
            order,
            items,
        })
    }

    pub fn order_status_updated(customer: User, order: Order) -> Self {
        Notification::OrderStatusUpdated(types::OrderStatusUpdated { customer, order })
    }

    pub fn back_in_stock(email: String, product: Product) -> Self {
        Notification::BackInStock(types::BackInStock { email, product })
    }
}

#[derive(Debug, PartialEq)]
pub enum Error {
    NotSent,
    InvalidNotification,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Delivers customer notifications. The order pipeline only depends on this seam.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<()>;
}

pub struct Mailer {
    ctx: Arc<Context>,
}

impl Mailer {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Notifier for Mailer {
    async fn send(&self, notification: Notification) -> Result<()> {
        email::send(self.ctx.clone(), notification).await
    }
}

pub async fn send(ctx: Arc<Context>, notification: Notification) -> Result<()> {
    Mailer::new(ctx).send(notification).await
}
