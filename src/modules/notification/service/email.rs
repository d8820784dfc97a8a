use super::{types, Error, Notification, Result};
use crate::{
    modules::order::repository::{OrderItem, OrderStatus},
    types::{Context, StorefrontContext},
    utils::money,
};
use itertools::Itertools;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub struct Email {
    pub to_name: Option<String>,
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn layout(storefront: &StorefrontContext, heading: &str, content: String) -> String {
    format!(
        "<div style=\"font-family: Helvetica, Arial, sans-serif; max-width: 560px; margin: 0 auto;\">\
         <h2>{}</h2>{}\
         <p style=\"color: #777; font-size: 12px;\">{} &middot; <a href=\"{}\">{}</a></p>\
         </div>",
        escape(heading),
        content,
        escape(&storefront.name),
        storefront.url,
        storefront.url
    )
}

fn items_table(currency: &str, items: &[OrderItem]) -> String {
    let rows = items
        .iter()
        .map(|item| {
            let size = item
                .size
                .as_ref()
                .map(|size| format!(" ({})", escape(size)))
                .unwrap_or_default();
            format!(
                "<tr><td>{}{}</td><td>{}</td><td>{}</td></tr>",
                escape(&item.product_name),
                size,
                item.quantity,
                money::format(currency, &item.line_total())
            )
        })
        .join("");

    format!(
        "<table width=\"100%\"><tr><th align=\"left\">Item</th><th align=\"left\">Qty</th><th align=\"left\">Total</th></tr>{}</table>",
        rows
    )
}

fn render_order_confirmed(
    storefront: &StorefrontContext,
    currency: &str,
    notification: &types::OrderConfirmed,
) -> Email {
    let order = &notification.order;
    let content = format!(
        "<p>Hi {},</p>\
         <p>Thank you for shopping with us. We have received your payment for order <strong>{}</strong>.</p>\
         {}\
         <p>Subtotal: {}<br/>Discount: {}<br/>Shipping: {}<br/><strong>Total: {}</strong></p>\
         <p>Shipping to: {}</p>\
         <p><a href=\"{}/account/orders/{}\">View your order</a></p>",
        escape(&notification.customer.first_name),
        escape(&order.order_number),
        items_table(currency, &notification.items),
        money::format(currency, &order.subtotal),
        money::format(currency, &order.discount_amount),
        money::format(currency, &order.shipping_fee),
        money::format(currency, &order.total),
        escape(&order.shipping_address.one_line()),
        storefront.url,
        order.id
    );

    Email {
        to_name: Some(notification.customer.full_name()),
        to_email: notification.customer.email.clone(),
        subject: format!("Order {} confirmed", order.order_number),
        body: layout(storefront, "Your order is confirmed", content),
    }
}

fn render_order_status_updated(
    storefront: &StorefrontContext,
    notification: &types::OrderStatusUpdated,
) -> Result<Email> {
    let order = &notification.order;
    let number = escape(&order.order_number);

    let (subject, heading, message) = match order.status {
        OrderStatus::Confirmed => (
            format!("Order {} confirmed", order.order_number),
            "Your order is confirmed",
            format!("<p>Your order <strong>{}</strong> has been confirmed.</p>", number),
        ),
        OrderStatus::Processing => (
            format!("Order {} is being prepared", order.order_number),
            "We are preparing your order",
            format!(
                "<p>Your order <strong>{}</strong> is being prepared for shipping.</p>",
                number
            ),
        ),
        OrderStatus::Shipped => {
            let tracking_code = order
                .tracking_code
                .as_ref()
                .filter(|code| !code.trim().is_empty())
                .ok_or(Error::InvalidNotification)?;
            let tracking_link = order
                .tracking_url
                .as_ref()
                .map(|url| format!("<p><a href=\"{}\">Track your package</a></p>", escape(url)))
                .unwrap_or_default();

            (
                format!("Order {} has shipped", order.order_number),
                "Your order is on its way",
                format!(
                    "<p>Your order <strong>{}</strong> has been shipped.</p>\
                     <p>Tracking code: <strong>{}</strong></p>{}",
                    number,
                    escape(tracking_code),
                    tracking_link
                ),
            )
        }
        OrderStatus::Delivered => (
            format!("Order {} delivered", order.order_number),
            "Your order has been delivered",
            format!(
                "<p>Your order <strong>{}</strong> has been delivered. We hope you love it.</p>",
                number
            ),
        ),
        OrderStatus::Cancelled => (
            format!("Order {} cancelled", order.order_number),
            "Your order has been cancelled",
            format!(
                "<p>Your order <strong>{}</strong> has been cancelled. Reply to this email if you have any questions.</p>",
                number
            ),
        ),
        OrderStatus::Pending => return Err(Error::InvalidNotification),
    };

    let content = format!(
        "<p>Hi {},</p>{}<p><a href=\"{}/account/orders/{}\">View your order</a></p>",
        escape(&notification.customer.first_name),
        message,
        storefront.url,
        order.id
    );

    Ok(Email {
        to_name: Some(notification.customer.full_name()),
        to_email: notification.customer.email.clone(),
        subject,
        body: layout(storefront, heading, content),
    })
}

fn render_back_in_stock(
    storefront: &StorefrontContext,
    currency: &str,
    notification: &types::BackInStock,
) -> Email {
    let product = &notification.product;
    let content = format!(
        "<p><strong>{}</strong> is available again at {}.</p>\
         <p><a href=\"{}/products/{}\">Shop now</a> before it sells out.</p>",
        escape(&product.name),
        money::format(currency, &product.price),
        storefront.url,
        product.slug
    );

    Email {
        to_name: None,
        to_email: notification.email.clone(),
        subject: format!("{} is back in stock", product.name),
        body: layout(storefront, "Back in stock", content),
    }
}

fn render_registered(storefront: &StorefrontContext, notification: &types::Registered) -> Email {
    let content = format!(
        "<p>Hi {},</p><p>Welcome to {}. Your account is ready.</p>",
        escape(&notification.user.first_name),
        escape(&storefront.name)
    );

    Email {
        to_name: Some(notification.user.full_name()),
        to_email: notification.user.email.clone(),
        subject: format!("Welcome to {}", storefront.name),
        body: layout(storefront, "Welcome", content),
    }
}

pub fn render(
    storefront: &StorefrontContext,
    currency: &str,
    notification: &Notification,
) -> Result<Email> {
    match notification {
        Notification::Registered(n) => Ok(render_registered(storefront, n)),
        Notification::OrderConfirmed(n) => Ok(render_order_confirmed(storefront, currency, n)),
        Notification::OrderStatusUpdated(n) => render_order_status_updated(storefront, n),
        Notification::BackInStock(n) => Ok(render_back_in_stock(storefront, currency, n)),
    }
}

pub async fn send(ctx: Arc<Context>, notification: Notification) -> Result<()> {
    let email = render(&ctx.storefront, &ctx.payment.currency, &notification)?;
    send_email(ctx, email).await
}

async fn send_email(ctx: Arc<Context>, email: Email) -> Result<()> {
    let from = format!("{} <{}>", ctx.storefront.name, ctx.mail.sender)
        .parse::<Mailbox>()
        .map_err(|err| {
            tracing::error!("Invalid sender address {}: {}", ctx.mail.sender, err);
            Error::NotSent
        })?;
    let to = match &email.to_name {
        Some(name) => format!("{} <{}>", name, email.to_email),
        None => email.to_email.clone(),
    }
    .parse::<Mailbox>()
    .map_err(|err| {
        tracing::error!("Invalid recipient address {}: {}", email.to_email, err);
        Error::NotSent
    })?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject)
        .header(ContentType::TEXT_HTML)
        .body(email.body)
        .map_err(|err| {
            tracing::error!("Failed to build email: {}", err);
            Error::NotSent
        })?;

    let transport: AsyncSmtpTransport<Tokio1Executor> =
        AsyncSmtpTransport::<Tokio1Executor>::relay(&ctx.mail.host)
            .map_err(|err| {
                tracing::error!("Failed to set up mail transport: {}", err);
                Error::NotSent
            })?
            .credentials(Credentials::new(
                ctx.mail.user.clone(),
                ctx.mail.password.clone(),
            ))
            .build();

    transport.send(message).await.map(|_| ()).map_err(|err| {
        tracing::error!("Failed to send email to {}: {}", email.to_email, err);
        Error::NotSent
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::modules::order::repository::{
        Order, OrderItem, OrderStatus, PaymentStatus, ShippingAddress,
    };
    use crate::modules::product::repository::Product;
    use crate::modules::user::repository::{Role, User};
    use crate::types::StorefrontContext;
    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use sqlx::types::Json;
    use std::str::FromStr;

    pub fn storefront() -> StorefrontContext {
        StorefrontContext {
            name: "Maison".to_string(),
            url: "https://maison.test".to_string(),
            whatsapp_number: Some("+234 800 000 0000".to_string()),
            shipping_fee: BigDecimal::from(2500),
        }
    }

    pub fn customer(id: &str) -> User {
        User {
            id: id.to_string(),
            email: format!("{}@maison.test", id.to_lowercase()),
            password_hash: String::new(),
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            phone_number: Some("+2348012345678".to_string()),
            role: Role::Customer,
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    pub fn order(id: &str, user_id: &str) -> Order {
        Order {
            id: id.to_string(),
            order_number: "ORD-20241001-7QF3XA".to_string(),
            user_id: user_id.to_string(),
            subtotal: BigDecimal::from_str("50000").unwrap(),
            discount_amount: BigDecimal::from_str("5000").unwrap(),
            shipping_fee: BigDecimal::from_str("2500").unwrap(),
            total: BigDecimal::from_str("47500").unwrap(),
            discount_code: Some("WELCOME10".to_string()),
            shipping_address: Json(ShippingAddress {
                full_name: "Ada Obi".to_string(),
                phone_number: "+2348012345678".to_string(),
                line1: "12 Admiralty Way".to_string(),
                line2: None,
                city: "Lekki".to_string(),
                state: "Lagos".to_string(),
                country: "Nigeria".to_string(),
                postal_code: None,
            }),
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
            payment_provider: None,
            payment_reference: None,
            tracking_code: None,
            tracking_url: None,
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    pub fn product(id: &str, stock: i32) -> Product {
        Product {
            id: id.to_string(),
            name: "Adire Kaftan".to_string(),
            slug: "adire-kaftan".to_string(),
            description: String::new(),
            category: "kaftans".to_string(),
            price: BigDecimal::from_str("25000").unwrap(),
            bulk_price: None,
            bulk_min_quantity: None,
            stock,
            images: Json(vec![]),
            sizes: Json(vec!["M".to_string(), "L".to_string()]),
            is_active: true,
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    pub fn item(order_id: &str) -> OrderItem {
        OrderItem {
            id: "01J9ZKITEM".to_string(),
            order_id: order_id.to_string(),
            product_id: "01J9ZKPRODUCT".to_string(),
            product_name: "Adire Kaftan".to_string(),
            size: Some("M".to_string()),
            quantity: 2,
            unit_price: BigDecimal::from_str("25000").unwrap(),
            bulk_price: None,
            bulk_min_quantity: None,
            created_at: Utc::now().naive_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn confirmation_lists_items_and_totals() {
        let order = order("01J9ZKORDER", "01J9ZKUSER");
        let notification =
            Notification::order_confirmed(customer("01J9ZKUSER"), order.clone(), vec![item(&order.id)]);

        let email = render(&storefront(), "NGN", &notification).unwrap();

        assert_eq!(email.to_email, "01j9zkuser@maison.test");
        assert_eq!(email.subject, "Order ORD-20241001-7QF3XA confirmed");
        assert!(email.body.contains("Adire Kaftan (M)"));
        assert!(email.body.contains("NGN 50,000.00"));
        assert!(email.body.contains("NGN 47,500.00"));
        assert!(email.body.contains("https://maison.test/account/orders/01J9ZKORDER"));
    }

    #[test]
    fn shipped_email_carries_tracking_details() {
        let mut order = order("01J9ZKORDER", "01J9ZKUSER");
        order.status = OrderStatus::Shipped;
        order.tracking_code = Some("GIG-55821".to_string());
        order.tracking_url = Some("https://track.example.com/GIG-55821".to_string());

        let email = render(
            &storefront(),
            "NGN",
            &Notification::order_status_updated(customer("01J9ZKUSER"), order),
        )
        .unwrap();

        assert_eq!(email.subject, "Order ORD-20241001-7QF3XA has shipped");
        assert!(email.body.contains("GIG-55821"));
        assert!(email.body.contains("https://track.example.com/GIG-55821"));
    }

    #[test]
    fn shipped_email_without_tracking_code_is_refused() {
        let mut order = order("01J9ZKORDER", "01J9ZKUSER");
        order.status = OrderStatus::Shipped;
        order.tracking_code = Some("  ".to_string());

        let result = render(
            &storefront(),
            "NGN",
            &Notification::order_status_updated(customer("01J9ZKUSER"), order),
        );

        assert_eq!(result, Err(Error::InvalidNotification));
    }

    #[test]
    fn pending_orders_have_no_status_email() {
        let order = order("01J9ZKORDER", "01J9ZKUSER");
        let result = render(
            &storefront(),
            "NGN",
            &Notification::order_status_updated(customer("01J9ZKUSER"), order),
        );

        assert_eq!(result, Err(Error::InvalidNotification));
    }

    #[test]
    fn customer_supplied_text_is_escaped() {
        let mut customer = customer("01J9ZKUSER");
        customer.first_name = "<script>".to_string();

        let email = render(&storefront(), "NGN", &Notification::registered(customer)).unwrap();

        assert!(email.body.contains("&lt;script&gt;"));
        assert!(!email.body.contains("<script>"));
    }
}
