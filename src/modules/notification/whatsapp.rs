//! Prefilled WhatsApp messages. Nothing is sent from here: the text and a
//! `wa.me` link are handed back so a person can send them by hand.

use crate::{
    modules::order::repository::{Order, OrderItem, OrderStatus},
    utils::money,
};
use itertools::Itertools;
use serde::Serialize;
use urlencoding::encode;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct WhatsappMessage {
    pub text: String,
    pub link: Option<String>,
}

/// `https://wa.me/<digits>?text=<message>`, or `None` when the number has no digits.
pub fn link(number: &str, text: &str) -> Option<String> {
    let digits = number
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>();

    if digits.is_empty() {
        return None;
    }

    Some(format!("https://wa.me/{}?text={}", digits, encode(text)))
}

/// The message a customer sends the store after paying.
pub fn order_confirmed_message(
    storefront_name: &str,
    currency: &str,
    order: &Order,
    items: &[OrderItem],
    customer_name: &str,
) -> String {
    let lines = items
        .iter()
        .map(|item| {
            let size = item
                .size
                .as_ref()
                .map(|size| format!(" ({})", size))
                .unwrap_or_default();
            format!(
                "- {}{} x{}: {}",
                item.product_name,
                size,
                item.quantity,
                money::format(currency, &item.line_total())
            )
        })
        .join("\n");

    format!(
        "Hello {}! I just paid for order {}.\nName: {}\nItems:\n{}\nTotal: {}\nShip to: {}",
        storefront_name,
        order.order_number,
        customer_name,
        lines,
        money::format(currency, &order.total),
        order.shipping_address.one_line()
    )
}

pub fn order_confirmed(
    whatsapp_number: Option<&str>,
    storefront_name: &str,
    currency: &str,
    order: &Order,
    items: &[OrderItem],
    customer_name: &str,
) -> WhatsappMessage {
    let text = order_confirmed_message(storefront_name, currency, order, items, customer_name);
    let link = whatsapp_number.and_then(|number| link(number, &text));

    WhatsappMessage { text, link }
}

/// The message the store sends a customer about their order, addressed to the
/// phone number on the shipping address.
pub fn order_status(storefront_name: &str, order: &Order) -> WhatsappMessage {
    let address = &order.shipping_address;
    let update = match order.status {
        OrderStatus::Pending => "is awaiting payment".to_string(),
        OrderStatus::Confirmed => "has been confirmed".to_string(),
        OrderStatus::Processing => "is being prepared".to_string(),
        OrderStatus::Shipped => match &order.tracking_code {
            Some(code) => format!("has been shipped. Tracking code: {}", code),
            None => "has been shipped".to_string(),
        },
        OrderStatus::Delivered => "has been delivered".to_string(),
        OrderStatus::Cancelled => "has been cancelled".to_string(),
    };

    let text = format!(
        "Hi {}, your {} order {} {}.",
        address.full_name, storefront_name, order.order_number, update
    );
    let link = link(&address.phone_number, &text);

    WhatsappMessage { text, link }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::notification::service::email::fixtures;

    #[test]
    fn link_keeps_only_digits_and_encodes_the_text() {
        assert_eq!(
            link("+234 800-000-0000", "Order ORD-1 & more"),
            Some("https://wa.me/2348000000000?text=Order%20ORD-1%20%26%20more".to_string())
        );
        assert_eq!(link("n/a", "hello"), None);
    }

    #[test]
    fn confirmation_message_lists_the_order() {
        let order = fixtures::order("01J9ZKORDER", "01J9ZKUSER");
        let items = vec![fixtures::item(&order.id)];

        let message = order_confirmed(Some("2348000000000"), "Maison", "NGN", &order, &items, "Ada Obi");

        assert_eq!(
            message.text,
            "Hello Maison! I just paid for order ORD-20241001-7QF3XA.\n\
             Name: Ada Obi\n\
             Items:\n\
             - Adire Kaftan (M) x2: NGN 50,000.00\n\
             Total: NGN 47,500.00\n\
             Ship to: 12 Admiralty Way, Lekki, Lagos, Nigeria"
        );
        assert!(message
            .link
            .unwrap()
            .starts_with("https://wa.me/2348000000000?text=Hello%20Maison%21"));
    }

    #[test]
    fn confirmation_without_store_number_has_no_link() {
        let order = fixtures::order("01J9ZKORDER", "01J9ZKUSER");
        let message = order_confirmed(None, "Maison", "NGN", &order, &[], "Ada Obi");

        assert_eq!(message.link, None);
    }

    #[test]
    fn status_message_goes_to_the_shipping_phone() {
        let mut order = fixtures::order("01J9ZKORDER", "01J9ZKUSER");
        order.status = OrderStatus::Shipped;
        order.tracking_code = Some("GIG-55821".to_string());

        let message = order_status("Maison", &order);

        assert_eq!(
            message.text,
            "Hi Ada Obi, your Maison order ORD-20241001-7QF3XA has been shipped. Tracking code: GIG-55821."
        );
        assert!(message
            .link
            .unwrap()
            .starts_with("https://wa.me/2348012345678?text="));
    }
}
