use super::repository::{self, CreateOrderItemPayload, CreateOrderPayload, FullOrder, ShippingAddress};
use crate::{
    modules::{
        address,
        cart::{self, Cart},
        discount::repository::{self as discount_repository, DiscountCode},
        product,
    },
    types::Context,
    utils::money,
};
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDateTime;
use std::{collections::HashMap, sync::Arc};

#[derive(Debug, PartialEq)]
pub enum Error {
    AddressNotFound,
    EmptyCart,
    ProductUnavailable(String),
    OutOfStock(String),
    DiscountNotFound,
    DiscountRejected(String),
    UnexpectedError,
}

#[derive(Debug, PartialEq)]
pub struct Quote {
    pub subtotal: BigDecimal,
    pub discount_amount: BigDecimal,
    pub shipping_fee: BigDecimal,
    pub total: BigDecimal,
}

/// Prices a cart. Every line must still be on sale in the requested quantity.
pub fn quote(
    cart: &Cart,
    discount: Option<&DiscountCode>,
    shipping_fee: &BigDecimal,
    now: NaiveDateTime,
) -> Result<Quote, Error> {
    if cart.items.is_empty() {
        return Err(Error::EmptyCart);
    }

    // Sizes of one product share its stock.
    let mut wanted = HashMap::<&str, i32>::new();
    for line in cart.items.iter() {
        if !line.product.is_active {
            return Err(Error::ProductUnavailable(line.product.name.clone()));
        }
        let quantity = wanted.entry(line.product_id.as_str()).or_insert(0);
        *quantity += line.quantity;
        if line.product.stock < *quantity {
            return Err(Error::OutOfStock(line.product.name.clone()));
        }
    }

    let discount_amount = match discount {
        Some(discount) => {
            discount
                .check(&cart.subtotal, now)
                .map_err(|rejection| Error::DiscountRejected(rejection.to_string()))?;
            discount.amount_for(&cart.subtotal)
        }
        None => BigDecimal::zero(),
    };

    let total = money::non_negative(&cart.subtotal - &discount_amount) + shipping_fee;

    Ok(Quote {
        subtotal: cart.subtotal.clone(),
        discount_amount,
        shipping_fee: shipping_fee.clone(),
        total,
    })
}

pub struct CheckoutPayload {
    pub user_id: String,
    pub address_id: String,
    pub discount_code: Option<String>,
    pub now: NaiveDateTime,
}

/// Turns the user's cart into a pending order. Stock and discount usage are
/// taken inside one transaction; the cart itself is left alone until payment.
pub async fn checkout(ctx: Arc<Context>, payload: CheckoutPayload) -> Result<FullOrder, Error> {
    let address = address::repository::find_by_id_and_user_id(
        &ctx.db_conn.pool,
        payload.address_id,
        payload.user_id.clone(),
    )
    .await
    .map_err(|_| Error::UnexpectedError)?
    .ok_or(Error::AddressNotFound)?;

    let cart = cart::load_cart(ctx.clone(), payload.user_id.clone())
        .await
        .map_err(|_| Error::UnexpectedError)?;

    let discount = match payload.discount_code {
        Some(code) if !code.trim().is_empty() => Some(
            discount_repository::find_by_code(&ctx.db_conn.pool, code)
                .await
                .map_err(|_| Error::UnexpectedError)?
                .ok_or(Error::DiscountNotFound)?,
        ),
        _ => None,
    };

    let quote = quote(
        &cart,
        discount.as_ref(),
        &ctx.storefront.shipping_fee,
        payload.now,
    )?;

    let mut tx = ctx.db_conn.pool.begin().await.map_err(|err| {
        tracing::error!("Failed to start database transaction: {}", err);
        Error::UnexpectedError
    })?;

    let order = repository::create(
        &mut *tx,
        CreateOrderPayload {
            user_id: payload.user_id.clone(),
            subtotal: quote.subtotal,
            discount_amount: quote.discount_amount,
            shipping_fee: quote.shipping_fee,
            total: quote.total,
            discount_code: discount.as_ref().map(|discount| discount.code.clone()),
            shipping_address: ShippingAddress::from(address),
        },
    )
    .await
    .map_err(|_| Error::UnexpectedError)?;

    let mut items = Vec::with_capacity(cart.items.len());
    for line in cart.items {
        let taken = product::repository::decrement_stock(
            &mut *tx,
            line.product_id.clone(),
            line.quantity,
        )
        .await
        .map_err(|_| Error::UnexpectedError)?;

        if !taken {
            return Err(Error::OutOfStock(line.product.name));
        }

        let item = repository::create_item(
            &mut *tx,
            CreateOrderItemPayload {
                order_id: order.id.clone(),
                product_id: line.product_id,
                product_name: line.product.name,
                size: line.size,
                quantity: line.quantity,
                unit_price: line.unit_price,
                bulk_price: line.product.bulk_price,
                bulk_min_quantity: line.product.bulk_min_quantity,
            },
        )
        .await
        .map_err(|_| Error::UnexpectedError)?;

        items.push(item);
    }

    if let Some(discount) = &discount {
        let counted = discount_repository::increment_usage(&mut *tx, discount.id.clone())
            .await
            .map_err(|_| Error::UnexpectedError)?;

        if !counted {
            return Err(Error::DiscountRejected(
                discount_repository::Rejection::UsageLimitReached.to_string(),
            ));
        }
    }

    tx.commit().await.map_err(|err| {
        tracing::error!("Failed to commit checkout of user {}: {}", payload.user_id, err);
        Error::UnexpectedError
    })?;

    tracing::info!(
        "Created order {} ({}) for user {}",
        order.order_number,
        order.id,
        payload.user_id
    );

    Ok(FullOrder { order, items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{
        cart::build_cart,
        cart::repository::CartItem,
        discount::repository::DiscountKind,
        product::repository::Product,
    };
    use chrono::Utc;
    use sqlx::types::Json;
    use std::str::FromStr;

    fn product(id: &str, price: &str, stock: i32) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            slug: format!("product-{}", id.to_lowercase()),
            description: String::new(),
            category: "dresses".to_string(),
            price: BigDecimal::from_str(price).unwrap(),
            bulk_price: None,
            bulk_min_quantity: None,
            stock,
            images: Json(vec![]),
            sizes: Json(vec![]),
            is_active: true,
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    fn cart_item(product_id: &str, quantity: i32) -> CartItem {
        sized_cart_item(product_id, None, quantity)
    }

    fn sized_cart_item(product_id: &str, size: Option<&str>, quantity: i32) -> CartItem {
        CartItem {
            id: format!("CI-{}-{}", product_id, size.unwrap_or("-")),
            user_id: "U1".to_string(),
            product_id: product_id.to_string(),
            size: size.map(str::to_string),
            quantity,
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    fn discount(kind: DiscountKind, value: &str) -> DiscountCode {
        DiscountCode {
            id: "D1".to_string(),
            code: "WELCOME".to_string(),
            kind,
            value: BigDecimal::from_str(value).unwrap(),
            min_order_amount: None,
            max_uses: None,
            used_count: 0,
            expires_at: None,
            is_active: true,
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    #[test]
    fn totals_include_discount_and_shipping() {
        let cart = build_cart(
            vec![cart_item("P1", 2), cart_item("P2", 1)],
            vec![product("P1", "10000", 5), product("P2", "5000", 5)],
        );
        let discount = discount(DiscountKind::Percentage, "10");

        let quote = quote(
            &cart,
            Some(&discount),
            &BigDecimal::from(2500),
            Utc::now().naive_utc(),
        )
        .unwrap();

        assert_eq!(quote.subtotal, BigDecimal::from(25000));
        assert_eq!(quote.discount_amount, BigDecimal::from(2500));
        assert_eq!(quote.total, BigDecimal::from(25000));
    }

    #[test]
    fn shipping_is_charged_even_when_the_discount_covers_everything() {
        let cart = build_cart(vec![cart_item("P1", 1)], vec![product("P1", "3000", 5)]);
        let discount = discount(DiscountKind::Fixed, "10000");

        let quote = quote(
            &cart,
            Some(&discount),
            &BigDecimal::from(2500),
            Utc::now().naive_utc(),
        )
        .unwrap();

        assert_eq!(quote.discount_amount, BigDecimal::from(3000));
        assert_eq!(quote.total, BigDecimal::from(2500));
    }

    #[test]
    fn empty_carts_cannot_be_checked_out() {
        let cart = build_cart(vec![], vec![]);

        assert_eq!(
            quote(&cart, None, &BigDecimal::zero(), Utc::now().naive_utc()),
            Err(Error::EmptyCart)
        );
    }

    #[test]
    fn lines_above_stock_are_refused() {
        let cart = build_cart(vec![cart_item("P1", 3)], vec![product("P1", "3000", 2)]);

        assert_eq!(
            quote(&cart, None, &BigDecimal::zero(), Utc::now().naive_utc()),
            Err(Error::OutOfStock("Product P1".to_string()))
        );
    }

    #[test]
    fn two_sizes_of_one_product_are_separate_lines() {
        let cart = build_cart(
            vec![
                sized_cart_item("P1", Some("M"), 1),
                sized_cart_item("P1", Some("L"), 2),
            ],
            vec![product("P1", "3000", 5)],
        );

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.subtotal, BigDecimal::from(9000));
        assert!(quote(&cart, None, &BigDecimal::zero(), Utc::now().naive_utc()).is_ok());
    }

    #[test]
    fn sizes_of_one_product_share_its_stock() {
        let cart = build_cart(
            vec![
                sized_cart_item("P1", Some("M"), 2),
                sized_cart_item("P1", Some("L"), 2),
            ],
            vec![product("P1", "3000", 3)],
        );

        assert_eq!(
            quote(&cart, None, &BigDecimal::zero(), Utc::now().naive_utc()),
            Err(Error::OutOfStock("Product P1".to_string()))
        );
    }

    #[test]
    fn inactive_products_are_refused() {
        let mut hidden = product("P1", "3000", 2);
        hidden.is_active = false;
        let cart = build_cart(vec![cart_item("P1", 1)], vec![hidden]);

        assert_eq!(
            quote(&cart, None, &BigDecimal::zero(), Utc::now().naive_utc()),
            Err(Error::ProductUnavailable("Product P1".to_string()))
        );
    }

    #[test]
    fn expired_discounts_are_refused() {
        let cart = build_cart(vec![cart_item("P1", 1)], vec![product("P1", "3000", 2)]);
        let mut expired = discount(DiscountKind::Fixed, "500");
        let now = Utc::now().naive_utc();
        expired.expires_at = Some(now - chrono::Duration::days(1));

        assert!(matches!(
            quote(&cart, Some(&expired), &BigDecimal::zero(), now),
            Err(Error::DiscountRejected(_))
        ));
    }
}
