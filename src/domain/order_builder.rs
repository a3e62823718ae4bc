use bigdecimal::BigDecimal;

use super::order::{Billing, NewOrder, OrderLine, OrderRequest};
use super::product::Product;

/// Turn a request and its resolved products into a persistable order.
///
/// The caller must have checked that every requested id resolved; this
/// function snapshots whatever it is given, in the given order.
pub fn build_order(request: &OrderRequest, products: &[Product]) -> NewOrder {
    let mut total_price = BigDecimal::from(0);
    let mut lines = Vec::with_capacity(products.len());

    for product in products {
        total_price += &product.price;
        lines.push(OrderLine {
            code: product.code.clone(),
            price: product.price.clone(),
        });
    }

    NewOrder {
        email: request.email.clone(),
        lines,
        billing: Billing {
            payment: request.payment,
            total_price,
        },
        shipping: request.shipping,
    }
}
