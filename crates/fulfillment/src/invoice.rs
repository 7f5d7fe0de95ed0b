//! Invoice rendering and deterministic object keys.

use chrono::{DateTime, Utc};
use common::OrderId;
use domain::FulfillmentJob;
use store::Document;

/// Returns the object key for an order's invoice on the given day.
///
/// Keyed by UTC date and order id so a redelivered job on the same day
/// overwrites its own invoice instead of duplicating it.
pub fn invoice_key(order_id: OrderId, date: DateTime<Utc>) -> String {
    format!("invoices/{}/{order_id}.txt", date.format("%Y/%m/%d"))
}

/// Renders the plain-text invoice for a job.
///
/// Header, billing info, one line per item with quantity, unit price
/// and line total, a computed subtotal, a zero tax line, and the order
/// total as recorded on the order.
pub fn render_invoice(job: &FulfillmentJob, generated_at: DateTime<Utc>) -> String {
    let shipping = &job.shipping_info;
    let mut invoice = format!(
        "CLOUDSHOP INVOICE\n\
         ================\n\n\
         Invoice Date: {date} UTC\n\
         Order ID: {order_id}\n\
         Customer ID: {user_id}\n\n\
         BILLING INFORMATION:\n\
         {name}\n\
         {email}\n\
         {address}\n\
         {city}, {zip}\n\n\
         ITEMS:\n\
         ------\n",
        date = generated_at.format("%Y-%m-%d %H:%M:%S"),
        order_id = job.order_id,
        user_id = job.user_id,
        name = shipping.name,
        email = shipping.email,
        address = shipping.address,
        city = shipping.city,
        zip = shipping.zip_code,
    );

    let mut subtotal = common::Money::zero();
    for item in &job.items {
        let line_total = item.line_total();
        subtotal += line_total;
        invoice.push_str(&format!(
            "{:<30} Qty: {:>3} @ {:>9} = {:>9}\n",
            item.product.name,
            item.quantity,
            item.product.price.to_string(),
            line_total.to_string(),
        ));
    }

    invoice.push_str(&format!(
        "\n------\n\
         Subtotal: {:>9}\n\
         Tax:      {:>9}\n\
         ------\n\
         TOTAL:    {:>9}\n\n\
         Thank you for your business!\n\n\
         This is an automated invoice generated by CloudShop.\n\
         For questions, please contact support@cloudshop.com\n",
        subtotal.to_string(),
        common::Money::zero().to_string(),
        job.total.to_string(),
    ));

    invoice
}

/// Builds the storable invoice document with its metadata.
pub fn invoice_document(job: &FulfillmentJob, generated_at: DateTime<Utc>) -> Document {
    Document::plain_text(render_invoice(job, generated_at))
        .with_metadata("orderId", job.order_id.to_string())
        .with_metadata("userId", job.user_id.to_string())
        .with_metadata("total", format!("{:.2}", job.total.as_f64_dollars()))
        .with_metadata(
            "generatedAt",
            generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        )
}

#[cfg(test)]
mod tests {
    use common::{Money, ProductId, UserId};
    use domain::{LineItem, ProductSnapshot, ShippingInfo};

    use super::*;

    fn job() -> FulfillmentJob {
        FulfillmentJob {
            order_id: OrderId::new(),
            user_id: UserId::new("u1"),
            total: Money::from_cents(13497),
            items: vec![
                LineItem {
                    product_id: ProductId::new("p1"),
                    quantity: 2,
                    product: ProductSnapshot {
                        name: "Widget".to_string(),
                        price: Money::from_cents(5999),
                        category: None,
                    },
                },
                LineItem {
                    product_id: ProductId::new("p2"),
                    quantity: 1,
                    product: ProductSnapshot {
                        name: "Mug".to_string(),
                        price: Money::from_cents(1499),
                        category: None,
                    },
                },
            ],
            shipping_info: ShippingInfo {
                name: "Ada".to_string(),
                email: "ada@x.com".to_string(),
                address: "1 St".to_string(),
                city: "C".to_string(),
                zip_code: "00000".to_string(),
            },
        }
    }

    #[test]
    fn key_is_date_and_order_derived() {
        let order_id = OrderId::new();
        let date = "2026-08-25T10:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(
            invoice_key(order_id, date),
            format!("invoices/2026/08/25/{order_id}.txt")
        );

        // same day, different time of day: same key
        let later = "2026-08-25T23:59:59Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(invoice_key(order_id, date), invoice_key(order_id, later));
    }

    #[test]
    fn rendered_invoice_has_lines_and_totals() {
        let job = job();
        let invoice = render_invoice(&job, Utc::now());

        assert!(invoice.starts_with("CLOUDSHOP INVOICE"));
        assert!(invoice.contains(&job.order_id.to_string()));
        assert!(invoice.contains("Customer ID: u1"));
        assert!(invoice.contains("Widget"));
        assert!(invoice.contains("Qty:   2"));
        assert!(invoice.contains("$119.98")); // widget line total
        assert!(invoice.contains("Subtotal:   $134.97"));
        assert!(invoice.contains("Tax:          $0.00"));
        assert!(invoice.contains("TOTAL:      $134.97"));
    }

    #[test]
    fn document_carries_metadata() {
        let job = job();
        let generated_at = Utc::now();
        let document = invoice_document(&job, generated_at);

        assert_eq!(document.content_type, "text/plain");
        assert_eq!(document.metadata["orderId"], job.order_id.to_string());
        assert_eq!(document.metadata["userId"], "u1");
        assert_eq!(document.metadata["total"], "134.97");
        assert!(document.metadata.contains_key("generatedAt"));
    }
}
