//! Confirmation email composition and recipient resolution.

use chrono::{DateTime, Utc};
use domain::FulfillmentJob;

use crate::services::email::{EmailMessage, EmailSender};

/// The deliverable address chosen for a confirmation, after the
/// verification check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecipient {
    /// Address the message will actually be sent to.
    pub address: String,
    /// The shipping email from the order.
    pub original: String,
}

impl ResolvedRecipient {
    /// Returns true if the message goes to the operator address
    /// instead of the customer's.
    pub fn substituted(&self) -> bool {
        self.address != self.original
    }
}

/// Picks the deliverable recipient for a confirmation.
///
/// If the shipping email is verified with the provider it is used
/// directly; otherwise (including when the verification check itself
/// fails) the configured sender address stands in, and the composed
/// body will say so.
pub async fn resolve_recipient(
    email: &dyn EmailSender,
    customer_address: &str,
    sender_address: &str,
) -> ResolvedRecipient {
    let address = match email.verification_status(customer_address).await {
        Ok(status) if status.is_verified() => customer_address.to_string(),
        Ok(status) => {
            tracing::info!(
                address = customer_address,
                ?status,
                "shipping email not verified, falling back to sender address"
            );
            sender_address.to_string()
        }
        Err(error) => {
            tracing::warn!(
                address = customer_address,
                %error,
                "verification check failed, falling back to sender address"
            );
            sender_address.to_string()
        }
    };

    ResolvedRecipient {
        address,
        original: customer_address.to_string(),
    }
}

/// Composes the order confirmation message (subject, plain-text body,
/// HTML body) from the job snapshot.
pub fn compose_confirmation(
    job: &FulfillmentJob,
    sender_address: &str,
    recipient: &ResolvedRecipient,
    now: DateTime<Utc>,
) -> EmailMessage {
    let subject = format!("Order Confirmation - Order #{}", job.order_id.short());
    let order_date = now.format("%Y-%m-%d %H:%M:%S");
    let shipping = &job.shipping_info;

    let mut items_text = String::new();
    let mut items_html = String::new();
    for item in &job.items {
        items_text.push_str(&format!(
            "- {} (Qty: {}) - {}\n",
            item.product.name, item.quantity, item.product.price
        ));
        items_html.push_str(&format!(
            "<li>{} (Qty: {}) - {}</li>",
            item.product.name, item.quantity, item.product.price
        ));
    }

    let note_text = if recipient.substituted() {
        format!(
            "\n\nNote: This confirmation was sent to {} because {} is not verified in our email system.\n",
            recipient.address, recipient.original
        )
    } else {
        String::new()
    };

    let body_text = format!(
        "Dear {name},\n\n\
         Thank you for your order! We're excited to confirm that we've received your order and it's being processed.\n\n\
         Order Details:\n\
         Order ID: {order_id}\n\
         Order Date: {order_date} UTC\n\n\
         Items Ordered:\n\
         {items_text}\n\
         Total: {total}\n\n\
         Shipping Address:\n\
         {name}\n\
         {address}\n\
         {city}, {zip}\n\n\
         Your order is now being processed and you'll receive another email when it ships.\n\n\
         Thank you for shopping with us!{note_text}\n\n\
         Best regards,\n\
         CloudShop Team\n",
        name = shipping.name,
        order_id = job.order_id,
        total = job.total,
        address = shipping.address,
        city = shipping.city,
        zip = shipping.zip_code,
    );

    let note_html = if recipient.substituted() {
        format!(
            "<p><em>Note: This confirmation was sent to {} because {} is not verified in our email system.</em></p>",
            recipient.address, recipient.original
        )
    } else {
        String::new()
    };

    let body_html = format!(
        "<html><body>\
         <h2>Order Confirmation</h2>\
         <p>Dear {name},</p>\
         <p>Thank you for your order! We're excited to confirm that we've received your order and it's being processed.</p>\
         <h3>Order Details:</h3>\
         <ul><li><strong>Order ID:</strong> {order_id}</li>\
         <li><strong>Order Date:</strong> {order_date} UTC</li></ul>\
         <h3>Items Ordered:</h3>\
         <ul>{items_html}</ul>\
         <h3>Total: {total}</h3>\
         <h3>Shipping Address:</h3>\
         <p>{name}<br>{address}<br>{city}, {zip}</p>\
         <p>Your order is now being processed and you'll receive another email when it ships.</p>\
         <p>Thank you for shopping with us!</p>\
         {note_html}\
         <p>Best regards,<br>CloudShop Team</p>\
         </body></html>",
        name = shipping.name,
        order_id = job.order_id,
        total = job.total,
        address = shipping.address,
        city = shipping.city,
        zip = shipping.zip_code,
    );

    EmailMessage {
        from: sender_address.to_string(),
        to: recipient.address.clone(),
        subject,
        body_text,
        body_html,
    }
}

#[cfg(test)]
mod tests {
    use common::{Money, OrderId, ProductId, UserId};
    use domain::{LineItem, ProductSnapshot, ShippingInfo};

    use super::*;
    use crate::services::email::InMemoryEmailSender;

    fn job() -> FulfillmentJob {
        FulfillmentJob {
            order_id: OrderId::new(),
            user_id: UserId::new("u1"),
            total: Money::from_cents(11998),
            items: vec![LineItem {
                product_id: ProductId::new("p1"),
                quantity: 2,
                product: ProductSnapshot {
                    name: "Widget".to_string(),
                    price: Money::from_cents(5999),
                    category: None,
                },
            }],
            shipping_info: ShippingInfo {
                name: "Ada".to_string(),
                email: "ada@x.com".to_string(),
                address: "1 St".to_string(),
                city: "C".to_string(),
                zip_code: "00000".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn verified_customer_keeps_own_address() {
        let email = InMemoryEmailSender::new();
        email.verify_address("ada@x.com");

        let recipient = resolve_recipient(&email, "ada@x.com", "shop@cloudshop.example").await;
        assert_eq!(recipient.address, "ada@x.com");
        assert!(!recipient.substituted());
    }

    #[tokio::test]
    async fn unverified_customer_falls_back_to_sender() {
        let email = InMemoryEmailSender::new();
        let recipient = resolve_recipient(&email, "ada@x.com", "shop@cloudshop.example").await;
        assert_eq!(recipient.address, "shop@cloudshop.example");
        assert!(recipient.substituted());
    }

    #[tokio::test]
    async fn verification_error_falls_back_to_sender() {
        let email = InMemoryEmailSender::new();
        email.verify_address("ada@x.com");
        email.set_fail_on_verification(true);

        let recipient = resolve_recipient(&email, "ada@x.com", "shop@cloudshop.example").await;
        assert_eq!(recipient.address, "shop@cloudshop.example");
    }

    #[test]
    fn composed_message_contains_order_details() {
        let job = job();
        let recipient = ResolvedRecipient {
            address: "ada@x.com".to_string(),
            original: "ada@x.com".to_string(),
        };
        let message =
            compose_confirmation(&job, "shop@cloudshop.example", &recipient, Utc::now());

        assert_eq!(message.to, "ada@x.com");
        assert_eq!(message.from, "shop@cloudshop.example");
        assert!(message.subject.contains(&job.order_id.short()));
        assert!(message.body_text.contains("Dear Ada"));
        assert!(message.body_text.contains("Widget (Qty: 2) - $59.99"));
        assert!(message.body_text.contains("Total: $119.98"));
        assert!(message.body_html.contains("<li>Widget (Qty: 2) - $59.99</li>"));
        assert!(!message.body_text.contains("Note:"));
    }

    #[test]
    fn substituted_message_notes_original_address() {
        let job = job();
        let recipient = ResolvedRecipient {
            address: "shop@cloudshop.example".to_string(),
            original: "ada@x.com".to_string(),
        };
        let message =
            compose_confirmation(&job, "shop@cloudshop.example", &recipient, Utc::now());

        assert_eq!(message.to, "shop@cloudshop.example");
        assert!(message.body_text.contains("ada@x.com is not verified"));
        assert!(message.body_html.contains("ada@x.com is not verified"));
    }
}
