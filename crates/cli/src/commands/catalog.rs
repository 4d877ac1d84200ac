//! Catalog and history commands: products, addresses, methods, orders,
//! payments.

use fernway_core::{AddressId, OrderId, PaymentId, ProductId};
use fernway_storefront::models::AddressFields;
use fernway_storefront::services::Services;

use super::CliError;

/// Show a product with its sizes and stock.
#[allow(clippy::print_stdout)]
pub async fn product(services: &Services, id: i64) -> Result<(), CliError> {
    let product = services.orders().product(ProductId::new(id)).await?;

    println!("{} (#{})", product.name, product.id);
    if !product.description.is_empty() {
        println!("{}", product.description);
    }
    println!("stock: {}", product.stock);
    for (index, size) in product.sizes.iter().enumerate() {
        println!(
            "  [{index}] {} - {}g - {}",
            size.name, size.weight, size.price
        );
    }
    Ok(())
}

/// List saved shipping addresses.
#[allow(clippy::print_stdout)]
pub async fn addresses(services: &Services) -> Result<(), CliError> {
    let list = services.shipping().addresses().await?;
    if list.is_empty() {
        println!("No saved addresses");
        return Ok(());
    }

    for addr in &list {
        let marker = if addr.is_default { " (default)" } else { "" };
        println!(
            "#{} {}, {} {} {}{marker}",
            addr.id, addr.address, addr.city, addr.zipcode, addr.country
        );
    }
    Ok(())
}

/// Save a new shipping address.
#[allow(clippy::print_stdout)]
pub async fn add_address(
    services: &Services,
    address: String,
    city: String,
    zipcode: String,
    country: String,
) -> Result<(), CliError> {
    let fields = AddressFields {
        address,
        city,
        zipcode,
        country,
        shipping_method: None,
    };
    let created = services.shipping().add_address(&fields).await?;
    println!("Saved address #{}", created.id);
    Ok(())
}

/// Delete a saved shipping address.
#[allow(clippy::print_stdout)]
pub async fn remove_address(services: &Services, id: i64) -> Result<(), CliError> {
    services.shipping().delete_address(AddressId::new(id)).await?;
    println!("Deleted address #{id}");
    Ok(())
}

/// List the available shipping methods.
#[allow(clippy::print_stdout)]
pub async fn methods(services: &Services) -> Result<(), CliError> {
    for method in services.shipping().methods().await? {
        println!("#{} {} - {}", method.id, method.title, method.price);
        if !method.description.is_empty() {
            println!("    {}", method.description);
        }
    }
    Ok(())
}

/// Show one order.
#[allow(clippy::print_stdout)]
pub async fn order(services: &Services, id: i64) -> Result<(), CliError> {
    let order = services.orders().order(OrderId::new(id)).await?;
    println!(
        "Order #{}: {} x{} - {} - {} ({})",
        order.id,
        order.product_name,
        order.quantity,
        order.total,
        order.status,
        order.created_at.format("%Y-%m-%d")
    );
    Ok(())
}

/// List payment history.
#[allow(clippy::print_stdout)]
pub async fn payments(services: &Services) -> Result<(), CliError> {
    let list = services.payments().payments().await?;
    if list.is_empty() {
        println!("No payments");
        return Ok(());
    }

    for payment in &list {
        println!(
            "#{} order #{} - {} - {} ({})",
            payment.id,
            payment.order_id,
            payment.amount,
            payment.status,
            payment.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

/// Check one payment's settlement state.
#[allow(clippy::print_stdout)]
pub async fn payment_status(services: &Services, id: i64) -> Result<(), CliError> {
    let payment = services.payments().payment_status(PaymentId::new(id)).await?;
    println!("Payment #{}: {}", payment.id, payment.status);
    Ok(())
}
