//! The `buy` command: drives the checkout wizard end to end.

use fernway_core::{AddressId, ProductId, ShippingMethodId};
use fernway_storefront::checkout::{CheckoutStep, CheckoutWizard};
use fernway_storefront::models::OrderDraft;
use fernway_storefront::services::Services;

use super::CliError;

/// Check out one product non-interactively.
///
/// Mirrors the storefront's wizard steps: the session must already be
/// signed in (identity), then an address is selected, a method is selected,
/// and the order is placed.
#[allow(clippy::print_stdout)]
pub async fn buy(
    services: Services,
    product_id: i64,
    size_index: usize,
    quantity: u32,
    address: Option<i64>,
    method: i64,
) -> Result<(), CliError> {
    if !services.session().is_authenticated() {
        return Err(CliError::InvalidInput(
            "Sign in first: fernway login -e <email> -p <password>".to_owned(),
        ));
    }

    // Build the order draft the way the product page would.
    let product = services
        .orders()
        .product(ProductId::new(product_id))
        .await?;
    let draft = OrderDraft::new(&product, size_index, quantity).ok_or_else(|| {
        CliError::InvalidInput(format!(
            "Product {} has no size index {size_index} (it has {})",
            product.name,
            product.sizes.len()
        ))
    })?;

    println!(
        "Ordering {} x{} {} - {}",
        draft.product_name, draft.quantity, draft.size.name, draft.total_price
    );

    let mut wizard = CheckoutWizard::new(services);
    wizard.set_draft(draft);

    // Identity -> address step (already authenticated).
    wizard.advance().await;
    expect_step(&wizard, CheckoutStep::ShippingAddress)?;

    if let Some(id) = address
        && !wizard.select_address(AddressId::new(id))
    {
        return Err(CliError::InvalidInput(format!(
            "No saved address #{id}; run: fernway addresses list"
        )));
    }

    // Address -> method step.
    wizard.advance().await;
    expect_step(&wizard, CheckoutStep::ShippingMethod)?;

    if !wizard.select_method(ShippingMethodId::new(method)) {
        return Err(CliError::InvalidInput(format!(
            "No shipping method #{method}; run: fernway methods"
        )));
    }

    // Method -> order placed.
    wizard.advance().await;
    expect_step(&wizard, CheckoutStep::Complete)?;

    if let Some(order) = wizard.placed_order() {
        println!("Order placed: #{} - {}", order.id, order.total);
    }
    Ok(())
}

fn expect_step(wizard: &CheckoutWizard, expected: CheckoutStep) -> Result<(), CliError> {
    if wizard.step() == expected {
        return Ok(());
    }

    let mut reasons: Vec<String> = wizard
        .errors()
        .iter()
        .map(|(field, msg)| format!("{}: {msg}", field.name()))
        .collect();
    if let Some(form_error) = wizard.form_error() {
        reasons.push(form_error.to_owned());
    }
    if reasons.is_empty() {
        reasons.push("checkout could not continue".to_owned());
    }

    Err(CliError::Checkout(reasons.join("; ")))
}
