//! Shipping address CRUD and cache-invalidation tests.

use fernway_integration_tests::TestContext;
use fernway_storefront::models::AddressFields;

async fn signed_in_ctx() -> TestContext {
    let ctx = TestContext::new().await;
    ctx.backend
        .seed_account("mira@example.com", "hunter2", "Mira", "Holt", "2345550123");
    ctx.services
        .auth()
        .login("mira@example.com", "hunter2")
        .await
        .expect("login");
    ctx
}

fn fields(address: &str, city: &str, zipcode: &str) -> AddressFields {
    AddressFields {
        address: address.to_owned(),
        city: city.to_owned(),
        zipcode: zipcode.to_owned(),
        country: "US".to_owned(),
        shipping_method: None,
    }
}

#[tokio::test]
async fn test_add_then_list_includes_new_address() {
    let ctx = signed_in_ctx().await;

    let created = ctx
        .services
        .shipping()
        .add_address(&fields("14 Garden Row", "Portland", "97201"))
        .await
        .expect("add address");

    let list = ctx.services.shipping().addresses().await.expect("list");
    assert!(list.iter().any(|a| a.id == created.id));
    assert_eq!(list.len(), 1);
    // First saved address becomes the default.
    assert!(list[0].is_default);
}

#[tokio::test]
async fn test_mutations_invalidate_cached_list() {
    let ctx = signed_in_ctx().await;

    // Prime the cache with the empty list.
    let empty = ctx.services.shipping().addresses().await.expect("list");
    assert!(empty.is_empty());

    // A create must be visible on the very next read.
    let created = ctx
        .services
        .shipping()
        .add_address(&fields("14 Garden Row", "Portland", "97201"))
        .await
        .expect("add address");
    let after_add = ctx.services.shipping().addresses().await.expect("list");
    assert_eq!(after_add.len(), 1);

    // So must an edit.
    let updated = ctx
        .services
        .shipping()
        .update_address(created.id, &fields("99 Harbor Lane", "Portland", "97209"))
        .await
        .expect("update address");
    assert_eq!(updated.address, "99 Harbor Lane");
    let after_edit = ctx.services.shipping().addresses().await.expect("list");
    assert_eq!(after_edit[0].address, "99 Harbor Lane");

    // And a delete.
    ctx.services
        .shipping()
        .delete_address(created.id)
        .await
        .expect("delete address");
    let after_delete = ctx.services.shipping().addresses().await.expect("list");
    assert!(after_delete.is_empty());
}

#[tokio::test]
async fn test_repeated_reads_are_stable() {
    let ctx = signed_in_ctx().await;
    ctx.services
        .shipping()
        .add_address(&fields("14 Garden Row", "Portland", "97201"))
        .await
        .expect("add address");

    // Second read comes from the cache and must match the first.
    let first = ctx.services.shipping().addresses().await.expect("list");
    let second = ctx.services.shipping().addresses().await.expect("list");
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_shipping_methods_reference_data() {
    let ctx = signed_in_ctx().await;

    let methods = ctx.services.shipping().methods().await.expect("methods");
    assert_eq!(methods.len(), 2);
    assert!(methods.iter().any(|m| m.title == "Standard"));
    assert!(methods.iter().any(|m| m.title == "Express"));
}
