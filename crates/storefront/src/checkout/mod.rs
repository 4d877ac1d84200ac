//! The multi-step checkout wizard.
//!
//! Sequences `Identity -> ShippingAddress -> ShippingMethod -> Complete`.
//! Each forward transition is gated on the current step's validator; `back`
//! is always allowed except from the first step. The address create/edit
//! sub-flow is a nested toggle that never advances the outer step.
//!
//! Service failures are never fatal here: they land in the field-error map
//! or the form-level error and the shopper retries or goes back. The one
//! global policy the wizard reacts to is a lost session - if the auth
//! records vanish underneath an in-flight call (a 401 anywhere clears
//! them), the response is discarded and the wizard returns to the identity
//! step instead of applying stale state.

pub mod format;
pub mod validate;

pub use validate::{Field, FieldErrors};

use tokio::sync::watch;
use tracing::{instrument, warn};

use fernway_core::{AddressId, ShippingMethodId};

use crate::api::ApiError;
use crate::models::{
    AddressFields, NewAccount, Order, OrderDraft, OrderRequest, PersonalInfo, ShippingAddress,
    ShippingMethod,
};
use crate::services::{MAX_SAVED_ADDRESSES, Services};
use crate::session::SessionSnapshot;

use validate::{
    validate_address, validate_login, validate_method, validate_personal_info, validate_signup,
};

const MSG_SELECT_ADDRESS: &str = "Please select a shipping address";
const MSG_NOTHING_TO_ORDER: &str = "There is nothing to order yet";
const MSG_SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";

/// The wizard's steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    Identity,
    ShippingAddress,
    ShippingMethod,
    Complete,
}

/// What the identity step does for an unauthenticated shopper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityMode {
    #[default]
    Login,
    Signup,
}

/// The identity step's form fields. Signup uses all of them; login only
/// email and password.
#[derive(Debug, Clone, Default)]
pub struct IdentityForm {
    pub mode: IdentityMode,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// The checkout wizard. Owns its working state exclusively; reads the
/// session store and the backend-owned lists as refreshable caches.
pub struct CheckoutWizard {
    services: Services,
    session_changes: watch::Receiver<SessionSnapshot>,

    step: CheckoutStep,
    identity: IdentityForm,
    personal: PersonalInfo,
    editing_personal: bool,

    draft: Option<OrderDraft>,

    addresses: Vec<ShippingAddress>,
    selected_address: Option<AddressId>,
    editing_address: bool,
    editing_address_id: Option<AddressId>,
    address_form: AddressFields,

    methods: Vec<ShippingMethod>,
    selected_method: Option<ShippingMethodId>,

    errors: FieldErrors,
    form_error: Option<String>,
    submitting: bool,
    last_order: Option<Order>,
}

impl CheckoutWizard {
    /// Start a checkout. Personal info prefills from the session's user
    /// snapshot and the persisted order draft is picked up, when present.
    #[must_use]
    pub fn new(services: Services) -> Self {
        let session = services.session();
        let personal = session
            .user()
            .as_ref()
            .map(PersonalInfo::from)
            .unwrap_or_default();
        let draft = session.order_draft();
        let session_changes = session.subscribe();

        Self {
            services,
            session_changes,
            step: CheckoutStep::Identity,
            identity: IdentityForm::default(),
            personal,
            editing_personal: false,
            draft,
            addresses: Vec::new(),
            selected_address: None,
            editing_address: false,
            editing_address_id: None,
            address_form: AddressFields::default(),
            methods: Vec::new(),
            selected_method: None,
            errors: FieldErrors::new(),
            form_error: None,
            submitting: false,
            last_order: None,
        }
    }

    // =========================================================================
    // State accessors
    // =========================================================================

    /// The current step.
    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Field-level errors from the last validation.
    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Form-level error from the last operation, if any.
    #[must_use]
    pub fn form_error(&self) -> Option<&str> {
        self.form_error.as_deref()
    }

    /// Whether a submission is in flight. Render controls disabled.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Whether the address create/edit sub-flow is open.
    #[must_use]
    pub const fn is_editing_address(&self) -> bool {
        self.editing_address
    }

    /// The order draft being checked out.
    #[must_use]
    pub const fn draft(&self) -> Option<&OrderDraft> {
        self.draft.as_ref()
    }

    /// Saved addresses fetched for the address step.
    #[must_use]
    pub fn addresses(&self) -> &[ShippingAddress] {
        &self.addresses
    }

    /// Shipping methods fetched for the method step.
    #[must_use]
    pub fn methods(&self) -> &[ShippingMethod] {
        &self.methods
    }

    /// The selected saved address.
    #[must_use]
    pub const fn selected_address(&self) -> Option<AddressId> {
        self.selected_address
    }

    /// The selected shipping method.
    #[must_use]
    pub const fn selected_method(&self) -> Option<ShippingMethodId> {
        self.selected_method
    }

    /// The placed order, once the wizard is complete.
    #[must_use]
    pub const fn placed_order(&self) -> Option<&Order> {
        self.last_order.as_ref()
    }

    /// The identity step's form, for filling in.
    pub fn identity_mut(&mut self) -> &mut IdentityForm {
        &mut self.identity
    }

    /// The personal-info fields, for the view/edit sub-flow.
    pub fn personal_mut(&mut self) -> &mut PersonalInfo {
        &mut self.personal
    }

    /// The address form, for the create/edit sub-flow.
    pub fn address_form_mut(&mut self) -> &mut AddressFields {
        &mut self.address_form
    }

    /// Replace the order draft and persist it.
    pub fn set_draft(&mut self, draft: OrderDraft) {
        if let Err(e) = self.services.session().save_order_draft(&draft) {
            warn!(error = %e, "failed to persist order draft");
        }
        self.draft = Some(draft);
    }

    // =========================================================================
    // Step transitions
    // =========================================================================

    /// Try to move forward one step. Advances only when the current step's
    /// validator passes; service failures surface as errors and keep the
    /// step. From the method step this submits the order.
    #[instrument(skip(self), fields(step = ?self.step))]
    pub async fn advance(&mut self) {
        self.form_error = None;
        match self.step {
            CheckoutStep::Identity => self.advance_identity().await,
            CheckoutStep::ShippingAddress => self.advance_address().await,
            CheckoutStep::ShippingMethod => self.place_order().await,
            CheckoutStep::Complete => {}
        }
    }

    /// Move back one step. Always permitted except from the first step;
    /// a completed wizard stays complete.
    pub fn back(&mut self) {
        self.errors = FieldErrors::new();
        self.form_error = None;
        self.step = match self.step {
            CheckoutStep::Identity | CheckoutStep::Complete => return,
            CheckoutStep::ShippingAddress => CheckoutStep::Identity,
            CheckoutStep::ShippingMethod => CheckoutStep::ShippingAddress,
        };
    }

    async fn advance_identity(&mut self) {
        if self.services.session().is_authenticated() {
            if self.editing_personal && !self.save_personal_info().await {
                return;
            }
        } else {
            self.errors = match self.identity.mode {
                IdentityMode::Login => validate_login(&self.identity),
                IdentityMode::Signup => validate_signup(&self.identity),
            };
            if !self.errors.is_empty() {
                return;
            }

            let outcome = match self.identity.mode {
                IdentityMode::Login => {
                    self.services
                        .auth()
                        .login(&self.identity.email, &self.identity.password)
                        .await
                }
                IdentityMode::Signup => {
                    let account = NewAccount {
                        first_name: self.identity.first_name.clone(),
                        last_name: self.identity.last_name.clone(),
                        email: self.identity.email.clone(),
                        phone: self.identity.phone.clone(),
                        password: self.identity.password.clone(),
                    };
                    self.services.auth().register(&account).await
                }
            };

            match outcome {
                Ok(user) => {
                    self.personal = PersonalInfo::from(&user);
                    self.identity.password.clear();
                    self.identity.confirm_password.clear();
                }
                Err(err) => {
                    self.fail(err);
                    return;
                }
            }
        }

        self.enter_address_step().await;
    }

    async fn enter_address_step(&mut self) {
        match self.services.shipping().addresses().await {
            Ok(list) => {
                if self.session_lost() {
                    return;
                }
                self.apply_addresses(list);
                self.errors = FieldErrors::new();
                self.step = CheckoutStep::ShippingAddress;
            }
            Err(err) => self.fail(err),
        }
    }

    async fn advance_address(&mut self) {
        if self.editing_address && !self.save_address().await {
            return;
        }

        if self.selected_address.is_none() {
            self.form_error = Some(MSG_SELECT_ADDRESS.to_owned());
            return;
        }

        // Methods are reference data; fetch once per wizard run.
        if self.methods.is_empty() {
            match self.services.shipping().methods().await {
                Ok(methods) => {
                    if self.session_lost() {
                        return;
                    }
                    self.methods = methods;
                }
                Err(err) => {
                    self.fail(err);
                    return;
                }
            }
        }

        self.errors = FieldErrors::new();
        self.step = CheckoutStep::ShippingMethod;
    }

    // =========================================================================
    // Personal info sub-flow
    // =========================================================================

    /// Open the personal-info edit form.
    pub fn begin_personal_edit(&mut self) {
        self.editing_personal = true;
        self.errors = FieldErrors::new();
    }

    /// Close the personal-info edit form, discarding changes.
    pub fn cancel_personal_edit(&mut self) {
        self.editing_personal = false;
        if let Some(user) = self.services.session().user() {
            self.personal = PersonalInfo::from(&user);
        }
        self.errors = FieldErrors::new();
    }

    /// Validate and save the personal-info fields. Runs on explicit save,
    /// independent of step gating. Returns whether the save went through.
    #[instrument(skip(self))]
    pub async fn save_personal_info(&mut self) -> bool {
        self.errors = validate_personal_info(&self.personal);
        if !self.errors.is_empty() {
            return false;
        }

        match self.services.auth().update_profile(&self.personal).await {
            Ok(user) => {
                if self.session_lost() {
                    return false;
                }
                self.personal = PersonalInfo::from(&user);
                self.editing_personal = false;
                true
            }
            Err(err) => {
                self.fail(err);
                false
            }
        }
    }

    // =========================================================================
    // Address sub-flow
    // =========================================================================

    /// Select a saved address. Returns `false` if the id is not in the
    /// fetched list.
    pub fn select_address(&mut self, id: AddressId) -> bool {
        if self.addresses.iter().any(|a| a.id == id) {
            self.selected_address = Some(id);
            self.form_error = None;
            true
        } else {
            false
        }
    }

    /// Open the form for a new address. Refused once the saved-address soft
    /// limit is reached.
    pub fn begin_new_address(&mut self) -> bool {
        if self.addresses.len() >= MAX_SAVED_ADDRESSES {
            self.form_error = Some(format!(
                "You can save up to {MAX_SAVED_ADDRESSES} addresses"
            ));
            return false;
        }
        self.editing_address = true;
        self.editing_address_id = None;
        self.address_form = AddressFields::default();
        self.errors = FieldErrors::new();
        true
    }

    /// Open the form prefilled from a saved address. Returns `false` if the
    /// id is not in the fetched list.
    pub fn begin_edit_address(&mut self, id: AddressId) -> bool {
        let Some(saved) = self.addresses.iter().find(|a| a.id == id) else {
            return false;
        };
        self.address_form = AddressFields::from(saved);
        self.editing_address = true;
        self.editing_address_id = Some(id);
        self.errors = FieldErrors::new();
        true
    }

    /// Close the address form, discarding changes.
    pub fn cancel_address_edit(&mut self) {
        self.editing_address = false;
        self.editing_address_id = None;
        self.address_form = AddressFields::default();
        self.errors = FieldErrors::new();
    }

    /// Validate and save the open address form, then refresh the list and
    /// select the saved address. Returns whether the save went through.
    #[instrument(skip(self))]
    pub async fn save_address(&mut self) -> bool {
        self.errors = validate_address(&self.address_form);
        if !self.errors.is_empty() {
            return false;
        }

        let result = match self.editing_address_id {
            Some(id) => {
                self.services
                    .shipping()
                    .update_address(id, &self.address_form)
                    .await
            }
            None => self.services.shipping().add_address(&self.address_form).await,
        };

        let saved = match result {
            Ok(saved) => saved,
            Err(err) => {
                self.fail(err);
                return false;
            }
        };

        if self.session_lost() {
            return false;
        }

        // Refetch the invalidated list so the view matches the backend.
        match self.services.shipping().addresses().await {
            Ok(list) => self.apply_addresses(list),
            Err(err) => {
                self.fail(err);
                return false;
            }
        }

        self.selected_address = Some(saved.id);
        self.editing_address = false;
        self.editing_address_id = None;
        self.address_form = AddressFields::default();
        true
    }

    /// Delete a saved address and refresh the list.
    #[instrument(skip(self), fields(address_id = %id))]
    pub async fn delete_address(&mut self, id: AddressId) {
        if let Err(err) = self.services.shipping().delete_address(id).await {
            self.fail(err);
            return;
        }
        if self.session_lost() {
            return;
        }

        match self.services.shipping().addresses().await {
            Ok(list) => {
                if self.selected_address == Some(id) {
                    self.selected_address = None;
                }
                self.apply_addresses(list);
            }
            Err(err) => self.fail(err),
        }
    }

    // =========================================================================
    // Method selection and submission
    // =========================================================================

    /// Select a shipping method. Returns `false` if the id is not in the
    /// fetched list.
    pub fn select_method(&mut self, id: ShippingMethodId) -> bool {
        if self.methods.iter().any(|m| m.id == id) {
            self.selected_method = Some(id);
            self.errors = FieldErrors::new();
            true
        } else {
            false
        }
    }

    /// Submit the order. The single terminal operation: requires the draft
    /// (product, quantity, size index), a selected address, and a selected
    /// method. Refuses re-entry while a submission is in flight. On success
    /// the persisted draft is cleared and the wizard completes, exactly
    /// once; on failure the error is surfaced and the wizard stays on the
    /// method step.
    #[instrument(skip(self))]
    pub async fn place_order(&mut self) {
        if self.step == CheckoutStep::Complete || self.submitting {
            return;
        }

        self.errors = validate_method(self.selected_method);
        if !self.errors.is_empty() {
            return;
        }
        let Some(method) = self.selected_method else {
            return;
        };

        let Some(address) = self.selected_address else {
            self.form_error = Some(MSG_SELECT_ADDRESS.to_owned());
            return;
        };

        let Some(draft) = self.draft.as_ref() else {
            self.form_error = Some(MSG_NOTHING_TO_ORDER.to_owned());
            return;
        };

        let request = OrderRequest {
            product_id: draft.product_id,
            quantity: draft.quantity,
            size_index: draft.size_index,
            shipping_address: address,
            shipping_method: method,
        };

        self.submitting = true;
        let result = self.services.orders().create_order(&request).await;
        self.submitting = false;

        match result {
            Ok(order) => {
                if let Err(e) = self.services.session().clear_order_draft() {
                    warn!(error = %e, "failed to clear order draft after submit");
                }
                self.draft = None;
                self.last_order = Some(order);
                self.form_error = None;
                self.step = CheckoutStep::Complete;
            }
            Err(err) => self.fail(err),
        }
    }

    // =========================================================================
    // Failure and session handling
    // =========================================================================

    /// Install a freshly fetched address list, keeping the current
    /// selection when it still exists and falling back to the backend's
    /// default address otherwise.
    fn apply_addresses(&mut self, list: Vec<ShippingAddress>) {
        let selection_valid = self
            .selected_address
            .is_some_and(|id| list.iter().any(|a| a.id == id));
        if !selection_valid {
            self.selected_address = list.iter().find(|a| a.is_default).map(|a| a.id);
        }
        self.addresses = list;
    }

    /// Record a service failure. An authorization failure resets the wizard
    /// to the identity step (the gateway already cleared the session);
    /// everything else renders as a form-level error on the current step.
    fn fail(&mut self, err: ApiError) {
        match err {
            ApiError::Unauthorized => self.reset_to_identity(),
            other => {
                warn!(error = %other, "checkout operation failed");
                self.form_error = Some(other.user_message());
            }
        }
    }

    /// Whether the session's auth records vanished underneath an in-flight
    /// call. When they did, the wizard has already been reset and the
    /// caller must discard its response.
    fn session_lost(&mut self) -> bool {
        let authenticated = self.session_changes.borrow_and_update().authenticated;
        if authenticated || self.step == CheckoutStep::Complete {
            return false;
        }
        if self.services.session().is_authenticated() {
            return false;
        }
        self.reset_to_identity();
        true
    }

    fn reset_to_identity(&mut self) {
        self.step = CheckoutStep::Identity;
        self.addresses.clear();
        self.selected_address = None;
        self.editing_address = false;
        self.editing_address_id = None;
        self.address_form = AddressFields::default();
        self.methods.clear();
        self.selected_method = None;
        self.editing_personal = false;
        self.errors = FieldErrors::new();
        self.form_error = Some(MSG_SESSION_EXPIRED.to_owned());
        self.submitting = false;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::config::{Environment, StorefrontConfig};
    use crate::session::SessionStore;

    use super::validate::MSG_METHOD_REQUIRED;
    use super::*;

    /// Services pointed at a dead endpoint. Fine for tests that fail
    /// validation before any request is issued.
    fn offline_services() -> Services {
        let path = std::env::temp_dir()
            .join("fernway-tests")
            .join(format!("wizard-{}.json", uuid::Uuid::new_v4()));
        let config = StorefrontConfig {
            api_base_url: "http://127.0.0.1:9/api".parse().unwrap(),
            timeout: std::time::Duration::from_secs(1),
            environment: Environment::Development,
            session_file: path,
        };
        let session = SessionStore::open_at(&config.session_file).unwrap();
        Services::new(&config, session).unwrap()
    }

    #[tokio::test]
    async fn test_starts_on_identity_step() {
        let wizard = CheckoutWizard::new(offline_services());
        assert_eq!(wizard.step(), CheckoutStep::Identity);
        assert!(wizard.errors().is_empty());
        assert!(wizard.form_error().is_none());
    }

    #[tokio::test]
    async fn test_empty_login_blocks_with_exact_errors() {
        let mut wizard = CheckoutWizard::new(offline_services());
        wizard.advance().await;

        assert_eq!(wizard.step(), CheckoutStep::Identity);
        assert_eq!(wizard.errors().len(), 2);
        assert_eq!(
            wizard.errors().get(Field::Email).unwrap(),
            "Email is required"
        );
        assert_eq!(
            wizard.errors().get(Field::Password).unwrap(),
            "Password is required"
        );
    }

    #[tokio::test]
    async fn test_signup_password_mismatch_blocks() {
        let mut wizard = CheckoutWizard::new(offline_services());
        {
            let form = wizard.identity_mut();
            form.mode = IdentityMode::Signup;
            form.email = "mira@example.com".to_string();
            form.password = "hunter2".to_string();
            form.confirm_password = "hunter3".to_string();
            form.first_name = "Mira".to_string();
            form.last_name = "Holt".to_string();
            form.phone = "2345550123".to_string();
        }
        wizard.advance().await;

        assert_eq!(wizard.step(), CheckoutStep::Identity);
        assert_eq!(
            wizard.errors().get(Field::ConfirmPassword).unwrap(),
            "Passwords do not match"
        );
    }

    #[tokio::test]
    async fn test_place_order_requires_method() {
        let mut wizard = CheckoutWizard::new(offline_services());
        wizard.place_order().await;

        assert_eq!(
            wizard.errors().get(Field::ShippingMethod).unwrap(),
            MSG_METHOD_REQUIRED
        );
        assert!(!wizard.is_submitting());
        assert_ne!(wizard.step(), CheckoutStep::Complete);
    }

    #[tokio::test]
    async fn test_select_method_rejects_unknown_id() {
        let mut wizard = CheckoutWizard::new(offline_services());
        assert!(!wizard.select_method(ShippingMethodId::new(1)));
        assert!(wizard.selected_method().is_none());
    }

    #[tokio::test]
    async fn test_select_address_rejects_unknown_id() {
        let mut wizard = CheckoutWizard::new(offline_services());
        assert!(!wizard.select_address(AddressId::new(1)));
    }

    #[tokio::test]
    async fn test_back_is_noop_on_first_step() {
        let mut wizard = CheckoutWizard::new(offline_services());
        wizard.back();
        assert_eq!(wizard.step(), CheckoutStep::Identity);
    }

    #[tokio::test]
    async fn test_begin_new_address_allowed_when_empty() {
        let mut wizard = CheckoutWizard::new(offline_services());
        assert!(wizard.begin_new_address());
        assert!(wizard.is_editing_address());

        wizard.cancel_address_edit();
        assert!(!wizard.is_editing_address());
    }

    #[tokio::test]
    async fn test_save_address_validates_before_any_request() {
        let mut wizard = CheckoutWizard::new(offline_services());
        assert!(wizard.begin_new_address());

        let saved = wizard.save_address().await;
        assert!(!saved);
        assert_eq!(
            wizard.errors().get(Field::Address).unwrap(),
            "Address is required"
        );
        assert_eq!(wizard.errors().get(Field::City).unwrap(), "City is required");
        assert_eq!(
            wizard.errors().get(Field::Postcode).unwrap(),
            "Postcode is required"
        );
    }
}
