//! Customer listing, lookup, registration and partial update.

use std::sync::Arc;

use hotelier_core::models::Customer;
use hotelier_core::{EntityStore, FieldMap, HotelResult, Predicate, build_query};

use crate::ListParams;

/// Case-insensitive substring filters on first name and email address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

impl NewCustomer {
    fn into_fields(self) -> FieldMap {
        FieldMap::new()
            .with("first_name", self.first_name)
            .with("last_name", self.last_name)
            .with("email_address", self.email_address)
    }
}

/// Fields to overwrite. `None` means "leave as is", never "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_address: Option<String>,
}

impl CustomerChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.email_address.is_none()
    }

    fn into_fields(self) -> FieldMap {
        FieldMap::new()
            .with_opt("first_name", self.first_name)
            .with_opt("last_name", self.last_name)
            .with_opt("email_address", self.email_address)
    }
}

#[derive(Clone)]
pub struct CustomerService {
    store: Arc<dyn EntityStore<Customer>>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn EntityStore<Customer>>) -> Self {
        Self { store }
    }

    pub async fn list(&self, filter: &CustomerFilter, params: &ListParams) -> HotelResult<Vec<Customer>> {
        let query = build_query::<Customer, _>(
            params.skip,
            params.limit,
            [
                ("name", filter.name.as_deref().map(Predicate::contains)),
                ("email", filter.email.as_deref().map(Predicate::contains)),
            ],
            params.sort_by.as_deref(),
            params.order.as_deref(),
        );
        Ok(self.store.read_all(&query).await?)
    }

    pub async fn get(&self, id: i64) -> HotelResult<Customer> {
        Ok(self.store.read_by_id(id).await?)
    }

    pub async fn create(&self, customer: NewCustomer) -> HotelResult<Customer> {
        let created = self.store.create(customer.into_fields()).await?;
        tracing::info!(customer_id = created.id, "customer registered");
        Ok(created)
    }

    /// Forward only the fields present in `changes`.
    pub async fn update(&self, id: i64, changes: CustomerChanges) -> HotelResult<Customer> {
        let fields = changes.into_fields();
        tracing::debug!(customer_id = id, fields = fields.len(), "updating customer");
        Ok(self.store.update(id, fields).await?)
    }
}
