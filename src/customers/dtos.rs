use chrono::NaiveDate;

use crate::domain::Customer;

/// Payload for registering a customer.
#[derive(Debug, Clone, Default)]
pub struct CustomerCreate {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub birthdate: Option<NaiveDate>,
}

impl CustomerCreate {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            ..Default::default()
        }
    }
}

/// Keeps only the digits of a phone number or tax id.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

impl CustomerCreate {
    /// Builds a customer record with zeroed purchase aggregates.
    pub fn into_customer(self, created_by: &str) -> Customer {
        let mut customer = Customer::new(String::new(), self.name.trim(), digits_only(&self.phone));
        customer.email = self.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
        customer.tax_id = self.tax_id.map(|t| digits_only(&t)).filter(|t| !t.is_empty());
        customer.address = self.address.map(|a| a.trim().to_string()).filter(|a| !a.is_empty());
        customer.birthdate = self.birthdate;
        customer.created_by = Some(created_by.to_string());
        customer
    }
}
