use crate::domain::Customer;
use crate::store::Record;

impl Record for Customer {
    const COLLECTION: &'static str = "customers";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("customer name must not be empty".to_string());
        }
        if self.phone.trim().is_empty() {
            return Err("customer phone must not be empty".to_string());
        }
        if self.total_spent.is_sign_negative() {
            return Err(format!("total spent must not be negative, got {}", self.total_spent));
        }
        Ok(())
    }
}
