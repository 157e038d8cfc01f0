use crate::domain::{Activity, Notification};
use crate::store::Record;

impl Record for Notification {
    const COLLECTION: &'static str = "notifications";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("notification title must not be empty".to_string());
        }
        Ok(())
    }
}

impl Record for Activity {
    const COLLECTION: &'static str = "activities";

    fn id(&self) -> &str {
        &self.id
    }
}
