pub mod activity;
pub mod category;
pub mod customer;
pub mod notification;
pub mod product;
pub mod sale;
pub mod session;

pub use activity::*;
pub use category::*;
pub use customer::*;
pub use notification::*;
pub use product::*;
pub use sale::*;
pub use session::*;
