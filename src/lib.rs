//! Retail back office over a document store: product catalog, sale ledger,
//! customer ledger and low-stock notifications.
//!
//! Every entity family lives in its own module with its record mapping,
//! DTOs and error type. The [`clients`] module holds the handles callers
//! use, and [`app_system::RetailSystem`] wires them to a running
//! [`store::StoreActor`].
//!
//! The central operation is [`clients::SaleClient::sell`]: stock is checked,
//! decremented and the sale recorded in one optimistic transaction, so two
//! sellers racing for the last units can never both succeed.

pub mod app_system;
pub mod catalog;
pub mod clients;
pub mod customers;
pub mod domain;
pub mod notifications;
pub mod reports;
pub mod sales;
pub mod store;

#[cfg(test)]
mod mock_framework;
