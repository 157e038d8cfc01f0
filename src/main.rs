use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::timeout;
use tracing::{error, info, warn, Instrument};

use stockroom::app_system::{setup_tracing, RetailConfig, RetailSystem};
use stockroom::catalog::ProductCreate;
use stockroom::customers::CustomerCreate;
use stockroom::domain::{Role, Session};
use stockroom::reports::Period;
use stockroom::sales::{Cart, CartLine, CustomerRef, SaleOutcome, SaleRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = RetailConfig::from_env();
    info!("Starting stockroom demo");
    let system = RetailSystem::new(config);

    let manager = Session::new("u-manager", "manager@stockroom.test", Role::OwnerManager);
    let seller = Session::new("u-seller", "seller@stockroom.test", Role::Seller);

    let tools = system.catalog.create_category(&manager, "Tools", None).await?;
    info!(category = %tools.name, "Category created");

    let product = system
        .catalog
        .create_product(
            &manager,
            ProductCreate {
                name: "Cordless Drill".to_string(),
                category: "tools".to_string(),
                price: Decimal::new(10000, 2),
                stock: 10,
                low_stock_threshold: None,
            },
        )
        .await?;
    info!(product_id = %product.id, stock = product.stock, "Product created");

    let customer = system
        .customers
        .register_customer(&seller, CustomerCreate::new("Ana Souza", "(11) 98765-4321"))
        .await?;
    info!(customer_id = %customer.id, "Customer registered");

    let request = SaleRequest::new(Cart::new(vec![CartLine::new(&product.id, 2)])?)
        .for_customer(CustomerRef {
            id: customer.id.clone(),
            name: customer.name.clone(),
        })
        .with_idempotency_key("demo-checkout-1");

    let mut inbox = system.notifications.subscribe(&seller.user_id).await?;
    if let Some(unread) = inbox.next().await {
        let unread = unread?;
        info!(unread = unread.len(), "Inbox opened");
    }

    let span = tracing::info_span!("sale_processing");
    let outcome = async {
        info!("Processing sale");
        system.sales.sell(&seller, request).await
    }
    .instrument(span)
    .await;

    match outcome {
        Ok(SaleOutcome::PartialSuccess { sale, failures }) => {
            for failure in &failures {
                warn!(sale_id = %sale.id, %failure, "Sale recorded with a follow-up failure");
            }
        }
        Ok(outcome) => info!(sale_id = %outcome.sale().id, total = %outcome.sale().total, "Sale completed"),
        Err(e) => error!(error = %e, retryable = e.is_retryable(), "Sale failed"),
    }

    let remaining = system.catalog.require_product(&product.id).await?;
    info!(stock = remaining.stock, "Stock after sale");

    if let Ok(Some(unread)) = timeout(Duration::from_millis(200), inbox.next()).await {
        for alert in unread? {
            info!(priority = ?alert.priority, message = %alert.message, "Notification");
        }
    }

    let stats = system.reports.sales_stats(&manager, Period::Day).await?;
    info!(
        sales = stats.total_sales,
        revenue = %stats.total_revenue,
        average_ticket = %stats.average_ticket,
        "Today's sales"
    );

    system.shutdown().await?;
    info!("Application completed successfully");
    Ok(())
}
