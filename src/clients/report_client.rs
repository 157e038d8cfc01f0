use chrono::Utc;
use tracing::{debug, instrument};

use super::{CatalogClient, CustomerClient, SaleClient};
use crate::catalog::ProductFilter;
use crate::domain::{Permission, Session};
use crate::reports::{
    customers_report, inventory_report, sales_stats, CustomersReport, InventoryReport, Period, ReportError, SalesStats,
};
use crate::sales::SaleFilter;

/// Dashboard reports, computed on demand from the ledgers.
#[derive(Clone)]
pub struct ReportClient {
    sales: SaleClient,
    catalog: CatalogClient,
    customers: CustomerClient,
}

impl ReportClient {
    pub fn new(sales: SaleClient, catalog: CatalogClient, customers: CustomerClient) -> Self {
        Self {
            sales,
            catalog,
            customers,
        }
    }

    #[instrument(skip(self, session))]
    pub async fn sales_stats(&self, session: &Session, period: Period) -> Result<SalesStats, ReportError> {
        debug!("Sending request");
        session.require(Permission::ViewReports)?;
        let sales = self
            .sales
            .list_sales(
                session,
                SaleFilter {
                    since: Some(period.start(Utc::now())),
                    ..Default::default()
                },
            )
            .await?;
        Ok(sales_stats(&sales))
    }

    #[instrument(skip(self, session))]
    pub async fn inventory_report(&self, session: &Session, filter: ProductFilter) -> Result<InventoryReport, ReportError> {
        debug!("Sending request");
        session.require(Permission::ViewReports)?;
        let products = self.catalog.list_products(session, filter).await?;
        Ok(inventory_report(&products))
    }

    #[instrument(skip(self, session))]
    pub async fn customers_report(&self, session: &Session) -> Result<CustomersReport, ReportError> {
        debug!("Sending request");
        session.require(Permission::ViewReports)?;
        let customers = self.customers.list_customers(None).await?;
        let sales = self.sales.list_sales(session, SaleFilter::default()).await?;
        Ok(customers_report(&customers, &sales))
    }
}
