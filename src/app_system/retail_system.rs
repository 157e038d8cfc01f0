use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use super::{RetailConfig, SystemError};
use crate::clients::{ActivityClient, CatalogClient, CustomerClient, NotificationClient, ReportClient, SaleClient};
use crate::store::StoreActor;

/// Starts the store actor and wires every client to it.
///
/// Clients are cheap to clone. The actor keeps running until every clone
/// has been dropped, so [`RetailSystem::shutdown`] only completes once
/// callers have released theirs.
pub struct RetailSystem {
    pub catalog: CatalogClient,
    pub sales: SaleClient,
    pub customers: CustomerClient,
    pub notifications: NotificationClient,
    pub activity: ActivityClient,
    pub reports: ReportClient,
    config: RetailConfig,
    handles: Vec<JoinHandle<()>>,
}

impl RetailSystem {
    pub fn new(config: RetailConfig) -> Self {
        let (store_actor, store) = StoreActor::new(config.channel_buffer, || Uuid::new_v4().to_string());
        let store_handle = tokio::spawn(store_actor.run());

        let notifications = NotificationClient::new(store.clone());
        let activity = ActivityClient::new(store.clone());
        let catalog = CatalogClient::new(
            store.clone(),
            notifications.clone(),
            activity.clone(),
            config.stock,
            config.tx_max_attempts,
        );
        let customers = CustomerClient::new(store.clone(), activity.clone(), config.tx_max_attempts);
        let sales = SaleClient::new(
            store,
            catalog.clone(),
            customers.clone(),
            activity.clone(),
            config.tx_max_attempts,
        );
        let reports = ReportClient::new(sales.clone(), catalog.clone(), customers.clone());

        info!(?config, "Retail system started");
        Self {
            catalog,
            sales,
            customers,
            notifications,
            activity,
            reports,
            config,
            handles: vec![store_handle],
        }
    }

    pub fn config(&self) -> &RetailConfig {
        &self.config
    }

    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down system...");
        let Self {
            catalog,
            sales,
            customers,
            notifications,
            activity,
            reports,
            handles,
            ..
        } = self;
        // Dropping the last store client closes the channel and stops the actor.
        drop((catalog, sales, customers, notifications, activity, reports));

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(SystemError::ActorTask(e.to_string()));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
