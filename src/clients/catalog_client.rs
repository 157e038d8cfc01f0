use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use super::{ActivityClient, NotificationClient};
use crate::catalog::stock::StockPatch;
use crate::catalog::{
    CatalogError, ProductCreate, ProductFilter, ProductPatch, StockAdjustment, StockChange, StockLevel, StockPolicy,
    StockRejected,
};
use crate::domain::{ActivityKind, Category, Permission, Priority, Product, Sale, Session};
use crate::notifications::NotificationError;
use crate::store::{encode, Direction, Query, Record, StoreClient, StoreError, Subscription};

/// Client for the product catalog.
#[derive(Clone)]
pub struct CatalogClient {
    store: StoreClient,
    notifications: NotificationClient,
    activity: ActivityClient,
    policy: StockPolicy,
    max_attempts: u32,
}

impl_record_reads!(CatalogClient, Product, CatalogError, product);

#[derive(Serialize)]
struct ProductEdit<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    low_stock_threshold: Option<u32>,
    updated_at: DateTime<Utc>,
    updated_by: &'a str,
}

impl CatalogClient {
    pub fn new(
        store: StoreClient,
        notifications: NotificationClient,
        activity: ActivityClient,
        policy: StockPolicy,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            notifications,
            activity,
            policy,
            max_attempts,
        }
    }

    #[instrument(skip(self, session, create), fields(name = %create.name))]
    pub async fn create_product(&self, session: &Session, create: ProductCreate) -> Result<Product, CatalogError> {
        debug!("Sending request");
        session.require(Permission::ManageProducts)?;

        let threshold = create.low_stock_threshold.unwrap_or(self.policy.low_stock_threshold);
        let mut product = Product::new(String::new(), create.name.trim(), create.category.trim(), create.price, create.stock)
            .with_threshold(threshold);
        product.updated_by = Some(session.user_id.clone());

        let product = self.store.insert(&product).await?;
        info!(product_id = %product.id, stock = product.stock, "Product created");
        self.activity
            .log(
                session,
                ActivityKind::ProductCreated,
                json!({ "product_id": product.id, "name": product.name }),
            )
            .await;
        Ok(product)
    }

    /// Lists products by name. `low_stock_only` compares each product
    /// against its own threshold, so it is applied after the store query.
    #[instrument(skip(self, session))]
    pub async fn list_products(&self, session: &Session, filter: ProductFilter) -> Result<Vec<Product>, CatalogError> {
        debug!("Sending request");
        session.require(Permission::ViewProducts)?;
        let mut query = Query::collection(Product::COLLECTION).order_by("name", Direction::Asc);
        if let Some(category) = &filter.category {
            query = query.where_eq("category", category.as_str());
        }
        if let (Some(limit), false) = (filter.limit, filter.low_stock_only) {
            query = query.limit(limit);
        }

        let mut products: Vec<Product> = self.store.query_records(query).await?;
        if filter.low_stock_only {
            products.retain(Product::is_low_stock);
            if let Some(limit) = filter.limit {
                products.truncate(limit);
            }
        }
        Ok(products)
    }

    /// Live product list ordered by name. Yields the current list first, then
    /// a fresh one after every change to the catalog.
    #[instrument(skip(self, session))]
    pub async fn subscribe(&self, session: &Session) -> Result<Subscription<Product>, CatalogError> {
        debug!("Sending request");
        session.require(Permission::ViewProducts)?;
        let query = Query::collection(Product::COLLECTION).order_by("name", Direction::Asc);
        Ok(self.store.subscribe(query).await?)
    }

    #[instrument(skip(self, session))]
    pub async fn list_categories(&self, session: &Session) -> Result<Vec<Category>, CatalogError> {
        debug!("Sending request");
        session.require(Permission::ViewProducts)?;
        let query = Query::collection(Category::COLLECTION).order_by("name", Direction::Asc);
        Ok(self.store.query_records(query).await?)
    }

    #[instrument(skip(self, session))]
    pub async fn create_category(
        &self,
        session: &Session,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, CatalogError> {
        debug!("Sending request");
        session.require(Permission::ManageProducts)?;
        let category = Category {
            description: description.map(str::to_string),
            ..Category::new(String::new(), name.trim())
        };
        let category = self.store.insert(&category).await?;
        info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    #[instrument(skip(self, session, patch))]
    pub async fn update_product(&self, session: &Session, id: &str, patch: ProductPatch) -> Result<Product, CatalogError> {
        debug!("Sending request");
        session.require(Permission::ManageProducts)?;

        let mut product = self.require_product(id).await?;
        if patch.is_empty() {
            return Ok(product);
        }

        let edit = ProductEdit {
            name: patch.name.as_deref().map(str::trim),
            category: patch.category.as_deref().map(str::trim),
            price: patch.price,
            low_stock_threshold: patch.low_stock_threshold,
            updated_at: Utc::now(),
            updated_by: &session.user_id,
        };
        if let Some(name) = edit.name {
            product.name = name.to_string();
        }
        if let Some(category) = edit.category {
            product.category = category.to_string();
        }
        if let Some(price) = edit.price {
            product.price = price;
        }
        if let Some(threshold) = edit.low_stock_threshold {
            product.low_stock_threshold = threshold;
        }
        product.updated_at = edit.updated_at;
        product.updated_by = Some(session.user_id.clone());
        product.validate().map_err(CatalogError::InvalidProduct)?;

        let data = encode(Product::COLLECTION, &edit).map_err(StoreError::from)?;
        self.store.update(Product::COLLECTION, id, data).await?;
        info!(fields = ?patch.changed_fields(), "Product updated");
        self.activity
            .log(
                session,
                ActivityKind::ProductUpdated,
                json!({ "product_id": id, "fields": patch.changed_fields() }),
            )
            .await;
        Ok(product)
    }

    /// Deletes a product nobody has sold yet.
    #[instrument(skip(self, session))]
    pub async fn delete_product(&self, session: &Session, id: &str) -> Result<(), CatalogError> {
        debug!("Sending request");
        session.require(Permission::ManageProducts)?;
        session.require(Permission::DeleteData)?;

        let product = self.require_product(id).await?;
        let referencing = self
            .store
            .query(
                Query::collection(Sale::COLLECTION)
                    .where_array_contains("items", "product_id", id)
                    .limit(1),
            )
            .await?;
        if !referencing.is_empty() {
            return Err(CatalogError::InUse(id.to_string()));
        }

        self.store.delete(Product::COLLECTION, id).await?;
        info!("Product deleted");
        self.activity
            .log(
                session,
                ActivityKind::ProductDeleted,
                json!({ "product_id": id, "name": product.name }),
            )
            .await;
        Ok(())
    }

    /// Changes a product's stock in one transaction, then raises a low-stock
    /// alert if the new level calls for one. A failed alert is logged and
    /// does not undo the adjustment.
    #[instrument(skip(self, session))]
    pub async fn adjust_stock(
        &self,
        session: &Session,
        id: &str,
        adjustment: StockAdjustment,
    ) -> Result<StockLevel, CatalogError> {
        debug!("Sending request");
        session.require(Permission::ManageProducts)?;

        let change = self
            .store
            .run_transaction(self.max_attempts, |tx| {
                let id = id.to_string();
                let user_id = session.user_id.clone();
                Box::pin(async move {
                    let product: Product = tx
                        .get_record(&id)
                        .await?
                        .ok_or_else(|| CatalogError::NotFound(id.clone()))?;
                    let current = adjustment.apply(product.stock).map_err(|rejected| match rejected {
                        StockRejected::Insufficient => CatalogError::InsufficientStock {
                            product_id: product.id.clone(),
                            product_name: product.name.clone(),
                            requested: adjustment.quantity,
                            available: product.stock,
                        },
                        StockRejected::Overflow => CatalogError::StockOverflow {
                            product_id: product.id.clone(),
                            current: product.stock,
                            quantity: adjustment.quantity,
                        },
                    })?;
                    let patch = encode(
                        Product::COLLECTION,
                        &StockPatch {
                            stock: current,
                            updated_at: Utc::now(),
                            updated_by: &user_id,
                        },
                    )
                    .map_err(StoreError::from)?;
                    tx.update(Product::COLLECTION, &id, patch);
                    Ok::<_, CatalogError>(StockChange {
                        product_id: product.id,
                        product_name: product.name,
                        previous: product.stock,
                        current,
                        threshold: product.low_stock_threshold,
                    })
                })
            })
            .await?;
        info!(previous = change.previous, current = change.current, "Stock adjusted");

        let alert = match self.raise_low_stock_alert(&session.user_id, &change).await {
            Ok(alert) => alert,
            Err(e) => {
                warn!(error = %e, "Low-stock alert not recorded");
                None
            }
        };
        self.activity
            .log(
                session,
                ActivityKind::StockAdjusted,
                json!({
                    "product_id": change.product_id,
                    "mode": format!("{:?}", adjustment.mode).to_lowercase(),
                    "quantity": adjustment.quantity,
                    "previous": change.previous,
                    "current": change.current,
                }),
            )
            .await;

        Ok(StockLevel {
            product_id: change.product_id,
            stock: change.current,
            alert,
        })
    }

    /// Emits a notification when `change` left the product at or below its
    /// threshold. Returns the priority used, or `None` if no alert was due.
    #[instrument(skip(self, change), fields(product_id = %change.product_id, stock = change.current))]
    pub async fn raise_low_stock_alert(
        &self,
        owner: &str,
        change: &StockChange,
    ) -> Result<Option<Priority>, NotificationError> {
        let Some(priority) = change.alert_priority(&self.policy) else {
            return Ok(None);
        };
        self.notifications
            .emit_low_stock(owner, &change.product_id, &change.product_name, change.current, priority)
            .await?;
        Ok(Some(priority))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, SaleLine};
    use crate::mock_framework::{create_mock_store, expect_add, expect_commit, expect_get, expect_query};
    use crate::store::{StoreActor, VersionedDocument, Write};
    use uuid::Uuid;

    fn catalog_on(store: StoreClient) -> CatalogClient {
        CatalogClient::new(
            store.clone(),
            NotificationClient::new(store.clone()),
            ActivityClient::new(store),
            StockPolicy::default(),
            5,
        )
    }

    fn start() -> (CatalogClient, NotificationClient, StoreClient) {
        let (actor, store) = StoreActor::new(32, || Uuid::new_v4().to_string());
        tokio::spawn(actor.run());
        (catalog_on(store.clone()), NotificationClient::new(store.clone()), store)
    }

    fn manager() -> Session {
        Session::new("u-owner", "owner@shop.test", Role::OwnerManager)
    }

    fn drill(stock: u32) -> ProductCreate {
        ProductCreate {
            name: " Drill ".into(),
            category: "tools".into(),
            price: Decimal::new(10000, 2),
            stock,
            low_stock_threshold: None,
        }
    }

    #[tokio::test]
    async fn test_create_product_applies_defaults() {
        let (catalog, _, _) = start();
        let product = catalog.create_product(&manager(), drill(12)).await.unwrap();

        assert_eq!(product.name, "Drill");
        assert_eq!(product.low_stock_threshold, 10);
        assert_eq!(product.updated_by.as_deref(), Some("u-owner"));
        assert_eq!(catalog.get_product(&product.id).await.unwrap(), Some(product));
    }

    #[tokio::test]
    async fn test_create_product_rejects_invalid_and_unauthorized() {
        let (catalog, _, _) = start();
        let negative = ProductCreate {
            price: Decimal::new(-1, 0),
            ..drill(1)
        };
        assert!(matches!(
            catalog.create_product(&manager(), negative).await,
            Err(CatalogError::InvalidProduct(_))
        ));

        let seller = Session::new("u-seller", "seller@shop.test", Role::Seller);
        assert!(matches!(
            catalog.create_product(&seller, drill(1)).await,
            Err(CatalogError::AccessDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_adjust_stock_raises_medium_then_high() {
        let (catalog, notifications, _) = start();
        let session = manager();
        let product = catalog.create_product(&session, drill(12)).await.unwrap();

        let level = catalog
            .adjust_stock(&session, &product.id, StockAdjustment::decrement(5))
            .await
            .unwrap();
        assert_eq!((level.stock, level.alert), (7, Some(Priority::Medium)));

        let level = catalog
            .adjust_stock(&session, &product.id, StockAdjustment::decrement(5))
            .await
            .unwrap();
        assert_eq!((level.stock, level.alert), (2, Some(Priority::High)));

        let alerts = notifications.list_notifications("u-owner", true).await.unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts.iter().filter(|n| n.priority == Priority::High).count(), 1);
    }

    #[tokio::test]
    async fn test_adjust_stock_rejects_underflow_without_writing() {
        let (catalog, notifications, _) = start();
        let session = manager();
        let product = catalog.create_product(&session, drill(3)).await.unwrap();

        let err = catalog
            .adjust_stock(&session, &product.id, StockAdjustment::decrement(4))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InsufficientStock { requested: 4, available: 3, .. }));
        assert_eq!(catalog.require_product(&product.id).await.unwrap().stock, 3);
        assert!(notifications.list_notifications("u-owner", false).await.unwrap().is_empty());

        let level = catalog
            .adjust_stock(&session, &product.id, StockAdjustment::set(40))
            .await
            .unwrap();
        assert_eq!((level.stock, level.alert), (40, None));

        assert_eq!(
            catalog.adjust_stock(&session, "missing", StockAdjustment::increment(1)).await,
            Err(CatalogError::NotFound("missing".into()))
        );
    }

    #[tokio::test]
    async fn test_adjust_stock_rejects_overflowing_increment() {
        let (catalog, _, _) = start();
        let session = manager();
        let product = catalog.create_product(&session, drill(u32::MAX - 1)).await.unwrap();

        assert_eq!(
            catalog
                .adjust_stock(&session, &product.id, StockAdjustment::increment(10))
                .await,
            Err(CatalogError::StockOverflow {
                product_id: product.id.clone(),
                current: u32::MAX - 1,
                quantity: 10,
            })
        );
        assert_eq!(catalog.require_product(&product.id).await.unwrap().stock, u32::MAX - 1);
    }

    #[tokio::test]
    async fn test_update_product_merges_fields_and_keeps_stock() {
        let (catalog, _, _) = start();
        let session = manager();
        let product = catalog.create_product(&session, drill(12)).await.unwrap();

        let patch = ProductPatch {
            price: Some(Decimal::new(12050, 2)),
            low_stock_threshold: Some(15),
            ..Default::default()
        };
        let updated = catalog.update_product(&session, &product.id, patch).await.unwrap();
        assert_eq!(updated.price, Decimal::new(12050, 2));

        let stored = catalog.require_product(&product.id).await.unwrap();
        assert_eq!(stored.name, "Drill");
        assert_eq!(stored.stock, 12);
        assert!(stored.is_low_stock());

        let bad = ProductPatch {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert!(matches!(
            catalog.update_product(&session, &product.id, bad).await,
            Err(CatalogError::InvalidProduct(_))
        ));
    }

    #[tokio::test]
    async fn test_list_products_filters_low_stock_per_product_threshold() {
        let (catalog, _, _) = start();
        let session = manager();
        catalog.create_product(&session, drill(12)).await.unwrap();
        let saw = ProductCreate {
            name: "Saw".into(),
            low_stock_threshold: Some(20),
            ..drill(12)
        };
        catalog.create_product(&session, saw).await.unwrap();
        let paint = ProductCreate {
            name: "Paint".into(),
            category: "paint".into(),
            ..drill(1)
        };
        catalog.create_product(&session, paint).await.unwrap();

        let names = |products: Vec<Product>| products.into_iter().map(|p| p.name).collect::<Vec<_>>();
        let all = catalog.list_products(&session, ProductFilter::default()).await.unwrap();
        assert_eq!(names(all), vec!["Drill", "Paint", "Saw"]);

        let low = catalog
            .list_products(
                &session,
                ProductFilter {
                    category: Some("tools".into()),
                    low_stock_only: true,
                    limit: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(names(low), vec!["Saw"]);
    }

    #[tokio::test]
    async fn test_delete_product_refuses_when_sold() {
        let (catalog, _, store) = start();
        let session = manager();
        let sold = catalog.create_product(&session, drill(5)).await.unwrap();
        let unsold = catalog.create_product(&session, drill(5)).await.unwrap();

        let sale = Sale::new("s1", vec![SaleLine::snapshot(&sold, 1)], None, "u-owner", Utc::now());
        store.set(Sale::COLLECTION, "s1", sale.to_document().unwrap()).await.unwrap();

        assert_eq!(
            catalog.delete_product(&session, &sold.id).await,
            Err(CatalogError::InUse(sold.id.clone()))
        );
        catalog.delete_product(&session, &unsold.id).await.unwrap();
        assert_eq!(catalog.get_product(&unsold.id).await.unwrap(), None);

        let controller = Session::new("u-stock", "stock@shop.test", Role::StockController);
        assert!(matches!(
            catalog.delete_product(&controller, &sold.id).await,
            Err(CatalogError::AccessDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_adjust_stock_survives_failed_alert() {
        let (store, mut receiver) = create_mock_store(8);
        let catalog = catalog_on(store);
        let session = manager();

        let task = tokio::spawn(async move {
            catalog
                .adjust_stock(&session, "p1", StockAdjustment::decrement(3))
                .await
        });

        let (_, id, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
        let product = Product::new(id.clone(), "Drill", "tools", Decimal::ONE, 5);
        responder
            .send(Ok(Some(VersionedDocument {
                id,
                version: 4,
                data: product.to_document().unwrap(),
            })))
            .unwrap();

        let (reads, writes, responder) = expect_commit(&mut receiver).await.expect("Expected Commit request");
        assert_eq!(reads[0].version, 4);
        assert!(matches!(&writes[0], Write::Update { patch, .. } if patch["stock"] == 2));
        responder.send(Ok(())).unwrap();

        let (collection, _, responder) = expect_add(&mut receiver).await.expect("Expected Add request");
        assert_eq!(collection, "notifications");
        responder.send(Err(StoreError::Unavailable("timeout".into()))).unwrap();
        drop(receiver);

        let level = task.await.unwrap().unwrap();
        assert_eq!((level.stock, level.alert), (2, None));
    }

    #[tokio::test]
    async fn test_delete_product_stops_when_reference_check_fails() {
        let (store, mut receiver) = create_mock_store(8);
        let catalog = catalog_on(store);
        let task = tokio::spawn(async move { catalog.delete_product(&manager(), "p1").await });

        let (_, id, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
        let product = Product::new(id.clone(), "Drill", "tools", Decimal::ONE, 5);
        responder
            .send(Ok(Some(VersionedDocument {
                id,
                version: 1,
                data: product.to_document().unwrap(),
            })))
            .unwrap();

        let (query, responder) = expect_query(&mut receiver).await.expect("Expected Query request");
        assert_eq!(query.collection, "sales");
        assert_eq!(query.limit, Some(1));
        responder.send(Err(StoreError::Unavailable("timeout".into()))).unwrap();

        assert!(matches!(task.await.unwrap(), Err(CatalogError::Transport(_))));
        // No delete was attempted.
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_categories_are_listed_by_name() {
        let (catalog, _, _) = start();
        let session = manager();
        catalog.create_category(&session, " Tools ", None).await.unwrap();
        catalog
            .create_category(&session, "Paint", Some("Interior and exterior"))
            .await
            .unwrap();

        let categories = catalog.list_categories(&session).await.unwrap();
        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Paint", "Tools"]);
        assert_eq!(categories[0].description.as_deref(), Some("Interior and exterior"));

        let seller = Session::new("u-seller", "seller@shop.test", Role::Seller);
        assert_eq!(catalog.list_categories(&seller).await.unwrap().len(), 2);
        assert!(matches!(
            catalog.create_category(&seller, "Garden", None).await,
            Err(CatalogError::AccessDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_product_feed_follows_stock_changes() {
        let (catalog, _, _) = start();
        let session = manager();
        let drill = catalog.create_product(&session, drill(12)).await.unwrap();

        let mut feed = catalog.subscribe(&session).await.unwrap();
        assert_eq!(feed.next().await.unwrap().unwrap(), vec![drill.clone()]);

        catalog
            .adjust_stock(&session, &drill.id, StockAdjustment::decrement(4))
            .await
            .unwrap();
        let products = feed.next().await.unwrap().unwrap();
        assert_eq!(products[0].stock, 8);
    }
}
