/// Generates the typed read methods every ledger client exposes:
/// `get_<name>` (absent is `Ok(None)`) and `require_<name>` (absent is
/// `<Error>::NotFound`). The client needs a `store: StoreClient` field and
/// its error type must implement `From<StoreError>`.
macro_rules! impl_record_reads {
    ($client_name:ident, $record:ty, $error:ty, $record_name_snake:ident) => {
        paste::paste! {
            impl $client_name {
                #[tracing::instrument(skip(self))]
                pub async fn [<get_ $record_name_snake>](&self, id: &str) -> Result<Option<$record>, $error> {
                    tracing::debug!("Sending request");
                    self.store.get_record::<$record>(id).await.map_err(<$error>::from)
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<require_ $record_name_snake>](&self, id: &str) -> Result<$record, $error> {
                    self.[<get_ $record_name_snake>](id)
                        .await?
                        .ok_or_else(|| <$error>::NotFound(id.to_string()))
                }
            }
        }
    };
}
