/// Generates the get/delete methods every document client shares. Deletes
/// are hard, irreversible, and admin-gated; the error type must convert
/// from both `StoreError` and `AccessError`.
#[macro_export]
macro_rules! impl_doc_client {
    ($client_name:ident, $entity:ty, $error:ty, $entity_name_snake:ident) => {
        paste::paste! {
            #[allow(dead_code)]
            impl $client_name {
                #[tracing::instrument(skip(self))]
                pub async fn [<get_ $entity_name_snake>](&self, id: &str) -> Result<Option<$entity>, $error> {
                    tracing::debug!("Sending request");
                    let found = self.store.get::<$entity>(id).await?;
                    Ok(found.map(|(doc, _version)| doc))
                }

                #[tracing::instrument(skip(self, caller), fields(caller = %caller.id))]
                pub async fn [<delete_ $entity_name_snake>](
                    &self,
                    caller: &$crate::auth::Caller,
                    id: &str,
                ) -> Result<(), $error> {
                    caller.require_admin()?;
                    tracing::debug!("Sending request");
                    Ok(self.store.delete::<$entity>(id).await?)
                }
            }
        }
    };
}
