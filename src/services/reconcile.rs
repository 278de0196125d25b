use async_trait::async_trait;

use crate::error::IngestError;
use crate::media::reference::ObjectReference;

/// Notified when an object was uploaded but no record ended up pointing at it.
///
/// The pipeline does not delete the object itself; an implementation may
/// queue it for cleanup or alerting.
#[async_trait]
pub trait Reconciler: Send + Sync {
    async fn orphaned(&self, reference: &ObjectReference, cause: &IngestError);
}

pub struct LogReconciler;

#[async_trait]
impl Reconciler for LogReconciler {
    async fn orphaned(&self, reference: &ObjectReference, cause: &IngestError) {
        tracing::warn!(
            bucket = reference.bucket(),
            key = reference.key(),
            error = %cause,
            "uploaded object is not referenced by any record"
        );
    }
}
