//! Service contract for RPC handlers.

use async_trait::async_trait;
use bytes::Bytes;
use tonic::Status;

/// A unary RPC service the engine can dispatch to.
///
/// Implementations declare their full method set up front and must answer
/// every method they declare; there are no default bodies to fall back on.
/// The engine rejects undeclared methods with UNIMPLEMENTED before the
/// service is ever called.
#[async_trait]
pub trait RpcService: Send + Sync {
    /// Fully qualified service name, e.g. `widgets.v1.WidgetService`.
    fn name(&self) -> &str;

    /// Unary method names this service answers.
    fn methods(&self) -> &[&str];

    /// Invoke one method with a JSON-encoded request payload.
    ///
    /// The reply is the JSON-encoded response message; errors carry the
    /// RPC status code the caller maps onto its own surface.
    async fn call(&self, method: &str, payload: Bytes) -> Result<Bytes, Status>;
}
