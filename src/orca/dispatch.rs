use tracing::debug;

use super::Orca;
use crate::common::{Request, Result};

/// Route one request to the matching orchestrator method.
///
/// Application errors are answered through [`Orca::error`] and count as a
/// served request. Any other error is returned; the connection that carried
/// the request should be closed.
pub async fn handle_request(orca: &dyn Orca, req: Request) -> Result<()> {
    let result = match &req {
        Request::Set(r) => orca.set(r).await,
        Request::Add(r) => orca.add(r).await,
        Request::Replace(r) => orca.replace(r).await,
        Request::Delete(r) => orca.delete(r).await,
        Request::Touch(r) => orca.touch(r).await,
        Request::Get(r) => orca.get(r).await,
        Request::Gat(r) => orca.gat(r).await,
        Request::Noop(r) => orca.noop(r).await,
        Request::Quit(r) => orca.quit(r).await,
        Request::Version(r) => orca.version(r).await,
        Request::Unknown { opaque } => orca.unknown(*opaque).await,
    };

    match result {
        Ok(()) => Ok(()),
        Err(err) if err.is_app_error() => {
            debug!(request = %req.request_type(), opaque = req.opaque(), error = %err, "replying with error");
            orca.error(req.opaque(), req.request_type(), &err).await
        }
        Err(err) => Err(err),
    }
}
