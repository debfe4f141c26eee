use async_graphql::{Context, Error as GqlError, ErrorExtensions};
use drive_common::error::Error;
use tracing::error;

use crate::server::ContextData;

/// Surfaces a ledger error to the caller with its kind as the `code` extension.
pub(crate) fn to_gql(err: Error) -> GqlError {
    if matches!(err, Error::Database(_) | Error::Internal(_)) {
        error!(error = %err, "Ledger operation failed");
    }

    let code = err.code();
    GqlError::new(err.to_string()).extend_with(|_, ext| ext.set("code", code))
}

pub(crate) fn context_data<'a>(ctx: &Context<'a>) -> Result<&'a ContextData, GqlError> {
    ctx.data::<ContextData>().map_err(|e| {
        error!("Failed to get ContextData: {:?}", e);
        GqlError::new("Internal server error: Could not access context data.")
            .extend_with(|_, ext| ext.set("code", "INTERNAL"))
    })
}
