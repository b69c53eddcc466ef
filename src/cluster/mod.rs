mod binaries;
mod readiness;
mod registry;
mod secure_registry;
mod templates;
mod users;

use tracing::info;

use crate::context::Context;
use crate::errors::Error;

/// Bring a freshly started OpenShift container to a usable state.
pub async fn run(ctx: &Context<'_>) -> Result<(), Error> {
    readiness::wait_for_openshift_api(ctx).await?;
    binaries::copy_openshift_client_binaries(ctx).await?;
    registry::create_docker_registry(ctx).await?;
    registry::create_route(ctx).await?;
    secure_registry::secure_docker_registry(ctx).await?;
    templates::create_sample_templates(ctx).await?;
    users::user_configure(ctx).await?;

    info!("OpenShift bootstrap complete");
    Ok(())
}
