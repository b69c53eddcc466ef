use tokio::time::sleep;
use tracing::{debug, info, instrument};

use crate::command::CommandRequest;
use crate::context::Context;
use crate::errors::Error;

/// Run `request` once plus up to `poll_retries` more times until it succeeds.
async fn poll_until_ok(ctx: &Context<'_>, request: &CommandRequest) -> Result<bool, Error> {
    for attempt in 0..=ctx.config.poll_retries {
        if attempt > 0 {
            sleep(ctx.config.poll_interval).await;
        }
        if ctx.runner.execute(request).await?.success() {
            return Ok(true);
        }
        debug!(command = %request, attempt, "not ready yet");
    }
    Ok(false)
}

#[instrument(skip(ctx))]
pub async fn wait_for_openshift_api(ctx: &Context<'_>) -> Result<(), Error> {
    let inspect =
        CommandRequest::new("docker").args(["inspect", ctx.config.container_name.as_str()]);
    if !poll_until_ok(ctx, &inspect).await? {
        return Err(Error::Timeout("Failed to start OpenShift Container".into()));
    }

    let health = CommandRequest::new("curl").arg("-ksSf").arg(ctx.config.health_url());
    if !poll_until_ok(ctx, &health).await? {
        return Err(Error::Timeout("OpenShift container is not in good health".into()));
    }

    info!("OpenShift API is ready");
    Ok(())
}
