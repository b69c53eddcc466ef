use tracing::{debug, info};

use crate::command::{oadm, oc};
use crate::context::Context;
use crate::errors::Error;
use crate::state::Step;

pub async fn create_docker_registry(ctx: &Context<'_>) -> Result<(), Error> {
    if ctx.markers.is_done(Step::Registry) {
        debug!("Docker registry already configured");
        return Ok(());
    }
    info!("Configuring Docker Registry");
    let config = ctx.config;

    ctx.runner
        .execute(
            &oadm(config)
                .args(["registry", "--create", "--service-account=registry"])
                .or_abort("Failed to create service account for registry"),
        )
        .await?;
    ctx.runner
        .execute(
            &oadm(config)
                .args(["policy", "add-scc-to-group", "anyuid", "system:authenticated"])
                .or_abort("Failed to add system authenticated policy"),
        )
        .await?;

    ctx.markers.mark_done(Step::Registry)
}

pub async fn create_route(ctx: &Context<'_>) -> Result<(), Error> {
    if ctx.markers.is_done(Step::Route) {
        debug!("Router already configured");
        return Ok(());
    }
    info!("Configuring HAProxy router");
    let config = ctx.config;

    ctx.runner
        .execute(
            &oadm(config)
                .args([
                    "policy",
                    "add-scc-to-user",
                    "privileged",
                    "system:serviceaccount:default:router",
                ])
                .or_abort("Failed to add privileged policy to router service account"),
        )
        .await?;
    ctx.runner
        .execute(
            &oadm(config)
                .args(["router", "--service-account=router", "--expose-metrics=true"])
                .or_abort("Failed to expose router"),
        )
        .await?;
    ctx.runner
        .execute(
            &oc(config)
                .args(["expose", "service", "docker-registry", "--hostname"])
                .arg(config.registry_hostname())
                .or_abort("Failed to expose docker registry route"),
        )
        .await?;

    ctx.markers.mark_done(Step::Route)
}
