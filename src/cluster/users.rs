use tracing::{debug, info};

use crate::command::{CommandRequest, oadm};
use crate::context::Context;
use crate::errors::Error;
use crate::state::Step;

const DEVELOPER: &str = "openshift-dev";
const DEVELOPER_PASSWORD: &str = "devel";
const ADMIN: &str = "admin";
const SAMPLE_PROJECT: &str = "sample-project";

/// Run `command` through a login shell of `user`.
fn as_user(user: &str, command: String) -> CommandRequest {
    CommandRequest::new("su").args([user, "-l", "-c"]).arg(command)
}

pub async fn user_configure(ctx: &Context<'_>) -> Result<(), Error> {
    if ctx.markers.is_done(Step::User) {
        debug!("Users already configured");
        return Ok(());
    }
    info!("Adding required roles to {DEVELOPER} and {ADMIN} user");
    let config = ctx.config;
    let kubeconfig = format!("--config={}", config.kubeconfig().display());

    let requests = [
        oadm(config)
            .args(["policy", "add-role-to-user", "basic-user", DEVELOPER])
            .arg(kubeconfig.as_str())
            .or_log(format!("Failed to grant basic-user to {DEVELOPER}")),
        oadm(config)
            .args(["policy", "add-cluster-role-to-user", "cluster-admin", ADMIN])
            .arg(kubeconfig.as_str())
            .or_log(format!("Failed to grant cluster-admin to {ADMIN}")),
        as_user(
            &config.login_user,
            format!(
                "oc login {} -u {DEVELOPER} -p {DEVELOPER_PASSWORD} --certificate-authority={}",
                config.api_url,
                config.master_file("ca.crt").display()
            ),
        )
        .or_log(format!("Failed to log in as {DEVELOPER}")),
        as_user(
            &config.login_user,
            format!(
                "oc new-project {SAMPLE_PROJECT} --display-name='OpenShift sample project' \
                 --description='This is a sample project to demonstrate OpenShift v3'"
            ),
        )
        .or_log(format!("Failed to create {SAMPLE_PROJECT}")),
    ];
    for request in &requests {
        ctx.runner.execute(request).await?;
    }

    ctx.markers.mark_done(Step::User)
}
