use std::fs;
use std::io::Write;

use serde_derive::Serialize;
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::command::{oadm, oc};
use crate::config::Config;
use crate::context::Context;
use crate::errors::Error;
use crate::state::Step;

const REGISTRY: &str = "docker-registry";
const REGISTRY_DC: &str = "dc/docker-registry";
const REGISTRY_SECRET: &str = "registry-secret";
const SECRETS_MOUNT: &str = "/etc/secrets";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Termination {
    Passthrough,
}

#[derive(Serialize, Debug)]
pub struct RouteTls {
    pub termination: Termination,
}

/// Where the registry can be reached, as reported by the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEndpoint {
    pub hostname: String,
    pub service_ip: String,
    pub service_port: String,
}

impl RegistryEndpoint {
    pub fn service_address(&self) -> String {
        format!("{}:{}", self.service_ip, self.service_port)
    }
}

async fn get_template(ctx: &Context<'_>, resource: &str, template: &str) -> Result<String, Error> {
    let output = ctx
        .runner
        .execute(
            &oc(ctx.config)
                .args(["get", resource, "-o", "template"])
                .arg(format!("--template={template}"))
                .or_abort(format!("Failed to read {template} of {resource}")),
        )
        .await?;
    Ok(output.stdout.trim().to_string())
}

async fn registry_endpoint(ctx: &Context<'_>) -> Result<RegistryEndpoint, Error> {
    Ok(RegistryEndpoint {
        hostname: get_template(ctx, "route/docker-registry", "{{ .spec.host }}").await?,
        service_ip: get_template(ctx, "svc/docker-registry", "{{ .spec.clusterIP }}").await?,
        service_port: get_template(ctx, "svc/docker-registry", "{{ (index .spec.ports 0).port }}")
            .await?,
    })
}

/// Switch every `scheme: HTTP` in a deployment config to HTTPS. Returns how many were changed.
pub fn use_https_probes(value: &mut YamlValue) -> usize {
    match value {
        YamlValue::Mapping(mapping) => mapping
            .iter_mut()
            .map(|(key, value)| {
                if key.as_str() == Some("scheme") && value.as_str() == Some("HTTP") {
                    *value = YamlValue::String("HTTPS".into());
                    1
                } else {
                    use_https_probes(value)
                }
            })
            .sum(),
        YamlValue::Sequence(sequence) => sequence.iter_mut().map(use_https_probes).sum(),
        YamlValue::Tagged(tagged) => use_https_probes(&mut tagged.value),
        _ => 0,
    }
}

/// Set `spec.tls` of a route object to passthrough termination.
pub fn set_passthrough(route: &mut JsonValue) -> Result<(), Error> {
    let tls = serde_json::to_value(RouteTls {
        termination: Termination::Passthrough,
    })?;
    let spec = route
        .get_mut("spec")
        .and_then(JsonValue::as_object_mut)
        .ok_or_else(|| Error::MalformedObject {
            kind: "route".into(),
            reason: "missing spec".into(),
        })?;
    spec.insert("tls".into(), tls);
    Ok(())
}

fn trust_registry_ca(config: &Config, address: &str) -> std::io::Result<()> {
    let dir = config.docker_certs_dir.join(address);
    fs::create_dir_all(&dir)?;
    fs::copy(config.master_file("ca.crt"), dir.join("ca.crt"))?;
    Ok(())
}

async fn create_certificate(ctx: &Context<'_>, endpoint: &RegistryEndpoint) -> Result<(), Error> {
    let master = |name: &str| ctx.config.master_file(name).to_string_lossy().into_owned();
    ctx.runner
        .execute(
            &oadm(ctx.config)
                .args(["ca", "create-server-cert"])
                .arg(format!("--signer-cert={}", master("ca.crt")))
                .arg(format!("--signer-key={}", master("ca.key")))
                .arg(format!("--signer-serial={}", master("ca.serial.txt")))
                .arg(format!(
                    "--hostnames={},{}",
                    endpoint.hostname, endpoint.service_ip
                ))
                .arg(format!("--cert={}", master("registry.crt")))
                .arg(format!("--key={}", master("registry.key")))
                .or_abort("Failed to create registry certificates"),
        )
        .await?;
    Ok(())
}

async fn configure_registry_tls(ctx: &Context<'_>) -> Result<(), Error> {
    let config = ctx.config;

    ctx.runner
        .execute(
            &oc(config)
                .args(["secrets", "new", REGISTRY_SECRET])
                .path_arg(&config.master_file("registry.crt"))
                .path_arg(&config.master_file("registry.key"))
                .or_abort("Failed to create secret for the registry certificates"),
        )
        .await?;

    ctx.runner
        .execute(
            &oc(config)
                .args(["volume", REGISTRY_DC, "--add", "--type=secret"])
                .arg(format!("--secret-name={REGISTRY_SECRET}"))
                .args(["-m", SECRETS_MOUNT])
                .or_abort(
                    "Failed to add the secret volume to the registry deployment configuration",
                ),
        )
        .await?;

    ctx.runner
        .execute(
            &oc(config)
                .args(["env", REGISTRY_DC])
                .arg(format!(
                    "REGISTRY_HTTP_TLS_CERTIFICATE={SECRETS_MOUNT}/registry.crt"
                ))
                .arg(format!("REGISTRY_HTTP_TLS_KEY={SECRETS_MOUNT}/registry.key"))
                .or_abort("Failed to enable TLS"),
        )
        .await?;
    Ok(())
}

async fn switch_liveness_probe_to_https(ctx: &Context<'_>) -> Result<(), Error> {
    const MESSAGE: &str = "Failed to update the scheme used for the registry's liveness probe";

    let output = ctx
        .runner
        .execute(
            &oc(ctx.config)
                .args(["get", REGISTRY_DC, "-o", "yaml"])
                .or_abort(MESSAGE),
        )
        .await?;
    let mut deployment: YamlValue = serde_yaml::from_str(&output.stdout)?;
    let changed = use_https_probes(&mut deployment);
    debug!(changed, "probe schemes switched to HTTPS");

    ctx.runner
        .execute(
            &oc(ctx.config)
                .args(["replace", "-f", "-"])
                .stdin(serde_yaml::to_string(&deployment)?)
                .or_abort(MESSAGE),
        )
        .await?;
    Ok(())
}

async fn enable_route_passthrough(ctx: &Context<'_>) -> Result<(), Error> {
    let output = ctx
        .runner
        .execute(
            &oc(ctx.config)
                .args(["get", "route", REGISTRY, "-o", "json"])
                .or_abort("Failed to read docker registry route"),
        )
        .await?;
    let mut route: JsonValue = serde_json::from_str(&output.stdout.replace("\r\n", ""))?;
    set_passthrough(&mut route)?;

    // Removed from disk when `file` is dropped, on success and failure alike
    let mut file = NamedTempFile::new()?;
    serde_json::to_writer(file.as_file_mut(), &route)?;
    file.as_file_mut().flush()?;

    ctx.runner
        .execute(
            &oc(ctx.config)
                .args(["replace", "-f"])
                .path_arg(file.path())
                .or_abort("Failed to add tls termination"),
        )
        .await?;
    Ok(())
}

pub async fn secure_docker_registry(ctx: &Context<'_>) -> Result<(), Error> {
    if ctx.markers.is_done(Step::SecureRegistry) {
        debug!("Docker registry already secured");
        return Ok(());
    }
    info!("Securing docker registry");

    let endpoint = registry_endpoint(ctx).await?;
    debug!(?endpoint, "registry endpoint");

    create_certificate(ctx, &endpoint).await?;
    configure_registry_tls(ctx).await?;
    switch_liveness_probe_to_https(ctx).await?;

    for address in [endpoint.service_address(), endpoint.hostname.clone()] {
        if let Err(err) = trust_registry_ca(ctx.config, &address) {
            warn!(%address, "Failed to install registry CA certificate: {err}");
        }
    }

    enable_route_passthrough(ctx).await?;

    ctx.markers.mark_done(Step::SecureRegistry)
}
