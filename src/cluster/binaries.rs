use tracing::{debug, info};

use crate::command::CommandRequest;
use crate::context::Context;
use crate::errors::Error;

// oc and oadm are symlinks to openshift inside the container
const CLIENT_BINARIES: [&str; 3] = ["openshift", "oc", "oadm"];

pub async fn copy_openshift_client_binaries(ctx: &Context<'_>) -> Result<(), Error> {
    info!("Copying openshift client binaries");
    for binary in CLIENT_BINARIES {
        let target = ctx.config.bin_dir.join(binary);
        if target.is_file() {
            debug!(binary, "already present");
            continue;
        }
        let request = CommandRequest::new("docker")
            .arg("cp")
            .arg(format!("{}:/usr/bin/{binary}", ctx.config.container_name))
            .path_arg(&target)
            .or_abort("Failed to copy openshift client binary");
        ctx.runner.execute(&request).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::FakeRunner;
    use crate::context::testing::config_in;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copies_only_missing_binaries() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(temp_dir.path());
        fs::create_dir_all(&config.bin_dir).unwrap();
        fs::write(config.bin_dir.join("oc"), b"").unwrap();
        let runner = FakeRunner::new();

        copy_openshift_client_binaries(&Context::new(&config, &runner))
            .await
            .unwrap();

        let lines = runner.command_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            format!(
                "docker cp openshift:/usr/bin/openshift {}",
                config.bin_dir.join("openshift").display()
            )
        );
        assert!(lines[1].starts_with("docker cp openshift:/usr/bin/oadm "));
    }

    #[tokio::test]
    async fn test_copy_failure_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(temp_dir.path());
        let runner = FakeRunner::new();
        runner.fail("docker cp");

        let result = copy_openshift_client_binaries(&Context::new(&config, &runner)).await;
        assert!(matches!(result, Err(Error::StepFailed(_))));
        assert_eq!(runner.count("docker cp"), 1);
    }
}
