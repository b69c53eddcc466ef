mod storage;
mod templates;

use std::io::Write;

use askama::Template;
use tempfile::NamedTempFile;
use tracing::{error, info, instrument};

use crate::command::{CommandRequest, oc};
use crate::context::Context;
use crate::errors::Error;
use storage::Owner;
use templates::PersistentVolumeTemplate;

const NFS_SERVICE: &str = "nfs-server";
const NFS_SERVER: &str = "localhost";

fn systemctl(action: &str) -> CommandRequest {
    CommandRequest::new("systemctl").args([action, NFS_SERVICE])
}

pub async fn configure_nfs(ctx: &Context<'_>) -> Result<(), Error> {
    info!("Configuring NFS");
    let requests = [
        CommandRequest::new("setsebool")
            .args(["-P", "virt_use_nfs", "1"])
            .or_log("Failed to allow NFS for virtualization"),
        systemctl("start").or_log("NFS server start failed"),
        systemctl("enable").or_log("NFS server enable failed"),
    ];
    for request in &requests {
        ctx.runner.execute(request).await?;
    }
    Ok(())
}

/// Create `pv_count` new NFS-backed persistent volumes, numbered after the existing ones.
/// Returns the names of the volumes created.
#[instrument(skip(ctx))]
pub async fn persistent_vol_setup(ctx: &Context<'_>) -> Result<Vec<String>, Error> {
    info!("Creating persistent volumes");
    let config = ctx.config;
    let owner = config.nfs_owner.as_deref().map(Owner::lookup).transpose()?;

    if !config.nfs_root.is_dir() {
        if let Err(err) = storage::create_root_dir(&config.nfs_root, owner.as_ref()) {
            error!(root = %config.nfs_root.display(), "Failed to create NFS root: {err}");
        }
    }

    let first = storage::count_volumes(&config.nfs_root)?;
    let end = first
        .checked_add(config.pv_count)
        .ok_or_else(|| Error::InvalidConfig {
            key: "OPENSHIFT_PV_COUNT".into(),
            value: config.pv_count.to_string(),
        })?;
    let mut created = Vec::new();
    for index in first..end {
        let name = format!("pv{index}");
        let dir = config.nfs_root.join(&name);

        info!(volume = %name, "Creating required directories");
        storage::create_volume_dir(&dir, owner.as_ref())?;
        storage::update_exports(&config.exports_file, &dir)?;
        ctx.runner
            .execute(&systemctl("restart").or_log("NFS server restart failed"))
            .await?;

        let descriptor = PersistentVolumeTemplate {
            name: name.clone(),
            capacity_gib: config.pv_capacity_gib,
            server: NFS_SERVER.into(),
            path: dir.display().to_string(),
        }
        .render()?;

        // Removed from disk when `file` is dropped, on success and failure alike
        let mut file = NamedTempFile::new()?;
        file.write_all(descriptor.as_bytes())?;
        file.flush()?;
        ctx.runner
            .execute(
                &oc(config)
                    .args(["create", "-f"])
                    .path_arg(file.path())
                    .or_abort("Failed to create nfs mount"),
            )
            .await?;

        created.push(name);
    }
    Ok(created)
}

pub async fn run(ctx: &Context<'_>) -> Result<(), Error> {
    configure_nfs(ctx).await?;
    let created = persistent_vol_setup(ctx).await?;
    info!(volumes = ?created, "Persistent volumes created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::FakeRunner;
    use crate::context::testing::config_in;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_indices_continue_from_existing_volumes() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(temp_dir.path());
        let runner = FakeRunner::new();
        let ctx = Context::new(&config, &runner);

        let first = persistent_vol_setup(&ctx).await.unwrap();
        assert_eq!(first, vec!["pv0", "pv1", "pv2"]);
        let exports_after_first = fs::read_to_string(&config.exports_file).unwrap();
        assert_eq!(exports_after_first.lines().count(), 3);

        let second = persistent_vol_setup(&ctx).await.unwrap();
        assert_eq!(second, vec!["pv3", "pv4", "pv5"]);

        let exports = fs::read_to_string(&config.exports_file).unwrap();
        assert!(exports.starts_with(&exports_after_first));
        let lines: Vec<&str> = exports.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(
            lines[5],
            format!("{} *(rw,root_squash)", config.nfs_root.join("pv5").display())
        );
        assert_eq!(runner.count("systemctl restart nfs-server"), 6);
    }

    #[tokio::test]
    async fn test_descriptors_submitted_and_removed() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_in(temp_dir.path());
        config.pv_count = 2;
        config.pv_capacity_gib = 5;
        let runner = FakeRunner::new();

        persistent_vol_setup(&Context::new(&config, &runner))
            .await
            .unwrap();

        let submitted = runner.submitted();
        assert_eq!(submitted.len(), 2);
        assert!(submitted[1].contains("name: pv1"));
        assert!(submitted[1].contains("storage: 5Gi"));
        assert!(submitted[1].contains(&format!(
            "path: {}",
            config.nfs_root.join("pv1").display()
        )));

        for call in runner.calls().iter().filter(|call| call.program == "oc") {
            assert!(!Path::new(&call.args[2]).exists());
        }
    }

    #[tokio::test]
    async fn test_submission_failure_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(temp_dir.path());
        let runner = FakeRunner::new();
        runner.fail("oc create");
        runner.fail("systemctl restart");

        let result = persistent_vol_setup(&Context::new(&config, &runner)).await;
        match result {
            Err(Error::StepFailed(message)) => assert_eq!(message, "Failed to create nfs mount"),
            other => panic!("unexpected result: {other:?}"),
        }
        // The directory and export of the failed volume stay behind
        assert!(config.nfs_root.join("pv0").is_dir());
        assert!(!config.nfs_root.join("pv1").exists());
        assert_eq!(runner.count("oc create"), 1);
    }

    #[tokio::test]
    async fn test_configure_nfs_is_best_effort() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(temp_dir.path());
        let runner = FakeRunner::new();
        runner.fail("setsebool");
        runner.fail("systemctl");

        configure_nfs(&Context::new(&config, &runner)).await.unwrap();
        assert_eq!(
            runner.command_lines(),
            vec![
                "setsebool -P virt_use_nfs 1",
                "systemctl start nfs-server",
                "systemctl enable nfs-server"
            ]
        );
    }

    #[tokio::test]
    async fn test_oversized_count_rejected_before_any_change() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_in(temp_dir.path());
        fs::create_dir_all(config.nfs_root.join("pv0")).unwrap();
        config.pv_count = u32::MAX;
        let runner = FakeRunner::new();

        let result = persistent_vol_setup(&Context::new(&config, &runner)).await;
        match result {
            Err(Error::InvalidConfig { key, .. }) => assert_eq!(key, "OPENSHIFT_PV_COUNT"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!config.nfs_root.join("pv1").exists());
        assert!(!config.exports_file.exists());
        assert!(runner.calls().is_empty());
    }
}
