use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::command::oc;
use crate::context::Context;
use crate::errors::Error;
use crate::state::Step;

const SHARED_NAMESPACE: &str = "openshift";

/// Platform flavours recognised in the OS release file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Variants {
    pub cdk: bool,
    pub adb: bool,
}

impl Variants {
    pub fn detect(os_release: &str) -> Self {
        Variants {
            cdk: os_release.contains("cdk"),
            adb: os_release.contains("adb"),
        }
    }

    pub fn is_unknown(&self) -> bool {
        !self.cdk && !self.adb
    }
}

/// All regular files below `dir`, sorted by path. A missing directory yields nothing.
fn file_list(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "template directory missing");
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        // Symlinked files are imported; symlinked directories are not descended into
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if is_file {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

pub fn collect_templates(root: &Path, variants: Variants) -> Result<Vec<PathBuf>, Error> {
    let mut templates = file_list(&root.join("common"))?;
    if variants.cdk {
        templates.extend(file_list(&root.join("cdk"))?);
    }
    if variants.adb {
        templates.extend(file_list(&root.join("adb"))?);
    }
    Ok(templates)
}

pub async fn create_sample_templates(ctx: &Context<'_>) -> Result<(), Error> {
    if ctx.markers.is_done(Step::Templates) {
        debug!("Templates already imported");
        return Ok(());
    }
    info!("Creating example templates");

    let variants = Variants::detect(&fs::read_to_string(&ctx.config.os_release)?);
    if variants.is_unknown() {
        warn!("Unknown variant ID");
    }

    for template in collect_templates(&ctx.config.template_root, variants)? {
        info!("Import template {}", template.display());
        ctx.runner
            .execute(
                &oc(ctx.config)
                    .arg("create")
                    .arg("-f")
                    .path_arg(&template)
                    .args(["-n", SHARED_NAMESPACE])
                    .or_abort("Failed to create templates"),
            )
            .await?;
    }

    ctx.markers.mark_done(Step::Templates)
}
