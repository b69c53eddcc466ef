use crate::command::Runner;
use crate::config::Config;
use crate::state::MarkerStore;

/// Everything a provisioning step needs: settings, a way to run commands, and step state.
pub struct Context<'a> {
    pub config: &'a Config,
    pub runner: &'a dyn Runner,
    pub markers: MarkerStore,
}

impl<'a> Context<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn Runner) -> Self {
        Context {
            config,
            runner,
            markers: MarkerStore::new(&config.origin_dir),
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::path::Path;
    use std::time::Duration;

    use crate::config::Config;

    /// A configuration rooted entirely below `root`, with no poll delay and no chown.
    pub fn config_in(root: &Path) -> Config {
        let mut config = Config::with_origin_dir(root.join("origin"));
        config.subdomain = "10.1.2.2.xip.io".into();
        config.bin_dir = root.join("bin");
        config.template_root = root.join("templates");
        config.os_release = root.join("os-release");
        config.docker_certs_dir = root.join("certs.d");
        config.nfs_root = root.join("nfsvolumes");
        config.nfs_owner = None;
        config.exports_file = root.join("exports");
        config.poll_interval = Duration::ZERO;
        config
    }
}
