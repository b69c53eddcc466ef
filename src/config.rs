use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::Error;

const DEFAULT_ORIGIN_DIR: &str = "/var/lib/openshift";
const MASTER_CONFIG_SUBDIR: &str = "openshift.local.config/master";

/// Settings for both provisioning drivers, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Holds the step marker files.
    pub origin_dir: PathBuf,
    /// Master configuration: admin kubeconfig and the cluster CA.
    pub openshift_dir: PathBuf,
    pub subdomain: String,
    pub api_url: String,
    pub container_name: String,
    pub bin_dir: PathBuf,
    pub template_root: PathBuf,
    pub os_release: PathBuf,
    pub docker_certs_dir: PathBuf,
    pub nfs_root: PathBuf,
    /// Owner (user and group of the same name) of the exported directories.
    /// `None` leaves ownership untouched.
    pub nfs_owner: Option<String>,
    pub exports_file: PathBuf,
    pub pv_count: u32,
    pub pv_capacity_gib: u32,
    pub poll_retries: u32,
    pub poll_interval: Duration,
    pub login_user: String,
}

impl Default for Config {
    fn default() -> Self {
        Config::with_origin_dir(PathBuf::from(DEFAULT_ORIGIN_DIR))
    }
}

impl Config {
    pub fn with_origin_dir(origin_dir: PathBuf) -> Self {
        Config {
            openshift_dir: origin_dir.join(MASTER_CONFIG_SUBDIR),
            origin_dir,
            subdomain: String::new(),
            api_url: "https://127.0.0.1:8443".into(),
            container_name: "openshift".into(),
            bin_dir: PathBuf::from("/usr/bin"),
            template_root: PathBuf::from("/opt/adb/openshift/templates"),
            os_release: PathBuf::from("/etc/os-release"),
            docker_certs_dir: PathBuf::from("/etc/docker/certs.d"),
            nfs_root: PathBuf::from("/nfsvolumes"),
            nfs_owner: Some("nfsnobody".into()),
            exports_file: PathBuf::from("/etc/exports"),
            pv_count: 3,
            pv_capacity_gib: 1,
            poll_retries: 10,
            poll_interval: Duration::from_secs(1),
            login_user: "vagrant".into(),
        }
    }

    pub fn from_env() -> Result<Self, Error> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from defaults overridden by whatever `lookup` returns.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("OPENSHIFT_ORIGIN_DIR") {
            Some(dir) => Config::with_origin_dir(PathBuf::from(dir)),
            None => Config::default(),
        };

        if let Some(subdomain) = lookup("OPENSHIFT_SUBDOMAIN") {
            config.subdomain = subdomain.trim().to_string();
        }
        if let Some(url) = lookup("OPENSHIFT_API_URL") {
            config.api_url = url;
        }
        if let Some(dir) = lookup("OPENSHIFT_TEMPLATE_DIR") {
            config.template_root = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("OPENSHIFT_NFS_ROOT") {
            config.nfs_root = PathBuf::from(dir);
        }
        if let Some(count) = lookup("OPENSHIFT_PV_COUNT") {
            config.pv_count = parse("OPENSHIFT_PV_COUNT", &count)?;
        }
        if let Some(capacity) = lookup("OPENSHIFT_PV_CAPACITY") {
            config.pv_capacity_gib = parse("OPENSHIFT_PV_CAPACITY", &capacity)?;
        }
        Ok(config)
    }

    pub fn kubeconfig(&self) -> PathBuf {
        self.openshift_dir.join("admin.kubeconfig")
    }

    pub fn master_file(&self, name: &str) -> PathBuf {
        self.openshift_dir.join(name)
    }

    pub fn health_url(&self) -> String {
        format!("{}/healthz/ready", self.api_url)
    }

    pub fn registry_hostname(&self) -> String {
        format!("hub.openshift.{}", self.subdomain)
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, Error> {
    value.trim().parse().map_err(|_| Error::InvalidConfig {
        key: key.into(),
        value: value.into(),
    })
}
