use askama::Template;

#[derive(Template)]
#[template(path = "persistent_volume.yaml", escape = "none")]
pub struct PersistentVolumeTemplate {
    pub name: String,
    pub capacity_gib: u32,
    pub server: String,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;

    #[test]
    fn test_render_persistent_volume() {
        let rendered = PersistentVolumeTemplate {
            name: "pv4".into(),
            capacity_gib: 2,
            server: "localhost".into(),
            path: "/nfsvolumes/pv4".into(),
        }
        .render()
        .unwrap();

        let pv: Value = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(pv["kind"], "PersistentVolume");
        assert_eq!(pv["metadata"]["name"], "pv4");
        assert_eq!(pv["spec"]["capacity"]["storage"], "2Gi");
        assert_eq!(pv["spec"]["accessModes"][1], "ReadWriteMany");
        assert_eq!(pv["spec"]["persistentVolumeReclaimPolicy"], "Recycle");
        assert_eq!(pv["spec"]["nfs"]["server"], "localhost");
        assert_eq!(pv["spec"]["nfs"]["path"], "/nfsvolumes/pv4");
    }
}
