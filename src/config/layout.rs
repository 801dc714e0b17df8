use crate::config::ServiceConfig;

/// Remote filesystem layout of a deployed service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLayout {
    pub binary: String,
    pub unit_name: String,
    pub user: String,
    pub group: String,
    pub bin_dir: String,
    pub conf_dir: String,
    pub unit_path: String,
}

impl ServiceLayout {
    pub fn new(service: &ServiceConfig) -> Self {
        let root = join_remote(&service.data_dir, &service.binary);
        let unit_name = service.unit_name();

        Self {
            binary: service.binary.clone(),
            user: service.user().to_string(),
            group: service.group().to_string(),
            bin_dir: join_remote(&root, "bin"),
            conf_dir: join_remote(&root, "configs"),
            unit_path: join_remote(&service.unit_dir, &unit_name),
            unit_name,
        }
    }

    pub fn remote_binary(&self) -> String {
        join_remote(&self.bin_dir, &self.binary)
    }

    /// Directories provisioned before each deploy, in creation order.
    pub fn directories(&self) -> [&str; 2] {
        [self.bin_dir.as_str(), self.conf_dir.as_str()]
    }

    pub fn owner(&self) -> String {
        format!("{}:{}", self.user, self.group)
    }
}

/// Joins remote (always POSIX) path segments.
pub fn join_remote(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name.trim_start_matches('/'))
}
