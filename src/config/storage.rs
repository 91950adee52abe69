use std::env;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub root_dir: String,
    /// URL prefix the stored objects are served under.
    pub public_path: String,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let root_dir = env::var("STORAGE_DIR").unwrap_or_else(|_| "./storage".to_string());
        let public_path = env::var("STORAGE_PUBLIC_PATH").unwrap_or_else(|_| "/media".to_string());
        Self {
            root_dir,
            public_path: format!("/{}", public_path.trim_matches('/')),
        }
    }
}
