use std::path::PathBuf;

pub static DEFAULT_DATA_DIR: &str = "~/.sandbox-dl";
pub static CONFIG_FILE_NAME: &str = "config.yml";

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Configuration {
    /// Directory every download destination must resolve beneath.
    #[serde(rename = "sandboxRoot")]
    pub sandbox_root: String,
    /// Private directory holding the download history.
    #[serde(rename = "dataDir")]
    pub data_dir: String,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
    #[serde(rename = "connectTimeoutSecs")]
    pub connect_timeout_secs: u64,
    #[serde(rename = "readTimeoutSecs")]
    pub read_timeout_secs: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            sandbox_root: ".".to_string(),
            data_dir: DEFAULT_DATA_DIR.to_string(),
            user_agent: format!("sandbox-dl/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout_secs: 15,
            read_timeout_secs: 30,
        }
    }
}

impl Configuration {
    pub fn sandbox_root_path(&self) -> PathBuf {
        expand(&self.sandbox_root)
    }

    pub fn data_dir_path(&self) -> PathBuf {
        expand(&self.data_dir)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Reads the configuration at `path`, writing the defaults there first when
/// the file does not exist yet.
pub async fn load_or_init(path: &std::path::Path) -> anyhow::Result<Configuration> {
    use anyhow::Context;

    if tokio::fs::metadata(path).await.is_err() {
        let configuration = Configuration::default();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
        }
        let yaml = serde_yaml::to_string(&configuration)?;
        tokio::fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(configuration);
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let configuration: Configuration = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(configuration)
}

pub fn default_config_path() -> PathBuf {
    expand(DEFAULT_DATA_DIR).join(CONFIG_FILE_NAME)
}
