pub mod conventions;
pub mod toml_config;

pub use conventions::{HostConventions, MarkerSet};
pub use toml_config::MirrorConfig;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "domain-mirror")]
#[command(about = "Build a validated metamodel of domain-modelling types")]
pub struct CliConfig {
    /// JSON 型別描述清單
    #[arg(long)]
    pub catalog: PathBuf,

    /// mirror.toml
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 要掃描的根命名空間，可重複
    #[arg(long = "root")]
    pub roots: Vec<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 設定檔 (若有) 加上命令列的 roots 與 logging 旗標
    pub fn load_config(&self) -> crate::utils::error::Result<MirrorConfig> {
        let mut config = match &self.config {
            Some(path) => MirrorConfig::from_file(path)?,
            None => MirrorConfig::default(),
        };
        config.merge_roots(&self.roots);
        config.logging.verbose |= self.verbose;
        config.logging.json |= self.log_json;
        Ok(config)
    }
}
