use clap::Args;

use common::build_info;
use common::version::BuildInfo;

#[derive(Args, Debug, Clone)]
pub struct Version {
    /// Print the build metadata as TOML
    #[arg(long)]
    pub toml: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("Could not render build info: {0}")]
    Render(#[from] toml::ser::Error),
}

fn report(info: &BuildInfo) -> String {
    [
        format!("s3sftp {}", info.version),
        format!("  profile:  {}", info.build_profile),
        format!("  features: {}", info.build_features),
        format!("  built:    {}", info.build_timestamp),
    ]
    .join("\n")
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Version {
    type Error = VersionError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let info = build_info!();
        if self.toml {
            return Ok(toml::to_string(&info)?);
        }
        Ok(report(&info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> BuildInfo {
        BuildInfo {
            build_profile: "release",
            build_features: "default",
            build_timestamp: "1700000000",
            version: "0.1.0",
        }
    }

    #[test]
    fn test_report() {
        assert_eq!(
            report(&info()),
            "s3sftp 0.1.0\n  profile:  release\n  features: default\n  built:    1700000000"
        );
    }

    #[test]
    fn test_toml_output() {
        let rendered = toml::to_string(&info()).unwrap();
        assert!(rendered.contains("version = \"0.1.0\""));
        assert!(rendered.contains("build_profile = \"release\""));
    }
}
