use std::error::Error;
use std::path::PathBuf;

use s3sftp_server::{ConfigError, ServerConfig};

#[derive(Clone, Debug)]
pub struct OpContext {
    /// Optional custom config path (defaults to ~/.s3sftp/config.toml)
    pub config_path: Option<PathBuf>,
    /// Log level overriding the configured one
    pub log_level: Option<String>,
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>, log_level: Option<String>) -> Self {
        Self {
            config_path,
            log_level,
        }
    }

    /// Load the configuration, applying command line overrides
    pub fn config(&self) -> Result<ServerConfig, ConfigError> {
        let mut config = ServerConfig::load(self.config_path.clone())?;
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
            config.validate()?;
        }
        Ok(config)
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
