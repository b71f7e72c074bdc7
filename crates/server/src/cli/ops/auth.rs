use clap::Args;

use s3sftp_server::{ConfigError, S3SftpServer, ServerError};

#[derive(Args, Debug, Clone)]
pub struct Auth {
    #[arg(long)]
    pub user: String,

    #[arg(long)]
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("authentication rejected for user '{0}'")]
    Rejected(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Auth {
    type Error = AuthError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut server = S3SftpServer::new(ctx.config()?);
        let services = server.start()?;
        let accepted = services
            .authentication
            .authenticate(&self.user, &self.password, None)
            .await;
        server.stop()?;

        if accepted {
            Ok(format!("authentication accepted for user '{}'", self.user))
        } else {
            Err(AuthError::Rejected(self.user.clone()))
        }
    }
}
