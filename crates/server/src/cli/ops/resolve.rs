use clap::Args;

use s3sftp_server::S3SftpServer;

use super::SessionOpError;

#[derive(Args, Debug, Clone)]
pub struct Resolve {
    /// User whose view of the bucket to use
    #[arg(long)]
    pub user: String,

    /// Path as a client would send it
    pub path: String,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Resolve {
    type Error = SessionOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut server = S3SftpServer::new(ctx.config()?);
        let services = server.start()?;
        let subsystem = services.open_session(&self.user, None).await?;

        let resolved = subsystem.resolve_file(&self.path)?;
        let exists = resolved.exists().await?;
        let output = format!(
            "{} -> {} ({})",
            self.path,
            resolved.path(),
            if exists { "exists" } else { "missing" }
        );

        drop(subsystem);
        server.stop()?;
        Ok(output)
    }
}
