use clap::Args;

use s3sftp_server::S3SftpServer;

use super::SessionOpError;

#[derive(Args, Debug, Clone)]
pub struct Check;

#[async_trait::async_trait]
impl crate::cli::op::Op for Check {
    type Error = SessionOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = ctx.config()?;
        let storage_uri = config.storage.uri()?;
        let mut lines = Vec::new();

        lines.push("Config:".to_string());
        lines.push(format!("  bucket:    {}", config.bucket));
        lines.push(format!("  home:      '{}'", config.home.as_str()));
        lines.push(format!("  jail:      '{}'", config.jail.as_str()));
        lines.push(format!("  port:      {}", config.port));
        lines.push(format!("  users:     {}", config.users.len()));

        let mut server = S3SftpServer::new(config);
        let services = server.start()?;

        lines.push(String::new());
        lines.push("Host key:".to_string());
        lines.push(format!("  algorithm: {}", services.host_key.algorithm()));
        lines.push(format!("  file:      {}", services.host_key.path().display()));

        lines.push(String::new());
        lines.push("Storage:".to_string());
        lines.push(format!("  uri:       {}", storage_uri));

        server.stop()?;
        Ok(lines.join("\n"))
    }
}
