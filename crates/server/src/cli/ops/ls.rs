use clap::Args;

use common::attributes::{self, AttributeMap};
use s3sftp_server::S3SftpServer;

use super::SessionOpError;

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// User whose view of the bucket to list
    #[arg(long)]
    pub user: String,

    /// Directory to list (defaults to the user's home)
    #[arg(default_value = ".")]
    pub path: String,
}

/// `drw-rw----        0 name`
fn format_entry(name: &str, attrs: &AttributeMap) -> String {
    let is_dir = attrs
        .get(attributes::IS_DIRECTORY)
        .and_then(|value| value.as_bool())
        .unwrap_or(false);
    let permissions = attrs
        .get(attributes::PERMISSIONS)
        .map(|value| value.to_string())
        .unwrap_or_else(|| "---------".to_string());
    let size = attrs
        .get(attributes::SIZE)
        .and_then(|value| value.as_size())
        .unwrap_or(0);
    format!(
        "{}{} {:>10} {}",
        if is_dir { 'd' } else { '-' },
        permissions,
        size,
        name
    )
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = SessionOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut server = S3SftpServer::new(ctx.config()?);
        let services = server.start()?;
        let subsystem = services.open_session(&self.user, None).await?;

        let entries = subsystem.list(&self.path).await?;
        let output = if entries.is_empty() {
            "No items found".to_string()
        } else {
            entries
                .iter()
                .map(|entry| format_entry(&entry.name, &entry.attributes))
                .collect::<Vec<_>>()
                .join("\n")
        };

        drop(subsystem);
        server.stop()?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use common::attributes::{AttributeValue, PosixPermissions};

    use super::*;

    #[test]
    fn test_format_entry() {
        let mut file = AttributeMap::new();
        file.insert(attributes::SIZE.to_string(), AttributeValue::Size(42));
        file.insert(
            attributes::PERMISSIONS.to_string(),
            AttributeValue::Permissions(PosixPermissions::owner_group_read_write()),
        );
        assert_eq!(
            format_entry("notes.txt", &file),
            "-rw-rw----         42 notes.txt"
        );

        let mut dir = AttributeMap::new();
        dir.insert(attributes::IS_DIRECTORY.to_string(), AttributeValue::Bool(true));
        assert_eq!(format_entry("docs", &dir), "d---------          0 docs");
    }
}
