// CLI modules
mod cli;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Auth, Check, Ls, Resolve, Serve, Stat, Version};

command_enum! {
    (Auth, Auth),
    (Check, Check),
    (Ls, Ls),
    (Resolve, Resolve),
    (Serve, Serve),
    (Stat, Stat),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let ctx = cli::op::OpContext::new(args.config_path, args.log_level);

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
