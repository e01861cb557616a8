use tracing_subscriber::EnvFilter;

use adserve::{cli, config};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 配置加载一次，之后通过 get_config 全局读取
    config::init_config();

    if let Err(e) = cli::run().await {
        eprintln!("{}", e.format_simple());
        std::process::exit(1);
    }
}
