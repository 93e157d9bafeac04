//! SalesDesk 账户服务
//!
//! 启动流程：
//! 1. 加载配置 (TOML + 环境变量 + 命令行)
//! 2. 构建身份存储、密码哈希器、会话密钥
//! 3. 注入用户管理器并启动 HTTP API
//!
//! 运行: cargo run --bin salesdesk-server -- --config config/salesdesk.toml

use anyhow::Context;
use std::sync::Arc;

use salesdesk::service::http::HttpServer;
use salesdesk::storage::open_store;
use salesdesk::user::{PasswordHasher, UserManager};
use salesdesk::utils::config::{AppConfig, DEFAULT_CONFIG_PATH};
use salesdesk::utils::jwt::SessionKeys;

/// 命令行参数
#[derive(Debug, Default)]
struct CliArgs {
    config_path: Option<String>,
    http_address: Option<String>,
    database_url: Option<String>,
    unknown: Vec<String>,
}

impl CliArgs {
    fn parse(args: &[String]) -> Self {
        let mut cli = CliArgs::default();
        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" | "-c" => cli.config_path = iter.next().cloned(),
                "--http" | "-h" => cli.http_address = iter.next().cloned(),
                "--database" | "-d" => cli.database_url = iter.next().cloned(),
                other => cli.unknown.push(other.to_string()),
            }
        }
        cli
    }
}

fn print_startup_banner(config: &AppConfig, bind_address: &str) {
    println!("\n╔═══════════════════════════════════════════════════════════════════════╗");
    println!("║                    SalesDesk Server Started                           ║");
    println!("╚═══════════════════════════════════════════════════════════════════════╝\n");

    println!("📡 Service Endpoints:");
    println!("   • Service:     {}", config.server.name);
    println!("   • HTTP API:    http://{}", bind_address);
    println!("   • Health:      http://{}/health", bind_address);
    println!("   • Environment: {}", config.server.environment);

    println!("\n📋 Available APIs:");
    println!("   ┌─────────────────────────────────────────────────────────────────┐");
    println!("   │ POST   /api/auth/register         - 注册                        │");
    println!("   │ POST   /api/auth/login            - 登录                        │");
    println!("   │ GET    /api/auth/me               - 当前用户                    │");
    println!("   └─────────────────────────────────────────────────────────────────┘");

    println!("\n💡 Quick Start:");
    println!("   curl -X POST http://{}/api/auth/register \\", bind_address);
    println!("        -H 'Content-Type: application/json' \\");
    println!("        -d '{{\"name\":\"Sam\",\"email\":\"sam@x.com\",\"password\":\"pw123456\"}}'");
    println!("\n🟢 Server is running. Press Ctrl+C to stop.\n");
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cli = CliArgs::parse(&args);

    // 1. 加载配置 (日志级别来自配置文件，先加载再初始化日志)
    let config_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let loaded = AppConfig::load_from_file(&config_path);
    let mut config = loaded.as_ref().cloned().unwrap_or_default();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter()))
        .init();

    match &loaded {
        Ok(_) => log::info!("Config loaded from {}", config_path),
        Err(e) => log::warn!("{}, using defaults", e),
    }
    for arg in &cli.unknown {
        log::warn!("Ignoring unknown argument: {}", arg);
    }

    config.apply_env();
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    if let Some(address) = cli.http_address {
        let (host, port) = address
            .rsplit_once(':')
            .context("--http expects <host>:<port>")?;
        config.http.host = host.to_string();
        config.http.port = port.parse().context("invalid port in --http")?;
    }
    config.validate().context("invalid configuration")?;

    log::info!("Configuration loaded for {}", config.server.name);
    log::info!("  Environment: {}", config.server.environment);
    log::info!("  bcrypt cost: {}", config.auth.bcrypt_cost);

    // 2. 构建依赖
    let store = open_store(&config.database.url).context("failed to open identity store")?;
    let hasher = PasswordHasher::new(config.auth.bcrypt_cost)?;
    let keys = SessionKeys::new(
        config.auth.session_secret.as_bytes(),
        config.auth.token_ttl_secs,
    );
    let user_mgr = Arc::new(UserManager::new(store, hasher, keys)?);
    log::info!("✅ User manager initialized");

    // 3. 启动 HTTP 服务
    let bind_address = config.http.bind_address();
    let server = HttpServer::new(user_mgr, bind_address.clone());
    print_startup_banner(&config, &bind_address);

    server.run().await?;
    Ok(())
}
