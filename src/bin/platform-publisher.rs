//! Platform Publisher CLI
//!
//! Multi-platform article publishing assistant

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use platform_publisher::{
    api, BatchPublishRequest, ConfigLoadOptions, ConfigLoader, DriverKind,
    PlatformPublisher, PublishError, PublishOptions, PublisherConfig, ServerConfig, SimulationConfig,
    CONFIG_FILENAME,
};
use std::path::PathBuf;
use std::process;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Multi-platform article publishing assistant
#[derive(Parser)]
#[command(name = "platform-publisher")]
#[command(version = "0.1.0")]
#[command(about = "Multi-platform article publishing assistant", long_about = None)]
struct Cli {
    /// Directory holding .publisher-config.yaml (defaults to current directory)
    #[arg(long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,

    /// Automation driver
    #[arg(long, global = true, value_enum)]
    driver: Option<DriverArg>,

    /// Report simulated results when no browser session can be opened
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum DriverArg {
    Webdriver,
    Memory,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP control surface
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Publish an article to one or more platforms
    Publish {
        /// Comma-separated platform identifiers (e.g. csdn,juejin)
        #[arg(short, long, value_delimiter = ',', required = true)]
        targets: Vec<String>,

        /// Article title
        #[arg(long, default_value = "")]
        title: String,

        /// Markdown file to publish
        #[arg(short, long, conflicts_with = "content")]
        file: Option<PathBuf>,

        /// Inline content
        #[arg(short, long)]
        content: Option<String>,

        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Article summary
        #[arg(long)]
        summary: Option<String>,
    },

    /// Log in to a platform interactively and save the session
    Login {
        /// Platform identifier
        target: String,
    },

    /// Show login status of one platform or all of them
    Status {
        /// Platform identifier
        target: Option<String>,
    },

    /// List supported platforms
    Platforms,

    /// Write a default .publisher-config.yaml
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Initialize tracing to stderr so stdout stays readable
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "platform_publisher=info,tower_http=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    match run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{:#}", e);
            if let Some(error) = e.downcast_ref::<PublishError>() {
                for action in error.suggested_actions() {
                    eprintln!("  - {}", action);
                }
            }
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let Cli {
        project,
        driver,
        simulate,
        command,
    } = Cli::parse();
    let project = project.unwrap_or_else(|| PathBuf::from("."));
    let flags = Flags { driver, simulate };

    match command {
        Commands::Init { force } => init_command(project, force).await,
        Commands::Serve { host, port } => {
            serve_command(load_config(project, flags).await?, host, port).await
        }
        Commands::Publish {
            targets,
            title,
            file,
            content,
            tags,
            summary,
        } => {
            let content = match (file, content) {
                (Some(path), _) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, Some(content)) => content,
                (None, None) => anyhow::bail!("--file 或 --content 必须指定其一"),
            };
            let options = PublishOptions {
                tags: tags.into_iter().collect(),
                summary,
                ..PublishOptions::default()
            };
            let config = load_config(project, flags).await?;
            publish_command(config, targets, title, content, options).await
        }
        Commands::Login { target } => login_command(load_config(project, flags).await?, target).await,
        Commands::Status { target } => status_command(load_config(project, flags).await?, target).await,
        Commands::Platforms => status_command(load_config(project, flags).await?, None).await,
    }
}

/// Global flags layered over the configuration files
struct Flags {
    driver: Option<DriverArg>,
    simulate: bool,
}

async fn load_config(project: PathBuf, flags: Flags) -> Result<PublisherConfig> {
    let mut options = ConfigLoadOptions::from_env(project);
    if flags.simulate {
        options.cli_args = Some(PublisherConfig {
            simulation: Some(SimulationConfig { enabled: true }),
            ..PublisherConfig::default()
        });
    }

    let mut config = ConfigLoader::load(options).await?;

    // Only the kind is overridden; endpoint and browser stay as configured
    if let Some(driver) = flags.driver {
        let mut section = config.driver();
        section.kind = match driver {
            DriverArg::Webdriver => DriverKind::Webdriver,
            DriverArg::Memory => DriverKind::Memory,
        };
        config.driver = Some(section);
    }

    Ok(config)
}

async fn serve_command(config: PublisherConfig, host: Option<String>, port: Option<u16>) -> Result<i32> {
    let defaults = config.server();
    let server = ServerConfig {
        host: host.unwrap_or(defaults.host),
        port: port.unwrap_or(defaults.port),
    };

    let publisher = PlatformPublisher::from_config(&config);
    let app = api::create_router(publisher.clone());

    let address = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;

    tracing::info!(
        "platform-publisher listening on http://{} (platforms: {})",
        address,
        publisher.registry().targets().join(", ")
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    publisher.shutdown().await;
    Ok(0)
}

async fn publish_command(
    config: PublisherConfig,
    targets: Vec<String>,
    title: String,
    content: String,
    options: PublishOptions,
) -> Result<i32> {
    println!("\n📝 platform-publisher\n");

    let publisher = PlatformPublisher::from_config(&config);
    let request = BatchPublishRequest {
        content,
        title,
        targets,
        options,
    };

    let result = publisher.publish_to_multiple(request).await;
    publisher.shutdown().await;
    let result = result?;

    for (target, outcome) in &result.results {
        let marker = if outcome.is_simulated() {
            "🧪"
        } else if outcome.is_success() {
            "✅"
        } else {
            "❌"
        };
        match outcome.url() {
            Some(url) => println!("{} {}: {} ({})", marker, target, outcome.message(), url),
            None => println!("{} {}: {}", marker, target, outcome.message()),
        }
    }

    println!(
        "\n成功 {} / 失败 {} / 模拟 {} ({}ms)",
        result.success_count, result.failure_count, result.simulated_count, result.duration
    );

    Ok(if result.failure_count == 0 { 0 } else { 1 })
}

async fn login_command(config: PublisherConfig, target: String) -> Result<i32> {
    let publisher = PlatformPublisher::from_config(&config);

    let login_url = publisher.open_login(&target).await?;
    println!("\n🔑 请在浏览器中完成 {} 登录: {}", target, login_url);
    println!("登录完成后按回车键继续...");

    let mut line = String::new();
    BufReader::new(io::stdin()).read_line(&mut line).await?;

    let confirmed = publisher.confirm_login(&target).await;
    publisher.shutdown().await;
    confirmed?;

    println!("✅ 登录状态已保存");
    Ok(0)
}

async fn status_command(config: PublisherConfig, target: Option<String>) -> Result<i32> {
    let publisher = PlatformPublisher::from_config(&config);

    let statuses = match target {
        Some(target) => vec![publisher.status(&target).await?],
        None => publisher.platforms().await,
    };

    for status in statuses {
        println!(
            "{:<10} {:<8} {}",
            status.target,
            status.display_name,
            if status.logged_in { "已登录" } else { "未登录" }
        );
    }
    Ok(0)
}

async fn init_command(project: PathBuf, force: bool) -> Result<i32> {
    let path = project.join(CONFIG_FILENAME);
    if tokio::fs::metadata(&path).await.is_ok() && !force {
        eprintln!("⚠️  {} already exists (use --force to overwrite)", path.display());
        return Ok(1);
    }

    let yaml = serde_yaml::to_string(&PublisherConfig::default())?;
    tokio::fs::write(&path, yaml)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("✅ Created {}", path.display());
    Ok(0)
}
