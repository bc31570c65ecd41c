use std::path::PathBuf;
use std::sync::Arc;

use notice::Notifier;
use notice::Result;
use notice::config::SetupOptions;
use notice::error::Error as NoticeError;
use notice::page::memory::MemoryPage;
use notice::platform::NotificationPlatform;
use notice::platform::memory::MemoryPlatform;
use notice::system::{Alert, Delivery, PermissionHooks};
use notice::telemetry::init_tracing;
use tokio::signal;
use tokio::time::sleep;
use tracing::{info, warn};

use super::cli::Cli;

const DEFAULT_CONFIG: &str = "notice.toml";

pub async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.log_filter.as_deref(), cli.json_logs)?;

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let options = SetupOptions::from_env_and_file(&config_path)?;

    let page = MemoryPage::new();
    let notifier = Notifier::builder(Arc::new(page.clone()), platform(&cli))
        .options(options)
        .hooks(
            PermissionHooks::new()
                .on_granted(|| info!("notifications allowed"))
                .on_denied(|| warn!("notifications blocked")),
        )
        .build();

    if cli.system {
        let mut alert = Alert::new(cli.severity, cli.message.as_str()).temp(cli.temp);
        if let Some(title) = &cli.title {
            alert = alert.title(title.as_str());
        }
        if let Some(icon) = &cli.icon {
            alert = alert.icon(icon.as_str());
        }
        match notifier.system().dispatch(alert).await {
            Delivery::Native => info!(severity = %cli.severity, "system notification delivered"),
            Delivery::OnPage(handle) => {
                info!(element = %handle.element(), "system notification shown on page");
            }
        }
    } else {
        let handle = notifier.show(cli.severity, &cli.message, cli.temp);
        info!(element = %handle.element(), severity = %cli.severity, "message shown");
    }

    if let Some(linger) = cli.linger {
        tokio::select! {
            _ = signal::ctrl_c() => info!("shutdown signal received"),
            () = sleep(linger) => {}
        }
    }

    if cli.dump {
        let json = serde_json::to_string_pretty(&page.snapshot()).map_err(NoticeError::from)?;
        println!("{json}");
    }

    Ok(())
}

fn platform(cli: &Cli) -> Arc<dyn NotificationPlatform> {
    #[cfg(all(feature = "desktop", target_os = "linux"))]
    if cli.desktop {
        return Arc::new(notice::platform::desktop::DesktopPlatform::default());
    }

    Arc::new(
        MemoryPlatform::new()
            .with_permission(cli.permission)
            .answering(cli.answer),
    )
}
