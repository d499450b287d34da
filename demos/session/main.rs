use std::net::IpAddr;
use std::sync::Arc;

use clap::Parser;
use demos::SessionDriver;
use gecko_xdmcp::client::{XdmcpClient, XDMCP_PORT};
use gecko_xdmcp::config::Config;
use gecko_xdmcp::error::Error;
use log::{error, info};
use tokio::{select, sync::mpsc, time};

/// XDMCP 会话协商示例
#[derive(Parser)]
#[clap(author, version, about)]
struct Args {
    /// 配置文件路径
    #[clap(short, long, default_value = "./session.toml")]
    config: String,
    /// 覆盖配置中的主机名
    #[clap(long)]
    host: Option<String>,
    /// 覆盖配置中的端口
    #[clap(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let _logger = flexi_logger::Logger::try_with_env_or_str("debug")
        .unwrap()
        .start()
        .unwrap();

    let args = Args::parse();
    run(args).await.unwrap()
}

async fn run(args: Args) -> Result<(), Error> {
    // 获取配置
    let cfg = Config::from_path(&args.config).await?;
    let host = args.host.unwrap_or(cfg.client.host);
    let port = args.port.or(cfg.client.port).unwrap_or(XDMCP_PORT);
    let display_number = cfg.client.display_number;
    let display_class = cfg
        .client
        .display_class
        .unwrap_or_else(|| "MIT-unspecified".to_string());

    // 启动客户端
    let mut client = XdmcpClient::new();
    client.set_hostname(&host);
    client.set_port(port);
    client.start().await?;
    let client = Arc::new(client);

    // display manager 回连地址取连接的本地地址
    let addresses: Vec<IpAddr> = client
        .local_addr()
        .map(|addr| addr.ip())
        .into_iter()
        .collect();

    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
    let driver = Arc::new(SessionDriver::new(
        client.clone(),
        display_number,
        display_class,
        addresses,
        shutdown_tx,
    ));

    // 发起查询，后续协商由回调接力完成
    client
        .send_query(&["MIT-MAGIC-COOKIE-1".to_string()])
        .await?;

    // keep-alive 循环
    let keep_alive_client = client.clone();
    let keep_alive_driver = driver.clone();
    tokio::spawn(async move {
        let mut interval = time::interval(time::Duration::from_secs(30));
        loop {
            interval.tick().await;
            if let Some(session_id) = keep_alive_driver.session_id().await {
                if let Err(e) = keep_alive_client
                    .send_keep_alive(display_number, session_id)
                    .await
                {
                    error!("keep-alive failed: {}", e);
                    return;
                }
            }
        }
    });

    // 主事件循环，会话终结信号到来后退出
    select! {
        result = client.event_loop(driver) => result?,
        _ = shutdown_rx.recv() => info!("session over, exiting"),
    }
    Ok(())
}
