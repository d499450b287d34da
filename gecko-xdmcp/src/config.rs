use tokio::{
    fs,
    io::{self, AsyncReadExt},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O: {0}")]
    IO(#[from] io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// 客户端配置
#[derive(Debug, serde::Deserialize)]
pub struct Config {
    pub client: Client,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Client {
    /// display manager 主机名
    pub host: String,
    /// display manager 端口，缺省使用协议约定端口 177
    #[serde(default)]
    pub port: Option<u16>,
    /// 请求的 display 编号
    pub display_number: u16,
    /// display 类别标识
    #[serde(default)]
    pub display_class: Option<String>,
}

impl Config {
    pub async fn from_path(path: &str) -> Result<Self, Error> {
        let mut file = fs::File::open(path).await?;
        let mut s = String::new();
        file.read_to_string(&mut s).await?;

        Ok(toml::from_str::<Config>(&s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parsing_works() {
        let cfg = toml::from_str::<Config>(
            r#"
            [client]
            host = "dm.example.com"
            display_number = 1
            "#,
        )
        .unwrap();

        assert_eq!(cfg.client.host, "dm.example.com");
        assert_eq!(cfg.client.port, None);
        assert_eq!(cfg.client.display_number, 1);
        assert_eq!(cfg.client.display_class, None);
    }
}
