use crate::{client, config};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Client error: {0}")]
    Client(#[from] client::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::Error),
}
