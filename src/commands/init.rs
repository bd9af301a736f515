use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the synclife home directory, writes the initial configuration and
/// moves the secret files into place.
pub async fn init(
    home: &Path,
    store_url: &str,
    service_key: &Path,
    gemini_key: &Path,
) -> Result<Out<()>> {
    let config = Config::create(home, service_key, gemini_key, store_url).await?;
    Ok(Out::new_message(format!(
        "Initialized synclife home at '{}'",
        config.root().display()
    )))
}
