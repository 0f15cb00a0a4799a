pub mod api;
pub mod error;
pub mod relay;

use crate::cli::Args;
use crate::llm::chat::ChatClient;
use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use log::info;

pub use api::{ build_router, AppState };

pub struct Server {
    addr: String,
    client: Arc<dyn ChatClient>,
    args: Args,
}

impl Server {
    pub fn new(addr: String, client: Arc<dyn ChatClient>, args: Args) -> Self {
        Self { addr, client, args }
    }

    pub fn index_path(&self) -> PathBuf {
        PathBuf::from(&self.args.static_dir).join(&self.args.index_file)
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let state = AppState::new(self.client.clone(), self.index_path());
        let app = build_router(state);

        match self.tls_paths()? {
            Some((cert_path, key_path)) => {
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    cert_path,
                    key_path
                );
                let tls_config = axum_server::tls_rustls::RustlsConfig
                    ::from_pem_file(cert_path, key_path).await?;

                info!("Starting HTTPS server on: https://{}", addr);
                axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
            }
            None => {
                let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                    format!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e)
                })?;
                info!("Starting HTTP server on: http://{}", addr);
                axum::serve(listener, app.into_make_service()).await?;
            }
        }

        Ok(())
    }

    fn tls_paths(&self) -> Result<Option<(&str, &str)>, Box<dyn Error + Send + Sync>> {
        if !self.args.enable_tls {
            info!("TLS not enabled. Running plain HTTP server.");
            return Ok(None);
        }
        match (&self.args.tls_cert_path, &self.args.tls_key_path) {
            (Some(cert_path), Some(key_path)) => Ok(Some((cert_path.as_str(), key_path.as_str()))),
            (Some(_), None) | (None, Some(_)) => {
                Err("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.".into())
            }
            (None, None) => Err("--enable-tls was set but no certificate/key paths provided.".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ chat::new_client, LlmConfig };
    use clap::Parser;

    fn server_with(extra: &[&str]) -> Server {
        let mut argv = vec!["llm-relay"];
        argv.extend_from_slice(extra);
        let args = Args::try_parse_from(argv).unwrap();
        let client = new_client(&LlmConfig::default()).unwrap();
        Server::new(args.server_addr.clone(), client, args)
    }

    #[test]
    fn test_index_path_joins_static_dir() {
        let server = server_with(&["--static-dir", "public", "--index-file", "app.html"]);
        assert_eq!(server.index_path(), PathBuf::from("public").join("app.html"));
    }

    #[test]
    fn test_tls_requires_both_paths() {
        let server = server_with(&["--enable-tls", "--tls-cert-path", "cert.pem"]);
        assert!(server.tls_paths().is_err());

        let server = server_with(&["--enable-tls"]);
        assert!(server.tls_paths().is_err());

        let server = server_with(
            &["--enable-tls", "--tls-cert-path", "cert.pem", "--tls-key-path", "key.pem"]
        );
        assert_eq!(server.tls_paths().unwrap(), Some(("cert.pem", "key.pem")));
    }

    #[test]
    fn test_plain_http_without_tls_flag() {
        let server = server_with(&[]);
        assert_eq!(server.tls_paths().unwrap(), None);
    }
}
