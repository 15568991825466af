use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use log::{info, warn};

use crate::error::{Error, Result};

// openvpn prints this once the tunnel is actually routing traffic
const READY_MARKER: &str = "Initialization Sequence Completed";

#[derive(Debug, Clone)]
pub struct TunnelConfig {
    pub config_path: PathBuf,
    pub username: String,
    pub password: String,
}

/// A running openvpn process. Outbound requests made while the handle is
/// alive go through the tunnel; dropping the handle tears it down and
/// removes the credentials file.
pub struct Tunnel {
    child: Child,
    auth_path: PathBuf,
}

impl Tunnel {
    pub fn acquire(config: &TunnelConfig) -> Result<Self> {
        let auth_path =
            std::env::temp_dir().join(format!("prospect-vpn-auth-{}", std::process::id()));
        fs::write(
            &auth_path,
            format!("{}\n{}\n", config.username, config.password),
        )?;

        let spawned = Command::new("openvpn")
            .arg("--config")
            .arg(&config.config_path)
            .arg("--auth-user-pass")
            .arg(&auth_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                let _ = fs::remove_file(&auth_path);
                return Err(Error::Tunnel(format!("could not launch openvpn: {e}")));
            }
        };

        info!("waiting for the tunnel handshake");
        let ready = child
            .stdout
            .take()
            .map(|out| {
                BufReader::new(out)
                    .lines()
                    .map_while(|line| line.ok())
                    .any(|line| line.contains(READY_MARKER))
            })
            .unwrap_or(false);

        if !ready {
            let _ = child.kill();
            let _ = child.wait();
            let _ = fs::remove_file(&auth_path);
            return Err(Error::Tunnel(
                "openvpn exited before finishing its handshake".to_string(),
            ));
        }

        info!("tunnel is up");
        Ok(Self { child, auth_path })
    }
}

impl Drop for Tunnel {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            warn!("could not stop the tunnel process: {e}");
        }
        let _ = self.child.wait();
        let _ = fs::remove_file(&self.auth_path);
    }
}
