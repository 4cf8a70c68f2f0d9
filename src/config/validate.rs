// src/config/validate.rs

use crate::config::model::{Config, RawConfigFile};
use crate::errors::{Result, TbuildError};
use crate::types::{DEFAULT_PORT, MAX_UDP_PAYLOAD};

impl TryFrom<RawConfigFile> for Config {
    type Error = TbuildError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_build(&raw)?;
        validate_paths(&raw)?;
        validate_datagram(&raw)?;
        let listen = resolve_listen_addr(&raw.listen)?;
        Ok(Config::new_unchecked(raw, listen))
    }
}

fn validate_build(cfg: &RawConfigFile) -> Result<()> {
    match cfg.build.first() {
        None => Err(TbuildError::Config(
            "`build` must contain at least the program name".to_string(),
        )),
        Some(program) if program.trim().is_empty() => Err(TbuildError::Config(
            "`build` program name must not be empty".to_string(),
        )),
        Some(_) => Ok(()),
    }
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    if cfg.artifact_path.as_os_str().is_empty() || cfg.stable_path.as_os_str().is_empty() {
        return Err(TbuildError::Config(
            "`artifact_path` and `stable_path` must not be empty".to_string(),
        ));
    }
    if cfg.artifact_path == cfg.stable_path {
        return Err(TbuildError::Config(format!(
            "`artifact_path` and `stable_path` must differ (both are {:?})",
            cfg.artifact_path
        )));
    }
    Ok(())
}

fn validate_datagram(cfg: &RawConfigFile) -> Result<()> {
    if cfg.max_datagram == 0 || cfg.max_datagram > MAX_UDP_PAYLOAD {
        return Err(TbuildError::Config(format!(
            "`max_datagram` must be within 1..={MAX_UDP_PAYLOAD} (got {})",
            cfg.max_datagram
        )));
    }
    Ok(())
}

/// Turn a possibly partial `host:port` into a bindable address.
///
/// - empty host → `0.0.0.0`
/// - empty or missing port → [`DEFAULT_PORT`]
/// - bracketed IPv6 hosts (`[::1]:9000`) stay bracketed
pub fn resolve_listen_addr(listen: &str) -> Result<String> {
    let listen = listen.trim();

    let (host, port) = if let Some(rest) = listen.strip_prefix('[') {
        let (host, after) = rest.split_once(']').ok_or_else(|| {
            TbuildError::Config(format!("unterminated IPv6 host in listen address {listen:?}"))
        })?;
        let port = match after {
            "" => "",
            p => p.strip_prefix(':').ok_or_else(|| {
                TbuildError::Config(format!("unexpected text after host in {listen:?}"))
            })?,
        };
        (format!("[{host}]"), port)
    } else {
        match listen.rsplit_once(':') {
            Some((host, port)) => (host.to_string(), port),
            None => (listen.to_string(), ""),
        }
    };

    let host = if host.is_empty() || host == "[]" {
        "0.0.0.0".to_string()
    } else {
        host
    };

    let port = if port.is_empty() {
        DEFAULT_PORT
    } else {
        port.parse::<u16>().map_err(|e| {
            TbuildError::Config(format!("invalid port {port:?} in listen address: {e}"))
        })?
    };

    Ok(format!("{host}:{port}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_defaults_fill_missing_parts() {
        assert_eq!(resolve_listen_addr("").unwrap(), "0.0.0.0:7373");
        assert_eq!(resolve_listen_addr(":9000").unwrap(), "0.0.0.0:9000");
        assert_eq!(resolve_listen_addr("127.0.0.1:").unwrap(), "127.0.0.1:7373");
        assert_eq!(resolve_listen_addr("localhost").unwrap(), "localhost:7373");
        assert_eq!(resolve_listen_addr("[::1]:81").unwrap(), "[::1]:81");
        assert_eq!(resolve_listen_addr("[::1]").unwrap(), "[::1]:7373");
    }

    #[test]
    fn listen_rejects_bad_port() {
        assert!(matches!(
            resolve_listen_addr(":notaport"),
            Err(TbuildError::Config(_))
        ));
        assert!(resolve_listen_addr(":70000").is_err());
    }

    #[test]
    fn empty_build_is_rejected() {
        let raw = RawConfigFile {
            build: vec![],
            ..RawConfigFile::default()
        };
        assert!(matches!(Config::try_from(raw), Err(TbuildError::Config(_))));
    }

    #[test]
    fn artifact_and_stable_must_differ() {
        let raw = RawConfigFile {
            stable_path: ".built".into(),
            ..RawConfigFile::default()
        };
        let err = Config::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn datagram_bound_is_checked() {
        let raw = RawConfigFile {
            max_datagram: 0,
            ..RawConfigFile::default()
        };
        assert!(Config::try_from(raw).is_err());
    }

    #[test]
    fn defaults_validate() {
        let cfg = Config::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.build, vec!["go", "build"]);
    }
}
