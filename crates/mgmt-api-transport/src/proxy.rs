// ============================================
// File: crates/mgmt-api-transport/src/proxy.rs
// ============================================
//! # Proxy Settings
//!
//! Parses the `user:password@host:port` proxy string. Only `host` is
//! mandatory; the password needs a user. Connections to the management
//! server are tunnelled through the proxy with HTTP `CONNECT`.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TransportError};

/// Outbound HTTP proxy used to reach the management server.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxySettings {
    /// Proxy host.
    pub host: String,
    /// Proxy port, scheme default when absent.
    pub port: Option<u16>,
    /// Proxy user.
    pub user: Option<String>,
    /// Proxy password.
    pub password: Option<String>,
}

impl ProxySettings {
    /// URL handed to the HTTP client.
    #[must_use]
    pub fn url(&self) -> String {
        match self.port {
            Some(port) => format!("http://{}:{port}", self.host),
            None => format!("http://{}", self.host),
        }
    }

    /// Builds the reqwest proxy for `https://` targets.
    ///
    /// # Errors
    /// Returns `InvalidProxy` if the host does not form a valid URL.
    pub fn to_reqwest(&self) -> Result<reqwest::Proxy> {
        let proxy = reqwest::Proxy::https(self.url())
            .map_err(|e| TransportError::invalid_proxy(e.to_string()))?;
        Ok(match &self.user {
            Some(user) => proxy.basic_auth(user, self.password.as_deref().unwrap_or_default()),
            None => proxy,
        })
    }
}

impl FromStr for ProxySettings {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (credentials, address) = match s.split('@').collect::<Vec<_>>().as_slice() {
            [address] => (None, *address),
            [credentials, address] => (Some(*credentials), *address),
            _ => return Err(TransportError::invalid_proxy("too many '@'")),
        };

        let (user, password) = match credentials.filter(|c| !c.is_empty()) {
            None => (None, None),
            Some(c) => match c.split(':').collect::<Vec<_>>().as_slice() {
                [user] => (Some((*user).to_owned()), None),
                [user, password] => (Some((*user).to_owned()), Some((*password).to_owned())),
                _ => return Err(TransportError::invalid_proxy("too many ':' in credentials")),
            },
        };

        let (host, port) = match address.split(':').collect::<Vec<_>>().as_slice() {
            [host] => (*host, None),
            [host, port] => {
                let port = port
                    .parse::<u16>()
                    .map_err(|e| TransportError::invalid_proxy(format!("port '{port}': {e}")))?;
                (*host, Some(port))
            }
            _ => return Err(TransportError::invalid_proxy("too many ':' in address")),
        };

        if host.is_empty() {
            return Err(TransportError::invalid_proxy("host is mandatory"));
        }

        Ok(Self {
            host: host.to_owned(),
            port,
            user,
            password,
        })
    }
}

impl fmt::Debug for ProxySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxySettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_setting() {
        let proxy: ProxySettings = "bob:secret@proxy.local:3128".parse().unwrap();
        assert_eq!(proxy.host, "proxy.local");
        assert_eq!(proxy.port, Some(3128));
        assert_eq!(proxy.user.as_deref(), Some("bob"));
        assert_eq!(proxy.password.as_deref(), Some("secret"));
        assert_eq!(proxy.url(), "http://proxy.local:3128");
        assert!(proxy.to_reqwest().is_ok());
    }

    #[test]
    fn test_host_only() {
        let proxy: ProxySettings = "proxy.local".parse().unwrap();
        assert_eq!(proxy.port, None);
        assert_eq!(proxy.user, None);
        assert_eq!(proxy.url(), "http://proxy.local");
    }

    #[test]
    fn test_user_without_password_and_empty_credentials() {
        let proxy: ProxySettings = "bob@proxy.local:8080".parse().unwrap();
        assert_eq!(proxy.user.as_deref(), Some("bob"));
        assert_eq!(proxy.password, None);

        let proxy: ProxySettings = "@proxy.local".parse().unwrap();
        assert_eq!(proxy.user, None);
    }

    #[test]
    fn test_invalid_settings() {
        for bad in ["a@b@c", "a:b:c@host", "host:1:2", "host:port", "user@", ""] {
            assert!(bad.parse::<ProxySettings>().is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn test_debug_hides_password() {
        let proxy: ProxySettings = "bob:secret@proxy.local".parse().unwrap();
        assert!(!format!("{proxy:?}").contains("secret"));
    }
}
