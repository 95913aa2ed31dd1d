//! Connection URL derivation.
//!
//! The client serves from some origin and talks to the draft service on the
//! same host at a fixed port. Secure origins get a secure socket.

use url::Url;

use crate::error::EndpointError;

/// Port the draft service listens on.
pub const DEFAULT_PORT: u16 = 8000;
/// Socket path on the draft service.
pub const DEFAULT_PATH: &str = "/api/v1/ws/drafts";
/// Identity used when none is configured.
pub const DEFAULT_USER_ID: &str = "default_user";

/// Where to reach the draft service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    origin: Url,
    port: u16,
    path: String,
    user_id: String,
}

impl Endpoint {
    /// Endpoint for an origin, with the default port, path and user.
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
        }
    }

    /// Parse an origin such as `https://review.example.com`.
    ///
    /// # Errors
    /// Returns `InvalidUrl` if `origin` is not a URL.
    pub fn parse(origin: &str) -> Result<Self, EndpointError> {
        Ok(Self::new(Url::parse(origin)?))
    }

    /// Override the service port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Override the socket path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Override the user identity.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Origin the client was served from.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Service port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// User identity sent in the query string.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Socket URL: `ws` for `http` origins, `wss` for `https` ones.
    ///
    /// # Errors
    /// - `UnsupportedScheme` for any other origin scheme
    /// - `MissingHost` if the origin has no host
    pub fn url(&self) -> Result<Url, EndpointError> {
        let scheme = match self.origin.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
        };
        let host = self.origin.host_str().ok_or(EndpointError::MissingHost)?;
        let path = self.path.trim_start_matches('/');

        let mut url = Url::parse(&format!("{scheme}://{host}:{}/{path}", self.port))?;
        url.query_pairs_mut().append_pair("user_id", &self.user_id);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_origin_uses_wss() {
        let endpoint = Endpoint::parse("https://review.example.com/inbox").unwrap();
        assert_eq!(
            endpoint.url().unwrap().as_str(),
            "wss://review.example.com:8000/api/v1/ws/drafts?user_id=default_user"
        );
    }

    #[test]
    fn http_origin_uses_ws() {
        let endpoint = Endpoint::parse("http://localhost:3000").unwrap();
        assert_eq!(
            endpoint.url().unwrap().as_str(),
            "ws://localhost:8000/api/v1/ws/drafts?user_id=default_user"
        );
    }

    #[test]
    fn overrides_apply() {
        let endpoint = Endpoint::parse("http://127.0.0.1")
            .unwrap()
            .with_port(9001)
            .with_path("drafts")
            .with_user_id("alice smith");
        assert_eq!(endpoint.url().unwrap().as_str(), "ws://127.0.0.1:9001/drafts?user_id=alice+smith");
    }

    #[test]
    fn other_schemes_rejected() {
        let endpoint = Endpoint::parse("file:///tmp/index.html").unwrap();
        assert_eq!(endpoint.url(), Err(EndpointError::UnsupportedScheme("file".into())));
    }

    #[test]
    fn garbage_origin_rejected() {
        assert!(matches!(Endpoint::parse("not a url"), Err(EndpointError::InvalidUrl(_))));
    }
}
