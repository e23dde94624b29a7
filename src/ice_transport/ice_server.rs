use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

const SCHEME_STUN: &str = "stun";
const SCHEME_STUNS: &str = "stuns";
const SCHEME_TURN: &str = "turn";
const SCHEME_TURNS: &str = "turns";

/// ICEServer describes a single STUN and TURN server that the media engine
/// may use to discover candidates.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RTCIceServer {
    pub urls: Vec<String>,
    pub username: String,
    pub credential: String,
}

impl RTCIceServer {
    pub fn new(url: impl Into<String>) -> Self {
        RTCIceServer {
            urls: vec![url.into()],
            ..Default::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.urls()?;
        Ok(())
    }

    /// urls parses every configured URL, rejecting unknown schemes and TURN
    /// servers without credentials.
    pub(crate) fn urls(&self) -> Result<Vec<Url>> {
        let mut urls = vec![];

        for raw_url in &self.urls {
            // stun URLs carry no query per RFC 7064, drop it before parsing
            let url_str = if raw_url.starts_with(SCHEME_STUN) {
                raw_url.split('?').next().unwrap_or_default()
            } else {
                raw_url.as_str()
            };

            let url =
                Url::parse(url_str).map_err(|_| Error::ErrInvalidIceServerUrl(raw_url.clone()))?;
            if url.path().is_empty() && url.host_str().is_none() {
                return Err(Error::ErrInvalidIceServerUrl(raw_url.clone()));
            }

            match url.scheme() {
                SCHEME_STUN | SCHEME_STUNS => {}
                SCHEME_TURN | SCHEME_TURNS => {
                    match (self.username.is_empty(), self.credential.is_empty()) {
                        (true, true) => return Err(Error::ErrNoTurnCredentials),
                        (false, false) => {}
                        _ => return Err(Error::ErrTurnCredentials),
                    }
                }
                _ => return Err(Error::ErrInvalidIceServerUrl(raw_url.clone())),
            }

            urls.push(url);
        }

        Ok(urls)
    }
}
