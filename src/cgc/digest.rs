//! HTTP digest access authentication (RFC 2617, MD5).

use md5::{Digest, Md5};
use crate::errors::MeisterError;

/// Parameters from a `WWW-Authenticate: Digest ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub qop: Option<String>,
    pub opaque: Option<String>,
    pub algorithm: Option<String>,
}

impl DigestChallenge {
    /// Parse a `WWW-Authenticate` header value.
    pub fn parse(header: &str) -> Result<Self, MeisterError> {
        let header = header.trim();
        let params = match header.split_once(char::is_whitespace) {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("digest") => rest,
            _ => {
                return Err(MeisterError::Network(format!(
                    "Unsupported authentication challenge: {}",
                    header
                )))
            }
        };

        let mut realm = None;
        let mut nonce = None;
        let mut qop = None;
        let mut opaque = None;
        let mut algorithm = None;

        for (key, value) in split_params(params) {
            match key.to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value),
                "nonce" => nonce = Some(value),
                "qop" => qop = Some(value),
                "opaque" => opaque = Some(value),
                "algorithm" => algorithm = Some(value),
                _ => {}
            }
        }

        if let Some(alg) = &algorithm {
            if !alg.eq_ignore_ascii_case("md5") {
                return Err(MeisterError::Network(format!("Unsupported digest algorithm: {}", alg)));
            }
        }

        Ok(Self {
            realm: realm.ok_or_else(|| MeisterError::Network("Digest challenge without realm".into()))?,
            nonce: nonce.ok_or_else(|| MeisterError::Network("Digest challenge without nonce".into()))?,
            qop,
            opaque,
            algorithm,
        })
    }

    /// Whether the server offered `qop=auth`.
    fn supports_auth_qop(&self) -> bool {
        self.qop
            .as_deref()
            .map(|q| q.split(',').any(|v| v.trim().eq_ignore_ascii_case("auth")))
            .unwrap_or(false)
    }

    /// Build the `Authorization` header value for one request.
    pub fn authorization(
        &self,
        username: &str,
        password: &str,
        method: &str,
        uri: &str,
        nc: u32,
        cnonce: &str,
    ) -> String {
        let ha1 = md5_hex(&format!("{}:{}:{}", username, self.realm, password));
        let ha2 = md5_hex(&format!("{}:{}", method, uri));

        let mut header = format!(
            "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\"",
            username, self.realm, self.nonce, uri
        );

        if self.supports_auth_qop() {
            let nc = format!("{:08x}", nc);
            let response = md5_hex(&format!("{}:{}:{}:{}:auth:{}", ha1, self.nonce, nc, cnonce, ha2));
            header.push_str(&format!(
                ", qop=auth, nc={}, cnonce=\"{}\", response=\"{}\"",
                nc, cnonce, response
            ));
        } else {
            let response = md5_hex(&format!("{}:{}:{}", ha1, self.nonce, ha2));
            header.push_str(&format!(", response=\"{}\"", response));
        }

        if let Some(opaque) = &self.opaque {
            header.push_str(&format!(", opaque=\"{}\"", opaque));
        }
        if let Some(algorithm) = &self.algorithm {
            header.push_str(&format!(", algorithm={}", algorithm));
        }
        header
    }
}

/// Fresh client nonce for a `qop=auth` response.
pub fn cnonce() -> String {
    hex::encode(rand::random::<[u8; 8]>())
}

pub(crate) fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Split `k1="v1", k2=v2` into pairs, honoring commas inside quotes.
pub(crate) fn split_params(input: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' {
                break;
            }
            key.push(c);
            chars.next();
        }
        if chars.next().is_none() {
            break;
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    _ => value.push(c),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                value.push(c);
                chars.next();
            }
        }

        pairs.push((key.trim().to_string(), value.trim().to_string()));
    }

    pairs
}
