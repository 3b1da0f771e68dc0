use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use async_trait::async_trait;
use data_encoding::BASE64;
use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Client, Method, Response, StatusCode, Url};
use tracing::{debug, Instrument, Span};
use crate::config::ApiConfig;
use crate::errors::MeisterError;
use super::digest::{cnonce, DigestChallenge};
use super::types::{BinariesResponse, Binary, StatusInfo, SubmissionAck};
use super::ScoringApi;

/// Staging layout the qualifier event writes binaries into.
const BINARIES_GLOB: &str = "qualifier_event/*/*";

/// Last digest challenge seen and how many times its nonce has been used.
struct DigestState {
    challenge: DigestChallenge,
    nonce_count: u32,
}

pub struct CgcClient {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
    binaries_path: PathBuf,
    digest: Mutex<Option<DigestState>>,
    span: Span,
}

impl CgcClient {
    pub fn new(config: &ApiConfig, binaries_path: impl Into<PathBuf>) -> Result<Self, MeisterError> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| MeisterError::Config(format!("Invalid API url '{}': {}", config.url, e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MeisterError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            username: config.user.clone(),
            password: config.password.clone(),
            binaries_path: binaries_path.into(),
            digest: Mutex::new(None),
            span: tracing::info_span!("cgc", component = "cgc_client"),
        })
    }

    pub fn binaries_path(&self) -> &Path {
        &self.binaries_path
    }

    fn url(&self, path: &str) -> Result<Url, MeisterError> {
        self.base_url
            .join(path)
            .map_err(|e| MeisterError::Config(format!("Invalid API path '{}': {}", path, e)))
    }

    /// Authorization header from the cached challenge, if any.
    fn cached_authorization(&self, method: &Method, uri: &str) -> Option<String> {
        let mut guard = self.digest.lock().ok()?;
        let state = guard.as_mut()?;
        state.nonce_count += 1;
        Some(state.challenge.authorization(
            &self.username,
            &self.password,
            method.as_str(),
            uri,
            state.nonce_count,
            &cnonce(),
        ))
    }

    /// Cache a fresh challenge and return the header for its first use.
    fn answer_challenge(&self, challenge: DigestChallenge, method: &Method, uri: &str) -> String {
        let header = challenge.authorization(
            &self.username,
            &self.password,
            method.as_str(),
            uri,
            1,
            &cnonce(),
        );
        if let Ok(mut guard) = self.digest.lock() {
            *guard = Some(DigestState { challenge, nonce_count: 1 });
        }
        header
    }

    async fn dispatch(
        &self,
        method: &Method,
        url: &Url,
        form: Option<&[(&str, String)]>,
        authorization: Option<String>,
    ) -> Result<Response, MeisterError> {
        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(form) = form {
            request = request.form(form);
        }
        if let Some(header) = authorization {
            request = request.header(AUTHORIZATION, header);
        }

        request.send().await.map_err(|e| {
            if e.is_timeout() {
                MeisterError::RemoteApiTimeout {
                    method: method.to_string(),
                    path: url.path().to_string(),
                }
            } else {
                MeisterError::Network(format!("{} {} failed: {}", method, url.path(), e))
            }
        })
    }

    /// Send a request, answering one digest challenge if the server issues it.
    async fn send(
        &self,
        method: Method,
        path: &str,
        form: Option<&[(&str, String)]>,
    ) -> Result<Response, MeisterError> {
        let url = self.url(path)?;
        let uri = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        let cached = self.cached_authorization(&method, &uri);
        let resp = self.dispatch(&method, &url, form, cached).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        let header = resp
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let challenge = match header {
            Some(header) => DigestChallenge::parse(&header)?,
            None => return Ok(resp),
        };
        debug!(realm = %challenge.realm, "Answering digest challenge");
        let header = self.answer_challenge(challenge, &method, &uri);
        self.dispatch(&method, &url, form, Some(header)).await
    }

    fn ensure_success(method: &Method, path: &str, resp: &Response) -> Result<(), MeisterError> {
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(MeisterError::remote_api(method.as_str(), path, resp.status().as_u16()))
        }
    }

    async fn read_binaries(&self, round: u64) -> Result<BinariesResponse, MeisterError> {
        // The round does not select a directory: the staging area only ever
        // holds the binaries of the current event.
        debug!(path = %self.binaries_path.display(), round, "Fetching binaries");

        let metadata = tokio::fs::metadata(&self.binaries_path)
            .await
            .map_err(|e| MeisterError::local_io(&self.binaries_path, e))?;
        if !metadata.is_dir() {
            return Err(MeisterError::local_io(
                &self.binaries_path,
                std::io::Error::new(std::io::ErrorKind::Other, "not a directory"),
            ));
        }

        let root = glob::Pattern::escape(&self.binaries_path.to_string_lossy());
        let pattern = format!("{}/{}", root.trim_end_matches('/'), BINARIES_GLOB);
        let options = glob::MatchOptions {
            require_literal_leading_dot: true,
            ..Default::default()
        };
        let entries = glob::glob_with(&pattern, options)
            .map_err(|e| MeisterError::Config(format!("Invalid binaries pattern '{}': {}", pattern, e)))?;

        let mut staged = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                MeisterError::local_io(path, std::io::Error::from(e))
            })?;
            if path.is_file() {
                staged.push(path);
            }
        }
        let binaries = encode_staged(staged).await?;

        let names: Vec<&str> = binaries.iter().map(|b| b.id.as_str()).collect();
        debug!(count = binaries.len(), binaries = %names.join(", "), "Binaries available");
        Ok(BinariesResponse { binaries })
    }
}

/// Read and base64-encode staged files, failing on the first unreadable one.
async fn encode_staged(paths: Vec<PathBuf>) -> Result<Vec<Binary>, MeisterError> {
    let mut binaries = Vec::with_capacity(paths.len());
    for path in paths {
        let id = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| MeisterError::local_io(&path, e))?;
        binaries.push(Binary { id, data: BASE64.encode(&bytes) });
    }
    Ok(binaries)
}

#[async_trait]
impl ScoringApi for CgcClient {
    async fn status(&self) -> Result<StatusInfo, MeisterError> {
        async {
            debug!("Fetching current game status");
            let resp = self.send(Method::GET, "/status", None).await?;
            Self::ensure_success(&Method::GET, "/status", &resp)?;
            resp.json::<StatusInfo>()
                .await
                .map_err(|e| MeisterError::Network(format!("Invalid status response: {}", e)))
        }
        .instrument(self.span.clone())
        .await
    }

    async fn binaries(&self, round: u64) -> Result<BinariesResponse, MeisterError> {
        self.read_binaries(round).instrument(self.span.clone()).await
    }

    async fn submit(
        &self,
        cs_id: &str,
        team: &str,
        round: u64,
        blob: &[u8],
    ) -> Result<SubmissionAck, MeisterError> {
        async {
            debug!(cs_id, team, round, size = blob.len(), "Submitting POV");
            let form = [
                ("csid", cs_id.to_string()),
                ("team", team.to_string()),
                ("round", round.to_string()),
                ("pov", BASE64.encode(blob)),
            ];
            let resp = self.send(Method::POST, "/pov", Some(&form[..])).await?;
            Self::ensure_success(&Method::POST, "/pov", &resp)?;

            let status_code = resp.status().as_u16();
            let body = resp.text().await.map_err(|e| {
                if e.is_timeout() {
                    MeisterError::RemoteApiTimeout { method: "POST".into(), path: "/pov".into() }
                } else {
                    MeisterError::Network(format!("Failed to read submission response: {}", e))
                }
            })?;
            Ok(SubmissionAck { status_code, body })
        }
        .instrument(self.span.clone())
        .await
    }
}

impl std::fmt::Debug for CgcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CgcClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("binaries_path", &self.binaries_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use crate::cgc::digest::{md5_hex, split_params};

    fn config(url: &str) -> ApiConfig {
        ApiConfig {
            url: url.to_string(),
            user: "shellphish".to_string(),
            password: "hunter22".to_string(),
            timeout_secs: 5,
        }
    }

    fn local_client(root: &Path) -> CgcClient {
        CgcClient::new(&config("http://localhost/"), root).unwrap()
    }

    #[test]
    fn test_debug_redacts_password() {
        let client = local_client(Path::new("/tmp"));
        let dbg = format!("{:?}", client);
        assert!(dbg.contains("[REDACTED]"));
        assert!(!dbg.contains("hunter22"));
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let err = CgcClient::new(&config("not a url"), "/tmp").unwrap_err();
        assert!(matches!(err, MeisterError::Config(_)));
    }

    #[tokio::test]
    async fn test_binaries_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let round_dir = dir.path().join("qualifier_event").join("r1");
        fs::create_dir_all(&round_dir).unwrap();
        fs::write(round_dir.join("cb_1"), b"ABC").unwrap();
        fs::write(round_dir.join("cb_2"), b"XY").unwrap();

        let client = local_client(dir.path());
        let mut result = client.binaries(1).await.unwrap().binaries;
        result.sort_by(|a, b| a.id.cmp(&b.id));

        assert_eq!(result, vec![
            Binary { id: "cb_1".into(), data: "QUJD".into() },
            Binary { id: "cb_2".into(), data: "WFk=".into() },
        ]);
    }

    #[tokio::test]
    async fn test_binaries_ignore_round_value() {
        let dir = tempfile::tempdir().unwrap();
        let round_dir = dir.path().join("qualifier_event").join("r1");
        fs::create_dir_all(&round_dir).unwrap();
        fs::write(round_dir.join("cb_1"), b"\x7fCGC").unwrap();

        let client = local_client(dir.path());
        let first = client.binaries(1).await.unwrap();
        let later = client.binaries(42).await.unwrap();
        assert_eq!(first, later);
        assert_eq!(first.binaries[0].data, BASE64.encode(b"\x7fCGC"));
    }

    #[tokio::test]
    async fn test_binaries_skip_files_outside_pattern_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let event = dir.path().join("qualifier_event");
        fs::create_dir_all(event.join("r1").join("nested")).unwrap();
        fs::write(event.join("stray"), b"top level").unwrap();
        fs::write(event.join("r1").join("cb_1"), b"A").unwrap();

        let client = local_client(dir.path());
        let result = client.binaries(1).await.unwrap().binaries;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "cb_1");
    }

    #[tokio::test]
    async fn test_binaries_skip_hidden_entries() {
        let dir = tempfile::tempdir().unwrap();
        let event = dir.path().join("qualifier_event");
        fs::create_dir_all(event.join("r1")).unwrap();
        fs::create_dir_all(event.join(".partial")).unwrap();
        fs::write(event.join("r1").join("cb_1"), b"A").unwrap();
        fs::write(event.join("r1").join(".cb_1.swp"), b"swap").unwrap();
        fs::write(event.join(".partial").join("cb_9"), b"half").unwrap();

        let client = local_client(dir.path());
        let ids: Vec<String> = client.binaries(1).await.unwrap()
            .binaries.into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec!["cb_1".to_string()]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_binaries_skip_dangling_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let round_dir = dir.path().join("qualifier_event").join("r1");
        fs::create_dir_all(&round_dir).unwrap();
        fs::write(round_dir.join("cb_1"), b"A").unwrap();
        std::os::unix::fs::symlink(round_dir.join("gone"), round_dir.join("cb_2")).unwrap();

        let client = local_client(dir.path());
        let result = client.binaries(1).await.unwrap().binaries;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "cb_1");
    }

    #[tokio::test]
    async fn test_unreadable_staged_file_fails_whole_read() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("cb_1");
        let vanished = dir.path().join("cb_2");
        fs::write(&good, b"A").unwrap();

        let err = encode_staged(vec![good, vanished.clone()]).await.unwrap_err();
        match err {
            MeisterError::LocalIo { path, .. } => assert_eq!(path, vanished),
            other => panic!("expected LocalIo, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_binaries_empty_staging_area() {
        let dir = tempfile::tempdir().unwrap();
        let client = local_client(dir.path());
        assert!(client.binaries(1).await.unwrap().binaries.is_empty());
    }

    #[tokio::test]
    async fn test_binaries_missing_root_is_local_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = local_client(&dir.path().join("does-not-exist"));
        let err = client.binaries(1).await.unwrap_err();
        assert!(matches!(err, MeisterError::LocalIo { .. }));
    }

    /// Minimal HTTP server that demands digest auth and checks the response hash.
    async fn spawn_digest_server(
        user: &'static str,
        password: &'static str,
    ) -> (String, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let challenges = Arc::new(AtomicUsize::new(0));
        let accepted = Arc::new(AtomicUsize::new(0));
        let (c, a) = (challenges.clone(), accepted.clone());

        tokio::spawn(async move {
            loop {
                let (mut stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                let request = String::from_utf8_lossy(&buf).to_string();
                let mut lines = request.lines();
                let request_line = lines.next().unwrap_or_default().to_string();
                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or_default().to_string();
                let uri = parts.next().unwrap_or_default().to_string();
                let authorization = lines
                    .filter_map(|l| l.split_once(':'))
                    .find(|(k, _)| k.trim().eq_ignore_ascii_case("authorization"))
                    .map(|(_, v)| v.trim().to_string());

                let valid = authorization
                    .and_then(|h| h.strip_prefix("Digest ").map(str::to_string))
                    .map(|params| {
                        let params: std::collections::HashMap<String, String> =
                            split_params(&params).into_iter().collect();
                        let ha1 = md5_hex(&format!("{}:cgc:{}", user, password));
                        let ha2 = md5_hex(&format!("{}:{}", method, uri));
                        let expected = md5_hex(&format!(
                            "{}:n0nce:{}:{}:auth:{}",
                            ha1, params["nc"], params["cnonce"], ha2
                        ));
                        params.get("username").map(String::as_str) == Some(user)
                            && params.get("uri") == Some(&uri)
                            && params.get("response") == Some(&expected)
                    })
                    .unwrap_or(false);

                let response = if valid {
                    a.fetch_add(1, Ordering::SeqCst);
                    let body = r#"{"round": 3, "scores": []}"#;
                    format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    )
                } else {
                    c.fetch_add(1, Ordering::SeqCst);
                    "HTTP/1.1 401 Unauthorized\r\nwww-authenticate: Digest realm=\"cgc\", nonce=\"n0nce\", qop=\"auth\"\r\ncontent-length: 0\r\nconnection: close\r\n\r\n".to_string()
                };
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (format!("http://{}", addr), challenges, accepted)
    }

    #[tokio::test]
    async fn test_status_answers_digest_challenge() {
        let (url, challenges, accepted) = spawn_digest_server("shellphish", "hunter22").await;

        let client = CgcClient::new(&config(&url), "/tmp").unwrap();
        let status = client.status().await.unwrap();

        assert_eq!(status.round, Some(3));
        assert_eq!(challenges.load(Ordering::SeqCst), 1);
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_challenge_is_sent_preemptively() {
        let (url, challenges, accepted) = spawn_digest_server("shellphish", "hunter22").await;

        let client = CgcClient::new(&config(&url), "/tmp").unwrap();
        client.status().await.unwrap();
        client.status().await.unwrap();

        assert_eq!(challenges.load(Ordering::SeqCst), 1);
        assert_eq!(accepted.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_wrong_password_is_remote_api_error() {
        let (url, _, accepted) = spawn_digest_server("shellphish", "other-password").await;

        let client = CgcClient::new(&config(&url), "/tmp").unwrap();
        let err = client.status().await.unwrap_err();

        assert!(matches!(err, MeisterError::RemoteApi { status_code: 401, .. }));
        assert_eq!(accepted.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_status_non_success_is_remote_api_error() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/status");
            then.status(500);
        }).await;

        let client = CgcClient::new(&config(&server.base_url()), "/tmp").unwrap();
        let err = client.status().await.unwrap_err();
        match err {
            MeisterError::RemoteApi { method, path, status_code } => {
                assert_eq!(method, "GET");
                assert_eq!(path, "/status");
                assert_eq!(status_code, 500);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_credentials_surface_as_401() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/status");
            then.status(401)
                .header("www-authenticate", "Digest realm=\"cgc\", nonce=\"n0nce\"");
        }).await;

        let client = CgcClient::new(&config(&server.base_url()), "/tmp").unwrap();
        let err = client.status().await.unwrap_err();
        assert!(matches!(err, MeisterError::RemoteApi { status_code: 401, .. }));
    }

    #[tokio::test]
    async fn test_submit_posts_form_fields() {
        let server = MockServer::start_async().await;
        let submit = server.mock_async(|when, then| {
            when.method(POST)
                .path("/pov")
                .x_www_form_urlencoded_tuple("csid", "CADET_00001")
                .x_www_form_urlencoded_tuple("team", "ppp")
                .x_www_form_urlencoded_tuple("round", "4")
                .x_www_form_urlencoded_tuple("pov", "UE9W");
            then.status(200).body("accepted");
        }).await;

        let client = CgcClient::new(&config(&server.base_url()), "/tmp").unwrap();
        let ack = client.submit("CADET_00001", "ppp", 4, b"POV").await.unwrap();

        submit.assert_async().await;
        assert_eq!(ack.status_code, 200);
        assert_eq!(ack.body, "accepted");
    }

    #[tokio::test]
    async fn test_submit_rejection_is_skippable() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(POST).path("/pov");
            then.status(503);
        }).await;

        let client = CgcClient::new(&config(&server.base_url()), "/tmp").unwrap();
        let err = client.submit("cs", "ppp", 1, b"x").await.unwrap_err();
        assert!(matches!(err, MeisterError::RemoteApi { status_code: 503, .. }));
        assert!(err.is_skippable());
    }

    #[tokio::test]
    async fn test_slow_submit_times_out() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(POST).path("/pov");
            then.status(200).delay(Duration::from_secs(3));
        }).await;

        let mut cfg = config(&server.base_url());
        cfg.timeout_secs = 1;
        let client = CgcClient::new(&cfg, "/tmp").unwrap();
        let err = client.submit("cs", "ppp", 1, b"x").await.unwrap_err();
        assert!(matches!(err, MeisterError::RemoteApiTimeout { .. }));
    }
}
