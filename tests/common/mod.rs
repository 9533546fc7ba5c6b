//! Local HTTPS server signed by a throwaway CA, plus a client pinned to it.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use rcgen::{
    BasicConstraints, CertificateParams, DnType, IsCa, Issuer, KeyPair, KeyUsagePurpose, SanType,
};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use serde_json::{Value, json};
use tempfile::TempDir;

use pinned_fetch_lib::paths::{KEYSTORE_DIR, RESOURCES_DIR};
use pinned_fetch_lib::{CertificateAgentFactory, PinnedHttpClient, TrustAnchorConfig};

/// CA certificate (PEM) and the issuer able to sign leaves with it.
pub struct TestCa {
    pub pem: String,
    issuer: Issuer<'static, KeyPair>,
}

impl TestCa {
    pub fn new(common_name: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name.push(DnType::CommonName, common_name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        let cert = params.self_signed(&key).unwrap();
        Self {
            pem: cert.pem(),
            issuer: Issuer::new(params, key),
        }
    }

    /// Leaf for 127.0.0.1 / localhost as (cert chain, private key).
    fn server_identity(&self) -> (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>) {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec!["localhost".to_string()]).unwrap();
        params.distinguished_name.push(DnType::CommonName, "localhost");
        params
            .subject_alt_names
            .push(SanType::IpAddress("127.0.0.1".parse().unwrap()));
        params.extended_key_usages = vec![rcgen::ExtendedKeyUsagePurpose::ServerAuth];
        let leaf = params.signed_by(&key, &self.issuer).unwrap();

        let chain = vec![leaf.der().clone()];
        let key = PrivateKeyDer::from_pem_slice(key.serialize_pem().as_bytes()).unwrap();
        (chain, key)
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub ca: TestCa,
    handle: Handle,
    dir: TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        let ca = TestCa::new("pinned-fetch test CA");
        let (chain, key) = ca.server_identity();

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let mut server_config = rustls::ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(chain, key)
            .unwrap();
        server_config.alpn_protocols = vec![b"http/1.1".to_vec()];
        let tls = RustlsConfig::from_config(Arc::new(server_config));

        let handle = Handle::new();
        let server = axum_server::bind_rustls(SocketAddr::from(([127, 0, 0, 1], 0)), tls)
            .handle(handle.clone());
        tokio::spawn(async move {
            let _ = server.serve(routes().into_make_service()).await;
        });
        let addr = handle.listening().await.unwrap();

        Self {
            addr,
            ca,
            handle,
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("https://127.0.0.1:{}{path}", self.addr.port())
    }

    /// Write the server's CA to a bundle file and return its path.
    pub fn write_bundle(&self, file_name: &str) -> PathBuf {
        let path = self.dir.path().join(file_name);
        std::fs::write(&path, &self.ca.pem).unwrap();
        path
    }

    /// Client trusting only this server's CA.
    pub fn pinned_client(&self) -> PinnedHttpClient {
        client_for_bundle(self.write_bundle("pinned.pem"))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.shutdown();
    }
}

pub fn client_for_bundle(path: PathBuf) -> PinnedHttpClient {
    let config = TrustAnchorConfig {
        resources_dir: RESOURCES_DIR.to_string(),
        keystore_dir: KEYSTORE_DIR.to_string(),
        certificate_file: path,
    };
    let context = CertificateAgentFactory::build_context(&config).unwrap();
    PinnedHttpClient::new(context).unwrap()
}

pub const SLOW_DELAY: Duration = Duration::from_secs(3);

fn routes() -> Router {
    Router::new()
        .route("/json", get(json_document))
        .route("/html", get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<p>hello</p>") }))
        .route(
            "/plain",
            get(|| async { ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], "plain text") }),
        )
        .route(
            "/bad-json",
            get(|| async { ([(header::CONTENT_TYPE, "application/json")], "{not json") }),
        )
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "nope") }))
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, [(header::CONTENT_TYPE, "application/json")], "{}") }),
        )
        .route(
            "/fishing",
            get(|| async { with_reason(StatusCode::SERVICE_UNAVAILABLE, b"Gone Fishing") }),
        )
        .route(
            "/closed",
            get(|| async { with_reason(StatusCode::from_u16(499).unwrap(), b"Client Closed Request") }),
        )
        .route("/moved", get(|| async { Redirect::permanent("/json") }))
        .route("/echo", post(echo))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(SLOW_DELAY).await;
                "late"
            }),
        )
}

/// Response whose status line carries `reason` instead of the standard phrase.
fn with_reason(status: StatusCode, reason: &'static [u8]) -> Response {
    let mut response = (status, "see status line").into_response();
    response
        .extensions_mut()
        .insert(hyper::ext::ReasonPhrase::from_static(reason));
    response
}

async fn json_document() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        r#"{"zeta":1,"alpha":{"b":2,"a":[true,null]}}"#,
    )
}

async fn echo(headers: HeaderMap, body: String) -> axum::Json<Value> {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let parsed: Value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap_or(Value::String(body.clone()))
    };
    axum::Json(json!({
        "content_type": header_value(header::CONTENT_TYPE),
        "user_agent": header_value(header::USER_AGENT),
        "accept": header_value(header::ACCEPT),
        "body": parsed,
    }))
}
