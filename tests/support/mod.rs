// Shared fixtures: a throwaway PKI and a local HTTPS server that requires
// client certificates.
#![allow(dead_code)]

use base64::{engine::general_purpose, Engine as _};
use openssl::{
    asn1::Asn1Time,
    bn::BigNum,
    hash::MessageDigest,
    pkey::{PKey, Private},
    rsa::Rsa,
    ssl::{SslAcceptor, SslMethod, SslVerifyMode},
    x509::{
        extension::{
            AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage,
            SubjectAlternativeName, SubjectKeyIdentifier,
        },
        X509Builder, X509NameBuilder, X509,
    },
};
use std::{
    collections::HashMap,
    io::{Read, Write},
    net::TcpListener,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

pub struct CertAuthority {
    pub cert: X509,
    pub key: PKey<Private>,
}

pub struct LeafCert {
    pub cert: X509,
    pub key: PKey<Private>,
}

impl LeafCert {
    pub fn cert_pem(&self) -> Vec<u8> {
        self.cert.to_pem().unwrap()
    }

    /// Traditional "BEGIN RSA PRIVATE KEY" form, as kubeadm writes it.
    pub fn key_pem(&self) -> Vec<u8> {
        self.key.rsa().unwrap().private_key_to_pem().unwrap()
    }
}

fn new_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

fn serial(n: u32) -> openssl::asn1::Asn1Integer {
    BigNum::from_u32(n).unwrap().to_asn1_integer().unwrap()
}

impl CertAuthority {
    pub fn new(common_name: &str) -> Self {
        let key = new_key();
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("CN", common_name).unwrap();
        let name = name.build();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        builder.set_serial_number(&serial(1)).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(30).unwrap())
            .unwrap();
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .critical()
                    .key_cert_sign()
                    .crl_sign()
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let ski = SubjectKeyIdentifier::new()
            .build(&builder.x509v3_context(None, None))
            .unwrap();
        builder.append_extension(ski).unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();

        Self {
            cert: builder.build(),
            key,
        }
    }

    pub fn cert_pem(&self) -> Vec<u8> {
        self.cert.to_pem().unwrap()
    }

    pub fn server_cert(&self) -> LeafCert {
        self.issue("localhost", 2, true)
    }

    pub fn client_cert(&self, user: &str) -> LeafCert {
        self.issue(user, 3, false)
    }

    fn issue(&self, common_name: &str, serial_no: u32, server: bool) -> LeafCert {
        let key = new_key();
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("CN", common_name).unwrap();
        let name = name.build();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        builder.set_serial_number(&serial(serial_no)).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(self.cert.subject_name()).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(30).unwrap())
            .unwrap();
        builder
            .append_extension(BasicConstraints::new().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .critical()
                    .digital_signature()
                    .key_encipherment()
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let usage = if server {
            ExtendedKeyUsage::new().server_auth().build().unwrap()
        } else {
            ExtendedKeyUsage::new().client_auth().build().unwrap()
        };
        builder.append_extension(usage).unwrap();

        let aki = AuthorityKeyIdentifier::new()
            .keyid(false)
            .build(&builder.x509v3_context(Some(&self.cert), None))
            .unwrap();
        builder.append_extension(aki).unwrap();

        if server {
            let san = SubjectAlternativeName::new()
                .dns("localhost")
                .ip("127.0.0.1")
                .build(&builder.x509v3_context(Some(&self.cert), None))
                .unwrap();
            builder.append_extension(san).unwrap();
        }

        builder.sign(&self.key, MessageDigest::sha256()).unwrap();
        LeafCert {
            cert: builder.build(),
            key,
        }
    }
}

pub fn b64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Kubeconfig text, assembled entry by entry.
pub struct KubeConfigBuilder {
    clusters: Vec<String>,
    users: Vec<String>,
    contexts: Vec<String>,
}

impl KubeConfigBuilder {
    pub fn new() -> Self {
        Self {
            clusters: Vec::new(),
            users: Vec::new(),
            contexts: Vec::new(),
        }
    }

    pub fn cluster(mut self, name: &str, server: &str, ca_data: &str) -> Self {
        self.clusters.push(format!(
            "- name: {name}\n  cluster:\n    server: {server}\n    certificate-authority-data: {ca_data}\n"
        ));
        self
    }

    pub fn user(mut self, name: &str, cert_data: &str, key_data: &str) -> Self {
        self.users.push(format!(
            "- name: {name}\n  user:\n    client-certificate-data: {cert_data}\n    client-key-data: {key_data}\n"
        ));
        self
    }

    pub fn context(mut self, name: &str, cluster: &str, user: &str) -> Self {
        self.contexts.push(format!(
            "- name: {name}\n  context:\n    cluster: {cluster}\n    user: {user}\n"
        ));
        self
    }

    pub fn build(self) -> String {
        format!(
            "apiVersion: v1\nkind: Config\nclusters:\n{}contexts:\n{}users:\n{}",
            self.clusters.concat(),
            self.contexts.concat(),
            self.users.concat()
        )
    }
}

/// Canned responses by request path. Unknown paths get a 404.
#[derive(Clone, Default)]
pub struct Routes {
    routes: HashMap<String, (u16, String)>,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, status: u16, body: &str) -> Self {
        self.routes
            .insert(path.to_string(), (status, body.to_string()));
        self
    }

    fn respond(&self, path: &str) -> (u16, String) {
        self.routes
            .get(path)
            .cloned()
            .unwrap_or((404, r#"{"kind":"Status","code":404}"#.to_string()))
    }
}

/// HTTPS server on 127.0.0.1 that refuses clients without a certificate
/// signed by `ca`.
pub struct MtlsServer {
    pub port: u16,
    requests: Arc<AtomicUsize>,
}

impl MtlsServer {
    pub fn start(ca: &CertAuthority, routes: Routes) -> Self {
        let server = ca.server_cert();

        let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
        acceptor.set_private_key(&server.key).unwrap();
        acceptor.set_certificate(&server.cert).unwrap();
        acceptor.add_client_ca(&ca.cert).unwrap();
        acceptor.cert_store_mut().add_cert(ca.cert.clone()).unwrap();
        acceptor.set_verify(SslVerifyMode::PEER | SslVerifyMode::FAIL_IF_NO_PEER_CERT);
        let acceptor = Arc::new(acceptor.build());

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let acceptor = Arc::clone(&acceptor);
                let routes = routes.clone();
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    let Ok(mut tls) = acceptor.accept(stream) else {
                        return;
                    };
                    let Some(path) = read_request_path(&mut tls) else {
                        return;
                    };
                    counter.fetch_add(1, Ordering::SeqCst);

                    let (status, body) = routes.respond(&path);
                    let response = format!(
                        "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        reason(status),
                        body.len()
                    );
                    let _ = tls.write_all(response.as_bytes());
                    let _ = tls.flush();
                    let _ = tls.shutdown();
                });
            }
        });

        Self { port, requests }
    }

    pub fn url(&self) -> String {
        format!("https://127.0.0.1:{}", self.port)
    }

    /// Requests that completed a handshake and sent a request line.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// TCP listener on 127.0.0.1 that accepts connections and never writes a
/// byte, so TLS handshakes against it stall.
pub struct SilentServer {
    pub port: u16,
}

impl SilentServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming().flatten() {
                held.push(stream);
            }
        });

        Self { port }
    }

    pub fn url(&self) -> String {
        format!("https://127.0.0.1:{}", self.port)
    }
}

fn read_request_path(stream: &mut impl Read) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let target = head.lines().next()?.split_whitespace().nth(1)?;
    Some(target.split('?').next()?.to_string())
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        _ => "Error",
    }
}

pub const CLUSTER_ROLE_BINDINGS_PATH: &str =
    "/apis/rbac.authorization.k8s.io/v1/clusterrolebindings";
pub const ROLE_BINDINGS_PATH: &str = "/apis/rbac.authorization.k8s.io/v1/rolebindings";

pub fn cluster_role_binding_list(bindings: &[(&str, &str, &[&str])]) -> String {
    let items: Vec<serde_json::Value> = bindings
        .iter()
        .map(|(name, role, users)| {
            serde_json::json!({
                "metadata": { "name": name },
                "roleRef": {
                    "apiGroup": "rbac.authorization.k8s.io",
                    "kind": "ClusterRole",
                    "name": role
                },
                "subjects": users
                    .iter()
                    .map(|u| serde_json::json!({
                        "apiGroup": "rbac.authorization.k8s.io",
                        "kind": "User",
                        "name": u
                    }))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    serde_json::json!({
        "kind": "ClusterRoleBindingList",
        "apiVersion": "rbac.authorization.k8s.io/v1",
        "items": items
    })
    .to_string()
}

pub fn role_binding_list() -> String {
    serde_json::json!({
        "kind": "RoleBindingList",
        "apiVersion": "rbac.authorization.k8s.io/v1",
        "items": [{
            "metadata": { "name": "dev-edit", "namespace": "dev" },
            "roleRef": { "kind": "ClusterRole", "name": "edit" },
            "subjects": [{ "kind": "User", "name": "alice" }]
        }]
    })
    .to_string()
}
