//! TLS connector for encrypted connections.
//!
//! Certificate checking follows libpq: `prefer` and `require` accept any
//! server certificate, `verify-ca` checks the chain against `sslrootcert`,
//! and `verify-full` also checks the host name.

use std::path::Path;
use std::sync::Arc;

use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
};
use tokio_postgres_rustls::MakeRustlsConnect;

use crate::config::{PgConfig, SslMode};
use crate::error::{PgError, PgResult};

/// Build the connector for `config`.
///
/// tokio-postgres only invokes it when the server accepts TLS, so it is
/// built even for `sslmode=disable`.
pub async fn connector(config: &PgConfig) -> PgResult<MakeRustlsConnect> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let roots = match (&config.ssl_root_cert, config.ssl_mode.verifies_certificate()) {
        (Some(path), true) => Some(load_roots(path).await?),
        _ => None,
    };
    let verifier = ServerVerifier::new(
        roots,
        config.ssl_mode == SslMode::VerifyFull,
        provider.clone(),
    )?;

    let tls = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| PgError::config(format!("TLS setup failed: {}", e)))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();

    Ok(MakeRustlsConnect::new(tls))
}

/// Read every certificate from a PEM file.
async fn load_roots(path: &Path) -> PgResult<RootCertStore> {
    let pem = tokio::fs::read(path).await.map_err(|e| {
        PgError::config(format!("cannot read sslrootcert {}: {}", path.display(), e))
    })?;

    let mut roots = RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut pem.as_slice()) {
        let cert = cert.map_err(|e| {
            PgError::config(format!("invalid certificate in {}: {}", path.display(), e))
        })?;
        roots.add(cert).map_err(|e| {
            PgError::config(format!("invalid certificate in {}: {}", path.display(), e))
        })?;
    }

    if roots.is_empty() {
        return Err(PgError::config(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(roots)
}

#[derive(Debug)]
struct ServerVerifier {
    /// `None` accepts any certificate.
    webpki: Option<Arc<WebPkiServerVerifier>>,
    check_host_name: bool,
    provider: Arc<CryptoProvider>,
}

impl ServerVerifier {
    fn new(
        roots: Option<RootCertStore>,
        check_host_name: bool,
        provider: Arc<CryptoProvider>,
    ) -> PgResult<Self> {
        let webpki = match roots {
            Some(roots) => Some(
                WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider.clone())
                    .build()
                    .map_err(|e| PgError::config(format!("TLS setup failed: {}", e)))?,
            ),
            None => None,
        };
        Ok(Self {
            webpki,
            check_host_name,
            provider,
        })
    }
}

impl ServerCertVerifier for ServerVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let Some(webpki) = &self.webpki else {
            return Ok(ServerCertVerified::assertion());
        };

        match webpki.verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Err(rustls::Error::InvalidCertificate(
                CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. },
            )) if !self.check_host_name =>
            {
                Ok(ServerCertVerified::assertion())
            }
            other => other,
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
