use crate::error::TransportError;
use crate::options::{ClientIdentity, Verify};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TlsBackend {
    Rustls,
    NativeTls,
}

impl TlsBackend {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rustls => "rustls",
            Self::NativeTls => "native-tls",
        }
    }

    pub fn is_available(self) -> bool {
        match self {
            Self::Rustls => cfg!(feature = "tls-rustls"),
            Self::NativeTls => cfg!(feature = "tls-native"),
        }
    }
}

pub(crate) const fn default_tls_backend() -> TlsBackend {
    if cfg!(feature = "tls-rustls") {
        TlsBackend::Rustls
    } else {
        TlsBackend::NativeTls
    }
}

pub(crate) fn tls_config_error(backend: TlsBackend, message: impl Into<String>) -> TransportError {
    TransportError::TlsConfig {
        backend: backend.as_str(),
        message: message.into(),
    }
}

pub(crate) fn parse_pem_certificates(
    backend: TlsBackend,
    pem_bundle: &[u8],
    context: &str,
) -> Result<Vec<ureq::tls::Certificate<'static>>, TransportError> {
    let mut certificates = Vec::new();
    for item in ureq::tls::parse_pem(pem_bundle) {
        let item = item.map_err(|source| {
            tls_config_error(backend, format!("failed to parse PEM {context}: {source}"))
        })?;
        if let ureq::tls::PemItem::Certificate(certificate) = item {
            certificates.push(certificate);
        }
    }
    if certificates.is_empty() {
        return Err(tls_config_error(
            backend,
            format!("no certificate blocks found in PEM {context}"),
        ));
    }
    Ok(certificates)
}

/// Translates the `verify` and `cert` options into a `ureq` TLS config.
pub(crate) fn build_tls_config(
    backend: TlsBackend,
    verify: &Verify,
    cert: Option<&ClientIdentity>,
) -> Result<ureq::tls::TlsConfig, TransportError> {
    let provider = match backend {
        TlsBackend::Rustls => ureq::tls::TlsProvider::Rustls,
        TlsBackend::NativeTls => ureq::tls::TlsProvider::NativeTls,
    };
    let mut tls_config_builder = ureq::tls::TlsConfig::builder().provider(provider);

    match verify {
        Verify::Enabled => {}
        Verify::Disabled => {
            tls_config_builder = tls_config_builder.disable_verification(true);
        }
        Verify::CaBundle(pem) => {
            let roots = parse_pem_certificates(backend, pem, "ca bundle")?;
            tls_config_builder =
                tls_config_builder.root_certs(ureq::tls::RootCerts::new_with_certs(&roots));
        }
    }

    if let Some(identity) = cert {
        let cert_chain =
            parse_pem_certificates(backend, &identity.cert_chain_pem, "client certificate chain")?;
        let private_key =
            ureq::tls::PrivateKey::from_pem(&identity.private_key_pem).map_err(|source| {
                tls_config_error(
                    backend,
                    format!("failed to parse client private key PEM: {source}"),
                )
            })?;
        tls_config_builder = tls_config_builder.client_cert(Some(
            ureq::tls::ClientCert::new_with_certs(&cert_chain, private_key),
        ));
    }

    Ok(tls_config_builder.build())
}
