use {
    crate::catalog::{CatalogEntry, EndpointRef, ResponseShape},
    anyhow::{Context, Result},
    bytes::Bytes,
    derive_more::{Debug, Display},
    reqwest::Client,
    serde_json::{Value, from_slice as unjson},
    std::{result::Result as StdResult, time::Duration},
    strum_macros::EnumIs,
};

/// Why a single probe did not produce a value.
#[derive(Clone, PartialEq, Eq, Debug, Display, EnumIs)]
pub enum ProbeError {
    #[display("transport error: {_0}")]
    Transport(String),
    #[display("request timed out")]
    Timeout,
    #[display("unexpected HTTP status {_0}")]
    Status(u16),
    #[display("cannot decode response: {_0}")]
    Decode(String),
    #[display("response has no field {_0:?}")]
    MissingField(String),
    #[display("response carries an empty value")]
    Empty,
    #[display("probe panicked")]
    Panicked,
    #[display("probe was cancelled")]
    Cancelled,
}

impl std::error::Error for ProbeError {}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else if err.is_decode() || err.is_body() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// The single result of one probe invocation.
#[derive(Clone, PartialEq, Eq, Debug, EnumIs)]
pub enum ProbeOutcome {
    Success {
        endpoint: EndpointRef,
        value: String,
    },
    Failure {
        endpoint: EndpointRef,
        cause: ProbeError,
    },
}

impl ProbeOutcome {
    pub fn from_result(endpoint: EndpointRef, result: StdResult<String, ProbeError>) -> Self {
        match result {
            Ok(value) => Self::Success { endpoint, value },
            Err(cause) => Self::Failure { endpoint, cause },
        }
    }

    pub fn endpoint(&self) -> &EndpointRef {
        match self {
            Self::Success { endpoint, .. } | Self::Failure { endpoint, .. } => endpoint,
        }
    }
}

/// Performs one lookup against one catalog entry.
///
/// Implementations must turn every fault into [ProbeOutcome::Failure];
/// a panic is still contained by the racing side, but reported only as
/// [ProbeError::Panicked]. The per-call `timeout` is the implementation's
/// responsibility.
pub trait Probe: Send + Sync + 'static {
    fn probe(
        &self,
        entry: CatalogEntry,
        timeout: Duration,
    ) -> impl Future<Output = ProbeOutcome> + Send;
}

/// Extracts the value from a response body according to its [ResponseShape].
pub fn decode(shape: &ResponseShape, body: &[u8]) -> StdResult<String, ProbeError> {
    let value = match shape {
        ResponseShape::Raw => std::str::from_utf8(body)
            .map_err(|err| ProbeError::Decode(err.to_string()))?
            .trim()
            .to_owned(),

        ResponseShape::FieldOf(key) => {
            let doc: Value = unjson(body).map_err(|err| ProbeError::Decode(err.to_string()))?;

            match doc.get(key.as_ref()) {
                Some(Value::String(s)) => s.trim().to_owned(),
                Some(Value::Null) | None => return Err(ProbeError::MissingField(key.to_string())),
                Some(other) => other.to_string(),
            }
        }
    };

    match value.is_empty() {
        true => Err(ProbeError::Empty),
        false => Ok(value),
    }
}

/// [Probe] that issues a single HTTP `GET` per invocation.
#[derive(Clone, Debug)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    const USER_AGENT: &'static str = concat!("ipquorum/", env!("CARGO_PKG_VERSION"));

    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(Self::USER_AGENT)
            .build()
            .context("cannot build HTTP client")?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn request(&self, entry: &CatalogEntry, timeout: Duration) -> StdResult<String, ProbeError> {
        let response = self
            .client
            .get(entry.endpoint().as_str())
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        let body: Bytes = response.bytes().await?;
        decode(entry.shape(), &body)
    }
}

impl Probe for HttpProbe {
    async fn probe(&self, entry: CatalogEntry, timeout: Duration) -> ProbeOutcome {
        let result = self.request(&entry, timeout).await;
        ProbeOutcome::from_result(entry.endpoint().clone(), result)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        tokio::{
            io::{AsyncReadExt, AsyncWriteExt},
            net::TcpListener,
            time::sleep,
        },
    };

    #[test]
    fn decode_raw_trims() {
        assert_eq!(decode(&ResponseShape::Raw, b"  1.2.3.4\n").unwrap(), "1.2.3.4");
        assert_eq!(decode(&ResponseShape::Raw, b" \n"), Err(ProbeError::Empty));
        assert!(decode(&ResponseShape::Raw, &[0xff, 0xfe]).unwrap_err().is_decode());
    }

    #[test]
    fn decode_field() {
        let shape = ResponseShape::FieldOf("ip".into());

        assert_eq!(
            decode(&shape, br#"{"ip": " 1.2.3.4 ", "country": "NL"}"#).unwrap(),
            "1.2.3.4"
        );
        assert_eq!(decode(&shape, br#"{"ip": 42}"#).unwrap(), "42");
        assert_eq!(
            decode(&shape, br#"{"addr": "1.2.3.4"}"#),
            Err(ProbeError::MissingField("ip".into()))
        );
        assert_eq!(
            decode(&shape, br#"{"ip": null}"#),
            Err(ProbeError::MissingField("ip".into()))
        );
        assert_eq!(decode(&shape, br#"{"ip": ""}"#), Err(ProbeError::Empty));
        assert!(decode(&shape, b"1.2.3.4").unwrap_err().is_decode());
    }

    // Serves exactly one connection with the given status line and body,
    // after an optional delay.
    async fn serve_once(status: &'static str, body: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            sleep(delay).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{}/ip", addr)
    }

    fn local_probe() -> HttpProbe {
        HttpProbe::with_client(Client::builder().no_proxy().build().unwrap())
    }

    #[tokio::test]
    async fn http_probe_success() {
        let url = serve_once("200 OK", "{\"origin\":\"203.0.113.7\"}", Duration::ZERO).await;
        let entry = CatalogEntry::field_of(&url, "origin");

        let outcome = local_probe().probe(entry, Duration::from_secs(5)).await;
        assert_eq!(
            outcome,
            ProbeOutcome::Success {
                endpoint: EndpointRef::new(&url),
                value: "203.0.113.7".into()
            }
        );
    }

    #[tokio::test]
    async fn http_probe_non_2xx_is_failure() {
        let url = serve_once("503 Service Unavailable", "busy", Duration::ZERO).await;

        let outcome = local_probe()
            .probe(CatalogEntry::raw(&url), Duration::from_secs(5))
            .await;
        assert_eq!(
            outcome,
            ProbeOutcome::Failure {
                endpoint: EndpointRef::new(&url),
                cause: ProbeError::Status(503)
            }
        );
    }

    #[tokio::test]
    async fn http_probe_enforces_per_call_timeout() {
        let url = serve_once("200 OK", "1.2.3.4", Duration::from_secs(5)).await;

        let outcome = local_probe()
            .probe(CatalogEntry::raw(&url), Duration::from_millis(100))
            .await;
        assert!(matches!(
            outcome,
            ProbeOutcome::Failure {
                cause: ProbeError::Timeout,
                ..
            }
        ));
    }
}
