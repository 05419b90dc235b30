//! Azure Speech Client - 调用 Azure Cognitive Services 语音合成
//!
//! 实现 SynthesizerPort trait，把 SSML POST 到远程服务，
//! 响应体作为字节流直接交给播放器，不在内存中完整缓冲
//!
//! 外部 API:
//! POST {endpoint}/cognitiveservices/v1
//! Request: application/ssml+xml
//! Response: Ogg/Opus binary

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

use crate::application::ports::{AudioStream, SynthesisError, SynthesisRequest, SynthesizerPort};
use crate::domain::voice::VoiceParameters;

const CLIENT_NAME: &str = concat!("OHNO/", env!("CARGO_PKG_VERSION"));
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OUTPUT_FORMAT_HEADER: &str = "X-Microsoft-OutputFormat";

/// Azure 语音客户端配置
#[derive(Debug, Clone)]
pub struct AzureSpeechConfig {
    /// 服务地址，例如 https://japaneast.api.cognitive.microsoft.com
    pub endpoint: String,
    /// 订阅密钥
    pub key: String,
    /// 输出格式
    pub output_format: String,
    /// 等待响应头和首个数据块的上限（秒）
    pub timeout_secs: u64,
}

impl Default for AzureSpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            key: String::new(),
            output_format: "ogg-48khz-16bit-mono-opus".to_string(),
            timeout_secs: 10,
        }
    }
}

impl AzureSpeechConfig {
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// SSML 文本转义
pub fn escape_ssml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '&' => escaped.push_str("&amp;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// 生成 SSML 文档
///
/// pitch 不写入文档
pub fn build_ssml(text: &str, params: &VoiceParameters) -> String {
    format!(
        concat!(
            r#"<speak version="1.0" xmlns="http://www.w3.org/2001/10/synthesis" xml:lang="ja-JP">"#,
            r#"<voice name="{voice}">"#,
            r#"<prosody rate="{speed}" volume="25">{text}</prosody>"#,
            r#"</voice></speak>"#
        ),
        voice = escape_ssml(params.voice.as_str()),
        speed = params.speed,
        text = escape_ssml(text),
    )
}

fn map_transport_error(e: reqwest::Error) -> SynthesisError {
    if e.is_timeout() {
        SynthesisError::Timeout
    } else if e.is_connect() {
        SynthesisError::Network(format!("Cannot connect to speech service: {}", e))
    } else {
        SynthesisError::Network(e.to_string())
    }
}

/// Azure 语音客户端
pub struct AzureSpeechClient {
    client: Client,
    config: AzureSpeechConfig,
}

impl AzureSpeechClient {
    pub fn new(config: AzureSpeechConfig) -> Result<Self, SynthesisError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_NAME));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/ssml+xml"));

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn synthesis_url(&self) -> String {
        format!(
            "{}/cognitiveservices/v1",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    /// 发送请求并取得首个非空数据块
    async fn open_stream(&self, ssml: String) -> Result<AudioStream, SynthesisError> {
        let response = self
            .client
            .post(self.synthesis_url())
            .header(SUBSCRIPTION_KEY_HEADER, &self.config.key)
            .header(OUTPUT_FORMAT_HEADER, &self.config.output_format)
            .body(ssml)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Synthesis rejected");
            return Err(SynthesisError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let mut body = response.bytes_stream();
        let first = loop {
            match body.next().await {
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => break chunk,
                Some(Err(e)) => return Err(map_transport_error(e)),
                None => return Err(SynthesisError::EmptyBody),
            }
        };

        let rest = body.map(|chunk| chunk.map_err(std::io::Error::other));
        Ok(stream::once(async move { Ok(first) }).chain(rest).boxed())
    }
}

#[async_trait]
impl SynthesizerPort for AzureSpeechClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<AudioStream, SynthesisError> {
        let ssml = build_ssml(&request.text, &request.params);

        tracing::debug!(
            url = %self.synthesis_url(),
            text_len = request.text.len(),
            voice = %request.params.voice,
            speed = request.params.speed,
            "Sending synthesis request"
        );

        let timeout = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(timeout, self.open_stream(ssml)).await {
            Ok(result) => result,
            Err(_) => Err(SynthesisError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::VoiceName;
    use axum::body::Body;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::Router;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct Captured {
        headers: Arc<Mutex<Option<AxumHeaders>>>,
        body: Arc<Mutex<Option<String>>>,
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(endpoint: String) -> AzureSpeechClient {
        AzureSpeechClient::new(AzureSpeechConfig::new(endpoint, "secret").with_timeout(2)).unwrap()
    }

    async fn collect(mut stream: AudioStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[test]
    fn test_escape_ssml() {
        assert_eq!(
            escape_ssml(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &apos;Jerry&apos;&lt;/a&gt;"
        );
        assert_eq!(escape_ssml("こんにちは"), "こんにちは");
    }

    #[test]
    fn test_build_ssml() {
        let params = VoiceParameters::new(VoiceName::parse("Keita").unwrap(), 2.0, 1.5).unwrap();
        assert_eq!(
            build_ssml("a<b", &params),
            concat!(
                r#"<speak version="1.0" xmlns="http://www.w3.org/2001/10/synthesis" xml:lang="ja-JP">"#,
                r#"<voice name="ja-JP-KeitaNeural"><prosody rate="1.5" volume="25">a&lt;b</prosody>"#,
                r#"</voice></speak>"#
            )
        );
    }

    #[test]
    fn test_config_default() {
        let config = AzureSpeechConfig::default();
        assert_eq!(config.output_format, "ogg-48khz-16bit-mono-opus");
        assert_eq!(config.timeout_secs, 10);
    }

    #[tokio::test]
    async fn test_streams_audio_and_sends_headers() {
        let captured = Captured::default();
        let state = captured.clone();
        let router = Router::new().route(
            "/cognitiveservices/v1",
            post(move |headers: AxumHeaders, body: String| {
                let state = state.clone();
                async move {
                    *state.headers.lock().unwrap() = Some(headers);
                    *state.body.lock().unwrap() = Some(body);
                    let chunks = stream::iter(vec![
                        Ok::<_, std::io::Error>(bytes::Bytes::from_static(b"OggS")),
                        Ok(bytes::Bytes::from_static(b"-opus")),
                    ]);
                    Body::from_stream(chunks)
                }
            }),
        );
        let endpoint = serve(router).await;

        let audio = client(endpoint)
            .synthesize(SynthesisRequest::new("こんにちは", VoiceParameters::default()))
            .await
            .unwrap();
        assert_eq!(collect(audio).await, b"OggS-opus");

        let headers = captured.headers.lock().unwrap().clone().unwrap();
        assert_eq!(headers["ocp-apim-subscription-key"], "secret");
        assert_eq!(headers["x-microsoft-outputformat"], "ogg-48khz-16bit-mono-opus");
        assert_eq!(headers["content-type"], "application/ssml+xml");
        assert!(headers["user-agent"].to_str().unwrap().starts_with("OHNO/"));

        let body = captured.body.lock().unwrap().clone().unwrap();
        assert!(body.contains(r#"<voice name="ja-JP-NanamiNeural">"#));
        assert!(body.contains(">こんにちは</prosody>"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected() {
        let router = Router::new().route(
            "/cognitiveservices/v1",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key").into_response() }),
        );
        let endpoint = serve(router).await;

        let result = client(endpoint)
            .synthesize(SynthesisRequest::new("a", VoiceParameters::default()))
            .await;
        match result {
            Err(SynthesisError::Rejected { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_empty_body_is_an_error() {
        let router = Router::new().route("/cognitiveservices/v1", post(|| async { StatusCode::OK }));
        let endpoint = serve(router).await;

        let result = client(endpoint)
            .synthesize(SynthesisRequest::new("a", VoiceParameters::default()))
            .await;
        assert!(matches!(result, Err(SynthesisError::EmptyBody)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let result = client(endpoint)
            .synthesize(SynthesisRequest::new("a", VoiceParameters::default()))
            .await;
        assert!(matches!(result, Err(SynthesisError::Network(_))));
    }
}
