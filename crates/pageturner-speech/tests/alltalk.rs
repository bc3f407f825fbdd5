//! AllTalk backend against an in-process stub server.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hound::{SampleFormat, WavSpec, WavWriter};
use pageturner_core::SpeechError;
use pageturner_speech::{AllTalkBackend, AllTalkConfig, TtsBackend};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ── Stub server ────────────────────────────────────────────────────

/// 0.1 s of 24 kHz mono silence.
fn wav_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    let spec = WavSpec {
        channels: 1,
        sample_rate: 24_000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
    for _ in 0..2_400 {
        writer.write_sample(0_i16).unwrap();
    }
    writer.finalize().unwrap();
    bytes
}

#[derive(Clone)]
struct Stub {
    forms: Arc<Mutex<Vec<String>>>,
    status: &'static str,
}

impl Stub {
    async fn start(status: &'static str) -> (Self, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let stub = Self {
            forms: Arc::new(Mutex::new(Vec::new())),
            status,
        };
        let server = stub.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let server = server.clone();
                tokio::spawn(async move { server.serve(stream).await });
            }
        });
        (stub, url)
    }

    fn forms(&self) -> Vec<String> {
        self.forms.lock().unwrap().clone()
    }

    async fn serve(&self, mut stream: TcpStream) {
        let (head, body) = read_request(&mut stream).await;
        let request_line = head.lines().next().unwrap_or_default().to_string();

        let (content_type, payload) = if request_line.starts_with("POST /api/tts-generate") {
            let index = {
                let mut forms = self.forms.lock().unwrap();
                forms.push(String::from_utf8_lossy(&body).into_owned());
                forms.len()
            };
            let json = format!(
                r#"{{"status":"{}","output_file_path":"/tmp/x.wav","output_file_url":"/audio/pageturner_{index}.wav"}}"#,
                self.status
            );
            ("application/json", json.into_bytes())
        } else if request_line.starts_with("GET /audio/") {
            ("audio/wav", wav_bytes())
        } else if request_line.starts_with("GET /api/ready") {
            ("text/plain", b"Ready".to_vec())
        } else {
            let response = b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
            let _ = stream.write_all(response).await;
            return;
        };

        let header = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            payload.len()
        );
        let _ = stream.write_all(header.as_bytes()).await;
        let _ = stream.write_all(&payload).await;
        let _ = stream.shutdown().await;
    }
}

/// Read one request: headers as text, body as bytes.
async fn read_request(stream: &mut TcpStream) -> (String, Vec<u8>) {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break buf.len();
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    (head, body)
}

fn backend(url: &str, max_chunk_chars: usize) -> AllTalkBackend {
    AllTalkBackend::new(AllTalkConfig {
        server_url: url.to_string(),
        max_chunk_chars,
        request_timeout_secs: 5,
        ..AllTalkConfig::default()
    })
    .unwrap()
}

// ── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_synthesize_posts_form_and_decodes_wav() {
    let (stub, url) = Stub::start("generate-success").await;
    let tts = backend(&url, 1800);

    let audio = tts.synthesize("Hello world.").await.unwrap();

    assert_eq!(audio.sample_rate, 24_000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.duration(), Duration::from_millis(100));

    let forms = stub.forms();
    assert_eq!(forms.len(), 1);
    let form = &forms[0];
    assert!(form.contains("text_input=Hello+world."), "{form}");
    assert!(form.contains("character_voice_gen=female_06.wav"), "{form}");
    assert!(form.contains("language=en"), "{form}");
    assert!(form.contains("narrator_enabled=false"), "{form}");
    assert!(form.contains("autoplay=false"), "{form}");
}

#[tokio::test]
async fn test_long_text_is_chunked_and_concatenated() {
    let (stub, url) = Stub::start("success").await;
    let tts = backend(&url, 25);

    let audio = tts
        .synthesize("The first sentence here. The second one follows.")
        .await
        .unwrap();

    assert_eq!(stub.forms().len(), 2);
    assert_eq!(audio.duration(), Duration::from_millis(200));
}

#[tokio::test]
async fn test_failed_generation_status_is_synthesis_error() {
    let (_stub, url) = Stub::start("error").await;
    let tts = backend(&url, 1800);

    let err = tts.synthesize("Hello world.").await.unwrap_err();
    assert!(matches!(err, SpeechError::Synthesis(_)), "{err}");
}

#[tokio::test]
async fn test_blank_text_is_rejected_without_request() {
    let (stub, url) = Stub::start("success").await;
    let tts = backend(&url, 1800);

    assert!(tts.synthesize("  \n ").await.is_err());
    assert!(stub.forms().is_empty());
}

#[tokio::test]
async fn test_health_check() {
    let (_stub, url) = Stub::start("success").await;
    tokio_test::assert_ok!(backend(&url, 1800).health_check().await);

    // Nothing listens on a port whose listener was dropped.
    let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_url = format!("http://{}", closed.local_addr().unwrap());
    drop(closed);
    let err = backend(&dead_url, 1800).health_check().await.unwrap_err();
    assert!(matches!(err, SpeechError::Unavailable(_)));
}
