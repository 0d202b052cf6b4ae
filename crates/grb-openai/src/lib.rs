//! OpenAI completions adapter.
//!
//! Talks to the legacy completions endpoint; the relay only ever consumes
//! `choices[0].text`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use grb_core::{config::Config, errors::Error, ports::CompletionBackend, Result};

/// Wire request for the completions endpoint.
///
/// `stop` stays `None` so it serializes as an explicit `null`.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    max_tokens: u32,
    n: u32,
    stop: Option<String>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Clone, Debug)]
pub struct OpenAiCompletions {
    api_key: String,
    url: String,
    max_tokens: u32,
    temperature: f32,
    http: reqwest::Client,
}

impl OpenAiCompletions {
    pub fn new(cfg: &Config) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(cfg.request_timeout)
            .timeout(cfg.request_timeout)
            .build()
            .expect("reqwest client build");

        Self {
            api_key: cfg.openai_api_key.clone(),
            url: cfg.completion_url.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            http,
        }
    }
}

fn build_prompt(user_input: &str) -> String {
    format!("Модель GPT-4, пожалуйста, ответь на вопрос на русском языке: {user_input}\n\n")
}

/// Remove the echoed user text from a completion, then trim.
///
/// Completions endpoints often repeat the prompt at the start of the output;
/// stripping a text that is not present leaves the completion unchanged.
fn strip_echo(completion: &str, user_input: &str) -> String {
    if user_input.is_empty() {
        return completion.trim().to_string();
    }
    completion.replace(user_input, "").trim().to_string()
}

#[async_trait]
impl CompletionBackend for OpenAiCompletions {
    async fn complete(&self, user_input: &str) -> Result<String> {
        let prompt = build_prompt(user_input);
        let request = CompletionRequest {
            prompt: &prompt,
            max_tokens: self.max_tokens,
            n: 1,
            stop: None,
            temperature: self.temperature,
        };

        tracing::info!("sending completion request");
        let resp = self
            .http
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Completion(format!("completion request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Completion(format!(
                "completion request failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Completion(format!("completion body error: {e}")))?;
        let parsed: CompletionResponse = serde_json::from_str(&body)?;

        let Some(choice) = parsed.choices.into_iter().next() else {
            return Err(Error::Completion(
                "completion response has no choices".to_string(),
            ));
        };

        let text = strip_echo(&choice.text, user_input);
        tracing::info!("received completion: {text}");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{Read, Write},
        net::{SocketAddr, TcpListener, TcpStream},
        thread,
        time::{Duration, Instant},
    };

    use super::*;

    fn test_config(url: String, timeout: Duration) -> Config {
        Config {
            telegram_bot_token: "123:abc".to_string(),
            openai_api_key: "sk-test".to_string(),
            completion_url: url,
            max_tokens: 1600,
            temperature: 0.5,
            request_timeout: timeout,
        }
    }

    fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    /// Drain one HTTP request (headers + declared body), then write `response`.
    fn handle_conn(mut stream: TcpStream, response: &str) {
        let mut buf = Vec::new();
        let mut tmp = [0u8; 1024];
        let mut header_end = None;
        let mut content_length = 0usize;

        loop {
            let n = stream.read(&mut tmp).unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&tmp[..n]);

            if header_end.is_none() {
                if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
                    header_end = Some(pos + 4);
                    let headers = String::from_utf8_lossy(&buf[..pos]).to_string();
                    for line in headers.lines() {
                        if let Some((k, v)) = line.split_once(':') {
                            if k.eq_ignore_ascii_case("content-length") {
                                content_length = v.trim().parse().unwrap_or(0);
                            }
                        }
                    }
                }
            }
            if let Some(end) = header_end {
                if buf.len() >= end + content_length {
                    break;
                }
            }
        }

        let _ = stream.write_all(response.as_bytes());
    }

    /// One-shot HTTP server on a random local port.
    fn spawn_server(response: String) -> (SocketAddr, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                handle_conn(stream, &response);
            }
        });
        (addr, handle)
    }

    fn json_response(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        )
    }

    #[test]
    fn prompt_carries_the_language_directive() {
        assert_eq!(
            build_prompt("Как дела?"),
            "Модель GPT-4, пожалуйста, ответь на вопрос на русском языке: Как дела?\n\n"
        );
    }

    #[test]
    fn request_body_matches_the_wire_format() {
        let prompt = build_prompt("Как дела?");
        let request = CompletionRequest {
            prompt: &prompt,
            max_tokens: 1600,
            n: 1,
            stop: None,
            temperature: 0.5,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["prompt"], prompt.as_str());
        assert_eq!(value["max_tokens"], 1600);
        assert_eq!(value["n"], 1);
        assert_eq!(value["stop"], serde_json::Value::Null);
        assert_eq!(value["temperature"], 0.5);
    }

    #[test]
    fn echo_is_stripped_and_trimmed() {
        assert_eq!(
            strip_echo("Как дела? Хорошо, спасибо!", "Как дела?"),
            "Хорошо, спасибо!"
        );
    }

    #[test]
    fn stripping_absent_text_only_trims() {
        assert_eq!(strip_echo("  Хорошо, спасибо!  ", "Как дела?"), "Хорошо, спасибо!");
        assert_eq!(strip_echo("unchanged", ""), "unchanged");
    }

    #[test]
    fn whitespace_completion_strips_to_empty() {
        assert_eq!(strip_echo("   ", "hello"), "");
    }

    #[tokio::test]
    async fn completion_is_parsed_and_echo_stripped() {
        let body = r#"{"id":"cmpl-1","choices":[{"text":"Как дела? Хорошо, спасибо!","index":0}]}"#;
        let (addr, server) = spawn_server(json_response(body));

        let cfg = test_config(format!("http://{addr}/completions"), Duration::from_secs(5));
        let client = OpenAiCompletions::new(&cfg);

        let text = client.complete("Как дела?").await.unwrap();
        assert_eq!(text, "Хорошо, спасибо!");
        server.join().unwrap();
    }

    #[tokio::test]
    async fn http_error_status_is_an_error() {
        let response =
            "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                .to_string();
        let (addr, server) = spawn_server(response);

        let cfg = test_config(format!("http://{addr}/completions"), Duration::from_secs(5));
        let client = OpenAiCompletions::new(&cfg);

        let err = client.complete("hello").await.unwrap_err();
        assert!(err.to_string().contains("500"));
        server.join().unwrap();
    }

    #[tokio::test]
    async fn malformed_body_is_an_error_not_a_panic() {
        let (addr, server) = spawn_server(json_response("not json at all"));

        let cfg = test_config(format!("http://{addr}/completions"), Duration::from_secs(5));
        let client = OpenAiCompletions::new(&cfg);

        assert!(client.complete("hello").await.is_err());
        server.join().unwrap();
    }

    #[tokio::test]
    async fn missing_choices_is_an_error() {
        let (addr, server) = spawn_server(json_response(r#"{"choices":[]}"#));

        let cfg = test_config(format!("http://{addr}/completions"), Duration::from_secs(5));
        let client = OpenAiCompletions::new(&cfg);

        let err = client.complete("hello").await.unwrap_err();
        assert!(err.to_string().contains("no choices"));
        server.join().unwrap();
    }

    #[tokio::test]
    async fn connection_refused_is_an_error() {
        // Bind then drop to get a port nothing listens on.
        let addr = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();

        let cfg = test_config(format!("http://{addr}/completions"), Duration::from_secs(5));
        let client = OpenAiCompletions::new(&cfg);

        assert!(client.complete("hello").await.is_err());
    }

    #[tokio::test]
    async fn stalled_server_fails_within_the_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            // Accept, then go silent for longer than the client timeout.
            if let Ok((_stream, _)) = listener.accept() {
                thread::sleep(Duration::from_secs(2));
            }
        });

        let cfg = test_config(format!("http://{addr}/completions"), Duration::from_millis(200));
        let client = OpenAiCompletions::new(&cfg);

        let start = Instant::now();
        let result = client.complete("hello").await;
        assert!(result.is_err());
        assert!(start.elapsed() < Duration::from_secs(2));
        server.join().unwrap();
    }
}
