use std::time::Duration;

use cicada_core::model::{LevelId, PartId, SubpartKey};
use services::{ApiConfig, ApiError, HttpTeamApi, TeamApi};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

#[derive(Debug)]
struct Recorded {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

struct Reply {
    status: u16,
    body: &'static str,
    set_cookie: Option<&'static str>,
}

fn reply(status: u16, body: &'static str) -> Reply {
    Reply {
        status,
        body,
        set_cookie: None,
    }
}

/// Answers one connection per scripted reply and records each request.
async fn serve(replies: Vec<Reply>) -> (Url, JoinHandle<Vec<Recorded>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
    let handle = tokio::spawn(async move {
        let mut recorded = Vec::new();
        for reply in replies {
            let (stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).await.unwrap();
            let mut headers = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).await.unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((key, value)) = line.split_once(':') {
                    headers.push((key.trim().to_string(), value.trim().to_string()));
                }
            }
            let length = headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
                .map_or(0, |(_, value)| value.parse::<usize>().unwrap());
            let mut body = vec![0; length];
            reader.read_exact(&mut body).await.unwrap();

            let cookie = reply
                .set_cookie
                .map(|cookie| format!("Set-Cookie: {cookie}\r\n"))
                .unwrap_or_default();
            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\n{cookie}Connection: close\r\n\r\n{}",
                reply.status,
                reply.body.len(),
                reply.body
            );
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();

            recorded.push(Recorded {
                request_line: request_line.trim_end().to_string(),
                headers,
                body: String::from_utf8(body).unwrap(),
            });
        }
        recorded
    });
    (url, handle)
}

fn api(url: Url) -> HttpTeamApi {
    HttpTeamApi::new(&ApiConfig::default().with_base_url(url)).unwrap()
}

#[tokio::test]
async fn submit_posts_answer_and_reads_verdict() {
    let (url, server) = serve(vec![
        reply(200, r#"{"correct":false,"msg":"Incorrect answer. Try again."}"#),
        reply(200, r#"{"correct":true,"newLevel":7}"#),
    ])
    .await;
    let api = api(url);

    let verdict = api
        .submit_answer(LevelId::new(4), None, "FOOBAR")
        .await
        .unwrap();
    assert!(!verdict.correct);
    assert_eq!(verdict.message.as_deref(), Some("Incorrect answer. Try again."));

    let verdict = api
        .submit_answer(LevelId::new(6), SubpartKey::new('f').ok(), "truth")
        .await
        .unwrap();
    assert!(verdict.correct);
    assert_eq!(verdict.new_level, Some(LevelId::new(7)));

    let recorded = server.await.unwrap();
    assert_eq!(recorded[0].request_line, "POST /api/submit/ans HTTP/1.1");
    assert_eq!(
        recorded[0].json(),
        serde_json::json!({"ans": "FOOBAR", "level": 4})
    );
    assert_eq!(
        recorded[1].json(),
        serde_json::json!({"ans": "truth", "level": 6, "subpart": "f"})
    );
}

#[tokio::test]
async fn error_status_uses_body_text_or_fallback() {
    let (url, server) = serve(vec![
        reply(401, r#"{"err":"Not logged in"}"#),
        reply(500, "{}"),
    ])
    .await;
    let api = api(url);

    let err = api
        .submit_answer(LevelId::new(1), None, "x")
        .await
        .unwrap_err();
    assert!(matches!(
        &err,
        ApiError::Rejected { status, message }
            if status.as_u16() == 401 && message == "Not logged in"
    ));

    let err = api
        .submit_answer(LevelId::new(1), None, "x")
        .await
        .unwrap_err();
    assert_eq!(err.user_message("generic"), "Submission failed.");
    server.await.unwrap();
}

#[tokio::test]
async fn login_cookie_is_sent_on_later_requests() {
    let (url, server) = serve(vec![
        Reply {
            status: 200,
            body: r#"{"team":{"_id":"65f0","team_name":"Nymphs","current_level":2}}"#,
            set_cookie: Some("token=abc123; Path=/; HttpOnly"),
        },
        reply(200, r#"{"subpartACompleted":true}"#),
    ])
    .await;
    let api = api(url);

    let team = api.login("ada@juetguna.in", "pw").await.unwrap();
    assert_eq!(team.current_level(), LevelId::new(2));

    let status = api.level_status(LevelId::new(2)).await.unwrap();
    assert_eq!(status.completed_parts(), vec![PartId::FIRST]);

    let recorded = server.await.unwrap();
    assert_eq!(recorded[0].request_line, "POST /api/team/login HTTP/1.1");
    assert_eq!(
        recorded[0].json(),
        serde_json::json!({"leader_email": "ada@juetguna.in", "password": "pw"})
    );
    assert_eq!(recorded[1].request_line, "GET /api/level-status/2 HTTP/1.1");
    assert_eq!(recorded[1].header("cookie"), Some("token=abc123"));
}

#[tokio::test]
async fn hung_request_becomes_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
    let _server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(stream);
    });

    let mut config = ApiConfig::default().with_base_url(url);
    config.request_timeout = Duration::from_millis(200);
    let api = HttpTeamApi::new(&config).unwrap();

    let err = api
        .submit_answer(LevelId::new(4), None, "x")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
