use register_core::{HttpRegistrationClient, RegisterForm, SubmissionController, SubmitOutcome};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Minimal HTTP/1.1 endpoint. The first reply is a 409 that sets a session
/// cookie; every later reply is a 201. The `Cookie` header of each request
/// is recorded, in arrival order, before the reply goes out.
async fn spawn_registration_endpoint() -> (String, Arc<Mutex<Vec<Option<String>>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let recorded = seen.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            answer(stream, &recorded).await;
        }
    });

    (format!("http://{}", addr), seen)
}

async fn answer(mut stream: TcpStream, recorded: &Mutex<Vec<Option<String>>>) {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut buf).await.unwrap();
        if n == 0 {
            return;
        }
        raw.extend_from_slice(&buf[..n]);
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
    let header = |name: &str| {
        head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    };

    let content_length: usize = header("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    while raw.len() < header_end + content_length {
        let n = stream.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);
    }

    let first = {
        let mut recorded = recorded.lock().unwrap();
        recorded.push(header("cookie"));
        recorded.len() == 1
    };

    let reply = if first {
        "HTTP/1.1 409 Conflict\r\nSet-Cookie: sid=VISITOR_A_SECRET; Path=/; HttpOnly\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    } else {
        "HTTP/1.1 201 Created\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    };
    stream.write_all(reply.as_bytes()).await.unwrap();
    stream.shutdown().await.ok();
}

fn filled_form(username: &str) -> RegisterForm {
    let mut form = RegisterForm::default();
    form.set_email(format!("{}@mail.io", username));
    form.set_username(username);
    form.set_password("Abcd123!");
    form.set_confirm_password("Abcd123!");
    form
}

#[tokio::test]
async fn test_shared_client_keeps_visitor_cookies_apart() {
    let (base_url, seen) = spawn_registration_endpoint().await;
    let client = Arc::new(HttpRegistrationClient::new(base_url).unwrap());
    let controller = SubmissionController::new(client);

    let mut visitor_a = filled_form("alice1");
    let mut visitor_b = filled_form("bobby2");

    let outcome = controller.submit(&mut visitor_a).await;
    assert_eq!(outcome, SubmitOutcome::Failed { status: Some(409) });
    assert_eq!(visitor_a.cookie_header().as_deref(), Some("sid=VISITOR_A_SECRET"));

    let outcome = controller.submit(&mut visitor_b).await;
    assert!(matches!(outcome, SubmitOutcome::Registered { .. }));
    assert_eq!(visitor_b.cookie_header(), None);

    visitor_a.set_password("Abcd123!a");
    visitor_a.set_confirm_password("Abcd123!a");
    let outcome = controller.submit(&mut visitor_a).await;
    assert!(matches!(outcome, SubmitOutcome::Registered { .. }));

    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![None, None, Some("sid=VISITOR_A_SECRET".to_string())]
    );
}
