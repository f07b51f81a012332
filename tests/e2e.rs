//! End-to-end tests for depict-board.
//!
//! The depiction service is replaced by a tiny HTTP/1.1 server on a local
//! port: it answers with an SVG for well-formed payloads and with the
//! service's HTML error page for payloads containing `C1CC` (an unclosed
//! ring). Nothing leaves the machine.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use depict_board::{
    depict, depict_checked, probe_pass, probe_stream, read_input, write_output, Board,
    DepictConfig, PassHandle, DepictProgressCallback, ImageStatus, InputFormat, RenderOptions, Warning,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

// ── Test helpers ─────────────────────────────────────────────────────────────

const SVG: &str = "<svg xmlns=\"http://www.w3.org/2000/svg\"/>";
const ERROR_PAGE: &str = "<html><head><title>Error</title></head><body>\
<h1>Depiction error</h1><div class=\"message\">Could not parse input: unclosed ring C1CC</div>\
</body></html>";

/// Spawn the fake depiction service; returns its root URL.
async fn spawn_service(delay: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let mut len = 0;
                loop {
                    match socket.read(&mut buf[len..]).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => len += n,
                    }
                    if buf[..len].windows(4).any(|w| w == b"\r\n\r\n") || len == buf.len() {
                        break;
                    }
                }
                let request = String::from_utf8_lossy(&buf[..len]);
                let target = request.split_whitespace().nth(1).unwrap_or("/").to_string();

                tokio::time::sleep(delay).await;

                let (status, content_type, body) = if target.contains("C1CC") {
                    ("500 Internal Server Error", "text/html", ERROR_PAGE)
                } else if target.starts_with("/cdkdepict/depict/") {
                    ("200 OK", "image/svg+xml", SVG)
                } else {
                    ("404 Not Found", "text/plain", "")
                };
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}/cdkdepict")
}

fn config_for(root: &str) -> DepictConfig {
    DepictConfig::builder()
        .root_url(root)
        .concurrency(4)
        .timeout_secs(5)
        .build()
        .unwrap()
}

#[derive(Default)]
struct Counter {
    loaded: AtomicUsize,
    errors: AtomicUsize,
    completed: AtomicUsize,
}

impl DepictProgressCallback for Counter {
    fn on_record_loaded(&self, _position: usize, _total: usize, _bytes: usize) {
        self.loaded.fetch_add(1, Ordering::SeqCst);
    }

    fn on_record_error(&self, _position: usize, _total: usize, _error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }

    fn on_probe_complete(&self, _total: usize, loaded: usize) {
        self.completed.store(loaded, Ordering::SeqCst);
    }
}

// ── Pure rendering ───────────────────────────────────────────────────────────

#[test]
fn test_smiles_file_to_html() {
    let input = "# my structures\nCCO ethanol\nc1ccccc1 |c:0,2,4| benzene\n\nCC(=O)O.OCC>>CC(=O)OCC.O\n";
    let out = depict(input, RenderOptions::default(), &DepictConfig::default());

    assert_eq!(out.format, InputFormat::Lines);
    let titles: Vec<_> = out.fragments.iter().map(|f| f.title.as_str()).collect();
    assert_eq!(titles, ["ethanol", "benzene", "#5"]);

    let html = out.to_html();
    assert!(html.contains("download=\"ethanol.png\""));
    assert!(html.contains("chemdiv reaction"));
    assert!(html.contains("<div class=\"title\">benzene</div>"));
}

#[test]
fn test_sd_file_blocks() {
    let mol = |name: &str| {
        format!(
            "{name}\n  CDK\n\n  1  0  0  0  0  0            999 V2000\n    0.0000    0.0000    0.0000 C   0  0\nM  END\n"
        )
    };
    let input = format!("{}$$$$\n{}$$$$\n", mol("methane"), mol("carbon"));
    let out = depict(&input, RenderOptions::default(), &DepictConfig::default());

    assert_eq!(out.format, InputFormat::Blocks);
    assert_eq!(out.fragments.len(), 2);
    assert_eq!(out.fragments[1].title, "carbon");
    assert!(out.fragments[0].urls.svg.contains("smi=methane%0A%20%20CDK"));
}

#[test]
fn test_overflow_warns_and_truncates() {
    let input: String = (1..=501).map(|i| format!("C{i}\n")).collect();
    let out = depict(&input, RenderOptions::default(), &DepictConfig::default());
    assert_eq!(out.fragments.len(), 500);
    assert_eq!(out.stats.truncated, 1);
    assert_eq!(
        out.warnings,
        vec![Warning::Truncated {
            limit: 500,
            available: 501
        }]
    );
}

#[test]
fn test_output_is_json_serialisable() {
    let out = depict("CCO ethanol", RenderOptions::default(), &DepictConfig::default());
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["fragments"][0]["title"], "ethanol");
    assert_eq!(json["fragments"][0]["status"]["state"], "pending");
    assert_eq!(json["options"]["style"], "cow");
}

// ── File I/O ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_read_and_write_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.smi");
    tokio::fs::write(&input, "CCO ethanol\n").await.unwrap();

    let text = read_input(&input).await.unwrap();
    let out = depict(&text, RenderOptions::default(), &DepictConfig::default());

    let target = dir.path().join("nested/out.html");
    write_output(&target, &out.to_html()).await.unwrap();
    let written = tokio::fs::read_to_string(&target).await.unwrap();
    assert!(written.contains("ethanol.svg"));
    assert!(!dir.path().join("nested/out.html.tmp").exists());
}

// ── Probing against the fake service ─────────────────────────────────────────

#[tokio::test]
async fn test_checked_replaces_broken_images() {
    let root = spawn_service(Duration::ZERO).await;
    let counter = Arc::new(Counter::default());
    let config = DepictConfig::builder()
        .root_url(&root)
        .timeout_secs(5)
        .progress_callback(counter.clone())
        .build()
        .unwrap();

    let out = depict_checked("CCO ethanol\nC1CC broken\nCCN", RenderOptions::default(), &config)
        .await
        .unwrap();

    assert_eq!(out.fragments[0].status, ImageStatus::Loaded);
    assert_eq!(
        out.fragments[1].status,
        ImageStatus::Errored {
            message: "Could not parse input: unclosed ring C1CC".into()
        }
    );
    assert_eq!(out.fragments[2].status, ImageStatus::Loaded);
    assert_eq!(out.stats.loaded, 2);
    assert_eq!(out.stats.errored, 1);

    let html = out.fragments[1].to_html();
    assert!(html.contains("<div class=\"error-mesg\">Could not parse input: unclosed ring C1CC</div>"));
    assert!(html.contains("<div class=\"title\">broken</div>"));

    assert_eq!(counter.loaded.load(Ordering::SeqCst), 2);
    assert_eq!(counter.errors.load(Ordering::SeqCst), 1);
    assert_eq!(counter.completed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unreachable_service_gets_generic_label() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap().port()
    };
    let config = config_for(&format!("http://127.0.0.1:{port}"));
    let out = depict_checked("CCO", RenderOptions::default(), &config)
        .await
        .unwrap();
    assert_eq!(
        out.fragments[0].status,
        ImageStatus::Errored {
            message: "Depiction service unreachable".into()
        }
    );
}

#[tokio::test]
async fn test_stream_outcomes_apply_to_board() {
    let root = spawn_service(Duration::ZERO).await;
    let config = config_for(&root);
    let mut board = Board::new(config.clone());
    board.render("C\nC1CC x\nCC\nCCC", RenderOptions::default());

    let handle = board.handle().unwrap();
    let mut stream = probe_stream(handle, &config).unwrap();
    let mut applied = 0;
    while let Some(outcome) = stream.next().await {
        if board.apply(&outcome) {
            applied += 1;
        }
    }
    assert_eq!(applied, 4);
    let out = board.output().unwrap();
    assert_eq!(out.stats.loaded, 3);
    assert!(out.fragments[1].is_errored());
}

#[tokio::test]
async fn test_rerender_discards_late_results() {
    let root = spawn_service(Duration::from_millis(200)).await;
    let config = config_for(&root);
    let mut board = Board::new(config.clone());
    board.render("C\nCC", RenderOptions::default());
    let old = board.handle().unwrap();

    // A prober that ignores the board's cancellation...
    let detached = PassHandle {
        token: CancellationToken::new(),
        ..old.clone()
    };
    let late = tokio::spawn({
        let config = config.clone();
        async move { probe_pass(&detached, &config).await.unwrap() }
    });

    // ...while the user re-renders.
    tokio::time::sleep(Duration::from_millis(20)).await;
    board.render("CCC\nC1CC y", RenderOptions::default());
    assert!(old.token.is_cancelled());

    let outcomes = late.await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.generation == 1));
    assert!(outcomes.iter().all(|o| !board.apply(o)));
    let pass = board.current().unwrap();
    assert_eq!(pass.generation, 2);
    assert!(pass.fragments.iter().all(|f| f.status == ImageStatus::Pending));
}
