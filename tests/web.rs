use std::fs;
use std::path::Path;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App, Error};
use tempfile::TempDir;

use logjack::config::{Config, DirectoryConfig};
use logjack::server::registry::DirectoryRegistry;
use logjack::server::{routes, AppState, Server};

fn state_for(dirs: &[(&str, &Path)]) -> AppState {
    let registry = DirectoryRegistry::from_entries(
        dirs.iter()
            .map(|(name, path)| ((*name).to_string(), path.to_path_buf())),
    );
    AppState::new(registry).unwrap()
}

async fn service(
    state: AppState,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = Error>
{
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes),
    )
    .await
}

async fn body_string(resp: ServiceResponse<impl MessageBody>) -> String {
    let body = test::read_body(resp).await;
    String::from_utf8_lossy(&body).into_owned()
}

#[actix_web::test]
async fn single_directory_root_lists_its_contents_directly() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.log"), "hello world").unwrap();
    let app = service(state_for(&[("Logs", dir.path())])).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("app.log"));
    // No virtual root page and no back link at the true root.
    assert!(!body.contains("&larr; Back"));
}

#[actix_web::test]
async fn multi_directory_root_lists_pseudo_directories() {
    let logs = TempDir::new().unwrap();
    let saves = TempDir::new().unwrap();
    fs::write(logs.path().join("app.log"), "x").unwrap();
    let app = service(state_for(&[("Logs", logs.path()), ("Saves", saves.path())])).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains(r#"href="/Logs""#));
    assert!(body.contains(r#"href="/Saves""#));
    // Registry names only, not directory contents.
    assert!(!body.contains("app.log"));
}

#[actix_web::test]
async fn browsing_a_file_transfers_its_bytes() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.log"), "line one\nline two\n").unwrap();
    let app = service(state_for(&[("Logs", dir.path())])).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/Logs/app.log").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "line one\nline two\n");
}

#[actix_web::test]
async fn browsing_a_sub_directory_links_back_to_its_parent() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("inner.log"), "x").unwrap();
    let app = service(state_for(&[("Logs", dir.path())])).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/Logs/sub").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("inner.log"));
    assert!(body.contains(r#"href="/Logs""#));
}

#[actix_web::test]
async fn traversal_escape_is_forbidden() {
    let dir = TempDir::new().unwrap();
    let app = service(state_for(&[("Logs", dir.path())])).await;

    for uri in [
        "/Logs/../../etc/passwd",
        "/Logs/%2e%2e/%2e%2e/etc/passwd",
        "/Logs/a/../../secret",
        "/view/Logs/../../etc/passwd",
        "/download/Logs/../../etc/passwd",
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "uri {:?}", uri);
    }
}

#[actix_web::test]
async fn unknown_directory_and_missing_file_are_not_found() {
    let dir = TempDir::new().unwrap();
    let app = service(state_for(&[("Logs", dir.path())])).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/Nope").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/Logs/nope.txt").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn view_renders_file_content_as_html() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.log"), "hello <world>").unwrap();
    let app = service(state_for(&[("Logs", dir.path())])).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/view/Logs/app.log").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/html"));
    let body = body_string(resp).await;
    assert!(body.contains("hello &lt;world&gt;"));
    assert!(body.contains("/Logs/app.log"));
}

#[actix_web::test]
async fn view_of_a_directory_is_not_found() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let app = service(state_for(&[("Logs", dir.path())])).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/view/Logs/sub").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn view_with_an_empty_sub_path_is_not_found() {
    // A root misconfigured to point at a file instead of a directory: the
    // viewer has no base name to show and must 404 rather than guess.
    let dir = TempDir::new().unwrap();
    let file_root = dir.path().join("app.log");
    fs::write(&file_root, "not a directory").unwrap();
    let app = service(state_for(&[("Logs", file_root.as_path())])).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/view/Logs/").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn view_truncates_oversized_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("big.log"), "x".repeat(2 * 1024 * 1024)).unwrap();
    let app = service(state_for(&[("Logs", dir.path())])).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/view/Logs/big.log").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("showing the beginning only"));
}

#[actix_web::test]
async fn download_forces_an_attachment_disposition() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.log"), "payload").unwrap();
    let app = service(state_for(&[("Logs", dir.path())])).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/download/Logs/app.log")
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("app.log"));
    assert_eq!(body_string(resp).await, "payload");
}

#[actix_web::test]
async fn delete_removes_the_file_and_redirects_to_the_parent() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("app.log");
    fs::write(&target, "bye").unwrap();
    let app = service(state_for(&[("Logs", dir.path())])).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/delete/Logs/app.log")
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/Logs?delete=1"
    );
    assert!(!target.exists());

    let resp = test::call_service(&app, test::TestRequest::get().uri("/Logs").to_request()).await;
    let body = body_string(resp).await;
    assert!(!body.contains("app.log"));
}

#[actix_web::test]
async fn delete_of_a_nested_file_redirects_to_its_directory() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("inner.log"), "x").unwrap();
    let app = service(state_for(&[("Logs", dir.path())])).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/delete/Logs/sub/inner.log")
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/Logs/sub?delete=1"
    );
}

#[actix_web::test]
async fn delete_of_a_directory_is_recursive() {
    let dir = TempDir::new().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir_all(sub.join("nested")).unwrap();
    fs::write(sub.join("nested").join("deep.log"), "x").unwrap();
    let app = service(state_for(&[("Logs", dir.path())])).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post().uri("/delete/Logs/sub").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(!sub.exists());
}

#[actix_web::test]
async fn delete_with_wrong_method_is_rejected_without_mutation() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("app.log");
    fs::write(&target, "still here").unwrap();
    let app = service(state_for(&[("Logs", dir.path())])).await;

    let requests = [
        test::TestRequest::get().uri("/delete/Logs/app.log"),
        test::TestRequest::put().uri("/delete/Logs/app.log"),
        test::TestRequest::delete().uri("/delete/Logs/app.log"),
    ];
    for request in requests {
        let resp = test::call_service(&app, request.to_request()).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(target.exists());
    }
}

#[actix_web::test]
async fn delete_of_a_missing_target_is_not_found() {
    let dir = TempDir::new().unwrap();
    let app = service(state_for(&[("Logs", dir.path())])).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/delete/Logs/ghost.log")
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn deletion_marker_surfaces_a_notice() {
    let dir = TempDir::new().unwrap();
    let app = service(state_for(&[("Logs", dir.path())])).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/Logs?delete=1").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("Deleted."));
}

#[actix_web::test]
async fn server_starts_serves_and_stops() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.log"), "over the wire").unwrap();
    let config = Config {
        directories: vec![DirectoryConfig {
            name: "Logs".to_string(),
            path: dir.path().display().to_string(),
        }],
    };

    let server = Server::start_on(&config, 0).unwrap();
    assert!(server.url().starts_with("http://"));
    let port: u16 = server.url().rsplit(':').next().unwrap().parse().unwrap();

    let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
        .await
        .unwrap();
    stream
        .write_all(b"GET /Logs/app.log HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8_lossy(&response);
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("over the wire"));

    server.stop().await;
}
