use super::*;
use axum::http::{Method, StatusCode};

#[tokio::test]
async fn test_health_endpoint() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let app = env.router(FakeLauncher::new(&[]));

    let response = send(&app, Method::GET, "/health", None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await?;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "price-watcher");

    Ok(())
}

#[tokio::test]
async fn test_list_rules() -> anyhow::Result<()> {
    let env = TestEnv::with_rules(&[lens(), camera()]);
    let app = env.router(FakeLauncher::new(&[]));

    let response = send(&app, Method::GET, "/api/v1/rules", None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await?;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"][0]["name"], "Lens");
    assert_eq!(json["data"][0]["target_price"], 50000.0);
    assert_eq!(json["data"][1]["attribute"], "content");

    Ok(())
}

#[tokio::test]
async fn test_list_rules_without_file() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let app = env.router(FakeLauncher::new(&[]));

    let response = send(&app, Method::GET, "/api/v1/rules", None).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await?;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "NOT_FOUND");

    Ok(())
}

#[tokio::test]
async fn test_state_endpoint() -> anyhow::Result<()> {
    let env = TestEnv::new();
    env.seed_state(&[("Lens", 45800.0, "https://shop.example/lens")]);
    let app = env.router(FakeLauncher::new(&[]));

    let json = body_json(send(&app, Method::GET, "/api/v1/state", None).await?).await?;
    assert_eq!(json["data"]["Lens"]["last_price"], 45800.0);
    assert_eq!(json["data"]["Lens"]["updated_at"], 1_700_000_000);

    Ok(())
}

#[tokio::test]
async fn test_corrupt_state_is_unprocessable() -> anyhow::Result<()> {
    let env = TestEnv::new();
    std::fs::write(env.state_path(), "not json")?;
    let app = env.router(FakeLauncher::new(&[]));

    let response = send(&app, Method::GET, "/api/v1/state", None).await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    Ok(())
}

#[tokio::test]
async fn test_run_endpoint_returns_summary() -> anyhow::Result<()> {
    let env = TestEnv::with_rules(&[lens(), camera()]);
    let app = env.router(FakeLauncher::new(&[
        ("https://shop.example/lens", lens_page("¥45,800")),
        ("https://shop.example/camera", camera_page("not listed")),
    ]));

    let response = send(&app, Method::POST, "/api/v1/run", None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await?;
    assert_eq!(json["data"]["succeeded"], 1);
    assert_eq!(json["data"]["failed"], 1);
    assert_eq!(json["data"]["notified"], 1);
    assert_eq!(json["data"]["status_lines"][0], "[OK] Lens: ¥45,800");

    Ok(())
}
