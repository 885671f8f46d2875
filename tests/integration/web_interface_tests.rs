use super::*;
use axum::http::{header, Method, StatusCode};

fn html_content_type(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"))
}

#[tokio::test]
async fn test_results_page_without_data() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let app = env.router(FakeLauncher::new(&[]));

    let response = send(&app, Method::GET, "/", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(html_content_type(&response));

    let body = body_text(response).await?;
    assert!(body.contains("No data yet"));
    assert!(body.contains("Run now"));

    Ok(())
}

#[tokio::test]
async fn test_results_page_lists_state() -> anyhow::Result<()> {
    let env = TestEnv::with_rules(&[lens()]);
    env.seed_state(&[("Lens", 45800.0, "https://shop.example/lens")]);
    let app = env.router(FakeLauncher::new(&[]));

    let body = body_text(send(&app, Method::GET, "/", None).await?).await?;
    assert!(body.contains("Lens"));
    assert!(body.contains("¥45,800"));
    assert!(!body.contains("No data yet"));

    Ok(())
}

#[tokio::test]
async fn test_manual_run_shows_status_lines() -> anyhow::Result<()> {
    let env = TestEnv::with_rules(&[lens()]);
    let app = env.router(FakeLauncher::new(&[("https://shop.example/lens", lens_page("¥45,800"))]));

    let response = send(&app, Method::POST, "/run", None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await?;
    assert!(body.contains("[OK] Lens: ¥45,800"));
    assert_eq!(env.state.load_state()?["Lens"].last_price, 45800.0);

    Ok(())
}

#[tokio::test]
async fn test_manual_run_reports_missing_rules_file() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let app = env.router(FakeLauncher::new(&[]));

    let response = send(&app, Method::POST, "/run", None).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_text(response).await?;
    assert!(body.contains("Run failed"));
    assert!(body.contains("Configuration file not found"));

    Ok(())
}

#[tokio::test]
async fn test_settings_page_lists_rules_and_prefills_edit() -> anyhow::Result<()> {
    let env = TestEnv::with_rules(&[lens(), camera()]);
    let app = env.router(FakeLauncher::new(&[]));

    let body = body_text(send(&app, Method::GET, "/settings", None).await?).await?;
    assert!(body.contains("Lens"));
    assert!(body.contains("Camera"));
    assert!(body.contains("Add a product"));

    let body = body_text(send(&app, Method::GET, "/settings?edit=Camera", None).await?).await?;
    assert!(body.contains("Edit Camera"));
    assert!(body.contains(r#"name="original_name" value="Camera""#));
    assert!(body.contains(r#"name="attribute" value="content""#));

    Ok(())
}

#[tokio::test]
async fn test_add_rule_from_form() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let app = env.router(FakeLauncher::new(&[]));

    let form = "name=Lens&url=https%3A%2F%2Fshop.example%2Flens&selector=.price&wait_selector=&attribute=&target_price=45000";
    let response = send(&app, Method::POST, "/settings/rules", Some(form)).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/settings");

    let rules = env.rules.load_rules()?;
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].name, "Lens");
    assert_eq!(rules[0].target_price, Some(45000.0));
    assert_eq!(rules[0].wait_selector, None);

    Ok(())
}

#[tokio::test]
async fn test_edit_rule_replaces_in_place() -> anyhow::Result<()> {
    let env = TestEnv::with_rules(&[lens(), camera()]);
    let app = env.router(FakeLauncher::new(&[]));

    let form = "original_name=Lens&name=Lens+II&url=https%3A%2F%2Fshop.example%2Flens2&selector=.price&target_price=0";
    let response = send(&app, Method::POST, "/settings/rules", Some(form)).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let rules = env.rules.load_rules()?;
    let names: Vec<_> = rules.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Lens II", "Camera"]);
    assert_eq!(rules[0].target_price, None);

    Ok(())
}

#[tokio::test]
async fn test_invalid_form_is_unprocessable() -> anyhow::Result<()> {
    let env = TestEnv::with_rules(&[lens()]);
    let app = env.router(FakeLauncher::new(&[]));

    let form = "name=Camera&url=https%3A%2F%2Fshop.example%2Fcamera&selector=";
    let response = send(&app, Method::POST, "/settings/rules", Some(form)).await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_text(response).await?;
    assert!(body.contains("Price selector is required"));
    assert!(body.contains(r#"name="name" value="Camera""#));

    let form = "name=Lens&url=https%3A%2F%2Fshop.example%2Fother&selector=.p";
    let response = send(&app, Method::POST, "/settings/rules", Some(form)).await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await?.contains("already exists"));

    assert_eq!(env.rules.load_rules()?, vec![lens()]);

    Ok(())
}

#[tokio::test]
async fn test_delete_rule_keeps_state_entry() -> anyhow::Result<()> {
    let env = TestEnv::with_rules(&[lens(), camera()]);
    env.seed_state(&[("Lens", 45800.0, "https://shop.example/lens")]);
    let app = env.router(FakeLauncher::new(&[]));

    let response = send(&app, Method::POST, "/settings/rules/delete", Some("name=Lens")).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(env.rules.load_rules()?, vec![camera()]);
    assert!(env.state.load_state()?.contains_key("Lens"));

    Ok(())
}
