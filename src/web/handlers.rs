use askama::Template;
use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{ApiError, ApiResponse, AppState};
use crate::core::CycleReport;
use crate::models::{PriceState, ProductRule};
use crate::utils::error::AppError;
use crate::utils::format::format_price;

pub struct ResultRow {
    pub name: String,
    pub price: String,
    pub updated: String,
    pub url: String,
}

#[derive(Template)]
#[template(path = "results.html")]
pub struct ResultsTemplate {
    pub rows: Vec<ResultRow>,
    pub status_lines: Vec<String>,
    pub error: Option<String>,
    pub ran: bool,
}

pub struct RuleRow {
    pub name: String,
    pub url: String,
    pub selector: String,
    pub target: String,
}

#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub rules: Vec<RuleRow>,
    pub form: RuleForm,
    pub editing: bool,
    pub error: Option<String>,
}

/// The add/edit form. Every field arrives as text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleForm {
    /// Name of the rule being edited; empty when adding.
    pub original_name: String,
    pub name: String,
    pub url: String,
    pub selector: String,
    pub wait_selector: String,
    pub attribute: String,
    pub target_price: String,
}

impl RuleForm {
    fn from_rule(rule: &ProductRule) -> Self {
        Self {
            original_name: rule.name.clone(),
            name: rule.name.clone(),
            url: rule.url.clone(),
            selector: rule.selector.clone(),
            wait_selector: rule.wait_selector.clone().unwrap_or_default(),
            attribute: rule.attribute.clone().unwrap_or_default(),
            target_price: rule.target_price.map(|t| t.to_string()).unwrap_or_default(),
        }
    }

    /// Blank optional fields and a target of zero or less mean "unset".
    pub fn to_rule(&self) -> Result<ProductRule, AppError> {
        let target_price = match self.target_price.trim() {
            "" => None,
            raw => {
                let value: f64 = raw.parse().map_err(|_| {
                    AppError::Validation(format!("Target price must be a number: {}", raw))
                })?;
                (value > 0.0).then_some(value)
            }
        };

        let optional = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        let rule = ProductRule {
            name: self.name.trim().to_string(),
            url: self.url.trim().to_string(),
            selector: self.selector.trim().to_string(),
            wait_selector: optional(&self.wait_selector),
            attribute: optional(&self.attribute),
            target_price,
        };
        rule.validate()?;
        Ok(rule)
    }
}

#[derive(Debug, Deserialize)]
pub struct EditQuery {
    pub edit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub status_lines: Vec<String>,
    pub succeeded: usize,
    pub failed: usize,
    pub notified: usize,
}

impl From<&CycleReport> for RunSummary {
    fn from(report: &CycleReport) -> Self {
        Self {
            status_lines: report.status_lines(),
            succeeded: report.succeeded(),
            failed: report.failed(),
            notified: report.notified(),
        }
    }
}

fn result_rows(state: &PriceState) -> Vec<ResultRow> {
    state
        .iter()
        .map(|(name, observation)| ResultRow {
            name: name.clone(),
            price: format_price(observation.last_price),
            updated: observation
                .updated_at_local()
                .map(|t| t.format("%Y/%m/%d %H:%M").to_string())
                .unwrap_or_default(),
            url: observation.url.clone(),
        })
        .collect()
}

fn results_template(app: &AppState) -> ResultsTemplate {
    match app.state.load_state() {
        Ok(state) => ResultsTemplate {
            rows: result_rows(&state),
            status_lines: Vec::new(),
            error: None,
            ran: false,
        },
        Err(e) => ResultsTemplate {
            rows: Vec::new(),
            status_lines: Vec::new(),
            error: Some(e.to_string()),
            ran: false,
        },
    }
}

async fn run_guarded(app: &AppState) -> Result<CycleReport, AppError> {
    let _guard = app.run_lock.lock().await;
    info!("Manual run requested");
    app.runner.run_cycle().await
}

// Page handlers
pub async fn results_page(State(app): State<AppState>) -> ResultsTemplate {
    results_template(&app)
}

pub async fn run_now(State(app): State<AppState>) -> Response {
    let outcome = run_guarded(&app).await;
    let mut page = results_template(&app);
    page.ran = true;

    match outcome {
        Ok(report) => {
            page.status_lines = report.status_lines();
            page.into_response()
        }
        Err(e) => {
            error!(error = %e, "Manual run failed");
            page.error = Some(e.to_string());
            let status = ApiError::from(e).status_code();
            (status, page).into_response()
        }
    }
}

fn settings_template(app: &AppState, form: RuleForm, error: Option<String>) -> SettingsTemplate {
    let (rules, load_error) = match app.rules.load_or_empty() {
        Ok(rules) => (rules, None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };

    SettingsTemplate {
        rules: rules
            .iter()
            .map(|rule| RuleRow {
                name: rule.name.clone(),
                url: rule.url.clone(),
                selector: rule.selector.clone(),
                target: rule.target_price.map(format_price).unwrap_or_default(),
            })
            .collect(),
        editing: !form.original_name.is_empty(),
        form,
        error: error.or(load_error),
    }
}

pub async fn settings_page(
    State(app): State<AppState>,
    Query(query): Query<EditQuery>,
) -> SettingsTemplate {
    let form = query
        .edit
        .filter(|name| !name.is_empty())
        .and_then(|name| {
            app.rules
                .load_or_empty()
                .ok()?
                .into_iter()
                .find(|rule| rule.name == name)
        })
        .map(|rule| RuleForm::from_rule(&rule))
        .unwrap_or_default();

    settings_template(&app, form, None)
}

pub async fn save_rule(State(app): State<AppState>, Form(form): Form<RuleForm>) -> Response {
    let original = (!form.original_name.is_empty()).then(|| form.original_name.clone());
    let result = form
        .to_rule()
        .and_then(|rule| app.rules.upsert(original.as_deref(), rule));

    match result {
        Ok(()) => Redirect::to("/settings").into_response(),
        Err(AppError::Validation(msg)) => {
            let page = settings_template(&app, form, Some(msg));
            (StatusCode::UNPROCESSABLE_ENTITY, page).into_response()
        }
        Err(e @ AppError::DuplicateName(_)) => {
            let page = settings_template(&app, form, Some(e.to_string()));
            (StatusCode::UNPROCESSABLE_ENTITY, page).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to save product rule");
            let page = settings_template(&app, form, Some(e.to_string()));
            (StatusCode::INTERNAL_SERVER_ERROR, page).into_response()
        }
    }
}

pub async fn delete_rule(State(app): State<AppState>, Form(form): Form<DeleteForm>) -> Response {
    match app.rules.remove(&form.name) {
        Ok(_) => Redirect::to("/settings").into_response(),
        Err(e) => {
            error!(product = %form.name, error = %e, "Failed to delete product rule");
            let page = settings_template(&app, RuleForm::default(), Some(e.to_string()));
            (StatusCode::INTERNAL_SERVER_ERROR, page).into_response()
        }
    }
}

// API handlers
pub async fn api_list_rules(
    State(app): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ProductRule>>>, ApiError> {
    let rules = app.rules.load_rules()?;
    Ok(Json(ApiResponse::success(rules)))
}

pub async fn api_state(
    State(app): State<AppState>,
) -> Result<Json<ApiResponse<PriceState>>, ApiError> {
    let state = app.state.load_state()?;
    Ok(Json(ApiResponse::success(state)))
}

pub async fn api_run(State(app): State<AppState>) -> Result<Json<ApiResponse<RunSummary>>, ApiError> {
    let report = run_guarded(&app).await?;
    Ok(Json(ApiResponse::success(RunSummary::from(&report))))
}
