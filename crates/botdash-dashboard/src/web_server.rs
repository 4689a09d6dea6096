//! HTTP server for the report proxy API and the server-rendered report pages.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::sync::Arc;

use axum::extract::{Path as AxumPath, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use botdash_client::{ReportController, ReportSource, ViewState};
use botdash_report::table::html_escape;
use botdash_report::ReportError;
use serde::Deserialize;

use crate::config::ServerConfig;
use crate::upstream::{InProcessSource, ReportProxy};

const NO_RESULTS_TEXT: &str = "No results found for that search term.";

#[derive(Clone)]
struct WebState {
    proxy: Arc<ReportProxy>,
}

pub struct WebServer {
    bind_addr: String,
    proxy: Arc<ReportProxy>,
}

impl WebServer {
    pub fn new(config: &ServerConfig) -> Result<Self, anyhow::Error> {
        Ok(Self {
            bind_addr: config.bind_addr.clone(),
            proxy: Arc::new(ReportProxy::new(config)?),
        })
    }

    pub async fn run(self) -> Result<(), anyhow::Error> {
        let app = router(self.proxy);
        let listener = tokio::net::TcpListener::bind(&self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "Report dashboard listening");
        axum::serve(listener, app).await?;
        Ok(())
    }
}

pub fn router(proxy: Arc<ReportProxy>) -> Router {
    Router::new()
        .route("/api/health", get(api_health))
        .route("/api/bot_reports/with-log-sources", get(api_log_sources))
        .route("/api/bot_reports/show-custom-table", get(api_show_custom_table))
        .route("/bot_reports", get(bot_reports_page))
        .route("/view_log_table/:source_id", get(view_log_table))
        .route("/view_log_table/:source_id/export.csv", get(export_log_table))
        .with_state(WebState { proxy })
}

async fn api_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"ok": true, "service": "botdash-web"}))
}

async fn api_log_sources(State(web): State<WebState>) -> Json<serde_json::Value> {
    Json(serde_json::to_value(web.proxy.active_sources()).unwrap_or_else(|_| serde_json::json!([])))
}

async fn api_show_custom_table(
    State(web): State<WebState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let reply = web
        .proxy
        .show_custom_table(params.get("source_id").map(String::as_str))
        .await;
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(reply.body)).into_response()
}

async fn bot_reports_page(State(web): State<WebState>) -> Html<String> {
    let mut by_bot: BTreeMap<String, Vec<_>> = BTreeMap::new();
    for source in web.proxy.active_sources() {
        by_bot.entry(source.bot_name.clone()).or_default().push(source);
    }

    let mut body = String::from("<h1>Bot Reports</h1>\n");
    if by_bot.is_empty() {
        body.push_str("<p class=\"placeholder\">No active report sources.</p>\n");
    }
    for (bot, sources) in &by_bot {
        let _ = writeln!(body, "<section>\n<h2>Bot: {}</h2>\n<ul>", html_escape(bot));
        for s in sources {
            let _ = writeln!(
                body,
                "<li><a href=\"/view_log_table/{}\">{}</a></li>",
                s.id,
                html_escape(&s.display_name)
            );
        }
        body.push_str("</ul>\n</section>\n");
    }

    Html(page("Bot Reports", &body))
}

#[derive(Deserialize, Default)]
struct ViewQuery {
    q: Option<String>,
}

/// Run one controller for this request: load, apply the search term.
async fn load_view(
    proxy: &Arc<ReportProxy>,
    source_id: &str,
    term: Option<&str>,
) -> ReportController<InProcessSource> {
    let mut controller = ReportController::new(InProcessSource::new(proxy.clone()));
    controller.initialize(source_id).await;
    if let Some(term) = term {
        controller.on_search_input(term);
    }
    controller
}

async fn view_log_table(
    State(web): State<WebState>,
    AxumPath(source_id): AxumPath<String>,
    Query(params): Query<ViewQuery>,
) -> Html<String> {
    let controller = load_view(&web.proxy, &source_id, params.q.as_deref()).await;
    Html(render_report_page(&source_id, params.q.as_deref().unwrap_or(""), &controller))
}

async fn export_log_table(
    State(web): State<WebState>,
    AxumPath(source_id): AxumPath<String>,
    Query(params): Query<ViewQuery>,
) -> Response {
    let mut controller = load_view(&web.proxy, &source_id, params.q.as_deref()).await;

    if let Some(export) = controller.on_export_request() {
        let disposition = format!("attachment; filename=\"{}\"", export.filename);
        return (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, export.mime.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            export.content,
        )
            .into_response();
    }

    match controller.state() {
        ViewState::Failed(e @ ReportError::InvalidSourceId(_)) => {
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        ViewState::Failed(e) => (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
        _ => {
            let text = controller
                .take_notice()
                .map(|n| n.text)
                .unwrap_or_else(|| ReportError::ExportWithNoData.to_string());
            (StatusCode::NOT_FOUND, text).into_response()
        }
    }
}

/// Full report page for the controller's current state.
pub fn render_report_page<S: ReportSource>(
    source_id: &str,
    raw_term: &str,
    controller: &ReportController<S>,
) -> String {
    let info = controller.info();
    let (title, subtitle) = match controller.state() {
        ViewState::Failed(_) => (
            format!("Error Loading Report (ID: {})", source_id),
            String::new(),
        ),
        _ => (info.display_name.clone(), format!("Endpoint: {}", info.endpoint)),
    };

    let mut body = String::new();
    let _ = writeln!(body, "<h1 id=\"reportTitle\">{}</h1>", html_escape(&title));
    if !subtitle.is_empty() {
        let _ = writeln!(body, "<p id=\"reportSubtitle\">{}</p>", html_escape(&subtitle));
    }
    if let Some(bot) = &info.bot_name {
        let _ = writeln!(body, "<p class=\"bot\">Bot: {}</p>", html_escape(bot));
    }

    let search_disabled = if controller.search_enabled() { "" } else { " disabled" };
    let export_disabled = if controller.export_enabled() { "" } else { " disabled" };
    let action = format!("/view_log_table/{}", html_escape(source_id));
    let _ = writeln!(
        body,
        "<form method=\"get\" action=\"{action}\">\
         <input id=\"logSearchInput\" type=\"search\" name=\"q\" value=\"{term}\"{search_disabled}>\
         </form>",
        term = html_escape(raw_term),
    );
    let _ = writeln!(
        body,
        "<form method=\"get\" action=\"{action}/export.csv\">\
         <input type=\"hidden\" name=\"q\" value=\"{term}\">\
         <button id=\"downloadExcelButton\" type=\"submit\"{export_disabled}>Download CSV</button>\
         </form>",
        term = html_escape(raw_term),
    );

    body.push_str("<div class=\"log-source-content\">\n");
    match controller.state() {
        ViewState::Ready => {
            body.push_str(&controller.table_view().to_html());
            if controller.no_results() {
                let _ = write!(body, "\n<p class=\"notice\">{}</p>", NO_RESULTS_TEXT);
            }
        }
        ViewState::NoData(panel) => {
            let _ = write!(
                body,
                "<div class=\"raw-panel\"><h4>{}</h4><pre>{}</pre></div>",
                html_escape(&panel.title),
                html_escape(&panel.raw)
            );
        }
        ViewState::Failed(e) => {
            let _ = write!(body, "<p class=\"error\">{}</p>", html_escape(&e.to_string()));
        }
        ViewState::Idle | ViewState::Loading { .. } => {
            body.push_str("<p class=\"loading\">Fetching report details...</p>");
        }
    }
    body.push_str("\n</div>\n");

    page(&title, &body)
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n\
         <head><meta charset=\"utf-8\"><title>{}</title></head>\n\
         <body>\n{}</body>\n</html>\n",
        html_escape(title),
        body
    )
}
