//! Dashboard shell: page layout and HTTP surface composition.

use crate::handlers::{self, AppState};
use crate::models::CustomerId;
use crate::render::escape_html;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Events are tiny JSON documents.
const MAX_EVENT_BYTES: usize = 16 * 1024;

const OPTIONS_PLACEHOLDER: &str = "<!--CUSTOMER_OPTIONS-->";

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Credit Eligibility Dashboard</title>
    <style>
        body { font-family: sans-serif; margin: 0 24px 24px; }
        h1 { text-align: center; color: pink; }
        .tabs { display: flex; border-bottom: 1px solid #d6d6d6; }
        .tab { flex: 1; padding: 12px; background: #f9f9f9; border: 1px solid #d6d6d6; cursor: pointer; }
        .tab.active { background: #fff; border-top: 2px solid #1975fa; border-bottom: none; }
        .panel { display: none; padding-top: 12px; }
        .panel.active { display: block; }
        .action { width: 200px; height: 40px; }
        .region { margin-top: 20px; }
        #client_id { width: 400px; height: 40px; }
    </style>
</head>
<body>
    <h1>WELCOME TO THE FINANCIAL COMPANY</h1>
    <br>
    <div class="tabs">
        <button class="tab active" data-panel="panel-prediction">ELIGIBILITY PREDICTION</button>
        <button class="tab" data-panel="panel-interpretation">INTERPRETATION OF RESULTS</button>
        <button class="tab" data-panel="panel-drift">DRIFT ANALYSIS</button>
    </div>

    <div id="panel-prediction" class="panel active">
        <h2>Client information:</h2>
        <select id="client_id">
            <option value="">Select a client ID</option>
<!--CUSTOMER_OPTIONS-->
        </select>
        <div id="client-info" class="region"></div>
        <br>
        <h2>Eligibility prediction results</h2>
        <button id="predict-button" class="action" data-action="predict">Prediction</button>
        <div id="client-prediction" class="region"></div>
        <hr>
        <h2>Local interpretation chart:</h2>
        <button id="inter-loc" class="action" data-action="local_interpretation">Local interpretation</button>
        <div id="local-graph" class="region"></div>
    </div>

    <div id="panel-interpretation" class="panel">
        <h2>Global interpretation chart:</h2>
        <button id="inter-glob" class="action" data-action="global_interpretation">Global interpretation</button>
        <div id="global-graph" class="region"></div>
    </div>

    <div id="panel-drift" class="panel">
        <h2>Drift analysis:</h2>
        <button id="drift-button" class="action" data-action="drift">Drift</button>
        <div id="drift-analysis" class="region"></div>
    </div>

    <script>
        let sessionId = null;
        let shown = {};
        let ready = null;

        function apply(snapshot) {
            for (const view of snapshot.regions) {
                if (view.revision <= (shown[view.region] || 0)) continue;
                shown[view.region] = view.revision;
                if (view.redirect) {
                    window.location.href = view.redirect;
                } else {
                    document.getElementById(view.region).innerHTML = view.html;
                }
            }
        }

        async function startSession() {
            const response = await fetch('/api/v1/sessions', { method: 'POST' });
            const body = await response.json();
            sessionId = body.session_id;
            shown = {};
            apply(body.snapshot);
        }

        async function send(event) {
            await ready;
            const current = sessionId;
            const post = () => fetch(`/api/v1/sessions/${sessionId}/events`, {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify(event),
            });
            let response = await post();
            if (response.status === 404) {
                if (sessionId === current) ready = startSession();
                await ready;
                response = await post();
            }
            if (response.ok) apply(await response.json());
        }

        document.getElementById('client_id').addEventListener('change', (e) => {
            send({ type: 'select', customer_id: e.target.value || null });
        });
        for (const button of document.querySelectorAll('.action')) {
            button.addEventListener('click', () => send({ type: 'press', action: button.dataset.action }));
        }
        for (const tab of document.querySelectorAll('.tab')) {
            tab.addEventListener('click', () => {
                document.querySelectorAll('.tab, .panel').forEach((el) => el.classList.remove('active'));
                tab.classList.add('active');
                document.getElementById(tab.dataset.panel).classList.add('active');
            });
        }
        ready = startSession();
    </script>
</body>
</html>
"#;

/// Renders the dashboard page with one dropdown option per customer, in
/// enumeration order.
pub fn page(customers: &[CustomerId]) -> String {
    let options: String = customers
        .iter()
        .map(|id| {
            let id = escape_html(id.as_str());
            format!("            <option value=\"{}\">{}</option>\n", id, id)
        })
        .collect();

    PAGE_TEMPLATE.replace(OPTIONS_PLACEHOLDER, options.trim_end())
}

/// Builds the dashboard router.
pub fn router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/v1/sessions", post(handlers::create_session))
        .route("/api/v1/sessions/:id", get(handlers::get_session))
        .route("/api/v1/sessions/:id/events", post(handlers::post_event))
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(MAX_EVENT_BYTES)));

    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/health", get(handlers::health))
        .merge(api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
