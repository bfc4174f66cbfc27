//! Servidor web Axum com WebSocket para avaliação interativa de segmentações

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use segeval_core::{
    corpus::demo_documents,
    encoder::encode_text,
    error::{EvalError, StreamSide},
    normalize::{normalize_prediction, resolve_placeholders},
    pipeline::{EvalEvent, EvalPipeline},
    tei::TeiDocument,
    tokenizer::read_prediction_stream,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Endereço padrão quando `SEGEVAL_ADDR` não está definido
const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Estado compartilhado da aplicação
struct AppState {
    /// Pausa entre eventos enviados pelo WebSocket (animação passo a passo)
    event_delay: Duration,
}

/// Pedido de avaliação (HTTP e WebSocket)
#[derive(Deserialize)]
struct EvaluateRequest {
    ground_truth: String,
    prediction: String,
    /// Entrada da gramática; ativa a resolução de placeholders
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl EvaluateRequest {
    fn pipeline(&self) -> EvalPipeline {
        let mut pipeline = EvalPipeline::new();
        if let Some(reference) = &self.reference {
            pipeline = pipeline.with_reference(reference.clone());
        }
        if let Some(name) = &self.name {
            pipeline = pipeline.with_source(name.clone());
        }
        pipeline
    }
}

#[derive(Deserialize)]
struct NormalizeRequest {
    reference: String,
    prediction: String,
}

#[derive(Deserialize)]
struct EncodeRequest {
    text: String,
}

#[derive(Deserialize)]
struct TeiRequest {
    prediction: String,
    #[serde(default)]
    reference: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    side: Option<StreamSide>,
}

fn bad_request(error: impl ToString, side: Option<StreamSide>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: error.to_string(),
            side,
        }),
    )
        .into_response()
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let state = Arc::new(AppState {
        event_delay: Duration::from_millis(35),
    });

    let addr = std::env::var("SEGEVAL_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Servidor de avaliação iniciado em http://{}", addr);
    axum::serve(listener, app(state)).await
}

fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/evaluate", post(evaluate_handler))
        .route("/normalize", post(normalize_handler))
        .route("/encode", post(encode_handler))
        .route("/tei", post(tei_handler))
        .route("/ws", get(ws_handler))
        .route("/demo-streams", get(demo_streams_handler))
        .layer(cors)
        .with_state(state)
}

/// Retorna a página principal HTML
async fn index_handler() -> impl IntoResponse {
    Html(include_str!("templates/index.html"))
}

/// Avaliação via HTTP POST (sem streaming)
async fn evaluate_handler(Json(req): Json<EvaluateRequest>) -> Response {
    if req.ground_truth.trim().is_empty() || req.prediction.trim().is_empty() {
        return bad_request("Fluxo vazio", None);
    }

    match req.pipeline().evaluate(&req.ground_truth, &req.prediction) {
        Ok(report) => Json(report).into_response(),
        Err(err) => {
            let side = match &err {
                EvalError::Stream { side, .. } => Some(*side),
                EvalError::Normalize(_) => Some(StreamSide::Prediction),
            };
            warn!("avaliação rejeitada: {}", err);
            bad_request(err, side)
        }
    }
}

/// Limpa a saída bruta do modelo
async fn normalize_handler(Json(req): Json<NormalizeRequest>) -> Response {
    match normalize_prediction(&req.reference, &req.prediction) {
        Ok(normalized) => Json(serde_json::json!({ "normalized": normalized })).into_response(),
        Err(err) => bad_request(err, Some(StreamSide::Prediction)),
    }
}

/// Gera a entrada da gramática a partir de texto bruto
async fn encode_handler(Json(req): Json<EncodeRequest>) -> impl IntoResponse {
    Json(serde_json::json!({ "stream": encode_text(&req.text) }))
}

/// Exporta uma predição como TEI-XML
async fn tei_handler(Json(req): Json<TeiRequest>) -> Response {
    let tokens = match &req.reference {
        Some(reference) => match resolve_placeholders(reference, &req.prediction) {
            Ok(tokens) => tokens,
            Err(err) => return bad_request(err, Some(StreamSide::Prediction)),
        },
        None => read_prediction_stream(&req.prediction),
    };
    match TeiDocument::from_tokens(&tokens) {
        Ok(doc) => ([(header::CONTENT_TYPE, "application/xml")], doc.to_xml()).into_response(),
        Err(err) => bad_request(err, Some(StreamSide::Prediction)),
    }
}

/// Retorna os documentos de demonstração
async fn demo_streams_handler() -> impl IntoResponse {
    let docs: Vec<serde_json::Value> = demo_documents()
        .iter()
        .map(|doc| {
            serde_json::json!({
                "name": doc.name,
                "text": doc.text,
                "ground_truth": doc.ground_truth,
                "prediction": doc.prediction,
                "reference": doc.reference(),
            })
        })
        .collect();
    Json(docs)
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Lógica do WebSocket: recebe um pedido, executa o pipeline e envia os eventos
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                let req = match serde_json::from_str::<EvaluateRequest>(&text) {
                    Ok(req) => req,
                    Err(err) => {
                        let event = EvalEvent::Error {
                            side: None,
                            message: format!("pedido inválido: {}", err),
                        };
                        if send_event(&mut socket, &event).await.is_err() {
                            return;
                        }
                        continue;
                    }
                };

                info!(
                    "Avaliando via WebSocket: {} / {} bytes",
                    req.ground_truth.len(),
                    req.prediction.len()
                );

                // O pipeline é síncrono: roda fora do runtime
                let (tx, rx) = std::sync::mpsc::channel::<EvalEvent>();
                let handle = tokio::task::spawn_blocking(move || {
                    req.pipeline().evaluate_streaming(&req.ground_truth, &req.prediction, tx);
                });
                if let Err(err) = handle.await {
                    warn!("pipeline interrompido: {}", err);
                    continue;
                }

                // Coleta os eventos numa Vec (o Receiver não é Send)
                let events: Vec<EvalEvent> = rx.try_iter().collect();
                for event in &events {
                    if send_event(&mut socket, event).await.is_err() {
                        return; // cliente desconectou
                    }
                    tokio::time::sleep(state.event_delay).await;
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &EvalEvent) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(Message::Text(json)).await,
        Err(err) => {
            warn!("evento não serializável: {}", err);
            Ok(())
        }
    }
}
