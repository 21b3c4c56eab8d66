use super::range::{RangeResponse, serve_range};
use crate::config::Settings;
use crate::store::{AssetStore, JsonAssetStore};
use anyhow::{Context, Result};
use axum::Router;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use log::{debug, error, info};
use std::path::{Component, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// 檢查中斷訊號的間隔
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct ServerState {
    pub store_path: PathBuf,
    pub preview_dir: PathBuf,
    pub chunk_size: u64,
}

impl ServerState {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            store_path: settings.store_path.clone(),
            preview_dir: settings.preview_dir.clone(),
            chunk_size: settings.server.chunk_size,
        }
    }
}

impl IntoResponse for RangeResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut builder = Response::builder().status(status);
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        builder
            .body(Body::from(self.body))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/videos/{id}", get(video))
        .route("/previews/{file}", get(preview))
        .with_state(Arc::new(state))
}

async fn health() -> &'static str {
    "ok"
}

/// 紀錄檔每次請求重新讀取，批次流程更新後不需重啟伺服器
async fn video(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let range = range_header(&headers);
    run_blocking(move || {
        let Ok(id) = id.parse::<u64>() else {
            return RangeResponse::not_found();
        };
        let store = match JsonAssetStore::load(&state.store_path) {
            Ok(store) => store,
            Err(e) => {
                error!("無法讀取紀錄檔: {e:#}");
                return RangeResponse::internal_error();
            }
        };
        match store.get(id) {
            Some(asset) => serve_range(&asset.path, range.as_deref(), state.chunk_size),
            None => RangeResponse::not_found(),
        }
    })
    .await
}

async fn preview(
    State(state): State<Arc<ServerState>>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !is_plain_file_name(&file) {
        debug!("拒絕預覽檔路徑: {file:?}");
        return RangeResponse::not_found().into_response();
    }
    let range = range_header(&headers);
    run_blocking(move || {
        serve_range(
            &state.preview_dir.join(&file),
            range.as_deref(),
            state.chunk_size,
        )
    })
    .await
}

fn range_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// 只接受單一層、非隱藏的檔名
fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
        return false;
    }
    let mut components = std::path::Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

async fn run_blocking<F>(task: F) -> Response
where
    F: FnOnce() -> RangeResponse + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            error!("讀取工作失敗: {e}");
            RangeResponse::internal_error().into_response()
        }
    }
}

/// 啟動伺服器，直到中斷訊號被設定
pub async fn serve(state: ServerState, bind: &str, shutdown: Arc<AtomicBool>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("無法監聽 {bind}"))?;
    let addr = listener.local_addr().context("無法取得監聽位址")?;
    info!("伺服器啟動於 http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(wait_for_shutdown(shutdown))
        .await
        .context("伺服器異常結束")?;

    info!("伺服器已關閉");
    Ok(())
}

/// 給同步流程（CLI、選單）使用
pub fn serve_blocking(state: ServerState, bind: &str, shutdown: Arc<AtomicBool>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("無法建立 tokio runtime")?;
    runtime.block_on(serve(state, bind, shutdown))
}

async fn wait_for_shutdown(shutdown: Arc<AtomicBool>) {
    while !shutdown.load(Ordering::SeqCst) {
        tokio::time::sleep(SHUTDOWN_POLL_INTERVAL).await;
    }
}
