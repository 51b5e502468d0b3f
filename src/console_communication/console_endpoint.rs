use super::console_messenger::ConsoleMessenger;
use super::precland_messages::{
    BasicResponse, CameraConfigsResponse, CameraQuery, EnabledQuery, EnabledResponse,
    MavlinkTestResponse, SaveSettingsQuery, SettingsResponse, StatusResponse, TestResponse,
};
use crate::{error, info};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

type Messenger = State<Arc<ConsoleMessenger>>;

/// HTTP surface of the service for the operator console.
pub(crate) struct ConsoleEndpoint {
    local_addr: SocketAddr,
    close_oneshot_sender: Option<oneshot::Sender<()>>,
}

impl ConsoleEndpoint {
    /// Binds `bind` and serves the console routes until the endpoint is dropped.
    pub(crate) async fn start(
        bind: &str,
        messenger: Arc<ConsoleMessenger>,
    ) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind(bind).await?;
        let local_addr = listener.local_addr()?;
        let (close_oneshot_sender, close_oneshot_receiver) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let served = axum::serve(listener, Self::router(messenger))
                .with_graceful_shutdown(async move {
                    let _ = close_oneshot_receiver.await;
                })
                .await;
            if let Err(err) = served {
                error!("Console endpoint stopped: {err}");
            }
        });
        info!("Console endpoint listening on {local_addr}");
        Ok(Self { local_addr, close_oneshot_sender: Some(close_oneshot_sender) })
    }

    pub(crate) fn local_addr(&self) -> SocketAddr { self.local_addr }

    pub(crate) fn router(messenger: Arc<ConsoleMessenger>) -> Router {
        Router::new()
            .route("/precision-landing/start", post(start_handler))
            .route("/precision-landing/stop", post(stop_handler))
            .route("/precision-landing/status", get(status_handler))
            .route(
                "/precision-landing/get-enabled-state",
                get(enabled_state_handler).post(enabled_state_handler),
            )
            .route("/precision-landing/save-enabled-state", post(save_enabled_state_handler))
            .route("/precision-landing/test", post(test_handler))
            .route("/precision-landing/test-mavlink", post(test_mavlink_handler))
            .route(
                "/precision-landing/get-settings",
                get(settings_handler).post(settings_handler),
            )
            .route("/precision-landing/save-settings", post(save_settings_handler))
            .route("/precision-landing/camera-configs", get(camera_configs_handler))
            .with_state(messenger)
    }
}

impl Drop for ConsoleEndpoint {
    fn drop(&mut self) {
        if let Some(sender) = self.close_oneshot_sender.take() {
            let _ = sender.send(());
        }
    }
}

async fn start_handler(State(m): Messenger, Query(q): Query<CameraQuery>) -> Json<BasicResponse> {
    Json(m.start(&q.camera_type, q.rtsp.as_deref()).await)
}

async fn stop_handler(State(m): Messenger) -> Json<BasicResponse> { Json(m.stop().await) }

async fn status_handler(State(m): Messenger) -> Json<StatusResponse> { Json(m.status()) }

async fn enabled_state_handler(State(m): Messenger) -> Json<EnabledResponse> {
    Json(m.enabled_state().await)
}

async fn save_enabled_state_handler(
    State(m): Messenger,
    Query(q): Query<EnabledQuery>,
) -> Json<BasicResponse> {
    Json(m.save_enabled_state(q.enabled).await)
}

async fn test_handler(State(m): Messenger, Query(q): Query<CameraQuery>) -> Json<TestResponse> {
    Json(m.test(&q.camera_type, q.rtsp.as_deref()).await)
}

async fn test_mavlink_handler(State(m): Messenger) -> Json<MavlinkTestResponse> {
    Json(m.test_mavlink().await)
}

async fn settings_handler(State(m): Messenger) -> Json<SettingsResponse> {
    Json(m.settings().await)
}

async fn save_settings_handler(
    State(m): Messenger,
    Query(q): Query<SaveSettingsQuery>,
) -> Json<BasicResponse> {
    Json(m.save_settings(&q).await)
}

async fn camera_configs_handler(State(m): Messenger) -> Json<CameraConfigsResponse> {
    Json(m.camera_configs().await)
}
