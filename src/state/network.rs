use crate::state::messages::{NetworkRequest, NetworkResponse};
use crate::state::store::{ScheduleSource, ScheduleStore};
use gdq_api::client::ApiError;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Serves refresh requests one at a time against the schedule store.
pub struct NetworkWorker<S> {
    store: Arc<ScheduleStore<S>>,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
}

impl<S: ScheduleSource> NetworkWorker<S> {
    pub fn new(
        store: Arc<ScheduleStore<S>>,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self { store, requests, responses }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let result = match request {
                NetworkRequest::LoadSchedule => self.handle_load_schedule().await,
                NetworkRequest::RefreshSchedule => self.handle_refresh_schedule().await,
            };

            debug!("network request complete");
            let response = result.unwrap_or_else(|err| NetworkResponse::Error {
                message: err.to_string(),
            });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle_load_schedule(&self) -> Result<NetworkResponse, ApiError> {
        debug!("loading schedule");
        let schedule = self.store.refresh().await?;
        info!("loaded {} runs", schedule.len());
        Ok(NetworkResponse::ScheduleLoaded { schedule })
    }

    async fn handle_refresh_schedule(&self) -> Result<NetworkResponse, ApiError> {
        debug!("refreshing schedule");
        let schedule = self.store.refresh().await?;
        Ok(NetworkResponse::ScheduleRefreshed { schedule })
    }
}
