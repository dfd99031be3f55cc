use crate::{
    config::config_model::Sweep,
    usecases::subscription_sweep::{SubscriptionSweepParams, SubscriptionSweepUseCase},
};
use anyhow::Result;
use chrono::Utc;
use crates::domain::repositories::subscriptions::SubscriptionRepository;
use std::sync::Arc;
use tracing::{error, info};

pub async fn run_worker_loop<S>(usecase: Arc<SubscriptionSweepUseCase<S>>, sweep: Sweep) -> Result<()>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    info!(
        interval_seconds = sweep.interval_seconds,
        batch_limit = sweep.batch_limit,
        "Subscription sweep loop started"
    );

    let params = SubscriptionSweepParams {
        batch_limit: sweep.batch_limit,
    };

    loop {
        if let Err(e) = usecase.run(Utc::now(), params).await {
            error!("Error while sweeping subscriptions: {}", e);
        }

        tokio::time::sleep(sweep.interval()).await;
    }
}
