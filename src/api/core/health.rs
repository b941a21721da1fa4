use crate::app::context::AppContext;
use crate::db::Db;
use crate::error::AppResult;
use bon::Builder;
use serde_derive::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct HealthCheckResponse {
    /// Total latency of checking the health of the app.
    pub latency: u128,
    pub resources: BTreeMap<String, CheckResponse>,
}

impl HealthCheckResponse {
    pub fn healthy(&self) -> bool {
        self.resources
            .values()
            .all(|resource| matches!(resource.status, Status::Ok))
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct CheckResponse {
    pub status: Status,
    /// Total latency of checking the health of the resource in milliseconds.
    #[builder(with = |duration: Duration| duration.as_millis())]
    pub latency: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub enum Status {
    Ok,
    Err(ErrorData),
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ErrorData {
    #[builder(into)]
    pub msg: Option<String>,
}

/// Check the health of the resources the app depends on. Each check is bounded by
/// `duration`, if provided.
#[instrument(skip_all)]
pub async fn health_check(
    context: &AppContext,
    duration: Option<Duration>,
) -> AppResult<HealthCheckResponse> {
    info!("Running checks");
    let timer = Instant::now();

    let db = db_health(&context.db(), duration).await;
    match &db.status {
        Status::Ok => {}
        Status::Err(_) => {
            error!(name = "db", "Resource is not healthy");
            debug!(name = "db", "Error details: {db:?}");
        }
    }

    let resources = BTreeMap::from([("db".to_owned(), db)]);
    let latency = timer.elapsed().as_millis();

    info!(latency_ms=%latency, "Checks completed");

    Ok(HealthCheckResponse { latency, resources })
}

pub(crate) async fn db_health(db: &Db, duration: Option<Duration>) -> CheckResponse {
    let db_timer = Instant::now();
    let db_status = match ping_db(db, duration).await {
        Ok(_) => Status::Ok,
        Err(err) => Status::Err(ErrorData::builder().msg(err.to_string()).build()),
    };
    CheckResponse::builder()
        .status(db_status)
        .latency(db_timer.elapsed())
        .build()
}

#[instrument(skip_all)]
async fn ping_db(db: &Db, duration: Option<Duration>) -> AppResult<()> {
    if let Some(duration) = duration {
        timeout(duration, db.ping()).await??;
    } else {
        db.ping().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use insta::assert_json_snapshot;

    #[tokio::test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    async fn unreachable_db_is_unhealthy() {
        let config = AppConfig::test(None).unwrap();
        let db = Db::connect(&config.database).await.unwrap();
        let context = AppContext::new(config, db);

        let response = health_check(&context, Some(Duration::from_millis(50)))
            .await
            .unwrap();

        assert!(!response.healthy());
        assert!(matches!(response.resources["db"].status, Status::Err(_)));
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn check_response_serialize() {
        let ok = CheckResponse::builder()
            .status(Status::Ok)
            .latency(Duration::from_millis(12))
            .build();
        let err = CheckResponse::builder()
            .status(Status::Err(ErrorData::builder().msg("unreachable").build()))
            .latency(Duration::from_millis(3))
            .build();
        let response = HealthCheckResponse {
            latency: 15,
            resources: BTreeMap::from([("a".to_owned(), ok), ("b".to_owned(), err)]),
        };

        assert!(!response.healthy());
        assert_json_snapshot!(response);
    }
}
