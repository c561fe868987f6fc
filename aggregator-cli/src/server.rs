use std::{sync::Arc, time::Duration};

use anyhow::{Context, bail};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use weather_aggregator_core::{
    AggregateError, AggregateResult, Config, ErrorBody, WeatherAggregator,
};

/// HTTP face of [`AggregateError`].
struct ApiError(AggregateError);

impl From<AggregateError> for ApiError {
    fn from(err: AggregateError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AggregateError::MissingCity => StatusCode::BAD_REQUEST,
            AggregateError::NoData => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(
    aggregator: Arc<WeatherAggregator>,
    allowed_origins: &[String],
) -> anyhow::Result<Router> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            if origin.trim() == "*" {
                bail!(
                    "CORS origin '*' is not allowed with credentials; \
                     list explicit origins in server.allowed_origins"
                );
            }
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid CORS origin '{origin}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
        .max_age(Duration::from_secs(12 * 60 * 60));

    let api = Router::new()
        .route("/weather", get(get_weather))
        .route("/health", get(health))
        .with_state(aggregator);

    Ok(Router::new()
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

async fn get_weather(
    State(aggregator): State<Arc<WeatherAggregator>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<AggregateResult>, ApiError> {
    // A repeated `city` resolves to its first value.
    let city = params
        .into_iter()
        .find(|(key, _)| key == "city")
        .map(|(_, value)| value)
        .unwrap_or_default();

    let result = aggregator.aggregate(&city).await?;
    Ok(Json(result))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let aggregator = Arc::new(WeatherAggregator::from_config(&config)?);
    let app = router(aggregator, &config.server.allowed_origins)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Weather API listening on http://{addr}/api/weather");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated unexpectedly")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use weather_aggregator_core::ProviderId;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ORIGIN: &str = "http://localhost:3000";

    fn config_for(server: &MockServer, with_keys: bool) -> Config {
        let mut config = Config::default();
        if with_keys {
            config.upsert_provider_api_key(ProviderId::OpenWeather, "OW".into());
            config.upsert_provider_api_key(ProviderId::WeatherApi, "WA".into());
        }
        for id in ProviderId::all() {
            let entry = config.providers.entry(id.as_str().to_string()).or_default();
            entry.endpoint = Some(format!("{}/{}/current", server.uri(), id.as_str()));
        }
        if let Some(meteo) = config.providers.get_mut(ProviderId::OpenMeteo.as_str()) {
            meteo.geocoding_endpoint = Some(format!("{}/openmeteo/search", server.uri()));
        }
        config
    }

    fn app(config: &Config) -> Router {
        let aggregator = WeatherAggregator::from_config(config).expect("client builds");
        router(Arc::new(aggregator), &[ORIGIN.to_string()]).expect("valid origins")
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("valid request"),
            )
            .await
            .expect("infallible");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    async fn mount_all_success(server: &MockServer) {
        let routes = [
            (
                "/openweather/current",
                serde_json::json!({
                    "main": { "temp": 10.0 },
                    "weather": [{ "description": "ясно" }],
                    "wind": { "speed": 2.0 }
                }),
            ),
            (
                "/weatherapi/current",
                serde_json::json!({
                    "current": {
                        "temp_c": 12.0,
                        "wind_kph": 7.0,
                        "condition": { "text": "Солнечно" }
                    }
                }),
            ),
            (
                "/openmeteo/search",
                serde_json::json!({
                    "results": [{ "latitude": 51.5, "longitude": -0.12 }]
                }),
            ),
            (
                "/openmeteo/current",
                serde_json::json!({
                    "current": { "temperature_2m": 11.0, "weather_code": 2, "wind_speed_10m": 5.0 }
                }),
            ),
        ];
        for (route, body) in routes {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(server)
                .await;
        }
    }

    #[tokio::test]
    async fn weather_returns_aggregate() {
        let server = MockServer::start().await;
        mount_all_success(&server).await;

        let config = config_for(&server, true);
        let (status, body) = get(app(&config), "/api/weather?city=London").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["city"], "London");
        assert_eq!(body["averageTemp"], 11.0);
        assert_eq!(body["sources"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn repeated_city_uses_first_value() {
        let server = MockServer::start().await;
        mount_all_success(&server).await;

        let config = config_for(&server, true);
        let (status, body) = get(app(&config), "/api/weather?city=London&city=Paris").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["city"], "London");
        assert_eq!(body["sources"].as_array().map(Vec::len), Some(3));

        let requests = server.received_requests().await.unwrap_or_default();
        let asked_for_paris = requests
            .iter()
            .any(|r| r.url.query().is_some_and(|q| q.contains("Paris")));
        assert!(!asked_for_paris);
    }

    #[tokio::test]
    async fn missing_city_is_bad_request_without_upstream_calls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = config_for(&server, true);

        let (status, body) = get(app(&config), "/api/weather").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "City parameter is required");

        let (status, _) = get(app(&config), "/api/weather?city=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get(app(&config), "/api/weather?town=London").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "City parameter is required");
    }

    #[tokio::test]
    async fn all_providers_failing_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let config = config_for(&server, true);
        let (status, body) = get(app(&config), "/api/weather?city=London").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["error"],
            "Failed to fetch weather data from any source"
        );
        assert!(body.get("sources").is_none());
    }

    #[tokio::test]
    async fn keyless_only_setup_still_answers() {
        let server = MockServer::start().await;
        mount_all_success(&server).await;

        let config = config_for(&server, false);
        let (status, body) = get(app(&config), "/api/weather?city=London").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["averageTemp"], 11.0);
        assert_eq!(body["sources"][0]["name"], "Open-Meteo");
        assert_eq!(
            body["sources"][0]["description"],
            "Переменная облачность, ветер 5.0 km/h"
        );

        let requests = server.received_requests().await.unwrap_or_default();
        let only_meteo = requests
            .iter()
            .all(|r| r.url.path().starts_with("/openmeteo/"));
        assert!(only_meteo);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = get(app(&Config::default()), "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let response = app(&Config::default())
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header(header::ORIGIN, ORIGIN)
                    .body(Body::empty())
                    .expect("valid request"),
            )
            .await
            .expect("infallible");

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static(ORIGIN))
        );
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let aggregator = Arc::new(WeatherAggregator::new(Vec::new()));
        assert!(router(aggregator, &["bad\norigin".to_string()]).is_err());
    }

    #[test]
    fn wildcard_origin_is_rejected() {
        let aggregator = Arc::new(WeatherAggregator::new(Vec::new()));
        let origins = [ORIGIN.to_string(), "*".to_string()];

        let err = router(aggregator, &origins).unwrap_err();
        assert!(err.to_string().contains("'*'"), "unexpected error: {err}");
    }
}
