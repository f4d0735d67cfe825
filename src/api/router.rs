//! API router.
//!
//! Returns a composable `Router` mounting the analysis endpoint at both
//! `/analyze` and the routed variant `/api/aoi/analyze`, plus a health
//! probe. CORS admits the local frontend dev server.

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::config;

/// Build the API router.
pub fn api_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/analyze", post(endpoints::analyze::analyze))
        .route("/api/aoi/analyze", post(endpoints::analyze::analyze))
        .with_state(ctx)
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = config::ALLOWED_ORIGINS
        .iter()
        .map(|origin| HeaderValue::from_static(origin))
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::backend::mock::{MockImageryBackend, SamplePixel};

    fn test_app(backend: MockImageryBackend) -> (Router, Arc<MockImageryBackend>) {
        let backend = Arc::new(backend);
        let app = api_router(ApiContext::new(backend.clone()));
        (app, backend)
    }

    fn analyze_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn hyderabad_body(area_sq_m: f64) -> serde_json::Value {
        serde_json::json!({
            "name": "TestArea",
            "latitude": 17.385,
            "longitude": 78.4867,
            "area_sq_m": area_sq_m,
        })
    }

    async fn response_json(response: axum::http::Response<Body>) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_response_shape() {
        let (app, _) = test_app(MockImageryBackend::new());

        let req = Request::builder()
            .method("GET")
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["status"], "ok");
        assert!(!json["version"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_positive_area_returns_400_without_result_keys() {
        for area in [0.0, -5_000.0] {
            let (app, _) = test_app(MockImageryBackend::new());

            let response = app
                .oneshot(analyze_request("/analyze", hyderabad_body(area)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);

            let json = response_json(response).await;
            assert!(json["detail"].as_str().unwrap().contains("area_sq_m"));
            assert!(json.get("summary").is_none());
            assert!(json.get("layers").is_none());
        }
    }

    #[tokio::test]
    async fn out_of_range_latitude_returns_400() {
        let (app, _) = test_app(MockImageryBackend::new());

        let mut body = hyderabad_body(5_000_000.0);
        body["latitude"] = serde_json::json!(123.0);
        let response = app
            .oneshot(analyze_request("/analyze", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_is_a_client_error() {
        let (app, _) = test_app(MockImageryBackend::new());

        let req = Request::builder()
            .method("POST")
            .uri("/analyze")
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"name": "x"}"#))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn empty_imagery_window_returns_400_naming_lookback() {
        let (app, _) = test_app(MockImageryBackend::new().with_collection_size(0));

        let response = app
            .oneshot(analyze_request("/analyze", hyderabad_body(5_000_000.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = response_json(response).await;
        assert!(json["detail"].as_str().unwrap().contains("365"));
    }

    #[tokio::test]
    async fn backend_compute_failure_returns_500() {
        let (app, _) = test_app(
            MockImageryBackend::new()
                .with_pixels(vec![SamplePixel::water()])
                .failing_region_sum(),
        );

        let response = app
            .oneshot(analyze_request("/analyze", hyderabad_body(5_000_000.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = response_json(response).await;
        assert!(json["detail"].as_str().unwrap().contains("backend"));
    }

    #[tokio::test]
    async fn hyderabad_scenario_summary_shape() {
        let backend = MockImageryBackend::new()
            .with_pixels(vec![
                SamplePixel::water(),
                SamplePixel::water(),
                SamplePixel::forest(),
                SamplePixel::forest(),
                SamplePixel::cropland(),
                SamplePixel::cropland(),
                SamplePixel::cropland(),
                SamplePixel::built_up(),
                SamplePixel::built_up(),
                SamplePixel::built_up(),
            ])
            .with_geometry_area(5_000_000.0);
        let (app, _) = test_app(backend);

        let response = app
            .oneshot(analyze_request("/analyze", hyderabad_body(5_000_000.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        let summary = &json["summary"];

        assert_eq!(summary["name"], "TestArea");
        assert_eq!(summary["input_area_sq_m"], 5_000_000.0);
        assert_eq!(summary["latitude"], 17.385);
        assert_eq!(summary["longitude"], 78.4867);

        let radius = summary["calculated_radius_m"].as_f64().unwrap();
        assert!((radius - 1261.57).abs() < 0.01, "radius was {radius}");

        let pct_sum = summary["water_pct"].as_f64().unwrap()
            + summary["forest_pct"].as_f64().unwrap()
            + summary["agriculture_pct"].as_f64().unwrap()
            + summary["infrastructure_pct"].as_f64().unwrap();
        assert!((pct_sum - 100.0).abs() < 0.01, "percentages sum to {pct_sum}");

        let classes = ["water", "agriculture", "forest", "infrastructure"];
        for feature in json["layers"].as_array().unwrap() {
            assert_eq!(feature["type"], "Feature");
            let class = feature["properties"]["class"].as_str().unwrap();
            assert!(classes.contains(&class), "unexpected class {class}");
        }
    }

    #[tokio::test]
    async fn ocean_scenario_yields_one_dominant_class() {
        // Uniform open water covering the full AOI.
        let backend = MockImageryBackend::new()
            .with_pixels(vec![SamplePixel::water(); 10])
            .with_pixel_area(500_000.0)
            .with_geometry_area(5_000_000.0);
        let (app, backend) = test_app(backend);

        let response = app
            .oneshot(analyze_request("/analyze", hyderabad_body(5_000_000.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        let summary = &json["summary"];
        assert_eq!(summary["water_pct"], 100.0);
        assert_eq!(summary["forest_pct"], 0.0);
        assert_eq!(summary["agriculture_pct"], 0.0);
        assert_eq!(summary["infrastructure_pct"], 0.0);

        // Only the water mask was worth converting.
        assert_eq!(backend.vectorize_calls(), 1);
        for feature in json["layers"].as_array().unwrap() {
            assert_eq!(feature["properties"]["class"], "water");
        }
    }

    #[tokio::test]
    async fn routed_variant_serves_the_same_pipeline() {
        let backend = MockImageryBackend::new()
            .with_pixels(vec![SamplePixel::forest()])
            .with_geometry_area(100.0);
        let (app, _) = test_app(backend);

        let response = app
            .oneshot(analyze_request("/api/aoi/analyze", hyderabad_body(5_000_000.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["summary"]["forest_pct"], 100.0);
    }

    #[tokio::test]
    async fn vectorization_failure_still_returns_the_summary() {
        let backend = MockImageryBackend::new()
            .with_pixels(vec![SamplePixel::water(), SamplePixel::cropland()])
            .with_geometry_area(200.0)
            .failing_vectorize();
        let (app, _) = test_app(backend);

        let response = app
            .oneshot(analyze_request("/analyze", hyderabad_body(5_000_000.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert!(json["summary"]["water_area_sq_m"].as_f64().unwrap() > 0.0);
        assert_eq!(json["layers"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let (app, _) = test_app(MockImageryBackend::new());

        let req = Request::builder()
            .method("GET")
            .uri("/nonexistent")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn preflight_allows_the_dev_frontend_origin() {
        let (app, _) = test_app(MockImageryBackend::new());

        let req = Request::builder()
            .method("OPTIONS")
            .uri("/analyze")
            .header("Origin", "http://localhost:3000")
            .header("Access-Control-Request-Method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();

        let allowed = response
            .headers()
            .get("access-control-allow-origin")
            .expect("preflight should name the allowed origin");
        assert_eq!(allowed, "http://localhost:3000");
    }
}
