//! 行情接口处理器
//!
//! ## API 列表
//! - GET /quotes?symbol={symbol} - 获取标的行情
//! - GET /quotes/{symbol} - 获取标的行情

use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;

use crate::models::{ApiResponse, QuoteView};
use crate::services::quote::QuoteService;

/// 行情查询参数
#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    /// 标的代码
    pub symbol: Option<String>,
}

async fn respond(service: &QuoteService, symbol: &str) -> Result<HttpResponse> {
    match service.get_quote(symbol).await {
        Ok(view) => {
            let response = ApiResponse::success(view);
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            let response = ApiResponse::<QuoteView>::error(e.to_string());
            Ok(HttpResponse::build(e.status_code()).json(response))
        }
    }
}

/// 获取标的行情
///
/// GET /api/v1/quotes?symbol=IBM
pub async fn get_quote_by_query(
    service: web::Data<QuoteService>,
    query: web::Query<QuoteQuery>,
) -> Result<HttpResponse> {
    let symbol = query.into_inner().symbol.unwrap_or_default();
    respond(&service, &symbol).await
}

/// 获取标的行情
///
/// GET /api/v1/quotes/{symbol}
pub async fn get_quote(
    service: web::Data<QuoteService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let symbol = path.into_inner();
    respond(&service, &symbol).await
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/quotes")
            .route("", web::get().to(get_quote_by_query))
            .route("/{symbol}", web::get().to(get_quote))
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::quote::testing::{ibm_quote, series_of, temp_store, FakeClient};
    use crate::services::quote::{CachePolicy, ClientError};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;
    use std::sync::Arc;

    fn quote_service(client: FakeClient) -> (tempfile::TempDir, web::Data<QuoteService>) {
        let (dir, store) = temp_store();
        let service = QuoteService::new(Arc::new(client), store, CachePolicy::default());
        (dir, web::Data::new(service))
    }

    macro_rules! app {
        ($service:expr) => {
            test::init_service(
                App::new()
                    .app_data($service.clone())
                    .configure(crate::handlers::config),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_get_quote_by_query() {
        let (_dir, service) = quote_service(FakeClient::succeeding(
            ibm_quote(),
            series_of(&[105.0, 103.0, 100.0, 99.0, 98.0, 97.0, 96.0, 95.0]),
        ));
        let app = app!(service);

        let req = test::TestRequest::get().uri("/api/v1/quotes?symbol=ibm").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["symbol"], "IBM");
        assert_eq!(body["data"]["price"], 134.56);
        assert_eq!(body["data"]["changePercent"], "1.2034%");
        assert_eq!(body["data"]["yesterdayChange"], 2.0);
        assert_eq!(body["data"]["weekChange"], 10.0);
    }

    #[actix_web::test]
    async fn test_get_quote_by_path() {
        let (_dir, service) = quote_service(FakeClient::succeeding(ibm_quote(), series_of(&[1.0])));
        let app = app!(service);

        let req = test::TestRequest::get().uri("/api/v1/quotes/IBM").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["yesterdayChange"], Value::Null);
    }

    #[actix_web::test]
    async fn test_missing_symbol_is_bad_request() {
        let (_dir, service) = quote_service(FakeClient::succeeding(ibm_quote(), series_of(&[1.0])));
        let app = app!(service);

        for uri in ["/api/v1/quotes", "/api/v1/quotes?symbol=", "/api/v1/quotes?symbol=%20"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["success"], false);
            assert_eq!(body["message"], "Symbol parameter is required");
        }
    }

    #[actix_web::test]
    async fn test_unknown_symbol_is_not_found() {
        let (_dir, service) =
            quote_service(FakeClient::failing(ClientError::Empty("NOPE".into())));
        let app = app!(service);

        let req = test::TestRequest::get().uri("/api/v1/quotes/nope").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_upstream_failure_is_server_error() {
        let (_dir, service) =
            quote_service(FakeClient::failing(ClientError::Unavailable("503".into())));
        let app = app!(service);

        let req = test::TestRequest::get().uri("/api/v1/quotes/IBM").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());
    }
}
