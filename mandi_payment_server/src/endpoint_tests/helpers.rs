use actix_web::{http::StatusCode, test, web::ServiceConfig, App};
use serde::Serialize;

use crate::auth::{ROLE_HEADER, USER_ID_HEADER};

pub fn principal_headers(user_id: &'static str, role: &'static str) -> Vec<(&'static str, &'static str)> {
    vec![(USER_ID_HEADER, user_id), (ROLE_HEADER, role)]
}

pub async fn post_json<F, T>(
    uri: &str,
    headers: &[(&'static str, &'static str)],
    body: &T,
    configure: F,
) -> (StatusCode, String)
where
    F: FnOnce(&mut ServiceConfig),
    T: Serialize,
{
    let app = test::init_service(App::new().configure(configure)).await;
    let mut req = test::TestRequest::post().uri(uri).set_json(body);
    for (name, value) in headers {
        req = req.insert_header((*name, *value));
    }
    let resp = test::call_service(&app, req.to_request()).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    (status, String::from_utf8_lossy(&body).to_string())
}

pub async fn post_raw<F>(uri: &str, body: &'static str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = test::init_service(App::new().configure(configure)).await;
    let req = test::TestRequest::post()
        .uri(uri)
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    (status, String::from_utf8_lossy(&body).to_string())
}

pub async fn get_request<F>(
    uri: &str,
    headers: &[(&'static str, &'static str)],
    configure: F,
) -> (StatusCode, String)
where
    F: FnOnce(&mut ServiceConfig),
{
    let app = test::init_service(App::new().configure(configure)).await;
    let mut req = test::TestRequest::get().uri(uri);
    for (name, value) in headers {
        req = req.insert_header((*name, *value));
    }
    let resp = test::call_service(&app, req.to_request()).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    (status, String::from_utf8_lossy(&body).to_string())
}
