//! Local stand-ins for the Telegram Bot API and Open-Meteo, recording every call made to them

use std::sync::Mutex;
use std::time::Duration;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use chrono::{NaiveDate, TimeDelta};
use serde_json::{json, Value};
use crate::manager_open_meteo::OpenMeteo;
use crate::manager_telegram::Telegram;

pub const TOKEN: &str = "123456:test-token";

/// How the fake Open-Meteo answers forecast requests
pub enum ForecastReply {
    Hours(usize),
    ServerError,
}

struct FakeState {
    forecast: ForecastReply,
    calls: Mutex<Vec<(String, Value)>>,
    webhook_url: Mutex<String>,
    updates: Mutex<Vec<Value>>,
}

pub struct FakeApis {
    base_url: String,
    state: web::Data<FakeState>,
}

impl FakeApis {
    /// Starts both fake services on one ephemeral port
    pub async fn start(forecast: ForecastReply) -> FakeApis {
        let state = web::Data::new(FakeState {
            forecast,
            calls: Mutex::new(Vec::new()),
            webhook_url: Mutex::new(String::new()),
            updates: Mutex::new(Vec::new()),
        });

        let app_state = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(app_state.clone())
                .route("/bot{token}/{method}", web::post().to(telegram_method))
                .route("/v1/forecast", web::get().to(forecast_endpoint))
        })
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();

        let base_url = format!("http://{}", server.addrs()[0]);
        actix_web::rt::spawn(server.run());

        FakeApis { base_url, state }
    }

    pub fn telegram(&self) -> Telegram {
        let timeout = Duration::from_secs(5);
        Telegram::new(&self.base_url, TOKEN, timeout, timeout, Duration::ZERO, None).unwrap()
    }

    pub fn weather(&self) -> OpenMeteo {
        OpenMeteo::new(&format!("{}/v1/forecast", self.base_url), 7, Duration::from_secs(5)).unwrap()
    }

    /// Queues an update for the next getUpdates call
    pub fn queue_update(&self, update: Value) {
        self.state.updates.lock().unwrap().push(update);
    }

    /// Calls received so far as (lowercased method, parameters), forecast requests as ("forecast", query)
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(method, _)| method).collect()
    }

    /// Texts of all sendMessage calls in order
    pub fn sent_texts(&self) -> Vec<String> {
        self.calls().into_iter()
            .filter(|(method, _)| method == "sendmessage")
            .map(|(_, params)| params["text"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

/// A message update as Telegram would deliver it
pub fn message_update(update_id: u32, content: Value) -> Value {
    let mut message = json!({
        "message_id": 5,
        "date": 1717200000,
        "chat": {"id": 77, "type": "private", "first_name": "Ravi"},
        "from": {"id": 77, "is_bot": false, "first_name": "Ravi"}
    });
    if let (Some(message), Some(content)) = (message.as_object_mut(), content.as_object()) {
        message.extend(content.clone());
    }

    json!({"update_id": update_id, "message": message})
}

/// Open-Meteo style document starting 2024-06-01 00:00, each day running from 20 to 43 degrees
pub fn forecast_document(hours: usize) -> Value {
    let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    let time: Vec<String> = (0..hours)
        .map(|h| (start + TimeDelta::hours(h as i64)).format("%Y-%m-%dT%H:%M").to_string())
        .collect();
    let temperature: Vec<f64> = (0..hours).map(|h| 20.0 + (h % 24) as f64).collect();

    json!({
        "latitude": 26.22,
        "longitude": 78.18,
        "timezone": "Asia/Kolkata",
        "hourly_units": {"time": "iso8601", "temperature_2m": "°C"},
        "hourly": {"time": time, "temperature_2m": temperature}
    })
}

async fn telegram_method(path: web::Path<(String, String)>, body: web::Bytes, state: web::Data<FakeState>) -> HttpResponse {
    let method = path.into_inner().1.to_lowercase();
    let params: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.calls.lock().unwrap().push((method.clone(), params.clone()));

    let result = match method.as_str() {
        "sendmessage" => json!({
            "message_id": 6,
            "date": 1717200001,
            "chat": {"id": params["chat_id"], "type": "private", "first_name": "Ravi"},
            "text": params["text"]
        }),
        "setwebhook" => {
            *state.webhook_url.lock().unwrap() = params["url"].as_str().unwrap_or_default().to_string();
            json!(true)
        },
        "getwebhookinfo" => json!({
            "url": state.webhook_url.lock().unwrap().clone(),
            "has_custom_certificate": false,
            "pending_update_count": 0
        }),
        "getupdates" => {
            let pending: Vec<Value> = state.updates.lock().unwrap().drain(..).collect();
            if pending.is_empty() {
                actix_web::rt::time::sleep(Duration::from_millis(20)).await;
            }
            json!(pending)
        },
        "sendchataction" | "deletewebhook" => json!(true),
        _ => return HttpResponse::NotFound().json(json!({"ok": false, "error_code": 404, "description": "Not Found"})),
    };

    HttpResponse::Ok().json(json!({"ok": true, "result": result}))
}

async fn forecast_endpoint(req: HttpRequest, state: web::Data<FakeState>) -> HttpResponse {
    state.calls.lock().unwrap().push(("forecast".to_string(), Value::String(req.query_string().to_string())));

    match state.forecast {
        ForecastReply::Hours(hours) => HttpResponse::Ok().json(forecast_document(hours)),
        ForecastReply::ServerError => HttpResponse::InternalServerError()
            .json(json!({"error": true, "reason": "upstream failure"})),
    }
}
