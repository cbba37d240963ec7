use bytes::{BufMut, Bytes};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use sunset_core::{
    Coordinates, Favorite, FavoritesStore, GeocodeError, PhotoStore, PredictError, Predictor,
    UploadError, provider::MAX_FORECAST_DAYS,
};
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

const INDEX_HTML: &str = include_str!("../static/index.html");
const MAX_JSON_BODY: u64 = 64 * 1024;

/// Everything a request handler needs, shared across requests.
pub struct AppState {
    pub predictor: Predictor,
    pub favorites: FavoritesStore,
    pub photos: PhotoStore,
    pub max_upload_bytes: u64,
}

pub async fn run(address: SocketAddr, state: Arc<AppState>) {
    tracing::info!("Starting sunset server on http://{}", address);
    warp::serve(routes(state)).run(address).await
}

pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let index_route = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::html(INDEX_HTML));

    let predict_route = warp::path!("predict")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_JSON_BODY))
        .and(warp::body::bytes())
        .and(with_state(state.clone()))
        .then(predict);

    let reverse_route = warp::path!("reverse-geocode")
        .and(warp::get())
        .and(warp::query::<ReverseQuery>())
        .and(with_state(state.clone()))
        .then(reverse_geocode);

    let upload_route = warp::path!("upload")
        .and(warp::post())
        .and(warp::multipart::form().max_length(state.max_upload_bytes))
        .and(with_state(state.clone()))
        .then(upload_photo);

    let list_favorites_route = warp::path!("favorites")
        .and(warp::get())
        .and(with_state(state.clone()))
        .then(list_favorites);

    let add_favorite_route = warp::path!("favorites")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_JSON_BODY))
        .and(warp::body::json::<Favorite>())
        .and(with_state(state))
        .then(add_favorite);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type"]);

    index_route
        .or(predict_route)
        .or(reverse_route)
        .or(upload_route)
        .or(list_favorites_route)
        .or(add_favorite_route)
        .recover(rejection)
        .with(cors)
        .with(warp::trace::request())
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

#[derive(Serialize)]
struct ErrorMessage {
    error: String,
}

fn error_reply(code: StatusCode, message: impl Into<String>) -> Response {
    let json = warp::reply::json(&ErrorMessage {
        error: message.into(),
    });
    warp::reply::with_status(json, code).into_response()
}

async fn predict(body: Bytes, state: Arc<AppState>) -> Response {
    let data: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => serde_json::Value::Null,
    };
    tracing::info!("Received request data: {}", data);

    let Some(fields) = data.as_object().filter(|o| !o.is_empty()) else {
        tracing::error!("No JSON data received in request");
        return error_reply(StatusCode::BAD_REQUEST, "No data provided");
    };

    let Some(location) = fields
        .get("location")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|l| !l.is_empty())
    else {
        tracing::error!("No location provided in request data");
        return error_reply(StatusCode::BAD_REQUEST, "Location is required");
    };

    let days = match fields.get("days") {
        None | Some(serde_json::Value::Null) => 1,
        Some(v) => match v.as_u64().and_then(|d| u8::try_from(d).ok()) {
            Some(d) => d,
            None => {
                return error_reply(
                    StatusCode::BAD_REQUEST,
                    format!("Days must be between 1 and {MAX_FORECAST_DAYS}"),
                );
            }
        },
    };

    match state.predictor.predict(location, days).await {
        Ok(report) => {
            tracing::info!("Successfully generated prediction");
            warp::reply::json(&report).into_response()
        }
        Err(e) => error_reply(predict_status(&e), e.to_string()),
    }
}

fn predict_status(err: &PredictError) -> StatusCode {
    match err {
        PredictError::InvalidDays { .. } => StatusCode::BAD_REQUEST,
        PredictError::LocationNotFound | PredictError::Geocoding(_) => StatusCode::NOT_FOUND,
        PredictError::Weather(_) | PredictError::NoWeatherData => StatusCode::SERVICE_UNAVAILABLE,
        PredictError::Sunset(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug, Deserialize)]
struct ReverseQuery {
    lat: Option<String>,
    lon: Option<String>,
}

#[derive(Serialize)]
struct ReverseReply {
    location: String,
    lat: f64,
    lon: f64,
}

async fn reverse_geocode(query: ReverseQuery, state: Arc<AppState>) -> Response {
    let (Some(lat), Some(lon)) = (
        query.lat.filter(|s| !s.is_empty()),
        query.lon.filter(|s| !s.is_empty()),
    ) else {
        return error_reply(StatusCode::BAD_REQUEST, "Latitude and longitude are required");
    };

    let at = match (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
        (Ok(lat), Ok(lon)) => match Coordinates::new(lat, lon) {
            Ok(at) => at,
            Err(e) => return error_reply(StatusCode::BAD_REQUEST, e.to_string()),
        },
        _ => {
            return error_reply(
                StatusCode::BAD_REQUEST,
                "Latitude and longitude must be numbers",
            );
        }
    };

    match state.predictor.reverse(at).await {
        Ok(place) => warp::reply::json(&ReverseReply {
            location: place.address,
            lat: at.latitude,
            lon: at.longitude,
        })
        .into_response(),
        Err(GeocodeError::NotFound) => error_reply(StatusCode::NOT_FOUND, "Location not found"),
        Err(e) => {
            tracing::error!("Error in reverse_geocode: {}", e);
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[derive(Default)]
struct UploadForm {
    /// Original file name and contents.
    photo: Option<(String, Vec<u8>)>,
    location: Option<String>,
    date: Option<String>,
}

async fn read_form(form: FormData) -> Result<UploadForm, warp::Error> {
    let parts: Vec<Part> = form.try_collect().await?;
    let mut upload = UploadForm::default();

    for part in parts {
        let name = part.name().to_string();
        let filename = part.filename().map(str::to_string);
        let data = part
            .stream()
            .try_fold(Vec::new(), |mut acc, buf| async move {
                acc.put(buf);
                Ok(acc)
            })
            .await?;

        match name.as_str() {
            "photo" => upload.photo = Some((filename.unwrap_or_default(), data)),
            "location" => upload.location = Some(String::from_utf8_lossy(&data).trim().to_string()),
            "date" => upload.date = Some(String::from_utf8_lossy(&data).trim().to_string()),
            other => tracing::debug!("Ignoring upload field '{}'", other),
        }
    }

    Ok(upload)
}

#[derive(Serialize)]
struct UploadReply {
    success: bool,
    message: &'static str,
    filename: String,
}

async fn upload_photo(form: FormData, state: Arc<AppState>) -> Response {
    let upload = match read_form(form).await {
        Ok(upload) => upload,
        Err(e) => {
            tracing::error!("Error reading upload: {}", e);
            return error_reply(StatusCode::BAD_REQUEST, "Invalid upload");
        }
    };

    let Some((filename, contents)) = upload.photo else {
        return error_reply(StatusCode::BAD_REQUEST, "No photo uploaded");
    };
    let (Some(location), Some(date)) = (
        upload.location.filter(|s| !s.is_empty()),
        upload.date.filter(|s| !s.is_empty()),
    ) else {
        return error_reply(StatusCode::BAD_REQUEST, "Missing required fields");
    };

    match state.photos.save(&location, &date, &filename, &contents).await {
        Ok(filename) => warp::reply::json(&UploadReply {
            success: true,
            message: "Photo uploaded successfully",
            filename,
        })
        .into_response(),
        Err(e @ (UploadError::NoSelectedFile | UploadError::InvalidFileType)) => {
            error_reply(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            tracing::error!("Error in upload_photo: {}", e);
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn list_favorites(state: Arc<AppState>) -> Response {
    warp::reply::json(&state.favorites.list().await).into_response()
}

async fn add_favorite(favorite: Favorite, state: Arc<AppState>) -> Response {
    match state.favorites.add(favorite).await {
        Ok(stored) => {
            warp::reply::with_status(warp::reply::json(&stored), StatusCode::CREATED)
                .into_response()
        }
        Err(e) => error_reply(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

async fn rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large".to_string())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Unsupported content type".to_string(),
        )
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else {
        tracing::error!("Unexpected error: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "An unexpected error occurred. Please try again.".to_string(),
        )
    };

    Ok(error_reply(code, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sunset_core::timezone::Tz;
    use sunset_core::{
        Geocoder, Place, TimezoneError, TimezoneResolver, WeatherError, WeatherPayload,
        WeatherProvider, WeatherRequest,
    };

    #[derive(Debug)]
    struct FakeGeocoder;

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn search(&self, query: &str) -> Result<Place, GeocodeError> {
            match query {
                "Malibu Beach" => Ok(Place {
                    address: "Malibu Beach, California".into(),
                    coordinates: Coordinates::new(34.0259, -118.7798).unwrap(),
                }),
                "Longyearbyen" => Ok(Place {
                    address: "Longyearbyen, Svalbard".into(),
                    coordinates: Coordinates::new(80.0, 15.0).unwrap(),
                }),
                _ => Err(GeocodeError::NotFound),
            }
        }

        async fn reverse(&self, at: Coordinates) -> Result<Place, GeocodeError> {
            if at.latitude > 0.0 {
                Ok(Place {
                    address: "Grand Canyon Village, Arizona".into(),
                    coordinates: at,
                })
            } else {
                Err(GeocodeError::NotFound)
            }
        }
    }

    #[derive(Debug)]
    struct NoTimezones;

    #[async_trait]
    impl TimezoneResolver for NoTimezones {
        async fn resolve(&self, _at: Coordinates) -> Result<Tz, TimezoneError> {
            Err(TimezoneError::Missing)
        }
    }

    #[derive(Debug)]
    enum FakeWeather {
        Clear,
        /// Forecast entries stamped 2024-06-21T12:00:00Z.
        Midsummer,
        Unauthorized,
    }

    fn clear_payload() -> WeatherPayload {
        serde_json::from_value(serde_json::json!({
            "weather": [{"main": "Clear", "description": "clear sky"}],
            "clouds": {"all": 10},
            "wind": {"speed": 2.0},
            "main": {"temp": 22.4}
        }))
        .unwrap()
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn get_weather(
            &self,
            request: &WeatherRequest,
        ) -> Result<Vec<WeatherPayload>, WeatherError> {
            match self {
                FakeWeather::Clear => Ok(vec![clear_payload(); usize::from(request.days)]),
                FakeWeather::Midsummer => {
                    let payload = WeatherPayload {
                        dt: Some(1_718_971_200),
                        ..clear_payload()
                    };
                    Ok(vec![payload; usize::from(request.days)])
                }
                FakeWeather::Unauthorized => Err(WeatherError::Auth),
            }
        }
    }

    fn state_with(weather: FakeWeather, uploads: &std::path::Path) -> Arc<AppState> {
        Arc::new(AppState {
            predictor: Predictor::new(
                Box::new(FakeGeocoder),
                Box::new(NoTimezones),
                Box::new(weather),
            ),
            favorites: FavoritesStore::default(),
            photos: PhotoStore::new(uploads),
            max_upload_bytes: 1024 * 1024,
        })
    }

    fn state(weather: FakeWeather) -> (Arc<AppState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (state_with(weather, dir.path()), dir)
    }

    fn json_body(res: &warp::http::Response<Bytes>) -> serde_json::Value {
        serde_json::from_slice(res.body()).unwrap()
    }

    #[tokio::test]
    async fn index_serves_html() {
        let (state, _dir) = state(FakeWeather::Clear);
        let res = warp::test::request().path("/").reply(&routes(state)).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(String::from_utf8_lossy(res.body()).contains("<html"));
    }

    #[tokio::test]
    async fn predict_returns_report() {
        let (state, _dir) = state(FakeWeather::Clear);
        let res = warp::test::request()
            .method("POST")
            .path("/predict")
            .json(&serde_json::json!({"location": "Malibu Beach"}))
            .reply(&routes(state))
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(&res);
        assert_eq!(body["location"], "Malibu Beach, California");
        assert_eq!(body["predictions"].as_array().unwrap().len(), 1);
        assert_eq!(body["predictions"][0]["quality_score"], 10);
        assert_eq!(body["predictions"][0]["temperature"], 22);
        assert_eq!(body["predictions"][0]["weather_condition"], "Clear");
    }

    #[tokio::test]
    async fn predict_multi_day() {
        let (state, _dir) = state(FakeWeather::Clear);
        let res = warp::test::request()
            .method("POST")
            .path("/predict")
            .json(&serde_json::json!({"location": "Malibu Beach", "days": 3}))
            .reply(&routes(state))
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        let predictions = json_body(&res)["predictions"].as_array().unwrap().clone();
        assert_eq!(predictions.len(), 3);
        assert_ne!(predictions[0]["date"], predictions[1]["date"]);
    }

    #[tokio::test]
    async fn predict_validates_input() {
        let (state, _dir) = state(FakeWeather::Clear);
        let filter = routes(state);

        for (body, message) in [
            ("", "No data provided"),
            ("{}", "No data provided"),
            ("not json", "No data provided"),
            (r#"{"days": 1}"#, "Location is required"),
            (r#"{"location": "  "}"#, "Location is required"),
        ] {
            let res = warp::test::request()
                .method("POST")
                .path("/predict")
                .body(body)
                .reply(&filter)
                .await;

            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "body {body:?}");
            assert_eq!(json_body(&res)["error"], message);
        }

        let res = warp::test::request()
            .method("POST")
            .path("/predict")
            .json(&serde_json::json!({"location": "Malibu Beach", "days": 30}))
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn predict_unknown_location_is_404() {
        let (state, _dir) = state(FakeWeather::Clear);
        let res = warp::test::request()
            .method("POST")
            .path("/predict")
            .json(&serde_json::json!({"location": "Atlantis"}))
            .reply(&routes(state))
            .await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(&res)["error"],
            "Location not found. Please try a different location."
        );
    }

    #[tokio::test]
    async fn predict_weather_failure_is_503() {
        let (state, _dir) = state(FakeWeather::Unauthorized);
        let res = warp::test::request()
            .method("POST")
            .path("/predict")
            .json(&serde_json::json!({"location": "Malibu Beach"}))
            .reply(&routes(state))
            .await;

        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            json_body(&res)["error"],
            "Weather service authentication failed. Please check API key."
        );
    }

    #[tokio::test]
    async fn polar_day_is_a_server_error() {
        let (state, _dir) = state(FakeWeather::Midsummer);
        let res = warp::test::request()
            .method("POST")
            .path("/predict")
            .json(&serde_json::json!({"location": "Longyearbyen", "days": 2}))
            .reply(&routes(state))
            .await;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let message = json_body(&res)["error"].as_str().unwrap().to_string();
        assert!(message.starts_with("Error calculating sunset time"), "got {message}");
        assert!(message.contains("2024-06-21"));
    }

    #[tokio::test]
    async fn reverse_geocode_routes() {
        let (state, _dir) = state(FakeWeather::Clear);
        let filter = routes(state);

        let res = warp::test::request()
            .path("/reverse-geocode?lat=36.0544&lon=-112.1401")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(&res);
        assert_eq!(body["location"], "Grand Canyon Village, Arizona");
        assert_eq!(body["lat"], 36.0544);

        let res = warp::test::request()
            .path("/reverse-geocode?lat=36.0544")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&res)["error"], "Latitude and longitude are required");

        let res = warp::test::request()
            .path("/reverse-geocode?lat=-10&lon=20")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn favorites_list_and_add() {
        let (state, _dir) = state(FakeWeather::Clear);
        let filter = routes(state);

        let res = warp::test::request().path("/favorites").reply(&filter).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(&res)[0]["location"], "Malibu Beach");

        let res = warp::test::request()
            .method("POST")
            .path("/favorites")
            .json(&serde_json::json!({"location": "Oia", "latitude": 36.46, "longitude": 25.37}))
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = warp::test::request().path("/favorites").reply(&filter).await;
        assert_eq!(json_body(&res).as_array().unwrap().len(), 3);
    }

    const BOUNDARY: &str = "sunsetboundary";

    fn multipart_body(fields: &[(&str, Option<&str>, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, data) in fields {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match filename {
                Some(f) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(data.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn upload(filter_state: Arc<AppState>, body: Vec<u8>) -> warp::http::Response<Bytes> {
        warp::test::request()
            .method("POST")
            .path("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
            .reply(&routes(filter_state))
            .await
    }

    #[tokio::test]
    async fn upload_stores_photo() {
        let (state, dir) = state(FakeWeather::Clear);

        let res = upload(
            state,
            multipart_body(&[
                ("location", None, "Malibu Beach"),
                ("date", None, "2024-06-21"),
                ("photo", Some("golden hour.jpg"), "JPEGDATA"),
            ]),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(&res);
        assert_eq!(body["success"], true);
        assert_eq!(body["filename"], "2024-06-21_Malibu_Beach_golden_hour.jpg");
        let stored = std::fs::read(dir.path().join("2024-06-21_Malibu_Beach_golden_hour.jpg"));
        assert_eq!(stored.unwrap(), b"JPEGDATA");
    }

    #[tokio::test]
    async fn upload_rejects_incomplete_forms() {
        let (state, _dir) = state(FakeWeather::Clear);

        let res = upload(
            state.clone(),
            multipart_body(&[("location", None, "Malibu"), ("date", None, "2024-06-21")]),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&res)["error"], "No photo uploaded");

        let res = upload(
            state.clone(),
            multipart_body(&[("photo", Some("a.png"), "x"), ("location", None, "Malibu")]),
        )
        .await;
        assert_eq!(json_body(&res)["error"], "Missing required fields");

        let res = upload(
            state,
            multipart_body(&[
                ("photo", Some("notes.txt"), "x"),
                ("location", None, "Malibu"),
                ("date", None, "2024-06-21"),
            ]),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&res)["error"], "Invalid file type");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let (state, _dir) = state(FakeWeather::Clear);
        let res = warp::test::request().path("/nope").reply(&routes(state)).await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(&res)["error"], "Not found");
    }
}
