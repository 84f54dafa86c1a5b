use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use micro_urlencoded::handler::{Handler, HandlerDecorator, UrlencodedDecorator, handler_fn};
use micro_urlencoded::{BodyError, FormBody, UrlencodedConfig, UrlencodedParser};
use std::convert::Infallible;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

async fn show_form(req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
    let form = FormBody::from_request(&req).cloned().unwrap_or_default();
    let json = serde_json::Value::from(form).to_string();
    Ok(Response::new(Full::new(Bytes::from(json))))
}

fn form_request(body: &'static str) -> Request<Full<Bytes>> {
    Request::post("/form")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(http::header::CONTENT_LENGTH, body.len())
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = UrlencodedConfig::builder().limit("1kb").extended(true).parameter_limit(16).build().unwrap();
    let handler = UrlencodedDecorator::new(UrlencodedParser::new(config)).decorate(handler_fn(show_form));

    let bodies = [
        "user[name]=tobi&user[pets][]=loki&user[pets][]=ferret&remember=on",
        "a=1&a=2&b=hello+world%21",
        "a&b&c&d&e&f&g&h&i&j&k&l&m&n&o&p&q",
    ];

    for body in bodies {
        match handler.call(form_request(body)).await {
            Ok(response) => {
                let form = http_body_util::BodyExt::collect(response.into_body()).await.unwrap().to_bytes();
                info!(body, decoded = %String::from_utf8_lossy(&form), "decoded");
            }
            Err(e) => {
                let status = e.downcast_ref::<BodyError>().map_or(StatusCode::INTERNAL_SERVER_ERROR, BodyError::status);
                info!(body, %status, error = %e, "rejected");
            }
        }
    }
}
