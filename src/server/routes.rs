use actix_web::{HttpResponse, Responder, get, web};
use foco::binder::ClickEvent;
use foco::{FocoConfig, RenderRequest, render_cycle};
use log::error;
use serde::Deserialize;
use std::sync::Arc;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(health);
}

#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    /// Name of the feature the map click landed on
    pub clicked: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Present only when the dropdown form was submitted
    pub bairro: Option<String>,
}

impl PageQuery {
    pub fn into_request(self) -> RenderRequest {
        let click = match (self.clicked, self.lat, self.lon) {
            (Some(name), _, _) if !name.is_empty() => ClickEvent::Feature(name),
            (_, Some(lat), Some(lon)) => ClickEvent::Point { lat, lon },
            _ => ClickEvent::None,
        };

        RenderRequest {
            click,
            dropdown: self.bairro,
        }
    }
}

#[get("/")]
async fn index(
    query: web::Query<PageQuery>,
    config: web::Data<Arc<FocoConfig>>,
) -> impl Responder {
    let request = query.into_inner().into_request();
    let config = Arc::clone(config.get_ref());

    let rendered = web::block(move || render_cycle(&config, &request)).await;

    match rendered {
        Ok(Ok(page)) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(page.html),
        Ok(Err(err)) => {
            error!("Render failed: {}", err);
            HttpResponse::InternalServerError()
                .content_type("text/plain")
                .body(format!("Error loading data: {}", err))
        }
        Err(err) => {
            error!("Render task failed: {}", err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok()
        .insert_header(("Content-Type", "text/plain"))
        .body("FOCO OK")
}
