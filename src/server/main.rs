// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use anyhow::Context;
use clap::Parser;
use foco::binder::ClickEvent;
use foco::{FocoConfig, RenderRequest, render_cycle};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

mod routes;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RON config file; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Neighborhood metrics CSV
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    /// Neighborhood boundaries GeoJSON
    #[arg(long, global = true)]
    geojson: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Serve the map page via HTTP
    Serve {
        #[arg(short, long, default_value = "127.0.0.1")]
        address: String,
        #[arg(short, long, default_value_t = 8501)]
        port: u16,
    },
    /// Render one page to a static HTML file
    Export {
        /// Feature name of a map click
        #[arg(long)]
        clicked: Option<String>,
        /// Dropdown choice
        #[arg(long)]
        bairro: Option<String>,
        #[arg(short, long, default_value = "foco.html")]
        output: PathBuf,
    },
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let mut config = FocoConfig::load(args.config.as_deref())?;
    if let Some(data) = args.data {
        config.data_path = data;
    }
    if let Some(geojson) = args.geojson {
        config.geojson_path = geojson;
    }

    match args.cmd {
        Command::Serve { address, port } => {
            info!("Starting FOCO on {}:{}", address, port);
            info!(
                "Reading {} and {} on every render",
                config.data_path.display(),
                config.geojson_path.display()
            );

            let config = Arc::new(config);

            HttpServer::new(move || {
                let cors = Cors::permissive();
                App::new()
                    .wrap(cors)
                    .wrap(middleware::Compress::default())
                    .wrap(middleware::Logger::default())
                    .app_data(web::Data::new(Arc::clone(&config)))
                    .configure(routes::config)
            })
            .bind((address, port))?
            .run()
            .await?;

            Ok(())
        }
        Command::Export {
            clicked,
            bairro,
            output,
        } => {
            let request = RenderRequest {
                click: clicked.map(ClickEvent::Feature).unwrap_or_default(),
                dropdown: bairro,
            };

            let page = render_cycle(&config, &request).context("Rendering page")?;

            std::fs::write(&output, page.html)
                .with_context(|| format!("Writing {}", output.display()))?;

            info!(
                "Wrote {} (selection {:?})",
                output.display(),
                page.selection.name
            );

            Ok(())
        }
    }
}
